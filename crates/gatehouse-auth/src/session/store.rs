//! Session store backed by a moka TTL cache, plus a subject → token index.
//!
//! The cache owns token → session entries and evicts them once they reach
//! the TTL. Issuing a session for a subject evicts its previous token and
//! inserts the new one while the index mutex is held, so concurrent logins
//! of one subject serialize and leave exactly one live token.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use moka::sync::Cache;
use tokio::time::Instant;
use uuid::Uuid;

use gatehouse_core::config::SessionConfig;
use gatehouse_core::types::Subject;

/// A live session.
#[derive(Debug, Clone)]
pub struct Session {
    /// Opaque session token.
    pub token: String,
    /// The subject the session was issued for.
    pub subject: Subject,
    /// Creation time; expiry is measured from here.
    pub created_at: Instant,
}

impl Session {
    /// Whether the session has reached its TTL at `now`.
    pub fn is_expired(&self, now: Instant, ttl: Duration) -> bool {
        now.saturating_duration_since(self.created_at) >= ttl
    }
}

/// Result of issuing a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssuedSession {
    /// The new token.
    pub token: String,
    /// Token of the subject's previous session, now invalidated.
    pub evicted: Option<String>,
}

/// TTL-bounded session cache keyed by token.
///
/// The cache evicts on its own clock. Lookups additionally compare the
/// session age against the TTL on the tokio clock, which is never later
/// than the cache's own insert time, so a token is never served past
/// `created_at + ttl`.
#[derive(Debug)]
pub struct SessionStore {
    ttl: Duration,
    sessions: Cache<String, Session>,
    by_subject: Mutex<HashMap<Subject, String>>,
}

impl SessionStore {
    /// Create a store whose sessions live for `ttl`.
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            sessions: Cache::builder().time_to_live(ttl).build(),
            by_subject: Mutex::new(HashMap::new()),
        }
    }

    /// Create a store from the session configuration.
    pub fn from_config(config: &SessionConfig) -> Self {
        Self::new(config.ttl())
    }

    /// Session time-to-live.
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Issue a session for `subject` and return its token.
    ///
    /// Any previous session of the same subject is invalidated.
    pub fn create(&self, subject: &Subject) -> String {
        self.issue(subject).token
    }

    /// Invalidate the subject's previous session (if any) and issue a new one.
    pub fn issue(&self, subject: &Subject) -> IssuedSession {
        let token = generate_token();
        let session = Session {
            token: token.clone(),
            subject: subject.clone(),
            created_at: Instant::now(),
        };

        let mut by_subject = self.by_subject.lock().unwrap_or_else(|e| e.into_inner());
        let evicted = by_subject.insert(subject.clone(), token.clone());
        if let Some(old) = &evicted {
            self.sessions.invalidate(old);
        }
        self.sessions.insert(token.clone(), session);

        IssuedSession { token, evicted }
    }

    /// Resolve a token to its subject.
    ///
    /// Expired entries are removed on the spot and reported as absent.
    pub fn lookup(&self, token: &str) -> Option<Subject> {
        let session = self.sessions.get(token)?;
        if session.is_expired(Instant::now(), self.ttl) {
            self.invalidate(token);
            return None;
        }
        Some(session.subject)
    }

    /// Remove a session by token. Idempotent; returns the subject it belonged to.
    pub fn invalidate(&self, token: &str) -> Option<Subject> {
        let mut by_subject = self.by_subject.lock().unwrap_or_else(|e| e.into_inner());
        let session = self.sessions.remove(token)?;
        if by_subject.get(&session.subject).map(String::as_str) == Some(token) {
            by_subject.remove(&session.subject);
        }
        Some(session.subject)
    }

    /// Remove the subject's session, returning its token if one was live.
    pub fn invalidate_by_subject(&self, subject: &Subject) -> Option<String> {
        let now = Instant::now();
        let mut by_subject = self.by_subject.lock().unwrap_or_else(|e| e.into_inner());
        let token = by_subject.remove(subject)?;
        let session = self.sessions.remove(&token)?;
        (!session.is_expired(now, self.ttl)).then_some(token)
    }

    /// Drop every expired session. Returns how many were removed.
    pub fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let expired: Vec<String> = self
            .sessions
            .iter()
            .filter(|(_, s)| s.is_expired(now, self.ttl))
            .map(|(token, _)| token.as_ref().clone())
            .collect();
        for token in &expired {
            self.invalidate(token);
        }

        // Entries the cache already evicted on its own clock leave stale
        // index slots behind.
        let mut by_subject = self.by_subject.lock().unwrap_or_else(|e| e.into_inner());
        by_subject.retain(|_, token| self.sessions.contains_key(token.as_str()));
        drop(by_subject);

        self.sessions.run_pending_tasks();
        expired.len()
    }

    /// Number of live (unexpired) sessions.
    pub fn len(&self) -> usize {
        let now = Instant::now();
        self.sessions
            .iter()
            .filter(|(_, s)| !s.is_expired(now, self.ttl))
            .count()
    }

    /// Whether no live session exists.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// 256 bits from two v4 UUIDs (OS randomness), hex encoded.
fn generate_token() -> String {
    format!("{}{}", Uuid::new_v4().simple(), Uuid::new_v4().simple())
}
