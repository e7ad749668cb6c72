//! Policy enforcement: evaluates the compiled model against a rule snapshot.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tracing::{debug, info};

use gatehouse_core::config::{PolicyConfig, ReloadMode};
use gatehouse_core::error::{AppError, ErrorKind};
use gatehouse_core::result::AppResult;
use gatehouse_core::traits::PolicyStore;
use gatehouse_core::types::PolicyRule;
use gatehouse_core::types::policy_rule::PERMISSION_PTYPE;

use crate::error::PolicyError;
use crate::matcher::{self, EvalContext};
use crate::model::{Effect, Model, RuleEffect};
use crate::role::RoleGraph;

/// Rules and role graphs loaded from the store at one point in time.
#[derive(Debug, Default)]
pub struct PolicySnapshot {
    /// Permission rules in storage order.
    permissions: Vec<PolicyRule>,
    /// Role graphs keyed by role definition.
    roles: HashMap<String, RoleGraph>,
}

impl PolicySnapshot {
    /// Split a loaded rule set into permissions and role graphs.
    pub fn build(model: &Model, rules: Vec<PolicyRule>) -> Result<Self, PolicyError> {
        let mut roles = HashMap::new();
        for key in model.role_keys() {
            roles.insert(key.clone(), RoleGraph::from_rules(key, &rules)?);
        }
        let permissions = rules
            .into_iter()
            .filter(|r| r.ptype == PERMISSION_PTYPE)
            .collect();
        Ok(Self { permissions, roles })
    }

    /// Decide a request against this snapshot.
    pub fn decide(&self, model: &Model, request: &[&str]) -> Result<bool, PolicyError> {
        let expected = model.request_fields().len();
        if request.len() != expected {
            return Err(PolicyError::RequestArity {
                expected,
                actual: request.len(),
            });
        }

        let effect = model.effect();

        // With no permission rules the matcher still runs once, reading
        // every `p` field as empty.
        if self.permissions.is_empty() {
            let matched = matcher::evaluate(
                model.matcher(),
                &EvalContext {
                    request,
                    rule: &[],
                    roles: &self.roles,
                },
            )?;
            return Ok(match effect {
                Effect::AllowOverride | Effect::AllowAndDeny => matched,
                Effect::DenyOverride => true,
            });
        }

        let mut allowed = false;
        let mut denied = false;
        for rule in &self.permissions {
            let ctx = EvalContext {
                request,
                rule: &rule.values,
                roles: &self.roles,
            };
            if !matcher::evaluate(model.matcher(), &ctx)? {
                continue;
            }
            match model.rule_effect(rule) {
                RuleEffect::Allow => allowed = true,
                RuleEffect::Deny => denied = true,
                RuleEffect::Indeterminate => {}
            }
            match effect {
                Effect::AllowOverride if allowed => break,
                Effect::DenyOverride | Effect::AllowAndDeny if denied => break,
                _ => {}
            }
        }

        Ok(match effect {
            Effect::AllowOverride => allowed,
            Effect::DenyOverride => !denied,
            Effect::AllowAndDeny => allowed && !denied,
        })
    }
}

#[derive(Debug, Default)]
struct SnapshotCache {
    /// Bumped on every write issued through the enforcer.
    generation: u64,
    snapshot: Option<Arc<PolicySnapshot>>,
}

/// Evaluates `(subject, object, action)` requests against the durable policy.
///
/// The model is compiled once. Rules come from the [`PolicyStore`] either on
/// every decision ([`ReloadMode::PerRequest`]) or from a snapshot that writes
/// through this enforcer invalidate ([`ReloadMode::OnWrite`]).
#[derive(Debug)]
pub struct PolicyEnforcer {
    model: Arc<Model>,
    store: Arc<dyn PolicyStore>,
    load_timeout: Duration,
    reload: ReloadMode,
    cache: Mutex<SnapshotCache>,
}

impl PolicyEnforcer {
    /// Create an enforcer over a compiled model and a store.
    pub fn new(
        model: Model,
        store: Arc<dyn PolicyStore>,
        load_timeout: Duration,
        reload: ReloadMode,
    ) -> Self {
        Self {
            model: Arc::new(model),
            store,
            load_timeout,
            reload,
            cache: Mutex::new(SnapshotCache::default()),
        }
    }

    /// Load the model file named in `config` and build an enforcer.
    ///
    /// A missing or malformed model is an initialization failure.
    pub fn from_config(config: &PolicyConfig, store: Arc<dyn PolicyStore>) -> AppResult<Self> {
        let model = Model::from_file(&config.model_path).map_err(AppError::from)?;
        info!(
            model = %config.model_path,
            store = store.backend(),
            effect = %model.effect(),
            reload = ?config.reload,
            "Policy enforcer initialized"
        );
        Ok(Self::new(model, store, config.load_timeout(), config.reload))
    }

    /// The compiled model.
    pub fn model(&self) -> &Model {
        &self.model
    }

    /// The backing store.
    pub fn store(&self) -> &Arc<dyn PolicyStore> {
        &self.store
    }

    /// Decide whether `subject` may perform `action` on `object`.
    pub async fn enforce(&self, subject: &str, object: &str, action: &str) -> AppResult<bool> {
        self.enforce_request(&[subject, object, action]).await
    }

    /// Decide an arbitrary request tuple, ordered as the model's request definition.
    pub async fn enforce_request(&self, request: &[&str]) -> AppResult<bool> {
        let snapshot = self.snapshot().await?;
        let allowed = snapshot.decide(&self.model, request)?;
        debug!(request = ?request, allowed, "Policy decision");
        Ok(allowed)
    }

    /// Load every rule from the store, bounded by the load timeout.
    pub async fn policies(&self) -> AppResult<Vec<PolicyRule>> {
        match tokio::time::timeout(self.load_timeout, self.store.load_policies()).await {
            Ok(Ok(rules)) => Ok(rules),
            Ok(Err(e)) => Err(AppError::with_source(
                ErrorKind::Enforcement,
                format!("Failed to load policy rules: {}", e.message),
                e,
            )),
            Err(_) => Err(PolicyError::LoadTimeout(self.load_timeout).into()),
        }
    }

    /// Persist one rule. Returns `false` if it already existed.
    pub async fn add_policy(&self, rule: &PolicyRule) -> AppResult<bool> {
        self.validate(rule)?;
        let added = self.store.add_policy(rule).await?;
        self.invalidate();
        if added {
            info!(rule = %rule, "Policy rule added");
        }
        Ok(added)
    }

    /// Delete one rule. Returns `false` if it was not present.
    pub async fn remove_policy(&self, rule: &PolicyRule) -> AppResult<bool> {
        let removed = self.store.remove_policy(rule).await?;
        self.invalidate();
        if removed {
            info!(rule = %rule, "Policy rule removed");
        }
        Ok(removed)
    }

    /// Replace the whole rule set.
    pub async fn save_policy(&self, rules: &[PolicyRule]) -> AppResult<()> {
        for rule in rules {
            self.validate(rule)?;
        }
        self.store.save_policy(rules).await?;
        self.invalidate();
        info!(count = rules.len(), "Policy rule set replaced");
        Ok(())
    }

    /// Drop any cached snapshot so the next decision reloads.
    pub fn invalidate(&self) {
        let mut cache = self.cache.lock().unwrap_or_else(|e| e.into_inner());
        cache.generation += 1;
        cache.snapshot = None;
    }

    fn validate(&self, rule: &PolicyRule) -> AppResult<()> {
        self.model
            .validate_rule(rule)
            .map_err(|e| AppError::validation(e.to_string()))
    }

    async fn snapshot(&self) -> AppResult<Arc<PolicySnapshot>> {
        let generation = {
            let cache = self.cache.lock().unwrap_or_else(|e| e.into_inner());
            if self.reload == ReloadMode::OnWrite {
                if let Some(snapshot) = &cache.snapshot {
                    return Ok(Arc::clone(snapshot));
                }
            }
            cache.generation
        };

        let rules = self.policies().await?;
        let snapshot = Arc::new(PolicySnapshot::build(&self.model, rules)?);

        if self.reload == ReloadMode::OnWrite {
            let mut cache = self.cache.lock().unwrap_or_else(|e| e.into_inner());
            // A write landed while loading; keep serving fresh loads.
            if cache.generation == generation {
                cache.snapshot = Some(Arc::clone(&snapshot));
            }
        }
        Ok(snapshot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::MemoryPolicyStore;
    use crate::model::DEFAULT_MODEL;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Store that counts loads and can be made slow or failing.
    #[derive(Debug, Default)]
    struct CountingStore {
        inner: MemoryPolicyStore,
        loads: AtomicUsize,
        delay: Option<Duration>,
        fail: bool,
    }

    #[async_trait]
    impl PolicyStore for CountingStore {
        async fn load_policies(&self) -> AppResult<Vec<PolicyRule>> {
            self.loads.fetch_add(1, Ordering::SeqCst);
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            if self.fail {
                return Err(AppError::storage("backend offline"));
            }
            self.inner.load_policies().await
        }
        async fn save_policy(&self, rules: &[PolicyRule]) -> AppResult<()> {
            self.inner.save_policy(rules).await
        }
        async fn add_policy(&self, rule: &PolicyRule) -> AppResult<bool> {
            self.inner.add_policy(rule).await
        }
        async fn remove_policy(&self, rule: &PolicyRule) -> AppResult<bool> {
            self.inner.remove_policy(rule).await
        }
        fn backend(&self) -> &'static str {
            "counting"
        }
        async fn health_check(&self) -> AppResult<bool> {
            Ok(!self.fail)
        }
    }

    fn reference_rules() -> Vec<PolicyRule> {
        vec![
            PolicyRule::permission("alice", "resource", "read"),
            PolicyRule::permission("admin", "resource", "write"),
            PolicyRule::grouping("bob", "admin"),
        ]
    }

    fn enforcer(store: Arc<dyn PolicyStore>, reload: ReloadMode) -> PolicyEnforcer {
        PolicyEnforcer::new(
            Model::parse(DEFAULT_MODEL).unwrap(),
            store,
            Duration::from_millis(200),
            reload,
        )
    }

    #[tokio::test]
    async fn decides_direct_and_role_based_access() {
        let store = Arc::new(MemoryPolicyStore::new(reference_rules()));
        let enforcer = enforcer(store, ReloadMode::PerRequest);

        assert!(enforcer.enforce("alice", "resource", "read").await.unwrap());
        assert!(!enforcer.enforce("alice", "resource", "write").await.unwrap());
        assert!(enforcer.enforce("bob", "resource", "write").await.unwrap());
        assert!(!enforcer.enforce("bob", "resource", "read").await.unwrap());
        assert!(!enforcer.enforce("mallory", "resource", "read").await.unwrap());
    }

    #[tokio::test]
    async fn repeated_decisions_are_stable() {
        let store = Arc::new(MemoryPolicyStore::new(reference_rules()));
        let enforcer = enforcer(store, ReloadMode::PerRequest);
        for _ in 0..5 {
            assert!(enforcer.enforce("alice", "resource", "read").await.unwrap());
            assert!(!enforcer.enforce("alice", "resource", "write").await.unwrap());
        }
    }

    #[tokio::test]
    async fn per_request_mode_sees_out_of_band_writes() {
        let store = Arc::new(MemoryPolicyStore::new(reference_rules()));
        let enforcer = enforcer(store.clone(), ReloadMode::PerRequest);
        let write = PolicyRule::permission("alice", "resource", "write");

        assert!(!enforcer.enforce("alice", "resource", "write").await.unwrap());
        store.add_policy(&write).await.unwrap();
        assert!(enforcer.enforce("alice", "resource", "write").await.unwrap());
        store.remove_policy(&write).await.unwrap();
        assert!(!enforcer.enforce("alice", "resource", "write").await.unwrap());
    }

    #[tokio::test]
    async fn on_write_mode_caches_until_enforcer_write() {
        let store = Arc::new(CountingStore {
            inner: MemoryPolicyStore::new(reference_rules()),
            ..CountingStore::default()
        });
        let enforcer = enforcer(store.clone(), ReloadMode::OnWrite);

        assert!(enforcer.enforce("alice", "resource", "read").await.unwrap());
        assert!(enforcer.enforce("alice", "resource", "read").await.unwrap());
        assert_eq!(store.loads.load(Ordering::SeqCst), 1);

        let write = PolicyRule::permission("alice", "resource", "write");
        assert!(enforcer.add_policy(&write).await.unwrap());
        assert!(enforcer.enforce("alice", "resource", "write").await.unwrap());
        assert_eq!(store.loads.load(Ordering::SeqCst), 2);

        assert!(enforcer.remove_policy(&write).await.unwrap());
        assert!(!enforcer.enforce("alice", "resource", "write").await.unwrap());
    }

    #[tokio::test]
    async fn store_failure_is_an_enforcement_error() {
        let store = Arc::new(CountingStore {
            fail: true,
            ..CountingStore::default()
        });
        let enforcer = enforcer(store, ReloadMode::PerRequest);
        let err = enforcer.enforce("alice", "resource", "read").await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::Enforcement);
        assert!(err.message.contains("backend offline"));
    }

    #[tokio::test(start_paused = true)]
    async fn slow_store_times_out() {
        let store = Arc::new(CountingStore {
            delay: Some(Duration::from_secs(5)),
            ..CountingStore::default()
        });
        let enforcer = enforcer(store, ReloadMode::PerRequest);
        let err = enforcer.enforce("alice", "resource", "read").await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::Enforcement);
        assert!(err.message.contains("timed out"));
    }

    #[tokio::test]
    async fn wrong_arity_is_rejected() {
        let store = Arc::new(MemoryPolicyStore::new(reference_rules()));
        let enforcer = enforcer(store, ReloadMode::PerRequest);
        let err = enforcer.enforce_request(&["alice", "resource"]).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::Enforcement);
    }

    #[tokio::test]
    async fn writes_are_validated_against_the_model() {
        let store = Arc::new(MemoryPolicyStore::default());
        let enforcer = enforcer(store, ReloadMode::PerRequest);
        let err = enforcer
            .add_policy(&PolicyRule::new("p", ["alice", "resource"]))
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::Validation);
    }

    #[tokio::test]
    async fn separator_in_value_cannot_forge_rules_in_policy_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("policy.csv");
        std::fs::write(&path, "p, alice, resource, read\n").unwrap();
        let store = Arc::new(crate::adapter::FilePolicyStore::new(&path));
        let enforcer = enforcer(store, ReloadMode::PerRequest);

        let comma = PolicyRule::permission("a,b", "resource", "read");
        let err = enforcer.add_policy(&comma).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::Validation);

        let newline = PolicyRule::permission("carol", "resource", "read\np, mallory, resource, write");
        let err = enforcer.add_policy(&newline).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::Validation);

        let padded = PolicyRule::permission(" carol", "resource", "read");
        let err = enforcer.add_policy(&padded).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::Validation);

        assert!(!enforcer.enforce("mallory", "resource", "write").await.unwrap());
        assert!(!enforcer.enforce("a", "resource", "read").await.unwrap());
        assert_eq!(
            std::fs::read_to_string(&path).unwrap(),
            "p, alice, resource, read\n"
        );
    }

    #[tokio::test]
    async fn bulk_save_rejects_separator_values() {
        let store = Arc::new(MemoryPolicyStore::new(reference_rules()));
        let enforcer = enforcer(store, ReloadMode::PerRequest);
        let err = enforcer
            .save_policy(&[PolicyRule::grouping("eve", "admin\ng, mallory")])
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::Validation);
        assert!(enforcer.enforce("bob", "resource", "write").await.unwrap());
    }

    #[test]
    fn deny_override_blocks_matching_deny_rule() {
        let model = Model::parse(
            &DEFAULT_MODEL
                .replace("p = sub, obj, act", "p = sub, obj, act, eft")
                .replace(
                    "some(where (p.eft == allow))",
                    "some(where (p.eft == allow)) && !some(where (p.eft == deny))",
                ),
        )
        .unwrap();
        let rules = vec![
            PolicyRule::new("p", ["admin", "resource", "write", "allow"]),
            PolicyRule::new("p", ["bob", "resource", "write", "deny"]),
            PolicyRule::grouping("bob", "admin"),
            PolicyRule::grouping("carol", "admin"),
        ];
        let snapshot = PolicySnapshot::build(&model, rules).unwrap();
        assert!(!snapshot.decide(&model, &["bob", "resource", "write"]).unwrap());
        assert!(snapshot.decide(&model, &["carol", "resource", "write"]).unwrap());
        assert!(!snapshot.decide(&model, &["dave", "resource", "write"]).unwrap());
    }

    #[test]
    fn empty_rule_set_denies_under_allow_override() {
        let model = Model::parse(DEFAULT_MODEL).unwrap();
        let snapshot = PolicySnapshot::build(&model, Vec::new()).unwrap();
        assert!(snapshot.permissions.is_empty());
        assert!(!snapshot.decide(&model, &["alice", "resource", "read"]).unwrap());
    }
}
