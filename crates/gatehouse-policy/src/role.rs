//! Role links built from `g` rules.

use std::collections::{HashMap, HashSet, VecDeque};

use gatehouse_core::types::PolicyRule;

use crate::error::PolicyError;

/// Maximum number of links followed when resolving membership.
pub const MAX_DEPTH: usize = 10;

/// Directed member → role links for one role definition.
#[derive(Debug, Clone, Default)]
pub struct RoleGraph {
    links: HashMap<String, Vec<String>>,
}

impl RoleGraph {
    /// Create an empty graph.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a graph from the rules whose section key is `key`.
    pub fn from_rules<'a>(
        key: &str,
        rules: impl IntoIterator<Item = &'a PolicyRule>,
    ) -> Result<Self, PolicyError> {
        let mut graph = Self::new();
        for rule in rules.into_iter().filter(|r| r.ptype == key) {
            match (rule.value(0), rule.value(1)) {
                (Some(member), Some(role)) => graph.add_link(member, role),
                _ => {
                    return Err(PolicyError::InvalidRule(format!(
                        "role link '{rule}' needs a member and a role"
                    )));
                }
            }
        }
        Ok(graph)
    }

    /// Record that `member` holds `role`.
    pub fn add_link(&mut self, member: &str, role: &str) {
        let roles = self.links.entry(member.to_string()).or_default();
        if !roles.iter().any(|r| r == role) {
            roles.push(role.to_string());
        }
    }

    /// Whether `member` holds `role`, directly or through intermediate roles.
    ///
    /// A name always holds itself. Cycles are tolerated and chains longer
    /// than [`MAX_DEPTH`] are not followed.
    pub fn has_link(&self, member: &str, role: &str) -> bool {
        if member == role {
            return true;
        }

        let mut visited: HashSet<&str> = HashSet::from([member]);
        let mut queue: VecDeque<(&str, usize)> = VecDeque::from([(member, 0)]);

        while let Some((current, depth)) = queue.pop_front() {
            if depth >= MAX_DEPTH {
                continue;
            }
            for parent in self.links.get(current).into_iter().flatten() {
                if parent == role {
                    return true;
                }
                if visited.insert(parent.as_str()) {
                    queue.push_back((parent.as_str(), depth + 1));
                }
            }
        }
        false
    }

    /// Number of members with at least one link.
    pub fn len(&self) -> usize {
        self.links.len()
    }

    /// Whether the graph has no links.
    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }
}
