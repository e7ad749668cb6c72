//! Access-control model definitions.
//!
//! A model is an INI-style text with five sections:
//!
//! ```text
//! [request_definition]
//! r = sub, obj, act
//!
//! [policy_definition]
//! p = sub, obj, act
//!
//! [role_definition]
//! g = _, _
//!
//! [policy_effect]
//! e = some(where (p.eft == allow))
//!
//! [matchers]
//! m = g(r.sub, p.sub) && r.obj == p.obj && r.act == p.act
//! ```
//!
//! `[role_definition]` is optional. The model is compiled once; evaluation
//! reuses the compiled matcher for every decision.

use std::fmt;
use std::path::Path;

use gatehouse_core::types::PolicyRule;
use gatehouse_core::types::policy_rule::PERMISSION_PTYPE;

use crate::error::PolicyError;
use crate::matcher::{self, Definitions, Expr};

/// Model used when no model file is configured.
pub const DEFAULT_MODEL: &str = r#"[request_definition]
r = sub, obj, act

[policy_definition]
p = sub, obj, act

[role_definition]
g = _, _

[policy_effect]
e = some(where (p.eft == allow))

[matchers]
m = g(r.sub, p.sub) && r.obj == p.obj && r.act == p.act
"#;

/// How matched rules combine into a decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Effect {
    /// `some(where (p.eft == allow))`
    AllowOverride,
    /// `!some(where (p.eft == deny))`
    DenyOverride,
    /// `some(where (p.eft == allow)) && !some(where (p.eft == deny))`
    AllowAndDeny,
}

impl Effect {
    fn parse(source: &str) -> Result<Self, PolicyError> {
        let compact: String = source.chars().filter(|c| !c.is_whitespace()).collect();
        match compact.as_str() {
            "some(where(p.eft==allow))" => Ok(Self::AllowOverride),
            "!some(where(p.eft==deny))" => Ok(Self::DenyOverride),
            "some(where(p.eft==allow))&&!some(where(p.eft==deny))" => Ok(Self::AllowAndDeny),
            _ => Err(PolicyError::UnsupportedEffect(source.to_string())),
        }
    }
}

impl fmt::Display for Effect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AllowOverride => write!(f, "allow-override"),
            Self::DenyOverride => write!(f, "deny-override"),
            Self::AllowAndDeny => write!(f, "allow-and-deny"),
        }
    }
}

/// Effect recorded by one matching rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleEffect {
    Allow,
    Deny,
    /// `eft` held something other than `allow` or `deny`.
    Indeterminate,
}

/// A compiled access-control model.
#[derive(Debug, Clone)]
pub struct Model {
    request: Vec<String>,
    policy: Vec<String>,
    roles: Vec<String>,
    effect: Effect,
    matcher: Expr,
    matcher_source: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    Request,
    Policy,
    Role,
    Effect,
    Matchers,
}

impl Section {
    fn from_header(name: &str) -> Result<Self, PolicyError> {
        match name {
            "request_definition" => Ok(Self::Request),
            "policy_definition" => Ok(Self::Policy),
            "role_definition" => Ok(Self::Role),
            "policy_effect" => Ok(Self::Effect),
            "matchers" => Ok(Self::Matchers),
            other => Err(PolicyError::InvalidModel(format!(
                "unknown section [{other}]"
            ))),
        }
    }

    fn key(self) -> &'static str {
        match self {
            Self::Request => "r",
            Self::Policy => "p",
            Self::Role => "g",
            Self::Effect => "e",
            Self::Matchers => "m",
        }
    }
}

impl Model {
    /// Read and compile a model file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, PolicyError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| PolicyError::ModelRead {
            path: path.display().to_string(),
            source,
        })?;
        Self::parse(&text)
    }

    /// Compile a model from its text.
    pub fn parse(text: &str) -> Result<Self, PolicyError> {
        let mut section: Option<Section> = None;
        let mut request = None;
        let mut policy = None;
        let mut roles = Vec::new();
        let mut effect = None;
        let mut matcher = None;

        for (number, raw) in text.lines().enumerate() {
            let line = raw.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            if let Some(header) = line.strip_prefix('[').and_then(|l| l.strip_suffix(']')) {
                section = Some(Section::from_header(header.trim())?);
                continue;
            }

            let current = section.ok_or_else(|| {
                PolicyError::InvalidModel(format!("line {} is outside any section", number + 1))
            })?;
            let (key, value) = line.split_once('=').ok_or_else(|| {
                PolicyError::InvalidModel(format!("line {} is not `key = value`", number + 1))
            })?;
            let (key, value) = (key.trim(), value.trim());

            let expected = current.key();
            let key_ok = match current {
                Section::Role => key.starts_with(expected),
                _ => key == expected,
            };
            if !key_ok {
                return Err(PolicyError::InvalidModel(format!(
                    "unexpected key `{key}` on line {}, expected `{expected}`",
                    number + 1
                )));
            }

            match current {
                Section::Request => request = Some(parse_fields(key, value)?),
                Section::Policy => policy = Some(parse_fields(key, value)?),
                Section::Role => {
                    let arity = value.split(',').map(str::trim).collect::<Vec<_>>();
                    if arity != ["_", "_"] {
                        return Err(PolicyError::InvalidModel(format!(
                            "role definition `{key}` must be `_, _`"
                        )));
                    }
                    if roles.iter().any(|r| r == key) {
                        return Err(PolicyError::InvalidModel(format!(
                            "role definition `{key}` is declared twice"
                        )));
                    }
                    roles.push(key.to_string());
                }
                Section::Effect => effect = Some(Effect::parse(value)?),
                Section::Matchers => matcher = Some(value.to_string()),
            }
        }

        let request = request.ok_or_else(|| missing("request_definition"))?;
        let policy = policy.ok_or_else(|| missing("policy_definition"))?;
        let effect = effect.ok_or_else(|| missing("policy_effect"))?;
        let matcher_source = matcher.ok_or_else(|| missing("matchers"))?;

        let matcher = matcher::parse_matcher(
            &matcher_source,
            Definitions {
                request: &request,
                policy: &policy,
                roles: &roles,
            },
        )?;

        Ok(Self {
            request,
            policy,
            roles,
            effect,
            matcher,
            matcher_source,
        })
    }

    /// Request field names, in order.
    pub fn request_fields(&self) -> &[String] {
        &self.request
    }

    /// Rule field names, in order.
    pub fn policy_fields(&self) -> &[String] {
        &self.policy
    }

    /// Declared role definition keys.
    pub fn role_keys(&self) -> &[String] {
        &self.roles
    }

    /// The effect combinator.
    pub fn effect(&self) -> Effect {
        self.effect
    }

    /// The compiled matcher.
    pub fn matcher(&self) -> &Expr {
        &self.matcher
    }

    /// The matcher as written.
    pub fn matcher_source(&self) -> &str {
        &self.matcher_source
    }

    /// Effect a matching rule contributes.
    pub fn rule_effect(&self, rule: &PolicyRule) -> RuleEffect {
        let Some(index) = self.policy.iter().position(|f| f == "eft") else {
            return RuleEffect::Allow;
        };
        match rule.value(index) {
            None | Some("allow") => RuleEffect::Allow,
            Some("deny") => RuleEffect::Deny,
            Some(_) => RuleEffect::Indeterminate,
        }
    }

    /// Check that a rule fits this model before it is persisted.
    pub fn validate_rule(&self, rule: &PolicyRule) -> Result<(), PolicyError> {
        if rule.values.iter().any(|v| v.trim().is_empty()) {
            return Err(PolicyError::InvalidRule(format!(
                "rule '{rule}' has empty values"
            )));
        }

        // Values are stored one rule per line, comma separated, trimmed.
        if let Some(value) = rule
            .values
            .iter()
            .find(|v| v.contains([',', '\r', '\n']) || v.trim() != v.as_str())
        {
            return Err(PolicyError::InvalidRule(format!(
                "rule value {value:?} contains a separator or surrounding whitespace"
            )));
        }

        if rule.ptype == PERMISSION_PTYPE {
            let optional_eft = usize::from(self.policy.iter().any(|f| f == "eft"));
            let max = self.policy.len();
            let min = max - optional_eft;
            if rule.values.len() < min || rule.values.len() > max {
                return Err(PolicyError::InvalidRule(format!(
                    "rule '{rule}' has {} values, the model defines {}",
                    rule.values.len(),
                    self.policy.join(", ")
                )));
            }
            return Ok(());
        }

        if self.roles.iter().any(|r| *r == rule.ptype) {
            if rule.values.len() != 2 {
                return Err(PolicyError::InvalidRule(format!(
                    "role link '{rule}' needs exactly a member and a role"
                )));
            }
            return Ok(());
        }

        Err(PolicyError::InvalidRule(format!(
            "section key '{}' is not defined by the model",
            rule.ptype
        )))
    }
}

fn parse_fields(key: &str, value: &str) -> Result<Vec<String>, PolicyError> {
    let fields: Vec<String> = value.split(',').map(|f| f.trim().to_string()).collect();
    if fields.iter().any(String::is_empty) {
        return Err(PolicyError::InvalidModel(format!(
            "definition `{key}` has an empty field"
        )));
    }
    for (i, field) in fields.iter().enumerate() {
        if fields[..i].contains(field) {
            return Err(PolicyError::InvalidModel(format!(
                "definition `{key}` repeats field `{field}`"
            )));
        }
    }
    Ok(fields)
}

fn missing(section: &str) -> PolicyError {
    PolicyError::InvalidModel(format!("missing [{section}] section"))
}
