//! Durable policy rule tuples.
//!
//! A rule is a section key (`p` for permissions, `g` for role links) followed
//! by positional values whose meaning is given by the model definition. The
//! canonical permission rule is `p, subject, object, action`.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// Section key of permission rules.
pub const PERMISSION_PTYPE: &str = "p";
/// Section key of role-link rules.
pub const GROUPING_PTYPE: &str = "g";

/// A single durable policy rule.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PolicyRule {
    /// Section key (`p`, `g`, `p2`, `g2`, ...).
    pub ptype: String,
    /// Positional values, interpreted by the model.
    pub values: Vec<String>,
}

impl PolicyRule {
    /// Build a rule from a section key and its values.
    pub fn new<I, S>(ptype: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            ptype: ptype.into(),
            values: values.into_iter().map(Into::into).collect(),
        }
    }

    /// A `p, subject, object, action` rule.
    pub fn permission(
        subject: impl Into<String>,
        object: impl Into<String>,
        action: impl Into<String>,
    ) -> Self {
        Self::new(
            PERMISSION_PTYPE,
            [subject.into(), object.into(), action.into()],
        )
    }

    /// A `g, member, role` rule.
    pub fn grouping(member: impl Into<String>, role: impl Into<String>) -> Self {
        Self::new(GROUPING_PTYPE, [member.into(), role.into()])
    }

    /// Whether this rule is a role link (`g`, `g2`, ...).
    pub fn is_grouping(&self) -> bool {
        self.ptype.starts_with('g')
    }

    /// Whether this rule is a permission rule (`p`, `p2`, ...).
    pub fn is_permission(&self) -> bool {
        self.ptype.starts_with('p')
    }

    /// Value at `index`, if present.
    pub fn value(&self, index: usize) -> Option<&str> {
        self.values.get(index).map(String::as_str)
    }

    /// Parse one line of the flat policy format.
    ///
    /// Blank lines and `#` comments yield `Ok(None)`. Fields are comma
    /// separated and trimmed.
    pub fn parse_line(line: &str) -> Result<Option<Self>, AppError> {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            return Ok(None);
        }

        let mut fields = trimmed.split(',').map(str::trim);
        let ptype = fields.next().unwrap_or_default();
        if !(ptype.starts_with('p') || ptype.starts_with('g')) {
            return Err(AppError::validation(format!(
                "policy line has unknown section key '{ptype}'"
            )));
        }

        let values: Vec<String> = fields.map(String::from).collect();
        if values.is_empty() || values.iter().any(String::is_empty) {
            return Err(AppError::validation(format!(
                "policy line '{trimmed}' has empty fields"
            )));
        }

        Ok(Some(Self {
            ptype: ptype.to_string(),
            values,
        }))
    }

    /// Render in the flat policy format.
    pub fn to_line(&self) -> String {
        let mut line = self.ptype.clone();
        for value in &self.values {
            line.push_str(", ");
            line.push_str(value);
        }
        line
    }
}

impl fmt::Display for PolicyRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_line())
    }
}
