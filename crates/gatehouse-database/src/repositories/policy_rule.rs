//! Policy rule repository implementation.

use sqlx::PgPool;
use tracing::debug;

use gatehouse_core::error::{AppError, ErrorKind};
use gatehouse_core::result::AppResult;
use gatehouse_core::types::PolicyRule;

/// Number of value columns in `policy_rules`.
pub const VALUE_COLUMNS: usize = 6;

/// One row of the `policy_rules` table.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct PolicyRuleRow {
    /// Section key.
    pub ptype: String,
    /// First value column.
    pub v0: String,
    /// Second value column.
    pub v1: String,
    /// Third value column.
    pub v2: String,
    /// Fourth value column.
    pub v3: String,
    /// Fifth value column.
    pub v4: String,
    /// Sixth value column.
    pub v5: String,
}

impl PolicyRuleRow {
    /// Build a row from a rule, padding unused columns with `''`.
    pub fn from_rule(rule: &PolicyRule) -> AppResult<Self> {
        if rule.values.is_empty() || rule.values.len() > VALUE_COLUMNS {
            return Err(AppError::validation(format!(
                "policy rule '{rule}' must have between 1 and {VALUE_COLUMNS} values"
            )));
        }

        let mut columns: [String; VALUE_COLUMNS] = Default::default();
        for (slot, value) in columns.iter_mut().zip(&rule.values) {
            *slot = value.clone();
        }
        let [v0, v1, v2, v3, v4, v5] = columns;

        Ok(Self {
            ptype: rule.ptype.clone(),
            v0,
            v1,
            v2,
            v3,
            v4,
            v5,
        })
    }

    /// Convert back to a rule, dropping trailing empty columns.
    pub fn into_rule(self) -> PolicyRule {
        let mut values = vec![self.v0, self.v1, self.v2, self.v3, self.v4, self.v5];
        while values.last().is_some_and(String::is_empty) {
            values.pop();
        }
        PolicyRule {
            ptype: self.ptype,
            values,
        }
    }
}

/// Repository for policy rule rows.
#[derive(Debug, Clone)]
pub struct PolicyRuleRepository {
    pool: PgPool,
}

impl PolicyRuleRepository {
    /// Create a new policy rule repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Load every rule in insertion order.
    pub async fn find_all(&self) -> AppResult<Vec<PolicyRule>> {
        let rows = sqlx::query_as::<_, PolicyRuleRow>(
            "SELECT ptype, v0, v1, v2, v3, v4, v5 FROM policy_rules ORDER BY id ASC",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to load policy rules", e))?;

        debug!(count = rows.len(), "Loaded policy rule rows");
        Ok(rows.into_iter().map(PolicyRuleRow::into_rule).collect())
    }

    /// Insert a rule. Returns `false` when an identical row already exists.
    pub async fn insert(&self, rule: &PolicyRule) -> AppResult<bool> {
        let row = PolicyRuleRow::from_rule(rule)?;
        let result = sqlx::query(
            "INSERT INTO policy_rules (ptype, v0, v1, v2, v3, v4, v5) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) \
             ON CONFLICT ON CONSTRAINT policy_rules_unique DO NOTHING",
        )
        .bind(&row.ptype)
        .bind(&row.v0)
        .bind(&row.v1)
        .bind(&row.v2)
        .bind(&row.v3)
        .bind(&row.v4)
        .bind(&row.v5)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to insert policy rule", e))?;

        Ok(result.rows_affected() == 1)
    }

    /// Delete a rule. Returns `false` when no row matched.
    pub async fn delete(&self, rule: &PolicyRule) -> AppResult<bool> {
        let row = PolicyRuleRow::from_rule(rule)?;
        let result = sqlx::query(
            "DELETE FROM policy_rules WHERE ptype = $1 AND v0 = $2 AND v1 = $3 \
             AND v2 = $4 AND v3 = $5 AND v4 = $6 AND v5 = $7",
        )
        .bind(&row.ptype)
        .bind(&row.v0)
        .bind(&row.v1)
        .bind(&row.v2)
        .bind(&row.v3)
        .bind(&row.v4)
        .bind(&row.v5)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to delete policy rule", e))?;

        Ok(result.rows_affected() > 0)
    }

    /// Atomically replace the whole table contents.
    pub async fn replace_all(&self, rules: &[PolicyRule]) -> AppResult<()> {
        let rows = rules
            .iter()
            .map(PolicyRuleRow::from_rule)
            .collect::<AppResult<Vec<_>>>()?;

        let mut tx = self.pool.begin().await.map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to begin transaction", e)
        })?;

        sqlx::query("DELETE FROM policy_rules")
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to clear policy rules", e)
            })?;

        for row in &rows {
            sqlx::query(
                "INSERT INTO policy_rules (ptype, v0, v1, v2, v3, v4, v5) \
                 VALUES ($1, $2, $3, $4, $5, $6, $7) \
                 ON CONFLICT ON CONSTRAINT policy_rules_unique DO NOTHING",
            )
            .bind(&row.ptype)
            .bind(&row.v0)
            .bind(&row.v1)
            .bind(&row.v2)
            .bind(&row.v3)
            .bind(&row.v4)
            .bind(&row.v5)
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to insert policy rule", e)
            })?;
        }

        tx.commit().await.map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to commit policy rules", e)
        })?;

        debug!(count = rows.len(), "Replaced policy rule rows");
        Ok(())
    }

    /// Check database connectivity.
    pub async fn health_check(&self) -> AppResult<bool> {
        sqlx::query_scalar::<_, i32>("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .map(|v| v == 1)
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Health check failed", e))
    }
}
