//! Server-side row constraints for the in-memory service: column existence, types,
//! NOT NULL, CHECK rules and uniqueness. Messages and SQLSTATE codes follow PostgreSQL.

use super::{value_eq, Row};
use crate::config::{ColumnInfo, ColumnRule, PgType, TableSpec};
use crate::error::RemoteError;
use regex::Regex;
use serde_json::Value;

/// Name used for a column's CHECK constraint, shared with the DDL.
pub fn check_constraint_name(table: &TableSpec, column: &str) -> String {
    format!("{}_{}_check", table.table_name, column)
}

/// Name used for a column's UNIQUE constraint, shared with the DDL.
pub fn unique_constraint_name(table: &TableSpec, column: &str) -> String {
    if column == table.pk_column {
        format!("{}_pkey", table.table_name)
    } else {
        format!("{}_{}_key", table.table_name, column)
    }
}

pub struct ConstraintChecker;

impl ConstraintChecker {
    /// Reject columns the table does not have.
    pub fn check_columns(table: &TableSpec, row: &Row) -> Result<(), RemoteError> {
        for key in row.keys() {
            if !table.has_column(key) {
                return Err(RemoteError::invalid_request(format!(
                    "column \"{}\" of relation \"{}\" does not exist",
                    key, table.table_name
                ))
                .with_code("42703"));
            }
        }
        Ok(())
    }

    /// Validate a complete row as it would be stored. `others` are the table's remaining rows.
    pub fn check_row<'a, I>(table: &TableSpec, row: &Row, others: I) -> Result<(), RemoteError>
    where
        I: IntoIterator<Item = &'a Row> + Clone,
    {
        Self::check_columns(table, row)?;
        for col in &table.columns {
            let val = row.get(&col.name).unwrap_or(&Value::Null);
            if val.is_null() {
                if !col.nullable {
                    return Err(RemoteError::constraint(format!(
                        "null value in column \"{}\" of relation \"{}\" violates not-null constraint",
                        col.name, table.table_name
                    ))
                    .with_code("23502"));
                }
                continue;
            }
            check_type(col, val)?;
            if !col.rule.is_empty() && !rule_holds(&col.rule, val)? {
                return Err(RemoteError::constraint(format!(
                    "new row for relation \"{}\" violates check constraint \"{}\"",
                    table.table_name,
                    check_constraint_name(table, &col.name)
                ))
                .with_code("23514"));
            }
            if col.primary_key || col.unique {
                let duplicate = others
                    .clone()
                    .into_iter()
                    .any(|other| other.get(&col.name).is_some_and(|o| value_eq(o, val)));
                if duplicate {
                    return Err(RemoteError::conflict(format!(
                        "duplicate key value violates unique constraint \"{}\"",
                        unique_constraint_name(table, &col.name)
                    ))
                    .with_code("23505"));
                }
            }
        }
        Ok(())
    }
}

fn check_type(col: &ColumnInfo, v: &Value) -> Result<(), RemoteError> {
    let ok = match col.pg_type {
        PgType::Uuid => v.as_str().is_some_and(|s| uuid::Uuid::parse_str(s).is_ok()),
        PgType::Text => v.is_string(),
        PgType::Boolean => v.is_boolean(),
        PgType::Integer => v.as_i64().is_some_and(|n| i32::try_from(n).is_ok()),
        PgType::BigInt => v.as_i64().is_some(),
        PgType::TimestampTz => v
            .as_str()
            .is_some_and(|s| chrono::DateTime::parse_from_rfc3339(s).is_ok()),
    };
    if ok {
        Ok(())
    } else {
        Err(RemoteError::invalid_request(format!(
            "invalid input syntax for type {}: {}",
            col.pg_type.as_sql(),
            v
        ))
        .with_code("22P02"))
    }
}

fn rule_holds(rule: &ColumnRule, v: &Value) -> Result<bool, RemoteError> {
    if let (Some(max), Some(s)) = (rule.max_length, v.as_str()) {
        if s.chars().count() > max as usize {
            return Ok(false);
        }
    }
    if let (Some(pattern), Some(s)) = (&rule.pattern, v.as_str()) {
        let re = Regex::new(pattern).map_err(|e| RemoteError::internal(format!("invalid check pattern: {}", e)))?;
        if !re.is_match(s) {
            return Ok(false);
        }
    }
    if let Some(allowed) = &rule.allowed {
        if !allowed.iter().any(|a| value_eq(v, a)) {
            return Ok(false);
        }
    }
    if let (Some(min), Some(n)) = (rule.minimum, v.as_i64()) {
        if n < min {
            return Ok(false);
        }
    }
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ColumnDefault;
    use crate::error::RemoteErrorKind;
    use rstest::rstest;
    use serde_json::json;

    fn produtos() -> TableSpec {
        TableSpec::new("public", "produtos")
            .column(ColumnInfo::new("id", PgType::Uuid).primary_key().default(ColumnDefault::RandomUuid))
            .column(ColumnInfo::new("codigo", PgType::Text).not_null().unique().max_length(8))
            .column(ColumnInfo::new("estoque", PgType::Integer).not_null().minimum(0))
            .column(ColumnInfo::new("tipo", PgType::Text).allowed(&["peca", "oleo"]))
    }

    fn row(v: Value) -> Row {
        match v {
            Value::Object(m) => m,
            _ => Row::new(),
        }
    }

    const ID: &str = "0b8a3c55-7a6e-4d43-9a55-2f1d33e2f001";

    #[test]
    fn accepts_valid_row() {
        let r = row(json!({"id": ID, "codigo": "OL-10", "estoque": 4, "tipo": "oleo"}));
        assert!(ConstraintChecker::check_row(&produtos(), &r, std::iter::empty::<&Row>()).is_ok());
    }

    #[rstest]
    #[case(json!({"id": ID, "estoque": 1}), RemoteErrorKind::Constraint, "23502")]
    #[case(json!({"id": ID, "codigo": "ABCDEFGHI", "estoque": 1}), RemoteErrorKind::Constraint, "23514")]
    #[case(json!({"id": ID, "codigo": "A", "estoque": -1}), RemoteErrorKind::Constraint, "23514")]
    #[case(json!({"id": ID, "codigo": "A", "estoque": 1, "tipo": "pneu"}), RemoteErrorKind::Constraint, "23514")]
    #[case(json!({"id": "not-a-uuid", "codigo": "A", "estoque": 1}), RemoteErrorKind::InvalidRequest, "22P02")]
    #[case(json!({"id": ID, "codigo": "A", "estoque": 1, "cor": "azul"}), RemoteErrorKind::InvalidRequest, "42703")]
    fn rejects_invalid_rows(#[case] value: Value, #[case] kind: RemoteErrorKind, #[case] code: &str) {
        let err = ConstraintChecker::check_row(&produtos(), &row(value), std::iter::empty::<&Row>()).unwrap_err();
        assert_eq!(err.kind, kind);
        assert_eq!(err.code.as_deref(), Some(code));
    }

    #[test]
    fn rejects_duplicate_unique_value() {
        let existing = row(json!({"id": "0b8a3c55-7a6e-4d43-9a55-2f1d33e2f002", "codigo": "A", "estoque": 1}));
        let candidate = row(json!({"id": ID, "codigo": "A", "estoque": 2}));
        let err = ConstraintChecker::check_row(&produtos(), &candidate, std::iter::once(&existing)).unwrap_err();
        assert_eq!(err.kind, RemoteErrorKind::Conflict);
        assert!(err.message.contains("produtos_codigo_key"));
    }
}
