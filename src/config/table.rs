//! Table metadata: columns, defaults and check rules for each shop resource.
//! Drives SQL generation, DDL and the in-memory service's constraint checks.

use serde_json::Value;

/// Soft-delete flag carried by every shop table.
pub const ACTIVE_COLUMN: &str = "is_active";
pub const CREATED_AT_COLUMN: &str = "created_at";
pub const UPDATED_AT_COLUMN: &str = "updated_at";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PgType {
    Uuid,
    Text,
    Boolean,
    Integer,
    BigInt,
    TimestampTz,
}

impl PgType {
    pub fn as_sql(&self) -> &'static str {
        match self {
            PgType::Uuid => "uuid",
            PgType::Text => "text",
            PgType::Boolean => "boolean",
            PgType::Integer => "integer",
            PgType::BigInt => "bigint",
            PgType::TimestampTz => "timestamptz",
        }
    }
}

/// Value the service fills in when an insert omits the column.
#[derive(Clone, Debug, PartialEq)]
pub enum ColumnDefault {
    RandomUuid,
    Now,
    Bool(bool),
    Int(i64),
}

impl ColumnDefault {
    pub fn as_sql(&self) -> String {
        match self {
            ColumnDefault::RandomUuid => "gen_random_uuid()".into(),
            ColumnDefault::Now => "NOW()".into(),
            ColumnDefault::Bool(b) => b.to_string(),
            ColumnDefault::Int(n) => n.to_string(),
        }
    }

    pub fn generate(&self) -> Value {
        match self {
            ColumnDefault::RandomUuid => Value::String(uuid::Uuid::new_v4().to_string()),
            ColumnDefault::Now => Value::String(chrono::Utc::now().to_rfc3339()),
            ColumnDefault::Bool(b) => Value::Bool(*b),
            ColumnDefault::Int(n) => Value::Number((*n).into()),
        }
    }
}

/// Check rules enforced by the service, never by the client.
#[derive(Clone, Debug, Default)]
pub struct ColumnRule {
    pub max_length: Option<u32>,
    pub pattern: Option<String>,
    pub allowed: Option<Vec<Value>>,
    pub minimum: Option<i64>,
}

impl ColumnRule {
    pub fn is_empty(&self) -> bool {
        self.max_length.is_none() && self.pattern.is_none() && self.allowed.is_none() && self.minimum.is_none()
    }
}

#[derive(Clone, Debug)]
pub struct ColumnInfo {
    pub name: String,
    pub pg_type: PgType,
    pub primary_key: bool,
    pub nullable: bool,
    pub unique: bool,
    pub default: Option<ColumnDefault>,
    pub rule: ColumnRule,
}

impl ColumnInfo {
    pub fn new(name: &str, pg_type: PgType) -> Self {
        ColumnInfo {
            name: name.to_string(),
            pg_type,
            primary_key: false,
            nullable: true,
            unique: false,
            default: None,
            rule: ColumnRule::default(),
        }
    }

    pub fn primary_key(mut self) -> Self {
        self.primary_key = true;
        self.nullable = false;
        self
    }

    pub fn not_null(mut self) -> Self {
        self.nullable = false;
        self
    }

    pub fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    pub fn default(mut self, default: ColumnDefault) -> Self {
        self.default = Some(default);
        self
    }

    pub fn max_length(mut self, n: u32) -> Self {
        self.rule.max_length = Some(n);
        self
    }

    pub fn pattern(mut self, pattern: &str) -> Self {
        self.rule.pattern = Some(pattern.to_string());
        self
    }

    pub fn allowed(mut self, values: &[&str]) -> Self {
        self.rule.allowed = Some(values.iter().map(|v| Value::String((*v).to_string())).collect());
        self
    }

    pub fn minimum(mut self, n: i64) -> Self {
        self.rule.minimum = Some(n);
        self
    }

    /// Insert must supply a non-null value: NOT NULL without a default.
    pub fn is_required(&self) -> bool {
        !self.nullable && self.default.is_none()
    }
}

#[derive(Clone, Debug)]
pub struct TableSpec {
    pub schema_name: String,
    pub table_name: String,
    pub pk_column: String,
    /// Column used to order list results.
    pub order_column: String,
    pub columns: Vec<ColumnInfo>,
}

impl TableSpec {
    pub fn new(schema_name: &str, table_name: &str) -> Self {
        TableSpec {
            schema_name: schema_name.to_string(),
            table_name: table_name.to_string(),
            pk_column: "id".into(),
            order_column: "id".into(),
            columns: Vec::new(),
        }
    }

    pub fn column(mut self, column: ColumnInfo) -> Self {
        if column.primary_key {
            self.pk_column = column.name.clone();
        }
        self.columns.push(column);
        self
    }

    pub fn order_by(mut self, column: &str) -> Self {
        self.order_column = column.to_string();
        self
    }

    /// Adds the `is_active` flag and the service-assigned timestamps.
    pub fn with_audit_columns(self) -> Self {
        self.column(ColumnInfo::new(ACTIVE_COLUMN, PgType::Boolean).not_null().default(ColumnDefault::Bool(true)))
            .column(ColumnInfo::new(CREATED_AT_COLUMN, PgType::TimestampTz).not_null().default(ColumnDefault::Now))
            .column(ColumnInfo::new(UPDATED_AT_COLUMN, PgType::TimestampTz).not_null().default(ColumnDefault::Now))
    }

    pub fn column_info(&self, name: &str) -> Option<&ColumnInfo> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column_info(name).is_some()
    }

    /// `schema.table`, for log fields.
    pub fn display_name(&self) -> String {
        format!("{}.{}", self.schema_name, self.table_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> TableSpec {
        TableSpec::new("public", "pecas")
            .column(ColumnInfo::new("codigo", PgType::Uuid).primary_key().default(ColumnDefault::RandomUuid))
            .column(ColumnInfo::new("nome", PgType::Text).not_null())
            .order_by("nome")
            .with_audit_columns()
    }

    #[test]
    fn primary_key_column_becomes_pk() {
        let t = sample();
        assert_eq!(t.pk_column, "codigo");
        assert_eq!(t.order_column, "nome");
        assert_eq!(t.display_name(), "public.pecas");
    }

    #[test]
    fn required_means_not_null_without_default() {
        let t = sample();
        assert!(t.column_info("nome").is_some_and(ColumnInfo::is_required));
        assert!(!t.column_info("codigo").is_some_and(ColumnInfo::is_required));
        assert!(!t.column_info(ACTIVE_COLUMN).is_some_and(ColumnInfo::is_required));
    }

    #[test]
    fn defaults_generate_values() {
        assert_eq!(ColumnDefault::Bool(true).generate(), Value::Bool(true));
        let id = ColumnDefault::RandomUuid.generate();
        assert!(id.as_str().is_some_and(|s| uuid::Uuid::parse_str(s).is_ok()));
        assert_eq!(ColumnDefault::Int(0).as_sql(), "0");
    }
}
