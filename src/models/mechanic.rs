//! Mechanics (`mecanicos`): the shop's workforce records.

use crate::config::{ColumnDefault, ColumnInfo, PgType, TableSpec};
use crate::resource::{Messages, Resource};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub const PHONE_PATTERN: &str = r"^[0-9()+\- ]{8,20}$";

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Mechanic {
    pub id: Uuid,
    #[serde(rename = "nome")]
    pub name: String,
    #[serde(rename = "telefone")]
    pub phone: String,
    pub email: Option<String>,
    #[serde(rename = "especialidade")]
    pub specialty: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Insert payload. Required fields are checked by the service, so they stay optional here.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct NewMechanic {
    #[serde(rename = "nome", default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(rename = "telefone", default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(rename = "especialidade", default, skip_serializing_if = "Option::is_none")]
    pub specialty: Option<String>,
}

/// Partial update. Nullable columns take `Some(None)` to be cleared.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct MechanicPatch {
    #[serde(rename = "nome", default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(rename = "telefone", default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, with = "::serde_with::rust::double_option", skip_serializing_if = "Option::is_none")]
    pub email: Option<Option<String>>,
    #[serde(rename = "especialidade", default, with = "::serde_with::rust::double_option", skip_serializing_if = "Option::is_none")]
    pub specialty: Option<Option<String>>,
}

pub struct Mechanics;

impl Resource for Mechanics {
    type Record = Mechanic;
    type New = NewMechanic;
    type Patch = MechanicPatch;

    const PATH: &'static str = "mecanicos";
    const MESSAGES: Messages = Messages {
        created: "Mecânico cadastrado com sucesso",
        updated: "Mecânico atualizado com sucesso",
        removed: "Mecânico removido com sucesso",
        load_failed: "Erro ao carregar mecânicos",
        create_failed: "Erro ao cadastrar mecânico",
        update_failed: "Erro ao atualizar mecânico",
        remove_failed: "Erro ao remover mecânico",
    };

    fn table_spec(schema: &str) -> TableSpec {
        TableSpec::new(schema, "mecanicos")
            .column(ColumnInfo::new("id", PgType::Uuid).primary_key().default(ColumnDefault::RandomUuid))
            .column(ColumnInfo::new("nome", PgType::Text).not_null().max_length(120))
            .column(ColumnInfo::new("telefone", PgType::Text).not_null().pattern(PHONE_PATTERN))
            .column(ColumnInfo::new("email", PgType::Text).max_length(254))
            .column(ColumnInfo::new("especialidade", PgType::Text).max_length(80))
            .order_by("nome")
            .with_audit_columns()
    }

    fn id(record: &Mechanic) -> Uuid {
        record.id
    }
}
