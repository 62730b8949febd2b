//! Staff profiles (`profiles`), keyed by the authentication user id.

use crate::config::{ColumnInfo, PgType, TableSpec};
use crate::resource::{Messages, Resource};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Mecanico,
    Atendente,
}

impl Role {
    pub const ALL: [&'static str; 3] = ["admin", "mecanico", "atendente"];
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    pub id: Uuid,
    #[serde(rename = "nome")]
    pub name: String,
    pub email: String,
    pub role: Role,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NewProfile {
    pub id: Uuid,
    #[serde(rename = "nome")]
    pub name: String,
    pub email: String,
    pub role: Role,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ProfilePatch {
    #[serde(rename = "nome", default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,
}

pub struct Profiles;

impl Resource for Profiles {
    type Record = Profile;
    type New = NewProfile;
    type Patch = ProfilePatch;

    const PATH: &'static str = "profiles";
    const MESSAGES: Messages = Messages {
        created: "Usuário cadastrado com sucesso",
        updated: "Usuário atualizado com sucesso",
        removed: "Usuário desativado com sucesso",
        load_failed: "Erro ao carregar usuários",
        create_failed: "Erro ao cadastrar usuário",
        update_failed: "Erro ao atualizar usuário",
        remove_failed: "Erro ao desativar usuário",
    };

    fn table_spec(schema: &str) -> TableSpec {
        TableSpec::new(schema, "profiles")
            .column(ColumnInfo::new("id", PgType::Uuid).primary_key())
            .column(ColumnInfo::new("nome", PgType::Text).not_null().max_length(120))
            .column(ColumnInfo::new("email", PgType::Text).not_null().unique().max_length(254))
            .column(ColumnInfo::new("role", PgType::Text).not_null().allowed(&Role::ALL))
            .order_by("nome")
            .with_audit_columns()
    }

    fn id(record: &Profile) -> Uuid {
        record.id
    }
}
