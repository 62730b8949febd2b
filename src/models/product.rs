//! Products (`produtos`): parts and consumables kept in stock.

use crate::config::{ColumnDefault, ColumnInfo, PgType, TableSpec};
use crate::error::AppError;
use crate::resource::{Messages, Resource, ResourceStore};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: Uuid,
    #[serde(rename = "codigo")]
    pub code: String,
    #[serde(rename = "nome")]
    pub name: String,
    #[serde(rename = "descricao")]
    pub description: Option<String>,
    /// Unit price in cents.
    #[serde(rename = "preco_centavos")]
    pub price_cents: i64,
    #[serde(rename = "estoque")]
    pub stock: i32,
    #[serde(rename = "estoque_minimo")]
    pub min_stock: i32,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Product {
    pub fn needs_restock(&self) -> bool {
        self.stock <= self.min_stock
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct NewProduct {
    #[serde(rename = "codigo", default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(rename = "nome", default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(rename = "descricao", default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(rename = "preco_centavos", default, skip_serializing_if = "Option::is_none")]
    pub price_cents: Option<i64>,
    #[serde(rename = "estoque", default, skip_serializing_if = "Option::is_none")]
    pub stock: Option<i32>,
    #[serde(rename = "estoque_minimo", default, skip_serializing_if = "Option::is_none")]
    pub min_stock: Option<i32>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ProductPatch {
    #[serde(rename = "codigo", default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(rename = "nome", default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// `Some(None)` clears the description.
    #[serde(rename = "descricao", default, with = "::serde_with::rust::double_option", skip_serializing_if = "Option::is_none")]
    pub description: Option<Option<String>>,
    #[serde(rename = "preco_centavos", default, skip_serializing_if = "Option::is_none")]
    pub price_cents: Option<i64>,
    #[serde(rename = "estoque", default, skip_serializing_if = "Option::is_none")]
    pub stock: Option<i32>,
    #[serde(rename = "estoque_minimo", default, skip_serializing_if = "Option::is_none")]
    pub min_stock: Option<i32>,
}

pub struct Products;

impl Resource for Products {
    type Record = Product;
    type New = NewProduct;
    type Patch = ProductPatch;

    const PATH: &'static str = "produtos";
    const MESSAGES: Messages = Messages {
        created: "Produto cadastrado com sucesso",
        updated: "Produto atualizado com sucesso",
        removed: "Produto removido com sucesso",
        load_failed: "Erro ao carregar produtos",
        create_failed: "Erro ao cadastrar produto",
        update_failed: "Erro ao atualizar produto",
        remove_failed: "Erro ao remover produto",
    };

    fn table_spec(schema: &str) -> TableSpec {
        TableSpec::new(schema, "produtos")
            .column(ColumnInfo::new("id", PgType::Uuid).primary_key().default(ColumnDefault::RandomUuid))
            .column(ColumnInfo::new("codigo", PgType::Text).not_null().unique().max_length(40))
            .column(ColumnInfo::new("nome", PgType::Text).not_null().max_length(120))
            .column(ColumnInfo::new("descricao", PgType::Text))
            .column(
                ColumnInfo::new("preco_centavos", PgType::BigInt)
                    .not_null()
                    .default(ColumnDefault::Int(0))
                    .minimum(0),
            )
            .column(ColumnInfo::new("estoque", PgType::Integer).not_null().default(ColumnDefault::Int(0)).minimum(0))
            .column(
                ColumnInfo::new("estoque_minimo", PgType::Integer)
                    .not_null()
                    .default(ColumnDefault::Int(0))
                    .minimum(0),
            )
            .order_by("nome")
            .with_audit_columns()
    }

    fn id(record: &Product) -> Uuid {
        record.id
    }
}

/// Inventory lookups over the product table.
impl ResourceStore<Products> {
    /// Active product with this exact code, if any.
    pub async fn find_by_code(&self, code: &str) -> Result<Option<Product>, AppError> {
        Ok(self.find_active_by("codigo", code).await?.into_iter().next())
    }

    /// Active products at or below their minimum stock.
    pub async fn restock_list(&self) -> Result<Vec<Product>, AppError> {
        Ok(self
            .list_active()
            .await?
            .into_iter()
            .filter(Product::needs_restock)
            .collect())
    }
}
