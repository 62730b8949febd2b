//! Typed CRUD resources: the pure [`ResourceStore`] and the stateful [`ResourceHook`].

mod hook;
mod store;

pub use hook::ResourceHook;
pub use store::ResourceStore;

use crate::config::TableSpec;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fmt::Debug;
use uuid::Uuid;

/// User-facing texts for one resource's outcomes.
#[derive(Clone, Copy, Debug)]
pub struct Messages {
    pub created: &'static str,
    pub updated: &'static str,
    pub removed: &'static str,
    pub load_failed: &'static str,
    /// Fallbacks when the service gives no message of its own.
    pub create_failed: &'static str,
    pub update_failed: &'static str,
    pub remove_failed: &'static str,
}

/// A remote table with typed records, insert payloads and partial patches.
pub trait Resource: Send + Sync + 'static {
    type Record: DeserializeOwned + Serialize + Clone + Debug + Send + Sync + 'static;
    type New: DeserializeOwned + Serialize + Send + Sync + 'static;
    /// Fields left `None` are not sent, so the update touches only what is present.
    type Patch: DeserializeOwned + Serialize + Send + Sync + 'static;

    /// Path segment under which the HTTP routes mount the resource.
    const PATH: &'static str;
    const MESSAGES: Messages;

    fn table_spec(schema: &str) -> TableSpec;

    fn id(record: &Self::Record) -> Uuid;
}
