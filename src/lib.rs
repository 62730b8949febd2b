//! Oficina SDK: motorcycle repair shop back office over a hosted PostgreSQL database.

pub mod config;
pub mod error;
pub mod handlers;
pub mod models;
pub mod notify;
pub mod remote;
pub mod resource;
pub mod response;
pub mod routes;
pub mod session;
pub mod sql;
pub mod state;
pub mod store;

pub use config::{ShopConfig, TableSpec};
pub use error::{AppError, ConfigError, RemoteError, RemoteErrorKind};
pub use notify::{Notification, NotificationLevel, NotificationLog, NotificationSink, TracingSink};
pub use remote::{Filter, MemoryDataService, PgDataService, RemoteDataService, Reply, Row};
pub use resource::{Messages, Resource, ResourceHook, ResourceStore};
pub use routes::{common_routes_with_ready, resource_routes};
pub use session::{AuthBackend, Session, SessionContext, StaticAuthBackend};
pub use state::AppState;
pub use store::{ensure_database_exists, ensure_shop_tables};
