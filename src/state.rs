//! Shared application state for all routes.

use crate::remote::RemoteDataService;
use crate::resource::{Resource, ResourceStore};
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub service: Arc<dyn RemoteDataService>,
    /// Schema holding the shop tables.
    pub schema: Arc<str>,
}

impl AppState {
    pub fn new(service: Arc<dyn RemoteDataService>, schema: &str) -> Self {
        AppState {
            service,
            schema: Arc::from(schema),
        }
    }

    pub fn store<R: Resource>(&self) -> ResourceStore<R> {
        ResourceStore::new(self.service.clone(), &self.schema)
    }
}
