//! Resource CRUD routes: one collection path and one item path per resource,
//! plus the product inventory lookups.

use crate::error::AppError;
use crate::handlers::resource::{create, list, product_by_code, products_to_restock, read, remove, update};
use crate::models::{Mechanics, Products};
use crate::resource::Resource;
use crate::state::AppState;
use axum::{
    http::{header, StatusCode},
    middleware,
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use tower::ServiceBuilder;
use tower_http::limit::RequestBodyLimitLayer;

fn resource_router<R: Resource>() -> Router<AppState> {
    Router::new()
        .route(&format!("/{}", R::PATH), get(list::<R>).post(create::<R>))
        .route(
            &format!("/{}/:id", R::PATH),
            get(read::<R>).patch(update::<R>).delete(remove::<R>),
        )
}

pub fn resource_routes(state: AppState, body_limit_bytes: usize) -> Router {
    Router::new()
        .merge(resource_router::<Mechanics>())
        .merge(resource_router::<Products>())
        .route(&format!("/{}/codigo/:codigo", Products::PATH), get(product_by_code))
        .route(&format!("/{}/reposicao", Products::PATH), get(products_to_restock))
        .layer(ServiceBuilder::new().layer(RequestBodyLimitLayer::new(body_limit_bytes)))
        .layer(middleware::map_response(move |response: Response| async move {
            limit_rejection_envelope(response, body_limit_bytes)
        }))
        .with_state(state)
}

/// The body limit layer rejects an oversized `Content-Length` with a plain-text 413.
fn limit_rejection_envelope(response: Response, limit: usize) -> Response {
    let is_json = response
        .headers()
        .get(header::CONTENT_TYPE)
        .is_some_and(|v| v.as_bytes().starts_with(b"application/json"));
    if response.status() == StatusCode::PAYLOAD_TOO_LARGE && !is_json {
        return AppError::PayloadTooLarge(limit).into_response();
    }
    response
}
