//! Example GraphQL server built on `juniper_connections`, used by the integration tests.

pub mod config;
pub mod db;
pub mod schema;

use axum::Router;
use axum::extract::State;
use axum::routing::{get, post};
use juniper_axum::extract::JuniperRequest;
use juniper_axum::graphiql;
use juniper_axum::response::JuniperResponse;
use std::sync::Arc;

use crate::config::AppConfig;
use crate::db::Database;
use crate::schema::{Context, Schema};

#[derive(Clone)]
pub struct AppState {
    pub schema: Arc<Schema>,
    pub db: Arc<Database>,
    pub config: AppConfig,
}

/// Builds the router. Every request gets its own `Context`, and with it a fresh loader scope.
pub fn app(db: Arc<Database>, config: AppConfig) -> Router {
    let state = AppState {
        schema: Arc::new(schema::schema()),
        db,
        config,
    };

    Router::new()
        .route("/graphql", post(graphql_handler).get(graphql_handler))
        .route("/graphiql", get(graphiql("/graphql", None::<&str>)))
        .with_state(state)
}

async fn graphql_handler(
    State(state): State<AppState>,
    JuniperRequest(request): JuniperRequest,
) -> JuniperResponse {
    let ctx = Context::new(
        Arc::clone(&state.db),
        state.config.pagination,
        state.config.batch,
    );
    JuniperResponse(request.execute(&*state.schema, &ctx).await)
}
