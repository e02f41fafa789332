pub mod health;

use axum::{
    middleware,
    routing::{get, post},
    Router,
};

use crate::auth::{guard::require_session, handlers as auth_handlers};
use crate::items::handlers;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    // Items API: every route requires a signed-in session
    let items = Router::new()
        .route(
            "/api/v1/items",
            get(handlers::handle_list_items).post(handlers::handle_import),
        )
        .route("/api/v1/items/discover", post(handlers::handle_discover))
        .route("/api/v1/items/bulk", post(handlers::handle_bulk_import))
        .route("/api/v1/items/:id", get(handlers::handle_get_item))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            require_session,
        ));

    Router::new()
        .route("/health", get(health::health_handler))
        .route("/api/v1/auth/sign-out", post(auth_handlers::handle_sign_out))
        .merge(items)
        .with_state(state)
}
