//! Booking API module

mod handler;

use axum::{
    Router, middleware,
    routing::{delete, get, patch, post},
};

use crate::auth::{ADMIN_ROLES, STAFF_ROLES, require_role};
use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/bookings", routes())
}

fn routes() -> Router<ServerState> {
    let read_routes = Router::new()
        .route("/", get(handler::list))
        .route("/{id}", get(handler::get_by_id));

    let staff_routes = Router::new()
        .route("/", post(handler::create))
        .route(
            "/{id}",
            axum::routing::put(handler::update).patch(handler::update_status),
        )
        .route("/{id}/table", patch(handler::reassign_table))
        .layer(middleware::from_fn(require_role(STAFF_ROLES)));

    let admin_routes = Router::new()
        .route("/{id}", delete(handler::delete))
        .layer(middleware::from_fn(require_role(ADMIN_ROLES)));

    read_routes.merge(staff_routes).merge(admin_routes)
}
