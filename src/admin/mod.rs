pub mod bootstrap;
pub mod handlers;

use axum::{
    routing::{delete, get, put},
    Router,
};

use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/admin/users", get(handlers::list_users))
        .route("/admin/demandas", get(handlers::list_demandas))
        .route("/admin/users/:id/type", put(handlers::set_user_type))
        .route("/admin/users/:id", delete(handlers::delete_user))
}
