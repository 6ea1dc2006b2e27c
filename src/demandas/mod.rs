pub mod catalog;
pub mod dto;
pub mod handlers;
pub mod repo;

use axum::{routing::get, Router};

use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/demandas",
            get(handlers::list_demandas).post(handlers::create_demanda),
        )
        .route(
            "/demandas/:id",
            get(handlers::get_demanda)
                .patch(handlers::update_demanda)
                .delete(handlers::delete_demanda),
        )
        .route("/categorias", get(handlers::list_categorias))
}
