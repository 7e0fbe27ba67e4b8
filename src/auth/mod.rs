use axum::Router;

use crate::state::AppState;

mod claims;
mod dto;
pub mod handlers;
pub mod password;
pub mod repo;
pub mod service;
pub mod token;

pub fn router() -> Router<AppState> {
    let router = Router::new()
        .merge(handlers::auth_routes())
        .merge(handlers::me_routes());
    #[cfg(feature = "dev-endpoints")]
    let router = router.merge(handlers::dev_routes());
    router
}
