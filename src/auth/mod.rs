use crate::state::AppState;
use axum::Router;

pub mod dto;
pub(crate) mod extractors;
pub mod handlers;
pub mod jwt;
pub mod password;
pub mod services;

pub use extractors::AuthUser;
pub use jwt::JwtKeys;
pub use services::AuthService;

pub fn router() -> Router<AppState> {
    Router::new()
        .merge(handlers::auth_routes())
        .merge(handlers::me_routes())
}
