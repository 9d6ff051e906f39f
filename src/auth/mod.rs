use axum::Router;

use crate::state::AppState;

pub mod dto;
pub mod handlers;
pub mod jwt;
pub mod password;
pub mod reset;
pub mod services;
pub mod store;
pub mod user;

pub fn router() -> Router<AppState> {
    handlers::auth_routes()
}
