use axum::Router;

use crate::state::AppState;

pub mod extractor;
pub mod handlers;
pub mod jwt;

pub use extractor::CurrentUser;

pub fn router() -> Router<AppState> {
    handlers::routes()
}
