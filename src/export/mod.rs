pub mod handlers;
pub mod repo;
pub mod sheet;

use crate::state::AppState;
use axum::Router;

pub fn router() -> Router<AppState> {
    handlers::export_routes()
}
