use std::path::Path;
use std::sync::Arc;

use axum::Router;
use tower_http::services::ServeFile;
use tower_http::trace::TraceLayer;

use crate::services::page::AVATAR_ROUTE;
use crate::AppState;

pub mod dashboard;

pub fn router(state: Arc<AppState>, avatar_path: Option<&Path>) -> Router {
    let mut router = dashboard::routes();
    if let Some(path) = avatar_path {
        router = router.route_service(AVATAR_ROUTE, ServeFile::new(path));
    }

    router.layer(TraceLayer::new_for_http()).with_state(state)
}
