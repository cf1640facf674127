use std::sync::Arc;

use axum::{extract::State, response::Html, routing::get, Router};

use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/", get(dashboard_page))
}

/// Serves the page rendered at startup; nothing is recomputed per request.
async fn dashboard_page(State(state): State<Arc<AppState>>) -> Html<String> {
    Html(state.page.clone())
}
