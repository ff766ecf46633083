use axum::{
    middleware,
    routing::{delete, get, post},
    Router,
};
use std::sync::Arc;
use tower_http::{
    services::{ServeDir, ServeFile},
    trace::TraceLayer,
};

use super::{files, handlers, jobs, middleware::metrics_middleware, preview};
use crate::state::AppState;

pub fn create_router(state: Arc<AppState>) -> Router {
    let static_dir = state.config().server.static_dir.clone();

    let api_routes = Router::new()
        // Health and metrics
        .route("/health", get(handlers::health))
        .route("/metrics", get(handlers::metrics))
        // Preview and jobs
        .route("/preview", post(preview::preview))
        .route("/download", post(jobs::start_download))
        .route("/status/{id}", get(jobs::get_status))
        .route("/jobs", get(jobs::list_jobs))
        .route("/jobs/{id}", delete(jobs::cancel_job))
        // Files
        .route("/files", get(files::list_files))
        .route("/thumbnail/{location}/{name}", get(files::thumbnail))
        .route("/delete/{location}/{name}", delete(files::delete_file))
        .route("/move", post(files::move_files))
        .route("/stream/{location}/{name}", get(files::stream_file))
        .with_state(state);

    // Serve the web UI with index fallback
    let index_path = static_dir.join("index.html");
    let serve_dir = ServeDir::new(&static_dir).fallback(ServeFile::new(index_path));

    api_routes
        .fallback_service(serve_dir)
        .layer(middleware::from_fn(metrics_middleware))
        .layer(TraceLayer::new_for_http())
}
