use axum::{
    http::{header, Method},
    middleware,
    routing::get,
    Router,
};
use std::sync::Arc;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::{handlers, middleware as mw, torrents, transfers};
use crate::state::AppState;

pub fn create_router(state: Arc<AppState>) -> Router {
    // Routes behind the content-type and shared-key precheck
    let checked = Router::new()
        .route("/api/auth", get(handlers::auth).post(handlers::auth))
        .route("/api/config", get(handlers::get_config))
        .route(
            "/api/chook",
            get(transfers::chook)
                .post(transfers::chook)
                .put(transfers::chook),
        )
        .route("/api/jobs", get(transfers::list_jobs).post(transfers::list_jobs))
        .route(
            "/api/torrent/list",
            get(torrents::list_torrents).post(torrents::list_torrents),
        )
        .route(
            "/api/torrent/getinfo",
            get(torrents::get_info).post(torrents::get_info),
        )
        .route(
            "/api/torrent/move",
            get(torrents::move_torrent).post(torrents::move_torrent),
        )
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            mw::precheck_middleware,
        ));

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::WWW_AUTHENTICATE]);

    Router::new()
        .route("/", get(handlers::info))
        .route("/api/info", get(handlers::info).post(handlers::info))
        .route("/metrics", get(handlers::metrics))
        .merge(checked)
        .with_state(state)
        .layer(middleware::map_response(mw::server_headers))
        .layer(middleware::from_fn(mw::metrics_middleware))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}
