//! Taskdeck Web Server
//!
//! Axum-based REST API and WebSocket endpoint for the task-board backend.

pub mod config;
pub mod error;
pub mod extract;
pub mod rate_limit;
pub mod routes;
pub mod state;
pub mod websocket;

use std::net::SocketAddr;
use std::time::Duration;

use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use taskdeck_core::realtime::Hub;
use taskdeck_db::SharedStore;
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::{info, warn};

pub use config::ServerConfig;
use state::AppState;

/// Create the application router.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api_routes = Router::new()
        // Users
        .route("/users", post(routes::users::create_user))
        .route("/users/{id}", get(routes::users::get_user))
        .route("/users/{id}/boards", get(routes::users::list_user_boards))
        // Boards
        .route("/boards", post(routes::boards::create_board))
        .route(
            "/boards/{id}",
            get(routes::boards::get_board)
                .put(routes::boards::update_board)
                .delete(routes::boards::delete_board),
        )
        // Collaborators
        .route(
            "/boards/{id}/collaborators",
            get(routes::collaborators::list_collaborators)
                .post(routes::collaborators::add_collaborator),
        )
        .route(
            "/boards/{id}/collaborators/{user_id}",
            get(routes::collaborators::get_collaborator)
                .put(routes::collaborators::change_role)
                .delete(routes::collaborators::remove_collaborator),
        )
        // Tasks
        .route(
            "/boards/{id}/tasks",
            get(routes::tasks::list_tasks).post(routes::tasks::create_task),
        )
        .route(
            "/tasks/{id}",
            get(routes::tasks::get_task)
                .put(routes::tasks::update_task)
                .delete(routes::tasks::delete_task),
        )
        .with_state(state.clone());

    let limited = Router::new()
        .nest("/api", api_routes)
        .route("/ws", get(websocket::ws_handler))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            rate_limit::limit_requests,
        ));

    Router::new()
        .route("/health", get(routes::health::health))
        .merge(limited)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        )
        .with_state(state)
}

/// Run the web server until Ctrl+C, then shut the realtime hub down.
pub async fn run_server(config: ServerConfig, store: SharedStore) -> anyhow::Result<()> {
    let hub = Hub::new(config.hub.clone());
    let state = AppState::new(store, hub.clone(), config.connection.clone())
        .with_rate_limit(config.rate_limit_per_minute);
    if let Some(limiter) = state.rate_limiter.clone() {
        tokio::spawn(rate_limit::prune(limiter, Duration::from_secs(60)));
    }
    let app = create_router(state);

    let addr = config.addr();
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Web server listening on http://{}", addr);

    axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>())
        .with_graceful_shutdown(shutdown_signal(hub))
        .await?;
    info!("Web server stopped");
    Ok(())
}

async fn shutdown_signal(hub: Hub) {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Failed to listen for Ctrl+C; running until killed");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
    // Closing live sockets first lets the server drain.
    hub.shutdown().await;
}
