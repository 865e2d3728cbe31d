use campus::logging::{init_tracing, shutdown_tracer};
use campus::metrics::{init_metrics, metrics_app};
use campus::router::init_router;
use campus::state::init_app_state;
use dotenvy::dotenv;
use tracing::info;

#[tokio::main]
async fn main() {
    dotenv().ok();
    init_tracing();

    let state = init_app_state().await;
    let mut app = init_router(state);
    if let Some(handle) = init_metrics() {
        app = app.merge(metrics_app(handle));
    }

    let addr = std::env::var("SERVER_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".to_string());
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("Failed to bind server address");

    info!("Server running on http://{}", addr);
    info!("Scalar UI available at http://{}/scalar", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await
        .expect("Server error");

    shutdown_tracer().await;
}
