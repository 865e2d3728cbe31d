//! # Campus DB
//!
//! PostgreSQL connection pool for the campus portal server.
//!
//! The server talks to the backend's database directly only for the privileged
//! user provisioning procedure; everything else goes through the remote API.
//!
//! # Example
//!
//! ```ignore
//! use campus_db::init_db_pool;
//!
//! #[tokio::main]
//! async fn main() {
//!     let pool = init_db_pool().await;
//! }
//! ```

use std::env;

use sqlx::postgres::PgPoolOptions;

/// Initializes a PostgreSQL connection pool from `DATABASE_URL`.
///
/// `DATABASE_MAX_CONNECTIONS` caps the pool size (default: 5).
///
/// # Panics
///
/// Panics if:
/// - `DATABASE_URL` environment variable is not set
/// - Connection to the database fails
pub async fn init_db_pool() -> sqlx::PgPool {
    let database_url = env::var("DATABASE_URL").expect("DATABASE_URL must be set");
    let max_connections = env::var("DATABASE_MAX_CONNECTIONS")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(5);

    PgPoolOptions::new()
        .max_connections(max_connections)
        .connect(&database_url)
        .await
        .expect("Failed to connect to database")
}

// Re-export PgPool for convenience
pub use sqlx::PgPool;
