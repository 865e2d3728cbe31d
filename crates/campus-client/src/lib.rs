//! # Campus Client
//!
//! HTTP client for the remote backend of the campus portal.
//!
//! - [`http::BackendClient`]: shared connection, API key and bearer token
//! - [`auth::RemoteSessionStore`]: sign-in, sign-out, refresh and session persistence
//! - [`directory::RemoteDirectory`]: role and profile lookups for the session controller
//! - [`storage`]: object storage for receipt files
//! - [`admin::IdentityAdmin`]: privileged credential management, server-side only
//! - [`services`]: typed data access for each portal page
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use campus_client::{BackendClient, RemoteDirectory, RemoteSessionStore};
//!
//! let client = BackendClient::new(BackendConfig::from_env())?;
//! let store = Arc::new(RemoteSessionStore::new(client.clone()));
//! let directory = Arc::new(RemoteDirectory::new(client.clone()));
//! let controller = AuthController::start(store, directory, AuthConfig::from_env());
//! ```

pub mod admin;
pub mod auth;
pub mod directory;
pub mod error;
pub mod functions;
pub mod http;
pub mod persistence;
pub mod query;
pub mod rest;
pub mod services;
pub mod storage;

pub use admin::IdentityAdmin;
pub use auth::RemoteSessionStore;
pub use directory::RemoteDirectory;
pub use error::ServiceError;
pub use http::BackendClient;
pub use persistence::SessionFile;
pub use query::{TableQuery, tables};
pub use storage::{MemoryObjectStorage, ObjectStorage, RemoteObjectStorage, StorageError};
