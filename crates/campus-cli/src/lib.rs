//! # Campus CLI
//!
//! Terminal client for the campus portal. One [`campus_auth::AuthController`]
//! holds the session for the lifetime of the process; every command goes through
//! the route guard before it touches the backend.
//!
//! ## Usage
//!
//! ```ignore
//! use campus_cli::shell::{Portal, Shell};
//!
//! let portal = Portal::new(client.clone(), storage);
//! Shell::new(controller, portal).run().await?;
//! ```

pub mod access;
pub mod command;
pub mod render;
pub mod shell;
