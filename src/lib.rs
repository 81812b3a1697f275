//! Back office core: role-gated account management, project team graphs,
//! task boards and developer workspaces over a SQLite store.

pub mod board;
pub mod db;
pub mod error;
pub mod graph;
mod migrations;
pub mod policy;
#[macro_use]
pub mod roles;
pub mod services;
pub mod state;
pub mod store;
pub mod types;
pub mod workspace;

pub use error::{CoreError, DenialReason, ErrorKind, ErrorResponse};
pub use roles::Role;
