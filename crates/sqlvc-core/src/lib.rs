//! sqlvc Core - shared abstractions for schema version control
//!
//! This crate provides the types every other sqlvc crate depends on:
//!
//! - `Connection` - the single capability the engine needs from a database:
//!   run one SQL statement and get rows back
//! - `Value`, `Row`, `QueryResult` - driver-neutral query results
//! - `ConnectionConfig` - connection parameters loaded from configuration
//! - `SqlvcError` - the core error type

mod config;
mod connection;
mod error;
mod types;

pub use config::*;
pub use connection::*;
pub use error::*;
pub use types::*;
