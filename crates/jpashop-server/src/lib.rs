//! jpashop server library.
//!
//! This crate wires the order query engine to a set of named endpoints,
//! each backed by one fetch strategy, and provides the database wrapper and
//! configuration used by the binary.

pub mod config;
pub mod database;
pub mod error;
pub mod handler;

pub use config::{Args, ServerConfig};
pub use database::{Database, SharedDatabase};
pub use error::Error;
pub use handler::{Endpoint, RequestHandler};
