//! Web Reader Common Library
//!
//! Shared configuration, error handling, credentials, tracing and HTTP
//! server plumbing for the Web Reader speech gateway.

#![cfg_attr(docsrs, feature(doc_cfg))]

pub mod auth;
pub mod config;
pub mod error;
pub mod listen;
pub mod server;
pub mod tracing;

#[cfg(test)]
mod auth_test;

pub use config::Config;
pub use error::{AuthError, ConfigError, Error, ErrorBody};
pub use listen::ListenArgs;
pub use server::{HttpServerBuilder, ServerError, shutdown_channel};
