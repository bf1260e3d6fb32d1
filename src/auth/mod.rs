//! Authentication module for the InnoBridge server
//!
//! Registration, login, and bearer-token session handling.

pub mod handlers;
mod service;

pub use service::{AuthService, Claims};
