//! Gatekeeper site access server
//!
//! Tracks visitors from request to checkout, including host approval by
//! email link and the reception confirmation gate, and keeps the gate
//! ledgers of fleet and external vehicle movements.

use std::sync::Arc;

pub mod api;
pub mod config;
pub mod error;
pub mod models;
pub mod repository;
pub mod services;

pub use config::AppConfig;
pub use error::{AppError, AppResult};

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub services: Arc<services::Services>,
}
