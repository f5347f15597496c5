//! Shared application state: injected into every handler via `axum::extract::State`.

use crate::{config::Config, db::Db, revalidate::Revalidator};

/// Application-wide state passed via axum `State<AppState>`.
///
/// The pool is `Arc`-backed, the revalidator wraps a broadcast sender, and
/// `Config` only holds strings and numbers, so cloning per request is cheap.
#[derive(Clone)]
pub struct AppState {
    pub pool:        Db,
    pub config:      Config,
    pub revalidator: Revalidator,
}

impl AppState {
    pub fn new(pool: Db, config: Config) -> Self {
        let revalidator = Revalidator::new(config.revalidate_url.clone());
        Self { pool, config, revalidator }
    }
}
