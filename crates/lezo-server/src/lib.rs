//! Process wiring for the Lezo registry: configuration loading and the
//! top-level HTTP application.

use std::{
  path::{Path, PathBuf},
  sync::Arc,
};

use axum::{Router, extract::DefaultBodyLimit};
use lezo_core::store::RelationshipRepository;
use serde::Deserialize;
use tower_http::trace::TraceLayer;

// ─── Configuration ────────────────────────────────────────────────────────────

/// Runtime configuration, read from `lezo.toml` and `LEZO_*` variables.
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct ServerConfig {
  #[serde(default = "default_host")]
  pub host:           String,
  #[serde(default = "default_port")]
  pub port:           u16,
  #[serde(default = "default_store_path")]
  pub store_path:     PathBuf,
  /// Largest accepted request body. Import batches for the whole
  /// municipality arrive in one request.
  #[serde(default = "default_max_body_bytes")]
  pub max_body_bytes: usize,
}

fn default_host() -> String { "127.0.0.1".to_owned() }

fn default_port() -> u16 { 8080 }

fn default_store_path() -> PathBuf { PathBuf::from("lezo.db") }

fn default_max_body_bytes() -> usize { 32 * 1024 * 1024 }

impl Default for ServerConfig {
  fn default() -> Self {
    Self {
      host:           default_host(),
      port:           default_port(),
      store_path:     default_store_path(),
      max_body_bytes: default_max_body_bytes(),
    }
  }
}

impl ServerConfig {
  /// Layer the optional TOML file at `path` under `LEZO_*` environment
  /// variables.
  pub fn load(path: &Path) -> Result<Self, config::ConfigError> {
    config::Config::builder()
      .add_source(config::File::from(path.to_path_buf()).required(false))
      .add_source(config::Environment::with_prefix("LEZO"))
      .build()?
      .try_deserialize()
  }

  pub fn address(&self) -> String { format!("{}:{}", self.host, self.port) }

  /// `store_path` with a leading `~` expanded to the user's home directory.
  pub fn resolved_store_path(&self) -> PathBuf { expand_tilde(&self.store_path) }
}

/// Expand a leading `~` to the user's home directory.
pub fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}

// ─── Application ──────────────────────────────────────────────────────────────

/// The full HTTP application: the registry API with request tracing and the
/// configured body limit.
pub fn app<S>(store: Arc<S>, config: &ServerConfig) -> Router
where
  S: RelationshipRepository + 'static,
{
  lezo_api::api_router(store)
    .layer(DefaultBodyLimit::max(config.max_body_bytes))
    .layer(TraceLayer::new_for_http())
}
