//! JSON REST API for the CEP course catalog.
//!
//! Exposes an axum [`Router`] backed by a [`CatalogService`] over any
//! [`cep_core::store::CatalogStore`]. Every handler resolves the request's
//! actor (HTTP Basic or anonymous) and leaves all access decisions to the
//! service. TLS and transport concerns are the caller's responsibility.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api", cep_api::api_router(state))
//! ```

pub mod areas;
pub mod auth;
pub mod courses;
pub mod error;
pub mod staff;

use std::sync::Arc;

use axum::{
  Router,
  routing::{get, patch},
};
use cep_catalog::CatalogService;
use cep_core::store::CatalogStore;
use serde::Serialize;

pub use auth::{MaybeActor, UserAccount, UserDirectory};
pub use error::ApiError;

// ─── Application state ────────────────────────────────────────────────────────

/// Shared state threaded through all handlers.
pub struct AppState<S> {
  pub catalog: Arc<CatalogService<S>>,
  pub users:   Arc<UserDirectory>,
}

impl<S> Clone for AppState<S> {
  fn clone(&self) -> Self {
    Self {
      catalog: Arc::clone(&self.catalog),
      users:   Arc::clone(&self.users),
    }
  }
}

// ─── Response envelope ────────────────────────────────────────────────────────

/// `{"success": true, "data": ...}` plus the optional `total` and `message`.
#[derive(Debug, Serialize)]
pub struct Envelope<T> {
  pub success: bool,
  pub data:    T,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub total:   Option<usize>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub message: Option<String>,
}

impl<T> Envelope<T> {
  pub fn data(data: T) -> Self { Self { success: true, data, total: None, message: None } }

  pub fn with_total(mut self, total: usize) -> Self {
    self.total = Some(total);
    self
  }

  pub fn with_message(mut self, message: impl Into<String>) -> Self {
    self.message = Some(message.into());
    self
  }
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// Build a fully-materialised API router for `state`.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<S>(state: AppState<S>) -> Router<()>
where
  S: CatalogStore + 'static,
  S::Error: Into<cep_core::Error>,
{
  Router::new()
    // Courses
    .route("/cursos", get(courses::list::<S>).post(courses::create::<S>))
    .route("/cursos/siguiente-codigo", get(courses::next_code::<S>))
    .route("/cursos/{id}", patch(courses::update::<S>))
    // Areas
    .route("/areas", get(areas::list::<S>).post(areas::create::<S>))
    .route("/areas/{id}", get(areas::get_one::<S>).patch(areas::update::<S>))
    // Staff
    .route("/staff", get(staff::list::<S>).post(staff::create::<S>))
    .route(
      "/staff/{id}",
      get(staff::get_one::<S>)
        .patch(staff::update::<S>)
        .delete(staff::delete_one::<S>),
    )
    .with_state(state)
}
