//! HTTP Basic authentication and the actor extractor.
//!
//! A request without an `Authorization` header is anonymous. A header that
//! is present but does not verify is rejected with 401, never downgraded to
//! anonymous.

use std::collections::HashMap;

use argon2::{Argon2, PasswordHash, PasswordVerifier};
use axum::{
  extract::FromRequestParts,
  http::{HeaderMap, header, request::Parts},
};
use base64::{Engine as _, engine::general_purpose::STANDARD as B64};
use cep_core::{
  Error,
  actor::{Actor, Role},
  store::CatalogStore,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::{AppState, error::ApiError};

/// A configured CMS account.
#[derive(Debug, Clone, Deserialize)]
pub struct UserAccount {
  pub username:      String,
  /// PHC string produced by argon2, e.g. `$argon2id$v=19$…`
  pub password_hash: String,
  pub user_id:       Uuid,
  pub role:          Role,
}

/// The accounts a server instance accepts, keyed by username.
#[derive(Debug, Default)]
pub struct UserDirectory {
  accounts: HashMap<String, UserAccount>,
}

impl UserDirectory {
  pub fn new(accounts: impl IntoIterator<Item = UserAccount>) -> Self {
    Self {
      accounts: accounts
        .into_iter()
        .map(|a| (a.username.clone(), a))
        .collect(),
    }
  }

  pub fn len(&self) -> usize { self.accounts.len() }

  pub fn is_empty(&self) -> bool { self.accounts.is_empty() }

  /// Resolve the actor behind `headers`.
  ///
  /// `Ok(None)` when no credentials were sent.
  pub fn authenticate(&self, headers: &HeaderMap) -> Result<Option<Actor>, ApiError> {
    let Some(value) = headers.get(header::AUTHORIZATION) else {
      return Ok(None);
    };
    let value = value.to_str().map_err(|_| ApiError::Unauthorized)?;
    let encoded = value.strip_prefix("Basic ").ok_or(ApiError::Unauthorized)?;

    let decoded = B64.decode(encoded).map_err(|_| ApiError::Unauthorized)?;
    let creds = std::str::from_utf8(&decoded).map_err(|_| ApiError::Unauthorized)?;
    let (username, password) = creds.split_once(':').ok_or(ApiError::Unauthorized)?;

    let account = self.accounts.get(username).ok_or_else(|| {
      tracing::debug!(username, "unknown user");
      ApiError::Unauthorized
    })?;

    let parsed_hash =
      PasswordHash::new(&account.password_hash).map_err(|_| ApiError::Unauthorized)?;
    Argon2::default()
      .verify_password(password.as_bytes(), &parsed_hash)
      .map_err(|_| {
        tracing::debug!(username, "password mismatch");
        ApiError::Unauthorized
      })?;

    Ok(Some(Actor::new(account.user_id, account.role)))
  }
}

/// The (possibly anonymous) actor of the current request.
pub struct MaybeActor(pub Option<Actor>);

impl MaybeActor {
  pub fn actor(&self) -> Option<&Actor> { self.0.as_ref() }
}

impl<S> FromRequestParts<AppState<S>> for MaybeActor
where
  S: CatalogStore + 'static,
  S::Error: Into<Error>,
{
  type Rejection = ApiError;

  async fn from_request_parts(
    parts: &mut Parts,
    state: &AppState<S>,
  ) -> Result<Self, Self::Rejection> {
    state.users.authenticate(&parts.headers).map(MaybeActor)
  }
}
