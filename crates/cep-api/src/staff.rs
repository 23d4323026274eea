//! Handlers for `/staff` endpoints.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `GET`    | `/staff` | Optional `?staff_type=profesor\|administrativo&is_active=true` |
//! | `POST`   | `/staff` | `created_by` comes from the caller, never the body |
//! | `GET`    | `/staff/{id}` | 404 if not found or not visible |
//! | `PATCH`  | `/staff/{id}` | `created_by` is ignored |
//! | `DELETE` | `/staff/{id}` | |
//!
//! Documents are redacted per caller: anonymous readers never see contact
//! fields, and only managers see `notes`.

use axum::{
  Json,
  extract::{
    Path, Query, State,
    rejection::{JsonRejection, PathRejection, QueryRejection},
  },
  http::StatusCode,
  response::IntoResponse,
};
use cep_core::{
  Error,
  staff::{StaffQuery, StaffType},
  store::CatalogStore,
};
use serde::Deserialize;
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::{AppState, Envelope, auth::MaybeActor, error::ApiError};

// ─── List ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ListParams {
  pub staff_type: Option<StaffType>,
  pub is_active:  Option<bool>,
}

/// `GET /staff[?staff_type=<type>&is_active=<bool>]`
pub async fn list<S>(
  State(state): State<AppState<S>>,
  actor: MaybeActor,
  params: Result<Query<ListParams>, QueryRejection>,
) -> Result<Json<Envelope<Vec<Value>>>, ApiError>
where
  S: CatalogStore + 'static,
  S::Error: Into<Error>,
{
  let Query(params) = params?;
  let query = StaffQuery { staff_type: params.staff_type, is_active: params.is_active };
  let members = state.catalog.list_staff(actor.actor(), query).await?;
  let total = members.len();
  Ok(Json(Envelope::data(members).with_total(total)))
}

// ─── Create ───────────────────────────────────────────────────────────────────

/// `POST /staff`
pub async fn create<S>(
  State(state): State<AppState<S>>,
  actor: MaybeActor,
  body: Result<Json<Map<String, Value>>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError>
where
  S: CatalogStore + 'static,
  S::Error: Into<Error>,
{
  let Json(body) = body?;
  let member = state.catalog.create_staff(actor.actor(), body).await?;
  Ok((StatusCode::CREATED, Json(Envelope::data(member))))
}

// ─── Get one ──────────────────────────────────────────────────────────────────

/// `GET /staff/{id}`
pub async fn get_one<S>(
  State(state): State<AppState<S>>,
  actor: MaybeActor,
  id: Result<Path<Uuid>, PathRejection>,
) -> Result<Json<Envelope<Value>>, ApiError>
where
  S: CatalogStore + 'static,
  S::Error: Into<Error>,
{
  let Path(id) = id?;
  let member = state.catalog.get_staff(actor.actor(), id).await?;
  Ok(Json(Envelope::data(member)))
}

// ─── Update / delete ──────────────────────────────────────────────────────────

/// `PATCH /staff/{id}`
pub async fn update<S>(
  State(state): State<AppState<S>>,
  actor: MaybeActor,
  id: Result<Path<Uuid>, PathRejection>,
  body: Result<Json<Map<String, Value>>, JsonRejection>,
) -> Result<Json<Envelope<Value>>, ApiError>
where
  S: CatalogStore + 'static,
  S::Error: Into<Error>,
{
  let Path(id) = id?;
  let Json(body) = body?;
  let member = state.catalog.update_staff(actor.actor(), id, body).await?;
  Ok(Json(Envelope::data(member)))
}

/// `DELETE /staff/{id}`
pub async fn delete_one<S>(
  State(state): State<AppState<S>>,
  actor: MaybeActor,
  id: Result<Path<Uuid>, PathRejection>,
) -> Result<Json<Envelope<Uuid>>, ApiError>
where
  S: CatalogStore + 'static,
  S::Error: Into<Error>,
{
  let Path(id) = id?;
  state.catalog.delete_staff(actor.actor(), id).await?;
  Ok(Json(Envelope::data(id).with_message("Personal eliminado")))
}
