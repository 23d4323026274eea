//! Handlers for `/areas` endpoints.
//!
//! | Method  | Path | Notes |
//! |---------|------|-------|
//! | `GET`   | `/areas` | Public |
//! | `POST`  | `/areas` | Body: `{"code":"MKT","name":"Marketing Digital",...}` |
//! | `GET`   | `/areas/{id}` | 404 if not found |
//! | `PATCH` | `/areas/{id}` | `code` is ignored |

use axum::{
  Json,
  extract::{
    Path, State,
    rejection::{JsonRejection, PathRejection},
  },
  http::StatusCode,
  response::IntoResponse,
};
use cep_core::{Error, area::Area, store::CatalogStore};
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::{AppState, Envelope, auth::MaybeActor, error::ApiError};

/// `GET /areas`
pub async fn list<S>(
  State(state): State<AppState<S>>,
  actor: MaybeActor,
) -> Result<Json<Envelope<Vec<Value>>>, ApiError>
where
  S: CatalogStore + 'static,
  S::Error: Into<Error>,
{
  let areas = state.catalog.list_areas(actor.actor()).await?;
  let total = areas.len();
  Ok(Json(Envelope::data(areas).with_total(total)))
}

/// `POST /areas`
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
  let area = state.catalog.create_area(actor.actor(), body).await?;
  Ok((StatusCode::CREATED, Json(Envelope::data(area))))
}

/// `GET /areas/{id}`
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
  let area = state.catalog.get_area(actor.actor(), id).await?;
  Ok(Json(Envelope::data(area)))
}

/// `PATCH /areas/{id}`
pub async fn update<S>(
  State(state): State<AppState<S>>,
  actor: MaybeActor,
  id: Result<Path<Uuid>, PathRejection>,
  body: Result<Json<Map<String, Value>>, JsonRejection>,
) -> Result<Json<Envelope<Area>>, ApiError>
where
  S: CatalogStore + 'static,
  S::Error: Into<Error>,
{
  let Path(id) = id?;
  let Json(body) = body?;
  let area = state.catalog.update_area(actor.actor(), id, body).await?;
  Ok(Json(Envelope::data(area)))
}
