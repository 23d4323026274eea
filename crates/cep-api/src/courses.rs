//! Handlers for `/cursos` endpoints.
//!
//! | Method  | Path | Notes |
//! |---------|------|-------|
//! | `GET`   | `/cursos` | Newest first, at most 100, short shared cache |
//! | `POST`  | `/cursos` | Code is generated; 201 with `{id, codigo, nombre}` |
//! | `GET`   | `/cursos/siguiente-codigo` | `?areaId=<uuid>&tipo=<category>` |
//! | `PATCH` | `/cursos/{id}` | Same field names as `POST`; `codigo`, `slug` and `created_by` are ignored |
//!
//! Bodies and responses use the Spanish field names throughout. A `PATCH`
//! naming any other field is rejected with 400.

use axum::{
  Json,
  extract::{
    Path, Query, State,
    rejection::{JsonRejection, PathRejection, QueryRejection},
  },
  http::{StatusCode, header},
  response::IntoResponse,
};
use cep_catalog::{CourseInput, CourseListing};
use cep_core::{
  Error,
  course::{Course, Modality},
  store::CatalogStore,
};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::{AppState, Envelope, auth::MaybeActor, error::ApiError};

const LIST_CACHE_CONTROL: &str = "s-maxage=10, stale-while-revalidate=30";
const DEFAULT_DESCRIPTION: &str = "Curso de formación profesional";
const NO_AREA: &str = "Sin área";

// ─── List ─────────────────────────────────────────────────────────────────────

/// One entry of the public course listing.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseItem {
  pub id:                    Uuid,
  pub codigo:                String,
  pub slug:                  String,
  pub nombre:                String,
  pub tipo:                  &'static str,
  pub descripcion:           String,
  pub area:                  String,
  pub duracion_referencia:   u32,
  pub precio_referencia:     f64,
  pub porcentaje_subvencion: u8,
}

impl From<CourseListing> for CourseItem {
  fn from(CourseListing { course, area_name }: CourseListing) -> Self {
    let descripcion = if course.short_description.trim().is_empty() {
      DEFAULT_DESCRIPTION.to_owned()
    } else {
      course.short_description
    };
    Self {
      id: course.course_id,
      codigo: course.code,
      slug: course.slug,
      nombre: course.name,
      tipo: course.category.course_type(),
      descripcion,
      area: area_name.unwrap_or_else(|| NO_AREA.to_owned()),
      duracion_referencia: course.duration_hours.unwrap_or(0),
      precio_referencia: course.base_price.unwrap_or(0.0),
      porcentaje_subvencion: course.subsidy_percentage,
    }
  }
}

/// `GET /cursos`
pub async fn list<S>(
  State(state): State<AppState<S>>,
  actor: MaybeActor,
) -> Result<impl IntoResponse, ApiError>
where
  S: CatalogStore + 'static,
  S::Error: Into<Error>,
{
  let (listings, total) = state.catalog.list_courses(actor.actor()).await?;
  let items: Vec<CourseItem> = listings.into_iter().map(CourseItem::from).collect();
  Ok((
    [(header::CACHE_CONTROL, LIST_CACHE_CONTROL)],
    Json(Envelope::data(items).with_total(total)),
  ))
}

// ─── Create ───────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct CreateBody {
  pub nombre:                Option<String>,
  pub area_formativa_id:     Option<String>,
  pub tipo:                  Option<String>,
  pub descripcion:           Option<String>,
  pub duracion_referencia:   Option<u32>,
  pub precio_referencia:     Option<f64>,
  pub porcentaje_subvencion: Option<u8>,
  pub modalidad:             Option<Modality>,
}

impl From<CreateBody> for CourseInput {
  fn from(body: CreateBody) -> Self {
    Self {
      name:               body.nombre,
      area_id:            body.area_formativa_id,
      category:           body.tipo,
      short_description:  body.descripcion,
      duration_hours:     body.duracion_referencia,
      base_price:         body.precio_referencia,
      subsidy_percentage: body.porcentaje_subvencion,
      modality:           body.modalidad,
    }
  }
}

#[derive(Debug, Serialize)]
pub struct CreatedCourse {
  pub id:     Uuid,
  pub codigo: String,
  pub nombre: String,
}

/// `POST /cursos`
pub async fn create<S>(
  State(state): State<AppState<S>>,
  actor: MaybeActor,
  body: Result<Json<CreateBody>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError>
where
  S: CatalogStore + 'static,
  S::Error: Into<Error>,
{
  let Json(body) = body?;
  let course = state.catalog.create_course(actor.actor(), body.into()).await?;

  let message = format!("Curso creado con código: {}", course.code);
  let data = CreatedCourse { id: course.course_id, codigo: course.code, nombre: course.name };
  Ok((StatusCode::CREATED, Json(Envelope::data(data).with_message(message))))
}

// ─── Next code ────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct NextCodeParams {
  #[serde(rename = "areaId")]
  pub area_id: Option<String>,
  pub tipo:    Option<String>,
}

#[derive(Debug, Serialize)]
pub struct NextCode {
  pub codigo:      String,
  pub area_codigo: String,
  pub tipo_codigo: &'static str,
  pub secuencial:  String,
}

/// `GET /cursos/siguiente-codigo?areaId=<uuid>&tipo=<category>`
pub async fn next_code<S>(
  State(state): State<AppState<S>>,
  actor: MaybeActor,
  params: Result<Query<NextCodeParams>, QueryRejection>,
) -> Result<Json<Envelope<NextCode>>, ApiError>
where
  S: CatalogStore + 'static,
  S::Error: Into<Error>,
{
  let Query(params) = params?;
  let preview = state
    .catalog
    .preview_code(actor.actor(), params.area_id.as_deref(), params.tipo.as_deref())
    .await?;
  Ok(Json(Envelope::data(NextCode {
    codigo:      preview.code,
    area_codigo: preview.area_code,
    tipo_codigo: preview.category_code,
    secuencial:  preview.sequence,
  })))
}

// ─── Update ───────────────────────────────────────────────────────────────────

/// Wire name accepted by `PATCH /cursos/{id}` and the course field it sets.
const PATCH_FIELDS: [(&str, &str); 11] = [
  ("nombre", "name"),
  ("descripcion", "short_description"),
  ("duracion_referencia", "duration_hours"),
  ("precio_referencia", "base_price"),
  ("porcentaje_subvencion", "subsidy_percentage"),
  ("modalidad", "modality"),
  ("activo", "active"),
  ("destacado", "featured"),
  ("codigo", "code"),
  ("slug", "slug"),
  ("created_by", "created_by"),
];

/// Rename a `PATCH` body from wire names to course field names.
fn patch_payload(body: Map<String, Value>) -> Result<Map<String, Value>, ApiError> {
  body
    .into_iter()
    .map(|(key, value)| {
      PATCH_FIELDS
        .iter()
        .find(|(wire, _)| *wire == key)
        .map(|(_, field)| ((*field).to_owned(), value))
        .ok_or_else(|| ApiError::BadRequest(format!("unknown field: {key}")))
    })
    .collect()
}

/// A course as returned by `PATCH /cursos/{id}`.
#[derive(Debug, Serialize)]
pub struct CourseDetail {
  pub id:                    Uuid,
  pub codigo:                String,
  pub slug:                  String,
  pub nombre:                String,
  pub tipo:                  &'static str,
  pub area_formativa_id:     Uuid,
  pub descripcion:           String,
  pub duracion_referencia:   Option<u32>,
  pub precio_referencia:     Option<f64>,
  pub porcentaje_subvencion: u8,
  pub modalidad:             Modality,
  pub activo:                bool,
  pub destacado:             bool,
  pub created_by:            Option<Uuid>,
}

impl From<Course> for CourseDetail {
  fn from(course: Course) -> Self {
    Self {
      id:                    course.course_id,
      codigo:                course.code,
      slug:                  course.slug,
      nombre:                course.name,
      tipo:                  course.category.course_type(),
      area_formativa_id:     course.area_id,
      descripcion:           course.short_description,
      duracion_referencia:   course.duration_hours,
      precio_referencia:     course.base_price,
      porcentaje_subvencion: course.subsidy_percentage,
      modalidad:             course.modality,
      activo:                course.active,
      destacado:             course.featured,
      created_by:            course.created_by,
    }
  }
}

/// `PATCH /cursos/{id}`
pub async fn update<S>(
  State(state): State<AppState<S>>,
  actor: MaybeActor,
  id: Result<Path<Uuid>, PathRejection>,
  body: Result<Json<Map<String, Value>>, JsonRejection>,
) -> Result<Json<Envelope<CourseDetail>>, ApiError>
where
  S: CatalogStore + 'static,
  S::Error: Into<Error>,
{
  let Path(id) = id?;
  let Json(body) = body?;
  let payload = patch_payload(body)?;
  let course = state.catalog.update_course(actor.actor(), id, payload).await?;
  Ok(Json(Envelope::data(course.into())))
}
