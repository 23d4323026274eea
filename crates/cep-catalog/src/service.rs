//! [`CatalogService`]: policy-checked catalog operations.

use std::{collections::HashMap, future::Future, sync::Arc, time::Duration};

use cep_core::{
  Error, Result,
  actor::Actor,
  area::{Area, AreaPatch, NewArea},
  course::{Course, CourseCategory, CourseCode, CoursePatch, Modality, NewCourse, slugify, validate_subsidy},
  policy::{AccessDecision, Operation, PolicyEngine, Resource},
  staff::{NewStaff, StaffInput, StaffPatch, StaffQuery},
  store::CatalogStore,
};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use serde_json::{Map, Value};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::{locks::KeyedLocks, sequencer};

/// Bound applied to every store read unless overridden.
pub const DEFAULT_STORAGE_TIMEOUT: Duration = Duration::from_secs(5);

/// Maximum number of courses returned by [`CatalogService::list_courses`].
pub const LIST_LIMIT: usize = 100;

/// Sequence-and-insert attempts per course creation: the first try plus one
/// retry after a duplicate code.
const CREATE_ATTEMPTS: u32 = 2;

// ─── Inputs and outputs ──────────────────────────────────────────────────────

/// Raw course-creation input. Required fields are optional here so that
/// their absence is reported as a validation error, not a parse failure.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CourseInput {
  pub name:               Option<String>,
  pub area_id:            Option<String>,
  pub category:           Option<String>,
  pub short_description:  Option<String>,
  pub duration_hours:     Option<u32>,
  pub base_price:         Option<f64>,
  pub subsidy_percentage: Option<u8>,
  pub modality:           Option<Modality>,
}

/// The code a new course would receive, split into its parts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CoursePreview {
  pub code:          String,
  pub area_code:     String,
  pub category_code: &'static str,
  pub sequence:      String,
}

impl From<&CourseCode> for CoursePreview {
  fn from(code: &CourseCode) -> Self {
    Self {
      code:          code.to_string(),
      area_code:     code.area_code().to_owned(),
      category_code: code.category().code(),
      sequence:      code.sequence_str(),
    }
  }
}

/// A course with the name of its area, as shown in listings.
#[derive(Debug, Clone, Serialize)]
pub struct CourseListing {
  pub course:    Course,
  pub area_name: Option<String>,
}

// ─── Service ─────────────────────────────────────────────────────────────────

/// The catalog request handler.
///
/// Every operation evaluates the access policy before touching the store, so
/// a denied request has no side effects.
pub struct CatalogService<S> {
  store:           Arc<S>,
  policy:          PolicyEngine,
  locks:           KeyedLocks,
  storage_timeout: Duration,
}

fn non_blank(value: Option<String>) -> Option<String> {
  value.filter(|v| !v.trim().is_empty())
}

fn parse_id(raw: &str, what: &str) -> Result<Uuid> {
  Uuid::parse_str(raw.trim()).map_err(|_| Error::Validation(format!("malformed {what}: {raw:?}")))
}

fn document<T: Serialize>(value: &T) -> Result<Value> { Ok(serde_json::to_value(value)?) }

fn from_payload<T: DeserializeOwned>(payload: Map<String, Value>) -> Result<T> {
  serde_json::from_value(Value::Object(payload)).map_err(|e| Error::Validation(e.to_string()))
}

impl<S> CatalogService<S>
where
  S: CatalogStore,
  S::Error: Into<Error>,
{
  /// A service over `store` with the standard policy table.
  pub fn new(store: Arc<S>) -> Self {
    Self {
      store,
      policy: PolicyEngine::standard(),
      locks: KeyedLocks::new(),
      storage_timeout: DEFAULT_STORAGE_TIMEOUT,
    }
  }

  pub fn with_policy(mut self, policy: PolicyEngine) -> Self {
    self.policy = policy;
    self
  }

  pub fn with_storage_timeout(mut self, timeout: Duration) -> Self {
    self.storage_timeout = timeout;
    self
  }

  pub fn policy(&self) -> &PolicyEngine { &self.policy }

  pub fn store(&self) -> &S { &self.store }

  // ── Plumbing ──────────────────────────────────────────────────────────────

  async fn bounded<T>(&self, fut: impl Future<Output = Result<T>>) -> Result<T> {
    tokio::time::timeout(self.storage_timeout, fut).await.map_err(|_| {
      warn!(timeout = ?self.storage_timeout, "storage call timed out");
      Error::StorageTimeout
    })?
  }

  async fn storage<T>(&self, fut: impl Future<Output = Result<T, S::Error>>) -> Result<T> {
    self.bounded(async { fut.await.map_err(Into::into) }).await
  }

  /// Await a store write to completion. Writes are never abandoned once
  /// issued; their deadline is enforced by the store.
  async fn write<T>(&self, fut: impl Future<Output = Result<T, S::Error>>) -> Result<T> {
    fut.await.map_err(Into::into)
  }

  fn authorize(
    &self,
    actor: Option<&Actor>,
    operation: Operation,
    resource: Resource,
  ) -> Result<AccessDecision> {
    let decision = self.policy.decide(actor, operation, resource);
    if !decision.is_allowed() {
      debug!(
        role = ?actor.map(|a| a.role),
        %operation,
        %resource,
        "access denied"
      );
      return Err(Error::Forbidden);
    }
    Ok(decision)
  }

  /// Serialise `record`, check it against a read `decision` and redact the
  /// fields the actor may not see. `None` if the record is out of scope.
  fn visible<T: Serialize>(
    &self,
    actor: Option<&Actor>,
    resource: Resource,
    decision: &AccessDecision,
    record: &T,
  ) -> Result<Option<Value>> {
    let mut doc = document(record)?;
    if !decision.permits(&doc) {
      return Ok(None);
    }
    self.policy.redact(actor, resource, &mut doc);
    Ok(Some(doc))
  }

  fn strip_unwritable(
    &self,
    actor: Option<&Actor>,
    resource: Resource,
    operation: Operation,
    payload: &mut Map<String, Value>,
  ) {
    let stripped = self.policy.retain_writable(actor, resource, operation, payload);
    if !stripped.is_empty() {
      info!(%resource, %operation, ?stripped, "ignoring fields the actor may not write");
    }
  }

  /// Require `decision` to admit the stored `record`, else `Forbidden`.
  fn check_scope<T: Serialize>(&self, decision: &AccessDecision, record: &T) -> Result<()> {
    if decision.permits(&document(record)?) {
      Ok(())
    } else {
      Err(Error::Forbidden)
    }
  }

  // ── Courses ───────────────────────────────────────────────────────────────

  /// Create a course with an auto-generated code.
  ///
  /// Order of checks: policy, required fields, area lookup, category,
  /// sequencing. The sequence-and-insert span holds the prefix lock and is
  /// retried once if the store reports the code as taken.
  pub async fn create_course(&self, actor: Option<&Actor>, input: CourseInput) -> Result<Course> {
    self.authorize(actor, Operation::Create, Resource::Courses)?;

    let (Some(name), Some(area_id), Some(tag)) = (
      non_blank(input.name),
      non_blank(input.area_id),
      non_blank(input.category),
    ) else {
      return Err(Error::Validation(
        "required fields: name, area_id, category".into(),
      ));
    };
    let area_id = parse_id(&area_id, "area id")?;
    let subsidy_percentage = input.subsidy_percentage.unwrap_or(100);
    validate_subsidy(subsidy_percentage)?;

    let area = self
      .storage(self.store.get_area(area_id))
      .await?
      .ok_or(Error::AreaNotFound(area_id))?;
    let category = CourseCategory::parse(&tag)?;

    let prefix = CourseCode::prefix(&area.code, category);
    let _guard = self.locks.lock(&prefix).await;

    let mut attempt = 1;
    loop {
      let code = self
        .bounded(sequencer::next_code(self.store.as_ref(), &area, category))
        .await?;

      let new_course = NewCourse {
        code:               code.to_string(),
        slug:               slugify(&name),
        name:               name.trim().to_owned(),
        area_id,
        category,
        short_description:  input.short_description.clone().unwrap_or_default(),
        duration_hours:     input.duration_hours,
        base_price:         input.base_price,
        subsidy_percentage,
        modality:           input.modality.unwrap_or_default(),
        created_by:         actor.map(|a| a.user_id),
      };

      match self.write(self.store.create_course(new_course)).await {
        Ok(course) => {
          info!(code = %course.code, course_id = %course.course_id, "course created");
          return Ok(course);
        }
        Err(Error::DuplicateCode(taken)) if attempt < CREATE_ATTEMPTS => {
          warn!(code = %taken, attempt, "course code taken concurrently, resequencing");
          attempt += 1;
        }
        Err(e) => return Err(e),
      }
    }
  }

  /// The code the next course for `(area_id, category)` would receive.
  /// Gated like course creation; nothing is reserved.
  pub async fn preview_code(
    &self,
    actor: Option<&Actor>,
    area_id: Option<&str>,
    category: Option<&str>,
  ) -> Result<CoursePreview> {
    self.authorize(actor, Operation::Create, Resource::Courses)?;

    let (Some(area_id), Some(tag)) = (
      area_id.filter(|v| !v.trim().is_empty()),
      category.filter(|v| !v.trim().is_empty()),
    ) else {
      return Err(Error::Validation("required parameters: area_id, category".into()));
    };
    let area_id = parse_id(area_id, "area id")?;
    let category = CourseCategory::parse(tag)?;

    let (_, code) = self
      .bounded(sequencer::next_code_for(self.store.as_ref(), area_id, category))
      .await?;
    Ok(CoursePreview::from(&code))
  }

  /// Courses visible to `actor`, newest first and capped at [`LIST_LIMIT`],
  /// together with the total number visible.
  pub async fn list_courses(&self, actor: Option<&Actor>) -> Result<(Vec<CourseListing>, usize)> {
    let decision = self.authorize(actor, Operation::Read, Resource::Courses)?;

    let courses = self.storage(self.store.list_courses()).await?;
    let area_names: HashMap<Uuid, String> = self
      .storage(self.store.list_areas())
      .await?
      .into_iter()
      .map(|a| (a.area_id, a.name))
      .collect();

    let mut visible = Vec::new();
    for course in courses {
      if decision.permits(&document(&course)?) {
        visible.push(course);
      }
    }
    let total = visible.len();

    let listings = visible
      .into_iter()
      .take(LIST_LIMIT)
      .map(|course| CourseListing {
        area_name: area_names.get(&course.area_id).cloned(),
        course,
      })
      .collect();
    Ok((listings, total))
  }

  /// Apply a partial update. `code` and `created_by` are stripped from the
  /// payload for every actor.
  pub async fn update_course(
    &self,
    actor: Option<&Actor>,
    id: Uuid,
    mut payload: Map<String, Value>,
  ) -> Result<Course> {
    let decision = self.authorize(actor, Operation::Update, Resource::Courses)?;

    let existing = self
      .storage(self.store.get_course(id))
      .await?
      .ok_or(Error::NotFound(Resource::Courses, id))?;
    self.check_scope(&decision, &existing)?;

    self.strip_unwritable(actor, Resource::Courses, Operation::Update, &mut payload);
    let patch: CoursePatch = from_payload(payload)?;
    patch.validate()?;

    self
      .write(self.store.update_course(id, patch))
      .await?
      .ok_or(Error::NotFound(Resource::Courses, id))
  }

  // ── Areas ─────────────────────────────────────────────────────────────────

  pub async fn list_areas(&self, actor: Option<&Actor>) -> Result<Vec<Value>> {
    let decision = self.authorize(actor, Operation::Read, Resource::Areas)?;
    let areas = self.storage(self.store.list_areas()).await?;

    let mut out = Vec::with_capacity(areas.len());
    for area in &areas {
      if let Some(doc) = self.visible(actor, Resource::Areas, &decision, area)? {
        out.push(doc);
      }
    }
    Ok(out)
  }

  pub async fn get_area(&self, actor: Option<&Actor>, id: Uuid) -> Result<Value> {
    let decision = self.authorize(actor, Operation::Read, Resource::Areas)?;
    let area = self
      .storage(self.store.get_area(id))
      .await?
      .ok_or(Error::AreaNotFound(id))?;
    self
      .visible(actor, Resource::Areas, &decision, &area)?
      .ok_or(Error::AreaNotFound(id))
  }

  pub async fn create_area(
    &self,
    actor: Option<&Actor>,
    mut payload: Map<String, Value>,
  ) -> Result<Area> {
    self.authorize(actor, Operation::Create, Resource::Areas)?;
    self.strip_unwritable(actor, Resource::Areas, Operation::Create, &mut payload);

    let input: NewArea = from_payload(payload)?;
    input.validate()?;

    let area = self.write(self.store.add_area(input)).await?;
    info!(code = %area.code, area_id = %area.area_id, "area created");
    Ok(area)
  }

  /// Apply a partial update. The area code is write-once and is stripped.
  pub async fn update_area(
    &self,
    actor: Option<&Actor>,
    id: Uuid,
    mut payload: Map<String, Value>,
  ) -> Result<Area> {
    let decision = self.authorize(actor, Operation::Update, Resource::Areas)?;

    let existing = self
      .storage(self.store.get_area(id))
      .await?
      .ok_or(Error::AreaNotFound(id))?;
    self.check_scope(&decision, &existing)?;

    self.strip_unwritable(actor, Resource::Areas, Operation::Update, &mut payload);
    let patch: AreaPatch = from_payload(payload)?;
    patch.validate()?;

    self
      .write(self.store.update_area(id, patch))
      .await?
      .ok_or(Error::AreaNotFound(id))
  }

  // ── Staff ─────────────────────────────────────────────────────────────────

  /// Staff visible to `actor`, redacted field by field.
  pub async fn list_staff(&self, actor: Option<&Actor>, query: StaffQuery) -> Result<Vec<Value>> {
    let decision = self.authorize(actor, Operation::Read, Resource::Staff)?;
    let members = self.storage(self.store.list_staff(query)).await?;

    let mut out = Vec::with_capacity(members.len());
    for member in &members {
      if let Some(doc) = self.visible(actor, Resource::Staff, &decision, member)? {
        out.push(doc);
      }
    }
    Ok(out)
  }

  /// One staff member. Members outside the actor's read scope are reported
  /// as not found.
  pub async fn get_staff(&self, actor: Option<&Actor>, id: Uuid) -> Result<Value> {
    let decision = self.authorize(actor, Operation::Read, Resource::Staff)?;
    let member = self
      .storage(self.store.get_staff(id))
      .await?
      .ok_or(Error::NotFound(Resource::Staff, id))?;
    self
      .visible(actor, Resource::Staff, &decision, &member)?
      .ok_or(Error::NotFound(Resource::Staff, id))
  }

  /// Create a staff member. `created_by` is taken from the actor, never
  /// from the payload.
  pub async fn create_staff(
    &self,
    actor: Option<&Actor>,
    mut payload: Map<String, Value>,
  ) -> Result<Value> {
    self.authorize(actor, Operation::Create, Resource::Staff)?;
    self.strip_unwritable(actor, Resource::Staff, Operation::Create, &mut payload);

    let input: StaffInput = from_payload(payload)?;
    input.validate()?;

    let member = self
      .write(self.store.add_staff(NewStaff { input, created_by: actor.map(|a| a.user_id) }))
      .await?;
    info!(staff_id = %member.staff_id, "staff member created");

    let mut doc = document(&member)?;
    self.policy.redact(actor, Resource::Staff, &mut doc);
    Ok(doc)
  }

  /// Apply a partial update. `created_by` is stripped for every actor, so
  /// the stored value never changes.
  pub async fn update_staff(
    &self,
    actor: Option<&Actor>,
    id: Uuid,
    mut payload: Map<String, Value>,
  ) -> Result<Value> {
    let decision = self.authorize(actor, Operation::Update, Resource::Staff)?;

    let existing = self
      .storage(self.store.get_staff(id))
      .await?
      .ok_or(Error::NotFound(Resource::Staff, id))?;
    self.check_scope(&decision, &existing)?;

    self.strip_unwritable(actor, Resource::Staff, Operation::Update, &mut payload);
    let patch: StaffPatch = from_payload(payload)?;
    patch.validate()?;

    let member = self
      .write(self.store.update_staff(id, patch))
      .await?
      .ok_or(Error::NotFound(Resource::Staff, id))?;

    let mut doc = document(&member)?;
    self.policy.redact(actor, Resource::Staff, &mut doc);
    Ok(doc)
  }

  pub async fn delete_staff(&self, actor: Option<&Actor>, id: Uuid) -> Result<()> {
    let decision = self.authorize(actor, Operation::Delete, Resource::Staff)?;

    let existing = self
      .storage(self.store.get_staff(id))
      .await?
      .ok_or(Error::NotFound(Resource::Staff, id))?;
    self.check_scope(&decision, &existing)?;

    if !self.write(self.store.delete_staff(id)).await? {
      return Err(Error::NotFound(Resource::Staff, id));
    }
    info!(staff_id = %id, "staff member deleted");
    Ok(())
  }
}
