//! Service tests against an in-memory SQLite store.

use std::{
  sync::{
    Arc,
    atomic::{AtomicU32, Ordering},
  },
  time::Duration,
};

use cep_core::{
  Error,
  actor::{Actor, Role},
  area::{Area, AreaPatch, NewArea},
  course::{Course, CourseCategory, CoursePatch, Modality, NewCourse},
  policy::Resource,
  staff::{NewStaff, StaffMember, StaffPatch, StaffQuery},
  store::CatalogStore,
};
use cep_store_sqlite::SqliteStore;
use chrono::Utc;
use serde_json::{Map, Value, json};
use uuid::Uuid;

use crate::{CatalogService, CourseInput, sequencer};

async fn store() -> SqliteStore {
  SqliteStore::open_in_memory()
    .await
    .expect("in-memory store")
}

async fn service() -> CatalogService<SqliteStore> { CatalogService::new(Arc::new(store().await)) }

async fn seed_area(svc: &CatalogService<SqliteStore>, code: &str) -> Area {
  svc
    .store()
    .add_area(NewArea {
      code:        code.into(),
      name:        format!("Área {code}"),
      description: None,
      color:       None,
      active:      true,
    })
    .await
    .unwrap()
}

fn seed_course(area_id: Uuid, code: &str) -> NewCourse {
  NewCourse {
    code:               code.into(),
    slug:               code.to_lowercase(),
    name:               format!("Curso {code}"),
    area_id,
    category:           CourseCategory::Privados,
    short_description:  String::new(),
    duration_hours:     None,
    base_price:         None,
    subsidy_percentage: 100,
    modality:           Modality::Presencial,
    created_by:         None,
  }
}

fn input(area: &Area, category: &str) -> CourseInput {
  CourseInput {
    name: Some("Community Manager".into()),
    area_id: Some(area.area_id.to_string()),
    category: Some(category.into()),
    ..Default::default()
  }
}

fn payload(value: Value) -> Map<String, Value> {
  match value {
    Value::Object(map) => map,
    other => panic!("expected an object, got {other}"),
  }
}

fn staff_payload(email: &str) -> Map<String, Value> {
  payload(json!({
    "staff_type": "profesor",
    "first_name": "Lucía",
    "last_name": "Martín",
    "email": email,
    "phone": "+34 600 123 456",
    "position": "Docente de marketing",
    "notes": "contrato temporal",
  }))
}

fn admin() -> Actor { Actor::with_role(Role::Admin) }

// ─── Sequencing ──────────────────────────────────────────────────────────────

#[tokio::test]
async fn first_and_second_course_codes() {
  let svc = service().await;
  let area = seed_area(&svc, "MKT").await;
  let actor = admin();

  let first = svc.create_course(Some(&actor), input(&area, "privados")).await.unwrap();
  assert_eq!(first.code, "MKT-PRIV-0001");
  assert_eq!(first.category, CourseCategory::Privados);
  assert_eq!(first.created_by, Some(actor.user_id));
  assert!(first.active);

  let second = svc.create_course(Some(&actor), input(&area, "privados")).await.unwrap();
  assert_eq!(second.code, "MKT-PRIV-0002");
}

#[tokio::test]
async fn created_courses_get_distinct_slugs_from_their_names() {
  let svc = service().await;
  let area = seed_area(&svc, "MKT").await;

  let first = svc.create_course(Some(&admin()), input(&area, "privados")).await.unwrap();
  let second = svc.create_course(Some(&admin()), input(&area, "ocupados")).await.unwrap();
  assert_eq!(first.slug, "community-manager");
  assert_eq!(second.slug, "community-manager-1");

  // The slug is system-managed and survives a patch that names it.
  let patched = svc
    .update_course(Some(&admin()), first.course_id, payload(json!({ "slug": "otro" })))
    .await
    .unwrap();
  assert_eq!(patched.slug, "community-manager");
}

#[tokio::test]
async fn sequences_are_scoped_per_category() {
  let svc = service().await;
  let area = seed_area(&svc, "MKT").await;
  svc.create_course(Some(&admin()), input(&area, "privados")).await.unwrap();

  let ocup = svc.create_course(Some(&admin()), input(&area, "ocupados")).await.unwrap();
  assert_eq!(ocup.code, "MKT-OCUP-0001");
}

#[tokio::test]
async fn gaps_are_not_refilled() {
  let svc = service().await;
  let area = seed_area(&svc, "MKT").await;
  for code in ["MKT-PRIV-0001", "MKT-PRIV-0004"] {
    svc.store().create_course(seed_course(area.area_id, code)).await.unwrap();
  }

  let next = svc.create_course(Some(&admin()), input(&area, "privados")).await.unwrap();
  assert_eq!(next.code, "MKT-PRIV-0005");
}

#[tokio::test]
async fn unknown_category_is_rejected_without_side_effects() {
  let svc = service().await;
  let area = seed_area(&svc, "MKT").await;

  let err = svc.create_course(Some(&admin()), input(&area, "gratis")).await.unwrap_err();
  assert!(matches!(err, Error::InvalidCategory(ref t) if t == "gratis"), "{err:?}");
  assert!(svc.store().list_courses().await.unwrap().is_empty());
}

#[tokio::test]
async fn corrupt_existing_code_fails_loudly() {
  let svc = service().await;
  let area = seed_area(&svc, "MKT").await;
  svc
    .store()
    .insert_course(&Course {
      course_id:          Uuid::new_v4(),
      code:               "MKT-PRIV-00A1".into(),
      slug:               "importado".into(),
      name:               "Importado".into(),
      area_id:            area.area_id,
      category:           CourseCategory::Privados,
      short_description:  String::new(),
      duration_hours:     None,
      base_price:         None,
      subsidy_percentage: 100,
      modality:           Modality::Online,
      active:             true,
      featured:           false,
      created_by:         None,
      created_at:         Utc::now(),
    })
    .await
    .unwrap();

  let err = svc.create_course(Some(&admin()), input(&area, "privados")).await.unwrap_err();
  assert!(matches!(err, Error::CorruptExistingCode(ref c) if c == "MKT-PRIV-00A1"), "{err:?}");
}

#[tokio::test]
async fn exhausted_sequence_is_reported() {
  let svc = service().await;
  let area = seed_area(&svc, "DEV").await;
  let mut last = seed_course(area.area_id, "DEV-TELE-9999");
  last.category = CourseCategory::Teleformacion;
  svc.store().create_course(last).await.unwrap();

  let err = svc
    .create_course(Some(&admin()), input(&area, "teleformacion"))
    .await
    .unwrap_err();
  assert!(matches!(err, Error::SequenceExhausted(ref p) if p == "DEV-TELE-"), "{err:?}");
}

#[tokio::test]
async fn missing_fields_and_unknown_area() {
  let svc = service().await;
  let area = seed_area(&svc, "MKT").await;

  let mut no_name = input(&area, "privados");
  no_name.name = Some("  ".into());
  let err = svc.create_course(Some(&admin()), no_name).await.unwrap_err();
  assert!(matches!(err, Error::Validation(_)), "{err:?}");

  let mut bad_id = input(&area, "privados");
  bad_id.area_id = Some("not-a-uuid".into());
  let err = svc.create_course(Some(&admin()), bad_id).await.unwrap_err();
  assert!(matches!(err, Error::Validation(_)), "{err:?}");

  let ghost = Uuid::new_v4();
  let mut unknown = input(&area, "privados");
  unknown.area_id = Some(ghost.to_string());
  let err = svc.create_course(Some(&admin()), unknown).await.unwrap_err();
  assert!(matches!(err, Error::AreaNotFound(id) if id == ghost), "{err:?}");
}

#[tokio::test]
async fn concurrent_creates_get_distinct_consecutive_codes() {
  let svc = Arc::new(service().await);
  let area = seed_area(&svc, "MKT").await;
  let actor = admin();

  let handles: Vec<_> = (0..20)
    .map(|_| {
      let svc = Arc::clone(&svc);
      let input = input(&area, "privados");
      tokio::spawn(async move { svc.create_course(Some(&actor), input).await })
    })
    .collect();

  let mut codes = Vec::new();
  for handle in handles {
    codes.push(handle.await.unwrap().unwrap().code);
  }
  codes.sort();

  let expected: Vec<String> = (1..=20).map(|n| format!("MKT-PRIV-{n:04}")).collect();
  assert_eq!(codes, expected);
}

#[tokio::test]
async fn preview_does_not_reserve() {
  let svc = service().await;
  let area = seed_area(&svc, "MKT").await;
  let actor = admin();
  let area_id = area.area_id.to_string();

  let preview = svc
    .preview_code(Some(&actor), Some(&area_id), Some("desempleados"))
    .await
    .unwrap();
  assert_eq!(preview.code, "MKT-DESE-0001");
  assert_eq!(preview.area_code, "MKT");
  assert_eq!(preview.category_code, "DESE");
  assert_eq!(preview.sequence, "0001");

  let again = svc
    .preview_code(Some(&actor), Some(&area_id), Some("desempleados"))
    .await
    .unwrap();
  assert_eq!(again, preview);

  let err = svc.preview_code(None, Some(&area_id), Some("desempleados")).await.unwrap_err();
  assert!(matches!(err, Error::Forbidden));
}

#[tokio::test]
async fn sequencer_resolves_area() {
  let s = store().await;
  let ghost = Uuid::new_v4();
  let err = sequencer::next_code_for(&s, ghost, CourseCategory::Ocupados).await.unwrap_err();
  assert!(matches!(err, Error::AreaNotFound(id) if id == ghost));
}

// ─── Store faults ────────────────────────────────────────────────────────────

enum Fault {
  /// Another writer claims the sequenced code `times` times, between the
  /// code lookup and the insert.
  Race { area_id: Uuid, times: AtomicU32 },
  /// Every area lookup stalls.
  Slow(Duration),
  /// Course inserts commit, then the acknowledgement stalls.
  SlowAck(Duration),
  /// Course inserts reach the store after their write deadline.
  ExpiredWrites,
}

struct FaultyStore {
  inner: SqliteStore,
  fault: Fault,
}

impl CatalogStore for FaultyStore {
  type Error = cep_store_sqlite::Error;

  async fn add_area(&self, input: NewArea) -> Result<Area, Self::Error> {
    self.inner.add_area(input).await
  }

  async fn get_area(&self, id: Uuid) -> Result<Option<Area>, Self::Error> {
    if let Fault::Slow(delay) = &self.fault {
      tokio::time::sleep(*delay).await;
    }
    self.inner.get_area(id).await
  }

  async fn list_areas(&self) -> Result<Vec<Area>, Self::Error> { self.inner.list_areas().await }

  async fn update_area(&self, id: Uuid, patch: AreaPatch) -> Result<Option<Area>, Self::Error> {
    self.inner.update_area(id, patch).await
  }

  async fn last_course_code<'a>(&'a self, prefix: &'a str) -> Result<Option<String>, Self::Error> {
    let latest = self.inner.last_course_code(prefix).await?;
    if let Fault::Race { area_id, times } = &self.fault {
      let pending = times
        .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
        .is_ok();
      if pending {
        let taken = match &latest {
          Some(code) => {
            let n: u16 = code[prefix.len()..].parse().unwrap_or(0);
            format!("{prefix}{:04}", n + 1)
          }
          None => format!("{prefix}0001"),
        };
        self.inner.create_course(seed_course(*area_id, &taken)).await?;
      }
    }
    Ok(latest)
  }

  async fn create_course(&self, input: NewCourse) -> Result<Course, Self::Error> {
    match &self.fault {
      Fault::SlowAck(delay) => {
        let course = self.inner.create_course(input).await?;
        tokio::time::sleep(*delay).await;
        Ok(course)
      }
      Fault::ExpiredWrites => Err(cep_store_sqlite::Error::WriteTimeout),
      _ => self.inner.create_course(input).await,
    }
  }

  async fn get_course(&self, id: Uuid) -> Result<Option<Course>, Self::Error> {
    self.inner.get_course(id).await
  }

  async fn list_courses(&self) -> Result<Vec<Course>, Self::Error> {
    self.inner.list_courses().await
  }

  async fn update_course(
    &self,
    id: Uuid,
    patch: CoursePatch,
  ) -> Result<Option<Course>, Self::Error> {
    self.inner.update_course(id, patch).await
  }

  async fn add_staff(&self, input: NewStaff) -> Result<StaffMember, Self::Error> {
    self.inner.add_staff(input).await
  }

  async fn get_staff(&self, id: Uuid) -> Result<Option<StaffMember>, Self::Error> {
    self.inner.get_staff(id).await
  }

  async fn list_staff(&self, query: StaffQuery) -> Result<Vec<StaffMember>, Self::Error> {
    self.inner.list_staff(query).await
  }

  async fn update_staff(
    &self,
    id: Uuid,
    patch: StaffPatch,
  ) -> Result<Option<StaffMember>, Self::Error> {
    self.inner.update_staff(id, patch).await
  }

  async fn delete_staff(&self, id: Uuid) -> Result<bool, Self::Error> {
    self.inner.delete_staff(id).await
  }
}

async fn racing_service(times: u32) -> (CatalogService<FaultyStore>, Area) {
  let inner = store().await;
  let area = inner
    .add_area(NewArea {
      code:        "MKT".into(),
      name:        "Marketing".into(),
      description: None,
      color:       None,
      active:      true,
    })
    .await
    .unwrap();
  let fault = Fault::Race { area_id: area.area_id, times: AtomicU32::new(times) };
  (CatalogService::new(Arc::new(FaultyStore { inner, fault })), area)
}

#[tokio::test]
async fn duplicate_code_is_retried_once() {
  let (svc, area) = racing_service(1).await;

  let course = svc.create_course(Some(&admin()), input(&area, "privados")).await.unwrap();
  assert_eq!(course.code, "MKT-PRIV-0002");
}

#[tokio::test]
async fn duplicate_code_surfaces_after_retry() {
  let (svc, area) = racing_service(2).await;

  let err = svc.create_course(Some(&admin()), input(&area, "privados")).await.unwrap_err();
  assert!(matches!(err, Error::DuplicateCode(ref c) if c == "MKT-PRIV-0002"), "{err:?}");
}

#[tokio::test]
async fn slow_store_times_out() {
  let inner = store().await;
  let fault = Fault::Slow(Duration::from_millis(500));
  let svc = CatalogService::new(Arc::new(FaultyStore { inner, fault }))
    .with_storage_timeout(Duration::from_millis(20));

  let err = svc.get_area(None, Uuid::new_v4()).await.unwrap_err();
  assert!(matches!(err, Error::StorageTimeout), "{err:?}");
}

async fn faulty_service(fault: Fault) -> (CatalogService<FaultyStore>, Area) {
  let inner = store().await;
  let area = inner
    .add_area(NewArea {
      code:        "MKT".into(),
      name:        "Marketing".into(),
      description: None,
      color:       None,
      active:      true,
    })
    .await
    .unwrap();
  let svc = CatalogService::new(Arc::new(FaultyStore { inner, fault }))
    .with_storage_timeout(Duration::from_millis(20));
  (svc, area)
}

async fn stored_codes(svc: &CatalogService<FaultyStore>) -> Vec<String> {
  let mut codes: Vec<_> = svc
    .store()
    .list_courses()
    .await
    .unwrap()
    .into_iter()
    .map(|c| c.code)
    .collect();
  codes.sort();
  codes
}

#[tokio::test]
async fn committed_course_is_never_reported_as_timed_out() {
  let (svc, area) = faulty_service(Fault::SlowAck(Duration::from_millis(200))).await;

  let first = svc.create_course(Some(&admin()), input(&area, "privados")).await.unwrap();
  assert_eq!(first.code, "MKT-PRIV-0001");
  assert_eq!(stored_codes(&svc).await, ["MKT-PRIV-0001"]);

  // A follow-up create gets the next code, not a second copy of the first.
  let second = svc.create_course(Some(&admin()), input(&area, "privados")).await.unwrap();
  assert_eq!(second.code, "MKT-PRIV-0002");
  assert_eq!(stored_codes(&svc).await, ["MKT-PRIV-0001", "MKT-PRIV-0002"]);
}

#[tokio::test]
async fn expired_course_write_times_out_and_stores_nothing() {
  let (svc, area) = faulty_service(Fault::ExpiredWrites).await;

  let err = svc.create_course(Some(&admin()), input(&area, "privados")).await.unwrap_err();
  assert!(matches!(err, Error::StorageTimeout), "{err:?}");
  assert!(stored_codes(&svc).await.is_empty());
}

// ─── Courses ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn lectura_and_anonymous_cannot_create_courses() {
  let svc = service().await;
  let area = seed_area(&svc, "MKT").await;

  for actor in [None, Some(Actor::with_role(Role::Lectura)), Some(Actor::with_role(Role::Asesor))] {
    let err = svc.create_course(actor.as_ref(), input(&area, "privados")).await.unwrap_err();
    assert!(matches!(err, Error::Forbidden), "{err:?}");
  }
  assert!(svc.store().list_courses().await.unwrap().is_empty());
}

#[tokio::test]
async fn anonymous_list_hides_inactive_courses() {
  let svc = service().await;
  let area = seed_area(&svc, "MKT").await;
  let a = svc.create_course(Some(&admin()), input(&area, "privados")).await.unwrap();
  let b = svc.create_course(Some(&admin()), input(&area, "privados")).await.unwrap();
  svc
    .update_course(Some(&admin()), a.course_id, payload(json!({ "active": false })))
    .await
    .unwrap();

  let (public, total) = svc.list_courses(None).await.unwrap();
  assert_eq!(total, 1);
  assert_eq!(public[0].course.course_id, b.course_id);
  assert_eq!(public[0].area_name.as_deref(), Some("Área MKT"));

  let (all, total) = svc.list_courses(Some(&Actor::with_role(Role::Lectura))).await.unwrap();
  assert_eq!(total, 2);
  assert_eq!(all[0].course.course_id, b.course_id);
}

#[tokio::test]
async fn course_code_and_creator_are_not_patchable() {
  let svc = service().await;
  let area = seed_area(&svc, "MKT").await;
  let actor = admin();
  let course = svc.create_course(Some(&actor), input(&area, "privados")).await.unwrap();

  let updated = svc
    .update_course(
      Some(&actor),
      course.course_id,
      payload(json!({
        "code": "MKT-PRIV-9000",
        "created_by": Uuid::new_v4(),
        "featured": true,
      })),
    )
    .await
    .unwrap();
  assert_eq!(updated.code, "MKT-PRIV-0001");
  assert_eq!(updated.created_by, Some(actor.user_id));
  assert!(updated.featured);
}

#[tokio::test]
async fn marketing_updates_only_own_courses() {
  let svc = service().await;
  let area = seed_area(&svc, "MKT").await;
  let owner = Actor::with_role(Role::Marketing);
  let other = Actor::with_role(Role::Marketing);
  let course = svc.create_course(Some(&owner), input(&area, "privados")).await.unwrap();
  let change = || payload(json!({ "name": "Community Manager avanzado" }));

  let err = svc.update_course(Some(&other), course.course_id, change()).await.unwrap_err();
  assert!(matches!(err, Error::Forbidden), "{err:?}");

  let updated = svc.update_course(Some(&owner), course.course_id, change()).await.unwrap();
  assert_eq!(updated.name, "Community Manager avanzado");
}

#[tokio::test]
async fn course_patch_is_validated() {
  let svc = service().await;
  let area = seed_area(&svc, "MKT").await;
  let course = svc.create_course(Some(&admin()), input(&area, "privados")).await.unwrap();

  let err = svc
    .update_course(Some(&admin()), course.course_id, payload(json!({ "subsidy_percentage": 150 })))
    .await
    .unwrap_err();
  assert!(matches!(err, Error::Validation(_)), "{err:?}");

  let err = svc
    .update_course(Some(&admin()), course.course_id, payload(json!({ "modality": "hybrid" })))
    .await
    .unwrap_err();
  assert!(matches!(err, Error::Validation(_)), "{err:?}");

  let ghost = Uuid::new_v4();
  let err = svc.update_course(Some(&admin()), ghost, Map::new()).await.unwrap_err();
  assert!(matches!(err, Error::NotFound(Resource::Courses, id) if id == ghost), "{err:?}");
}

// ─── Areas ───────────────────────────────────────────────────────────────────

#[tokio::test]
async fn area_code_is_write_once() {
  let svc = service().await;
  let area = svc
    .create_area(
      Some(&admin()),
      payload(json!({ "code": "MKT", "name": "Marketing Digital", "color": "#FF6600" })),
    )
    .await
    .unwrap();
  assert_eq!(area.code, "MKT");

  let updated = svc
    .update_area(
      Some(&admin()),
      area.area_id,
      payload(json!({ "code": "MKX", "name": "Marketing y Ventas" })),
    )
    .await
    .unwrap();
  assert_eq!(updated.code, "MKT");
  assert_eq!(updated.name, "Marketing y Ventas");
}

#[tokio::test]
async fn area_mutations_need_a_manager() {
  let svc = service().await;
  let body = || payload(json!({ "code": "DEV", "name": "Desarrollo" }));

  let err = svc
    .create_area(Some(&Actor::with_role(Role::Marketing)), body())
    .await
    .unwrap_err();
  assert!(matches!(err, Error::Forbidden));

  let gestor = Actor::with_role(Role::Gestor);
  svc.create_area(Some(&gestor), body()).await.unwrap();
  let err = svc.create_area(Some(&gestor), body()).await.unwrap_err();
  assert!(matches!(err, Error::Conflict(_)), "{err:?}");

  let err = svc
    .create_area(Some(&gestor), payload(json!({ "code": "dev1", "name": "Desarrollo" })))
    .await
    .unwrap_err();
  assert!(matches!(err, Error::Validation(_)), "{err:?}");

  assert_eq!(svc.list_areas(None).await.unwrap().len(), 1);
}

// ─── Staff ───────────────────────────────────────────────────────────────────

#[tokio::test]
async fn marketing_cannot_mutate_staff() {
  let svc = service().await;
  let member = svc.create_staff(Some(&admin()), staff_payload("a@cep.example")).await.unwrap();
  let id: Uuid = serde_json::from_value(member["staff_id"].clone()).unwrap();
  let marketing = Actor::with_role(Role::Marketing);

  let err = svc.create_staff(Some(&marketing), staff_payload("b@cep.example")).await.unwrap_err();
  assert!(matches!(err, Error::Forbidden));
  let err = svc
    .update_staff(Some(&marketing), id, payload(json!({ "bio": "x" })))
    .await
    .unwrap_err();
  assert!(matches!(err, Error::Forbidden));
  let err = svc.delete_staff(Some(&marketing), id).await.unwrap_err();
  assert!(matches!(err, Error::Forbidden));

  assert_eq!(svc.store().list_staff(StaffQuery::default()).await.unwrap().len(), 1);
}

#[tokio::test]
async fn created_by_comes_from_the_actor_and_never_changes() {
  let svc = service().await;
  let actor = admin();
  let mut body = staff_payload("a@cep.example");
  body.insert("created_by".into(), json!(Uuid::new_v4()));

  let member = svc.create_staff(Some(&actor), body).await.unwrap();
  assert_eq!(member["created_by"], json!(actor.user_id));
  assert_eq!(member["full_name"], "Lucía Martín");
  let id: Uuid = serde_json::from_value(member["staff_id"].clone()).unwrap();

  let updated = svc
    .update_staff(
      Some(&admin()),
      id,
      payload(json!({ "created_by": Uuid::new_v4(), "position": "Coordinadora" })),
    )
    .await
    .unwrap();
  assert_eq!(updated["created_by"], json!(actor.user_id));
  assert_eq!(updated["position"], "Coordinadora");

  let stored = svc.store().get_staff(id).await.unwrap().unwrap();
  assert_eq!(stored.created_by, Some(actor.user_id));
}

#[tokio::test]
async fn anonymous_staff_view_is_scoped_and_redacted() {
  let svc = service().await;
  let actor = admin();
  svc.create_staff(Some(&actor), staff_payload("prof@cep.example")).await.unwrap();

  let mut inactive = staff_payload("old@cep.example");
  inactive.insert("is_active".into(), json!(false));
  let inactive = svc.create_staff(Some(&actor), inactive).await.unwrap();

  let mut admin_staff = staff_payload("office@cep.example");
  admin_staff.insert("staff_type".into(), json!("administrativo"));
  svc.create_staff(Some(&actor), admin_staff).await.unwrap();

  let public = svc.list_staff(None, StaffQuery::default()).await.unwrap();
  assert_eq!(public.len(), 1);
  let doc = public[0].as_object().unwrap();
  assert!(!doc.contains_key("email"));
  assert!(!doc.contains_key("phone"));
  assert!(!doc.contains_key("notes"));
  assert_eq!(doc["full_name"], "Lucía Martín");

  let inactive_id: Uuid = serde_json::from_value(inactive["staff_id"].clone()).unwrap();
  let err = svc.get_staff(None, inactive_id).await.unwrap_err();
  assert!(matches!(err, Error::NotFound(Resource::Staff, _)), "{err:?}");

  let lectura = Actor::with_role(Role::Lectura);
  let seen = svc.list_staff(Some(&lectura), StaffQuery::default()).await.unwrap();
  assert_eq!(seen.len(), 3);
  assert!(seen.iter().all(|d| d.get("email").is_some() && d.get("notes").is_none()));

  let full = svc.get_staff(Some(&actor), inactive_id).await.unwrap();
  assert_eq!(full["notes"], "contrato temporal");
}

#[tokio::test]
async fn staff_input_is_validated() {
  let svc = service().await;
  let mut body = staff_payload("a@cep.example");
  body.insert("phone".into(), json!("600123456"));

  let err = svc.create_staff(Some(&admin()), body).await.unwrap_err();
  assert!(matches!(err, Error::Validation(_)), "{err:?}");

  let mut body = staff_payload("a@cep.example");
  body.remove("first_name");
  let err = svc.create_staff(Some(&admin()), body).await.unwrap_err();
  assert!(matches!(err, Error::Validation(_)), "{err:?}");
}

#[tokio::test]
async fn delete_staff_then_not_found() {
  let svc = service().await;
  let member = svc.create_staff(Some(&admin()), staff_payload("a@cep.example")).await.unwrap();
  let id: Uuid = serde_json::from_value(member["staff_id"].clone()).unwrap();
  let gestor = Actor::with_role(Role::Gestor);

  svc.delete_staff(Some(&gestor), id).await.unwrap();
  let err = svc.delete_staff(Some(&gestor), id).await.unwrap_err();
  assert!(matches!(err, Error::NotFound(Resource::Staff, _)), "{err:?}");
}
