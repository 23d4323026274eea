//! The `CatalogStore` trait, the record store the catalog depends on.
//!
//! The trait is implemented by storage backends (e.g. `cep-store-sqlite`).
//! Higher layers (`cep-catalog`, `cep-api`) depend on this abstraction, not
//! on any concrete backend.

use std::future::Future;

use uuid::Uuid;

use crate::{
  area::{Area, AreaPatch, NewArea},
  course::{Course, CoursePatch, NewCourse},
  staff::{NewStaff, StaffMember, StaffPatch, StaffQuery},
};

/// Abstraction over a catalog store backend.
///
/// Backends must keep course codes unique: creating a course whose code is
/// already stored fails with an error that converts into
/// [`Error::DuplicateCode`](crate::Error::DuplicateCode). The catalog relies
/// on that to detect concurrent sequencing across processes.
///
/// Callers await writes (`add_*`, `create_*`, `update_*`, `delete_*`) to
/// completion, so a backend that bounds write latency must do so itself and
/// report an expired deadline only for a write it did not apply, as
/// [`Error::StorageTimeout`](crate::Error::StorageTimeout).
///
/// All methods return `Send` futures so the trait can be used in
/// multi-threaded async runtimes (e.g. tokio with `axum`).
pub trait CatalogStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  // ── Areas ─────────────────────────────────────────────────────────────

  /// Persist a new area. Fails if the code is already taken.
  fn add_area(
    &self,
    input: NewArea,
  ) -> impl Future<Output = Result<Area, Self::Error>> + Send + '_;

  fn get_area(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Area>, Self::Error>> + Send + '_;

  /// All areas, ordered by name.
  fn list_areas(&self) -> impl Future<Output = Result<Vec<Area>, Self::Error>> + Send + '_;

  /// Apply `patch` to an area. Returns `None` if it does not exist.
  fn update_area(
    &self,
    id: Uuid,
    patch: AreaPatch,
  ) -> impl Future<Output = Result<Option<Area>, Self::Error>> + Send + '_;

  // ── Courses ───────────────────────────────────────────────────────────

  /// The greatest stored course code starting with `prefix` (case-sensitive),
  /// or `None` if there is none.
  fn last_course_code<'a>(
    &'a self,
    prefix: &'a str,
  ) -> impl Future<Output = Result<Option<String>, Self::Error>> + Send + 'a;

  /// Persist a new course. The store assigns id and `created_at`, and
  /// creates it active and not featured.
  fn create_course(
    &self,
    input: NewCourse,
  ) -> impl Future<Output = Result<Course, Self::Error>> + Send + '_;

  fn get_course(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Course>, Self::Error>> + Send + '_;

  /// All courses, newest first.
  fn list_courses(&self) -> impl Future<Output = Result<Vec<Course>, Self::Error>> + Send + '_;

  fn update_course(
    &self,
    id: Uuid,
    patch: CoursePatch,
  ) -> impl Future<Output = Result<Option<Course>, Self::Error>> + Send + '_;

  // ── Staff ─────────────────────────────────────────────────────────────

  /// Persist a new staff member. `full_name` is derived by the store.
  fn add_staff(
    &self,
    input: NewStaff,
  ) -> impl Future<Output = Result<StaffMember, Self::Error>> + Send + '_;

  fn get_staff(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<StaffMember>, Self::Error>> + Send + '_;

  /// Staff members matching `query`, ordered by full name.
  fn list_staff(
    &self,
    query: StaffQuery,
  ) -> impl Future<Output = Result<Vec<StaffMember>, Self::Error>> + Send + '_;

  /// Apply `patch` and stamp `updated_at`. `created_by` is never touched.
  fn update_staff(
    &self,
    id: Uuid,
    patch: StaffPatch,
  ) -> impl Future<Output = Result<Option<StaffMember>, Self::Error>> + Send + '_;

  /// Delete a staff member. Returns `false` if it did not exist.
  fn delete_staff(&self, id: Uuid) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;
}
