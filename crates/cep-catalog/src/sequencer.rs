//! Course-code sequencing against a store.
//!
//! The sequence is derived by scanning stored codes, not kept in a counter:
//! the next code for a prefix is the greatest stored code plus one. Nothing
//! here persists the result. Callers that insert the code must serialise the
//! read-then-insert span (see [`crate::KeyedLocks`]) and rely on the store's
//! uniqueness guarantee for writers in other processes.

use cep_core::{
  Error, Result,
  area::Area,
  course::{CourseCategory, CourseCode},
  store::CatalogStore,
};
use uuid::Uuid;

/// The next free code for `(area, category)`.
pub async fn next_code<S>(store: &S, area: &Area, category: CourseCategory) -> Result<CourseCode>
where
  S: CatalogStore,
  S::Error: Into<Error>,
{
  let prefix = CourseCode::prefix(&area.code, category);
  let latest = store.last_course_code(&prefix).await.map_err(Into::into)?;
  CourseCode::successor(&area.code, category, latest.as_deref())
}

/// Like [`next_code`], resolving the area by id first.
pub async fn next_code_for<S>(
  store: &S,
  area_id: Uuid,
  category: CourseCategory,
) -> Result<(Area, CourseCode)>
where
  S: CatalogStore,
  S::Error: Into<Error>,
{
  let area = store
    .get_area(area_id)
    .await
    .map_err(Into::into)?
    .ok_or(Error::AreaNotFound(area_id))?;
  let code = next_code(store, &area, category).await?;
  Ok((area, code))
}
