//! [`SqliteStore`]: the SQLite implementation of [`CatalogStore`].

use std::{
  collections::HashSet,
  path::Path,
  time::{Duration, Instant},
};

use rusqlite::OptionalExtension as _;
use uuid::Uuid;

use cep_core::{
  area::{Area, AreaPatch, NewArea},
  course::{Course, CoursePatch, NewCourse, unique_slug},
  staff::{NewStaff, StaffMember, StaffPatch, StaffQuery, full_name},
  store::CatalogStore,
};

use crate::{
  Error, Result,
  encode::{
    AREA_COLUMNS, COURSE_COLUMNS, RawArea, RawCourse, RawStaff, STAFF_COLUMNS,
    encode_dt, encode_uuid, now,
  },
  error::{is_unique_violation, unique_violation},
  schema::SCHEMA,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A CEP catalog store backed by a single SQLite file.
///
/// Cloning is cheap; the inner connection is reference-counted.
///
/// Every statement runs as one job on the connection thread. With a write
/// timeout set, a write job that starts after its deadline returns
/// [`Error::WriteTimeout`] without touching the database, and SQLite's busy
/// handler gives up on a locked file after the same duration.
#[derive(Clone)]
pub struct SqliteStore {
  pub(crate) conn: tokio_rusqlite::Connection,
  write_timeout:   Option<Duration>,
}

/// `true` once `deadline` has passed. Checked on the connection thread
/// before a write runs.
fn expired(deadline: Option<Instant>) -> bool {
  deadline.is_some_and(|d| Instant::now() >= d)
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn, write_timeout: None };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store, used by tests.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn, write_timeout: None };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// Bound every write to `timeout`, measured from the moment the write is
  /// issued.
  pub async fn with_write_timeout(mut self, timeout: Duration) -> Result<Self> {
    self
      .conn
      .call(move |conn| {
        conn.busy_timeout(timeout)?;
        Ok(())
      })
      .await?;
    self.write_timeout = Some(timeout);
    Ok(self)
  }

  fn deadline(&self) -> Option<Instant> { self.write_timeout.map(|t| Instant::now() + t) }

  /// Insert a course row as given, except that a taken slug gets a numeric
  /// suffix. Returns the stored slug. Exposed to tests so they can seed
  /// historical codes the sequencer never produced.
  pub async fn insert_course(&self, course: &Course) -> Result<String> {
    let deadline = self.deadline();
    let code = course.code.clone();
    let base_slug = course.slug.clone();
    let params = (
      encode_uuid(course.course_id),
      course.code.clone(),
      course.name.clone(),
      encode_uuid(course.area_id),
      course.category.to_string(),
      course.short_description.clone(),
      course.duration_hours,
      course.base_price,
      course.subsidy_percentage,
      course.modality.to_string(),
      course.active,
      course.featured,
      course.created_by.map(encode_uuid),
      encode_dt(course.created_at),
      String::new(),
    );

    let slug = self
      .conn
      .call(move |conn| {
        if expired(deadline) {
          return Ok(None);
        }
        let taken = conn
          .prepare(
            "SELECT slug FROM courses
             WHERE slug = ?1 OR substr(slug, 1, length(?1) + 1) = ?1 || '-'",
          )?
          .query_map(rusqlite::params![base_slug], |row| row.get::<_, String>(0))?
          .collect::<rusqlite::Result<HashSet<_>>>()?;
        let slug = unique_slug(&base_slug, |s| taken.contains(s));

        let mut params = params;
        params.14 = slug.clone();
        conn.execute(
          &format!(
            "INSERT INTO courses ({COURSE_COLUMNS})
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)"
          ),
          params,
        )?;
        Ok(Some(slug))
      })
      .await
      .map_err(|e| {
        let column = unique_violation(&e).map(str::to_owned);
        match column.as_deref() {
          Some("courses.slug") => Error::SlugTaken(course.slug.clone()),
          Some(_) => Error::DuplicateCode(code),
          None => Error::Database(e),
        }
      })?;

    slug.ok_or(Error::WriteTimeout)
  }

  async fn write_staff(
    &self,
    member: &StaffMember,
    insert: bool,
    deadline: Option<Instant>,
  ) -> Result<()> {
    let email = member.email.clone();
    let id = encode_uuid(member.staff_id);
    let staff_type = member.staff_type.to_string();
    let first = member.first_name.clone();
    let last = member.last_name.clone();
    let full = member.full_name.clone();
    let phone = member.phone.clone();
    let bio = member.bio.clone();
    let position = member.position.clone();
    let is_active = member.is_active;
    let notes = member.notes.clone();
    let created_by = member.created_by.map(encode_uuid);
    let created_at = encode_dt(member.created_at);
    let updated_at = encode_dt(member.updated_at);

    let applied = self
      .conn
      .call(move |conn| {
        if expired(deadline) {
          return Ok(false);
        }
        if insert {
          conn.execute(
            &format!(
              "INSERT INTO staff ({STAFF_COLUMNS})
               VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)"
            ),
            rusqlite::params![
              id, staff_type, first, last, full, email_param(&email), phone, bio,
              position, is_active, notes, created_by, created_at, updated_at,
            ],
          )?;
        } else {
          // created_by and created_at are never part of an UPDATE.
          conn.execute(
            "UPDATE staff SET
               staff_type = ?2, first_name = ?3, last_name = ?4, full_name = ?5,
               email = ?6, phone = ?7, bio = ?8, position = ?9, is_active = ?10,
               notes = ?11, updated_at = ?12
             WHERE staff_id = ?1",
            rusqlite::params![
              id, staff_type, first, last, full, email_param(&email), phone, bio,
              position, is_active, notes, updated_at,
            ],
          )?;
        }
        Ok(true)
      })
      .await
      .map_err(|e| {
        if is_unique_violation(&e) {
          Error::EmailTaken(member.email.clone())
        } else {
          Error::Database(e)
        }
      })?;

    if applied { Ok(()) } else { Err(Error::WriteTimeout) }
  }
}

fn email_param(email: &str) -> String { email.trim().to_lowercase() }

// ─── CatalogStore impl ───────────────────────────────────────────────────────

impl CatalogStore for SqliteStore {
  type Error = Error;

  // ── Areas ─────────────────────────────────────────────────────────────────

  async fn add_area(&self, input: NewArea) -> Result<Area> {
    let deadline = self.deadline();
    let area = Area {
      area_id:     Uuid::new_v4(),
      code:        input.code,
      name:        input.name,
      description: input.description,
      color:       input.color,
      active:      input.active,
      created_at:  now(),
    };

    let code = area.code.clone();
    let params = (
      encode_uuid(area.area_id),
      area.code.clone(),
      area.name.clone(),
      area.description.clone(),
      area.color.clone(),
      area.active,
      encode_dt(area.created_at),
    );

    let applied = self
      .conn
      .call(move |conn| {
        if expired(deadline) {
          return Ok(false);
        }
        conn.execute(
          &format!("INSERT INTO areas ({AREA_COLUMNS}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)"),
          params,
        )?;
        Ok(true)
      })
      .await
      .map_err(|e| {
        if is_unique_violation(&e) {
          Error::AreaCodeTaken(code)
        } else {
          Error::Database(e)
        }
      })?;

    if !applied {
      return Err(Error::WriteTimeout);
    }
    Ok(area)
  }

  async fn get_area(&self, id: Uuid) -> Result<Option<Area>> {
    let id_str = encode_uuid(id);

    let raw: Option<RawArea> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!("SELECT {AREA_COLUMNS} FROM areas WHERE area_id = ?1"),
              rusqlite::params![id_str],
              RawArea::from_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawArea::into_area).transpose()
  }

  async fn list_areas(&self) -> Result<Vec<Area>> {
    let raws: Vec<RawArea> = self
      .conn
      .call(|conn| {
        let mut stmt =
          conn.prepare(&format!("SELECT {AREA_COLUMNS} FROM areas ORDER BY name"))?;
        let rows = stmt
          .query_map([], RawArea::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawArea::into_area).collect()
  }

  async fn update_area(&self, id: Uuid, patch: AreaPatch) -> Result<Option<Area>> {
    let deadline = self.deadline();
    let Some(mut area) = self.get_area(id).await? else {
      return Ok(None);
    };
    patch.apply(&mut area);

    let id_str = encode_uuid(id);
    let name = area.name.clone();
    let description = area.description.clone();
    let color = area.color.clone();
    let active = area.active;

    // The code column is not written: area codes are fixed at creation.
    let applied = self
      .conn
      .call(move |conn| {
        if expired(deadline) {
          return Ok(false);
        }
        conn.execute(
          "UPDATE areas SET name = ?2, description = ?3, color = ?4, active = ?5
           WHERE area_id = ?1",
          rusqlite::params![id_str, name, description, color, active],
        )?;
        Ok(true)
      })
      .await?;

    if !applied {
      return Err(Error::WriteTimeout);
    }
    Ok(Some(area))
  }

  // ── Courses ───────────────────────────────────────────────────────────────

  async fn last_course_code(&self, prefix: &str) -> Result<Option<String>> {
    let prefix = prefix.to_owned();

    // substr() keeps the match case-sensitive and free of LIKE wildcards.
    let code = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT code FROM courses
               WHERE substr(code, 1, length(?1)) = ?1
               ORDER BY code DESC
               LIMIT 1",
              rusqlite::params![prefix],
              |row| row.get::<_, String>(0),
            )
            .optional()?,
        )
      })
      .await?;

    Ok(code)
  }

  async fn create_course(&self, input: NewCourse) -> Result<Course> {
    let mut course = Course {
      course_id:          Uuid::new_v4(),
      code:               input.code,
      slug:               input.slug,
      name:               input.name,
      area_id:            input.area_id,
      category:           input.category,
      short_description:  input.short_description,
      duration_hours:     input.duration_hours,
      base_price:         input.base_price,
      subsidy_percentage: input.subsidy_percentage,
      modality:           input.modality,
      active:             true,
      featured:           false,
      created_by:         input.created_by,
      created_at:         now(),
    };

    course.slug = self.insert_course(&course).await?;
    Ok(course)
  }

  async fn get_course(&self, id: Uuid) -> Result<Option<Course>> {
    let id_str = encode_uuid(id);

    let raw: Option<RawCourse> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!("SELECT {COURSE_COLUMNS} FROM courses WHERE course_id = ?1"),
              rusqlite::params![id_str],
              RawCourse::from_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawCourse::into_course).transpose()
  }

  async fn list_courses(&self) -> Result<Vec<Course>> {
    let raws: Vec<RawCourse> = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {COURSE_COLUMNS} FROM courses ORDER BY created_at DESC, rowid DESC"
        ))?;
        let rows = stmt
          .query_map([], RawCourse::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawCourse::into_course).collect()
  }

  async fn update_course(&self, id: Uuid, patch: CoursePatch) -> Result<Option<Course>> {
    let deadline = self.deadline();
    let Some(mut course) = self.get_course(id).await? else {
      return Ok(None);
    };
    patch.apply(&mut course);

    let id_str = encode_uuid(id);
    let params = (
      id_str,
      course.name.clone(),
      course.short_description.clone(),
      course.duration_hours,
      course.base_price,
      course.subsidy_percentage,
      course.modality.to_string(),
      course.active,
      course.featured,
    );

    // code, area, category and created_by are fixed at creation.
    let applied = self
      .conn
      .call(move |conn| {
        if expired(deadline) {
          return Ok(false);
        }
        conn.execute(
          "UPDATE courses SET
             name = ?2, short_description = ?3, duration_hours = ?4,
             base_price = ?5, subsidy_percentage = ?6, modality = ?7,
             active = ?8, featured = ?9
           WHERE course_id = ?1",
          params,
        )?;
        Ok(true)
      })
      .await?;

    if !applied {
      return Err(Error::WriteTimeout);
    }
    Ok(Some(course))
  }

  // ── Staff ─────────────────────────────────────────────────────────────────

  async fn add_staff(&self, input: NewStaff) -> Result<StaffMember> {
    let deadline = self.deadline();
    let NewStaff { input, created_by } = input;
    let at = now();
    let member = StaffMember {
      staff_id: Uuid::new_v4(),
      staff_type: input.staff_type,
      full_name: full_name(&input.first_name, &input.last_name),
      first_name: input.first_name,
      last_name: input.last_name,
      email: email_param(&input.email),
      phone: input.phone,
      bio: input.bio,
      position: input.position,
      is_active: input.is_active,
      notes: input.notes,
      created_by,
      created_at: at,
      updated_at: at,
    };

    self.write_staff(&member, true, deadline).await?;
    Ok(member)
  }

  async fn get_staff(&self, id: Uuid) -> Result<Option<StaffMember>> {
    let id_str = encode_uuid(id);

    let raw: Option<RawStaff> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!("SELECT {STAFF_COLUMNS} FROM staff WHERE staff_id = ?1"),
              rusqlite::params![id_str],
              RawStaff::from_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawStaff::into_staff).transpose()
  }

  async fn list_staff(&self, query: StaffQuery) -> Result<Vec<StaffMember>> {
    let staff_type = query.staff_type.map(|t| t.to_string());
    let is_active = query.is_active;

    let raws: Vec<RawStaff> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {STAFF_COLUMNS} FROM staff
           WHERE (?1 IS NULL OR staff_type = ?1)
             AND (?2 IS NULL OR is_active = ?2)
           ORDER BY full_name"
        ))?;
        let rows = stmt
          .query_map(rusqlite::params![staff_type, is_active], RawStaff::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawStaff::into_staff).collect()
  }

  async fn update_staff(&self, id: Uuid, patch: StaffPatch) -> Result<Option<StaffMember>> {
    let deadline = self.deadline();
    let Some(mut member) = self.get_staff(id).await? else {
      return Ok(None);
    };
    patch.apply(&mut member);
    member.email = email_param(&member.email);
    member.updated_at = now();

    self.write_staff(&member, false, deadline).await?;
    Ok(Some(member))
  }

  async fn delete_staff(&self, id: Uuid) -> Result<bool> {
    let deadline = self.deadline();
    let id_str = encode_uuid(id);

    let deleted = self
      .conn
      .call(move |conn| {
        if expired(deadline) {
          return Ok(None);
        }
        Ok(Some(conn.execute(
          "DELETE FROM staff WHERE staff_id = ?1",
          rusqlite::params![id_str],
        )?))
      })
      .await?
      .ok_or(Error::WriteTimeout)?;

    Ok(deleted > 0)
  }
}
