//! Encoding and decoding helpers between Rust domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Timestamps are stored as fixed-width RFC 3339 strings (microseconds, `Z`)
//! so that text order equals time order. Closed enums are stored by their
//! lowercase tag. UUIDs are stored as hyphenated lowercase strings.

use std::str::FromStr;

use chrono::{DateTime, SecondsFormat, Utc};
use cep_core::{
  area::Area,
  course::{Course, CourseCategory, Modality},
  staff::{StaffMember, StaffType},
};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Uuid ─────────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

fn decode_opt_uuid(s: Option<String>) -> Result<Option<Uuid>> {
  s.as_deref().map(decode_uuid).transpose()
}

// ─── DateTime<Utc> ────────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String {
  dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::Decode(format!("bad timestamp {s:?}: {e}")))
}

/// Current time truncated to the stored precision, so a freshly built record
/// compares equal to the same record read back.
pub fn now() -> DateTime<Utc> {
  let now = Utc::now();
  decode_dt(&encode_dt(now)).unwrap_or(now)
}

// ─── Enums ───────────────────────────────────────────────────────────────────

fn decode_tag<T: FromStr>(kind: &str, s: &str) -> Result<T> {
  T::from_str(s).map_err(|_| Error::Decode(format!("unknown {kind}: {s:?}")))
}

// ─── Row types ───────────────────────────────────────────────────────────────

pub const AREA_COLUMNS: &str =
  "area_id, code, name, description, color, active, created_at";

/// Raw values read directly from an `areas` row.
pub struct RawArea {
  pub area_id:     String,
  pub code:        String,
  pub name:        String,
  pub description: Option<String>,
  pub color:       Option<String>,
  pub active:      bool,
  pub created_at:  String,
}

impl RawArea {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      area_id:     row.get(0)?,
      code:        row.get(1)?,
      name:        row.get(2)?,
      description: row.get(3)?,
      color:       row.get(4)?,
      active:      row.get(5)?,
      created_at:  row.get(6)?,
    })
  }

  pub fn into_area(self) -> Result<Area> {
    Ok(Area {
      area_id:     decode_uuid(&self.area_id)?,
      code:        self.code,
      name:        self.name,
      description: self.description,
      color:       self.color,
      active:      self.active,
      created_at:  decode_dt(&self.created_at)?,
    })
  }
}

pub const COURSE_COLUMNS: &str = "course_id, code, name, area_id, category, \
   short_description, duration_hours, base_price, subsidy_percentage, \
   modality, active, featured, created_by, created_at, slug";

/// Raw values read directly from a `courses` row.
pub struct RawCourse {
  pub course_id:          String,
  pub code:               String,
  pub name:               String,
  pub area_id:            String,
  pub category:           String,
  pub short_description:  String,
  pub duration_hours:     Option<u32>,
  pub base_price:         Option<f64>,
  pub subsidy_percentage: u8,
  pub modality:           String,
  pub active:             bool,
  pub featured:           bool,
  pub created_by:         Option<String>,
  pub created_at:         String,
  pub slug:               String,
}

impl RawCourse {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      course_id:          row.get(0)?,
      code:               row.get(1)?,
      name:               row.get(2)?,
      area_id:            row.get(3)?,
      category:           row.get(4)?,
      short_description:  row.get(5)?,
      duration_hours:     row.get(6)?,
      base_price:         row.get(7)?,
      subsidy_percentage: row.get(8)?,
      modality:           row.get(9)?,
      active:             row.get(10)?,
      featured:           row.get(11)?,
      created_by:         row.get(12)?,
      created_at:         row.get(13)?,
      slug:               row.get(14)?,
    })
  }

  pub fn into_course(self) -> Result<Course> {
    Ok(Course {
      course_id:          decode_uuid(&self.course_id)?,
      code:               self.code,
      slug:               self.slug,
      name:               self.name,
      area_id:            decode_uuid(&self.area_id)?,
      category:           decode_tag::<CourseCategory>("course category", &self.category)?,
      short_description:  self.short_description,
      duration_hours:     self.duration_hours,
      base_price:         self.base_price,
      subsidy_percentage: self.subsidy_percentage,
      modality:           decode_tag::<Modality>("modality", &self.modality)?,
      active:             self.active,
      featured:           self.featured,
      created_by:         decode_opt_uuid(self.created_by)?,
      created_at:         decode_dt(&self.created_at)?,
    })
  }
}

pub const STAFF_COLUMNS: &str = "staff_id, staff_type, first_name, last_name, \
   full_name, email, phone, bio, position, is_active, notes, created_by, \
   created_at, updated_at";

/// Raw values read directly from a `staff` row.
pub struct RawStaff {
  pub staff_id:   String,
  pub staff_type: String,
  pub first_name: String,
  pub last_name:  String,
  pub full_name:  String,
  pub email:      String,
  pub phone:      Option<String>,
  pub bio:        Option<String>,
  pub position:   String,
  pub is_active:  bool,
  pub notes:      Option<String>,
  pub created_by: Option<String>,
  pub created_at: String,
  pub updated_at: String,
}

impl RawStaff {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      staff_id:   row.get(0)?,
      staff_type: row.get(1)?,
      first_name: row.get(2)?,
      last_name:  row.get(3)?,
      full_name:  row.get(4)?,
      email:      row.get(5)?,
      phone:      row.get(6)?,
      bio:        row.get(7)?,
      position:   row.get(8)?,
      is_active:  row.get(9)?,
      notes:      row.get(10)?,
      created_by: row.get(11)?,
      created_at: row.get(12)?,
      updated_at: row.get(13)?,
    })
  }

  pub fn into_staff(self) -> Result<StaffMember> {
    Ok(StaffMember {
      staff_id:   decode_uuid(&self.staff_id)?,
      staff_type: decode_tag::<StaffType>("staff type", &self.staff_type)?,
      first_name: self.first_name,
      last_name:  self.last_name,
      full_name:  self.full_name,
      email:      self.email,
      phone:      self.phone,
      bio:        self.bio,
      position:   self.position,
      is_active:  self.is_active,
      notes:      self.notes,
      created_by: decode_opt_uuid(self.created_by)?,
      created_at: decode_dt(&self.created_at)?,
      updated_at: decode_dt(&self.updated_at)?,
    })
  }
}
