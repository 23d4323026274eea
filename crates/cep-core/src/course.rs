//! Courses, course categories and the course-code value object.
//!
//! A course code has the shape `{AREA}-{CATEGORY}-{NNNN}`, e.g.
//! `MKT-PRIV-0001`. The four-digit suffix is a sequence scoped to the
//! `(area, category)` pair. Because the suffix is fixed-width and
//! zero-padded, lexicographic order over codes with the same prefix equals
//! numeric order over their sequences; the store relies on that to find the
//! latest code with a plain descending sort.
//!
//! Every course also carries a URL slug derived from its name at creation;
//! see [`slugify`].

use std::{fmt, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};
use uuid::Uuid;

use crate::{Error, Result};

/// Highest sequence a four-digit suffix can hold.
pub const MAX_SEQUENCE: u16 = 9999;

const SEQUENCE_WIDTH: usize = 4;

// ─── Category ────────────────────────────────────────────────────────────────

/// The funding/audience category of a course. A closed set; never persisted
/// as its own record.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Hash,
  Serialize,
  Deserialize,
  Display,
  EnumString,
  AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum CourseCategory {
  Privados,
  Ocupados,
  Desempleados,
  Teleformacion,
}

impl CourseCategory {
  /// Parse a category tag, failing with [`Error::InvalidCategory`] for
  /// anything outside the closed set. There is no fallback category.
  pub fn parse(tag: &str) -> Result<Self> {
    Self::from_str(tag).map_err(|_| Error::InvalidCategory(tag.to_owned()))
  }

  /// The fixed four-letter code used inside course codes.
  pub fn code(self) -> &'static str {
    match self {
      Self::Privados => "PRIV",
      Self::Ocupados => "OCUP",
      Self::Desempleados => "DESE",
      Self::Teleformacion => "TELE",
    }
  }

  /// The course type stored on the course record and shown in listings.
  pub fn course_type(self) -> &'static str {
    match self {
      Self::Privados => "privado",
      Self::Ocupados => "ocupados",
      Self::Desempleados => "desempleados",
      Self::Teleformacion => "teleformacion",
    }
  }
}

// ─── Course code ─────────────────────────────────────────────────────────────

/// A course code value object. Not a stored entity: the store keeps the
/// rendered string on the course record.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CourseCode {
  area_code: String,
  category:  CourseCategory,
  sequence:  u16,
}

impl CourseCode {
  /// The prefix shared by every code of an `(area, category)` pair,
  /// including the trailing dash.
  pub fn prefix(area_code: &str, category: CourseCategory) -> String {
    format!("{area_code}-{}-", category.code())
  }

  /// The code that follows `latest`, the greatest code already stored under
  /// this pair's prefix (or `None` if there is none yet).
  ///
  /// Gaps are tolerated: the result is `max + 1`, not `count + 1`. A stored
  /// code whose suffix is not exactly four ASCII digits is reported as
  /// [`Error::CorruptExistingCode`] rather than restarting at 1, which could
  /// reissue a code that already exists.
  pub fn successor(
    area_code: &str,
    category: CourseCategory,
    latest: Option<&str>,
  ) -> Result<Self> {
    let prefix = Self::prefix(area_code, category);

    let sequence = match latest {
      None => 1,
      Some(code) => {
        let current = code
          .strip_prefix(prefix.as_str())
          .and_then(parse_sequence)
          .ok_or_else(|| Error::CorruptExistingCode(code.to_owned()))?;
        if current >= MAX_SEQUENCE {
          return Err(Error::SequenceExhausted(prefix));
        }
        current + 1
      }
    };

    Ok(Self { area_code: area_code.to_owned(), category, sequence })
  }

  pub fn area_code(&self) -> &str { &self.area_code }

  pub fn category(&self) -> CourseCategory { self.category }

  pub fn sequence(&self) -> u16 { self.sequence }

  /// The zero-padded sequence, e.g. `"0042"`.
  pub fn sequence_str(&self) -> String {
    format!("{:0width$}", self.sequence, width = SEQUENCE_WIDTH)
  }
}

fn parse_sequence(suffix: &str) -> Option<u16> {
  if suffix.len() != SEQUENCE_WIDTH || !suffix.bytes().all(|b| b.is_ascii_digit()) {
    return None;
  }
  suffix.parse().ok()
}

impl fmt::Display for CourseCode {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(
      f,
      "{}{}",
      Self::prefix(&self.area_code, self.category),
      self.sequence_str()
    )
  }
}

// ─── Course record ───────────────────────────────────────────────────────────

/// How a course is delivered.
#[derive(
  Debug,
  Clone,
  Copy,
  Default,
  PartialEq,
  Eq,
  Serialize,
  Deserialize,
  Display,
  EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Modality {
  #[default]
  Presencial,
  Online,
  Semipresencial,
}

/// A stored course.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Course {
  pub course_id:          Uuid,
  pub code:               String,
  pub slug:               String,
  pub name:               String,
  pub area_id:            Uuid,
  pub category:           CourseCategory,
  pub short_description:  String,
  pub duration_hours:     Option<u32>,
  pub base_price:         Option<f64>,
  pub subsidy_percentage: u8,
  pub modality:           Modality,
  pub active:             bool,
  pub featured:           bool,
  pub created_by:         Option<Uuid>,
  pub created_at:         DateTime<Utc>,
}

/// Input for persisting a course. `code` must already be sequenced.
///
/// The store assigns id and timestamp and creates the course as active and
/// not featured. `slug` is the base slug; the store appends `-1`, `-2`, ...
/// when it is already taken.
#[derive(Debug, Clone)]
pub struct NewCourse {
  pub code:               String,
  pub slug:               String,
  pub name:               String,
  pub area_id:            Uuid,
  pub category:           CourseCategory,
  pub short_description:  String,
  pub duration_hours:     Option<u32>,
  pub base_price:         Option<f64>,
  pub subsidy_percentage: u8,
  pub modality:           Modality,
  pub created_by:         Option<Uuid>,
}

/// Partial update of a course. `code`, `slug` and `created_by` are not
/// patchable.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CoursePatch {
  pub name:               Option<String>,
  pub short_description:  Option<String>,
  pub duration_hours:     Option<u32>,
  pub base_price:         Option<f64>,
  pub subsidy_percentage: Option<u8>,
  pub modality:           Option<Modality>,
  pub active:             Option<bool>,
  pub featured:           Option<bool>,
}

// ─── Slugs ───────────────────────────────────────────────────────────────────

/// Slug used when a name has no letters or digits to build one from.
pub const FALLBACK_SLUG: &str = "curso";

fn fold_accent(c: char) -> char {
  match c {
    'á' | 'à' | 'â' | 'ä' | 'ã' => 'a',
    'é' | 'è' | 'ê' | 'ë' => 'e',
    'í' | 'ì' | 'î' | 'ï' => 'i',
    'ó' | 'ò' | 'ô' | 'ö' | 'õ' => 'o',
    'ú' | 'ù' | 'û' | 'ü' => 'u',
    'ñ' => 'n',
    'ç' => 'c',
    other => other,
  }
}

/// The URL slug for a course name: lowercase ASCII letters and digits
/// separated by single hyphens, with Spanish accents folded.
///
/// `"Técnico en Aplicaciones Informáticas"` becomes
/// `"tecnico-en-aplicaciones-informaticas"`.
pub fn slugify(name: &str) -> String {
  let mut slug = String::with_capacity(name.len());
  let mut pending_hyphen = false;
  for c in name.chars().flat_map(char::to_lowercase).map(fold_accent) {
    if c.is_ascii_alphanumeric() {
      if pending_hyphen && !slug.is_empty() {
        slug.push('-');
      }
      pending_hyphen = false;
      slug.push(c);
    } else {
      pending_hyphen = true;
    }
  }
  if slug.is_empty() {
    FALLBACK_SLUG.to_owned()
  } else {
    slug
  }
}

/// `base` if it is free, else the first of `base-1`, `base-2`, ... that is.
pub fn unique_slug(base: &str, is_taken: impl Fn(&str) -> bool) -> String {
  if !is_taken(base) {
    return base.to_owned();
  }
  (1u32..)
    .map(|n| format!("{base}-{n}"))
    .find(|candidate| !is_taken(candidate))
    .unwrap_or_else(|| base.to_owned())
}

pub fn validate_subsidy(percentage: u8) -> Result<()> {
  if percentage > 100 {
    return Err(Error::Validation(format!(
      "subsidy percentage must be between 0 and 100, got {percentage}"
    )));
  }
  Ok(())
}

impl CoursePatch {
  pub fn validate(&self) -> Result<()> {
    if self.name.as_deref().is_some_and(|n| n.trim().is_empty()) {
      return Err(Error::Validation("course name must not be blank".into()));
    }
    if let Some(p) = self.subsidy_percentage {
      validate_subsidy(p)?;
    }
    Ok(())
  }

  pub fn apply(self, course: &mut Course) {
    if let Some(v) = self.name {
      course.name = v;
    }
    if let Some(v) = self.short_description {
      course.short_description = v;
    }
    if let Some(v) = self.duration_hours {
      course.duration_hours = Some(v);
    }
    if let Some(v) = self.base_price {
      course.base_price = Some(v);
    }
    if let Some(v) = self.subsidy_percentage {
      course.subsidy_percentage = v;
    }
    if let Some(v) = self.modality {
      course.modality = v;
    }
    if let Some(v) = self.active {
      course.active = v;
    }
    if let Some(v) = self.featured {
      course.featured = v;
    }
  }
}
