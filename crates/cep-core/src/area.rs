//! Areas: the educational categories that prefix every course code.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Error, Result};

/// An educational area such as "Marketing Digital" (`MKT`).
///
/// `code` is unique across areas and never changes after creation: renaming
/// it would split the sequence of every course code already issued under it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Area {
  pub area_id:     Uuid,
  pub code:        String,
  pub name:        String,
  pub description: Option<String>,
  pub color:       Option<String>,
  pub active:      bool,
  pub created_at:  DateTime<Utc>,
}

/// Input for creating an area. The store assigns id and timestamp.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewArea {
  pub code:        String,
  pub name:        String,
  #[serde(default)]
  pub description: Option<String>,
  #[serde(default)]
  pub color:       Option<String>,
  #[serde(default = "default_active")]
  pub active:      bool,
}

fn default_active() -> bool { true }

/// Partial update of an area. `code` is not patchable.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AreaPatch {
  pub name:        Option<String>,
  pub description: Option<String>,
  pub color:       Option<String>,
  pub active:      Option<bool>,
}

/// `true` for three or four ASCII uppercase letters.
pub fn is_valid_area_code(code: &str) -> bool {
  (3..=4).contains(&code.len()) && code.bytes().all(|b| b.is_ascii_uppercase())
}

fn validate_name(name: &str) -> Result<()> {
  let len = name.trim().chars().count();
  if !(3..=100).contains(&len) {
    return Err(Error::Validation(
      "area name must be between 3 and 100 characters".into(),
    ));
  }
  Ok(())
}

fn validate_description(description: Option<&str>) -> Result<()> {
  if description.is_some_and(|d| d.chars().count() > 500) {
    return Err(Error::Validation(
      "area description must be at most 500 characters".into(),
    ));
  }
  Ok(())
}

fn validate_color(color: Option<&str>) -> Result<()> {
  let Some(color) = color else { return Ok(()) };
  let hex = color.strip_prefix('#').unwrap_or("");
  if hex.len() != 6 || !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
    return Err(Error::Validation(format!(
      "area color must be a #RRGGBB hex value, got {color:?}"
    )));
  }
  Ok(())
}

impl NewArea {
  pub fn validate(&self) -> Result<()> {
    if !is_valid_area_code(&self.code) {
      return Err(Error::Validation(format!(
        "area code must be 3-4 uppercase letters, got {:?}",
        self.code
      )));
    }
    validate_name(&self.name)?;
    validate_description(self.description.as_deref())?;
    validate_color(self.color.as_deref())
  }
}

impl AreaPatch {
  pub fn validate(&self) -> Result<()> {
    if let Some(name) = &self.name {
      validate_name(name)?;
    }
    validate_description(self.description.as_deref())?;
    validate_color(self.color.as_deref())
  }

  /// Apply the patch in place. `code` and `created_at` are untouched.
  pub fn apply(self, area: &mut Area) {
    if let Some(name) = self.name {
      area.name = name;
    }
    if let Some(description) = self.description {
      area.description = Some(description);
    }
    if let Some(color) = self.color {
      area.color = Some(color);
    }
    if let Some(active) = self.active {
      area.active = active;
    }
  }
}
