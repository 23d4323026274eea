//! Staff members: professors and administrative personnel.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};
use uuid::Uuid;

use crate::{Error, Result};

#[derive(
  Debug,
  Clone,
  Copy,
  Default,
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
pub enum StaffType {
  #[default]
  Profesor,
  Administrativo,
}

/// A stored staff member.
///
/// `created_by` is an audit field: populated from the creating actor and
/// never changed afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StaffMember {
  pub staff_id:   Uuid,
  pub staff_type: StaffType,
  pub first_name: String,
  pub last_name:  String,
  pub full_name:  String,
  pub email:      String,
  pub phone:      Option<String>,
  pub bio:        Option<String>,
  pub position:   String,
  pub is_active:  bool,
  pub notes:      Option<String>,
  pub created_by: Option<Uuid>,
  pub created_at: DateTime<Utc>,
  pub updated_at: DateTime<Utc>,
}

/// Client-facing input for a new staff member. Contains no audit fields.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StaffInput {
  #[serde(default)]
  pub staff_type: StaffType,
  pub first_name: String,
  pub last_name:  String,
  pub email:      String,
  #[serde(default)]
  pub phone:      Option<String>,
  #[serde(default)]
  pub bio:        Option<String>,
  pub position:   String,
  #[serde(default = "default_active")]
  pub is_active:  bool,
  #[serde(default)]
  pub notes:      Option<String>,
}

fn default_active() -> bool { true }

/// What the store persists: the client input plus the audit fields.
#[derive(Debug, Clone)]
pub struct NewStaff {
  pub input:      StaffInput,
  pub created_by: Option<Uuid>,
}

/// Partial update of a staff member. `created_by` is not patchable.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StaffPatch {
  pub staff_type: Option<StaffType>,
  pub first_name: Option<String>,
  pub last_name:  Option<String>,
  pub email:      Option<String>,
  pub phone:      Option<String>,
  pub bio:        Option<String>,
  pub position:   Option<String>,
  pub is_active:  Option<bool>,
  pub notes:      Option<String>,
}

/// Filter for [`crate::store::CatalogStore::list_staff`].
#[derive(Debug, Clone, Copy, Default)]
pub struct StaffQuery {
  pub staff_type: Option<StaffType>,
  pub is_active:  Option<bool>,
}

pub fn full_name(first: &str, last: &str) -> String {
  format!("{} {}", first.trim(), last.trim()).trim().to_owned()
}

fn validate_person_name(label: &str, value: &str) -> Result<()> {
  if value.trim().chars().count() < 2 {
    return Err(Error::Validation(format!(
      "{label} must be at least 2 characters"
    )));
  }
  Ok(())
}

fn validate_email(email: &str) -> Result<()> {
  let valid = email
    .split_once('@')
    .is_some_and(|(local, domain)| !local.is_empty() && domain.contains('.'));
  if !valid {
    return Err(Error::Validation(format!("invalid email address {email:?}")));
  }
  Ok(())
}

/// Spanish phone format: `+34 XXX XXX XXX`.
pub fn is_valid_phone(phone: &str) -> bool {
  let Some(rest) = phone.strip_prefix("+34 ") else { return false };
  let groups: Vec<&str> = rest.split(' ').collect();
  groups.len() == 3
    && groups
      .iter()
      .all(|g| g.len() == 3 && g.bytes().all(|b| b.is_ascii_digit()))
}

fn validate_phone(phone: Option<&str>) -> Result<()> {
  match phone {
    Some(p) if !is_valid_phone(p) => Err(Error::Validation(
      "phone must be in format: +34 XXX XXX XXX".into(),
    )),
    _ => Ok(()),
  }
}

fn validate_position(position: &str) -> Result<()> {
  if position.trim().chars().count() < 3 {
    return Err(Error::Validation("position must be at least 3 characters".into()));
  }
  Ok(())
}

impl StaffInput {
  pub fn validate(&self) -> Result<()> {
    validate_person_name("first name", &self.first_name)?;
    validate_person_name("last name", &self.last_name)?;
    validate_email(&self.email)?;
    validate_phone(self.phone.as_deref())?;
    validate_position(&self.position)
  }
}

impl StaffPatch {
  pub fn validate(&self) -> Result<()> {
    if let Some(v) = &self.first_name {
      validate_person_name("first name", v)?;
    }
    if let Some(v) = &self.last_name {
      validate_person_name("last name", v)?;
    }
    if let Some(v) = &self.email {
      validate_email(v)?;
    }
    validate_phone(self.phone.as_deref())?;
    if let Some(v) = &self.position {
      validate_position(v)?;
    }
    Ok(())
  }

  /// Apply the patch in place and re-derive `full_name`. The caller stamps
  /// `updated_at`.
  pub fn apply(self, member: &mut StaffMember) {
    if let Some(v) = self.staff_type {
      member.staff_type = v;
    }
    if let Some(v) = self.first_name {
      member.first_name = v;
    }
    if let Some(v) = self.last_name {
      member.last_name = v;
    }
    if let Some(v) = self.email {
      member.email = v;
    }
    if let Some(v) = self.phone {
      member.phone = Some(v);
    }
    if let Some(v) = self.bio {
      member.bio = Some(v);
    }
    if let Some(v) = self.position {
      member.position = v;
    }
    if let Some(v) = self.is_active {
      member.is_active = v;
    }
    if let Some(v) = self.notes {
      member.notes = Some(v);
    }
    member.full_name = full_name(&member.first_name, &member.last_name);
  }
}
