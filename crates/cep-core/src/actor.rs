//! Authenticated actors and their roles.

use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};
use uuid::Uuid;

/// The closed set of roles a CMS user can hold.
///
/// Roles are not ranked. Every access rule names the roles it admits.
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
pub enum Role {
  Admin,
  Gestor,
  Marketing,
  Asesor,
  Lectura,
}

/// An authenticated user. Anonymous requests carry `Option<Actor>::None`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
  pub user_id: Uuid,
  pub role:    Role,
}

impl Actor {
  pub fn new(user_id: Uuid, role: Role) -> Self { Self { user_id, role } }

  /// Shorthand for tests and fixtures: a fresh id with the given role.
  pub fn with_role(role: Role) -> Self { Self::new(Uuid::new_v4(), role) }

  pub fn has_any_role(&self, roles: &[Role]) -> bool { roles.contains(&self.role) }
}
