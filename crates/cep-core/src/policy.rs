//! The access policy engine.
//!
//! Permissions live in one table keyed by `(Resource, Operation)`. Each entry
//! is a rule closure that turns the (possibly anonymous) actor into an
//! [`AccessDecision`]. Field rules sit beside the table and can only narrow
//! what the collection-level rule allows.
//!
//! Decisions never fail: an operation with no rule is denied.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use strum::{AsRefStr, Display, EnumString};

use crate::actor::{Actor, Role};

// ─── Keys ────────────────────────────────────────────────────────────────────

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
pub enum Operation {
  Create,
  Read,
  Update,
  Delete,
}

/// A protected collection.
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
pub enum Resource {
  Areas,
  Courses,
  Staff,
  Leads,
}

// ─── Decisions ───────────────────────────────────────────────────────────────

/// A conjunction of `field == value` conditions over the JSON form of a
/// document.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Scope {
  conditions: Vec<(String, Value)>,
}

impl Scope {
  pub fn new() -> Self { Self::default() }

  pub fn equals(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
    self.conditions.push((field.into(), value.into()));
    self
  }

  pub fn conditions(&self) -> &[(String, Value)] { &self.conditions }

  /// `true` if `document` is an object satisfying every condition. A missing
  /// field never matches.
  pub fn matches(&self, document: &Value) -> bool {
    self
      .conditions
      .iter()
      .all(|(field, expected)| document.get(field) == Some(expected))
  }
}

#[derive(Debug, Clone, PartialEq)]
pub enum AccessDecision {
  Deny,
  AllowAll,
  /// The operation is allowed only on documents matching the scope.
  AllowScoped(Scope),
}

impl AccessDecision {
  pub fn is_allowed(&self) -> bool { !matches!(self, Self::Deny) }

  /// Whether this decision admits `document`.
  pub fn permits(&self, document: &Value) -> bool {
    match self {
      Self::Deny => false,
      Self::AllowAll => true,
      Self::AllowScoped(scope) => scope.matches(document),
    }
  }
}

// ─── Rules ───────────────────────────────────────────────────────────────────

type Rule = Box<dyn Fn(Option<&Actor>) -> AccessDecision + Send + Sync>;

/// Predicate used by field rules.
pub type FieldPredicate = Box<dyn Fn(Option<&Actor>) -> bool + Send + Sync>;

/// Who may write a field, on top of the collection-level rule.
pub enum WritePolicy {
  /// Anyone allowed to perform the operation.
  Open,
  /// Only actors satisfying the predicate.
  Guarded(FieldPredicate),
  /// Settable on create, immutable afterwards.
  WriteOnce,
  /// Never taken from client input; the system populates it.
  SystemManaged,
}

struct FieldRule {
  read:  Option<FieldPredicate>,
  write: WritePolicy,
}

impl Default for FieldRule {
  fn default() -> Self { Self { read: None, write: WritePolicy::Open } }
}

/// `true` when the actor is authenticated and holds one of `roles`.
pub fn has_role(actor: Option<&Actor>, roles: &[Role]) -> bool {
  actor.is_some_and(|a| a.has_any_role(roles))
}

/// A rule admitting exactly `roles`, unscoped.
pub fn allow_roles(
  roles: &'static [Role],
) -> impl Fn(Option<&Actor>) -> AccessDecision + Clone + Send + Sync + 'static {
  move |actor| {
    if has_role(actor, roles) {
      AccessDecision::AllowAll
    } else {
      AccessDecision::Deny
    }
  }
}

fn authenticated(actor: Option<&Actor>) -> bool { actor.is_some() }

const MANAGERS: &[Role] = &[Role::Admin, Role::Gestor];
const COURSE_EDITORS: &[Role] = &[Role::Admin, Role::Gestor, Role::Marketing];
const LEAD_HANDLERS: &[Role] = &[Role::Admin, Role::Gestor, Role::Marketing];

// ─── Engine ──────────────────────────────────────────────────────────────────

/// Registry of collection rules and field rules.
#[derive(Default)]
pub struct PolicyEngine {
  rules:  HashMap<(Resource, Operation), Rule>,
  fields: HashMap<Resource, HashMap<&'static str, FieldRule>>,
}

impl std::fmt::Debug for PolicyEngine {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("PolicyEngine")
      .field("rules", &self.rules.len())
      .field("fields", &self.fields.values().map(HashMap::len).sum::<usize>())
      .finish()
  }
}

impl PolicyEngine {
  /// An engine with no rules: everything is denied.
  pub fn empty() -> Self { Self::default() }

  /// Register (or replace) the rule for `(resource, operation)`.
  pub fn rule<F>(mut self, resource: Resource, operation: Operation, rule: F) -> Self
  where
    F: Fn(Option<&Actor>) -> AccessDecision + Send + Sync + 'static,
  {
    self.rules.insert((resource, operation), Box::new(rule));
    self
  }

  /// Register the same rule for several operations.
  pub fn rules<F>(mut self, resource: Resource, operations: &[Operation], rule: F) -> Self
  where
    F: Fn(Option<&Actor>) -> AccessDecision + Clone + Send + Sync + 'static,
  {
    for op in operations {
      self = self.rule(resource, *op, rule.clone());
    }
    self
  }

  /// Restrict who may read `field`.
  pub fn field_read<F>(mut self, resource: Resource, field: &'static str, pred: F) -> Self
  where
    F: Fn(Option<&Actor>) -> bool + Send + Sync + 'static,
  {
    self.field_rule(resource, field).read = Some(Box::new(pred));
    self
  }

  /// Restrict who may write `field`.
  pub fn field_write(mut self, resource: Resource, field: &'static str, write: WritePolicy) -> Self {
    self.field_rule(resource, field).write = write;
    self
  }

  fn field_rule(&mut self, resource: Resource, field: &'static str) -> &mut FieldRule {
    self.fields.entry(resource).or_default().entry(field).or_default()
  }

  fn lookup_field(&self, resource: Resource, field: &str) -> Option<&FieldRule> {
    self.fields.get(&resource).and_then(|fields| fields.get(field))
  }

  /// The rule table of the CEP catalog.
  pub fn standard() -> Self {
    use Operation::*;
    use Resource::*;

    Self::empty()
      // Areas: public catalogue, managed by admin/gestor.
      .rule(Areas, Read, |_| AccessDecision::AllowAll)
      .rules(Areas, &[Create, Update, Delete], allow_roles(MANAGERS))
      .field_write(Areas, "code", WritePolicy::WriteOnce)
      // Courses
      .rule(Courses, Read, |actor| match actor {
        Some(_) => AccessDecision::AllowAll,
        None => AccessDecision::AllowScoped(Scope::new().equals("active", true)),
      })
      .rule(Courses, Create, allow_roles(COURSE_EDITORS))
      .rule(Courses, Update, |actor| match actor {
        Some(a) if a.has_any_role(MANAGERS) => AccessDecision::AllowAll,
        Some(a) if a.role == Role::Marketing => AccessDecision::AllowScoped(
          Scope::new().equals("created_by", a.user_id.to_string()),
        ),
        _ => AccessDecision::Deny,
      })
      .rule(Courses, Delete, allow_roles(MANAGERS))
      .field_write(Courses, "code", WritePolicy::SystemManaged)
      .field_write(Courses, "slug", WritePolicy::SystemManaged)
      .field_write(Courses, "created_by", WritePolicy::SystemManaged)
      // Staff
      .rule(Staff, Read, |actor| match actor {
        Some(_) => AccessDecision::AllowAll,
        None => AccessDecision::AllowScoped(
          Scope::new().equals("staff_type", "profesor").equals("is_active", true),
        ),
      })
      .rules(Staff, &[Create, Update, Delete], allow_roles(MANAGERS))
      .field_read(Staff, "email", authenticated)
      .field_read(Staff, "phone", authenticated)
      .field_read(Staff, "notes", |actor| has_role(actor, MANAGERS))
      .field_write(Staff, "created_by", WritePolicy::SystemManaged)
      // Leads: public form submissions; asesores see only their own.
      .rule(Leads, Create, |actor| match actor {
        Some(a) if a.role == Role::Lectura => AccessDecision::Deny,
        _ => AccessDecision::AllowAll,
      })
      .rules(Leads, &[Read, Update], |actor: Option<&Actor>| match actor {
        Some(a) if a.has_any_role(LEAD_HANDLERS) => AccessDecision::AllowAll,
        Some(a) if a.role == Role::Asesor => AccessDecision::AllowScoped(
          Scope::new().equals("assigned_to", a.user_id.to_string()),
        ),
        _ => AccessDecision::Deny,
      })
      .rule(Leads, Delete, allow_roles(MANAGERS))
      .field_write(Leads, "created_by", WritePolicy::SystemManaged)
  }

  /// Evaluate the collection-level rule.
  pub fn decide(
    &self,
    actor: Option<&Actor>,
    operation: Operation,
    resource: Resource,
  ) -> AccessDecision {
    self
      .rules
      .get(&(resource, operation))
      .map_or(AccessDecision::Deny, |rule| rule(actor))
  }

  /// Boolean form of [`decide`](Self::decide). With a `document`, a scoped
  /// allow must also match it; without one, any allow counts.
  pub fn can_perform(
    &self,
    actor: Option<&Actor>,
    operation: Operation,
    resource: Resource,
    document: Option<&Value>,
  ) -> bool {
    let decision = self.decide(actor, operation, resource);
    match document {
      Some(doc) => decision.permits(doc),
      None => decision.is_allowed(),
    }
  }

  pub fn can_read_field(&self, actor: Option<&Actor>, resource: Resource, field: &str) -> bool {
    if !self.decide(actor, Operation::Read, resource).is_allowed() {
      return false;
    }
    match self.lookup_field(resource, field).and_then(|r| r.read.as_ref()) {
      Some(pred) => pred(actor),
      None => true,
    }
  }

  pub fn can_write_field(
    &self,
    actor: Option<&Actor>,
    resource: Resource,
    field: &str,
    operation: Operation,
  ) -> bool {
    if !matches!(operation, Operation::Create | Operation::Update) {
      return false;
    }
    if !self.decide(actor, operation, resource).is_allowed() {
      return false;
    }
    match self.lookup_field(resource, field).map(|r| &r.write) {
      None | Some(WritePolicy::Open) => true,
      Some(WritePolicy::Guarded(pred)) => pred(actor),
      Some(WritePolicy::WriteOnce) => operation == Operation::Create,
      Some(WritePolicy::SystemManaged) => false,
    }
  }

  /// Remove every top-level field of `document` the actor may not read.
  pub fn redact(&self, actor: Option<&Actor>, resource: Resource, document: &mut Value) {
    if let Value::Object(map) = document {
      map.retain(|field, _| self.can_read_field(actor, resource, field));
    }
  }

  /// Remove every field of `payload` the actor may not write with
  /// `operation`, returning the removed field names.
  pub fn retain_writable(
    &self,
    actor: Option<&Actor>,
    resource: Resource,
    operation: Operation,
    payload: &mut Map<String, Value>,
  ) -> Vec<String> {
    let mut stripped = Vec::new();
    payload.retain(|field, _| {
      let keep = self.can_write_field(actor, resource, field, operation);
      if !keep {
        stripped.push(field.clone());
      }
      keep
    });
    stripped
  }
}
