//! Course catalog orchestration.
//!
//! [`CatalogService`] is the request handler the transport layers call. It
//! evaluates the access policy first, then validates input, sequences course
//! codes and talks to any [`cep_core::store::CatalogStore`]. Store reads are
//! bounded by a timeout and writes run to completion. Code sequencing is
//! serialised per prefix and retried once when the store reports a
//! duplicate code.

mod locks;
pub mod sequencer;
mod service;

pub use locks::KeyedLocks;
pub use service::{
  CatalogService, CourseInput, CourseListing, CoursePreview, DEFAULT_STORAGE_TIMEOUT,
  LIST_LIMIT,
};

#[cfg(test)]
mod tests;
