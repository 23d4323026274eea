//! Core types and trait definitions for the CEP course catalog.
//!
//! No HTTP and no database here. The crate holds the domain records, the
//! course-code value object, the access policy engine and the
//! [`store::CatalogStore`] abstraction every backend implements.

// Store futures carry explicit `Send` bounds; the advisory lint is noise here.
#![allow(async_fn_in_trait)]

pub mod actor;
pub mod area;
pub mod course;
pub mod error;
pub mod policy;
pub mod staff;
pub mod store;

pub use error::{Error, Result};
