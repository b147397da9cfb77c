//! # SearchSync Testkit
//!
//! Test utilities for SearchSync.
//!
//! This crate provides:
//! - A recording engine double and a people/articles fixture
//! - Property-based test generators using proptest
//! - A harness that drives the hooks the way a record store's commit
//!   pipeline would
//!
//! ## Usage
//!
//! ```rust,ignore
//! use searchsync_testkit::prelude::*;
//!
//! #[test]
//! fn saving_indexes() {
//!     let harness = SyncHarness::recording(people_and_articles());
//!     harness.save(person(1, "Kogler")).unwrap();
//!     assert_eq!(harness.engine.calls().len(), 1);
//! }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod fixtures;
pub mod generators;
pub mod integration;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::fixtures::*;
    pub use crate::generators::*;
    pub use crate::integration::*;
}

pub use fixtures::*;
pub use generators::*;
pub use integration::*;
