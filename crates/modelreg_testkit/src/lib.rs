//! # modelreg Testkit
//!
//! Test utilities for modelreg.
//!
//! This crate provides:
//! - Temporary registries with a controllable clock
//! - Property-based test generators using proptest
//! - Multi-worker stress helpers that share one registry root
//!
//! ## Usage
//!
//! ```rust,ignore
//! use modelreg_testkit::prelude::*;
//!
//! #[test]
//! fn registers_a_model() {
//!     with_temp_registry(|registry| {
//!         let model = registry.create().unwrap();
//!         model.commit().unwrap();
//!     });
//! }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod fixtures;
pub mod generators;
pub mod stress;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::fixtures::*;
    pub use crate::generators::*;
    pub use crate::stress::*;
}

pub use fixtures::*;
pub use generators::*;
pub use stress::*;
