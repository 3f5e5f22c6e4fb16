//! # modelreg Core
//!
//! A registry of models shared by independent processes.
//!
//! Each model owns a directory under the registry root and one row of
//! key/value metadata in a shared CSV table. This crate provides:
//! - Marker-file advisory locks with bounded waiting
//! - Collision-free, minute-stamped id allocation backed by a ledger
//! - A schema-evolving record table with upsert-by-id
//! - Model handles that stage edits and commit them under the table lock
//!
//! Lock timeouts are errors: no operation ever proceeds unlocked.

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod allocator;
mod clock;
mod config;
pub mod dir;
mod error;
mod handle;
mod id;
mod ledger;
mod lock;
mod record;
mod registry;
mod store;
mod table;
mod value;

pub use allocator::IdAllocator;
pub use clock::{Clock, FixedClock, SystemClock};
pub use config::RegistryConfig;
pub use dir::RegistryDir;
pub use error::{CoreError, CoreResult};
pub use handle::ModelHandle;
pub use id::{minute_base, ModelId, BASE_FORMAT};
pub use ledger::IdLedger;
pub use lock::{AdvisoryLock, LockGuard};
pub use record::{Record, ID_COLUMN};
pub use registry::Registry;
pub use store::RecordStore;
pub use table::{RecordTable, UpsertOutcome, UpsertReport};
pub use value::FieldValue;

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
