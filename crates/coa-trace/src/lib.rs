//! COA Trace
//!
//! Post-action record keeping: classifies each mutation as a structural
//! refactor or a behavioral change, appends a trace record to the append-only
//! ledger, and keeps the intent-to-files spatial map current.
//!
//! # Example
//!
//! ```rust
//! use coa_trace::{HeuristicClassifier, MutationClass, MutationClassifier};
//!
//! let classifier = HeuristicClassifier::new();
//! assert_eq!(classifier.classify(None, "fn main() {}"), MutationClass::BehavioralChange);
//! assert_eq!(classifier.classify(Some("a\nb\n"), "a\nb\n"), MutationClass::StructuralRefactor);
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

pub mod classifier;
pub mod error;
pub mod ledger;
pub mod record;
pub mod spatial_map;

pub use classifier::{
    DiffSummary, HeuristicClassifier, Language, MutationClass, MutationClassifier,
    UnknownMutationClass,
};
pub use error::TraceError;
pub use ledger::{AppendOutcome, LedgerReader, LedgerWriter};
pub use record::{FileTrace, LineRange, RecordId, TraceRecord, VcsInfo};
pub use spatial_map::{upsert_path, MapUpdate, SpatialMap};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
