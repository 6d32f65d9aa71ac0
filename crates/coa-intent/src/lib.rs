//! COA Intent Specification
//!
//! Reads the intent specification (which units of work exist, what files each
//! may touch, which rules apply) and the approval-required list.
//!
//! # Example
//!
//! ```rust
//! use coa_intent::{parse, IntentId};
//!
//! let spec = parse("- id: INT-001\n  owned_scope:\n    - src/auth/**\n");
//! let intent = spec.get(&IntentId::new("INT-001")).unwrap();
//! assert_eq!(intent.owned_scope.patterns(), &["src/auth/**"]);
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

pub mod approval;
pub mod error;
pub mod intent;
pub mod parser;
pub mod store;

pub use approval::ApprovalList;
pub use error::SpecError;
pub use intent::{Intent, IntentId, IntentSpec, IntentStatus};
pub use parser::{lookup, parse};
pub use store::SpecStore;

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
