//! COA Governance
//!
//! Intent-governance middleware for autonomous coding agents. Sits between
//! the agent's decision step and tool execution:
//!
//! - [`Gate::pre_check`] admits or denies a mutating action (intent selected,
//!   intent declared, target in scope, target not stale, destructive action
//!   approved)
//! - [`Gate::post_action`] records what the action did in the append-only
//!   trace ledger and the spatial map
//!
//! # Example
//!
//! ```rust,no_run
//! use coa_governance::{ActionRequest, Gate, SessionId};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let gate = Gate::from_workspace(".")?;
//! let session = SessionId::new("task-1");
//!
//! if let Err(denial) = gate.select_intent(&session, &"INT-001".into()).await {
//!     eprintln!("{denial}");
//! }
//!
//! let action = ActionRequest::new("write_to_file").with_path("src/auth/jwt.ts");
//! let decision = gate.pre_check(&session, &action).await;
//! if decision.is_allowed() {
//!     // ... execute the tool ...
//!     gate.post_action(&session, &action).await;
//! }
//! gate.sessions().clear(&session);
//! # Ok(())
//! # }
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

pub mod action;
pub mod approval;
pub mod config;
pub mod context;
pub mod decision;
pub mod error;
pub mod gate;
pub mod revision;
pub mod session;

pub use action::{patch_paths, ActionKind, ActionRequest};
pub use approval::{ApprovalPredicate, ApprovalRequest};
pub use config::GovernanceConfig;
pub use context::IntentContext;
pub use decision::{Denial, DenialCode, GateDecision};
pub use error::{GovernanceError, Result};
pub use gate::Gate;
pub use revision::{FixedRevision, GitRevision, NoRevision, RevisionProvider};
pub use session::{SessionId, SessionRegistry, Snapshot};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
