//! COA Artifact Primitives
//!
//! The low-level vocabulary shared by the governance crates.
//!
//! # Core Concepts
//!
//! - [`ContentHash`]: algorithm-tagged 32-byte digest (`sha256:<hex>`)
//! - [`WorkspacePath`]: normalized, forward-slash, workspace-relative path
//! - [`OwnedScope`] and [`scope::matches`]: glob ownership patterns (`*`, `**`)
//!
//! # Example
//!
//! ```rust
//! use coa_artifact::{ContentHash, OwnedScope, WorkspacePath};
//!
//! let scope = OwnedScope::new(["src/auth/**"]);
//! let path = WorkspacePath::parse("./src/auth/jwt.ts").unwrap();
//! assert!(scope.permits(&path));
//!
//! let hash = ContentHash::compute(b"export const x = 1;");
//! assert!(hash.to_string().starts_with("sha256:"));
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

mod hash;
mod path;
pub mod scope;

pub use hash::{ContentHash, HashAlgorithm, HashError};
pub use path::{PathError, WorkspacePath};
pub use scope::OwnedScope;

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
