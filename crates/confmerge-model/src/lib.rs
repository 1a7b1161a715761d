//! Shared data model: packages, sections, options, lists, conflicts, and
//! changes, as merged and reported by the confmerge engine.

pub mod change;
pub mod conflict;
pub mod section;
pub mod service_op;
pub mod tree;

pub use change::{Change, ChangeAction, ChangeValue};
pub use conflict::{Conflict, ConflictValue, Resolution};
pub use section::{Package, Section, SectionRef};
pub use service_op::{ServiceOp, ServiceOutcome, ServiceState};
pub use tree::ConfigTree;

/// A scalar configuration value. No type coercion is performed anywhere in
/// the engine; every option and list entry is a plain string.
pub type Value = String;
