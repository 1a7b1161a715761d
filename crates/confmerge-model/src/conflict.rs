use std::fmt;

use serde::{Deserialize, Serialize};

use crate::section::SectionRef;
use crate::Value;

/// The value side of a conflict: a scalar option value, a list, or absence
/// (used for type-mismatch shadowing, where one side has neither kind of
/// value under that name in a form the other side recognizes).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConflictValue {
    Option(Value),
    List(Vec<Value>),
}

impl fmt::Display for ConflictValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConflictValue::Option(v) => write!(f, "{v}"),
            ConflictValue::List(vs) => write!(f, "[{}]", vs.join(", ")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Resolution {
    KeptExisting,
    TookIncoming,
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Resolution::KeptExisting => write!(f, "kept-existing"),
            Resolution::TookIncoming => write!(f, "took-incoming"),
        }
    }
}

/// A situation where current and incoming disagree on the same
/// option/list value, or where a guard refused an otherwise-valid change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Conflict {
    pub package: String,
    pub section: SectionRef,
    pub field: String,
    pub existing: ConflictValue,
    pub incoming: ConflictValue,
    pub resolution: Resolution,
}

impl fmt::Display for Conflict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}.{}.{}: {} (existing={}, incoming={})",
            self.package, self.section, self.field, self.resolution, self.existing, self.incoming
        )
    }
}
