use std::fmt;

use serde::{Deserialize, Serialize};

use crate::section::SectionRef;
use crate::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChangeAction {
    AddSection,
    AddOption,
    UpdateOption,
    AddList,
    ModifyList,
    DedupeList,
}

impl fmt::Display for ChangeAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ChangeAction::AddSection => "add-section",
            ChangeAction::AddOption => "add-option",
            ChangeAction::UpdateOption => "update-option",
            ChangeAction::AddList => "add-list",
            ChangeAction::ModifyList => "modify-list",
            ChangeAction::DedupeList => "dedupe-list",
        };
        write!(f, "{s}")
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChangeValue {
    Option(Value),
    List(Vec<Value>),
    /// Used by `dedupe-list`, whose payload is a removed-entry count rather
    /// than a before/after value.
    Count(usize),
}

impl fmt::Display for ChangeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChangeValue::Option(v) => write!(f, "{v}"),
            ChangeValue::List(vs) => write!(f, "[{}]", vs.join(", ")),
            ChangeValue::Count(n) => write!(f, "{n}"),
        }
    }
}

/// A recorded modification the merge engine applied, or would apply in
/// dry-run mode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Change {
    pub action: ChangeAction,
    pub package: String,
    pub section: SectionRef,
    /// The option or list name this change touches. `None` for
    /// `add-section`, which has no single field.
    pub field: Option<String>,
    pub before: Option<ChangeValue>,
    pub after: Option<ChangeValue>,
}

impl fmt::Display for Change {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}.{}", self.action, self.package, self.section)?;
        if let Some(field) = &self.field {
            write!(f, ".{field}")?;
        }
        if let (Some(before), Some(after)) = (&self.before, &self.after) {
            write!(f, ": {before} -> {after}")?;
        } else if let Some(after) = &self.after {
            write!(f, ": {after}")?;
        }
        Ok(())
    }
}
