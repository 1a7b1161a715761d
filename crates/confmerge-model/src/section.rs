use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::Value;

/// Identifies a section for reporting and matching purposes.
///
/// Anonymous sections are matched by `section_type` + ordinal position
/// within that type, never by the generated identifier a loader may have
/// assigned them — that identifier is only stable within a single load
/// (spec §3 invariant, §9 design note).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SectionRef {
    Named(String),
    Anonymous { section_type: String, ordinal: usize },
}

impl fmt::Display for SectionRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SectionRef::Named(name) => write!(f, "{name}"),
            SectionRef::Anonymous { section_type, ordinal } => {
                write!(f, "@{section_type}[{ordinal}]")
            }
        }
    }
}

/// A typed, named-or-anonymous bundle of options and lists within a package.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Section {
    /// Explicit name, or `None` for an anonymous section.
    pub name: Option<String>,
    /// Identifier generated at load time. Stable only within that one load;
    /// never used to match sections across loads (see [`SectionRef`]).
    pub generated_id: String,
    pub section_type: String,
    pub options: BTreeMap<String, Value>,
    pub lists: BTreeMap<String, Vec<Value>>,
}

impl Section {
    pub fn new(name: Option<String>, generated_id: impl Into<String>, section_type: impl Into<String>) -> Self {
        Self {
            name,
            generated_id: generated_id.into(),
            section_type: section_type.into(),
            options: BTreeMap::new(),
            lists: BTreeMap::new(),
        }
    }

    pub fn is_anonymous(&self) -> bool {
        self.name.is_none()
    }

    /// True if `field` names neither an option nor a list in this section.
    pub fn is_vacant(&self, field: &str) -> bool {
        !self.options.contains_key(field) && !self.lists.contains_key(field)
    }
}

/// A named group of configuration sections, typically corresponding to one
/// init-managed service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Package {
    pub name: String,
    /// Section order is preserved on commit (spec §3 invariant).
    pub sections: Vec<Section>,
}

impl Package {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            sections: Vec::new(),
        }
    }

    /// The ordinal of the section at `index`, counted among all sections of
    /// the same `section_type` that precede it (including named ones —
    /// this mirrors the host config system's `@type[n]` addressing).
    pub fn ordinal_of(&self, index: usize) -> usize {
        let section_type = &self.sections[index].section_type;
        self.sections[..index]
            .iter()
            .filter(|s| &s.section_type == section_type)
            .count()
    }

    pub fn section_ref(&self, index: usize) -> SectionRef {
        let section = &self.sections[index];
        match &section.name {
            Some(name) => SectionRef::Named(name.clone()),
            None => SectionRef::Anonymous {
                section_type: section.section_type.clone(),
                ordinal: self.ordinal_of(index),
            },
        }
    }

    /// Find a section matching `r#ref` by the spec's matching rule: named
    /// sections match by name, anonymous sections match by type + ordinal.
    pub fn find(&self, r#ref: &SectionRef) -> Option<usize> {
        match r#ref {
            SectionRef::Named(name) => self
                .sections
                .iter()
                .position(|s| s.name.as_deref() == Some(name.as_str())),
            SectionRef::Anonymous { section_type, ordinal } => {
                let mut seen = 0usize;
                for (i, s) in self.sections.iter().enumerate() {
                    if &s.section_type == section_type {
                        if seen == *ordinal {
                            return Some(i);
                        }
                        seen += 1;
                    }
                }
                None
            }
        }
    }

    pub fn push(&mut self, section: Section) {
        self.sections.push(section);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn anon(section_type: &str, id: &str) -> Section {
        Section::new(None, id, section_type)
    }

    #[test]
    fn ordinal_counts_within_type_only() {
        let mut pkg = Package::new("network");
        pkg.push(anon("interface", "cfg01"));
        pkg.push(anon("route", "cfg02"));
        pkg.push(anon("interface", "cfg03"));

        assert_eq!(pkg.ordinal_of(0), 0);
        assert_eq!(pkg.ordinal_of(1), 0);
        assert_eq!(pkg.ordinal_of(2), 1);
    }

    #[test]
    fn find_anonymous_by_type_and_ordinal_ignores_generated_id() {
        let mut pkg = Package::new("network");
        pkg.push(anon("interface", "cfg01"));
        pkg.push(anon("interface", "cfg02"));

        let r#ref = SectionRef::Anonymous {
            section_type: "interface".into(),
            ordinal: 1,
        };
        let found = pkg.find(&r#ref).unwrap();
        assert_eq!(pkg.sections[found].generated_id, "cfg02");
    }

    #[test]
    fn find_named_ignores_type() {
        let mut pkg = Package::new("network");
        pkg.sections.push(Section::new(Some("lan".into()), "cfg01", "interface"));

        let found = pkg.find(&SectionRef::Named("lan".into())).unwrap();
        assert_eq!(found, 0);
    }
}
