//! Merge engine: folds an incoming [`Package`] into a current one, producing
//! the merged tree plus the conflicts and changes that occurred along the
//! way (spec §4.2).

mod guard;
mod options;
mod reconcile;

pub use guard::{guards_list, guards_option, guards_removal};
pub use options::MergeOptions;

use confmerge_model::{Change, ChangeAction, Conflict, Package};
use log::debug;

/// Merge `incoming` into `current`, returning the merged package, the
/// conflicts encountered, and the changes applied (or that dry-run would
/// have applied).
///
/// Section order is preserved: existing sections keep their position,
/// sections only present in `incoming` are appended in `incoming`'s order.
/// This function never removes a section — only the orchestrator's
/// remove-matching path does that, subject to [`guards_removal`].
pub fn merge(package_name: &str, current: &Package, incoming: &Package, options: &MergeOptions) -> (Package, Vec<Conflict>, Vec<Change>) {
    let mut merged = current.clone();
    let mut conflicts = Vec::new();
    let mut changes = Vec::new();

    for i in 0..incoming.sections.len() {
        let section_ref = incoming.section_ref(i);
        let incoming_section = &incoming.sections[i];

        match merged.find(&section_ref) {
            None => {
                debug!("{package_name}.{section_ref}: new section");
                merged.push(incoming_section.clone());
                changes.push(Change {
                    action: ChangeAction::AddSection,
                    package: package_name.to_string(),
                    section: section_ref.clone(),
                    field: None,
                    before: None,
                    after: None,
                });
            }
            Some(idx) => {
                reconcile::reconcile_section(
                    package_name,
                    &mut merged,
                    idx,
                    &section_ref,
                    &incoming_section.options,
                    &incoming_section.lists,
                    options,
                    &mut conflicts,
                    &mut changes,
                );
            }
        }
    }

    if options.dry_run {
        (current.clone(), conflicts, changes)
    } else {
        (merged, conflicts, changes)
    }
}
