use confmerge_dedupe::SemanticTag;
use confmerge_model::{Change, ChangeAction, ChangeValue, Conflict, ConflictValue, Package, Resolution, SectionRef};
use log::{debug, warn};

use crate::guard;
use crate::options::MergeOptions;

/// Reconcile the options and lists of a single shared section (spec §4.2).
/// `idx` indexes the section in `merged` that matches `incoming` by the
/// §3 matching rule.
pub(crate) fn reconcile_section(
    package: &str,
    merged: &mut Package,
    idx: usize,
    section_ref: &SectionRef,
    incoming_options: &std::collections::BTreeMap<String, String>,
    incoming_lists: &std::collections::BTreeMap<String, Vec<String>>,
    options: &MergeOptions,
    conflicts: &mut Vec<Conflict>,
    changes: &mut Vec<Change>,
) {
    for (name, incoming_value) in incoming_options {
        reconcile_option(package, merged, idx, section_ref, name, incoming_value, options, conflicts, changes);
    }
    for (name, incoming_list) in incoming_lists {
        reconcile_list(package, merged, idx, section_ref, name, incoming_list, options, conflicts, changes);
    }
}

#[allow(clippy::too_many_arguments)]
fn reconcile_option(
    package: &str,
    merged: &mut Package,
    idx: usize,
    section_ref: &SectionRef,
    name: &str,
    incoming_value: &str,
    options: &MergeOptions,
    conflicts: &mut Vec<Conflict>,
    changes: &mut Vec<Change>,
) {
    let section = &merged.sections[idx];

    if let Some(existing_list) = section.lists.get(name).cloned() {
        debug!("{package}.{section_ref}.{name}: type-mismatch shadowing (list vs incoming option)");
        conflicts.push(Conflict {
            package: package.to_string(),
            section: section_ref.clone(),
            field: name.to_string(),
            existing: ConflictValue::List(existing_list),
            incoming: ConflictValue::Option(incoming_value.to_string()),
            resolution: Resolution::KeptExisting,
        });
        return;
    }

    match section.options.get(name).cloned() {
        None => {
            merged.sections[idx].options.insert(name.to_string(), incoming_value.to_string());
            changes.push(Change {
                action: ChangeAction::AddOption,
                package: package.to_string(),
                section: section_ref.clone(),
                field: Some(name.to_string()),
                before: None,
                after: Some(ChangeValue::Option(incoming_value.to_string())),
            });
        }
        Some(existing_value) if existing_value == incoming_value => {}
        Some(existing_value) => {
            let guarded = options.preserve_network && guard::guards_option(package, &merged.sections[idx], name);
            if guarded {
                warn!("{package}.{section_ref}.{name}: preserve-network guard downgraded conflict to kept-existing");
                conflicts.push(Conflict {
                    package: package.to_string(),
                    section: section_ref.clone(),
                    field: name.to_string(),
                    existing: ConflictValue::Option(existing_value),
                    incoming: ConflictValue::Option(incoming_value.to_string()),
                    resolution: Resolution::KeptExisting,
                });
                return;
            }

            if options.preserve_existing {
                conflicts.push(Conflict {
                    package: package.to_string(),
                    section: section_ref.clone(),
                    field: name.to_string(),
                    existing: ConflictValue::Option(existing_value),
                    incoming: ConflictValue::Option(incoming_value.to_string()),
                    resolution: Resolution::KeptExisting,
                });
            } else {
                conflicts.push(Conflict {
                    package: package.to_string(),
                    section: section_ref.clone(),
                    field: name.to_string(),
                    existing: ConflictValue::Option(existing_value.clone()),
                    incoming: ConflictValue::Option(incoming_value.to_string()),
                    resolution: Resolution::TookIncoming,
                });
                merged.sections[idx].options.insert(name.to_string(), incoming_value.to_string());
                changes.push(Change {
                    action: ChangeAction::UpdateOption,
                    package: package.to_string(),
                    section: section_ref.clone(),
                    field: Some(name.to_string()),
                    before: Some(ChangeValue::Option(existing_value)),
                    after: Some(ChangeValue::Option(incoming_value.to_string())),
                });
            }
        }
    }
}

#[allow(clippy::too_many_arguments)]
fn reconcile_list(
    package: &str,
    merged: &mut Package,
    idx: usize,
    section_ref: &SectionRef,
    name: &str,
    incoming_list: &[String],
    options: &MergeOptions,
    conflicts: &mut Vec<Conflict>,
    changes: &mut Vec<Change>,
) {
    let section = &merged.sections[idx];

    if let Some(existing_option) = section.options.get(name).cloned() {
        debug!("{package}.{section_ref}.{name}: type-mismatch shadowing (option vs incoming list)");
        conflicts.push(Conflict {
            package: package.to_string(),
            section: section_ref.clone(),
            field: name.to_string(),
            existing: ConflictValue::Option(existing_option),
            incoming: ConflictValue::List(incoming_list.to_vec()),
            resolution: Resolution::KeptExisting,
        });
        return;
    }

    let tag = SemanticTag::from_name(name);

    match section.lists.get(name).cloned() {
        None => {
            let mut new_list = incoming_list.to_vec();
            let mut removed = 0;
            if options.dedupe_lists {
                let (deduped, r) = confmerge_dedupe::dedupe(&new_list, &tag, confmerge_dedupe::Strategy::Auto);
                new_list = deduped;
                removed = r;
            }
            merged.sections[idx].lists.insert(name.to_string(), new_list.clone());
            changes.push(Change {
                action: ChangeAction::AddList,
                package: package.to_string(),
                section: section_ref.clone(),
                field: Some(name.to_string()),
                before: None,
                after: Some(ChangeValue::List(new_list)),
            });
            if removed > 0 {
                changes.push(Change {
                    action: ChangeAction::DedupeList,
                    package: package.to_string(),
                    section: section_ref.clone(),
                    field: Some(name.to_string()),
                    before: None,
                    after: Some(ChangeValue::Count(removed)),
                });
            }
        }
        Some(existing_list) => {
            let mut concatenated = existing_list.clone();
            concatenated.extend(incoming_list.iter().cloned());

            let mut final_list = concatenated.clone();
            let mut removed = 0;
            if options.dedupe_lists {
                let (deduped, r) = confmerge_dedupe::dedupe(&concatenated, &tag, confmerge_dedupe::Strategy::Auto);
                final_list = deduped;
                removed = r;
            }

            if options.preserve_network && guard::guards_list(package, &merged.sections[idx], name) {
                let dropped_existing = existing_list.iter().any(|v| !final_list.contains(v));
                if dropped_existing {
                    warn!("{package}.{section_ref}.{name}: preserve-network guard downgraded list merge to kept-existing");
                    conflicts.push(Conflict {
                        package: package.to_string(),
                        section: section_ref.clone(),
                        field: name.to_string(),
                        existing: ConflictValue::List(existing_list),
                        incoming: ConflictValue::List(incoming_list.to_vec()),
                        resolution: Resolution::KeptExisting,
                    });
                    return;
                }
            }

            merged.sections[idx].lists.insert(name.to_string(), final_list.clone());
            changes.push(Change {
                action: ChangeAction::ModifyList,
                package: package.to_string(),
                section: section_ref.clone(),
                field: Some(name.to_string()),
                before: Some(ChangeValue::List(existing_list)),
                after: Some(ChangeValue::List(final_list.clone())),
            });
            if removed > 0 {
                changes.push(Change {
                    action: ChangeAction::DedupeList,
                    package: package.to_string(),
                    section: section_ref.clone(),
                    field: Some(name.to_string()),
                    before: None,
                    after: Some(ChangeValue::Count(removed)),
                });
            }
        }
    }
}
