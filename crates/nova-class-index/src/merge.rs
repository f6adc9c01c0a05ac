use std::collections::HashSet;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::annotation::AnnotationInstance;
use crate::error::IndexError;
use crate::index::{Index, IndexBuilder};
use crate::name::Name;

/// What to do when both sides of a merge hold a different unit (or module)
/// under the same name. Identical units never conflict.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MergePolicy {
    /// Fail the whole merge without changing the builder.
    #[default]
    Reject,
    /// Keep the builder's unit and ignore the incoming one, along with the
    /// usage sites the incoming unit owned. Standalone sites still merge.
    KeepExisting,
    /// Take the incoming unit, withdrawing the old unit's edges.
    Replace,
}

/// Summary of a successful merge. Name lists are sorted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MergeOutcome {
    pub added: usize,
    pub identical: usize,
    pub replaced: Vec<Name>,
    pub kept_existing: Vec<Name>,
    /// Standalone usage sites copied over.
    pub annotations_added: usize,
}

enum Incoming {
    Add,
    Identical,
    Conflict,
}

fn classify<T: PartialEq>(existing: Option<&Arc<T>>, incoming: &Arc<T>) -> Incoming {
    match existing {
        None => Incoming::Add,
        Some(existing) if Arc::ptr_eq(existing, incoming) || **existing == **incoming => Incoming::Identical,
        Some(_) => Incoming::Conflict,
    }
}

impl IndexBuilder {
    /// Merge `other` using the configured [`MergePolicy`].
    pub fn merge_from(&mut self, other: &Index) -> Result<MergeOutcome, IndexError> {
        self.merge(other, self.config.merge_policy)
    }

    /// Union `other` into this builder.
    ///
    /// Incoming units are replayed in name order, so the result does not depend
    /// on how `other` was built. Under [`MergePolicy::Reject`] every conflict is
    /// found before anything is changed.
    pub fn merge(&mut self, other: &Index, policy: MergePolicy) -> Result<MergeOutcome, IndexError> {
        let mut units: Vec<_> = other.graphs.units.values().collect();
        units.sort_by(|a, b| a.name().cmp(b.name()));
        let mut modules: Vec<_> = other.graphs.modules.values().collect();
        modules.sort_by(|a, b| a.name().cmp(b.name()));

        let unit_plan: Vec<_> = units
            .into_iter()
            .map(|unit| (classify(self.graphs.units.get(unit.name()), unit), unit))
            .collect();
        let module_plan: Vec<_> = modules
            .into_iter()
            .map(|module| (classify(self.graphs.modules.get(module.name()), module), module))
            .collect();

        let mut conflicts: Vec<Name> = unit_plan
            .iter()
            .filter(|(plan, _)| matches!(plan, Incoming::Conflict))
            .map(|(_, unit)| unit.name().clone())
            .chain(
                module_plan
                    .iter()
                    .filter(|(plan, _)| matches!(plan, Incoming::Conflict))
                    .map(|(_, module)| module.name().clone()),
            )
            .collect();
        conflicts.sort();
        conflicts.dedup();

        if policy == MergePolicy::Reject && !conflicts.is_empty() {
            tracing::debug!(
                target = "nova.class_index",
                conflicts = conflicts.len(),
                "merge rejected"
            );
            return Err(IndexError::MergeConflict { names: conflicts });
        }

        let mut outcome = MergeOutcome::default();
        // Sites owned by incoming units or modules that were turned away.
        let mut rejected_sites: HashSet<&AnnotationInstance> = HashSet::new();

        for (plan, unit) in &unit_plan {
            match plan {
                Incoming::Add => {
                    self.insert_unit(Arc::clone(unit));
                    outcome.added += 1;
                }
                Incoming::Identical => outcome.identical += 1,
                Incoming::Conflict if policy == MergePolicy::Replace => {
                    self.insert_unit(Arc::clone(unit));
                    outcome.replaced.push(unit.name().clone());
                }
                Incoming::Conflict => {
                    rejected_sites.extend(unit.annotation_usages());
                    outcome.kept_existing.push(unit.name().clone());
                }
            }
        }

        for (plan, module) in &module_plan {
            match plan {
                Incoming::Add => {
                    self.insert_module(Arc::clone(module));
                    outcome.added += 1;
                }
                Incoming::Identical => outcome.identical += 1,
                Incoming::Conflict if policy == MergePolicy::Replace => {
                    self.insert_module(Arc::clone(module));
                    outcome.replaced.push(module.name().clone());
                }
                Incoming::Conflict => {
                    rejected_sites.extend(module.annotations());
                    outcome.kept_existing.push(module.name().clone());
                }
            }
        }

        // Unit-owned sites came along with their units; this picks up the
        // standalone ones.
        let mut annotation_types: Vec<&Name> = other.graphs.annotations.keys().collect();
        annotation_types.sort();
        for annotation_type in annotation_types {
            let Some(sites) = other.graphs.annotations.get(annotation_type) else {
                continue;
            };
            for site in sites {
                if !rejected_sites.contains(site) && self.add_annotation(site.clone()) {
                    outcome.annotations_added += 1;
                }
            }
        }

        outcome.replaced.sort();
        outcome.kept_existing.sort();
        tracing::debug!(
            target = "nova.class_index",
            ?policy,
            added = outcome.added,
            identical = outcome.identical,
            replaced = outcome.replaced.len(),
            kept_existing = outcome.kept_existing.len(),
            "merged class index"
        );
        Ok(outcome)
    }
}
