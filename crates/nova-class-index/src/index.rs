//! The cross-reference index.
//!
//! [`IndexBuilder`] owns the mutable relationship graphs while units are being
//! added; [`IndexBuilder::finish`] freezes them into an [`Index`] that is only
//! ever read. Edges are maintained incrementally on insert so lookups never
//! walk the hierarchy, with one exception: the implementor graph is kept
//! transitively closed over subinterface chains, so `implementors(I)` already
//! contains classes that implement a subinterface of `I`.

use std::collections::{HashMap, HashSet, VecDeque};
use std::hash::Hash;
use std::iter::FusedIterator;
use std::sync::Arc;

use indexmap::IndexSet;
use nova_classfile::{ClassFile, ModuleDescriptor};

use crate::annotation::{AnnotationInstance, Equivalence, Value};
use crate::config::IndexConfig;
use crate::error::IndexError;
use crate::module::ModuleInfo;
use crate::name::{Name, NameTable};
use crate::unit::UnitInfo;

type EdgeMap = HashMap<Name, IndexSet<Name>>;

/// Anything a query can be keyed by: an interned [`Name`], or a dotted or
/// internal name string resolved through the index's name table.
pub trait NameRef {
    fn resolve(&self, names: &NameTable) -> Option<Name>;
}

impl NameRef for Name {
    fn resolve(&self, _names: &NameTable) -> Option<Name> {
        Some(self.clone())
    }
}

impl NameRef for str {
    fn resolve(&self, names: &NameTable) -> Option<Name> {
        names.get(self)
    }
}

impl NameRef for String {
    fn resolve(&self, names: &NameTable) -> Option<Name> {
        names.get(self)
    }
}

/// Iterator over one relationship set; empty for unknown keys.
pub struct Edges<'a, T> {
    inner: Option<indexmap::set::Iter<'a, T>>,
}

impl<'a, T> Edges<'a, T> {
    fn new(set: Option<&'a IndexSet<T>>) -> Self {
        Self {
            inner: set.map(IndexSet::iter),
        }
    }
}

impl<'a, T> Iterator for Edges<'a, T> {
    type Item = &'a T;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.as_mut()?.next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        match &self.inner {
            Some(inner) => inner.size_hint(),
            None => (0, Some(0)),
        }
    }
}

impl<T> DoubleEndedIterator for Edges<'_, T> {
    fn next_back(&mut self) -> Option<Self::Item> {
        self.inner.as_mut()?.next_back()
    }
}

impl<T> ExactSizeIterator for Edges<'_, T> {}

impl<T> FusedIterator for Edges<'_, T> {}

/// Number of keys in each relationship graph.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct RelationshipCounts {
    pub annotations: usize,
    pub subclasses: usize,
    pub subinterfaces: usize,
    pub implementors: usize,
}

#[derive(Debug, Clone, Default)]
pub(crate) struct Graphs {
    pub(crate) units: HashMap<Name, Arc<UnitInfo>>,
    pub(crate) modules: HashMap<Name, Arc<ModuleInfo>>,
    pub(crate) annotations: HashMap<Name, IndexSet<AnnotationInstance>>,
    pub(crate) subclasses: EdgeMap,
    pub(crate) subinterfaces: EdgeMap,
    /// Classes by the interfaces they name in their own `implements` clause.
    pub(crate) direct_implementors: EdgeMap,
    /// Closed over subinterfaces: `direct_implementors` of the key and of every
    /// known interface extending it, directly or not.
    pub(crate) implementors: EdgeMap,
    pub(crate) users: Option<EdgeMap>,
}

fn insert_edge<T: Hash + Eq>(map: &mut HashMap<Name, IndexSet<T>>, key: &Name, value: T) -> bool {
    match map.get_mut(key) {
        Some(set) => set.insert(value),
        None => {
            map.insert(key.clone(), IndexSet::from([value]));
            true
        }
    }
}

fn remove_edge<T: Hash + Eq>(map: &mut HashMap<Name, IndexSet<T>>, key: &Name, value: &T) {
    if let Some(set) = map.get_mut(key) {
        set.shift_remove(value);
        if set.is_empty() {
            map.remove(key);
        }
    }
}

impl Graphs {
    fn new(track_users: bool) -> Self {
        Self {
            users: track_users.then(HashMap::new),
            ..Self::default()
        }
    }

    pub(crate) fn counts(&self) -> RelationshipCounts {
        RelationshipCounts {
            annotations: self.annotations.len(),
            subclasses: self.subclasses.len(),
            subinterfaces: self.subinterfaces.len(),
            implementors: self.implementors.len(),
        }
    }

    /// `declared` plus every interface they extend, following only interfaces
    /// that are already indexed.
    fn up_closure(&self, declared: &[Name]) -> Vec<Name> {
        let mut seen: HashSet<&Name> = HashSet::new();
        let mut out = Vec::new();
        let mut queue: VecDeque<&Name> = declared.iter().collect();

        while let Some(next) = queue.pop_front() {
            if !seen.insert(next) {
                continue;
            }
            out.push(next.clone());
            if let Some(unit) = self.units.get(next) {
                if unit.is_interface() {
                    queue.extend(unit.interface_names());
                }
            }
        }

        out
    }

    /// `interface` plus every known interface extending it, directly or not.
    fn down_closure(&self, interface: &Name) -> Vec<Name> {
        let mut seen: HashSet<&Name> = HashSet::new();
        let mut out = Vec::new();
        let mut queue: VecDeque<&Name> = VecDeque::from([interface]);

        while let Some(next) = queue.pop_front() {
            if !seen.insert(next) {
                continue;
            }
            out.push(next.clone());
            if let Some(children) = self.subinterfaces.get(next) {
                queue.extend(children);
            }
        }

        out
    }

    fn recompute_implementors(&mut self, interface: &Name) {
        let mut closed = IndexSet::new();
        for declared in self.down_closure(interface) {
            if let Some(direct) = self.direct_implementors.get(&declared) {
                closed.extend(direct.iter().cloned());
            }
        }
        if closed.is_empty() {
            self.implementors.remove(interface);
        } else {
            self.implementors.insert(interface.clone(), closed);
        }
    }

    /// Register every edge `unit` contributes. The unit must already be in `units`.
    fn link(&mut self, unit: &UnitInfo) {
        let name = unit.name();

        if unit.is_interface() {
            for parent in unit.interface_names() {
                insert_edge(&mut self.subinterfaces, parent, name.clone());
            }
            // Classes that named this interface before it was indexed now also
            // implement everything it extends.
            let inherited: Vec<Name> = self
                .implementors
                .get(name)
                .map(|set| set.iter().cloned().collect())
                .unwrap_or_default();
            if !inherited.is_empty() {
                let ancestors = self.up_closure(unit.interface_names());
                tracing::trace!(
                    target = "nova.class_index",
                    interface = %name,
                    implementors = inherited.len(),
                    ancestors = ancestors.len(),
                    "propagating implementors to superinterfaces"
                );
                for ancestor in ancestors {
                    for implementor in &inherited {
                        insert_edge(&mut self.implementors, &ancestor, implementor.clone());
                    }
                }
            }
        } else {
            if let Some(super_name) = unit.super_name() {
                insert_edge(&mut self.subclasses, super_name, name.clone());
            }
            for interface in unit.interface_names() {
                insert_edge(&mut self.direct_implementors, interface, name.clone());
            }
            for ancestor in self.up_closure(unit.interface_names()) {
                insert_edge(&mut self.implementors, &ancestor, name.clone());
            }
        }

        for annotation in unit.annotation_usages() {
            insert_edge(&mut self.annotations, annotation.name(), annotation.clone());
        }

        if let Some(users) = &mut self.users {
            for referenced in unit.referenced_names() {
                insert_edge(users, referenced, name.clone());
            }
        }
    }

    /// Drop every edge `unit` contributed. The unit must already be gone from `units`.
    fn unlink(&mut self, unit: &UnitInfo) {
        let name = unit.name();

        if unit.is_interface() {
            for parent in unit.interface_names() {
                remove_edge(&mut self.subinterfaces, parent, name);
            }
            for ancestor in self.up_closure(unit.interface_names()) {
                self.recompute_implementors(&ancestor);
            }
        } else {
            if let Some(super_name) = unit.super_name() {
                remove_edge(&mut self.subclasses, super_name, name);
            }
            for interface in unit.interface_names() {
                remove_edge(&mut self.direct_implementors, interface, name);
            }
            for ancestor in self.up_closure(unit.interface_names()) {
                remove_edge(&mut self.implementors, &ancestor, name);
            }
        }

        for annotation in unit.annotation_usages() {
            remove_edge(&mut self.annotations, annotation.name(), annotation);
        }

        if let Some(users) = &mut self.users {
            for referenced in unit.referenced_names() {
                remove_edge(users, referenced, name);
            }
        }
    }
}

/// Mutable, single-writer index under construction.
#[derive(Debug, Clone)]
pub struct IndexBuilder {
    pub(crate) config: IndexConfig,
    pub(crate) names: NameTable,
    pub(crate) graphs: Graphs,
}

impl Default for IndexBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl IndexBuilder {
    pub fn new() -> Self {
        Self::with_config(IndexConfig::default())
    }

    pub fn with_config(config: IndexConfig) -> Self {
        Self {
            config,
            names: NameTable::new(),
            graphs: Graphs::new(config.track_users),
        }
    }

    pub fn config(&self) -> &IndexConfig {
        &self.config
    }

    /// The interner used for every name this builder converts.
    pub fn names(&mut self) -> &mut NameTable {
        &mut self.names
    }

    pub fn len(&self) -> usize {
        self.graphs.units.len()
    }

    pub fn is_empty(&self) -> bool {
        self.graphs.units.is_empty()
    }

    /// Validate `record` and index it, replacing any unit with the same name.
    ///
    /// A malformed record is rejected before the index is touched.
    pub fn add_unit(&mut self, record: &ClassFile) -> Result<Arc<UnitInfo>, IndexError> {
        let unit = Arc::new(UnitInfo::from_class_file(record, &mut self.names)?);
        self.insert_unit(Arc::clone(&unit));
        Ok(unit)
    }

    /// Index an already converted unit. Returns the unit it replaced, whose
    /// edges have been withdrawn.
    ///
    /// A unit converted through another table (another builder, a loaded
    /// snapshot) is rebuilt with this builder's interned names before it is
    /// linked.
    pub fn insert_unit(&mut self, unit: Arc<UnitInfo>) -> Option<Arc<UnitInfo>> {
        let unit = if self.interned_here(unit.name()) {
            unit
        } else {
            let mut unit = Arc::unwrap_or_clone(unit);
            unit.intern_names(&mut self.names);
            Arc::new(unit)
        };

        let previous = self.graphs.units.remove(unit.name());
        if let Some(previous) = &previous {
            tracing::debug!(
                target = "nova.class_index",
                unit = %unit.name(),
                identical = **previous == *unit,
                "replacing indexed unit"
            );
            self.graphs.unlink(previous);
        }

        self.graphs.units.insert(unit.name().clone(), Arc::clone(&unit));
        self.graphs.link(&unit);
        previous
    }

    /// Record a standalone usage site. Returns `false` if it was already known.
    pub fn add_annotation(&mut self, mut instance: AnnotationInstance) -> bool {
        instance.intern_names(&mut self.names);
        let key = instance.name().clone();
        insert_edge(&mut self.graphs.annotations, &key, instance)
    }

    pub fn add_module(&mut self, record: &ModuleDescriptor) -> Result<Arc<ModuleInfo>, IndexError> {
        let module = Arc::new(ModuleInfo::from_descriptor(record, &mut self.names)?);
        self.insert_module(Arc::clone(&module));
        Ok(module)
    }

    pub fn insert_module(&mut self, module: Arc<ModuleInfo>) -> Option<Arc<ModuleInfo>> {
        let module = if self.interned_here(module.name()) {
            module
        } else {
            let mut module = Arc::unwrap_or_clone(module);
            module.intern_names(&mut self.names);
            Arc::new(module)
        };
        let previous = self.graphs.modules.insert(module.name().clone(), Arc::clone(&module));
        if let Some(previous) = &previous {
            tracing::debug!(
                target = "nova.class_index",
                module = %module.name(),
                "replacing indexed module"
            );
            for annotation in previous.annotations() {
                remove_edge(&mut self.graphs.annotations, annotation.name(), annotation);
            }
        }
        for annotation in module.annotations() {
            insert_edge(&mut self.graphs.annotations, annotation.name(), annotation.clone());
        }
        previous
    }

    /// Freeze the graphs. The returned index is immutable and `Send + Sync`.
    pub fn finish(self) -> Index {
        let counts = self.graphs.counts();
        tracing::debug!(
            target = "nova.class_index",
            units = self.graphs.units.len(),
            modules = self.graphs.modules.len(),
            annotation_types = counts.annotations,
            subclass_keys = counts.subclasses,
            subinterface_keys = counts.subinterfaces,
            implementor_keys = counts.implementors,
            "class index built"
        );
        Index {
            config: self.config,
            names: self.names,
            graphs: self.graphs,
        }
    }

    /// Whether `name` is this table's own allocation, which holds for every
    /// record converted through [`IndexBuilder::names`].
    fn interned_here(&self, name: &Name) -> bool {
        self.names
            .get(&name.to_dotted())
            .is_some_and(|interned| interned.ptr_eq(name))
    }
}

/// A finished, read-only index.
#[derive(Debug, Clone)]
pub struct Index {
    pub(crate) config: IndexConfig,
    pub(crate) names: NameTable,
    pub(crate) graphs: Graphs,
}

impl Index {
    pub fn builder() -> IndexBuilder {
        IndexBuilder::new()
    }

    pub fn config(&self) -> &IndexConfig {
        &self.config
    }

    pub fn names(&self) -> &NameTable {
        &self.names
    }

    pub fn len(&self) -> usize {
        self.graphs.units.len()
    }

    pub fn is_empty(&self) -> bool {
        self.graphs.units.is_empty()
    }

    /// Reopen the index for more additions.
    pub fn into_builder(self) -> IndexBuilder {
        IndexBuilder {
            config: self.config,
            names: self.names,
            graphs: self.graphs,
        }
    }

    fn lookup<'a, T, N>(&'a self, map: &'a HashMap<Name, T>, name: &N) -> Option<&'a T>
    where
        N: NameRef + ?Sized,
    {
        map.get(&name.resolve(&self.names)?)
    }

    pub fn unit<N: NameRef + ?Sized>(&self, name: &N) -> Option<&Arc<UnitInfo>> {
        self.lookup(&self.graphs.units, name)
    }

    pub fn module<N: NameRef + ?Sized>(&self, name: &N) -> Option<&Arc<ModuleInfo>> {
        self.lookup(&self.graphs.modules, name)
    }

    /// All units, in no particular order.
    pub fn units(&self) -> impl ExactSizeIterator<Item = &Arc<UnitInfo>> + '_ {
        self.graphs.units.values()
    }

    pub fn modules(&self) -> impl ExactSizeIterator<Item = &Arc<ModuleInfo>> + '_ {
        self.graphs.modules.values()
    }

    /// Usage sites of annotation type `name`, including standalone ones.
    pub fn annotations<N: NameRef + ?Sized>(&self, name: &N) -> Edges<'_, AnnotationInstance> {
        Edges::new(self.lookup(&self.graphs.annotations, name))
    }

    /// Usage sites of a repeatable annotation `name`, including the instances
    /// packed into its `container` annotation's `value` array. Unpacked
    /// instances are attached to the container's target.
    pub fn annotations_with_repeatable<N, C>(&self, name: &N, container: &C) -> Vec<AnnotationInstance>
    where
        N: NameRef + ?Sized,
        C: NameRef + ?Sized,
    {
        let mut out: Vec<AnnotationInstance> = self.annotations(name).cloned().collect();
        let Some(name) = name.resolve(&self.names) else {
            return out;
        };
        for holder in self.annotations(container) {
            let Some(Value::Array(values)) = holder.value("value") else {
                continue;
            };
            for nested in values.iter().filter_map(Value::as_nested) {
                if nested.name() == &name {
                    out.push(nested.retarget(holder.target().cloned()));
                }
            }
        }
        out
    }

    /// Usage sites of `name` collapsed up to equivalence: one entry per
    /// distinct set of values, in first-seen order.
    pub fn distinct_annotations<N: NameRef + ?Sized>(&self, name: &N) -> Vec<Equivalence<'_>> {
        let mut seen = HashSet::new();
        self.annotations(name)
            .map(Equivalence::new)
            .filter(|proxy| seen.insert(*proxy))
            .collect()
    }

    pub fn direct_subclasses<N: NameRef + ?Sized>(&self, name: &N) -> Edges<'_, Name> {
        Edges::new(self.lookup(&self.graphs.subclasses, name))
    }

    pub fn direct_subinterfaces<N: NameRef + ?Sized>(&self, name: &N) -> Edges<'_, Name> {
        Edges::new(self.lookup(&self.graphs.subinterfaces, name))
    }

    /// Classes that name `interface` in their own `implements` clause.
    pub fn direct_implementors<N: NameRef + ?Sized>(&self, interface: &N) -> Edges<'_, Name> {
        Edges::new(self.lookup(&self.graphs.direct_implementors, interface))
    }

    /// Classes implementing `interface` directly or through a subinterface.
    /// Subclasses of those classes are not included.
    pub fn implementors<N: NameRef + ?Sized>(&self, interface: &N) -> Edges<'_, Name> {
        Edges::new(self.lookup(&self.graphs.implementors, interface))
    }

    /// Units whose constant pool refers to `name`. Empty when user tracking is off.
    pub fn users<N: NameRef + ?Sized>(&self, name: &N) -> Edges<'_, Name> {
        let users = self
            .graphs
            .users
            .as_ref()
            .and_then(|users| self.lookup(users, name));
        Edges::new(users)
    }

    /// Transitive subclasses, breadth first.
    pub fn all_known_subclasses<N: NameRef + ?Sized>(&self, name: &N) -> Vec<Name> {
        self.walk(&self.graphs.subclasses, name.resolve(&self.names))
    }

    /// Transitive subinterfaces, breadth first.
    pub fn all_known_subinterfaces<N: NameRef + ?Sized>(&self, name: &N) -> Vec<Name> {
        self.walk(&self.graphs.subinterfaces, name.resolve(&self.names))
    }

    /// Implementors of `interface` plus all of their subclasses.
    pub fn all_known_implementors<N: NameRef + ?Sized>(&self, interface: &N) -> Vec<Name> {
        let mut out: IndexSet<Name> = self.implementors(interface).cloned().collect();
        let direct: Vec<Name> = out.iter().cloned().collect();
        for implementor in direct {
            out.extend(self.walk(&self.graphs.subclasses, Some(implementor)));
        }
        out.into_iter().collect()
    }

    fn walk(&self, edges: &EdgeMap, root: Option<Name>) -> Vec<Name> {
        let Some(root) = root else {
            return Vec::new();
        };
        let mut out = Vec::new();
        let mut seen: HashSet<&Name> = HashSet::new();
        let mut queue: VecDeque<&Name> = edges.get(&root).into_iter().flatten().collect();

        while let Some(next) = queue.pop_front() {
            if !seen.insert(next) || *next == root {
                continue;
            }
            out.push(next.clone());
            if let Some(children) = edges.get(next) {
                queue.extend(children);
            }
        }

        out
    }

    pub fn counts(&self) -> RelationshipCounts {
        self.graphs.counts()
    }
}
