//! On-demand member handles over a unit's compact member arrays.
//!
//! Units store members as plain records that do not know their declaring
//! class. A [`LazyView`] pairs such an array with its owning [`UnitInfo`] and
//! builds a fresh [`Member`] handle for every access, so the only memory a unit
//! holds is its record arrays no matter how often it is inspected.

use std::iter::FusedIterator;

use crate::annotation::{AnnotationInstance, AnnotationTarget};
use crate::modifiers::Modifiers;
use crate::name::Name;
use crate::types::Type;
use crate::unit::{
    FieldInternal, MethodInternal, RecordComponentInternal, UnitInfo, CONSTRUCTOR_NAME,
    MAX_PERMUTED_MEMBERS, STATIC_INITIALIZER_NAME,
};

/// Read-only sequence of member handles.
///
/// Without a permutation, index `i` maps to record `i`. With one, index `i`
/// maps to record `permutation[i]`.
pub struct LazyView<'a, R> {
    owner: &'a UnitInfo,
    records: &'a [R],
    permutation: Option<&'a [u8]>,
}

impl<'a, R> LazyView<'a, R> {
    pub(crate) fn new(owner: &'a UnitInfo, records: &'a [R]) -> Self {
        Self {
            owner,
            records,
            permutation: None,
        }
    }

    pub(crate) fn permuted(owner: &'a UnitInfo, records: &'a [R], permutation: &'a [u8]) -> Self {
        debug_assert_eq!(permutation.len(), records.len());
        debug_assert!(records.len() <= MAX_PERMUTED_MEMBERS);
        Self {
            owner,
            records,
            permutation: Some(permutation),
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn declaring_class(&self) -> &'a UnitInfo {
        self.owner
    }

    pub fn get(&self, index: usize) -> Option<Member<'a, R>> {
        let slot = match self.permutation {
            None => index,
            Some(table) => usize::from(*table.get(index)?),
        };
        self.records.get(slot).map(|record| Member {
            owner: self.owner,
            record,
        })
    }

    pub fn iter(&self) -> LazyIter<'a, R> {
        LazyIter {
            view: *self,
            front: 0,
            back: self.len(),
        }
    }
}

impl<R> Clone for LazyView<'_, R> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<R> Copy for LazyView<'_, R> {}

impl<R> std::fmt::Debug for LazyView<'_, R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LazyView")
            .field("owner", self.owner.name())
            .field("len", &self.records.len())
            .field("permuted", &self.permutation.is_some())
            .finish()
    }
}

impl<'a, R> IntoIterator for LazyView<'a, R> {
    type Item = Member<'a, R>;
    type IntoIter = LazyIter<'a, R>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

pub struct LazyIter<'a, R> {
    view: LazyView<'a, R>,
    front: usize,
    back: usize,
}

impl<'a, R> Iterator for LazyIter<'a, R> {
    type Item = Member<'a, R>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.front >= self.back {
            return None;
        }
        let item = self.view.get(self.front);
        self.front += 1;
        item
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.back - self.front;
        (remaining, Some(remaining))
    }
}

impl<R> DoubleEndedIterator for LazyIter<'_, R> {
    fn next_back(&mut self) -> Option<Self::Item> {
        if self.front >= self.back {
            return None;
        }
        self.back -= 1;
        self.view.get(self.back)
    }
}

impl<R> ExactSizeIterator for LazyIter<'_, R> {}

impl<R> FusedIterator for LazyIter<'_, R> {}

/// A member record paired with its declaring unit.
pub struct Member<'a, R> {
    owner: &'a UnitInfo,
    record: &'a R,
}

pub type MethodInfo<'a> = Member<'a, MethodInternal>;
pub type FieldInfo<'a> = Member<'a, FieldInternal>;
pub type RecordComponentInfo<'a> = Member<'a, RecordComponentInternal>;

impl<'a, R> Member<'a, R> {
    pub(crate) fn new(owner: &'a UnitInfo, record: &'a R) -> Self {
        Self { owner, record }
    }

    pub fn declaring_class(&self) -> &'a UnitInfo {
        self.owner
    }

    /// The compact record behind this handle.
    pub fn internal(&self) -> &'a R {
        self.record
    }
}

impl<R> Clone for Member<'_, R> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<R> Copy for Member<'_, R> {}

/// Handles are equal when they wrap the same record of the same unit.
impl<R: PartialEq> PartialEq for Member<'_, R> {
    fn eq(&self, other: &Self) -> bool {
        self.owner.name() == other.owner.name() && self.record == other.record
    }
}

impl<R: std::fmt::Debug> std::fmt::Debug for Member<'_, R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Member")
            .field("owner", self.owner.name())
            .field("record", self.record)
            .finish()
    }
}

impl<'a> Member<'a, MethodInternal> {
    pub fn name(&self) -> &'a str {
        &self.record.name
    }

    pub fn descriptor(&self) -> &'a str {
        &self.record.descriptor
    }

    pub fn flags(&self) -> Modifiers {
        self.record.flags
    }

    pub fn parameters(&self) -> &'a [Type] {
        &self.record.parameters
    }

    pub fn return_type(&self) -> &'a Type {
        &self.record.return_type
    }

    pub fn signature(&self) -> Option<&'a str> {
        self.record.signature.as_deref()
    }

    /// Parameter name from `MethodParameters`, if the class file recorded one.
    pub fn parameter_name(&self, position: usize) -> Option<&'a str> {
        self.record.parameter_names.get(position).map(|n| n.as_str())
    }

    pub fn is_constructor(&self) -> bool {
        self.name() == CONSTRUCTOR_NAME
    }

    pub fn is_static_initializer(&self) -> bool {
        self.name() == STATIC_INITIALIZER_NAME
    }

    /// Annotations on the method itself.
    pub fn annotations(&self) -> impl Iterator<Item = &'a AnnotationInstance> + 'a {
        self.record
            .annotations
            .iter()
            .filter(|a| matches!(a.target(), Some(AnnotationTarget::Method { .. })))
    }

    pub fn annotation(&self, name: &Name) -> Option<&'a AnnotationInstance> {
        self.annotations().find(|a| a.name() == name)
    }

    pub fn parameter_annotations(&self, position: u16) -> impl Iterator<Item = &'a AnnotationInstance> + 'a {
        self.record.annotations.iter().filter(move |a| {
            matches!(
                a.target(),
                Some(AnnotationTarget::MethodParameter { position: p, .. }) if *p == position
            )
        })
    }

    /// Method and parameter annotations together.
    pub fn all_annotations(&self) -> &'a [AnnotationInstance] {
        &self.record.annotations
    }
}

impl<'a> Member<'a, FieldInternal> {
    pub fn name(&self) -> &'a str {
        &self.record.name
    }

    pub fn descriptor(&self) -> &'a str {
        &self.record.descriptor
    }

    pub fn flags(&self) -> Modifiers {
        self.record.flags
    }

    pub fn ty(&self) -> &'a Type {
        &self.record.ty
    }

    pub fn signature(&self) -> Option<&'a str> {
        self.record.signature.as_deref()
    }

    /// Whether this field is an enum constant of its (enum) declaring class.
    pub fn is_enum_constant(&self) -> bool {
        self.flags().is_enum()
    }

    pub fn annotations(&self) -> &'a [AnnotationInstance] {
        &self.record.annotations
    }

    pub fn annotation(&self, name: &Name) -> Option<&'a AnnotationInstance> {
        self.record.annotations.iter().find(|a| a.name() == name)
    }
}

impl<'a> Member<'a, RecordComponentInternal> {
    pub fn name(&self) -> &'a str {
        &self.record.name
    }

    pub fn descriptor(&self) -> &'a str {
        &self.record.descriptor
    }

    pub fn ty(&self) -> &'a Type {
        &self.record.ty
    }

    pub fn signature(&self) -> Option<&'a str> {
        self.record.signature.as_deref()
    }

    pub fn annotations(&self) -> &'a [AnnotationInstance] {
        &self.record.annotations
    }

    /// The backing field of the same name.
    pub fn field(&self) -> Option<FieldInfo<'a>> {
        self.owner.field(self.name())
    }

    /// The accessor method of the same name.
    pub fn accessor(&self) -> Option<MethodInfo<'a>> {
        self.owner.method(self.name(), &[])
    }
}
