use std::cmp::Ordering;

use nova_classfile::{ClassFile, ClassMember, RecordComponent};
use serde::{Deserialize, Deserializer, Serialize};
use smol_str::SmolStr;

use crate::annotation::{AnnotationInstance, AnnotationTarget};
use crate::error::IndexError;
use crate::members::{FieldInfo, LazyView, MethodInfo, RecordComponentInfo};
use crate::modifiers::{Modifiers, UnitKind};
use crate::name::{Name, NameTable};
use crate::types::Type;

/// Number of members addressable through a `u8` permutation table.
pub const MAX_PERMUTED_MEMBERS: usize = u8::MAX as usize + 1;

pub const CONSTRUCTOR_NAME: &str = "<init>";
pub const STATIC_INITIALIZER_NAME: &str = "<clinit>";

/// Compact method record, not linked to its declaring unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MethodInternal {
    pub(crate) name: SmolStr,
    pub(crate) descriptor: SmolStr,
    pub(crate) parameters: Box<[Type]>,
    pub(crate) return_type: Type,
    pub(crate) flags: Modifiers,
    pub(crate) signature: Option<Box<str>>,
    pub(crate) parameter_names: Box<[SmolStr]>,
    /// Method and parameter annotations.
    pub(crate) annotations: Box<[AnnotationInstance]>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldInternal {
    pub(crate) name: SmolStr,
    pub(crate) descriptor: SmolStr,
    pub(crate) ty: Type,
    pub(crate) flags: Modifiers,
    pub(crate) signature: Option<Box<str>>,
    pub(crate) annotations: Box<[AnnotationInstance]>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordComponentInternal {
    pub(crate) name: SmolStr,
    pub(crate) descriptor: SmolStr,
    pub(crate) ty: Type,
    pub(crate) signature: Option<Box<str>>,
    pub(crate) annotations: Box<[AnnotationInstance]>,
}

pub(crate) trait MemberRecord {
    fn name(&self) -> &str;
    fn descriptor(&self) -> &str;
    fn intern_names(&mut self, names: &mut NameTable);

    fn sort_key(&self, other: &Self) -> Ordering {
        self.name()
            .cmp(other.name())
            .then_with(|| self.descriptor().cmp(other.descriptor()))
    }
}

impl MemberRecord for MethodInternal {
    fn name(&self) -> &str {
        &self.name
    }
    fn descriptor(&self) -> &str {
        &self.descriptor
    }
    fn intern_names(&mut self, names: &mut NameTable) {
        for parameter in self.parameters.iter_mut() {
            parameter.intern_names(names);
        }
        self.return_type.intern_names(names);
        intern_annotations(&mut self.annotations, names);
    }
}

impl MemberRecord for FieldInternal {
    fn name(&self) -> &str {
        &self.name
    }
    fn descriptor(&self) -> &str {
        &self.descriptor
    }
    fn intern_names(&mut self, names: &mut NameTable) {
        self.ty.intern_names(names);
        intern_annotations(&mut self.annotations, names);
    }
}

impl MemberRecord for RecordComponentInternal {
    fn name(&self) -> &str {
        &self.name
    }
    fn descriptor(&self) -> &str {
        &self.descriptor
    }
    fn intern_names(&mut self, names: &mut NameTable) {
        self.ty.intern_names(names);
        intern_annotations(&mut self.annotations, names);
    }
}

fn intern_annotations(annotations: &mut [AnnotationInstance], names: &mut NameTable) {
    for annotation in annotations {
        annotation.intern_names(names);
    }
}

/// A unit's member array plus how to recover declaration order.
///
/// Deserialization goes through [`MemberTable::from_parts`], so a loaded table
/// upholds the same ordering guarantees as one built from declared members.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub(crate) struct MemberTable<R> {
    records: Box<[R]>,
    order: MemberOrder,
}

#[derive(Deserialize)]
struct RawMemberTable<R> {
    records: Box<[R]>,
    order: MemberOrder,
}

impl<'de, R> Deserialize<'de> for MemberTable<R>
where
    R: MemberRecord + Deserialize<'de>,
{
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = RawMemberTable::<R>::deserialize(deserializer)?;
        MemberTable::from_parts(raw.records, raw.order).map_err(serde::de::Error::custom)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
enum MemberOrder {
    /// `records` is sorted by (name, descriptor); `declaration[i]` is the sorted
    /// slot of the i-th declared member.
    Sorted { declaration: Box<[u8]> },
    /// Too many members for a `u8` table: `records` stays in declaration order.
    Declared,
}

impl<R: MemberRecord> MemberTable<R> {
    pub(crate) fn from_declared(owner: &Name, kind: &'static str, records: Vec<R>) -> Self {
        if records.len() > MAX_PERMUTED_MEMBERS {
            tracing::debug!(
                target = "nova.class_index",
                unit = %owner,
                kind,
                count = records.len(),
                "member count exceeds permutation table; keeping declaration order"
            );
            return Self {
                records: records.into_boxed_slice(),
                order: MemberOrder::Declared,
            };
        }

        let mut slots: Vec<usize> = (0..records.len()).collect();
        slots.sort_by(|&a, &b| records[a].sort_key(&records[b]));

        let mut declaration = vec![0u8; records.len()];
        for (sorted, &declared) in slots.iter().enumerate() {
            // `sorted < MAX_PERMUTED_MEMBERS`, so it fits in a byte.
            declaration[declared] = sorted as u8;
        }

        let mut records: Vec<Option<R>> = records.into_iter().map(Some).collect();
        let sorted: Vec<R> = slots
            .iter()
            .filter_map(|&declared| records[declared].take())
            .collect();

        Self {
            records: sorted.into_boxed_slice(),
            order: MemberOrder::Sorted {
                declaration: declaration.into_boxed_slice(),
            },
        }
    }

    /// Check a stored table: sorted records with a bijective `u8` table, or
    /// more records than such a table can address.
    fn from_parts(records: Box<[R]>, order: MemberOrder) -> Result<Self, String> {
        match &order {
            MemberOrder::Sorted { declaration } => {
                if records.len() > MAX_PERMUTED_MEMBERS {
                    return Err(format!(
                        "{} members cannot be addressed by a declaration table",
                        records.len()
                    ));
                }
                if declaration.len() != records.len() {
                    return Err(format!(
                        "declaration table has {} slots for {} members",
                        declaration.len(),
                        records.len()
                    ));
                }
                let mut seen = vec![false; records.len()];
                for &slot in declaration.iter() {
                    let Some(slot_seen) = seen.get_mut(usize::from(slot)) else {
                        return Err(format!("declaration slot {slot} is out of range"));
                    };
                    if std::mem::replace(slot_seen, true) {
                        return Err(format!("declaration table repeats slot {slot}"));
                    }
                }
                if records.windows(2).any(|pair| pair[0].sort_key(&pair[1]) == Ordering::Greater) {
                    return Err("members are not sorted by name and descriptor".to_string());
                }
            }
            MemberOrder::Declared => {
                if records.len() <= MAX_PERMUTED_MEMBERS {
                    return Err(format!("{} members stored without a declaration table", records.len()));
                }
            }
        }
        Ok(Self { records, order })
    }

    fn intern_names(&mut self, names: &mut NameTable) {
        for record in self.records.iter_mut() {
            record.intern_names(names);
        }
    }

    pub(crate) fn records(&self) -> &[R] {
        &self.records
    }

    pub(crate) fn declaration_order(&self) -> Option<&[u8]> {
        match &self.order {
            MemberOrder::Sorted { declaration } => Some(declaration),
            MemberOrder::Declared => None,
        }
    }

    /// Records that may be named `name`: exactly those when sorted (found by
    /// binary search), every record otherwise. Callers still filter by name.
    pub(crate) fn candidates(&self, name: &str) -> &[R] {
        match self.order {
            MemberOrder::Sorted { .. } => {
                let start = self.records.partition_point(|r| r.name() < name);
                let end = start + self.records[start..].partition_point(|r| r.name() == name);
                &self.records[start..end]
            }
            MemberOrder::Declared => &self.records,
        }
    }
}

/// One compiled class, interface, enum, record or annotation type.
///
/// Immutable once built; relationship edges live in the index, not here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitInfo {
    name: Name,
    flags: Modifiers,
    super_name: Option<Name>,
    interfaces: Box<[Name]>,
    signature: Option<Box<str>>,
    annotations: Box<[AnnotationInstance]>,
    pub(crate) fields: MemberTable<FieldInternal>,
    pub(crate) methods: MemberTable<MethodInternal>,
    pub(crate) record_components: MemberTable<RecordComponentInternal>,
    referenced: Box<[Name]>,
}

impl UnitInfo {
    /// Validate and convert a decoded class file.
    ///
    /// Fails without producing a unit if any name, descriptor or annotation in
    /// the record is malformed.
    pub fn from_class_file(record: &ClassFile, names: &mut NameTable) -> Result<Self, IndexError> {
        let unit = record.this_class.as_str();
        if unit.is_empty() {
            return Err(IndexError::invalid_record("<unnamed>", "missing class name"));
        }
        let flags = Modifiers::new(record.access_flags);
        if flags.is_module() {
            return Err(IndexError::invalid_record(unit, "module-info is not a class unit"));
        }
        let context = |err: IndexError| match err {
            IndexError::InvalidRecord { .. } => err,
            other => IndexError::invalid_record(unit, other.to_string()),
        };

        let name = names.intern_internal(unit).map_err(context)?;
        let super_name = record
            .super_class
            .as_deref()
            .map(|s| names.intern_internal(s))
            .transpose()
            .map_err(context)?;
        let interfaces = record
            .interfaces
            .iter()
            .map(|i| names.intern_internal(i))
            .collect::<Result<Vec<_>, _>>()
            .map_err(context)?;

        let annotations = convert_annotations(
            &record.annotations,
            &AnnotationTarget::Class(name.clone()),
            names,
        )
        .map_err(context)?;

        let fields = record
            .fields
            .iter()
            .map(|f| convert_field(&name, f, names))
            .collect::<Result<Vec<_>, _>>()
            .map_err(context)?;
        let methods = record
            .methods
            .iter()
            .map(|m| convert_method(&name, m, names))
            .collect::<Result<Vec<_>, _>>()
            .map_err(context)?;
        let record_components = record
            .record_components
            .iter()
            .map(|c| convert_record_component(&name, c, names))
            .collect::<Result<Vec<_>, _>>()
            .map_err(context)?;

        let mut referenced = Vec::with_capacity(record.referenced_classes.len());
        for class in &record.referenced_classes {
            // Array descriptors show up as CONSTANT_Class entries too.
            let referenced_name = if class.starts_with('[') {
                match Type::from_descriptor(class, names).map_err(context)? {
                    Type::Array { element, .. } => match *element {
                        Type::Class(name) => name,
                        _ => continue,
                    },
                    _ => continue,
                }
            } else {
                names.intern_internal(class).map_err(context)?
            };
            if referenced_name != name && !referenced.contains(&referenced_name) {
                referenced.push(referenced_name);
            }
        }

        Ok(Self {
            fields: MemberTable::from_declared(&name, "field", fields),
            methods: MemberTable::from_declared(&name, "method", methods),
            record_components: MemberTable::from_declared(&name, "record component", record_components),
            name,
            flags,
            super_name,
            interfaces: interfaces.into_boxed_slice(),
            signature: record.signature.as_deref().map(Box::from),
            annotations: annotations.into_boxed_slice(),
            referenced: referenced.into_boxed_slice(),
        })
    }

    /// Swap every name in the unit for the table's shared allocation.
    pub(crate) fn intern_names(&mut self, names: &mut NameTable) {
        self.name = names.intern(&self.name);
        if let Some(super_name) = &mut self.super_name {
            *super_name = names.intern(super_name);
        }
        for name in self.interfaces.iter_mut().chain(self.referenced.iter_mut()) {
            *name = names.intern(name);
        }
        intern_annotations(&mut self.annotations, names);
        self.fields.intern_names(names);
        self.methods.intern_names(names);
        self.record_components.intern_names(names);
    }

    pub fn name(&self) -> &Name {
        &self.name
    }

    pub fn flags(&self) -> Modifiers {
        self.flags
    }

    pub fn kind(&self) -> UnitKind {
        if self.flags.is_annotation() {
            UnitKind::Annotation
        } else if self.flags.is_interface() {
            UnitKind::Interface
        } else if self.flags.is_enum() {
            UnitKind::Enum
        } else if !self.record_components.records().is_empty()
            || self
                .super_name
                .as_ref()
                .is_some_and(|s| s.components() == ["java", "lang", "Record"])
        {
            UnitKind::Record
        } else {
            UnitKind::Class
        }
    }

    pub fn is_interface(&self) -> bool {
        self.flags.is_interface()
    }

    pub fn super_name(&self) -> Option<&Name> {
        self.super_name.as_ref()
    }

    pub fn interface_names(&self) -> &[Name] {
        &self.interfaces
    }

    /// Raw generic signature, if the class declares one.
    pub fn signature(&self) -> Option<&str> {
        self.signature.as_deref()
    }

    /// Class-level annotations.
    pub fn annotations(&self) -> &[AnnotationInstance] {
        &self.annotations
    }

    pub fn annotation(&self, name: &Name) -> Option<&AnnotationInstance> {
        self.annotations.iter().find(|a| a.name() == name)
    }

    /// Every annotation instance inside this unit: class, fields, methods and
    /// their parameters, and record components.
    pub fn annotation_usages(&self) -> impl Iterator<Item = &AnnotationInstance> + '_ {
        self.annotations
            .iter()
            .chain(self.fields.records().iter().flat_map(|f| f.annotations.iter()))
            .chain(self.methods.records().iter().flat_map(|m| m.annotations.iter()))
            .chain(
                self.record_components
                    .records()
                    .iter()
                    .flat_map(|c| c.annotations.iter()),
            )
    }

    /// Classes this unit's constant pool refers to (excluding itself).
    pub fn referenced_names(&self) -> &[Name] {
        &self.referenced
    }

    /// Methods sorted by name and descriptor (declaration order past 256 methods).
    pub fn methods(&self) -> LazyView<'_, MethodInternal> {
        LazyView::new(self, self.methods.records())
    }

    /// Methods in declaration order.
    pub fn unsorted_methods(&self) -> LazyView<'_, MethodInternal> {
        unsorted(self, &self.methods)
    }

    pub fn fields(&self) -> LazyView<'_, FieldInternal> {
        LazyView::new(self, self.fields.records())
    }

    pub fn unsorted_fields(&self) -> LazyView<'_, FieldInternal> {
        unsorted(self, &self.fields)
    }

    pub fn record_components(&self) -> LazyView<'_, RecordComponentInternal> {
        LazyView::new(self, self.record_components.records())
    }

    pub fn unsorted_record_components(&self) -> LazyView<'_, RecordComponentInternal> {
        unsorted(self, &self.record_components)
    }

    /// The method `name` whose erased parameter types are `parameters`.
    pub fn method(&self, name: &str, parameters: &[Type]) -> Option<MethodInfo<'_>> {
        self.methods
            .candidates(name)
            .iter()
            .find(|m| m.name.as_str() == name && &*m.parameters == parameters)
            .map(|record| MethodInfo::new(self, record))
    }

    /// The first method called `name` in storage order.
    pub fn first_method(&self, name: &str) -> Option<MethodInfo<'_>> {
        self.methods
            .candidates(name)
            .iter()
            .find(|m| m.name.as_str() == name)
            .map(|record| MethodInfo::new(self, record))
    }

    pub fn constructors(&self) -> impl Iterator<Item = MethodInfo<'_>> + '_ {
        self.methods
            .candidates(CONSTRUCTOR_NAME)
            .iter()
            .filter(|m| m.name.as_str() == CONSTRUCTOR_NAME)
            .map(move |record| MethodInfo::new(self, record))
    }

    pub fn field(&self, name: &str) -> Option<FieldInfo<'_>> {
        self.fields
            .candidates(name)
            .iter()
            .find(|f| f.name.as_str() == name)
            .map(|record| FieldInfo::new(self, record))
    }

    pub fn record_component(&self, name: &str) -> Option<RecordComponentInfo<'_>> {
        self.record_components
            .candidates(name)
            .iter()
            .find(|c| c.name.as_str() == name)
            .map(|record| RecordComponentInfo::new(self, record))
    }
}

fn unsorted<'a, R>(owner: &'a UnitInfo, table: &'a MemberTable<R>) -> LazyView<'a, R>
where
    R: MemberRecord,
{
    match table.declaration_order() {
        Some(order) => LazyView::permuted(owner, table.records(), order),
        None => LazyView::new(owner, table.records()),
    }
}

fn convert_annotations(
    records: &[nova_classfile::Annotation],
    target: &AnnotationTarget,
    names: &mut NameTable,
) -> Result<Vec<AnnotationInstance>, IndexError> {
    records
        .iter()
        .map(|a| AnnotationInstance::from_record(a, Some(target.clone()), names))
        .collect()
}

fn convert_field(owner: &Name, field: &ClassMember, names: &mut NameTable) -> Result<FieldInternal, IndexError> {
    let parsed = nova_classfile::parse_field_descriptor(&field.descriptor)?;
    let ty = Type::from_field_type(&parsed, names)?;
    let name = SmolStr::new(&field.name);
    let target = AnnotationTarget::Field {
        owner: owner.clone(),
        name: name.clone(),
    };
    Ok(FieldInternal {
        annotations: convert_annotations(&field.annotations, &target, names)?.into_boxed_slice(),
        descriptor: SmolStr::new(&field.descriptor),
        ty,
        flags: Modifiers::new(field.access_flags),
        signature: field.signature.as_deref().map(Box::from),
        name,
    })
}

fn convert_method(owner: &Name, method: &ClassMember, names: &mut NameTable) -> Result<MethodInternal, IndexError> {
    if method.name.is_empty() {
        return Err(IndexError::invalid_record(owner.to_dotted(), "method without a name"));
    }
    let parsed = nova_classfile::parse_method_descriptor(&method.descriptor)?;
    let parameters = parsed
        .params
        .iter()
        .map(|p| Type::from_field_type(p, names))
        .collect::<Result<Vec<_>, _>>()?;
    let return_type = Type::from_return_type(&parsed.return_type, names)?;

    if method.parameter_annotations.len() > parameters.len() {
        return Err(IndexError::invalid_record(
            owner.to_dotted(),
            format!(
                "method {}{} has more parameter annotation entries than parameters",
                method.name, method.descriptor
            ),
        ));
    }

    let name = SmolStr::new(&method.name);
    let descriptor = SmolStr::new(&method.descriptor);
    let mut annotations = convert_annotations(
        &method.annotations,
        &AnnotationTarget::Method {
            owner: owner.clone(),
            name: name.clone(),
            descriptor: descriptor.clone(),
        },
        names,
    )?;
    for (position, parameter) in method.parameter_annotations.iter().enumerate() {
        let target = AnnotationTarget::MethodParameter {
            owner: owner.clone(),
            method: name.clone(),
            descriptor: descriptor.clone(),
            // Descriptors cap out at 255 parameter slots.
            position: position as u16,
        };
        annotations.extend(convert_annotations(parameter, &target, names)?);
    }

    Ok(MethodInternal {
        name,
        descriptor,
        parameters: parameters.into_boxed_slice(),
        return_type,
        flags: Modifiers::new(method.access_flags),
        signature: method.signature.as_deref().map(Box::from),
        parameter_names: method.parameter_names.iter().map(SmolStr::new).collect(),
        annotations: annotations.into_boxed_slice(),
    })
}

fn convert_record_component(
    owner: &Name,
    component: &RecordComponent,
    names: &mut NameTable,
) -> Result<RecordComponentInternal, IndexError> {
    let parsed = nova_classfile::parse_field_descriptor(&component.descriptor)?;
    let ty = Type::from_field_type(&parsed, names)?;
    let name = SmolStr::new(&component.name);
    let target = AnnotationTarget::RecordComponent {
        owner: owner.clone(),
        name: name.clone(),
    };
    Ok(RecordComponentInternal {
        annotations: convert_annotations(&component.annotations, &target, names)?.into_boxed_slice(),
        descriptor: SmolStr::new(&component.descriptor),
        ty,
        signature: component.signature.as_deref().map(Box::from),
        name,
    })
}
