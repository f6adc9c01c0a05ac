//! Annotation instances and their two notions of equality.
//!
//! `AnnotationInstance`'s own `Eq`/`Hash` is structural and includes where the
//! annotation is attached. [`Equivalence`] compares only the annotation type and
//! its values, so the same annotation applied to different sites collapses to
//! one entry.

use std::hash::{Hash, Hasher};

use nova_classfile::{Annotation, ConstValue, ElementValue};
use serde::{Deserialize, Serialize};
use smol_str::SmolStr;

use crate::error::IndexError;
use crate::name::{Name, NameTable};
use crate::types::Type;

/// Where an annotation instance is attached.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AnnotationTarget {
    Class(Name),
    Field {
        owner: Name,
        name: SmolStr,
    },
    Method {
        owner: Name,
        name: SmolStr,
        descriptor: SmolStr,
    },
    MethodParameter {
        owner: Name,
        method: SmolStr,
        descriptor: SmolStr,
        position: u16,
    },
    RecordComponent {
        owner: Name,
        name: SmolStr,
    },
    Module(Name),
}

impl AnnotationTarget {
    fn intern_names(&mut self, names: &mut NameTable) {
        match self {
            AnnotationTarget::Class(owner)
            | AnnotationTarget::Module(owner)
            | AnnotationTarget::Field { owner, .. }
            | AnnotationTarget::Method { owner, .. }
            | AnnotationTarget::MethodParameter { owner, .. }
            | AnnotationTarget::RecordComponent { owner, .. } => *owner = names.intern(owner),
        }
    }

    /// The class (or module) the target belongs to.
    pub fn owner(&self) -> &Name {
        match self {
            AnnotationTarget::Class(owner)
            | AnnotationTarget::Module(owner)
            | AnnotationTarget::Field { owner, .. }
            | AnnotationTarget::Method { owner, .. }
            | AnnotationTarget::MethodParameter { owner, .. }
            | AnnotationTarget::RecordComponent { owner, .. } => owner,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AnnotationInstance {
    name: Name,
    /// `None` for annotations nested inside another annotation's values.
    target: Option<AnnotationTarget>,
    values: Vec<AnnotationValue>,
    visible: bool,
}

impl AnnotationInstance {
    pub fn new(name: Name, target: Option<AnnotationTarget>, values: Vec<AnnotationValue>) -> Self {
        Self {
            name,
            target,
            values,
            visible: true,
        }
    }

    pub fn with_visibility(mut self, runtime_visible: bool) -> Self {
        self.visible = runtime_visible;
        self
    }

    /// Convert a decoded annotation, interning every name it mentions.
    pub(crate) fn from_record(
        record: &Annotation,
        target: Option<AnnotationTarget>,
        names: &mut NameTable,
    ) -> Result<Self, IndexError> {
        let internal = record.type_internal_name().ok_or_else(|| IndexError::InvalidName {
            name: record.type_descriptor.clone(),
            reason: "annotation type is not a class descriptor".to_string(),
        })?;
        let name = names.intern_internal(internal)?;

        let values = record
            .elements
            .iter()
            .map(|(element, value)| {
                Ok(AnnotationValue {
                    name: SmolStr::new(element),
                    value: Value::from_record(value, names)?,
                })
            })
            .collect::<Result<Vec<_>, IndexError>>()?;

        Ok(Self {
            name,
            target,
            values,
            visible: record.visible,
        })
    }

    /// The annotation type.
    pub fn name(&self) -> &Name {
        &self.name
    }

    pub fn target(&self) -> Option<&AnnotationTarget> {
        self.target.as_ref()
    }

    pub fn values(&self) -> &[AnnotationValue] {
        &self.values
    }

    pub fn value(&self, name: &str) -> Option<&Value> {
        self.values
            .iter()
            .find(|value| value.name == name)
            .map(|value| &value.value)
    }

    pub fn is_runtime_visible(&self) -> bool {
        self.visible
    }

    /// Swap every name for the table's shared allocation.
    pub(crate) fn intern_names(&mut self, names: &mut NameTable) {
        self.name = names.intern(&self.name);
        if let Some(target) = &mut self.target {
            target.intern_names(names);
        }
        for value in &mut self.values {
            value.value.intern_names(names);
        }
    }

    pub(crate) fn retarget(&self, target: Option<AnnotationTarget>) -> Self {
        Self {
            target,
            ..self.clone()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AnnotationValue {
    pub name: SmolStr,
    pub value: Value,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Value {
    Byte(i8),
    Char(char),
    Short(i16),
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    Boolean(bool),
    String(String),
    Enum { type_name: Name, constant: SmolStr },
    Class(Type),
    Nested(Box<AnnotationInstance>),
    Array(Vec<Value>),
}

impl Value {
    fn from_record(value: &ElementValue, names: &mut NameTable) -> Result<Value, IndexError> {
        Ok(match value {
            ElementValue::Const(constant) => match constant {
                ConstValue::Byte(v) => Value::Byte(*v),
                ConstValue::Char(v) => Value::Char(*v),
                ConstValue::Short(v) => Value::Short(*v),
                ConstValue::Int(v) => Value::Int(*v),
                ConstValue::Long(v) => Value::Long(*v),
                ConstValue::Float(v) => Value::Float(*v),
                ConstValue::Double(v) => Value::Double(*v),
                ConstValue::Boolean(v) => Value::Boolean(*v),
                ConstValue::String(v) => Value::String(v.clone()),
            },
            ElementValue::Enum {
                type_descriptor,
                const_name,
            } => {
                let internal = nova_classfile::descriptor_to_internal_name(type_descriptor)
                    .ok_or_else(|| IndexError::InvalidName {
                        name: type_descriptor.clone(),
                        reason: "enum type is not a class descriptor".to_string(),
                    })?;
                Value::Enum {
                    type_name: names.intern_internal(internal)?,
                    constant: SmolStr::new(const_name),
                }
            }
            ElementValue::Class(descriptor) => Value::Class(Type::from_descriptor(descriptor, names)?),
            ElementValue::Annotation(nested) => Value::Nested(Box::new(
                AnnotationInstance::from_record(nested, None, names)?,
            )),
            ElementValue::Array(values) => Value::Array(
                values
                    .iter()
                    .map(|value| Value::from_record(value, names))
                    .collect::<Result<_, _>>()?,
            ),
        })
    }

    fn intern_names(&mut self, names: &mut NameTable) {
        match self {
            Value::Enum { type_name, .. } => *type_name = names.intern(type_name),
            Value::Class(ty) => ty.intern_names(names),
            Value::Nested(nested) => nested.intern_names(names),
            Value::Array(values) => {
                for value in values {
                    value.intern_names(names);
                }
            }
            Value::Byte(_)
            | Value::Char(_)
            | Value::Short(_)
            | Value::Int(_)
            | Value::Long(_)
            | Value::Float(_)
            | Value::Double(_)
            | Value::Boolean(_)
            | Value::String(_) => {}
        }
    }

    pub fn as_nested(&self) -> Option<&AnnotationInstance> {
        match self {
            Value::Nested(nested) => Some(nested),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Value::Array(values) => Some(values),
            _ => None,
        }
    }
}

// Floats compare by bit pattern so `Eq` and `Hash` agree (NaN == NaN, 0.0 != -0.0).
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Byte(a), Value::Byte(b)) => a == b,
            (Value::Char(a), Value::Char(b)) => a == b,
            (Value::Short(a), Value::Short(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Long(a), Value::Long(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a.to_bits() == b.to_bits(),
            (Value::Double(a), Value::Double(b)) => a.to_bits() == b.to_bits(),
            (Value::Boolean(a), Value::Boolean(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (
                Value::Enum {
                    type_name: a_ty,
                    constant: a_const,
                },
                Value::Enum {
                    type_name: b_ty,
                    constant: b_const,
                },
            ) => a_ty == b_ty && a_const == b_const,
            (Value::Class(a), Value::Class(b)) => a == b,
            (Value::Nested(a), Value::Nested(b)) => a == b,
            (Value::Array(a), Value::Array(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for Value {}

impl Hash for Value {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            Value::Byte(v) => v.hash(state),
            Value::Char(v) => v.hash(state),
            Value::Short(v) => v.hash(state),
            Value::Int(v) => v.hash(state),
            Value::Long(v) => v.hash(state),
            Value::Float(v) => v.to_bits().hash(state),
            Value::Double(v) => v.to_bits().hash(state),
            Value::Boolean(v) => v.hash(state),
            Value::String(v) => v.hash(state),
            Value::Enum {
                type_name,
                constant,
            } => {
                type_name.hash(state);
                constant.hash(state);
            }
            Value::Class(ty) => ty.hash(state),
            Value::Nested(nested) => nested.hash(state),
            Value::Array(values) => values.hash(state),
        }
    }
}

/// Target-independent view of an annotation instance.
///
/// Two proxies are equal when their instances have the same annotation type and
/// pairwise-equal values; the attachment site and retention are ignored.
#[derive(Debug, Clone, Copy)]
pub struct Equivalence<'a> {
    instance: &'a AnnotationInstance,
}

impl<'a> Equivalence<'a> {
    pub fn new(instance: &'a AnnotationInstance) -> Self {
        Self { instance }
    }

    pub fn name(&self) -> &'a Name {
        &self.instance.name
    }

    pub fn values(&self) -> &'a [AnnotationValue] {
        &self.instance.values
    }
}

impl PartialEq for Equivalence<'_> {
    fn eq(&self, other: &Self) -> bool {
        let (a, b) = (self.instance, other.instance);
        std::ptr::eq(a, b)
            || (a.name == b.name
                && a.values.len() == b.values.len()
                && a.values.iter().zip(&b.values).all(|(x, y)| x == y))
    }
}

impl Eq for Equivalence<'_> {}

impl Hash for Equivalence<'_> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.instance.name.hash(state);
        self.instance.values.hash(state);
    }
}
