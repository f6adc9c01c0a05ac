use std::fmt;

use nova_classfile::{BaseType, FieldType, ReturnType};
use serde::{Deserialize, Serialize};

use crate::error::IndexError;
use crate::name::{Name, NameTable};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PrimitiveType {
    Byte,
    Char,
    Double,
    Float,
    Int,
    Long,
    Short,
    Boolean,
}

impl PrimitiveType {
    pub fn keyword(self) -> &'static str {
        match self {
            PrimitiveType::Byte => "byte",
            PrimitiveType::Char => "char",
            PrimitiveType::Double => "double",
            PrimitiveType::Float => "float",
            PrimitiveType::Int => "int",
            PrimitiveType::Long => "long",
            PrimitiveType::Short => "short",
            PrimitiveType::Boolean => "boolean",
        }
    }
}

impl From<BaseType> for PrimitiveType {
    fn from(value: BaseType) -> Self {
        match value {
            BaseType::Byte => PrimitiveType::Byte,
            BaseType::Char => PrimitiveType::Char,
            BaseType::Double => PrimitiveType::Double,
            BaseType::Float => PrimitiveType::Float,
            BaseType::Int => PrimitiveType::Int,
            BaseType::Long => PrimitiveType::Long,
            BaseType::Short => PrimitiveType::Short,
            BaseType::Boolean => PrimitiveType::Boolean,
        }
    }
}

/// An erased type as it appears in descriptors, with class names interned.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Type {
    Void,
    Primitive(PrimitiveType),
    Class(Name),
    Array { dimensions: u8, element: Box<Type> },
}

impl Type {
    pub(crate) fn from_field_type(ty: &FieldType<'_>, names: &mut NameTable) -> Result<Type, IndexError> {
        Ok(match ty {
            FieldType::Base(base) => Type::Primitive((*base).into()),
            FieldType::Object(internal) => Type::Class(names.intern_internal(internal)?),
            FieldType::Array {
                dimensions,
                element,
            } => Type::Array {
                dimensions: *dimensions,
                element: Box::new(Type::from_field_type(element, names)?),
            },
        })
    }

    pub(crate) fn from_return_type(ty: &ReturnType<'_>, names: &mut NameTable) -> Result<Type, IndexError> {
        match ty {
            ReturnType::Void => Ok(Type::Void),
            ReturnType::Type(ty) => Type::from_field_type(ty, names),
        }
    }

    /// Parse a field descriptor, or `V`, as used by annotation class literals.
    pub(crate) fn from_descriptor(desc: &str, names: &mut NameTable) -> Result<Type, IndexError> {
        if desc == "V" {
            return Ok(Type::Void);
        }
        let parsed = nova_classfile::parse_field_descriptor(desc)?;
        Type::from_field_type(&parsed, names)
    }

    pub(crate) fn intern_names(&mut self, names: &mut NameTable) {
        match self {
            Type::Class(name) => *name = names.intern(name),
            Type::Array { element, .. } => element.intern_names(names),
            Type::Void | Type::Primitive(_) => {}
        }
    }

    /// The class name for class types and arrays of class types.
    pub fn class_name(&self) -> Option<&Name> {
        match self {
            Type::Class(name) => Some(name),
            Type::Array { element, .. } => element.class_name(),
            Type::Void | Type::Primitive(_) => None,
        }
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Type::Void => f.write_str("void"),
            Type::Primitive(primitive) => f.write_str(primitive.keyword()),
            Type::Class(name) => write!(f, "{name}"),
            Type::Array {
                dimensions,
                element,
            } => {
                write!(f, "{element}")?;
                for _ in 0..*dimensions {
                    f.write_str("[]")?;
                }
                Ok(())
            }
        }
    }
}
