//! Decoded class-file records.
//!
//! The byte-level decoder lives elsewhere; this crate defines the records it
//! hands over (constant pool already resolved), plus the pieces of decoding that
//! consumers still need: descriptor parsing and modified UTF-8.
#![forbid(unsafe_code)]

mod annotation;
mod classfile;
mod descriptor;
mod error;
mod module_info;
mod utf8;

pub use crate::annotation::{descriptor_to_internal_name, Annotation, ConstValue, ElementValue};
pub use crate::classfile::{
    ClassFile, ClassMember, RecordComponent, ACC_ABSTRACT, ACC_ANNOTATION, ACC_ENUM, ACC_FINAL,
    ACC_INTERFACE, ACC_MODULE, ACC_PUBLIC, ACC_SUPER, ACC_SYNTHETIC,
};
pub use crate::descriptor::{parse_field_descriptor, parse_method_descriptor};
pub use crate::descriptor::{BaseType, FieldType, MethodDescriptor, ReturnType, MAX_ARRAY_DIMENSIONS};
pub use crate::error::{Error, Result};
pub use crate::module_info::{
    ModuleDescriptor, ModulePackage, ModuleProvides, ModuleRequires, ACC_OPEN, ACC_STATIC_PHASE,
    ACC_TRANSITIVE,
};
pub use crate::utf8::{decode_modified_utf8, is_ascii_only, is_ascii_only_scalar, is_ascii_span};
