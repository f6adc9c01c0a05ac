//! Cross-reference index over compiled classes, interfaces and modules.
//!
//! Units come in as decoded [`nova_classfile::ClassFile`] records and are
//! validated into immutable [`UnitInfo`]s. An [`IndexBuilder`] keeps the
//! relationship graphs (annotation usage, subclasses, subinterfaces,
//! implementors and, optionally, users) up to date on every insert;
//! [`IndexBuilder::finish`] freezes them into a shareable [`Index`], and
//! [`Index::snapshot`] restates an index as a deterministically sorted
//! [`IndexSnapshot`] suitable for persistence.
//!
//! ```
//! use nova_class_index::IndexBuilder;
//! use nova_classfile::ClassFile;
//!
//! let mut builder = IndexBuilder::new();
//! builder.add_unit(&ClassFile::interface("com/example/Greeter")).unwrap();
//! builder
//!     .add_unit(&ClassFile::new("com/example/Hello").implements("com/example/Greeter"))
//!     .unwrap();
//! let index = builder.finish();
//!
//! let implementors: Vec<_> = index.implementors("com.example.Greeter").collect();
//! assert_eq!(implementors.len(), 1);
//! ```
#![forbid(unsafe_code)]

mod annotation;
mod config;
mod error;
mod index;
mod members;
mod merge;
mod modifiers;
mod module;
mod name;
mod snapshot;
mod types;
mod unit;

pub use crate::annotation::{AnnotationInstance, AnnotationTarget, AnnotationValue, Equivalence, Value};
pub use crate::config::{ConfigError, IndexConfig};
pub use crate::error::IndexError;
pub use crate::index::{Edges, Index, IndexBuilder, NameRef, RelationshipCounts};
pub use crate::members::{FieldInfo, LazyIter, LazyView, Member, MethodInfo, RecordComponentInfo};
pub use crate::merge::{MergeOutcome, MergePolicy};
pub use crate::modifiers::{Modifiers, UnitKind};
pub use crate::module::{ModuleInfo, ModuleRequirement, PackageDirective, ServiceProvider};
pub use crate::name::{Name, NameTable};
pub use crate::snapshot::{IndexSnapshot, SNAPSHOT_SCHEMA_VERSION};
pub use crate::types::{PrimitiveType, Type};
pub use crate::unit::{
    FieldInternal, MethodInternal, RecordComponentInternal, UnitInfo, CONSTRUCTOR_NAME,
    MAX_PERMUTED_MEMBERS, STATIC_INITIALIZER_NAME,
};
