use thiserror::Error;

use crate::name::Name;

#[derive(Debug, Error)]
pub enum IndexError {
    #[error("invalid name `{name}`: {reason}")]
    InvalidName { name: String, reason: String },
    #[error("invalid record `{unit}`: {reason}")]
    InvalidRecord { unit: String, reason: String },
    #[error("classfile error: {0}")]
    ClassFile(#[from] nova_classfile::Error),
    #[error("merge conflict on {} unit(s): {}", .names.len(), render_names(.names))]
    MergeConflict { names: Vec<Name> },
    #[error("incompatible snapshot: expected schema {expected}, found {found}")]
    IncompatibleSnapshot { expected: u32, found: u32 },
    #[error("not a snapshot file (bad magic)")]
    BadMagic,
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("bincode error: {0}")]
    Bincode(#[from] Box<bincode::ErrorKind>),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

impl IndexError {
    pub(crate) fn invalid_record(unit: impl Into<String>, reason: impl Into<String>) -> Self {
        IndexError::InvalidRecord {
            unit: unit.into(),
            reason: reason.into(),
        }
    }
}

fn render_names(names: &[Name]) -> String {
    names
        .iter()
        .map(Name::to_dotted)
        .collect::<Vec<_>>()
        .join(", ")
}
