use std::fmt;

use serde::{Deserialize, Serialize};

/// Access flags of a class, member, or module directive.
///
/// Several JVM flags share a bit and mean different things depending on what
/// they are attached to (`SUPER`/`SYNCHRONIZED`, `VOLATILE`/`BRIDGE`, ...).
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Modifiers(u16);

impl Modifiers {
    pub const PUBLIC: u16 = 0x0001;
    pub const PRIVATE: u16 = 0x0002;
    pub const PROTECTED: u16 = 0x0004;
    pub const STATIC: u16 = 0x0008;
    pub const FINAL: u16 = 0x0010;
    pub const SUPER: u16 = 0x0020;
    pub const SYNCHRONIZED: u16 = 0x0020;
    pub const VOLATILE: u16 = 0x0040;
    pub const BRIDGE: u16 = 0x0040;
    pub const TRANSIENT: u16 = 0x0080;
    pub const VARARGS: u16 = 0x0080;
    pub const NATIVE: u16 = 0x0100;
    pub const INTERFACE: u16 = 0x0200;
    pub const ABSTRACT: u16 = 0x0400;
    pub const STRICT: u16 = 0x0800;
    pub const SYNTHETIC: u16 = 0x1000;
    pub const ANNOTATION: u16 = 0x2000;
    pub const ENUM: u16 = 0x4000;
    pub const MANDATED: u16 = 0x8000;
    pub const MODULE: u16 = 0x8000;

    pub const fn new(bits: u16) -> Self {
        Self(bits)
    }

    pub const fn bits(self) -> u16 {
        self.0
    }

    pub const fn contains(self, flag: u16) -> bool {
        self.0 & flag == flag
    }

    pub const fn is_public(self) -> bool {
        self.contains(Self::PUBLIC)
    }

    pub const fn is_private(self) -> bool {
        self.contains(Self::PRIVATE)
    }

    pub const fn is_protected(self) -> bool {
        self.contains(Self::PROTECTED)
    }

    pub const fn is_static(self) -> bool {
        self.contains(Self::STATIC)
    }

    pub const fn is_final(self) -> bool {
        self.contains(Self::FINAL)
    }

    pub const fn is_interface(self) -> bool {
        self.contains(Self::INTERFACE)
    }

    pub const fn is_abstract(self) -> bool {
        self.contains(Self::ABSTRACT)
    }

    pub const fn is_synthetic(self) -> bool {
        self.contains(Self::SYNTHETIC)
    }

    pub const fn is_annotation(self) -> bool {
        self.contains(Self::ANNOTATION)
    }

    pub const fn is_enum(self) -> bool {
        self.contains(Self::ENUM)
    }

    pub const fn is_module(self) -> bool {
        self.contains(Self::MODULE)
    }
}

impl fmt::Debug for Modifiers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Modifiers(0x{:04x})", self.0)
    }
}

/// What kind of unit a class file describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnitKind {
    Class,
    Interface,
    Annotation,
    Enum,
    Record,
    Module,
}
