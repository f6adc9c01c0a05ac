/// The `Module` attribute of a `module-info.class`, as handed over by the decoder.
///
/// Module names are dotted; package and class names are internal
/// (`/`-separated) names.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ModuleDescriptor {
    pub name: String,
    pub flags: u16,
    pub version: Option<String>,
    pub requires: Vec<ModuleRequires>,
    pub exports: Vec<ModulePackage>,
    pub opens: Vec<ModulePackage>,
    pub uses: Vec<String>,
    pub provides: Vec<ModuleProvides>,
    pub annotations: Vec<crate::Annotation>,
}

pub const ACC_OPEN: u16 = 0x0020;
pub const ACC_TRANSITIVE: u16 = 0x0020;
pub const ACC_STATIC_PHASE: u16 = 0x0040;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleRequires {
    pub module: String,
    pub flags: u16,
    pub version: Option<String>,
}

/// An `exports` or `opens` directive; `to` is empty when unqualified.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModulePackage {
    pub package: String,
    pub flags: u16,
    pub to: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleProvides {
    pub service: String,
    pub implementations: Vec<String>,
}

impl ModuleDescriptor {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn is_open(&self) -> bool {
        self.flags & ACC_OPEN != 0
    }
}
