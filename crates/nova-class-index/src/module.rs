use nova_classfile::{ModuleDescriptor, ModulePackage, ACC_STATIC_PHASE, ACC_TRANSITIVE};
use serde::{Deserialize, Serialize};
use smol_str::SmolStr;

use crate::annotation::{AnnotationInstance, AnnotationTarget};
use crate::error::IndexError;
use crate::modifiers::Modifiers;
use crate::name::{Name, NameTable};

/// A named module, converted from a `module-info` record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleInfo {
    name: Name,
    flags: Modifiers,
    version: Option<SmolStr>,
    requires: Vec<ModuleRequirement>,
    exports: Vec<PackageDirective>,
    opens: Vec<PackageDirective>,
    uses: Vec<Name>,
    provides: Vec<ServiceProvider>,
    annotations: Vec<AnnotationInstance>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleRequirement {
    pub module: Name,
    pub flags: Modifiers,
    pub version: Option<SmolStr>,
}

impl ModuleRequirement {
    pub fn is_transitive(&self) -> bool {
        self.flags.contains(ACC_TRANSITIVE)
    }

    pub fn is_static(&self) -> bool {
        self.flags.contains(ACC_STATIC_PHASE)
    }
}

/// An `exports` or `opens` directive. Unqualified when `targets` is empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageDirective {
    pub package: Name,
    pub flags: Modifiers,
    pub targets: Vec<Name>,
}

impl PackageDirective {
    fn allows(&self, package: &Name, module: &Name) -> bool {
        self.package == *package && (self.targets.is_empty() || self.targets.contains(module))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceProvider {
    pub service: Name,
    pub implementations: Vec<Name>,
}

impl ModuleInfo {
    pub fn from_descriptor(record: &ModuleDescriptor, names: &mut NameTable) -> Result<Self, IndexError> {
        let module = record.name.as_str();
        if module.is_empty() {
            return Err(IndexError::invalid_record("<unnamed module>", "missing module name"));
        }
        let context = |err: IndexError| IndexError::invalid_record(module, err.to_string());

        let name = names.intern_dotted(module).map_err(context)?;

        let requires = record
            .requires
            .iter()
            .map(|req| {
                Ok(ModuleRequirement {
                    module: names.intern_dotted(&req.module)?,
                    flags: Modifiers::new(req.flags),
                    version: req.version.as_deref().map(SmolStr::new),
                })
            })
            .collect::<Result<Vec<_>, IndexError>>()
            .map_err(context)?;

        let exports = convert_packages(&record.exports, names).map_err(context)?;
        let opens = convert_packages(&record.opens, names).map_err(context)?;

        let uses = record
            .uses
            .iter()
            .map(|service| names.intern_internal(service))
            .collect::<Result<Vec<_>, _>>()
            .map_err(context)?;

        let provides = record
            .provides
            .iter()
            .map(|provides| {
                Ok(ServiceProvider {
                    service: names.intern_internal(&provides.service)?,
                    implementations: provides
                        .implementations
                        .iter()
                        .map(|class| names.intern_internal(class))
                        .collect::<Result<_, _>>()?,
                })
            })
            .collect::<Result<Vec<_>, IndexError>>()
            .map_err(context)?;

        let annotations = record
            .annotations
            .iter()
            .map(|a| AnnotationInstance::from_record(a, Some(AnnotationTarget::Module(name.clone())), names))
            .collect::<Result<Vec<_>, _>>()
            .map_err(context)?;

        Ok(Self {
            name,
            flags: Modifiers::new(record.flags),
            version: record.version.as_deref().map(SmolStr::new),
            requires,
            exports,
            opens,
            uses,
            provides,
            annotations,
        })
    }

    /// Swap every name for the table's shared allocation.
    pub(crate) fn intern_names(&mut self, names: &mut NameTable) {
        let intern_all = |list: &mut Vec<Name>, names: &mut NameTable| {
            for name in list.iter_mut() {
                *name = names.intern(name);
            }
        };

        self.name = names.intern(&self.name);
        for requirement in &mut self.requires {
            requirement.module = names.intern(&requirement.module);
        }
        for directive in self.exports.iter_mut().chain(self.opens.iter_mut()) {
            directive.package = names.intern(&directive.package);
            intern_all(&mut directive.targets, names);
        }
        intern_all(&mut self.uses, names);
        for provider in &mut self.provides {
            provider.service = names.intern(&provider.service);
            intern_all(&mut provider.implementations, names);
        }
        for annotation in &mut self.annotations {
            annotation.intern_names(names);
        }
    }

    pub fn name(&self) -> &Name {
        &self.name
    }

    pub fn flags(&self) -> Modifiers {
        self.flags
    }

    pub fn version(&self) -> Option<&str> {
        self.version.as_deref()
    }

    pub fn is_open(&self) -> bool {
        self.flags.contains(nova_classfile::ACC_OPEN)
    }

    pub fn requires(&self) -> &[ModuleRequirement] {
        &self.requires
    }

    pub fn exports(&self) -> &[PackageDirective] {
        &self.exports
    }

    pub fn opens(&self) -> &[PackageDirective] {
        &self.opens
    }

    pub fn uses(&self) -> &[Name] {
        &self.uses
    }

    pub fn provides(&self) -> &[ServiceProvider] {
        &self.provides
    }

    pub fn annotations(&self) -> &[AnnotationInstance] {
        &self.annotations
    }

    /// Whether code in `module` may access public types of `package`.
    pub fn exports_package_to(&self, package: &Name, module: &Name) -> bool {
        if self.name == *module {
            return true;
        }
        self.exports.iter().any(|exports| exports.allows(package, module))
    }

    /// Whether `package` is open to deep reflection from `module`.
    pub fn opens_package_to(&self, package: &Name, module: &Name) -> bool {
        if self.name == *module || self.is_open() {
            return true;
        }
        self.opens.iter().any(|opens| opens.allows(package, module))
    }
}

fn convert_packages(directives: &[ModulePackage], names: &mut NameTable) -> Result<Vec<PackageDirective>, IndexError> {
    directives
        .iter()
        .map(|directive| {
            Ok(PackageDirective {
                package: names.intern_internal(&directive.package)?,
                flags: Modifiers::new(directive.flags),
                targets: directive
                    .to
                    .iter()
                    .map(|module| names.intern_dotted(module))
                    .collect::<Result<_, _>>()?,
            })
        })
        .collect()
}
