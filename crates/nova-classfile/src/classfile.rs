use crate::annotation::Annotation;

pub const ACC_PUBLIC: u16 = 0x0001;
pub const ACC_FINAL: u16 = 0x0010;
pub const ACC_SUPER: u16 = 0x0020;
pub const ACC_INTERFACE: u16 = 0x0200;
pub const ACC_ABSTRACT: u16 = 0x0400;
pub const ACC_SYNTHETIC: u16 = 0x1000;
pub const ACC_ANNOTATION: u16 = 0x2000;
pub const ACC_ENUM: u16 = 0x4000;
pub const ACC_MODULE: u16 = 0x8000;

/// A class file as handed over by the decoder.
///
/// Constant-pool references are already resolved; class names are in internal
/// (`/`-separated) form.
#[derive(Debug, Clone, Default)]
pub struct ClassFile {
    pub minor_version: u16,
    pub major_version: u16,
    pub access_flags: u16,
    pub this_class: String,
    pub super_class: Option<String>,
    pub interfaces: Vec<String>,
    pub fields: Vec<ClassMember>,
    pub methods: Vec<ClassMember>,
    pub record_components: Vec<RecordComponent>,
    pub signature: Option<String>,
    /// Visible and invisible class-level annotations, in attribute order.
    pub annotations: Vec<Annotation>,
    /// Every `CONSTANT_Class` entry of the constant pool.
    pub referenced_classes: Vec<String>,
}

#[derive(Debug, Clone, Default)]
pub struct ClassMember {
    pub access_flags: u16,
    pub name: String,
    pub descriptor: String,
    pub signature: Option<String>,
    pub annotations: Vec<Annotation>,
    /// One entry per declared parameter when the method carries
    /// `Runtime*ParameterAnnotations`; empty otherwise.
    pub parameter_annotations: Vec<Vec<Annotation>>,
    /// Names from the `MethodParameters` attribute, when present.
    pub parameter_names: Vec<String>,
}

#[derive(Debug, Clone, Default)]
pub struct RecordComponent {
    pub name: String,
    pub descriptor: String,
    pub signature: Option<String>,
    pub annotations: Vec<Annotation>,
}

impl ClassFile {
    pub fn new(this_class: impl Into<String>) -> Self {
        Self {
            major_version: 61,
            access_flags: ACC_PUBLIC | ACC_SUPER,
            this_class: this_class.into(),
            super_class: Some("java/lang/Object".to_string()),
            ..Self::default()
        }
    }

    /// An interface skeleton (`ACC_INTERFACE | ACC_ABSTRACT`, super `java/lang/Object`).
    pub fn interface(this_class: impl Into<String>) -> Self {
        Self {
            access_flags: ACC_PUBLIC | ACC_INTERFACE | ACC_ABSTRACT,
            ..Self::new(this_class)
        }
    }

    pub fn extends(mut self, super_class: impl Into<String>) -> Self {
        self.super_class = Some(super_class.into());
        self
    }

    pub fn implements(mut self, interface: impl Into<String>) -> Self {
        self.interfaces.push(interface.into());
        self
    }

    pub fn with_flags(mut self, access_flags: u16) -> Self {
        self.access_flags = access_flags;
        self
    }

    pub fn with_field(mut self, field: ClassMember) -> Self {
        self.fields.push(field);
        self
    }

    pub fn with_method(mut self, method: ClassMember) -> Self {
        self.methods.push(method);
        self
    }

    pub fn with_record_component(mut self, component: RecordComponent) -> Self {
        self.record_components.push(component);
        self
    }

    pub fn with_annotation(mut self, annotation: Annotation) -> Self {
        self.annotations.push(annotation);
        self
    }

    pub fn references(mut self, class: impl Into<String>) -> Self {
        self.referenced_classes.push(class.into());
        self
    }

    pub fn is_interface(&self) -> bool {
        self.access_flags & ACC_INTERFACE != 0
    }
}

impl ClassMember {
    pub fn new(name: impl Into<String>, descriptor: impl Into<String>) -> Self {
        Self {
            access_flags: ACC_PUBLIC,
            name: name.into(),
            descriptor: descriptor.into(),
            ..Self::default()
        }
    }

    pub fn with_flags(mut self, access_flags: u16) -> Self {
        self.access_flags = access_flags;
        self
    }

    pub fn with_annotation(mut self, annotation: Annotation) -> Self {
        self.annotations.push(annotation);
        self
    }

    /// Attach `annotation` to parameter `position`, padding the table as needed.
    pub fn with_parameter_annotation(mut self, position: usize, annotation: Annotation) -> Self {
        if self.parameter_annotations.len() <= position {
            self.parameter_annotations.resize_with(position + 1, Vec::new);
        }
        self.parameter_annotations[position].push(annotation);
        self
    }
}

impl RecordComponent {
    pub fn new(name: impl Into<String>, descriptor: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            descriptor: descriptor.into(),
            ..Self::default()
        }
    }

    pub fn with_annotation(mut self, annotation: Annotation) -> Self {
        self.annotations.push(annotation);
        self
    }
}
