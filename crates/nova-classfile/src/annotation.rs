/// A decoded `RuntimeVisibleAnnotations`/`RuntimeInvisibleAnnotations` entry.
#[derive(Debug, Clone, PartialEq)]
pub struct Annotation {
    /// Field descriptor of the annotation type, e.g. `Ljava/lang/Deprecated;`.
    pub type_descriptor: String,
    pub elements: Vec<(String, ElementValue)>,
    pub visible: bool,
}

impl Annotation {
    pub fn new(type_descriptor: impl Into<String>) -> Self {
        Self {
            type_descriptor: type_descriptor.into(),
            elements: Vec::new(),
            visible: true,
        }
    }

    pub fn with_element(mut self, name: impl Into<String>, value: ElementValue) -> Self {
        self.elements.push((name.into(), value));
        self
    }

    pub fn type_internal_name(&self) -> Option<&str> {
        descriptor_to_internal_name(&self.type_descriptor)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ElementValue {
    Const(ConstValue),
    Enum {
        type_descriptor: String,
        const_name: String,
    },
    /// Return descriptor of a class literal (`Ljava/lang/String;`, `I`, `V`, ...).
    Class(String),
    Annotation(Box<Annotation>),
    Array(Vec<ElementValue>),
}

#[derive(Debug, Clone, PartialEq)]
pub enum ConstValue {
    Byte(i8),
    Char(char),
    Short(i16),
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    Boolean(bool),
    String(String),
}

/// `Lcom/example/Foo;` -> `com/example/Foo`.
pub fn descriptor_to_internal_name(desc: &str) -> Option<&str> {
    desc.strip_prefix('L')
        .and_then(|rest| rest.strip_suffix(';'))
        .filter(|name| !name.is_empty())
}
