use crate::error::{Error, Result};

/// The JVM caps array types at 255 dimensions.
pub const MAX_ARRAY_DIMENSIONS: usize = 255;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum BaseType {
    Byte,
    Char,
    Double,
    Float,
    Int,
    Long,
    Short,
    Boolean,
}

impl BaseType {
    fn from_tag(tag: u8) -> Option<Self> {
        Some(match tag {
            b'B' => BaseType::Byte,
            b'C' => BaseType::Char,
            b'D' => BaseType::Double,
            b'F' => BaseType::Float,
            b'I' => BaseType::Int,
            b'J' => BaseType::Long,
            b'S' => BaseType::Short,
            b'Z' => BaseType::Boolean,
            _ => return None,
        })
    }

    pub fn tag(self) -> char {
        match self {
            BaseType::Byte => 'B',
            BaseType::Char => 'C',
            BaseType::Double => 'D',
            BaseType::Float => 'F',
            BaseType::Int => 'I',
            BaseType::Long => 'J',
            BaseType::Short => 'S',
            BaseType::Boolean => 'Z',
        }
    }
}

/// A parsed field descriptor borrowing class names from the descriptor text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldType<'a> {
    Base(BaseType),
    /// Internal (`/`-separated) class name.
    Object(&'a str),
    /// `element` is never itself an array.
    Array {
        dimensions: u8,
        element: Box<FieldType<'a>>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReturnType<'a> {
    Void,
    Type(FieldType<'a>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodDescriptor<'a> {
    pub params: Vec<FieldType<'a>>,
    pub return_type: ReturnType<'a>,
}

pub fn parse_field_descriptor(desc: &str) -> Result<FieldType<'_>> {
    let mut cursor = Cursor { desc, pos: 0 };
    let ty = cursor.field_type()?;
    cursor.finish()?;
    Ok(ty)
}

pub fn parse_method_descriptor(desc: &str) -> Result<MethodDescriptor<'_>> {
    let mut cursor = Cursor { desc, pos: 0 };
    cursor.expect(b'(')?;

    let mut params = Vec::new();
    while cursor.peek()? != b')' {
        params.push(cursor.field_type()?);
    }
    cursor.expect(b')')?;

    let return_type = if cursor.peek()? == b'V' {
        cursor.pos += 1;
        ReturnType::Void
    } else {
        ReturnType::Type(cursor.field_type()?)
    };
    cursor.finish()?;

    Ok(MethodDescriptor {
        params,
        return_type,
    })
}

struct Cursor<'a> {
    desc: &'a str,
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn error(&self) -> Error {
        Error::InvalidDescriptor(self.desc.to_string())
    }

    fn peek(&self) -> Result<u8> {
        self.desc
            .as_bytes()
            .get(self.pos)
            .copied()
            .ok_or_else(|| self.error())
    }

    fn expect(&mut self, byte: u8) -> Result<()> {
        if self.peek()? != byte {
            return Err(self.error());
        }
        self.pos += 1;
        Ok(())
    }

    fn finish(&self) -> Result<()> {
        if self.pos != self.desc.len() {
            return Err(self.error());
        }
        Ok(())
    }

    fn field_type(&mut self) -> Result<FieldType<'a>> {
        let mut dimensions = 0usize;
        while self.peek()? == b'[' {
            dimensions += 1;
            self.pos += 1;
        }
        if dimensions > MAX_ARRAY_DIMENSIONS {
            return Err(self.error());
        }

        let element = self.element_type()?;
        if dimensions == 0 {
            return Ok(element);
        }
        Ok(FieldType::Array {
            dimensions: dimensions as u8,
            element: Box::new(element),
        })
    }

    fn element_type(&mut self) -> Result<FieldType<'a>> {
        let tag = self.peek()?;
        self.pos += 1;
        if let Some(base) = BaseType::from_tag(tag) {
            return Ok(FieldType::Base(base));
        }
        if tag != b'L' {
            return Err(self.error());
        }

        let rest = &self.desc[self.pos..];
        let end = rest.find(';').ok_or_else(|| self.error())?;
        let name = &rest[..end];
        if name.is_empty() || name.contains(['.', '[']) {
            return Err(self.error());
        }
        self.pos += end + 1;
        Ok(FieldType::Object(name))
    }
}
