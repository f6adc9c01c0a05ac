//! Interned, componentized type/package/module names.
//!
//! A [`Name`] is a chain of components sharing their prefixes:
//! `java` <- `java.lang` <- `java.lang.String`. Names handed out by the same
//! [`NameTable`] are deduplicated, so graph keys referring to the same type
//! share one allocation and equality usually short-circuits on pointer
//! identity. Names created elsewhere (queries, deserialization) still compare
//! structurally.

use std::cmp::Ordering;
use std::collections::hash_map::DefaultHasher;
use std::collections::HashMap;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use smol_str::SmolStr;

use crate::error::IndexError;

#[derive(Clone)]
pub struct Name(Arc<NameData>);

struct NameData {
    prefix: Option<Name>,
    local: SmolStr,
    /// Structural hash of the whole chain; equal names always carry equal hashes.
    hash: u64,
}

impl Name {
    fn component(prefix: Option<Name>, local: &str) -> Name {
        let mut hasher = DefaultHasher::new();
        if let Some(prefix) = &prefix {
            prefix.0.hash.hash(&mut hasher);
        }
        local.hash(&mut hasher);
        Name(Arc::new(NameData {
            prefix,
            local: SmolStr::new(local),
            hash: hasher.finish(),
        }))
    }

    /// Build an uninterned name from either dotted (`java.lang.String`) or
    /// internal (`java/lang/String`) form.
    pub fn parse(name: &str) -> Name {
        let mut prefix = None;
        for segment in name.split(['.', '/']) {
            prefix = Some(Name::component(prefix, segment));
        }
        // `split` always yields at least one segment.
        prefix.unwrap_or_else(|| Name::component(None, ""))
    }

    /// The last component (`String` for `java.lang.String`).
    pub fn local(&self) -> &str {
        &self.0.local
    }

    /// Everything before the last component; for a class name this is its package.
    pub fn prefix(&self) -> Option<&Name> {
        self.0.prefix.as_ref()
    }

    pub fn ptr_eq(&self, other: &Name) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    /// Components from outermost to innermost.
    pub fn components(&self) -> Vec<&str> {
        let mut out = Vec::new();
        let mut current = Some(self);
        while let Some(name) = current {
            out.push(name.local());
            current = name.prefix();
        }
        out.reverse();
        out
    }

    pub fn to_dotted(&self) -> String {
        self.components().join(".")
    }

    pub fn to_internal(&self) -> String {
        self.components().join("/")
    }

    fn dotted_bytes(&self) -> impl Iterator<Item = u8> + '_ {
        self.components()
            .into_iter()
            .enumerate()
            .flat_map(|(idx, component)| {
                let sep = (idx > 0).then_some(b'.');
                sep.into_iter().chain(component.bytes())
            })
    }
}

impl PartialEq for Name {
    fn eq(&self, other: &Self) -> bool {
        if self.ptr_eq(other) {
            return true;
        }
        self.0.hash == other.0.hash
            && self.0.local == other.0.local
            && self.0.prefix == other.0.prefix
    }
}

impl Eq for Name {}

impl Hash for Name {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_u64(self.0.hash);
    }
}

/// Names order by their dotted rendering.
impl Ord for Name {
    fn cmp(&self, other: &Self) -> Ordering {
        if self == other {
            return Ordering::Equal;
        }
        self.dotted_bytes().cmp(other.dotted_bytes())
    }
}

impl PartialOrd for Name {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(prefix) = self.prefix() {
            write!(f, "{prefix}.")?;
        }
        f.write_str(self.local())
    }
}

impl fmt::Debug for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Name({self})")
    }
}

impl From<&str> for Name {
    fn from(value: &str) -> Self {
        Name::parse(value)
    }
}

impl Serialize for Name {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_dotted())
    }
}

impl<'de> Deserialize<'de> for Name {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let dotted = String::deserialize(deserializer)?;
        Ok(Name::parse(&dotted))
    }
}

/// Deduplicating name interner owned by a single index build.
#[derive(Debug, Default, Clone)]
pub struct NameTable {
    names: HashMap<(Option<Name>, SmolStr), Name>,
}

impl NameTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Intern an internal (`/`-separated) class or package name.
    pub fn intern_internal(&mut self, internal: &str) -> Result<Name, IndexError> {
        validate(internal, '/', &['.', ';', '['])?;
        Ok(self.intern_segments(internal.split('/')))
    }

    /// Intern a dotted name such as a module name (`java.base`).
    pub fn intern_dotted(&mut self, dotted: &str) -> Result<Name, IndexError> {
        validate(dotted, '.', &['/', ';', '['])?;
        Ok(self.intern_segments(dotted.split('.')))
    }

    /// Decode a modified UTF-8 internal name straight from class-file bytes.
    pub fn intern_internal_bytes(&mut self, bytes: &[u8]) -> Result<Name, IndexError> {
        let decoded = nova_classfile::decode_modified_utf8(bytes)?;
        self.intern_internal(&decoded)
    }

    /// Re-intern a name built elsewhere so it shares this table's allocations.
    pub fn intern(&mut self, name: &Name) -> Name {
        let components = name.components();
        self.intern_segments(components.into_iter())
    }

    /// Look up an already-interned internal or dotted name without inserting.
    pub fn get(&self, name: &str) -> Option<Name> {
        let mut prefix: Option<Name> = None;
        for segment in name.split(['.', '/']) {
            let key = (prefix.take(), SmolStr::new(segment));
            prefix = Some(self.names.get(&key)?.clone());
        }
        prefix
    }

    fn intern_segments<'s>(&mut self, segments: impl Iterator<Item = &'s str>) -> Name {
        let mut prefix: Option<Name> = None;
        for segment in segments {
            let key = (prefix.take(), SmolStr::new(segment));
            let name = match self.names.get(&key) {
                Some(existing) => existing.clone(),
                None => {
                    let name = Name::component(key.0.clone(), segment);
                    self.names.insert(key, name.clone());
                    name
                }
            };
            prefix = Some(name);
        }
        prefix.unwrap_or_else(|| Name::component(None, ""))
    }
}

fn validate(name: &str, separator: char, forbidden: &[char]) -> Result<(), IndexError> {
    let invalid = |reason: &str| IndexError::InvalidName {
        name: name.to_string(),
        reason: reason.to_string(),
    };
    if name.is_empty() {
        return Err(invalid("empty name"));
    }
    if name.split(separator).any(str::is_empty) {
        return Err(invalid("empty name component"));
    }
    if name.contains(forbidden) {
        return Err(invalid("illegal character"));
    }
    Ok(())
}
