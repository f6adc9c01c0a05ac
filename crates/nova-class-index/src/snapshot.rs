//! Deterministic, sorted restatement of a finished [`Index`], plus the thin
//! persistence helpers built on it.

use std::fs;
use std::io::{Read, Write};
use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::config::IndexConfig;
use crate::error::IndexError;
use crate::index::{Index, IndexBuilder, RelationshipCounts};
use crate::module::ModuleInfo;
use crate::name::Name;
use crate::unit::UnitInfo;

const MAGIC: [u8; 4] = *b"NCIX";

/// Version of the bincode payload following the header.
///
/// Version history:
/// - 1: units, modules, users and relationship counts.
pub const SNAPSHOT_SCHEMA_VERSION: u32 = 1;

/// Immutable view of an index with every list in name order, so equal index
/// contents always produce equal snapshots.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexSnapshot {
    pub classes: Vec<Arc<UnitInfo>>,
    pub modules: Vec<Arc<ModuleInfo>>,
    /// Referenced name -> sorted referencing units.
    pub users: Vec<(Name, Vec<Name>)>,
    /// Graph sizes at snapshot time.
    pub counts: RelationshipCounts,
}

impl Index {
    pub fn snapshot(&self) -> IndexSnapshot {
        let mut classes: Vec<Arc<UnitInfo>> = self.graphs.units.values().cloned().collect();
        classes.sort_by(|a, b| a.name().cmp(b.name()));

        let mut modules: Vec<Arc<ModuleInfo>> = self.graphs.modules.values().cloned().collect();
        modules.sort_by(|a, b| a.name().cmp(b.name()));

        let mut users: Vec<(Name, Vec<Name>)> = self
            .graphs
            .users
            .iter()
            .flatten()
            .map(|(name, referencing)| {
                let mut referencing: Vec<Name> = referencing.iter().cloned().collect();
                referencing.sort();
                (name.clone(), referencing)
            })
            .collect();
        users.sort_by(|a, b| a.0.cmp(&b.0));

        IndexSnapshot {
            classes,
            modules,
            users,
            counts: self.graphs.counts(),
        }
    }

    /// Rebuild an index from a snapshot. Every graph is derived from the units
    /// and modules, so only those are replayed.
    pub fn from_snapshot(snapshot: &IndexSnapshot, config: IndexConfig) -> Index {
        let mut builder = IndexBuilder::with_config(config);
        for unit in &snapshot.classes {
            builder.insert_unit(Arc::clone(unit));
        }
        for module in &snapshot.modules {
            builder.insert_module(Arc::clone(module));
        }
        builder.finish()
    }
}

impl IndexSnapshot {
    /// Write the magic, the schema version (little endian) and a bincode payload.
    pub fn write_to<W: Write>(&self, mut writer: W) -> Result<(), IndexError> {
        writer.write_all(&MAGIC)?;
        writer.write_all(&SNAPSHOT_SCHEMA_VERSION.to_le_bytes())?;
        bincode::serialize_into(&mut writer, self)?;
        writer.flush()?;
        Ok(())
    }

    pub fn read_from<R: Read>(mut reader: R) -> Result<Self, IndexError> {
        let mut magic = [0u8; 4];
        reader.read_exact(&mut magic)?;
        if magic != MAGIC {
            return Err(IndexError::BadMagic);
        }

        let mut version = [0u8; 4];
        reader.read_exact(&mut version)?;
        let found = u32::from_le_bytes(version);
        if found != SNAPSHOT_SCHEMA_VERSION {
            return Err(IndexError::IncompatibleSnapshot {
                expected: SNAPSHOT_SCHEMA_VERSION,
                found,
            });
        }

        Ok(bincode::deserialize_from(reader)?)
    }

    /// Write to `path` through a sibling temp file so readers never observe a
    /// partially written snapshot.
    pub fn save(&self, path: &Path) -> Result<(), IndexError> {
        let mut tmp = path.as_os_str().to_owned();
        tmp.push(format!(".tmp.{}", std::process::id()));
        let tmp = std::path::PathBuf::from(tmp);

        let result = (|| -> Result<(), IndexError> {
            let file = fs::File::create(&tmp)?;
            let mut writer = std::io::BufWriter::new(file);
            self.write_to(&mut writer)?;
            writer.into_inner().map_err(|err| err.into_error())?.sync_all()?;
            fs::rename(&tmp, path)?;
            Ok(())
        })();

        if result.is_err() {
            let _ = fs::remove_file(&tmp);
        }
        tracing::debug!(
            target = "nova.class_index",
            path = %path.display(),
            classes = self.classes.len(),
            ok = result.is_ok(),
            "saved class index snapshot"
        );
        result
    }

    pub fn load(path: &Path) -> Result<Self, IndexError> {
        let file = fs::File::open(path)?;
        Self::read_from(std::io::BufReader::new(file))
    }

    /// Human-readable rendering for inspection and diffing.
    pub fn to_json_pretty(&self) -> Result<String, IndexError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
