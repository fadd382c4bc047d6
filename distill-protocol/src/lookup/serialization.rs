//! Persisted lookup-table format

use super::{LookupCell, LookupTable};
use crate::grid::{Grid, GridMap};
use distill_core::{DistillError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Current lookup-table format version
pub const LOOKUP_FORMAT_VERSION: u32 = 1;

/// On-disk representation of a [`LookupTable`]
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct SerializedLookupTable {
    /// Format version for compatibility checking
    pub version: u32,
    pub gammas: Grid,
    pub ps: Grid,
    /// Row-major cells, `gammas.len() * ps.len()` of them
    pub cells: Vec<LookupCell>,
}

impl SerializedLookupTable {
    pub fn from_table(table: &LookupTable) -> Self {
        Self {
            version: LOOKUP_FORMAT_VERSION,
            gammas: table.gammas.clone(),
            ps: table.ps.clone(),
            cells: table.cells.cells().to_vec(),
        }
    }

    /// Check version compatibility
    pub fn check_version(&self) -> Result<()> {
        if self.version != LOOKUP_FORMAT_VERSION {
            return Err(DistillError::DeserializationError(format!(
                "Unsupported lookup table version {} (expected {})",
                self.version, LOOKUP_FORMAT_VERSION
            )));
        }
        Ok(())
    }

    pub fn into_table(self) -> Result<LookupTable> {
        self.check_version()?;
        let cells = GridMap::from_cells(self.gammas.len(), self.ps.len(), self.cells).map_err(|e| {
            DistillError::DeserializationError(format!("Malformed lookup table: {}", e))
        })?;
        LookupTable::new(self.gammas, self.ps, cells)
    }
}

impl LookupTable {
    /// Serialize to the binary format
    ///
    /// # Errors
    /// Returns error if serialization fails
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        bincode::serialize(&SerializedLookupTable::from_table(self)).map_err(|e| {
            DistillError::SerializationError(format!("Binary serialization failed: {}", e))
        })
    }

    /// Deserialize from the binary format
    ///
    /// # Errors
    /// Returns error if decoding fails or the version is unsupported
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let serialized: SerializedLookupTable = bincode::deserialize(bytes).map_err(|e| {
            DistillError::DeserializationError(format!("Binary deserialization failed: {}", e))
        })?;
        serialized.into_table()
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(&SerializedLookupTable::from_table(self)).map_err(|e| {
            DistillError::SerializationError(format!("JSON serialization failed: {}", e))
        })
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        serde_json::to_string_pretty(&SerializedLookupTable::from_table(self)).map_err(|e| {
            DistillError::SerializationError(format!("JSON serialization failed: {}", e))
        })
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let serialized: SerializedLookupTable = serde_json::from_str(json).map_err(|e| {
            DistillError::DeserializationError(format!("JSON deserialization failed: {}", e))
        })?;
        serialized.into_table()
    }

    /// Write the binary format to `path`
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        std::fs::write(path, self.to_bytes()?).map_err(|e| {
            DistillError::SerializationError(format!("Failed to write {}: {}", path.display(), e))
        })
    }

    /// Read the binary format from `path`
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let bytes = std::fs::read(path).map_err(|e| {
            DistillError::DeserializationError(format!("Failed to read {}: {}", path.display(), e))
        })?;
        Self::from_bytes(&bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cascade::CascadeOutcome;

    fn table() -> LookupTable {
        let gammas = Grid::new(vec![0.01, 0.1]).unwrap();
        let ps = Grid::new(vec![0.02]).unwrap();
        let cells = GridMap::from_cells(
            2,
            1,
            vec![
                LookupCell {
                    depth: 1,
                    alpha: 0.3,
                    achieved: Some(CascadeOutcome {
                        fidelity: 0.95,
                        yield_rate: 0.4,
                    }),
                },
                LookupCell {
                    depth: 3,
                    alpha: 0.7,
                    achieved: None,
                },
            ],
        )
        .unwrap();
        LookupTable::new(gammas, ps, cells).unwrap()
    }

    #[test]
    fn test_binary_round_trip() {
        let t = table();
        assert_eq!(LookupTable::from_bytes(&t.to_bytes().unwrap()).unwrap(), t);
    }

    #[test]
    fn test_json_round_trip() {
        let t = table();
        assert_eq!(LookupTable::from_json(&t.to_json().unwrap()).unwrap(), t);
        assert_eq!(LookupTable::from_json(&t.to_json_pretty().unwrap()).unwrap(), t);
    }

    #[test]
    fn test_json_keeps_linspace_grid_exact() {
        // 0.01 + 9 * step lands one ulp below 0.1
        let gammas = Grid::linspace(0.01, 0.20, 20).unwrap();
        let ps = Grid::linspace(0.01, 0.20, 20).unwrap();
        let cell = LookupCell {
            depth: 2,
            alpha: 0.1 + 0.8 / 19.0 * 7.0,
            achieved: Some(CascadeOutcome {
                fidelity: 1.0 / 3.0,
                yield_rate: 0.1 + 0.2,
            }),
        };
        let t = LookupTable::new(gammas, ps, GridMap::filled(20, 20, cell)).unwrap();

        let back = LookupTable::from_json(&t.to_json().unwrap()).unwrap();
        assert_eq!(back.gammas().values(), t.gammas().values());
        assert_eq!(back, t);
        assert_eq!(LookupTable::from_json(&t.to_json_pretty().unwrap()).unwrap(), t);
    }

    #[test]
    fn test_version_mismatch() {
        let mut serialized = SerializedLookupTable::from_table(&table());
        serialized.version = LOOKUP_FORMAT_VERSION + 1;
        let json = serde_json::to_string(&serialized).unwrap();
        assert!(matches!(
            LookupTable::from_json(&json),
            Err(DistillError::DeserializationError(_))
        ));
    }

    #[test]
    fn test_cell_count_mismatch() {
        let mut serialized = SerializedLookupTable::from_table(&table());
        serialized.cells.pop();
        let bytes = bincode::serialize(&serialized).unwrap();
        assert!(LookupTable::from_bytes(&bytes).is_err());
    }

    #[test]
    fn test_garbage_bytes() {
        assert!(LookupTable::from_bytes(&[1, 2, 3]).is_err());
    }
}
