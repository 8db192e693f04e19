//! Contract script metadata.
//!
//! The explorer's script endpoint returns the full deployed script, including
//! the code and view bodies. Decode paths only ever need the type surface, so
//! [`ScriptMetadata`] keeps the parameter and storage types, entrypoint and
//! view signatures, and the bigmap maps, and drops the heavy bodies. Scripts
//! are immutable once deployed, so the metadata never changes after
//! construction.

use std::collections::BTreeMap;

use serde::Deserialize;
use serde_json::Value;

/// Raw wire form of the script endpoint response.
///
/// Micheline type expressions are opaque to this crate and carried as raw
/// JSON values. `bigmap_types` is keyed by bigmap name on the wire; the
/// id-keyed map is derived during [`ScriptMetadata::from_raw`].
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawScript {
    /// Full script including code and view bodies. Dropped during conversion
    /// to bound memory.
    pub script: Value,
    pub param_type: Value,
    pub storage_type: Value,
    pub entrypoints: BTreeMap<String, Value>,
    pub views: BTreeMap<String, Value>,
    #[serde(rename = "bigmaps")]
    pub bigmap_ids: BTreeMap<String, i64>,
    pub bigmap_types: BTreeMap<String, Value>,
}

/// Type surface of a deployed contract, immutable once constructed.
#[derive(Debug, Clone, PartialEq)]
pub struct ScriptMetadata {
    param_type: Value,
    storage_type: Value,
    entrypoints: BTreeMap<String, Value>,
    views: BTreeMap<String, Value>,
    bigmap_ids: BTreeMap<String, i64>,
    bigmap_types: BTreeMap<i64, Value>,
}

impl ScriptMetadata {
    /// Converts the wire script, discarding code and view bodies and joining
    /// the name-keyed bigmap types with their numeric ids.
    pub fn from_raw(raw: RawScript) -> Self {
        let mut bigmap_types = BTreeMap::new();
        for (name, ty) in raw.bigmap_types {
            if let Some(&id) = raw.bigmap_ids.get(&name) {
                bigmap_types.insert(id, ty);
            }
        }
        Self {
            param_type: raw.param_type,
            storage_type: raw.storage_type,
            entrypoints: raw.entrypoints,
            views: raw.views,
            bigmap_ids: raw.bigmap_ids,
            bigmap_types,
        }
    }

    pub fn param_type(&self) -> &Value {
        &self.param_type
    }

    pub fn storage_type(&self) -> &Value {
        &self.storage_type
    }

    pub fn entrypoints(&self) -> &BTreeMap<String, Value> {
        &self.entrypoints
    }

    pub fn entrypoint(&self, name: &str) -> Option<&Value> {
        self.entrypoints.get(name)
    }

    pub fn views(&self) -> &BTreeMap<String, Value> {
        &self.views
    }

    /// Numeric id of a named bigmap, if the contract declares one.
    pub fn bigmap_id(&self, name: &str) -> Option<i64> {
        self.bigmap_ids.get(name).copied()
    }

    /// Semantic type of a bigmap by its numeric id.
    pub fn bigmap_type(&self, id: i64) -> Option<&Value> {
        self.bigmap_types.get(&id)
    }

    pub fn bigmap_ids(&self) -> &BTreeMap<String, i64> {
        &self.bigmap_ids
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn raw_fixture() -> RawScript {
        serde_json::from_value(json!({
            "script": {"code": [{"prim": "parameter"}], "storage": {}},
            "param_type": {"prim": "pair"},
            "storage_type": {"prim": "big_map"},
            "entrypoints": {"transfer": {"prim": "pair"}},
            "views": {"get_balance": {"prim": "nat"}},
            "bigmaps": {"ledger": 511, "metadata": 512},
            "bigmap_types": {"ledger": {"prim": "map"}, "metadata": {"prim": "bytes"}}
        }))
        .unwrap()
    }

    #[test]
    fn from_raw_joins_bigmap_types_by_id() {
        let meta = ScriptMetadata::from_raw(raw_fixture());
        assert_eq!(meta.bigmap_id("ledger"), Some(511));
        assert_eq!(meta.bigmap_type(511).unwrap()["prim"], "map");
        assert_eq!(meta.bigmap_type(512).unwrap()["prim"], "bytes");
        assert!(meta.bigmap_type(999).is_none());
    }

    #[test]
    fn from_raw_keeps_type_surface_only() {
        let meta = ScriptMetadata::from_raw(raw_fixture());
        assert_eq!(meta.param_type()["prim"], "pair");
        assert_eq!(meta.storage_type()["prim"], "big_map");
        assert!(meta.entrypoint("transfer").is_some());
        assert!(meta.entrypoint("mint").is_none());
        assert_eq!(meta.views().len(), 1);
        // Debug form of the metadata must not mention the dropped code body.
        assert!(!format!("{meta:?}").contains("parameter"));
    }

    #[test]
    fn bigmap_type_without_declared_id_is_dropped() {
        let mut raw = raw_fixture();
        raw.bigmap_types
            .insert("orphan".into(), json!({"prim": "unit"}));
        let meta = ScriptMetadata::from_raw(raw);
        assert_eq!(meta.bigmap_ids().len(), 2);
        assert!(meta.bigmap_id("orphan").is_none());
    }

    #[test]
    fn missing_fields_default_cleanly() {
        let raw: RawScript = serde_json::from_str("{}").unwrap();
        let meta = ScriptMetadata::from_raw(raw);
        assert!(meta.entrypoints().is_empty());
        assert!(meta.bigmap_ids().is_empty());
    }
}
