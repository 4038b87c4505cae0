//! Product mapping - upstream data elements to report product codes
//!
//! The mapping file is a JSON object keyed by upstream data element id:
//!
//! ```json
//! {
//!   "hK5Qc5tMtVL": { "productCode": "AMX250", "dataPoint": "Stock on hand" },
//!   "uY3XQ8i9Rk1": { "productCode": "AMX250", "dataPoint": "Quantity used" }
//! }
//! ```
//!
//! Key order in the file is kept: it decides the order of the `dx`
//! dimension sent upstream.

use serde::Deserialize;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::fs;
use std::path::Path;

use crate::error::MappingError;

/// Default mapping file (relative to current dir)
pub const DEFAULT_MAPPING_PATH: &str = "mapping.json";

/// Separator between codes of one `dx` dimension
pub const DIMENSION_SEPARATOR: &str = ";";

/// What an upstream data element measures.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(from = "String")]
pub enum DataPointLabel {
    StockOnHand,
    QuantityUsed,
    Other(String),
}

impl From<String> for DataPointLabel {
    fn from(label: String) -> Self {
        match label.as_str() {
            "Stock on hand" => DataPointLabel::StockOnHand,
            "Quantity used" => DataPointLabel::QuantityUsed,
            _ => DataPointLabel::Other(label),
        }
    }
}

/// Mapping entry for one upstream data element.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductMapping {
    /// Product code written to the report
    pub product_code: String,
    /// What the data element measures
    pub data_point: DataPointLabel,
}

/// The two `dx` code lists queried upstream.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DimensionLists {
    pub stock_on_hand: Vec<String>,
    pub quantity_used: Vec<String>,
}

impl DimensionLists {
    /// `;`-joined stock on hand codes
    pub fn stock_on_hand_dx(&self) -> String {
        self.stock_on_hand.join(DIMENSION_SEPARATOR)
    }

    /// `;`-joined quantity used codes
    pub fn quantity_used_dx(&self) -> String {
        self.quantity_used.join(DIMENSION_SEPARATOR)
    }
}

/// Immutable product mapping table, in file order.
#[derive(Debug, Clone, Default)]
pub struct ProductCatalog {
    entries: Vec<(String, ProductMapping)>,
    index: HashMap<String, usize>,
}

impl ProductCatalog {
    /// Build a catalog from `(upstream code, mapping)` pairs.
    ///
    /// A repeated upstream code keeps its first position and last mapping.
    pub fn from_entries<I>(entries: I) -> Self
    where
        I: IntoIterator<Item = (String, ProductMapping)>,
    {
        let mut catalog = Self::default();
        for (code, mapping) in entries {
            match catalog.index.get(&code) {
                Some(&i) => catalog.entries[i].1 = mapping,
                None => {
                    catalog.index.insert(code.clone(), catalog.entries.len());
                    catalog.entries.push((code, mapping));
                }
            }
        }
        catalog
    }

    /// Parse a catalog from the JSON mapping format.
    pub fn from_json_str(json: &str) -> Result<Self, MappingError> {
        let root: Value = serde_json::from_str(json)?;
        let object: Map<String, Value> = match root {
            Value::Object(map) => map,
            _ => return Err(MappingError::NotAnObject),
        };

        let mut entries = Vec::with_capacity(object.len());
        for (code, value) in object {
            let mapping: ProductMapping =
                serde_json::from_value(value).map_err(|e| MappingError::InvalidEntry {
                    code: code.clone(),
                    message: e.to_string(),
                })?;
            entries.push((code, mapping));
        }
        Ok(Self::from_entries(entries))
    }

    /// Load a catalog from a mapping file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, MappingError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| MappingError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&content)
    }

    pub fn get(&self, upstream_code: &str) -> Option<&ProductMapping> {
        self.index.get(upstream_code).map(|&i| &self.entries[i].1)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate entries in file order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &ProductMapping)> {
        self.entries.iter().map(|(code, m)| (code.as_str(), m))
    }

    /// Split upstream codes into the stock on hand and quantity used lists.
    ///
    /// Codes with any other label are not queried.
    pub fn dimension_lists(&self) -> DimensionLists {
        let mut lists = DimensionLists::default();
        for (code, mapping) in self.iter() {
            match mapping.data_point {
                DataPointLabel::StockOnHand => lists.stock_on_hand.push(code.to_string()),
                DataPointLabel::QuantityUsed => lists.quantity_used.push(code.to_string()),
                DataPointLabel::Other(_) => {}
            }
        }
        lists
    }
}
