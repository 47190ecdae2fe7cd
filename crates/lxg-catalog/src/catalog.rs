//! The [`Catalog`]: dotted key to per-language value.

use std::collections::HashMap;

use indexmap::IndexMap;
use tracing::{debug, warn};

use lxg_dataset::DataSet;
use lxg_types::{Branch, GridConfig, Row, RowKey, Value};

use crate::error::{CatalogError, CatalogResult};
use crate::flatten::{flatten, rebuild, Outline};

/// A set of translations keyed by dotted path, one value per language.
///
/// Each loaded document's [`Outline`] is kept, so [`Catalog::document`]
/// exports arrays, empty objects and literal dotted keys the way they were
/// loaded.
#[derive(Clone, Debug, PartialEq)]
pub struct Catalog {
    separator: String,
    languages: Vec<String>,
    entries: IndexMap<String, IndexMap<String, Value>>,
    outlines: IndexMap<String, Outline>,
}

impl Default for Catalog {
    fn default() -> Self {
        Self::with_separator(".")
    }
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_separator(separator: impl Into<String>) -> Self {
        Self {
            separator: separator.into(),
            languages: Vec::new(),
            entries: IndexMap::new(),
            outlines: IndexMap::new(),
        }
    }

    pub fn from_config(config: &GridConfig) -> Self {
        Self::with_separator(config.key_separator.as_str())
    }

    /// A catalog holding one parsed document.
    pub fn from_json_str(language: &str, text: &str) -> CatalogResult<Self> {
        let mut catalog = Self::new();
        catalog.add_json_str(language, text)?;
        Ok(catalog)
    }

    /// Parse `text` and merge it in as `language`.
    pub fn add_json_str(&mut self, language: &str, text: &str) -> CatalogResult<()> {
        let document: serde_json::Value = serde_json::from_str(text)?;
        self.add_document(language, document)
    }

    /// Merge a nested JSON document in as `language`.
    ///
    /// Keys keep first-seen order across documents. Loading a language a
    /// second time overwrites the values it provides. A document in which
    /// two entries flatten to the same key is rejected and leaves the
    /// catalog untouched.
    pub fn add_document(
        &mut self,
        language: &str,
        document: serde_json::Value,
    ) -> CatalogResult<()> {
        let outline = Outline::of(&document);
        let value = Value::from(document);
        if !value.is_branch() {
            return Err(CatalogError::NotAnObject {
                language: language.to_string(),
                found: value.kind(),
            });
        }
        let flat = flatten(&value, &self.separator)?;

        self.add_language(language);
        self.outlines
            .entry(language.to_string())
            .or_default()
            .merge(outline);
        debug!(language, keys = flat.len(), "loaded catalog document");
        for (key, value) in flat {
            self.set(key, language, value);
        }
        Ok(())
    }

    fn add_language(&mut self, language: &str) {
        if !self.languages.iter().any(|l| l == language) {
            self.languages.push(language.to_string());
        }
    }

    pub fn languages(&self) -> &[String] {
        &self.languages
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, key: &str, language: &str) -> Option<&Value> {
        self.entries.get(key)?.get(language)
    }

    /// Write one translation, registering the language if it is new.
    pub fn set(&mut self, key: impl Into<String>, language: &str, value: Value) {
        self.add_language(language);
        self.entries
            .entry(key.into())
            .or_default()
            .insert(language.to_string(), value);
    }

    /// Build grid rows: one per key, keyed by the key itself, with the key
    /// column followed by one column per language. Missing translations are
    /// `Null`.
    pub fn to_dataset(&self, config: &GridConfig) -> CatalogResult<DataSet> {
        if let Some(language) = self.languages.iter().find(|l| **l == config.key_column) {
            return Err(CatalogError::ReservedLanguage {
                language: language.clone(),
            });
        }

        let rows = self
            .entries
            .iter()
            .map(|(key, values)| {
                let mut cells = Branch::with_capacity(self.languages.len() + 1);
                cells.insert(config.key_column.clone(), Value::Text(key.clone()));
                for language in &self.languages {
                    let value = values.get(language).cloned().unwrap_or_default();
                    cells.insert(language.clone(), value);
                }
                Row::new(key.as_str(), cells)
            })
            .collect();
        Ok(DataSet::from_rows(rows)?)
    }

    /// Read the current values of `languages` back out of a dataset.
    ///
    /// A row's key comes from the key column, falling back to a named row
    /// key. Rows with neither are rejected. The result has no outlines, so
    /// arrays export as index-keyed objects; use
    /// [`sync_from_dataset`](Self::sync_from_dataset) on the catalog the rows
    /// were built from to keep the loaded shapes.
    pub fn from_dataset(
        dataset: &DataSet,
        config: &GridConfig,
        languages: &[&str],
    ) -> CatalogResult<Self> {
        if let Some(language) = languages.iter().find(|l| **l == config.key_column) {
            return Err(CatalogError::ReservedLanguage {
                language: language.to_string(),
            });
        }

        let mut catalog = Self::from_config(config);
        for language in languages {
            catalog.add_language(language);
        }

        for row in dataset.rows() {
            let key = match (row.get(&config.key_column), &row.key) {
                (Some(Value::Text(text)), _) if !text.is_empty() => text.clone(),
                (_, RowKey::Name(name)) => name.clone(),
                _ => return Err(CatalogError::MissingKey(row.key.clone())),
            };
            for language in languages {
                let value = row.get(language).cloned().unwrap_or_default();
                catalog.set(key.clone(), language, value);
            }
        }
        Ok(catalog)
    }

    /// Replace this catalog's translations with the dataset's current
    /// values, keeping its languages and document outlines. Keys whose rows
    /// are gone are dropped.
    pub fn sync_from_dataset(&mut self, dataset: &DataSet, config: &GridConfig) -> CatalogResult<()> {
        let languages: Vec<&str> = self.languages.iter().map(String::as_str).collect();
        let fresh = Self::from_dataset(dataset, config, &languages)?;
        debug!(
            before = self.entries.len(),
            after = fresh.entries.len(),
            "synced catalog from dataset"
        );
        self.entries = fresh.entries;
        Ok(())
    }

    /// The nested document for one language, in the shape it was loaded in.
    ///
    /// Keys with no (or a null) translation are left out. Keys the
    /// language's document did not have take the segments another
    /// language's document gave them, or are split on the separator.
    pub fn document(&self, language: &str) -> CatalogResult<serde_json::Value> {
        if !self.languages.iter().any(|l| l == language) {
            warn!(language, "exporting a language the catalog does not contain");
        }

        let empty = Outline::default();
        let own = self.outlines.get(language);
        let mut leaves: HashMap<String, &[String]> = HashMap::new();
        for outline in own.into_iter().chain(self.outlines.values()) {
            for (key, segments) in outline.leaves(&self.separator) {
                leaves.entry(key).or_insert(segments);
            }
        }

        let entries = self.entries.iter().filter_map(|(key, values)| {
            let value = values.get(language)?;
            let segments = match leaves.get(key.as_str()) {
                Some(segments) => segments.to_vec(),
                None => key.split(self.separator.as_str()).map(str::to_string).collect(),
            };
            Some((segments, value))
        });
        rebuild(own.unwrap_or(&empty), entries, &self.separator)
    }
}
