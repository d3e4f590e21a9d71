//! The sign dictionary.
//!
//! Built once from three category tables (alphabet, words, numbers) and
//! immutable afterwards. Ids must be unique across the union; a duplicate
//! is a data defect and fails the load.

use std::collections::HashMap;
use std::path::Path;

use handsign_common::error::{HandsignError, HandsignResult};
use serde::{Deserialize, Serialize};

use crate::sign::{SignCategory, SignEntry};

/// Schema version of the built-in sign table.
pub const DICTIONARY_SCHEMA_VERSION: &str = "1.0";

const BUILTIN_SIGNS: &str = include_str!("../data/signs.json");

/// On-disk layout of a sign table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignTable {
    /// Table version for forward compatibility.
    pub version: String,

    #[serde(default)]
    pub alphabet: Vec<SignEntry>,

    #[serde(default)]
    pub words: Vec<SignEntry>,

    #[serde(default)]
    pub numbers: Vec<SignEntry>,
}

/// Read-only, id-unique union of all sign categories.
///
/// Iteration order is alphabet, then words, then numbers, each in table
/// order. Matchers rely on this order for tie-breaking.
#[derive(Debug, Clone)]
pub struct SignDictionary {
    version: String,
    entries: Vec<SignEntry>,
    index: HashMap<String, usize>,
}

impl SignDictionary {
    /// The reference ASL table shipped with the crate.
    pub fn builtin() -> HandsignResult<Self> {
        Self::from_json(BUILTIN_SIGNS)
    }

    /// Load a sign table from a JSON file.
    pub fn load(path: &Path) -> HandsignResult<Self> {
        if !path.exists() {
            return Err(HandsignError::FileNotFound {
                path: path.to_path_buf(),
            });
        }
        let content = std::fs::read_to_string(path)?;
        let dictionary = Self::from_json(&content)?;
        tracing::info!(
            path = %path.display(),
            version = %dictionary.version,
            signs = dictionary.len(),
            "Loaded sign dictionary"
        );
        Ok(dictionary)
    }

    /// Parse a sign table from JSON text.
    pub fn from_json(json: &str) -> HandsignResult<Self> {
        let table: SignTable = serde_json::from_str(json)?;
        Self::from_table(table)
    }

    /// Build from a parsed table.
    pub fn from_table(table: SignTable) -> HandsignResult<Self> {
        Self::from_categories(table.version, table.alphabet, table.words, table.numbers)
    }

    /// Merge the three category tables, validating every entry.
    ///
    /// Each entry's `category` is overwritten with the table it came from.
    pub fn from_categories(
        version: impl Into<String>,
        alphabet: Vec<SignEntry>,
        words: Vec<SignEntry>,
        numbers: Vec<SignEntry>,
    ) -> HandsignResult<Self> {
        let mut entries = Vec::with_capacity(alphabet.len() + words.len() + numbers.len());
        let mut index = HashMap::with_capacity(entries.capacity());

        let tables = [
            (SignCategory::Alphabet, alphabet),
            (SignCategory::Words, words),
            (SignCategory::Numbers, numbers),
        ];

        for (category, table) in tables {
            for mut entry in table {
                entry.category = category;
                validate_entry(&entry)?;

                if let Some(&existing) = index.get(&entry.id) {
                    let previous: &SignEntry = &entries[existing];
                    return Err(HandsignError::dictionary(format!(
                        "duplicate sign id '{}' in {} (already defined in {})",
                        entry.id, category, previous.category
                    )));
                }

                index.insert(entry.id.clone(), entries.len());
                entries.push(entry);
            }
        }

        Ok(Self {
            version: version.into(),
            entries,
            index,
        })
    }

    /// Look up a sign by id.
    pub fn get(&self, id: &str) -> Option<&SignEntry> {
        self.index.get(id).map(|&i| &self.entries[i])
    }

    /// Case-insensitive substring search over descriptions.
    ///
    /// An empty query matches every entry.
    pub fn search_description(&self, query: &str) -> Vec<&SignEntry> {
        let needle = query.to_lowercase();
        self.entries
            .iter()
            .filter(|entry| entry.description.to_lowercase().contains(&needle))
            .collect()
    }

    /// Entries belonging to one category, in table order.
    pub fn category(&self, category: SignCategory) -> impl Iterator<Item = &SignEntry> {
        self.entries.iter().filter(move |e| e.category == category)
    }

    /// All entries in dictionary order.
    pub fn entries(&self) -> &[SignEntry] {
        &self.entries
    }

    pub fn iter(&self) -> std::slice::Iter<'_, SignEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Version string of the table this dictionary was built from.
    pub fn version(&self) -> &str {
        &self.version
    }
}

impl<'a> IntoIterator for &'a SignDictionary {
    type Item = &'a SignEntry;
    type IntoIter = std::slice::Iter<'a, SignEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

fn validate_entry(entry: &SignEntry) -> HandsignResult<()> {
    if entry.id.trim().is_empty() {
        return Err(HandsignError::dictionary(format!(
            "sign '{}' in {} has an empty id",
            entry.name, entry.category
        )));
    }
    let c = entry.baseline_confidence;
    if !(c > 0.0 && c <= 1.0) {
        return Err(HandsignError::dictionary(format!(
            "sign '{}' has baseline_confidence {c}, expected (0, 1]",
            entry.id
        )));
    }
    if entry
        .reference_pattern
        .iter()
        .any(|(x, y)| !x.is_finite() || !y.is_finite())
    {
        return Err(HandsignError::dictionary(format!(
            "sign '{}' has a non-finite reference pattern value",
            entry.id
        )));
    }
    Ok(())
}
