//! Sign entries and recognition candidates.

use serde::{Deserialize, Serialize};

/// Which reference table a sign came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SignCategory {
    /// Fingerspelled letters.
    #[default]
    Alphabet,
    /// Common words and phrases.
    Words,
    /// Counting signs.
    Numbers,
}

impl SignCategory {
    /// All categories in dictionary merge order.
    pub const ALL: [SignCategory; 3] = [
        SignCategory::Alphabet,
        SignCategory::Words,
        SignCategory::Numbers,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Alphabet => "alphabet",
            Self::Words => "words",
            Self::Numbers => "numbers",
        }
    }
}

impl std::fmt::Display for SignCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.pad(self.as_str())
    }
}

impl std::str::FromStr for SignCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "alphabet" | "letters" => Ok(Self::Alphabet),
            "words" => Ok(Self::Words),
            "numbers" => Ok(Self::Numbers),
            other => Err(format!("unknown sign category: {other}")),
        }
    }
}

/// One reference sign.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignEntry {
    /// Lookup key, unique across all categories.
    pub id: String,

    /// Display name, also what the transcript records.
    pub name: String,

    /// How to form the sign.
    pub description: String,

    /// Reference `(x, y)` pairs compared positionally against features.
    /// Entries without a pattern can never be matched.
    #[serde(default)]
    pub reference_pattern: Vec<(f64, f64)>,

    /// Advisory confidence in (0, 1]. Not a matching threshold.
    pub baseline_confidence: f64,

    /// Assigned from the table the entry was loaded from.
    #[serde(default)]
    pub category: SignCategory,
}

/// Result of one matching pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    pub sign_id: String,
    pub name: String,
    /// Matcher similarity in [0, 1].
    pub confidence: f64,
}

impl Candidate {
    pub fn new(sign_id: impl Into<String>, name: impl Into<String>, confidence: f64) -> Self {
        Self {
            sign_id: sign_id.into(),
            name: name.into(),
            confidence,
        }
    }

    /// Wrap a dictionary entry with a matcher score.
    pub fn from_entry(entry: &SignEntry, confidence: f64) -> Self {
        Self::new(entry.id.clone(), entry.name.clone(), confidence)
    }
}
