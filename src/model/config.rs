use serde::{Deserialize, Serialize};

/// The closed sets of state keywords a heading line may carry.
///
/// A token is only treated as a state keyword if it appears in one of these
/// sets; anything else is title text. `open` keywords mark actionable
/// headings, `done` keywords mark finished ones.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeywordSet {
    #[serde(default = "default_open")]
    pub open: Vec<String>,
    #[serde(default = "default_done")]
    pub done: Vec<String>,
}

fn default_open() -> Vec<String> {
    ["TODO", "NEXT", "WAITING", "SOMEDAY", "PROJECT"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn default_done() -> Vec<String> {
    ["DONE", "CANCELLED"].iter().map(|s| s.to_string()).collect()
}

impl Default for KeywordSet {
    fn default() -> Self {
        KeywordSet {
            open: default_open(),
            done: default_done(),
        }
    }
}

impl KeywordSet {
    /// Whether `word` is a known state keyword (open or done).
    pub fn contains(&self, word: &str) -> bool {
        self.open.iter().any(|k| k == word) || self.done.iter().any(|k| k == word)
    }

    /// Whether `word` marks a finished heading.
    pub fn is_done(&self, word: &str) -> bool {
        self.done.iter().any(|k| k == word)
    }

    /// The keyword a rescheduled recurring heading is reset to.
    pub fn first_open(&self) -> &str {
        self.open.first().map(|s| s.as_str()).unwrap_or("TODO")
    }
}

/// Corpus-level configuration, read from `grove.toml` at the corpus root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub keywords: KeywordSet,
    /// File extension of documents included in corpus scans.
    pub extension: String,
    /// Seconds before the identifier corpus index is considered stale.
    pub id_cache_ttl_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            keywords: KeywordSet::default(),
            extension: "org".to_string(),
            id_cache_ttl_secs: 300,
        }
    }
}
