//! Learned responses keyed by normalized utterance
//!
//! The store is a flat `utterance -> [answers]` table persisted as pretty JSON.
//! Answers are only ever appended; the whole table is rewritten on every
//! `teach`.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use rand::seq::SliceRandom;

use crate::{Error, Result};

/// Normalize user text into a lookup key (lower-cased, trimmed)
#[must_use]
pub fn normalize(text: &str) -> String {
    text.trim().to_lowercase()
}

/// Persisted table of canned answers
#[derive(Debug, Clone)]
pub struct KnowledgeStore {
    path: Option<PathBuf>,
    entries: BTreeMap<String, Vec<String>>,
}

impl KnowledgeStore {
    /// Open the store backed by `path`
    ///
    /// A missing or unreadable file yields the built-in defaults. Nothing is
    /// written until the first `teach`.
    #[must_use]
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let entries = match load_entries(&path) {
            Ok(Some(entries)) => {
                tracing::info!(path = %path.display(), keys = entries.len(), "loaded knowledge file");
                entries
            }
            Ok(None) => {
                tracing::debug!(path = %path.display(), "no knowledge file, using defaults");
                default_entries()
            }
            Err(e) => {
                tracing::error!(path = %path.display(), error = %e, "failed to load knowledge file, using defaults");
                default_entries()
            }
        };

        Self {
            path: Some(path),
            entries,
        }
    }

    /// Create a store that lives only in memory
    #[must_use]
    pub fn in_memory<I, K, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, Vec<V>)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        let entries = entries
            .into_iter()
            .filter_map(|(k, answers)| {
                let answers: Vec<String> = answers.into_iter().map(Into::into).collect();
                (!answers.is_empty()).then(|| (normalize(k.as_ref()), answers))
            })
            .collect();

        Self {
            path: None,
            entries,
        }
    }

    /// Backing file, if any
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Answers known for an utterance
    #[must_use]
    pub fn lookup(&self, utterance: &str) -> Option<&[String]> {
        self.entries.get(&normalize(utterance)).map(Vec::as_slice)
    }

    /// Pick one of the known answers uniformly at random
    #[must_use]
    pub fn random_answer(&self, utterance: &str) -> Option<&str> {
        self.lookup(utterance)?
            .choose(&mut rand::thread_rng())
            .map(String::as_str)
    }

    /// Number of known utterances
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the store has no utterances
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Append `answer` to the answers for `utterance` and persist the table
    ///
    /// Persistence is best-effort: a failed write is logged and the in-memory
    /// table remains authoritative for the rest of the process.
    pub fn teach(&mut self, utterance: &str, answer: impl Into<String>) {
        let key = normalize(utterance);
        let answer = answer.into();
        tracing::info!(utterance = %key, answer = %answer, "learned new response");
        self.entries.entry(key).or_default().push(answer);

        if let Err(e) = self.save() {
            tracing::error!(error = %e, "failed to save knowledge file");
        }
    }

    /// Rewrite the backing file with the full table
    ///
    /// # Errors
    ///
    /// Returns error if the file cannot be serialized or written
    pub fn save(&self) -> Result<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(&self.entries)?;
        std::fs::write(path, content)?;
        tracing::debug!(path = %path.display(), "knowledge saved");
        Ok(())
    }
}

/// Read the table from disk, `None` if the file does not exist
fn load_entries(path: &Path) -> Result<Option<BTreeMap<String, Vec<String>>>> {
    if !path.exists() {
        return Ok(None);
    }

    let content = std::fs::read_to_string(path)?;
    let raw: BTreeMap<String, Vec<String>> = serde_json::from_str(&content)
        .map_err(|e| Error::Knowledge(format!("invalid knowledge file: {e}")))?;

    // Keys written by hand may not be normalized; empty lists are dropped
    let mut entries: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for (key, answers) in raw {
        if answers.is_empty() {
            continue;
        }
        entries.entry(normalize(&key)).or_default().extend(answers);
    }

    Ok(Some(entries))
}

/// Built-in answers used when no knowledge file is available
fn default_entries() -> BTreeMap<String, Vec<String>> {
    [
        ("hello", vec!["Hello there!", "Hi!", "Greetings!"]),
        ("hi", vec!["Hello!", "Hi there!", "Hey!"]),
        (
            "how are you",
            vec![
                "I'm just a bot, but I'm doing great! How about you?",
                "I'm functioning within normal parameters.",
            ],
        ),
        ("bye", vec!["Goodbye!", "See you later!", "Have a nice day!"]),
        (
            "help",
            vec!["I can chat with you. Try saying 'hello' or 'how are you'. Type 'exit' to quit."],
        ),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v.into_iter().map(str::to_string).collect()))
    .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_trims_and_lowercases() {
        assert_eq!(normalize("  Hello World \n"), "hello world");
    }

    #[test]
    fn lookup_is_normalized() {
        let store = KnowledgeStore::in_memory([("Hello", vec!["Hi!"])]);
        assert_eq!(store.lookup(" HELLO "), Some(&["Hi!".to_string()][..]));
        assert!(store.lookup("goodbye").is_none());
    }

    #[test]
    fn teach_appends_without_replacing() {
        let mut store = KnowledgeStore::in_memory([("hello", vec!["Hi!"])]);
        store.teach("Hello", "Howdy");
        store.teach("hello", "Yo");

        let answers = store.lookup("hello").unwrap();
        assert_eq!(answers, ["Hi!", "Howdy", "Yo"]);
    }

    #[test]
    fn teach_creates_singleton_list() {
        let mut store = KnowledgeStore::in_memory(Vec::<(&str, Vec<&str>)>::new());
        store.teach("what is rust", "A language");
        assert_eq!(store.lookup("what is rust").unwrap(), ["A language"]);
    }

    #[test]
    fn missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let store = KnowledgeStore::open(dir.path().join("knowledge.json"));
        assert!(store.lookup("hello").is_some());
        assert!(store.lookup("bye").is_some());
        assert!(!dir.path().join("knowledge.json").exists());
    }

    #[test]
    fn corrupt_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("knowledge.json");
        std::fs::write(&path, "{ not json").unwrap();

        let store = KnowledgeStore::open(&path);
        assert!(store.lookup("help").is_some());
    }

    #[test]
    fn emptied_file_stays_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("knowledge.json");
        std::fs::write(&path, "{}").unwrap();

        let store = KnowledgeStore::open(&path);
        assert_eq!(store.len(), 0);
        assert!(store.lookup("hello").is_none());
    }

    #[test]
    fn teach_persists_whole_table() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("knowledge.json");

        let mut store = KnowledgeStore::open(&path);
        store.teach("สวัสดี", "สวัสดีครับ");

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.contains("สวัสดีครับ"));

        let reopened = KnowledgeStore::open(&path);
        assert_eq!(reopened.lookup("สวัสดี").unwrap(), ["สวัสดีครับ"]);
        assert!(reopened.lookup("hello").is_some());
    }

    #[test]
    fn failed_save_keeps_memory_state() {
        let dir = tempfile::tempdir().unwrap();
        // A directory at the target path makes the write fail
        let path = dir.path().join("knowledge.json");
        std::fs::create_dir(&path).unwrap();

        let mut store = KnowledgeStore {
            path: Some(path),
            entries: BTreeMap::new(),
        };
        store.teach("ping", "pong");
        assert_eq!(store.lookup("ping").unwrap(), ["pong"]);
    }

    #[test]
    fn random_answer_is_member() {
        let store = KnowledgeStore::in_memory([("hi", vec!["a", "b", "c"])]);
        for _ in 0..20 {
            let answer = store.random_answer("hi").unwrap();
            assert!(["a", "b", "c"].contains(&answer));
        }
    }
}
