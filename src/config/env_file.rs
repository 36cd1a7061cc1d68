//! Flat `KEY=VALUE` store, the `.env` file next to the bot deployment.

use std::collections::HashMap;
use std::path::Path;

/// Parsed env file. Comment lines (leading `#`) and blanks are ignored,
/// surrounding quotes are stripped, later duplicates of a key win.
#[derive(Debug, Clone, Default)]
pub struct EnvFile {
    values: HashMap<String, String>,
}

impl EnvFile {
    /// Read and parse `path`. A missing file is an empty store, not an
    /// error; an unreadable file is logged once and treated the same.
    pub fn load(path: &Path) -> Self {
        if !path.exists() {
            return Self::default();
        }
        match std::fs::read_to_string(path) {
            Ok(contents) => Self::parse(&contents),
            Err(e) => {
                tracing::warn!("could not read {}: {e}", path.display());
                Self::default()
            }
        }
    }

    pub fn parse(contents: &str) -> Self {
        let mut values = HashMap::new();
        for line in contents.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let Some((key, value)) = line.split_once('=') else {
                continue;
            };
            let key = key.trim().to_string();
            let value = value.trim().trim_matches('"').trim_matches('\'').to_string();
            values.insert(key, value);
        }
        Self { values }
    }

    /// Empty values count as absent, so they fall through to the next
    /// configuration source.
    pub fn get(&self, key: &str) -> Option<String> {
        self.values.get(key).filter(|v| !v.is_empty()).cloned()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_plain_pairs() {
        let file = EnvFile::parse("TELEGRAM_BOT_TOKEN=123:abc\nWORKER_URL=x.dev\n");
        assert_eq!(file.get("TELEGRAM_BOT_TOKEN").as_deref(), Some("123:abc"));
        assert_eq!(file.get("WORKER_URL").as_deref(), Some("x.dev"));
    }

    #[test]
    fn strips_surrounding_quotes() {
        let file = EnvFile::parse("A=\"quoted\"\nB='single'\n");
        assert_eq!(file.get("A").as_deref(), Some("quoted"));
        assert_eq!(file.get("B").as_deref(), Some("single"));
    }

    #[test]
    fn skips_comments_and_blanks() {
        let file = EnvFile::parse("# comment\n\n  # indented comment\nKEY=value\n");
        assert_eq!(file.get("KEY").as_deref(), Some("value"));
        assert!(file.get("comment").is_none());
    }

    #[test]
    fn splits_on_first_equals_only() {
        let file = EnvFile::parse("URL=https://x.dev/?a=b\n");
        assert_eq!(file.get("URL").as_deref(), Some("https://x.dev/?a=b"));
    }

    #[test]
    fn later_duplicate_wins() {
        let file = EnvFile::parse("KEY=first\nKEY=second\n");
        assert_eq!(file.get("KEY").as_deref(), Some("second"));
    }

    #[test]
    fn empty_value_counts_as_absent() {
        let file = EnvFile::parse("KEY=\nOTHER=\"\"\n");
        assert!(file.get("KEY").is_none());
        assert!(file.get("OTHER").is_none());
    }

    #[test]
    fn lines_without_equals_are_ignored() {
        let file = EnvFile::parse("not a pair\nKEY=value\n");
        assert_eq!(file.get("KEY").as_deref(), Some("value"));
    }

    #[test]
    fn missing_file_loads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let file = EnvFile::load(&dir.path().join("absent.env"));
        assert!(file.is_empty());
    }

    #[test]
    fn load_reads_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(".env");
        std::fs::write(&path, "WORKER_URL=example.workers.dev\n").unwrap();
        let file = EnvFile::load(&path);
        assert_eq!(file.get("WORKER_URL").as_deref(), Some("example.workers.dev"));
    }
}
