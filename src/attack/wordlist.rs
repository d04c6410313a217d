//! Candidate wordlist loading and rule-based expansion.
//!
//! Wordlists are decoded permissively (invalid byte runs dropped) so the
//! scavenged lists with mixed encodings still load. The rule engine expands
//! each word with the usual suffix, prefix, and mangling transforms.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use thiserror::Error;

const SUFFIXES: &[&str] = &[
    "123", "!", "@", "#", "$", "%", "^", "&", "*", "()", "2023", "2024", "2025", "01", "02", "1",
    "2", "00",
];

const PREFIXES: &[&str] = &["admin", "root", "user", "test", "temp", "super"];

#[derive(Debug, Error)]
pub enum WordlistError {
    #[error("failed to read wordlist {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Loads candidates in file order, one per line, skipping empty lines.
/// Duplicates are kept; downstream engines treat each occurrence as its
/// own attempt.
pub fn load(path: impl AsRef<Path>) -> Result<Vec<String>, WordlistError> {
    let path = path.as_ref();
    let bytes = std::fs::read(path).map_err(|source| WordlistError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let candidates = parse(&bytes);
    log::info!(
        "loaded {} candidates from {}",
        candidates.len(),
        path.display()
    );
    Ok(candidates)
}

/// Splits raw bytes into trimmed candidate lines.
pub fn parse(bytes: &[u8]) -> Vec<String> {
    bytes
        .split(|byte| *byte == b'\n')
        .map(decode_dropping)
        .map(|line| line.trim().to_string())
        .filter(|line| !line.is_empty())
        .collect()
}

/// Lossy UTF-8 decode that drops invalid byte runs instead of replacing
/// them, so mangled candidates keep only their decodable characters.
fn decode_dropping(mut bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len());
    loop {
        match std::str::from_utf8(bytes) {
            Ok(valid) => {
                out.push_str(valid);
                return out;
            }
            Err(err) => {
                let (valid, rest) = bytes.split_at(err.valid_up_to());
                if let Ok(prefix) = std::str::from_utf8(valid) {
                    out.push_str(prefix);
                }
                let skip = err.error_len().unwrap_or(rest.len());
                if skip >= rest.len() {
                    return out;
                }
                bytes = &rest[skip..];
            }
        }
    }
}

/// Applies the standard mangling rules to every word.
#[derive(Debug, Clone, Copy, Default)]
pub struct RuleEngine;

impl RuleEngine {
    pub fn new() -> Self {
        Self
    }

    /// All variants of one word, identity first.
    pub fn expand(&self, word: &str) -> Vec<String> {
        let mut variants = Vec::with_capacity(SUFFIXES.len() + PREFIXES.len() + 7);
        variants.push(word.to_string());
        for suffix in SUFFIXES {
            variants.push(format!("{word}{suffix}"));
        }
        for prefix in PREFIXES {
            variants.push(format!("{prefix}{word}"));
        }
        variants.push(word.to_uppercase());
        variants.push(capitalize(word));
        variants.push(word.to_lowercase());
        variants.push(format!("{word}{word}"));
        variants.push(word.chars().rev().collect());
        variants.push(leetspeak(word));
        variants
    }

    /// Expands every word, deduplicated preserving first-seen order so the
    /// output stays a stable attempt sequence.
    pub fn enhance(&self, words: &[String]) -> Vec<String> {
        let mut seen = HashSet::new();
        let mut out = Vec::new();
        for word in words {
            for variant in self.expand(word) {
                if seen.insert(variant.clone()) {
                    out.push(variant);
                }
            }
        }
        out
    }
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + &chars.as_str().to_lowercase(),
        None => String::new(),
    }
}

fn leetspeak(word: &str) -> String {
    word.chars()
        .map(|c| match c.to_ascii_lowercase() {
            'a' => '@',
            'e' => '3',
            'i' => '1',
            'o' => '0',
            's' => '$',
            _ => c,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_lines_and_skips_blanks() {
        let words = parse(b"alpha\n\nbeta\r\n  \ngamma");
        assert_eq!(words, vec!["alpha", "beta", "gamma"]);
    }

    #[test]
    fn keeps_duplicates_in_order() {
        let words = parse(b"admin\nadmin\nroot");
        assert_eq!(words, vec!["admin", "admin", "root"]);
    }

    #[test]
    fn drops_invalid_utf8_runs() {
        // "caf<0xff><0xfe>e" decodes to "cafe", not "caf\u{fffd}\u{fffd}e".
        let words = parse(b"caf\xff\xfee\nplain");
        assert_eq!(words, vec!["cafe", "plain"]);
    }

    #[test]
    fn truncated_multibyte_at_end_is_dropped() {
        // 0xE2 0x82 is a truncated three-byte sequence.
        let words = parse(b"euro\xe2\x82");
        assert_eq!(words, vec!["euro"]);
    }

    #[test]
    fn expansion_covers_the_transform_table() {
        let variants = RuleEngine::new().expand("Pass");
        assert_eq!(variants[0], "Pass");
        assert!(variants.contains(&"Pass123".to_string()));
        assert!(variants.contains(&"adminPass".to_string()));
        assert!(variants.contains(&"PASS".to_string()));
        assert!(variants.contains(&"pass".to_string()));
        assert!(variants.contains(&"PassPass".to_string()));
        assert!(variants.contains(&"ssaP".to_string()));
        assert!(variants.contains(&"P@$$".to_string()));
    }

    #[test]
    fn enhance_dedups_preserving_first_seen_order() {
        let words = vec!["admin".to_string(), "admin".to_string()];
        let enhanced = RuleEngine::new().enhance(&words);
        let once = RuleEngine::new().enhance(&words[..1].to_vec());
        assert_eq!(enhanced, once);
        assert_eq!(enhanced[0], "admin");
    }

    #[test]
    fn loads_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("words.txt");
        std::fs::write(&path, "one\ntwo\n").unwrap();
        assert_eq!(load(&path).unwrap(), vec!["one", "two"]);
        assert!(load(dir.path().join("missing.txt")).is_err());
    }
}
