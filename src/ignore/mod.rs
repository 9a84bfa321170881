//! Ignore module - `.cloudignore` pattern loading and matching.
//!
//! Patterns are matched as regexes anchored at the start of the relative
//! path, so `dist` ignores `dist/bundle.js` but also `distant.txt`. Lines
//! starting with `//` are comments.

use anyhow::{Context, Result};
use regex::Regex;
use std::path::Path;

/// Pattern that can never match anything. Used when no `.cloudignore`
/// exists, so every path stays eligible for sync.
const MATCH_NOTHING: &str = "a^";

/// Compiled ignore patterns from `.cloudignore`
pub struct IgnoreList {
    patterns: Vec<Regex>,
}

impl IgnoreList {
    /// Load patterns from the ignore file. A missing file yields the
    /// match-nothing sentinel; a malformed pattern is a configuration
    /// error and fails the run.
    pub fn load(path: &Path) -> Result<Self> {
        let data = match std::fs::read_to_string(path) {
            Ok(data) => data,
            Err(_) => return Self::from_lines([MATCH_NOTHING]),
        };
        Self::from_lines(data.lines())
    }

    /// Compile an explicit set of pattern lines
    pub fn from_lines<I, S>(lines: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut patterns = Vec::new();
        for line in lines {
            let line = line.as_ref();
            // empty lines and // comments are inactive
            if line.is_empty() || line.starts_with("//") {
                continue;
            }
            let re = Regex::new(&format!("^{line}"))
                .with_context(|| format!("invalid ignore pattern: {line}"))?;
            patterns.push(re);
        }
        Ok(Self { patterns })
    }

    /// True when any pattern matches the start of the relative path.
    /// First match short-circuits.
    pub fn is_ignored(&self, relative_path: &str) -> bool {
        self.patterns.iter().any(|re| re.is_match(relative_path))
    }
}
