//! `-key=value` argument tokenizer. A boundary collaborator per the
//! design (only its interface to the command layer matters), but a
//! concrete implementation is needed to drive the commands.

use std::collections::HashMap;

/// Splits a raw argument string into a case-insensitive key/value map.
/// Keys are lower-cased; `-key="value with spaces"` keeps the quoted
/// text intact (including spaces), unquoted values run to the next
/// whitespace.
pub fn tokenize(raw: &str) -> HashMap<String, String> {
    let mut out = HashMap::new();
    let chars: Vec<char> = raw.chars().collect();
    let mut i = 0;
    while i < chars.len() {
        if chars[i] != '-' {
            i += 1;
            continue;
        }
        i += 1;
        let key_start = i;
        while i < chars.len() && chars[i] != '=' && !chars[i].is_whitespace() {
            i += 1;
        }
        let key: String = chars[key_start..i].iter().collect::<String>().to_lowercase();
        if key.is_empty() {
            continue;
        }
        if i >= chars.len() || chars[i] != '=' {
            out.insert(key, String::new());
            continue;
        }
        i += 1; // skip '='
        let value = if i < chars.len() && chars[i] == '"' {
            i += 1;
            let val_start = i;
            while i < chars.len() && chars[i] != '"' {
                i += 1;
            }
            let v: String = chars[val_start..i].iter().collect();
            if i < chars.len() {
                i += 1; // skip closing quote
            }
            v
        } else {
            let val_start = i;
            while i < chars.len() && !chars[i].is_whitespace() {
                i += 1;
            }
            chars[val_start..i].iter().collect()
        };
        out.insert(key, value);
    }
    out
}

pub struct Args(pub HashMap<String, String>);

impl Args {
    pub fn parse(raw: &str) -> Self {
        Args(tokenize(raw))
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(|s| s.as_str())
    }

    pub fn require(&self, key: &str) -> Result<&str, crate::error::FsError> {
        self.get(key)
            .filter(|v| !v.is_empty())
            .ok_or_else(|| crate::error::FsError::argument(format!("missing required flag -{key}")))
    }

    pub fn get_or(&self, key: &str, default: &str) -> String {
        self.get(key).unwrap_or(default).to_string()
    }

    pub fn has(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn require_i64(&self, key: &str) -> Result<i64, crate::error::FsError> {
        self.require(key)?
            .parse::<i64>()
            .map_err(|_| crate::error::FsError::argument(format!("invalid numeric value for -{key}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_simple_flags() {
        let args = Args::parse("-path=/tmp/d.mia -size=5 -unit=M");
        assert_eq!(args.get("path"), Some("/tmp/d.mia"));
        assert_eq!(args.get("size"), Some("5"));
        assert_eq!(args.get("unit"), Some("M"));
    }

    #[test]
    fn parses_quoted_values_with_spaces() {
        let args = Args::parse(r#"-name="My Disk" -size=5"#);
        assert_eq!(args.get("name"), Some("My Disk"));
    }

    #[test]
    fn keys_are_case_insensitive() {
        let args = Args::parse("-PATH=/x -Size=5");
        assert_eq!(args.get("path"), Some("/x"));
        assert_eq!(args.get("size"), Some("5"));
    }

    #[test]
    fn flag_without_value_is_present_with_empty_string() {
        let args = Args::parse("-path=/x -p");
        assert!(args.has("p"));
        assert_eq!(args.get("p"), Some(""));
    }

    #[test]
    fn require_rejects_missing_flags() {
        let args = Args::parse("-path=/x");
        assert!(args.require("size").is_err());
    }
}
