// Tiny INI reader/renderer for the two config files.
// Only the subset the config files use is supported: `[section]` headers,
// `key = value` (or `key: value`) pairs and `#`/`;` comment lines. Keys are
// case-insensitive, matching how the files have always been read.

use std::collections::HashMap;

/// Parsed INI document: section name -> (lowercased key -> value).
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Ini {
    sections: HashMap<String, HashMap<String, String>>,
}

/// Position and reason of a malformed line.
#[derive(Debug, Clone, PartialEq)]
pub struct ParseError {
    pub line: usize,
    pub message: String,
}

impl Ini {
    pub fn parse(text: &str) -> Result<Self, ParseError> {
        let mut ini = Ini::default();
        let mut current: Option<String> = None;

        for (idx, raw) in text.lines().enumerate() {
            let line = raw.trim();
            if line.is_empty() || line.starts_with('#') || line.starts_with(';') {
                continue;
            }

            if let Some(rest) = line.strip_prefix('[') {
                let name = rest.strip_suffix(']').ok_or_else(|| ParseError {
                    line: idx + 1,
                    message: format!("unterminated section header `{}`", line),
                })?;
                let name = name.trim().to_string();
                ini.sections.entry(name.clone()).or_default();
                current = Some(name);
                continue;
            }

            let section = current.as_ref().ok_or_else(|| ParseError {
                line: idx + 1,
                message: "key found before any [section] header".into(),
            })?;
            let split = line.find(|c: char| c == '=' || c == ':').ok_or_else(|| ParseError {
                line: idx + 1,
                message: format!("expected `key = value`, got `{}`", line),
            })?;
            let key = line[..split].trim().to_lowercase();
            let value = line[split + 1..].trim().to_string();
            if key.is_empty() {
                return Err(ParseError {
                    line: idx + 1,
                    message: "empty key".into(),
                });
            }
            ini.sections
                .entry(section.clone())
                .or_default()
                .insert(key, value);
        }

        Ok(ini)
    }

    pub fn get(&self, section: &str, key: &str) -> Option<&str> {
        self.sections
            .get(section)?
            .get(&key.to_lowercase())
            .map(String::as_str)
    }
}

/// Render a single section. No trailing newline, so the output is exactly
/// what gets written to disk.
pub fn render(section: &str, pairs: &[(&str, &str)]) -> String {
    let mut out = format!("[{}]", section);
    for (key, value) in pairs {
        out.push_str(&format!("\n{} = {}", key, value));
    }
    out
}
