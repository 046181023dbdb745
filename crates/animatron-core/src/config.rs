//! Sectioned key/value configuration text
//!
//! The format is a lenient INI dialect:
//!
//! ```text
//! ; comment
//! [legs.walk]
//! triggers=CONTROLLER_FORWARD
//! steps=
//! |Move;Block;Hip;90;1;2;Wait
//! |Move;Block;Hip;0;1;2;Wait
//! ```
//!
//! Lines starting with `|` continue the previous key, joined with newlines.
//! Sections and keys keep their declaration order. Comments and lines the
//! parser does not understand are kept in place and written back out, so a
//! parse/serialize cycle only normalises blank lines.

use glam::{Vec2, Vec3};
use indexmap::IndexMap;
use std::fmt;

/// One line of a section as it was written
#[derive(Debug, Clone, PartialEq)]
enum Entry {
    Key(String),
    /// Comment or unrecognised line, kept verbatim
    Raw(String),
}

#[derive(Debug, Clone, Default, PartialEq)]
struct Section {
    values: IndexMap<String, String>,
    layout: Vec<Entry>,
}

impl Section {
    fn set(&mut self, key: &str, value: String) {
        if self.values.insert(key.to_string(), value).is_none() {
            self.layout.push(Entry::Key(key.to_string()));
        }
    }
}

/// Ordered INI store with typed getters
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConfigStore {
    /// Raw lines before the first section
    preamble: Vec<String>,
    sections: IndexMap<String, Section>,
}

impl ConfigStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse configuration text. Unrecognised lines are kept but not interpreted.
    pub fn parse(text: &str) -> Self {
        let mut store = Self::new();
        let mut current_section: Option<String> = None;
        let mut current_key: Option<String> = None;

        for raw_line in text.lines() {
            let line = raw_line.trim();
            if line.is_empty() {
                continue;
            }

            if let Some(continuation) = line.strip_prefix('|') {
                let value = match (&current_section, &current_key) {
                    (Some(section), Some(key)) => store
                        .sections
                        .get_mut(section)
                        .and_then(|entries| entries.values.get_mut(key)),
                    _ => None,
                };
                match value {
                    Some(value) => {
                        if !value.is_empty() {
                            value.push('\n');
                        }
                        value.push_str(continuation);
                    }
                    None => store.keep_raw(current_section.as_deref(), raw_line),
                }
                continue;
            }

            if line.starts_with(';') || line.starts_with('#') {
                store.keep_raw(current_section.as_deref(), raw_line);
                continue;
            }

            if line.starts_with('[') && line.ends_with(']') && line.len() >= 2 {
                let section = line[1..line.len() - 1].trim().to_string();
                store.sections.entry(section.clone()).or_default();
                current_section = Some(section);
                current_key = None;
                continue;
            }

            match (line.split_once('='), &current_section) {
                (Some((key, value)), Some(section)) if !key.trim().is_empty() => {
                    let key = key.trim();
                    store.set(section, key, value.trim());
                    current_key = Some(key.to_string());
                }
                (Some((key, _)), None) => {
                    log::debug!("ignoring key '{}' outside of any section", key.trim());
                    store.keep_raw(None, raw_line);
                }
                _ => store.keep_raw(current_section.as_deref(), raw_line),
            }
        }

        store
    }

    fn keep_raw(&mut self, section: Option<&str>, line: &str) {
        let line = line.trim_end().to_string();
        match section.and_then(|name| self.sections.get_mut(name)) {
            Some(section) => section.layout.push(Entry::Raw(line)),
            None => self.preamble.push(line),
        }
    }

    /// Raw value of a key
    pub fn get(&self, section: &str, key: &str) -> Option<&str> {
        self.sections
            .get(section)
            .and_then(|entries| entries.values.get(key))
            .map(String::as_str)
    }

    /// Set a key, creating the section if needed
    pub fn set(&mut self, section: &str, key: &str, value: impl Into<String>) {
        self.sections
            .entry(section.to_string())
            .or_default()
            .set(key, value.into());
    }

    /// Check if a section exists
    pub fn has_section(&self, section: &str) -> bool {
        self.sections.contains_key(section)
    }

    /// Section names in declaration order
    pub fn sections(&self) -> impl Iterator<Item = &str> {
        self.sections.keys().map(String::as_str)
    }

    /// Keys and values of one section
    pub fn section(&self, section: &str) -> Option<&IndexMap<String, String>> {
        self.sections.get(section).map(|entries| &entries.values)
    }

    // === Typed getters ===

    /// Raw value, or `default` if the key is missing
    pub fn get_or<'a>(&'a self, section: &str, key: &str, default: &'a str) -> &'a str {
        self.get(section, key).unwrap_or(default)
    }

    pub fn get_bool(&self, section: &str, key: &str, default: bool) -> bool {
        self.typed(section, key, default, |value| {
            match value.to_ascii_lowercase().as_str() {
                "true" => Some(true),
                "false" => Some(false),
                _ => None,
            }
        })
    }

    pub fn get_f32(&self, section: &str, key: &str, default: f32) -> f32 {
        self.typed(section, key, default, |value| value.parse().ok())
    }

    pub fn get_i32(&self, section: &str, key: &str, default: i32) -> i32 {
        self.typed(section, key, default, |value| value.parse().ok())
    }

    /// A `x,y` pair
    pub fn get_vec2(&self, section: &str, key: &str, default: Vec2) -> Vec2 {
        self.typed(section, key, default, |value| {
            parse_components::<2>(value).map(Vec2::from_array)
        })
    }

    /// A `x,y,z` triple
    pub fn get_vec3(&self, section: &str, key: &str, default: Vec3) -> Vec3 {
        self.typed(section, key, default, |value| {
            parse_components::<3>(value).map(Vec3::from_array)
        })
    }

    /// Split a value on `separator`, dropping empty entries
    pub fn get_list(&self, section: &str, key: &str, separator: char) -> Vec<String> {
        self.get(section, key)
            .map(|value| {
                value
                    .split(separator)
                    .map(str::trim)
                    .filter(|entry| !entry.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default()
    }

    fn typed<T>(
        &self,
        section: &str,
        key: &str,
        default: T,
        parse: impl FnOnce(&str) -> Option<T>,
    ) -> T {
        let Some(value) = self.get(section, key) else {
            return default;
        };
        let value = value.trim();
        if value.is_empty() {
            return default;
        }
        parse(value).unwrap_or_else(|| {
            log::warn!("[{section}] {key}: cannot read '{value}', using default");
            default
        })
    }
}

fn parse_components<const N: usize>(value: &str) -> Option<[f32; N]> {
    let parts: Vec<&str> = value.split(',').collect();
    if parts.len() != N {
        return None;
    }
    let mut components = [0.0; N];
    for (component, part) in components.iter_mut().zip(parts) {
        *component = part.trim().parse().ok()?;
    }
    Some(components)
}

impl fmt::Display for ConfigStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for line in &self.preamble {
            writeln!(f, "{line}")?;
        }
        for (index, (name, section)) in self.sections.iter().enumerate() {
            if index > 0 || !self.preamble.is_empty() {
                writeln!(f)?;
            }
            writeln!(f, "[{name}]")?;
            for entry in &section.layout {
                let key = match entry {
                    Entry::Raw(line) => {
                        writeln!(f, "{line}")?;
                        continue;
                    }
                    Entry::Key(key) => key,
                };
                let value = section.values.get(key).map(String::as_str).unwrap_or_default();
                if value.contains('\n') {
                    writeln!(f, "{key}=")?;
                    for line in value.lines() {
                        writeln!(f, "|{line}")?;
                    }
                } else {
                    writeln!(f, "{key}={value}")?;
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
; walker
[animation]
definitions=
|Leg Data
|Arm Data
controllerDeadzonePercentage=15

[legs.walk]
triggers=CONTROLLER_FORWARD
repeat=true
steps=
|Move;Block;Hip;90;1;2;Wait
|Move;Block;Hip;0;1;2;Wait
";

    #[test]
    fn test_parse_sections_in_order() {
        let store = ConfigStore::parse(SAMPLE);
        let sections: Vec<&str> = store.sections().collect();
        assert_eq!(sections, vec!["animation", "legs.walk"]);
        assert_eq!(store.get("legs.walk", "triggers"), Some("CONTROLLER_FORWARD"));
    }

    #[test]
    fn test_continuation_lines() {
        let store = ConfigStore::parse(SAMPLE);
        assert_eq!(
            store.get("legs.walk", "steps"),
            Some("Move;Block;Hip;90;1;2;Wait\nMove;Block;Hip;0;1;2;Wait")
        );
        assert_eq!(
            store.get_list("animation", "definitions", '\n'),
            vec!["Leg Data", "Arm Data"]
        );
    }

    #[test]
    fn test_typed_getters_fall_back() {
        let mut store = ConfigStore::parse(SAMPLE);
        store.set("animation", "rollSensitivity", "fast");
        store.set("animation", "rotationSensitivity", "3, 4");

        assert_eq!(store.get_f32("animation", "controllerDeadzonePercentage", 10.0), 15.0);
        assert_eq!(store.get_f32("animation", "rollSensitivity", 1.0), 1.0);
        assert_eq!(store.get_f32("animation", "missing", 2.5), 2.5);
        assert!(store.get_bool("legs.walk", "repeat", false));
        assert_eq!(
            store.get_vec2("animation", "rotationSensitivity", Vec2::ZERO),
            Vec2::new(3.0, 4.0)
        );
        assert_eq!(store.get_vec3("animation", "missing", Vec3::ONE), Vec3::ONE);
    }

    #[test]
    fn test_serialize_round_trip() {
        let store = ConfigStore::parse(SAMPLE);
        let text = store.to_string();
        assert!(text.contains("steps=\n|Move;Block;Hip;90;1;2;Wait\n"));
        assert_eq!(ConfigStore::parse(&text), store);
    }

    #[test]
    fn test_comments_survive_round_trip() {
        let text = "\
; walker rig, keep legs in sync
stray=outside
[animation]
# tuned for the big seat
controllerDeadzonePercentage=25
not a key line

[lamp.on]
steps=Toggle;Block;Lamp;true
; trailing note
";
        let mut store = ConfigStore::parse(text);
        assert_eq!(store.get("animation", "controllerDeadzonePercentage"), Some("25"));
        assert_eq!(store.get("animation", "not a key line"), None);

        store.set("lamp.off", "steps", "Toggle;Block;Lamp;false");
        let written = store.to_string();
        assert_eq!(
            written,
            "\
; walker rig, keep legs in sync
stray=outside

[animation]
# tuned for the big seat
controllerDeadzonePercentage=25
not a key line

[lamp.on]
steps=Toggle;Block;Lamp;true
; trailing note

[lamp.off]
steps=Toggle;Block;Lamp;false
"
        );
        assert_eq!(ConfigStore::parse(&written), store);
    }

    #[test]
    fn test_equals_sign_in_value() {
        let store = ConfigStore::parse("[a]\nkey=x=y");
        assert_eq!(store.get("a", "key"), Some("x=y"));
    }
}
