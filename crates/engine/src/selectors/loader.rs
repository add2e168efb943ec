// ABOUTME: Loads and validates selector configurations from files, inline YAML/JSON, or structured values.
// ABOUTME: All validation happens here; errors name the definition path and field that failed.

//! Configuration loader.
//!
//! The accepted document is either a sequence of definitions or a mapping
//! with `name`, `description` and `definitions`. Each definition is a mapping
//! with `selector` and `name` (required), and optionally `note`,
//! `preserve_html`, `expect_single`, `attr` and `children`. YAML is parsed
//! with `serde_yaml`, which also accepts JSON.
//!
//! Selectors are compiled into the shared cache while loading, so a
//! configuration that loads will not raise syntax errors at evaluation time.

use std::collections::HashSet;
use std::fs;
use std::path::Path;

use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::error::{ConfigErrorKind, ConfigParseError};
use crate::selectors::compiled::get_or_compile;
use crate::selectors::definition::{SelectorConfiguration, SelectorDefinition};

const DEFINITION_KEYS: &[&str] = &[
    "selector",
    "name",
    "note",
    "preserve_html",
    "expect_single",
    "attr",
    "children",
];

/// Loads a configuration from a file path or, if no such file exists, from
/// the string itself.
pub fn load(source: &str) -> Result<SelectorConfiguration, ConfigParseError> {
    let path = Path::new(source);
    if path.is_file() {
        load_file(path)
    } else {
        parse_str(source)
    }
}

/// Loads a configuration from a YAML or JSON file.
pub fn load_file(path: &Path) -> Result<SelectorConfiguration, ConfigParseError> {
    let text = fs::read_to_string(path).map_err(|e| {
        ConfigParseError::document(ConfigErrorKind::Io(format!("{}: {}", path.display(), e)))
    })?;
    debug!(path = %path.display(), "loading selector configuration");
    parse_str(&text)
}

/// Parses an inline YAML or JSON document.
pub fn parse_str(text: &str) -> Result<SelectorConfiguration, ConfigParseError> {
    let value: Value = serde_yaml::from_str(text).map_err(|e| {
        let msg = match e.location() {
            Some(loc) => format!("{} (line {}, column {})", e, loc.line(), loc.column()),
            None => e.to_string(),
        };
        ConfigParseError::document(ConfigErrorKind::Syntax(msg))
    })?;
    from_value(&value)
}

/// Builds a configuration from already-parsed structured data.
pub fn from_value(value: &Value) -> Result<SelectorConfiguration, ConfigParseError> {
    let config = match value {
        Value::Array(items) => SelectorConfiguration::new(definitions(items, "")?),
        Value::Object(map) => from_mapping(map)?,
        _ => {
            return Err(ConfigParseError::document(ConfigErrorKind::WrongType {
                expected: "sequence of definitions or a mapping with `definitions`",
            }))
        }
    };
    debug!(
        definitions = config.len(),
        selectors = config.selectors().len(),
        "selector configuration loaded"
    );
    Ok(config)
}

fn from_mapping(map: &Map<String, Value>) -> Result<SelectorConfiguration, ConfigParseError> {
    for key in map.keys() {
        if !matches!(key.as_str(), "name" | "description" | "definitions") {
            warn!(key = %key, "ignoring unknown configuration key");
        }
    }
    let name = optional_string(map, "", "name")?;
    let description = optional_string(map, "", "description")?;
    let items = match map.get("definitions") {
        Some(Value::Array(items)) => items,
        Some(_) => {
            return Err(ConfigParseError::new(
                "",
                Some("definitions"),
                ConfigErrorKind::WrongType {
                    expected: "sequence",
                },
            ))
        }
        None => {
            return Err(ConfigParseError::new(
                "",
                Some("definitions"),
                ConfigErrorKind::MissingField,
            ))
        }
    };
    Ok(SelectorConfiguration {
        name,
        description,
        definitions: definitions(items, "definitions")?,
    })
}

/// Validates a sibling list; `prefix` is the path of the list itself.
fn definitions(items: &[Value], prefix: &str) -> Result<Vec<SelectorDefinition>, ConfigParseError> {
    let mut seen = HashSet::new();
    let mut out = Vec::with_capacity(items.len());
    for (i, item) in items.iter().enumerate() {
        let path = format!("{}[{}]", prefix, i);
        let def = definition(item, &path)?;
        if !seen.insert(def.name.clone()) {
            return Err(ConfigParseError::new(
                path,
                Some("name"),
                ConfigErrorKind::DuplicateName(def.name),
            ));
        }
        out.push(def);
    }
    Ok(out)
}

fn definition(item: &Value, path: &str) -> Result<SelectorDefinition, ConfigParseError> {
    let map = item.as_object().ok_or_else(|| {
        ConfigParseError::new(path, None, ConfigErrorKind::WrongType { expected: "mapping" })
    })?;

    for key in map.keys() {
        if !DEFINITION_KEYS.contains(&key.as_str()) {
            warn!(path = %path, key = %key, "ignoring unknown selector key");
        }
    }

    let selector = required_string(map, path, "selector")?;
    if let Err(msg) = get_or_compile(&selector) {
        return Err(ConfigParseError::new(
            path,
            Some("selector"),
            ConfigErrorKind::InvalidSelector(msg),
        ));
    }
    let name = required_string(map, path, "name")?;
    let note = optional_string(map, path, "note")?;
    let preserve_html = optional_bool(map, path, "preserve_html")?;
    let expect_single = optional_bool(map, path, "expect_single")?;
    let attr = optional_string(map, path, "attr")?.map(|a| a.trim().to_string());
    if attr.as_deref().is_some_and(str::is_empty) {
        return Err(ConfigParseError::new(path, Some("attr"), ConfigErrorKind::Empty));
    }

    let children = match map.get("children") {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::Array(items)) => definitions(items, &format!("{}.children", path))?,
        Some(_) => {
            return Err(ConfigParseError::new(
                path,
                Some("children"),
                ConfigErrorKind::WrongType {
                    expected: "sequence",
                },
            ))
        }
    };

    if !children.is_empty() && preserve_html {
        return Err(ConfigParseError::new(
            path,
            Some("preserve_html"),
            ConfigErrorKind::Conflict("only leaf selectors keep markup".to_string()),
        ));
    }
    if !children.is_empty() && attr.is_some() {
        return Err(ConfigParseError::new(
            path,
            Some("attr"),
            ConfigErrorKind::Conflict("only leaf selectors extract attributes".to_string()),
        ));
    }
    if preserve_html && attr.is_some() {
        return Err(ConfigParseError::new(
            path,
            Some("attr"),
            ConfigErrorKind::Conflict("`attr` cannot be combined with `preserve_html`".to_string()),
        ));
    }

    Ok(SelectorDefinition {
        selector,
        name,
        note,
        preserve_html,
        expect_single,
        attr,
        children,
    })
}

fn required_string(
    map: &Map<String, Value>,
    path: &str,
    field: &str,
) -> Result<String, ConfigParseError> {
    match map.get(field) {
        Some(Value::String(s)) if s.trim().is_empty() => {
            Err(ConfigParseError::new(path, Some(field), ConfigErrorKind::Empty))
        }
        Some(Value::String(s)) => Ok(s.trim().to_string()),
        None | Some(Value::Null) => Err(ConfigParseError::new(
            path,
            Some(field),
            ConfigErrorKind::MissingField,
        )),
        Some(_) => Err(ConfigParseError::new(
            path,
            Some(field),
            ConfigErrorKind::WrongType { expected: "string" },
        )),
    }
}

fn optional_string(
    map: &Map<String, Value>,
    path: &str,
    field: &str,
) -> Result<Option<String>, ConfigParseError> {
    match map.get(field) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.clone())),
        Some(_) => Err(ConfigParseError::new(
            path,
            Some(field),
            ConfigErrorKind::WrongType { expected: "string" },
        )),
    }
}

fn optional_bool(map: &Map<String, Value>, path: &str, field: &str) -> Result<bool, ConfigParseError> {
    match map.get(field) {
        None | Some(Value::Null) => Ok(false),
        Some(Value::Bool(b)) => Ok(*b),
        Some(_) => Err(ConfigParseError::new(
            path,
            Some(field),
            ConfigErrorKind::WrongType { expected: "boolean" },
        )),
    }
}
