//! Parsing of source contents into flat key/value pairs.

use std::collections::BTreeMap;

/// Flat, sorted key/value mapping used by layers and snapshots.
pub type PropertyMap = BTreeMap<String, String>;

/// Separator used when an array of scalars collapses into a single value.
pub const LIST_SEPARATOR: &str = ",";

/// On-disk format of a configuration source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFormat {
    Toml,
    Json,
}

impl SourceFormat {
    /// Pick the format from the source name's extension. TOML unless `.json`.
    pub fn from_name(name: &str) -> Self {
        if name.to_ascii_lowercase().ends_with(".json") {
            SourceFormat::Json
        } else {
            SourceFormat::Toml
        }
    }

    /// Parse `text` into ordered `(key, value)` pairs.
    pub fn parse(self, text: &str) -> Result<Vec<(String, String)>, String> {
        match self {
            SourceFormat::Toml => parse_toml(text),
            SourceFormat::Json => parse_json(text),
        }
    }
}

/// Parse a TOML document into flat pairs.
pub fn parse_toml(text: &str) -> Result<Vec<(String, String)>, String> {
    let table: toml::Table = text.parse().map_err(|e: toml::de::Error| e.to_string())?;
    let mut out = Vec::new();
    flatten_toml_table("", &table, &mut out)?;
    Ok(out)
}

/// Parse a JSON document into flat pairs. The top level must be an object.
pub fn parse_json(text: &str) -> Result<Vec<(String, String)>, String> {
    let value: serde_json::Value = serde_json::from_str(text).map_err(|e| e.to_string())?;
    flatten_json(&value)
}

/// Flatten an already decoded JSON value into pairs.
pub fn flatten_json(value: &serde_json::Value) -> Result<Vec<(String, String)>, String> {
    match value {
        serde_json::Value::Object(map) => {
            let mut out = Vec::new();
            flatten_json_object("", map, &mut out)?;
            Ok(out)
        }
        other => Err(format!("expected a JSON object, found {}", json_kind(other))),
    }
}

fn join_key(prefix: &str, key: &str) -> String {
    if prefix.is_empty() {
        key.to_string()
    } else {
        format!("{prefix}.{key}")
    }
}

fn flatten_toml_table(
    prefix: &str,
    table: &toml::Table,
    out: &mut Vec<(String, String)>,
) -> Result<(), String> {
    for (key, value) in table {
        let key = join_key(prefix, key);
        match value {
            toml::Value::Table(inner) => flatten_toml_table(&key, inner, out)?,
            toml::Value::Array(items) => {
                if items.iter().all(|item| item.is_table()) && !items.is_empty() {
                    for (idx, item) in items.iter().enumerate() {
                        if let toml::Value::Table(inner) = item {
                            flatten_toml_table(&join_key(&key, &idx.to_string()), inner, out)?;
                        }
                    }
                } else {
                    let parts = items
                        .iter()
                        .map(|item| toml_scalar(item).ok_or_else(|| nested_list_error(&key)))
                        .collect::<Result<Vec<_>, _>>()?;
                    out.push((key, parts.join(LIST_SEPARATOR)));
                }
            }
            scalar => {
                if let Some(text) = toml_scalar(scalar) {
                    out.push((key, text));
                }
            }
        }
    }
    Ok(())
}

fn toml_scalar(value: &toml::Value) -> Option<String> {
    match value {
        toml::Value::String(s) => Some(s.clone()),
        toml::Value::Integer(i) => Some(i.to_string()),
        toml::Value::Float(f) => Some(f.to_string()),
        toml::Value::Boolean(b) => Some(b.to_string()),
        toml::Value::Datetime(d) => Some(d.to_string()),
        toml::Value::Array(_) | toml::Value::Table(_) => None,
    }
}

fn flatten_json_object(
    prefix: &str,
    map: &serde_json::Map<String, serde_json::Value>,
    out: &mut Vec<(String, String)>,
) -> Result<(), String> {
    for (key, value) in map {
        let key = join_key(prefix, key);
        match value {
            serde_json::Value::Object(inner) => flatten_json_object(&key, inner, out)?,
            serde_json::Value::Array(items) => {
                if items.iter().all(|item| item.is_object()) && !items.is_empty() {
                    for (idx, item) in items.iter().enumerate() {
                        if let serde_json::Value::Object(inner) = item {
                            flatten_json_object(&join_key(&key, &idx.to_string()), inner, out)?;
                        }
                    }
                } else {
                    let parts = items
                        .iter()
                        .filter(|item| !item.is_null())
                        .map(|item| json_scalar(item).ok_or_else(|| nested_list_error(&key)))
                        .collect::<Result<Vec<_>, _>>()?;
                    out.push((key, parts.join(LIST_SEPARATOR)));
                }
            }
            // null means "not set"
            serde_json::Value::Null => {}
            scalar => {
                if let Some(text) = json_scalar(scalar) {
                    out.push((key, text));
                }
            }
        }
    }
    Ok(())
}

fn json_scalar(value: &serde_json::Value) -> Option<String> {
    match value {
        serde_json::Value::String(s) => Some(s.clone()),
        serde_json::Value::Number(n) => Some(n.to_string()),
        serde_json::Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn json_kind(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "a boolean",
        serde_json::Value::Number(_) => "a number",
        serde_json::Value::String(_) => "a string",
        serde_json::Value::Array(_) => "an array",
        serde_json::Value::Object(_) => "an object",
    }
}

fn nested_list_error(key: &str) -> String {
    format!("{key}: lists may only contain scalars or only tables")
}

/// Split a list-valued property back into its items.
pub fn split_list(value: &str) -> Vec<String> {
    value
        .split(LIST_SEPARATOR)
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect()
}
