//! TOML document operations: recursive merge and dotted-path access

use toml::{Table, Value};

use crate::domain::error::ConfigError;

use super::AppConfig;

/// Merge `overlay` into `base` key by key.
///
/// Tables merge recursively; scalars and arrays in `overlay` replace those in
/// `base`. Keys only present in `base` are kept, so merging the same overlay
/// twice gives the same result as merging it once.
pub fn merge_tables(base: &mut Table, overlay: &Table) {
    for (key, value) in overlay {
        match (base.get_mut(key), value) {
            (Some(Value::Table(existing)), Value::Table(incoming)) => {
                merge_tables(existing, incoming);
            }
            _ => {
                base.insert(key.clone(), value.clone());
            }
        }
    }
}

/// Serialize a config into a TOML table
pub fn to_table(config: &AppConfig) -> Result<Table, ConfigError> {
    match Value::try_from(config) {
        Ok(Value::Table(table)) => Ok(table),
        Ok(_) => Err(ConfigError::WriteError(
            "config did not serialize to a table".to_string(),
        )),
        Err(e) => Err(ConfigError::WriteError(e.to_string())),
    }
}

/// Deserialize a TOML table into a config
pub fn from_table(table: Table) -> Result<AppConfig, ConfigError> {
    Value::Table(table)
        .try_into()
        .map_err(|e: toml::de::Error| ConfigError::ParseError(e.to_string()))
}

/// Built-in defaults with a stored document merged over them
pub fn merged_with_defaults(stored: &Table) -> Result<Table, ConfigError> {
    let mut table = to_table(&AppConfig::defaults())?;
    merge_tables(&mut table, stored);
    Ok(table)
}

/// Look up a dotted path such as `pipeline.capture_attempts` or
/// `hotkeys.0.prompt` (numeric segments index arrays)
pub fn get_path<'a>(table: &'a Table, path: &str) -> Option<&'a Value> {
    let mut segments = path.split('.');
    let mut current = table.get(segments.next()?)?;
    for segment in segments {
        current = match current {
            Value::Table(t) => t.get(segment)?,
            Value::Array(items) => items.get(segment.parse::<usize>().ok()?)?,
            _ => return None,
        };
    }
    Some(current)
}

/// Replace the scalar at a dotted path, parsing `raw` as the existing type.
///
/// Only existing scalar keys can be set; arrays and tables must be edited in
/// the file directly.
pub fn set_path(table: &mut Table, path: &str, raw: &str) -> Result<(), ConfigError> {
    let unknown = || ConfigError::invalid(path, "Unknown key");

    let mut segments: Vec<&str> = path.split('.').collect();
    let last = segments.pop().ok_or_else(unknown)?;

    let mut current: &mut Value = match segments.first() {
        Some(first) => table.get_mut(*first).ok_or_else(unknown)?,
        None => {
            let slot = table.get_mut(last).ok_or_else(unknown)?;
            *slot = parse_like(slot, raw).map_err(|m| ConfigError::invalid(path, m))?;
            return Ok(());
        }
    };
    for segment in segments.iter().skip(1) {
        current = match current {
            Value::Table(t) => t.get_mut(*segment).ok_or_else(unknown)?,
            Value::Array(items) => {
                let index: usize = segment.parse().map_err(|_| unknown())?;
                items.get_mut(index).ok_or_else(unknown)?
            }
            _ => return Err(unknown()),
        };
    }

    let slot = match current {
        Value::Table(t) => t.get_mut(last).ok_or_else(unknown)?,
        Value::Array(items) => {
            let index: usize = last.parse().map_err(|_| unknown())?;
            items.get_mut(index).ok_or_else(unknown)?
        }
        _ => return Err(unknown()),
    };
    *slot = parse_like(slot, raw).map_err(|m| ConfigError::invalid(path, m))?;
    Ok(())
}

fn parse_like(existing: &Value, raw: &str) -> Result<Value, String> {
    match existing {
        Value::String(_) => Ok(Value::String(raw.to_string())),
        Value::Boolean(_) => parse_bool(raw)
            .map(Value::Boolean)
            .ok_or_else(|| "Value must be 'true' or 'false'".to_string()),
        Value::Integer(_) => raw
            .trim()
            .parse::<i64>()
            .map(Value::Integer)
            .map_err(|_| "Value must be an integer".to_string()),
        Value::Float(_) => raw
            .trim()
            .parse::<f64>()
            .map(Value::Float)
            .map_err(|_| "Value must be a number".to_string()),
        _ => Err("Only scalar values can be set; edit the file for lists and tables".to_string()),
    }
}

/// Parse a boolean value
pub fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "true" | "yes" | "1" => Some(true),
        "false" | "no" | "0" => Some(false),
        _ => None,
    }
}

/// Flatten scalars into `(dotted.path, display)` pairs in key order
pub fn flatten(table: &Table) -> Vec<(String, String)> {
    let mut out = Vec::new();
    flatten_into(table, "", &mut out);
    out
}

fn flatten_into(table: &Table, prefix: &str, out: &mut Vec<(String, String)>) {
    for (key, value) in table {
        let path = if prefix.is_empty() {
            key.clone()
        } else {
            format!("{}.{}", prefix, key)
        };
        match value {
            Value::Table(inner) => flatten_into(inner, &path, out),
            Value::Array(items) if items.iter().all(Value::is_table) && !items.is_empty() => {
                for (index, item) in items.iter().enumerate() {
                    if let Value::Table(inner) = item {
                        flatten_into(inner, &format!("{}.{}", path, index), out);
                    }
                }
            }
            Value::String(s) => out.push((path, s.clone())),
            other => out.push((path, other.to_string())),
        }
    }
}
