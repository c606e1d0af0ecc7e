//! Minimal JSON Patch (RFC 6902) subset: add, replace, remove.
//!
//! Enough for interactive field edits against the workspace draft. Paths
//! are `/`-rooted with `~0`/`~1` escapes; array positions accept an index
//! or `-` for append. Anything the subset does not cover is a hard error,
//! never a silent no-op.

use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum PatchError {
    #[error("bad path: {0}")]
    BadPath(String),
    #[error("unsupported op: {0}")]
    UnsupportedOp(String),
    #[error("op '{op}' requires a value")]
    MissingValue { op: String },
    #[error("array index out of bounds at {path}")]
    IndexOutOfBounds { path: String },
}

#[derive(Debug, Clone, Deserialize)]
pub struct PatchOp {
    pub op: String,
    pub path: String,
    #[serde(default)]
    pub value: Option<Value>,
}

pub fn apply_patch(doc: &Value, ops: &[PatchOp]) -> Result<Value, PatchError> {
    let mut out = doc.clone();
    for op in ops {
        apply_one(&mut out, op)?;
    }
    Ok(out)
}

fn apply_one(doc: &mut Value, op: &PatchOp) -> Result<(), PatchError> {
    let tokens = parse_path(&op.path)?;
    let (last, parents) = tokens
        .split_last()
        .ok_or_else(|| PatchError::BadPath(op.path.clone()))?;

    let mut target = doc;
    for token in parents {
        target = descend(target, token, &op.path)?;
    }

    match op.op.as_str() {
        "replace" => {
            let value = required_value(op)?;
            set(target, last, value, &op.path, false)
        }
        "add" => {
            let value = required_value(op)?;
            set(target, last, value, &op.path, true)
        }
        "remove" => remove(target, last, &op.path),
        other => Err(PatchError::UnsupportedOp(other.to_string())),
    }
}

fn required_value(op: &PatchOp) -> Result<Value, PatchError> {
    op.value.clone().ok_or_else(|| PatchError::MissingValue {
        op: op.op.clone(),
    })
}

fn parse_path(path: &str) -> Result<Vec<String>, PatchError> {
    let rest = path
        .strip_prefix('/')
        .ok_or_else(|| PatchError::BadPath(path.to_string()))?;
    Ok(rest
        .split('/')
        .filter(|t| !t.is_empty())
        .map(|t| t.replace("~1", "/").replace("~0", "~"))
        .collect())
}

/// Walks one level, materializing empty objects for missing object keys the
/// way the interactive editor expects.
fn descend<'a>(parent: &'a mut Value, token: &str, path: &str) -> Result<&'a mut Value, PatchError> {
    match parent {
        Value::Array(items) => {
            let idx: usize = token
                .parse()
                .map_err(|_| PatchError::BadPath(path.to_string()))?;
            items
                .get_mut(idx)
                .ok_or_else(|| PatchError::IndexOutOfBounds {
                    path: path.to_string(),
                })
        }
        Value::Object(map) => Ok(map
            .entry(token.to_string())
            .or_insert(Value::Object(Default::default()))),
        _ => Err(PatchError::BadPath(path.to_string())),
    }
}

fn set(
    parent: &mut Value,
    token: &str,
    value: Value,
    path: &str,
    insert: bool,
) -> Result<(), PatchError> {
    match parent {
        Value::Array(items) => {
            if insert && token == "-" {
                items.push(value);
                return Ok(());
            }
            let idx: usize = token
                .parse()
                .map_err(|_| PatchError::BadPath(path.to_string()))?;
            if insert {
                if idx > items.len() {
                    return Err(PatchError::IndexOutOfBounds {
                        path: path.to_string(),
                    });
                }
                items.insert(idx, value);
            } else {
                *items
                    .get_mut(idx)
                    .ok_or_else(|| PatchError::IndexOutOfBounds {
                        path: path.to_string(),
                    })? = value;
            }
            Ok(())
        }
        Value::Object(map) => {
            map.insert(token.to_string(), value);
            Ok(())
        }
        _ => Err(PatchError::BadPath(path.to_string())),
    }
}

fn remove(parent: &mut Value, token: &str, path: &str) -> Result<(), PatchError> {
    match parent {
        Value::Array(items) => {
            let idx: usize = token
                .parse()
                .map_err(|_| PatchError::BadPath(path.to_string()))?;
            if idx >= items.len() {
                return Err(PatchError::IndexOutOfBounds {
                    path: path.to_string(),
                });
            }
            items.remove(idx);
            Ok(())
        }
        Value::Object(map) => {
            // Removing an absent key is tolerated.
            map.remove(token);
            Ok(())
        }
        _ => Err(PatchError::BadPath(path.to_string())),
    }
}
