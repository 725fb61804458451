// src/pipeline/asset.rs

use std::path::PathBuf;

use crate::errors::TransformError;

/// A file travelling through a task's step chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Asset {
    /// Absolute path of the input file this asset came from.
    pub source: PathBuf,
    /// Output path, relative to the task's `dest`.
    pub path: PathBuf,
    pub contents: Vec<u8>,
}

impl Asset {
    pub fn new(source: PathBuf, path: PathBuf, contents: Vec<u8>) -> Self {
        Self {
            source,
            path,
            contents,
        }
    }

    /// Build a `TransformError` for this asset.
    pub fn fail(&self, step: &str, message: impl ToString) -> TransformError {
        TransformError::new(&self.source, step, message)
    }

    /// Contents as UTF-8 text.
    pub fn text(&self, step: &str) -> Result<String, TransformError> {
        String::from_utf8(self.contents.clone())
            .map_err(|e| self.fail(step, format!("input is not valid UTF-8: {e}")))
    }

    /// Lower-cased extension of the output path, if any.
    pub fn extension(&self) -> Option<String> {
        self.path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
    }
}

/// Processor options from `options = { ... }`.
///
/// The orchestrator never looks inside; processors use the typed getters,
/// which report a readable message when a key has the wrong type.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StepOptions(toml::Table);

impl StepOptions {
    pub fn new(table: toml::Table) -> Self {
        Self(table)
    }

    /// Parse options from a TOML fragment (handy in tests).
    pub fn from_toml(s: &str) -> Result<Self, toml::de::Error> {
        Ok(Self(toml::from_str(s)?))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &toml::Value)> {
        self.0.iter()
    }

    pub fn get_bool(&self, key: &str) -> Result<Option<bool>, String> {
        match self.0.get(key) {
            None => Ok(None),
            Some(toml::Value::Boolean(b)) => Ok(Some(*b)),
            Some(other) => Err(type_error(key, "a boolean", other)),
        }
    }

    pub fn get_int(&self, key: &str) -> Result<Option<i64>, String> {
        match self.0.get(key) {
            None => Ok(None),
            Some(toml::Value::Integer(i)) => Ok(Some(*i)),
            Some(other) => Err(type_error(key, "an integer", other)),
        }
    }

    pub fn get_str(&self, key: &str) -> Result<Option<&str>, String> {
        match self.0.get(key) {
            None => Ok(None),
            Some(toml::Value::String(s)) => Ok(Some(s.as_str())),
            Some(other) => Err(type_error(key, "a string", other)),
        }
    }

    /// A list of strings; a single string is accepted as a one-element list.
    pub fn get_str_list(&self, key: &str) -> Result<Option<Vec<String>>, String> {
        match self.0.get(key) {
            None => Ok(None),
            Some(toml::Value::String(s)) => Ok(Some(vec![s.clone()])),
            Some(toml::Value::Array(items)) => items
                .iter()
                .map(|item| match item {
                    toml::Value::String(s) => Ok(s.clone()),
                    other => Err(type_error(key, "a list of strings", other)),
                })
                .collect::<Result<Vec<_>, _>>()
                .map(Some),
            Some(other) => Err(type_error(key, "a list of strings", other)),
        }
    }
}

fn type_error(key: &str, expected: &str, got: &toml::Value) -> String {
    format!("option `{key}` must be {expected}, got {}", got.type_str())
}
