//! Named pipeline inputs
//!
//! CI runners hand step parameters to the process as `INPUT_<NAME>`
//! environment variables. [`Inputs`] reads them with required/optional
//! semantics so the rest of the program only sees a typed configuration.

use std::collections::HashMap;

use crate::cache_control::{CacheControlRule, parse_rules_or};
use crate::error::{Error, Result};

/// A source of raw named values
pub trait InputSource {
    /// Raw value for `name`, or `None` when it is not set
    fn raw(&self, name: &str) -> Option<String>;
}

/// Reads inputs from `INPUT_<NAME>` environment variables
#[derive(Debug, Clone, Copy, Default)]
pub struct EnvInputs;

impl EnvInputs {
    /// Environment variable carrying input `name`
    pub fn variable(name: &str) -> String {
        let normalized: String = name
            .chars()
            .map(|c| match c {
                ' ' | '-' => '_',
                c => c.to_ascii_uppercase(),
            })
            .collect();
        format!("INPUT_{normalized}")
    }
}

impl InputSource for EnvInputs {
    fn raw(&self, name: &str) -> Option<String> {
        std::env::var(Self::variable(name)).ok()
    }
}

impl InputSource for HashMap<String, String> {
    fn raw(&self, name: &str) -> Option<String> {
        self.get(name).cloned()
    }
}

/// Outcome of reading a boolean input
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoolInput {
    Value(bool),
    /// Present but not a YAML 1.2 core-schema boolean
    Invalid,
}

/// Parse a boolean the way workflow files spell them
pub fn parse_bool(value: &str) -> BoolInput {
    match value {
        "true" | "True" | "TRUE" => BoolInput::Value(true),
        "false" | "False" | "FALSE" => BoolInput::Value(false),
        _ => BoolInput::Invalid,
    }
}

/// Typed access to an [`InputSource`]
#[derive(Debug, Clone, Default)]
pub struct Inputs<S> {
    source: S,
}

impl<S: InputSource> Inputs<S> {
    pub fn new(source: S) -> Self {
        Self { source }
    }

    /// Trimmed value, `None` when unset or blank
    fn value(&self, name: &str) -> Option<String> {
        self.source
            .raw(name)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }

    fn missing(name: &str) -> Error {
        Error::Config(format!("Input required and not supplied: {name}"))
    }

    pub fn required_string(&self, name: &str) -> Result<String> {
        self.value(name).ok_or_else(|| Self::missing(name))
    }

    pub fn optional_string(&self, name: &str) -> Option<String> {
        self.value(name)
    }

    pub fn required_bool(&self, name: &str) -> Result<bool> {
        let value = self.required_string(name)?;
        match parse_bool(&value) {
            BoolInput::Value(b) => Ok(b),
            BoolInput::Invalid => Err(Error::Config(format!(
                "Input does not meet YAML 1.2 \"Core Schema\" specification: {name} \
                 (supported values: true | True | TRUE | false | False | FALSE)"
            ))),
        }
    }

    /// Boolean input; absent or unparseable values fall back to `default`
    pub fn optional_bool(&self, name: &str, default: bool) -> bool {
        match self.value(name).as_deref().map(parse_bool) {
            Some(BoolInput::Value(b)) => b,
            Some(BoolInput::Invalid) => {
                tracing::debug!("Input {name} is not a boolean, using default {default}");
                default
            }
            None => default,
        }
    }

    /// Non-empty trimmed lines of a value
    fn lines(&self, name: &str) -> Vec<String> {
        self.source
            .raw(name)
            .map(|v| {
                v.split('\n')
                    .map(|line| line.trim().to_string())
                    .filter(|line| !line.is_empty())
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn required_multiline(&self, name: &str) -> Result<Vec<String>> {
        let lines = self.lines(name);
        if lines.is_empty() {
            return Err(Self::missing(name));
        }
        Ok(lines)
    }

    /// Multi-line input; no lines at all falls back to `default`
    pub fn optional_multiline(&self, name: &str, default: Vec<String>) -> Vec<String> {
        let lines = self.lines(name);
        if lines.is_empty() { default } else { lines }
    }

    /// Cache-control rules, one per line; no lines at all yields `default`
    pub fn cache_control(
        &self,
        name: &str,
        default: Vec<CacheControlRule>,
    ) -> Result<Vec<CacheControlRule>> {
        // Untrimmed lines, so parse errors report the line as supplied
        let raw = self.source.raw(name).unwrap_or_default();
        let lines: Vec<&str> = raw.split('\n').collect();
        parse_rules_or(&lines, default)
    }
}
