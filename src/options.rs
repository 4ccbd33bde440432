//! Typed option registry.
//!
//! A configuration boundary in the spirit of classic parser builders:
//! callers register named, typed options, each with a default, a
//! comment, an essential/secondary flag, an optional validator and a
//! callback, and then feed the registry a config file, command-line
//! tokens, or nothing at all. Every callback runs exactly once per
//! parse, with the parsed value when the source provided one and with
//! the default otherwise, so wiring code has a single place to react.
//!
//! Two option shapes beyond plain scalars are supported: vector options
//! (comma-separated lists) and linked pairs: two names sharing one
//! callback that fires with both values, for settings that are only
//! meaningful together (a sigma range, for instance).
//!
//! Config files are `key = value` lines; `#` and `;` start comments.
//! Command lines use `--key=value` or `--key value`.

use crate::error::{Error, Result};
use std::collections::HashMap;
use std::fmt::Write as _;
use std::path::Path;

/// A typed option value. The variant of the registered default fixes
/// the type a source must provide.
#[derive(Clone, Debug, PartialEq)]
pub enum OptionValue {
    Bool(bool),
    Int(i64),
    Real(f64),
    Str(String),
    IntVec(Vec<i64>),
    RealVec(Vec<f64>),
}

impl OptionValue {
    fn kind_name(&self) -> &'static str {
        match self {
            OptionValue::Bool(_) => "bool",
            OptionValue::Int(_) => "int",
            OptionValue::Real(_) => "real",
            OptionValue::Str(_) => "string",
            OptionValue::IntVec(_) => "int list",
            OptionValue::RealVec(_) => "real list",
        }
    }

    /// Parses `raw` with the type of `template`.
    fn parse_as(template: &OptionValue, name: &str, raw: &str) -> Result<OptionValue> {
        let raw = raw.trim();
        let bad = |what: &str| {
            Error::invalid(format!(
                "option {name:?}: cannot parse {raw:?} as {what}"
            ))
        };
        match template {
            OptionValue::Bool(_) => match raw.to_ascii_lowercase().as_str() {
                "true" | "1" | "yes" | "on" => Ok(OptionValue::Bool(true)),
                "false" | "0" | "no" | "off" => Ok(OptionValue::Bool(false)),
                _ => Err(bad("bool")),
            },
            OptionValue::Int(_) => raw
                .parse::<i64>()
                .map(OptionValue::Int)
                .map_err(|_| bad("int")),
            OptionValue::Real(_) => raw
                .parse::<f64>()
                .map(OptionValue::Real)
                .map_err(|_| bad("real")),
            OptionValue::Str(_) => Ok(OptionValue::Str(raw.to_string())),
            OptionValue::IntVec(_) => raw
                .split(',')
                .map(|item| item.trim().parse::<i64>())
                .collect::<std::result::Result<Vec<i64>, _>>()
                .map(OptionValue::IntVec)
                .map_err(|_| bad("int list")),
            OptionValue::RealVec(_) => raw
                .split(',')
                .map(|item| item.trim().parse::<f64>())
                .collect::<std::result::Result<Vec<f64>, _>>()
                .map(OptionValue::RealVec)
                .map_err(|_| bad("real list")),
        }
    }

    /// Renders the value the way a config file spells it.
    fn render(&self) -> String {
        match self {
            OptionValue::Bool(v) => v.to_string(),
            OptionValue::Int(v) => v.to_string(),
            OptionValue::Real(v) => v.to_string(),
            OptionValue::Str(v) => v.clone(),
            OptionValue::IntVec(v) => v
                .iter()
                .map(i64::to_string)
                .collect::<Vec<_>>()
                .join(", "),
            OptionValue::RealVec(v) => v
                .iter()
                .map(f64::to_string)
                .collect::<Vec<_>>()
                .join(", "),
        }
    }

    /// The boolean payload, if this is a bool option.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            OptionValue::Bool(v) => Some(*v),
            _ => None,
        }
    }

    /// The integer payload, if this is an int option.
    pub fn as_int(&self) -> Option<i64> {
        match self {
            OptionValue::Int(v) => Some(*v),
            _ => None,
        }
    }

    /// The real payload, if this is a real option.
    pub fn as_real(&self) -> Option<f64> {
        match self {
            OptionValue::Real(v) => Some(*v),
            _ => None,
        }
    }

    /// The string payload, if this is a string option.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            OptionValue::Str(v) => Some(v),
            _ => None,
        }
    }
}

type Callback<'a> = Box<dyn FnMut(&OptionValue) -> Result<()> + 'a>;
type PairCallback<'a> = Box<dyn FnMut(&OptionValue, &OptionValue) -> Result<()> + 'a>;
type Validator = Box<dyn Fn(&OptionValue) -> Result<()>>;

struct Entry<'a> {
    name: String,
    comment: String,
    essential: bool,
    default: OptionValue,
    validator: Option<Validator>,
    callback: Callback<'a>,
}

struct PairEntry<'a> {
    names: (String, String),
    comment: String,
    essential: bool,
    defaults: (OptionValue, OptionValue),
    callback: PairCallback<'a>,
}

/// Registry of typed, named options with defaults and callbacks.
#[derive(Default)]
pub struct OptionRegistry<'a> {
    entries: Vec<Entry<'a>>,
    pairs: Vec<PairEntry<'a>>,
}

impl<'a> OptionRegistry<'a> {
    pub fn new() -> Self {
        OptionRegistry::default()
    }

    /// Registers a scalar or vector option.
    ///
    /// The callback runs once per parse: with the source's value when
    /// present, with `default` otherwise.
    pub fn register(
        &mut self,
        name: impl Into<String>,
        default: OptionValue,
        comment: impl Into<String>,
        essential: bool,
        callback: impl FnMut(&OptionValue) -> Result<()> + 'a,
    ) -> &mut Self {
        self.entries.push(Entry {
            name: name.into(),
            comment: comment.into(),
            essential,
            default,
            validator: None,
            callback: Box::new(callback),
        });
        self
    }

    /// Registers a scalar or vector option with a validator that runs
    /// before the callback.
    pub fn register_with_validator(
        &mut self,
        name: impl Into<String>,
        default: OptionValue,
        comment: impl Into<String>,
        essential: bool,
        validator: impl Fn(&OptionValue) -> Result<()> + 'static,
        callback: impl FnMut(&OptionValue) -> Result<()> + 'a,
    ) -> &mut Self {
        self.entries.push(Entry {
            name: name.into(),
            comment: comment.into(),
            essential,
            default,
            validator: Some(Box::new(validator)),
            callback: Box::new(callback),
        });
        self
    }

    /// Registers two options sharing one callback. The callback fires
    /// once per parse with both values, parsed or default each.
    pub fn register_pair(
        &mut self,
        name_a: impl Into<String>,
        default_a: OptionValue,
        name_b: impl Into<String>,
        default_b: OptionValue,
        comment: impl Into<String>,
        essential: bool,
        callback: impl FnMut(&OptionValue, &OptionValue) -> Result<()> + 'a,
    ) -> &mut Self {
        self.pairs.push(PairEntry {
            names: (name_a.into(), name_b.into()),
            comment: comment.into(),
            essential,
            defaults: (default_a, default_b),
            callback: Box::new(callback),
        });
        self
    }

    /// Parses a `key = value` config file and runs every callback.
    ///
    /// # Errors
    /// [`Error::Io`] when the file cannot be read,
    /// [`Error::InvalidArgument`] on malformed lines, unknown keys,
    /// type mismatches or validator rejections.
    pub fn parse_file(&mut self, path: impl AsRef<Path>) -> Result<()> {
        let text = std::fs::read_to_string(path.as_ref())?;
        let mut raw = HashMap::new();
        for (lineno, line) in text.lines().enumerate() {
            let line = match line.find(['#', ';']) {
                Some(pos) => &line[..pos],
                None => line,
            };
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            let Some((key, value)) = line.split_once('=') else {
                return Err(Error::invalid(format!(
                    "line {}: expected `key = value`, got {line:?}",
                    lineno + 1
                )));
            };
            raw.insert(key.trim().to_string(), value.trim().to_string());
        }
        self.apply(raw)
    }

    /// Parses `--key=value` / `--key value` tokens and runs every
    /// callback.
    pub fn parse_args<S: AsRef<str>>(&mut self, args: &[S]) -> Result<()> {
        let mut raw = HashMap::new();
        let mut iter = args.iter().peekable();
        while let Some(token) = iter.next() {
            let token = token.as_ref();
            let Some(stripped) = token.strip_prefix("--") else {
                return Err(Error::invalid(format!(
                    "expected an option starting with --, got {token:?}"
                )));
            };
            if let Some((key, value)) = stripped.split_once('=') {
                raw.insert(key.to_string(), value.to_string());
            } else {
                let Some(value) = iter.next() else {
                    return Err(Error::invalid(format!("option --{stripped} lacks a value")));
                };
                raw.insert(stripped.to_string(), value.as_ref().to_string());
            }
        }
        self.apply(raw)
    }

    /// Runs every callback with its default, as an empty parse would.
    pub fn apply_defaults(&mut self) -> Result<()> {
        self.apply(HashMap::new())
    }

    fn apply(&mut self, mut raw: HashMap<String, String>) -> Result<()> {
        // Reject unknown keys before any callback runs.
        for key in raw.keys() {
            let known = self.entries.iter().any(|e| &e.name == key)
                || self
                    .pairs
                    .iter()
                    .any(|p| &p.names.0 == key || &p.names.1 == key);
            if !known {
                return Err(Error::invalid(format!("unknown option {key:?}")));
            }
        }

        for entry in &mut self.entries {
            let value = match raw.remove(&entry.name) {
                Some(s) => OptionValue::parse_as(&entry.default, &entry.name, &s)?,
                None => entry.default.clone(),
            };
            if let Some(validator) = &entry.validator {
                validator(&value).map_err(|e| {
                    Error::invalid(format!("option {:?}: {e}", entry.name))
                })?;
            }
            (entry.callback)(&value)?;
        }

        for pair in &mut self.pairs {
            let a = match raw.remove(&pair.names.0) {
                Some(s) => OptionValue::parse_as(&pair.defaults.0, &pair.names.0, &s)?,
                None => pair.defaults.0.clone(),
            };
            let b = match raw.remove(&pair.names.1) {
                Some(s) => OptionValue::parse_as(&pair.defaults.1, &pair.names.1, &s)?,
                None => pair.defaults.1.clone(),
            };
            (pair.callback)(&a, &b)?;
        }
        Ok(())
    }

    /// Renders a commented config file with every option at its
    /// default. Essential options come first.
    pub fn template(&self) -> String {
        let mut out = String::new();
        let mut render_entry = |out: &mut String, name: &str, comment: &str, essential: bool, default: &OptionValue| {
            if !comment.is_empty() {
                let _ = writeln!(out, "# {comment}");
            }
            let _ = writeln!(
                out,
                "# type: {}{}",
                default.kind_name(),
                if essential { "" } else { " (secondary)" }
            );
            let _ = writeln!(out, "{name} = {}", default.render());
            let _ = writeln!(out);
        };
        for essential in [true, false] {
            for e in self.entries.iter().filter(|e| e.essential == essential) {
                render_entry(&mut out, &e.name, &e.comment, e.essential, &e.default);
            }
            for p in self.pairs.iter().filter(|p| p.essential == essential) {
                render_entry(&mut out, &p.names.0, &p.comment, p.essential, &p.defaults.0);
                render_entry(&mut out, &p.names.1, &p.comment, p.essential, &p.defaults.1);
            }
        }
        out
    }

    /// Writes [`OptionRegistry::template`] to a file.
    pub fn write_template(&self, path: impl AsRef<Path>) -> Result<()> {
        std::fs::write(path.as_ref(), self.template())?;
        Ok(())
    }
}
