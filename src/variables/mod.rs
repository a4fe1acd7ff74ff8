//! The external variable store the panel publishes into.
//!
//! Contract: read the current value on mount, write only when the value
//! changes. No locking; a single session owns the store.

pub mod file;

use std::fmt;
use std::str::FromStr;

use anyhow::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VariableKind {
    Textbox,
    Custom,
    Query,
    Constant,
}

impl VariableKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Textbox => "textbox",
            Self::Custom => "custom",
            Self::Query => "query",
            Self::Constant => "constant",
        }
    }
}

impl fmt::Display for VariableKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for VariableKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "textbox" => Ok(Self::Textbox),
            "custom" => Ok(Self::Custom),
            "query" => Ok(Self::Query),
            "constant" => Ok(Self::Constant),
            other => Err(format!("unknown variable kind `{}`", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Variable {
    pub kind: VariableKind,
    pub value: String,
}

impl Variable {
    pub fn textbox(value: impl Into<String>) -> Self {
        Self {
            kind: VariableKind::Textbox,
            value: value.into(),
        }
    }
}

pub trait VariableStore {
    fn get(&self, name: &str) -> Option<&Variable>;

    /// Set the value; an unknown name is created as a textbox variable.
    fn set(&mut self, name: &str, value: &str) -> Result<()>;

    fn value(&self, name: &str) -> Option<&str> {
        self.get(name).map(|v| v.value.as_str())
    }
}

/// In-memory store, insertion ordered.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemoryStore {
    vars: Vec<(String, Variable)>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, var: Variable) {
        let name = name.into();
        match self.vars.iter_mut().find(|(n, _)| *n == name) {
            Some((_, existing)) => *existing = var,
            None => self.vars.push((name, var)),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Variable)> {
        self.vars.iter().map(|(n, v)| (n.as_str(), v))
    }
}

impl VariableStore for MemoryStore {
    fn get(&self, name: &str) -> Option<&Variable> {
        self.vars.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    fn set(&mut self, name: &str, value: &str) -> Result<()> {
        match self.vars.iter_mut().find(|(n, _)| n == name) {
            Some((_, var)) => var.value = value.to_string(),
            None => self.vars.push((name.to_string(), Variable::textbox(value))),
        }
        Ok(())
    }
}

/// Advisory: the variable is missing or not a textbox. Writes still happen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariableWarning {
    pub name: String,
    pub found: Option<VariableKind>,
}

impl fmt::Display for VariableWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.found {
            None => write!(
                f,
                "variable `{}` is not defined; create a textbox variable with this name",
                self.name
            ),
            Some(kind) => write!(
                f,
                "variable `{}` is a {} variable; the panel expects a textbox",
                self.name, kind
            ),
        }
    }
}

pub fn check_variable(store: &dyn VariableStore, name: &str) -> Option<VariableWarning> {
    match store.get(name) {
        Some(var) if var.kind == VariableKind::Textbox => None,
        other => Some(VariableWarning {
            name: name.to_string(),
            found: other.map(|v| v.kind),
        }),
    }
}
