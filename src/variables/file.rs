//! File-backed variable store: `panel/variables.panel`.
//!
//! One variable per line, `name [kind]: value`. The kind tag is optional and
//! defaults to `textbox`. `#` comments and blank lines are dropped on rewrite.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use tracing::debug;

use crate::variables::{MemoryStore, Variable, VariableKind, VariableStore};

#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    vars: MemoryStore,
}

impl FileStore {
    /// Load the store; a missing file is an empty store.
    pub fn open(path: &Path) -> Result<Self> {
        let vars = if path.exists() {
            let content = fs::read_to_string(path)
                .with_context(|| format!("failed to read {}", path.display()))?;
            parse(&content)?
        } else {
            MemoryStore::new()
        };
        Ok(Self {
            path: path.to_path_buf(),
            vars,
        })
    }

    pub fn vars(&self) -> &MemoryStore {
        &self.vars
    }

    fn persist(&self) -> Result<()> {
        fs::write(&self.path, serialize(&self.vars))
            .with_context(|| format!("failed to write {}", self.path.display()))
    }
}

impl VariableStore for FileStore {
    fn get(&self, name: &str) -> Option<&Variable> {
        self.vars.get(name)
    }

    fn set(&mut self, name: &str, value: &str) -> Result<()> {
        debug!(name, value, "writing variable");
        self.vars.set(name, value)?;
        self.persist()
    }
}

pub fn parse(input: &str) -> Result<MemoryStore> {
    let mut store = MemoryStore::new();
    for (i, raw) in input.lines().enumerate() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let (head, value) = line
            .split_once(':')
            .with_context(|| format!("expected `name [kind]: value` at line {}", i + 1))?;
        let head = head.trim();
        let (name, kind) = match head.split_once('[') {
            Some((name, tag)) => {
                let tag = tag
                    .strip_suffix(']')
                    .with_context(|| format!("unclosed kind tag at line {}", i + 1))?;
                let kind = tag
                    .trim()
                    .parse::<VariableKind>()
                    .map_err(anyhow::Error::msg)
                    .with_context(|| format!("invalid variable at line {}", i + 1))?;
                (name.trim(), kind)
            }
            None => (head, VariableKind::Textbox),
        };
        if name.is_empty() {
            bail!("missing variable name at line {}", i + 1);
        }
        store.insert(
            name,
            Variable {
                kind,
                value: value.trim().to_string(),
            },
        );
    }
    Ok(store)
}

pub fn serialize(store: &MemoryStore) -> String {
    let mut out = String::from("# treepanel variables: name [kind]: value\n");
    for (name, var) in store.iter() {
        if var.value.is_empty() {
            out.push_str(&format!("{} [{}]:\n", name, var.kind));
        } else {
            out.push_str(&format!("{} [{}]: {}\n", name, var.kind, var.value));
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn parse_kinds_and_defaults() {
        let store = parse("# vars\ntreequery [textbox]: a in (1)\nother: x\nq [query]:\n").unwrap();
        assert_eq!(store.value("treequery"), Some("a in (1)"));
        assert_eq!(store.get("other").map(|v| v.kind), Some(VariableKind::Textbox));
        assert_eq!(store.get("q").map(|v| v.kind), Some(VariableKind::Query));
        assert_eq!(store.value("q"), Some(""));
    }

    #[test]
    fn value_may_contain_colons() {
        let store = parse("t: a:b in (1)\n").unwrap();
        assert_eq!(store.value("t"), Some("a:b in (1)"));
    }

    #[test]
    fn bad_kind_rejected() {
        let err = parse("t [interval]: 1\n").unwrap_err();
        assert!(format!("{:#}", err).contains("line 1"));
    }

    #[test]
    fn serialize_parses_back() {
        let mut store = MemoryStore::new();
        store.set("treequery", "well_id in (1,2)").unwrap();
        store.set("empty", "").unwrap();
        assert_eq!(parse(&serialize(&store)).unwrap(), store);
    }

    #[test]
    fn set_persists_to_disk() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("variables.panel");
        let mut store = FileStore::open(&path).unwrap();
        store.set("treequery", "True").unwrap();

        let reopened = FileStore::open(&path).unwrap();
        assert_eq!(reopened.value("treequery"), Some("True"));
        assert_eq!(reopened.vars().iter().count(), 1);
    }
}
