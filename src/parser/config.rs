//! Parser and writer for `panel/config.panel`.
//!
//! Line-oriented `key: value` pairs. `#` starts a comment line, blank lines
//! are ignored, missing keys keep their defaults.

use anyhow::{Context, Result, bail};

use crate::tree::builder::DuplicatePolicy;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Data column holding the path rows.
    pub field: String,
    /// Variable receiving the selection query.
    pub variable_name: String,
    pub sorting_variable_name: String,
    pub filters_variable_name: String,
    /// Emitted instead of an empty query.
    pub default_value: String,
    pub default_expansion_level: usize,
    /// Handlebars source; empty means the built-in template.
    pub format_query: String,
    pub on_duplicate: DuplicatePolicy,
    pub bracketed_arrays: bool,
    pub debug: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            field: "path".to_string(),
            variable_name: "treequery".to_string(),
            sorting_variable_name: "levelsorting".to_string(),
            filters_variable_name: "treefilters".to_string(),
            default_value: String::new(),
            default_expansion_level: 0,
            format_query: String::new(),
            on_duplicate: DuplicatePolicy::KeepFirst,
            bracketed_arrays: false,
            debug: false,
        }
    }
}

impl Config {
    pub fn variable_names(&self) -> [&str; 3] {
        [
            &self.variable_name,
            &self.sorting_variable_name,
            &self.filters_variable_name,
        ]
    }
}

pub fn parse(input: &str) -> Result<Config> {
    let mut cfg = Config::default();

    for (i, raw) in input.lines().enumerate() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let (key, value) = line
            .split_once(':')
            .with_context(|| format!("expected `key: value` at line {}", i + 1))?;
        let value = value.trim();
        let ctx = || format!("invalid value for `{}` at line {}", key.trim(), i + 1);

        match key.trim() {
            "field" => cfg.field = value.to_string(),
            "variable_name" => cfg.variable_name = value.to_string(),
            "sorting_variable_name" => cfg.sorting_variable_name = value.to_string(),
            "filters_variable_name" => cfg.filters_variable_name = value.to_string(),
            "default_value" => cfg.default_value = value.to_string(),
            "default_expansion_level" => {
                cfg.default_expansion_level = value.parse().with_context(ctx)?;
            }
            "format_query" => cfg.format_query = value.to_string(),
            "on_duplicate" => cfg.on_duplicate = parse_duplicate(value).with_context(ctx)?,
            "bracketed_arrays" => cfg.bracketed_arrays = parse_bool(value).with_context(ctx)?,
            "debug" => cfg.debug = parse_bool(value).with_context(ctx)?,
            other => bail!("unknown config key `{}` at line {}", other, i + 1),
        }
    }

    if cfg.field.is_empty() {
        bail!("`field` must not be empty");
    }
    if cfg.variable_name.is_empty() {
        bail!("`variable_name` must not be empty");
    }
    Ok(cfg)
}

pub fn serialize(config: &Config) -> String {
    let on_duplicate = match config.on_duplicate {
        DuplicatePolicy::KeepFirst => "keep-first",
        DuplicatePolicy::Overwrite => "overwrite",
        DuplicatePolicy::Error => "error",
    };
    format!(
        "\
# treepanel configuration

# Data column holding the comma separated path rows
field: {}

# Variables written by the panel
variable_name: {}
sorting_variable_name: {}
filters_variable_name: {}

# Query emitted when nothing is selected
default_value: {}

# Levels expanded when the tree is first built
default_expansion_level: {}

# Handlebars template for the query (empty = `type in (id,...) OR ...`)
format_query: {}

# Same id under one parent with a different name/type
# Options: keep-first | overwrite | error
on_duplicate: {}

# Wrap the sorting/filters arrays in brackets
bracketed_arrays: {}

# Write debug logs to panel/debug.log
debug: {}
",
        config.field,
        config.variable_name,
        config.sorting_variable_name,
        config.filters_variable_name,
        config.default_value,
        config.default_expansion_level,
        config.format_query,
        on_duplicate,
        config.bracketed_arrays,
        config.debug
    )
}

fn parse_bool(value: &str) -> Result<bool> {
    match value {
        "true" | "yes" | "on" => Ok(true),
        "false" | "no" | "off" => Ok(false),
        other => bail!("expected true/false, got `{}`", other),
    }
}

fn parse_duplicate(value: &str) -> Result<DuplicatePolicy> {
    match value {
        "keep-first" => Ok(DuplicatePolicy::KeepFirst),
        "overwrite" => Ok(DuplicatePolicy::Overwrite),
        "error" => Ok(DuplicatePolicy::Error),
        other => bail!("expected keep-first/overwrite/error, got `{}`", other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_input_is_default() {
        assert_eq!(parse("").unwrap(), Config::default());
    }

    #[test]
    fn serialized_default_parses_back() {
        let cfg = Config {
            default_value: "True".into(),
            default_expansion_level: 2,
            on_duplicate: DuplicatePolicy::Error,
            bracketed_arrays: true,
            ..Config::default()
        };
        assert_eq!(parse(&serialize(&cfg)).unwrap(), cfg);
    }

    #[test]
    fn template_may_contain_colons() {
        let cfg = parse("format_query: {{#each this}}{{@key}}: x{{/each}}\n").unwrap();
        assert_eq!(cfg.format_query, "{{#each this}}{{@key}}: x{{/each}}");
    }

    #[test]
    fn unknown_key_rejected_with_line() {
        let err = parse("# c\nbogus: 1\n").unwrap_err();
        assert!(err.to_string().contains("line 2"));
    }

    #[test]
    fn bad_bool_rejected() {
        assert!(parse("debug: maybe\n").is_err());
    }

    #[test]
    fn negative_expansion_level_rejected() {
        assert!(parse("default_expansion_level: -1\n").is_err());
    }
}
