use anyhow::Result;
use tracing::debug;

use crate::error::TreeError;
use crate::parser::config::Config;
use crate::query::template::{self, QueryTemplate, SelectionGroups};
use crate::variables::VariableStore;

/// Outcome of publishing a selection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Published {
    pub query: String,
    /// False when the store already held this value.
    pub written: bool,
}

pub struct QueryEncoder {
    template: Box<dyn QueryTemplate>,
    default_value: String,
    variable_name: String,
}

impl QueryEncoder {
    pub fn new(
        template: Box<dyn QueryTemplate>,
        default_value: impl Into<String>,
        variable_name: impl Into<String>,
    ) -> Self {
        Self {
            template,
            default_value: default_value.into(),
            variable_name: variable_name.into(),
        }
    }

    /// Encoder for a configuration, plus the template error if the configured
    /// source had to be replaced by the built-in one.
    pub fn from_config(config: &Config) -> (Self, Option<TreeError>) {
        let (template, err) = template::compile_or_default(&config.format_query);
        if let Some(err) = &err {
            debug!(%err, "falling back to built-in query template");
        }
        (
            Self::new(template, &config.default_value, &config.variable_name),
            err,
        )
    }

    pub fn default_value(&self) -> &str {
        &self.default_value
    }

    /// Render the selection; an empty selection or an empty result becomes
    /// the default value.
    pub fn encode(&self, groups: &SelectionGroups) -> Result<String, TreeError> {
        if groups.is_empty() {
            return Ok(self.default_value.clone());
        }
        let query = self.template.render(groups)?;
        if query.is_empty() {
            Ok(self.default_value.clone())
        } else {
            Ok(query)
        }
    }

    /// Encode and write to the store unless the stored value is identical.
    pub fn publish(
        &self,
        store: &mut dyn VariableStore,
        groups: &SelectionGroups,
    ) -> Result<Published> {
        let query = self.encode(groups)?;
        let written = publish_value(store, &self.variable_name, &query)?;
        Ok(Published { query, written })
    }
}

/// Write `value` only if it differs from what the store holds.
pub fn publish_value(store: &mut dyn VariableStore, name: &str, value: &str) -> Result<bool> {
    if store.value(name) == Some(value) {
        return Ok(false);
    }
    debug!(name, value, "setting variable");
    store.set(name, value)?;
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::rows::parse_rows;
    use crate::query::template::{Entity, default_format};
    use crate::tree::builder::{BuildOptions, build};
    use crate::tree::selection::toggle_select;
    use crate::variables::MemoryStore;

    fn encoder(default_value: &str) -> QueryEncoder {
        QueryEncoder::new(Box::new(default_format), default_value, "treequery")
    }

    #[test]
    fn empty_selection_emits_default_value() {
        let enc = encoder("True");
        assert_eq!(enc.encode(&SelectionGroups::default()).unwrap(), "True");
    }

    #[test]
    fn selection_from_forest_encodes_by_type() {
        let table = parse_rows(&[
            "1:Acme:company_id,10:Troll:field_id",
            "1:Acme:company_id,11:Oseberg:field_id",
            "2:Beta:company_id",
        ]);
        let mut forest = build(&table, &BuildOptions::default()).unwrap();
        let troll = forest.find_by_key(&["1", "10"]).unwrap();
        let oseberg = forest.find_by_key(&["1", "11"]).unwrap();
        let beta = forest.find_by_key(&["2"]).unwrap();
        toggle_select(&mut forest, troll);
        toggle_select(&mut forest, beta);
        let selected = toggle_select(&mut forest, oseberg);

        let groups = SelectionGroups::from_nodes(&forest, &selected);
        assert_eq!(
            encoder("").encode(&groups).unwrap(),
            "field_id in (10,11) OR company_id in (2)"
        );
    }

    #[test]
    fn publish_skips_unchanged_value() {
        let enc = encoder("True");
        let mut store = MemoryStore::new();
        let first = enc.publish(&mut store, &SelectionGroups::default()).unwrap();
        assert!(first.written);
        let second = enc.publish(&mut store, &SelectionGroups::default()).unwrap();
        assert!(!second.written);
        assert_eq!(second.query, "True");

        let mut groups = SelectionGroups::default();
        groups.push(Entity {
            id: "3".into(),
            name: "3".into(),
            kind: "well_id".into(),
        });
        let third = enc.publish(&mut store, &groups).unwrap();
        assert!(third.written);
        assert_eq!(store.value("treequery"), Some("well_id in (3)"));
    }

    #[test]
    fn empty_selection_skips_the_template() {
        let everything = |_: &SelectionGroups| -> Result<String, TreeError> { Ok("all".into()) };
        let enc = QueryEncoder::new(Box::new(everything), "True", "treequery");
        assert_eq!(enc.encode(&SelectionGroups::default()).unwrap(), "True");
        let mut groups = SelectionGroups::default();
        groups.push(Entity {
            id: "1".into(),
            name: "Acme".into(),
            kind: "company_id".into(),
        });
        assert_eq!(enc.encode(&groups).unwrap(), "all");
    }

    #[test]
    fn bad_configured_template_reports_and_falls_back() {
        let config = Config {
            format_query: "{{#if}}".into(),
            default_value: "True".into(),
            ..Config::default()
        };
        let (enc, err) = QueryEncoder::from_config(&config);
        assert!(err.is_some());
        assert_eq!(enc.encode(&SelectionGroups::default()).unwrap(), "True");
    }
}
