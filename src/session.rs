//! A mounted panel: configuration, tree state, level settings and the
//! variable store, wired together.
//!
//! Mounting reads the store as the source of truth for selection, level order
//! and level checks. Every interaction afterwards publishes on change only.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use tracing::debug;

use crate::error::TreeError;
use crate::levels::codec;
use crate::levels::model::{Level, LevelChecks, OptionIndices};
use crate::panel;
use crate::parser::config::Config;
use crate::parser::table;
use crate::query::encoder::{self, Published, QueryEncoder};
use crate::query::template::{self, SelectionGroups};
use crate::tree::builder::BuildOptions;
use crate::tree::model::NodeId;
use crate::tree::state::PanelState;
use crate::variables::file::FileStore;
use crate::variables::{self, VariableStore, VariableWarning};

/// Everything the panel shows as an alert instead of failing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Diagnostics {
    /// Data could not be turned into a tree; the tree is empty.
    pub format_error: Option<TreeError>,
    /// The configured query template was replaced by the built-in one.
    pub template_error: Option<TreeError>,
    pub warnings: Vec<VariableWarning>,
}

impl Diagnostics {
    pub fn is_empty(&self) -> bool {
        self.format_error.is_none() && self.template_error.is_none() && self.warnings.is_empty()
    }

    pub fn messages(&self) -> Vec<String> {
        let mut out = Vec::new();
        if let Some(err) = &self.format_error {
            out.push(format!(
                "invalid data format: {} (rows are `id,id,...`, `id:name,...` or `id:name:type,...`)",
                err
            ));
        }
        if let Some(err) = &self.template_error {
            out.push(format!("incorrect format query, using the default: {}", err));
        }
        out.extend(self.warnings.iter().map(ToString::to_string));
        out
    }
}

pub struct Session {
    pub config: Config,
    pub state: PanelState,
    pub indices: OptionIndices,
    pub checks: LevelChecks,
    pub diagnostics: Diagnostics,
    encoder: QueryEncoder,
    store: Box<dyn VariableStore>,
}

impl Session {
    /// Mount against already-loaded rows. A row error leaves the tree empty
    /// and is reported through [`Diagnostics`].
    pub fn mount(
        config: Config,
        rows: Result<Vec<String>, TreeError>,
        store: Box<dyn VariableStore>,
    ) -> Self {
        let (encoder, template_error) = QueryEncoder::from_config(&config);
        let state = PanelState::new(BuildOptions {
            expansion_depth: config.default_expansion_level,
            on_duplicate: config.on_duplicate,
        });
        let mut session = Self {
            config,
            state,
            indices: OptionIndices::default(),
            checks: LevelChecks::default(),
            diagnostics: Diagnostics {
                template_error,
                ..Diagnostics::default()
            },
            encoder,
            store,
        };
        session.reload(rows);
        session.restore_from_store();
        session.refresh_warnings();
        session
    }

    /// Mount the panel rooted at `root` with its file-backed store.
    pub fn load(root: &Path) -> Result<Self> {
        let config = panel::load_config(root)
            .with_context(|| format!("failed to load {}", panel::config_path(root).display()))?;
        let rows = read_rows(root, &config.field)?;
        let store = FileStore::open(&panel::variables_path(root))?;
        Ok(Self::mount(config, rows, Box::new(store)))
    }

    /// Rebuild from fresh rows, keeping selection and expansion.
    pub fn reload(&mut self, rows: Result<Vec<String>, TreeError>) {
        let result = rows.and_then(|rows| self.state.load_rows(&rows));
        if let Err(err) = &result {
            debug!(%err, "data rejected");
        }
        self.diagnostics.format_error = result.err();
    }

    pub fn store(&self) -> &dyn VariableStore {
        self.store.as_ref()
    }

    pub fn refresh_warnings(&mut self) {
        let store = self.store.as_ref();
        self.diagnostics.warnings = self
            .config
            .variable_names()
            .into_iter()
            .filter_map(|name| variables::check_variable(store, name))
            .collect();
    }

    pub fn selection_groups(&self) -> SelectionGroups {
        SelectionGroups::from_nodes(self.state.forest(), &self.state.selected())
    }

    /// Handlebars source the query is rendered with: the configured one, or
    /// the built-in format when none is set or it failed to compile.
    pub fn template_source(&self) -> &str {
        let configured = self.config.format_query.trim();
        if configured.is_empty() || self.diagnostics.template_error.is_some() {
            template::DEFAULT_TEMPLATE
        } else {
            &self.config.format_query
        }
    }

    /// Current query string, without touching the store.
    pub fn query(&self) -> Result<String, TreeError> {
        self.encoder.encode(&self.selection_groups())
    }

    pub fn toggle_select(&mut self, node: NodeId) -> Result<Published> {
        self.state.toggle_select(node);
        self.publish_selection()
    }

    pub fn publish_selection(&mut self) -> Result<Published> {
        let groups = self.selection_groups();
        self.encoder.publish(self.store.as_mut(), &groups)
    }

    pub fn sorting_value(&self) -> String {
        codec::format_array(
            &codec::sorting_value(&self.indices),
            self.config.bracketed_arrays,
        )
    }

    pub fn filters_value(&self) -> String {
        codec::format_array(
            &codec::filters_value(&self.indices, &self.checks),
            self.config.bracketed_arrays,
        )
    }

    pub fn move_level(&mut self, level: Level, slot: usize) -> Result<()> {
        self.indices = codec::move_level(&self.indices, level, slot);
        self.publish_levels()
    }

    pub fn set_slots(&mut self, type_slot: usize, company_slot: usize) -> Result<()> {
        self.indices = codec::generate_option_indices(type_slot, company_slot)?;
        self.publish_levels()
    }

    pub fn toggle_level(&mut self, level: Level) -> Result<()> {
        self.checks.toggle(level);
        self.publish_levels()
    }

    pub fn reset_levels(&mut self) -> Result<()> {
        self.indices = OptionIndices::default();
        self.checks = LevelChecks::default();
        self.publish_levels()
    }

    /// Write the sorting and filters variables, each only if changed.
    pub fn publish_levels(&mut self) -> Result<()> {
        let sorting = self.sorting_value();
        let filters = self.filters_value();
        encoder::publish_value(
            self.store.as_mut(),
            &self.config.sorting_variable_name,
            &sorting,
        )?;
        encoder::publish_value(
            self.store.as_mut(),
            &self.config.filters_variable_name,
            &filters,
        )?;
        Ok(())
    }

    fn restore_from_store(&mut self) {
        if let Some(query) = self.store.value(&self.config.variable_name) {
            if query != self.encoder.default_value() {
                let groups = template::parse_default(query);
                if !groups.is_empty() {
                    debug!(clauses = groups.len(), "restoring selection");
                    self.state.restore_selection(&groups);
                }
            }
        }

        let sorting = self
            .store
            .value(&self.config.sorting_variable_name)
            .and_then(|v| codec::parse_array(v).ok())
            .and_then(|values| codec::option_indices(&values).complete());
        self.indices = sorting.unwrap_or_default();

        let checks = self
            .store
            .value(&self.config.filters_variable_name)
            .and_then(|v| codec::parse_array(v).ok())
            .and_then(|values| codec::decode_filters(&values, &self.indices));
        self.checks = checks.unwrap_or_default();
    }
}

/// Rows of the configured field. A missing data file is an empty table;
/// a missing field is a data error, not an I/O failure.
pub fn read_rows(root: &Path, field: &str) -> Result<Result<Vec<String>, TreeError>> {
    let path = panel::data_path(root);
    if !path.exists() {
        return Ok(Ok(Vec::new()));
    }
    let content =
        fs::read_to_string(&path).with_context(|| format!("failed to read {}", path.display()))?;
    Ok(table::column_rows(&content, field))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::builder::DuplicatePolicy;
    use crate::variables::{MemoryStore, Variable};

    const ROWS: [&str; 3] = [
        "1:Acme:company_id,7:Norway:country_id,10:Troll:field_id",
        "1:Acme:company_id,7:Norway:country_id,11:Oseberg:field_id",
        "2:Beta:company_id,8:Brazil:country_id",
    ];

    fn rows() -> Result<Vec<String>, TreeError> {
        Ok(ROWS.iter().map(|r| r.to_string()).collect())
    }

    fn textboxes() -> MemoryStore {
        let mut store = MemoryStore::new();
        for name in ["treequery", "levelsorting", "treefilters"] {
            store.insert(name, Variable::textbox(""));
        }
        store
    }

    fn config() -> Config {
        Config {
            default_value: "True".into(),
            ..Config::default()
        }
    }

    fn node(session: &Session, key: &[&str]) -> NodeId {
        session.state.forest().find_by_key(key).unwrap()
    }

    #[test]
    fn empty_selection_publishes_default() {
        let mut session = Session::mount(config(), rows(), Box::new(textboxes()));
        let published = session.publish_selection().unwrap();
        assert_eq!(published.query, "True");
        assert_eq!(session.store().value("treequery"), Some("True"));
    }

    #[test]
    fn template_source_falls_back_to_builtin() {
        let session = Session::mount(config(), rows(), Box::new(textboxes()));
        assert_eq!(session.template_source(), template::DEFAULT_TEMPLATE);

        let broken = Config {
            format_query: "{{#each this}}".into(),
            ..config()
        };
        let session = Session::mount(broken, rows(), Box::new(textboxes()));
        assert_eq!(session.template_source(), template::DEFAULT_TEMPLATE);

        let custom = Config {
            format_query: "{{#each this}}{{@key}}{{/each}}".into(),
            ..config()
        };
        let session = Session::mount(custom, rows(), Box::new(textboxes()));
        assert_eq!(session.template_source(), "{{#each this}}{{@key}}{{/each}}");
    }

    #[test]
    fn select_publishes_and_remount_restores() {
        let mut session = Session::mount(config(), rows(), Box::new(textboxes()));
        let troll = node(&session, &["1", "7", "10"]);
        let published = session.toggle_select(troll).unwrap();
        assert_eq!(published.query, "field_id in (10)");
        assert!(published.written);

        let mut store = MemoryStore::new();
        store.insert("treequery", Variable::textbox(published.query));
        let remounted = Session::mount(config(), rows(), Box::new(store));
        let selected = remounted.state.selected();
        assert_eq!(selected.len(), 1);
        assert_eq!(remounted.state.forest().node(selected[0]).name, "Troll");
        // path to the restored node is open
        assert_eq!(remounted.state.rows().len(), 5);
    }

    #[test]
    fn default_value_restores_nothing() {
        let mut store = textboxes();
        store.insert("treequery", Variable::textbox("True"));
        let session = Session::mount(config(), rows(), Box::new(store));
        assert!(session.state.selected().is_empty());
    }

    #[test]
    fn warnings_for_unconfigured_variables() {
        let session = Session::mount(config(), rows(), Box::new(MemoryStore::new()));
        assert_eq!(session.diagnostics.warnings.len(), 3);
        let configured = Session::mount(config(), rows(), Box::new(textboxes()));
        assert!(configured.diagnostics.is_empty());
    }

    #[test]
    fn format_error_leaves_empty_tree_and_diagnostic() {
        let cfg = Config {
            on_duplicate: DuplicatePolicy::Error,
            ..config()
        };
        let bad = Ok(vec!["1:a".to_string(), "1:b".to_string()]);
        let session = Session::mount(cfg, bad, Box::new(textboxes()));
        assert!(session.state.forest().is_empty());
        assert!(session.diagnostics.format_error.is_some());
        assert!(session.diagnostics.messages()[0].starts_with("invalid data format"));
    }

    #[test]
    fn missing_field_is_a_diagnostic() {
        let session = Session::mount(
            config(),
            Err(TreeError::MissingField("tree".into())),
            Box::new(textboxes()),
        );
        assert_eq!(
            session.diagnostics.format_error,
            Some(TreeError::MissingField("tree".into()))
        );
    }

    #[test]
    fn levels_publish_and_restore() {
        let mut session = Session::mount(config(), rows(), Box::new(textboxes()));
        session.set_slots(1, 0).unwrap();
        session.toggle_level(Level::Well).unwrap();
        assert_eq!(session.store().value("levelsorting"), Some("1,2,3,4"));
        assert_eq!(
            session.store().value("treefilters"),
            Some("1,1,1,1,1,1,1,1,1,0,1")
        );

        let mut store = MemoryStore::new();
        store.insert("levelsorting", Variable::textbox("1,2,3,4"));
        store.insert("treefilters", Variable::textbox("1,1,1,1,1,1,1,1,1,0,1"));
        let remounted = Session::mount(config(), rows(), Box::new(store));
        assert_eq!(remounted.indices, session.indices);
        assert!(!remounted.checks[Level::Well]);
    }

    #[test]
    fn malformed_level_variables_fall_back_to_defaults() {
        let mut store = textboxes();
        store.insert("levelsorting", Variable::textbox("9,9"));
        store.insert("treefilters", Variable::textbox("x"));
        let session = Session::mount(config(), rows(), Box::new(store));
        assert_eq!(session.indices, OptionIndices::default());
        assert_eq!(session.checks, LevelChecks::default());
    }

    #[test]
    fn bracketed_arrays_on_request() {
        let cfg = Config {
            bracketed_arrays: true,
            ..config()
        };
        let session = Session::mount(cfg, rows(), Box::new(textboxes()));
        assert_eq!(session.sorting_value(), "[3,4,2,1]");
    }

    #[test]
    fn reload_keeps_selection() {
        let mut session = Session::mount(config(), rows(), Box::new(textboxes()));
        let beta = node(&session, &["2"]);
        session.toggle_select(beta).unwrap();
        session.reload(rows());
        assert_eq!(session.query().unwrap(), "company_id in (2)");
    }
}
