//! Turning a grouped selection into a filter string.
//!
//! The formatter is injected: anything implementing [`QueryTemplate`], which
//! includes plain functions and closures. User-supplied sources compile to a
//! [`HandlebarsTemplate`].

use handlebars::Handlebars;
use serde::ser::{Serialize, SerializeMap, Serializer};

use crate::error::TreeError;
use crate::tree::model::{Forest, NodeId};

/// Handlebars source equivalent to [`default_format`].
pub const DEFAULT_TEMPLATE: &str = "{{#each this}}{{#if @index}} OR {{/if}}{{@key}} in ({{#each this}}{{#if @index}},{{/if}}{{id}}{{/each}}){{/each}}";

const TEMPLATE_NAME: &str = "query";

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct Entity {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
}

/// Selected entities keyed by type, types in first-seen order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionGroups {
    groups: Vec<(String, Vec<Entity>)>,
}

impl SelectionGroups {
    pub fn from_nodes(forest: &Forest, nodes: &[NodeId]) -> Self {
        let mut out = Self::default();
        for &n in nodes {
            let node = forest.node(n);
            out.push(Entity {
                id: node.id.clone(),
                name: node.name.clone(),
                kind: node.kind.clone(),
            });
        }
        out
    }

    pub fn push(&mut self, entity: Entity) {
        match self.groups.iter_mut().find(|(k, _)| *k == entity.kind) {
            Some((_, list)) => list.push(entity),
            None => self.groups.push((entity.kind.clone(), vec![entity])),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[Entity])> {
        self.groups.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }
}

impl Serialize for SelectionGroups {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.groups.len()))?;
        for (kind, entities) in &self.groups {
            map.serialize_entry(kind, entities)?;
        }
        map.end()
    }
}

pub trait QueryTemplate {
    fn render(&self, groups: &SelectionGroups) -> Result<String, TreeError>;
}

impl<F> QueryTemplate for F
where
    F: Fn(&SelectionGroups) -> Result<String, TreeError>,
{
    fn render(&self, groups: &SelectionGroups) -> Result<String, TreeError> {
        self(groups)
    }
}

/// `type in (id,id) OR type in (id)`.
pub fn default_format(groups: &SelectionGroups) -> Result<String, TreeError> {
    Ok(groups
        .iter()
        .map(|(kind, entities)| {
            let ids = entities
                .iter()
                .map(|e| e.id.as_str())
                .collect::<Vec<_>>()
                .join(",");
            format!("{} in ({})", kind, ids)
        })
        .collect::<Vec<_>>()
        .join(" OR "))
}

pub struct HandlebarsTemplate {
    registry: Handlebars<'static>,
}

impl HandlebarsTemplate {
    pub fn compile(source: &str) -> Result<Self, TreeError> {
        let mut registry = Handlebars::new();
        registry.register_escape_fn(handlebars::no_escape);
        registry
            .register_template_string(TEMPLATE_NAME, source)
            .map_err(|e| TreeError::Template(e.to_string()))?;
        Ok(Self { registry })
    }
}

impl QueryTemplate for HandlebarsTemplate {
    fn render(&self, groups: &SelectionGroups) -> Result<String, TreeError> {
        self.registry
            .render(TEMPLATE_NAME, groups)
            .map_err(|e| TreeError::Template(e.to_string()))
    }
}

/// Compile a configured source; an empty source or a compile error yields
/// the built-in formatter, the latter together with the error to surface.
pub fn compile_or_default(source: &str) -> (Box<dyn QueryTemplate>, Option<TreeError>) {
    if source.trim().is_empty() {
        return (Box::new(default_format), None);
    }
    match HandlebarsTemplate::compile(source) {
        Ok(template) => (Box::new(template), None),
        Err(err) => (Box::new(default_format), Some(err)),
    }
}

/// Read back a query in the built-in format as `(type, ids)` clauses.
/// Clauses in any other shape are skipped.
pub fn parse_default(query: &str) -> Vec<(String, Vec<String>)> {
    query
        .split(" OR ")
        .filter_map(|clause| {
            let (kind, rest) = clause.trim().split_once(" in (")?;
            let ids = rest.strip_suffix(')')?;
            if kind.is_empty() || ids.is_empty() {
                return None;
            }
            Some((
                kind.to_string(),
                ids.split(',').map(str::to_string).collect(),
            ))
        })
        .collect()
}
