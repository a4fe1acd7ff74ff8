//! Assemble parsed path rows into a deduplicated forest in one pass.
//!
//! First-seen order is preserved at every level; the builder never sorts.

use crate::error::TreeError;
use crate::parser::rows::PathTable;
use crate::tree::model::{Forest, NodeId};

/// What to do when a row repeats a sibling id with a different name or type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DuplicatePolicy {
    /// Keep the first occurrence, ignore later name/type.
    #[default]
    KeepFirst,
    /// Later occurrences replace name and type.
    Overwrite,
    /// Fail the build with [`TreeError::Conflict`].
    Error,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BuildOptions {
    /// Levels `0..expansion_depth` start expanded.
    pub expansion_depth: usize,
    pub on_duplicate: DuplicatePolicy,
}

pub fn build(table: &PathTable, options: &BuildOptions) -> Result<Forest, TreeError> {
    let mut forest = Forest::new();

    for (row_idx, row) in table.iter().enumerate() {
        // Parent of the working list for the current level.
        let mut working: Option<NodeId> = None;

        for (level, item) in row.iter().enumerate() {
            if level > 0 {
                let prev = &row[level - 1].id;
                let parent = forest
                    .find_child(working, prev)
                    .ok_or_else(|| TreeError::Format {
                        row: row_idx + 1,
                        level,
                        id: item.id.clone(),
                        parent: prev.clone(),
                    })?;
                working = Some(parent);
            }

            match forest.find_child(working, &item.id) {
                None => {
                    let node = forest.push(working, &item.id, &item.name, &item.kind);
                    if level < options.expansion_depth {
                        forest.node_mut(node).expanded = true;
                    }
                }
                Some(existing) => {
                    let node = forest.node_mut(existing);
                    if node.name == item.name && node.kind == item.kind {
                        continue;
                    }
                    match options.on_duplicate {
                        DuplicatePolicy::KeepFirst => {}
                        DuplicatePolicy::Overwrite => {
                            node.name = item.name.clone();
                            node.kind = item.kind.clone();
                        }
                        DuplicatePolicy::Error => {
                            return Err(TreeError::Conflict {
                                row: row_idx + 1,
                                id: item.id.clone(),
                                existing: format!("{}:{}", node.name, node.kind),
                                incoming: format!("{}:{}", item.name, item.kind),
                            });
                        }
                    }
                }
            }
        }
    }

    Ok(forest)
}
