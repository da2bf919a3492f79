//! Operation depth guard.
//!
//! Top-level fields sit at depth 0 and each nested selection set adds one.
//! Fragment spreads and inline fragments are transparent: their fields count
//! at the depth of the selection set they are spread into. Every selection
//! counts at the depth it is reached, `__` fields included, but nothing below
//! a `__` field is walked.

use {
    async_graphql_parser::{
        Pos, Positioned,
        types::{ExecutableDocument, FragmentDefinition, Selection, SelectionSet},
    },
    async_graphql_value::Name,
    std::collections::HashMap,
    tracing::warn,
};

use crate::{
    error::{ExecutionError, GraphQlError},
    validation::operations,
};

/// Deepest allowed field level.
pub const DEFAULT_MAX_DEPTH: usize = 5;

/// Deepest field found in an operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Depth {
    pub depth: usize,
    /// Position of the first field found at that depth.
    pub pos: Pos,
}

/// Measure every operation in the document; one error per operation whose
/// deepest field lies beyond `max_depth`.
#[must_use]
pub fn check_depth(document: &ExecutableDocument, max_depth: usize) -> Vec<GraphQlError> {
    let mut errors = Vec::new();
    for (name, operation) in operations(document) {
        let Some(deepest) = measure(&operation.node.selection_set.node, &document.fragments) else {
            continue;
        };
        if deepest.depth > max_depth {
            // Anonymous operations report an empty name.
            let operation = name.map(ToString::to_string).unwrap_or_default();
            warn!(%operation, depth = deepest.depth, limit = max_depth, "operation too deep");
            errors.push(
                ExecutionError::DepthLimitExceeded {
                    operation,
                    limit: max_depth,
                }
                .at(deepest.pos),
            );
        }
    }
    errors
}

/// Depth of the deepest selection in `selection_set`, or `None` when it is
/// empty.
#[must_use]
pub fn measure(
    selection_set: &SelectionSet,
    fragments: &HashMap<Name, Positioned<FragmentDefinition>>,
) -> Option<Depth> {
    let mut walker = Walker {
        fragments,
        visiting: Vec::new(),
    };
    walker.selection_set(selection_set, 0)
}

struct Walker<'a> {
    fragments: &'a HashMap<Name, Positioned<FragmentDefinition>>,
    /// Fragments currently being expanded. Cycles are a validation error;
    /// here they are cut short.
    visiting: Vec<&'a str>,
}

impl<'a> Walker<'a> {
    fn selection_set(&mut self, selection_set: &'a SelectionSet, depth: usize) -> Option<Depth> {
        let mut deepest: Option<Depth> = None;
        for selection in &selection_set.items {
            let (pos, below) = match &selection.node {
                Selection::Field(field) => {
                    let below = if field.node.name.node.as_str().starts_with("__") {
                        None
                    } else {
                        self.selection_set(&field.node.selection_set.node, depth + 1)
                    };
                    (field.pos, below)
                },
                Selection::FragmentSpread(spread) => {
                    let name = spread.node.fragment_name.node.as_str();
                    let below = match self.fragments.get(name) {
                        Some(fragment) if !self.visiting.contains(&name) => {
                            self.visiting.push(name);
                            let found =
                                self.selection_set(&fragment.node.selection_set.node, depth);
                            self.visiting.pop();
                            found
                        },
                        _ => None,
                    };
                    (spread.pos, below)
                },
                Selection::InlineFragment(inline) => (
                    inline.pos,
                    self.selection_set(&inline.node.selection_set.node, depth),
                ),
            };
            let found = match below {
                Some(below) if below.depth > depth => below,
                _ => Depth { depth, pos },
            };
            if deepest.is_none_or(|d| found.depth > d.depth) {
                deepest = Some(found);
            }
        }
        deepest
    }
}
