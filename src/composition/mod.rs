//! Composition: merging subgraph schemas into one supergraph.

use std::collections::HashSet;

use tracing::debug;
use tracing::instrument;

pub mod hints;
mod merger;
mod overrides;

pub use hints::CompositionHint;
pub use hints::HintCode;

use crate::error::CompositionError;
use crate::schema::FrozenSchema;
use crate::subgraph::Subgraph;
use merger::Merger;

/// A successful composition: the supergraph document, its immutable schema,
/// and any hints gathered along the way.
#[derive(Debug)]
pub struct CompositionSuccess {
    pub supergraph_sdl: String,
    pub schema: FrozenSchema,
    pub hints: Vec<CompositionHint>,
}

/// Composes an ordered list of subgraphs into a supergraph, or reports every
/// composition error encountered.
#[instrument(skip(subgraphs))]
pub fn compose(subgraphs: Vec<Subgraph>) -> Result<CompositionSuccess, Vec<CompositionError>> {
    debug!("Pre-merge validations...");
    pre_merge_validations(&subgraphs)?;
    debug!("Merging subgraphs...");
    let merger = Merger::new(subgraphs)?;
    let outcome = merger.merge();
    if !outcome.errors.is_empty() {
        return Err(outcome.errors);
    }
    let (Some(supergraph), Some(supergraph_sdl)) = (outcome.supergraph, outcome.supergraph_sdl)
    else {
        return Err(vec![CompositionError::InternalError {
            message: "Merge completed without errors but produced no supergraph".to_owned(),
        }]);
    };
    debug!("Composition succeeded");
    Ok(CompositionSuccess {
        supergraph_sdl,
        schema: supergraph.to_immutable(),
        hints: outcome.hints,
    })
}

/// Validations that need the whole subgraph list before any merging starts.
#[instrument(skip(subgraphs))]
pub fn pre_merge_validations(subgraphs: &[Subgraph]) -> Result<(), Vec<CompositionError>> {
    if subgraphs.is_empty() {
        return Err(vec![CompositionError::InternalError {
            message: "Cannot compose with an empty subgraph list".to_owned(),
        }]);
    }
    let mut errors = Vec::new();
    let mut seen_names = HashSet::new();
    for subgraph in subgraphs {
        if !seen_names.insert(subgraph.name.as_str()) {
            errors.push(CompositionError::InvalidSubgraphName {
                message: format!(
                    "Subgraph name \"{}\" is used by more than one subgraph",
                    subgraph.name
                ),
            });
        }
    }
    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
