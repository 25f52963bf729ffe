//! Validation and rewriting of `@override(from:)` applications.
//!
//! For every overridden field the outcome is one of: an error (the override
//! is ignored), removal of the source subgraph's contribution, or — when the
//! overridden field is a component of a `@key` — keeping the field visible in
//! the source subgraph but marked external so the key can still be
//! advertised there.

use indexmap::IndexSet;
use tracing::trace;

use crate::composition::hints::CompositionHint;
use crate::composition::hints::HintCode;
use crate::composition::merger::MergedSubgraph;
use crate::error::CompositionError;
use crate::schema::position::ObjectFieldDefinitionPosition;

/// Rewrites decided by override validation, keyed by subgraph index and
/// field coordinate.
#[derive(Debug, Default)]
pub(crate) struct OverridePlan {
    /// Contributions dropped from the supergraph entirely.
    removed: IndexSet<(usize, ObjectFieldDefinitionPosition)>,
    /// Contributions kept but annotated `external: true`: the source subgraph
    /// still advertises the field (it is a key component) without resolving
    /// it.
    forced_external: IndexSet<(usize, ObjectFieldDefinitionPosition)>,
}

impl OverridePlan {
    pub(crate) fn is_removed(&self, subgraph: usize, field: &ObjectFieldDefinitionPosition) -> bool {
        self.removed.contains(&(subgraph, field.clone()))
    }

    pub(crate) fn is_forced_external(
        &self,
        subgraph: usize,
        field: &ObjectFieldDefinitionPosition,
    ) -> bool {
        self.forced_external.contains(&(subgraph, field.clone()))
    }
}

/// Everything override validation decides: the rewrites to apply during the
/// merge plus the errors and hints it produced along the way.
pub(crate) struct OverrideReview {
    pub(crate) plan: OverridePlan,
    pub(crate) errors: Vec<CompositionError>,
    pub(crate) hints: Vec<CompositionHint>,
}

/// Applies the override rule table across all subgraphs.
pub(crate) fn validate_overrides(subgraphs: &[MergedSubgraph]) -> OverrideReview {
    let mut plan = OverridePlan::default();
    let mut errors = Vec::new();
    let mut hints = Vec::new();

    for (index, subgraph) in subgraphs.iter().enumerate() {
        for (field, from) in subgraph.metadata.overrides() {
            let coordinate = field.to_string();
            trace!(
                "validate_overrides: {coordinate} in `{}` overrides `{from}`",
                subgraph.name
            );

            if *from == subgraph.name {
                errors.push(CompositionError::OverrideFromSelfError {
                    message: format!(
                        "Source and destination subgraphs \"{}\" are the same for overridden field \"{coordinate}\"",
                        subgraph.name
                    ),
                });
                continue;
            }

            let mut valid = true;

            // The overriding declaration must not itself be @external.
            if subgraph.metadata.is_field_external(field) {
                errors.push(CompositionError::OverrideCollisionWithAnotherDirective {
                    message: format!(
                        "@override cannot be used on field \"{coordinate}\" on subgraph \"{}\" since \"{coordinate}\" on \"{}\" is marked with directive \"@external\"",
                        subgraph.name, subgraph.name
                    ),
                });
                valid = false;
            }

            let Some((source_index, source)) = subgraphs
                .iter()
                .enumerate()
                .find(|(_, other)| other.name == *from)
            else {
                // The named source subgraph does not exist; there is nothing
                // to transfer resolution from, so the override is a no-op.
                continue;
            };

            if source.metadata.overrides().contains_key(field) {
                errors.push(CompositionError::OverrideSourceHasOverride {
                    message: format!(
                        "Field \"{coordinate}\" on subgraph \"{}\" is also marked with directive @override in subgraph \"{from}\". Only one @override directive is allowed per field.",
                        subgraph.name
                    ),
                });
                valid = false;
            } else if source.field_exists(field) && source.metadata.is_field_external(field) {
                errors.push(CompositionError::OverrideCollisionWithAnotherDirective {
                    message: format!(
                        "@override cannot be used on field \"{coordinate}\" on subgraph \"{}\" since \"{coordinate}\" on \"{from}\" is marked with directive \"@external\"",
                        subgraph.name
                    ),
                });
                valid = false;
            }

            if !valid || !source.field_exists(field) {
                continue;
            }

            if source.metadata.is_field_key(field) {
                plan.forced_external.insert((source_index, field.clone()));
                hints.push(CompositionHint {
                    code: HintCode::OverriddenFieldCanBeMadeExternal,
                    message: format!(
                        "Field \"{coordinate}\" on subgraph \"{from}\" is overridden by subgraph \"{}\" but remains a key field; it is marked external and is no longer resolved by \"{from}\"",
                        subgraph.name
                    ),
                });
            } else {
                plan.removed.insert((source_index, field.clone()));
                hints.push(CompositionHint {
                    code: HintCode::OverriddenFieldCanBeRemoved,
                    message: format!(
                        "Field \"{coordinate}\" on subgraph \"{from}\" is overridden by subgraph \"{}\". Consider removing it from \"{from}\" if it is not used elsewhere.",
                        subgraph.name
                    ),
                });
            }
        }
    }

    OverrideReview {
        plan,
        errors,
        hints,
    }
}
