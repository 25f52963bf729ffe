//! The subgraph merger: builds the supergraph schema and its SDL.

use apollo_compiler::Name;
use indexmap::IndexMap;
use indexmap::IndexSet;
use itertools::Itertools;
use tracing::debug;
use tracing::trace;

use crate::composition::hints::CompositionHint;
use crate::composition::overrides::validate_overrides;
use crate::composition::overrides::OverridePlan;
use crate::composition::overrides::OverrideReview;
use crate::error::CompositionError;
use crate::error::SchemaError;
use crate::schema::position::ObjectFieldDefinitionPosition;
use crate::schema::position::SchemaDefinitionPosition;
use crate::schema::position::SchemaRootDefinitionKind;
use crate::schema::position::SchemaRootDefinitionPosition;
use crate::schema::values::Directive;
use crate::schema::values::Value;
use crate::schema::FieldDefinition;
use crate::schema::InputFieldDefinition;
use crate::schema::NamedType;
use crate::schema::Schema;
use crate::schema::TypeKind;
use crate::subgraph::metadata::SubgraphMetadata;
use crate::subgraph::spec::CORE_DIRECTIVE_NAME;
use crate::subgraph::spec::CORE_FEATURE_URL;
use crate::subgraph::spec::EXTERNAL_ARGUMENT_NAME;
use crate::subgraph::spec::FEATURE_ARGUMENT_NAME;
use crate::subgraph::spec::FEDERATION_DIRECTIVE_NAMES;
use crate::subgraph::spec::FIELDS_ARGUMENT_NAME;
use crate::subgraph::spec::FOR_ARGUMENT_NAME;
use crate::subgraph::spec::GRAPH_ARGUMENT_NAME;
use crate::subgraph::spec::JOIN_FEATURE_URL;
use crate::subgraph::spec::JOIN_FIELD_DIRECTIVE_NAME;
use crate::subgraph::spec::JOIN_FIELD_SET_SCALAR_NAME;
use crate::subgraph::spec::JOIN_GRAPH_DIRECTIVE_NAME;
use crate::subgraph::spec::JOIN_GRAPH_ENUM_NAME;
use crate::subgraph::spec::JOIN_TYPE_DIRECTIVE_NAME;
use crate::subgraph::spec::KEY_ARGUMENT_NAME;
use crate::subgraph::spec::KEY_DIRECTIVE_NAME;
use crate::subgraph::spec::PROVIDES_ARGUMENT_NAME;
use crate::subgraph::spec::PROVIDES_DIRECTIVE_NAME;
use crate::subgraph::spec::REQUIRES_ARGUMENT_NAME;
use crate::subgraph::spec::REQUIRES_DIRECTIVE_NAME;
use crate::subgraph::spec::SUPERGRAPH_PREAMBLE;
use crate::subgraph::Subgraph;

/// A subgraph prepared for merging: schema plus precomputed metadata and the
/// `join__Graph` enum name.
pub(crate) struct MergedSubgraph {
    pub(crate) name: String,
    pub(crate) url: String,
    pub(crate) graph_name: Name,
    pub(crate) schema: Schema,
    pub(crate) metadata: SubgraphMetadata,
}

impl MergedSubgraph {
    pub(crate) fn field_exists(&self, field: &ObjectFieldDefinitionPosition) -> bool {
        field.try_get(&self.schema).is_some()
    }

    fn field<'s>(&'s self, field: &ObjectFieldDefinitionPosition) -> Option<&'s FieldDefinition> {
        field.try_get(&self.schema)
    }
}

/// The result of a merge: either a supergraph (schema + SDL + hints) or the
/// accumulated errors.
pub(crate) struct MergeOutcome {
    pub(crate) supergraph: Option<Schema>,
    pub(crate) supergraph_sdl: Option<String>,
    pub(crate) errors: Vec<CompositionError>,
    pub(crate) hints: Vec<CompositionHint>,
}

pub(crate) struct Merger {
    subgraphs: Vec<MergedSubgraph>,
    /// Errors and hints accumulated across the merge, so composition keeps
    /// going and reports as much as possible at once.
    errors: Vec<CompositionError>,
    hints: Vec<CompositionHint>,
}

impl Merger {
    pub(crate) fn new(subgraphs: Vec<Subgraph>) -> Result<Self, Vec<CompositionError>> {
        let mut merged = Vec::with_capacity(subgraphs.len());
        for subgraph in subgraphs {
            let metadata = SubgraphMetadata::new(&subgraph.schema).map_err(|err| {
                vec![CompositionError::InternalError {
                    message: format!("[{}] {err}", subgraph.name),
                }]
            })?;
            merged.push(MergedSubgraph {
                graph_name: subgraph.graph_enum_name(),
                name: subgraph.name,
                url: subgraph.url,
                schema: subgraph.schema,
                metadata,
            });
        }
        Ok(Self {
            subgraphs: merged,
            errors: Vec::new(),
            hints: Vec::new(),
        })
    }

    pub(crate) fn merge(mut self) -> MergeOutcome {
        debug!("Validating overrides...");
        let OverrideReview {
            plan,
            errors,
            hints,
        } = validate_overrides(&self.subgraphs);
        self.errors.extend(errors);
        self.hints.extend(hints);

        debug!("Merging subgraphs into the supergraph...");
        let mut supergraph = Schema::new();
        if let Err(err) = self.merge_into(&mut supergraph, &plan) {
            self.errors.push(CompositionError::InternalError {
                message: err.to_string(),
            });
        }

        if self.errors.is_empty() {
            let supergraph_sdl = print_supergraph(&supergraph, &self.subgraphs);
            MergeOutcome {
                supergraph: Some(supergraph),
                supergraph_sdl: Some(supergraph_sdl),
                errors: self.errors,
                hints: self.hints,
            }
        } else {
            MergeOutcome {
                supergraph: None,
                supergraph_sdl: None,
                errors: self.errors,
                hints: self.hints,
            }
        }
    }

    fn merge_into(
        &mut self,
        supergraph: &mut Schema,
        plan: &OverridePlan,
    ) -> Result<(), SchemaError> {
        SchemaDefinitionPosition.insert_directive(
            supergraph,
            Directive::new(CORE_DIRECTIVE_NAME)
                .with_argument(FEATURE_ARGUMENT_NAME, Value::String(CORE_FEATURE_URL.to_owned())),
        )?;
        SchemaDefinitionPosition.insert_directive(
            supergraph,
            Directive::new(CORE_DIRECTIVE_NAME)
                .with_argument(FEATURE_ARGUMENT_NAME, Value::String(JOIN_FEATURE_URL.to_owned()))
                .with_argument(FOR_ARGUMENT_NAME, Value::Enum(apollo_compiler::name!("EXECUTION"))),
        )?;
        supergraph.add_scalar_type(JOIN_FIELD_SET_SCALAR_NAME)?;

        // Pass A: type shells, in first-seen order across subgraphs.
        let mut definers: IndexMap<Name, Vec<usize>> = IndexMap::new();
        let mut skipped: IndexSet<Name> = IndexSet::new();
        for (index, subgraph) in self.subgraphs.iter().enumerate() {
            for (type_name, ty) in subgraph.schema.types() {
                match supergraph.type_kind(type_name) {
                    Err(_) => {
                        match ty.kind() {
                            TypeKind::Scalar => {
                                supergraph.add_scalar_type(type_name.clone())?;
                            }
                            TypeKind::Object => {
                                supergraph.add_object_type(type_name.clone())?;
                            }
                            TypeKind::Union => {
                                supergraph.add_union_type(type_name.clone())?;
                            }
                            TypeKind::InputObject => {
                                supergraph.add_input_object_type(type_name.clone())?;
                            }
                        }
                        definers.insert(type_name.clone(), vec![index]);
                    }
                    Ok(kind) if kind == ty.kind() => {
                        definers
                            .entry(type_name.clone())
                            .or_default()
                            .push(index);
                    }
                    Ok(kind) => {
                        if skipped.insert(type_name.clone()) {
                            self.errors.push(CompositionError::InternalError {
                                message: format!(
                                    "Type \"{type_name}\" has mismatched kinds across subgraphs: {} in \"{}\" and {} elsewhere",
                                    ty.kind().as_str(),
                                    subgraph.name,
                                    kind.as_str(),
                                ),
                            });
                        }
                    }
                }
            }
        }

        // Root types are the union of per-subgraph roots.
        let mut root_type_names: IndexSet<Name> = IndexSet::new();
        for root_kind in [
            SchemaRootDefinitionKind::Query,
            SchemaRootDefinitionKind::Mutation,
            SchemaRootDefinitionKind::Subscription,
        ] {
            let position = SchemaRootDefinitionPosition { root_kind };
            for subgraph in &self.subgraphs {
                if let Some(root_type) = position.try_get(&subgraph.schema) {
                    root_type_names.insert(root_type.clone());
                    if position.try_get(supergraph).is_none() {
                        position.insert(supergraph, root_type.clone())?;
                    }
                }
            }
        }

        // Pass B: fill every merged type.
        for (type_name, type_definers) in &definers {
            if skipped.contains(type_name) {
                continue;
            }
            let kind = supergraph.type_kind(type_name)?;
            trace!("merging {} type \"{type_name}\"", kind.as_str());
            match kind {
                TypeKind::Scalar => {
                    self.merge_scalar_type(supergraph, type_name, type_definers)?
                }
                TypeKind::Object => self.merge_object_type(
                    supergraph,
                    type_name,
                    type_definers,
                    plan,
                    root_type_names.contains(type_name),
                )?,
                TypeKind::Union => self.merge_union_type(supergraph, type_name, type_definers)?,
                TypeKind::InputObject => {
                    self.merge_input_object_type(supergraph, type_name, type_definers)?
                }
            }
        }
        Ok(())
    }

    fn join_type_directives(
        &self,
        type_name: &Name,
        type_definers: &[usize],
    ) -> Vec<(usize, Directive)> {
        let mut directives = Vec::new();
        for &index in type_definers {
            let subgraph = &self.subgraphs[index];
            let graph = Value::Enum(subgraph.graph_name.clone());
            let keys: Vec<String> = subgraph
                .schema
                .try_get_type(type_name.clone())
                .and_then(|position| {
                    position
                        .directives(&subgraph.schema)
                        .ok()
                        .map(|directives| {
                            directives
                                .get_all(KEY_DIRECTIVE_NAME.as_str())
                                .filter_map(|application| {
                                    application
                                        .argument(FIELDS_ARGUMENT_NAME.as_str())
                                        .and_then(|value| value.as_str())
                                        .map(str::to_owned)
                                })
                                .collect()
                        })
                })
                .unwrap_or_default();
            if keys.is_empty() {
                directives.push((
                    index,
                    Directive::new(JOIN_TYPE_DIRECTIVE_NAME)
                        .with_argument(GRAPH_ARGUMENT_NAME, graph.clone()),
                ));
            } else {
                for key in keys {
                    directives.push((
                        index,
                        Directive::new(JOIN_TYPE_DIRECTIVE_NAME)
                            .with_argument(GRAPH_ARGUMENT_NAME, graph.clone())
                            .with_argument(KEY_ARGUMENT_NAME, Value::String(key)),
                    ));
                }
            }
        }
        directives
    }

    fn merge_scalar_type(
        &mut self,
        supergraph: &mut Schema,
        type_name: &Name,
        type_definers: &[usize],
    ) -> Result<(), SchemaError> {
        let position = supergraph.add_scalar_type(type_name.clone())?;
        for (_, directive) in self.join_type_directives(type_name, type_definers) {
            position.insert_directive(supergraph, directive)?;
        }
        Ok(())
    }

    fn merge_union_type(
        &mut self,
        supergraph: &mut Schema,
        type_name: &Name,
        type_definers: &[usize],
    ) -> Result<(), SchemaError> {
        let position = supergraph.add_union_type(type_name.clone())?;
        for (_, directive) in self.join_type_directives(type_name, type_definers) {
            position.insert_directive(supergraph, directive)?;
        }
        for &index in type_definers {
            let subgraph = &self.subgraphs[index];
            let Some(NamedType::Union(union_type)) = subgraph.schema.types.get(type_name) else {
                continue;
            };
            let members: Vec<Name> = union_type.members().iter().cloned().collect();
            for member in members {
                position.add_member(supergraph, member)?;
            }
        }
        Ok(())
    }

    fn merge_input_object_type(
        &mut self,
        supergraph: &mut Schema,
        type_name: &Name,
        type_definers: &[usize],
    ) -> Result<(), SchemaError> {
        let position = supergraph.add_input_object_type(type_name.clone())?;
        for (_, directive) in self.join_type_directives(type_name, type_definers) {
            position.insert_directive(supergraph, directive)?;
        }
        let mut field_order: IndexSet<Name> = IndexSet::new();
        for &index in type_definers {
            if let Some(NamedType::InputObject(input_object)) =
                self.subgraphs[index].schema.types.get(type_name)
            {
                field_order.extend(input_object.fields().keys().cloned());
            }
        }
        for field_name in &field_order {
            let occurrences: Vec<(usize, &InputFieldDefinition)> = type_definers
                .iter()
                .filter_map(|&index| {
                    match self.subgraphs[index].schema.types.get(type_name) {
                        Some(NamedType::InputObject(input_object)) => input_object
                            .fields()
                            .get(field_name)
                            .map(|field| (index, field)),
                        _ => None,
                    }
                })
                .collect();
            let Some((_, declaration)) = occurrences.first() else {
                continue;
            };
            let mut merged = (*declaration).clone();
            merged.directives.retain(|d| !is_federation_directive(&d.name));
            if occurrences.len() < type_definers.len() {
                for (index, _) in &occurrences {
                    merged.directives.push(
                        Directive::new(JOIN_FIELD_DIRECTIVE_NAME).with_argument(
                            GRAPH_ARGUMENT_NAME,
                            Value::Enum(self.subgraphs[*index].graph_name.clone()),
                        ),
                    );
                }
            }
            position
                .field(field_name.clone())
                .insert(supergraph, merged)?;
        }
        Ok(())
    }

    fn merge_object_type(
        &mut self,
        supergraph: &mut Schema,
        type_name: &Name,
        type_definers: &[usize],
        plan: &OverridePlan,
        is_root_type: bool,
    ) -> Result<(), SchemaError> {
        let position = supergraph.add_object_type(type_name.clone())?;
        for (_, directive) in self.join_type_directives(type_name, type_definers) {
            position.insert_directive(supergraph, directive)?;
        }

        let mut field_order: IndexSet<Name> = IndexSet::new();
        for &index in type_definers {
            if let Some(NamedType::Object(object)) =
                self.subgraphs[index].schema.types.get(type_name)
            {
                field_order.extend(object.fields().keys().cloned());
            }
        }

        for field_name in &field_order {
            let field_position = position.field(field_name.clone());
            let occurrences: Vec<usize> = type_definers
                .iter()
                .copied()
                .filter(|&index| self.subgraphs[index].field_exists(&field_position))
                .collect();

            let mut resolvers: Vec<usize> = Vec::new();
            let mut externals: Vec<usize> = Vec::new();
            for &index in &occurrences {
                if plan.is_removed(index, &field_position) {
                    continue;
                }
                if plan.is_forced_external(index, &field_position)
                    || self.subgraphs[index]
                        .metadata
                        .is_field_external(&field_position)
                {
                    externals.push(index);
                } else {
                    resolvers.push(index);
                }
            }
            if resolvers.is_empty() && externals.is_empty() {
                continue;
            }

            self.check_field_sharing(&field_position, &resolvers);

            // The declaration comes from the first resolving subgraph; a
            // valid override makes the overriding subgraph the sole resolver,
            // so declaration mismatches resolve in its favor.
            let declaration_index = resolvers.first().or(externals.first()).copied();
            let Some(declaration_index) = declaration_index else {
                continue;
            };
            let Some(declaration) = self.subgraphs[declaration_index].field(&field_position)
            else {
                continue;
            };
            let mut merged = declaration.clone();
            merged.directives.retain(|d| !is_federation_directive(&d.name));

            let fully_shared = resolvers.len() == type_definers.len()
                && externals.is_empty()
                && resolvers.iter().all(|&index| {
                    let field = self.subgraphs[index].field(&field_position);
                    field.map_or(true, |field| {
                        !field.directives().has(REQUIRES_DIRECTIVE_NAME.as_str())
                            && !field.directives().has(PROVIDES_DIRECTIVE_NAME.as_str())
                    })
                });
            if is_root_type || !fully_shared {
                for &index in &resolvers {
                    merged
                        .directives
                        .push(self.join_field_directive(index, &field_position));
                }
                for &index in &externals {
                    merged.directives.push(
                        Directive::new(JOIN_FIELD_DIRECTIVE_NAME)
                            .with_argument(
                                GRAPH_ARGUMENT_NAME,
                                Value::Enum(self.subgraphs[index].graph_name.clone()),
                            )
                            .with_argument(EXTERNAL_ARGUMENT_NAME, Value::Boolean(true)),
                    );
                }
            }

            field_position.insert(supergraph, merged)?;
        }
        Ok(())
    }

    /// The `@join__field(graph: …)` application for one resolving subgraph,
    /// carrying over its `@requires`/`@provides` field sets.
    fn join_field_directive(
        &self,
        index: usize,
        field_position: &ObjectFieldDefinitionPosition,
    ) -> Directive {
        let subgraph = &self.subgraphs[index];
        let mut directive = Directive::new(JOIN_FIELD_DIRECTIVE_NAME).with_argument(
            GRAPH_ARGUMENT_NAME,
            Value::Enum(subgraph.graph_name.clone()),
        );
        if let Some(field) = subgraph.field(field_position) {
            if let Some(requires) = field_set_argument(field, REQUIRES_DIRECTIVE_NAME.as_str()) {
                directive = directive
                    .with_argument(REQUIRES_ARGUMENT_NAME, Value::String(requires));
            }
            if let Some(provides) = field_set_argument(field, PROVIDES_DIRECTIVE_NAME.as_str()) {
                directive = directive
                    .with_argument(PROVIDES_ARGUMENT_NAME, Value::String(provides));
            }
        }
        directive
    }

    /// A field resolved from more than one subgraph must be shareable in the
    /// subgraphs that resolve it.
    fn check_field_sharing(
        &mut self,
        field_position: &ObjectFieldDefinitionPosition,
        resolvers: &[usize],
    ) {
        if resolvers.len() < 2 {
            return;
        }
        let non_shareable: Vec<&str> = resolvers
            .iter()
            .filter(|&&index| {
                !self.subgraphs[index]
                    .metadata
                    .is_field_shareable(field_position)
            })
            .map(|&index| self.subgraphs[index].name.as_str())
            .collect();
        if non_shareable.is_empty() {
            return;
        }
        let resolver_names =
            join_quoted_names(resolvers.iter().map(|&index| self.subgraphs[index].name.as_str()));
        let non_shareable_part = if non_shareable.len() == resolvers.len() {
            "all of them".to_owned()
        } else {
            format!(
                "subgraph{} {}",
                if non_shareable.len() == 1 { "" } else { "s" },
                join_quoted_names(non_shareable.iter().copied())
            )
        };
        self.errors.push(CompositionError::InvalidFieldSharing {
            message: format!(
                "Non-shareable field \"{field_position}\" is resolved from multiple subgraphs: it is resolved from subgraphs {resolver_names} and defined as non-shareable in {non_shareable_part}",
            ),
        });
    }
}

fn is_federation_directive(name: &Name) -> bool {
    FEDERATION_DIRECTIVE_NAMES
        .iter()
        .any(|federation_name| federation_name == name)
}

fn field_set_argument(field: &FieldDefinition, directive_name: &str) -> Option<String> {
    field
        .directives()
        .get(directive_name)
        .and_then(|application| application.argument(FIELDS_ARGUMENT_NAME.as_str()))
        .and_then(|value| value.as_str())
        .map(str::to_owned)
}

fn join_quoted_names<'a>(names: impl Iterator<Item = &'a str>) -> String {
    let quoted: Vec<String> = names.map(|name| format!("\"{name}\"")).collect();
    match quoted.len() {
        0 => String::new(),
        1 => quoted.into_iter().next().unwrap_or_default(),
        2 => quoted.join(" and "),
        _ => {
            let (last, rest) = quoted.split_last().expect("len checked above");
            format!("{} and {last}", rest.join(", "))
        }
    }
}

/// Assembles the supergraph document: the schema definition, the core/join
/// declaration preamble, the populated `join__Graph` enum, then the merged
/// types.
fn print_supergraph(supergraph: &Schema, subgraphs: &[MergedSubgraph]) -> String {
    let mut blocks = vec![
        supergraph.print_schema_definition(),
        SUPERGRAPH_PREAMBLE.to_owned(),
        print_join_graph_enum(subgraphs),
    ];
    blocks.extend(supergraph.type_definition_blocks());
    let mut sdl = blocks.join("\n\n");
    sdl.push('\n');
    sdl
}

fn print_join_graph_enum(subgraphs: &[MergedSubgraph]) -> String {
    let values = subgraphs
        .iter()
        .map(|subgraph| {
            format!(
                "  {} @{}(name: \"{}\", url: \"{}\")",
                subgraph.graph_name, JOIN_GRAPH_DIRECTIVE_NAME, subgraph.name, subgraph.url
            )
        })
        .join("\n");
    format!("enum {JOIN_GRAPH_ENUM_NAME} {{\n{values}\n}}")
}
