//! The planning context: an indexed view of one operation against a composed
//! schema.

use apollo_compiler::ast;
use apollo_compiler::name;
use apollo_compiler::Name;
use apollo_compiler::Node;
use indexmap::IndexMap;
use indexmap::IndexSet;
use std::sync::LazyLock;
use tracing::instrument;

use crate::error::PlanError;
use crate::schema::position::CompositeTypeDefinitionPosition;
use crate::schema::position::ObjectTypeDefinitionPosition;
use crate::schema::FieldDefinition;
use crate::schema::FrozenSchema;
use crate::schema::Type;
use crate::subgraph::spec::GRAPH_ARGUMENT_NAME;
use crate::subgraph::spec::JOIN_FIELD_DIRECTIVE_NAME;
use crate::subgraph::spec::JOIN_TYPE_DIRECTIVE_NAME;

const TYPENAME_FIELD: Name = name!("__typename");
const SCHEMA_FIELD: Name = name!("__schema");
const TYPE_FIELD: Name = name!("__type");

static TYPENAME_FIELD_DEF: LazyLock<FieldDefinition> =
    LazyLock::new(|| FieldDefinition::new(TYPENAME_FIELD, Type::Named(name!("String"))));
static SCHEMA_FIELD_DEF: LazyLock<FieldDefinition> =
    LazyLock::new(|| FieldDefinition::new(SCHEMA_FIELD, Type::Named(name!("__Schema"))));
static TYPE_FIELD_DEF: LazyLock<FieldDefinition> =
    LazyLock::new(|| FieldDefinition::new(TYPE_FIELD, Type::Named(name!("__Type"))));

/// Context for planning one operation: the composed schema, the operation,
/// its fragments by name, and its variable definitions by name.
///
/// The operation is assumed to have passed GraphQL validation already.
pub struct QueryPlanningContext<'a> {
    schema: &'a FrozenSchema,
    operation: &'a ast::OperationDefinition,
    fragments: IndexMap<Name, &'a Node<ast::FragmentDefinition>>,
    variable_definitions: IndexMap<Name, &'a Node<ast::VariableDefinition>>,
}

impl<'a> QueryPlanningContext<'a> {
    #[instrument(skip_all, name = "QueryPlanningContext::new")]
    pub fn new(
        schema: &'a FrozenSchema,
        operation: &'a ast::OperationDefinition,
        fragments: IndexMap<Name, &'a Node<ast::FragmentDefinition>>,
    ) -> Self {
        let mut variable_definitions = IndexMap::new();
        for variable in &operation.variables {
            variable_definitions.insert(variable.name.clone(), variable);
        }
        Self {
            schema,
            operation,
            fragments,
            variable_definitions,
        }
    }

    pub fn schema(&self) -> &'a FrozenSchema {
        self.schema
    }

    pub fn operation(&self) -> &'a ast::OperationDefinition {
        self.operation
    }

    pub fn fragment(&self, name: &Name) -> Option<&'a Node<ast::FragmentDefinition>> {
        self.fragments.get(name).copied()
    }

    pub fn variable_definition(
        &self,
        name: &Name,
    ) -> Result<&'a Node<ast::VariableDefinition>, PlanError> {
        self.variable_definitions
            .get(name)
            .copied()
            .ok_or_else(|| PlanError::UnknownVariable { name: name.clone() })
    }

    /// Resolves a field by name on a composite parent type, folding in the
    /// `__typename` / `__schema` / `__type` meta-fields.
    pub fn field_def(
        &self,
        parent: &CompositeTypeDefinitionPosition,
        field_name: &Name,
    ) -> Result<FieldDefinition, PlanError> {
        if *field_name == TYPENAME_FIELD {
            return Ok(TYPENAME_FIELD_DEF.clone());
        }
        let is_query_root = self.schema.schema_definition().query() == Some(parent.type_name());
        if is_query_root {
            if *field_name == SCHEMA_FIELD {
                return Ok(SCHEMA_FIELD_DEF.clone());
            }
            if *field_name == TYPE_FIELD {
                return Ok(TYPE_FIELD_DEF.clone());
            }
        }
        match parent {
            CompositeTypeDefinitionPosition::Object(object) => object
                .get(self.schema)
                .ok()
                .and_then(|ty| ty.fields().get(field_name))
                .cloned()
                .ok_or_else(|| PlanError::CannotQueryField {
                    field_name: field_name.clone(),
                    type_name: parent.type_name().clone(),
                }),
            CompositeTypeDefinitionPosition::Union(_) => Err(PlanError::CannotQueryField {
                field_name: field_name.clone(),
                type_name: parent.type_name().clone(),
            }),
        }
    }

    /// `{T}` for an object type, the member types for a union.
    pub fn possible_types(
        &self,
        ty: &CompositeTypeDefinitionPosition,
    ) -> Result<IndexSet<ObjectTypeDefinitionPosition>, PlanError> {
        Ok(self.schema.possible_runtime_types(ty.clone())?)
    }

    /// The names of every variable used in a sub-operation, including
    /// through fragment spreads.
    pub fn variable_usages(&self, selection_set: &[ast::Selection]) -> IndexSet<Name> {
        let mut usages = IndexSet::new();
        let mut seen_fragments = IndexSet::new();
        self.collect_variable_usages(selection_set, &mut usages, &mut seen_fragments);
        usages
    }

    fn collect_variable_usages(
        &self,
        selection_set: &[ast::Selection],
        usages: &mut IndexSet<Name>,
        seen_fragments: &mut IndexSet<Name>,
    ) {
        for selection in selection_set {
            match selection {
                ast::Selection::Field(field) => {
                    for argument in &field.arguments {
                        collect_value_variables(&argument.value, usages);
                    }
                    collect_directive_variables(&field.directives, usages);
                    self.collect_variable_usages(&field.selection_set, usages, seen_fragments);
                }
                ast::Selection::InlineFragment(fragment) => {
                    collect_directive_variables(&fragment.directives, usages);
                    self.collect_variable_usages(&fragment.selection_set, usages, seen_fragments);
                }
                ast::Selection::FragmentSpread(spread) => {
                    collect_directive_variables(&spread.directives, usages);
                    if !seen_fragments.insert(spread.fragment_name.clone()) {
                        continue;
                    }
                    if let Some(fragment) = self.fragment(&spread.fragment_name) {
                        self.collect_variable_usages(
                            &fragment.selection_set,
                            usages,
                            seen_fragments,
                        );
                    }
                }
            }
        }
    }

    /// The subgraph a type belongs to first: the `graph` of its first
    /// `@join__type` application.
    pub fn base_service(&self, ty: &ObjectTypeDefinitionPosition) -> Result<Name, PlanError> {
        let object = ty.get(self.schema)?;
        object
            .directives()
            .get(JOIN_TYPE_DIRECTIVE_NAME.as_str())
            .and_then(|application| application.argument(GRAPH_ARGUMENT_NAME.as_str()))
            .and_then(|value| value.as_enum())
            .cloned()
            .ok_or_else(|| PlanError::Internal {
                message: format!("Type \"{}\" carries no @join__type application", ty),
            })
    }

    /// The subgraph that resolves a field: its declared `@join__field`
    /// graph, falling back to the type's base service.
    pub fn owning_service(
        &self,
        ty: &ObjectTypeDefinitionPosition,
        field_def: &FieldDefinition,
    ) -> Result<Name, PlanError> {
        field_def
            .directives()
            .get(JOIN_FIELD_DIRECTIVE_NAME.as_str())
            .and_then(|application| application.argument(GRAPH_ARGUMENT_NAME.as_str()))
            .and_then(|value| value.as_enum())
            .cloned()
            .map(Ok)
            .unwrap_or_else(|| self.base_service(ty))
    }
}

fn collect_value_variables(value: &ast::Value, usages: &mut IndexSet<Name>) {
    match value {
        ast::Value::Variable(name) => {
            usages.insert(name.clone());
        }
        ast::Value::List(items) => {
            for item in items {
                collect_value_variables(item, usages);
            }
        }
        ast::Value::Object(fields) => {
            for (_, item) in fields {
                collect_value_variables(item, usages);
            }
        }
        _ => {}
    }
}

fn collect_directive_variables(directives: &ast::DirectiveList, usages: &mut IndexSet<Name>) {
    for directive in directives.iter() {
        for argument in &directive.arguments {
            collect_value_variables(&argument.value, usages);
        }
    }
}
