//! The field collector: flattens a selection set against a scope into an
//! ordered field set, and derives the key/required/provided field sets the
//! planner stitches fetch groups with.

use apollo_compiler::ast;
use apollo_compiler::name;
use apollo_compiler::Name;
use apollo_compiler::Node;
use std::sync::LazyLock;

use crate::error::PlanError;
use crate::query_plan::context::QueryPlanningContext;
use crate::query_plan::scope::Scope;
use crate::query_plan::CollectedField;
use crate::query_plan::FieldSet;
use crate::schema::field_set::parse_field_set;
use crate::schema::parse::convert_directive_list;
use crate::schema::position::CompositeTypeDefinitionPosition;
use crate::schema::position::ObjectTypeDefinitionPosition;
use crate::schema::values::Directive;
use crate::schema::FieldDefinition;
use crate::schema::Type;
use crate::subgraph::spec::GRAPH_ARGUMENT_NAME;
use crate::subgraph::spec::JOIN_FIELD_DIRECTIVE_NAME;
use crate::subgraph::spec::JOIN_TYPE_DIRECTIVE_NAME;
use crate::subgraph::spec::KEY_ARGUMENT_NAME;
use crate::subgraph::spec::PROVIDES_ARGUMENT_NAME;
use crate::subgraph::spec::REQUIRES_ARGUMENT_NAME;

static TYPENAME_NODE: LazyLock<Node<ast::Field>> = LazyLock::new(|| {
    Node::new(ast::Field {
        alias: None,
        name: name!("__typename"),
        arguments: Vec::new(),
        directives: ast::DirectiveList::default(),
        selection_set: Vec::new(),
    })
});

static TYPENAME_DEF: LazyLock<FieldDefinition> =
    LazyLock::new(|| FieldDefinition::new(name!("__typename"), Type::Named(name!("String"))));

/// Walks a selection set against a scope, producing the ordered field set.
///
/// Fields append a triple; inline fragments refine the scope by their type
/// condition (defaulting to the scope's parent) plus their directives and
/// recurse when any runtime type remains; fragment spreads resolve through
/// the fragment map and are skipped when absent.
pub fn collect_fields(
    context: &QueryPlanningContext,
    scope: &Scope,
    selection_set: &[ast::Selection],
) -> Result<FieldSet, PlanError> {
    let mut fields = Vec::new();
    for selection in selection_set {
        match selection {
            ast::Selection::Field(field) => {
                let definition = context.field_def(scope.parent(), &field.name)?;
                fields.push(CollectedField {
                    scope: scope.clone(),
                    node: field.clone(),
                    definition,
                });
            }
            ast::Selection::InlineFragment(fragment) => {
                let condition = match &fragment.type_condition {
                    Some(type_name) => context.schema().get_composite_type(type_name.clone())?,
                    None => scope.parent().clone(),
                };
                let directives = convert_directive_list(&fragment.directives)?;
                let refined =
                    scope.refine(context.schema(), condition, Some(directives))?;
                if !refined.possible_runtime_types().is_empty() {
                    fields.extend(collect_fields(context, &refined, &fragment.selection_set)?);
                }
            }
            ast::Selection::FragmentSpread(spread) => {
                let Some(fragment) = context.fragment(&spread.fragment_name) else {
                    continue;
                };
                let condition = context
                    .schema()
                    .get_composite_type(fragment.type_condition.clone())?;
                let directives = convert_directive_list(&spread.directives)?;
                let refined =
                    scope.refine(context.schema(), condition, Some(directives))?;
                if !refined.possible_runtime_types().is_empty() {
                    fields.extend(collect_fields(context, &refined, &fragment.selection_set)?);
                }
            }
        }
    }
    Ok(fields)
}

/// The fields needed to identify an entity of this scope for a service:
/// `__typename` first, then the `@join__type` key fields of every possible
/// runtime type — every key when `fetch_all`, otherwise only the first.
pub fn key_fields(
    context: &QueryPlanningContext,
    scope: &Scope,
    service: &Name,
    fetch_all: bool,
) -> Result<FieldSet, PlanError> {
    let mut fields = vec![CollectedField {
        scope: scope.clone(),
        node: TYPENAME_NODE.clone(),
        definition: TYPENAME_DEF.clone(),
    }];
    for type_name in scope.possible_runtime_types() {
        let position = ObjectTypeDefinitionPosition {
            type_name: type_name.clone(),
        };
        let keys = keys_for_service(context, &position, service)?;
        let selected: Box<dyn Iterator<Item = String>> = if fetch_all {
            Box::new(keys.into_iter())
        } else {
            Box::new(keys.into_iter().take(1))
        };
        for key in selected {
            let selections = parse_field_set(&key)?;
            let type_scope = Scope::create(
                context.schema(),
                CompositeTypeDefinitionPosition::Object(position.clone()),
            )?;
            fields.extend(collect_fields(context, &type_scope, &selections)?);
        }
    }
    Ok(fields)
}

/// The fields that must be fetched before a service can resolve this field:
/// its key fields followed by the field's `requires:` selection.
pub fn required_fields(
    context: &QueryPlanningContext,
    scope: &Scope,
    field_def: &FieldDefinition,
    service: &Name,
) -> Result<FieldSet, PlanError> {
    let mut fields = key_fields(context, scope, service, false)?;
    if let Some(requires) = join_field_argument(field_def, service, REQUIRES_ARGUMENT_NAME.as_str())
    {
        let selections = parse_field_set(&requires)?;
        fields.extend(collect_fields(context, scope, &selections)?);
    }
    Ok(fields)
}

/// The fields a service can provide alongside this field's composite return
/// type: every key of the return type plus the field's `provides:`
/// selection. Empty for non-composite returns.
pub fn provided_fields(
    context: &QueryPlanningContext,
    field_def: &FieldDefinition,
    service: &Name,
) -> Result<FieldSet, PlanError> {
    let Some(return_type) = field_def.ty() else {
        return Ok(Vec::new());
    };
    let Ok(composite) = context
        .schema()
        .get_composite_type(return_type.base_type_name().clone())
    else {
        return Ok(Vec::new());
    };
    let scope = Scope::create(context.schema(), composite)?;
    let mut fields = key_fields(context, &scope, service, true)?;
    if let Some(provides) = join_field_argument(field_def, service, PROVIDES_ARGUMENT_NAME.as_str())
    {
        let selections = parse_field_set(&provides)?;
        fields.extend(collect_fields(context, &scope, &selections)?);
    }
    Ok(fields)
}

/// The `key:` field sets declared for one service on a type, in application
/// order.
fn keys_for_service(
    context: &QueryPlanningContext,
    position: &ObjectTypeDefinitionPosition,
    service: &Name,
) -> Result<Vec<String>, PlanError> {
    let object = position.get(context.schema())?;
    Ok(object
        .directives()
        .get_all(JOIN_TYPE_DIRECTIVE_NAME.as_str())
        .filter(|application| directive_is_for_service(application, service))
        .filter_map(|application| {
            application
                .argument(KEY_ARGUMENT_NAME.as_str())
                .and_then(|value| value.as_str())
                .map(str::to_owned)
        })
        .collect())
}

/// A `requires:`/`provides:` argument on the `@join__field` application for
/// one service.
fn join_field_argument(
    field_def: &FieldDefinition,
    service: &Name,
    argument_name: &str,
) -> Option<String> {
    field_def
        .directives()
        .get_all(JOIN_FIELD_DIRECTIVE_NAME.as_str())
        .find(|application| directive_is_for_service(application, service))
        .and_then(|application| application.argument(argument_name))
        .and_then(|value| value.as_str())
        .map(str::to_owned)
}

fn directive_is_for_service(application: &Directive, service: &Name) -> bool {
    application
        .argument(GRAPH_ARGUMENT_NAME.as_str())
        .and_then(|value| value.as_enum())
        .map(|graph| graph == service)
        .unwrap_or(false)
}
