//! Resolution of federation field sets (the string argument of `@key`,
//! `@requires`, and `@provides`).
//!
//! A field set is a selection set without the outer braces. It is parsed by
//! wrapping it in an anonymous operation and handing it to the external
//! GraphQL parser.

use apollo_compiler::ast;
use apollo_compiler::Name;
use indexmap::IndexSet;

use crate::error::SchemaError;
use crate::schema::position::ObjectFieldDefinitionPosition;
use crate::schema::position::ObjectTypeDefinitionPosition;
use crate::schema::NamedType;
use crate::schema::Schema;

/// Parses a field set string into AST selections.
pub(crate) fn parse_field_set(fields: &str) -> Result<Vec<ast::Selection>, SchemaError> {
    let source_text = format!("{{ {fields} }}");
    let document =
        ast::Document::parse(&source_text, "field_set.graphql").map_err(|with_errors| {
            SchemaError::Parse {
                message: format!("invalid field set \"{fields}\": {}", with_errors.errors),
            }
        })?;
    for definition in &document.definitions {
        if let ast::Definition::OperationDefinition(operation) = definition {
            return Ok(operation.selection_set.clone());
        }
    }
    Err(SchemaError::Parse {
        message: format!("invalid field set \"{fields}\""),
    })
}

/// Resolves every field position a field set selects, including nested ones:
/// `T.k` and `T.sub` plus `Sub.x` for the set `"k sub { x }"` on `T`.
pub(crate) fn collect_target_fields_from_field_set(
    schema: &Schema,
    parent_type_name: Name,
    fields: &str,
) -> Result<IndexSet<ObjectFieldDefinitionPosition>, SchemaError> {
    let selections = parse_field_set(fields)?;
    let mut target_fields = IndexSet::new();
    collect_from_selections(schema, &parent_type_name, &selections, &mut target_fields)?;
    Ok(target_fields)
}

fn collect_from_selections(
    schema: &Schema,
    parent_type_name: &Name,
    selections: &[ast::Selection],
    target_fields: &mut IndexSet<ObjectFieldDefinitionPosition>,
) -> Result<(), SchemaError> {
    for selection in selections {
        match selection {
            ast::Selection::Field(field) => {
                let position = ObjectTypeDefinitionPosition {
                    type_name: parent_type_name.clone(),
                }
                .field(field.name.clone());
                let definition = position.get(schema)?;
                let base_type_name = definition
                    .ty()
                    .ok_or_else(|| SchemaError::UnknownElement {
                        coordinate: position.to_string(),
                    })?
                    .base_type_name()
                    .clone();
                target_fields.insert(position);
                if !field.selection_set.is_empty() {
                    match schema.types.get(&base_type_name) {
                        Some(NamedType::Object(_)) => {
                            collect_from_selections(
                                schema,
                                &base_type_name,
                                &field.selection_set,
                                target_fields,
                            )?;
                        }
                        _ => {
                            return Err(SchemaError::Parse {
                                message: format!(
                                    "field set selects sub-fields of non-object type \"{base_type_name}\""
                                ),
                            })
                        }
                    }
                }
            }
            ast::Selection::InlineFragment(_) | ast::Selection::FragmentSpread(_) => {
                return Err(SchemaError::not_implemented("Fragments in field sets"));
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use apollo_compiler::name;

    use super::*;

    #[test]
    fn collects_nested_target_fields() {
        let schema = Schema::parse(
            r#"
            type Query { t: T }
            type T { k: ID sub: Sub }
            type Sub { x: Int }
            "#,
            "schema.graphql",
        )
        .unwrap();
        let targets =
            collect_target_fields_from_field_set(&schema, name!("T"), "k sub { x }").unwrap();
        let coordinates: Vec<String> = targets.iter().map(|f| f.to_string()).collect();
        assert_eq!(coordinates, ["T.k", "T.sub", "Sub.x"]);
    }

    #[test]
    fn unknown_fields_in_field_sets_fail() {
        let schema =
            Schema::parse("type Query { t: T } type T { k: ID }", "schema.graphql").unwrap();
        let err =
            collect_target_fields_from_field_set(&schema, name!("T"), "missing").unwrap_err();
        assert!(matches!(err, SchemaError::UnknownElement { .. }));
    }
}
