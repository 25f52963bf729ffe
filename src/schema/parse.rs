//! Building a schema from a parsed GraphQL document.
//!
//! The build is a two-pass walk over the external AST: pass 1 creates empty
//! type shells for every supported type definition so forward references
//! resolve, pass 2 fills in fields, arguments, applied directives, union
//! members, and root-operation assignments. Unsupported productions raise
//! [`SchemaError::NotImplemented`] so callers can detect them.

use apollo_compiler::ast;
use indexmap::IndexMap;
use tracing::trace;

use crate::error::SchemaError;
use crate::schema::position::SchemaDefinitionPosition;
use crate::schema::position::SchemaRootDefinitionKind;
use crate::schema::position::SchemaRootDefinitionPosition;
use crate::schema::values::Directive;
use crate::schema::values::FloatValue;
use crate::schema::values::Value;
use crate::schema::ArgumentDefinition;
use crate::schema::DirectiveDefinition;
use crate::schema::DirectiveLocation;
use crate::schema::FieldDefinition;
use crate::schema::InputFieldDefinition;
use crate::schema::Schema;
use crate::schema::Type;

impl Schema {
    /// Parses a type-system document and builds a mutable schema from it.
    pub fn parse(source_text: &str, path: &str) -> Result<Schema, SchemaError> {
        let document = ast::Document::parse(source_text, path).map_err(|with_errors| {
            SchemaError::Parse {
                message: with_errors.errors.to_string(),
            }
        })?;
        Self::from_ast(&document)
    }

    /// Builds a mutable schema from an already-parsed document.
    pub fn from_ast(document: &ast::Document) -> Result<Schema, SchemaError> {
        let mut schema = Schema::new();

        trace!("from_ast: creating type shells");
        for definition in &document.definitions {
            match definition {
                ast::Definition::ScalarTypeDefinition(node) => {
                    schema.add_scalar_type(node.name.clone())?;
                }
                ast::Definition::ObjectTypeDefinition(node) => {
                    if !node.implements_interfaces.is_empty() {
                        return Err(SchemaError::not_implemented("Interface implementation"));
                    }
                    schema.add_object_type(node.name.clone())?;
                }
                ast::Definition::UnionTypeDefinition(node) => {
                    schema.add_union_type(node.name.clone())?;
                }
                ast::Definition::InputObjectTypeDefinition(node) => {
                    schema.add_input_object_type(node.name.clone())?;
                }
                ast::Definition::SchemaDefinition(_)
                | ast::Definition::DirectiveDefinition(_) => {}
                ast::Definition::InterfaceTypeDefinition(_) => {
                    return Err(SchemaError::not_implemented("Interface type definition"));
                }
                ast::Definition::EnumTypeDefinition(_) => {
                    return Err(SchemaError::not_implemented("Enum type definition"));
                }
                ast::Definition::SchemaExtension(_)
                | ast::Definition::ScalarTypeExtension(_)
                | ast::Definition::ObjectTypeExtension(_)
                | ast::Definition::InterfaceTypeExtension(_)
                | ast::Definition::UnionTypeExtension(_)
                | ast::Definition::EnumTypeExtension(_)
                | ast::Definition::InputObjectTypeExtension(_) => {
                    return Err(SchemaError::not_implemented("Schema extension"));
                }
                ast::Definition::OperationDefinition(_)
                | ast::Definition::FragmentDefinition(_) => {
                    return Err(SchemaError::Parse {
                        message: "executable definition in a type-system document".to_owned(),
                    });
                }
            }
        }

        trace!("from_ast: filling definitions");
        let mut has_schema_definition = false;
        for definition in &document.definitions {
            match definition {
                ast::Definition::ScalarTypeDefinition(node) => {
                    let position = schema.add_scalar_type(node.name.clone())?;
                    for directive in node.directives.iter() {
                        position.insert_directive(&mut schema, convert_directive(directive)?)?;
                    }
                }
                ast::Definition::ObjectTypeDefinition(node) => {
                    let position = schema.add_object_type(node.name.clone())?;
                    for directive in node.directives.iter() {
                        position.insert_directive(&mut schema, convert_directive(directive)?)?;
                    }
                    for field in &node.fields {
                        let mut definition =
                            FieldDefinition::new(field.name.clone(), convert_type(&field.ty)?);
                        for argument in &field.arguments {
                            definition =
                                definition.with_argument(convert_argument_definition(argument)?);
                        }
                        for directive in field.directives.iter() {
                            definition = definition.with_directive(convert_directive(directive)?);
                        }
                        position
                            .field(field.name.clone())
                            .insert(&mut schema, definition)?;
                    }
                }
                ast::Definition::UnionTypeDefinition(node) => {
                    let position = schema.add_union_type(node.name.clone())?;
                    for directive in node.directives.iter() {
                        position.insert_directive(&mut schema, convert_directive(directive)?)?;
                    }
                    for member in &node.members {
                        position.add_member(&mut schema, member.clone())?;
                    }
                }
                ast::Definition::InputObjectTypeDefinition(node) => {
                    let position = schema.add_input_object_type(node.name.clone())?;
                    for directive in node.directives.iter() {
                        position.insert_directive(&mut schema, convert_directive(directive)?)?;
                    }
                    for field in &node.fields {
                        let mut definition = InputFieldDefinition::new(
                            field.name.clone(),
                            convert_type(&field.ty)?,
                        );
                        if let Some(default_value) = &field.default_value {
                            definition =
                                definition.with_default_value(convert_value(default_value)?);
                        }
                        for directive in field.directives.iter() {
                            definition = definition.with_directive(convert_directive(directive)?);
                        }
                        position
                            .field(field.name.clone())
                            .insert(&mut schema, definition)?;
                    }
                }
                ast::Definition::DirectiveDefinition(node) => {
                    let mut definition = DirectiveDefinition::new(node.name.clone());
                    if node.repeatable {
                        definition = definition.repeatable();
                    }
                    for argument in &node.arguments {
                        definition =
                            definition.with_argument(convert_argument_definition(argument)?);
                    }
                    for location in &node.locations {
                        definition = definition.with_location(convert_location(*location)?);
                    }
                    schema.add_directive_definition(definition)?;
                }
                ast::Definition::SchemaDefinition(node) => {
                    has_schema_definition = true;
                    for directive in node.directives.iter() {
                        SchemaDefinitionPosition
                            .insert_directive(&mut schema, convert_directive(directive)?)?;
                    }
                    for root_operation in &node.root_operations {
                        let (operation_type, root_type) = &**root_operation;
                        let root_kind = convert_operation_type(*operation_type);
                        SchemaRootDefinitionPosition { root_kind }
                            .insert(&mut schema, root_type.clone())?;
                    }
                }
                _ => {}
            }
        }

        if !has_schema_definition {
            trace!("from_ast: applying conventional root defaults");
            schema.assign_conventional_roots()?;
        }

        Ok(schema)
    }

    /// Binds types named Query/Mutation/Subscription as roots, the GraphQL
    /// convention used when no explicit `schema` definition is present.
    fn assign_conventional_roots(&mut self) -> Result<(), SchemaError> {
        use apollo_compiler::name;
        for (root_kind, type_name) in [
            (SchemaRootDefinitionKind::Query, name!("Query")),
            (SchemaRootDefinitionKind::Mutation, name!("Mutation")),
            (SchemaRootDefinitionKind::Subscription, name!("Subscription")),
        ] {
            if matches!(
                self.types.get(&type_name),
                Some(crate::schema::NamedType::Object(_))
            ) {
                SchemaRootDefinitionPosition { root_kind }.insert(self, type_name)?;
            }
        }
        Ok(())
    }
}

pub(crate) fn convert_type(ty: &ast::Type) -> Result<Type, SchemaError> {
    match ty {
        ast::Type::Named(name) => Ok(Type::Named(name.clone())),
        ast::Type::List(inner) => Ok(Type::list(convert_type(inner)?)),
        ast::Type::NonNullNamed(_) | ast::Type::NonNullList(_) => {
            Err(SchemaError::not_implemented("Non-null type wrapper"))
        }
    }
}

pub(crate) fn convert_value(value: &ast::Value) -> Result<Value, SchemaError> {
    Ok(match value {
        ast::Value::Null => Value::Null,
        ast::Value::Boolean(b) => Value::Boolean(*b),
        ast::Value::Int(i) => Value::Int(i.try_to_i32().map_err(|_| SchemaError::Parse {
            message: format!("integer literal {i} out of range"),
        })?),
        ast::Value::Float(x) => Value::Float(FloatValue(x.try_to_f64().map_err(|_| {
            SchemaError::Parse {
                message: format!("float literal {x} out of range"),
            }
        })?)),
        ast::Value::String(s) => Value::String(s.clone()),
        ast::Value::Enum(name) => Value::Enum(name.clone()),
        ast::Value::Variable(name) => Value::Variable(name.clone()),
        ast::Value::List(items) => Value::List(
            items
                .iter()
                .map(|item| convert_value(item))
                .collect::<Result<_, _>>()?,
        ),
        ast::Value::Object(fields) => {
            let mut converted = IndexMap::new();
            for (name, value) in fields {
                converted.insert(name.clone(), convert_value(value)?);
            }
            Value::Object(converted)
        }
    })
}

pub(crate) fn convert_directive(directive: &ast::Directive) -> Result<Directive, SchemaError> {
    let mut converted = Directive::new(directive.name.clone());
    for argument in &directive.arguments {
        converted
            .arguments
            .insert(argument.name.clone(), convert_value(&argument.value)?);
    }
    Ok(converted)
}

/// Converts the directive lists found on fragments in executable documents.
pub(crate) fn convert_directive_list(
    directives: &ast::DirectiveList,
) -> Result<crate::schema::values::DirectiveList, SchemaError> {
    directives
        .iter()
        .map(|directive| convert_directive(directive))
        .collect::<Result<_, _>>()
}

fn convert_argument_definition(
    argument: &ast::InputValueDefinition,
) -> Result<ArgumentDefinition, SchemaError> {
    let mut definition =
        ArgumentDefinition::new(argument.name.clone(), convert_type(&argument.ty)?);
    if let Some(default_value) = &argument.default_value {
        definition = definition.with_default_value(convert_value(default_value)?);
    }
    for directive in argument.directives.iter() {
        definition.directives.push(convert_directive(directive)?);
    }
    Ok(definition)
}

fn convert_location(location: ast::DirectiveLocation) -> Result<DirectiveLocation, SchemaError> {
    Ok(match location {
        ast::DirectiveLocation::Schema => DirectiveLocation::Schema,
        ast::DirectiveLocation::Scalar => DirectiveLocation::Scalar,
        ast::DirectiveLocation::Object => DirectiveLocation::Object,
        ast::DirectiveLocation::FieldDefinition => DirectiveLocation::FieldDefinition,
        ast::DirectiveLocation::ArgumentDefinition => DirectiveLocation::ArgumentDefinition,
        ast::DirectiveLocation::Union => DirectiveLocation::Union,
        ast::DirectiveLocation::EnumValue => DirectiveLocation::EnumValue,
        ast::DirectiveLocation::InputObject => DirectiveLocation::InputObject,
        ast::DirectiveLocation::InputFieldDefinition => DirectiveLocation::InputFieldDefinition,
        other => {
            return Err(SchemaError::not_implemented(format!(
                "Directive location {other:?}"
            )))
        }
    })
}

fn convert_operation_type(operation_type: ast::OperationType) -> SchemaRootDefinitionKind {
    match operation_type {
        ast::OperationType::Query => SchemaRootDefinitionKind::Query,
        ast::OperationType::Mutation => SchemaRootDefinitionKind::Mutation,
        ast::OperationType::Subscription => SchemaRootDefinitionKind::Subscription,
    }
}

#[cfg(test)]
mod tests {
    use apollo_compiler::name;

    use super::*;
    use crate::schema::NamedType;

    #[test]
    fn parses_supported_type_system_subset() {
        let schema = Schema::parse(
            r#"
            schema {
              query: Query
            }

            scalar FieldSet

            type Query {
              t(id: ID): T
            }

            type T @key(fields: "k") {
              k: ID
              vs: [V]
            }

            union V = T | Query

            input Filter {
              limit: Int = 10
            }
            "#,
            "schema.graphql",
        )
        .expect("schema should parse");

        assert_eq!(
            schema.schema_definition().query(),
            Some(&name!("Query")),
            "explicit schema definition binds the query root"
        );
        let Some(NamedType::Object(t)) = schema.types.get("T") else {
            panic!("T should be an object type");
        };
        assert!(t.directives().has("key"));
        assert_eq!(
            t.fields()["vs"].ty(),
            Some(&Type::list(Type::Named(name!("V"))))
        );
        let Some(NamedType::InputObject(filter)) = schema.types.get("Filter") else {
            panic!("Filter should be an input object type");
        };
        assert_eq!(
            filter.fields()["limit"].default_value(),
            Some(&Value::Int(10))
        );
    }

    #[test]
    fn conventional_roots_apply_without_schema_definition() {
        let schema = Schema::parse("type Query { x: Int }", "schema.graphql").unwrap();
        assert_eq!(schema.schema_definition().query(), Some(&name!("Query")));
        assert_eq!(schema.schema_definition().mutation(), None);
    }

    #[test]
    fn unsupported_productions_raise_not_implemented() {
        let err = Schema::parse("interface I { x: Int }", "schema.graphql").unwrap_err();
        assert!(matches!(err, SchemaError::NotImplemented { .. }));

        let err = Schema::parse("type Query { x: Int! }", "schema.graphql").unwrap_err();
        assert!(matches!(err, SchemaError::NotImplemented { .. }));

        let err = Schema::parse("enum Color { RED }", "schema.graphql").unwrap_err();
        assert!(matches!(err, SchemaError::NotImplemented { .. }));

        let err = Schema::parse(
            "type Query { x: Int } extend type Query { y: Int }",
            "s.graphql",
        )
        .unwrap_err();
        assert!(matches!(err, SchemaError::NotImplemented { .. }));
    }

    #[test]
    fn forward_references_resolve() {
        // U is referenced before it is defined.
        let schema = Schema::parse("type Query { u: U } type U { x: Int }", "schema.graphql")
            .unwrap();
        let referencers = schema.referencers().get_object_type("U").unwrap();
        assert_eq!(referencers.object_fields.len(), 1);
    }
}
