use std::fmt;
use std::fmt::Display;
use std::fmt::Formatter;

use apollo_compiler::Name;

use crate::error::SchemaError;
use crate::internal_error;
use crate::schema::values::Directive;
use crate::schema::ArgumentDefinition;
use crate::schema::DirectiveDefinition;
use crate::schema::FieldDefinition;
use crate::schema::InputFieldDefinition;
use crate::schema::InputObjectType;
use crate::schema::NamedType;
use crate::schema::ObjectType;
use crate::schema::ScalarType;
use crate::schema::Schema;
use crate::schema::SchemaDefinition;
use crate::schema::Type;
use crate::schema::TypeKind;
use crate::schema::UnionType;
use crate::schema::values::DirectiveList;

/// The three root-operation slots of a schema definition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum_macros::Display)]
pub enum SchemaRootDefinitionKind {
    #[strum(to_string = "query")]
    Query,
    #[strum(to_string = "mutation")]
    Mutation,
    #[strum(to_string = "subscription")]
    Subscription,
}

/// Position of the schema definition itself.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct SchemaDefinitionPosition;

impl SchemaDefinitionPosition {
    pub fn get<'s>(&self, schema: &'s Schema) -> &'s SchemaDefinition {
        &schema.schema_definition
    }

    pub(crate) fn make_mut<'s>(
        &self,
        schema: &'s mut Schema,
    ) -> Result<&'s mut SchemaDefinition, SchemaError> {
        schema.check_mutable()?;
        Ok(&mut schema.schema_definition)
    }

    pub fn insert_directive(
        &self,
        schema: &mut Schema,
        directive: Directive,
    ) -> Result<(), SchemaError> {
        schema.check_mutable()?;
        let name = directive.name.clone();
        schema.schema_definition.directives.push(directive);
        schema
            .referencers
            .directives
            .entry(name)
            .or_default()
            .schema = Some(self.clone());
        Ok(())
    }
}

impl Display for SchemaDefinitionPosition {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str("schema")
    }
}

/// Position of one root-operation binding (`query:`, `mutation:`, or
/// `subscription:`) within the schema definition.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SchemaRootDefinitionPosition {
    pub root_kind: SchemaRootDefinitionKind,
}

impl SchemaRootDefinitionPosition {
    pub fn parent(&self) -> SchemaDefinitionPosition {
        SchemaDefinitionPosition
    }

    pub fn get<'s>(&self, schema: &'s Schema) -> Result<&'s Name, SchemaError> {
        self.try_get(schema)
            .ok_or_else(|| SchemaError::UnknownElement {
                coordinate: self.to_string(),
            })
    }

    pub fn try_get<'s>(&self, schema: &'s Schema) -> Option<&'s Name> {
        match self.root_kind {
            SchemaRootDefinitionKind::Query => schema.schema_definition.query.as_ref(),
            SchemaRootDefinitionKind::Mutation => schema.schema_definition.mutation.as_ref(),
            SchemaRootDefinitionKind::Subscription => {
                schema.schema_definition.subscription.as_ref()
            }
        }
    }

    /// Binds a root operation to an object type, wiring the referencer edge.
    pub fn insert(&self, schema: &mut Schema, root_type: Name) -> Result<(), SchemaError> {
        schema.check_mutable()?;
        if self.try_get(schema).is_some() {
            return Err(internal_error!(
                "Root operation \"{}\" is already bound",
                self.root_kind
            ));
        }
        ObjectTypeDefinitionPosition {
            type_name: root_type.clone(),
        }
        .get(schema)?;
        let object_referencers = schema
            .referencers
            .object_types
            .get_mut(&root_type)
            .ok_or_else(|| internal_error!("Missing referencer entry for \"{root_type}\""))?;
        object_referencers.schema_roots.insert(self.clone());
        match self.root_kind {
            SchemaRootDefinitionKind::Query => schema.schema_definition.query = Some(root_type),
            SchemaRootDefinitionKind::Mutation => {
                schema.schema_definition.mutation = Some(root_type)
            }
            SchemaRootDefinitionKind::Subscription => {
                schema.schema_definition.subscription = Some(root_type)
            }
        }
        Ok(())
    }
}

impl Display for SchemaRootDefinitionPosition {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "schema.{}", self.root_kind)
    }
}

/// Position of a scalar type definition (user-defined or built-in).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ScalarTypeDefinitionPosition {
    pub type_name: Name,
}

impl ScalarTypeDefinitionPosition {
    pub fn get<'s>(&self, schema: &'s Schema) -> Result<&'s ScalarType, SchemaError> {
        match schema.types.get(&self.type_name) {
            Some(NamedType::Scalar(ty)) => Ok(ty),
            Some(_) => Err(SchemaError::TypeKindMismatch {
                name: self.type_name.clone(),
            }),
            None => schema
                .builtins
                .get(&self.type_name)
                .ok_or_else(|| SchemaError::UnknownType {
                    name: self.type_name.clone(),
                }),
        }
    }

    pub fn try_get<'s>(&self, schema: &'s Schema) -> Option<&'s ScalarType> {
        self.get(schema).ok()
    }

    pub(crate) fn make_mut<'s>(
        &self,
        schema: &'s mut Schema,
    ) -> Result<&'s mut ScalarType, SchemaError> {
        schema.check_mutable()?;
        match schema.types.get_mut(&self.type_name) {
            Some(NamedType::Scalar(ty)) => Ok(ty),
            Some(_) => Err(SchemaError::TypeKindMismatch {
                name: self.type_name.clone(),
            }),
            None if schema.builtins.contains_key(&self.type_name) => {
                Err(SchemaError::BuiltInScalarRedefinition {
                    name: self.type_name.clone(),
                })
            }
            None => Err(SchemaError::UnknownType {
                name: self.type_name.clone(),
            }),
        }
    }

    pub fn insert_directive(
        &self,
        schema: &mut Schema,
        directive: Directive,
    ) -> Result<(), SchemaError> {
        let name = directive.name.clone();
        self.make_mut(schema)?.directives.push(directive);
        schema
            .referencers
            .directives
            .entry(name)
            .or_default()
            .scalar_types
            .insert(self.clone());
        Ok(())
    }
}

impl Display for ScalarTypeDefinitionPosition {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.type_name)
    }
}

/// Position of an object type definition.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ObjectTypeDefinitionPosition {
    pub type_name: Name,
}

impl ObjectTypeDefinitionPosition {
    pub fn field(&self, field_name: Name) -> ObjectFieldDefinitionPosition {
        ObjectFieldDefinitionPosition {
            type_name: self.type_name.clone(),
            field_name,
        }
    }

    pub fn get<'s>(&self, schema: &'s Schema) -> Result<&'s ObjectType, SchemaError> {
        match schema.types.get(&self.type_name) {
            Some(NamedType::Object(ty)) => Ok(ty),
            Some(_) => Err(SchemaError::TypeKindMismatch {
                name: self.type_name.clone(),
            }),
            None => Err(SchemaError::UnknownType {
                name: self.type_name.clone(),
            }),
        }
    }

    pub fn try_get<'s>(&self, schema: &'s Schema) -> Option<&'s ObjectType> {
        self.get(schema).ok()
    }

    pub(crate) fn make_mut<'s>(
        &self,
        schema: &'s mut Schema,
    ) -> Result<&'s mut ObjectType, SchemaError> {
        schema.check_mutable()?;
        match schema.types.get_mut(&self.type_name) {
            Some(NamedType::Object(ty)) => Ok(ty),
            Some(_) => Err(SchemaError::TypeKindMismatch {
                name: self.type_name.clone(),
            }),
            None => Err(SchemaError::UnknownType {
                name: self.type_name.clone(),
            }),
        }
    }

    pub fn fields(&self, schema: &Schema) -> Result<Vec<ObjectFieldDefinitionPosition>, SchemaError> {
        Ok(self
            .get(schema)?
            .fields
            .keys()
            .map(|field_name| self.field(field_name.clone()))
            .collect())
    }

    pub fn insert_directive(
        &self,
        schema: &mut Schema,
        directive: Directive,
    ) -> Result<(), SchemaError> {
        let name = directive.name.clone();
        self.make_mut(schema)?.directives.push(directive);
        schema
            .referencers
            .directives
            .entry(name)
            .or_default()
            .object_types
            .insert(self.clone());
        Ok(())
    }
}

impl Display for ObjectTypeDefinitionPosition {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.type_name)
    }
}

/// Position of a union type definition.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct UnionTypeDefinitionPosition {
    pub type_name: Name,
}

impl UnionTypeDefinitionPosition {
    pub fn get<'s>(&self, schema: &'s Schema) -> Result<&'s UnionType, SchemaError> {
        match schema.types.get(&self.type_name) {
            Some(NamedType::Union(ty)) => Ok(ty),
            Some(_) => Err(SchemaError::TypeKindMismatch {
                name: self.type_name.clone(),
            }),
            None => Err(SchemaError::UnknownType {
                name: self.type_name.clone(),
            }),
        }
    }

    pub fn try_get<'s>(&self, schema: &'s Schema) -> Option<&'s UnionType> {
        self.get(schema).ok()
    }

    pub(crate) fn make_mut<'s>(
        &self,
        schema: &'s mut Schema,
    ) -> Result<&'s mut UnionType, SchemaError> {
        schema.check_mutable()?;
        match schema.types.get_mut(&self.type_name) {
            Some(NamedType::Union(ty)) => Ok(ty),
            Some(_) => Err(SchemaError::TypeKindMismatch {
                name: self.type_name.clone(),
            }),
            None => Err(SchemaError::UnknownType {
                name: self.type_name.clone(),
            }),
        }
    }

    /// Adds a member object type, wiring the referencer edge. Adding an
    /// existing member is a no-op.
    pub fn add_member(&self, schema: &mut Schema, member: Name) -> Result<(), SchemaError> {
        schema.check_mutable()?;
        ObjectTypeDefinitionPosition {
            type_name: member.clone(),
        }
        .get(schema)?;
        self.make_mut(schema)?.members.insert(member.clone());
        let object_referencers = schema
            .referencers
            .object_types
            .get_mut(&member)
            .ok_or_else(|| internal_error!("Missing referencer entry for \"{member}\""))?;
        object_referencers.union_types.insert(self.clone());
        Ok(())
    }

    pub fn insert_directive(
        &self,
        schema: &mut Schema,
        directive: Directive,
    ) -> Result<(), SchemaError> {
        let name = directive.name.clone();
        self.make_mut(schema)?.directives.push(directive);
        schema
            .referencers
            .directives
            .entry(name)
            .or_default()
            .union_types
            .insert(self.clone());
        Ok(())
    }
}

impl Display for UnionTypeDefinitionPosition {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.type_name)
    }
}

/// Position of an input object type definition.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct InputObjectTypeDefinitionPosition {
    pub type_name: Name,
}

impl InputObjectTypeDefinitionPosition {
    pub fn field(&self, field_name: Name) -> InputObjectFieldDefinitionPosition {
        InputObjectFieldDefinitionPosition {
            type_name: self.type_name.clone(),
            field_name,
        }
    }

    pub fn get<'s>(&self, schema: &'s Schema) -> Result<&'s InputObjectType, SchemaError> {
        match schema.types.get(&self.type_name) {
            Some(NamedType::InputObject(ty)) => Ok(ty),
            Some(_) => Err(SchemaError::TypeKindMismatch {
                name: self.type_name.clone(),
            }),
            None => Err(SchemaError::UnknownType {
                name: self.type_name.clone(),
            }),
        }
    }

    pub fn try_get<'s>(&self, schema: &'s Schema) -> Option<&'s InputObjectType> {
        self.get(schema).ok()
    }

    pub(crate) fn make_mut<'s>(
        &self,
        schema: &'s mut Schema,
    ) -> Result<&'s mut InputObjectType, SchemaError> {
        schema.check_mutable()?;
        match schema.types.get_mut(&self.type_name) {
            Some(NamedType::InputObject(ty)) => Ok(ty),
            Some(_) => Err(SchemaError::TypeKindMismatch {
                name: self.type_name.clone(),
            }),
            None => Err(SchemaError::UnknownType {
                name: self.type_name.clone(),
            }),
        }
    }

    pub fn insert_directive(
        &self,
        schema: &mut Schema,
        directive: Directive,
    ) -> Result<(), SchemaError> {
        let name = directive.name.clone();
        self.make_mut(schema)?.directives.push(directive);
        schema
            .referencers
            .directives
            .entry(name)
            .or_default()
            .input_object_types
            .insert(self.clone());
        Ok(())
    }
}

impl Display for InputObjectTypeDefinitionPosition {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.type_name)
    }
}

/// Position of an output field on an object type.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ObjectFieldDefinitionPosition {
    pub type_name: Name,
    pub field_name: Name,
}

impl ObjectFieldDefinitionPosition {
    pub fn parent(&self) -> ObjectTypeDefinitionPosition {
        ObjectTypeDefinitionPosition {
            type_name: self.type_name.clone(),
        }
    }

    pub fn argument(&self, argument_name: Name) -> ObjectFieldArgumentDefinitionPosition {
        ObjectFieldArgumentDefinitionPosition {
            type_name: self.type_name.clone(),
            field_name: self.field_name.clone(),
            argument_name,
        }
    }

    pub fn get<'s>(&self, schema: &'s Schema) -> Result<&'s FieldDefinition, SchemaError> {
        self.parent()
            .get(schema)?
            .fields
            .get(&self.field_name)
            .ok_or_else(|| SchemaError::UnknownElement {
                coordinate: self.to_string(),
            })
    }

    pub fn try_get<'s>(&self, schema: &'s Schema) -> Option<&'s FieldDefinition> {
        self.get(schema).ok()
    }

    pub(crate) fn make_mut<'s>(
        &self,
        schema: &'s mut Schema,
    ) -> Result<&'s mut FieldDefinition, SchemaError> {
        let coordinate = self.to_string();
        self.parent()
            .make_mut(schema)?
            .fields
            .get_mut(&self.field_name)
            .ok_or(SchemaError::UnknownElement { coordinate })
    }

    /// Attaches a field to its parent type, wiring referencer edges for the
    /// field's type, its applied directives, and its arguments.
    pub fn insert(&self, schema: &mut Schema, field: FieldDefinition) -> Result<(), SchemaError> {
        schema.check_mutable()?;
        if field.name != self.field_name {
            bail_mismatched_name(&field.name, &self.field_name)?;
        }
        self.parent().get(schema)?;
        if self.try_get(schema).is_some() {
            return Err(SchemaError::FieldAlreadyExists {
                type_name: self.type_name.clone(),
                field_name: self.field_name.clone(),
            });
        }
        let Some(ty) = field.ty.clone() else {
            return Err(SchemaError::UnknownElement {
                coordinate: format!("{self} has no type"),
            });
        };
        register_output_type_reference(schema, &ty, TypeReferencer::ObjectField(self.clone()))?;
        for directive in field.directives.iter() {
            schema
                .referencers
                .directives
                .entry(directive.name.clone())
                .or_default()
                .object_fields
                .insert(self.clone());
        }
        for (argument_name, argument) in &field.arguments {
            let argument_position = self.argument(argument_name.clone());
            let Some(argument_ty) = argument.ty.clone() else {
                return Err(SchemaError::UnknownElement {
                    coordinate: format!("{argument_position} has no type"),
                });
            };
            register_input_type_reference(
                schema,
                &argument_ty,
                TypeReferencer::ObjectFieldArgument(argument_position.clone()),
            )?;
            for directive in argument.directives.iter() {
                schema
                    .referencers
                    .directives
                    .entry(directive.name.clone())
                    .or_default()
                    .object_field_arguments
                    .insert(argument_position.clone());
            }
        }
        self.parent()
            .make_mut(schema)?
            .fields
            .insert(self.field_name.clone(), field);
        Ok(())
    }

    /// Re-points the field at a new output type, moving the referencer edge.
    pub fn set_type(&self, schema: &mut Schema, ty: Type) -> Result<(), SchemaError> {
        schema.check_mutable()?;
        let old_ty = self.get(schema)?.ty.clone();
        register_output_type_reference(schema, &ty, TypeReferencer::ObjectField(self.clone()))?;
        if let Some(old_ty) = old_ty {
            if old_ty.base_type_name() != ty.base_type_name() {
                deregister_type_reference(
                    schema,
                    &old_ty,
                    &TypeReferencer::ObjectField(self.clone()),
                );
            }
        }
        self.make_mut(schema)?.ty = Some(ty);
        Ok(())
    }

    pub fn insert_directive(
        &self,
        schema: &mut Schema,
        directive: Directive,
    ) -> Result<(), SchemaError> {
        let name = directive.name.clone();
        self.make_mut(schema)?.directives.push(directive);
        schema
            .referencers
            .directives
            .entry(name)
            .or_default()
            .object_fields
            .insert(self.clone());
        Ok(())
    }

    /// Attaches an argument definition, wiring referencer edges.
    pub fn insert_argument(
        &self,
        schema: &mut Schema,
        argument: ArgumentDefinition,
    ) -> Result<(), SchemaError> {
        schema.check_mutable()?;
        let argument_position = self.argument(argument.name.clone());
        if self.get(schema)?.arguments.contains_key(&argument.name) {
            return Err(SchemaError::ArgumentAlreadyExists {
                coordinate: self.to_string(),
                name: argument.name.clone(),
            });
        }
        let Some(argument_ty) = argument.ty.clone() else {
            return Err(SchemaError::UnknownElement {
                coordinate: format!("{argument_position} has no type"),
            });
        };
        register_input_type_reference(
            schema,
            &argument_ty,
            TypeReferencer::ObjectFieldArgument(argument_position.clone()),
        )?;
        for directive in argument.directives.iter() {
            schema
                .referencers
                .directives
                .entry(directive.name.clone())
                .or_default()
                .object_field_arguments
                .insert(argument_position.clone());
        }
        self.make_mut(schema)?
            .arguments
            .insert(argument.name.clone(), argument);
        Ok(())
    }
}

impl Display for ObjectFieldDefinitionPosition {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.type_name, self.field_name)
    }
}

/// Position of an argument on an object field.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ObjectFieldArgumentDefinitionPosition {
    pub type_name: Name,
    pub field_name: Name,
    pub argument_name: Name,
}

impl ObjectFieldArgumentDefinitionPosition {
    pub fn parent(&self) -> ObjectFieldDefinitionPosition {
        ObjectFieldDefinitionPosition {
            type_name: self.type_name.clone(),
            field_name: self.field_name.clone(),
        }
    }

    pub fn get<'s>(&self, schema: &'s Schema) -> Result<&'s ArgumentDefinition, SchemaError> {
        self.parent()
            .get(schema)?
            .arguments
            .get(&self.argument_name)
            .ok_or_else(|| SchemaError::UnknownElement {
                coordinate: self.to_string(),
            })
    }

    pub fn try_get<'s>(&self, schema: &'s Schema) -> Option<&'s ArgumentDefinition> {
        self.get(schema).ok()
    }

    pub(crate) fn make_mut<'s>(
        &self,
        schema: &'s mut Schema,
    ) -> Result<&'s mut ArgumentDefinition, SchemaError> {
        let coordinate = self.to_string();
        self.parent()
            .make_mut(schema)?
            .arguments
            .get_mut(&self.argument_name)
            .ok_or(SchemaError::UnknownElement { coordinate })
    }

    pub fn set_type(&self, schema: &mut Schema, ty: Type) -> Result<(), SchemaError> {
        schema.check_mutable()?;
        let old_ty = self.get(schema)?.ty.clone();
        register_input_type_reference(
            schema,
            &ty,
            TypeReferencer::ObjectFieldArgument(self.clone()),
        )?;
        if let Some(old_ty) = old_ty {
            if old_ty.base_type_name() != ty.base_type_name() {
                deregister_type_reference(
                    schema,
                    &old_ty,
                    &TypeReferencer::ObjectFieldArgument(self.clone()),
                );
            }
        }
        self.make_mut(schema)?.ty = Some(ty);
        Ok(())
    }
}

impl Display for ObjectFieldArgumentDefinitionPosition {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}({}:)", self.type_name, self.field_name, self.argument_name)
    }
}

/// Position of an input field on an input object type.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct InputObjectFieldDefinitionPosition {
    pub type_name: Name,
    pub field_name: Name,
}

impl InputObjectFieldDefinitionPosition {
    pub fn parent(&self) -> InputObjectTypeDefinitionPosition {
        InputObjectTypeDefinitionPosition {
            type_name: self.type_name.clone(),
        }
    }

    pub fn get<'s>(&self, schema: &'s Schema) -> Result<&'s InputFieldDefinition, SchemaError> {
        self.parent()
            .get(schema)?
            .fields
            .get(&self.field_name)
            .ok_or_else(|| SchemaError::UnknownElement {
                coordinate: self.to_string(),
            })
    }

    pub fn try_get<'s>(&self, schema: &'s Schema) -> Option<&'s InputFieldDefinition> {
        self.get(schema).ok()
    }

    pub(crate) fn make_mut<'s>(
        &self,
        schema: &'s mut Schema,
    ) -> Result<&'s mut InputFieldDefinition, SchemaError> {
        let coordinate = self.to_string();
        self.parent()
            .make_mut(schema)?
            .fields
            .get_mut(&self.field_name)
            .ok_or(SchemaError::UnknownElement { coordinate })
    }

    pub fn insert(
        &self,
        schema: &mut Schema,
        field: InputFieldDefinition,
    ) -> Result<(), SchemaError> {
        schema.check_mutable()?;
        if field.name != self.field_name {
            bail_mismatched_name(&field.name, &self.field_name)?;
        }
        self.parent().get(schema)?;
        if self.try_get(schema).is_some() {
            return Err(SchemaError::FieldAlreadyExists {
                type_name: self.type_name.clone(),
                field_name: self.field_name.clone(),
            });
        }
        let Some(ty) = field.ty.clone() else {
            return Err(SchemaError::UnknownElement {
                coordinate: format!("{self} has no type"),
            });
        };
        register_input_type_reference(
            schema,
            &ty,
            TypeReferencer::InputObjectField(self.clone()),
        )?;
        for directive in field.directives.iter() {
            schema
                .referencers
                .directives
                .entry(directive.name.clone())
                .or_default()
                .input_object_fields
                .insert(self.clone());
        }
        self.parent()
            .make_mut(schema)?
            .fields
            .insert(self.field_name.clone(), field);
        Ok(())
    }

    pub fn set_type(&self, schema: &mut Schema, ty: Type) -> Result<(), SchemaError> {
        schema.check_mutable()?;
        let old_ty = self.get(schema)?.ty.clone();
        register_input_type_reference(
            schema,
            &ty,
            TypeReferencer::InputObjectField(self.clone()),
        )?;
        if let Some(old_ty) = old_ty {
            if old_ty.base_type_name() != ty.base_type_name() {
                deregister_type_reference(
                    schema,
                    &old_ty,
                    &TypeReferencer::InputObjectField(self.clone()),
                );
            }
        }
        self.make_mut(schema)?.ty = Some(ty);
        Ok(())
    }

    pub fn insert_directive(
        &self,
        schema: &mut Schema,
        directive: Directive,
    ) -> Result<(), SchemaError> {
        let name = directive.name.clone();
        self.make_mut(schema)?.directives.push(directive);
        schema
            .referencers
            .directives
            .entry(name)
            .or_default()
            .input_object_fields
            .insert(self.clone());
        Ok(())
    }
}

impl Display for InputObjectFieldDefinitionPosition {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.type_name, self.field_name)
    }
}

/// Position of a directive definition.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DirectiveDefinitionPosition {
    pub directive_name: Name,
}

impl DirectiveDefinitionPosition {
    pub fn argument(&self, argument_name: Name) -> DirectiveArgumentDefinitionPosition {
        DirectiveArgumentDefinitionPosition {
            directive_name: self.directive_name.clone(),
            argument_name,
        }
    }

    pub fn get<'s>(&self, schema: &'s Schema) -> Result<&'s DirectiveDefinition, SchemaError> {
        schema
            .directive_definitions
            .get(&self.directive_name)
            .ok_or_else(|| SchemaError::UnknownElement {
                coordinate: self.to_string(),
            })
    }

    pub fn try_get<'s>(&self, schema: &'s Schema) -> Option<&'s DirectiveDefinition> {
        self.get(schema).ok()
    }

    /// Adds a directive definition to the schema, wiring referencer edges for
    /// its argument types.
    pub fn insert(
        &self,
        schema: &mut Schema,
        definition: DirectiveDefinition,
    ) -> Result<(), SchemaError> {
        schema.check_mutable()?;
        if definition.name != self.directive_name {
            bail_mismatched_name(&definition.name, &self.directive_name)?;
        }
        if schema.directive_definitions.contains_key(&self.directive_name) {
            return Err(SchemaError::DirectiveDefinitionAlreadyExists {
                name: self.directive_name.clone(),
            });
        }
        for (argument_name, argument) in &definition.arguments {
            let argument_position = self.argument(argument_name.clone());
            let Some(argument_ty) = argument.ty.clone() else {
                return Err(SchemaError::UnknownElement {
                    coordinate: format!("{argument_position} has no type"),
                });
            };
            register_input_type_reference(
                schema,
                &argument_ty,
                TypeReferencer::DirectiveArgument(argument_position),
            )?;
        }
        schema
            .referencers
            .directives
            .entry(self.directive_name.clone())
            .or_default();
        schema
            .directive_definitions
            .insert(self.directive_name.clone(), definition);
        Ok(())
    }
}

impl Display for DirectiveDefinitionPosition {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "@{}", self.directive_name)
    }
}

/// Position of an argument on a directive definition.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DirectiveArgumentDefinitionPosition {
    pub directive_name: Name,
    pub argument_name: Name,
}

impl DirectiveArgumentDefinitionPosition {
    pub fn parent(&self) -> DirectiveDefinitionPosition {
        DirectiveDefinitionPosition {
            directive_name: self.directive_name.clone(),
        }
    }

    pub fn get<'s>(&self, schema: &'s Schema) -> Result<&'s ArgumentDefinition, SchemaError> {
        self.parent()
            .get(schema)?
            .arguments
            .get(&self.argument_name)
            .ok_or_else(|| SchemaError::UnknownElement {
                coordinate: self.to_string(),
            })
    }

    pub(crate) fn make_mut<'s>(
        &self,
        schema: &'s mut Schema,
    ) -> Result<&'s mut ArgumentDefinition, SchemaError> {
        let coordinate = self.to_string();
        schema.check_mutable()?;
        schema
            .directive_definitions
            .get_mut(&self.directive_name)
            .and_then(|definition| definition.arguments.get_mut(&self.argument_name))
            .ok_or(SchemaError::UnknownElement { coordinate })
    }
}

impl Display for DirectiveArgumentDefinitionPosition {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "@{}({}:)", self.directive_name, self.argument_name)
    }
}

/// Position of any named type definition.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypeDefinitionPosition {
    Scalar(ScalarTypeDefinitionPosition),
    Object(ObjectTypeDefinitionPosition),
    Union(UnionTypeDefinitionPosition),
    InputObject(InputObjectTypeDefinitionPosition),
}

impl TypeDefinitionPosition {
    pub fn type_name(&self) -> &Name {
        match self {
            Self::Scalar(pos) => &pos.type_name,
            Self::Object(pos) => &pos.type_name,
            Self::Union(pos) => &pos.type_name,
            Self::InputObject(pos) => &pos.type_name,
        }
    }

    pub fn directives<'s>(&self, schema: &'s Schema) -> Result<&'s DirectiveList, SchemaError> {
        Ok(match self {
            Self::Scalar(pos) => &pos.get(schema)?.directives,
            Self::Object(pos) => &pos.get(schema)?.directives,
            Self::Union(pos) => &pos.get(schema)?.directives,
            Self::InputObject(pos) => &pos.get(schema)?.directives,
        })
    }
}

impl From<ScalarTypeDefinitionPosition> for TypeDefinitionPosition {
    fn from(pos: ScalarTypeDefinitionPosition) -> Self {
        Self::Scalar(pos)
    }
}

impl From<ObjectTypeDefinitionPosition> for TypeDefinitionPosition {
    fn from(pos: ObjectTypeDefinitionPosition) -> Self {
        Self::Object(pos)
    }
}

impl From<UnionTypeDefinitionPosition> for TypeDefinitionPosition {
    fn from(pos: UnionTypeDefinitionPosition) -> Self {
        Self::Union(pos)
    }
}

impl From<InputObjectTypeDefinitionPosition> for TypeDefinitionPosition {
    fn from(pos: InputObjectTypeDefinitionPosition) -> Self {
        Self::InputObject(pos)
    }
}

impl Display for TypeDefinitionPosition {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.type_name())
    }
}

/// Position of a composite (selectable) type: object or union.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CompositeTypeDefinitionPosition {
    Object(ObjectTypeDefinitionPosition),
    Union(UnionTypeDefinitionPosition),
}

impl CompositeTypeDefinitionPosition {
    pub fn type_name(&self) -> &Name {
        match self {
            Self::Object(pos) => &pos.type_name,
            Self::Union(pos) => &pos.type_name,
        }
    }
}

impl TryFrom<TypeDefinitionPosition> for CompositeTypeDefinitionPosition {
    type Error = SchemaError;

    fn try_from(pos: TypeDefinitionPosition) -> Result<Self, Self::Error> {
        match pos {
            TypeDefinitionPosition::Object(pos) => Ok(Self::Object(pos)),
            TypeDefinitionPosition::Union(pos) => Ok(Self::Union(pos)),
            other => Err(internal_error!(
                "Type \"{}\" is not a composite type",
                other.type_name()
            )),
        }
    }
}

impl From<ObjectTypeDefinitionPosition> for CompositeTypeDefinitionPosition {
    fn from(pos: ObjectTypeDefinitionPosition) -> Self {
        Self::Object(pos)
    }
}

impl From<UnionTypeDefinitionPosition> for CompositeTypeDefinitionPosition {
    fn from(pos: UnionTypeDefinitionPosition) -> Self {
        Self::Union(pos)
    }
}

impl Display for CompositeTypeDefinitionPosition {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.type_name())
    }
}

/// An element holding a type reference, for referencer bookkeeping.
#[derive(Debug, Clone)]
pub(crate) enum TypeReferencer {
    ObjectField(ObjectFieldDefinitionPosition),
    ObjectFieldArgument(ObjectFieldArgumentDefinitionPosition),
    InputObjectField(InputObjectFieldDefinitionPosition),
    DirectiveArgument(DirectiveArgumentDefinitionPosition),
}

/// Registers `referencer` as referencing the base type of `ty` through an
/// output position. Fails if the base type does not resolve in this schema
/// (which is how foreign and detached types are rejected) or is not usable as
/// an output type.
pub(crate) fn register_output_type_reference(
    schema: &mut Schema,
    ty: &Type,
    referencer: TypeReferencer,
) -> Result<(), SchemaError> {
    let base = ty.base_type_name().clone();
    match schema.type_kind(&base)? {
        TypeKind::Scalar => insert_scalar_referencer(schema, &base, referencer),
        TypeKind::Object => insert_object_referencer(schema, &base, referencer),
        TypeKind::Union => insert_union_referencer(schema, &base, referencer),
        TypeKind::InputObject => Err(internal_error!(
            "Input object type \"{base}\" cannot be referenced in an output position"
        )),
    }
}

/// Registers `referencer` as referencing the base type of `ty` through an
/// input position (argument, input field).
pub(crate) fn register_input_type_reference(
    schema: &mut Schema,
    ty: &Type,
    referencer: TypeReferencer,
) -> Result<(), SchemaError> {
    let base = ty.base_type_name().clone();
    match schema.type_kind(&base)? {
        TypeKind::Scalar => insert_scalar_referencer(schema, &base, referencer),
        TypeKind::InputObject => insert_input_object_referencer(schema, &base, referencer),
        TypeKind::Object | TypeKind::Union => Err(internal_error!(
            "Composite type \"{base}\" cannot be referenced in an input position"
        )),
    }
}

fn insert_scalar_referencer(
    schema: &mut Schema,
    base: &Name,
    referencer: TypeReferencer,
) -> Result<(), SchemaError> {
    let sets = schema
        .referencers
        .scalar_types
        .get_mut(base)
        .ok_or_else(|| internal_error!("Missing referencer entry for \"{base}\""))?;
    match referencer {
        TypeReferencer::ObjectField(pos) => {
            sets.object_fields.insert(pos);
        }
        TypeReferencer::ObjectFieldArgument(pos) => {
            sets.object_field_arguments.insert(pos);
        }
        TypeReferencer::InputObjectField(pos) => {
            sets.input_object_fields.insert(pos);
        }
        TypeReferencer::DirectiveArgument(pos) => {
            sets.directive_arguments.insert(pos);
        }
    }
    Ok(())
}

fn insert_object_referencer(
    schema: &mut Schema,
    base: &Name,
    referencer: TypeReferencer,
) -> Result<(), SchemaError> {
    let sets = schema
        .referencers
        .object_types
        .get_mut(base)
        .ok_or_else(|| internal_error!("Missing referencer entry for \"{base}\""))?;
    match referencer {
        TypeReferencer::ObjectField(pos) => {
            sets.object_fields.insert(pos);
            Ok(())
        }
        other => Err(internal_error!(
            "{other:?} cannot reference object type \"{base}\""
        )),
    }
}

fn insert_union_referencer(
    schema: &mut Schema,
    base: &Name,
    referencer: TypeReferencer,
) -> Result<(), SchemaError> {
    let sets = schema
        .referencers
        .union_types
        .get_mut(base)
        .ok_or_else(|| internal_error!("Missing referencer entry for \"{base}\""))?;
    match referencer {
        TypeReferencer::ObjectField(pos) => {
            sets.object_fields.insert(pos);
            Ok(())
        }
        other => Err(internal_error!(
            "{other:?} cannot reference union type \"{base}\""
        )),
    }
}

fn insert_input_object_referencer(
    schema: &mut Schema,
    base: &Name,
    referencer: TypeReferencer,
) -> Result<(), SchemaError> {
    let sets = schema
        .referencers
        .input_object_types
        .get_mut(base)
        .ok_or_else(|| internal_error!("Missing referencer entry for \"{base}\""))?;
    match referencer {
        TypeReferencer::ObjectFieldArgument(pos) => {
            sets.object_field_arguments.insert(pos);
        }
        TypeReferencer::InputObjectField(pos) => {
            sets.input_object_fields.insert(pos);
        }
        TypeReferencer::DirectiveArgument(pos) => {
            sets.directive_arguments.insert(pos);
        }
        other => {
            return Err(internal_error!(
                "{other:?} cannot reference input object type \"{base}\""
            ))
        }
    }
    Ok(())
}

/// Drops the referencer edge from the base type of `ty` to `referencer`, if
/// present. Missing entries are ignored (the target may already be removed).
pub(crate) fn deregister_type_reference(
    schema: &mut Schema,
    ty: &Type,
    referencer: &TypeReferencer,
) {
    let base = ty.base_type_name();
    if let Some(sets) = schema.referencers.scalar_types.get_mut(base) {
        match referencer {
            TypeReferencer::ObjectField(pos) => {
                sets.object_fields.shift_remove(pos);
            }
            TypeReferencer::ObjectFieldArgument(pos) => {
                sets.object_field_arguments.shift_remove(pos);
            }
            TypeReferencer::InputObjectField(pos) => {
                sets.input_object_fields.shift_remove(pos);
            }
            TypeReferencer::DirectiveArgument(pos) => {
                sets.directive_arguments.shift_remove(pos);
            }
        }
    }
    if let Some(sets) = schema.referencers.object_types.get_mut(base) {
        if let TypeReferencer::ObjectField(pos) = referencer {
            sets.object_fields.shift_remove(pos);
        }
    }
    if let Some(sets) = schema.referencers.union_types.get_mut(base) {
        if let TypeReferencer::ObjectField(pos) = referencer {
            sets.object_fields.shift_remove(pos);
        }
    }
    if let Some(sets) = schema.referencers.input_object_types.get_mut(base) {
        match referencer {
            TypeReferencer::ObjectFieldArgument(pos) => {
                sets.object_field_arguments.shift_remove(pos);
            }
            TypeReferencer::InputObjectField(pos) => {
                sets.input_object_fields.shift_remove(pos);
            }
            TypeReferencer::DirectiveArgument(pos) => {
                sets.directive_arguments.shift_remove(pos);
            }
            TypeReferencer::ObjectField(_) => {}
        }
    }
}

fn bail_mismatched_name(actual: &Name, expected: &Name) -> Result<(), SchemaError> {
    Err(internal_error!(
        "Definition is named \"{actual}\" but is being attached at \"{expected}\""
    ))
}
