//! Removal of schema elements.
//!
//! Every removal follows the same shape: unregister the element from its
//! parent container, drop the referencer edges held by the element and its
//! owned children, notify the removed type's referencers (field and argument
//! types are cleared to a detached state, union members and root bindings are
//! dropped), and hand the referencer set back to the caller so it can repair
//! or report. Removing an element that is already gone returns `None`.

use apollo_compiler::Name;

use crate::error::SchemaError;
use crate::schema::position::deregister_type_reference;
use crate::schema::position::DirectiveDefinitionPosition;
use crate::schema::position::InputObjectFieldDefinitionPosition;
use crate::schema::position::InputObjectTypeDefinitionPosition;
use crate::schema::position::ObjectFieldArgumentDefinitionPosition;
use crate::schema::position::ObjectFieldDefinitionPosition;
use crate::schema::position::ObjectTypeDefinitionPosition;
use crate::schema::position::ScalarTypeDefinitionPosition;
use crate::schema::position::SchemaDefinitionPosition;
use crate::schema::position::SchemaRootDefinitionKind;
use crate::schema::position::SchemaRootDefinitionPosition;
use crate::schema::position::TypeDefinitionPosition;
use crate::schema::position::TypeReferencer;
use crate::schema::position::UnionTypeDefinitionPosition;
use crate::schema::referencer::DirectiveReferencers;
use crate::schema::referencer::InputObjectTypeReferencers;
use crate::schema::referencer::ObjectTypeReferencers;
use crate::schema::referencer::ScalarTypeReferencers;
use crate::schema::referencer::UnionTypeReferencers;
use crate::schema::values::DirectiveList;
use crate::schema::NamedType;
use crate::schema::Schema;

/// Drops the edges a field definition holds: its output type, its applied
/// directives, and everything owned by its arguments.
fn drop_object_field_edges(schema: &mut Schema, position: &ObjectFieldDefinitionPosition) {
    let Some(field) = position.try_get(schema) else {
        return;
    };
    let ty = field.ty.clone();
    let directive_names: Vec<Name> = field.directives.iter().map(|d| d.name.clone()).collect();
    let argument_names: Vec<Name> = field.arguments.keys().cloned().collect();
    if let Some(ty) = ty {
        deregister_type_reference(schema, &ty, &TypeReferencer::ObjectField(position.clone()));
    }
    for name in directive_names {
        if let Some(sets) = schema.referencers.directives.get_mut(&name) {
            sets.object_fields.shift_remove(position);
        }
    }
    for argument_name in argument_names {
        drop_object_field_argument_edges(schema, &position.argument(argument_name));
    }
}

fn drop_object_field_argument_edges(
    schema: &mut Schema,
    position: &ObjectFieldArgumentDefinitionPosition,
) {
    let Some(argument) = position.try_get(schema) else {
        return;
    };
    let ty = argument.ty.clone();
    let directive_names: Vec<Name> = argument.directives.iter().map(|d| d.name.clone()).collect();
    if let Some(ty) = ty {
        deregister_type_reference(
            schema,
            &ty,
            &TypeReferencer::ObjectFieldArgument(position.clone()),
        );
    }
    for name in directive_names {
        if let Some(sets) = schema.referencers.directives.get_mut(&name) {
            sets.object_field_arguments.shift_remove(position);
        }
    }
}

fn drop_input_object_field_edges(
    schema: &mut Schema,
    position: &InputObjectFieldDefinitionPosition,
) {
    let Some(field) = position.try_get(schema) else {
        return;
    };
    let ty = field.ty.clone();
    let directive_names: Vec<Name> = field.directives.iter().map(|d| d.name.clone()).collect();
    if let Some(ty) = ty {
        deregister_type_reference(
            schema,
            &ty,
            &TypeReferencer::InputObjectField(position.clone()),
        );
    }
    for name in directive_names {
        if let Some(sets) = schema.referencers.directives.get_mut(&name) {
            sets.input_object_fields.shift_remove(position);
        }
    }
}

fn drop_type_directive_edges(schema: &mut Schema, position: &TypeDefinitionPosition) {
    let Ok(directives) = position.directives(schema) else {
        return;
    };
    let directive_names: Vec<Name> = directives.iter().map(|d| d.name.clone()).collect();
    for name in directive_names {
        let Some(sets) = schema.referencers.directives.get_mut(&name) else {
            continue;
        };
        match position {
            TypeDefinitionPosition::Scalar(pos) => {
                sets.scalar_types.shift_remove(pos);
            }
            TypeDefinitionPosition::Object(pos) => {
                sets.object_types.shift_remove(pos);
            }
            TypeDefinitionPosition::Union(pos) => {
                sets.union_types.shift_remove(pos);
            }
            TypeDefinitionPosition::InputObject(pos) => {
                sets.input_object_types.shift_remove(pos);
            }
        }
    }
}

impl ScalarTypeDefinitionPosition {
    /// Removes this scalar type. Referencing fields and arguments are left in
    /// place with their type cleared; the returned set names them.
    pub fn remove(
        &self,
        schema: &mut Schema,
    ) -> Result<Option<ScalarTypeReferencers>, SchemaError> {
        schema.check_mutable()?;
        if schema.builtins.contains_key(&self.type_name) {
            return Err(SchemaError::BuiltInScalarRedefinition {
                name: self.type_name.clone(),
            });
        }
        if !matches!(schema.types.get(&self.type_name), Some(NamedType::Scalar(_))) {
            return Ok(None);
        }
        drop_type_directive_edges(schema, &self.clone().into());
        schema.types.shift_remove(&self.type_name);
        let Some(referencers) = schema.referencers.scalar_types.shift_remove(&self.type_name)
        else {
            return Ok(None);
        };
        for field in &referencers.object_fields {
            if let Ok(field) = field.make_mut(schema) {
                field.ty = None;
            }
        }
        for argument in &referencers.object_field_arguments {
            if let Ok(argument) = argument.make_mut(schema) {
                argument.ty = None;
                argument.default_value = None;
            }
        }
        for field in &referencers.input_object_fields {
            if let Ok(field) = field.make_mut(schema) {
                field.ty = None;
                field.default_value = None;
            }
        }
        for argument in &referencers.directive_arguments {
            if let Ok(argument) = argument.make_mut(schema) {
                argument.ty = None;
                argument.default_value = None;
            }
        }
        Ok(Some(referencers))
    }
}

impl ObjectTypeDefinitionPosition {
    /// Removes this object type and its fields. Referencing fields are
    /// cleared, union memberships and root bindings are dropped; the returned
    /// set names every element that referenced the type.
    pub fn remove(
        &self,
        schema: &mut Schema,
    ) -> Result<Option<ObjectTypeReferencers>, SchemaError> {
        schema.check_mutable()?;
        if !matches!(schema.types.get(&self.type_name), Some(NamedType::Object(_))) {
            return Ok(None);
        }
        drop_type_directive_edges(schema, &self.clone().into());
        for field in self.fields(schema)? {
            drop_object_field_edges(schema, &field);
        }
        schema.types.shift_remove(&self.type_name);
        let Some(referencers) = schema.referencers.object_types.shift_remove(&self.type_name)
        else {
            return Ok(None);
        };
        for root in &referencers.schema_roots {
            match root.root_kind {
                SchemaRootDefinitionKind::Query => schema.schema_definition.query = None,
                SchemaRootDefinitionKind::Mutation => schema.schema_definition.mutation = None,
                SchemaRootDefinitionKind::Subscription => {
                    schema.schema_definition.subscription = None
                }
            }
        }
        for field in &referencers.object_fields {
            if let Ok(field) = field.make_mut(schema) {
                field.ty = None;
            }
        }
        for union_type in &referencers.union_types {
            if let Ok(union_type) = union_type.make_mut(schema) {
                union_type.members.shift_remove(&self.type_name);
            }
        }
        Ok(Some(referencers))
    }
}

impl UnionTypeDefinitionPosition {
    /// Removes this union type. Referencing fields are cleared.
    pub fn remove(&self, schema: &mut Schema) -> Result<Option<UnionTypeReferencers>, SchemaError> {
        schema.check_mutable()?;
        if !matches!(schema.types.get(&self.type_name), Some(NamedType::Union(_))) {
            return Ok(None);
        }
        drop_type_directive_edges(schema, &self.clone().into());
        let members: Vec<Name> = self
            .get(schema)?
            .members
            .iter()
            .cloned()
            .collect();
        for member in members {
            if let Some(sets) = schema.referencers.object_types.get_mut(&member) {
                sets.union_types.shift_remove(self);
            }
        }
        schema.types.shift_remove(&self.type_name);
        let Some(referencers) = schema.referencers.union_types.shift_remove(&self.type_name)
        else {
            return Ok(None);
        };
        for field in &referencers.object_fields {
            if let Ok(field) = field.make_mut(schema) {
                field.ty = None;
            }
        }
        Ok(Some(referencers))
    }

    /// Drops one member from the union, with its referencer edge.
    pub fn remove_member(&self, schema: &mut Schema, member: &Name) -> Result<(), SchemaError> {
        schema.check_mutable()?;
        self.make_mut(schema)?.members.shift_remove(member);
        if let Some(sets) = schema.referencers.object_types.get_mut(member) {
            sets.union_types.shift_remove(self);
        }
        Ok(())
    }
}

impl InputObjectTypeDefinitionPosition {
    /// Removes this input object type and its fields. Referencing arguments
    /// and input fields are cleared.
    pub fn remove(
        &self,
        schema: &mut Schema,
    ) -> Result<Option<InputObjectTypeReferencers>, SchemaError> {
        schema.check_mutable()?;
        if !matches!(
            schema.types.get(&self.type_name),
            Some(NamedType::InputObject(_))
        ) {
            return Ok(None);
        }
        drop_type_directive_edges(schema, &self.clone().into());
        let field_names: Vec<Name> = self.get(schema)?.fields.keys().cloned().collect();
        for field_name in field_names {
            drop_input_object_field_edges(schema, &self.field(field_name));
        }
        schema.types.shift_remove(&self.type_name);
        let Some(referencers) = schema
            .referencers
            .input_object_types
            .shift_remove(&self.type_name)
        else {
            return Ok(None);
        };
        for argument in &referencers.object_field_arguments {
            if let Ok(argument) = argument.make_mut(schema) {
                argument.ty = None;
                argument.default_value = None;
            }
        }
        for field in &referencers.input_object_fields {
            if let Ok(field) = field.make_mut(schema) {
                field.ty = None;
                field.default_value = None;
            }
        }
        for argument in &referencers.directive_arguments {
            if let Ok(argument) = argument.make_mut(schema) {
                argument.ty = None;
                argument.default_value = None;
            }
        }
        Ok(Some(referencers))
    }
}

impl ObjectFieldDefinitionPosition {
    /// Detaches this field from its parent type, dropping every edge it and
    /// its arguments hold.
    pub fn remove(&self, schema: &mut Schema) -> Result<(), SchemaError> {
        schema.check_mutable()?;
        if self.try_get(schema).is_none() {
            return Ok(());
        }
        drop_object_field_edges(schema, self);
        self.parent()
            .make_mut(schema)?
            .fields
            .shift_remove(&self.field_name);
        Ok(())
    }

    /// Removes every application of the named directive from this field.
    pub fn remove_directive_name(&self, schema: &mut Schema, name: &str) -> Result<(), SchemaError> {
        schema.check_mutable()?;
        if let Some(sets) = schema.referencers.directives.get_mut(name) {
            sets.object_fields.shift_remove(self);
        }
        if let Ok(field) = self.make_mut(schema) {
            field.directives.retain(|d| d.name.as_str() != name);
        }
        Ok(())
    }
}

impl ObjectFieldArgumentDefinitionPosition {
    pub fn remove(&self, schema: &mut Schema) -> Result<(), SchemaError> {
        schema.check_mutable()?;
        if self.try_get(schema).is_none() {
            return Ok(());
        }
        drop_object_field_argument_edges(schema, self);
        self.parent()
            .make_mut(schema)?
            .arguments
            .shift_remove(&self.argument_name);
        Ok(())
    }
}

impl InputObjectFieldDefinitionPosition {
    pub fn remove(&self, schema: &mut Schema) -> Result<(), SchemaError> {
        schema.check_mutable()?;
        if self.try_get(schema).is_none() {
            return Ok(());
        }
        drop_input_object_field_edges(schema, self);
        self.parent()
            .make_mut(schema)?
            .fields
            .shift_remove(&self.field_name);
        Ok(())
    }
}

impl SchemaRootDefinitionPosition {
    /// Unbinds this root operation, dropping the referencer edge.
    pub fn remove(&self, schema: &mut Schema) -> Result<(), SchemaError> {
        schema.check_mutable()?;
        let Some(root_type) = self.try_get(schema).cloned() else {
            return Ok(());
        };
        if let Some(sets) = schema.referencers.object_types.get_mut(&root_type) {
            sets.schema_roots.shift_remove(self);
        }
        match self.root_kind {
            SchemaRootDefinitionKind::Query => schema.schema_definition.query = None,
            SchemaRootDefinitionKind::Mutation => schema.schema_definition.mutation = None,
            SchemaRootDefinitionKind::Subscription => {
                schema.schema_definition.subscription = None
            }
        }
        Ok(())
    }
}

impl SchemaDefinitionPosition {
    /// Removes every application of the named directive from the schema
    /// definition.
    pub fn remove_directive_name(&self, schema: &mut Schema, name: &str) -> Result<(), SchemaError> {
        schema.check_mutable()?;
        if let Some(sets) = schema.referencers.directives.get_mut(name) {
            sets.schema = None;
        }
        schema
            .schema_definition
            .directives
            .retain(|d| d.name.as_str() != name);
        Ok(())
    }
}

impl TypeDefinitionPosition {
    /// Removes every application of the named directive from this type.
    pub fn remove_directive_name(&self, schema: &mut Schema, name: &str) -> Result<(), SchemaError> {
        schema.check_mutable()?;
        if let Some(sets) = schema.referencers.directives.get_mut(name) {
            match self {
                TypeDefinitionPosition::Scalar(pos) => {
                    sets.scalar_types.shift_remove(pos);
                }
                TypeDefinitionPosition::Object(pos) => {
                    sets.object_types.shift_remove(pos);
                }
                TypeDefinitionPosition::Union(pos) => {
                    sets.union_types.shift_remove(pos);
                }
                TypeDefinitionPosition::InputObject(pos) => {
                    sets.input_object_types.shift_remove(pos);
                }
            }
        }
        let directives: Option<&mut DirectiveList> = match self {
            TypeDefinitionPosition::Scalar(pos) => {
                pos.make_mut(schema).ok().map(|ty| &mut ty.directives)
            }
            TypeDefinitionPosition::Object(pos) => {
                pos.make_mut(schema).ok().map(|ty| &mut ty.directives)
            }
            TypeDefinitionPosition::Union(pos) => {
                pos.make_mut(schema).ok().map(|ty| &mut ty.directives)
            }
            TypeDefinitionPosition::InputObject(pos) => {
                pos.make_mut(schema).ok().map(|ty| &mut ty.directives)
            }
        };
        if let Some(directives) = directives {
            directives.retain(|d| d.name.as_str() != name);
        }
        Ok(())
    }

    /// Removes this type, whatever its kind. The per-kind `remove` methods
    /// return the typed referencer sets; this one reports only whether the
    /// type was present.
    pub fn remove(&self, schema: &mut Schema) -> Result<bool, SchemaError> {
        Ok(match self {
            TypeDefinitionPosition::Scalar(pos) => pos.remove(schema)?.is_some(),
            TypeDefinitionPosition::Object(pos) => pos.remove(schema)?.is_some(),
            TypeDefinitionPosition::Union(pos) => pos.remove(schema)?.is_some(),
            TypeDefinitionPosition::InputObject(pos) => pos.remove(schema)?.is_some(),
        })
    }
}

impl DirectiveDefinitionPosition {
    /// Removes this directive definition and every application of it across
    /// the schema. Returns the applications' former locations.
    pub fn remove(
        &self,
        schema: &mut Schema,
    ) -> Result<Option<DirectiveReferencers>, SchemaError> {
        schema.check_mutable()?;
        let Some(definition) = schema.directive_definitions.get(&self.directive_name) else {
            // The definition may be absent while applications remain; strip
            // those too.
            return Ok(self.remove_applications(schema)?);
        };
        let argument_names: Vec<Name> = definition.arguments.keys().cloned().collect();
        for argument_name in argument_names {
            let position = self.argument(argument_name);
            let Some(argument) = position.get(schema).ok() else {
                continue;
            };
            if let Some(ty) = argument.ty.clone() {
                deregister_type_reference(
                    schema,
                    &ty,
                    &TypeReferencer::DirectiveArgument(position),
                );
            }
        }
        schema.directive_definitions.shift_remove(&self.directive_name);
        Ok(self.remove_applications(schema)?)
    }

    fn remove_applications(
        &self,
        schema: &mut Schema,
    ) -> Result<Option<DirectiveReferencers>, SchemaError> {
        let Some(referencers) = schema
            .referencers
            .directives
            .shift_remove(&self.directive_name)
        else {
            return Ok(None);
        };
        let name = self.directive_name.as_str().to_owned();
        if referencers.schema.is_some() {
            schema
                .schema_definition
                .directives
                .retain(|d| d.name.as_str() != name);
        }
        for pos in &referencers.scalar_types {
            if let Ok(ty) = pos.make_mut(schema) {
                ty.directives.retain(|d| d.name.as_str() != name);
            }
        }
        for pos in &referencers.object_types {
            if let Ok(ty) = pos.make_mut(schema) {
                ty.directives.retain(|d| d.name.as_str() != name);
            }
        }
        for pos in &referencers.union_types {
            if let Ok(ty) = pos.make_mut(schema) {
                ty.directives.retain(|d| d.name.as_str() != name);
            }
        }
        for pos in &referencers.input_object_types {
            if let Ok(ty) = pos.make_mut(schema) {
                ty.directives.retain(|d| d.name.as_str() != name);
            }
        }
        for pos in &referencers.object_fields {
            if let Ok(field) = pos.make_mut(schema) {
                field.directives.retain(|d| d.name.as_str() != name);
            }
        }
        for pos in &referencers.object_field_arguments {
            if let Ok(argument) = pos.make_mut(schema) {
                argument.directives.retain(|d| d.name.as_str() != name);
            }
        }
        for pos in &referencers.input_object_fields {
            if let Ok(field) = pos.make_mut(schema) {
                field.directives.retain(|d| d.name.as_str() != name);
            }
        }
        for pos in &referencers.directive_arguments {
            if let Ok(argument) = pos.make_mut(schema) {
                argument.directives.retain(|d| d.name.as_str() != name);
            }
        }
        Ok(Some(referencers))
    }
}
