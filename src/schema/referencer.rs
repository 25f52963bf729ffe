use std::hash::Hash;

use apollo_compiler::Name;
use indexmap::Equivalent;
use indexmap::IndexMap;
use indexmap::IndexSet;

use crate::error::SchemaError;
use crate::schema::position::DirectiveArgumentDefinitionPosition;
use crate::schema::position::InputObjectFieldDefinitionPosition;
use crate::schema::position::InputObjectTypeDefinitionPosition;
use crate::schema::position::ObjectFieldArgumentDefinitionPosition;
use crate::schema::position::ObjectFieldDefinitionPosition;
use crate::schema::position::ObjectTypeDefinitionPosition;
use crate::schema::position::ScalarTypeDefinitionPosition;
use crate::schema::position::SchemaDefinitionPosition;
use crate::schema::position::SchemaRootDefinitionPosition;
use crate::schema::position::UnionTypeDefinitionPosition;

/// The reverse edges of the schema graph: for every named type and directive
/// definition, the set of elements whose definition currently references it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Referencers {
    pub(crate) scalar_types: IndexMap<Name, ScalarTypeReferencers>,
    pub(crate) object_types: IndexMap<Name, ObjectTypeReferencers>,
    pub(crate) union_types: IndexMap<Name, UnionTypeReferencers>,
    pub(crate) input_object_types: IndexMap<Name, InputObjectTypeReferencers>,
    pub(crate) directives: IndexMap<Name, DirectiveReferencers>,
}

impl Referencers {
    pub(crate) fn contains_type_name<Q: Hash + Equivalent<Name>>(&self, name: &Q) -> bool {
        self.scalar_types.contains_key(name)
            || self.object_types.contains_key(name)
            || self.union_types.contains_key(name)
            || self.input_object_types.contains_key(name)
    }

    pub fn get_scalar_type(&self, name: &str) -> Result<&ScalarTypeReferencers, SchemaError> {
        self.scalar_types
            .get(name)
            .ok_or_else(|| SchemaError::UnknownElement {
                coordinate: name.to_owned(),
            })
    }

    pub fn get_object_type(&self, name: &str) -> Result<&ObjectTypeReferencers, SchemaError> {
        self.object_types
            .get(name)
            .ok_or_else(|| SchemaError::UnknownElement {
                coordinate: name.to_owned(),
            })
    }

    pub fn get_union_type(&self, name: &str) -> Result<&UnionTypeReferencers, SchemaError> {
        self.union_types
            .get(name)
            .ok_or_else(|| SchemaError::UnknownElement {
                coordinate: name.to_owned(),
            })
    }

    pub fn get_input_object_type(
        &self,
        name: &str,
    ) -> Result<&InputObjectTypeReferencers, SchemaError> {
        self.input_object_types
            .get(name)
            .ok_or_else(|| SchemaError::UnknownElement {
                coordinate: name.to_owned(),
            })
    }

    pub fn get_directive(&self, name: &str) -> Result<&DirectiveReferencers, SchemaError> {
        self.directives
            .get(name)
            .ok_or_else(|| SchemaError::UnknownElement {
                coordinate: format!("@{name}"),
            })
    }
}

/// Referencers of a scalar type. Scalars may appear as the type of output
/// fields, arguments, and input fields.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScalarTypeReferencers {
    pub object_fields: IndexSet<ObjectFieldDefinitionPosition>,
    pub object_field_arguments: IndexSet<ObjectFieldArgumentDefinitionPosition>,
    pub input_object_fields: IndexSet<InputObjectFieldDefinitionPosition>,
    pub directive_arguments: IndexSet<DirectiveArgumentDefinitionPosition>,
}

impl ScalarTypeReferencers {
    pub fn is_empty(&self) -> bool {
        self.object_fields.is_empty()
            && self.object_field_arguments.is_empty()
            && self.input_object_fields.is_empty()
            && self.directive_arguments.is_empty()
    }

    pub fn len(&self) -> usize {
        self.object_fields.len()
            + self.object_field_arguments.len()
            + self.input_object_fields.len()
            + self.directive_arguments.len()
    }
}

/// Referencers of an object type: root-operation bindings, output fields, and
/// union memberships. Object types never appear in input positions.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ObjectTypeReferencers {
    pub schema_roots: IndexSet<SchemaRootDefinitionPosition>,
    pub object_fields: IndexSet<ObjectFieldDefinitionPosition>,
    pub union_types: IndexSet<UnionTypeDefinitionPosition>,
}

impl ObjectTypeReferencers {
    pub fn is_empty(&self) -> bool {
        self.schema_roots.is_empty() && self.object_fields.is_empty() && self.union_types.is_empty()
    }

    pub fn len(&self) -> usize {
        self.schema_roots.len() + self.object_fields.len() + self.union_types.len()
    }
}

/// Referencers of a union type: output fields only.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UnionTypeReferencers {
    pub object_fields: IndexSet<ObjectFieldDefinitionPosition>,
}

impl UnionTypeReferencers {
    pub fn is_empty(&self) -> bool {
        self.object_fields.is_empty()
    }

    pub fn len(&self) -> usize {
        self.object_fields.len()
    }
}

/// Referencers of an input object type: arguments and input fields.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InputObjectTypeReferencers {
    pub object_field_arguments: IndexSet<ObjectFieldArgumentDefinitionPosition>,
    pub input_object_fields: IndexSet<InputObjectFieldDefinitionPosition>,
    pub directive_arguments: IndexSet<DirectiveArgumentDefinitionPosition>,
}

impl InputObjectTypeReferencers {
    pub fn is_empty(&self) -> bool {
        self.object_field_arguments.is_empty()
            && self.input_object_fields.is_empty()
            && self.directive_arguments.is_empty()
    }

    pub fn len(&self) -> usize {
        self.object_field_arguments.len()
            + self.input_object_fields.len()
            + self.directive_arguments.len()
    }
}

/// Elements carrying an application of a given directive.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DirectiveReferencers {
    pub schema: Option<SchemaDefinitionPosition>,
    pub scalar_types: IndexSet<ScalarTypeDefinitionPosition>,
    pub object_types: IndexSet<ObjectTypeDefinitionPosition>,
    pub object_fields: IndexSet<ObjectFieldDefinitionPosition>,
    pub object_field_arguments: IndexSet<ObjectFieldArgumentDefinitionPosition>,
    pub union_types: IndexSet<UnionTypeDefinitionPosition>,
    pub input_object_types: IndexSet<InputObjectTypeDefinitionPosition>,
    pub input_object_fields: IndexSet<InputObjectFieldDefinitionPosition>,
    pub directive_arguments: IndexSet<DirectiveArgumentDefinitionPosition>,
}
