//! The schema object model: a mutable, in-memory representation of a GraphQL
//! schema with federation extensions.
//!
//! Types live by value in schema-owned maps; every cross-element reference is
//! a [`Name`], and reverse edges are tracked in [`Referencers`] so removal can
//! notify everything that depends on a type. Two views coexist: [`Schema`]
//! (mutable) and [`FrozenSchema`] (immutable); conversion between them is by
//! deep copy.

use std::fmt;
use std::fmt::Display;
use std::fmt::Formatter;
use std::ops::Deref;

use apollo_compiler::name;
use apollo_compiler::Name;
use indexmap::IndexMap;
use indexmap::IndexSet;

use crate::error::SchemaError;

pub(crate) mod field_set;
pub(crate) mod parse;
pub mod position;
mod print;
pub mod referencer;
mod remove;
pub mod values;

use position::CompositeTypeDefinitionPosition;
use position::DirectiveDefinitionPosition;
use position::InputObjectTypeDefinitionPosition;
use position::ObjectTypeDefinitionPosition;
use position::ScalarTypeDefinitionPosition;
use position::TypeDefinitionPosition;
use position::UnionTypeDefinitionPosition;
use referencer::Referencers;
use values::DirectiveList;
use values::Value;

pub(crate) const BUILT_IN_SCALAR_NAMES: [Name; 5] = [
    name!("Int"),
    name!("Float"),
    name!("String"),
    name!("Boolean"),
    name!("ID"),
];

/// A type reference: a named type, possibly wrapped in list types. Non-null
/// wrappers are not supported by this model.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Type {
    Named(Name),
    List(Box<Type>),
}

impl Type {
    /// The eventual base type, unwrapping any list wrappers.
    pub fn base_type_name(&self) -> &Name {
        match self {
            Type::Named(name) => name,
            Type::List(inner) => inner.base_type_name(),
        }
    }

    pub fn list(inner: Type) -> Type {
        Type::List(Box::new(inner))
    }
}

impl Display for Type {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Type::Named(name) => write!(f, "{name}"),
            Type::List(inner) => write!(f, "[{inner}]"),
        }
    }
}

/// The kind of a named type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeKind {
    Scalar,
    Object,
    Union,
    InputObject,
}

impl TypeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TypeKind::Scalar => "scalar",
            TypeKind::Object => "object",
            TypeKind::Union => "union",
            TypeKind::InputObject => "input object",
        }
    }
}

/// A scalar type definition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScalarType {
    pub(crate) name: Name,
    pub(crate) directives: DirectiveList,
    pub(crate) built_in: bool,
}

impl ScalarType {
    pub fn name(&self) -> &Name {
        &self.name
    }

    pub fn directives(&self) -> &DirectiveList {
        &self.directives
    }

    pub fn is_built_in(&self) -> bool {
        self.built_in
    }
}

/// An object type definition and its fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectType {
    pub(crate) name: Name,
    pub(crate) directives: DirectiveList,
    pub(crate) fields: IndexMap<Name, FieldDefinition>,
}

impl ObjectType {
    pub fn name(&self) -> &Name {
        &self.name
    }

    pub fn directives(&self) -> &DirectiveList {
        &self.directives
    }

    pub fn fields(&self) -> &IndexMap<Name, FieldDefinition> {
        &self.fields
    }
}

/// A union type definition and its member types.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnionType {
    pub(crate) name: Name,
    pub(crate) directives: DirectiveList,
    pub(crate) members: IndexSet<Name>,
}

impl UnionType {
    pub fn name(&self) -> &Name {
        &self.name
    }

    pub fn directives(&self) -> &DirectiveList {
        &self.directives
    }

    pub fn members(&self) -> &IndexSet<Name> {
        &self.members
    }
}

/// An input object type definition and its input fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputObjectType {
    pub(crate) name: Name,
    pub(crate) directives: DirectiveList,
    pub(crate) fields: IndexMap<Name, InputFieldDefinition>,
}

impl InputObjectType {
    pub fn name(&self) -> &Name {
        &self.name
    }

    pub fn directives(&self) -> &DirectiveList {
        &self.directives
    }

    pub fn fields(&self) -> &IndexMap<Name, InputFieldDefinition> {
        &self.fields
    }
}

/// An output field definition. The type is `None` only after the referenced
/// type has been removed from the schema; such a field is detached and any
/// direct use fails.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDefinition {
    pub(crate) name: Name,
    pub(crate) ty: Option<Type>,
    pub(crate) arguments: IndexMap<Name, ArgumentDefinition>,
    pub(crate) directives: DirectiveList,
}

impl FieldDefinition {
    pub fn new(name: Name, ty: Type) -> Self {
        Self {
            name,
            ty: Some(ty),
            arguments: IndexMap::new(),
            directives: DirectiveList::new(),
        }
    }

    pub fn with_argument(mut self, argument: ArgumentDefinition) -> Self {
        self.arguments.insert(argument.name.clone(), argument);
        self
    }

    pub fn with_directive(mut self, directive: values::Directive) -> Self {
        self.directives.push(directive);
        self
    }

    pub fn name(&self) -> &Name {
        &self.name
    }

    pub fn ty(&self) -> Option<&Type> {
        self.ty.as_ref()
    }

    pub fn arguments(&self) -> &IndexMap<Name, ArgumentDefinition> {
        &self.arguments
    }

    pub fn directives(&self) -> &DirectiveList {
        &self.directives
    }
}

/// An input field definition, owned by an input object type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputFieldDefinition {
    pub(crate) name: Name,
    pub(crate) ty: Option<Type>,
    pub(crate) default_value: Option<Value>,
    pub(crate) directives: DirectiveList,
}

impl InputFieldDefinition {
    pub fn new(name: Name, ty: Type) -> Self {
        Self {
            name,
            ty: Some(ty),
            default_value: None,
            directives: DirectiveList::new(),
        }
    }

    pub fn with_default_value(mut self, value: Value) -> Self {
        self.default_value = Some(value);
        self
    }

    pub fn with_directive(mut self, directive: values::Directive) -> Self {
        self.directives.push(directive);
        self
    }

    pub fn name(&self) -> &Name {
        &self.name
    }

    pub fn ty(&self) -> Option<&Type> {
        self.ty.as_ref()
    }

    pub fn default_value(&self) -> Option<&Value> {
        self.default_value.as_ref()
    }

    pub fn directives(&self) -> &DirectiveList {
        &self.directives
    }
}

/// An argument definition, owned by a field or a directive definition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArgumentDefinition {
    pub(crate) name: Name,
    pub(crate) ty: Option<Type>,
    pub(crate) default_value: Option<Value>,
    pub(crate) directives: DirectiveList,
}

impl ArgumentDefinition {
    pub fn new(name: Name, ty: Type) -> Self {
        Self {
            name,
            ty: Some(ty),
            default_value: None,
            directives: DirectiveList::new(),
        }
    }

    pub fn with_default_value(mut self, value: Value) -> Self {
        self.default_value = Some(value);
        self
    }

    pub fn name(&self) -> &Name {
        &self.name
    }

    pub fn ty(&self) -> Option<&Type> {
        self.ty.as_ref()
    }

    pub fn default_value(&self) -> Option<&Value> {
        self.default_value.as_ref()
    }

    pub fn directives(&self) -> &DirectiveList {
        &self.directives
    }
}

/// The locations a directive may be applied to, as far as this model prints
/// them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::Display)]
pub enum DirectiveLocation {
    #[strum(to_string = "SCHEMA")]
    Schema,
    #[strum(to_string = "SCALAR")]
    Scalar,
    #[strum(to_string = "OBJECT")]
    Object,
    #[strum(to_string = "FIELD_DEFINITION")]
    FieldDefinition,
    #[strum(to_string = "ARGUMENT_DEFINITION")]
    ArgumentDefinition,
    #[strum(to_string = "UNION")]
    Union,
    #[strum(to_string = "ENUM_VALUE")]
    EnumValue,
    #[strum(to_string = "INPUT_OBJECT")]
    InputObject,
    #[strum(to_string = "INPUT_FIELD_DEFINITION")]
    InputFieldDefinition,
}

/// A directive definition, owned by the schema.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectiveDefinition {
    pub(crate) name: Name,
    pub(crate) arguments: IndexMap<Name, ArgumentDefinition>,
    pub(crate) repeatable: bool,
    pub(crate) locations: Vec<DirectiveLocation>,
}

impl DirectiveDefinition {
    pub fn new(name: Name) -> Self {
        Self {
            name,
            arguments: IndexMap::new(),
            repeatable: false,
            locations: Vec::new(),
        }
    }

    pub fn with_argument(mut self, argument: ArgumentDefinition) -> Self {
        self.arguments.insert(argument.name.clone(), argument);
        self
    }

    pub fn repeatable(mut self) -> Self {
        self.repeatable = true;
        self
    }

    pub fn with_location(mut self, location: DirectiveLocation) -> Self {
        self.locations.push(location);
        self
    }

    pub fn name(&self) -> &Name {
        &self.name
    }

    pub fn arguments(&self) -> &IndexMap<Name, ArgumentDefinition> {
        &self.arguments
    }
}

/// The schema definition: applied directives plus the root-operation
/// assignments.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SchemaDefinition {
    pub(crate) directives: DirectiveList,
    pub(crate) query: Option<Name>,
    pub(crate) mutation: Option<Name>,
    pub(crate) subscription: Option<Name>,
}

impl SchemaDefinition {
    pub fn directives(&self) -> &DirectiveList {
        &self.directives
    }

    pub fn query(&self) -> Option<&Name> {
        self.query.as_ref()
    }

    pub fn mutation(&self) -> Option<&Name> {
        self.mutation.as_ref()
    }

    pub fn subscription(&self) -> Option<&Name> {
        self.subscription.as_ref()
    }

    pub fn is_empty(&self) -> bool {
        self.directives.is_empty()
            && self.query.is_none()
            && self.mutation.is_none()
            && self.subscription.is_none()
    }
}

/// A named type definition of any supported kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NamedType {
    Scalar(ScalarType),
    Object(ObjectType),
    Union(UnionType),
    InputObject(InputObjectType),
}

impl NamedType {
    pub fn name(&self) -> &Name {
        match self {
            NamedType::Scalar(ty) => &ty.name,
            NamedType::Object(ty) => &ty.name,
            NamedType::Union(ty) => &ty.name,
            NamedType::InputObject(ty) => &ty.name,
        }
    }

    pub fn directives(&self) -> &DirectiveList {
        match self {
            NamedType::Scalar(ty) => &ty.directives,
            NamedType::Object(ty) => &ty.directives,
            NamedType::Union(ty) => &ty.directives,
            NamedType::InputObject(ty) => &ty.directives,
        }
    }

    pub fn kind(&self) -> TypeKind {
        match self {
            NamedType::Scalar(_) => TypeKind::Scalar,
            NamedType::Object(_) => TypeKind::Object,
            NamedType::Union(_) => TypeKind::Union,
            NamedType::InputObject(_) => TypeKind::InputObject,
        }
    }
}

/// The mutable view of a schema. Obtain the immutable view with
/// [`Schema::to_immutable`].
#[derive(Debug, Clone)]
pub struct Schema {
    pub(crate) types: IndexMap<Name, NamedType>,
    pub(crate) builtins: IndexMap<Name, ScalarType>,
    pub(crate) directive_definitions: IndexMap<Name, DirectiveDefinition>,
    pub(crate) schema_definition: SchemaDefinition,
    pub(crate) referencers: Referencers,
    pub(crate) mutable: bool,
}

impl Default for Schema {
    fn default() -> Self {
        Self::new()
    }
}

impl Schema {
    /// An empty mutable schema with the built-in scalars pre-populated.
    pub fn new() -> Self {
        let mut builtins = IndexMap::new();
        let mut referencers = Referencers::default();
        for name in BUILT_IN_SCALAR_NAMES {
            builtins.insert(
                name.clone(),
                ScalarType {
                    name: name.clone(),
                    directives: DirectiveList::new(),
                    built_in: true,
                },
            );
            referencers.scalar_types.entry(name).or_default();
        }
        Self {
            types: IndexMap::new(),
            builtins,
            directive_definitions: IndexMap::new(),
            schema_definition: SchemaDefinition::default(),
            referencers,
            mutable: true,
        }
    }

    pub fn is_mutable(&self) -> bool {
        self.mutable
    }

    pub(crate) fn check_mutable(&self) -> Result<(), SchemaError> {
        if self.mutable {
            Ok(())
        } else {
            Err(SchemaError::ImmutableSchema)
        }
    }

    /// An independent immutable snapshot of this schema. The copy is deep:
    /// nothing is shared with `self`.
    pub fn to_immutable(&self) -> FrozenSchema {
        let mut copy = self.clone();
        copy.mutable = false;
        FrozenSchema(copy)
    }

    pub fn types(&self) -> impl Iterator<Item = (&Name, &NamedType)> {
        self.types.iter()
    }

    pub fn get_types(&self) -> Vec<TypeDefinitionPosition> {
        self.types
            .iter()
            .map(|(type_name, type_)| {
                let type_name = type_name.clone();
                match type_ {
                    NamedType::Scalar(_) => ScalarTypeDefinitionPosition { type_name }.into(),
                    NamedType::Object(_) => ObjectTypeDefinitionPosition { type_name }.into(),
                    NamedType::Union(_) => UnionTypeDefinitionPosition { type_name }.into(),
                    NamedType::InputObject(_) => {
                        InputObjectTypeDefinitionPosition { type_name }.into()
                    }
                }
            })
            .collect()
    }

    pub fn get_type(&self, type_name: Name) -> Result<TypeDefinitionPosition, SchemaError> {
        if self.builtins.contains_key(&type_name) {
            return Ok(ScalarTypeDefinitionPosition { type_name }.into());
        }
        let type_ = self
            .types
            .get(&type_name)
            .ok_or_else(|| SchemaError::UnknownType {
                name: type_name.clone(),
            })?;
        Ok(match type_ {
            NamedType::Scalar(_) => ScalarTypeDefinitionPosition { type_name }.into(),
            NamedType::Object(_) => ObjectTypeDefinitionPosition { type_name }.into(),
            NamedType::Union(_) => UnionTypeDefinitionPosition { type_name }.into(),
            NamedType::InputObject(_) => InputObjectTypeDefinitionPosition { type_name }.into(),
        })
    }

    pub fn try_get_type(&self, type_name: Name) -> Option<TypeDefinitionPosition> {
        self.get_type(type_name).ok()
    }

    pub(crate) fn type_kind(&self, type_name: &Name) -> Result<TypeKind, SchemaError> {
        if self.builtins.contains_key(type_name) {
            return Ok(TypeKind::Scalar);
        }
        self.types
            .get(type_name)
            .map(NamedType::kind)
            .ok_or_else(|| SchemaError::UnknownType {
                name: type_name.clone(),
            })
    }

    pub fn schema_definition(&self) -> &SchemaDefinition {
        &self.schema_definition
    }

    pub fn directive_definitions(&self) -> &IndexMap<Name, DirectiveDefinition> {
        &self.directive_definitions
    }

    pub fn referencers(&self) -> &Referencers {
        &self.referencers
    }

    /// Adds a scalar type, or returns the existing position if a scalar of
    /// that name already exists. Built-in names are rejected.
    pub fn add_scalar_type(
        &mut self,
        name: Name,
    ) -> Result<ScalarTypeDefinitionPosition, SchemaError> {
        self.check_mutable()?;
        if self.builtins.contains_key(&name) {
            return Err(SchemaError::BuiltInScalarRedefinition { name });
        }
        match self.types.get(&name) {
            Some(NamedType::Scalar(_)) => Ok(ScalarTypeDefinitionPosition { type_name: name }),
            Some(_) => Err(SchemaError::TypeKindMismatch { name }),
            None => {
                self.types.insert(
                    name.clone(),
                    NamedType::Scalar(ScalarType {
                        name: name.clone(),
                        directives: DirectiveList::new(),
                        built_in: false,
                    }),
                );
                self.referencers.scalar_types.entry(name.clone()).or_default();
                Ok(ScalarTypeDefinitionPosition { type_name: name })
            }
        }
    }

    /// Adds an object type, or returns the existing position if an object of
    /// that name already exists.
    pub fn add_object_type(
        &mut self,
        name: Name,
    ) -> Result<ObjectTypeDefinitionPosition, SchemaError> {
        self.check_mutable()?;
        if self.builtins.contains_key(&name) {
            return Err(SchemaError::TypeKindMismatch { name });
        }
        match self.types.get(&name) {
            Some(NamedType::Object(_)) => Ok(ObjectTypeDefinitionPosition { type_name: name }),
            Some(_) => Err(SchemaError::TypeKindMismatch { name }),
            None => {
                self.types.insert(
                    name.clone(),
                    NamedType::Object(ObjectType {
                        name: name.clone(),
                        directives: DirectiveList::new(),
                        fields: IndexMap::new(),
                    }),
                );
                self.referencers.object_types.entry(name.clone()).or_default();
                Ok(ObjectTypeDefinitionPosition { type_name: name })
            }
        }
    }

    /// Adds a union type, or returns the existing position if a union of that
    /// name already exists.
    pub fn add_union_type(
        &mut self,
        name: Name,
    ) -> Result<UnionTypeDefinitionPosition, SchemaError> {
        self.check_mutable()?;
        if self.builtins.contains_key(&name) {
            return Err(SchemaError::TypeKindMismatch { name });
        }
        match self.types.get(&name) {
            Some(NamedType::Union(_)) => Ok(UnionTypeDefinitionPosition { type_name: name }),
            Some(_) => Err(SchemaError::TypeKindMismatch { name }),
            None => {
                self.types.insert(
                    name.clone(),
                    NamedType::Union(UnionType {
                        name: name.clone(),
                        directives: DirectiveList::new(),
                        members: IndexSet::new(),
                    }),
                );
                self.referencers.union_types.entry(name.clone()).or_default();
                Ok(UnionTypeDefinitionPosition { type_name: name })
            }
        }
    }

    /// Adds an input object type, or returns the existing position if an
    /// input object of that name already exists.
    pub fn add_input_object_type(
        &mut self,
        name: Name,
    ) -> Result<InputObjectTypeDefinitionPosition, SchemaError> {
        self.check_mutable()?;
        if self.builtins.contains_key(&name) {
            return Err(SchemaError::TypeKindMismatch { name });
        }
        match self.types.get(&name) {
            Some(NamedType::InputObject(_)) => {
                Ok(InputObjectTypeDefinitionPosition { type_name: name })
            }
            Some(_) => Err(SchemaError::TypeKindMismatch { name }),
            None => {
                self.types.insert(
                    name.clone(),
                    NamedType::InputObject(InputObjectType {
                        name: name.clone(),
                        directives: DirectiveList::new(),
                        fields: IndexMap::new(),
                    }),
                );
                self.referencers
                    .input_object_types
                    .entry(name.clone())
                    .or_default();
                Ok(InputObjectTypeDefinitionPosition { type_name: name })
            }
        }
    }

    pub fn add_directive_definition(
        &mut self,
        definition: DirectiveDefinition,
    ) -> Result<DirectiveDefinitionPosition, SchemaError> {
        let position = DirectiveDefinitionPosition {
            directive_name: definition.name.clone(),
        };
        position.insert(self, definition)?;
        Ok(position)
    }

    /// The set of object types a value of the given composite type may be at
    /// runtime: the type itself for objects, the member types for unions.
    pub fn possible_runtime_types(
        &self,
        composite_type_definition_position: CompositeTypeDefinitionPosition,
    ) -> Result<IndexSet<ObjectTypeDefinitionPosition>, SchemaError> {
        Ok(match composite_type_definition_position {
            CompositeTypeDefinitionPosition::Object(pos) => IndexSet::from([pos]),
            CompositeTypeDefinitionPosition::Union(pos) => pos
                .get(self)?
                .members
                .iter()
                .map(|type_name| ObjectTypeDefinitionPosition {
                    type_name: type_name.clone(),
                })
                .collect::<IndexSet<_>>(),
        })
    }

    /// Whether every possible runtime type of `sub` is a possible runtime
    /// type of `sup`.
    pub fn is_subtype(
        &self,
        sup: &CompositeTypeDefinitionPosition,
        sub: &CompositeTypeDefinitionPosition,
    ) -> Result<bool, SchemaError> {
        if sup.type_name() == sub.type_name() {
            return Ok(true);
        }
        let sup_types = self.possible_runtime_types(sup.clone())?;
        let sub_types = self.possible_runtime_types(sub.clone())?;
        Ok(sub_types.is_subset(&sup_types))
    }

    /// Looks up a composite type position by name.
    pub fn get_composite_type(
        &self,
        type_name: Name,
    ) -> Result<CompositeTypeDefinitionPosition, SchemaError> {
        self.get_type(type_name)?.try_into()
    }
}

/// Structural equality: same types, fields, arguments, directive
/// applications, and roots. The view tag and the referencer index are not
/// part of a schema's identity (the latter is derived state).
impl PartialEq for Schema {
    fn eq(&self, other: &Self) -> bool {
        self.types == other.types
            && self.builtins == other.builtins
            && self.directive_definitions == other.directive_definitions
            && self.schema_definition == other.schema_definition
    }
}

impl Eq for Schema {}

/// The immutable view of a schema. All reachable state is frozen; reads may
/// be shared freely. Obtain a mutable copy with [`FrozenSchema::to_mutable`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrozenSchema(pub(crate) Schema);

impl FrozenSchema {
    /// An independent mutable deep copy of this schema.
    pub fn to_mutable(&self) -> Schema {
        let mut copy = self.0.clone();
        copy.mutable = true;
        copy
    }
}

impl Deref for FrozenSchema {
    type Target = Schema;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use apollo_compiler::name;

    use super::position::ObjectFieldDefinitionPosition;
    use super::position::ObjectTypeDefinitionPosition;
    use super::position::ScalarTypeDefinitionPosition;
    use super::position::UnionTypeDefinitionPosition;
    use super::values::Directive;
    use super::*;

    fn sample_schema() -> Schema {
        Schema::parse(
            r#"
            type Query {
              t(id: ID): T
              v: V
            }

            type T @key(fields: "k") {
              k: ID
              size: Size
            }

            type S {
              x: Int
            }

            scalar Size

            union V = S | T

            input Filter {
              limit: Int = 10
            }
            "#,
            "schema.graphql",
        )
        .expect("sample schema should parse")
    }

    /// Walks every type reference in the schema and asserts both directions
    /// of the referencer relation.
    fn assert_referencer_symmetry(schema: &Schema) {
        for (type_name, ty) in schema.types() {
            if let NamedType::Object(object) = ty {
                for (field_name, field) in object.fields() {
                    let position = ObjectTypeDefinitionPosition {
                        type_name: type_name.clone(),
                    }
                    .field(field_name.clone());
                    let Some(field_ty) = field.ty() else {
                        continue;
                    };
                    let base = field_ty.base_type_name();
                    let recorded = match schema.type_kind(base).unwrap() {
                        TypeKind::Scalar => schema
                            .referencers()
                            .get_scalar_type(base)
                            .unwrap()
                            .object_fields
                            .contains(&position),
                        TypeKind::Object => schema
                            .referencers()
                            .get_object_type(base)
                            .unwrap()
                            .object_fields
                            .contains(&position),
                        TypeKind::Union => schema
                            .referencers()
                            .get_union_type(base)
                            .unwrap()
                            .object_fields
                            .contains(&position),
                        TypeKind::InputObject => unreachable!("output field of input object type"),
                    };
                    assert!(recorded, "missing referencer edge {base} <- {position}");
                }
            }
        }
        // Reverse direction: every recorded referencer still references the type.
        for (type_name, sets) in &schema.referencers.scalar_types {
            for position in &sets.object_fields {
                let field = position.get(schema).expect("referencer must exist");
                assert_eq!(
                    field.ty().expect("referencer field must have a type").base_type_name(),
                    type_name,
                );
            }
        }
        for (type_name, sets) in &schema.referencers.object_types {
            for position in &sets.object_fields {
                let field = position.get(schema).expect("referencer must exist");
                assert_eq!(
                    field.ty().expect("referencer field must have a type").base_type_name(),
                    type_name,
                );
            }
        }
    }

    #[test]
    fn referencer_symmetry_holds_after_parse_and_mutation() {
        let mut schema = sample_schema();
        assert_referencer_symmetry(&schema);

        let s = ObjectTypeDefinitionPosition {
            type_name: name!("S"),
        };
        s.field(name!("size"))
            .insert(&mut schema, FieldDefinition::new(name!("size"), Type::Named(name!("Size"))))
            .unwrap();
        assert_referencer_symmetry(&schema);

        s.field(name!("size"))
            .set_type(&mut schema, Type::Named(name!("Int")))
            .unwrap();
        assert_referencer_symmetry(&schema);
        let size_referencers = schema.referencers().get_scalar_type("Size").unwrap();
        assert!(!size_referencers
            .object_fields
            .contains(&s.field(name!("size"))));

        // Re-pointing at a type with the same base keeps the edge.
        s.field(name!("size"))
            .set_type(&mut schema, Type::list(Type::Named(name!("Int"))))
            .unwrap();
        assert_referencer_symmetry(&schema);
        assert!(schema
            .referencers()
            .get_scalar_type("Int")
            .unwrap()
            .object_fields
            .contains(&s.field(name!("size"))));
    }

    #[test]
    fn immutable_mutable_round_trip_is_structural_identity() {
        let schema = sample_schema();
        let round_tripped = schema.to_immutable().to_mutable();
        assert_eq!(schema, round_tripped);
        assert_eq!(
            schema.to_immutable().to_mutable().to_immutable(),
            schema.to_immutable()
        );
        // The copies are independent: mutating one leaves the other intact.
        let frozen = schema.to_immutable();
        let mut copy = frozen.to_mutable();
        copy.add_object_type(name!("Extra")).unwrap();
        assert!(frozen.try_get_type(name!("Extra")).is_none());
    }

    #[test]
    fn frozen_schema_rejects_mutation() {
        let frozen = sample_schema().to_immutable();
        let mut inner = frozen.0;
        assert_eq!(
            inner.add_object_type(name!("X")).unwrap_err(),
            SchemaError::ImmutableSchema
        );
    }

    #[test]
    fn add_contracts_fail_fast() {
        let mut schema = sample_schema();
        assert_eq!(
            schema.add_scalar_type(name!("Int")).unwrap_err(),
            SchemaError::BuiltInScalarRedefinition { name: name!("Int") }
        );
        assert_eq!(
            schema.add_object_type(name!("Size")).unwrap_err(),
            SchemaError::TypeKindMismatch { name: name!("Size") }
        );
        // Same-kind re-add returns the existing position.
        let t = schema.add_object_type(name!("T")).unwrap();
        assert_eq!(t.type_name, name!("T"));

        let duplicate = t
            .field(name!("k"))
            .insert(
                &mut schema,
                FieldDefinition::new(name!("k"), Type::Named(name!("ID"))),
            )
            .unwrap_err();
        assert_eq!(
            duplicate,
            SchemaError::FieldAlreadyExists {
                type_name: name!("T"),
                field_name: name!("k"),
            }
        );

        // A type name that does not resolve in this schema is rejected; this
        // covers both detached and foreign types, since references are names.
        let foreign = t
            .field(name!("other"))
            .insert(
                &mut schema,
                FieldDefinition::new(name!("other"), Type::Named(name!("Elsewhere"))),
            )
            .unwrap_err();
        assert_eq!(
            foreign,
            SchemaError::UnknownType {
                name: name!("Elsewhere"),
            }
        );
    }

    #[test]
    fn removing_a_type_clears_and_reports_referencers() {
        let mut schema = sample_schema();
        let size = ScalarTypeDefinitionPosition {
            type_name: name!("Size"),
        };
        let referencers = schema_remove_scalar(&mut schema, &size);
        assert_eq!(referencers.object_fields.len(), 1);
        let cleared = ObjectFieldDefinitionPosition {
            type_name: name!("T"),
            field_name: name!("size"),
        };
        assert!(referencers.object_fields.contains(&cleared));
        assert!(schema.try_get_type(name!("Size")).is_none());
        // The referencing field is left in place, detached from its type.
        assert_eq!(cleared.get(&schema).unwrap().ty(), None);
        // Double removal returns empty.
        assert!(size.remove(&mut schema).unwrap().is_none());
    }

    fn schema_remove_scalar(
        schema: &mut Schema,
        position: &ScalarTypeDefinitionPosition,
    ) -> referencer::ScalarTypeReferencers {
        position
            .remove(schema)
            .expect("removal should succeed")
            .expect("type should be present")
    }

    #[test]
    fn removing_an_object_type_updates_unions_and_roots() {
        let mut schema = sample_schema();
        let t = ObjectTypeDefinitionPosition {
            type_name: name!("T"),
        };
        let referencers = t.remove(&mut schema).unwrap().expect("T should be present");
        assert!(schema.try_get_type(name!("T")).is_none());
        assert_eq!(referencers.object_fields.len(), 1);
        assert_eq!(referencers.union_types.len(), 1);
        // The union dropped the member.
        let v = UnionTypeDefinitionPosition {
            type_name: name!("V"),
        };
        assert!(!v.get(&schema).unwrap().members().contains("T"));
        // The referencing field is detached.
        let query_t = ObjectFieldDefinitionPosition {
            type_name: name!("Query"),
            field_name: name!("t"),
        };
        assert_eq!(query_t.get(&schema).unwrap().ty(), None);

        let query = ObjectTypeDefinitionPosition {
            type_name: name!("Query"),
        };
        let referencers = query.remove(&mut schema).unwrap().expect("Query");
        assert_eq!(referencers.schema_roots.len(), 1);
        assert_eq!(schema.schema_definition().query(), None);
    }

    #[test]
    fn directive_applications_are_not_deduped() {
        let mut schema = sample_schema();
        let t = ObjectTypeDefinitionPosition {
            type_name: name!("T"),
        };
        t.insert_directive(&mut schema, Directive::new(name!("tag")))
            .unwrap();
        t.insert_directive(&mut schema, Directive::new(name!("tag")))
            .unwrap();
        assert_eq!(t.get(&schema).unwrap().directives().get_all("tag").count(), 2);
    }

    #[test]
    fn possible_runtime_types_and_subtyping() {
        let schema = sample_schema();
        let v = CompositeTypeDefinitionPosition::Union(UnionTypeDefinitionPosition {
            type_name: name!("V"),
        });
        let t = CompositeTypeDefinitionPosition::Object(ObjectTypeDefinitionPosition {
            type_name: name!("T"),
        });
        let v_types = schema.possible_runtime_types(v.clone()).unwrap();
        assert_eq!(v_types.len(), 2);
        assert!(schema.is_subtype(&v, &t).unwrap());
        assert!(!schema.is_subtype(&t, &v).unwrap());
    }
}

