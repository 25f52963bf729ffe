//! Precomputed federation metadata for one subgraph: which fields are key
//! fields, which are shareable, which are external, and which carry an
//! `@override`.

use indexmap::IndexMap;
use indexmap::IndexSet;

use crate::error::SchemaError;
use crate::schema::field_set::collect_target_fields_from_field_set;
use crate::schema::position::ObjectFieldDefinitionPosition;
use crate::schema::position::ObjectTypeDefinitionPosition;
use crate::schema::position::TypeDefinitionPosition;
use crate::schema::NamedType;
use crate::schema::Schema;
use crate::subgraph::spec::EXTERNAL_DIRECTIVE_NAME;
use crate::subgraph::spec::FIELDS_ARGUMENT_NAME;
use crate::subgraph::spec::FROM_ARGUMENT_NAME;
use crate::subgraph::spec::KEY_DIRECTIVE_NAME;
use crate::subgraph::spec::OVERRIDE_DIRECTIVE_NAME;
use crate::subgraph::spec::PROVIDES_DIRECTIVE_NAME;
use crate::subgraph::spec::SHAREABLE_DIRECTIVE_NAME;

/// `@external`-related metadata.
#[derive(Debug, Clone, Default)]
pub struct ExternalMetadata {
    /// Fields with an `@external` directive applied directly.
    external_fields: IndexSet<ObjectFieldDefinitionPosition>,
    /// Fields that are external because their parent type has an `@external`
    /// directive.
    fields_on_external_types: IndexSet<ObjectFieldDefinitionPosition>,
}

impl ExternalMetadata {
    pub fn is_external(&self, field: &ObjectFieldDefinitionPosition) -> bool {
        self.external_fields.contains(field) || self.fields_on_external_types.contains(field)
    }
}

/// Metadata precomputed over one subgraph schema.
#[derive(Debug, Clone)]
pub struct SubgraphMetadata {
    key_fields: IndexSet<ObjectFieldDefinitionPosition>,
    shareable_fields: IndexSet<ObjectFieldDefinitionPosition>,
    external_metadata: ExternalMetadata,
    overrides: IndexMap<ObjectFieldDefinitionPosition, String>,
}

impl SubgraphMetadata {
    pub fn new(schema: &Schema) -> Result<Self, SchemaError> {
        let key_fields = Self::collect_key_fields(schema)?;
        let external_metadata = Self::collect_external_metadata(schema)?;
        let shareable_fields =
            Self::collect_shareable_fields(schema, &key_fields, &external_metadata)?;
        let overrides = Self::collect_overrides(schema)?;
        Ok(Self {
            key_fields,
            shareable_fields,
            external_metadata,
            overrides,
        })
    }

    pub fn external_metadata(&self) -> &ExternalMetadata {
        &self.external_metadata
    }

    /// A field is a key field iff it appears in a `@key(fields:)` selection
    /// on its parent type.
    pub fn is_field_key(&self, field: &ObjectFieldDefinitionPosition) -> bool {
        self.key_fields.contains(field)
    }

    /// A field is shareable iff `@shareable` is applied to it or its parent
    /// type, it is a key field, or it is an `@external` target of some
    /// `@provides` selection.
    pub fn is_field_shareable(&self, field: &ObjectFieldDefinitionPosition) -> bool {
        self.shareable_fields.contains(field)
    }

    pub fn is_field_external(&self, field: &ObjectFieldDefinitionPosition) -> bool {
        self.external_metadata.is_external(field)
    }

    /// Fields bearing `@override(from:)`, mapped to the named source
    /// subgraph.
    pub fn overrides(&self) -> &IndexMap<ObjectFieldDefinitionPosition, String> {
        &self.overrides
    }

    pub fn override_from(&self, field: &ObjectFieldDefinitionPosition) -> Option<&str> {
        self.overrides.get(field).map(String::as_str)
    }

    fn collect_key_fields(
        schema: &Schema,
    ) -> Result<IndexSet<ObjectFieldDefinitionPosition>, SchemaError> {
        let mut key_fields = IndexSet::new();
        for position in schema.get_types() {
            let TypeDefinitionPosition::Object(object_position) = position else {
                continue;
            };
            let directives = object_position.get(schema)?.directives().clone();
            for key_application in directives.get_all(KEY_DIRECTIVE_NAME.as_str()) {
                let Some(fields) = key_application
                    .argument(FIELDS_ARGUMENT_NAME.as_str())
                    .and_then(|value| value.as_str())
                else {
                    continue;
                };
                key_fields.extend(collect_target_fields_from_field_set(
                    schema,
                    object_position.type_name.clone(),
                    fields,
                )?);
            }
        }
        Ok(key_fields)
    }

    fn collect_external_metadata(schema: &Schema) -> Result<ExternalMetadata, SchemaError> {
        let mut external_fields = IndexSet::new();
        let mut fields_on_external_types = IndexSet::new();
        for (type_name, ty) in schema.types() {
            let NamedType::Object(object) = ty else {
                continue;
            };
            let object_position = ObjectTypeDefinitionPosition {
                type_name: type_name.clone(),
            };
            let type_is_external = object.directives().has(EXTERNAL_DIRECTIVE_NAME.as_str());
            for (field_name, field) in object.fields() {
                let position = object_position.field(field_name.clone());
                if field.directives().has(EXTERNAL_DIRECTIVE_NAME.as_str()) {
                    external_fields.insert(position.clone());
                }
                if type_is_external {
                    fields_on_external_types.insert(position);
                }
            }
        }
        Ok(ExternalMetadata {
            external_fields,
            fields_on_external_types,
        })
    }

    fn collect_shareable_fields(
        schema: &Schema,
        key_fields: &IndexSet<ObjectFieldDefinitionPosition>,
        external_metadata: &ExternalMetadata,
    ) -> Result<IndexSet<ObjectFieldDefinitionPosition>, SchemaError> {
        // Key fields are implicitly shareable.
        let mut shareable_fields = key_fields.clone();

        // Fields reachable from a @provides selection are shareable when the
        // target is external in this subgraph.
        shareable_fields.extend(
            Self::collect_provides_targets(schema)?
                .into_iter()
                .filter(|field| external_metadata.is_external(field)),
        );

        for (type_name, ty) in schema.types() {
            let NamedType::Object(object) = ty else {
                continue;
            };
            let object_position = ObjectTypeDefinitionPosition {
                type_name: type_name.clone(),
            };
            // Fields of @shareable object types are shareable.
            if object.directives().has(SHAREABLE_DIRECTIVE_NAME.as_str()) {
                shareable_fields.extend(
                    object
                        .fields()
                        .keys()
                        .map(|field_name| object_position.field(field_name.clone())),
                );
            }
            // Fields with @shareable directly applied are shareable.
            for (field_name, field) in object.fields() {
                if field.directives().has(SHAREABLE_DIRECTIVE_NAME.as_str()) {
                    shareable_fields.insert(object_position.field(field_name.clone()));
                }
            }
        }
        Ok(shareable_fields)
    }

    fn collect_provides_targets(
        schema: &Schema,
    ) -> Result<IndexSet<ObjectFieldDefinitionPosition>, SchemaError> {
        let mut provided_fields = IndexSet::new();
        for (_, ty) in schema.types() {
            let NamedType::Object(object) = ty else {
                continue;
            };
            for field in object.fields().values() {
                for provides_application in
                    field.directives().get_all(PROVIDES_DIRECTIVE_NAME.as_str())
                {
                    let Some(fields) = provides_application
                        .argument(FIELDS_ARGUMENT_NAME.as_str())
                        .and_then(|value| value.as_str())
                    else {
                        continue;
                    };
                    let Some(return_type) = field.ty() else {
                        continue;
                    };
                    provided_fields.extend(collect_target_fields_from_field_set(
                        schema,
                        return_type.base_type_name().clone(),
                        fields,
                    )?);
                }
            }
        }
        Ok(provided_fields)
    }

    fn collect_overrides(
        schema: &Schema,
    ) -> Result<IndexMap<ObjectFieldDefinitionPosition, String>, SchemaError> {
        let mut overrides = IndexMap::new();
        for (type_name, ty) in schema.types() {
            let NamedType::Object(object) = ty else {
                continue;
            };
            let object_position = ObjectTypeDefinitionPosition {
                type_name: type_name.clone(),
            };
            for (field_name, field) in object.fields() {
                let Some(application) = field.directives().get(OVERRIDE_DIRECTIVE_NAME.as_str())
                else {
                    continue;
                };
                let Some(from) = application
                    .argument(FROM_ARGUMENT_NAME.as_str())
                    .and_then(|value| value.as_str())
                else {
                    continue;
                };
                overrides.insert(object_position.field(field_name.clone()), from.to_owned());
            }
        }
        Ok(overrides)
    }
}

#[cfg(test)]
mod tests {
    use apollo_compiler::Name;

    use super::*;

    fn field(type_name: &str, field_name: &str) -> ObjectFieldDefinitionPosition {
        ObjectFieldDefinitionPosition {
            type_name: Name::new_unchecked(type_name),
            field_name: Name::new_unchecked(field_name),
        }
    }

    fn metadata_for(sdl: &str) -> SubgraphMetadata {
        let schema = Schema::parse(sdl, "subgraph.graphql").expect("valid schema");
        SubgraphMetadata::new(&schema).expect("metadata")
    }

    #[test]
    fn key_fields_are_collected_per_type() {
        let meta = metadata_for(
            r#"
            type Query { t: T }
            type T @key(fields: "k sub { x }") {
              k: ID
              sub: Sub
              other: Int
            }
            type Sub { x: Int }
            "#,
        );
        assert!(meta.is_field_key(&field("T", "k")));
        assert!(meta.is_field_key(&field("T", "sub")));
        assert!(meta.is_field_key(&field("Sub", "x")));
        assert!(!meta.is_field_key(&field("T", "other")));
    }

    #[test]
    fn shareable_fields_cover_all_four_sources() {
        let meta = metadata_for(
            r#"
            type Query { o1: O1 o2: O2 o3: O3 t: T }
            type O1 @shareable {
              a: Int
              b: Int
            }
            type O2 {
              c: Int
              d: Int @shareable
            }
            type O3 {
              provider: O4 @provides(fields: "externalField")
              plain: Int
            }
            type O4 {
              externalField: Int @external
              resolved: Int
            }
            type T @key(fields: "k") {
              k: ID
            }
            "#,
        );
        // Fields on @shareable object types are shareable.
        assert!(meta.is_field_shareable(&field("O1", "a")));
        assert!(meta.is_field_shareable(&field("O1", "b")));
        // Fields directly marked with @shareable are shareable.
        assert!(meta.is_field_shareable(&field("O2", "d")));
        assert!(!meta.is_field_shareable(&field("O2", "c")));
        // Fields marked @external and provided somewhere are shareable.
        assert!(meta.is_field_shareable(&field("O4", "externalField")));
        assert!(!meta.is_field_shareable(&field("O4", "resolved")));
        // Key fields are implicitly shareable.
        assert!(meta.is_field_shareable(&field("T", "k")));
        assert!(!meta.is_field_shareable(&field("O3", "plain")));
    }

    #[test]
    fn external_and_override_metadata() {
        let meta = metadata_for(
            r#"
            type Query { t: T }
            type T @key(fields: "k") {
              k: ID
              a: Int @override(from: "Subgraph2")
              b: Int @external
            }
            "#,
        );
        assert!(meta.is_field_external(&field("T", "b")));
        assert!(!meta.is_field_external(&field("T", "a")));
        assert_eq!(meta.override_from(&field("T", "a")), Some("Subgraph2"));
        assert_eq!(meta.override_from(&field("T", "k")), None);
        assert_eq!(meta.overrides().len(), 1);
    }
}
