//! Names and definitions of the federation and supergraph (join/core)
//! directive surfaces.

use apollo_compiler::name;
use apollo_compiler::Name;

pub const KEY_DIRECTIVE_NAME: Name = name!("key");
pub const SHAREABLE_DIRECTIVE_NAME: Name = name!("shareable");
pub const OVERRIDE_DIRECTIVE_NAME: Name = name!("override");
pub const EXTERNAL_DIRECTIVE_NAME: Name = name!("external");
pub const PROVIDES_DIRECTIVE_NAME: Name = name!("provides");
pub const REQUIRES_DIRECTIVE_NAME: Name = name!("requires");

pub const FIELDS_ARGUMENT_NAME: Name = name!("fields");
pub const FROM_ARGUMENT_NAME: Name = name!("from");

pub const FEDERATION_DIRECTIVE_NAMES: [Name; 6] = [
    KEY_DIRECTIVE_NAME,
    SHAREABLE_DIRECTIVE_NAME,
    OVERRIDE_DIRECTIVE_NAME,
    EXTERNAL_DIRECTIVE_NAME,
    PROVIDES_DIRECTIVE_NAME,
    REQUIRES_DIRECTIVE_NAME,
];

// Supergraph surface.
pub const CORE_DIRECTIVE_NAME: Name = name!("core");
pub const JOIN_TYPE_DIRECTIVE_NAME: Name = name!("join__type");
pub const JOIN_FIELD_DIRECTIVE_NAME: Name = name!("join__field");
pub const JOIN_GRAPH_DIRECTIVE_NAME: Name = name!("join__graph");
pub const JOIN_IMPLEMENTS_DIRECTIVE_NAME: Name = name!("join__implements");
pub const JOIN_GRAPH_ENUM_NAME: Name = name!("join__Graph");
pub const JOIN_FIELD_SET_SCALAR_NAME: Name = name!("join__FieldSet");
pub const CORE_PURPOSE_ENUM_NAME: Name = name!("core__Purpose");

pub const GRAPH_ARGUMENT_NAME: Name = name!("graph");
pub const KEY_ARGUMENT_NAME: Name = name!("key");
pub const EXTERNAL_ARGUMENT_NAME: Name = name!("external");
pub const REQUIRES_ARGUMENT_NAME: Name = name!("requires");
pub const PROVIDES_ARGUMENT_NAME: Name = name!("provides");
pub const FEATURE_ARGUMENT_NAME: Name = name!("feature");
pub const FOR_ARGUMENT_NAME: Name = name!("for");

pub const CORE_FEATURE_URL: &str = "https://specs.apollo.dev/core/v0.2";
pub const JOIN_FEATURE_URL: &str = "https://specs.apollo.dev/join/v0.1";

/// The directive and type declarations every emitted supergraph carries.
/// These reference enums and non-null wrappers, which the schema object model
/// does not represent, so they live in printed form and are spliced into the
/// supergraph SDL ahead of the merged types.
pub const SUPERGRAPH_PREAMBLE: &str = r#"directive @core(feature: String!, as: String, for: core__Purpose) repeatable on SCHEMA

directive @join__field(graph: join__Graph!, requires: join__FieldSet, provides: join__FieldSet, type: String, external: Boolean) repeatable on FIELD_DEFINITION | INPUT_FIELD_DEFINITION

directive @join__graph(name: String!, url: String!) on ENUM_VALUE

directive @join__implements(graph: join__Graph!, interface: String!) repeatable on OBJECT | INTERFACE

directive @join__type(graph: join__Graph!, key: join__FieldSet, extension: Boolean! = false) repeatable on OBJECT | INTERFACE | UNION | ENUM | INPUT_OBJECT | SCALAR

enum core__Purpose {
  SECURITY
  EXECUTION
}"#;

/// The `join__Graph` enum value for a subgraph name: uppercased, with every
/// character outside `[A-Za-z0-9]` replaced by an underscore, and prefixed
/// with an underscore when the result would start with a digit.
pub fn graph_enum_name(subgraph_name: &str) -> Name {
    let mut out = String::with_capacity(subgraph_name.len());
    for ch in subgraph_name.chars() {
        if ch.is_ascii_alphanumeric() {
            out.push(ch.to_ascii_uppercase());
        } else {
            out.push('_');
        }
    }
    if out.is_empty() || out.starts_with(|c: char| c.is_ascii_digit()) {
        out.insert(0, '_');
    }
    Name::new_unchecked(&out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn graph_enum_names_are_sanitized() {
        assert_eq!(graph_enum_name("Subgraph1").as_str(), "SUBGRAPH1");
        assert_eq!(graph_enum_name("my-service.prod").as_str(), "MY_SERVICE_PROD");
        assert_eq!(graph_enum_name("1shot").as_str(), "_1SHOT");
    }
}
