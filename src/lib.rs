//! Core of a federated GraphQL query planner.
//!
//! Three tightly coupled parts: a mutable schema object model with
//! bidirectional references ([`schema`]), override-aware composition of
//! subgraph schemas into a supergraph ([`composition`]), and the planning
//! context / scope algebra / field collector that translate an incoming
//! selection set into per-service field sets ([`query_plan`]).

pub mod composition;
pub mod error;
pub mod query_plan;
pub mod schema;
pub mod subgraph;

pub use composition::compose;
pub use composition::CompositionSuccess;
pub use error::CompositionError;
pub use error::ErrorCode;
pub use error::PlanError;
pub use error::SchemaError;
pub use schema::FrozenSchema;
pub use schema::Schema;
pub use subgraph::Subgraph;

use schema::position::DirectiveDefinitionPosition;
use schema::position::SchemaDefinitionPosition;
use subgraph::spec::CORE_DIRECTIVE_NAME;
use subgraph::spec::CORE_PURPOSE_ENUM_NAME;
use subgraph::spec::JOIN_FIELD_DIRECTIVE_NAME;
use subgraph::spec::JOIN_FIELD_SET_SCALAR_NAME;
use subgraph::spec::JOIN_GRAPH_DIRECTIVE_NAME;
use subgraph::spec::JOIN_GRAPH_ENUM_NAME;
use subgraph::spec::JOIN_IMPLEMENTS_DIRECTIVE_NAME;
use subgraph::spec::JOIN_TYPE_DIRECTIVE_NAME;

/// A composed supergraph schema.
pub struct Supergraph {
    pub schema: FrozenSchema,
}

impl Supergraph {
    /// Wraps an already-composed supergraph document.
    pub fn parse(sdl: &str) -> Result<Self, SchemaError> {
        let schema = Schema::parse(sdl, "supergraph.graphql")?;
        Ok(Self {
            schema: schema.to_immutable(),
        })
    }

    /// Composes subgraphs and keeps the resulting schema.
    pub fn compose(subgraphs: Vec<Subgraph>) -> Result<Self, Vec<CompositionError>> {
        let success = composition::compose(subgraphs)?;
        Ok(Self {
            schema: success.schema,
        })
    }

    /// The API schema: a deep copy of the supergraph with the join/core
    /// machinery removed — internal types dropped and every join directive
    /// application stripped.
    pub fn to_api_schema(&self) -> Result<FrozenSchema, SchemaError> {
        let mut api_schema = self.schema.to_mutable();

        SchemaDefinitionPosition
            .remove_directive_name(&mut api_schema, CORE_DIRECTIVE_NAME.as_str())?;

        for type_name in [
            JOIN_FIELD_SET_SCALAR_NAME,
            JOIN_GRAPH_ENUM_NAME,
            CORE_PURPOSE_ENUM_NAME,
        ] {
            if let Some(position) = api_schema.try_get_type(type_name) {
                position.remove(&mut api_schema)?;
            }
        }

        for directive_name in [
            CORE_DIRECTIVE_NAME,
            JOIN_TYPE_DIRECTIVE_NAME,
            JOIN_FIELD_DIRECTIVE_NAME,
            JOIN_GRAPH_DIRECTIVE_NAME,
            JOIN_IMPLEMENTS_DIRECTIVE_NAME,
        ] {
            DirectiveDefinitionPosition {
                directive_name: directive_name.clone(),
            }
            .remove(&mut api_schema)?;
        }

        Ok(api_schema.to_immutable())
    }
}

impl From<FrozenSchema> for Supergraph {
    fn from(schema: FrozenSchema) -> Self {
        Self { schema }
    }
}
