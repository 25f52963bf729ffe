//! Subgraphs: the inputs of composition.

use apollo_compiler::ast;
use apollo_compiler::Name;
use tracing::trace;

use crate::error::SchemaError;
use crate::schema::Schema;

pub mod metadata;
pub mod spec;

/// One subgraph: a service name, its routing URL, and its schema.
#[derive(Debug, Clone)]
pub struct Subgraph {
    pub name: String,
    pub url: String,
    pub schema: Schema,
}

impl Subgraph {
    pub fn new(name: &str, url: &str, schema: Schema) -> Self {
        Self {
            name: name.to_owned(),
            url: url.to_owned(),
            schema,
        }
    }

    /// Parses a subgraph from its SDL.
    pub fn parse(name: &str, url: &str, type_defs: &str) -> Result<Self, SchemaError> {
        trace!("parsing subgraph `{name}`");
        let schema = Schema::parse(type_defs, &format!("{name}.graphql"))?;
        Ok(Self::new(name, url, schema))
    }

    /// Builds a subgraph from an already-parsed document.
    pub fn from_ast(name: &str, url: &str, type_defs: &ast::Document) -> Result<Self, SchemaError> {
        let schema = Schema::from_ast(type_defs)?;
        Ok(Self::new(name, url, schema))
    }

    /// The `join__Graph` enum value identifying this subgraph in a
    /// supergraph.
    pub fn graph_enum_name(&self) -> Name {
        spec::graph_enum_name(&self.name)
    }
}
