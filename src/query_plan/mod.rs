//! The query-planning core: the planning context over a composed schema, the
//! scope algebra tracking type refinements, and the field collector that
//! flattens selection sets into per-scope field sets.

use apollo_compiler::ast;
use apollo_compiler::Node;

use crate::schema::FieldDefinition;

pub mod collect;
pub mod context;
pub mod scope;

pub use collect::collect_fields;
pub use collect::key_fields;
pub use collect::provided_fields;
pub use collect::required_fields;
pub use context::QueryPlanningContext;
pub use scope::Scope;

/// One collected field: the scope it was collected under, the field node
/// from the operation (or a synthesized one, for `__typename` and field-set
/// expansions), and its resolved definition.
#[derive(Debug, Clone)]
pub struct CollectedField {
    pub scope: Scope,
    pub node: Node<ast::Field>,
    pub definition: FieldDefinition,
}

impl CollectedField {
    /// The `Type.field` coordinate of this entry.
    pub fn coordinate(&self) -> String {
        format!("{}.{}", self.scope.parent().type_name(), self.node.name)
    }
}

/// An ordered, flattened selection: the planner's unit of work.
pub type FieldSet = Vec<CollectedField>;
