//! Deterministic SDL printing.
//!
//! Output order is insertion order throughout, so printing a schema twice (or
//! printing a parsed copy of printed output) yields identical text on the
//! supported subset.

use std::fmt::Write;

use itertools::Itertools;

use crate::schema::values::DirectiveList;
use crate::schema::ArgumentDefinition;
use crate::schema::FieldDefinition;
use crate::schema::InputFieldDefinition;
use crate::schema::NamedType;
use crate::schema::Schema;

impl Schema {
    /// Prints the schema as SDL: the schema definition (when non-empty),
    /// directive definitions, then types, all in insertion order.
    pub fn to_sdl(&self) -> String {
        let mut blocks: Vec<String> = Vec::new();

        if !self.schema_definition.is_empty() {
            blocks.push(self.print_schema_definition());
        }
        blocks.extend(self.type_definition_blocks());

        let mut sdl = blocks.join("\n\n");
        sdl.push('\n');
        sdl
    }

    /// The directive-definition and type blocks, without the schema
    /// definition. Used when assembling a supergraph document around a
    /// printed preamble.
    pub(crate) fn type_definition_blocks(&self) -> Vec<String> {
        let mut blocks: Vec<String> = Vec::new();
        for definition in self.directive_definitions.values() {
            blocks.push(print_directive_definition(definition));
        }
        for ty in self.types.values() {
            blocks.push(print_type(ty));
        }
        blocks
    }

    pub(crate) fn print_schema_definition(&self) -> String {
        let mut out = String::from("schema");
        write_block_directives(&mut out, &self.schema_definition.directives);
        out.push_str(" {\n");
        if let Some(query) = &self.schema_definition.query {
            let _ = writeln!(out, "  query: {query}");
        }
        if let Some(mutation) = &self.schema_definition.mutation {
            let _ = writeln!(out, "  mutation: {mutation}");
        }
        if let Some(subscription) = &self.schema_definition.subscription {
            let _ = writeln!(out, "  subscription: {subscription}");
        }
        out.push('}');
        out
    }
}

/// Appends applied directives, one per line when present, then leaves the
/// cursor ready for the block opener.
fn write_block_directives(out: &mut String, directives: &DirectiveList) {
    for directive in directives.iter() {
        let _ = write!(out, "\n  {directive}");
    }
    if !directives.is_empty() {
        out.push('\n');
    }
}

fn print_type(ty: &NamedType) -> String {
    match ty {
        NamedType::Scalar(scalar) => {
            let mut out = format!("scalar {}", scalar.name);
            if !scalar.directives.is_empty() {
                let _ = write!(out, " {}", scalar.directives);
            }
            out
        }
        NamedType::Object(object) => {
            let mut out = format!("type {}", object.name);
            write_block_directives(&mut out, &object.directives);
            if object.directives.is_empty() {
                out.push(' ');
            }
            out.push_str("{\n");
            for field in object.fields.values() {
                let _ = writeln!(out, "  {}", print_field(field));
            }
            out.push('}');
            out
        }
        NamedType::Union(union) => {
            let mut out = format!("union {}", union.name);
            write_block_directives(&mut out, &union.directives);
            if union.directives.is_empty() {
                out.push(' ');
            }
            let _ = write!(out, "= {}", union.members.iter().format(" | "));
            out
        }
        NamedType::InputObject(input_object) => {
            let mut out = format!("input {}", input_object.name);
            write_block_directives(&mut out, &input_object.directives);
            if input_object.directives.is_empty() {
                out.push(' ');
            }
            out.push_str("{\n");
            for field in input_object.fields.values() {
                let _ = writeln!(out, "  {}", print_input_field(field));
            }
            out.push('}');
            out
        }
    }
}

fn print_field(field: &FieldDefinition) -> String {
    let mut out = field.name.to_string();
    if !field.arguments.is_empty() {
        let _ = write!(
            out,
            "({})",
            field
                .arguments
                .values()
                .map(print_argument_definition)
                .format(", ")
        );
    }
    match &field.ty {
        Some(ty) => {
            let _ = write!(out, ": {ty}");
        }
        None => out.push_str(": "),
    }
    if !field.directives.is_empty() {
        let _ = write!(out, " {}", field.directives);
    }
    out
}

fn print_input_field(field: &InputFieldDefinition) -> String {
    let mut out = field.name.to_string();
    match &field.ty {
        Some(ty) => {
            let _ = write!(out, ": {ty}");
        }
        None => out.push_str(": "),
    }
    if let Some(default_value) = &field.default_value {
        let _ = write!(out, " = {default_value}");
    }
    if !field.directives.is_empty() {
        let _ = write!(out, " {}", field.directives);
    }
    out
}

fn print_argument_definition(argument: &ArgumentDefinition) -> String {
    let mut out = argument.name.to_string();
    match &argument.ty {
        Some(ty) => {
            let _ = write!(out, ": {ty}");
        }
        None => out.push_str(": "),
    }
    if let Some(default_value) = &argument.default_value {
        let _ = write!(out, " = {default_value}");
    }
    out
}

fn print_directive_definition(definition: &crate::schema::DirectiveDefinition) -> String {
    let mut out = format!("directive @{}", definition.name);
    if !definition.arguments.is_empty() {
        let _ = write!(
            out,
            "({})",
            definition
                .arguments
                .values()
                .map(print_argument_definition)
                .format(", ")
        );
    }
    if definition.repeatable {
        out.push_str(" repeatable");
    }
    if !definition.locations.is_empty() {
        let _ = write!(out, " on {}", definition.locations.iter().format(" | "));
    }
    out
}

#[cfg(test)]
mod tests {
    use crate::schema::Schema;

    const ROUND_TRIP_SCHEMA: &str = r#"
        schema {
          query: Query
        }

        directive @join__field(graph: join__Graph, external: Boolean) repeatable on FIELD_DEFINITION | INPUT_FIELD_DEFINITION

        scalar join__FieldSet

        scalar join__Graph

        type Query {
          t(id: ID): T
        }

        type T @join__type(graph: SUBGRAPH1, key: "k") @join__type(graph: SUBGRAPH2, key: "k") {
          k: ID
          a: Int @join__field(graph: SUBGRAPH2)
        }

        union V = T | Query
    "#;

    #[test]
    fn parse_print_parse_is_identity() {
        let schema = Schema::parse(ROUND_TRIP_SCHEMA, "schema.graphql").unwrap();
        let printed = schema.to_sdl();
        let reparsed = Schema::parse(&printed, "printed.graphql").unwrap();
        assert_eq!(schema, reparsed);
    }

    #[test]
    fn print_is_a_fixpoint() {
        let schema = Schema::parse(ROUND_TRIP_SCHEMA, "schema.graphql").unwrap();
        let printed = schema.to_sdl();
        let printed_again = Schema::parse(&printed, "printed.graphql").unwrap().to_sdl();
        assert_eq!(printed, printed_again);
    }

    #[test]
    fn join_directive_applications_survive_round_trips_byte_identical() {
        let schema = Schema::parse(ROUND_TRIP_SCHEMA, "schema.graphql").unwrap();
        let printed = schema.to_sdl();
        assert!(printed.contains(r#"@join__type(graph: SUBGRAPH1, key: "k")"#));
        assert!(printed.contains(r#"@join__type(graph: SUBGRAPH2, key: "k")"#));
        assert!(printed.contains("a: Int @join__field(graph: SUBGRAPH2)"));
    }
}
