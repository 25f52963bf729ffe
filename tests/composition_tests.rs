use federation_core::composition::compose;
use federation_core::composition::HintCode;
use federation_core::error::ErrorCode;
use federation_core::schema::NamedType;
use federation_core::subgraph::Subgraph;
use federation_core::Supergraph;

fn subgraph(name: &str, type_defs: &str) -> Subgraph {
    Subgraph::parse(name, &format!("https://{name}"), type_defs)
        .unwrap_or_else(|err| panic!("subgraph {name} should parse: {err}"))
}

fn field_directive_strings(
    schema: &federation_core::Schema,
    type_name: &str,
    field_name: &str,
) -> Vec<String> {
    let Some(NamedType::Object(object)) = schema
        .types()
        .find(|(name, _)| name.as_str() == type_name)
        .map(|(_, ty)| ty)
    else {
        panic!("{type_name} should be an object type");
    };
    object.fields()[field_name]
        .directives()
        .iter()
        .map(|directive| directive.to_string())
        .collect()
}

#[test]
fn override_moves_field_resolution_to_the_overriding_subgraph() {
    // Scenario: Subgraph1 overrides T.a; Subgraph2 keeps T.b.
    let result = compose(vec![
        subgraph(
            "Subgraph1",
            r#"
            type Query { t: T }
            type T @key(fields: "k") {
              k: ID
              a: Int @override(from: "Subgraph2")
            }
            "#,
        ),
        subgraph(
            "Subgraph2",
            r#"
            type T @key(fields: "k") {
              k: ID
              a: Int
              b: String
            }
            "#,
        ),
    ])
    .expect("composition should succeed");

    assert_eq!(
        field_directive_strings(&result.schema, "T", "a"),
        ["@join__field(graph: SUBGRAPH1)"]
    );
    assert_eq!(
        field_directive_strings(&result.schema, "T", "b"),
        ["@join__field(graph: SUBGRAPH2)"]
    );
    // The key field is resolved by both subgraphs and carries no join__field.
    assert_eq!(
        field_directive_strings(&result.schema, "T", "k"),
        Vec::<String>::new()
    );

    assert!(result
        .supergraph_sdl
        .contains("a: Int @join__field(graph: SUBGRAPH1)"));
    assert!(result
        .supergraph_sdl
        .contains("b: String @join__field(graph: SUBGRAPH2)"));
    assert!(result
        .supergraph_sdl
        .contains("SUBGRAPH2 @join__graph(name: \"Subgraph2\", url: \"https://Subgraph2\")"));

    assert_eq!(result.hints.len(), 1);
    assert_eq!(result.hints[0].code, HintCode::OverriddenFieldCanBeRemoved);

    // The API schema exposes T with all three fields and no join machinery.
    let api_schema = Supergraph::from(result.schema.clone())
        .to_api_schema()
        .expect("api schema");
    let Some(NamedType::Object(t)) = api_schema
        .types()
        .find(|(name, _)| name.as_str() == "T")
        .map(|(_, ty)| ty)
    else {
        panic!("T should survive in the API schema");
    };
    let field_names: Vec<&str> = t.fields().keys().map(|name| name.as_str()).collect();
    assert_eq!(field_names, ["k", "a", "b"]);
    assert!(t.fields().values().all(|field| field.directives().is_empty()));
}

#[test]
fn override_from_self_is_an_error() {
    let errors = compose(vec![subgraph(
        "Subgraph1",
        r#"
        type Query { t: T }
        type T @key(fields: "k") {
          k: ID
          a: Int @override(from: "Subgraph1")
        }
        "#,
    )])
    .expect_err("composition should fail");

    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].code(), ErrorCode::OverrideFromSelfError);
    assert_eq!(errors[0].code_string(), "OVERRIDE_FROM_SELF_ERROR");
    insta::assert_snapshot!(
        errors[0].to_string(),
        @r#"Source and destination subgraphs "Subgraph1" are the same for overridden field "T.a""#
    );
}

#[test]
fn two_way_override_reports_both_sides_and_the_sharing_conflict() {
    let errors = compose(vec![
        subgraph(
            "Subgraph1",
            r#"
            type Query { t: T }
            type T @key(fields: "k") {
              k: ID
              a: Int @override(from: "Subgraph2")
            }
            "#,
        ),
        subgraph(
            "Subgraph2",
            r#"
            type T @key(fields: "k") {
              k: ID
              a: Int @override(from: "Subgraph1")
            }
            "#,
        ),
    ])
    .expect_err("composition should fail");

    let codes: Vec<ErrorCode> = errors.iter().map(|error| error.code()).collect();
    assert_eq!(
        codes
            .iter()
            .filter(|code| **code == ErrorCode::OverrideSourceHasOverride)
            .count(),
        2,
        "one OVERRIDE_SOURCE_HAS_OVERRIDE per side: {errors:?}"
    );
    assert_eq!(
        codes
            .iter()
            .filter(|code| **code == ErrorCode::InvalidFieldSharing)
            .count(),
        1,
        "the un-rewritten field is shared without being shareable: {errors:?}"
    );
    assert_eq!(errors.len(), 3);

    let sharing_message = errors
        .iter()
        .find(|error| error.code() == ErrorCode::InvalidFieldSharing)
        .expect("sharing error present")
        .to_string();
    assert!(sharing_message.contains("\"T.a\""));
    assert!(sharing_message.contains("\"Subgraph1\" and \"Subgraph2\""));
}

#[test]
fn overriding_a_key_field_keeps_it_external_in_the_source_subgraph() {
    let result = compose(vec![
        subgraph(
            "Subgraph1",
            r#"
            type Query { t: T }
            type T @key(fields: "k") {
              k: ID @override(from: "Subgraph2")
              a: Int
            }
            "#,
        ),
        subgraph(
            "Subgraph2",
            r#"
            type T @key(fields: "k") {
              k: ID
              b: String
            }
            "#,
        ),
    ])
    .expect("composition should succeed");

    assert_eq!(
        field_directive_strings(&result.schema, "T", "k"),
        [
            "@join__field(graph: SUBGRAPH1)",
            "@join__field(graph: SUBGRAPH2, external: true)"
        ]
    );
    assert_eq!(
        field_directive_strings(&result.schema, "T", "a"),
        ["@join__field(graph: SUBGRAPH1)"]
    );
    assert_eq!(
        field_directive_strings(&result.schema, "T", "b"),
        ["@join__field(graph: SUBGRAPH2)"]
    );
    assert_eq!(result.hints.len(), 1);
    assert_eq!(
        result.hints[0].code,
        HintCode::OverriddenFieldCanBeMadeExternal
    );
}

#[test]
fn overriding_an_external_field_is_a_collision() {
    let errors = compose(vec![
        subgraph(
            "Subgraph1",
            r#"
            type Query { t: T }
            type T @key(fields: "k") {
              k: ID
              a: Int @override(from: "Subgraph2")
            }
            "#,
        ),
        subgraph(
            "Subgraph2",
            r#"
            type T @key(fields: "k") {
              k: ID
              a: Int @external
            }
            "#,
        ),
    ])
    .expect_err("composition should fail");

    assert_eq!(errors.len(), 1);
    assert_eq!(
        errors[0].code(),
        ErrorCode::OverrideCollisionWithAnotherDirective
    );
    let message = errors[0].to_string();
    assert!(message.contains("@external"), "{message}");
    assert!(message.contains("Subgraph2"), "{message}");
}

#[test]
fn override_on_an_external_field_is_a_collision() {
    let errors = compose(vec![
        subgraph(
            "Subgraph1",
            r#"
            type Query { t: T }
            type T @key(fields: "k") {
              k: ID
              a: Int @override(from: "Subgraph2") @external
            }
            "#,
        ),
        subgraph(
            "Subgraph2",
            r#"
            type T @key(fields: "k") {
              k: ID
              a: Int
            }
            "#,
        ),
    ])
    .expect_err("composition should fail");

    assert!(errors
        .iter()
        .any(|error| error.code() == ErrorCode::OverrideCollisionWithAnotherDirective));
    let message = errors
        .iter()
        .find(|error| error.code() == ErrorCode::OverrideCollisionWithAnotherDirective)
        .expect("collision error present")
        .to_string();
    assert!(message.contains("@external"), "{message}");
    assert!(
        message.contains("on subgraph \"Subgraph1\""),
        "the overriding side is at fault: {message}"
    );
}

#[test]
fn type_mismatches_silently_favor_the_overriding_subgraph() {
    let result = compose(vec![
        subgraph(
            "Subgraph1",
            r#"
            type Query { t: T }
            type T @key(fields: "k") {
              k: ID
              a: Int @override(from: "Subgraph2")
            }
            "#,
        ),
        subgraph(
            "Subgraph2",
            r#"
            type T @key(fields: "k") {
              k: ID
              a: String
            }
            "#,
        ),
    ])
    .expect("composition should succeed");

    assert!(result
        .supergraph_sdl
        .contains("a: Int @join__field(graph: SUBGRAPH1)"));

    let api_schema = Supergraph::from(result.schema.clone())
        .to_api_schema()
        .expect("api schema");
    let Some(NamedType::Object(t)) = api_schema
        .types()
        .find(|(name, _)| name.as_str() == "T")
        .map(|(_, ty)| ty)
    else {
        panic!("T should be an object type");
    };
    assert_eq!(t.fields()["a"].ty().unwrap().to_string(), "Int");
}

#[test]
fn root_fields_always_name_their_source_subgraph() {
    let result = compose(vec![
        subgraph("Subgraph1", "type Query { one: Int }"),
        subgraph("Subgraph2", "type Query { two: Int }"),
    ])
    .expect("composition should succeed");

    assert_eq!(
        field_directive_strings(&result.schema, "Query", "one"),
        ["@join__field(graph: SUBGRAPH1)"]
    );
    assert_eq!(
        field_directive_strings(&result.schema, "Query", "two"),
        ["@join__field(graph: SUBGRAPH2)"]
    );
}

#[test]
fn requires_and_provides_are_carried_onto_join_field() {
    let result = compose(vec![
        subgraph(
            "Products",
            r#"
            type Query { products: [Product] }
            type Product @key(fields: "upc") {
              upc: ID
              name: String
            }
            "#,
        ),
        subgraph(
            "Reviews",
            r#"
            type Product @key(fields: "upc") {
              upc: ID
              name: String @external
              reviews: [Review] @requires(fields: "name")
            }
            type Review { body: String }
            "#,
        ),
    ])
    .expect("composition should succeed");

    assert_eq!(
        field_directive_strings(&result.schema, "Product", "reviews"),
        ["@join__field(graph: REVIEWS, requires: \"name\")"]
    );
    assert_eq!(
        field_directive_strings(&result.schema, "Product", "name"),
        [
            "@join__field(graph: PRODUCTS)",
            "@join__field(graph: REVIEWS, external: true)"
        ]
    );
}

#[test]
fn supergraph_carries_the_core_and_join_surface() {
    let result = compose(vec![subgraph("Subgraph1", "type Query { x: Int }")])
        .expect("composition should succeed");

    let sdl = &result.supergraph_sdl;
    assert!(sdl.contains("@core(feature: \"https://specs.apollo.dev/core/v0.2\")"));
    assert!(sdl.contains("@core(feature: \"https://specs.apollo.dev/join/v0.1\", for: EXECUTION)"));
    assert!(sdl.contains("directive @join__field(graph: join__Graph!"));
    assert!(sdl.contains("directive @join__type(graph: join__Graph!"));
    assert!(sdl.contains("directive @join__graph(name: String!, url: String!) on ENUM_VALUE"));
    assert!(sdl.contains("directive @join__implements(graph: join__Graph!"));
    assert!(sdl.contains("enum core__Purpose"));
    assert!(sdl.contains("scalar join__FieldSet"));
    assert!(sdl.contains("enum join__Graph {"));
    assert!(sdl.contains("SUBGRAPH1 @join__graph(name: \"Subgraph1\", url: \"https://Subgraph1\")"));
    assert!(sdl.contains("schema\n  @core("));
    assert!(sdl.contains("query: Query"));
}

#[test]
fn composition_is_deterministic() {
    let compose_once = || {
        compose(vec![
            subgraph(
                "Subgraph1",
                r#"
                type Query { t: T }
                type T @key(fields: "k") { k: ID a: Int }
                "#,
            ),
            subgraph(
                "Subgraph2",
                r#"
                type T @key(fields: "k") { k: ID b: Int }
                union U = T
                "#,
            ),
        ])
        .expect("composition should succeed")
        .supergraph_sdl
    };
    assert_eq!(compose_once(), compose_once());
}

#[test]
fn pre_merge_validations_reject_bad_subgraph_lists() {
    let errors = compose(vec![]).expect_err("empty list should fail");
    assert_eq!(errors.len(), 1);
    assert!(errors[0].to_string().contains("empty subgraph list"));

    let errors = compose(vec![
        subgraph("Dup", "type Query { x: Int }"),
        subgraph("Dup", "type Query { y: Int }"),
    ])
    .expect_err("duplicate names should fail");
    assert_eq!(errors[0].code(), ErrorCode::InvalidSubgraphName);
}
