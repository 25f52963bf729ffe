use apollo_compiler::ast;
use apollo_compiler::name;
use apollo_compiler::Name;
use apollo_compiler::Node;
use indexmap::IndexMap;

use federation_core::error::PlanError;
use federation_core::query_plan::collect_fields;
use federation_core::query_plan::key_fields;
use federation_core::query_plan::provided_fields;
use federation_core::query_plan::required_fields;
use federation_core::query_plan::FieldSet;
use federation_core::query_plan::QueryPlanningContext;
use federation_core::query_plan::Scope;
use federation_core::Supergraph;

/// A composed supergraph restricted to the subset the schema model parses
/// (applications of the join directives, no enum declarations).
const SUPERGRAPH: &str = r#"
type Query @join__type(graph: PRODUCTS) {
  products: [Product] @join__field(graph: PRODUCTS)
  search: [SearchResult] @join__field(graph: PRODUCTS)
}

type Product @join__type(graph: PRODUCTS, key: "upc") @join__type(graph: REVIEWS, key: "upc") {
  upc: ID
  name: String @join__field(graph: PRODUCTS)
  reviews: [Review] @join__field(graph: REVIEWS, requires: "name")
}

type Store @join__type(graph: PRODUCTS, key: "id") @join__type(graph: PRODUCTS, key: "name") {
  id: ID
  name: String
}

union SearchResult @join__type(graph: PRODUCTS) = Product | Store

type Review @join__type(graph: REVIEWS) {
  body: String
}
"#;

struct Planner {
    supergraph: Supergraph,
    document: ast::Document,
}

impl Planner {
    fn new(operation_text: &str) -> Self {
        let supergraph = Supergraph::parse(SUPERGRAPH).expect("supergraph should parse");
        let document =
            ast::Document::parse(operation_text, "operation.graphql").expect("operation parses");
        Self {
            supergraph,
            document,
        }
    }

    fn operation(&self) -> &ast::OperationDefinition {
        self.document
            .definitions
            .iter()
            .find_map(|definition| match definition {
                ast::Definition::OperationDefinition(operation) => Some(&**operation),
                _ => None,
            })
            .expect("document contains an operation")
    }

    fn fragments(&self) -> IndexMap<Name, &Node<ast::FragmentDefinition>> {
        self.document
            .definitions
            .iter()
            .filter_map(|definition| match definition {
                ast::Definition::FragmentDefinition(fragment) => {
                    Some((fragment.name.clone(), fragment))
                }
                _ => None,
            })
            .collect()
    }

    fn context(&self) -> QueryPlanningContext<'_> {
        QueryPlanningContext::new(&self.supergraph.schema, self.operation(), self.fragments())
    }

    fn scope(&self, type_name: &str) -> Scope {
        let composite = self
            .supergraph
            .schema
            .get_composite_type(Name::new_unchecked(type_name))
            .expect("composite type");
        Scope::create(&self.supergraph.schema, composite).expect("scope")
    }
}

fn coordinates(fields: &FieldSet) -> Vec<String> {
    fields.iter().map(|field| field.coordinate()).collect()
}

#[test]
fn collecting_an_empty_selection_yields_an_empty_field_set() {
    let planner = Planner::new("{ products { name } }");
    let context = planner.context();
    let scope = planner.scope("Product");
    let fields = collect_fields(&context, &scope, &[]).unwrap();
    assert!(fields.is_empty());
}

#[test]
fn collect_fields_is_shallow_and_ordered() {
    let planner = Planner::new("{ products { upc } search { __typename } }");
    let context = planner.context();
    let scope = planner.scope("Query");
    let fields = collect_fields(&context, &scope, &planner.operation().selection_set).unwrap();
    assert_eq!(coordinates(&fields), ["Query.products", "Query.search"]);
}

#[test]
fn inline_fragments_refine_the_scope() {
    let planner = Planner::new(
        r#"
        {
          search {
            ... on Product { name }
            ... on Store { id }
          }
        }
        "#,
    );
    let context = planner.context();
    let scope = planner.scope("SearchResult");
    let search_selection = match &planner.operation().selection_set[0] {
        ast::Selection::Field(field) => &field.selection_set,
        _ => panic!("expected a field"),
    };
    let fields = collect_fields(&context, &scope, search_selection).unwrap();
    assert_eq!(coordinates(&fields), ["Product.name", "Store.id"]);
    // Each collected field's scope narrowed to the fragment's condition.
    assert_eq!(
        fields[0]
            .scope
            .possible_runtime_types()
            .iter()
            .map(Name::as_str)
            .collect::<Vec<_>>(),
        ["Product"]
    );
}

#[test]
fn disjoint_fragment_conditions_yield_no_fields() {
    let planner = Planner::new("{ search { ... on Review { body } } }");
    let context = planner.context();
    let scope = planner.scope("SearchResult");
    let search_selection = match &planner.operation().selection_set[0] {
        ast::Selection::Field(field) => &field.selection_set,
        _ => panic!("expected a field"),
    };
    let fields = collect_fields(&context, &scope, search_selection).unwrap();
    assert!(
        fields.is_empty(),
        "Review is not a possible runtime type of SearchResult"
    );
}

#[test]
fn missing_fragment_spreads_are_skipped() {
    let planner = Planner::new("{ products { ...Missing upc } }");
    let context = planner.context();
    let scope = planner.scope("Product");
    let product_selection = match &planner.operation().selection_set[0] {
        ast::Selection::Field(field) => &field.selection_set,
        _ => panic!("expected a field"),
    };
    let fields = collect_fields(&context, &scope, product_selection).unwrap();
    assert_eq!(coordinates(&fields), ["Product.upc"]);
}

#[test]
fn named_fragments_collect_like_inline_ones() {
    let planner = Planner::new(
        r#"
        { search { ...ProductBits } }
        fragment ProductBits on Product { upc name }
        "#,
    );
    let context = planner.context();
    let scope = planner.scope("SearchResult");
    let search_selection = match &planner.operation().selection_set[0] {
        ast::Selection::Field(field) => &field.selection_set,
        _ => panic!("expected a field"),
    };
    let fields = collect_fields(&context, &scope, search_selection).unwrap();
    assert_eq!(coordinates(&fields), ["Product.upc", "Product.name"]);
}

#[test]
fn unknown_fields_fail_fast() {
    let planner = Planner::new("{ products { nope } }");
    let context = planner.context();
    let scope = planner.scope("Product");
    let err = context
        .field_def(scope.parent(), &name!("nope"))
        .unwrap_err();
    assert_eq!(
        err,
        PlanError::CannotQueryField {
            field_name: name!("nope"),
            type_name: name!("Product"),
        }
    );
    assert!(err.to_string().contains("Cannot query field \"nope\""));
}

#[test]
fn meta_fields_resolve_everywhere_they_should() {
    let planner = Planner::new("{ __typename }");
    let context = planner.context();

    // __typename works on any composite type, unions included.
    let search_scope = planner.scope("SearchResult");
    assert!(context
        .field_def(search_scope.parent(), &name!("__typename"))
        .is_ok());

    // __schema and __type only on the query root.
    let query_scope = planner.scope("Query");
    assert!(context
        .field_def(query_scope.parent(), &name!("__schema"))
        .is_ok());
    assert!(context
        .field_def(search_scope.parent(), &name!("__schema"))
        .is_err());
}

#[test]
fn variable_usages_traverse_fragments() {
    let planner = Planner::new(
        r#"
        query($skipName: Boolean, $limit: Int) {
          products { ...Bits }
        }
        fragment Bits on Product {
          upc @skip(if: $skipName)
          name
        }
        "#,
    );
    let context = planner.context();
    let usages = context.variable_usages(&planner.operation().selection_set);
    let names: Vec<&str> = usages.iter().map(Name::as_str).collect();
    assert_eq!(names, ["skipName"]);
    assert!(context.variable_definition(&name!("limit")).is_ok());
    assert!(context.variable_definition(&name!("unknown")).is_err());
}

#[test]
fn service_ownership_follows_join_directives() {
    let planner = Planner::new("{ products { name } }");
    let context = planner.context();
    let product = match planner.scope("Product").parent().clone() {
        federation_core::schema::position::CompositeTypeDefinitionPosition::Object(object) => {
            object
        }
        _ => panic!("Product is an object type"),
    };

    assert_eq!(context.base_service(&product).unwrap().as_str(), "PRODUCTS");

    let reviews_def = context
        .field_def(planner.scope("Product").parent(), &name!("reviews"))
        .unwrap();
    assert_eq!(
        context
            .owning_service(&product, &reviews_def)
            .unwrap()
            .as_str(),
        "REVIEWS"
    );

    // No join__field on the key field: ownership falls back to the base
    // service.
    let upc_def = context
        .field_def(planner.scope("Product").parent(), &name!("upc"))
        .unwrap();
    assert_eq!(
        context.owning_service(&product, &upc_def).unwrap().as_str(),
        "PRODUCTS"
    );
}

#[test]
fn key_fields_start_with_typename_and_respect_fetch_all() {
    let planner = Planner::new("{ search { __typename } }");
    let context = planner.context();
    let scope = planner.scope("SearchResult");
    let service = name!("PRODUCTS");

    let first_only = key_fields(&context, &scope, &service, false).unwrap();
    let all = key_fields(&context, &scope, &service, true).unwrap();

    assert_eq!(first_only[0].node.name.as_str(), "__typename");
    assert_eq!(
        coordinates(&first_only),
        [
            "SearchResult.__typename",
            "Product.upc",
            "Store.id",
        ]
    );
    // Store declares two keys for PRODUCTS; fetch_all picks both.
    assert_eq!(
        coordinates(&all),
        [
            "SearchResult.__typename",
            "Product.upc",
            "Store.id",
            "Store.name",
        ]
    );
    // fetch_all=true is a superset (by coordinate) of fetch_all=false.
    let first_set: std::collections::HashSet<String> =
        coordinates(&first_only).into_iter().collect();
    let all_set: std::collections::HashSet<String> = coordinates(&all).into_iter().collect();
    assert!(first_set.is_subset(&all_set));
}

#[test]
fn required_fields_are_keys_plus_the_requires_selection() {
    let planner = Planner::new("{ products { reviews { body } } }");
    let context = planner.context();
    let scope = planner.scope("Product");
    let reviews_def = context.field_def(scope.parent(), &name!("reviews")).unwrap();

    let required = required_fields(&context, &scope, &reviews_def, &name!("REVIEWS")).unwrap();
    assert_eq!(
        coordinates(&required),
        ["Product.__typename", "Product.upc", "Product.name"]
    );
}

#[test]
fn provided_fields_cover_the_return_type_keys() {
    let planner = Planner::new("{ products { upc } }");
    let context = planner.context();
    let query_scope = planner.scope("Query");
    let products_def = context
        .field_def(query_scope.parent(), &name!("products"))
        .unwrap();

    let provided = provided_fields(&context, &products_def, &name!("PRODUCTS")).unwrap();
    assert_eq!(
        coordinates(&provided),
        ["Product.__typename", "Product.upc"]
    );

    // Non-composite return types provide nothing.
    let upc_def = context
        .field_def(planner.scope("Product").parent(), &name!("upc"))
        .unwrap();
    assert!(provided_fields(&context, &upc_def, &name!("PRODUCTS"))
        .unwrap()
        .is_empty());
}
