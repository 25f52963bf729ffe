//! The scope algebra: a chain of type refinements produced by nested
//! fragments, tracking the set of possible runtime types at a selection
//! point.

use std::collections::hash_map::DefaultHasher;
use std::hash::Hash;
use std::hash::Hasher;
use std::sync::Arc;

use apollo_compiler::Name;
use indexmap::IndexSet;
use itertools::Itertools;

use crate::error::PlanError;
use crate::schema::position::CompositeTypeDefinitionPosition;
use crate::schema::values::DirectiveList;
use crate::schema::Schema;

#[derive(Debug)]
struct ScopeInner {
    parent: CompositeTypeDefinitionPosition,
    /// Directives attached to the fragment that produced this refinement.
    /// An empty list is normalized to `None`.
    directives: Option<DirectiveList>,
    enclosing: Option<Scope>,
    /// Intersection of the possible runtime types along the chain, computed
    /// at construction so reads never recompute it.
    possible_types: IndexSet<Name>,
}

/// A linked chain of type refinements. Cheap to clone; refinement returns a
/// new scope sharing the tail.
#[derive(Debug, Clone)]
pub struct Scope {
    inner: Arc<ScopeInner>,
}

impl Scope {
    /// The root scope over a composite type.
    pub fn create(
        schema: &Schema,
        parent: CompositeTypeDefinitionPosition,
    ) -> Result<Scope, PlanError> {
        let possible_types = possible_type_names(schema, &parent)?;
        Ok(Scope {
            inner: Arc::new(ScopeInner {
                parent,
                directives: None,
                enclosing: None,
                possible_types,
            }),
        })
    }

    pub fn parent(&self) -> &CompositeTypeDefinitionPosition {
        &self.inner.parent
    }

    pub fn directives(&self) -> Option<&DirectiveList> {
        self.inner.directives.as_ref()
    }

    pub fn enclosing(&self) -> Option<&Scope> {
        self.inner.enclosing.as_ref()
    }

    /// The object type names a value in this scope may have at runtime: the
    /// intersection of the possible types of every refinement in the chain.
    pub fn possible_runtime_types(&self) -> &IndexSet<Name> {
        &self.inner.possible_types
    }

    /// Pushes a refinement onto the chain.
    ///
    /// An empty directive list counts as absent. A directive-less refinement
    /// that does not strictly refine the scope (some link in the chain is
    /// already a sub-type of the condition) returns the scope unchanged.
    /// Otherwise older directive-less links made redundant by the new
    /// condition (their parent is a super-type of it) are pruned.
    pub fn refine(
        &self,
        schema: &Schema,
        parent: CompositeTypeDefinitionPosition,
        directives: Option<DirectiveList>,
    ) -> Result<Scope, PlanError> {
        let directives = directives.filter(|list| !list.is_empty());

        if directives.is_none() {
            let mut link = Some(self);
            while let Some(scope) = link {
                if schema.is_subtype(&parent, scope.parent())? {
                    return Ok(self.clone());
                }
                link = scope.enclosing();
            }
        }

        // Rebuild the chain oldest-first, dropping redundant links.
        let mut links: Vec<&Scope> = Vec::new();
        let mut link = Some(self);
        while let Some(scope) = link {
            links.push(scope);
            link = scope.enclosing();
        }
        let mut rebuilt: Option<Scope> = None;
        for scope in links.into_iter().rev() {
            if scope.directives().is_none() && schema.is_subtype(scope.parent(), &parent)? {
                continue;
            }
            rebuilt = Some(push_link(
                schema,
                rebuilt,
                scope.parent().clone(),
                scope.inner.directives.clone(),
            )?);
        }
        Ok(push_link(schema, rebuilt, parent, directives)?)
    }

    /// A canonical string usable as a map key wherever reference-identity
    /// maps would be wrong: the parent type name, the ordered possible
    /// runtime types, and the canonicalized directives of every link.
    pub fn identity_key(&self) -> String {
        let mut key = format!(
            "{}[{}]",
            self.parent().type_name(),
            self.possible_runtime_types().iter().format(", ")
        );
        let mut link = Some(self);
        while let Some(scope) = link {
            if let Some(directives) = scope.directives() {
                key.push('|');
                key.push_str(
                    &directives
                        .iter()
                        .map(|directive| directive.canonical_text())
                        .format(" ")
                        .to_string(),
                );
            }
            link = scope.enclosing();
        }
        key
    }

    /// Structural comparison, walking both chains in lockstep. Directive
    /// comparison is argument-order-insensitive.
    pub fn equals(&self, other: &Scope) -> bool {
        let mut left = Some(self);
        let mut right = Some(other);
        loop {
            match (left, right) {
                (None, None) => return true,
                (Some(l), Some(r)) => {
                    if l.parent().type_name() != r.parent().type_name() {
                        return false;
                    }
                    if l.inner.directives != r.inner.directives {
                        return false;
                    }
                    left = l.enclosing();
                    right = r.enclosing();
                }
                _ => return false,
            }
        }
    }

    /// Combines the parent type name's hash with a symmetric hash over the
    /// chain's directive texts, truncated to 32 bits. Symmetry makes the
    /// directive contribution independent of argument order.
    pub fn hash(&self) -> u32 {
        let mut hasher = DefaultHasher::new();
        self.parent().type_name().hash(&mut hasher);
        let mut combined = hasher.finish();

        let mut link = Some(self);
        while let Some(scope) = link {
            if let Some(directives) = scope.directives() {
                for directive in directives.iter() {
                    let mut hasher = DefaultHasher::new();
                    directive.canonical_text().hash(&mut hasher);
                    combined ^= hasher.finish();
                }
            }
            link = scope.enclosing();
        }
        combined as u32
    }
}

impl PartialEq for Scope {
    fn eq(&self, other: &Self) -> bool {
        self.equals(other)
    }
}

impl Eq for Scope {}

fn push_link(
    schema: &Schema,
    enclosing: Option<Scope>,
    parent: CompositeTypeDefinitionPosition,
    directives: Option<DirectiveList>,
) -> Result<Scope, PlanError> {
    let own_types = possible_type_names(schema, &parent)?;
    let possible_types = match &enclosing {
        Some(scope) => scope
            .possible_runtime_types()
            .iter()
            .filter(|name| own_types.contains(*name))
            .cloned()
            .collect(),
        None => own_types,
    };
    Ok(Scope {
        inner: Arc::new(ScopeInner {
            parent,
            directives,
            enclosing,
            possible_types,
        }),
    })
}

fn possible_type_names(
    schema: &Schema,
    parent: &CompositeTypeDefinitionPosition,
) -> Result<IndexSet<Name>, PlanError> {
    Ok(schema
        .possible_runtime_types(parent.clone())?
        .into_iter()
        .map(|position| position.type_name)
        .collect())
}

#[cfg(test)]
mod tests {
    use apollo_compiler::name;

    use super::*;
    use crate::schema::values::Directive;
    use crate::schema::values::Value;

    fn test_schema() -> Schema {
        Schema::parse(
            r#"
            type Query { any: All }
            type A { x: Int }
            type B { y: Int }
            type C { z: Int }
            union All = A | B | C
            union AB = A | B
            union BC = B | C
            "#,
            "schema.graphql",
        )
        .unwrap()
    }

    fn composite(schema: &Schema, name: &str) -> CompositeTypeDefinitionPosition {
        schema
            .get_composite_type(Name::new_unchecked(name))
            .unwrap()
    }

    use apollo_compiler::Name;

    #[test]
    fn refinement_intersects_possible_types() {
        let schema = test_schema();
        let root = Scope::create(&schema, composite(&schema, "All")).unwrap();
        assert_eq!(root.possible_runtime_types().len(), 3);

        let ab = root.refine(&schema, composite(&schema, "AB"), None).unwrap();
        let names: Vec<&str> = ab
            .possible_runtime_types()
            .iter()
            .map(Name::as_str)
            .collect();
        assert_eq!(names, ["A", "B"]);

        // Every refinement shrinks (or preserves) the possible set.
        let b = ab.refine(&schema, composite(&schema, "BC"), None).unwrap();
        assert!(b
            .possible_runtime_types()
            .is_subset(ab.possible_runtime_types()));
        assert_eq!(
            b.possible_runtime_types().iter().map(Name::as_str).collect::<Vec<_>>(),
            ["B"]
        );
    }

    #[test]
    fn directive_less_non_refinement_is_a_no_op() {
        let schema = test_schema();
        let root = Scope::create(&schema, composite(&schema, "AB")).unwrap();
        // All is a super-type of AB, so refining by it changes nothing.
        let refined = root.refine(&schema, composite(&schema, "All"), None).unwrap();
        assert!(refined.equals(&root));
        assert!(refined.enclosing().is_none());
    }

    #[test]
    fn redundant_super_type_links_are_pruned() {
        let schema = test_schema();
        let root = Scope::create(&schema, composite(&schema, "All")).unwrap();
        let a = root.refine(&schema, composite(&schema, "A"), None).unwrap();
        // The All link carried no directives and A is one of its sub-types,
        // so the chain collapses to a single link.
        assert_eq!(a.parent().type_name().as_str(), "A");
        assert!(a.enclosing().is_none());
    }

    #[test]
    fn directive_links_survive_pruning() {
        let schema = test_schema();
        let root = Scope::create(&schema, composite(&schema, "All")).unwrap();
        let skipped = root
            .refine(
                &schema,
                composite(&schema, "AB"),
                Some(DirectiveList(vec![Directive::new(name!("skip"))
                    .with_argument(name!("if"), Value::Boolean(true))])),
            )
            .unwrap();
        let a = skipped.refine(&schema, composite(&schema, "A"), None).unwrap();
        // The @skip link must remain in the chain.
        assert_eq!(a.parent().type_name().as_str(), "A");
        let kept = a.enclosing().expect("directive link kept");
        assert_eq!(kept.parent().type_name().as_str(), "AB");
        assert!(kept.directives().is_some());
    }

    #[test]
    fn empty_directive_lists_count_as_absent() {
        let schema = test_schema();
        let root = Scope::create(&schema, composite(&schema, "AB")).unwrap();
        let refined = root
            .refine(&schema, composite(&schema, "All"), Some(DirectiveList::new()))
            .unwrap();
        assert!(refined.equals(&root));
    }

    #[test]
    fn equality_implies_identity_key_and_hash() {
        let schema = test_schema();
        let dirs = || {
            Some(DirectiveList(vec![Directive::new(name!("include"))
                .with_argument(name!("if"), Value::Variable(name!("v")))]))
        };
        let left = Scope::create(&schema, composite(&schema, "All"))
            .unwrap()
            .refine(&schema, composite(&schema, "AB"), dirs())
            .unwrap();
        let right = Scope::create(&schema, composite(&schema, "All"))
            .unwrap()
            .refine(&schema, composite(&schema, "AB"), dirs())
            .unwrap();
        assert!(left.equals(&right));
        assert_eq!(left.identity_key(), right.identity_key());
        assert_eq!(left.hash(), right.hash());
    }

    #[test]
    fn directive_argument_order_does_not_split_scopes() {
        let schema = test_schema();
        let forward = DirectiveList(vec![Directive::new(name!("f"))
            .with_argument(name!("a"), Value::Int(1))
            .with_argument(name!("b"), Value::Int(2))]);
        let backward = DirectiveList(vec![Directive::new(name!("f"))
            .with_argument(name!("b"), Value::Int(2))
            .with_argument(name!("a"), Value::Int(1))]);
        let left = Scope::create(&schema, composite(&schema, "All"))
            .unwrap()
            .refine(&schema, composite(&schema, "AB"), Some(forward))
            .unwrap();
        let right = Scope::create(&schema, composite(&schema, "All"))
            .unwrap()
            .refine(&schema, composite(&schema, "AB"), Some(backward))
            .unwrap();
        assert!(left.equals(&right));
        assert_eq!(left.identity_key(), right.identity_key());
        assert_eq!(left.hash(), right.hash());
    }
}
