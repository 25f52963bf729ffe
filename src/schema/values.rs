use std::fmt;
use std::fmt::Display;
use std::fmt::Formatter;

use apollo_compiler::Name;
use indexmap::IndexMap;
use itertools::Itertools;

/// A GraphQL float literal. Wraps `f64` and compares by bit pattern so values
/// can participate in `Eq`.
#[derive(Debug, Clone, Copy)]
pub struct FloatValue(pub f64);

impl PartialEq for FloatValue {
    fn eq(&self, other: &Self) -> bool {
        self.0.to_bits() == other.0.to_bits()
    }
}

impl Eq for FloatValue {}

impl Display for FloatValue {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        if self.0.fract() == 0.0 && self.0.is_finite() {
            write!(f, "{:.1}", self.0)
        } else {
            write!(f, "{}", self.0)
        }
    }
}

/// A structured GraphQL value, as found in directive arguments and default
/// values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    Null,
    Boolean(bool),
    Int(i32),
    Float(FloatValue),
    String(String),
    Enum(Name),
    Variable(Name),
    List(Vec<Value>),
    Object(IndexMap<Name, Value>),
}

impl Value {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_enum(&self) -> Option<&Name> {
        match self {
            Value::Enum(name) => Some(name),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Boolean(b) => Some(*b),
            _ => None,
        }
    }
}

impl Display for Value {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("null"),
            Value::Boolean(b) => write!(f, "{b}"),
            Value::Int(i) => write!(f, "{i}"),
            Value::Float(x) => write!(f, "{x}"),
            Value::String(s) => write!(f, "\"{}\"", s.replace('\\', "\\\\").replace('"', "\\\"")),
            Value::Enum(name) => write!(f, "{name}"),
            Value::Variable(name) => write!(f, "${name}"),
            Value::List(items) => {
                write!(f, "[{}]", items.iter().format(", "))
            }
            Value::Object(fields) => {
                write!(
                    f,
                    "{{{}}}",
                    fields
                        .iter()
                        .format_with(", ", |(name, value), fmt| fmt(&format_args!(
                            "{name}: {value}"
                        )))
                )
            }
        }
    }
}

/// A directive application: a name plus an ordered argument map.
///
/// Two applications are equal iff their names are equal and their argument
/// maps are deeply equal; argument order is not significant (`IndexMap`
/// equality is order-insensitive, and [`Directive::canonical_text`] sorts
/// entries).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Directive {
    pub name: Name,
    pub arguments: IndexMap<Name, Value>,
}

impl Directive {
    pub fn new(name: Name) -> Self {
        Self {
            name,
            arguments: IndexMap::new(),
        }
    }

    pub fn with_argument(mut self, name: Name, value: Value) -> Self {
        self.arguments.insert(name, value);
        self
    }

    pub fn argument(&self, name: &str) -> Option<&Value> {
        self.arguments.get(name)
    }

    /// A canonical string form usable as a map key: argument entries are
    /// emitted in name order, so `@f(a: 1, b: 2)` and `@f(b: 2, a: 1)`
    /// canonicalize identically.
    pub fn canonical_text(&self) -> String {
        if self.arguments.is_empty() {
            return format!("@{}", self.name);
        }
        let arguments = self
            .arguments
            .iter()
            .sorted_by(|(a, _), (b, _)| a.cmp(b))
            .format_with(", ", |(name, value), fmt| {
                fmt(&format_args!("{name}: {value}"))
            });
        format!("@{}({})", self.name, arguments)
    }
}

impl Display for Directive {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "@{}", self.name)?;
        if !self.arguments.is_empty() {
            write!(
                f,
                "({})",
                self.arguments
                    .iter()
                    .format_with(", ", |(name, value), fmt| fmt(&format_args!(
                        "{name}: {value}"
                    )))
            )?;
        }
        Ok(())
    }
}

/// The list of directives applied to a schema element. Duplicate applications
/// are kept as-is.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DirectiveList(pub Vec<Directive>);

impl DirectiveList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Directive> {
        self.0.iter()
    }

    pub fn has(&self, name: &str) -> bool {
        self.0.iter().any(|d| d.name.as_str() == name)
    }

    pub fn get(&self, name: &str) -> Option<&Directive> {
        self.0.iter().find(|d| d.name.as_str() == name)
    }

    pub fn get_all<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Directive> + 'a {
        self.0.iter().filter(move |d| d.name.as_str() == name)
    }

    pub(crate) fn push(&mut self, directive: Directive) {
        self.0.push(directive);
    }

    pub(crate) fn retain(&mut self, f: impl FnMut(&Directive) -> bool) {
        self.0.retain(f);
    }
}

impl<'a> IntoIterator for &'a DirectiveList {
    type Item = &'a Directive;
    type IntoIter = std::slice::Iter<'a, Directive>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl FromIterator<Directive> for DirectiveList {
    fn from_iter<T: IntoIterator<Item = Directive>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl Display for DirectiveList {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        for (i, directive) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            write!(f, "{directive}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use apollo_compiler::name;

    #[test]
    fn directive_equality_ignores_argument_order() {
        let forward = Directive::new(name!("f"))
            .with_argument(name!("a"), Value::Int(1))
            .with_argument(name!("b"), Value::Int(2));
        let backward = Directive::new(name!("f"))
            .with_argument(name!("b"), Value::Int(2))
            .with_argument(name!("a"), Value::Int(1));
        assert_eq!(forward, backward);
        assert_eq!(forward.canonical_text(), backward.canonical_text());
        assert_eq!(forward.canonical_text(), "@f(a: 1, b: 2)");
    }

    #[test]
    fn directive_equality_is_deep() {
        let left = Directive::new(name!("key"))
            .with_argument(name!("fields"), Value::String("id name".to_owned()));
        let right = Directive::new(name!("key"))
            .with_argument(name!("fields"), Value::String("id".to_owned()));
        assert_ne!(left, right);
    }

    #[test]
    fn value_display_uses_graphql_literal_syntax() {
        let value = Value::List(vec![
            Value::Null,
            Value::Boolean(true),
            Value::String("a \"b\"".to_owned()),
            Value::Enum(name!("EXECUTION")),
            Value::Variable(name!("v")),
        ]);
        assert_eq!(value.to_string(), r#"[null, true, "a \"b\"", EXECUTION, $v]"#);
        let object = Value::Object(IndexMap::from([
            (name!("x"), Value::Int(1)),
            (name!("y"), Value::Float(FloatValue(2.0))),
        ]));
        assert_eq!(object.to_string(), "{x: 1, y: 2.0}");
    }

    #[test]
    fn directive_list_keeps_duplicates() {
        let mut list = DirectiveList::new();
        list.push(Directive::new(name!("tag")));
        list.push(Directive::new(name!("tag")));
        assert_eq!(list.get_all("tag").count(), 2);
    }
}
