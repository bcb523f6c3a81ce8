use std::fmt;

use crate::modules::SigType;

/// An inferred type. Inference is best-effort: [`Type::Unknown`] stands for
/// anything the analyzer can't tell.
#[derive(Clone, Debug, PartialEq, Default)]
pub enum Type {
    #[default]
    Unknown,
    Integer,
    Double,
    String,
    Boolean,
    Null,
    Regexp,
    Array(Box<Type>),
    Object,
    Function(Box<FunctionType>),
    /// A builtin module namespace, such as `import * as fs from 'fs'`.
    Module(&'static str),
    /// A value produced by a builtin module, identified by its type tag
    /// (e.g. `fs.file`).
    Resource(&'static str),
    /// At least two distinct alternatives, none of which is a union or
    /// [`Type::Unknown`]. Build with [`Type::union`].
    Union(Vec<Type>),
}

#[derive(Clone, Debug, PartialEq)]
pub struct FunctionType {
    pub params: Vec<Box<str>>,
    pub ret: Type,
}

impl Type {
    /// Builds the union of the provided types.
    ///
    /// Nested unions are flattened and duplicates dropped, keeping the order
    /// in which alternatives are first seen. A single alternative collapses
    /// to itself and [`Type::Unknown`] absorbs everything.
    pub fn union(types: impl IntoIterator<Item = Type>) -> Type {
        let mut alternatives: Vec<Type> = Vec::new();
        for ty in types {
            match ty {
                Type::Unknown => return Type::Unknown,
                Type::Union(inner) => {
                    for ty in inner {
                        push_unique(&mut alternatives, ty);
                    }
                }
                ty => push_unique(&mut alternatives, ty),
            }
        }
        match alternatives.len() {
            0 => Type::Unknown,
            1 => alternatives.pop().unwrap_or_default(),
            _ => Type::Union(alternatives),
        }
    }

    /// The union of `self` and `other`.
    pub fn join(self, other: Type) -> Type {
        Type::union([self, other])
    }

    pub fn function(params: Vec<Box<str>>, ret: Type) -> Type {
        Type::Function(Box::new(FunctionType { params, ret }))
    }

    /// The type described by the return alternatives of a builtin signature.
    pub fn from_signature(alternatives: &[SigType]) -> Type {
        Type::union(alternatives.iter().map(|sig| match *sig {
            SigType::Any => Type::Unknown,
            SigType::Integer => Type::Integer,
            SigType::Double => Type::Double,
            SigType::Number => Type::union([Type::Integer, Type::Double]),
            SigType::String => Type::String,
            SigType::Boolean => Type::Boolean,
            SigType::Null => Type::Null,
            SigType::Regexp => Type::Regexp,
            SigType::Array => Type::Array(Box::default()),
            SigType::Object => Type::Object,
            SigType::Function => Type::function(Vec::new(), Type::Unknown),
            SigType::Resource(tag) => Type::Resource(tag),
        }))
    }

    /// The alternatives of a union, or the type itself.
    pub fn alternatives(&self) -> &[Type] {
        match self {
            Type::Union(alternatives) => alternatives,
            ty => std::slice::from_ref(ty),
        }
    }

    pub fn is_unknown(&self) -> bool {
        *self == Type::Unknown
    }

    /// Whether every alternative is `integer` or `double`.
    pub fn is_numeric(&self) -> bool {
        self.alternatives()
            .iter()
            .all(|ty| matches!(ty, Type::Integer | Type::Double))
    }

    pub fn is_callable(&self) -> bool {
        self.alternatives()
            .iter()
            .any(|ty| matches!(ty, Type::Function(_) | Type::Unknown))
    }

    /// Whether values of this type can't take part in arithmetic.
    pub fn is_compound(&self) -> bool {
        self.alternatives().iter().any(|ty| {
            matches!(
                ty,
                Type::Array(_) | Type::Object | Type::Function(_) | Type::Module(_)
            )
        })
    }

    /// The resource tags among the alternatives.
    pub fn resources(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.alternatives().iter().filter_map(|ty| match ty {
            Type::Resource(tag) => Some(*tag),
            _ => None,
        })
    }

    /// The type without its `null` alternative.
    pub fn without_null(&self) -> Type {
        Type::union(
            self.alternatives()
                .iter()
                .filter(|ty| **ty != Type::Null)
                .cloned(),
        )
    }

    /// The return type, if this is a function type.
    pub fn ret(&self) -> Option<&Type> {
        match self {
            Type::Function(function) => Some(&function.ret),
            _ => None,
        }
    }
}

fn push_unique(alternatives: &mut Vec<Type>, ty: Type) {
    if !alternatives.contains(&ty) {
        alternatives.push(ty);
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Type::Unknown => f.write_str("unknown"),
            Type::Integer => f.write_str("integer"),
            Type::Double => f.write_str("double"),
            Type::String => f.write_str("string"),
            Type::Boolean => f.write_str("boolean"),
            Type::Null => f.write_str("null"),
            Type::Regexp => f.write_str("regexp"),
            Type::Array(elem) if elem.is_unknown() => f.write_str("array"),
            Type::Array(elem) => write!(f, "array<{elem}>"),
            Type::Object => f.write_str("object"),
            Type::Function(function) => {
                write!(f, "function({}): {}", function.params.join(", "), function.ret)
            }
            Type::Module(name) => write!(f, "module({name})"),
            Type::Resource(tag) => f.write_str(tag),
            Type::Union(alternatives) => {
                for (i, ty) in alternatives.iter().enumerate() {
                    if i > 0 {
                        f.write_str(" | ")?;
                    }
                    // Function types inside unions are parenthesized so the
                    // return type doesn't absorb the next alternative.
                    if matches!(ty, Type::Function(_)) {
                        write!(f, "({ty})")?;
                    } else {
                        write!(f, "{ty}")?;
                    }
                }
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_union_flattens_and_dedupes_in_order() {
        let inner = Type::union([Type::String, Type::Integer]);
        let ty = Type::union([Type::Integer, inner, Type::Null, Type::String]);
        assert_eq!(
            ty,
            Type::Union(vec![Type::Integer, Type::String, Type::Null])
        );
        assert_eq!(ty.to_string(), "integer | string | null");
    }

    #[test]
    fn test_union_collapses() {
        assert_eq!(Type::union([Type::Double, Type::Double]), Type::Double);
        assert_eq!(Type::union([]), Type::Unknown);
        assert_eq!(Type::Integer.join(Type::Unknown), Type::Unknown);
    }

    #[test]
    fn test_display() {
        let array = Type::Array(Box::new(Type::union([Type::Integer, Type::Double])));
        assert_eq!(array.to_string(), "array<integer | double>");
        assert_eq!(Type::Array(Box::default()).to_string(), "array");

        let function = Type::function(vec!["a".into(), "b".into()], Type::Boolean);
        assert_eq!(function.to_string(), "function(a, b): boolean");
        assert_eq!(
            function.join(Type::Null).to_string(),
            "(function(a, b): boolean) | null"
        );
        assert_eq!(Type::Resource("fs.file").to_string(), "fs.file");
        assert_eq!(Type::Module("fs").to_string(), "module(fs)");
    }

    #[test]
    fn test_predicates() {
        let number = Type::union([Type::Integer, Type::Double]);
        assert!(number.is_numeric());
        assert!(!number.join(Type::Null).is_numeric());

        let handle = Type::Resource("fs.file").join(Type::Null);
        assert_eq!(handle.resources().collect::<Vec<_>>(), ["fs.file"]);
        assert_eq!(handle.without_null(), Type::Resource("fs.file"));
        assert!(!handle.is_callable());
        assert!(Type::Unknown.is_callable());
    }

    #[test]
    fn test_from_signature() {
        let ty = Type::from_signature(&[SigType::Resource("fs.file"), SigType::Null]);
        assert_eq!(ty.to_string(), "fs.file | null");
        assert_eq!(
            Type::from_signature(&[SigType::Number]),
            Type::Union(vec![Type::Integer, Type::Double])
        );
    }
}
