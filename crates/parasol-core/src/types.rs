//! Nominal type system for the shading language
//!
//! Types are compared by name only: two types are equal iff their
//! [`TypeName`]s are equal. The structure of a record or function type is
//! never inspected by the equality relation. Resolution guarantees that a
//! qualified record name has exactly one declaration, so the structure
//! behind a name cannot disagree in practice, but two record values with the
//! same name and different field lists still compare equal.

use std::collections::BTreeMap;
use std::fmt;
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};

use crate::names::{FlatName, TypeName};

const COMPONENTS_2: &[&str] = &["x", "y"];
const COMPONENTS_3: &[&str] = &["x", "y", "z"];
const COMPONENTS_4: &[&str] = &["x", "y", "z", "w"];

/// A shading-language type
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Type {
    Boolean,
    Integer,
    Float,
    Vector2F,
    Vector3F,
    Vector4F,
    Vector2I,
    Vector3I,
    Vector4I,
    Matrix3x3F,
    Matrix4x4F,
    Sampler2D,
    SamplerCube,
    Record(RecordType),
    Function(FunctionType),
}

/// A declared record type
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordType {
    pub name: FlatName,
    pub fields: Vec<RecordTypeField>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordTypeField {
    pub name: String,
    pub ty: Type,
}

impl RecordType {
    pub fn field(&self, name: &str) -> Option<&RecordTypeField> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn field_names(&self) -> Vec<String> {
        self.fields.iter().map(|f| f.name.clone()).collect()
    }
}

/// The type of a function term
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FunctionType {
    pub arguments: Vec<FunctionArgument>,
    pub result: Box<Type>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FunctionArgument {
    pub name: String,
    pub ty: Type,
}

impl FunctionType {
    pub fn argument_types(&self) -> Vec<Type> {
        self.arguments.iter().map(|a| a.ty.clone()).collect()
    }

    /// Rendered signature, used as the nominal name of the function type
    pub fn signature(&self) -> String {
        let arguments: Vec<String> = self.arguments.iter().map(|a| a.ty.to_string()).collect();
        format!("({}) -> {}", arguments.join(", "), self.result)
    }
}

/// One way of constructing a value of a type with `new`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Constructor {
    pub parameters: Vec<Type>,
}

impl Constructor {
    fn of(parameters: &[Type]) -> Self {
        Self {
            parameters: parameters.to_vec(),
        }
    }

    /// Exact, per-position nominal match against an argument list
    pub fn accepts(&self, arguments: &[Type]) -> bool {
        self.parameters.len() == arguments.len()
            && self
                .parameters
                .iter()
                .zip(arguments)
                .all(|(p, a)| types_equal(p, a))
    }
}

impl fmt::Display for Constructor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("(")?;
        for (i, parameter) in self.parameters.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}", parameter)?;
        }
        f.write_str(")")
    }
}

impl Type {
    /// The built-in name of this type, if it is not a record or function
    pub fn builtin_name(&self) -> Option<&'static str> {
        let name = match self {
            Type::Boolean => "boolean",
            Type::Integer => "integer",
            Type::Float => "float",
            Type::Vector2F => "vector_2f",
            Type::Vector3F => "vector_3f",
            Type::Vector4F => "vector_4f",
            Type::Vector2I => "vector_2i",
            Type::Vector3I => "vector_3i",
            Type::Vector4I => "vector_4i",
            Type::Matrix3x3F => "matrix_3x3f",
            Type::Matrix4x4F => "matrix_4x4f",
            Type::Sampler2D => "sampler_2d",
            Type::SamplerCube => "sampler_cube",
            Type::Record(_) | Type::Function(_) => return None,
        };
        Some(name)
    }

    /// The qualified nominal name of this type
    pub fn name(&self) -> TypeName {
        match self {
            Type::Record(record) => TypeName::Global(record.name.clone()),
            Type::Function(function) => TypeName::BuiltIn(function.signature()),
            other => match other.builtin_name() {
                Some(name) => TypeName::BuiltIn(name.to_string()),
                None => unreachable!("records and functions are handled above"),
            },
        }
    }

    /// Every type except function types can be the type of a value
    pub fn is_value(&self) -> bool {
        !matches!(self, Type::Function(_))
    }

    /// Manifest types can appear as record fields
    pub fn is_manifest(&self) -> bool {
        self.is_value() && !matches!(self, Type::Sampler2D | Type::SamplerCube)
    }

    pub fn is_vector(&self) -> bool {
        self.component_names().is_some()
    }

    pub fn is_record(&self) -> bool {
        matches!(self, Type::Record(_))
    }

    pub fn as_record(&self) -> Option<&RecordType> {
        match self {
            Type::Record(record) => Some(record),
            _ => None,
        }
    }

    pub fn as_function(&self) -> Option<&FunctionType> {
        match self {
            Type::Function(function) => Some(function),
            _ => None,
        }
    }

    /// Number of scalar components in a value of this type
    pub fn component_count(&self) -> usize {
        match self {
            Type::Boolean | Type::Integer | Type::Float => 1,
            Type::Vector2F | Type::Vector2I => 2,
            Type::Vector3F | Type::Vector3I => 3,
            Type::Vector4F | Type::Vector4I => 4,
            Type::Matrix3x3F => 9,
            Type::Matrix4x4F => 16,
            Type::Sampler2D | Type::SamplerCube => 1,
            Type::Record(record) => record.fields.iter().map(|f| f.ty.component_count()).sum(),
            Type::Function(_) => 0,
        }
    }

    /// Component names usable in swizzles, for vector types only
    pub fn component_names(&self) -> Option<&'static [&'static str]> {
        match self {
            Type::Vector2F | Type::Vector2I => Some(COMPONENTS_2),
            Type::Vector3F | Type::Vector3I => Some(COMPONENTS_3),
            Type::Vector4F | Type::Vector4I => Some(COMPONENTS_4),
            _ => None,
        }
    }

    /// Column count and column type, for matrix types only
    pub fn matrix_columns(&self) -> Option<(usize, Type)> {
        match self {
            Type::Matrix3x3F => Some((3, Type::Vector3F)),
            Type::Matrix4x4F => Some((4, Type::Vector4F)),
            _ => None,
        }
    }

    /// Constructors in declaration order; empty means not constructable
    pub fn constructors(&self) -> Vec<Constructor> {
        use Type::*;

        match self {
            Boolean => vec![Constructor::of(&[Boolean])],
            Integer => vec![Constructor::of(&[Integer]), Constructor::of(&[Float])],
            Float => vec![Constructor::of(&[Float]), Constructor::of(&[Integer])],
            Vector2F => vector_2_constructors(Float, Vector2F),
            Vector3F => vector_3_constructors(Float, Vector2F, Vector3F),
            Vector4F => vector_4_constructors(Float, Vector2F, Vector3F, Vector4F),
            Vector2I => vector_2_constructors(Integer, Vector2I),
            Vector3I => vector_3_constructors(Integer, Vector2I, Vector3I),
            Vector4I => vector_4_constructors(Integer, Vector2I, Vector3I, Vector4I),
            Matrix3x3F => vec![Constructor::of(&[Vector3F, Vector3F, Vector3F])],
            Matrix4x4F => vec![Constructor::of(&[Vector4F, Vector4F, Vector4F, Vector4F])],
            Sampler2D | SamplerCube | Record(_) | Function(_) => Vec::new(),
        }
    }
}

fn vector_2_constructors(scalar: Type, v2: Type) -> Vec<Constructor> {
    vec![
        Constructor::of(&[scalar.clone(), scalar]),
        Constructor::of(&[v2]),
    ]
}

fn vector_3_constructors(scalar: Type, v2: Type, v3: Type) -> Vec<Constructor> {
    let s = scalar;
    vec![
        Constructor::of(&[s.clone(), s.clone(), s.clone()]),
        Constructor::of(&[v2.clone(), s.clone()]),
        Constructor::of(&[s, v2]),
        Constructor::of(&[v3]),
    ]
}

fn vector_4_constructors(scalar: Type, v2: Type, v3: Type, v4: Type) -> Vec<Constructor> {
    let s = scalar;
    vec![
        Constructor::of(&[s.clone(), s.clone(), s.clone(), s.clone()]),
        Constructor::of(&[v2.clone(), s.clone(), s.clone()]),
        Constructor::of(&[s.clone(), v2.clone(), s.clone()]),
        Constructor::of(&[s.clone(), s.clone(), v2.clone()]),
        Constructor::of(&[v2.clone(), v2]),
        Constructor::of(&[v3.clone(), s.clone()]),
        Constructor::of(&[s, v3]),
        Constructor::of(&[v4]),
    ]
}

impl PartialEq for Type {
    fn eq(&self, other: &Self) -> bool {
        types_equal(self, other)
    }
}

impl Eq for Type {}

impl Hash for Type {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name().hash(state);
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Nominal equality: compares names, never structure
pub fn types_equal(a: &Type, b: &Type) -> bool {
    a.name() == b.name()
}

/// Every built-in type keyed by its source-level name
pub fn base_types() -> BTreeMap<&'static str, Type> {
    [
        Type::Boolean,
        Type::Integer,
        Type::Float,
        Type::Vector2F,
        Type::Vector3F,
        Type::Vector4F,
        Type::Vector2I,
        Type::Vector3I,
        Type::Vector4I,
        Type::Matrix3x3F,
        Type::Matrix4x4F,
        Type::Sampler2D,
        Type::SamplerCube,
    ]
    .into_iter()
    .filter_map(|ty| ty.builtin_name().map(|name| (name, ty)))
    .collect()
}

/// Result type of selecting `size` components from a vector
///
/// # Panics
///
/// Panics if `vector` is not a vector type or `size` is not in `1..=4`;
/// the checker rejects both before calling this.
pub fn swizzle_type(vector: &Type, size: usize) -> Type {
    use Type::*;

    let integral = match vector {
        Vector2F | Vector3F | Vector4F => false,
        Vector2I | Vector3I | Vector4I => true,
        other => panic!("swizzle_type called on non-vector type {}", other),
    };

    match (integral, size) {
        (false, 1) => Float,
        (false, 2) => Vector2F,
        (false, 3) => Vector3F,
        (false, 4) => Vector4F,
        (true, 1) => Integer,
        (true, 2) => Vector2I,
        (true, 3) => Vector3I,
        (true, 4) => Vector4I,
        (_, size) => panic!("swizzle_type called with out-of-range size {}", size),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::names::ModuleName;
    use proptest::prelude::*;

    fn record(name: &str, fields: &[(&str, Type)]) -> Type {
        Type::Record(RecordType {
            name: ModuleName::new("com.example.M").qualify(name),
            fields: fields
                .iter()
                .map(|(n, ty)| RecordTypeField {
                    name: n.to_string(),
                    ty: ty.clone(),
                })
                .collect(),
        })
    }

    #[test]
    fn test_base_types_complete() {
        let base = base_types();
        assert_eq!(base.len(), 13);
        assert_eq!(base["vector_3f"], Type::Vector3F);
        assert_eq!(base["sampler_cube"], Type::SamplerCube);
        for (name, ty) in &base {
            assert_eq!(ty.name(), TypeName::BuiltIn(name.to_string()));
        }
    }

    #[test]
    fn test_every_type_equals_itself() {
        for ty in base_types().values() {
            assert!(types_equal(ty, ty));
        }
        let r = record("light", &[("x", Type::Integer)]);
        assert!(types_equal(&r, &r));
    }

    #[test]
    fn test_record_equality_is_nominal() {
        // Same qualified name, different structure: still equal.
        let a = record("light", &[("x", Type::Integer), ("y", Type::Integer)]);
        let b = record("light", &[("colour", Type::Vector3F)]);
        assert_eq!(a, b);

        let c = record("material", &[("x", Type::Integer), ("y", Type::Integer)]);
        assert_ne!(a, c);
    }

    #[test]
    fn test_function_names_are_signatures() {
        let f = Type::Function(FunctionType {
            arguments: vec![
                FunctionArgument {
                    name: "a".into(),
                    ty: Type::Float,
                },
                FunctionArgument {
                    name: "b".into(),
                    ty: Type::Vector2F,
                },
            ],
            result: Box::new(Type::Float),
        });
        assert_eq!(f.to_string(), "(float, vector_2f) -> float");

        // Argument names do not take part in the signature.
        let g = Type::Function(FunctionType {
            arguments: vec![
                FunctionArgument {
                    name: "x".into(),
                    ty: Type::Float,
                },
                FunctionArgument {
                    name: "y".into(),
                    ty: Type::Vector2F,
                },
            ],
            result: Box::new(Type::Float),
        });
        assert_eq!(f, g);
        assert!(!f.is_value());
    }

    #[test]
    fn test_vector_3f_constructors() {
        let constructors = Type::Vector3F.constructors();
        let rendered: Vec<String> = constructors.iter().map(ToString::to_string).collect();
        assert_eq!(
            rendered,
            vec![
                "(float, float, float)",
                "(vector_2f, float)",
                "(float, vector_2f)",
                "(vector_3f)",
            ]
        );
        assert!(constructors[1].accepts(&[Type::Vector2F, Type::Float]));
        assert!(!constructors[1].accepts(&[Type::Float, Type::Vector2F]));
        assert!(!constructors.iter().any(|c| c.accepts(&[Type::Integer])));
    }

    #[test]
    fn test_not_constructable() {
        assert!(Type::Sampler2D.constructors().is_empty());
        assert!(Type::SamplerCube.constructors().is_empty());
        assert!(record("light", &[]).constructors().is_empty());
    }

    #[test]
    fn test_component_counts() {
        assert_eq!(Type::Float.component_count(), 1);
        assert_eq!(Type::Vector3I.component_count(), 3);
        assert_eq!(Type::Matrix3x3F.component_count(), 9);
        assert_eq!(Type::Matrix4x4F.component_count(), 16);
        let r = record("light", &[("p", Type::Vector3F), ("i", Type::Float)]);
        assert_eq!(r.component_count(), 4);
    }

    #[test]
    fn test_manifest_and_value_types() {
        assert!(Type::Matrix4x4F.is_manifest());
        assert!(record("light", &[]).is_manifest());
        assert!(Type::Sampler2D.is_value());
        assert!(!Type::Sampler2D.is_manifest());
    }

    #[test]
    fn test_swizzle_table() {
        assert_eq!(swizzle_type(&Type::Vector4F, 3), Type::Vector3F);
        assert_eq!(swizzle_type(&Type::Vector2F, 1), Type::Float);
        assert_eq!(swizzle_type(&Type::Vector3I, 4), Type::Vector4I);
        assert_eq!(swizzle_type(&Type::Vector4I, 1), Type::Integer);
    }

    #[test]
    #[should_panic(expected = "out-of-range size")]
    fn test_swizzle_out_of_range_is_caller_error() {
        swizzle_type(&Type::Vector4F, 5);
    }

    #[test]
    fn test_matrix_columns() {
        assert_eq!(Type::Matrix3x3F.matrix_columns(), Some((3, Type::Vector3F)));
        assert_eq!(Type::Matrix4x4F.matrix_columns(), Some((4, Type::Vector4F)));
        assert_eq!(Type::Vector4F.matrix_columns(), None);
    }

    fn any_builtin() -> impl Strategy<Value = Type> {
        let all: Vec<Type> = base_types().into_values().collect();
        proptest::sample::select(all)
    }

    proptest! {
        #[test]
        fn prop_equality_agrees_with_names(a in any_builtin(), b in any_builtin()) {
            prop_assert_eq!(types_equal(&a, &b), a.name() == b.name());
            prop_assert_eq!(types_equal(&a, &b), types_equal(&b, &a));
        }

        #[test]
        fn prop_swizzle_preserves_count(
            vector in proptest::sample::select(vec![
                Type::Vector2F, Type::Vector3F, Type::Vector4F,
                Type::Vector2I, Type::Vector3I, Type::Vector4I,
            ]),
            size in 1usize..=4,
        ) {
            prop_assert_eq!(swizzle_type(&vector, size).component_count(), size);
        }

        #[test]
        fn prop_constructors_only_build_manifest_types(ty in any_builtin()) {
            if !ty.constructors().is_empty() {
                prop_assert!(ty.is_manifest());
            }
        }
    }
}
