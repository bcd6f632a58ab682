//! Type errors reported to the user
//!
//! Every error carries the position it points at and a kind with a stable
//! `TYPE_ERROR_*` code. Lookups of names the resolver guarantees are not
//! errors of this kind; they panic.

use std::fmt;

use thiserror::Error;

use parasol_core::typed::ShaderKind;
use parasol_core::{Constructor, Position, Type};

#[derive(Debug, Clone, PartialEq, Error)]
#[error("{position}: {kind}")]
pub struct TypeCheckerError {
    pub position: Position,
    pub kind: TypeCheckerErrorKind,
}

impl TypeCheckerError {
    pub fn new(position: Position, kind: TypeCheckerErrorKind) -> Self {
        Self { position, kind }
    }

    pub fn code(&self) -> &'static str {
        self.kind.code()
    }
}

/// A problem found while linking a program's vertex and fragment shaders
#[derive(Debug, Clone, PartialEq)]
pub enum LinkProblem {
    /// The fragment shader reads an input no vertex output provides
    Unassigned { input: String, ty: Type },
    /// The vertex output has a different type than the fragment input
    WrongType {
        input: String,
        vertex: Type,
        fragment: Type,
    },
}

impl fmt::Display for LinkProblem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LinkProblem::Unassigned { input, ty } => write!(
                f,
                "The fragment input {} : {} is not assigned by the vertex shader",
                input, ty
            ),
            LinkProblem::WrongType {
                input,
                vertex,
                fragment,
            } => write!(
                f,
                "The fragment input {} has type {} but the vertex output has type {}",
                input, fragment, vertex
            ),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum TypeCheckerErrorKind {
    #[error(
        "The function {function} expects arguments {} but was applied to {}",
        render_types(.expected),
        render_types(.got)
    )]
    ApplicationBadTypes {
        function: String,
        expected: Vec<Type>,
        got: Vec<Type>,
    },

    #[error("{name} has type {ty}, which is not a function type, but is applied to arguments")]
    ApplicationNotFunction { name: String, ty: Type },

    #[error("A condition must be of type boolean but has type {got}")]
    ConditionNotBoolean { got: Type },

    #[error("Column access requires a matrix but the expression has type {got}")]
    MatrixColumnNotMatrix { got: Type },

    #[error("The type {ty} has {columns} columns but column {column} was requested")]
    MatrixColumnOutOfBounds {
        ty: Type,
        column: i64,
        columns: usize,
    },

    #[error(
        "No constructor for {ty} accepts arguments {}; available constructors: {}",
        render_types(.got),
        render_constructors(.available)
    )]
    NoAppropriateConstructor {
        ty: Type,
        got: Vec<Type>,
        available: Vec<Constructor>,
    },

    #[error("Values of type {ty} cannot be constructed with new")]
    TypeNotConstructable { ty: Type },

    #[error("The field {field} of {record} has type {expected} but is assigned a value of type {got}")]
    RecordFieldBadType {
        record: Type,
        field: String,
        expected: Type,
        got: Type,
    },

    #[error("The record type {record} has no field {field}")]
    RecordFieldUnknown { record: Type, field: String },

    #[error("The field {field} of {record} is assigned more than once")]
    RecordFieldDuplicate { record: Type, field: String },

    #[error("Fields of {record} are not assigned: {}", .fields.join(", "))]
    RecordFieldsUnassigned { record: Type, fields: Vec<String> },

    #[error("The type {ty} is not a record type")]
    RecordNotRecordType { ty: Type },

    #[error(
        "The record type {record} has no field {field}; available fields: {}",
        .available.join(", ")
    )]
    RecordProjectionNoSuchField {
        record: Type,
        field: String,
        available: Vec<String>,
    },

    #[error("Field access requires a record but the expression has type {got}")]
    RecordProjectionNotRecord { got: Type },

    #[error("Swizzling requires a vector but the expression has type {got}")]
    SwizzleNotVector { got: Type },

    #[error("A swizzle selects at most 4 components but {count} were given")]
    SwizzleTooManyComponents { count: usize },

    #[error(
        "The type {ty} has no component {component}; available components: {}",
        .available.join(", ")
    )]
    SwizzleUnknownComponent {
        ty: Type,
        component: String,
        available: Vec<String>,
    },

    #[error("The function body has type {got} but the declared result type is {expected}")]
    FunctionBodyReturnMismatch { expected: Type, got: Type },

    #[error("The field {field} of record {record} has type {ty}, which cannot be stored in a record")]
    RecordFieldNotManifest {
        record: String,
        field: String,
        ty: Type,
    },

    #[error("The output {output} has type {expected} but is assigned a value of type {got}")]
    ShaderAssignmentBadType {
        output: String,
        expected: Type,
        got: Type,
    },

    #[error("The {stage} shader attribute {name} has record type {ty}, which is not allowed")]
    ShaderBadAttributeType {
        stage: ShaderKind,
        name: String,
        ty: Type,
    },

    #[error("The depth output {name} must be of type float but has type {got}")]
    ShaderDepthNotFloat { name: String, got: Type },

    #[error("A discard condition must be of type boolean but has type {got}")]
    ShaderDiscardNotBoolean { got: Type },

    #[error("The main output {name} must be of type vector_4f but has type {got}")]
    ShaderOutputMainBadType { name: String, got: Type },

    #[error("{name} is a {got} shader but a {expected} shader is required")]
    ShaderWrongShaderType {
        name: String,
        expected: ShaderKind,
        got: ShaderKind,
    },

    #[error(
        "The vertex and fragment shaders of program {program} are incompatible:{}",
        render_problems(.problems)
    )]
    ShadersIncompatible {
        program: String,
        problems: Vec<LinkProblem>,
    },

    #[error("The value has type {got} but is ascribed type {expected}")]
    ValueAscriptionMismatch { expected: Type, got: Type },

    #[error("The type {ty} is not a value type")]
    ValueNonValueType { ty: Type },
}

impl TypeCheckerErrorKind {
    pub fn code(&self) -> &'static str {
        use TypeCheckerErrorKind::*;

        match self {
            ApplicationBadTypes { .. } => "TYPE_ERROR_APPLICATION_BAD_TYPES",
            ApplicationNotFunction { .. } => "TYPE_ERROR_APPLICATION_NOT_FUNCTION",
            ConditionNotBoolean { .. } => "TYPE_ERROR_CONDITION_NOT_BOOLEAN",
            MatrixColumnNotMatrix { .. } => "TYPE_ERROR_MATRIX_COLUMN_NOT_MATRIX",
            MatrixColumnOutOfBounds { .. } => "TYPE_ERROR_MATRIX_COLUMN_OUT_OF_BOUNDS",
            NoAppropriateConstructor { .. } => "TYPE_ERROR_NO_APPROPRIATE_CONSTRUCTOR",
            TypeNotConstructable { .. } => "TYPE_ERROR_TYPE_NOT_CONSTRUCTABLE",
            RecordFieldBadType { .. } => "TYPE_ERROR_RECORD_FIELD_BAD_TYPE",
            RecordFieldUnknown { .. } => "TYPE_ERROR_RECORD_FIELD_UNKNOWN",
            RecordFieldDuplicate { .. } => "TYPE_ERROR_RECORD_FIELD_DUPLICATE",
            RecordFieldsUnassigned { .. } => "TYPE_ERROR_RECORD_FIELDS_UNASSIGNED",
            RecordNotRecordType { .. } => "TYPE_ERROR_RECORD_NOT_RECORD_TYPE",
            RecordProjectionNoSuchField { .. } => "TYPE_ERROR_RECORD_PROJECTION_NO_SUCH_FIELD",
            RecordProjectionNotRecord { .. } => "TYPE_ERROR_RECORD_PROJECTION_NOT_RECORD",
            SwizzleNotVector { .. } => "TYPE_ERROR_SWIZZLE_NOT_VECTOR",
            SwizzleTooManyComponents { .. } => "TYPE_ERROR_SWIZZLE_TOO_MANY_COMPONENTS",
            SwizzleUnknownComponent { .. } => "TYPE_ERROR_SWIZZLE_UNKNOWN_COMPONENT",
            FunctionBodyReturnMismatch { .. } => "TYPE_ERROR_FUNCTION_BODY_RETURN_MISMATCH",
            RecordFieldNotManifest { .. } => "TYPE_ERROR_RECORD_FIELD_NOT_MANIFEST",
            ShaderAssignmentBadType { .. } => "TYPE_ERROR_SHADER_ASSIGNMENT_BAD_TYPE",
            ShaderBadAttributeType { .. } => "TYPE_ERROR_SHADER_BAD_ATTRIBUTE_TYPE",
            ShaderDepthNotFloat { .. } => "TYPE_ERROR_SHADER_DEPTH_NOT_FLOAT",
            ShaderDiscardNotBoolean { .. } => "TYPE_ERROR_SHADER_DISCARD_NOT_BOOLEAN",
            ShaderOutputMainBadType { .. } => "TYPE_ERROR_SHADER_OUTPUT_MAIN_BAD_TYPE",
            ShaderWrongShaderType { .. } => "TYPE_ERROR_SHADER_WRONG_SHADER_TYPE",
            ShadersIncompatible { .. } => "TYPE_ERROR_SHADERS_INCOMPATIBLE",
            ValueAscriptionMismatch { .. } => "TYPE_ERROR_VALUE_ASCRIPTION_MISMATCH",
            ValueNonValueType { .. } => "TYPE_ERROR_VALUE_NON_VALUE_TYPE",
        }
    }
}

fn render_types(types: &[Type]) -> String {
    let rendered: Vec<String> = types.iter().map(Type::to_string).collect();
    format!("({})", rendered.join(", "))
}

fn render_constructors(constructors: &[Constructor]) -> String {
    let rendered: Vec<String> = constructors.iter().map(Constructor::to_string).collect();
    rendered.join(" ")
}

fn render_problems(problems: &[LinkProblem]) -> String {
    problems
        .iter()
        .map(|problem| format!("\n  {}", problem))
        .collect()
}
