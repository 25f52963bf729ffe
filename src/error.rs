use apollo_compiler::Name;

/// Create an internal schema error.
///
/// Internal errors are invariant violations. They must only be constructed for
/// conditions that cannot happen through the public API.
#[macro_export]
macro_rules! internal_error {
    ( $( $arg:tt )+ ) => {
        $crate::error::SchemaError::Internal { message: format!( $( $arg )+ ) }
    }
}

/// Break out of the current function, returning an internal schema error.
#[macro_export]
macro_rules! bail {
    ( $( $arg:tt )+ ) => {
        return Err($crate::internal_error!( $( $arg )+ ).into())
    }
}

/// Fail-fast errors raised while constructing or mutating a schema.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SchemaError {
    #[error("Type \"{name}\" already exists in the schema with a different kind")]
    TypeKindMismatch { name: Name },
    #[error("Cannot redefine built-in scalar type \"{name}\"")]
    BuiltInScalarRedefinition { name: Name },
    #[error("Field \"{type_name}.{field_name}\" already exists")]
    FieldAlreadyExists { type_name: Name, field_name: Name },
    #[error("Argument \"{name}\" already exists on \"{coordinate}\"")]
    ArgumentAlreadyExists { coordinate: String, name: Name },
    #[error("Directive \"@{name}\" is already defined")]
    DirectiveDefinitionAlreadyExists { name: Name },
    #[error("Schema has no type \"{name}\"")]
    UnknownType { name: Name },
    #[error("Element \"{coordinate}\" does not exist in the schema (it may have been removed)")]
    UnknownElement { coordinate: String },
    #[error("Cannot mutate an immutable schema")]
    ImmutableSchema,
    #[error("{feature} is not implemented")]
    NotImplemented { feature: String },
    #[error("Invalid GraphQL document: {message}")]
    Parse { message: String },
    #[error("{message}")]
    Internal { message: String },
}

impl SchemaError {
    pub(crate) fn not_implemented(feature: impl Into<String>) -> Self {
        Self::NotImplemented {
            feature: feature.into(),
        }
    }
}

impl From<apollo_compiler::InvalidNameError> for SchemaError {
    fn from(err: apollo_compiler::InvalidNameError) -> Self {
        Self::Parse {
            message: format!("invalid GraphQL name: {err}"),
        }
    }
}

/// Fail-fast errors raised while planning a query against a composed schema.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PlanError {
    #[error("Cannot query field \"{field_name}\" on type \"{type_name}\"")]
    CannotQueryField { field_name: Name, type_name: Name },
    #[error("Unknown variable \"${name}\"")]
    UnknownVariable { name: Name },
    #[error("{message}")]
    Internal { message: String },
}

impl From<SchemaError> for PlanError {
    fn from(err: SchemaError) -> Self {
        Self::Internal {
            message: err.to_string(),
        }
    }
}

/// Stable machine-readable codes for composition errors.
///
/// `OverrideOnBothFieldAndType` is reserved for type-level `@override` and is
/// never emitted by the current merger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::Display)]
pub enum ErrorCode {
    #[strum(to_string = "OVERRIDE_FROM_SELF_ERROR")]
    OverrideFromSelfError,
    #[strum(to_string = "OVERRIDE_SOURCE_HAS_OVERRIDE")]
    OverrideSourceHasOverride,
    #[strum(to_string = "OVERRIDE_COLLISION_WITH_ANOTHER_DIRECTIVE")]
    OverrideCollisionWithAnotherDirective,
    #[strum(to_string = "OVERRIDE_ON_BOTH_FIELD_AND_TYPE")]
    OverrideOnBothFieldAndType,
    #[strum(to_string = "INVALID_FIELD_SHARING")]
    InvalidFieldSharing,
    #[strum(to_string = "INVALID_SUBGRAPH_NAME")]
    InvalidSubgraphName,
    #[strum(to_string = "INTERNAL")]
    Internal,
}

/// Errors accumulated during composition. Composition continues past
/// recoverable errors so that as many as possible are reported at once.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CompositionError {
    #[error("{message}")]
    OverrideFromSelfError { message: String },
    #[error("{message}")]
    OverrideSourceHasOverride { message: String },
    #[error("{message}")]
    OverrideCollisionWithAnotherDirective { message: String },
    #[error("{message}")]
    OverrideOnBothFieldAndType { message: String },
    #[error("{message}")]
    InvalidFieldSharing { message: String },
    #[error("{message}")]
    InvalidSubgraphName { message: String },
    #[error("{message}")]
    InternalError { message: String },
}

impl CompositionError {
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::OverrideFromSelfError { .. } => ErrorCode::OverrideFromSelfError,
            Self::OverrideSourceHasOverride { .. } => ErrorCode::OverrideSourceHasOverride,
            Self::OverrideCollisionWithAnotherDirective { .. } => {
                ErrorCode::OverrideCollisionWithAnotherDirective
            }
            Self::OverrideOnBothFieldAndType { .. } => ErrorCode::OverrideOnBothFieldAndType,
            Self::InvalidFieldSharing { .. } => ErrorCode::InvalidFieldSharing,
            Self::InvalidSubgraphName { .. } => ErrorCode::InvalidSubgraphName,
            Self::InternalError { .. } => ErrorCode::Internal,
        }
    }

    pub fn code_string(&self) -> String {
        self.code().to_string()
    }
}

impl From<SchemaError> for CompositionError {
    fn from(err: SchemaError) -> Self {
        Self::InternalError {
            message: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn composition_error_codes_are_stable() {
        let error = CompositionError::OverrideFromSelfError {
            message: "whatever".to_owned(),
        };
        assert_eq!(error.code_string(), "OVERRIDE_FROM_SELF_ERROR");
        let error = CompositionError::InvalidFieldSharing {
            message: "whatever".to_owned(),
        };
        assert_eq!(error.code_string(), "INVALID_FIELD_SHARING");
        assert_eq!(
            ErrorCode::OverrideCollisionWithAnotherDirective.to_string(),
            "OVERRIDE_COLLISION_WITH_ANOTHER_DIRECTIVE"
        );
        assert_eq!(
            ErrorCode::OverrideOnBothFieldAndType.to_string(),
            "OVERRIDE_ON_BOTH_FIELD_AND_TYPE"
        );
    }
}
