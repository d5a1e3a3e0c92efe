use thiserror::Error;

/// Represents errors that can occur when registering a path pattern.
///
/// These are configuration mistakes: they are raised eagerly while the trie is
/// built and are never produced while matching a request.
#[non_exhaustive]
#[derive(Clone, Debug, Eq, Hash, PartialEq, Error)]
pub enum TrajectError {
    /// A step contains an unbalanced `{` or `}`.
    #[error("invalid step: {step}")]
    InvalidStep {
        /// The offending segment pattern.
        step: String,
    },
    /// Two variables follow each other without a literal in between.
    #[error("illegal consecutive variables: {step}")]
    ConsecutiveVariables {
        /// The offending segment pattern.
        step: String,
    },
    /// A placeholder is empty, is not an identifier, or has more than one converter.
    #[error("illegal variable `{{{variable}}}`")]
    InvalidVariable {
        /// The text between the braces.
        variable: String,
    },
    /// A placeholder refers to a converter that was never registered.
    #[error("unknown converter `{name}`")]
    UnknownConverter {
        /// The converter name used in the placeholder.
        name: String,
    },
    /// The same variable name appears more than once in a pattern.
    #[error("duplicate variable `{name}` in path: {pattern}")]
    DuplicateVariable {
        /// The repeated variable name.
        name: String,
        /// The pattern being registered.
        pattern: String,
    },
    /// A variable is bound to a different converter than a previous
    /// registration along the same trie path.
    #[error("type conflict for variable `{name}` in path: {pattern}")]
    TypeConflict {
        /// The conflicting variable name.
        name: String,
        /// The pattern being registered.
        pattern: String,
    },
    /// Attempted to register a model path that is structurally identical to
    /// an existing one.
    #[error("path `{path}` conflicts with previously registered path: {with}")]
    DuplicatePath {
        /// The path being registered.
        path: String,
        /// The existing path that the registration is conflicting with.
        with: String,
    },
}

impl TrajectError {
    /// Returns `true` for malformed patterns, as opposed to conflicts between
    /// otherwise valid registrations.
    pub fn is_syntax(&self) -> bool {
        matches!(
            self,
            Self::InvalidStep { .. }
                | Self::ConsecutiveVariables { .. }
                | Self::InvalidVariable { .. }
                | Self::UnknownConverter { .. }
                | Self::DuplicateVariable { .. }
        )
    }
}

/// A failed attempt to turn query parameters into model arguments.
///
/// This is a client error: the request carried bad input, the router itself
/// is fine.
#[non_exhaustive]
#[derive(Clone, Debug, Eq, PartialEq, Error)]
pub enum ParameterError {
    /// A required URL parameter was not supplied.
    #[error("required URL parameter missing: {name}")]
    Missing {
        /// The parameter name.
        name: String,
    },
    /// A URL parameter could not be decoded by its converter.
    #[error("cannot decode URL parameter {name}: {value}")]
    Decode {
        /// The parameter name.
        name: String,
        /// The raw value(s), comma separated.
        value: String,
    },
}

/// A converter rejected a value.
#[derive(Clone, Debug, Eq, PartialEq, Error)]
#[error("{converter} converter cannot convert `{value}`")]
pub struct ConvertError {
    /// The name of the converter.
    pub converter: String,
    /// The rejected input, as text.
    pub value: String,
}

impl ConvertError {
    pub(crate) fn new(converter: &str, value: impl Into<String>) -> Self {
        Self {
            converter: converter.to_owned(),
            value: value.into(),
        }
    }
}

/// A failed attempt to generate a link for a route.
#[non_exhaustive]
#[derive(Clone, Debug, Eq, PartialEq, Error)]
pub enum LinkError {
    /// The route id does not belong to this router.
    #[error("unknown route")]
    UnknownRoute,
    /// A path variable needed to build the link was not supplied.
    #[error("missing variable `{name}` for path: {pattern}")]
    MissingVariable {
        /// The variable name.
        name: String,
        /// The route pattern.
        pattern: String,
    },
    /// A value could not be encoded.
    #[error(transparent)]
    Encode(#[from] ConvertError),
}

/// A router configuration that cannot be used.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("cannot read router configuration: {0}")]
    Io(#[from] std::io::Error),
    /// The configuration is not valid TOML, or has fields of the wrong type.
    #[error("invalid router configuration: {0}")]
    Parse(#[from] toml::de::Error),
    /// The reserved marker would be ambiguous inside a pattern or a path.
    #[error("`{0}` cannot be used as the reserved marker")]
    InvalidMarker(char),
}
