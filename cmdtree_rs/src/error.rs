//! Error types for registration and parsing.
//!
//! Registration errors are returned at the call site that caused them.
//! Parse errors abort resolution and reach the `parse` caller unchanged.
//! Handler errors pass through verbatim so hosts can use sentinel errors
//! for control flow and recover them with `downcast_ref`.

/// Boxed error produced by value conversion.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Result alias used across the crate.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Coarse classification of an [`Error`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Malformed dash sequence such as `-`, `--` or `---x`.
    InvalidArgument,
    /// Nothing to parse against a tree that has commands.
    NoArguments,
    /// A command name did not resolve.
    CommandNotFound,
    /// A short or long parameter did not resolve.
    ParameterNotFound,
    /// A parameter appeared more than once.
    DuplicateParameter,
    /// A value-bearing parameter had no following token.
    MissingValue,
    /// A required parameter was not given.
    MissingRequired,
    /// Tokens were left over with nothing to absorb them.
    ExtraArguments,
    /// The value converter rejected a token.
    ConversionFailure,
    /// Invalid command or parameter definition.
    RegistrationConflict,
    /// A handler returned an error.
    Handler,
}

/// Errors returned by registration, parsing and visitation.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("invalid argument '{0}'")]
    InvalidArgument(String),

    #[error("no arguments")]
    NoArguments,

    #[error("command not found: '{0}'")]
    CommandNotFound(String),

    #[error("expected a command, got a parameter: '{0}'")]
    ExpectedCommand(String),

    #[error("{kind} '{name}' not found")]
    ParameterNotFound { kind: &'static str, name: String },

    #[error("parameter '{0}' specified multiple times")]
    DuplicateParameter(String),

    #[error("parameter '{0}' requires a value")]
    MissingValue(String),

    #[error("short parameter '{0}' requires a value, cannot combine")]
    CombinedValue(String),

    #[error("required parameter '{0}' not specified")]
    MissingRequired(String),

    #[error("extra arguments: {}", .0.join(" "))]
    ExtraArguments(Vec<String>),

    #[error("no handler for arguments: {}", .0.join(" "))]
    NoHandler(Vec<String>),

    #[error("error converting value '{token}' for '{name}': {source}")]
    Conversion {
        name: String,
        token: String,
        #[source]
        source: BoxError,
    },

    #[error("register: {0}")]
    Register(#[from] RegisterError),

    #[error(transparent)]
    Handler(#[from] anyhow::Error),
}

impl Error {
    /// Taxonomy bucket of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::InvalidArgument(_) => ErrorKind::InvalidArgument,
            Error::NoArguments => ErrorKind::NoArguments,
            Error::CommandNotFound(_) | Error::ExpectedCommand(_) => ErrorKind::CommandNotFound,
            Error::ParameterNotFound { .. } => ErrorKind::ParameterNotFound,
            Error::DuplicateParameter(_) => ErrorKind::DuplicateParameter,
            Error::MissingValue(_) | Error::CombinedValue(_) => ErrorKind::MissingValue,
            Error::MissingRequired(_) => ErrorKind::MissingRequired,
            Error::ExtraArguments(_) | Error::NoHandler(_) => ErrorKind::ExtraArguments,
            Error::Conversion { .. } => ErrorKind::ConversionFailure,
            Error::Register(_) => ErrorKind::RegistrationConflict,
            Error::Handler(_) => ErrorKind::Handler,
        }
    }

    /// True for errors raised while matching tokens (not registration or handlers).
    pub fn is_parse(&self) -> bool {
        !matches!(self.kind(), ErrorKind::RegistrationConflict | ErrorKind::Handler)
    }

    /// The handler error, if this is one.
    pub fn handler_error(&self) -> Option<&anyhow::Error> {
        match self {
            Error::Handler(e) => Some(e),
            _ => None,
        }
    }
}

/// Invalid command or parameter definitions.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegisterError {
    #[error("duplicate command: '{0}'")]
    DuplicateCommand(String),

    #[error("duplicate empty command")]
    DuplicateEmptyCommand,

    #[error("empty command name is only allowed at the root")]
    EmptyNameOutsideRoot,

    #[error("raw command '{0}' must have a handler")]
    RawWithoutHandler(String),

    #[error("command '{0}' is raw and cannot have sub commands")]
    SubCommandOfRaw(String),

    #[error("command '{0}' has optional raw parameters and cannot have sub commands")]
    SubCommandOfOptionalRaw(String),

    #[error("command '{0}' cannot be added next to a global optional raw parameter")]
    CommandBesideGlobalOptionalRaw(String),

    #[error("invalid parameter name: long '{long}', short '{short}'")]
    InvalidName { long: String, short: String },

    #[error("duplicate long parameter name '{0}'")]
    DuplicateLong(String),

    #[error("duplicate short parameter name '{0}'")]
    DuplicateShort(String),

    #[error("cannot register optional raw parameter '{0}' on a command with sub commands")]
    OptionalRawWithSubCommands(String),

    #[error("cannot register prefixed parameter '{0}' after raw parameter")]
    PrefixedAfterRaw(String),

    #[error("cannot register multiple optional raw parameters ('{0}')")]
    MultipleOptionalRaw(String),

    #[error("cannot register required raw parameter '{0}' after optional raw parameter")]
    RequiredAfterOptional(String),

    #[error("required parameter '{0}' needs a value")]
    ValueRequired(String),
}
