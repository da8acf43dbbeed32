//! Semantic error types for the boxharness library.
//!
//! Errors a caller might inspect or map to a scenario verdict are semantic
//! enums built with `thiserror`. Opaque reports (`eyre::Report`) are reserved
//! for the binary boundary in `main.rs`.
//!
//! Every failure is scoped to one scenario: there is no process-level error
//! class, and nothing in the library retries.

use std::path::PathBuf;
use std::sync::Arc;

use thiserror::Error;

/// Errors that can occur during configuration loading and validation.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file was not found at the expected path.
    #[error("configuration file not found: {path}")]
    FileNotFound {
        /// The path where the configuration file was expected.
        path: PathBuf,
    },

    /// The configuration file could not be parsed.
    #[error("failed to parse configuration file: {message}")]
    ParseError {
        /// A description of the parse error.
        message: String,
    },

    /// A required configuration value is missing.
    #[error("missing required configuration: {field}")]
    MissingRequired {
        /// The name of the missing field.
        field: String,
    },

    /// A configuration value failed validation.
    #[error("invalid configuration value for '{field}': {reason}")]
    InvalidValue {
        /// The name of the invalid field.
        field: String,
        /// The reason the value is invalid.
        reason: String,
    },

    /// The `OrthoConfig` library returned an error during configuration loading.
    #[error("configuration loading failed: {0}")]
    OrthoConfig(Arc<ortho_config::OrthoError>),
}

/// Errors returned by the remote storage API, classified by status.
///
/// The classes mirror the provider's own error families. Nothing here is
/// retried: a rate-limit or transient failure fails the scenario outright.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The addressed item does not exist, or is in the trash.
    #[error("not found: {message}")]
    NotFound {
        /// Provider message, or the response body when none was supplied.
        message: String,
    },

    /// An item with the same name already exists in the target folder.
    #[error("conflict: {message}")]
    Conflict {
        /// Provider message, or the response body when none was supplied.
        message: String,
    },

    /// The request was rejected as malformed.
    #[error("validation failed: {message}")]
    Validation {
        /// Provider message, or the response body when none was supplied.
        message: String,
    },

    /// The session token was rejected or lacks permission.
    #[error("authentication rejected: {message}")]
    Auth {
        /// Provider message, or the response body when none was supplied.
        message: String,
    },

    /// The provider throttled the request.
    #[error("rate limited: {message}")]
    RateLimit {
        /// Value of the `Retry-After` header, when present and numeric.
        retry_after_secs: Option<u64>,
        /// Provider message, or the response body when none was supplied.
        message: String,
    },

    /// Any other non-success status.
    #[error("api returned {status}: {message}")]
    UnexpectedStatus {
        /// The HTTP status code.
        status: u16,
        /// Provider message, or the response body when none was supplied.
        message: String,
    },

    /// The request never produced a response.
    #[error("request failed: {message}")]
    Transport {
        /// A description of the transport failure.
        message: String,
    },

    /// A success response could not be decoded.
    #[error("failed to decode response: {message}")]
    Decode {
        /// A description of the decoding failure.
        message: String,
    },

    /// An endpoint URL could not be built.
    #[error("invalid endpoint url '{url}': {message}")]
    InvalidUrl {
        /// The offending URL text.
        url: String,
        /// A description of the parse failure.
        message: String,
    },
}

/// Errors that can occur during local filesystem operations.
#[derive(Debug, Error)]
pub enum FilesystemError {
    /// A file or directory was not found.
    #[error("path not found: {path}")]
    NotFound {
        /// The path that was not found.
        path: PathBuf,
    },

    /// Permission denied when accessing a path.
    #[error("permission denied: {path}")]
    PermissionDenied {
        /// The path that could not be accessed.
        path: PathBuf,
    },

    /// An I/O error occurred.
    #[error("I/O error at '{path}': {message}")]
    IoError {
        /// The path where the error occurred.
        path: PathBuf,
        /// A description of the I/O error.
        message: String,
    },

    /// A recursive removal finished but left entries behind.
    #[error("removal of '{path}' left {failed} entries behind; first failure: {first_failure}")]
    RemovalIncomplete {
        /// The root of the removal.
        path: PathBuf,
        /// The number of entries that could not be removed.
        failed: usize,
        /// Rendered description of the first failure encountered.
        first_failure: String,
    },
}

/// Errors raised while provisioning or releasing per-scenario fixtures.
#[derive(Debug, Error)]
pub enum FixtureError {
    /// The remote container or local workspace could not be created.
    #[error("failed to provision {resource}: {message}")]
    ProvisionFailed {
        /// Which fixture resource failed (`remote container` or `local workspace`).
        resource: &'static str,
        /// A description of the failure.
        message: String,
    },

    /// One or both fixture resources could not be released.
    #[error("failed to tear down scenario fixtures: {message}")]
    TeardownFailed {
        /// Every release failure, joined.
        message: String,
    },

    /// A blocking fixture call was attempted from inside an async context.
    #[error("fixture operations need a blocking context: {message}")]
    RuntimeUnavailable {
        /// A description of the runtime problem.
        message: String,
    },
}

/// A postcondition did not hold.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("assertion failed: {message}")]
pub struct AssertionFailure {
    /// What was expected and what was observed.
    pub message: String,
}

impl AssertionFailure {
    /// Build an assertion failure from a rendered message.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Errors raised by a single scenario step.
#[derive(Debug, Error)]
pub enum StepError {
    /// The storage API rejected the step's call.
    #[error(transparent)]
    Api(#[from] ApiError),

    /// The local workspace could not be read or written.
    #[error(transparent)]
    Filesystem(#[from] FilesystemError),

    /// An expected postcondition did not hold.
    #[error(transparent)]
    Assertion(#[from] AssertionFailure),

    /// The step refers to "that folder/file" but no step produced a result yet.
    #[error("step '{step}' needs a previous result, but none was recorded")]
    MissingResult {
        /// The step that needed a result.
        step: String,
    },

    /// A handler asked for a placeholder its phrase does not bind.
    #[error("step has no argument named '{name}'")]
    MissingArgument {
        /// The placeholder name.
        name: String,
    },

    /// No registered phrase matches the step text.
    #[error("undefined step: {text}")]
    UndefinedStep {
        /// The unmatched step text.
        text: String,
    },

    /// The step body panicked.
    #[error("step panicked: {message}")]
    Panicked {
        /// The panic payload, when it was a string.
        message: String,
    },
}

/// A step phrase could not be compiled into a matcher.
#[derive(Debug, Error)]
#[error("invalid step phrase '{phrase}': {message}")]
pub struct PhraseError {
    /// The phrase as registered.
    pub phrase: String,
    /// Why it was rejected.
    pub message: String,
}

/// Verdict of a scenario run that did not pass.
///
/// Teardown failures never mask a step failure: when both happen the step
/// failure is reported first and the teardown failure is carried alongside.
#[derive(Debug, Error)]
pub enum ScenarioError {
    /// Fixtures could not be provisioned; no step ran.
    #[error("scenario setup failed: {0}")]
    Setup(FixtureError),

    /// A step failed and teardown succeeded.
    #[error("scenario failed: {0}")]
    Step(StepError),

    /// Every step passed but teardown failed.
    #[error("scenario passed but teardown failed: {0}")]
    Teardown(FixtureError),

    /// A step failed and teardown failed as well.
    #[error("scenario failed: {step}; teardown also failed: {teardown}")]
    StepAndTeardown {
        /// The original step failure.
        step: StepError,
        /// The teardown failure reported alongside it.
        teardown: FixtureError,
    },
}

impl ScenarioError {
    /// Return the step failure, if the scenario had one.
    #[must_use]
    pub const fn step_error(&self) -> Option<&StepError> {
        match self {
            Self::Step(step) | Self::StepAndTeardown { step, .. } => Some(step),
            Self::Setup(_) | Self::Teardown(_) => None,
        }
    }

    /// Return the teardown failure, if release failed.
    #[must_use]
    pub const fn teardown_error(&self) -> Option<&FixtureError> {
        match self {
            Self::Teardown(teardown) | Self::StepAndTeardown { teardown, .. } => Some(teardown),
            Self::Setup(_) | Self::Step(_) => None,
        }
    }
}

/// Top-level error type for the boxharness library.
///
/// At the binary boundary these errors are converted to `eyre::Report` for
/// human-readable reporting.
#[derive(Debug, Error)]
pub enum HarnessError {
    /// An error occurred during configuration.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The storage API rejected a call.
    #[error(transparent)]
    Api(#[from] ApiError),

    /// A local filesystem operation failed.
    #[error(transparent)]
    Filesystem(#[from] FilesystemError),

    /// Fixture provisioning or release failed.
    #[error(transparent)]
    Fixture(#[from] FixtureError),

    /// The step vocabulary could not be built.
    #[error(transparent)]
    Phrase(#[from] PhraseError),

    /// A feature file could not be read or parsed.
    #[error("failed to load feature '{path}': {message}")]
    Feature {
        /// The feature file path.
        path: PathBuf,
        /// A description of the parse failure.
        message: String,
    },
}

/// A specialised `Result` type for boxharness operations.
pub type Result<T> = std::result::Result<T, HarnessError>;
