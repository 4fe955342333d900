//! Error handling for chartform
//!
//! The error system follows two rules:
//! 1. **Strongly-typed errors** ([`ChartformError`]) so callers can match on
//!    the precise failure of a synthesis run
//! 2. **User-friendly messages** ([`ErrorContext`]) with details and
//!    suggestions for the CLI
//!
//! Library functions return [`anyhow::Result`] carrying a [`ChartformError`];
//! callers that need the typed variant use [`anyhow::Error::downcast_ref`].
//!
//! # Examples
//!
//! ```rust,no_run
//! use chartform::core::{ChartformError, user_friendly_error};
//!
//! let error = ChartformError::CircularDependency {
//!     chain: "web/a => web/b => web/a".to_string(),
//! };
//! let ctx = user_friendly_error(anyhow::Error::from(error));
//! ctx.display();
//! ```

use colored::Colorize;
use std::fmt;
use thiserror::Error;

/// A single message reported by a node's validation hook.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationIssue {
    /// Path of the node that reported the problem (e.g. `web/deploy`)
    pub path: String,
    /// The message returned by the validation hook
    pub message: String,
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.path, self.message)
    }
}

fn format_issues(issues: &[ValidationIssue]) -> String {
    issues.iter().map(ToString::to_string).collect::<Vec<_>>().join("\n  ")
}

/// The main error type for chartform operations.
///
/// # Error Categories
///
/// ## Synthesis
/// - [`ValidationFailed`] - one or more construct nodes reported problems
/// - [`DependencyNotFound`] - a declared dependency had no emitted manifest
/// - [`CircularDependency`] - declared dependencies form a cycle
/// - [`DuplicateResourceName`] - two resources share a name in one stack
///
/// ## Construct tree
/// - [`DuplicateConstructId`] - sibling with the same id already exists
/// - [`InvalidConstructId`] - id is empty or contains a path separator
///
/// ## Input files
/// - [`InvalidResourceReference`] - a `type.name` reference could not be parsed
/// - [`ChartFileParseError`] - a chart file is not valid YAML for the schema
/// - [`UnknownDependency`] - a chart file names a dependency path that does not exist
/// - [`ConfigError`] - `chartform.toml` could not be loaded
///
/// [`ValidationFailed`]: ChartformError::ValidationFailed
/// [`DependencyNotFound`]: ChartformError::DependencyNotFound
/// [`CircularDependency`]: ChartformError::CircularDependency
/// [`DuplicateResourceName`]: ChartformError::DuplicateResourceName
/// [`DuplicateConstructId`]: ChartformError::DuplicateConstructId
/// [`InvalidConstructId`]: ChartformError::InvalidConstructId
/// [`InvalidResourceReference`]: ChartformError::InvalidResourceReference
/// [`ChartFileParseError`]: ChartformError::ChartFileParseError
/// [`UnknownDependency`]: ChartformError::UnknownDependency
/// [`ConfigError`]: ChartformError::ConfigError
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ChartformError {
    /// Validation hooks reported at least one problem.
    ///
    /// The message lists every `[path] message` pair, one per line.
    #[error("Validation failed with the following errors:\n  {}", format_issues(.errors))]
    ValidationFailed {
        /// Every issue reported by the tree, in visiting order
        errors: Vec<ValidationIssue>,
    },

    /// A declared dependency was not emitted before the object depending on it.
    ///
    /// Either the dependency is not an API object of this chart, or the
    /// extraction order is broken.
    #[error("Dependency '{dependency}' of '{resource}' not found in manifests")]
    DependencyNotFound {
        /// Path of the API object declaring the dependency
        resource: String,
        /// Path of the dependency target
        dependency: String,
    },

    /// Declared dependencies form a cycle.
    #[error("Dependency cycle detected: {chain}")]
    CircularDependency {
        /// Paths of the nodes on the cycle joined with `=>`
        chain: String,
    },

    /// A resource with this name or logical id is already registered in the stack.
    #[error("Resource '{name}' is already defined in the stack")]
    DuplicateResourceName {
        /// The conflicting name
        name: String,
    },

    /// A child with the same id already exists under the parent.
    #[error("There is already a construct with id '{id}' in '{parent}'")]
    DuplicateConstructId {
        /// Path of the parent construct
        parent: String,
        /// The conflicting id
        id: String,
    },

    /// The construct id cannot be used.
    #[error("Invalid construct id '{id}': {reason}")]
    InvalidConstructId {
        /// The rejected id
        id: String,
        /// Why it was rejected
        reason: String,
    },

    /// A resource reference is not of the form `<type>.<name>`.
    #[error("Invalid resource reference '{reference}': expected '<type>.<name>'")]
    InvalidResourceReference {
        /// The rejected reference
        reference: String,
    },

    /// A chart file could not be parsed.
    #[error("Failed to parse chart file {file}: {reason}")]
    ChartFileParseError {
        /// The file that failed to parse
        file: String,
        /// Parser message
        reason: String,
    },

    /// A chart file declares a dependency on a path that does not exist.
    #[error("Object '{object}' depends on unknown object '{dependency}'")]
    UnknownDependency {
        /// Path of the declaring object
        object: String,
        /// The dependency path as written
        dependency: String,
        /// Closest existing path, if any
        suggestion: Option<String>,
    },

    /// Configuration file problem.
    #[error("Configuration error: {message}")]
    ConfigError {
        /// Description of the problem
        message: String,
    },

    /// Generic error.
    #[error("{message}")]
    Other {
        /// Generic error message
        message: String,
    },
}

/// Error wrapper carrying a user-facing suggestion and details.
#[derive(Debug)]
pub struct ErrorContext {
    /// The underlying error
    pub error: ChartformError,
    /// Optional suggestion for resolving the error
    pub suggestion: Option<String>,
    /// Optional additional details about the error
    pub details: Option<String>,
}

impl ErrorContext {
    /// Create a new error context with no suggestion or details.
    #[must_use]
    pub const fn new(error: ChartformError) -> Self {
        Self {
            error,
            suggestion: None,
            details: None,
        }
    }

    /// Add a suggestion for resolving the error.
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }

    /// Add additional details explaining the error.
    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    /// Print the error to stderr with terminal colors.
    ///
    /// - Error message: red and bold
    /// - Details: yellow
    /// - Suggestion: green
    pub fn display(&self) {
        eprintln!("{}: {}", "error".red().bold(), self.error);

        if let Some(details) = &self.details {
            eprintln!("{}: {}", "details".yellow(), details);
        }

        if let Some(suggestion) = &self.suggestion {
            eprintln!("{}: {}", "suggestion".green(), suggestion);
        }
    }
}

impl fmt::Display for ErrorContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.error)?;

        if let Some(details) = &self.details {
            write!(f, "\nDetails: {details}")?;
        }

        if let Some(suggestion) = &self.suggestion {
            write!(f, "\nSuggestion: {suggestion}")?;
        }

        Ok(())
    }
}

impl std::error::Error for ErrorContext {}

/// Convert any error into an [`ErrorContext`] suitable for CLI display.
///
/// Recognizes [`ChartformError`] (including when wrapped in anyhow context),
/// [`std::io::Error`], [`serde_yaml::Error`] and [`toml::de::Error`]. Anything
/// else is shown with its full context chain.
#[must_use]
pub fn user_friendly_error(error: anyhow::Error) -> ErrorContext {
    if let Some(chartform_error) = error.downcast_ref::<ChartformError>() {
        return create_error_context(chartform_error.clone());
    }

    if let Some(io_error) = error.downcast_ref::<std::io::Error>() {
        let message = format!("{error:#}");
        return match io_error.kind() {
            std::io::ErrorKind::NotFound => ErrorContext::new(ChartformError::Other {
                message,
            })
            .with_suggestion("Check that the file exists and the path is correct"),
            std::io::ErrorKind::PermissionDenied => ErrorContext::new(ChartformError::Other {
                message,
            })
            .with_suggestion("Check file ownership and permissions"),
            _ => ErrorContext::new(ChartformError::Other {
                message,
            }),
        };
    }

    if error.downcast_ref::<toml::de::Error>().is_some() {
        return ErrorContext::new(ChartformError::ConfigError {
            message: format!("{error:#}"),
        })
        .with_suggestion("Check the TOML syntax of chartform.toml");
    }

    if error.downcast_ref::<serde_yaml::Error>().is_some() {
        return ErrorContext::new(ChartformError::Other {
            message: format!("{error:#}"),
        })
        .with_suggestion("Check the YAML syntax of the chart file");
    }

    ErrorContext::new(ChartformError::Other {
        message: format!("{error:#}"),
    })
}

fn create_error_context(error: ChartformError) -> ErrorContext {
    match &error {
        ChartformError::ValidationFailed {
            errors,
        } => {
            let count = errors.len();
            ErrorContext::new(error)
                .with_details(format!("{count} validation problem(s) reported; nothing was synthesized"))
        }
        ChartformError::DependencyNotFound {
            ..
        } => ErrorContext::new(error)
            .with_details("Dependencies must point at API objects owned by the same chart")
            .with_suggestion(
                "Depend on the API object itself rather than a container or an object of a nested chart",
            ),
        ChartformError::CircularDependency {
            ..
        } => ErrorContext::new(error)
            .with_suggestion("Remove one of the dependencies on the cycle"),
        ChartformError::DuplicateResourceName {
            ..
        } => ErrorContext::new(error)
            .with_details("Manifest names are built from chart, apiVersion, kind, name and namespace")
            .with_suggestion("Give the colliding objects distinct metadata names or namespaces"),
        ChartformError::DuplicateConstructId {
            ..
        } => ErrorContext::new(error).with_suggestion("Use a unique id for each sibling"),
        ChartformError::UnknownDependency {
            suggestion,
            ..
        } => {
            let hint = suggestion
                .as_ref()
                .map(|s| format!("Did you mean '{s}'?"))
                .unwrap_or_else(|| "Dependency paths are relative to the chart root".to_string());
            ErrorContext::new(error).with_suggestion(hint)
        }
        ChartformError::ConfigError {
            ..
        } => ErrorContext::new(error)
            .with_suggestion("Check chartform.toml or the file passed with --config"),
        _ => ErrorContext::new(error),
    }
}
