//! Result and error types for Locus.

use thiserror::Error;

/// Result type for Locus operations
pub type LocusResult<T> = Result<T, LocusError>;

/// Errors that can occur in Locus
#[derive(Debug, Error)]
pub enum LocusError {
    /// Locator prefix is not a known strategy keyword
    #[error("Locator type: {keyword} is not supported")]
    UnsupportedLocatorStrategy {
        /// Offending keyword as written
        keyword: String,
    },

    /// Locator string with nothing to match on
    #[error("Locator string is empty")]
    EmptyLocator,

    /// Placeholder count differs from the supplied argument count
    #[error("Locator template {template:?} expects {expected} argument(s), got {actual}")]
    LocatorBindingArityError {
        /// Raw template
        template: String,
        /// Placeholders found in the template
        expected: usize,
        /// Arguments supplied
        actual: usize,
    },

    /// A css segment was combined with a non-css segment
    #[error(
        "Can't build the full locator of {child:?} under {parent:?}: \
         css locators only combine with css locators"
    )]
    MixedStrategyCompositionError {
        /// Ancestor locator
        parent: String,
        /// Descendant locator
        child: String,
    },

    /// A node built from a literal handle has no locator expression
    #[error("Node is pinned to a literal element handle and has no locator expression")]
    PinnedHandleHasNoLocator,

    /// Zero matches for a single-element lookup
    #[error("No element found for '{locator}'")]
    ElementNotFound {
        /// Locator that matched nothing
        locator: String,
    },

    /// Handle detached from the document (recovered by re-resolution)
    #[error("Stale element reference while resolving '{locator}'")]
    StaleElement {
        /// Locator being resolved
        locator: String,
    },

    /// Staleness persisted through every allowed re-resolution
    #[error("Element '{locator}' was still stale after {attempts} attempt(s)")]
    StaleElementRetriesExhausted {
        /// Locator being resolved
        locator: String,
        /// Resolution attempts made
        attempts: u32,
    },

    /// Reached the bottom of the document without finding the element
    #[error("At the end of page ({scroll_height}px), element '{locator}' not found")]
    ScrollSearchExhausted {
        /// Locator searched for
        locator: String,
        /// Document scroll height at the start of the search
        scroll_height: u32,
    },

    /// Operation timed out
    #[error("Timed out after {ms}ms waiting for {waited_for}{}", last_error_suffix(.cause))]
    Timeout {
        /// Timeout in milliseconds
        ms: u64,
        /// What was waited for
        waited_for: String,
        /// Last swallowed error, if any
        cause: Option<String>,
    },

    /// Driver command failed
    #[error("Driver error: {message}")]
    Driver {
        /// Error message
        message: String,
    },

    /// Invalid configuration value
    #[error("Configuration error: {message}")]
    Config {
        /// Error message
        message: String,
    },

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml_ng::Error),
}

fn last_error_suffix(cause: &Option<String>) -> String {
    cause
        .as_deref()
        .map(|c| format!(" (last error: {c})"))
        .unwrap_or_default()
}

impl LocusError {
    /// Whether the error is expected DOM-timing noise that polling absorbs.
    ///
    /// Grammar, arity and composition errors are programmer errors and are
    /// never retried.
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::ElementNotFound { .. }
                | Self::StaleElement { .. }
                | Self::StaleElementRetriesExhausted { .. }
                | Self::Driver { .. }
        )
    }

    /// Whether the error reports a detached handle
    #[must_use]
    pub const fn is_stale(&self) -> bool {
        matches!(self, Self::StaleElement { .. })
    }
}
