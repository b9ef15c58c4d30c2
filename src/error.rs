//! Muninn error types

/// Muninn error types
#[derive(Debug, thiserror::Error)]
pub enum MuninnError {
    // Configuration errors
    #[error("configuration error: {0}")]
    Configuration(String),

    // Misuse errors
    /// `LruStore::add` was called for a key that is already cached.
    #[error("key already present: {0}")]
    DuplicateKey(String),

    /// A lookup that expects at most one primary key found several.
    #[error("collection '{key}' holds {count} keys, expected at most one")]
    NotSingleton { key: String, count: usize },

    /// A predicate references a parameter that was not supplied.
    #[error("missing parameter {{{index}}} ({provided} provided)")]
    MissingParameter { index: usize, provided: usize },
}

/// Result type alias for Muninn operations
pub type Result<T> = std::result::Result<T, MuninnError>;
