//! Store error type

use agency_model::ResourceKind;

/// Errors raised by stores and directories
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    /// Backend could not be reached or refused the operation
    #[error("{kind} unavailable: {reason}")]
    Unavailable { kind: ResourceKind, reason: String },

    /// Foreign-key or uniqueness rule violated
    #[error("constraint violated on {kind}: {reason}")]
    Constraint { kind: ResourceKind, reason: String },

    /// Credential is not known to the directory
    #[error("unknown credential")]
    UnknownCredential,

    /// Directory backend failure
    #[error("directory error: {0}")]
    Directory(String),
}

impl StoreError {
    /// Create an unavailable error
    #[inline]
    pub fn unavailable(kind: ResourceKind, reason: impl Into<String>) -> Self {
        Self::Unavailable {
            kind,
            reason: reason.into(),
        }
    }

    /// Create a constraint error
    #[inline]
    pub fn constraint(kind: ResourceKind, reason: impl Into<String>) -> Self {
        Self::Constraint {
            kind,
            reason: reason.into(),
        }
    }

    /// Resource kind the error concerns, if any
    #[inline]
    #[must_use]
    pub fn kind(&self) -> Option<ResourceKind> {
        match self {
            Self::Unavailable { kind, .. } | Self::Constraint { kind, .. } => Some(*kind),
            Self::UnknownCredential | Self::Directory(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_names_the_collection() {
        let err = StoreError::unavailable(ResourceKind::Task, "connection reset");
        assert_eq!(err.to_string(), "tasks unavailable: connection reset");
        assert_eq!(err.kind(), Some(ResourceKind::Task));
        assert_eq!(StoreError::UnknownCredential.kind(), None);
    }
}
