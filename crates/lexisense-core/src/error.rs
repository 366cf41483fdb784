use thiserror::Error;

pub type Result<T> = std::result::Result<T, LexiError>;

#[derive(Debug, Error)]
pub enum LexiError {
    #[error("validation failed: {0}")]
    Validation(String),

    #[error("embedding provider is not configured")]
    EmbedderNotConfigured,

    #[error("embedding provider returned status {status}")]
    EmbedderStatus { status: u16 },

    #[error("embedding provider returned an unusable response: {0}")]
    EmbedderResponse(String),

    #[error("embedding provider still loading after {attempts} attempts")]
    EmbedderLoading { attempts: u32 },

    #[error(transparent)]
    Http(#[from] reqwest::Error),

    #[error("internal error: {0}")]
    Internal(String),
}

impl LexiError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "VALIDATION_FAILED",
            Self::EmbedderNotConfigured => "EMBEDDER_NOT_CONFIGURED",
            Self::EmbedderStatus { .. } => "EMBEDDER_STATUS",
            Self::EmbedderResponse(_) => "EMBEDDER_RESPONSE",
            Self::EmbedderLoading { .. } => "EMBEDDER_LOADING",
            Self::Http(_) => "HTTP_ERROR",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }

    #[must_use]
    pub fn lock_poisoned(name: &str) -> Self {
        Self::Internal(format!("{name} lock poisoned"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_are_stable_per_variant() {
        assert_eq!(
            LexiError::Validation("x".to_string()).code(),
            "VALIDATION_FAILED"
        );
        assert_eq!(
            LexiError::EmbedderStatus { status: 500 }.code(),
            "EMBEDDER_STATUS"
        );
        assert_eq!(LexiError::lock_poisoned("store").code(), "INTERNAL_ERROR");
    }

    #[test]
    fn lock_poisoned_names_the_lock() {
        let err = LexiError::lock_poisoned("session store");
        assert_eq!(err.to_string(), "internal error: session store lock poisoned");
    }
}
