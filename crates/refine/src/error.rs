//! Refinement errors
//!
//! The taxonomy distinguishes setup problems (unknown or unconfigured
//! provider, missing credential, template directory issues) from processing
//! failures (transport, server, response decoding). Use
//! [`RefineError::is_configuration`] to tell them apart.

use thiserror::Error;

use crate::templates::TemplateError;

/// Errors that can occur during refinement
#[derive(Debug, Error)]
pub enum RefineError {
    /// Template rendering failed
    #[error(transparent)]
    Template(#[from] TemplateError),

    /// Provider name outside the closed provider set
    #[error("Unknown provider: {0}")]
    UnknownProvider(String),

    /// The selected provider has no configuration section
    #[error("Provider '{0}' is not configured")]
    ProviderNotConfigured(crate::config::ProviderKind),

    /// Required credential absent from config and environment
    #[error("Missing credential for provider '{provider}': set {env_var}")]
    MissingCredential {
        /// Provider that needs the credential
        provider: crate::config::ProviderKind,
        /// Environment variable consulted
        env_var: &'static str,
    },

    /// Failed to connect to the provider
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// Request to the provider failed
    #[error("Request failed: {0}")]
    RequestFailed(String),

    /// Timeout during the provider call
    #[error("Provider timeout after {0}ms")]
    Timeout(u64),

    /// Provider returned a non-success status
    #[error("Server error: {0}")]
    ServerError(String),

    /// Provider response could not be interpreted
    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

impl RefineError {
    /// Whether this error is a setup problem rather than a processing
    /// failure
    #[must_use]
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Self::Template(TemplateError::NotConfigured { .. } | TemplateError::NotFound { .. })
                | Self::UnknownProvider(_)
                | Self::ProviderNotConfigured(_)
                | Self::MissingCredential { .. }
        )
    }
}

impl From<reqwest::Error> for RefineError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout(30_000)
        } else if err.is_connect() {
            Self::ConnectionFailed(err.to_string())
        } else {
            Self::RequestFailed(err.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;
    use crate::config::ProviderKind;

    #[test]
    fn unknown_provider_names_the_offender() {
        let err = RefineError::UnknownProvider("bogus".to_string());
        assert_eq!(err.to_string(), "Unknown provider: bogus");
    }

    #[test]
    fn missing_credential_names_provider_and_variable() {
        let err = RefineError::MissingCredential {
            provider: ProviderKind::Anthropic,
            env_var: "ANTHROPIC_API_KEY",
        };
        assert_eq!(
            err.to_string(),
            "Missing credential for provider 'anthropic': set ANTHROPIC_API_KEY"
        );
    }

    #[test]
    fn provider_not_configured_message() {
        let err = RefineError::ProviderNotConfigured(ProviderKind::OpenAi);
        assert_eq!(err.to_string(), "Provider 'openai' is not configured");
    }

    #[test]
    fn configuration_errors_are_flagged() {
        assert!(RefineError::UnknownProvider("x".to_string()).is_configuration());
        assert!(RefineError::ProviderNotConfigured(ProviderKind::Ollama).is_configuration());
        assert!(RefineError::MissingCredential {
            provider: ProviderKind::OpenAi,
            env_var: "OPENAI_API_KEY",
        }
        .is_configuration());
        assert!(RefineError::Template(TemplateError::NotFound {
            template: "x.tera".to_string(),
            dir: PathBuf::from("/prompts"),
        })
        .is_configuration());
    }

    #[test]
    fn processing_errors_are_not_configuration() {
        assert!(!RefineError::ServerError("500".to_string()).is_configuration());
        assert!(!RefineError::ConnectionFailed("refused".to_string()).is_configuration());
        assert!(!RefineError::InvalidResponse("bad json".to_string()).is_configuration());
        assert!(
            !RefineError::Template(TemplateError::Render("oops".to_string())).is_configuration()
        );
    }
}
