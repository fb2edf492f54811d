//! Provider clients
//!
//! One adapter per backend in the closed provider set. Anthropic speaks its
//! own messages API; OpenAI and Ollama share the OpenAI-compatible chat
//! completions transport.

pub mod anthropic;
pub mod openai;

pub use anthropic::AnthropicClient;
pub use openai::OpenAiClient;

use secrecy::SecretString;

use crate::config::ProviderKind;
use crate::error::RefineError;

/// Resolve a provider credential: an explicit config value wins, then the
/// named environment variable
pub(crate) fn resolve_credential(
    provider: ProviderKind,
    explicit: Option<&SecretString>,
    env_var: &'static str,
) -> Result<SecretString, RefineError> {
    if let Some(key) = explicit {
        return Ok(key.clone());
    }

    match std::env::var(env_var) {
        Ok(value) if !value.trim().is_empty() => Ok(SecretString::from(value)),
        _ => Err(RefineError::MissingCredential { provider, env_var }),
    }
}

#[cfg(test)]
mod tests {
    use secrecy::ExposeSecret;

    use super::*;

    #[test]
    fn explicit_key_wins() {
        let key = SecretString::from("sk-explicit".to_string());
        let resolved = resolve_credential(
            ProviderKind::Anthropic,
            Some(&key),
            "VOXPIPE_TEST_UNSET_VARIABLE",
        )
        .unwrap();
        assert_eq!(resolved.expose_secret(), "sk-explicit");
    }

    #[test]
    fn absent_everywhere_is_missing_credential() {
        let err = resolve_credential(
            ProviderKind::OpenAi,
            None,
            "VOXPIPE_TEST_UNSET_VARIABLE",
        )
        .unwrap_err();
        assert!(matches!(
            err,
            RefineError::MissingCredential {
                provider: ProviderKind::OpenAi,
                env_var: "VOXPIPE_TEST_UNSET_VARIABLE",
            }
        ));
    }
}
