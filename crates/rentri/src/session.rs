// SPDX-FileCopyrightText: 2026 Rentri Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Credential loading and service wiring shared by the authenticated commands.

use std::path::Path;
use std::sync::Arc;

use rentri_auth::CredentialStore;
use rentri_client::RemoteService;
use rentri_config::RentriConfig;
use rentri_config::model::CredentialConfig;
use rentri_core::RentriError;
use secrecy::{ExposeSecret, SecretString};

use crate::prompt;

/// Loads the credential bundle and builds the remote service on top of it.
pub async fn connect(
    config: &RentriConfig,
) -> Result<(RemoteService, Arc<CredentialStore>), RentriError> {
    let bundle_path = bundle_path(&config.credential)?;

    let passphrase = match &config.credential.passphrase {
        Some(configured) => Some(SecretString::from(configured.clone())),
        None => prompt::passphrase(bundle_path).await?,
    };

    let store = Arc::new(CredentialStore::load(
        Path::new(bundle_path),
        passphrase.as_ref().map(|p| p.expose_secret()),
        config.credential.fiscal_code.as_deref(),
        &config.api.audience,
    )?);
    let service = RemoteService::from_config(config, store.clone())?;
    Ok((service, store))
}

fn bundle_path(credential: &CredentialConfig) -> Result<&str, RentriError> {
    credential.bundle_path.as_deref().ok_or_else(|| {
        RentriError::Config(
            "credential.bundle_path is not set (or RENTRI_CREDENTIAL_BUNDLE_PATH)".to_string(),
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_bundle_path_is_a_config_error() {
        let credential = CredentialConfig {
            bundle_path: None,
            passphrase: None,
            fiscal_code: Some("RSSMRA80A01H501U".to_string()),
        };
        let err = bundle_path(&credential).unwrap_err();
        assert!(err.to_string().contains("credential.bundle_path"));
    }

    #[test]
    fn fiscal_code_is_optional() {
        let credential = CredentialConfig {
            bundle_path: Some("/tmp/cert.p12".to_string()),
            passphrase: Some("x".to_string()),
            fiscal_code: None,
        };
        assert_eq!(bundle_path(&credential).unwrap(), "/tmp/cert.p12");
    }

    #[tokio::test]
    async fn unreadable_bundle_fails_before_any_request() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = RentriConfig::default();
        config.credential = CredentialConfig {
            bundle_path: Some(dir.path().join("missing.p12").display().to_string()),
            passphrase: Some("secret".to_string()),
            fiscal_code: None,
        };
        let err = connect(&config).await.err().unwrap();
        assert!(matches!(err, RentriError::InvalidCredential { .. }));
    }
}
