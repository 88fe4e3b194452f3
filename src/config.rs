//! Configuration file for keychain provisioning.
//!
//! Passwords are never read from this file; they come from the command line
//! or the `KEYCHAIN_PASSWORD` / `CERTIFICATE_PASSWORD` environment variables.

use crate::error::{ProvisionError, Result};
use crate::keychain::command::DEFAULT_LOCK_TIMEOUT_SECS;
use crate::keychain::{
    DEFAULT_ADMIN_TOOL, DEFAULT_LOGIN_KEYCHAIN, DEFAULT_SIGNING_TOOL, ProvisionOptions,
    SECURITY_PROGRAM,
};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Provisioning settings loaded from TOML.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProvisionConfig {
    /// Keychain name without the `.keychain` suffix
    #[serde(default)]
    pub keychain: Option<String>,

    #[serde(default = "default_true")]
    pub setup_new_keychain: bool,

    #[serde(default)]
    pub certificate_path: Option<PathBuf>,

    #[serde(default = "default_signing_tool")]
    pub signing_tool: String,

    #[serde(default = "default_admin_tool")]
    pub admin_tool: String,

    #[serde(default = "default_login_keychain")]
    pub login_keychain: String,

    #[serde(default = "default_lock_timeout")]
    pub lock_timeout_secs: u32,

    /// Accept unencrypted bundles (empty certificate password)
    #[serde(default = "default_true")]
    pub allow_empty_certificate_password: bool,

    #[serde(default = "default_security_program")]
    pub security_program: String,

    /// Print commands without running them
    #[serde(default)]
    pub dry_run: bool,

    #[serde(default)]
    pub verbose: bool,
}

impl Default for ProvisionConfig {
    fn default() -> Self {
        Self {
            keychain: None,
            setup_new_keychain: true,
            certificate_path: None,
            signing_tool: default_signing_tool(),
            admin_tool: default_admin_tool(),
            login_keychain: default_login_keychain(),
            lock_timeout_secs: default_lock_timeout(),
            allow_empty_certificate_password: true,
            security_program: default_security_program(),
            dry_run: false,
            verbose: false,
        }
    }
}

impl ProvisionConfig {
    /// Load and validate a TOML config file.
    pub async fn load(path: &Path) -> Result<Self> {
        let content = tokio::fs::read_to_string(path).await?;
        let config: Self = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.lock_timeout_secs == 0 {
            return Err(ProvisionError::InvalidConfig(
                "lock_timeout_secs must be greater than zero".to_string(),
            ));
        }

        for (field, value) in [
            ("signing_tool", &self.signing_tool),
            ("admin_tool", &self.admin_tool),
            ("login_keychain", &self.login_keychain),
            ("security_program", &self.security_program),
        ] {
            if value.trim().is_empty() {
                return Err(ProvisionError::InvalidConfig(format!(
                    "{field} cannot be empty"
                )));
            }
        }

        Ok(())
    }

    #[must_use]
    pub fn options(&self) -> ProvisionOptions {
        ProvisionOptions {
            signing_tool: self.signing_tool.clone(),
            admin_tool: self.admin_tool.clone(),
            login_keychain: self.login_keychain.clone(),
            lock_timeout_secs: self.lock_timeout_secs,
            allow_empty_certificate_password: self.allow_empty_certificate_password,
            verbose: self.verbose,
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_signing_tool() -> String {
    DEFAULT_SIGNING_TOOL.to_string()
}

fn default_admin_tool() -> String {
    DEFAULT_ADMIN_TOOL.to_string()
}

fn default_login_keychain() -> String {
    DEFAULT_LOGIN_KEYCHAIN.to_string()
}

fn default_lock_timeout() -> u32 {
    DEFAULT_LOCK_TIMEOUT_SECS
}

fn default_security_program() -> String {
    SECURITY_PROGRAM.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_file_uses_defaults() {
        let config: ProvisionConfig = toml::from_str("").unwrap();

        assert!(config.setup_new_keychain);
        assert!(config.allow_empty_certificate_password);
        assert_eq!(config.lock_timeout_secs, 21_600);
        assert_eq!(config.signing_tool, "/usr/bin/codesign");
        assert_eq!(config.admin_tool, "/usr/bin/security");
        assert_eq!(config.login_keychain, "login.keychain");
        assert_eq!(config.security_program, "security");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_full_file_parses() {
        let config: ProvisionConfig = toml::from_str(
            r#"
            keychain = "ci-store"
            setup_new_keychain = false
            certificate_path = "/tmp/cert.p12"
            lock_timeout_secs = 600
            allow_empty_certificate_password = false
            verbose = true
            "#,
        )
        .unwrap();

        assert_eq!(config.keychain.as_deref(), Some("ci-store"));
        assert!(!config.setup_new_keychain);
        assert_eq!(config.certificate_path, Some(PathBuf::from("/tmp/cert.p12")));

        let options = config.options();
        assert_eq!(options.lock_timeout_secs, 600);
        assert!(!options.allow_empty_certificate_password);
        assert!(options.verbose);
    }

    #[test]
    fn test_passwords_are_not_accepted_in_file() {
        let result: std::result::Result<ProvisionConfig, _> =
            toml::from_str(r#"keychain_password = "secret""#);
        assert!(result.is_err());
    }

    #[test]
    fn test_zero_lock_timeout_rejected() {
        let config = ProvisionConfig {
            lock_timeout_secs: 0,
            ..ProvisionConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ProvisionError::InvalidConfig(_))
        ));
    }

    #[tokio::test]
    async fn test_load_from_disk() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("keychain.toml");
        tokio::fs::write(&path, "keychain = \"ci-store\"\nsigning_tool = \"\"\n")
            .await
            .unwrap();

        let err = ProvisionConfig::load(&path).await.unwrap_err();
        assert!(err.to_string().contains("signing_tool"));

        tokio::fs::write(&path, "keychain = \"ci-store\"\n").await.unwrap();
        let config = ProvisionConfig::load(&path).await.unwrap();
        assert_eq!(config.keychain.as_deref(), Some("ci-store"));
    }
}
