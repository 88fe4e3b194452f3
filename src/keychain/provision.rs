//! Temporary keychain provisioning for CI/CD code signing
//!
//! Creates (or reuses) a named keychain, imports a PKCS#12 bundle, and makes
//! the key usable by `codesign` without password prompts. Commands run one
//! at a time; the first failure aborts the sequence and nothing already done
//! is rolled back. Call [`Provisioner::delete`] to tear the keychain down.
//!
//! The imported key is reachable by any process that can open the keychain.
//! That is only appropriate on ephemeral CI hosts where the keychain is
//! deleted when the job finishes.

use super::command::{self, DEFAULT_LOCK_TIMEOUT_SECS, SecurityCommand};
use super::runner::{SecurityRunner, SystemRunner};
use super::validation::{validate_keychain_name, validate_request};
use crate::error::{ProvisionError, Result};
use std::path::PathBuf;
use zeroize::Zeroizing;

/// Tool granted access to the imported key for signing.
pub const DEFAULT_SIGNING_TOOL: &str = "/usr/bin/codesign";

/// Keychain administration tool, also granted access to the imported key.
pub const DEFAULT_ADMIN_TOOL: &str = "/usr/bin/security";

/// Keychain kept behind the new one in the user search list.
pub const DEFAULT_LOGIN_KEYCHAIN: &str = "login.keychain";

/// Inputs for a single provisioning call.
pub struct ProvisionRequest {
    /// Keychain name without the `.keychain` suffix.
    pub keychain: String,
    /// Create the keychain first; otherwise it must already exist.
    pub setup_new_keychain: bool,
    pub keychain_password: Zeroizing<String>,
    pub certificate_path: PathBuf,
    pub certificate_password: Zeroizing<String>,
}

impl ProvisionRequest {
    /// Request that creates a new keychain.
    pub fn new(
        keychain: impl Into<String>,
        keychain_password: &str,
        certificate_path: impl Into<PathBuf>,
        certificate_password: &str,
    ) -> Self {
        Self {
            keychain: keychain.into(),
            setup_new_keychain: true,
            keychain_password: Zeroizing::new(keychain_password.to_string()),
            certificate_path: certificate_path.into(),
            certificate_password: Zeroizing::new(certificate_password.to_string()),
        }
    }

    /// Reuse a keychain that already exists instead of creating one.
    #[must_use]
    pub fn existing_keychain(mut self) -> Self {
        self.setup_new_keychain = false;
        self
    }
}

/// Tunables that stay fixed across calls.
#[derive(Debug, Clone)]
pub struct ProvisionOptions {
    pub signing_tool: String,
    pub admin_tool: String,
    pub login_keychain: String,
    pub lock_timeout_secs: u32,
    pub allow_empty_certificate_password: bool,
    /// Print each command (secrets redacted) before running it.
    pub verbose: bool,
}

impl Default for ProvisionOptions {
    fn default() -> Self {
        Self {
            signing_tool: DEFAULT_SIGNING_TOOL.to_string(),
            admin_tool: DEFAULT_ADMIN_TOOL.to_string(),
            login_keychain: DEFAULT_LOGIN_KEYCHAIN.to_string(),
            lock_timeout_secs: DEFAULT_LOCK_TIMEOUT_SECS,
            allow_empty_certificate_password: true,
            verbose: false,
        }
    }
}

/// Issues the provisioning sequence through a [`SecurityRunner`].
#[derive(Debug, Clone)]
pub struct Provisioner<R> {
    runner: R,
    options: ProvisionOptions,
}

impl<R: SecurityRunner> Provisioner<R> {
    pub fn new(runner: R) -> Self {
        Self::with_options(runner, ProvisionOptions::default())
    }

    pub fn with_options(runner: R, options: ProvisionOptions) -> Self {
        Self { runner, options }
    }

    #[must_use]
    pub fn options(&self) -> &ProvisionOptions {
        &self.options
    }

    #[must_use]
    pub fn runner(&self) -> &R {
        &self.runner
    }

    /// Provision the keychain described by `request`.
    ///
    /// # Returns
    /// * `Ok(String)` - stdout of every issued command, concatenated in order
    /// * `Err(ProvisionError::Validation)` - bad input, nothing was run
    /// * `Err(ProvisionError::CommandFailed)` - a command failed; later ones
    ///   were not issued and earlier effects remain in place
    pub async fn provision(&self, request: &ProvisionRequest) -> Result<String> {
        validate_request(request, self.options.allow_empty_certificate_password)?;

        let keychain = command::keychain_file_name(&request.keychain);
        let password = request.keychain_password.as_str();
        let import = command::import_bundle(
            &keychain,
            &request.certificate_path,
            &request.certificate_password,
            &[
                self.options.signing_tool.as_str(),
                self.options.admin_tool.as_str(),
            ],
        );
        let mut captured = String::new();

        if request.setup_new_keychain {
            self.issue(command::create_keychain(&keychain, password), &mut captured)
                .await?;
            self.issue(
                command::set_lock_timeout(&keychain, self.options.lock_timeout_secs),
                &mut captured,
            )
            .await?;
        }

        self.issue(command::unlock_keychain(&keychain, password), &mut captured)
            .await?;

        self.issue(import, &mut captured).await?;

        self.issue(command::set_partition_list(&keychain, password), &mut captured)
            .await?;

        // Process-wide: concurrent provisioning calls race on this list.
        self.issue(
            command::set_search_list(&keychain, &self.options.login_keychain),
            &mut captured,
        )
        .await?;

        Ok(captured)
    }

    /// Delete a keychain created by [`Provisioner::provision`].
    ///
    /// The user search list is left alone; the deleted entry simply stops
    /// resolving.
    pub async fn delete(&self, keychain: &str) -> Result<()> {
        validate_keychain_name(keychain)?;

        let keychain = command::keychain_file_name(keychain);
        let mut discarded = String::new();
        self.issue(command::delete_keychain(&keychain), &mut discarded)
            .await
    }

    async fn issue(&self, command: SecurityCommand, captured: &mut String) -> Result<()> {
        if self.options.verbose {
            step!("{command}");
        }

        let output = self.runner.run(&command).await?;

        if !output.success() {
            return Err(ProvisionError::CommandFailed {
                subcommand: command.subcommand().to_string(),
                code: output.code,
                stderr: output.stderr,
            });
        }

        captured.push_str(&output.stdout);
        Ok(())
    }
}

/// Provision a keychain with the system `security` tool and default options.
pub async fn provision_keychain(
    keychain: &str,
    setup_new_keychain: bool,
    keychain_password: &str,
    certificate_path: &str,
    certificate_password: &str,
) -> Result<String> {
    let mut request = ProvisionRequest::new(
        keychain,
        keychain_password,
        certificate_path,
        certificate_password,
    );
    request.setup_new_keychain = setup_new_keychain;

    Provisioner::new(SystemRunner::new()).provision(&request).await
}

/// Delete a keychain with the system `security` tool.
pub async fn delete_keychain(keychain: &str) -> Result<()> {
    Provisioner::new(SystemRunner::new()).delete(keychain).await
}
