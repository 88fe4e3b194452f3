//! Input checks run before any `security` command is issued

use super::command::KEYCHAIN_SUFFIX;
use super::provision::ProvisionRequest;
use crate::error::{ProvisionError, Result};

/// Reject names that already carry the keychain suffix.
///
/// The suffix is always appended by this crate, so `ci.keychain` would
/// otherwise address `ci.keychain.keychain`.
pub fn validate_keychain_name(keychain: &str) -> Result<()> {
    if keychain.is_empty() {
        return Err(ProvisionError::Validation(
            "Keychain name cannot be empty".to_string(),
        ));
    }

    if keychain.ends_with(KEYCHAIN_SUFFIX) {
        return Err(ProvisionError::Validation(format!(
            "Keychain name '{keychain}' must not end with '{KEYCHAIN_SUFFIX}'; \
             the suffix is appended automatically"
        )));
    }

    Ok(())
}

/// Check every precondition of a provisioning request.
///
/// An empty certificate password is accepted unless
/// `allow_empty_certificate_password` is false; unencrypted bundles need it.
pub fn validate_request(
    request: &ProvisionRequest,
    allow_empty_certificate_password: bool,
) -> Result<()> {
    validate_keychain_name(&request.keychain)?;

    if request.certificate_path.as_os_str().is_empty() {
        return Err(ProvisionError::Validation(
            "Certificate path cannot be empty".to_string(),
        ));
    }

    if request.keychain_password.is_empty() {
        return Err(ProvisionError::Validation(
            "Keychain password cannot be empty".to_string(),
        ));
    }

    if !allow_empty_certificate_password && request.certificate_password.is_empty() {
        return Err(ProvisionError::Validation(
            "Certificate password cannot be empty".to_string(),
        ));
    }

    Ok(())
}
