//! Temporary keychain operations for CI signing
//!
//! This module provides functionality for:
//! - Building `security` commands with redacted secrets
//! - Running them through a pluggable runner
//! - Validating caller input before anything runs
//! - Provisioning and deleting a keychain

pub mod command;
mod provision;
mod runner;
mod validation;

// Re-export public APIs
pub use command::{KEYCHAIN_SUFFIX, SecurityCommand, keychain_file_name};
pub use provision::{
    DEFAULT_ADMIN_TOOL, DEFAULT_LOGIN_KEYCHAIN, DEFAULT_SIGNING_TOOL, ProvisionOptions,
    ProvisionRequest, Provisioner, delete_keychain, provision_keychain,
};
pub use runner::{DryRunRunner, SECURITY_PROGRAM, SecurityOutput, SecurityRunner, SystemRunner};
pub use validation::{validate_keychain_name, validate_request};
