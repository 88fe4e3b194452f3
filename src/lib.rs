//! Temporary keychain provisioning for CI code signing
//!
//! Creates an isolated macOS keychain, imports a PKCS#12 bundle into it and
//! lets `codesign` use the key without interactive prompts. All keychain work
//! is delegated to the system `security` tool.

#[macro_use]
pub mod prompts;

pub mod config;
pub mod error;
pub mod keychain;

// Re-export common types
pub use config::ProvisionConfig;
pub use error::{ProvisionError, Result};
pub use keychain::{
    DryRunRunner, ProvisionOptions, ProvisionRequest, Provisioner, SecurityCommand,
    SecurityOutput, SecurityRunner, SystemRunner, delete_keychain, provision_keychain,
};
