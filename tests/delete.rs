//! Integration tests for keychain deletion.

mod common;

use common::ScriptedRunner;
use kodegen_bundler_keychain::{ProvisionError, Provisioner};

#[tokio::test]
async fn test_delete_issues_single_command() {
    let provisioner = Provisioner::new(ScriptedRunner::new());

    provisioner.delete("ci-store").await.unwrap();

    assert_eq!(
        provisioner.runner().calls(),
        vec![vec!["delete-keychain", "ci-store.keychain"]]
    );
}

#[tokio::test]
async fn test_delete_rejects_suffixed_name() {
    let provisioner = Provisioner::new(ScriptedRunner::new());

    let err = provisioner.delete("ci-store.keychain").await.unwrap_err();

    assert!(matches!(err, ProvisionError::Validation(_)));
    assert!(provisioner.runner().calls().is_empty());
}

#[tokio::test]
async fn test_delete_failure_propagates() {
    let provisioner = Provisioner::new(ScriptedRunner::new().fail_at(
        0,
        50,
        "security: SecKeychainDelete: The specified keychain could not be found.",
    ));

    let err = provisioner.delete("missing").await.unwrap_err();

    assert_eq!(
        err.diagnostic(),
        Some("security: SecKeychainDelete: The specified keychain could not be found.")
    );
}
