//! `security` invocations issued by the provisioner
//!
//! Every command is built as a [`SecurityCommand`] whose secret arguments are
//! kept apart from plain ones, so the command can be logged without leaking
//! passwords.

use std::ffi::{OsStr, OsString};
use std::fmt;
use std::path::Path;
use zeroize::Zeroizing;

/// Suffix `security` uses for keychain files; appended to caller names.
pub const KEYCHAIN_SUFFIX: &str = ".keychain";

/// Idle period after which a freshly created keychain locks itself (6 hours).
pub const DEFAULT_LOCK_TIMEOUT_SECS: u32 = 21_600;

/// Partitions granted so `codesign` can use imported keys without prompting.
pub const PARTITION_LIST: &str = "apple-tool:,apple:";

/// Placeholder printed instead of secret arguments.
const REDACTED: &str = "********";

enum Arg {
    Plain(OsString),
    Secret(Zeroizing<String>),
}

/// A single `security` subcommand with its arguments.
pub struct SecurityCommand {
    subcommand: &'static str,
    args: Vec<Arg>,
}

impl SecurityCommand {
    #[must_use]
    pub fn new(subcommand: &'static str) -> Self {
        Self {
            subcommand,
            args: Vec::new(),
        }
    }

    #[must_use]
    pub fn arg(mut self, arg: impl Into<OsString>) -> Self {
        self.args.push(Arg::Plain(arg.into()));
        self
    }

    /// Append an argument that must never be displayed.
    #[must_use]
    pub fn secret(mut self, secret: &str) -> Self {
        self.args.push(Arg::Secret(Zeroizing::new(secret.to_string())));
        self
    }

    fn args_plain<'a>(mut self, args: impl IntoIterator<Item = &'a str>) -> Self {
        self.args
            .extend(args.into_iter().map(|arg| Arg::Plain(arg.into())));
        self
    }

    #[must_use]
    pub fn subcommand(&self) -> &'static str {
        self.subcommand
    }

    /// Full argument vector handed to the process, secrets included.
    pub fn argv(&self) -> impl Iterator<Item = &OsStr> {
        std::iter::once(OsStr::new(self.subcommand)).chain(self.args.iter().map(|arg| {
            match arg {
                Arg::Plain(value) => value.as_os_str(),
                Arg::Secret(value) => OsStr::new(value.as_str()),
            }
        }))
    }
}

impl fmt::Display for SecurityCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "security {}", self.subcommand)?;
        for arg in &self.args {
            match arg {
                Arg::Plain(value) => write!(f, " {}", value.to_string_lossy())?,
                Arg::Secret(_) => write!(f, " {REDACTED}")?,
            }
        }
        Ok(())
    }
}

impl fmt::Debug for SecurityCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SecurityCommand({self})")
    }
}

/// File name `security` knows the keychain by.
#[must_use]
pub fn keychain_file_name(keychain: &str) -> String {
    format!("{keychain}{KEYCHAIN_SUFFIX}")
}

pub fn create_keychain(keychain_file: &str, password: &str) -> SecurityCommand {
    SecurityCommand::new("create-keychain")
        .arg("-p")
        .secret(password)
        .arg(keychain_file)
}

/// `-lut` locks after the timeout and on sleep.
pub fn set_lock_timeout(keychain_file: &str, timeout_secs: u32) -> SecurityCommand {
    SecurityCommand::new("set-keychain-settings")
        .arg("-lut")
        .arg(timeout_secs.to_string())
        .arg(keychain_file)
}

pub fn unlock_keychain(keychain_file: &str, password: &str) -> SecurityCommand {
    SecurityCommand::new("unlock-keychain")
        .arg("-p")
        .secret(password)
        .arg(keychain_file)
}

/// Import a PKCS#12 bundle.
///
/// The bundle path is forwarded as-is, without any UTF-8 requirement.
///
/// `-A` lets any application reach the imported key, and each entry in
/// `trusted_tools` is added to the key's ACL with `-T`. This is only
/// acceptable for a keychain that is destroyed when the CI job ends.
pub fn import_bundle(
    keychain_file: &str,
    bundle_path: &Path,
    bundle_password: &str,
    trusted_tools: &[&str],
) -> SecurityCommand {
    let mut command = SecurityCommand::new("import")
        .arg(bundle_path)
        .arg("-k")
        .arg(keychain_file)
        .arg("-f")
        .arg("pkcs12")
        .arg("-A");
    for tool in trusted_tools {
        command = command.arg("-T").arg(*tool);
    }
    command.arg("-P").secret(bundle_password)
}

pub fn set_partition_list(keychain_file: &str, password: &str) -> SecurityCommand {
    SecurityCommand::new("set-key-partition-list")
        .arg("-S")
        .arg(PARTITION_LIST)
        .arg("-k")
        .secret(password)
        .arg(keychain_file)
}

/// Replace the user search list with `keychain_file` followed by `fallback`.
pub fn set_search_list(keychain_file: &str, fallback: &str) -> SecurityCommand {
    SecurityCommand::new("list-keychains")
        .args_plain(["-d", "user", "-s", keychain_file, fallback])
}

pub fn delete_keychain(keychain_file: &str) -> SecurityCommand {
    SecurityCommand::new("delete-keychain").arg(keychain_file)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn argv(command: &SecurityCommand) -> Vec<&str> {
        command.argv().map(|arg| arg.to_str().unwrap()).collect()
    }

    #[test]
    fn test_keychain_file_name_appends_suffix() {
        assert_eq!(keychain_file_name("ci-store"), "ci-store.keychain");
    }

    #[test]
    fn test_create_and_lock_argv() {
        let create = create_keychain("ci.keychain", "pw");
        assert_eq!(argv(&create), ["create-keychain", "-p", "pw", "ci.keychain"]);

        let lock = set_lock_timeout("ci.keychain", DEFAULT_LOCK_TIMEOUT_SECS);
        assert_eq!(
            argv(&lock),
            ["set-keychain-settings", "-lut", "21600", "ci.keychain"]
        );
    }

    #[test]
    fn test_import_argv_order() {
        let import = import_bundle(
            "ci.keychain",
            Path::new("/tmp/cert.p12"),
            "certpw",
            &["/usr/bin/codesign", "/usr/bin/security"],
        );

        assert_eq!(
            argv(&import),
            [
                "import",
                "/tmp/cert.p12",
                "-k",
                "ci.keychain",
                "-f",
                "pkcs12",
                "-A",
                "-T",
                "/usr/bin/codesign",
                "-T",
                "/usr/bin/security",
                "-P",
                "certpw",
            ]
        );
    }

    #[test]
    fn test_partition_and_search_list_argv() {
        let partitions = set_partition_list("ci.keychain", "pw");
        assert_eq!(
            argv(&partitions),
            [
                "set-key-partition-list",
                "-S",
                "apple-tool:,apple:",
                "-k",
                "pw",
                "ci.keychain"
            ]
        );

        let search = set_search_list("ci.keychain", "login.keychain");
        assert_eq!(
            argv(&search),
            ["list-keychains", "-d", "user", "-s", "ci.keychain", "login.keychain"]
        );
    }

    #[test]
    fn test_display_redacts_secrets() {
        let unlock = unlock_keychain("ci.keychain", "hunter2");
        let shown = unlock.to_string();

        assert_eq!(shown, "security unlock-keychain -p ******** ci.keychain");
        assert!(!format!("{unlock:?}").contains("hunter2"));
    }

    #[test]
    fn test_empty_bundle_password_is_still_passed() {
        let import = import_bundle("ci.keychain", Path::new("c.p12"), "", &[]);
        assert_eq!(argv(&import).last(), Some(&""));
    }

    #[cfg(unix)]
    #[test]
    fn test_non_utf8_bundle_path_forwarded_unchanged() {
        use std::os::unix::ffi::OsStrExt;

        let raw = OsStr::from_bytes(b"/tmp/cert-\xff.p12");
        let import = import_bundle("ci.keychain", Path::new(raw), "pw", &[]);

        assert_eq!(import.argv().nth(1), Some(raw));
        assert!(import.to_string().contains("/tmp/cert-"));
    }
}
