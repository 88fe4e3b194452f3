use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use rand::distr::{Alphanumeric, SampleString};
use std::io::Write;
use std::path::PathBuf;
use zeroize::Zeroizing;

use kodegen_bundler_keychain::config::ProvisionConfig;
use kodegen_bundler_keychain::{
    DryRunRunner, ProvisionOptions, ProvisionRequest, Provisioner, SecurityRunner, SystemRunner,
    error, step, success, warn,
};

// stdout carries only the text captured from `security`; every status line
// goes to stderr through the termcolor macros, whose I/O errors are ignored.

/// Length of the keychain password generated when none is supplied.
const GENERATED_PASSWORD_LEN: usize = 32;

#[derive(Parser)]
#[command(name = "kodegen_keychain")]
#[command(version, about = "Provision a temporary keychain for CI code signing")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create/unlock a keychain and import a signing certificate into it
    Provision(ProvisionArgs),

    /// Delete a keychain created by `provision`
    Delete(DeleteArgs),
}

#[derive(Args)]
struct ProvisionArgs {
    /// Path to provisioning config file (TOML)
    #[arg(long, short = 'c')]
    config: Option<PathBuf>,

    /// Keychain name, without the `.keychain` suffix
    #[arg(long, short = 'k')]
    keychain: Option<String>,

    /// Create the keychain before importing (pass `false` to reuse one)
    #[arg(long, num_args = 0..=1, default_missing_value = "true")]
    setup_new_keychain: Option<bool>,

    /// Password for the keychain; generated when creating a new keychain
    #[arg(long, env = "KEYCHAIN_PASSWORD", hide_env_values = true)]
    keychain_password: Option<String>,

    /// Path to the .p12 certificate bundle
    #[arg(long)]
    certificate: Option<PathBuf>,

    /// Password protecting the .p12 bundle
    #[arg(
        long,
        env = "CERTIFICATE_PASSWORD",
        hide_env_values = true,
        default_value = ""
    )]
    certificate_password: String,

    /// Reject an empty certificate password
    #[arg(long)]
    require_certificate_password: bool,

    /// Tool allowed to use the imported key without prompting
    #[arg(long)]
    signing_tool: Option<String>,

    /// Keychain administration tool, also allowed to use the key
    #[arg(long)]
    admin_tool: Option<String>,

    /// Keychain kept behind the new one in the search list
    #[arg(long)]
    login_keychain: Option<String>,

    /// Idle seconds before a new keychain locks itself
    #[arg(long)]
    lock_timeout_secs: Option<u32>,

    /// Program used to administer keychains
    #[arg(long)]
    security_program: Option<String>,

    /// Print commands without running them
    #[arg(long)]
    dry_run: bool,

    /// Print each command before running it
    #[arg(long, short = 'v')]
    verbose: bool,
}

#[derive(Args)]
struct DeleteArgs {
    /// Keychain name, without the `.keychain` suffix
    keychain: String,

    /// Program used to administer keychains
    #[arg(long, default_value = kodegen_bundler_keychain::keychain::SECURITY_PROGRAM)]
    security_program: String,

    /// Print the command without running it
    #[arg(long)]
    dry_run: bool,
}

/// Everything a provisioning run needs once config and flags are merged.
struct ProvisionPlan {
    request: ProvisionRequest,
    options: ProvisionOptions,
    security_program: String,
    dry_run: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Provision(args) => run_provision(args).await,
        Commands::Delete(args) => run_delete(args).await,
    };

    if let Err(e) = result {
        error!("{e:#}");
        std::process::exit(1);
    }
    Ok(())
}

async fn run_provision(args: ProvisionArgs) -> Result<()> {
    let config = match &args.config {
        Some(path) => ProvisionConfig::load(path).await?,
        None => ProvisionConfig::default(),
    };
    let plan = resolve(args, config)?;

    step!("Provisioning keychain '{}'", plan.request.keychain);

    let captured = if plan.dry_run {
        let provisioner = Provisioner::with_options(DryRunRunner, plan.options);
        provision_with(provisioner, &plan.request).await?
    } else {
        let runner = SystemRunner::with_program(plan.security_program);
        provision_with(Provisioner::with_options(runner, plan.options), &plan.request).await?
    };

    write_captured(&mut std::io::stdout().lock(), &captured)?;

    success!("Keychain '{}' ready for signing", plan.request.keychain);
    Ok(())
}

/// Merge command-line flags over `config`; flags win.
fn resolve(args: ProvisionArgs, mut config: ProvisionConfig) -> Result<ProvisionPlan> {
    if let Some(keychain) = args.keychain {
        config.keychain = Some(keychain);
    }
    if let Some(setup) = args.setup_new_keychain {
        config.setup_new_keychain = setup;
    }
    if let Some(certificate) = args.certificate {
        config.certificate_path = Some(certificate);
    }
    if let Some(tool) = args.signing_tool {
        config.signing_tool = tool;
    }
    if let Some(tool) = args.admin_tool {
        config.admin_tool = tool;
    }
    if let Some(login) = args.login_keychain {
        config.login_keychain = login;
    }
    if let Some(timeout) = args.lock_timeout_secs {
        config.lock_timeout_secs = timeout;
    }
    if let Some(program) = args.security_program {
        config.security_program = program;
    }
    if args.require_certificate_password {
        config.allow_empty_certificate_password = false;
    }
    config.dry_run |= args.dry_run;
    config.verbose |= args.verbose;

    config.validate()?;

    let keychain = config
        .keychain
        .clone()
        .ok_or_else(|| anyhow::anyhow!("--keychain is required (or set `keychain` in config)"))?;
    let certificate_path = config.certificate_path.clone().ok_or_else(|| {
        anyhow::anyhow!("--certificate is required (or set `certificate_path` in config)")
    })?;

    let keychain_password = match args.keychain_password {
        Some(password) => Zeroizing::new(password),
        None if config.setup_new_keychain => {
            warn!("No keychain password supplied; using a generated one for this run");
            Zeroizing::new(Alphanumeric.sample_string(&mut rand::rng(), GENERATED_PASSWORD_LEN))
        }
        // Left empty so validation reports it.
        None => Zeroizing::new(String::new()),
    };

    Ok(ProvisionPlan {
        request: ProvisionRequest {
            keychain,
            setup_new_keychain: config.setup_new_keychain,
            keychain_password,
            certificate_path,
            certificate_password: Zeroizing::new(args.certificate_password),
        },
        options: config.options(),
        security_program: config.security_program,
        dry_run: config.dry_run,
    })
}

fn write_captured(out: &mut impl Write, captured: &str) -> std::io::Result<()> {
    out.write_all(captured.as_bytes())?;
    out.flush()
}

async fn provision_with<R: SecurityRunner>(
    provisioner: Provisioner<R>,
    request: &ProvisionRequest,
) -> Result<String> {
    Ok(provisioner.provision(request).await?)
}

async fn run_delete(args: DeleteArgs) -> Result<()> {
    if args.dry_run {
        Provisioner::new(DryRunRunner).delete(&args.keychain).await?;
    } else {
        Provisioner::new(SystemRunner::with_program(args.security_program))
            .delete(&args.keychain)
            .await?;
    }

    success!("Deleted keychain '{}'", args.keychain);
    Ok(())
}
