//! Upgrade verification entry point
//!
//! Resolves the deployments to verify, runs the workflow against each one and
//! exits 0 when every target completed, 1 when any failed, 2 on setup errors.

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use shop_upgrade_check::config::{Credentials, RunPolicy, RunnerConfig, WorkflowConfig};
use shop_upgrade_check::playwright::{BrowserKind, PlaywrightConfig, PlaywrightLauncher};
use shop_upgrade_check::preflight::PreflightConfig;
use shop_upgrade_check::report::{self, OutputFormat};
use shop_upgrade_check::{TargetSource, VerificationRunner, VerifyResult};

#[derive(Parser, Debug)]
#[command(name = "upgrade-check")]
#[command(author, version, about = "Verify that upgraded storefronts are operational")]
struct Args {
    /// Verify only this domain, ignoring the target table
    #[arg(long, env = "DOMAIN")]
    domain: Option<String>,

    /// CSV file with a `domain` column
    #[arg(long, env = "TARGETS_CSV", default_value = "urls.csv")]
    targets: PathBuf,

    /// Skip onboarding, checklist and go-live steps
    #[arg(long, env = "NO_CHECKLIST", num_args = 0..=1, default_missing_value = "1")]
    no_checklist: Option<String>,

    /// Targets verified concurrently
    #[arg(short, long, default_value = "1")]
    jobs: usize,

    /// Back office administrator email
    #[arg(long, default_value = "pub@prestashop.com")]
    admin_email: String,

    /// Back office administrator password
    #[arg(long, default_value = "123456789")]
    admin_password: String,

    /// Payment module installed and used at checkout
    #[arg(long, default_value = "bankwire")]
    payment_module: String,

    /// Browser to use
    #[arg(long, value_enum, default_value = "chromium")]
    browser: BrowserKind,

    /// Show the browser window
    #[arg(long)]
    headed: bool,

    /// Default wait budget for elements, in milliseconds
    #[arg(long, default_value = "10000")]
    wait_timeout_ms: u64,

    /// Do not probe targets over HTTP before launching a browser
    #[arg(long)]
    no_preflight: bool,

    /// Report format
    #[arg(long, value_enum, default_value = "table")]
    format: OutputFormat,

    /// Output directory for results
    #[arg(short, long, default_value = "test-results")]
    output: PathBuf,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

fn main() {
    let args = Args::parse();

    let default_level = if args.verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let rt = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("Error: failed to create tokio runtime: {}", e);
            std::process::exit(2);
        }
    };

    match rt.block_on(async_main(args)) {
        Ok(true) => std::process::exit(0),
        Ok(false) => std::process::exit(1),
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(2);
        }
    }
}

async fn async_main(args: Args) -> VerifyResult<bool> {
    let source = TargetSource::new(args.domain, args.targets);
    let targets = source.resolve()?;

    let playwright = PlaywrightConfig {
        browser: args.browser,
        headless: !args.headed,
        default_timeout: Duration::from_millis(args.wait_timeout_ms),
        ..Default::default()
    };

    let config = RunnerConfig {
        workflow: WorkflowConfig {
            policy: RunPolicy::from_flag(args.no_checklist.as_deref()),
            admin: Credentials {
                email: args.admin_email,
                password: args.admin_password,
            },
            payment_module: args.payment_module,
            ..Default::default()
        },
        preflight: if args.no_preflight {
            None
        } else {
            Some(PreflightConfig::default())
        },
        jobs: args.jobs,
        output_dir: args.output,
    };

    let runner = VerificationRunner::new(PlaywrightLauncher::new(playwright), config);
    let results = runner.run_all(targets).await;

    runner.write_results(&results)?;
    println!("{}", report::render(&results, args.format)?);

    Ok(results.success())
}
