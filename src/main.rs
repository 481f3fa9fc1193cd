//! GoCD provider CLI entrypoint.
//!
//! This is the main entrypoint for the terraform-provider-gocd command-line tool.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use terraform_provider_gocd::cli::{Cli, Commands, OutputFormat, OutputFormatter, StateCommands};
use terraform_provider_gocd::config::{
    find_manifest_file, LogLevel, Manifest, ManifestParser, ManifestValidator,
};
use terraform_provider_gocd::error::{ConfigError, PlanError, Result};
use terraform_provider_gocd::planner::{ApplyPlan, DiffEngine, ExecutionResult, PlanExecutor};
use terraform_provider_gocd::provider::GoCdProvider;
use terraform_provider_gocd::state::{
    HistoryEntry, LocalStateStore, Operation, StateStore,
};

use clap::Parser;
use tracing::{debug, info};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, reload, EnvFilter, Registry};

/// Handle for raising the API client log level once the provider is configured.
type LogHandle = reload::Handle<EnvFilter, Registry>;

/// Main entrypoint.
fn main() -> ExitCode {
    let cli = Cli::parse();

    let log = init_logging(cli.verbose, cli.output == OutputFormat::Json);

    // Run async runtime
    let runtime = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("Failed to create async runtime: {e}");
            return ExitCode::FAILURE;
        }
    };

    match runtime.block_on(run(cli, &log)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

/// Builds the log filter; `loglevel` applies to the GoCD API client only.
fn log_filter(verbose: bool, loglevel: Option<LogLevel>) -> EnvFilter {
    let base = if verbose { "debug" } else { "info" };
    match loglevel {
        Some(level) => EnvFilter::new(format!("{base},terraform_provider_gocd::gocd={level}")),
        None => EnvFilter::new(base),
    }
}

/// Initializes the logging system.
fn init_logging(verbose: bool, json: bool) -> LogHandle {
    let (filter, handle) = reload::Layer::new(log_filter(verbose, None));

    tracing_subscriber::registry()
        .with(filter)
        .with(json.then(|| fmt::layer().json().with_writer(std::io::stderr)))
        .with((!json).then(|| fmt::layer().with_target(false).with_writer(std::io::stderr)))
        .init();

    handle
}

/// Main async entry point.
async fn run(cli: Cli, log: &LogHandle) -> Result<()> {
    let formatter = OutputFormatter::new(cli.output);
    let manifest = cli.manifest.as_deref();

    match cli.command {
        Commands::Schema => {
            println!("{}", formatter.format_schema(&GoCdProvider::new().schema()));
            Ok(())
        }
        Commands::Validate { warnings } => cmd_validate(manifest, warnings, &formatter),
        Commands::Plan => cmd_plan(manifest, &formatter).await,
        Commands::Apply {
            yes,
            continue_on_error,
        } => cmd_apply(manifest, yes, continue_on_error, cli.verbose, log, &formatter).await,
        Commands::Refresh => cmd_refresh(manifest, cli.verbose, log, &formatter).await,
        Commands::Destroy { yes } => cmd_destroy(manifest, yes, cli.verbose, log, &formatter).await,
        Commands::Data => cmd_data(manifest, cli.verbose, log, &formatter).await,
        Commands::State { command } => cmd_state(manifest, command, &formatter).await,
    }
}

/// Validate the manifest.
fn cmd_validate(manifest_path: Option<&Path>, show_warnings: bool, formatter: &OutputFormatter) -> Result<()> {
    let path = resolve_manifest_path(manifest_path)?;
    info!("Validating manifest: {}", path.display());

    let manifest = read_manifest(&path)?;
    let provider = GoCdProvider::new();
    let result = ManifestValidator::new(&provider).check(&manifest);

    println!("{}", formatter.format_validation(&result, show_warnings));

    if result.is_valid() {
        Ok(())
    } else {
        Err(ConfigError::validation_general(format!(
            "{} error(s) in {}",
            result.error_count(),
            path.display()
        ))
        .into())
    }
}

/// Show what applying would change.
async fn cmd_plan(manifest_path: Option<&Path>, formatter: &OutputFormatter) -> Result<()> {
    let workspace = Workspace::load(manifest_path)?;
    let state = workspace.store.load_or_default().await?;

    let diff = DiffEngine::new(&workspace.provider).compute_diff(&workspace.manifest, &state)?;
    println!("{}", formatter.format_diff(&diff));

    Ok(())
}

/// Apply the manifest.
async fn cmd_apply(
    manifest_path: Option<&Path>,
    auto_approve: bool,
    continue_on_error: bool,
    verbose: bool,
    log: &LogHandle,
    formatter: &OutputFormatter,
) -> Result<()> {
    let mut workspace = Workspace::load(manifest_path)?;
    workspace.configure(verbose, log)?;
    let mut state = workspace.store.load_or_default().await?;

    let diff = DiffEngine::new(&workspace.provider).compute_diff(&workspace.manifest, &state)?;
    let plan = ApplyPlan::from_diff(&diff, &workspace.manifest);

    if plan.is_empty() {
        println!("{}", formatter.message(true, "No changes to apply."));
        return Ok(());
    }

    println!("{}", formatter.format_plan(&plan));

    if !auto_approve && !confirm("Do you want to apply this plan? [y/N]: ", "y")? {
        eprintln!("Apply cancelled.");
        return Ok(());
    }

    let result = PlanExecutor::new(&workspace.provider, &workspace.store)
        .with_continue_on_error(continue_on_error)
        .execute(&plan, &mut state, Operation::Apply)
        .await?;

    println!("{}", formatter.format_execution(&result));
    check(&result)
}

/// Read recorded objects back from the server.
async fn cmd_refresh(
    manifest_path: Option<&Path>,
    verbose: bool,
    log: &LogHandle,
    formatter: &OutputFormatter,
) -> Result<()> {
    let mut workspace = Workspace::load(manifest_path)?;
    workspace.configure(verbose, log)?;
    let mut state = workspace.store.load_or_default().await?;

    let result = PlanExecutor::new(&workspace.provider, &workspace.store)
        .refresh(&mut state)
        .await?;

    println!("{}", formatter.format_execution(&result));
    check(&result)
}

/// Delete every managed object.
async fn cmd_destroy(
    manifest_path: Option<&Path>,
    auto_approve: bool,
    verbose: bool,
    log: &LogHandle,
    formatter: &OutputFormatter,
) -> Result<()> {
    let mut workspace = Workspace::load(manifest_path)?;
    workspace.configure(verbose, log)?;
    let mut state = workspace.store.load_or_default().await?;

    let plan = ApplyPlan::destroy(&state, Some(&workspace.manifest));
    if plan.is_empty() {
        println!("{}", formatter.message(true, "Nothing to destroy."));
        return Ok(());
    }

    println!("{}", formatter.format_plan(&plan));

    if !auto_approve
        && !confirm("\nThis action is IRREVERSIBLE. Type 'destroy' to confirm: ", "destroy")?
    {
        eprintln!("Destruction cancelled.");
        return Ok(());
    }

    let result = PlanExecutor::new(&workspace.provider, &workspace.store)
        .execute(&plan, &mut state, Operation::Destroy)
        .await?;

    println!("{}", formatter.format_execution(&result));
    check(&result)
}

/// Read the manifest's data sources.
async fn cmd_data(
    manifest_path: Option<&Path>,
    verbose: bool,
    log: &LogHandle,
    formatter: &OutputFormatter,
) -> Result<()> {
    let mut workspace = Workspace::load(manifest_path)?;
    workspace.configure(verbose, log)?;
    let mut state = workspace.store.load_or_default().await?;

    let result = PlanExecutor::new(&workspace.provider, &workspace.store)
        .read_data_sources(&workspace.manifest, &mut state)
        .await?;

    println!("{}", formatter.format_execution(&result));
    println!("{}", formatter.format_data(&state));
    check(&result)
}

/// State management commands.
async fn cmd_state(
    manifest_path: Option<&Path>,
    command: StateCommands,
    formatter: &OutputFormatter,
) -> Result<()> {
    let path = resolve_manifest_path(manifest_path)?;
    let store = LocalStateStore::for_manifest(&path);

    match command {
        StateCommands::Show => {
            if let Some(state) = store.load().await? {
                println!("{}", formatter.format_state(&state));
            } else {
                println!("{}", formatter.message(true, "No state found."));
            }
        }
        StateCommands::List => {
            let state = store.load_or_default().await?;
            print!("{}", formatter.format_addresses(&state));
        }
        StateCommands::Rm { address } => {
            let mut state = store.load_or_default().await?;
            state.remove(&address)?;
            state.add_history(HistoryEntry::new(Operation::Remove, vec![address.clone()]));
            store.save(&state).await?;
            println!("{}", formatter.message(true, &format!("Removed {address} from state.")));
        }
    }

    Ok(())
}

// ============================================================================
// Helper Functions
// ============================================================================

/// Manifest, provider and state store of one invocation.
struct Workspace {
    manifest: Manifest,
    provider: GoCdProvider,
    store: LocalStateStore,
}

impl Workspace {
    /// Loads and validates the manifest; the provider is not configured yet.
    fn load(manifest_path: Option<&Path>) -> Result<Self> {
        let path = resolve_manifest_path(manifest_path)?;
        let manifest = read_manifest(&path)?;

        let provider = GoCdProvider::new();
        ManifestValidator::new(&provider).validate(&manifest)?;

        Ok(Self {
            manifest,
            provider,
            store: LocalStateStore::for_manifest(&path),
        })
    }

    /// Resolves the provider block and builds the API client.
    fn configure(&mut self, verbose: bool, log: &LogHandle) -> Result<()> {
        let config = GoCdProvider::resolve_config(&self.manifest.provider)?;
        debug!("Provider configuration: {config:?}");

        if let Err(e) = log.reload(log_filter(verbose, Some(config.loglevel))) {
            debug!("Could not apply loglevel {}: {e}", config.loglevel);
        }

        self.provider.configure(&config)
    }
}

/// Resolves the manifest file path.
fn resolve_manifest_path(manifest_path: Option<&Path>) -> Result<PathBuf> {
    manifest_path.map_or_else(|| find_manifest_file("."), |path| Ok(path.to_path_buf()))
}

/// Loads `.env` next to the manifest, then the manifest itself.
fn read_manifest(path: &Path) -> Result<Manifest> {
    let parser = ManifestParser::new().with_base_path(
        path.parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new(".")),
    );
    parser.load_dotenv()?;
    parser.load_file(path)
}

/// Asks for confirmation on stderr.
fn confirm(prompt: &str, expected: &str) -> Result<bool> {
    eprint!("{prompt}");
    std::io::stderr().flush()?;

    let mut input = String::new();
    std::io::stdin().read_line(&mut input)?;

    Ok(input.trim().eq_ignore_ascii_case(expected))
}

/// Turns a failed execution into an error for the exit code.
fn check(result: &ExecutionResult) -> Result<()> {
    match result.results.iter().find(|r| !r.success) {
        None => Ok(()),
        Some(failed) => Err(PlanError::ActionFailed {
            address: failed.address.clone(),
            reason: failed.error.clone().unwrap_or_default(),
        }
        .into()),
    }
}
