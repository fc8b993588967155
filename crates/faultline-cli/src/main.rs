// faultline-cli/src/main.rs
// ============================================================================
// Module: Faultline CLI Entry Point
// Description: Command dispatcher for the Faultline control plane.
// Purpose: Run the gateway and provide offline config/identity tooling.
// Dependencies: clap, faultline-config, faultline-gateway, tokio
// ============================================================================

//! ## Overview
//! The CLI runs the gateway (`serve`) and provides offline tooling:
//! generating and validating configuration, bootstrapping a tenant/project
//! pair, and minting ingest API keys. Raw key material is printed exactly
//! once at mint time and is never recoverable afterwards.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use clap::Subcommand;
use faultline_config::FaultlineConfig;
use faultline_config::config_toml_example;
use faultline_core::ApiKey;
use faultline_core::IngestDomain;
use faultline_core::Project;
use faultline_core::ProjectId;
use faultline_core::SealedBox;
use faultline_core::Tenant;
use faultline_core::TenantId;
use faultline_core::Timestamp;
use faultline_core::interfaces::IdentityStore;
use faultline_gateway::GatewayState;
use faultline_store_sqlite::SqliteStore;
use faultline_store_sqlite::SqliteStoreConfig;
use tracing::error;

// ============================================================================
// SECTION: CLI Definition
// ============================================================================

/// Faultline control-plane CLI.
#[derive(Debug, Parser)]
#[command(name = "faultline", about = "Faultline observability control plane")]
struct Cli {
    /// Path to the configuration file.
    #[arg(long, global = true, default_value = "faultline.toml")]
    config: PathBuf,
    /// Command to run.
    #[command(subcommand)]
    command: Command,
}

/// Top-level commands.
#[derive(Debug, Subcommand)]
enum Command {
    /// Runs the gateway until interrupted.
    Serve,
    /// Configuration tooling.
    Config {
        /// Config subcommand.
        #[command(subcommand)]
        command: ConfigCommand,
    },
    /// Creates a tenant and its first project, printing both identifiers.
    Bootstrap {
        /// Tenant display name.
        #[arg(long)]
        tenant: String,
        /// Project display name.
        #[arg(long)]
        project: String,
        /// Project slug, unique within the tenant.
        #[arg(long)]
        slug: String,
    },
    /// Mints an ingest API key for a project. The raw key prints once.
    Keygen {
        /// Target project identifier.
        #[arg(long)]
        project_id: String,
        /// Friendly key name.
        #[arg(long)]
        name: String,
        /// Granted scopes as domain names; empty grants all domains.
        #[arg(long, value_delimiter = ',')]
        scopes: Vec<String>,
        /// Days until expiry; omitted means the key never expires.
        #[arg(long)]
        expires_in_days: Option<u32>,
    },
}

/// Config subcommands.
#[derive(Debug, Subcommand)]
enum ConfigCommand {
    /// Writes the canonical example configuration to the config path.
    Init,
    /// Loads and validates the configuration.
    Validate,
}

// ============================================================================
// SECTION: Entry Point
// ============================================================================

/// CLI errors surfaced with a non-zero exit code.
#[derive(Debug, thiserror::Error)]
enum CliError {
    /// Configuration problem.
    #[error("{0}")]
    Config(String),
    /// Store problem.
    #[error("{0}")]
    Store(String),
    /// Gateway problem.
    #[error("{0}")]
    Gateway(String),
    /// Invalid command-line input.
    #[error("{0}")]
    Input(String),
}

/// Process entry point.
fn main() -> ExitCode {
    init_tracing();
    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!(error = %err, "command failed");
            ExitCode::FAILURE
        }
    }
}

/// Initializes structured logging from `RUST_LOG`, defaulting to info.
fn init_tracing() {
    use tracing_subscriber::EnvFilter;
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

/// Dispatches the parsed command.
fn run(cli: Cli) -> Result<(), CliError> {
    match cli.command {
        Command::Serve => serve(&cli.config),
        Command::Config { command } => match command {
            ConfigCommand::Init => config_init(&cli.config),
            ConfigCommand::Validate => config_validate(&cli.config),
        },
        Command::Bootstrap { tenant, project, slug } => {
            bootstrap(&cli.config, &tenant, &project, &slug)
        }
        Command::Keygen { project_id, name, scopes, expires_in_days } => {
            keygen(&cli.config, &project_id, &name, &scopes, expires_in_days)
        }
    }
}

// ============================================================================
// SECTION: Commands
// ============================================================================

/// Runs the gateway on the tokio runtime until ctrl-c.
fn serve(config_path: &std::path::Path) -> Result<(), CliError> {
    let config = load_config(config_path)?;
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|err| CliError::Gateway(err.to_string()))?;
    runtime.block_on(async move {
        let state =
            GatewayState::from_config(config).map_err(|err| CliError::Gateway(err.to_string()))?;
        faultline_gateway::serve(state).await.map_err(|err| CliError::Gateway(err.to_string()))
    })
}

/// Writes the example configuration, refusing to overwrite.
fn config_init(config_path: &std::path::Path) -> Result<(), CliError> {
    if config_path.exists() {
        return Err(CliError::Config(format!(
            "refusing to overwrite existing {}",
            config_path.display()
        )));
    }
    std::fs::write(config_path, config_toml_example())
        .map_err(|err| CliError::Config(err.to_string()))?;
    emit(&serde_json::json!({ "written": config_path.display().to_string() }));
    Ok(())
}

/// Loads and validates the configuration.
fn config_validate(config_path: &std::path::Path) -> Result<(), CliError> {
    let _config = load_config(config_path)?;
    emit(&serde_json::json!({ "valid": true }));
    Ok(())
}

/// Creates a tenant and its first project.
fn bootstrap(
    config_path: &std::path::Path,
    tenant_name: &str,
    project_name: &str,
    slug: &str,
) -> Result<(), CliError> {
    let store = open_store(config_path)?;
    let now = Timestamp::now();
    let tenant =
        Tenant { id: TenantId::generate(), name: tenant_name.to_string(), created_at: now };
    store.insert_tenant(&tenant).map_err(|err| CliError::Store(err.to_string()))?;
    let project = Project {
        id: ProjectId::generate(),
        tenant_id: tenant.id.clone(),
        name: project_name.to_string(),
        slug: slug.to_string(),
        created_at: now,
    };
    store.insert_project(&project).map_err(|err| CliError::Store(err.to_string()))?;
    emit(&serde_json::json!({
        "tenant_id": tenant.id.as_str(),
        "project_id": project.id.as_str(),
        "slug": project.slug,
    }));
    Ok(())
}

/// Mints an API key and prints the raw value exactly once.
fn keygen(
    config_path: &std::path::Path,
    project_id: &str,
    name: &str,
    scopes: &[String],
    expires_in_days: Option<u32>,
) -> Result<(), CliError> {
    let store = open_store(config_path)?;
    let project = store
        .get_project(&ProjectId::new(project_id))
        .map_err(|err| CliError::Store(err.to_string()))?
        .ok_or_else(|| CliError::Input(format!("project not found: {project_id}")))?;

    let mut domains = Vec::new();
    for scope in scopes {
        let domain = IngestDomain::parse(scope)
            .ok_or_else(|| CliError::Input(format!("unknown scope: {scope}")))?;
        domains.push(domain);
    }
    let expires_at = expires_in_days.map(|days| Timestamp::now().plus_days(days));
    let (key, raw) = ApiKey::mint(project.tenant_id, project.id, name, domains, expires_at);
    store.insert_api_key(&key).map_err(|err| CliError::Store(err.to_string()))?;
    emit(&serde_json::json!({
        "key_id": key.id.as_str(),
        "key_prefix": key.key_prefix,
        "scopes": key.scopes,
        "expires_at": key.expires_at,
        "raw_key": raw,
        "note": "store the raw key now; it is not recoverable",
    }));
    Ok(())
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Loads configuration with environment overrides.
fn load_config(config_path: &std::path::Path) -> Result<FaultlineConfig, CliError> {
    FaultlineConfig::load(config_path).map_err(|err| CliError::Config(err.to_string()))
}

/// Opens the durable store from configuration.
fn open_store(config_path: &std::path::Path) -> Result<SqliteStore, CliError> {
    let config = load_config(config_path)?;
    let secrets = SealedBox::from_master_key(&config.encryption.master_key);
    let store_config = SqliteStoreConfig {
        path: config.store.path,
        busy_timeout_ms: config.store.busy_timeout_ms,
    };
    SqliteStore::open(&store_config, secrets).map_err(|err| CliError::Store(err.to_string()))
}

/// Prints a JSON result document to stdout.
fn emit(value: &serde_json::Value) {
    #[allow(clippy::print_stdout, reason = "CLI results are stdout by contract.")]
    {
        println!("{value:#}");
    }
}
