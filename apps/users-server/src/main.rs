use std::net::{SocketAddr, ToSocketAddrs};
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use api_ingress::{ApiIngress, ApiIngressConfig};
use clap::{Parser, Subcommand};
use mimalloc::MiMalloc;
use runtime::{AppConfig, CliArgs, DatabaseConfig};
use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection};
use tokio_util::sync::CancellationToken;
use url::Url;
use users::UsersModule;

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

const MEMORY_DSN: &str = "sqlite::memory:";

/// Expand a sqlite DSN into an absolute-path DSN using a base directory.
/// - Keeps "sqlite::memory:" as-is.
/// - Normalizes backslashes into forward slashes (important on Windows).
fn absolutize_sqlite_dsn(dsn: &str, base_dir: &Path, create_dirs: bool) -> Result<String> {
    if is_memory_dsn(dsn) {
        return Ok(MEMORY_DSN.to_string());
    }
    let db_path = dsn
        .strip_prefix("sqlite://")
        .ok_or_else(|| anyhow!("DSN must start with sqlite:// (got: {})", dsn))?;

    let (path_str, query) = match db_path.split_once('?') {
        Some((p, q)) => (p, Some(q)),
        None => (db_path, None),
    };

    let mut p = PathBuf::from(path_str);
    if p.as_os_str().is_empty() {
        return Err(anyhow!("Empty SQLite path in DSN"));
    }
    if p.is_relative() {
        p = base_dir.join(p);
    }

    if let Some(dir) = p.parent() {
        if create_dirs {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create database dir {}", dir.display()))?;
        }
    }

    let mut out = String::from("sqlite://");
    out.push_str(&p.to_string_lossy().replace('\\', "/"));
    // sqlx only creates missing files with mode=rwc.
    match query {
        Some(q) => {
            out.push('?');
            out.push_str(q);
        }
        None => out.push_str("?mode=rwc"),
    }
    Ok(out)
}

fn is_memory_dsn(dsn: &str) -> bool {
    dsn.eq_ignore_ascii_case("sqlite::memory:") || dsn.eq_ignore_ascii_case("sqlite://:memory:")
}

/// Users Server - CRUD service for user records
#[derive(Parser)]
#[command(name = "users-server")]
#[command(about = "Users Server - CRUD HTTP service for user records")]
#[command(version = "0.1.0")]
struct Cli {
    /// Path to configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Port for HTTP server (overrides config and PORT)
    #[arg(short, long)]
    port: Option<u16>,

    /// Print current configuration and exit
    #[arg(long)]
    print_config: bool,

    /// Log verbosity level (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Use an in-memory SQLite database
    #[arg(long)]
    mock: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the server
    Run,
    /// Check configuration
    Check,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let args = CliArgs {
        config: cli.config.as_ref().map(|p| p.to_string_lossy().to_string()),
        port: cli.port,
        print_config: cli.print_config,
        verbose: cli.verbose,
        mock: cli.mock,
    };

    // Load configuration (normalized home_dir is applied inside)
    let mut config = AppConfig::load(cli.config.as_deref())?;
    config.apply_cli_overrides(&args);

    let logging_config = config.logging.clone().unwrap_or_default();
    runtime::logging::init_logging_from_config(&logging_config, Path::new(&config.server.home_dir));
    tracing::info!("Users Server starting");

    if cli.print_config {
        println!("{}", config.to_yaml()?);
        return Ok(());
    }

    match cli.command.unwrap_or(Commands::Run) {
        Commands::Run => run_server(config, args).await,
        Commands::Check => check_config(config, args),
    }
}

/// Detect DB backend from URL scheme (sqlite/postgres).
fn detect_from_dsn(cfg: &DatabaseConfig) -> Result<&'static str> {
    let raw = cfg.url.trim();
    if raw.is_empty() {
        return Err(anyhow!("Database URL not configured"));
    }
    if is_memory_dsn(raw) {
        return Ok("sqlite");
    }

    let url = Url::parse(raw).map_err(|e| anyhow!("Invalid database DSN '{}': {}", raw, e))?;

    match url.scheme() {
        "sqlite" | "sqlite3" => Ok("sqlite"),
        "postgres" | "postgresql" => Ok("postgres"),
        other => Err(anyhow!("Unsupported database type: {}", other)),
    }
}

/// Final DSN: `--mock` wins, sqlite paths are made absolute under `home_dir`.
fn resolve_dsn(config: &AppConfig, args: &CliArgs) -> Result<(String, DatabaseConfig)> {
    if args.mock {
        let db_config = config.database.clone().unwrap_or_else(|| DatabaseConfig {
            url: MEMORY_DSN.to_string(),
            max_conns: None,
            busy_timeout_ms: None,
        });
        return Ok((MEMORY_DSN.to_string(), db_config));
    }

    let db_config = config
        .database
        .clone()
        .ok_or_else(|| anyhow!("No database configuration found"))?;

    let backend = detect_from_dsn(&db_config)?;
    let dsn = db_config.url.trim().to_owned();
    let dsn = if backend == "sqlite" && !is_memory_dsn(&dsn) {
        let dsn = dsn.replacen("sqlite3://", "sqlite://", 1);
        absolutize_sqlite_dsn(&dsn, Path::new(&config.server.home_dir), true)?
    } else {
        dsn
    };
    Ok((dsn, db_config))
}

/// Strip credentials before logging a DSN.
fn redact_dsn(dsn: &str) -> String {
    match Url::parse(dsn) {
        Ok(mut url) if url.password().is_some() => {
            let _ = url.set_password(Some("***"));
            url.to_string()
        }
        _ => dsn.to_string(),
    }
}

async fn connect_db(dsn: &str, db_config: &DatabaseConfig) -> Result<DatabaseConnection> {
    let mut opts = ConnectOptions::new(dsn.to_owned());
    opts.max_connections(if is_memory_dsn(dsn) {
        1
    } else {
        db_config.max_conns.unwrap_or(10)
    })
    .acquire_timeout(Duration::from_secs(5))
    .sqlx_logging(false);

    let busy = db_config.busy_timeout();
    opts.map_sqlx_sqlite_opts(move |o| o.busy_timeout(busy));

    tracing::info!("Connecting to database: {}", redact_dsn(dsn));
    let db = Database::connect(opts)
        .await
        .with_context(|| format!("Failed to connect to database {}", redact_dsn(dsn)))?;
    tracing::info!("Connected DB backend: {:?}", db.get_database_backend());
    Ok(db)
}

fn bind_addr(config: &AppConfig) -> Result<SocketAddr> {
    let (host, port) = (config.server.host.as_str(), config.server.port);
    (host, port)
        .to_socket_addrs()
        .with_context(|| format!("Invalid bind address {host}:{port}"))?
        .next()
        .ok_or_else(|| anyhow!("Invalid bind address {host}:{port}: no addresses resolved"))
}

async fn run_server(config: AppConfig, args: CliArgs) -> Result<()> {
    tracing::info!("Initializing modules...");

    let ingress_cfg: ApiIngressConfig = config.module_config(ApiIngress::MODULE_NAME)?;
    let addr = bind_addr(&config)?;
    let (dsn, db_config) = resolve_dsn(&config, &args)?;

    let db = connect_db(&dsn, &db_config).await?;
    let users = UsersModule::init(db.clone())
        .await
        .context("Failed to initialize users module")?;

    let ingress = ApiIngress::new(ingress_cfg);
    let router = ingress.build_router(users.register_rest(axum::Router::new()));

    let cancel = CancellationToken::new();
    tokio::spawn({
        let cancel = cancel.clone();
        async move {
            modkit::shutdown_signal().await;
            cancel.cancel();
        }
    });

    let drain = (config.server.timeout_sec > 0)
        .then(|| Duration::from_secs(config.server.timeout_sec));
    let served = ingress.serve(router, addr, cancel, drain).await;

    tracing::info!("Closing database pool");
    if let Err(e) = db.close().await {
        tracing::warn!(error = %e, "Failed to close database pool cleanly");
    }

    served?;
    tracing::info!("Users Server stopped");
    Ok(())
}

fn check_config(config: AppConfig, args: CliArgs) -> Result<()> {
    tracing::info!("Checking configuration...");

    let _: ApiIngressConfig = config.module_config(ApiIngress::MODULE_NAME)?;
    bind_addr(&config)?;
    let (dsn, _) = resolve_dsn(&config, &args)?;

    tracing::info!("Configuration is valid");
    println!("Configuration check passed");
    println!("Database: {}", redact_dsn(&dsn));
    println!("{}", config.to_yaml()?);

    Ok(())
}
