//! ezaz-cache CLI application
//!
//! Diagnostic front end for the ezaz object cache: shows what is cached,
//! reads entries through the configured expiry policies and prunes the tree.

use std::env;
use std::path::PathBuf;
use std::process;

use tracing::{debug, info};
use tracing_subscriber::{fmt, EnvFilter};

use ezaz_cache::cli::{
    handle_clear, handle_config, handle_entries, handle_info, handle_invalidate, handle_show,
    CacheContext, Cli, Commands,
};
use ezaz_cache::config::AppConfig;
use ezaz_cache::constants::env::CACHE_DIR;
use ezaz_cache::errors::Result;

fn main() {
    let result = run();

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

/// Main application logic
fn run() -> Result<()> {
    // Load environment variables from .env file if it exists
    dotenv::dotenv().ok();

    let cli = Cli::parse_args();

    if let Commands::Config = cli.command {
        return handle_config();
    }

    let config = AppConfig::load(cli.global.config.as_deref())?;
    init_logging(&cli, &config);

    info!("ezaz-cache v{} starting", env!("CARGO_PKG_VERSION"));

    // The environment is read here once; the library never consults it
    let env_root = env::var_os(CACHE_DIR).map(PathBuf::from);
    if let Some(root) = &env_root {
        debug!("{} set to {}", CACHE_DIR, root.display());
    }
    let ctx = CacheContext::from_config(config, &cli.global, env_root)?;

    match &cli.command {
        Commands::Info => handle_info(&ctx),
        Commands::Entries => handle_entries(&ctx),
        Commands::Show(args) => handle_show(&ctx, args),
        Commands::Invalidate(args) => handle_invalidate(&ctx, args),
        Commands::Clear(args) => handle_clear(&ctx, args),
        Commands::Config => handle_config(),
    }
}

/// Initialize logging from the CLI verbosity flags, falling back to the
/// configured level
fn init_logging(cli: &Cli, config: &AppConfig) {
    let level = cli
        .log_level()
        .map(|level| level.to_string().to_lowercase())
        .unwrap_or_else(|| config.logging.level.clone());

    let filter = match format!("ezaz_cache={}", level).parse() {
        Ok(directive) => EnvFilter::from_default_env().add_directive(directive),
        Err(_) => EnvFilter::from_default_env(),
    };

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_level(cli.global.very_verbose)
        .with_writer(std::io::stderr)
        .init();

    if cli.global.very_verbose {
        info!("Very verbose logging enabled");
    } else if cli.global.verbose {
        info!("Verbose logging enabled");
    }
}
