use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;

mod config;
mod error;
mod handler;
mod http;
mod logger;
mod render;
mod server;

use error::StartupError;

/// Front gateway: serves versioned static assets and hands every other
/// request to the rendering engine
#[derive(Parser)]
#[command(name = "edge_gateway")]
#[command(about = "Static asset responder and forwarded-header gateway", long_about = None)]
struct Cli {
    /// Config file path, without extension
    #[arg(short, long, default_value = config::DEFAULT_CONFIG_PATH)]
    config: String,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            logger::log_error(&format!("Startup failed: {e}"));
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> Result<(), StartupError> {
    let cfg = config::Config::load_from(&cli.config)?;
    logger::init(&cfg).map_err(StartupError::Logger)?;
    logger::log_startup_config(&cfg);

    // One thread: requests interleave on the event loop, never in parallel
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(StartupError::Runtime)?;

    runtime.block_on(async_main(cfg))
}

async fn async_main(cfg: config::Config) -> Result<(), StartupError> {
    let addr = cfg.get_socket_addr().map_err(StartupError::Address)?;

    let engine = render::UpstreamRenderer::new(&cfg.render.upstream)?;
    logger::log_info(&format!("Rendering engine at {}", engine.authority()));
    let state = Arc::new(config::AppState::with_engine(&cfg, Arc::new(engine))?);
    for rule in state.assets.rules() {
        logger::log_asset_rule(&rule.prefix, &rule.base_dir, rule.strip_prefix);
    }

    let shutdown = server::ShutdownSignal::register().map_err(StartupError::Signal)?;
    let listener =
        server::create_listener(addr).map_err(|source| StartupError::Bind { addr, source })?;
    let bound = listener
        .local_addr()
        .map_err(|source| StartupError::Bind { addr, source })?;
    logger::log_ready(&bound);

    // Use LocalSet for spawn_local support
    let local = tokio::task::LocalSet::new();
    local
        .run_until(server::run(listener, state, shutdown))
        .await;
    logger::log_info("Server stopped");
    Ok(())
}
