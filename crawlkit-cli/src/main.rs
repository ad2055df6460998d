// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  crawlkit: lifecycle plugin orchestration
//
//  plugins:  show how the configured plugins are routed
//  replay:   dispatch a recorded lifecycle trace through the bus
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

mod replay;

use clap::{Parser, Subcommand};
use crawlkit_core::config::LogFormat;
use crawlkit_core::CrawlkitConfig;
use crawlkit_observability::PluginMetrics;
use crawlkit_plugin::{
    Capability, DiagnosticsSink, FanoutDiagnostics, PluginBus, PluginRegistry, TracingDiagnostics,
};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "crawlkit", version, about = "Crawl lifecycle plugin orchestration")]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "crawlkit.yaml")]
    config: PathBuf,

    /// Log level, overrides `log_level` from the config file
    #[arg(long)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List installed plugins per capability
    Plugins,
    /// Replay a JSON lifecycle trace through the plugin bus
    Replay {
        /// Trace file: a JSON array of lifecycle events
        trace: PathBuf,

        /// Start url of the replayed crawl session
        #[arg(long, default_value = "http://localhost/")]
        url: String,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // ── Config ──
    let config = if cli.config.exists() {
        CrawlkitConfig::load(&cli.config)?
    } else {
        CrawlkitConfig::default()
    };

    // ── Tracing ──
    let level = cli.log_level.as_deref().unwrap_or(&config.log_level);
    init_tracing(level, config.log_format);

    info!(version = env!("CARGO_PKG_VERSION"), "crawlkit starting");
    if cli.config.exists() {
        info!(path = %cli.config.display(), "Loaded config file");
    } else {
        info!("No config file found, using defaults");
    }

    // ── Diagnostics ──
    let metrics = Arc::new(PluginMetrics::new(config.observability.prometheus.enabled)?);
    let mut sinks = FanoutDiagnostics::new().with(Arc::new(TracingDiagnostics));
    if metrics.is_enabled() {
        sinks = sinks.with(metrics.clone());
    }
    let diagnostics: Arc<dyn DiagnosticsSink> = Arc::new(sinks);

    // ── Plugin registry ──
    let plugins = crawlkit_plugins::builtin_plugins(&config.plugins)?;
    let registry = PluginRegistry::build_with(plugins, diagnostics)?;
    info!(registrations = registry.len(), "Plugins registered");

    let mut bus = PluginBus::new(Arc::new(registry));
    if let Some(threshold) = config.plugins.slow_call_threshold() {
        bus = bus.with_slow_call_threshold(threshold);
    }

    match cli.command {
        Command::Plugins => print_plugins(bus.registry()),
        Command::Replay { trace, url } => {
            let events = replay::load_trace(&trace)?;
            info!(path = %trace.display(), events = events.len(), "Replaying trace");
            let outcome = replay::run(&bus, &url, events);
            print!("{}", outcome.summary());
            if metrics.is_enabled() {
                print!("{}", metrics.render());
            }
        }
    }

    Ok(())
}

fn init_tracing(level: &str, format: LogFormat) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr);
    match format {
        LogFormat::Text => builder.init(),
        LogFormat::Json => builder.json().init(),
    }
}

fn print_plugins(registry: &PluginRegistry) {
    for &capability in Capability::all() {
        let names: Vec<&str> = registry
            .plugins_for(capability)
            .iter()
            .map(|p| p.name())
            .collect();
        if names.is_empty() {
            println!("{:<24} -", capability.as_str());
        } else {
            println!("{:<24} {}", capability.as_str(), names.join(", "));
        }
    }
    println!();

    let installed: Vec<String> = registry.installed_names().into_iter().collect();
    println!("installed: {}", installed.join(", "));
    if !registry.unrouted().is_empty() {
        println!("unrouted:  {}", registry.unrouted().join(", "));
    }
}
