use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use hostwatch::{
    Collector, DEFAULT_SSH_PORT, Prober, Secret,
    config::{Config, read_config_file},
    registry::{HostRegistry, MemoryRegistry},
    remote::SshRunner,
    util::{get_demo_mode, get_secret},
};
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, level_filters::LevelFilter, trace, warn};
use tracing_subscriber::{filter, layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Clone, Parser)]
struct Args {
    /// More log output (-v debug, -vv trace)
    #[arg(short, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Clone, Subcommand)]
enum Command {
    /// Run one collection cycle and print the samples as JSON
    Collect {
        /// Config file
        #[arg(short)]
        file: String,

        /// Only synthetic data, never connect to any host
        #[arg(long)]
        demo: bool,
    },

    /// Run a collection cycle every `interval` seconds
    Watch {
        /// Config file
        #[arg(short)]
        file: String,

        #[arg(long)]
        demo: bool,
    },

    /// Test connectivity to a host (secret is read from HOSTWATCH_SECRET)
    Probe {
        address: String,

        #[arg(short)]
        user: String,

        #[arg(short, default_value_t = DEFAULT_SSH_PORT)]
        port: u16,

        /// Config file for ssh program and probe timeout
        #[arg(short)]
        file: Option<String>,
    },
}

fn init(verbose: u8) {
    let level = match verbose {
        0 => LevelFilter::INFO,
        1 => LevelFilter::DEBUG,
        _ => LevelFilter::TRACE,
    };
    // library and binary share the crate name, so one target covers both
    let filter = filter::Targets::new().with_target("hostwatch", level);
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .compact()
                .with_ansi(false),
        )
        .with(filter)
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();

    let args = Args::parse();
    init(args.verbose);
    trace!("started with args: {args:?}");

    match args.command {
        Command::Collect { file, demo } => {
            let config = read_config_file(&file)?;
            collect_once(&config, demo || get_demo_mode()).await
        }
        Command::Watch { file, demo } => {
            let config = read_config_file(&file)?;
            watch(&config, demo || get_demo_mode()).await
        }
        Command::Probe {
            address,
            user,
            port,
            file,
        } => {
            let config = match file {
                Some(file) => read_config_file(&file)?,
                None => Config::default(),
            };
            probe(&config, &address, &user, port).await
        }
    }
}

fn collector(config: &Config) -> Collector {
    let runner = SshRunner::with_program(&config.collection.ssh_program);
    Collector::new(Arc::new(runner), config.collection.collector_settings())
}

fn registry(config: &Config) -> anyhow::Result<MemoryRegistry> {
    let hosts = config.host_records().context("failed to load hosts")?;
    Ok(MemoryRegistry::with_hosts(hosts))
}

async fn collect_once(config: &Config, demo: bool) -> anyhow::Result<()> {
    let registry = registry(config)?;
    let prefer_real = config.collection.prefer_real && !demo;

    let samples = collector(config)
        .collect_registry(&registry, prefer_real)
        .await;

    println!("{}", serde_json::to_string_pretty(&samples)?);

    Ok(())
}

async fn watch(config: &Config, demo: bool) -> anyhow::Result<()> {
    let registry = registry(config)?;
    if registry.is_empty().await {
        warn!("no hosts configured");
    }

    let prefer_real = config.collection.prefer_real && !demo;
    let collector = collector(config);

    let mut interval = tokio::time::interval(config.collection.interval());
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

    info!(
        "collecting {} hosts every {:?}",
        registry.list_hosts().await?.len(),
        config.collection.interval()
    );

    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            _ = interval.tick() => {}
            _ = &mut shutdown => {
                info!("stopping");
                return Ok(());
            }
        }

        // dropping the cycle future aborts every in-flight host
        tokio::select! {
            samples = collector.collect_registry(&registry, prefer_real) => {
                debug!("cycle produced {} samples", samples.len());
                println!("{}", serde_json::to_string(&samples)?);
            }
            _ = &mut shutdown => {
                info!("stopping, current cycle cancelled");
                return Ok(());
            }
        }
    }
}

async fn probe(config: &Config, address: &str, user: &str, port: u16) -> anyhow::Result<()> {
    let secret = get_secret()
        .map(Secret::new)
        .context("HOSTWATCH_SECRET is not set")?;

    let runner = SshRunner::with_program(&config.collection.ssh_program);
    let prober = Prober::new(Arc::new(runner), config.collection.probe_timeout());

    let result = prober.probe(address, user, &secret, port).await;

    println!("{}", serde_json::to_string_pretty(&result)?);

    Ok(())
}
