//! RadioDNS resolver for ODR-DabMux
//! Resolves every service of a multiplex configuration through RadioDNS and
//! lists the services that qualify for Slideshow and programme guides

use anyhow::Context;
use clap::Parser;
use odr_radiodns_bridge::{
    resolve_services, EpgService, HickoryClient, MuxConfig, RadioDns, Report, ResolverSettings,
    SlideshowService,
};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::{fmt::format::FmtSpan, prelude::*, EnvFilter};

/// Resolves RadioDNS services from an ODR-DabMux file
#[derive(Parser, Debug)]
#[command(name = "odr-radiodns-resolver", version, about)]
struct Args {
    /// Multiplex configuration file
    config: PathBuf,

    /// Turn debug logging on
    #[arg(short = 'X', long)]
    debug: bool,

    /// Print the report as JSON
    #[arg(long)]
    json: bool,

    /// Nameserver to query instead of the system resolver (ip:port)
    #[arg(long)]
    nameserver: Option<SocketAddr>,

    /// Per-query timeout in seconds
    #[arg(long, default_value_t = 5)]
    timeout: u64,

    /// Attempts per query before giving up
    #[arg(long, default_value_t = 2)]
    attempts: usize,

    /// RadioDNS root domain
    #[arg(long, default_value = odr_radiodns_bridge::radiodns::resolver::RADIODNS_ROOT)]
    root_domain: String,
}

impl Args {
    fn resolver_settings(&self) -> ResolverSettings {
        ResolverSettings {
            root_domain: self.root_domain.clone(),
            nameserver: self.nameserver,
            timeout: Duration::from_secs(self.timeout),
            attempts: self.attempts,
        }
    }
}

fn init_tracing(debug: bool) {
    let filter_layer = if debug {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    let format_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_writer(std::io::stderr)
        .with_span_events(FmtSpan::NONE);

    tracing_subscriber::registry()
        .with(filter_layer)
        .with(format_layer)
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_tracing(args.debug);

    let config = MuxConfig::load(&args.config)
        .with_context(|| format!("reading {}", args.config.display()))?;
    let services = config.mux_services()?;
    tracing::info!(
        ensemble = format!("{:04x}", config.ensemble.id),
        services = services.len(),
        "loaded multiplex configuration"
    );

    let settings = args.resolver_settings();
    let client = HickoryClient::new(&settings)?;
    let radiodns = RadioDns::new(client, settings);
    tracing::info!(
        root = %radiodns.settings().root_domain,
        attempts = radiodns.settings().attempts,
        "resolving services through RadioDNS"
    );

    let resolved = resolve_services(&radiodns, services).await;
    let report = Report::build(&resolved);

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!("\nSlideshow Services:");
    for service in &report.slideshow {
        print_slideshow(service);
    }

    println!("\nEPG Services:");
    for service in &report.epg {
        print_epg(service);
    }

    Ok(())
}

fn join<T: std::fmt::Display>(items: &[T]) -> String {
    items
        .iter()
        .map(|i| i.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

fn print_slideshow(service: &SlideshowService) {
    println!("  {} '{}' ({})", service.service, service.label, service.bearer);
    println!("    FQDN:          {}", service.fqdn);
    if !service.radiovis.is_empty() {
        println!("    RadioVIS:      {}", join(&service.radiovis));
    }
    if !service.radiovis_http.is_empty() {
        println!("    RadioVIS-HTTP: {}", join(&service.radiovis_http));
    }
}

fn print_epg(service: &EpgService) {
    println!("  {} ({})", service.fqdn, service.application);
    println!("    Bearers: {}", join(&service.bearers));
    println!("    Servers: {}", join(&service.servers));
}
