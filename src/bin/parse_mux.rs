//! Parse multiplex configuration utility
//! Loads an ODR-DabMux configuration file and displays what the bridge sees in it

use clap::Parser;
use odr_radiodns_bridge::{InfoTree, MuxConfig};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "parse-mux", version, about = "Show the services of an ODR-DabMux configuration")]
struct Args {
    /// Multiplex configuration file
    config: PathBuf,

    /// Print the normalized configuration tree instead of the service table
    #[arg(long)]
    tree: bool,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    let args = Args::parse();
    let tree = InfoTree::load(&args.config)?;

    if args.tree {
        print!("{}", tree);
        return Ok(());
    }

    let config = MuxConfig::from_tree(&tree)?;
    let ensemble = config.ensemble();
    println!("=== Ensemble ===");
    println!("  EId:         {:04X}", ensemble.id);
    println!("  ECC:         {:02X}", ensemble.ecc);
    println!("  Label:       {}", ensemble.label.as_deref().unwrap_or("-"));
    println!(
        "  Short label: {}",
        ensemble.short_label.as_deref().unwrap_or("-")
    );
    println!();

    let services = config.mux_services()?;
    println!("=== Services ({}) ===", services.len());
    for service in &services {
        println!("{} '{}'", service.name, service.label);
        println!("  Bearer:    {}", service.bearer);
        println!("  Slideshow: {}", if service.has_slideshow { "yes" } else { "no" });
        match (&service.epg, service.has_epg) {
            (Some(epg), _) => println!(
                "  EPG:       {} (packet size {}, address {})",
                epg.input_uri, epg.packet_size, epg.packet_address
            ),
            (None, true) => println!("  EPG:       component without packet subchannel"),
            (None, false) => println!("  EPG:       no"),
        }
        println!();
    }

    let packet_subs: Vec<_> = config
        .subchannels
        .iter()
        .filter(|s| s.kind.is_packet())
        .collect();
    if !packet_subs.is_empty() {
        println!("=== Packet subchannels ===");
        for sub in packet_subs {
            println!(
                "{} ({}): {} kbit/s from {}",
                sub.name,
                sub.kind,
                sub.bitrate.map(|b| b.to_string()).unwrap_or_else(|| "?".to_string()),
                sub.input_uri.as_deref().unwrap_or("-")
            );
        }
    }

    Ok(())
}
