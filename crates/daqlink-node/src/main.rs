// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! daqlink node CLI
//!
//! # Usage
//!
//! ```bash
//! daqlink-node device --listen 0.0.0.0:7400
//! daqlink-node host --connect 192.168.1.20:7400 --dout 5
//! daqlink-node --config node.toml loopback
//! daqlink-node gen-config --output node.toml
//! daqlink-node validate --config node.toml
//! ```

use clap::{Parser, Subcommand};
use daqlink_node::{run_device, run_host, run_loopback, stop_on_ctrlc, NodeConfig};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

/// Data-acquisition link node
#[derive(Parser, Debug)]
#[command(name = "daqlink-node")]
#[command(author = "naskel.com")]
#[command(about = "Data-acquisition link node - device end, host end, or both")]
#[command(version)]
struct Args {
    /// Configuration file path
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Log level (overrides the configuration file)
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// Statistics reporting interval (seconds, 0 to disable)
    #[arg(long, global = true)]
    stats_interval: Option<u64>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Serve host connections with a simulated converter board
    Device {
        /// Listen address
        #[arg(short, long)]
        listen: Option<String>,

        /// Sampling period (microseconds)
        #[arg(long)]
        sample_period_us: Option<u64>,
    },

    /// Connect to a device and stream a waveform
    Host {
        /// Device address
        #[arg(long)]
        connect: Option<String>,

        /// Digital output value to apply
        #[arg(long)]
        dout: Option<u8>,

        /// Stop after this many seconds (0 runs until Ctrl+C)
        #[arg(short, long)]
        duration: Option<u64>,
    },

    /// Run both ends in one process over shared slots
    Loopback {
        /// Stop after this many seconds (0 runs until Ctrl+C)
        #[arg(short, long)]
        duration: Option<u64>,
    },

    /// Generate example configuration file
    GenConfig {
        /// Output file path
        #[arg(short, long, default_value = "daqlink-node.toml")]
        output: PathBuf,
    },

    /// Validate a configuration file
    Validate,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    match &args.command {
        Commands::GenConfig { output } => return cmd_gen_config(output),
        Commands::Validate => return cmd_validate(args.config.as_deref()),
        _ => {}
    }

    let mut config = match &args.config {
        Some(path) => NodeConfig::from_file(path)?,
        None => NodeConfig::default(),
    };
    if let Some(level) = &args.log_level {
        config.log_level.clone_from(level);
    }
    if let Some(interval) = args.stats_interval {
        config.stats_interval_secs = interval;
    }

    // Initialize logging
    let filter = EnvFilter::try_new(&config.log_level).unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    match args.command {
        Commands::GenConfig { .. } | Commands::Validate => Ok(()),
        Commands::Device {
            listen,
            sample_period_us,
        } => {
            if let Some(listen) = listen {
                config.device.listen = listen;
            }
            if let Some(period) = sample_period_us {
                config.device.sample_period_us = period;
            }
            config.validate()?;
            let stop = stop_on_ctrlc();
            let stats = run_device(&config, &stop)?;
            println!("\nFinal Statistics:\n{stats}");
            Ok(())
        }
        Commands::Host {
            connect,
            dout,
            duration,
        } => {
            if let Some(connect) = connect {
                config.host.connect = connect;
            }
            if dout.is_some() {
                config.host.dout = dout;
            }
            if let Some(duration) = duration {
                config.host.duration_secs = duration;
            }
            config.validate()?;
            let stop = stop_on_ctrlc();
            let report = run_host(&config, &stop)?;
            println!("\nFinal Statistics:\n{report:#?}");
            Ok(())
        }
        Commands::Loopback { duration } => {
            if let Some(duration) = duration {
                config.host.duration_secs = duration;
            }
            config.validate()?;
            let stop = stop_on_ctrlc();
            let (stats, report) = run_loopback(&config, &stop)?;
            println!("\nDevice:\n{stats}");
            println!("Host:\n{report:#?}");
            Ok(())
        }
    }
}

fn cmd_gen_config(output: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let toml_str = toml::to_string_pretty(&NodeConfig::default())?;

    let content = format!(
        r#"# daqlink node configuration
# Generated by daqlink-node gen-config
# Durations are in milliseconds unless the key says otherwise.

{}
"#,
        toml_str
    );

    std::fs::write(output, content)?;
    println!("Generated configuration file: {}", output.display());
    Ok(())
}

fn cmd_validate(path: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    let Some(path) = path else {
        eprintln!("validate needs --config <FILE>");
        std::process::exit(2);
    };
    match NodeConfig::from_file(path) {
        Ok(config) => {
            let link = config.link_config();
            println!("Configuration valid!");
            println!();
            println!(
                "Messages: {} bytes max, input batch {}, output batch {}",
                link.max_message_len, link.adc_batch, link.dac_batch
            );
            println!(
                "Keep-alive: every {:?}, timeout {:?}",
                link.keep_alive_period, link.keep_alive_timeout
            );
            println!("Device: {}", config.device.listen);
            println!("Host: {}", config.host.connect);
            Ok(())
        }
        Err(e) => {
            eprintln!("Configuration invalid: {}", e);
            std::process::exit(1);
        }
    }
}
