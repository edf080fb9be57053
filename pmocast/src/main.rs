//! pmocast - lecture one-shot sur un MediaRenderer UPnP/DLNA.
//!
//! Déroulé: découverte SSDP, sélection d'un renderer, résolution de la
//! source (URL directe ou fichier local servi en HTTP éphémère), puis
//! supervision de la lecture jusqu'à l'arrêt opérateur ou la fin de
//! piste côté device.
//!
//! stdout appartient à l'opérateur (listes, invites, ligne de statut);
//! tous les logs partent sur stderr via `tracing`.

mod config;
mod progress;
mod prompt;

use std::io::{self, Write};
use std::process;
use std::thread;
use std::time::Duration;

use anyhow::{Context, Result};
use crossbeam_channel::{Sender, bounded};
use tracing_subscriber::EnvFilter;

use pmocastcontrol::{
    AvTransportClient, DiscoveryOptions, SessionOptions, SessionOutcome, discover_renderers,
    run_session,
};
use pmocastserve::{guess_local_ip, resolve_media_source};

use crate::config::get_config;
use crate::progress::format_status_line;

const USAGE: &str = "\
pmocast - play a media URL or local file on a UPnP/DLNA MediaRenderer

Usage: pmocast [OPTIONS] [SOURCE]

Arguments:
  [SOURCE]  Media URL (http/https) or local file path; prompted when omitted

Options:
      --device <INDEX>   Renderer index to use, skipping the interactive prompt
      --timeout <SECS>   Discovery window in seconds (default: 5)
  -h, --help             Show this help
";

/// Options ligne de commande, volontairement minimales.
#[derive(Debug, Default, PartialEq)]
struct CliArgs {
    source: Option<String>,
    device: Option<usize>,
    timeout_secs: Option<u64>,
    help: bool,
}

fn main() -> Result<()> {
    init_logging();

    let raw_args: Vec<String> = std::env::args().skip(1).collect();
    let args = match parse_args(&raw_args) {
        Ok(args) => args,
        Err(message) => {
            eprintln!("Error: {}", message);
            eprint!("{}", USAGE);
            process::exit(2);
        }
    };
    if args.help {
        print!("{}", USAGE);
        return Ok(());
    }

    let config = get_config();
    let discovery_secs = args.timeout_secs.unwrap_or(config.discovery_secs);

    println!("Searching for MediaRenderer devices ({}s)...", discovery_secs);
    let options = DiscoveryOptions {
        timeout: Duration::from_secs(discovery_secs),
        mx: config.mx,
        description_timeout_secs: config.http_timeout_secs,
        ..DiscoveryOptions::default()
    };
    let renderers = discover_renderers(&options).context("SSDP discovery failed")?;

    if renderers.is_empty() {
        eprintln!("No MediaRenderer devices found on the network.");
        process::exit(1);
    }

    println!("\n=== Available Media Renderers ===");
    prompt::print_renderers(&renderers);

    let index = match args.device {
        Some(idx) if idx < renderers.len() => idx,
        Some(idx) => {
            eprintln!(
                "Error: --device {} is out of range (0-{})",
                idx,
                renderers.len() - 1
            );
            process::exit(1);
        }
        None => match prompt::select_renderer_index(renderers.len())? {
            Some(idx) => idx,
            None => process::exit(1),
        },
    };
    let renderer = &renderers[index];
    println!("✓ Selected renderer: {}", renderer.friendly_name);

    let source = match args.source {
        Some(source) => source,
        None => match prompt::prompt_media_source()? {
            Some(source) => source,
            None => process::exit(1),
        },
    };

    let local_ip = config.local_ip.clone().unwrap_or_else(guess_local_ip);
    let mut resolved = resolve_media_source(&source, &local_ip, config.bind_port)
        .context("Cannot resolve the media source")?;
    if resolved.is_local() {
        println!("Serving local file at {}", resolved.url());
    }

    let client = AvTransportClient::from_renderer(renderer).with_timeout(config.http_timeout_secs);

    println!("\nPlaying. Press Enter to stop.");

    let (cancel_tx, cancel_rx) = bounded::<()>(1);
    spawn_stdin_watcher(cancel_tx).context("Cannot start the input watcher")?;

    let session_options = SessionOptions {
        poll_interval: config.poll_interval(),
    };
    let outcome = run_session(
        &client,
        resolved.url(),
        &cancel_rx,
        &session_options,
        |snapshot| {
            print!("\r{:<72}", format_status_line(snapshot));
            let _ = io::stdout().flush();
        },
    );

    let outcome = match outcome {
        Ok(outcome) => outcome,
        Err(e) => {
            // Quitte la ligne de statut avant le rapport d'erreur.
            println!();
            return Err(e).context("Playback failed");
        }
    };

    match outcome {
        SessionOutcome::Stopped => println!("\nStopped."),
        SessionOutcome::Ended => println!("\nPlayback ended on device."),
    }

    if resolved.is_local() {
        resolved.shutdown();
        println!("Stopped file server.");
    }

    Ok(())
}

fn init_logging() {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("warn"))
        .unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(io::stderr)
        .try_init();
}

/// Watcher stdin: la première ligne lue (peu importe son contenu, EOF
/// compris) déclenche l'annulation, une seule fois.
fn spawn_stdin_watcher(cancel_tx: Sender<()>) -> io::Result<()> {
    thread::Builder::new()
        .name("pmocast-stdin".into())
        .spawn(move || {
            let mut line = String::new();
            let _ = io::stdin().read_line(&mut line);
            // Session déjà terminée = receveur parti, envoi ignoré.
            let _ = cancel_tx.send(());
        })?;
    Ok(())
}

fn parse_args(args: &[String]) -> Result<CliArgs, String> {
    let mut parsed = CliArgs::default();
    let mut iter = args.iter();

    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "-h" | "--help" => parsed.help = true,
            "--device" => {
                let value = iter.next().ok_or("--device expects a renderer index")?;
                parsed.device = Some(
                    value
                        .parse()
                        .map_err(|_| format!("invalid --device index: {}", value))?,
                );
            }
            "--timeout" => {
                let value = iter.next().ok_or("--timeout expects a number of seconds")?;
                parsed.timeout_secs = Some(
                    value
                        .parse()
                        .map_err(|_| format!("invalid --timeout value: {}", value))?,
                );
            }
            other if other.starts_with('-') => {
                return Err(format!("unknown option: {}", other));
            }
            other => {
                if parsed.source.is_some() {
                    return Err("only one media source may be given".to_string());
                }
                parsed.source = Some(other.to_string());
            }
        }
    }

    Ok(parsed)
}
