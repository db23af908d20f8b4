use clap::{Parser, Subcommand};
use img_compressor::config::{self, Config};
use img_compressor::imaging::{ImageBuffer, JpegEncoder};
use img_compressor::output::{self, JsonLine};
use img_compressor::preview::{PreviewController, PreviewEvent, PreviewStatus};
use std::io::BufRead;
use std::path::{Path, PathBuf};
use std::sync::mpsc;
use std::time::Duration;

/// Upper bound for one-shot encodes; large photos take a few seconds.
const ENCODE_TIMEOUT: Duration = Duration::from_secs(300);

/// How often the interactive shell checks for finished encodes.
const POLL_INTERVAL: Duration = Duration::from_millis(20);

#[derive(Parser)]
#[command(name = "img-compressor")]
#[command(about = "Recompress images as JPEG with a live size preview")]
#[command(long_about = "\
Recompress images as JPEG with a live size preview

The compression slider runs from 0 (best quality) to 100 (smallest file).

Interactive preview commands (one per line on stdin):

  <0-100>        set the compression percent
  open <path>    open another image
  save [path]    save the current preview (default: <stem>_compressed.jpg)
  status         show the controller state
  quit           exit

Run 'img-compressor gen-config' to generate a documented config.toml.")]
#[command(version)]
struct Cli {
    /// Config file (defaults apply when omitted)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Show dimensions and size of an image
    Info {
        image: PathBuf,
        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },
    /// Recompress an image once and save it
    Compress {
        image: PathBuf,
        /// Compression percent: 0 = best quality, 100 = smallest file
        #[arg(long, short, value_parser = clap::value_parser!(u8).range(0..=100))]
        compression: Option<u8>,
        /// Output path (default: <stem><suffix>.jpg next to the source)
        #[arg(long, short)]
        output: Option<PathBuf>,
    },
    /// Interactive preview driven by commands on stdin
    Preview {
        image: PathBuf,
        /// Print JSON lines instead of text
        #[arg(long)]
        json: bool,
    },
    /// Print a stock config.toml with all options documented
    GenConfig,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();
    let config = config::load_config(cli.config.as_deref())?;

    match cli.command {
        Command::Info { image, json } => {
            let info = ImageBuffer::open(&image)?.info();
            if json {
                output::print_json(&JsonLine::Opened {
                    path: &image,
                    info: &info,
                });
            } else {
                output::print_image_info(&image, &info);
            }
        }
        Command::Compress {
            image,
            compression,
            output: destination,
        } => {
            let mut controller = PreviewController::new(JpegEncoder::new(), &config.preview)?;
            let info = controller.open(&image)?;
            output::print_image_info(&image, &info);

            let percent = compression.unwrap_or(config.quality.initial_compression);
            controller.set_compression_percent(percent as f64)?;
            for event in controller.wait(ENCODE_TIMEOUT) {
                output::print_preview_event(&event);
                if let PreviewEvent::Failed { error, .. } = event {
                    return Err(error.into());
                }
            }
            if controller.status() != PreviewStatus::Ready {
                return Err("timed out waiting for the encoder".into());
            }

            let destination = destination
                .unwrap_or_else(|| controller.session().suggested_destination(&config.save.suffix));
            let written = controller.save(&destination)?;
            output::print_saved(&destination, written);
        }
        Command::Preview { image, json } => {
            run_preview(&config, &image, json)?;
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}

/// One parsed line of interactive input.
enum ShellCommand {
    Compression(f64),
    Open(PathBuf),
    Save(Option<PathBuf>),
    Status,
    Quit,
}

fn parse_command(line: &str) -> Result<ShellCommand, String> {
    let line = line.trim();
    let (word, rest) = match line.split_once(char::is_whitespace) {
        Some((word, rest)) => (word, rest.trim()),
        None => (line, ""),
    };
    match word {
        "open" if !rest.is_empty() => Ok(ShellCommand::Open(PathBuf::from(rest))),
        "open" => Err("usage: open <path>".into()),
        "save" if rest.is_empty() => Ok(ShellCommand::Save(None)),
        "save" => Ok(ShellCommand::Save(Some(PathBuf::from(rest)))),
        "status" => Ok(ShellCommand::Status),
        "quit" | "exit" => Ok(ShellCommand::Quit),
        number => number
            .parse::<f64>()
            .ok()
            .filter(|p| (0.0..=100.0).contains(p))
            .map(ShellCommand::Compression)
            .ok_or_else(|| format!("unknown command: {line}")),
    }
}

/// The interactive shell: stdin lines play the role of slider and button
/// events, preview events are printed as they are accepted.
fn run_preview(config: &Config, image: &Path, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let mut controller = PreviewController::new(JpegEncoder::new(), &config.preview)?;
    let info = controller.open(image)?;
    if json {
        output::print_json(&JsonLine::Opened { path: image, info: &info });
    } else {
        output::print_image_info(image, &info);
    }
    controller.set_quality(config.quality.initial_quality())?;

    // Reading stdin blocks, so it gets its own thread; the control loop
    // only ever waits with a timeout.
    let (tx, rx) = mpsc::channel();
    std::thread::spawn(move || {
        for line in std::io::stdin().lock().lines() {
            let Ok(line) = line else { break };
            if tx.send(line).is_err() {
                break;
            }
        }
    });

    let print_events = |events: Vec<PreviewEvent>| {
        for event in &events {
            if json {
                output::print_json(&JsonLine::from_event(event));
            } else {
                output::print_preview_event(event);
            }
        }
    };

    loop {
        print_events(controller.poll());

        let line = match rx.recv_timeout(POLL_INTERVAL) {
            Ok(line) => line,
            Err(mpsc::RecvTimeoutError::Timeout) => continue,
            Err(mpsc::RecvTimeoutError::Disconnected) => break,
        };
        if line.trim().is_empty() {
            continue;
        }

        match parse_command(&line) {
            Ok(ShellCommand::Compression(percent)) => {
                if let Err(e) = controller.set_compression_percent(percent) {
                    eprintln!("{}", e);
                }
            }
            Ok(ShellCommand::Open(path)) => match controller.open(&path) {
                Ok(info) => {
                    if json {
                        output::print_json(&JsonLine::Opened { path: &path, info: &info });
                    } else {
                        output::print_image_info(&path, &info);
                    }
                    controller.set_quality(controller.quality()).ok();
                }
                Err(e) => eprintln!("Error opening {}: {}", path.display(), e),
            },
            Ok(ShellCommand::Save(path)) => {
                // Save what the user is looking at: finish the latest request first.
                print_events(controller.wait(ENCODE_TIMEOUT));
                let destination = path.unwrap_or_else(|| {
                    controller.session().suggested_destination(&config.save.suffix)
                });
                match controller.save(&destination) {
                    Ok(written) if json => output::print_json(&JsonLine::Saved {
                        path: &destination,
                        size: written,
                    }),
                    Ok(written) => output::print_saved(&destination, written),
                    Err(e) => eprintln!("{}", e),
                }
            }
            Ok(ShellCommand::Status) => {
                eprintln!(
                    "{:?} at {}% compression; cache: {}",
                    controller.status(),
                    controller.quality().compression_percent(),
                    controller.cache_stats()
                );
            }
            Ok(ShellCommand::Quit) => break,
            Err(message) => eprintln!("{}", message),
        }
    }

    print_events(controller.wait(ENCODE_TIMEOUT));
    log::info!("Cache: {}", controller.cache_stats());
    Ok(())
}
