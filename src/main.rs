//! OTA Agent CLI
//!
//! Entry point for the `ota-agent` command-line tool.

use clap::{ArgAction, Parser, Subcommand};
use ota_agent::config::DEFAULT_CONFIG_FILE;
use ota_agent::{AgentConfig, JobDocument, OtaSession};
use std::path::PathBuf;
use std::process;

#[derive(Parser)]
#[command(name = "ota-agent")]
#[command(about = "OTA job intake and status messages", version)]
struct Cli {
    /// Path to agent config file (default: ota.toml)
    #[arg(long, short = 'c', global = true)]
    config: Option<PathBuf>,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(long, short = 'v', action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse an OTA job document and print the firmware descriptor
    Parse {
        /// Path to the job document
        job: PathBuf,

        /// The file is a full upgrade notification; use its `data` object
        #[arg(long)]
        notification: bool,

        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },

    /// Print a firmware-info request
    Info {
        /// Firmware version currently running
        firmware_version: String,

        /// Message id (default: messages.next_id from config)
        #[arg(long)]
        id: Option<u32>,
    },

    /// Print a progress report
    Report {
        /// Progress step: 0..=100 percent, or a negative failure code
        #[arg(allow_negative_numbers = true)]
        step: i32,

        /// Optional description
        #[arg(long)]
        desc: Option<String>,

        /// Message id (default: messages.next_id from config)
        #[arg(long)]
        id: Option<u32>,
    },
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let mut config = match load_config(cli.config) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error loading config: {}", e);
            process::exit(1);
        }
    };

    match cli.command {
        Commands::Parse {
            job,
            notification,
            json,
        } => {
            run_parse(config, job, notification, json);
        }
        Commands::Info {
            firmware_version,
            id,
        } => {
            if let Some(id) = id {
                config.messages.next_id = id;
            }
            run_info(config, &firmware_version);
        }
        Commands::Report { step, desc, id } => {
            if let Some(id) = id {
                config.messages.next_id = id;
            }
            run_report(config, step, desc.as_deref());
        }
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .init();
}

fn load_config(config_path: Option<PathBuf>) -> Result<AgentConfig, ota_agent::ConfigError> {
    let path = config_path.unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE));
    AgentConfig::load(&path)
}

fn run_parse(config: AgentConfig, job_path: PathBuf, notification: bool, json_output: bool) {
    let document = JobDocument::from_file(&job_path).and_then(|doc| {
        if notification {
            JobDocument::from_notification(doc.as_bytes())
        } else {
            Ok(doc)
        }
    });
    let document = match document {
        Ok(d) => d,
        Err(e) => {
            eprintln!("Error reading job: {}", e);
            process::exit(1);
        }
    };

    let mut session = OtaSession::new(config);
    let firmware = match session.accept_job(&document) {
        Ok(f) => f,
        Err(e) => {
            eprintln!("Error parsing job: {}", e);
            process::exit(1);
        }
    };

    if json_output {
        match serde_json::to_string_pretty(firmware) {
            Ok(json) => println!("{}", json),
            Err(e) => {
                eprintln!("Error serializing output: {}", e);
                process::exit(1);
            }
        }
    } else {
        println!("Version: {}", firmware.version);
        println!("URL:     {}", firmware.url);
        println!("MD5:     {}", String::from_utf8_lossy(firmware.md5_hex()));
        println!("Size:    {} bytes", firmware.file_size);
    }
}

fn run_info(config: AgentConfig, firmware_version: &str) {
    let mut session = OtaSession::new(config);
    let mut buf = session.message_buffer();

    match session.info_request(&mut buf, firmware_version) {
        Ok(len) => println!("{}", String::from_utf8_lossy(&buf[..len])),
        Err(e) => {
            eprintln!("Error building info request: {}", e);
            process::exit(1);
        }
    }
}

fn run_report(config: AgentConfig, step: i32, desc: Option<&str>) {
    if ota_agent::ProgressStep::try_from(step).is_err() {
        log::warn!("step {} is not a known progress code", step);
    }

    let mut session = OtaSession::new(config);
    let mut buf = session.message_buffer();

    match session.report(&mut buf, step, desc) {
        Ok(len) => println!("{}", String::from_utf8_lossy(&buf[..len])),
        Err(e) => {
            eprintln!("Error building report: {}", e);
            process::exit(1);
        }
    }
}
