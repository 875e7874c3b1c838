use clap::{Parser, Subcommand, ValueEnum};
use log::{error, info};
use mission_gen::{
  config::read_config,
  server::serve,
  service::{Endpoint, MissionService},
};
use simplelog::{ColorChoice, Config, TermLogger, TerminalMode};
use std::{fs, io::Write};

const VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Parser, Debug)]
struct Args {
  #[arg(short)]
  config: Option<String>,
  #[command(subcommand)]
  command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
  /// Serve the mission generation endpoints over HTTP
  Serve,
  /// Generate a mission file from a JSON request body
  Generate {
    #[arg(short, long)]
    input: String,
    #[arg(short, long, value_enum, default_value_t = Format::Csv)]
    format: Format,
    /// Written to stdout when omitted
    #[arg(short, long)]
    output: Option<String>,
  },
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum Format {
  Csv,
  Kml,
}

impl From<Format> for Endpoint {
  fn from(value: Format) -> Self {
    match value {
      Format::Csv => Endpoint::Table,
      Format::Kml => Endpoint::Path,
    }
  }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
  let args = Args::parse();
  // stdout carries the generated file in generate mode, lookup
  // progress and logs go to stderr
  let config = read_config(args.config.as_deref(), &mut std::io::stderr());
  let command = args.command.unwrap_or(Command::Serve);

  let mode = match command {
    Command::Serve => TerminalMode::Stdout,
    Command::Generate { .. } => TerminalMode::Stderr,
  };
  TermLogger::init(config.log.level, Config::default(), mode, ColorChoice::Auto)?;

  match command {
    Command::Serve => {
      info!("starting mission-gen server version {}", VERSION);
      serve(&config).await?;
    }
    Command::Generate {
      input,
      format,
      output,
    } => {
      let body = fs::read(&input)?;
      let svc = MissionService::new(&config);
      let artifact = match svc.generate(format.into(), &body) {
        Ok(artifact) => artifact,
        Err(err) => {
          error!("error generating mission from {input}: {err}");
          return Err(err.into());
        }
      };
      match output {
        Some(path) => {
          fs::write(&path, &artifact.body)?;
          info!("{} written to {path}", artifact.filename);
        }
        None => std::io::stdout().write_all(&artifact.body)?,
      }
    }
  }
  Ok(())
}
