use duration_str::deserialize_duration;
use log::LevelFilter;
use serde::Deserialize;
use std::{
  fs::File,
  io::{Read, Write},
  path::Path,
  time::Duration,
};

use crate::mission::table::TableOptions;

#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct Log {
  pub level: LevelFilter,
}

impl Default for Log {
  fn default() -> Self {
    Self {
      level: LevelFilter::Info,
    }
  }
}

#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct Web {
  pub listen: String,
  pub max_body_bytes: usize,
  #[serde(deserialize_with = "deserialize_duration")]
  pub read_timeout: Duration,
}

impl Default for Web {
  fn default() -> Self {
    Self {
      listen: "0.0.0.0:5000".to_owned(),
      max_body_bytes: 1024 * 1024,
      read_timeout: Duration::from_secs(10),
    }
  }
}

#[derive(Deserialize, Debug, Clone, Default)]
#[serde(default)]
pub struct Table {
  pub utf8_bom: bool,
}

impl From<&Table> for TableOptions {
  fn from(value: &Table) -> Self {
    Self {
      utf8_bom: value.utf8_bom,
    }
  }
}

#[derive(Deserialize, Debug, Clone, Default)]
#[serde(default)]
pub struct Config {
  pub log: Log,
  pub web: Web,
  pub table: Table,
}

pub fn parse_config(raw: &str) -> Result<Config, toml::de::Error> {
  toml::from_str(raw)
}

/// Looks the config up in the usual places. Lookup progress is reported to
/// `out` since the logger can't be configured before the config is read.
pub fn read_config<W: Write>(filename: Option<&str>, out: &mut W) -> Config {
  let mut filenames = vec!["./mission-gen.toml", "/etc/mission-gen.toml"];
  if let Some(filename) = filename {
    filenames.insert(0, filename);
  }
  let mut note = |msg: String| {
    let _ = writeln!(out, "{msg}");
  };

  for fname in filenames {
    let path = Path::new(fname);
    note(format!("Trying config file {}...", fname));
    if path.is_file() {
      let mut f = match File::open(path) {
        Ok(f) => f,
        Err(err) => {
          note(format!("Error opening config file {}: {}", fname, err));
          continue;
        }
      };
      let mut config_raw = String::new();
      if let Err(err) = f.read_to_string(&mut config_raw) {
        note(format!("Error reading config file {}: {}", fname, err));
        continue;
      }
      match parse_config(&config_raw) {
        Ok(config) => return config,
        Err(err) => {
          note(format!("Error parsing config file {}: {}", fname, err));
          continue;
        }
      }
    }
    note(format!("Config file {} does not exist", fname));
  }
  note("No config files can be read, using default settings".to_owned());
  Default::default()
}
