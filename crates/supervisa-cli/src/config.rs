//! Configuration: a layered settings file plus an optional reference-data
//! override.

use std::path::{Path, PathBuf};

use anyhow::Context as _;
use serde::Deserialize;
use supervisa_core::reference::ReferenceData;
use tracing::debug;

/// Settings read from the `--config` file and `SUPERVISA_*` environment
/// variables.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct AppConfig {
  /// SQLite database holding the ledger and the roster.
  pub store_path:     PathBuf,
  /// TOML file overriding the built-in regions, aliases and goals.
  pub reference_path: Option<PathBuf>,
}

impl Default for AppConfig {
  fn default() -> Self {
    Self {
      store_path:     PathBuf::from("supervisiones.db"),
      reference_path: None,
    }
  }
}

impl AppConfig {
  /// Layer `path` (optional) under the environment.
  pub fn load(path: &Path) -> anyhow::Result<Self> {
    let settings = config::Config::builder()
      .add_source(config::File::from(path.to_path_buf()).required(false))
      .add_source(config::Environment::with_prefix("SUPERVISA"))
      .build()
      .context("failed to read config file")?;

    let mut cfg: AppConfig = settings
      .try_deserialize()
      .context("failed to deserialise AppConfig")?;

    cfg.store_path = expand_tilde(&cfg.store_path);
    cfg.reference_path = cfg.reference_path.as_deref().map(expand_tilde);
    Ok(cfg)
  }

  /// The reference tables: the override file when configured, else the
  /// built-in defaults. Always validated.
  pub fn reference(&self) -> anyhow::Result<ReferenceData> {
    let reference = match &self.reference_path {
      Some(path) => {
        let raw = std::fs::read_to_string(path)
          .with_context(|| format!("reading reference data {}", path.display()))?;
        debug!(path = %path.display(), "loaded reference override");
        parse_reference(&raw)
          .with_context(|| format!("parsing reference data {}", path.display()))?
      }
      None => ReferenceData::default(),
    };
    reference.validate().context("invalid reference data")?;
    Ok(reference)
  }
}

/// Parse a reference override. Tables absent from `raw` keep their built-in
/// values.
pub fn parse_reference(raw: &str) -> anyhow::Result<ReferenceData> {
  Ok(toml::from_str(raw)?)
}

/// Expand a leading `~` to the user's home directory.
pub fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}
