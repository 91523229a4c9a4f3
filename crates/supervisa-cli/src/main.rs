//! `supervisa`: command-line front end for the supervision ledger.
//!
//! Reads `supervisa.toml` (or the path given with `--config`), opens the
//! SQLite ledger, and runs one subcommand.
//!
//! # Usage
//!
//! ```text
//! supervisa ingest fiscalizados_julio.xlsx --source fiscalizados
//! supervisa compare cliente.xlsx
//! supervisa approve cliente.xlsx
//! supervisa roster import locales.xlsx
//! supervisa roster export disponibles.csv
//! supervisa progress --month Agosto --region "DEL MAULE"
//! ```

mod config;
mod render;

use std::{fs::File, path::PathBuf};

use anyhow::Context as _;
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand, ValueEnum};
use config::AppConfig;
use serde::Serialize;
use supervisa_core::{
  ledger::load_unified,
  pipeline,
  reference::ReferenceData,
  report::{self, Metrics, MonthSelection, RecordFilter},
  roster::{RosterSummary, available},
  store::{LedgerStore, RosterStore, Table},
};
use supervisa_sheet::{
  Normalizer, SourceKind, authority_from_table, read_table, roster_from_table,
  write_roster_csv,
};
use supervisa_store_sqlite::SqliteStore;
use tracing::{info, level_filters::LevelFilter};
use tracing_subscriber::EnvFilter;

// ─── CLI args ────────────────────────────────────────────────────────────────

#[derive(Parser)]
#[command(author, version, about = "Supervision ledger reconciliation")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "supervisa.toml", global = true)]
  config: PathBuf,

  /// Log at debug level unless RUST_LOG says otherwise.
  #[arg(short, long, global = true)]
  verbose: bool,

  /// Print results as JSON.
  #[arg(long, global = true)]
  json: bool,

  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand)]
enum Command {
  /// Normalize an export file and add it to the ledger.
  Ingest {
    file:   PathBuf,
    /// Export layout: fiscalizados, prefiscalizados or fiscalizados-cmc.
    #[arg(short, long)]
    source: String,
  },
  /// Compare the staging table against the client's approval list.
  Compare { authority: PathBuf },
  /// Compare, then promote every staged record the client approved.
  Approve { authority: PathBuf },
  /// Manage the location roster.
  Roster {
    #[command(subcommand)]
    action: RosterCommand,
  },
  /// Headline metrics and goal progress per region.
  Progress {
    /// A campaign month, or "Total".
    #[arg(short, long, default_value = "Total")]
    month:  MonthSelection,
    #[command(flatten)]
    filter: FilterArgs,
  },
  /// Goal percentage per region and campaign month.
  Heatmap {
    #[command(flatten)]
    filter: FilterArgs,
  },
  /// List the content of a ledger table.
  Show { table: ShowTarget },
}

#[derive(Subcommand)]
enum RosterCommand {
  /// Replace the roster with the locations in FILE.
  Import { file: PathBuf },
  /// Count locations per status.
  Status,
  /// Write the locations still available for supervision as CSV.
  Export { out: PathBuf },
}

#[derive(Args)]
struct FilterArgs {
  /// Only records of this region (repeatable).
  #[arg(long)]
  region:     Vec<String>,
  /// Only records of this supervisor (repeatable).
  #[arg(long)]
  supervisor: Vec<String>,
  /// First date included (YYYY-MM-DD).
  #[arg(long)]
  from:       Option<NaiveDate>,
  /// Last date included (YYYY-MM-DD).
  #[arg(long)]
  to:         Option<NaiveDate>,
}

impl From<FilterArgs> for RecordFilter {
  fn from(a: FilterArgs) -> Self {
    Self {
      supervisors: a.supervisor,
      regions:     a.region,
      from:        a.from,
      to:          a.to,
    }
  }
}

#[derive(Clone, Copy, ValueEnum)]
enum ShowTarget {
  Main,
  Staging,
  Flagged,
  Unified,
}

// ─── Entry point ─────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  let cli = Cli::parse();

  let default_level = if cli.verbose { LevelFilter::DEBUG } else { LevelFilter::INFO };
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(default_level.into())
        .from_env_lossy(),
    )
    .with_writer(std::io::stderr)
    .init();

  let cfg = AppConfig::load(&cli.config)?;
  let reference = cfg.reference()?;

  let store = SqliteStore::open(&cfg.store_path)
    .await
    .with_context(|| format!("failed to open store at {:?}", cfg.store_path))?;
  info!(path = %cfg.store_path.display(), "opened ledger");

  let out = Output { json: cli.json };
  match cli.command {
    Command::Ingest { file, source } => ingest(&store, &reference, file, &source, out).await,
    Command::Compare { authority } => compare(&store, authority, out).await,
    Command::Approve { authority } => approve(&store, authority, out).await,
    Command::Roster { action } => roster(&store, action, out).await,
    Command::Progress { month, filter } => progress(&store, &reference, month, filter, out).await,
    Command::Heatmap { filter } => heatmap(&store, &reference, filter, out).await,
    Command::Show { table } => show(&store, table, out).await,
  }
}

// ─── Output ──────────────────────────────────────────────────────────────────

#[derive(Clone, Copy)]
struct Output {
  json: bool,
}

impl Output {
  /// Print `value` as JSON, or the text produced by `text`.
  fn emit<T: Serialize>(&self, value: &T, text: impl FnOnce() -> String) -> anyhow::Result<()> {
    if self.json {
      println!("{}", serde_json::to_string_pretty(value)?);
    } else {
      print!("{}", text());
    }
    Ok(())
  }
}

// ─── Commands ────────────────────────────────────────────────────────────────

async fn ingest(
  store: &SqliteStore,
  reference: &ReferenceData,
  file: PathBuf,
  source: &str,
  out: Output,
) -> anyhow::Result<()> {
  let kind: SourceKind = source.parse()?;
  let table = read_table(&file).with_context(|| format!("reading {}", file.display()))?;
  let normalized = Normalizer::new(reference)
    .normalize(&table, kind)
    .with_context(|| format!("normalizing {} as {kind}", file.display()))?;
  let report = normalized.report;

  let outcome = pipeline::ingest_records(store, normalized.records)
    .await
    .context("writing upload to the ledger")?;

  #[derive(Serialize)]
  struct IngestResult<'a> {
    report:  &'a supervisa_sheet::NormalizeReport,
    staged:  usize,
    flagged: usize,
  }

  out.emit(
    &IngestResult { report: &report, staged: outcome.staged, flagged: outcome.flagged },
    || {
      let mut text = render::normalize_report(&report);
      if outcome.is_noop() {
        text.push_str("El archivo no contiene registros válidos; no se guardó nada.\n");
      } else {
        text.push_str(&format!(
          "Se agregaron {} nuevos registros a la base de datos temporal.\n\
           Se encontraron {} registros duplicados.\n",
          outcome.staged, outcome.flagged
        ));
      }
      text
    },
  )
}

async fn compare(store: &SqliteStore, authority: PathBuf, out: Output) -> anyhow::Result<()> {
  let table = read_table(&authority)
    .with_context(|| format!("reading {}", authority.display()))?;
  let entries = authority_from_table(&table)?;
  let d = pipeline::compare(store, &entries).await.context("comparing with client list")?;
  out.emit(&d, || render::discrepancies(&d))
}

async fn approve(store: &SqliteStore, authority: PathBuf, out: Output) -> anyhow::Result<()> {
  let table = read_table(&authority)
    .with_context(|| format!("reading {}", authority.display()))?;
  let entries = authority_from_table(&table)?;
  let outcome = pipeline::approve(store, &entries)
    .await
    .context("promoting approved records")?;

  out.emit(&outcome, || {
    let mut text = render::discrepancies(&outcome.discrepancies);
    text.push_str(&format!(
      "{} registros aprobados y movidos a la base principal; {} quedan en temporal.\n",
      outcome.promoted, outcome.remaining
    ));
    text
  })
}

async fn roster(store: &SqliteStore, action: RosterCommand, out: Output) -> anyhow::Result<()> {
  match action {
    RosterCommand::Import { file } => {
      let table = read_table(&file).with_context(|| format!("reading {}", file.display()))?;
      let entries = roster_from_table(&table)?;
      let count = entries.len();
      store.save_roster(entries).await.context("saving roster")?;
      info!(locations = count, "roster imported");
      out.emit(&count, || format!("{count} locales importados.\n"))
    }
    RosterCommand::Status => {
      let annotated = pipeline::roster_status(store).await.context("loading roster")?;
      let summary = RosterSummary::of(&annotated);
      out.emit(&summary, || render::roster_summary(&summary))
    }
    RosterCommand::Export { out: path } => {
      let annotated = pipeline::roster_status(store).await.context("loading roster")?;
      let free = available(&annotated);
      let file = File::create(&path).with_context(|| format!("creating {}", path.display()))?;
      write_roster_csv(file, free.iter().copied())?;
      info!(path = %path.display(), locations = free.len(), "exported available locations");
      out.emit(&free.len(), || {
        format!("{} locales disponibles escritos en {}.\n", free.len(), path.display())
      })
    }
  }
}

async fn progress(
  store: &SqliteStore,
  reference: &ReferenceData,
  month: MonthSelection,
  filter: FilterArgs,
  out: Output,
) -> anyhow::Result<()> {
  let unified = load_unified(store).await.context("loading ledger")?;
  let filter = RecordFilter::from(filter);
  let records = filter.apply(&unified);

  #[derive(Serialize)]
  struct ProgressResult {
    metrics:  Metrics,
    progress: report::GoalProgress,
  }

  let result = ProgressResult {
    metrics:  report::metrics(&records, month),
    progress: report::goal_progress(&records, reference, month),
  };
  out.emit(&result, || {
    format!(
      "{}\n{}",
      render::metrics(&result.metrics),
      render::goal_progress(&result.progress)
    )
  })
}

async fn heatmap(
  store: &SqliteStore,
  reference: &ReferenceData,
  filter: FilterArgs,
  out: Output,
) -> anyhow::Result<()> {
  let unified = load_unified(store).await.context("loading ledger")?;
  let records = RecordFilter::from(filter).apply(&unified);
  let h = report::heatmap(&records, reference);
  out.emit(&h, || render::heatmap(&h))
}

async fn show(store: &SqliteStore, target: ShowTarget, out: Output) -> anyhow::Result<()> {
  let records = match target {
    ShowTarget::Main => store.load(Table::Main).await,
    ShowTarget::Staging => store.load(Table::Staging).await,
    ShowTarget::Flagged => store.load(Table::Flagged).await,
    ShowTarget::Unified => load_unified(store).await,
  }
  .context("loading ledger")?;
  out.emit(&records, || render::records(&records))
}
