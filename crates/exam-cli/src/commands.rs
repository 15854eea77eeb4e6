//! One handler per subcommand. Each returns the JSON document to print.

use std::{collections::BTreeMap, path::PathBuf};

use anyhow::Context as _;
use clap::Subcommand;
use exam_analytics::charts;
use exam_core::{
  audit::{AuditEntry, OperationKind},
  change::{FieldChanges, new_record},
  record::{ACCEPTED_YEARS, CandidateId, CleanedRecord, Year},
  store::ExamStore,
  subject::Subject,
};
use exam_csv::cleaned_to_csv;
use serde::Serialize;
use serde_json::{Value, json};

use crate::bootstrap::App;

#[derive(Subcommand, Debug)]
pub enum Command {
  /// Add a record. Fields are given as FIELD=VALUE.
  Create {
    candidate_id: CandidateId,
    year:         Year,
    #[arg(value_parser = parse_field)]
    fields:       Vec<(String, Value)>,
  },
  /// Show every record of a candidate.
  Show { candidate_id: CandidateId },
  /// Delete one record.
  Delete { candidate_id: CandidateId, year: Year },
  /// Change fields of one record, given as FIELD=VALUE.
  Update {
    candidate_id: CandidateId,
    year:         Year,
    #[arg(value_parser = parse_field, required = true)]
    fields:       Vec<(String, Value)>,
  },
  /// Write the table to the snapshot file.
  Save {
    #[arg(long)]
    output: Option<PathBuf>,
  },
  /// Inspect or edit the operation history.
  History {
    #[command(subcommand)]
    action: HistoryCommand,
  },
  /// Clean the table against the province reference.
  Clean {
    /// Also write the cleaned table here.
    #[arg(long)]
    output: Option<PathBuf>,
  },
  /// Compute chart data.
  Chart {
    #[command(subcommand)]
    chart: ChartCommand,
  },
  /// List subjects with their column names and labels.
  Subjects,
  /// Record and history counts.
  Stats,
}

#[derive(Subcommand, Debug)]
pub enum HistoryCommand {
  List,
  Remove { index: usize },
  Clear,
}

#[derive(Subcommand, Debug)]
pub enum ChartCommand {
  /// Mean score per subject and year, cleaned table.
  Bar,
  /// Mean score per subject and year, live table.
  Line,
  Histogram {
    #[arg(long, default_value = "Toan")]
    subject: Subject,
    #[arg(long, default_value_t = ACCEPTED_YEARS[0])]
    year:    Year,
  },
  /// Pass and fail counts per year.
  Pie {
    #[arg(long, default_value = "Toan")]
    subject: Subject,
  },
  /// Score distribution of the subject groups.
  Area {
    #[arg(long)]
    year: Option<Year>,
  },
  Scatter {
    #[arg(long, default_value = "Toan")]
    x:    Subject,
    #[arg(long, default_value = "Van")]
    y:    Subject,
    #[arg(long)]
    year: Option<Year>,
  },
  /// Correlation between subjects.
  Heatmap {
    #[arg(long, default_value_t = ACCEPTED_YEARS[0])]
    year: Year,
  },
}

/// `FIELD=VALUE`. The value is read as JSON when it parses, as text
/// otherwise, so `Toan=8.5` is a number and `Toan=` clears the score.
fn parse_field(s: &str) -> Result<(String, Value), String> {
  let (name, value) = s
    .split_once('=')
    .ok_or_else(|| format!("expected FIELD=VALUE, got {s:?}"))?;
  let value = serde_json::from_str(value).unwrap_or_else(|_| Value::String(value.to_owned()));
  Ok((name.trim().to_owned(), value))
}

fn field_changes(fields: Vec<(String, Value)>) -> FieldChanges { fields.into_iter().collect() }

fn to_json(value: impl Serialize) -> anyhow::Result<Value> { Ok(serde_json::to_value(value)?) }

fn subjects() -> Value {
  Subject::ALL
    .iter()
    .map(|s| json!({ "column": s.column(), "label": s.label() }))
    .collect()
}

/// Commands that do not need the store.
pub fn run_offline(command: &Command) -> Option<Value> {
  match command {
    Command::Subjects => Some(subjects()),
    _ => None,
  }
}

pub async fn run(app: &App, command: Command) -> anyhow::Result<Value> {
  let store = &app.store;
  match command {
    Command::Create { candidate_id, year, fields } => {
      let record = new_record(candidate_id, year, &field_changes(fields))?;
      store.insert(record.clone()).await?;
      app.persist_table().await?;
      to_json(record)
    }

    Command::Show { candidate_id } => to_json(store.read_by_candidate(candidate_id).await?),

    Command::Delete { candidate_id, year } => {
      let removed = store.delete(candidate_id, year).await?;
      app.persist_table().await?;
      to_json(removed)
    }

    Command::Update { candidate_id, year, fields } => {
      let updated = store.update(candidate_id, year, field_changes(fields)).await?;
      app.persist_table().await?;
      to_json(updated)
    }

    Command::Save { output } => {
      let path = output.unwrap_or_else(|| app.config.snapshot_path.clone());
      let text = store
        .snapshot_to_storage(path.clone())
        .await
        .with_context(|| format!("failed to save {}", path.display()))?;
      Ok(json!({
        "file":    path.display().to_string(),
        "records": store.len().await,
        "text":    text,
      }))
    }

    Command::History { action } => match action {
      HistoryCommand::List => to_json(store.history().await?),
      HistoryCommand::Remove { index } => to_json(store.remove_history(index).await?),
      HistoryCommand::Clear => {
        store.clear_history().await?;
        to_json(Vec::<AuditEntry>::new())
      }
    },

    Command::Clean { output } => {
      let (cleaned, reference) = app.cleaned().await?;
      let total = store.len().await;
      if let Some(path) = &output {
        let text = cleaned_to_csv(&cleaned, reference.columns())?;
        tokio::fs::write(path, text)
          .await
          .with_context(|| format!("failed to write {}", path.display()))?;
      }
      let summary = json!({
        "rows":    cleaned.len(),
        "dropped": total.saturating_sub(cleaned.len()),
        "file":    output.map(|p| p.display().to_string()),
      });
      store
        .append_history(AuditEntry::now(OperationKind::Clean).with_payload(summary.clone()))
        .await?;
      Ok(summary)
    }

    Command::Chart { chart } => run_chart(app, chart).await,

    Command::Subjects => Ok(subjects()),

    Command::Stats => {
      let records = store.records().await?;
      let mut per_year: BTreeMap<Year, usize> = BTreeMap::new();
      for r in &records {
        *per_year.entry(r.year).or_default() += 1;
      }
      Ok(json!({
        "records": records.len(),
        "years":   per_year,
        "history": store.history().await?.len(),
      }))
    }
  }
}

async fn run_chart(app: &App, chart: ChartCommand) -> anyhow::Result<Value> {
  match chart {
    ChartCommand::Line => to_json(charts::line(&app.store.records().await?)),
    ChartCommand::Bar => to_json(charts::bar(&cleaned(app).await?)),
    ChartCommand::Histogram { subject, year } => {
      to_json(charts::histogram(&cleaned(app).await?, subject, year))
    }
    ChartCommand::Pie { subject } => to_json(charts::pass_fail(&cleaned(app).await?, subject)),
    ChartCommand::Area { year } => to_json(charts::area(&cleaned(app).await?, year)),
    ChartCommand::Scatter { x, y, year } => {
      to_json(charts::scatter(&cleaned(app).await?, x, y, year))
    }
    ChartCommand::Heatmap { year } => to_json(charts::heatmap(&cleaned(app).await?, year)),
  }
}

async fn cleaned(app: &App) -> anyhow::Result<Vec<CleanedRecord>> { Ok(app.cleaned().await?.0) }

#[cfg(test)]
mod tests {
  use exam_loader::CacheLoader;
  use exam_store_memory::MemoryStore;

  use super::*;
  use crate::config::AppConfig;

  fn app(dir: &tempfile::TempDir) -> App {
    let config = AppConfig {
      snapshot_path: dir.path().join("Updated_Data.csv"),
      ..AppConfig::default()
    };
    let loader = CacheLoader::new(dir.path(), config.cache_ttl(), config.fetch_timeout()).unwrap();
    App { config, loader, store: MemoryStore::in_memory(Vec::new()) }
  }

  fn fields(specs: &[&str]) -> Vec<(String, Value)> {
    specs.iter().map(|s| parse_field(s).unwrap()).collect()
  }

  #[tokio::test]
  async fn create_update_save_is_logged_in_order() {
    let dir = tempfile::tempdir().unwrap();
    let app = app(&dir);

    let created = run(&app, Command::Create {
      candidate_id: 7,
      year:         2019,
      fields:       fields(&["Toan=8", "MaTinh=2"]),
    })
    .await
    .unwrap();
    assert_eq!(created["Toan"], 8.0);

    let updated = run(&app, Command::Update {
      candidate_id: 7,
      year:         2019,
      fields:       fields(&["Toán="]),
    })
    .await
    .unwrap();
    assert!(updated["Toan"].is_null());
    assert_eq!(updated["MaTinh"], 2);
    // The working copy follows every change before any explicit save.
    let working = std::fs::read_to_string(&app.config.snapshot_path).unwrap();
    assert_eq!(working.lines().count(), 2);

    let output = dir.path().join("export.csv");
    let saved = run(&app, Command::Save { output: Some(output.clone()) }).await.unwrap();
    assert_eq!(saved["records"], 1);
    let text = saved["text"].as_str().unwrap();
    assert!(text.starts_with("SBD,Year,"));
    assert_eq!(std::fs::read_to_string(&output).unwrap(), text);

    let history = run(&app, Command::History { action: HistoryCommand::List }).await.unwrap();
    let ops: Vec<&str> = history
      .as_array()
      .unwrap()
      .iter()
      .map(|e| e["operation"].as_str().unwrap())
      .collect();
    assert_eq!(ops, ["CREATE", "UPDATE", "FINISH"]);
  }

  #[tokio::test]
  async fn unknown_candidate_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let app = app(&dir);
    assert!(run(&app, Command::Show { candidate_id: 1 }).await.is_err());
    assert!(run(&app, Command::Delete { candidate_id: 1, year: 2018 }).await.is_err());

    let stats = run(&app, Command::Stats).await.unwrap();
    assert_eq!(stats["records"], 0);
    assert_eq!(stats["history"], 1);
  }

  #[test]
  fn field_values_parse_as_json_or_text() {
    assert_eq!(parse_field("Toan=8.5").unwrap(), ("Toan".into(), json!(8.5)));
    assert_eq!(parse_field("Van=").unwrap(), ("Van".into(), json!("")));
    assert_eq!(parse_field("Ly=null").unwrap(), ("Ly".into(), Value::Null));
    assert_eq!(parse_field("Hoa=Không có").unwrap(), ("Hoa".into(), json!("Không có")));
    assert!(parse_field("Toan").is_err());
  }

  #[test]
  fn subjects_need_no_store() {
    let listing = run_offline(&Command::Subjects).unwrap();
    assert_eq!(listing[4], json!({ "column": "Ngoai ngu", "label": "Ngoại ngữ" }));
    assert!(run_offline(&Command::Stats).is_none());
  }
}
