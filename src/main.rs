use std::path::PathBuf;
use std::time::Instant;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::info;

use company_rows::db;
use company_rows::export::{self, ExportRow};
use company_rows::layout;
use company_rows::metrics::{new_run_id, RunReport};
use company_rows::parser::Engine;
use company_rows::pipeline::{self, InputRow, Pipeline};
use company_rows::settings::Settings;

#[derive(Parser)]
#[command(name = "company_rows", about = "Rebuild company records from OCR'd table rows")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the database schema
    Init,
    /// Load row texts from a CSV (page,row_index,row_text[,company,added_date,website])
    ImportRows { path: PathBuf },
    /// Cluster a JSON list of OCR detections into rows and load them
    ImportDetections {
        path: PathBuf,
        /// Page number the detections belong to
        #[arg(short, long)]
        page: i64,
    },
    /// Reconstruct records from stored rows
    Process {
        /// Max rows to process (default: all)
        #[arg(short = 'n', long)]
        limit: Option<usize>,
    },
    /// Write stored records to CSV
    Export {
        path: PathBuf,
        /// Only records without QA flags
        #[arg(long)]
        passing_only: bool,
    },
    /// Show row and record counts
    Stats,
    /// Compact table of stored records
    Overview {
        /// Max rows to display
        #[arg(short = 'n', long, default_value = "50")]
        limit: usize,
    },
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let t0 = Instant::now();
    let cli = Cli::parse();
    let settings = Settings::load()?;
    info!(db = ?settings.db_path, "settings loaded");

    let conn = db::connect(&settings.db_path)?;
    db::init_schema(&conn)?;

    let result = match cli.command {
        Commands::Init => {
            println!("Schema ready at {:?}", settings.db_path);
            Ok(())
        }
        Commands::ImportRows { path } => {
            let rows = pipeline::read_rows_csv(&path)?;
            let inserted = db::insert_rows(&conn, &rows)?;
            println!("Imported {} new rows ({} in file)", inserted, rows.len());
            Ok(())
        }
        Commands::ImportDetections { path, page } => {
            let detections = layout::read_detections(&path)?;
            let found = detections.len();
            let texts = layout::page_rows(
                detections,
                settings.layout.iou_threshold,
                settings.layout.y_tolerance,
            );
            let rows: Vec<InputRow> = texts
                .into_iter()
                .enumerate()
                .map(|(i, row_text)| InputRow {
                    page,
                    row_index: i as i64,
                    row_text,
                    ..InputRow::default()
                })
                .collect();
            let inserted = db::insert_rows(&conn, &rows)?;
            println!(
                "Page {}: {} detections -> {} rows ({} new)",
                page, found, rows.len(), inserted
            );
            Ok(())
        }
        Commands::Process { limit } => {
            let rows = db::fetch_rows(&conn, limit)?;
            if rows.is_empty() {
                println!("No rows stored. Run 'import-rows' first.");
                return Ok(());
            }
            let engine = Engine::new(settings.vocabulary.clone())
                .context("building engine from vocabulary")?;
            println!("Processing {} rows...", rows.len());
            let report = process_rows(&conn, &engine, &rows, settings.batch.chunk_size)?;
            report.print();
            Ok(())
        }
        Commands::Export { path, passing_only } => {
            let rows = db::fetch_records(&conn, passing_only)?;
            let written = export::write_csv_file(&path, &rows)?;
            println!("Wrote {} records to {:?}", written, path);
            Ok(())
        }
        Commands::Stats => {
            let s = db::get_stats(&conn)?;
            println!("Rows:     {}", s.rows);
            println!("Records:  {}", s.records);
            println!("Passing:  {}", s.passing);
            println!("Failing:  {}", s.failing);
            println!("Issues:   {}", s.issues);
            println!("Runs:     {}", s.runs);
            let top = db::top_issues(&conn, 5)?;
            if !top.is_empty() {
                println!("\n--- Top issues (latest run) ---");
                for (issue, n) in top {
                    println!("  {:<28} {}", issue, n);
                }
            }
            Ok(())
        }
        Commands::Overview { limit } => {
            let rows = db::fetch_overview(&conn, limit)?;
            if rows.is_empty() {
                println!("No records found.");
                return Ok(());
            }

            println!(
                "{:>5} | {:<24} | {:<20} | {:<9} | {:<12} | {:<10} | {:<3} | {}",
                "#", "Company", "Website", "Headcount", "Country", "Round", "QA", "Flags"
            );
            println!("{}", "-".repeat(120));
            for r in &rows {
                println!(
                    "{:>5} | {:<24} | {:<20} | {:<9} | {:<12} | {:<10} | {:<3} | {}",
                    r.row_id,
                    truncate(&r.company, 24),
                    truncate(&r.website, 20),
                    truncate(&r.headcount, 9),
                    truncate(&r.country, 12),
                    truncate(&r.last_funding_type, 10),
                    if r.qa_pass { "yes" } else { "no" },
                    truncate(&r.qa_flags, 40),
                );
            }
            println!("\n{} records", rows.len());
            Ok(())
        }
    };

    let elapsed = t0.elapsed();
    if elapsed.as_secs() >= 1 {
        println!("\nDone in {}", format_duration(elapsed));
    }

    result
}

fn process_rows(
    conn: &rusqlite::Connection,
    engine: &Engine,
    rows: &[InputRow],
    chunk_size: usize,
) -> anyhow::Result<RunReport> {
    use indicatif::{ProgressBar, ProgressStyle};

    let pb = ProgressBar::new(rows.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({per_sec})")?
            .progress_chars("#>-"),
    );

    let run_id = new_run_id();
    let cleared = db::clear_records(conn)?;
    info!(run_id = %run_id, cleared, "starting run");

    let mut pipeline = Pipeline::new(engine, run_id.clone());
    for chunk in rows.chunks(chunk_size) {
        let out = pipeline.process_chunk(chunk);
        let records: Vec<ExportRow> = out.records.iter().map(ExportRow::from).collect();
        db::save_records(conn, &run_id, &records)?;
        db::save_issues(conn, &run_id, &out.issues)?;
        pb.inc(chunk.len() as u64);
    }
    pb.finish_and_clear();

    let report = pipeline.finish();
    report.persist(conn)?;
    Ok(report)
}

/// Cut a table cell to `max` characters, marking the cut with `...`.
fn truncate(s: &str, max: usize) -> String {
    match s.char_indices().nth(max) {
        Some((cut, _)) => format!("{}...", &s[..cut]),
        None => s.to_string(),
    }
}

fn format_duration(d: std::time::Duration) -> String {
    let secs = d.as_secs();
    match (secs / 3600, (secs % 3600) / 60, secs % 60) {
        (0, 0, _) => format!("{:.1}s", d.as_secs_f64()),
        (0, m, s) => format!("{m}m {s}s"),
        (h, m, s) => format!("{h}h {m}m {s}s"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn truncate_counts_characters() {
        assert_eq!(truncate("Acme", 10), "Acme");
        assert_eq!(truncate("Nordlys Energi", 7), "Nordlys...");
        assert_eq!(truncate("Ærø Fisk", 3), "Ærø...");
    }

    #[test]
    fn durations_pick_largest_unit() {
        assert_eq!(format_duration(Duration::from_millis(2500)), "2.5s");
        assert_eq!(format_duration(Duration::from_secs(125)), "2m 5s");
        assert_eq!(format_duration(Duration::from_secs(3725)), "1h 2m 5s");
    }
}
