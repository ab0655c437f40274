use std::path::Path;

use anyhow::{Context, Result};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection};

use crate::export::ExportRow;
use crate::parser::assemble::SourceRef;
use crate::parser::record::{ExtractedRecord, Field};
use crate::pipeline::{InputRow, Issue};

pub fn connect(path: &Path) -> Result<Connection> {
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir).with_context(|| format!("creating {:?}", dir))?;
    }
    let conn = Connection::open(path).with_context(|| format!("Failed to open {:?}", path))?;
    conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA foreign_keys=ON;")?;
    Ok(conn)
}

fn field_columns() -> String {
    Field::ALL
        .iter()
        .map(|f| format!("{} TEXT NOT NULL DEFAULT ''", f.name()))
        .collect::<Vec<_>>()
        .join(",\n            ")
}

pub fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS ocr_rows (
            id          INTEGER PRIMARY KEY,
            page        INTEGER NOT NULL,
            row_index   INTEGER NOT NULL,
            row_text    TEXT NOT NULL,
            company     TEXT,
            added_date  TEXT,
            website     TEXT,
            imported_at TEXT NOT NULL DEFAULT (datetime('now')),
            UNIQUE(page, row_index)
        );

        CREATE TABLE IF NOT EXISTS row_issues (
            id         INTEGER PRIMARY KEY,
            run_id     TEXT NOT NULL,
            company    TEXT NOT NULL,
            page       INTEGER NOT NULL,
            row_index  INTEGER NOT NULL,
            field      TEXT NOT NULL,
            issue      TEXT NOT NULL,
            detail     TEXT NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_issues_run ON row_issues(run_id);
        CREATE INDEX IF NOT EXISTS idx_issues_issue ON row_issues(issue);

        CREATE TABLE IF NOT EXISTS run_metrics (
            run_id     TEXT NOT NULL,
            metric     TEXT NOT NULL,
            value      REAL NOT NULL,
            created_at TEXT NOT NULL DEFAULT (datetime('now')),
            PRIMARY KEY(run_id, metric)
        );
        ",
    )?;
    conn.execute_batch(&format!(
        "CREATE TABLE IF NOT EXISTS company_records (
            row_id      INTEGER PRIMARY KEY,
            run_id      TEXT NOT NULL,
            source_page INTEGER NOT NULL,
            source_row  INTEGER NOT NULL,
            {},
            qa_pass     BOOLEAN NOT NULL,
            qa_flags    TEXT NOT NULL DEFAULT ''
        );
        CREATE INDEX IF NOT EXISTS idx_records_company ON company_records(company);",
        field_columns()
    ))?;
    Ok(())
}

// ── Input rows ──

pub fn insert_rows(conn: &Connection, rows: &[InputRow]) -> Result<usize> {
    let tx = conn.unchecked_transaction()?;
    let mut count = 0;
    {
        let mut stmt = tx.prepare(
            "INSERT OR IGNORE INTO ocr_rows (page, row_index, row_text, company, added_date, website)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        )?;
        for r in rows {
            count += stmt.execute(params![
                r.page, r.row_index, r.row_text, r.company, r.added_date, r.website,
            ])?;
        }
    }
    tx.commit()?;
    Ok(count)
}

pub fn fetch_rows(conn: &Connection, limit: Option<usize>) -> Result<Vec<InputRow>> {
    let sql = format!(
        "SELECT page, row_index, row_text, company, added_date, website
         FROM ocr_rows
         ORDER BY page, row_index{}",
        match limit {
            Some(n) => format!(" LIMIT {}", n),
            None => String::new(),
        }
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map([], |row| {
            Ok(InputRow {
                page: row.get(0)?,
                row_index: row.get(1)?,
                row_text: row.get(2)?,
                company: row.get(3)?,
                added_date: row.get(4)?,
                website: row.get(5)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

// ── Records ──

/// Records are rebuilt from scratch on every `process` run.
pub fn clear_records(conn: &Connection) -> Result<usize> {
    Ok(conn.execute("DELETE FROM company_records", [])?)
}

pub fn save_records(conn: &Connection, run_id: &str, rows: &[ExportRow]) -> Result<()> {
    let columns = Field::ALL.iter().map(|f| f.name()).collect::<Vec<_>>().join(", ");
    let placeholders = (1..=Field::ALL.len() + 6)
        .map(|i| format!("?{}", i))
        .collect::<Vec<_>>()
        .join(",");
    let sql = format!(
        "INSERT OR REPLACE INTO company_records
         (row_id, run_id, source_page, source_row, {}, qa_pass, qa_flags)
         VALUES ({})",
        columns, placeholders
    );

    let tx = conn.unchecked_transaction()?;
    {
        let mut stmt = tx.prepare(&sql)?;
        for r in rows {
            let mut values = vec![
                Value::Integer(r.row_id),
                Value::Text(run_id.to_string()),
                Value::Integer(r.source.page),
                Value::Integer(r.source.row),
            ];
            values.extend(r.record.iter().map(|(_, v)| Value::Text(v.to_string())));
            values.push(Value::Integer(r.qa_pass as i64));
            values.push(Value::Text(r.qa_flags.clone()));
            stmt.execute(params_from_iter(values.iter()))?;
        }
    }
    tx.commit()?;
    Ok(())
}

pub fn fetch_records(conn: &Connection, passing_only: bool) -> Result<Vec<ExportRow>> {
    let columns = Field::ALL.iter().map(|f| f.name()).collect::<Vec<_>>().join(", ");
    let sql = format!(
        "SELECT row_id, source_page, source_row, {}, qa_pass, qa_flags
         FROM company_records{}
         ORDER BY row_id",
        columns,
        if passing_only { " WHERE qa_pass = 1" } else { "" }
    );
    let n = Field::ALL.len();
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map([], |row| {
            let mut record = ExtractedRecord::default();
            for (i, field) in Field::ALL.iter().enumerate() {
                record.set(*field, row.get::<_, String>(3 + i)?);
            }
            Ok(ExportRow {
                row_id: row.get(0)?,
                source: SourceRef {
                    page: row.get(1)?,
                    row: row.get(2)?,
                },
                record,
                qa_pass: row.get(3 + n)?,
                qa_flags: row.get(4 + n)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

// ── Issues & metrics ──

pub fn save_issues(conn: &Connection, run_id: &str, issues: &[Issue]) -> Result<()> {
    let tx = conn.unchecked_transaction()?;
    {
        let mut stmt = tx.prepare(
            "INSERT INTO row_issues (run_id, company, page, row_index, field, issue, detail)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        )?;
        for i in issues {
            stmt.execute(params![run_id, i.company, i.page, i.row, i.field, i.issue, i.detail])?;
        }
    }
    tx.commit()?;
    Ok(())
}

pub fn save_metrics(conn: &Connection, run_id: &str, metrics: &[(String, f64)]) -> Result<()> {
    let tx = conn.unchecked_transaction()?;
    {
        let mut stmt = tx.prepare(
            "INSERT OR REPLACE INTO run_metrics (run_id, metric, value) VALUES (?1, ?2, ?3)",
        )?;
        for (metric, value) in metrics {
            stmt.execute(params![run_id, metric, value])?;
        }
    }
    tx.commit()?;
    Ok(())
}

// ── Overview ──

pub struct OverviewRow {
    pub row_id: i64,
    pub company: String,
    pub website: String,
    pub headcount: String,
    pub country: String,
    pub last_funding_type: String,
    pub qa_pass: bool,
    pub qa_flags: String,
}

pub fn fetch_overview(conn: &Connection, limit: usize) -> Result<Vec<OverviewRow>> {
    let sql = format!(
        "SELECT row_id, company, website, headcount, country, last_funding_type, qa_pass, qa_flags
         FROM company_records
         ORDER BY row_id
         LIMIT {}",
        limit
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map([], |row| {
            Ok(OverviewRow {
                row_id: row.get(0)?,
                company: row.get(1)?,
                website: row.get(2)?,
                headcount: row.get(3)?,
                country: row.get(4)?,
                last_funding_type: row.get(5)?,
                qa_pass: row.get(6)?,
                qa_flags: row.get(7)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

/// Most frequent issue kinds of the latest run.
pub fn top_issues(conn: &Connection, limit: usize) -> Result<Vec<(String, usize)>> {
    let mut stmt = conn.prepare(
        "SELECT issue, COUNT(*) AS n
         FROM row_issues
         WHERE run_id = (SELECT MAX(run_id) FROM row_issues)
         GROUP BY issue
         ORDER BY n DESC, issue
         LIMIT ?1",
    )?;
    let rows = stmt
        .query_map([limit as i64], |row| Ok((row.get(0)?, row.get::<_, i64>(1)? as usize)))?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

// ── Stats ──

pub struct Stats {
    pub rows: usize,
    pub records: usize,
    pub passing: usize,
    pub failing: usize,
    pub issues: usize,
    pub runs: usize,
}

pub fn get_stats(conn: &Connection) -> Result<Stats> {
    let rows: usize = conn.query_row("SELECT COUNT(*) FROM ocr_rows", [], |r| r.get(0))?;
    let records: usize =
        conn.query_row("SELECT COUNT(*) FROM company_records", [], |r| r.get(0))?;
    let passing: usize = conn.query_row(
        "SELECT COUNT(*) FROM company_records WHERE qa_pass = 1",
        [],
        |r| r.get(0),
    )?;
    let issues: usize = conn.query_row("SELECT COUNT(*) FROM row_issues", [], |r| r.get(0))?;
    let runs: usize =
        conn.query_row("SELECT COUNT(DISTINCT run_id) FROM run_metrics", [], |r| r.get(0))?;
    Ok(Stats {
        rows,
        records,
        passing,
        failing: records - passing,
        issues,
        runs,
    })
}
