//! SQLite persistence layer.
//!
//! RULE: Only store.rs talks to the database.
//! Pipeline stages call store methods — they never execute SQL directly.
//! Every query is parameterized; no string-interpolated SQL.

use crate::{
    error::PipeResult,
    metrics::MetricsRow,
    scorer::PredictionRow,
    snapshot::{SnapshotMonth, SnapshotRow},
    types::ModelKind,
};
use rusqlite::{params, Connection};

pub struct ChurnStore {
    conn: Connection,
}

impl ChurnStore {
    pub fn open(path: &str) -> PipeResult<Self> {
        let conn = Connection::open_with_flags(
            path,
            rusqlite::OpenFlags::SQLITE_OPEN_READ_WRITE
                | rusqlite::OpenFlags::SQLITE_OPEN_CREATE
                | rusqlite::OpenFlags::SQLITE_OPEN_URI,
        )?;
        // WAL mode only for real files (shared-memory and :memory: ignore it).
        let _ = conn.execute_batch("PRAGMA journal_mode=WAL;");
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        Ok(Self { conn })
    }

    /// Open an in-memory database (used in tests).
    pub fn in_memory() -> PipeResult<Self> {
        let conn = Connection::open(":memory:")?;
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        Ok(Self { conn })
    }

    /// Apply all schema migrations in order.
    pub fn migrate(&self) -> PipeResult<()> {
        self.conn
            .execute_batch(include_str!("../../migrations/001_snapshots.sql"))?;
        self.conn
            .execute_batch(include_str!("../../migrations/002_predictions.sql"))?;
        self.conn
            .execute_batch(include_str!("../../migrations/003_metrics.sql"))?;
        Ok(())
    }

    // ── Snapshots ──────────────────────────────────────────────

    pub fn insert_snapshot_rows(&self, rows: &[SnapshotRow]) -> PipeResult<()> {
        let mut stmt = self.conn.prepare(
            "INSERT INTO customer_monthly_snapshot (
                customer_id, snapshot_month, tenure,
                monthly_charges, total_charges, payment_method, churn
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        )?;
        for row in rows {
            stmt.execute(params![
                row.customer_id,
                row.snapshot_month.as_sql(),
                row.tenure as i64,
                row.monthly_charges,
                row.total_charges,
                row.payment_method,
                row.churn,
            ])?;
        }
        Ok(())
    }

    pub fn snapshot_for_month(&self, month: SnapshotMonth) -> PipeResult<Vec<SnapshotRow>> {
        let mut stmt = self.conn.prepare(
            "SELECT customer_id, snapshot_month, tenure,
                    monthly_charges, total_charges, payment_method, churn
             FROM customer_monthly_snapshot
             WHERE snapshot_month = ?1
             ORDER BY customer_id ASC",
        )?;
        let rows = stmt
            .query_map(params![month.as_sql()], |row| {
                Ok(SnapshotRow {
                    customer_id: row.get(0)?,
                    snapshot_month: month_from_sql(row.get::<_, String>(1)?),
                    tenure: row.get::<_, i64>(2)? as u32,
                    monthly_charges: row.get(3)?,
                    total_charges: row.get(4)?,
                    payment_method: row.get(5)?,
                    churn: row.get(6)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    pub fn latest_snapshot_month(&self) -> PipeResult<Option<SnapshotMonth>> {
        let max: Option<String> = self.conn.query_row(
            "SELECT MAX(snapshot_month) FROM customer_monthly_snapshot",
            [],
            |row| row.get(0),
        )?;
        Ok(max.map(month_from_sql))
    }

    pub fn snapshot_count(&self, month: SnapshotMonth) -> PipeResult<i64> {
        self.conn
            .query_row(
                "SELECT COUNT(*) FROM customer_monthly_snapshot WHERE snapshot_month = ?1",
                params![month.as_sql()],
                |row| row.get(0),
            )
            .map_err(Into::into)
    }

    // ── Predictions ────────────────────────────────────────────

    /// Single batch write for a scoring run — both models' rows together.
    pub fn append_predictions(&self, rows: &[PredictionRow]) -> PipeResult<()> {
        let mut stmt = self.conn.prepare(
            "INSERT INTO monthly_churn_predictions (
                customer_id, snapshot_month, model_name,
                churn_probability, retention_priority_score
             ) VALUES (?1, ?2, ?3, ?4, ?5)",
        )?;
        for row in rows {
            stmt.execute(params![
                row.customer_id,
                row.snapshot_month.as_sql(),
                row.model_name,
                row.churn_probability,
                row.retention_priority_score,
            ])?;
        }
        Ok(())
    }

    pub fn predictions_for(
        &self,
        month: SnapshotMonth,
        model: ModelKind,
    ) -> PipeResult<Vec<PredictionRow>> {
        let mut stmt = self.conn.prepare(
            "SELECT customer_id, snapshot_month, model_name,
                    churn_probability, retention_priority_score
             FROM monthly_churn_predictions
             WHERE snapshot_month = ?1 AND model_name = ?2
             ORDER BY customer_id ASC",
        )?;
        let rows = stmt
            .query_map(params![month.as_sql(), model.name()], |row| {
                Ok(PredictionRow {
                    customer_id: row.get(0)?,
                    snapshot_month: month_from_sql(row.get::<_, String>(1)?),
                    model_name: row.get(2)?,
                    churn_probability: row.get(3)?,
                    retention_priority_score: row.get(4)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    pub fn prediction_count(&self, month: SnapshotMonth, model: ModelKind) -> PipeResult<i64> {
        self.conn
            .query_row(
                "SELECT COUNT(*) FROM monthly_churn_predictions
                 WHERE snapshot_month = ?1 AND model_name = ?2",
                params![month.as_sql(), model.name()],
                |row| row.get(0),
            )
            .map_err(Into::into)
    }

    // ── Metrics ────────────────────────────────────────────────

    pub fn append_metrics(&self, row: &MetricsRow) -> PipeResult<()> {
        self.conn.execute(
            "INSERT INTO model_snapshot_metrics (
                snapshot_month, model_name, avg_churn_probability,
                high_risk_pct, revenue_at_risk, rank_stability
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                row.snapshot_month.as_sql(),
                row.model_name,
                row.avg_churn_probability,
                row.high_risk_pct,
                row.revenue_at_risk,
                row.rank_stability,
            ],
        )?;
        Ok(())
    }

    pub fn metrics_for_month(&self, month: SnapshotMonth) -> PipeResult<Vec<MetricsRow>> {
        let mut stmt = self.conn.prepare(
            "SELECT snapshot_month, model_name, avg_churn_probability,
                    high_risk_pct, revenue_at_risk, rank_stability
             FROM model_snapshot_metrics
             WHERE snapshot_month = ?1
             ORDER BY model_name ASC",
        )?;
        let rows = stmt
            .query_map(params![month.as_sql()], |row| {
                Ok(MetricsRow {
                    snapshot_month: month_from_sql(row.get::<_, String>(0)?),
                    model_name: row.get(1)?,
                    avg_churn_probability: row.get(2)?,
                    high_risk_pct: row.get(3)?,
                    revenue_at_risk: row.get(4)?,
                    rank_stability: row.get(5)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    pub fn metrics_count(&self) -> PipeResult<i64> {
        self.conn
            .query_row("SELECT COUNT(*) FROM model_snapshot_metrics", [], |row| {
                row.get(0)
            })
            .map_err(Into::into)
    }
}

/// The snapshot_month column is written by `SnapshotMonth::as_sql` and is
/// always a valid day-1 ISO date; a malformed value means the database was
/// edited outside this crate.
fn month_from_sql(s: String) -> SnapshotMonth {
    SnapshotMonth::parse(&s).unwrap_or_else(|| {
        log::warn!("Malformed snapshot_month '{s}' in database; defaulting to 1970-01");
        SnapshotMonth::from_date(chrono::NaiveDate::default())
    })
}
