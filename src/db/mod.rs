//! SQLite persistence for scenario bounds and result bands.
//!
//! One row per variable:
//! - `minimum` / `maximum`: user-entered input bounds
//! - `returnmin` / `returnmax`: the last computed result band
//!
//! Decimals are stored as text so no precision is lost on the way through.

use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use chrono::{DateTime, Local};
use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::{sqlite::SqlitePoolOptions, SqlitePool};
use tracing::{debug, info, warn};

use crate::scenario::{Band, BoundColumn, ScenarioBounds, ScenarioResults, Variable};

const TABLE: &str = "scenario_bounds";

/// Variable names used before the opening/closing rename.
const LEGACY_NAMES: [(&str, Variable); 2] = [
    ("sellvariable", Variable::OpeningValue),
    ("buyvariable", Variable::ClosingValue),
];

/// Database connection pool for the bounds table.
pub struct Database {
    pool: SqlitePool,
}

/// Raw row as stored.
#[derive(Debug, Clone, sqlx::FromRow)]
struct StoredRow {
    variable: String,
    maximum: String,
    minimum: String,
    returnmin: String,
    returnmax: String,
}

/// One parsed row of the bounds table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BoundsRow {
    pub variable: String,
    pub maximum: Decimal,
    pub minimum: Decimal,
    pub returnmin: Decimal,
    pub returnmax: Decimal,
}

impl TryFrom<StoredRow> for BoundsRow {
    type Error = anyhow::Error;

    fn try_from(row: StoredRow) -> Result<Self> {
        let parse = |column: &str, raw: &str| {
            parse_decimal(raw).with_context(|| {
                format!("Invalid {} value {:?} for {}", column, raw, row.variable)
            })
        };
        Ok(Self {
            maximum: parse("maximum", &row.maximum)?,
            minimum: parse("minimum", &row.minimum)?,
            returnmin: parse("returnmin", &row.returnmin)?,
            returnmax: parse("returnmax", &row.returnmax)?,
            variable: row.variable,
        })
    }
}

/// Parse a stored decimal, accepting scientific notation written by other tools.
fn parse_decimal(raw: &str) -> Result<Decimal> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(Decimal::ZERO);
    }
    Decimal::from_str(raw)
        .or_else(|_| Decimal::from_scientific(raw))
        .map_err(Into::into)
}

impl Database {
    /// Create a new database connection.
    pub async fn new(database_url: &str) -> Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect(database_url)
            .await
            .context("Failed to connect to database")?;

        let db = Self { pool };
        db.run_migrations().await?;

        Ok(db)
    }

    /// Private in-memory database. A single long-lived connection keeps it alive.
    pub async fn in_memory() -> Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None::<Duration>)
            .max_lifetime(None::<Duration>)
            .connect("sqlite::memory:")
            .await
            .context("Failed to open in-memory database")?;

        let db = Self { pool };
        db.run_migrations().await?;

        Ok(db)
    }

    /// Create the table, then seed or migrate it.
    async fn run_migrations(&self) -> Result<()> {
        sqlx::query(&format!(
            r#"
            CREATE TABLE IF NOT EXISTS {TABLE} (
                variable TEXT PRIMARY KEY,
                maximum TEXT NOT NULL DEFAULT '0',
                minimum TEXT NOT NULL DEFAULT '0',
                returnmin TEXT NOT NULL DEFAULT '0',
                returnmax TEXT NOT NULL DEFAULT '0'
            )
            "#
        ))
        .execute(&self.pool)
        .await?;

        let (count,): (i64,) = sqlx::query_as(&format!("SELECT COUNT(*) FROM {TABLE}"))
            .fetch_one(&self.pool)
            .await?;

        if count == 0 {
            self.seed().await?;
        } else {
            self.migrate_legacy_names().await?;
        }

        Ok(())
    }

    /// Insert every variable with zero bounds and results.
    async fn seed(&self) -> Result<()> {
        for variable in Variable::ALL {
            sqlx::query(&format!(
                "INSERT INTO {TABLE} (variable, minimum, maximum, returnmin, returnmax) VALUES (?, '0', '0', '0', '0')"
            ))
            .bind(variable.as_str())
            .execute(&self.pool)
            .await?;
            debug!(variable = %variable, "Seeded variable with zeros");
        }
        info!("Initialized empty bounds table");
        Ok(())
    }

    /// Rename legacy variable rows when the new name is absent.
    async fn migrate_legacy_names(&self) -> Result<()> {
        let names: Vec<(String,)> = sqlx::query_as(&format!("SELECT variable FROM {TABLE}"))
            .fetch_all(&self.pool)
            .await?;
        let has = |name: &str| names.iter().any(|(n,)| n == name);

        for (legacy, current) in LEGACY_NAMES {
            if has(legacy) && !has(current.as_str()) {
                sqlx::query(&format!("UPDATE {TABLE} SET variable = ? WHERE variable = ?"))
                    .bind(current.as_str())
                    .bind(legacy)
                    .execute(&self.pool)
                    .await?;
                info!(from = legacy, to = %current, "Migrated legacy variable name");
            }
        }
        Ok(())
    }

    // ==================== Reads ====================

    /// All rows, in canonical variable order. Unknown variables sort last.
    pub async fn rows(&self) -> Result<Vec<BoundsRow>> {
        let stored = sqlx::query_as::<_, StoredRow>(&format!(
            r#"
            SELECT variable,
                   CAST(maximum AS TEXT) AS maximum,
                   CAST(minimum AS TEXT) AS minimum,
                   CAST(returnmin AS TEXT) AS returnmin,
                   CAST(returnmax AS TEXT) AS returnmax
            FROM {TABLE}
            "#
        ))
        .fetch_all(&self.pool)
        .await
        .context("Failed to fetch bounds")?;

        let mut rows = stored
            .into_iter()
            .map(BoundsRow::try_from)
            .collect::<Result<Vec<_>>>()?;

        let rank = |name: &str| {
            Variable::ALL
                .iter()
                .position(|v| v.as_str() == name)
                .unwrap_or(Variable::ALL.len())
        };
        rows.sort_by_key(|r| rank(&r.variable));

        Ok(rows)
    }

    /// Current input bounds. Missing variables read as zero.
    pub async fn load_bounds(&self) -> Result<ScenarioBounds> {
        let mut bounds = ScenarioBounds::default();

        for row in self.rows().await? {
            match row.variable.parse::<Variable>() {
                Ok(variable) => {
                    *bounds.get_mut(variable) = Band::new(row.minimum, row.maximum);
                    debug!(variable = %variable, min = %row.minimum, max = %row.maximum, "Loaded bounds");
                }
                Err(_) => warn!(variable = %row.variable, "Ignoring unknown variable row"),
            }
        }

        Ok(bounds)
    }

    // ==================== Writes ====================

    /// Set one input bound.
    pub async fn update_bound(
        &self,
        variable: Variable,
        column: BoundColumn,
        value: Decimal,
    ) -> Result<()> {
        let result = sqlx::query(&format!(
            "UPDATE {TABLE} SET {} = ? WHERE variable = ?",
            column.as_str()
        ))
        .bind(value.to_string())
        .bind(variable.as_str())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            bail!("No rows updated for variable: {}", variable);
        }

        info!(variable = %variable, column = %column, value = %value, "Updated bound");
        Ok(())
    }

    /// Store the result band for one variable.
    pub async fn store_band(&self, variable: Variable, band: Band) -> Result<()> {
        let result = sqlx::query(&format!(
            "UPDATE {TABLE} SET returnmin = ?, returnmax = ? WHERE variable = ?"
        ))
        .bind(band.min.to_string())
        .bind(band.max.to_string())
        .bind(variable.as_str())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            bail!("No result row for variable: {}", variable);
        }

        info!(variable = %variable, band = %band, "Stored result band");
        Ok(())
    }

    /// Store every result band in one transaction.
    pub async fn store_results(&self, results: &ScenarioResults) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        for (variable, band) in results.iter() {
            sqlx::query(&format!(
                "UPDATE {TABLE} SET returnmin = ?, returnmax = ? WHERE variable = ?"
            ))
            .bind(band.min.to_string())
            .bind(band.max.to_string())
            .bind(variable.as_str())
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await.context("Failed to store results")?;
        info!("Stored scenario results");
        Ok(())
    }

    /// Zero the input bounds, keeping results. Returns rows affected.
    pub async fn reset_inputs(&self) -> Result<u64> {
        let result = sqlx::query(&format!("UPDATE {TABLE} SET minimum = '0', maximum = '0'"))
            .execute(&self.pool)
            .await?;
        info!(rows = result.rows_affected(), "Reset input bounds to zero");
        Ok(result.rows_affected())
    }

    /// Zero every column. Returns rows affected.
    pub async fn reset_all(&self) -> Result<u64> {
        let result = sqlx::query(&format!(
            "UPDATE {TABLE} SET minimum = '0', maximum = '0', returnmin = '0', returnmax = '0'"
        ))
        .execute(&self.pool)
        .await?;
        info!(rows = result.rows_affected(), "Reset all values to zero");
        Ok(result.rows_affected())
    }

    // ==================== Export ====================

    /// Write the table as a standalone SQL script.
    pub async fn export_sql(&self, path: &Path) -> Result<()> {
        let rows = self.rows().await?;
        let script = render_sql_dump(&rows, Local::now());

        std::fs::write(path, script)
            .with_context(|| format!("Failed to write export to {}", path.display()))?;

        info!(path = %path.display(), rows = rows.len(), "Exported database");
        Ok(())
    }

    /// Get the connection pool (for advanced queries).
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

/// Render rows as `DROP`/`CREATE`/`INSERT` statements.
pub fn render_sql_dump(rows: &[BoundsRow], generated_at: DateTime<Local>) -> String {
    let mut out = String::new();

    // Writing to a String cannot fail.
    let _ = writeln!(out, "-- {TABLE} export");
    let _ = writeln!(out, "-- Generated on: {}", generated_at.format("%Y-%m-%d %H:%M:%S %z"));
    let _ = writeln!(out);
    let _ = writeln!(out, "DROP TABLE IF EXISTS {TABLE};");
    let _ = writeln!(out);
    let _ = writeln!(out, "CREATE TABLE {TABLE} (");
    let _ = writeln!(out, "    variable TEXT PRIMARY KEY,");
    let _ = writeln!(out, "    maximum TEXT NOT NULL DEFAULT '0',");
    let _ = writeln!(out, "    minimum TEXT NOT NULL DEFAULT '0',");
    let _ = writeln!(out, "    returnmin TEXT NOT NULL DEFAULT '0',");
    let _ = writeln!(out, "    returnmax TEXT NOT NULL DEFAULT '0'");
    let _ = writeln!(out, ");");
    let _ = writeln!(out);
    let _ = writeln!(out, "-- Insert data");
    for row in rows {
        let _ = writeln!(
            out,
            "INSERT INTO {TABLE} (variable, maximum, minimum, returnmin, returnmax) VALUES ('{}', '{}', '{}', '{}', '{}');",
            row.variable.replace('\'', "''"),
            row.maximum,
            row.minimum,
            row.returnmin,
            row.returnmax,
        );
    }
    let _ = writeln!(out);
    let _ = writeln!(out, "-- End of export");

    out
}

/// File path behind a `sqlite:` URL, or `None` for in-memory databases.
pub fn sqlite_path(database_url: &str) -> Option<PathBuf> {
    let rest = database_url
        .strip_prefix("sqlite://")
        .or_else(|| database_url.strip_prefix("sqlite:"))
        .unwrap_or(database_url);
    let path = rest.split('?').next().unwrap_or_default();

    if path.is_empty() || path == ":memory:" {
        None
    } else {
        Some(PathBuf::from(path))
    }
}

/// Delete any of `paths` that exist.
pub fn remove_files(paths: &[&Path]) -> Result<()> {
    for path in paths {
        if path.exists() {
            std::fs::remove_file(path)
                .with_context(|| format!("Failed to delete {}", path.display()))?;
            info!(path = %path.display(), "Deleted file");
        }
    }
    Ok(())
}
