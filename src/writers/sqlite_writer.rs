use crate::config::DatabaseConfig;
use crate::error::Result;
use crate::models::group::total_records;
use crate::models::Group;
use crate::writers::{BatchReport, BatchSink};
use rusqlite::{params, Connection, TransactionBehavior};
use std::time::Duration;
use tracing::{debug, info, warn};

const INSERT_IGRA_DATA_SQL: &str = "INSERT INTO igra_data (
    id,
    year,
    month,
    day,
    hour,
    reltime,
    numlev,
    p_src,
    np_src,
    lat,
    lon,
    lvltyp1,
    lvltyp2,
    etime,
    press,
    pflag,
    gph,
    zflag,
    temp,
    tflag,
    rh,
    dpdp,
    wdir,
    wspd
)
VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18, ?19, ?20, ?21, ?22, ?23, ?24)";

/// Open a connection configured for concurrent bulk loading.
pub fn open_connection(config: &DatabaseConfig) -> Result<Connection> {
    let conn = Connection::open(&config.path)?;
    conn.busy_timeout(Duration::from_secs(config.busy_timeout_secs))?;

    if config.bulk_pragmas {
        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA synchronous=NORMAL;")?;
    }

    debug!(path = %config.path, "Opened database connection");
    Ok(conn)
}

/// Persists groups into `igra_data`, one transaction per batch.
///
/// The writer owns its connection; dropping it closes the connection.
pub struct SqliteWriter {
    conn: Connection,
}

impl SqliteWriter {
    pub fn open(config: &DatabaseConfig) -> Result<Self> {
        Ok(Self {
            conn: open_connection(config)?,
        })
    }

    pub fn from_connection(conn: Connection) -> Self {
        Self { conn }
    }

    #[cfg(test)]
    pub fn connection(&self) -> &Connection {
        &self.conn
    }
}

impl BatchSink for SqliteWriter {
    fn save_batch(&mut self, groups: &[Group]) -> Result<BatchReport> {
        let rows = total_records(groups);
        info!(rows, "Saving batch data");

        // Acquire the write lock before the first insert.
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        let mut skipped = 0;

        {
            let mut stmt = tx.prepare_cached(INSERT_IGRA_DATA_SQL)?;

            for group in groups {
                let Some(header) = &group.header else {
                    if !group.records.is_empty() {
                        warn!(
                            rows = group.records.len(),
                            "Unable to save rows without a decoded header"
                        );
                    }
                    skipped += group.records.len();
                    continue;
                };

                for record in &group.records {
                    let inserted = stmt.execute(params![
                        header.id,
                        header.year,
                        header.month,
                        header.day,
                        header.hour,
                        header.reltime,
                        header.numlev,
                        header.p_src,
                        header.np_src,
                        header.lat,
                        header.lon,
                        record.lvltyp1,
                        record.lvltyp2,
                        record.etime,
                        record.press,
                        record.pflag,
                        record.gph,
                        record.zflag,
                        record.temp,
                        record.tflag,
                        record.rh,
                        record.dpdp,
                        record.wdir,
                        record.wspd,
                    ]);

                    if let Err(e) = inserted {
                        // SQLite rolled back the whole transaction; later
                        // inserts would autocommit one by one.
                        if tx.is_autocommit() {
                            return Err(e.into());
                        }
                        warn!(station = %header.id, error = %e, ?record, "Unable to save data in database");
                        skipped += 1;
                    }
                }
            }
        }

        tx.commit()?;

        if skipped > 0 {
            warn!(rows, skipped, "Batch committed with skipped rows");
        }

        Ok(BatchReport { rows, skipped })
    }
}
