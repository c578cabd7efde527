//! The persisted store the clustering driver reads from and writes to: a
//! single SQLite database holding the `alignment` table (populated by the
//! external ingest phase) and the `clustering` table (populated by this
//! driver).

use std::ops::ControlFlow;
use std::path::Path;

use rusqlite::{params, Connection, Row};

use crate::err::AppError;

/// Abnormality bitmask set by the ingest phase on `alignment.type`.
pub mod abnormal {
    pub const DISTANCE: i64 = 1;
    pub const CHROMOSOME: i64 = 2;
    pub const SUPPLEMENTARY: i64 = 4;
    pub const EXONIC: i64 = 8;

    /// Reference distance cutoff the ingest phase uses to set [`DISTANCE`].
    /// Not used by the clustering core itself; kept here for cross-tool
    /// documentation purposes only.
    pub const DISTANCE_CUTOFF: i64 = 10000;
}

const SCHEMA_SQL: &str = "
CREATE TABLE IF NOT EXISTS alignment (
    id   INTEGER PRIMARY KEY,
    qname TEXT NOT NULL,
    chr  TEXT NOT NULL,
    pos  INTEGER NOT NULL,
    rlen INTEGER NOT NULL,
    type INTEGER NOT NULL
);
CREATE INDEX IF NOT EXISTS alignment_qname_idx ON alignment (qname);
CREATE INDEX IF NOT EXISTS alignment_chr_idx ON alignment (chr);

CREATE TABLE IF NOT EXISTS clustering (
    cluster_id   INTEGER NOT NULL,
    alignment_id INTEGER NOT NULL,
    label        INTEGER NOT NULL,
    neighbors    INTEGER NOT NULL,
    UNIQUE(cluster_id, alignment_id)
);
";

/// Query joining alignments to any exonic-overlapping mate, ordered so the
/// driver can batch one `DBSCAN` instance per chromosome.
const QUERY_SQL: &str = "
SELECT a1.id, a1.chr, a1.pos, a1.pos + a1.rlen - 1
FROM alignment AS a1
INNER JOIN alignment AS a2
    USING (qname)
WHERE a1.id != a2.id
    AND a2.type & ?1
ORDER BY a1.chr ASC;
";

const INSERT_CLUSTERING_SQL: &str =
    "INSERT INTO clustering (cluster_id, alignment_id, label, neighbors) VALUES (?1, ?2, ?3, ?4);";

/// One row yielded by the abnormal-alignment cursor.
pub struct AlignmentRow {
    pub id: i64,
    pub chr: String,
    pub low: i64,
    pub high: i64,
}

impl AlignmentRow {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            chr: row.get(1)?,
            low: row.get(2)?,
            high: row.get(3)?,
        })
    }
}

/// A connection to the alignment/clustering store.
pub struct Store {
    conn: Connection,
}

impl Store {
    /// Open (creating if absent) the database at `path` and ensure the
    /// `alignment`/`clustering` tables and their indexes exist.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, AppError> {
        let conn = Connection::open(path)?;
        conn.execute_batch(SCHEMA_SQL)?;
        Ok(Self { conn })
    }

    /// Open an in-memory store. Used by tests.
    #[cfg(test)]
    pub fn open_in_memory() -> Result<Self, AppError> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(SCHEMA_SQL)?;
        Ok(Self { conn })
    }

    pub fn insert_alignment(
        &self,
        id: i64,
        qname: &str,
        chr: &str,
        pos: i64,
        rlen: i64,
        type_: i64,
    ) -> Result<(), AppError> {
        self.conn.execute(
            "INSERT INTO alignment (id, qname, chr, pos, rlen, type) VALUES (?1, ?2, ?3, ?4, ?5, ?6);",
            params![id, qname, chr, pos, rlen, type_],
        )?;
        Ok(())
    }

    /// Stream abnormal alignment rows (those with an exonic-overlapping
    /// mate), ordered by chromosome, invoking `row_fn` once per row.
    ///
    /// `row_fn` returns `ControlFlow::Break(())` to stop the cursor early
    /// (e.g. on a caller-side cancellation request); this is not an error,
    /// and rows already seen are left exactly as `row_fn` processed them.
    ///
    /// Modeled as an internal-iteration cursor (rather than returning a
    /// `rusqlite::Rows`) so the lifetime of the prepared statement never has
    /// to outlive this call.
    pub fn for_each_abnormal_alignment(
        &self,
        mut row_fn: impl FnMut(AlignmentRow) -> Result<ControlFlow<()>, AppError>,
    ) -> Result<(), AppError> {
        let mut stmt = self.conn.prepare(QUERY_SQL)?;
        let mut rows = stmt.query(params![abnormal::EXONIC])?;
        while let Some(row) = rows.next()? {
            if row_fn(AlignmentRow::from_row(row)?)?.is_break() {
                break;
            }
        }
        Ok(())
    }

    /// Insert one `clustering` row.
    pub fn insert_clustering(
        &self,
        cluster_id: i64,
        alignment_id: i64,
        label: i32,
        neighbors: i32,
    ) -> Result<(), AppError> {
        self.conn.execute(
            INSERT_CLUSTERING_SQL,
            params![cluster_id, alignment_id, label, neighbors],
        )?;
        Ok(())
    }

    /// Number of rows currently in `clustering`. Used by tests.
    #[cfg(test)]
    pub fn clustering_row_count(&self) -> Result<i64, AppError> {
        Ok(self
            .conn
            .query_row("SELECT COUNT(*) FROM clustering", [], |row| row.get(0))?)
    }
}
