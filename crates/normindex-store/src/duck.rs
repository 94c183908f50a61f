//! DuckDB storage for citable text units and their embeddings.

use std::fmt::Write as _;
use std::path::Path;

use duckdb::{Connection, Row, params};
use normindex_core::TextUnit;
use tracing::info;

use crate::{StoreError, TextFilter};

/// DuckDB store for citable legal text units.
///
/// One row per citation `(code, section, sub_section)`, the primary key,
/// with the unit text, a SHA-256 content hash for change detection, and a
/// fixed-dimension `FLOAT[n]` embedding. Re-importing a citation replaces
/// text, hash, and vector in place via `ON CONFLICT`, so concurrent
/// imports of the same citation resolve to last writer wins.
///
/// The embedding dimension is a deployment constant fixed at open time and
/// must match the embedding generator exactly; reopening an existing
/// database with a different dimension is a configuration error.
///
/// Supports both in-memory (ephemeral) and persistent (file-backed) modes.
pub struct TextStore {
    conn: Connection,
    dim: usize,
}

impl TextStore {
    /// Open an in-memory store with the given embedding dimension.
    pub fn open_in_memory(dim: usize) -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()?;
        Self::init(conn, dim)
    }

    /// Open or create a persistent store at the given path.
    pub fn open(path: &Path, dim: usize) -> Result<Self, StoreError> {
        let conn = Connection::open(path)?;
        let store = Self::init(conn, dim)?;
        info!(dim, path = %path.display(), "opened legal text store");
        Ok(store)
    }

    fn init(conn: Connection, dim: usize) -> Result<Self, StoreError> {
        conn.execute_batch(&format!(
            "CREATE TABLE IF NOT EXISTS legal_texts (
                code VARCHAR NOT NULL,
                section VARCHAR NOT NULL,
                sub_section VARCHAR NOT NULL,
                text VARCHAR NOT NULL,
                text_hash VARCHAR NOT NULL,
                embedding FLOAT[{dim}] NOT NULL,
                PRIMARY KEY (code, section, sub_section)
            )"
        ))?;
        Ok(Self { conn, dim })
    }

    /// Embedding dimensionality this store was opened with.
    pub fn dimension(&self) -> usize {
        self.dim
    }

    /// Insert or replace a batch of units with their embeddings.
    ///
    /// Rows whose citation already exists have text, hash, and vector
    /// replaced in place. The whole batch commits atomically: a failure
    /// rolls everything back. Empty input is a no-op. Returns the number
    /// of rows written.
    pub fn upsert_batch(&self, rows: &[(TextUnit, Vec<f32>)]) -> Result<usize, StoreError> {
        if rows.is_empty() {
            return Ok(0);
        }
        for (_, embedding) in rows {
            self.check_dim(embedding)?;
        }

        self.conn.execute_batch("BEGIN")?;
        let result = self.upsert_rows(rows);
        match result {
            Ok(written) => {
                self.conn.execute_batch("COMMIT")?;
                Ok(written)
            }
            Err(err) => {
                let _ = self.conn.execute_batch("ROLLBACK");
                Err(err)
            }
        }
    }

    fn upsert_rows(&self, rows: &[(TextUnit, Vec<f32>)]) -> Result<usize, StoreError> {
        let mut stmt = self.conn.prepare(&format!(
            "INSERT INTO legal_texts (code, section, sub_section, text, text_hash, embedding)
             VALUES (?, ?, ?, ?, ?, ?::FLOAT[]::FLOAT[{dim}])
             ON CONFLICT (code, section, sub_section)
             DO UPDATE SET text = excluded.text,
                           text_hash = excluded.text_hash,
                           embedding = excluded.embedding",
            dim = self.dim
        ))?;
        for (unit, embedding) in rows {
            stmt.execute(params![
                unit.code,
                unit.section,
                unit.sub_section,
                unit.text,
                content_hash(&unit.text),
                vector_literal(embedding),
            ])?;
        }
        Ok(rows.len())
    }

    /// Exact-citation lookup, ordered by `(section, sub_section)` string
    /// ascending. No match is an empty vec, never an error.
    pub fn lookup(&self, filter: &TextFilter) -> Result<Vec<TextUnit>, StoreError> {
        filter.validate()?;

        let mut sql =
            String::from("SELECT code, section, sub_section, text FROM legal_texts");
        let mut conditions: Vec<&str> = Vec::new();
        let mut values: Vec<String> = Vec::new();
        if let Some(code) = &filter.code {
            conditions.push("code = ?");
            values.push(code.clone());
        }
        if let Some(section) = &filter.section {
            conditions.push("section = ?");
            values.push(section.clone());
        }
        if let Some(sub_section) = &filter.sub_section {
            conditions.push("sub_section = ?");
            values.push(sub_section.clone());
        }
        if !conditions.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&conditions.join(" AND "));
        }
        sql.push_str(" ORDER BY section, sub_section");

        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(duckdb::params_from_iter(values), unit_from_row)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    /// Distinct codes present in the store, ascending.
    pub fn codes(&self) -> Result<Vec<String>, StoreError> {
        let mut stmt = self
            .conn
            .prepare("SELECT DISTINCT code FROM legal_texts ORDER BY code")?;
        let rows = stmt.query_map([], |row| row.get(0))?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    /// Number of stored units for one code.
    pub fn count_for_code(&self, code: &str) -> Result<usize, StoreError> {
        let count: i64 = self.conn.query_row(
            "SELECT count(*) FROM legal_texts WHERE code = ?",
            params![code],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }

    /// Cosine-distance nearest neighbours of `query` within one code.
    ///
    /// Returns up to `limit` rows ordered by ascending distance (0 =
    /// identical direction, 2 = opposite), dropping rows whose distance
    /// exceeds `cutoff` when one is given. An empty result is a valid
    /// outcome, not an error.
    pub fn semantic_search(
        &self,
        query: &[f32],
        code: &str,
        limit: usize,
        cutoff: Option<f32>,
    ) -> Result<Vec<(TextUnit, f32)>, StoreError> {
        self.check_dim(query)?;

        let ranked = format!(
            "SELECT code, section, sub_section, text,
                    array_cosine_distance(embedding, ?::FLOAT[]::FLOAT[{dim}]) AS distance
             FROM legal_texts WHERE code = ?",
            dim = self.dim
        );
        let sql = match cutoff {
            Some(_) => format!(
                "SELECT * FROM ({ranked}) WHERE distance <= ? ORDER BY distance LIMIT {limit}"
            ),
            None => format!("SELECT * FROM ({ranked}) ORDER BY distance LIMIT {limit}"),
        };

        let vector = vector_literal(query);
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = match cutoff {
            Some(cutoff) => stmt.query_map(params![vector, code, cutoff], hit_from_row)?,
            None => stmt.query_map(params![vector, code], hit_from_row)?,
        };
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    fn check_dim(&self, vector: &[f32]) -> Result<(), StoreError> {
        if vector.len() != self.dim {
            return Err(StoreError::Dimension {
                expected: self.dim,
                got: vector.len(),
            });
        }
        Ok(())
    }
}

fn unit_from_row(row: &Row<'_>) -> duckdb::Result<TextUnit> {
    Ok(TextUnit {
        code: row.get(0)?,
        section: row.get(1)?,
        sub_section: row.get(2)?,
        text: row.get(3)?,
    })
}

fn hit_from_row(row: &Row<'_>) -> duckdb::Result<(TextUnit, f32)> {
    Ok((unit_from_row(row)?, row.get(4)?))
}

/// Render a vector as a DuckDB list literal for the `::FLOAT[]` cast.
fn vector_literal(vector: &[f32]) -> String {
    let mut out = String::with_capacity(vector.len() * 8 + 2);
    out.push('[');
    for (i, value) in vector.iter().enumerate() {
        if i > 0 {
            out.push_str(", ");
        }
        let _ = write!(out, "{value}");
    }
    out.push(']');
    out
}

/// SHA-256 of the unit text, hex-encoded, for change detection on re-import.
fn content_hash(text: &str) -> String {
    let digest = ring::digest::digest(&ring::digest::SHA256, text.as_bytes());
    let mut out = String::with_capacity(64);
    for byte in digest.as_ref() {
        let _ = write!(out, "{byte:02x}");
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    const DIM: usize = 4;

    fn store() -> TextStore {
        TextStore::open_in_memory(DIM).unwrap()
    }

    fn unit(code: &str, section: &str, sub_section: &str, text: &str) -> TextUnit {
        TextUnit {
            text: text.into(),
            code: code.into(),
            section: section.into(),
            sub_section: sub_section.into(),
        }
    }

    fn axis(i: usize) -> Vec<f32> {
        let mut v = vec![0.0; DIM];
        v[i] = 1.0;
        v
    }

    impl TextStore {
        fn stored_hash(&self, code: &str, section: &str, sub_section: &str) -> String {
            self.conn
                .query_row(
                    "SELECT text_hash FROM legal_texts
                     WHERE code = ? AND section = ? AND sub_section = ?",
                    params![code, section, sub_section],
                    |row| row.get(0),
                )
                .unwrap()
        }
    }

    #[test]
    fn empty_batch_is_a_noop() {
        let store = store();
        assert_eq!(store.upsert_batch(&[]).unwrap(), 0);
        assert!(store.codes().unwrap().is_empty());
    }

    #[test]
    fn insert_then_lookup_ordered() {
        let store = store();
        store
            .upsert_batch(&[
                (unit("bgb", "§ 2", "", "zwei"), axis(0)),
                (unit("bgb", "§ 1", "2", "(2) eins zwei"), axis(1)),
                (unit("bgb", "§ 1", "1", "(1) eins eins"), axis(2)),
            ])
            .unwrap();

        let all = store.lookup(&TextFilter::for_code("bgb")).unwrap();
        let keys: Vec<(&str, &str)> = all
            .iter()
            .map(|u| (u.section.as_str(), u.sub_section.as_str()))
            .collect();
        assert_eq!(keys, vec![("§ 1", "1"), ("§ 1", "2"), ("§ 2", "")]);
    }

    #[test]
    fn lookup_filters_by_section_and_sub_section() {
        let store = store();
        store
            .upsert_batch(&[
                (unit("bgb", "§ 1", "1", "a"), axis(0)),
                (unit("bgb", "§ 1", "2", "b"), axis(0)),
                (unit("bgb", "§ 2", "1", "c"), axis(0)),
            ])
            .unwrap();

        let section = store
            .lookup(&TextFilter {
                code: Some("bgb".into()),
                section: Some("§ 1".into()),
                sub_section: None,
            })
            .unwrap();
        assert_eq!(section.len(), 2);

        let one = store
            .lookup(&TextFilter {
                code: Some("bgb".into()),
                section: Some("§ 1".into()),
                sub_section: Some("2".into()),
            })
            .unwrap();
        assert_eq!(one.len(), 1);
        assert_eq!(one[0].text, "b");
    }

    #[test]
    fn lookup_without_any_filter_returns_everything() {
        let store = store();
        store
            .upsert_batch(&[
                (unit("bgb", "§ 1", "", "a"), axis(0)),
                (unit("stgb", "§ 1", "", "b"), axis(0)),
            ])
            .unwrap();
        assert_eq!(store.lookup(&TextFilter::default()).unwrap().len(), 2);
    }

    #[test]
    fn lookup_no_match_is_empty_not_error() {
        let store = store();
        let hits = store.lookup(&TextFilter::for_code("unknown")).unwrap();
        assert!(hits.is_empty());
    }

    #[test]
    fn sub_section_without_section_is_rejected() {
        let store = store();
        for code in [Some("bgb".to_string()), None] {
            let err = store
                .lookup(&TextFilter {
                    code,
                    section: None,
                    sub_section: Some("1".into()),
                })
                .unwrap_err();
            assert!(matches!(err, StoreError::SubSectionWithoutSection));
        }
    }

    #[test]
    fn upsert_is_idempotent() {
        let store = store();
        let rows = vec![
            (unit("bgb", "§ 1", "1", "(1) Text."), axis(0)),
            (unit("bgb", "§ 1", "2", "(2) Mehr."), axis(1)),
        ];
        store.upsert_batch(&rows).unwrap();
        store.upsert_batch(&rows).unwrap();

        let all = store.lookup(&TextFilter::for_code("bgb")).unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].text, "(1) Text.");
    }

    #[test]
    fn reimport_replaces_text_and_hash() {
        let store = store();
        store
            .upsert_batch(&[(unit("bgb", "§ 1", "1", "alte Fassung"), axis(0))])
            .unwrap();
        let old_hash = store.stored_hash("bgb", "§ 1", "1");

        store
            .upsert_batch(&[(unit("bgb", "§ 1", "1", "neue Fassung"), axis(1))])
            .unwrap();

        let all = store.lookup(&TextFilter::for_code("bgb")).unwrap();
        assert_eq!(all.len(), 1, "replacement must not duplicate");
        assert_eq!(all[0].text, "neue Fassung");

        let new_hash = store.stored_hash("bgb", "§ 1", "1");
        assert_ne!(old_hash, new_hash);
        assert_eq!(new_hash, content_hash("neue Fassung"));
    }

    #[test]
    fn dimension_mismatch_is_rejected_before_writing() {
        let store = store();
        let err = store
            .upsert_batch(&[
                (unit("bgb", "§ 1", "1", "ok"), axis(0)),
                (unit("bgb", "§ 1", "2", "bad"), vec![1.0; DIM + 1]),
            ])
            .unwrap_err();
        assert!(matches!(
            err,
            StoreError::Dimension {
                expected: DIM,
                got: 5
            }
        ));
        // Nothing from the batch was applied.
        assert!(store.lookup(&TextFilter::for_code("bgb")).unwrap().is_empty());

        let err = store.semantic_search(&[1.0; 2], "bgb", 5, None).unwrap_err();
        assert!(matches!(err, StoreError::Dimension { .. }));
    }

    #[test]
    fn codes_are_distinct_and_sorted() {
        let store = store();
        store
            .upsert_batch(&[
                (unit("stgb", "§ 1", "", "a"), axis(0)),
                (unit("bgb", "§ 1", "", "b"), axis(0)),
                (unit("bgb", "§ 2", "", "c"), axis(0)),
            ])
            .unwrap();
        assert_eq!(store.codes().unwrap(), vec!["bgb", "stgb"]);
        assert_eq!(store.count_for_code("bgb").unwrap(), 2);
        assert_eq!(store.count_for_code("stgb").unwrap(), 1);
    }

    #[test]
    fn search_orders_by_ascending_distance() {
        let store = store();
        store
            .upsert_batch(&[
                (unit("bgb", "§ 1", "", "identical"), axis(0)),
                (unit("bgb", "§ 2", "", "orthogonal"), axis(1)),
                (unit("bgb", "§ 3", "", "opposite"), {
                    let mut v = axis(0);
                    v[0] = -1.0;
                    v
                }),
            ])
            .unwrap();

        let hits = store.semantic_search(&axis(0), "bgb", 10, None).unwrap();
        assert_eq!(hits.len(), 3);
        assert_eq!(hits[0].0.section, "§ 1");
        assert!(hits[0].1.abs() < 1e-5);
        assert_eq!(hits[1].0.section, "§ 2");
        assert!((hits[1].1 - 1.0).abs() < 1e-5);
        assert_eq!(hits[2].0.section, "§ 3");
        assert!((hits[2].1 - 2.0).abs() < 1e-5);
    }

    #[test]
    fn search_is_scoped_to_code() {
        let store = store();
        store
            .upsert_batch(&[
                (unit("bgb", "§ 1", "", "bgb text"), axis(0)),
                (unit("stgb", "§ 1", "", "stgb text"), axis(0)),
            ])
            .unwrap();
        let hits = store.semantic_search(&axis(0), "stgb", 10, None).unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].0.code, "stgb");
    }

    #[test]
    fn cutoff_only_ever_shrinks_the_result() {
        let store = store();
        store
            .upsert_batch(&[
                (unit("bgb", "§ 1", "", "near"), axis(0)),
                (unit("bgb", "§ 2", "", "far"), axis(1)),
            ])
            .unwrap();

        let mut previous = usize::MAX;
        for cutoff in [2.0, 1.5, 0.5, 0.0] {
            let hits = store
                .semantic_search(&axis(0), "bgb", 10, Some(cutoff))
                .unwrap();
            assert!(hits.len() <= previous, "cutoff {cutoff} grew the result");
            assert!(hits.iter().all(|(_, d)| *d <= cutoff));
            previous = hits.len();
        }
    }

    #[test]
    fn search_respects_limit() {
        let store = store();
        store
            .upsert_batch(&[
                (unit("bgb", "§ 1", "", "a"), axis(0)),
                (unit("bgb", "§ 2", "", "b"), axis(1)),
                (unit("bgb", "§ 3", "", "c"), axis(2)),
            ])
            .unwrap();
        let hits = store.semantic_search(&axis(0), "bgb", 2, None).unwrap();
        assert_eq!(hits.len(), 2);
    }

    #[test]
    fn search_empty_match_is_ok() {
        let store = store();
        let hits = store.semantic_search(&axis(0), "bgb", 10, Some(0.1)).unwrap();
        assert!(hits.is_empty());
    }

    #[test]
    fn persistent_store_survives_reopen() {
        let tmp = tempfile::TempDir::new().unwrap();
        let db_path = tmp.path().join("texts.duckdb");

        let store = TextStore::open(&db_path, DIM).unwrap();
        store
            .upsert_batch(&[(unit("bgb", "§ 1", "1", "(1) Text."), axis(0))])
            .unwrap();
        drop(store);

        let store = TextStore::open(&db_path, DIM).unwrap();
        let all = store.lookup(&TextFilter::for_code("bgb")).unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].text, "(1) Text.");
    }

    #[test]
    fn content_hash_is_stable_hex_sha256() {
        // sha256("abc")
        assert_eq!(
            content_hash("abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
        assert_eq!(content_hash("").len(), 64);
    }
}
