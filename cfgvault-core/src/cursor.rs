//! Restartable lazy enumeration.

use crate::error::{Result, StoreError};
use rusqlite::{Connection, Params, Row};

type Fetch<'a, T> = Box<dyn FnMut() -> Result<Vec<T>> + 'a>;

/// Runs its query on the first pull and keeps the rows stable until
/// [`Cursor::reset`], after which the next pull queries again.
pub struct Cursor<'a, T> {
    fetch: Fetch<'a, T>,
    rows: Option<std::vec::IntoIter<T>>,
    error: Option<StoreError>,
}

impl<'a, T> Cursor<'a, T> {
    pub fn new(fetch: impl FnMut() -> Result<Vec<T>> + 'a) -> Self {
        Self {
            fetch: Box::new(fetch),
            rows: None,
            error: None,
        }
    }

    pub fn reset(&mut self) {
        self.rows = None;
        self.error = None;
    }

    /// The failure of the last query, if it failed. A failed query yields
    /// no rows.
    pub fn error(&self) -> Option<&StoreError> {
        self.error.as_ref()
    }
}

impl<T> Iterator for Cursor<'_, T> {
    type Item = T;

    fn next(&mut self) -> Option<T> {
        if self.rows.is_none() {
            let rows = match (self.fetch)() {
                Ok(rows) => rows,
                Err(err) => {
                    tracing::warn!("Enumeration failed: {}", err);
                    self.error = Some(err);
                    Vec::new()
                }
            };
            self.rows = Some(rows.into_iter());
        }
        self.rows.as_mut().and_then(Iterator::next)
    }
}

impl<T> std::fmt::Debug for Cursor<'_, T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Cursor")
            .field("started", &self.rows.is_some())
            .field("error", &self.error)
            .finish()
    }
}

/// Run a cached statement and map every row.
pub(crate) fn collect_rows<T>(
    conn: &Connection,
    sql: &str,
    params: impl Params,
    mut map: impl FnMut(&Row<'_>) -> Result<T>,
) -> Result<Vec<T>> {
    let mut stmt = conn.prepare_cached(sql)?;
    let mut rows = stmt.query(params)?;
    let mut out = Vec::new();
    while let Some(row) = rows.next()? {
        out.push(map(row)?);
    }
    Ok(out)
}

/// First row only, `None` when the query returns nothing.
pub(crate) fn first_row<T>(
    conn: &Connection,
    sql: &str,
    params: impl Params,
    map: impl FnOnce(&Row<'_>) -> Result<T>,
) -> Result<Option<T>> {
    let mut stmt = conn.prepare_cached(sql)?;
    let mut rows = stmt.query(params)?;
    match rows.next()? {
        Some(row) => map(row).map(Some),
        None => Ok(None),
    }
}

/// Execute a cached statement, returning the number of changed rows.
pub(crate) fn exec(conn: &Connection, sql: &str, params: impl Params) -> Result<usize> {
    Ok(conn.prepare_cached(sql)?.execute(params)?)
}
