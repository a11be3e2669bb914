use rusqlite::Connection;

use crate::Result;

// Schema version (increment when changing table definitions or the entity JSON shape)
pub const SCHEMA_VERSION: i32 = 1;

// NOTE: Cache Layout
//
// The cache is a full snapshot of one plan tree, rewritten on every save.
// - `nodes` stores the hierarchy as an adjacency list; `position` keeps
//   sibling order explicit so a reload reproduces the tree exactly.
// - Test entities are stored as JSON in `nodes.entity`; suites only carry
//   their id and path.
// - A file written by another schema version is treated as absent, never
//   migrated: the next sync rebuilds it from the remote.

pub fn read_version(conn: &Connection) -> Result<i32> {
    Ok(conn.query_row("PRAGMA user_version", [], |row| row.get(0))?)
}

pub fn reset_schema(conn: &Connection) -> Result<()> {
    drop_all_tables(conn)?;

    conn.execute_batch(
        r#"
        CREATE TABLE meta (
            key TEXT PRIMARY KEY,
            value TEXT NOT NULL
        );

        CREATE TABLE nodes (
            id INTEGER PRIMARY KEY,
            parent_id INTEGER,
            position INTEGER NOT NULL,
            title TEXT NOT NULL,
            kind TEXT NOT NULL,
            suite_id INTEGER NOT NULL,
            path TEXT,
            entity TEXT,
            FOREIGN KEY (parent_id) REFERENCES nodes(id)
        );

        CREATE INDEX idx_nodes_parent ON nodes(parent_id, position);
        "#,
    )?;

    conn.execute(&format!("PRAGMA user_version = {}", SCHEMA_VERSION), [])?;

    Ok(())
}

fn drop_all_tables(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        DROP INDEX IF EXISTS idx_nodes_parent;
        DROP TABLE IF EXISTS nodes;
        DROP TABLE IF EXISTS meta;
        "#,
    )?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reset_schema_sets_version() {
        let conn = Connection::open_in_memory().unwrap();
        assert_eq!(read_version(&conn).unwrap(), 0);

        reset_schema(&conn).unwrap();
        assert_eq!(read_version(&conn).unwrap(), SCHEMA_VERSION);

        // Resetting twice drops and recreates cleanly.
        conn.execute("INSERT INTO meta (key, value) VALUES ('k', 'v')", [])
            .unwrap();
        reset_schema(&conn).unwrap();
        let rows: i64 = conn
            .query_row("SELECT COUNT(*) FROM meta", [], |row| row.get(0))
            .unwrap();
        assert_eq!(rows, 0);
    }
}
