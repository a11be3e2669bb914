use chrono::{DateTime, Utc};
use planview_types::{NodeTag, PlanTree, ResultEntity, TreeNode};
use rusqlite::{Connection, OpenFlags, Transaction, params};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::schema::{SCHEMA_VERSION, read_version, reset_schema};
use crate::{Error, Result};

const KIND_SUITE: &str = "suite";
const KIND_TEST: &str = "test";

const META_PLAN_NAME: &str = "plan_name";
const META_LAST_UPDATED: &str = "last_updated";

struct NodeRow {
    id: i64,
    parent_id: Option<i64>,
    title: String,
    kind: String,
    suite_id: i32,
    path: Option<String>,
    entity: Option<String>,
}

/// Cache file of one plan
#[derive(Debug, Clone)]
pub struct PlanCache {
    path: PathBuf,
}

impl PlanCache {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// Replace the cache contents with `tree`.
    ///
    /// The tree is written to a sibling temp file which then replaces the
    /// cache, so readers never observe a half-written file.
    pub fn save(&self, tree: &PlanTree) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let staging = self.path.with_extension("db-staging");
        if staging.exists() {
            std::fs::remove_file(&staging)?;
        }

        let nodes = write_tree(&staging, tree)?;
        std::fs::rename(&staging, &self.path)?;

        debug!(path = %self.path.display(), nodes, "plan cache saved");
        Ok(())
    }

    /// Load the cached tree. Any failure is a cache miss.
    pub fn load(&self) -> Option<PlanTree> {
        match self.try_load() {
            Ok(tree) => tree,
            Err(err) => {
                warn!(path = %self.path.display(), error = %err, "ignoring unreadable plan cache");
                None
            }
        }
    }

    /// Load the cached tree; `Ok(None)` when the file is absent or from another schema version.
    pub fn try_load(&self) -> Result<Option<PlanTree>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let conn = Connection::open_with_flags(&self.path, OpenFlags::SQLITE_OPEN_READ_ONLY)?;

        let version = read_version(&conn)?;
        if version != SCHEMA_VERSION {
            debug!(
                path = %self.path.display(),
                found = version,
                expected = SCHEMA_VERSION,
                "plan cache version mismatch"
            );
            return Ok(None);
        }

        let meta = read_meta(&conn)?;
        let rows = read_nodes(&conn)?;

        let mut by_parent: HashMap<Option<i64>, Vec<NodeRow>> = HashMap::new();
        for row in rows {
            by_parent.entry(row.parent_id).or_default().push(row);
        }
        let roots = build_children(None, &mut by_parent)?;
        if !by_parent.values().all(Vec::is_empty) {
            return Err(Error::Query("cache contains unreachable nodes".to_string()));
        }

        let last_updated = match meta.get(META_LAST_UPDATED) {
            Some(value) => Some(
                DateTime::parse_from_rfc3339(value)
                    .map_err(|e| Error::Query(format!("bad last_updated '{}': {}", value, e)))?
                    .with_timezone(&Utc),
            ),
            None => std::fs::metadata(&self.path)?
                .modified()
                .ok()
                .map(DateTime::<Utc>::from),
        };

        let mut tree = PlanTree {
            plan_name: meta.get(META_PLAN_NAME).cloned().unwrap_or_default(),
            roots,
            last_updated,
        };
        tree.restore_status();
        Ok(Some(tree))
    }
}

fn write_tree(path: &Path, tree: &PlanTree) -> Result<i64> {
    let mut conn = Connection::open(path)?;
    reset_schema(&conn)?;

    let tx = conn.transaction()?;
    tx.execute(
        "INSERT INTO meta (key, value) VALUES (?1, ?2)",
        params![META_PLAN_NAME, &tree.plan_name],
    )?;
    if let Some(updated) = tree.last_updated {
        tx.execute(
            "INSERT INTO meta (key, value) VALUES (?1, ?2)",
            params![META_LAST_UPDATED, updated.to_rfc3339()],
        )?;
    }

    let mut next_id = 0i64;
    for (position, root) in tree.roots.iter().enumerate() {
        insert_node(&tx, root, None, position, &mut next_id)?;
    }
    tx.commit()?;
    Ok(next_id)
}

fn insert_node(
    tx: &Transaction<'_>,
    node: &TreeNode,
    parent_id: Option<i64>,
    position: usize,
    next_id: &mut i64,
) -> Result<()> {
    let id = *next_id;
    *next_id += 1;

    let (kind, path, entity) = match &node.tag {
        NodeTag::Suite(suite) => (KIND_SUITE, Some(suite.path.clone()), None),
        NodeTag::Test(entity) => (KIND_TEST, None, Some(serde_json::to_string(entity)?)),
    };
    tx.execute(
        r#"
        INSERT INTO nodes (id, parent_id, position, title, kind, suite_id, path, entity)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
        "#,
        params![
            id,
            parent_id,
            position as i64,
            &node.title,
            kind,
            node.tag.suite_id(),
            path,
            entity
        ],
    )?;

    for (child_position, child) in node.children.iter().enumerate() {
        insert_node(tx, child, Some(id), child_position, next_id)?;
    }
    Ok(())
}

fn read_meta(conn: &Connection) -> Result<HashMap<String, String>> {
    let mut stmt = conn.prepare("SELECT key, value FROM meta")?;
    let rows = stmt.query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?;
    let mut meta = HashMap::new();
    for row in rows {
        let (key, value) = row?;
        meta.insert(key, value);
    }
    Ok(meta)
}

fn read_nodes(conn: &Connection) -> Result<Vec<NodeRow>> {
    let mut stmt = conn.prepare(
        "SELECT id, parent_id, title, kind, suite_id, path, entity FROM nodes \
         ORDER BY position, id",
    )?;
    let rows = stmt.query_map([], |row| {
        Ok(NodeRow {
            id: row.get(0)?,
            parent_id: row.get(1)?,
            title: row.get(2)?,
            kind: row.get(3)?,
            suite_id: row.get(4)?,
            path: row.get(5)?,
            entity: row.get(6)?,
        })
    })?;

    let mut nodes = Vec::new();
    for row in rows {
        nodes.push(row?);
    }
    Ok(nodes)
}

fn build_children(
    parent_id: Option<i64>,
    by_parent: &mut HashMap<Option<i64>, Vec<NodeRow>>,
) -> Result<Vec<TreeNode>> {
    let rows = by_parent.remove(&parent_id).unwrap_or_default();
    let mut nodes = Vec::with_capacity(rows.len());
    for row in rows {
        let mut node = match row.kind.as_str() {
            KIND_SUITE => TreeNode::suite(row.title, row.suite_id, row.path.unwrap_or_default()),
            KIND_TEST => {
                let json = row
                    .entity
                    .ok_or_else(|| Error::Query(format!("test node {} has no entity", row.id)))?;
                let entity: ResultEntity = serde_json::from_str(&json)?;
                TreeNode::test(row.title, entity)
            }
            other => return Err(Error::Query(format!("unknown node kind '{}'", other))),
        };
        node.children = build_children(Some(row.id), by_parent)?;
        nodes.push(node);
    }
    Ok(nodes)
}
