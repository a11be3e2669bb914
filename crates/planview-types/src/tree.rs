//! Hierarchical plan model: suites and tests as an ordered tree.
//!
//! Nodes are addressed by [`NodePath`], the sequence of child indices from
//! the roots. Paths are only stable until the next structural change.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::fmt;
use std::str::FromStr;

use crate::{Error, PointState, ResultEntity, TestOutcome};

/// Tag of a suite node
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuiteTag {
    pub suite_id: i32,
    /// Backslash-separated suite path
    pub path: String,
}

/// What a tree node stands for
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum NodeTag {
    Suite(SuiteTag),
    Test(ResultEntity),
}

impl NodeTag {
    /// Entity view of the tag. Suites yield a placeholder entity.
    pub fn entity(&self) -> Cow<'_, ResultEntity> {
        match self {
            NodeTag::Test(entity) => Cow::Borrowed(entity),
            NodeTag::Suite(suite) => {
                Cow::Owned(ResultEntity::suite_placeholder(suite.suite_id, suite.path.clone()))
            }
        }
    }

    pub fn suite_id(&self) -> i32 {
        match self {
            NodeTag::Suite(suite) => suite.suite_id,
            NodeTag::Test(entity) => entity.suite_id,
        }
    }

    pub fn as_test(&self) -> Option<&ResultEntity> {
        match self {
            NodeTag::Test(entity) => Some(entity),
            NodeTag::Suite(_) => None,
        }
    }

    pub fn as_test_mut(&mut self) -> Option<&mut ResultEntity> {
        match self {
            NodeTag::Test(entity) => Some(entity),
            NodeTag::Suite(_) => None,
        }
    }
}

/// Display status of a node, derived from its tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeStatus {
    Folder,
    Active,
    Passed,
    Failed,
    Attention,
    Blocked,
    Queued,
    NeverRun,
    #[default]
    Unknown,
}

impl NodeStatus {
    pub fn for_tag(tag: &NodeTag) -> Self {
        match tag {
            NodeTag::Suite(_) => NodeStatus::Folder,
            NodeTag::Test(entity) => Self::for_entity(entity),
        }
    }

    pub fn for_entity(entity: &ResultEntity) -> Self {
        if entity.state == PointState::Ready {
            return NodeStatus::Active;
        }
        match entity.outcome {
            TestOutcome::Passed => NodeStatus::Passed,
            TestOutcome::Failed => NodeStatus::Failed,
            TestOutcome::Blocked => NodeStatus::Blocked,
            TestOutcome::None => NodeStatus::Queued,
            TestOutcome::Unspecified => NodeStatus::NeverRun,
            outcome if outcome.needs_attention() => NodeStatus::Attention,
            _ => NodeStatus::Unknown,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreeNode {
    pub title: String,
    pub tag: NodeTag,
    #[serde(default)]
    pub children: Vec<TreeNode>,
    #[serde(default)]
    pub status: NodeStatus,
}

impl TreeNode {
    pub fn suite(title: impl Into<String>, suite_id: i32, path: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            tag: NodeTag::Suite(SuiteTag {
                suite_id,
                path: path.into(),
            }),
            children: Vec::new(),
            status: NodeStatus::Folder,
        }
    }

    pub fn test(title: impl Into<String>, entity: ResultEntity) -> Self {
        let status = NodeStatus::for_entity(&entity);
        Self {
            title: title.into(),
            tag: NodeTag::Test(entity),
            children: Vec::new(),
            status,
        }
    }

    pub fn is_suite(&self) -> bool {
        matches!(self.tag, NodeTag::Suite(_))
    }

    /// Index of the direct child test node for `(test_id, configuration)`.
    pub fn find_child(&self, test_id: i32, configuration: &str) -> Option<usize> {
        self.children.iter().position(|child| {
            child
                .tag
                .as_test()
                .is_some_and(|e| e.test_id == test_id && e.configuration == configuration)
        })
    }

    /// All test entities at or below this node, depth-first.
    pub fn leaf_results(&self) -> Vec<&ResultEntity> {
        let mut out = Vec::new();
        self.collect_results(&mut out);
        out
    }

    fn collect_results<'a>(&'a self, out: &mut Vec<&'a ResultEntity>) {
        if let NodeTag::Test(entity) = &self.tag {
            out.push(entity);
        }
        for child in &self.children {
            child.collect_results(out);
        }
    }

    pub fn restore_status(&mut self) {
        self.status = NodeStatus::for_tag(&self.tag);
        for child in &mut self.children {
            child.restore_status();
        }
    }

    fn sort_by_title(&mut self) {
        self.children.sort_by(|a, b| a.title.cmp(&b.title));
        for child in &mut self.children {
            child.sort_by_title();
        }
    }

    fn count(&self) -> usize {
        1 + self.children.iter().map(TreeNode::count).sum::<usize>()
    }
}

/// Index path from the tree roots to a node
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodePath(Vec<usize>);

impl NodePath {
    pub fn root(index: usize) -> Self {
        Self(vec![index])
    }

    pub fn child(&self, index: usize) -> Self {
        let mut indices = self.0.clone();
        indices.push(index);
        Self(indices)
    }

    pub fn parent(&self) -> Option<Self> {
        if self.0.len() <= 1 {
            return None;
        }
        Some(Self(self.0[..self.0.len() - 1].to_vec()))
    }

    pub fn indices(&self) -> &[usize] {
        &self.0
    }

    pub fn depth(&self) -> usize {
        self.0.len()
    }
}

impl From<Vec<usize>> for NodePath {
    fn from(indices: Vec<usize>) -> Self {
        Self(indices)
    }
}

impl fmt::Display for NodePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.0.iter().map(|i| i.to_string()).collect();
        f.write_str(&parts.join("/"))
    }
}

impl FromStr for NodePath {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim().trim_matches('/');
        if trimmed.is_empty() {
            return Err(Error::InvalidPath("path is empty".to_string()));
        }
        trimmed
            .split('/')
            .map(|part| {
                part.parse::<usize>()
                    .map_err(|_| Error::InvalidPath(format!("'{}' in '{}'", part, s)))
            })
            .collect::<Result<Vec<_>, _>>()
            .map(Self)
    }
}

/// The live model of one plan
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PlanTree {
    pub plan_name: String,
    pub roots: Vec<TreeNode>,
    #[serde(default)]
    pub last_updated: Option<DateTime<Utc>>,
}

impl PlanTree {
    pub fn new(plan_name: impl Into<String>) -> Self {
        Self {
            plan_name: plan_name.into(),
            roots: Vec::new(),
            last_updated: None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.roots.is_empty()
    }

    pub fn node_count(&self) -> usize {
        self.roots.iter().map(TreeNode::count).sum()
    }

    pub fn node(&self, path: &NodePath) -> Option<&TreeNode> {
        let (first, rest) = path.0.split_first()?;
        let mut node = self.roots.get(*first)?;
        for index in rest {
            node = node.children.get(*index)?;
        }
        Some(node)
    }

    pub fn node_mut(&mut self, path: &NodePath) -> Option<&mut TreeNode> {
        let (first, rest) = path.0.split_first()?;
        let mut node = self.roots.get_mut(*first)?;
        for index in rest {
            node = node.children.get_mut(*index)?;
        }
        Some(node)
    }

    /// Detach the node at `path`, shifting later siblings down by one.
    pub fn remove(&mut self, path: &NodePath) -> Option<TreeNode> {
        let (last, _) = path.0.split_last()?;
        let siblings = match path.parent() {
            Some(parent) => &mut self.node_mut(&parent)?.children,
            None => &mut self.roots,
        };
        if *last < siblings.len() {
            Some(siblings.remove(*last))
        } else {
            None
        }
    }

    pub fn all_results(&self) -> Vec<&ResultEntity> {
        let mut out = Vec::new();
        for root in &self.roots {
            root.collect_results(&mut out);
        }
        out
    }

    /// Pre-order walk yielding each node with its path.
    pub fn walk(&self) -> Vec<(NodePath, &TreeNode)> {
        fn visit<'a>(path: NodePath, node: &'a TreeNode, out: &mut Vec<(NodePath, &'a TreeNode)>) {
            out.push((path.clone(), node));
            for (i, child) in node.children.iter().enumerate() {
                visit(path.child(i), child, out);
            }
        }

        let mut out = Vec::new();
        for (i, root) in self.roots.iter().enumerate() {
            visit(NodePath::root(i), root, &mut out);
        }
        out
    }

    pub fn restore_status(&mut self) {
        for root in &mut self.roots {
            root.restore_status();
        }
    }

    /// Stable, recursive sort of siblings by title.
    pub fn sort_by_title(&mut self) {
        self.roots.sort_by(|a, b| a.title.cmp(&b.title));
        for root in &mut self.roots {
            root.sort_by_title();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_node_path_parse_and_display() {
        let path: NodePath = "0/2/1".parse().unwrap();
        assert_eq!(path.indices(), &[0, 2, 1]);
        assert_eq!(path.to_string(), "0/2/1");
        assert_eq!(path.parent().unwrap().to_string(), "0/2");
        assert!(NodePath::root(0).parent().is_none());
    }

    #[test]
    fn test_node_path_rejects_garbage() {
        assert!("".parse::<NodePath>().is_err());
        assert!("0/x".parse::<NodePath>().is_err());
        assert!("-1".parse::<NodePath>().is_err());
    }

    #[test]
    fn test_suite_tag_entity_is_placeholder() {
        let node = TreeNode::suite("Root", 4, "Root");
        let entity = node.tag.entity();
        assert!(entity.is_placeholder());
        assert_eq!(entity.suite_id, 4);
    }

    #[test]
    fn test_status_prefers_active_state() {
        let mut entity = ResultEntity::new("t", 1, 1, "", "");
        entity.outcome = TestOutcome::Failed;
        entity.state = PointState::Ready;
        assert_eq!(NodeStatus::for_entity(&entity), NodeStatus::Active);

        entity.state = PointState::Completed;
        assert_eq!(NodeStatus::for_entity(&entity), NodeStatus::Failed);

        entity.outcome = TestOutcome::Timeout;
        assert_eq!(NodeStatus::for_entity(&entity), NodeStatus::Attention);

        entity.outcome = TestOutcome::Aborted;
        assert_eq!(NodeStatus::for_entity(&entity), NodeStatus::Unknown);
    }
}
