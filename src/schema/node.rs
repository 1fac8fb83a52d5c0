//! The schema tree: an arena of nodes addressed by index.
//!
//! Parent links are plain indices used only for upward path walks; children
//! own nothing beyond their index entries, so the tree has no reference
//! cycles. The tree is built once by the schema builder and is immutable
//! afterwards.

use serde_json::Value;

use super::ScalarKind;
use crate::error::SchemaError;

/// Index of a node within its [`SchemaTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(usize);

/// Environment override token attached to a node.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum EnvTag {
    /// Derive the variable name from the node's path.
    #[default]
    Derive,
    /// No environment binding for this node or any descendant.
    Suppress,
    /// Replace the derived name outright.
    Explicit(String),
}

impl EnvTag {
    pub(crate) fn from_spec(tag: Option<&str>) -> Self {
        match tag {
            None | Some("") => EnvTag::Derive,
            Some("-") => EnvTag::Suppress,
            Some(name) => EnvTag::Explicit(name.to_string()),
        }
    }
}

/// Leaf descriptor: the resolved kind and coerced default of a scalar or
/// array-of-scalars field.
#[derive(Debug, Clone)]
pub struct Leaf {
    pub kind: ScalarKind,
    pub is_array: bool,
    /// Present iff the field declared a default.
    pub default: Option<Value>,
}

/// One element of the schema tree: either a container (has children) or a
/// leaf (has a descriptor). The two are mutually exclusive for the tree's
/// lifetime.
#[derive(Debug)]
pub struct Node {
    field_name: String,
    help: String,
    level: usize,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    is_array_of_structs: bool,
    env: EnvTag,
    leaf: Option<Leaf>,
}

impl Node {
    pub(crate) fn new(field_name: impl Into<String>, help: impl Into<String>, env: EnvTag) -> Self {
        Self {
            field_name: field_name.into(),
            help: help.into(),
            level: 0,
            parent: None,
            children: Vec::new(),
            is_array_of_structs: false,
            env,
            leaf: None,
        }
    }

    pub(crate) fn mark_struct_array(&mut self) {
        self.is_array_of_structs = true;
    }

    /// Local key fragment, unique among this node's siblings.
    pub fn field_name(&self) -> &str {
        &self.field_name
    }

    /// Help text, consumed only by the renderers.
    pub fn help(&self) -> &str {
        &self.help
    }

    /// Distance from the root (the root itself is level 0).
    pub fn level(&self) -> usize {
        self.level
    }

    /// True when this node represents a repeated structured block.
    pub fn is_array_of_structs(&self) -> bool {
        self.is_array_of_structs
    }

    pub fn env_tag(&self) -> &EnvTag {
        &self.env
    }

    /// Leaf descriptor, present iff the node is a leaf.
    pub fn leaf(&self) -> Option<&Leaf> {
        self.leaf.as_ref()
    }
}

/// Immutable schema tree over a flat node arena.
#[derive(Debug)]
pub struct SchemaTree {
    nodes: Vec<Node>,
}

impl SchemaTree {
    /// A tree holding only the synthetic root node.
    pub(crate) fn with_root() -> Self {
        Self {
            nodes: vec![Node::new("root", "", EnvTag::Derive)],
        }
    }

    /// The synthetic root. Never rendered, never part of any path.
    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    pub fn children(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.nodes[id.0].children.iter().copied()
    }

    /// Attach `node` under `parent`, assigning level and parent link.
    ///
    /// Fails with a structural error when the parent already carries a leaf
    /// descriptor.
    pub fn add_child(&mut self, parent: NodeId, mut node: Node) -> Result<NodeId, SchemaError> {
        let parent_node = &self.nodes[parent.0];
        if parent_node.leaf.is_some() {
            return Err(SchemaError::ChildOnLeaf {
                node: parent_node.field_name.clone(),
                child: node.field_name,
            });
        }
        node.parent = Some(parent);
        node.level = parent_node.level + 1;
        let id = NodeId(self.nodes.len());
        self.nodes.push(node);
        self.nodes[parent.0].children.push(id);
        Ok(id)
    }

    /// Attach a leaf descriptor to `id`.
    ///
    /// Fails with a structural error when the node already has children.
    pub fn set_leaf(&mut self, id: NodeId, leaf: Leaf) -> Result<(), SchemaError> {
        let node = &mut self.nodes[id.0];
        if !node.children.is_empty() {
            return Err(SchemaError::LeafOnContainer {
                node: node.field_name.clone(),
            });
        }
        node.leaf = Some(leaf);
        Ok(())
    }

    /// Field names from just below the root down to `id`. The root's own
    /// path is empty.
    pub fn full_path(&self, id: NodeId) -> Vec<&str> {
        let mut parts = Vec::new();
        let mut current = Some(id);
        while let Some(cur) = current {
            if cur == self.root() {
                break;
            }
            let node = &self.nodes[cur.0];
            parts.push(node.field_name.as_str());
            current = node.parent;
        }
        parts.reverse();
        parts
    }

    /// Dotted bind path addressing this node in merged value sets.
    pub fn bind_key(&self, id: NodeId) -> String {
        self.full_path(id).join(".")
    }

    /// Resolved environment variable name for `id`, or `None` when the
    /// binding is suppressed.
    ///
    /// A suppress token anywhere on the chain from the node up to the root
    /// wins over everything else. An explicit override on the node itself
    /// replaces the whole name rather than contributing a fragment.
    /// Otherwise the name is the uppercased underscore-join of every chain
    /// node's override (when explicit) or field name.
    pub fn env_name(&self, id: NodeId) -> Option<String> {
        let mut chain = Vec::new();
        let mut current = Some(id);
        while let Some(cur) = current {
            if cur == self.root() {
                break;
            }
            chain.push(cur);
            current = self.nodes[cur.0].parent;
        }
        if chain.is_empty() {
            return None;
        }
        if chain
            .iter()
            .any(|&c| matches!(self.nodes[c.0].env, EnvTag::Suppress))
        {
            return None;
        }
        if let EnvTag::Explicit(name) = &self.nodes[id.0].env {
            return Some(name.to_uppercase());
        }
        chain.reverse();
        let parts: Vec<&str> = chain
            .iter()
            .map(|&c| {
                let node = &self.nodes[c.0];
                match &node.env {
                    EnvTag::Explicit(name) => name.as_str(),
                    _ => node.field_name.as_str(),
                }
            })
            .collect();
        Some(parts.join("_").to_uppercase())
    }

    /// True when `id` or any of its ancestors is a repeated struct block.
    pub fn in_struct_array(&self, id: NodeId) -> bool {
        let mut current = Some(id);
        while let Some(cur) = current {
            let node = &self.nodes[cur.0];
            if node.is_array_of_structs {
                return true;
            }
            current = node.parent;
        }
        false
    }

    /// Depth-first, pre-order iterator over every leaf in the tree.
    ///
    /// Lazy and restartable: each call walks the arena afresh.
    pub fn leaves(&self) -> Leaves<'_> {
        Leaves {
            tree: self,
            stack: vec![self.root()],
        }
    }

    /// `(dotted path, typed default)` pairs handed to the overlay resolver.
    ///
    /// Leaves under repeated struct blocks are excluded: a flat path cannot
    /// address one element of an array.
    pub fn defaults(&self) -> Vec<(String, Value)> {
        self.leaves()
            .filter(|&id| !self.in_struct_array(id))
            .filter_map(|id| {
                let default = self.node(id).leaf()?.default.clone()?;
                Some((self.bind_key(id), default))
            })
            .collect()
    }

    /// `(dotted path, environment variable)` pairs handed to the overlay
    /// resolver. Suppressed leaves and leaves under repeated struct blocks
    /// are excluded.
    pub fn env_bindings(&self) -> Vec<(String, String)> {
        self.leaves()
            .filter(|&id| !self.in_struct_array(id))
            .filter_map(|id| Some((self.bind_key(id), self.env_name(id)?)))
            .collect()
    }
}

/// Iterator returned by [`SchemaTree::leaves`].
pub struct Leaves<'a> {
    tree: &'a SchemaTree,
    stack: Vec<NodeId>,
}

impl Iterator for Leaves<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        while let Some(id) = self.stack.pop() {
            let node = self.tree.node(id);
            for &child in node.children.iter().rev() {
                self.stack.push(child);
            }
            if node.leaf.is_some() {
                return Some(id);
            }
        }
        None
    }
}
