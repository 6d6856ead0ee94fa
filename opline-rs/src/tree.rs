//! Command trees.
//!
//! Each registered command is one [`CommandTree`]: an arena of
//! [`CommandNode`]s addressed by [`NodeId`]. A node owns the ids of its
//! children in registration order; the parent id is a back-link used only to
//! walk upwards (permission lookup, paths).
//!
//! Trees are built through [`NodeMut`], an exclusive handle on one node:
//!
//! ```
//! use opline::kind::NumberKind;
//! use opline::tree::CommandTree;
//!
//! let mut tree = CommandTree::new("tp");
//! tree.root_mut()
//!     .describe("Teleport")
//!     .append_literal("home", |home| {
//!         home.implement(|_, _| Ok(Some("home".into())));
//!     })
//!     .append_argument(NumberKind, |x| {
//!         x.append_argument(NumberKind, |y| {
//!             y.implement(|_, args| {
//!                 let (x, y): (f64, f64) = (args.get(1)?, args.get(2)?);
//!                 Ok(Some(format!("{} {}", x, y)))
//!             });
//!         });
//!     });
//!
//! assert_eq!(tree.expected_argument_labels(tree.root()), "(\"home\" | number)");
//! ```

use std::fmt;
use std::ops::Index;
use std::sync::Arc;

use crate::context::{Args, CommandContext};
use crate::kind::{Kind, LiteralKind};
use crate::permission::{PermissionRule, Permissions};

/// Result of a command implementation.
pub type Outcome = anyhow::Result<Option<String>>;

/// Stored command implementation.
pub type Execution = Arc<dyn Fn(&CommandContext<'_>, &Args) -> Outcome + Send + Sync>;

/// Handle of a node inside its [`CommandTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    /// Every tree's root.
    pub const ROOT: NodeId = NodeId(0);

    pub fn index(self) -> usize {
        self.0
    }
}

/// One command or argument position.
#[derive(Clone)]
pub struct CommandNode {
    name: String,
    argument: Arc<dyn Kind>,
    execution: Option<Execution>,
    permission: Option<PermissionRule>,
    description: Option<String>,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

impl CommandNode {
    fn new(name: String, argument: Arc<dyn Kind>, parent: Option<NodeId>) -> Self {
        Self {
            name,
            argument,
            execution: None,
            permission: None,
            description: None,
            parent,
            children: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn argument(&self) -> &dyn Kind {
        self.argument.as_ref()
    }

    pub fn execution(&self) -> Option<&Execution> {
        self.execution.as_ref()
    }

    pub fn is_implemented(&self) -> bool {
        self.execution.is_some()
    }

    /// This node's own rule, ignoring ancestors.
    pub fn permission_rule(&self) -> Option<&PermissionRule> {
        self.permission.as_ref()
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }
}

impl fmt::Debug for CommandNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandNode")
            .field("name", &self.name)
            .field("argument", &self.argument.label())
            .field("implemented", &self.execution.is_some())
            .field("has_permissions", &self.permission.is_some())
            .field("parent", &self.parent)
            .field("children", &self.children)
            .finish()
    }
}

/// Arena holding one registered command and all of its subcommands.
#[derive(Clone, Debug)]
pub struct CommandTree {
    nodes: Vec<CommandNode>,
}

impl CommandTree {
    /// A tree whose root matches the literal `name`.
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        let kind = LiteralKind::new(name.clone());
        Self::with_root(name, Arc::new(kind))
    }

    pub fn with_root(name: impl Into<String>, argument: Arc<dyn Kind>) -> Self {
        Self {
            nodes: vec![CommandNode::new(name.into(), argument, None)],
        }
    }

    pub fn root(&self) -> NodeId {
        NodeId::ROOT
    }

    /// Name of the root command.
    pub fn name(&self) -> &str {
        self.nodes[0].name()
    }

    pub fn get(&self, id: NodeId) -> Option<&CommandNode> {
        self.nodes.get(id.0)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Always false; a tree has at least its root.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn root_mut(&mut self) -> NodeMut<'_> {
        NodeMut {
            tree: self,
            id: NodeId::ROOT,
        }
    }

    /// Exclusive handle on `id`, if it belongs to this tree.
    pub fn node_mut(&mut self, id: NodeId) -> Option<NodeMut<'_>> {
        (id.0 < self.nodes.len()).then_some(NodeMut { tree: self, id })
    }

    /// `id` followed by each of its ancestors up to the root.
    pub fn ancestors(&self, id: NodeId) -> Ancestors<'_> {
        Ancestors {
            tree: self,
            next: self.get(id).map(|_| id),
        }
    }

    /// Nearest rule on the path from `id` (inclusive) to the root.
    pub fn find_nearest_permission_rule(&self, id: NodeId) -> Option<&PermissionRule> {
        self.ancestors(id)
            .find_map(|ancestor| self.nodes[ancestor.0].permission.as_ref())
    }

    /// Requirement that applies to `id` for `permissions`' executor, or `None`
    /// when no rule is on the path.
    pub fn resolve_permissions(&self, id: NodeId, permissions: Permissions) -> Option<Permissions> {
        self.find_nearest_permission_rule(id)
            .map(|rule| rule(permissions))
    }

    /// Labels of all direct children, as `(a | b)`.
    pub fn expected_argument_labels(&self, id: NodeId) -> String {
        let labels: Vec<&str> = self[id]
            .children
            .iter()
            .map(|child| self.nodes[child.0].argument.label())
            .collect();
        format!("({})", labels.join(" | "))
    }

    /// Completion candidates for `id`'s argument.
    ///
    /// A kind without suggestions accepts anything, so the input itself is the
    /// only candidate.
    pub fn suggestions(&self, id: NodeId, input: &str) -> Vec<String> {
        let suggestions = self[id].argument.suggestions();
        if suggestions.is_empty() {
            vec![input.to_string()]
        } else {
            suggestions
        }
    }

    /// Node names from the root down to `id`.
    pub fn path(&self, id: NodeId) -> Vec<&str> {
        let mut path: Vec<&str> = self
            .ancestors(id)
            .map(|ancestor| self.nodes[ancestor.0].name())
            .collect();
        path.reverse();
        path
    }

    /// Depth-first, pre-order walk from `id`, children in registration order.
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = vec![id];
        while let Some(next) = stack.pop() {
            let Some(node) = self.get(next) else { continue };
            out.push(next);
            stack.extend(node.children.iter().rev());
        }
        out
    }
}

impl Index<NodeId> for CommandTree {
    type Output = CommandNode;

    fn index(&self, id: NodeId) -> &CommandNode {
        &self.nodes[id.0]
    }
}

/// Iterator returned by [`CommandTree::ancestors`].
pub struct Ancestors<'a> {
    tree: &'a CommandTree,
    next: Option<NodeId>,
}

impl Iterator for Ancestors<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let current = self.next?;
        self.next = self.tree.get(current).and_then(|node| node.parent);
        Some(current)
    }
}

/// Exclusive builder handle on one node.
///
/// Methods return `&mut Self` so calls chain; child builders receive their own
/// handle and may not outlive the call.
pub struct NodeMut<'a> {
    tree: &'a mut CommandTree,
    id: NodeId,
}

impl NodeMut<'_> {
    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn node(&self) -> &CommandNode {
        &self.tree[self.id]
    }

    fn node_mut(&mut self) -> &mut CommandNode {
        &mut self.tree.nodes[self.id.0]
    }

    /// Add a child matching `kind`, named after its label.
    pub fn append_argument<K>(&mut self, kind: K, build: impl FnOnce(&mut NodeMut<'_>)) -> &mut Self
    where
        K: Kind + 'static,
    {
        self.append_shared(Arc::new(kind), build)
    }

    /// Like [`append_argument`](Self::append_argument) for a kind shared
    /// between several nodes.
    pub fn append_shared(
        &mut self,
        kind: Arc<dyn Kind>,
        build: impl FnOnce(&mut NodeMut<'_>),
    ) -> &mut Self {
        let name = kind.label().to_string();
        self.append_node(name, kind, build)
    }

    /// Add a literal subcommand.
    ///
    /// Register literals after broader kinds such as strings at the same level
    /// when both could match; see [`AmbiguityPolicy`](crate::config::AmbiguityPolicy).
    pub fn append_literal(
        &mut self,
        name: impl Into<String>,
        build: impl FnOnce(&mut NodeMut<'_>),
    ) -> &mut Self {
        let name = name.into();
        let kind = Arc::new(LiteralKind::new(name.clone()));
        self.append_node(name, kind, build)
    }

    fn append_node(
        &mut self,
        name: String,
        kind: Arc<dyn Kind>,
        build: impl FnOnce(&mut NodeMut<'_>),
    ) -> &mut Self {
        let child = NodeId(self.tree.nodes.len());
        self.tree
            .nodes
            .push(CommandNode::new(name, kind, Some(self.id)));
        self.node_mut().children.push(child);

        build(&mut NodeMut {
            tree: &mut *self.tree,
            id: child,
        });
        self
    }

    /// Attach a permission rule to this node.
    pub fn permissions(
        &mut self,
        rule: impl Fn(Permissions) -> Permissions + Send + Sync + 'static,
    ) -> &mut Self {
        self.node_mut().permission = Some(Arc::new(rule));
        self
    }

    /// Remove this node's own rule; the nearest ancestor's rule applies again.
    pub fn clear_permissions(&mut self) -> &mut Self {
        self.node_mut().permission = None;
        self
    }

    /// Set the implementation run when resolution ends on this node.
    pub fn implement(
        &mut self,
        execution: impl Fn(&CommandContext<'_>, &Args) -> Outcome + Send + Sync + 'static,
    ) -> &mut Self {
        self.node_mut().execution = Some(Arc::new(execution));
        self
    }

    pub fn deimplement(&mut self) -> &mut Self {
        self.node_mut().execution = None;
        self
    }

    pub fn describe(&mut self, description: impl Into<String>) -> &mut Self {
        self.node_mut().description = Some(description.into());
        self
    }

    /// Handle on the `index`-th child, in registration order.
    pub fn child(&mut self, index: usize) -> Option<NodeMut<'_>> {
        let id = *self.node().children.get(index)?;
        Some(NodeMut {
            tree: &mut *self.tree,
            id,
        })
    }

    /// Handle on the first child called `name`.
    pub fn find_child(&mut self, name: &str) -> Option<NodeMut<'_>> {
        let id = self
            .node()
            .children
            .iter()
            .copied()
            .find(|child| self.tree[*child].name == name)?;
        Some(NodeMut {
            tree: &mut *self.tree,
            id,
        })
    }
}

impl fmt::Debug for NodeMut<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NodeMut")
            .field("id", &self.id)
            .field("name", &self.node().name)
            .finish()
    }
}
