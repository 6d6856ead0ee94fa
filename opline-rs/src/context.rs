//! Per-call execution context.

use std::fmt;

use thiserror::Error;

use crate::identity::PrincipalId;
use crate::kind::{FromValue, Value};
use crate::permission::ExecutionLevel;
use crate::registry::Registry;
use crate::tokenizer::TokenStream;
use crate::tree::{CommandNode, CommandTree, NodeId};

/// The identity invoking a command, with its level resolved at dispatch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Executor {
    principal: Option<PrincipalId>,
    display_name: Option<String>,
    level: ExecutionLevel,
    system_name: String,
}

impl Executor {
    pub fn new(
        principal: Option<PrincipalId>,
        display_name: Option<String>,
        level: ExecutionLevel,
        system_name: impl Into<String>,
    ) -> Self {
        Self {
            principal,
            display_name,
            level,
            system_name: system_name.into(),
        }
    }

    /// Display name, else the principal id, else the registry's system name.
    pub fn name(&self) -> String {
        match (&self.display_name, self.principal) {
            (Some(name), _) => name.clone(),
            (None, Some(id)) => id.to_string(),
            (None, None) => self.system_name.clone(),
        }
    }

    pub fn principal(&self) -> Option<PrincipalId> {
        self.principal
    }

    /// Whether a principal (rather than the system) issued the call.
    pub fn is_interactive(&self) -> bool {
        self.principal.is_some()
    }

    pub fn level(&self) -> ExecutionLevel {
        self.level
    }
}

/// Failure to read a typed argument.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ArgError {
    #[error("Missing argument at position {index}")]
    Missing { index: usize },

    #[error("Argument {index} is a {found}, expected {expected}")]
    Type {
        index: usize,
        expected: &'static str,
        found: &'static str,
    },
}

/// Matched arguments. Position 0 is the root command name, then one value
/// per consumed token.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Args(Vec<Value>);

impl Args {
    pub fn new(values: Vec<Value>) -> Self {
        Self(values)
    }

    /// Typed access.
    ///
    /// ```
    /// use opline::context::Args;
    /// use opline::kind::Value;
    ///
    /// let args = Args::new(vec![Value::String("give".into()), Value::Integer(3)]);
    /// let count: i64 = args.get(1).unwrap();
    /// assert_eq!(count, 3);
    /// assert!(args.get::<bool>(1).is_err());
    /// ```
    pub fn get<T: FromValue>(&self, index: usize) -> Result<T, ArgError> {
        let value = self.0.get(index).ok_or(ArgError::Missing { index })?;
        T::from_value(value).ok_or(ArgError::Type {
            index,
            expected: std::any::type_name::<T>(),
            found: value.type_name(),
        })
    }

    pub fn value(&self, index: usize) -> Option<&Value> {
        self.0.get(index)
    }

    pub fn values(&self) -> &[Value] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Value> {
        self.0.iter()
    }
}

/// Everything an implementation knows about its own invocation.
///
/// Built fresh for each call and dropped when the implementation returns.
pub struct CommandContext<'a> {
    tree: &'a CommandTree,
    node: NodeId,
    command_line: &'a str,
    executor: Executor,
    registry: &'a Registry,
}

impl<'a> CommandContext<'a> {
    pub(crate) fn new(
        tree: &'a CommandTree,
        node: NodeId,
        command_line: &'a str,
        executor: Executor,
        registry: &'a Registry,
    ) -> Self {
        Self {
            tree,
            node,
            command_line,
            executor,
            registry,
        }
    }

    /// The resolved command.
    pub fn command(&self) -> &'a CommandNode {
        &self.tree[self.node]
    }

    pub fn node_id(&self) -> NodeId {
        self.node
    }

    /// The tree the command was resolved in.
    pub fn tree(&self) -> &'a CommandTree {
        self.tree
    }

    /// Name of the resolved command.
    pub fn name(&self) -> &'a str {
        self.command().name()
    }

    /// The raw line as typed.
    pub fn command_line(&self) -> &'a str {
        self.command_line
    }

    pub fn executor(&self) -> &Executor {
        &self.executor
    }

    pub fn registry(&self) -> &'a Registry {
        self.registry
    }

    /// Re-tokenize the raw line.
    pub fn tokens(&self) -> TokenStream {
        TokenStream::from_line(self.command_line)
    }
}

impl fmt::Debug for CommandContext<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandContext")
            .field("name", &self.name())
            .field("command_line", &self.command_line)
            .field("executor", &self.executor)
            .finish_non_exhaustive()
    }
}
