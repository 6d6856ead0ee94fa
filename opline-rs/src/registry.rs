//! Command registry and dispatch.
//!
//! A [`Registry`] owns the registered root trees and the sparse map of
//! granted execution levels. It is `Send + Sync`; share it behind an `Arc`.

use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::config::{AmbiguityPolicy, RegistryConfig};
use crate::context::{Args, CommandContext, Executor};
use crate::diagnostics::{Diagnostic, DiagnosticEvent, DiagnosticSink, TracingDiagnosticSink};
use crate::error::ExecuteError;
use crate::identity::{Identity, PrincipalId};
use crate::kind::Value;
use crate::permission::{ExecutionLevel, Permissions};
use crate::tokenizer::{tokenize, TokenStream};
use crate::tree::{CommandTree, NodeId, NodeMut};

type Roots = HashMap<String, Arc<CommandTree>>;

/// Registered commands plus per-principal execution levels.
pub struct Registry {
    config: RegistryConfig,
    id: String,
    roots: RwLock<Roots>,
    grants: RwLock<HashMap<PrincipalId, ExecutionLevel>>,
    sink: Arc<dyn DiagnosticSink>,
}

/// A child that accepted the current token.
struct Resolved {
    child: NodeId,
    value: Value,
    ambiguous: bool,
}

impl Registry {
    /// A registry reporting diagnostics through `tracing`.
    pub fn new(config: RegistryConfig) -> Self {
        Self::with_sink(config, Arc::new(TracingDiagnosticSink))
    }

    pub fn with_sink(config: RegistryConfig, sink: Arc<dyn DiagnosticSink>) -> Self {
        let id = config
            .id
            .clone()
            .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
        Self {
            config,
            id,
            roots: RwLock::new(HashMap::new()),
            grants: RwLock::new(HashMap::new()),
            sink,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    /// Level assumed for calls without a principal.
    pub fn get_top_level(&self) -> ExecutionLevel {
        self.config.top_level
    }

    // ========================================================================
    // Registration
    // ========================================================================

    /// Register a root command named `name`, replacing any previous one.
    ///
    /// ```
    /// use opline::{Registry, RegistryConfig};
    ///
    /// let registry = Registry::new(RegistryConfig::default());
    /// registry.register("ping", |ping| {
    ///     ping.implement(|_, _| Ok(Some("pong".into())));
    /// });
    /// assert_eq!(registry.execute("ping", None).unwrap().as_deref(), Some("pong"));
    /// ```
    pub fn register(
        &self,
        name: impl Into<String>,
        build: impl FnOnce(&mut NodeMut<'_>),
    ) -> &Self {
        let name = name.into();
        let mut tree = CommandTree::new(name.clone());
        build(&mut tree.root_mut());

        let previous = self.write_roots().insert(name.clone(), Arc::new(tree));
        if previous.is_some() {
            self.diagnose(Diagnostic::Overwritten { name: name.clone() });
        }

        tracing::info!(registry = %self.id, command = %name, "Command registered");
        self
    }

    /// Remove a root command. Returns whether it existed.
    pub fn unregister(&self, name: &str) -> bool {
        let removed = self.write_roots().remove(name).is_some();
        if removed {
            tracing::info!(registry = %self.id, command = %name, "Command unregistered");
        }
        removed
    }

    /// Modify a registered command in place.
    ///
    /// Calls already dispatched keep the tree they started with; the next
    /// call sees the edit. `f` runs under the registry's write lock and must
    /// not call back into the registry.
    pub fn edit(&self, name: &str, f: impl FnOnce(&mut NodeMut<'_>)) -> bool {
        let mut roots = self.write_roots();
        let Some(tree) = roots.get_mut(name) else {
            return false;
        };
        f(&mut Arc::make_mut(tree).root_mut());
        tracing::debug!(registry = %self.id, command = %name, "Command edited");
        true
    }

    /// Snapshot of one registered command.
    pub fn command(&self, name: &str) -> Option<Arc<CommandTree>> {
        self.read_roots().get(name).cloned()
    }

    /// Snapshot of every registered command, sorted by name.
    pub fn commands(&self) -> Vec<(String, Arc<CommandTree>)> {
        let mut commands: Vec<_> = self
            .read_roots()
            .iter()
            .map(|(name, tree)| (name.clone(), Arc::clone(tree)))
            .collect();
        commands.sort_by(|a, b| a.0.cmp(&b.0));
        commands
    }

    pub fn has_command(&self, name: &str) -> bool {
        self.read_roots().contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.read_roots().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read_roots().is_empty()
    }

    // ========================================================================
    // Execution levels
    // ========================================================================

    /// Grant `level` to `principal`, or revoke its grant with `None`.
    pub fn set_execution_level(
        &self,
        principal: impl Into<PrincipalId>,
        level: Option<ExecutionLevel>,
    ) -> &Self {
        let principal = principal.into();
        let mut grants = self.grants.write().unwrap_or_else(PoisonError::into_inner);
        match level {
            Some(level) => {
                grants.insert(principal, level);
            }
            None => {
                grants.remove(&principal);
            }
        }
        tracing::debug!(registry = %self.id, principal = %principal, level = ?level, "Execution level set");
        self
    }

    /// Granted level; 0 for principals without a grant.
    pub fn get_execution_level(&self, principal: impl Into<PrincipalId>) -> ExecutionLevel {
        let principal = principal.into();
        self.grants
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&principal)
            .copied()
            .unwrap_or(0)
    }

    fn level_for(&self, principal: Option<PrincipalId>) -> ExecutionLevel {
        match principal {
            Some(id) => self.get_execution_level(id),
            None => self.config.top_level,
        }
    }

    // ========================================================================
    // Dispatch
    // ========================================================================

    /// Run one command line.
    ///
    /// `principal` is the interactive caller, or `None` for the system, which
    /// runs at the configured top level.
    pub fn execute(
        &self,
        command_line: &str,
        principal: Option<PrincipalId>,
    ) -> Result<Option<String>, ExecuteError> {
        let executor = Executor::new(
            principal,
            None,
            self.level_for(principal),
            self.config.system_name.as_str(),
        );
        self.dispatch(command_line, executor)
    }

    /// Like [`execute`](Self::execute) for an application identity.
    pub fn execute_as(
        &self,
        command_line: &str,
        identity: &impl Identity,
    ) -> Result<Option<String>, ExecuteError> {
        let principal = identity.principal_id();
        let executor = Executor::new(
            Some(principal),
            identity.display_name().map(str::to_string),
            self.level_for(Some(principal)),
            self.config.system_name.as_str(),
        );
        self.dispatch(command_line, executor)
    }

    /// Async entry point. Dispatch itself never awaits.
    pub async fn execute_async(
        &self,
        command_line: &str,
        principal: Option<PrincipalId>,
    ) -> Result<Option<String>, ExecuteError> {
        self.execute(command_line, principal)
    }

    fn dispatch(
        &self,
        command_line: &str,
        executor: Executor,
    ) -> Result<Option<String>, ExecuteError> {
        let mut stream = TokenStream::from_line(command_line);
        let root_name = stream.get().unwrap_or_default().to_string();
        let tree = self
            .command(&root_name)
            .ok_or_else(|| ExecuteError::no_such_command(root_name.as_str()))?;

        let mut current = tree.root();
        let mut values = vec![Value::String(root_name)];
        let mut warned = false;

        loop {
            stream.advance();
            let Some(token) = stream.get() else { break };

            if tree[current].children().is_empty() {
                return Err(ExecuteError::TooLong {
                    remainder: stream.remaining().join(" "),
                });
            }

            let Some(resolved) = self.resolve_child(&tree, current, token) else {
                return Err(ExecuteError::bad_argument(
                    token,
                    tree.expected_argument_labels(current),
                ));
            };

            if resolved.ambiguous && !warned {
                warned = true;
                self.diagnose(Diagnostic::AmbiguousPriority {
                    command_line: command_line.to_string(),
                    token: token.to_string(),
                });
            }

            current = resolved.child;
            values.push(resolved.value);
        }

        tracing::debug!(
            registry = %self.id,
            command = %tree.path(current).join(" "),
            executor = %executor.name(),
            "Command resolved"
        );

        let Some(execution) = tree[current].execution().cloned() else {
            return Err(ExecuteError::Unimplemented {
                command_line: command_line.to_string(),
            });
        };

        if let Some(permissions) =
            tree.resolve_permissions(current, Permissions::new(current, executor.clone()))
        {
            if !permissions.can_execute() {
                return Err(ExecuteError::BadPermission {
                    message: permissions.denial_message().to_string(),
                });
            }
        }

        let context = CommandContext::new(&tree, current, command_line, executor, self);
        let args = Args::new(values);

        match panic::catch_unwind(AssertUnwindSafe(|| execution(&context, &args))) {
            Ok(Ok(output)) => Ok(output),
            Ok(Err(err)) => Err(ExecuteError::CommandExecution {
                message: format!("{:#}", err),
            }),
            Err(payload) => Err(ExecuteError::CommandExecution {
                message: panic_message(payload.as_ref()),
            }),
        }
    }

    /// First or last child (per policy) accepting `token`.
    fn resolve_child(&self, tree: &CommandTree, parent: NodeId, token: &str) -> Option<Resolved> {
        let mut matches = tree[parent].children().iter().filter_map(|&child| {
            let kind = tree[child].argument();
            let value = kind.transform(token)?;
            match kind.verify(&value) {
                Ok(true) => Some((child, value)),
                Ok(false) => None,
                Err(err) => {
                    tracing::debug!(kind = %kind.label(), error = %err, "Argument verification failed");
                    None
                }
            }
        });

        let (mut child, mut value) = matches.next()?;
        let mut ambiguous = false;
        match self.config.ambiguity {
            AmbiguityPolicy::FirstMatch => ambiguous = matches.next().is_some(),
            AmbiguityPolicy::LastMatch => {
                for later in matches {
                    ambiguous = true;
                    (child, value) = later;
                }
            }
        }

        Some(Resolved {
            child,
            value,
            ambiguous,
        })
    }

    // ========================================================================
    // Completion
    // ========================================================================

    /// Completion candidates for the last, partially typed token.
    ///
    /// A line ending in whitespace completes a new, empty token. Candidates
    /// keep their kind's order, without duplicates or empty entries.
    pub fn suggest(&self, command_line: &str) -> Vec<String> {
        let mut tokens = tokenize(command_line);
        let partial = if command_line.ends_with(char::is_whitespace) {
            String::new()
        } else {
            tokens.pop().unwrap_or_default()
        };

        let candidates: Vec<String> = match tokens.split_first() {
            None => self.read_roots().keys().cloned().collect::<Vec<_>>(),
            Some((root_name, rest)) => {
                let Some(tree) = self.command(root_name) else {
                    return Vec::new();
                };
                let mut current = tree.root();
                for token in rest {
                    match self.resolve_child(&tree, current, token) {
                        Some(resolved) => current = resolved.child,
                        None => return Vec::new(),
                    }
                }
                tree[current]
                    .children()
                    .iter()
                    .flat_map(|&child| tree.suggestions(child, &partial))
                    .collect()
            }
        };

        let mut out: Vec<String> = Vec::new();
        for candidate in candidates {
            if !candidate.is_empty() && candidate.starts_with(&partial) && !out.contains(&candidate) {
                out.push(candidate);
            }
        }
        if tokens.is_empty() {
            out.sort();
        }
        out
    }

    // ========================================================================
    // Internals
    // ========================================================================

    fn read_roots(&self) -> RwLockReadGuard<'_, Roots> {
        self.roots.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_roots(&self) -> RwLockWriteGuard<'_, Roots> {
        self.roots.write().unwrap_or_else(PoisonError::into_inner)
    }

    fn diagnose(&self, diagnostic: Diagnostic) {
        if !self.config.warn_mode {
            return;
        }
        let event = DiagnosticEvent::new(self.id.as_str(), diagnostic);
        if let Err(err) = self.sink.record(event) {
            tracing::debug!(registry = %self.id, error = %err, "Diagnostic dropped");
        }
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new(RegistryConfig::default())
    }
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry")
            .field("id", &self.id)
            .field("config", &self.config)
            .field("commands", &self.len())
            .finish_non_exhaustive()
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "command panicked".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kind::{IntegerKind, StringKind};

    fn registry() -> Registry {
        Registry::new(RegistryConfig::default().with_id("unit"))
    }

    #[test]
    fn test_id_from_config_or_random() {
        assert_eq!(registry().id(), "unit");

        let a = Registry::default();
        let b = Registry::default();
        assert_ne!(a.id(), b.id());
        assert_eq!(a.id().len(), 36);
    }

    #[test]
    fn test_register_and_unregister() {
        let registry = registry();
        registry
            .register("ping", |ping| {
                ping.implement(|_, _| Ok(Some("pong".into())));
            })
            .register("echo", |echo| {
                echo.append_argument(StringKind, |text| {
                    text.implement(|_, args| Ok(Some(args.get::<String>(1)?)));
                });
            });

        assert_eq!(registry.len(), 2);
        let names: Vec<String> = registry.commands().into_iter().map(|(n, _)| n).collect();
        assert_eq!(names, ["echo", "ping"]);

        assert!(registry.unregister("ping"));
        assert!(!registry.unregister("ping"));
        assert!(!registry.has_command("ping"));
    }

    #[test]
    fn test_grants_default_to_zero() {
        let registry = registry();
        assert_eq!(registry.get_execution_level(PrincipalId(4)), 0);

        registry.set_execution_level(PrincipalId(4), Some(7));
        assert_eq!(registry.get_execution_level(PrincipalId(4)), 7);

        registry.set_execution_level(4_u64, None);
        assert_eq!(registry.get_execution_level(4_u64), 0);
    }

    #[test]
    fn test_args_include_root_name() {
        let registry = registry();
        registry.register("add", |add| {
            add.append_argument(IntegerKind, |a| {
                a.append_argument(IntegerKind, |b| {
                    b.implement(|_, args| {
                        let root: String = args.get(0)?;
                        let (a, b): (i64, i64) = (args.get(1)?, args.get(2)?);
                        Ok(Some(format!("{} {}", root, a + b)))
                    });
                });
            });
        });

        assert_eq!(registry.execute("add 2 3", None).unwrap().as_deref(), Some("add 5"));
    }

    #[test]
    fn test_closure_can_reenter_registry() {
        let registry = registry();
        registry
            .register("inner", |inner| {
                inner.implement(|_, _| Ok(Some("inner".into())));
            })
            .register("outer", |outer| {
                outer.implement(|ctx, _| {
                    let inner = ctx.registry().execute("inner", None)?;
                    Ok(inner.map(|s| format!("outer({})", s)))
                });
            });

        assert_eq!(
            registry.execute("outer", None).unwrap().as_deref(),
            Some("outer(inner)")
        );
    }

    #[test]
    fn test_panic_message_extraction() {
        let payload: Box<dyn Any + Send> = Box::new("boom");
        assert_eq!(panic_message(payload.as_ref()), "boom");

        let payload: Box<dyn Any + Send> = Box::new(String::from("owned"));
        assert_eq!(panic_message(payload.as_ref()), "owned");

        let payload: Box<dyn Any + Send> = Box::new(42_u8);
        assert_eq!(panic_message(payload.as_ref()), "command panicked");
    }
}
