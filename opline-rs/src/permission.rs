//! Execution levels and permission rules.
//!
//! A node may carry a rule, a pure function from [`Permissions`] to
//! [`Permissions`]. At dispatch time the registry takes the nearest rule on
//! the path from the resolved node up to the root (the node itself first) and
//! applies it to a fresh `Permissions`. Exactly one rule applies; rules on
//! different levels are never merged.
//!
//! Rules are looked up on every call, so replacing an ancestor's rule affects
//! all descendants without their own rule on the next dispatch.
//!
//! ```
//! use opline::permission::Permissions;
//!
//! let rule = |p: Permissions| p.level(5).msg("Moderators only.");
//! # let _ = rule;
//! ```

use std::fmt;
use std::sync::Arc;

use crate::context::Executor;
use crate::tree::NodeId;

/// Integer privilege tier.
pub type ExecutionLevel = u32;

/// Message used when a rule does not set its own.
pub const DEFAULT_DENIAL_MESSAGE: &str = "You do not have permission to execute that command.";

/// Stored permission rule.
pub type PermissionRule = Arc<dyn Fn(Permissions) -> Permissions + Send + Sync>;

/// Privilege requirement for one invocation.
///
/// Bound to the resolved command and the executor of the current call.
#[derive(Clone)]
pub struct Permissions {
    command: NodeId,
    executor: Executor,
    required_level: ExecutionLevel,
    denial_message: String,
}

impl Permissions {
    pub fn new(command: NodeId, executor: Executor) -> Self {
        Self {
            command,
            executor,
            required_level: 0,
            denial_message: DEFAULT_DENIAL_MESSAGE.to_string(),
        }
    }

    /// Require at least `level`.
    pub fn level(mut self, level: ExecutionLevel) -> Self {
        self.required_level = level;
        self
    }

    /// Message reported on denial.
    pub fn msg(mut self, message: impl Into<String>) -> Self {
        self.denial_message = message.into();
        self
    }

    pub fn required_level(&self) -> ExecutionLevel {
        self.required_level
    }

    pub fn denial_message(&self) -> &str {
        &self.denial_message
    }

    /// The command this requirement was resolved for.
    pub fn command(&self) -> NodeId {
        self.command
    }

    pub fn executor(&self) -> &Executor {
        &self.executor
    }

    pub fn can_execute(&self) -> bool {
        self.executor.level() >= self.required_level
    }
}

impl fmt::Debug for Permissions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Permissions")
            .field("command", &self.command)
            .field("executor", &self.executor.name())
            .field("required_level", &self.required_level)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::PrincipalId;

    fn executor(level: ExecutionLevel) -> Executor {
        Executor::new(Some(PrincipalId(7)), None, level, "@system")
    }

    #[test]
    fn test_defaults() {
        let p = Permissions::new(NodeId::ROOT, executor(0));
        assert_eq!(p.required_level(), 0);
        assert_eq!(p.denial_message(), DEFAULT_DENIAL_MESSAGE);
        assert!(p.can_execute());
    }

    #[test]
    fn test_level_gate() {
        let p = Permissions::new(NodeId::ROOT, executor(4)).level(5);
        assert!(!p.can_execute());

        let p = Permissions::new(NodeId::ROOT, executor(5)).level(5);
        assert!(p.can_execute());
    }

    #[test]
    fn test_custom_message() {
        let p = Permissions::new(NodeId::ROOT, executor(0))
            .level(1)
            .msg("Admins only");
        assert_eq!(p.denial_message(), "Admins only");
    }
}
