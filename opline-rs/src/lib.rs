//! # opline: single-line admin command dispatch
//!
//! An operator types one line; the registry tokenizes it, walks a tree of
//! typed argument positions, checks the caller's execution level against the
//! nearest permission rule, and runs the matched command.
//!
//! ## Core Principles
//!
//! - **Typed arguments**: every position is a [`Kind`] that decodes and validates its token
//! - **Inherited permissions**: the nearest rule on the path to the root applies, looked up per call
//! - **Explicit configuration**: each [`Registry`] is built from a [`RegistryConfig`], no globals
//! - **Fail fast**: a line either runs exactly one command or returns an [`ExecuteError`]
//!
//! ## Quick Start
//!
//! ```rust
//! use opline::{IntegerKind, PrincipalId, Registry, RegistryConfig, StringKind};
//!
//! let registry = Registry::new(RegistryConfig::default().with_id("server"));
//!
//! registry.register("kick", |kick| {
//!     kick.permissions(|p| p.level(5).msg("Moderators only."))
//!         .describe("Remove a player")
//!         .append_argument(StringKind, |player| {
//!             player.implement(|ctx, args| {
//!                 let player: String = args.get(1)?;
//!                 Ok(Some(format!("{} kicked {}", ctx.executor().name(), player)))
//!             });
//!         });
//! });
//! registry.register("wait", |wait| {
//!     wait.append_argument(IntegerKind, |secs| {
//!         secs.implement(|_, args| Ok(Some(format!("{}s", args.get::<i64>(1)?))));
//!     });
//! });
//!
//! let moderator = PrincipalId(7);
//! registry.set_execution_level(moderator, Some(5));
//!
//! assert_eq!(
//!     registry.execute("kick bob", Some(moderator)).unwrap().as_deref(),
//!     Some("7 kicked bob")
//! );
//! assert_eq!(
//!     registry.execute("kick bob", Some(PrincipalId(8))).unwrap_err().to_string(),
//!     "Moderators only."
//! );
//! assert_eq!(
//!     registry.execute("wait soon", None).unwrap_err().to_string(),
//!     "Invalid argument 'soon', expected (integer)"
//! );
//! ```

pub mod config;
pub mod context;
pub mod diagnostics;
pub mod error;
pub mod identity;
pub mod kind;
pub mod permission;
pub mod registry;
pub mod tokenizer;
pub mod tracing_support;
pub mod tree;

// Re-export tracing itself (required for #[instrument] macro)
pub use tracing_support::tracing;

#[cfg(feature = "tracing")]
pub use tracing_support::{
    init_subscriber, init_subscriber_with_config, try_init_subscriber_with_config, TracingConfig,
    TracingFormat,
};

pub use config::{AmbiguityPolicy, ConfigError, RegistryConfig};
pub use context::{ArgError, Args, CommandContext, Executor};
pub use diagnostics::{
    Diagnostic, DiagnosticEvent, DiagnosticKind, DiagnosticSink, MemoryDiagnosticSink,
    TracingDiagnosticSink,
};
pub use error::{ErrorCategory, ExecuteError};
pub use identity::{Identity, Principal, PrincipalId};
pub use kind::{
    BooleanKind, FromValue, IntegerKind, Kind, KindError, LiteralKind, LiteralUnionKind,
    NumberKind, StringKind, Value,
};
pub use permission::{ExecutionLevel, Permissions};
pub use registry::Registry;
pub use tokenizer::{split_string, tokenize, Separator, TokenStream};
pub use tree::{CommandNode, CommandTree, NodeId, NodeMut, Outcome};

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_send_sync<T: Send + Sync>() {}

    #[test]
    fn test_registry_is_send_sync() {
        assert_send_sync::<Registry>();
        assert_send_sync::<CommandTree>();
    }

    #[test]
    fn test_reexports_cover_dispatch() {
        let registry = Registry::new(RegistryConfig::default().with_warn_mode(false));
        registry.register("flag", |flag| {
            flag.append_argument(BooleanKind, |value| {
                value.implement(|_, args| Ok(Some(args.get::<bool>(1)?.to_string())));
            });
        });

        assert_eq!(registry.execute("flag on", None).unwrap().as_deref(), Some("true"));
        assert_eq!(
            registry.execute("flag maybe", None).unwrap_err().category(),
            ErrorCategory::Syntax
        );
    }
}
