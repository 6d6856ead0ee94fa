//! Stock commands for an [`opline`] registry.
//!
//! - `cmds [page]` lists every command the caller may run, paginated
//! - `help [command]` shows one command's subcommands
//!
//! ```
//! use opline::{Registry, RegistryConfig};
//!
//! let registry = Registry::new(RegistryConfig::default());
//! opline_builtins::register_builtins(&registry);
//! assert!(registry.has_command("cmds"));
//! assert!(registry.has_command("help"));
//! ```

pub mod commands;
pub mod pages;

pub use commands::{
    cmds_command, default_help_string, help_command, help_strings, register_builtins,
    register_builtins_with, CmdsOptions, HelpStringFn,
};
pub use pages::{paginate, Page, PageError};
