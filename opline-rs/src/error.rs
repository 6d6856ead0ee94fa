//! Dispatch errors.
//!
//! Every failure aborts the call before any state changes persist. The
//! [`ErrorCategory`] tells callers how far dispatch got.

use thiserror::Error;

/// How far dispatch got before failing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// The line did not resolve to a command; nothing ran.
    Syntax,

    /// The line resolved, but the command may not run.
    Gating,

    /// The command ran and failed.
    Runtime,
}

/// Errors returned by [`Registry::execute`](crate::Registry::execute)
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExecuteError {
    #[error("No such command: {command}")]
    NoSuchCommand { command: String },

    #[error("Too many arguments: {remainder}")]
    TooLong { remainder: String },

    #[error("Invalid argument '{token}', expected {expected}")]
    BadArgument { token: String, expected: String },

    #[error("Command is not implemented: {command_line}")]
    Unimplemented { command_line: String },

    #[error("{message}")]
    BadPermission { message: String },

    #[error("Command execution error: {message}")]
    CommandExecution { message: String },
}

impl ExecuteError {
    pub fn no_such_command(command: impl Into<String>) -> Self {
        Self::NoSuchCommand {
            command: command.into(),
        }
    }

    pub fn bad_argument(token: impl Into<String>, expected: impl Into<String>) -> Self {
        Self::BadArgument {
            token: token.into(),
            expected: expected.into(),
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::NoSuchCommand { .. } | Self::TooLong { .. } | Self::BadArgument { .. } => {
                ErrorCategory::Syntax
            }
            Self::Unimplemented { .. } | Self::BadPermission { .. } => ErrorCategory::Gating,
            Self::CommandExecution { .. } => ErrorCategory::Runtime,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages() {
        assert_eq!(
            ExecuteError::no_such_command("fly").to_string(),
            "No such command: fly"
        );
        assert_eq!(
            ExecuteError::bad_argument("x", "(number)").to_string(),
            "Invalid argument 'x', expected (number)"
        );
        assert_eq!(
            ExecuteError::BadPermission {
                message: "Nope.".into()
            }
            .to_string(),
            "Nope."
        );
    }

    #[test]
    fn test_categories() {
        let syntax = ExecuteError::TooLong {
            remainder: "a b".into(),
        };
        assert_eq!(syntax.category(), ErrorCategory::Syntax);

        let gating = ExecuteError::Unimplemented {
            command_line: "kick".into(),
        };
        assert_eq!(gating.category(), ErrorCategory::Gating);

        let runtime = ExecuteError::CommandExecution {
            message: "boom".into(),
        };
        assert_eq!(runtime.category(), ErrorCategory::Runtime);
    }
}
