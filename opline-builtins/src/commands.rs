//! `cmds` and `help`.

use std::fmt;
use std::sync::Arc;

use opline::{
    CommandContext, CommandTree, Executor, IntegerKind, NodeId, NodeMut, Outcome, Permissions,
    Registry, StringKind,
};

use crate::pages::paginate;

/// Renders the listing line for one node, or `None` to hide it.
///
/// Arguments: the tree, the node, its space-joined path, the executor, and
/// the configured permission names.
pub type HelpStringFn = Arc<
    dyn Fn(&CommandTree, NodeId, &str, &Executor, Option<&[String]>) -> Option<String>
        + Send
        + Sync,
>;

/// Settings for [`cmds_command`].
#[derive(Clone)]
pub struct CmdsOptions {
    pub commands_per_page: usize,

    /// Display names for execution levels, indexed by level.
    pub permission_names: Option<Vec<String>>,

    pub help_string: HelpStringFn,
}

impl Default for CmdsOptions {
    fn default() -> Self {
        Self {
            commands_per_page: 10,
            permission_names: None,
            help_string: Arc::new(default_help_string),
        }
    }
}

impl CmdsOptions {
    pub fn with_commands_per_page(mut self, count: usize) -> Self {
        self.commands_per_page = count;
        self
    }

    pub fn with_permission_names<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.permission_names = Some(names.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_help_string(
        mut self,
        f: impl Fn(&CommandTree, NodeId, &str, &Executor, Option<&[String]>) -> Option<String>
            + Send
            + Sync
            + 'static,
    ) -> Self {
        self.help_string = Arc::new(f);
        self
    }
}

impl fmt::Debug for CmdsOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CmdsOptions")
            .field("commands_per_page", &self.commands_per_page)
            .field("permission_names", &self.permission_names)
            .finish_non_exhaustive()
    }
}

/// `path (level) -- description`.
///
/// Hides nodes without an implementation and nodes whose resolved rule asks
/// for more than the executor's level. The level is shown by name when
/// `permission_names` has an entry for it.
pub fn default_help_string(
    tree: &CommandTree,
    id: NodeId,
    path: &str,
    executor: &Executor,
    permission_names: Option<&[String]>,
) -> Option<String> {
    let node = tree.get(id)?;
    if !node.is_implemented() {
        return None;
    }

    let level = tree
        .resolve_permissions(id, Permissions::new(id, executor.clone()))
        .map(|p| p.required_level())
        .unwrap_or(0);
    if executor.level() < level {
        return None;
    }

    let level_name = permission_names
        .and_then(|names| names.get(level as usize))
        .cloned()
        .unwrap_or_else(|| level.to_string());

    let mut line = format!("{} ({})", path, level_name);
    if let Some(description) = node.description() {
        line.push_str(" -- ");
        line.push_str(description);
    }
    Some(line)
}

/// Listing lines for every node of `tree` visible to `executor`, pre-order.
pub fn help_strings(tree: &CommandTree, executor: &Executor, options: &CmdsOptions) -> Vec<String> {
    tree.descendants(tree.root())
        .into_iter()
        .filter_map(|id| {
            let path = tree.path(id).join(" ");
            (options.help_string)(tree, id, &path, executor, options.permission_names.as_deref())
        })
        .filter(|line| !line.is_empty())
        .collect()
}

fn list_commands(ctx: &CommandContext<'_>, options: &CmdsOptions, page: usize) -> Outcome {
    let lines: Vec<String> = ctx
        .registry()
        .commands()
        .iter()
        .flat_map(|(_, tree)| help_strings(tree, ctx.executor(), options))
        .collect();

    let page = paginate(&lines, options.commands_per_page, page)?;
    tracing::debug!(
        executor = %ctx.executor().name(),
        page = page.number,
        total = page.total,
        "Listing commands"
    );
    Ok(Some(page.to_string()))
}

/// Build closure for `cmds` and `cmds <page>`.
///
/// ```
/// use opline::{Registry, RegistryConfig};
/// use opline_builtins::{cmds_command, CmdsOptions};
///
/// let registry = Registry::new(RegistryConfig::default());
/// registry.register("cmds", cmds_command(CmdsOptions::default().with_commands_per_page(1)));
///
/// assert_eq!(
///     registry.execute("cmds 2", None).unwrap().as_deref(),
///     Some("cmds integer (0)\nPage 2/2")
/// );
/// ```
pub fn cmds_command(options: CmdsOptions) -> impl FnOnce(&mut NodeMut<'_>) {
    let options = Arc::new(options);
    move |cmds| {
        let first_page = Arc::clone(&options);
        cmds.describe("List available commands")
            .implement(move |ctx, _| list_commands(ctx, &first_page, 1))
            .append_argument(IntegerKind, move |page| {
                page.implement(move |ctx, args| {
                    let number = usize::try_from(args.get::<i64>(1)?).unwrap_or(0);
                    list_commands(ctx, &options, number)
                });
            });
    }
}

/// Build closure for `help` and `help <command>`.
///
/// Bare `help` produces no output; `help <command>` lists that command's
/// visible subcommands.
pub fn help_command() -> impl FnOnce(&mut NodeMut<'_>) {
    |help| {
        help.describe("Show help for a command")
            .implement(|_, _| Ok(None))
            .append_argument(StringKind, |topic| {
                topic.implement(|ctx, args| {
                    let name: String = args.get(1)?;
                    let Some(tree) = ctx.registry().command(&name) else {
                        anyhow::bail!("No such command: {}", name);
                    };
                    let lines = help_strings(&tree, ctx.executor(), &CmdsOptions::default());
                    Ok((!lines.is_empty()).then(|| lines.join("\n")))
                });
            });
    }
}

/// Register `cmds` (default options) and `help`.
pub fn register_builtins(registry: &Registry) -> &Registry {
    register_builtins_with(registry, CmdsOptions::default())
}

pub fn register_builtins_with(registry: &Registry, options: CmdsOptions) -> &Registry {
    registry
        .register("cmds", cmds_command(options))
        .register("help", help_command())
}
