//! Tests for the stock `cmds` and `help` commands.

use opline::{ExecuteError, PrincipalId, Registry, RegistryConfig, StringKind};
use opline_builtins::{register_builtins, register_builtins_with, CmdsOptions};

const MODERATOR: PrincipalId = PrincipalId(1);
const GUEST: PrincipalId = PrincipalId(2);

fn populate(registry: &Registry) {
    registry
        .register("ban", |ban| {
            ban.permissions(|p| p.level(5))
                .describe("Ban a player")
                .implement(|_, _| Ok(None));
        })
        .register("kick", |kick| {
            kick.permissions(|p| p.level(1))
                .append_argument(StringKind, |player| {
                    player.implement(|_, _| Ok(None));
                });
        })
        .register("stub", |stub| {
            stub.describe("Not wired up yet");
        });
    registry.set_execution_level(MODERATOR, Some(1));
}

fn registry() -> Registry {
    let registry = Registry::new(RegistryConfig::default().with_id("builtins"));
    register_builtins(&registry);
    populate(&registry);
    registry
}

#[test]
fn test_cmds_lists_everything_for_system() {
    let registry = registry();
    let output = registry.execute("cmds", None).unwrap().unwrap();
    assert_eq!(
        output,
        "ban (5) -- Ban a player\n\
         cmds (0) -- List available commands\n\
         cmds integer (0)\n\
         help (0) -- Show help for a command\n\
         help string (0)\n\
         kick string (1)\n\
         Page 1/1"
    );
}

#[test]
fn test_cmds_hides_unimplemented_and_over_level() {
    let registry = registry();

    let moderator = registry.execute("cmds", Some(MODERATOR)).unwrap().unwrap();
    assert!(!moderator.contains("ban"));
    assert!(moderator.contains("kick string (1)"));
    assert!(!moderator.contains("stub"));

    let guest = registry.execute("cmds", Some(GUEST)).unwrap().unwrap();
    assert!(!guest.contains("kick"));
    assert!(guest.contains("cmds (0)"));
}

#[test]
fn test_cmds_paginates() {
    let registry = Registry::new(RegistryConfig::default());
    register_builtins_with(&registry, CmdsOptions::default().with_commands_per_page(2));
    populate(&registry);

    let second = registry.execute("cmds 2", None).unwrap().unwrap();
    assert_eq!(
        second,
        "cmds integer (0)\nhelp (0) -- Show help for a command\nPage 2/3"
    );

    let last = registry.execute("cmds 3", None).unwrap().unwrap();
    assert!(last.ends_with("Page 3/3"));
}

#[test]
fn test_cmds_page_out_of_range() {
    let registry = registry();
    let err = registry.execute("cmds 9", None).unwrap_err();
    assert_eq!(
        err,
        ExecuteError::CommandExecution {
            message: "Page 9 is out of range (1-1)".into()
        }
    );

    assert!(matches!(
        registry.execute("cmds -1", None),
        Err(ExecuteError::CommandExecution { .. })
    ));
}

#[test]
fn test_cmds_permission_names() {
    let registry = Registry::new(RegistryConfig::default());
    register_builtins_with(
        &registry,
        CmdsOptions::default().with_permission_names(["guest", "moderator"]),
    );
    populate(&registry);

    let output = registry.execute("cmds", None).unwrap().unwrap();
    assert!(output.contains("kick string (moderator)"));
    assert!(output.contains("cmds (guest)"));
    assert!(output.contains("ban (5) -- Ban a player"));
}

#[test]
fn test_custom_help_string() {
    let registry = Registry::new(RegistryConfig::default());
    register_builtins_with(
        &registry,
        CmdsOptions::default().with_help_string(|tree, id, path, _, _| {
            tree[id].is_implemented().then(|| path.to_uppercase())
        }),
    );

    let output = registry.execute("cmds", None).unwrap().unwrap();
    assert_eq!(output, "CMDS\nCMDS INTEGER\nHELP\nHELP STRING\nPage 1/1");
}

#[test]
fn test_help() {
    let registry = registry();
    assert_eq!(registry.execute("help", None).unwrap(), None);
    assert_eq!(
        registry.execute("help kick", Some(MODERATOR)).unwrap().as_deref(),
        Some("kick string (1)")
    );
    assert_eq!(registry.execute("help kick", Some(GUEST)).unwrap(), None);

    let err = registry.execute("help fly", None).unwrap_err();
    assert_eq!(err.to_string(), "Command execution error: No such command: fly");
}
