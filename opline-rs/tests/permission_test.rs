//! Integration tests for execution levels and inherited permission rules

use opline::permission::DEFAULT_DENIAL_MESSAGE;
use opline::{
    ErrorCategory, ExecuteError, IntegerKind, Principal, PrincipalId, Registry, RegistryConfig,
    StringKind,
};

const ADMIN: PrincipalId = PrincipalId(100);
const MODERATOR: PrincipalId = PrincipalId(50);
const STRANGER: PrincipalId = PrincipalId(999);

fn registry(top_level: u32) -> Registry {
    let registry = Registry::new(RegistryConfig::default().with_top_level(top_level));
    registry
        .register("ban", |ban| {
            ban.permissions(|p| p.level(5))
                .implement(|_, _| Ok(Some("banned".into())))
                .append_argument(StringKind, |player| {
                    player.implement(|_, args| Ok(Some(format!("banned {}", args.get::<String>(1)?))));
                })
                .append_literal("list", |list| {
                    list.permissions(|p| p.level(0))
                        .implement(|_, _| Ok(Some("nobody".into())));
                });
        })
        .register("shutdown", |shutdown| {
            shutdown
                .permissions(|p| p.level(10).msg("Only the owner can shut down."))
                .implement(|_, _| Ok(Some("bye".into())));
        })
        .register("level", |level| {
            level.implement(|ctx, _| Ok(Some(ctx.executor().level().to_string())));
        });
    registry
        .set_execution_level(ADMIN, Some(10))
        .set_execution_level(MODERATOR, Some(5));
    registry
}

#[test]
fn test_unknown_principal_has_level_zero() {
    let registry = registry(10);
    assert_eq!(registry.get_execution_level(STRANGER), 0);

    let err = registry.execute("ban", Some(STRANGER)).unwrap_err();
    assert_eq!(
        err,
        ExecuteError::BadPermission {
            message: DEFAULT_DENIAL_MESSAGE.into()
        }
    );
    assert_eq!(err.category(), ErrorCategory::Gating);
    assert_eq!(registry.execute("level", Some(STRANGER)).unwrap().as_deref(), Some("0"));
}

#[test]
fn test_absent_principal_uses_top_level() {
    let restricted = registry(3);
    let trusted = registry(10);
    assert_eq!(trusted.get_top_level(), 10);
    assert_eq!(trusted.execute("ban", None).unwrap().as_deref(), Some("banned"));
    assert_eq!(trusted.execute("level", None).unwrap().as_deref(), Some("10"));

    assert!(matches!(
        restricted.execute("ban", None),
        Err(ExecuteError::BadPermission { .. })
    ));
}

#[test]
fn test_default_top_level_allows_everything() {
    let registry = Registry::default();
    registry.register("nuke", |nuke| {
        nuke.permissions(|p| p.level(u32::MAX - 1))
            .implement(|_, _| Ok(None));
    });
    assert_eq!(registry.execute("nuke", None), Ok(None));
}

#[test]
fn test_custom_denial_message() {
    let registry = registry(10);
    assert_eq!(
        registry.execute("shutdown", Some(MODERATOR)).unwrap_err().to_string(),
        "Only the owner can shut down."
    );
    assert_eq!(registry.execute("shutdown", Some(ADMIN)).unwrap().as_deref(), Some("bye"));
}

#[test]
fn test_descendant_inherits_nearest_rule() {
    let registry = registry(10);
    assert!(registry.execute("ban bob", Some(STRANGER)).is_err());
    assert_eq!(
        registry.execute("ban bob", Some(MODERATOR)).unwrap().as_deref(),
        Some("banned bob")
    );
}

#[test]
fn test_own_rule_replaces_ancestor_rule() {
    let registry = registry(10);
    // "list" has its own level-0 rule; the level-5 rule on "ban" does not apply.
    assert_eq!(
        registry.execute("ban list", Some(STRANGER)).unwrap().as_deref(),
        Some("nobody")
    );
}

#[test]
fn test_ancestor_rule_edit_applies_on_next_call() {
    let registry = registry(10);
    assert!(registry.execute("ban bob", Some(MODERATOR)).is_ok());

    registry.edit("ban", |ban| {
        ban.permissions(|p| p.level(8).msg("Raised."));
    });

    assert_eq!(
        registry.execute("ban bob", Some(MODERATOR)).unwrap_err().to_string(),
        "Raised."
    );
    assert!(registry.execute("ban bob", Some(ADMIN)).is_ok());
    assert!(registry.execute("ban list", Some(MODERATOR)).is_ok());

    registry.edit("ban", |ban| {
        ban.clear_permissions();
    });
    assert!(registry.execute("ban bob", Some(STRANGER)).is_ok());
}

#[test]
fn test_grant_changes_apply_immediately() {
    let registry = registry(10);
    assert!(registry.execute("ban", Some(STRANGER)).is_err());

    registry.set_execution_level(STRANGER, Some(5));
    assert!(registry.execute("ban", Some(STRANGER)).is_ok());

    registry.set_execution_level(STRANGER, None);
    assert!(registry.execute("ban", Some(STRANGER)).is_err());
}

#[test]
fn test_execute_as_uses_principal_grant() {
    let registry = registry(10);
    let moderator = Principal::new(MODERATOR).with_name("mia");
    assert_eq!(registry.execute_as("level", &moderator).unwrap().as_deref(), Some("5"));
    assert!(registry.execute_as("shutdown", &moderator).is_err());
    assert!(registry.execute_as("shutdown", &ADMIN).is_ok());
}

#[test]
fn test_closure_can_change_grants() {
    let registry = registry(10);
    registry.register("promote", |promote| {
        promote.append_argument(IntegerKind, |id| {
            id.implement(|ctx, args| {
                let id = u64::try_from(args.get::<i64>(1)?)?;
                ctx.registry().set_execution_level(id, Some(5));
                Ok(None)
            });
        });
    });

    registry.execute("promote 999", None).unwrap();
    assert_eq!(registry.get_execution_level(STRANGER), 5);
}
