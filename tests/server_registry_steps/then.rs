//! Then steps for server registry BDD scenarios.

use super::world::RegistryWorld;
use rstest_bdd_macros::then;
use serverdeck::registry::{
    domain::{AlertKind, ServerStatus},
    services::ServerRegistryServiceError,
};

#[then("the add fails with a duplicate address error")]
fn add_fails_with_duplicate_address(world: &RegistryWorld) -> Result<(), eyre::Report> {
    let result = world
        .last_add_result
        .as_ref()
        .ok_or_else(|| eyre::eyre!("missing add result in scenario world"))?;
    if !matches!(result, Err(ServerRegistryServiceError::DuplicateAddress(_))) {
        return Err(eyre::eyre!("expected duplicate address error, got {result:?}"));
    }
    Ok(())
}

#[then("the registry holds {count:usize} servers")]
fn registry_holds(world: &RegistryWorld, count: usize) -> Result<(), eyre::Report> {
    let held = world.service.registry().len();
    if held != count {
        return Err(eyre::eyre!("expected {count} servers, found {held}"));
    }
    Ok(())
}

#[then(r#"server "{name}" has rank {rank:u32}"#)]
fn server_has_rank(world: &RegistryWorld, name: String, rank: u32) -> Result<(), eyre::Report> {
    let actual = world.record_named(&name)?.rank();
    if actual != rank {
        return Err(eyre::eyre!("expected '{name}' at rank {rank}, found {actual}"));
    }
    Ok(())
}

#[then(r#"no server is named "{name}""#)]
fn no_server_named(world: &RegistryWorld, name: String) -> Result<(), eyre::Report> {
    if world.record_named(&name).is_ok() {
        return Err(eyre::eyre!("expected no server named '{name}'"));
    }
    Ok(())
}

#[then(r#"server "{name}" is active"#)]
fn server_is_active(world: &RegistryWorld, name: String) -> Result<(), eyre::Report> {
    expect_status(world, &name, ServerStatus::Active)
}

#[then(r#"server "{name}" is inactive"#)]
fn server_is_inactive(world: &RegistryWorld, name: String) -> Result<(), eyre::Report> {
    expect_status(world, &name, ServerStatus::Inactive)
}

#[then(r#"an offline alert is raised for "{name}""#)]
fn offline_alert_raised(world: &RegistryWorld, name: String) -> Result<(), eyre::Report> {
    let id = world.id_named(&name)?;
    let raised = world
        .service
        .alerts()
        .iter()
        .any(|alert| alert.kind == AlertKind::Offline && alert.server_id == Some(id));
    if !raised {
        return Err(eyre::eyre!("expected an offline alert for '{name}'"));
    }
    Ok(())
}

fn expect_status(
    world: &RegistryWorld,
    name: &str,
    expected: ServerStatus,
) -> Result<(), eyre::Report> {
    let actual = world.record_named(name)?.status();
    if actual != expected {
        return Err(eyre::eyre!("expected '{name}' to be {expected}, found {actual}"));
    }
    Ok(())
}
