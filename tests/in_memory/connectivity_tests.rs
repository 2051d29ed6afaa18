//! Probe-driven test results, health overview and alerts.

use super::helpers::{TestContext, context, two_servers};
use rstest::rstest;
use serverdeck::registry::{
    adapters::memory::ScriptedConnectivityProbe,
    domain::{AlertKind, AlertSeverity, ProbeState, ServerId, ServerStatus, TestResult},
    services::{ServerRegistryServiceError, TestRunSummary},
};

fn id_of(context: &TestContext, address: &str) -> ServerId {
    context
        .service
        .registry()
        .iter()
        .find(|record| record.address() == address)
        .map(|record| record.id())
        .expect("record exists")
}

#[rstest]
#[case(120, ServerStatus::Active)]
#[case(299, ServerStatus::Active)]
#[case(300, ServerStatus::Inactive)]
#[case(850, ServerStatus::Inactive)]
#[tokio::test(flavor = "multi_thread")]
async fn test_server_classifies_by_response_time(
    mut two_servers: TestContext,
    #[case] millis: u32,
    #[case] expected: ServerStatus,
) {
    let probe = ScriptedConnectivityProbe::new(TestResult::new(millis));
    let id = id_of(&two_servers, "http://x");

    let tested = two_servers
        .service
        .test_server(&probe, id)
        .await
        .expect("test should succeed")
        .expect("record still exists");

    assert_eq!(tested.status(), expected);
    assert_eq!(tested.response_time(), Some(millis));
    assert!(tested.last_tested().is_some());
    assert_ne!(tested.probe_state(), ProbeState::Untested);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn unreachable_server_surfaces_probe_error(mut two_servers: TestContext) {
    let probe = ScriptedConnectivityProbe::new(TestResult::new(80));
    probe.set_unreachable("http://y").expect("script probe");
    let id = id_of(&two_servers, "http://y");
    let before = two_servers.service.registry().clone();

    let result = two_servers.service.test_server(&probe, id).await;

    assert!(matches!(
        result,
        Err(ServerRegistryServiceError::Probe(_))
    ));
    assert_eq!(two_servers.service.registry(), &before);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn test_all_skips_failed_probes(mut two_servers: TestContext) {
    let probe = ScriptedConnectivityProbe::new(TestResult::new(80));
    probe.set_unreachable("http://y").expect("script probe");

    let summary = two_servers
        .service
        .test_all(&probe)
        .await
        .expect("sweep should succeed");

    assert_eq!(
        summary,
        TestRunSummary {
            tested: 1,
            failed: 1
        }
    );
    let tested = two_servers
        .service
        .get(id_of(&two_servers, "http://x"))
        .expect("record exists");
    let skipped = two_servers
        .service
        .get(id_of(&two_servers, "http://y"))
        .expect("record exists");
    assert_eq!(tested.response_time(), Some(80));
    assert!(skipped.last_tested().is_none());
}

#[rstest]
fn result_for_deleted_server_is_discarded(mut two_servers: TestContext) {
    let id = id_of(&two_servers, "http://x");
    two_servers.service.delete(id).expect("delete");
    let before = two_servers.service.registry().clone();

    let applied = two_servers
        .service
        .apply_test_result(id, TestResult::new(50))
        .expect("discarding is not an error");

    assert!(applied.is_none());
    assert_eq!(two_servers.service.registry(), &before);
}

#[rstest]
fn uptime_from_result_is_applied(mut two_servers: TestContext) {
    let id = id_of(&two_servers, "http://x");
    let result = TestResult::new(90)
        .with_uptime(87.5)
        .expect("uptime in range");

    let record = two_servers
        .service
        .apply_test_result(id, result)
        .expect("apply")
        .expect("record exists");

    assert!((record.uptime() - 87.5).abs() < f64::EPSILON);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn alerts_and_overview_follow_results(mut context: TestContext) {
    let fast = context.add("Fast", "http://fast");
    let slow = context.add("Slow", "http://slow");
    let probe = ScriptedConnectivityProbe::new(TestResult::new(100));
    probe
        .set_result(
            "http://slow",
            TestResult::new(700).with_uptime(72.0).expect("uptime in range"),
        )
        .expect("script probe");

    context.service.test_all(&probe).await.expect("sweep");

    let overview = context.service.health_overview();
    assert_eq!(overview.online, 1);
    assert_eq!(overview.offline, 1);
    assert_eq!(overview.average_response_ms, Some(400.0));

    let alerts = context.service.alerts();
    let raised: Vec<_> = alerts
        .iter()
        .map(|alert| (alert.kind, alert.severity, alert.server_id))
        .collect();
    assert_eq!(
        raised,
        vec![
            (AlertKind::HighResponseTime, AlertSeverity::Warning, Some(slow)),
            (AlertKind::Offline, AlertSeverity::Critical, Some(slow)),
            (AlertKind::LowUptime, AlertSeverity::Warning, Some(slow)),
        ]
    );
    assert!(alerts.iter().all(|alert| alert.server_id != Some(fast)));
}

#[rstest]
fn healthy_registry_reports_all_systems_normal(two_servers: TestContext) {
    let alerts = two_servers.service.alerts();

    assert_eq!(alerts.len(), 1);
    assert_eq!(
        alerts.first().map(|alert| alert.kind),
        Some(AlertKind::AllSystemsNormal)
    );
}
