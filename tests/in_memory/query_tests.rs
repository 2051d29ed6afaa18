//! View queries and bulk selection against a live registry.

use super::helpers::{TestContext, context, two_servers};
use chrono::Duration;
use rstest::rstest;
use serverdeck::registry::{
    domain::{BulkSelection, CategoryFilter, ServerId, ServerQuery, ServerRecord, SortKey},
    services::AddServerRequest,
};

fn names(view: &[&ServerRecord]) -> Vec<String> {
    view.iter().map(|record| record.name().to_owned()).collect()
}

#[rstest]
fn recent_filter_excludes_unopened_and_stale_records(mut context: TestContext) {
    let stale = context.add("Stale", "http://stale");
    let fresh = context.add("Fresh", "http://fresh");
    context.add("Never", "http://never");

    context.service.record_usage(stale).expect("usage");
    context.clock.advance(Duration::days(8));
    context.service.record_usage(fresh).expect("usage");

    let view = context
        .service
        .query(&ServerQuery::new().with_filter(CategoryFilter::Recent));

    assert_eq!(names(&view), vec!["Fresh".to_owned()]);
    assert_eq!(context.service.stats().recent, 1);
}

#[rstest]
fn manual_sort_matches_collection_order(mut two_servers: TestContext) {
    let third = two_servers.add("C", "http://z");
    two_servers.service.move_up(third).expect("move");

    let view = two_servers.service.query(&ServerQuery::new());
    let collection: Vec<String> = two_servers
        .service
        .registry()
        .iter()
        .map(|record| record.name().to_owned())
        .collect();

    assert_eq!(names(&view), collection);
}

#[rstest]
fn queries_never_mutate_the_registry(mut two_servers: TestContext) {
    two_servers.add("alpha", "http://alpha");
    let before = two_servers.service.registry().clone();

    for sort in [
        SortKey::Name,
        SortKey::Recent,
        SortKey::Usage,
        SortKey::Response,
    ] {
        let _view = two_servers
            .service
            .query(&ServerQuery::new().with_sort(sort).with_search("a"));
    }

    assert_eq!(two_servers.service.registry(), &before);
}

#[rstest]
fn tag_filter_and_search_compose(mut context: TestContext) {
    for (name, address, tag) in [
        ("Live Cricket", "http://cricket", "live"),
        ("Live Football", "http://football", "live"),
        ("Movie Night", "http://movies", "movies"),
    ] {
        context
            .service
            .add(AddServerRequest::new(name, address).with_tag(tag), false)
            .expect("add");
    }

    let view = context.service.query(
        &ServerQuery::new()
            .with_filter(CategoryFilter::parse("live"))
            .with_search("FOOT"),
    );

    assert_eq!(names(&view), vec!["Live Football".to_owned()]);
}

#[rstest]
fn selection_survives_filters_and_drops_deleted_ids(mut two_servers: TestContext) {
    let ids: Vec<ServerId> = two_servers
        .service
        .registry()
        .iter()
        .map(|record| record.id())
        .collect();
    let mut bulk = BulkSelection::new();
    bulk.enter();
    for id in &ids {
        assert!(bulk.selection_mut().toggle(*id));
    }

    let favorites_only = two_servers
        .service
        .query(&ServerQuery::new().with_filter(CategoryFilter::Favorites));
    assert!(favorites_only.is_empty());
    assert_eq!(bulk.selection().len(), 2);

    let first = *ids.first().expect("two ids");
    two_servers.service.delete(first).expect("delete");
    bulk.selection_mut()
        .retain_existing(two_servers.service.registry());
    assert!(!bulk.selection().contains(first));
    assert_eq!(bulk.selection().len(), 1);

    bulk.exit();
    assert!(bulk.selection().is_empty());
    assert!(!bulk.is_active());
}
