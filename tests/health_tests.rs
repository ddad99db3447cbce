//! Integration tests for client health metrics over stored collections.

use chrono::{DateTime, Duration, TimeZone, Utc};
use engagement_tracker::analytics::{
    Cadence, ClientMetrics, Momentum, RedFlag, SortKey, compute_client_metrics,
    compute_user_metrics, health_score, sort_metrics,
};
use engagement_tracker::db::Database;
use engagement_tracker::interchange::import_collection;
use engagement_tracker::store::Store;
use engagement_tracker::types::{CollectionName, to_iso};
use serde_json::{Value, json};

fn setup_db() -> Store<Database> {
    let db = Database::open_in_memory().expect("Failed to create in-memory database");
    Store::new(db)
}

fn fixed_now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 6, 15, 12, 0, 0).unwrap()
}

fn days_ago(days: i64) -> String {
    to_iso(fixed_now() - Duration::days(days))
}

fn tasks(total: usize, finished: usize) -> Vec<Value> {
    (0..total)
        .map(|i| {
            let status = if i < finished { "Finished" } else { "In Progress" };
            json!({ "title": format!("Task {}", i), "status": status })
        })
        .collect()
}

fn import(store: &Store<Database>, name: CollectionName, doc: Value) {
    import_collection(store, name, &doc.to_string()).expect("import failed");
}

fn metrics_for(store: &Store<Database>) -> Vec<ClientMetrics> {
    compute_client_metrics(
        &store.clients(),
        &store.engagements(),
        &store.interactions(),
        fixed_now(),
    )
}

#[test]
fn worked_example_healthy_client() {
    let store = setup_db();
    import(
        &store,
        CollectionName::Engagements,
        json!([
            { "name": "Audit", "clientName": "Acme", "createdAt": days_ago(5), "tasks": tasks(5, 4) },
            { "name": "Rollout", "clientName": "Acme", "createdAt": days_ago(10), "tasks": tasks(5, 4) },
        ]),
    );
    import(
        &store,
        CollectionName::ClientInteractions,
        json!([
            { "clientName": "Acme", "contactPerson": "Jo", "date": days_ago(2), "status": "Completed" },
            { "clientName": "Acme", "contactPerson": "Jo", "date": days_ago(9), "status": "Completed" },
            { "clientName": "Acme", "contactPerson": "Jo", "date": days_ago(20), "status": "Done" },
            { "clientName": "Acme", "contactPerson": "Jo", "date": days_ago(40), "status": "Pending" },
        ]),
    );

    let metrics = metrics_for(&store);
    assert_eq!(metrics.len(), 1);
    let acme = &metrics[0];
    assert_eq!(acme.total_tasks, 10);
    assert_eq!(acme.completed_tasks, 8);
    assert_eq!(acme.task_completion_rate, 80.0);
    assert_eq!(acme.engagement_activity, 30);
    assert_eq!(acme.interaction_frequency, 20);
    assert_eq!(acme.stalled_penalty, 10);
    assert_eq!(acme.cancelled_penalty, 10);
    assert_eq!(acme.health_score, 78);
    assert_eq!(acme.engagement_momentum, Momentum::High);
    assert_eq!(acme.interaction_cadence, Cadence::Frequent);
    assert!(acme.red_flags.is_empty());
}

#[test]
fn worked_example_client_without_activity() {
    let store = setup_db();
    store.ensure_client("Initech", None).unwrap();

    let metrics = metrics_for(&store);
    let initech = &metrics[0];
    assert_eq!(initech.task_completion_rate, 50.0);
    assert_eq!(initech.health_score, 31);
    assert_eq!(initech.red_flags, vec![RedFlag::NoActiveEngagements]);
    assert_eq!(initech.engagement_momentum, Momentum::Low);
    assert_eq!(initech.interaction_cadence, Cadence::Sparse);
    assert!(initech.last_interaction_date.is_none());
}

#[test]
fn red_flags_in_fixed_order() {
    let store = setup_db();
    import(
        &store,
        CollectionName::Engagements,
        json!([{
            "name": "Stuck",
            "clientName": "Globex",
            "createdAt": days_ago(200),
            "tasks": [
                { "title": "a", "status": "Stalled" },
                { "title": "b", "status": "Stalled" },
                { "title": "c", "status": "Not Started" },
            ]
        }]),
    );
    import(
        &store,
        CollectionName::ClientInteractions,
        json!([
            { "clientName": "Globex", "date": days_ago(90), "status": "Cancelled" },
        ]),
    );

    let flags: Vec<String> = metrics_for(&store)[0]
        .red_flags
        .iter()
        .map(ToString::to_string)
        .collect();
    assert_eq!(
        flags,
        vec![
            "2 stalled tasks",
            "1 cancelled interaction",
            "No interaction in 60+ days",
            "Low task completion rate",
        ]
    );
}

#[test]
fn unparseable_date_falls_back_to_created_at() {
    let store = setup_db();
    import(
        &store,
        CollectionName::ClientInteractions,
        json!([
            { "clientName": "Acme", "date": "sometime soon", "createdAt": days_ago(3) },
        ]),
    );
    let acme = &metrics_for(&store)[0];
    assert_eq!(acme.last_interaction_date, Some(fixed_now() - Duration::days(3)));
    assert_eq!(acme.interaction_cadence, Cadence::Frequent);
}

#[test]
fn health_score_stays_in_bounds() {
    assert_eq!(health_score(0.0, 0, 0, 0, 0), 0);
    assert_eq!(health_score(100.0, 30, 30, 10, 10), 100);
    for rate in [0.0, 12.5, 50.0, 99.9, 100.0] {
        for activity in [0, 20, 30] {
            for frequency in [0, 5, 30] {
                let score = health_score(rate, activity, frequency, 10, 10);
                assert!(score <= 100);
            }
        }
    }
}

#[test]
fn sorting_is_stable_and_idempotent() {
    let store = setup_db();
    for name in ["Alpha", "Bravo", "Charlie", "Delta"] {
        store.ensure_client(name, None).unwrap();
    }
    import(
        &store,
        CollectionName::Engagements,
        json!([
            { "name": "x", "clientName": "Charlie", "createdAt": days_ago(1) },
            { "name": "y", "clientName": "Charlie", "createdAt": days_ago(2) },
            { "name": "z", "clientName": "Bravo", "createdAt": days_ago(3) },
        ]),
    );

    let mut metrics = metrics_for(&store);
    sort_metrics(&mut metrics, SortKey::Momentum);
    let names: Vec<&str> = metrics.iter().map(|m| m.client_name.as_str()).collect();
    // Alpha and Delta tie on low momentum and keep collection order.
    assert_eq!(names, vec!["Charlie", "Bravo", "Alpha", "Delta"]);

    let once = metrics.clone();
    sort_metrics(&mut metrics, SortKey::Momentum);
    assert_eq!(metrics, once);

    sort_metrics(&mut metrics, SortKey::Health);
    let scores: Vec<u8> = metrics.iter().map(|m| m.health_score).collect();
    assert!(scores.windows(2).all(|w| w[0] >= w[1]));
}

#[test]
fn user_metrics_match_id_or_external_id() {
    let store = setup_db();
    let ada = store.add_user("Ada", "Lovelace").unwrap();
    import(
        &store,
        CollectionName::Engagements,
        json!([
            { "name": "a", "clientName": "Acme", "ownerUserId": ada.id,
              "tasks": [{ "status": "Delivered" }, { "status": "Finished" }, { "status": "Stalled" }] },
            { "name": "b", "clientName": "Acme", "appId": ada.external_id },
            { "name": "c", "clientName": "Acme", "ownerUserId": "someone-else" },
        ]),
    );

    let metrics = compute_user_metrics(&store.users(), &store.engagements(), &store.interactions());
    assert_eq!(metrics.len(), 1);
    assert_eq!(metrics[0].total_engagements, 2);
    assert_eq!(metrics[0].tasks.total_tasks, 3);
    assert_eq!(metrics[0].tasks.tasks_closed, 1);
    assert_eq!(metrics[0].completion_rate, 67);
}
