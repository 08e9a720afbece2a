//! Integration tests for tlft-tk API endpoints
//!
//! Drive the router directly with tower's oneshot; each test gets its own
//! in-memory database.

mod helpers;

use axum::http::StatusCode;
use serde_json::json;
use tower::util::ServiceExt; // for `oneshot` method

use tlft_common::db::models::UserRole;
use tlft_tk::build_router;

#[tokio::test]
async fn test_health_endpoint_no_actor_required() {
    let state = helpers::test_state().await;
    let app = build_router(state);

    let response = app
        .oneshot(helpers::request("GET", "/health", None, None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = helpers::extract_json(response.into_body()).await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["module"], "tlft-tk");
    assert!(body["version"].is_string());
}

#[tokio::test]
async fn test_create_item_returns_tracker_pair() {
    let state = helpers::test_state().await;
    let actor = helpers::seed_user(&state.db, "lead", UserRole::Lead).await;
    let effort = helpers::seed_effort(&state.db).await;
    let app = build_router(state);

    let response = app
        .oneshot(helpers::request(
            "POST",
            "/api/items",
            Some(actor.guid),
            Some(json!({
                "effort_guid": effort.guid,
                "item_type": "tlf",
                "subtype": "table",
                "code": "T-14.1.1",
            })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let body = helpers::extract_json(response.into_body()).await;
    assert_eq!(body["item"]["code"], "T-14.1.1");
    assert_eq!(body["tracker"]["production_status"], "not_started");
    assert_eq!(body["tracker"]["qc_status"], "not_started");
    assert_eq!(body["tracker"]["unresolved_comment_count"], 0);
    assert_eq!(body["tracker"]["item_guid"], body["item"]["guid"]);
}

#[tokio::test]
async fn test_create_item_duplicate_code_conflicts() {
    let state = helpers::test_state().await;
    let actor = helpers::seed_user(&state.db, "lead", UserRole::Lead).await;
    let effort = helpers::seed_effort(&state.db).await;
    helpers::seed_item(&state.db, effort.guid, "T-14.1.1").await;
    let app = build_router(state);

    let response = app
        .oneshot(helpers::request(
            "POST",
            "/api/items",
            Some(actor.guid),
            Some(json!({
                "effort_guid": effort.guid,
                "item_type": "tlf",
                "code": "T-14.1.1",
            })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);

    let body = helpers::extract_json(response.into_body()).await;
    assert_eq!(body["error"]["code"], "CONFLICT");
}

#[tokio::test]
async fn test_create_item_missing_effort_not_found() {
    let state = helpers::test_state().await;
    let actor = helpers::seed_user(&state.db, "lead", UserRole::Lead).await;
    let app = build_router(state);

    let response = app
        .oneshot(helpers::request(
            "POST",
            "/api/items",
            Some(actor.guid),
            Some(json!({
                "effort_guid": uuid::Uuid::new_v4(),
                "item_type": "dataset",
                "code": "ADAE",
            })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_missing_actor_header_is_rejected() {
    let state = helpers::test_state().await;
    let effort = helpers::seed_effort(&state.db).await;
    let app = build_router(state);

    let response = app
        .oneshot(helpers::request(
            "POST",
            "/api/items",
            None,
            Some(json!({
                "effort_guid": effort.guid,
                "item_type": "tlf",
                "code": "T-1",
            })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_assign_endpoint_auto_advances_production() {
    let state = helpers::test_state().await;
    let actor = helpers::seed_user(&state.db, "lead", UserRole::Lead).await;
    let prog = helpers::seed_user(&state.db, "prog", UserRole::Programmer).await;
    let effort = helpers::seed_effort(&state.db).await;
    let (_, tracker) = helpers::seed_item(&state.db, effort.guid, "T-1").await;
    let app = build_router(state);

    let response = app
        .oneshot(helpers::request(
            "POST",
            &format!("/api/trackers/{}/assign", tracker.guid),
            Some(actor.guid),
            Some(json!({ "role": "production", "user_guid": prog.guid })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = helpers::extract_json(response.into_body()).await;
    assert_eq!(body["production_status"], "in_progress");
    assert_eq!(body["production_programmer_guid"], prog.guid.to_string());
}

#[tokio::test]
async fn test_invalid_role_is_validation_error() {
    let state = helpers::test_state().await;
    let actor = helpers::seed_user(&state.db, "lead", UserRole::Lead).await;
    let prog = helpers::seed_user(&state.db, "prog", UserRole::Programmer).await;
    let effort = helpers::seed_effort(&state.db).await;
    let (_, tracker) = helpers::seed_item(&state.db, effort.guid, "T-1").await;
    let app = build_router(state);

    // "reviewer" is not an assignment role; serde rejects before any write
    let response = app
        .oneshot(helpers::request(
            "POST",
            &format!("/api/trackers/{}/assign", tracker.guid),
            Some(actor.guid),
            Some(json!({ "role": "reviewer", "user_guid": prog.guid })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_update_tracker_rejects_unknown_status() {
    let state = helpers::test_state().await;
    let actor = helpers::seed_user(&state.db, "lead", UserRole::Lead).await;
    let effort = helpers::seed_effort(&state.db).await;
    let (_, tracker) = helpers::seed_item(&state.db, effort.guid, "T-1").await;
    let app = build_router(state);

    let response = app
        .oneshot(helpers::request(
            "PUT",
            &format!("/api/trackers/{}", tracker.guid),
            Some(actor.guid),
            Some(json!({ "production_status": "paused" })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_comment_round_trip_via_api() {
    let state = helpers::test_state().await;
    let prog = helpers::seed_user(&state.db, "prog", UserRole::Programmer).await;
    let effort = helpers::seed_effort(&state.db).await;
    let (_, tracker) = helpers::seed_item(&state.db, effort.guid, "T-1").await;
    let app = build_router(state);

    // Create a top-level comment
    let response = app
        .clone()
        .oneshot(helpers::request(
            "POST",
            &format!("/api/trackers/{}/comments", tracker.guid),
            Some(prog.guid),
            Some(json!({ "body": "check big N", "category": "programming" })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let comment = helpers::extract_json(response.into_body()).await;
    let comment_guid = comment["guid"].as_str().unwrap().to_string();

    // Counter visible on the tracker read
    let response = app
        .clone()
        .oneshot(helpers::request(
            "GET",
            &format!("/api/trackers/{}", tracker.guid),
            None,
            None,
        ))
        .await
        .unwrap();
    let body = helpers::extract_json(response.into_body()).await;
    assert_eq!(body["unresolved_comment_count"], 1);

    // Resolve it
    let response = app
        .clone()
        .oneshot(helpers::request(
            "POST",
            &format!("/api/comments/{comment_guid}/resolve"),
            Some(prog.guid),
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let resolved = helpers::extract_json(response.into_body()).await;
    assert_eq!(resolved["is_resolved"], true);

    // Summary agrees with the counter
    let response = app
        .clone()
        .oneshot(helpers::request(
            "GET",
            &format!("/api/trackers/{}/comments/summary", tracker.guid),
            None,
            None,
        ))
        .await
        .unwrap();
    let summary = helpers::extract_json(response.into_body()).await;
    assert_eq!(summary["total"], 1);
    assert_eq!(summary["unresolved"], 0);
    assert_eq!(summary["resolved"], 1);

    let response = app
        .oneshot(helpers::request(
            "GET",
            &format!("/api/trackers/{}", tracker.guid),
            None,
            None,
        ))
        .await
        .unwrap();
    let body = helpers::extract_json(response.into_body()).await;
    assert_eq!(body["unresolved_comment_count"], 0);
}

#[tokio::test]
async fn test_forbidden_category_via_api() {
    let state = helpers::test_state().await;
    let prog = helpers::seed_user(&state.db, "prog", UserRole::Programmer).await;
    let effort = helpers::seed_effort(&state.db).await;
    let (_, tracker) = helpers::seed_item(&state.db, effort.guid, "T-1").await;
    let app = build_router(state);

    let response = app
        .oneshot(helpers::request(
            "POST",
            &format!("/api/trackers/{}/comments", tracker.guid),
            Some(prog.guid),
            Some(json!({ "body": "stat question", "category": "biostat" })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let body = helpers::extract_json(response.into_body()).await;
    assert_eq!(body["error"]["code"], "FORBIDDEN");
}

#[tokio::test]
async fn test_delete_item_blocked_then_allowed() {
    let state = helpers::test_state().await;
    let lead = helpers::seed_user(&state.db, "lead", UserRole::Lead).await;
    let prog = helpers::seed_user(&state.db, "prog", UserRole::Programmer).await;
    let effort = helpers::seed_effort(&state.db).await;
    let (item, tracker) = helpers::seed_item(&state.db, effort.guid, "T-1").await;
    let app = build_router(state);

    // Assign, then attempt delete: 403
    let response = app
        .clone()
        .oneshot(helpers::request(
            "POST",
            &format!("/api/trackers/{}/assign", tracker.guid),
            Some(lead.guid),
            Some(json!({ "role": "production", "user_guid": prog.guid })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .clone()
        .oneshot(helpers::request(
            "DELETE",
            &format!("/api/items/{}", item.guid),
            Some(lead.guid),
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    // Unassign, delete succeeds
    let response = app
        .clone()
        .oneshot(helpers::request(
            "POST",
            &format!("/api/trackers/{}/unassign", tracker.guid),
            Some(lead.guid),
            Some(json!({ "role": "production" })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .clone()
        .oneshot(helpers::request(
            "DELETE",
            &format!("/api/items/{}", item.guid),
            Some(lead.guid),
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    // Tracker is gone with the item
    let response = app
        .oneshot(helpers::request(
            "GET",
            &format!("/api/trackers/{}", tracker.guid),
            None,
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_delete_effort_reports_dependents() {
    let state = helpers::test_state().await;
    let lead = helpers::seed_user(&state.db, "lead", UserRole::Lead).await;
    let effort = helpers::seed_effort(&state.db).await;
    for i in 1..=7 {
        helpers::seed_item(&state.db, effort.guid, &format!("T-14.{i}")).await;
    }
    let app = build_router(state);

    let response = app
        .oneshot(helpers::request(
            "DELETE",
            &format!("/api/efforts/{}", effort.guid),
            Some(lead.guid),
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);

    let body = helpers::extract_json(response.into_body()).await;
    assert_eq!(body["error"]["code"], "DEPENDENCY_EXISTS");
    assert_eq!(body["error"]["details"]["examples"].as_array().unwrap().len(), 5);
    assert_eq!(body["error"]["details"]["remaining"], 2);
}

#[tokio::test]
async fn test_tracker_list_filters_and_pagination() {
    let state = helpers::test_state().await;
    let lead = helpers::seed_user(&state.db, "lead", UserRole::Lead).await;
    let effort = helpers::seed_effort(&state.db).await;
    for i in 1..=5 {
        helpers::seed_item(&state.db, effort.guid, &format!("T-{i}")).await;
    }
    let (_, t6) = helpers::seed_item(&state.db, effort.guid, "T-6").await;
    let prog = helpers::seed_user(&state.db, "prog", UserRole::Programmer).await;
    let app = build_router(state.clone());

    tlft_tk::workflow::assign_programmer(
        &state.db,
        &state.bus,
        t6.guid,
        prog.guid,
        tlft_common::db::models::AssignmentRole::Production,
        Some(lead.guid),
    )
    .await
    .unwrap();

    // Filter by status
    let response = app
        .clone()
        .oneshot(helpers::request(
            "GET",
            "/api/trackers?production_status=in_progress",
            None,
            None,
        ))
        .await
        .unwrap();
    let body = helpers::extract_json(response.into_body()).await;
    assert_eq!(body.as_array().unwrap().len(), 1);

    // Offset/limit: skip 2, take 2 of the 6 trackers
    let response = app
        .clone()
        .oneshot(helpers::request(
            "GET",
            "/api/trackers?offset=2&limit=2",
            None,
            None,
        ))
        .await
        .unwrap();
    let body = helpers::extract_json(response.into_body()).await;
    assert_eq!(body.as_array().unwrap().len(), 2);

    // By effort
    let response = app
        .oneshot(helpers::request(
            "GET",
            &format!("/api/efforts/{}/trackers", effort.guid),
            None,
            None,
        ))
        .await
        .unwrap();
    let body = helpers::extract_json(response.into_body()).await;
    assert_eq!(body.as_array().unwrap().len(), 6);
}

#[tokio::test]
async fn test_bulk_update_endpoint_reports_per_item() {
    let state = helpers::test_state().await;
    let lead = helpers::seed_user(&state.db, "lead", UserRole::Lead).await;
    let effort = helpers::seed_effort(&state.db).await;
    let (_, t1) = helpers::seed_item(&state.db, effort.guid, "T-1").await;
    let app = build_router(state);

    let response = app
        .oneshot(helpers::request(
            "POST",
            "/api/trackers/bulk-update",
            Some(lead.guid),
            Some(json!({
                "updates": [
                    { "tracker_guid": t1.guid, "priority": 1 },
                    { "tracker_guid": uuid::Uuid::new_v4(), "priority": 1 },
                ]
            })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = helpers::extract_json(response.into_body()).await;
    let results = body["results"].as_array().unwrap();
    assert_eq!(results.len(), 2);
    assert_eq!(results[0]["outcome"], "updated");
    assert_eq!(results[1]["outcome"], "skipped");
}

#[tokio::test]
async fn test_tag_attach_detach() {
    let state = helpers::test_state().await;
    let lead = helpers::seed_user(&state.db, "lead", UserRole::Lead).await;
    let effort = helpers::seed_effort(&state.db).await;
    let (_, tracker) = helpers::seed_item(&state.db, effort.guid, "T-1").await;
    let app = build_router(state);

    let response = app
        .clone()
        .oneshot(helpers::request(
            "POST",
            "/api/tags",
            Some(lead.guid),
            Some(json!({ "name": "dry-run", "color": "#3366cc" })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let tag = helpers::extract_json(response.into_body()).await;
    let tag_guid = tag["guid"].as_str().unwrap().to_string();

    let response = app
        .clone()
        .oneshot(helpers::request(
            "POST",
            &format!("/api/trackers/{}/tags", tracker.guid),
            Some(lead.guid),
            Some(json!({ "tag_guid": tag_guid })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let tags = helpers::extract_json(response.into_body()).await;
    assert_eq!(tags.as_array().unwrap().len(), 1);

    let response = app
        .oneshot(helpers::request(
            "DELETE",
            &format!("/api/trackers/{}/tags/{}", tracker.guid, tag_guid),
            Some(lead.guid),
            None,
        ))
        .await
        .unwrap();
    let tags = helpers::extract_json(response.into_body()).await;
    assert_eq!(tags.as_array().unwrap().len(), 0);
}
