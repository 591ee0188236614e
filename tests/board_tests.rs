// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Board CRUD, ownership, and validation tests.

use axum::http::StatusCode;
use serde_json::json;
use tower::ServiceExt;

mod common;
use common::create_test_app;

#[tokio::test]
async fn test_create_board_defaults() {
    let app = create_test_app();

    let (status, body) = app
        .json(
            "POST",
            "/api/v1/boards",
            Some("alice-token"),
            Some(json!({ "title": "  Launch  " })),
        )
        .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["success"], true);
    assert_eq!(body["message"], "Board created successfully");
    assert_eq!(body["data"]["title"], "Launch");
    assert_eq!(body["data"]["description"], "");
    assert_eq!(body["data"]["color"], "#3b82f6");
    assert_eq!(body["data"]["createdAt"], body["data"]["updatedAt"]);
}

#[tokio::test]
async fn test_list_boards_newest_first_and_scoped() {
    let app = create_test_app();
    let first = app.create_board("alice-token", "First").await;
    let second = app.create_board("alice-token", "Second").await;
    app.create_board("bob-token", "Bob's").await;

    let (status, body) = app
        .json("GET", "/api/v1/boards", Some("alice-token"), None)
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], 2);
    let ids: Vec<&str> = body["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|b| b["id"].as_str().unwrap())
        .collect();
    assert_eq!(ids.len(), 2);
    assert!(ids.contains(&first.as_str()));
    assert!(ids.contains(&second.as_str()));

    let created: Vec<chrono::DateTime<chrono::Utc>> = body["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|b| b["createdAt"].as_str().unwrap().parse().unwrap())
        .collect();
    let mut sorted = created.clone();
    sorted.sort_by(|a, b| b.cmp(a));
    assert_eq!(created, sorted);
}

#[tokio::test]
async fn test_empty_board_list() {
    let app = create_test_app();

    let (status, body) = app
        .json("GET", "/api/v1/boards", Some("alice-token"), None)
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], 0);
    assert_eq!(body["data"], json!([]));
}

#[tokio::test]
async fn test_other_users_board_is_not_found() {
    let app = create_test_app();
    let board = app.create_board("alice-token", "Private").await;
    let uri = format!("/api/v1/boards/{board}");

    let (status, body) = app.json("GET", &uri, Some("bob-token"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "Board not found");

    let (status, _) = app
        .json("PUT", &uri, Some("bob-token"), Some(json!({ "title": "Mine" })))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = app.json("DELETE", &uri, Some("bob-token"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    // Untouched for the owner.
    let (status, body) = app.json("GET", &uri, Some("alice-token"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["title"], "Private");
}

#[tokio::test]
async fn test_missing_board_is_not_found() {
    let app = create_test_app();

    let (status, body) = app
        .json("GET", "/api/v1/boards/does-not-exist", Some("alice-token"), None)
        .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "Board not found");
}

#[tokio::test]
async fn test_title_too_long_is_rejected() {
    let app = create_test_app();

    let (status, body) = app
        .json(
            "POST",
            "/api/v1/boards",
            Some("alice-token"),
            Some(json!({ "title": "a".repeat(101) })),
        )
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Validation failed");
    assert_eq!(body["errors"][0]["field"], "title");
    assert_eq!(
        body["errors"][0]["message"],
        "Board title cannot exceed 100 characters"
    );

    let (_, list) = app
        .json("GET", "/api/v1/boards", Some("alice-token"), None)
        .await;
    assert_eq!(list["count"], 0);
}

#[tokio::test]
async fn test_title_at_limit_is_accepted() {
    let app = create_test_app();

    let (status, _) = app
        .json(
            "POST",
            "/api/v1/boards",
            Some("alice-token"),
            Some(json!({ "title": "a".repeat(100) })),
        )
        .await;

    assert_eq!(status, StatusCode::CREATED);
}

#[tokio::test]
async fn test_missing_title_and_bad_color() {
    let app = create_test_app();

    let (status, body) = app
        .json(
            "POST",
            "/api/v1/boards",
            Some("alice-token"),
            Some(json!({ "color": "blue" })),
        )
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    let errors = body["errors"].as_array().unwrap();
    assert_eq!(errors.len(), 2);
    assert_eq!(errors[0]["field"], "color");
    assert_eq!(errors[0]["message"], "Color must be a valid hex color");
    assert_eq!(errors[1]["field"], "title");
    assert_eq!(errors[1]["message"], "Board title is required");
}

#[tokio::test]
async fn test_malformed_json_is_bad_request() {
    let app = create_test_app();

    let response = app
        .router
        .clone()
        .oneshot(
            axum::http::Request::builder()
                .method("POST")
                .uri("/api/v1/boards")
                .header("authorization", "Bearer alice-token")
                .header("content-type", "application/json")
                .body(axum::body::Body::from("{not json"))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = common::body_json(response).await;
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn test_wrong_title_type_is_field_error() {
    let app = create_test_app();

    let (status, body) = app
        .json(
            "POST",
            "/api/v1/boards",
            Some("alice-token"),
            Some(json!({ "title": 123 })),
        )
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["errors"][0]["field"], "title");
    assert_eq!(body["errors"][0]["message"], "Title must be a string");

    let (status, body) = app
        .json("POST", "/api/v1/boards", Some("alice-token"), Some(json!([1, 2])))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body.get("errors").is_none());
}

#[tokio::test]
async fn test_partial_board_update() {
    let app = create_test_app();
    let board = app.create_board("alice-token", "Launch").await;
    let uri = format!("/api/v1/boards/{board}");

    let (status, body) = app
        .json(
            "PUT",
            &uri,
            Some("alice-token"),
            Some(json!({ "color": "#FF0000" })),
        )
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Board updated successfully");
    assert_eq!(body["data"]["title"], "Launch");
    assert_eq!(body["data"]["color"], "#FF0000");
}

#[tokio::test]
async fn test_noop_update_keeps_updated_at() {
    let app = create_test_app();
    let board = app.create_board("alice-token", "Launch").await;
    let uri = format!("/api/v1/boards/{board}");
    let (_, before) = app.json("GET", &uri, Some("alice-token"), None).await;

    let (status, after) = app
        .json(
            "PUT",
            &uri,
            Some("alice-token"),
            Some(json!({ "title": "Launch" })),
        )
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(before["data"]["updatedAt"], after["data"]["updatedAt"]);
}

#[tokio::test]
async fn test_update_revalidates_title() {
    let app = create_test_app();
    let board = app.create_board("alice-token", "Launch").await;

    let (status, body) = app
        .json(
            "PUT",
            &format!("/api/v1/boards/{board}"),
            Some("alice-token"),
            Some(json!({ "title": "   " })),
        )
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["errors"][0]["field"], "title");
}

#[tokio::test]
async fn test_delete_board_cascades() {
    let app = create_test_app();
    let board = app.create_board("alice-token", "Doomed").await;
    let todos: Vec<String> = create_todos(&app, &board, 3).await;

    let (status, body) = app
        .json(
            "DELETE",
            &format!("/api/v1/boards/{board}"),
            Some("alice-token"),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Board and all its todos deleted successfully");

    let (status, _) = app
        .json(
            "GET",
            &format!("/api/v1/boards/{board}/todos"),
            Some("alice-token"),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, list) = app
        .json("GET", "/api/v1/boards", Some("alice-token"), None)
        .await;
    assert_eq!(list["count"], 0);

    assert!(app.state.db.list_todos(&board).await.unwrap().is_empty());
    for todo in todos {
        let (status, _) = app
            .json("GET", &format!("/api/v1/todos/{todo}"), Some("alice-token"), None)
            .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}

async fn create_todos(app: &common::TestApp, board: &str, n: usize) -> Vec<String> {
    let mut ids = Vec::with_capacity(n);
    for i in 0..n {
        ids.push(app.create_todo("alice-token", board, &format!("todo {i}")).await);
    }
    ids
}
