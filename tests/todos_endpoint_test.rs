use axum::http::StatusCode;
use serde_json::{json, Value};
use tempfile::TempDir;
use todos::api::{self, AppState};
use todos::db::init_db;
use todos::Database;
use tower::util::ServiceExt;

struct TestApp {
    app: axum::Router,
    db: Database,
    _temp: TempDir,
}

async fn setup_test_app() -> TestApp {
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir
        .path()
        .join("test.db")
        .to_string_lossy()
        .to_string();
    let pool = init_db(&db_path, 2).await.expect("init_db failed");
    let db = Database::new(pool);
    let app = api::create_router(AppState::new(db.clone()));

    TestApp {
        app,
        db,
        _temp: temp_dir,
    }
}

async fn send(
    app: &axum::Router,
    method: &str,
    uri: &str,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let builder = axum::http::Request::builder().method(method).uri(uri);
    let req = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(axum::body::Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(axum::body::Body::empty()).unwrap(),
    };

    let resp = app.clone().oneshot(req).await.unwrap();
    let status = resp.status();
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, json)
}

async fn stored_count(db: &Database) -> usize {
    let mut session = db.session().await.unwrap();
    let todos = session.todos().list().await.unwrap();
    session.commit().await.unwrap();
    todos.len()
}

#[tokio::test]
async fn test_crud_scenario() {
    let t = setup_test_app().await;

    let (status, a) = send(&t.app, "POST", "/todos", Some(json!({"title": "A"}))).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(a["id"], 1);
    assert_eq!(a["title"], "A");

    let (status, b) = send(&t.app, "POST", "/todos", Some(json!({"title": "B"}))).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(b["id"], 2);
    assert_eq!(b["title"], "B");

    let (status, list) = send(&t.app, "GET", "/todos", None).await;
    assert_eq!(status, StatusCode::OK);
    let ids: Vec<i64> = list
        .as_array()
        .unwrap()
        .iter()
        .map(|t| t["id"].as_i64().unwrap())
        .collect();
    assert_eq!(ids, vec![1, 2]);

    let (status, deleted) = send(&t.app, "DELETE", "/todos/1", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(deleted, a);

    let (status, list) = send(&t.app, "GET", "/todos", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(list, json!([b]));

    let (status, _) = send(&t.app, "PUT", "/todos/1", Some(json!({"title": "A2"}))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_list_empty() {
    let t = setup_test_app().await;
    let (status, list) = send(&t.app, "GET", "/todos", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(list, json!([]));
}

#[tokio::test]
async fn test_todo_response_has_required_fields() {
    let t = setup_test_app().await;
    let (_, todo) = send(&t.app, "POST", "/todos", Some(json!({"title": "Buy milk"}))).await;

    assert!(todo["id"].is_i64());
    assert_eq!(todo["title"], "Buy milk");
    assert!(todo["description"].is_null());
    assert_eq!(todo["completed"], false);
    assert!(todo["created_at"].is_string());
    assert!(todo["updated_at"].is_string());
}

#[tokio::test]
async fn test_get_by_id_is_stable() {
    let t = setup_test_app().await;
    let (_, created) = send(&t.app, "POST", "/todos", Some(json!({"title": "Buy milk"}))).await;
    let uri = format!("/todos/{}", created["id"]);

    let (status, first) = send(&t.app, "GET", &uri, None).await;
    assert_eq!(status, StatusCode::OK);
    let (_, second) = send(&t.app, "GET", &uri, None).await;
    assert_eq!(first, created);
    assert_eq!(second, created);

    let (status, _) = send(&t.app, "GET", "/todos/999", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_partial_update_keeps_omitted_fields() {
    let t = setup_test_app().await;
    let (_, created) = send(
        &t.app,
        "POST",
        "/todos",
        Some(json!({"title": "Buy milk", "description": "oat"})),
    )
    .await;
    let uri = format!("/todos/{}", created["id"]);

    let (status, updated) = send(&t.app, "PUT", &uri, Some(json!({"completed": true}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["id"], created["id"]);
    assert_eq!(updated["title"], "Buy milk");
    assert_eq!(updated["description"], "oat");
    assert_eq!(updated["completed"], true);
    assert_eq!(updated["created_at"], created["created_at"]);

    let (_, cleared) = send(&t.app, "PUT", &uri, Some(json!({"description": null}))).await;
    assert!(cleared["description"].is_null());
    assert_eq!(cleared["completed"], true);
}

#[tokio::test]
async fn test_create_missing_title_is_422() {
    let t = setup_test_app().await;
    let (status, body) = send(&t.app, "POST", "/todos", Some(json!({"completed": true}))).await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["details"][0]["field"], "title");
    assert_eq!(stored_count(&t.db).await, 0);
}

#[tokio::test]
async fn test_create_wrong_types_is_422() {
    let t = setup_test_app().await;
    let (status, body) = send(
        &t.app,
        "POST",
        "/todos",
        Some(json!({"title": 1, "completed": "no"})),
    )
    .await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["details"].as_array().unwrap().len(), 2);
    assert_eq!(stored_count(&t.db).await, 0);
}

#[tokio::test]
async fn test_malformed_json_is_422() {
    let t = setup_test_app().await;
    let req = axum::http::Request::builder()
        .method("POST")
        .uri("/todos")
        .header("content-type", "application/json")
        .body(axum::body::Body::from("{\"title\": "))
        .unwrap();

    let resp = t.app.clone().oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(stored_count(&t.db).await, 0);
}

#[tokio::test]
async fn test_update_invalid_body_does_not_mutate() {
    let t = setup_test_app().await;
    let (_, created) = send(&t.app, "POST", "/todos", Some(json!({"title": "A"}))).await;
    let uri = format!("/todos/{}", created["id"]);

    let (status, _) = send(&t.app, "PUT", &uri, Some(json!({"title": ""}))).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let (_, current) = send(&t.app, "GET", &uri, None).await;
    assert_eq!(current, created);
}

#[tokio::test]
async fn test_update_and_delete_missing_are_404() {
    let t = setup_test_app().await;
    send(&t.app, "POST", "/todos", Some(json!({"title": "A"}))).await;

    let (status, body) = send(&t.app, "PUT", "/todos/42", Some(json!({"title": "B"}))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["error"].is_string());

    let (status, _) = send(&t.app, "DELETE", "/todos/42", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, list) = send(&t.app, "GET", "/todos", None).await;
    assert_eq!(list.as_array().unwrap().len(), 1);
    assert_eq!(list[0]["title"], "A");
}

#[tokio::test]
async fn test_non_integer_id_is_422() {
    let t = setup_test_app().await;
    let (status, body) = send(&t.app, "DELETE", "/todos/abc", None).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["details"][0]["field"], "id");
}

#[tokio::test]
async fn test_deleted_id_not_reused() {
    let t = setup_test_app().await;
    let (_, a) = send(&t.app, "POST", "/todos", Some(json!({"title": "A"}))).await;
    send(&t.app, "DELETE", &format!("/todos/{}", a["id"]), None).await;

    let (_, b) = send(&t.app, "POST", "/todos", Some(json!({"title": "B"}))).await;
    assert!(b["id"].as_i64().unwrap() > a["id"].as_i64().unwrap());

    let (status, _) = send(&t.app, "GET", &format!("/todos/{}", a["id"]), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

async fn setup_test_app_with_pool(max_connections: u32) -> TestApp {
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir
        .path()
        .join("test.db")
        .to_string_lossy()
        .to_string();
    let pool = init_db(&db_path, max_connections)
        .await
        .expect("init_db failed");
    let db = Database::new(pool);
    let app = api::create_router(AppState::new(db.clone()));

    TestApp {
        app,
        db,
        _temp: temp_dir,
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_updates_all_succeed() {
    let t = setup_test_app_with_pool(5).await;
    for i in 1..=20 {
        let (status, _) = send(
            &t.app,
            "POST",
            "/todos",
            Some(json!({"title": format!("t{}", i)})),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
    }

    let mut handles = Vec::new();
    for n in 0..200 {
        let app = t.app.clone();
        handles.push(tokio::spawn(async move {
            let uri = format!("/todos/{}", n % 20 + 1);
            send(&app, "PUT", &uri, Some(json!({"title": format!("r{}", n)}))).await
        }));
    }

    for handle in handles {
        let (status, body) = handle.await.unwrap();
        assert_eq!(status, StatusCode::OK, "unexpected response: {}", body);
    }

    let (_, list) = send(&t.app, "GET", "/todos", None).await;
    assert_eq!(list.as_array().unwrap().len(), 20);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_mixed_writes_never_fail() {
    let t = setup_test_app_with_pool(5).await;
    for i in 1..=30 {
        send(
            &t.app,
            "POST",
            "/todos",
            Some(json!({"title": format!("t{}", i)})),
        )
        .await;
    }

    // ids 1..=10 are updated, 11..=30 deleted once each, plus 20 fresh creates.
    let mut handles = Vec::new();
    for n in 0..60 {
        let app = t.app.clone();
        handles.push(tokio::spawn(async move {
            let expected = match n % 3 {
                0 => StatusCode::CREATED,
                _ => StatusCode::OK,
            };
            let response = match n % 3 {
                0 => send(&app, "POST", "/todos", Some(json!({"title": "new"}))).await,
                1 => {
                    let uri = format!("/todos/{}", n % 10 + 1);
                    send(&app, "PUT", &uri, Some(json!({"completed": true}))).await
                }
                _ => {
                    let uri = format!("/todos/{}", n / 3 + 11);
                    send(&app, "DELETE", &uri, None).await
                }
            };
            (expected, response)
        }));
    }

    for handle in handles {
        let (expected, (status, body)) = handle.await.unwrap();
        assert_eq!(status, expected, "unexpected response: {}", body);
    }

    assert_eq!(stored_count(&t.db).await, 30 - 20 + 20);
}
