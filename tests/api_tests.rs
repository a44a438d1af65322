use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode},
};
use http_body_util::BodyExt;
use larder::config::Config;
use serde_json::json;
use tower::ServiceExt;

async fn spawn_app() -> Router {
    let mut config = Config::default();
    config.general.database_path = "sqlite::memory:".to_string();
    // A single connection keeps every query on the same in-memory database
    config.general.max_db_connections = 1;
    config.general.min_db_connections = 1;
    config.media.media_path = std::env::temp_dir()
        .join(format!("larder-test-{}", uuid::Uuid::new_v4()))
        .to_string_lossy()
        .into_owned();

    let state = larder::api::create_app_state_from_config(config, None)
        .await
        .expect("Failed to create app state");
    larder::api::router(state)
}

fn json_request(
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<serde_json::Value>,
) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);

    if let Some(token) = token {
        builder = builder.header("Authorization", format!("Bearer {token}"));
    }

    match body {
        Some(json) => builder
            .header("Content-Type", "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let body = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&body).unwrap()
}

async fn register_user(app: &Router, email: &str, password: &str) {
    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/users/create",
            None,
            Some(json!({"email": email, "password": password, "name": "Test User"})),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}

async fn get_token(app: &Router, email: &str, password: &str) -> String {
    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/users/token",
            None,
            Some(json!({"email": email, "password": password})),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    body_json(response).await["data"]["token"]
        .as_str()
        .unwrap()
        .to_string()
}

async fn register_and_token(app: &Router, email: &str) -> String {
    register_user(app, email, "password123").await;
    get_token(app, email, "password123").await
}

async fn create_recipe(app: &Router, token: &str, payload: serde_json::Value) -> serde_json::Value {
    let response = app
        .clone()
        .oneshot(json_request("POST", "/api/recipes", Some(token), Some(payload)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    body_json(response).await["data"].clone()
}

fn label_names(value: &serde_json::Value) -> Vec<String> {
    value
        .as_array()
        .unwrap()
        .iter()
        .map(|t| t["name"].as_str().unwrap().to_string())
        .collect()
}

#[tokio::test]
async fn test_health_check_is_public() {
    let app = spawn_app().await;

    let response = app
        .oneshot(json_request("GET", "/api/health-check", None, None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["data"]["healthy"], true);
}

#[tokio::test]
async fn test_protected_routes_require_token() {
    let app = spawn_app().await;

    for uri in ["/api/recipes", "/api/tags", "/api/ingredients", "/api/users/me"] {
        let response = app
            .clone()
            .oneshot(json_request("GET", uri, None, None))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED, "uri: {uri}");
    }

    let response = app
        .oneshot(json_request("GET", "/api/recipes", Some("not-a-real-token"), None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_create_user() {
    let app = spawn_app().await;

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/users/create",
            None,
            Some(json!({"email": "new@example.com", "password": "secret123", "name": "New User"})),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["data"]["email"], "new@example.com");
    assert_eq!(body["data"]["name"], "New User");
    assert!(body["data"].get("password").is_none());
    assert!(body["data"].get("password_hash").is_none());
}

#[tokio::test]
async fn test_create_user_duplicate_email() {
    let app = spawn_app().await;
    register_user(&app, "dupe@example.com", "password123").await;

    let response = app
        .oneshot(json_request(
            "POST",
            "/api/users/create",
            None,
            Some(json!({"email": "dupe@example.com", "password": "other-password"})),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_create_user_short_password() {
    let app = spawn_app().await;

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/users/create",
            None,
            Some(json!({"email": "short@example.com", "password": "pw"})),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    // And no account was created
    let response = app
        .oneshot(json_request(
            "POST",
            "/api/users/token",
            None,
            Some(json!({"email": "short@example.com", "password": "pw"})),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_email_domain_is_normalized() {
    let app = spawn_app().await;

    let response = app
        .oneshot(json_request(
            "POST",
            "/api/users/create",
            None,
            Some(json!({"email": "Casey@EXAMPLE.COM", "password": "password123"})),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["data"]["email"], "Casey@example.com");
}

#[tokio::test]
async fn test_token_with_bad_credentials() {
    let app = spawn_app().await;
    register_user(&app, "casey@example.com", "goodpass").await;

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/users/token",
            None,
            Some(json!({"email": "casey@example.com", "password": "wrongpass"})),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app
        .oneshot(json_request(
            "POST",
            "/api/users/token",
            None,
            Some(json!({"email": "nobody@example.com", "password": "goodpass"})),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_token_is_stable_per_user() {
    let app = spawn_app().await;
    register_user(&app, "stable@example.com", "password123").await;

    let first = get_token(&app, "stable@example.com", "password123").await;
    let second = get_token(&app, "stable@example.com", "password123").await;

    assert_eq!(first, second);
}

#[tokio::test]
async fn test_me_roundtrip() {
    let app = spawn_app().await;
    let token = register_and_token(&app, "me@example.com").await;

    let response = app
        .clone()
        .oneshot(json_request("GET", "/api/users/me", Some(&token), None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["data"]["email"], "me@example.com");

    let response = app
        .clone()
        .oneshot(json_request(
            "PATCH",
            "/api/users/me",
            Some(&token),
            Some(json!({"name": "Renamed", "password": "newpassword"})),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["data"]["name"], "Renamed");

    // Old password no longer authenticates, new one does
    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/users/token",
            None,
            Some(json!({"email": "me@example.com", "password": "password123"})),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let _token = get_token(&app, "me@example.com", "newpassword").await;
}

#[tokio::test]
async fn test_recipe_create_and_detail() {
    let app = spawn_app().await;
    let token = register_and_token(&app, "cook@example.com").await;

    let recipe = create_recipe(
        &app,
        &token,
        json!({
            "title": "Thai prawn curry",
            "time_minutes": 30,
            "price": 12.50,
            "link": "https://example.com/curry",
            "description": "Fragrant and quick",
            "tags": [{"name": "Thai"}, {"name": "Dinner"}],
            "ingredients": [{"name": "Prawns"}, {"name": "Coconut milk"}]
        }),
    )
    .await;

    assert_eq!(recipe["title"], "Thai prawn curry");
    assert_eq!(recipe["time_minutes"], 30);
    assert_eq!(recipe["description"], "Fragrant and quick");
    assert_eq!(recipe["tags"].as_array().unwrap().len(), 2);
    assert_eq!(recipe["ingredients"].as_array().unwrap().len(), 2);
    assert!(recipe["image"].is_null());

    let id = recipe["id"].as_i64().unwrap();
    let response = app
        .oneshot(json_request(
            "GET",
            &format!("/api/recipes/{id}"),
            Some(&token),
            None,
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["data"]["description"], "Fragrant and quick");
}

#[tokio::test]
async fn test_recipe_list_is_user_scoped() {
    let app = spawn_app().await;
    let token_a = register_and_token(&app, "a@example.com").await;
    let token_b = register_and_token(&app, "b@example.com").await;

    create_recipe(
        &app,
        &token_a,
        json!({"title": "A's stew", "time_minutes": 60, "price": 8.0}),
    )
    .await;
    create_recipe(
        &app,
        &token_b,
        json!({"title": "B's salad", "time_minutes": 10, "price": 4.0}),
    )
    .await;

    let response = app
        .oneshot(json_request("GET", "/api/recipes", Some(&token_a), None))
        .await
        .unwrap();

    let body = body_json(response).await;
    let titles: Vec<&str> = body["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["title"].as_str().unwrap())
        .collect();

    assert_eq!(titles, vec!["A's stew"]);
}

#[tokio::test]
async fn test_other_users_recipe_is_404() {
    let app = spawn_app().await;
    let token_a = register_and_token(&app, "owner@example.com").await;
    let token_b = register_and_token(&app, "intruder@example.com").await;

    let recipe = create_recipe(
        &app,
        &token_a,
        json!({"title": "Secret sauce", "time_minutes": 5, "price": 1.0}),
    )
    .await;
    let id = recipe["id"].as_i64().unwrap();

    for method in ["GET", "PATCH", "DELETE"] {
        let body = (method == "PATCH").then(|| json!({"title": "Stolen"}));
        let response = app
            .clone()
            .oneshot(json_request(
                method,
                &format!("/api/recipes/{id}"),
                Some(&token_b),
                body,
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND, "method: {method}");
    }

    // Still intact for the owner
    let response = app
        .oneshot(json_request(
            "GET",
            &format!("/api/recipes/{id}"),
            Some(&token_a),
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_patch_tag_semantics() {
    let app = spawn_app().await;
    let token = register_and_token(&app, "patcher@example.com").await;

    let recipe = create_recipe(
        &app,
        &token,
        json!({
            "title": "Pancakes",
            "time_minutes": 20,
            "price": 3.0,
            "tags": [{"name": "Breakfast"}]
        }),
    )
    .await;
    let id = recipe["id"].as_i64().unwrap();

    // Absent `tags` key leaves links untouched
    let response = app
        .clone()
        .oneshot(json_request(
            "PATCH",
            &format!("/api/recipes/{id}"),
            Some(&token),
            Some(json!({"title": "Fluffy pancakes"})),
        ))
        .await
        .unwrap();
    let body = body_json(response).await;
    assert_eq!(body["data"]["title"], "Fluffy pancakes");
    assert_eq!(label_names(&body["data"]["tags"]), vec!["Breakfast"]);

    // Present list replaces the link set
    let response = app
        .clone()
        .oneshot(json_request(
            "PATCH",
            &format!("/api/recipes/{id}"),
            Some(&token),
            Some(json!({"tags": [{"name": "Dessert"}]})),
        ))
        .await
        .unwrap();
    let body = body_json(response).await;
    assert_eq!(label_names(&body["data"]["tags"]), vec!["Dessert"]);

    // Empty list clears the links
    let response = app
        .clone()
        .oneshot(json_request(
            "PATCH",
            &format!("/api/recipes/{id}"),
            Some(&token),
            Some(json!({"tags": []})),
        ))
        .await
        .unwrap();
    let body = body_json(response).await;
    assert!(body["data"]["tags"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_put_without_relation_keys_keeps_links() {
    let app = spawn_app().await;
    let token = register_and_token(&app, "putter@example.com").await;

    let recipe = create_recipe(
        &app,
        &token,
        json!({
            "title": "Original",
            "time_minutes": 15,
            "price": 2.0,
            "link": "https://example.com/original",
            "description": "Keep me?",
            "tags": [{"name": "Lunch"}],
            "ingredients": [{"name": "Bread"}]
        }),
    )
    .await;
    let id = recipe["id"].as_i64().unwrap();

    // Omitted scalars reset to defaults, but absent relation keys leave the
    // link sets untouched
    let response = app
        .clone()
        .oneshot(json_request(
            "PUT",
            &format!("/api/recipes/{id}"),
            Some(&token),
            Some(json!({"title": "Replaced", "time_minutes": 25, "price": 5.0})),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["data"]["title"], "Replaced");
    assert_eq!(body["data"]["link"], "");
    assert_eq!(body["data"]["description"], "");
    assert_eq!(label_names(&body["data"]["tags"]), vec!["Lunch"]);
    assert_eq!(label_names(&body["data"]["ingredients"]), vec!["Bread"]);

    // A present empty list is still an explicit clear
    let response = app
        .oneshot(json_request(
            "PUT",
            &format!("/api/recipes/{id}"),
            Some(&token),
            Some(json!({"title": "Replaced", "time_minutes": 25, "price": 5.0, "tags": []})),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert!(body["data"]["tags"].as_array().unwrap().is_empty());
    assert_eq!(label_names(&body["data"]["ingredients"]), vec!["Bread"]);
}

#[tokio::test]
async fn test_tag_rows_are_reused_per_user() {
    let app = spawn_app().await;
    let token = register_and_token(&app, "reuse@example.com").await;

    create_recipe(
        &app,
        &token,
        json!({"title": "One", "time_minutes": 5, "price": 1.0, "tags": [{"name": "Vegan"}]}),
    )
    .await;
    create_recipe(
        &app,
        &token,
        json!({"title": "Two", "time_minutes": 5, "price": 1.0, "tags": [{"name": "Vegan"}]}),
    )
    .await;

    let response = app
        .oneshot(json_request("GET", "/api/tags", Some(&token), None))
        .await
        .unwrap();

    let body = body_json(response).await;
    assert_eq!(label_names(&body["data"]), vec!["Vegan"]);
}

#[tokio::test]
async fn test_filter_recipes_by_tag_and_ingredient() {
    let app = spawn_app().await;
    let token = register_and_token(&app, "filter@example.com").await;

    let curry = create_recipe(
        &app,
        &token,
        json!({
            "title": "Curry",
            "time_minutes": 40,
            "price": 7.0,
            "tags": [{"name": "Spicy"}],
            "ingredients": [{"name": "Chili"}]
        }),
    )
    .await;
    create_recipe(
        &app,
        &token,
        json!({"title": "Toast", "time_minutes": 5, "price": 1.0}),
    )
    .await;

    let tag_id = curry["tags"][0]["id"].as_i64().unwrap();
    let ingredient_id = curry["ingredients"][0]["id"].as_i64().unwrap();

    let response = app
        .clone()
        .oneshot(json_request(
            "GET",
            &format!("/api/recipes?tags={tag_id}"),
            Some(&token),
            None,
        ))
        .await
        .unwrap();
    let body = body_json(response).await;
    assert_eq!(body["data"].as_array().unwrap().len(), 1);
    assert_eq!(body["data"][0]["title"], "Curry");

    let response = app
        .clone()
        .oneshot(json_request(
            "GET",
            &format!("/api/recipes?ingredients={ingredient_id}"),
            Some(&token),
            None,
        ))
        .await
        .unwrap();
    let body = body_json(response).await;
    assert_eq!(body["data"].as_array().unwrap().len(), 1);

    // Garbage ids are a validation error
    let response = app
        .oneshot(json_request(
            "GET",
            "/api/recipes?tags=1,abc",
            Some(&token),
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_tags_ordering_and_assigned_only() {
    let app = spawn_app().await;
    let token = register_and_token(&app, "tags@example.com").await;

    let recipe = create_recipe(
        &app,
        &token,
        json!({
            "title": "Fruit bowl",
            "time_minutes": 5,
            "price": 2.0,
            "tags": [{"name": "Apple"}, {"name": "Banana"}]
        }),
    )
    .await;
    let id = recipe["id"].as_i64().unwrap();

    let response = app
        .clone()
        .oneshot(json_request("GET", "/api/tags", Some(&token), None))
        .await
        .unwrap();
    let body = body_json(response).await;
    // Name-descending order
    assert_eq!(label_names(&body["data"]), vec!["Banana", "Apple"]);

    // Orphan the tags, then assigned_only filters them out
    let response = app
        .clone()
        .oneshot(json_request(
            "PATCH",
            &format!("/api/recipes/{id}"),
            Some(&token),
            Some(json!({"tags": [{"name": "Banana"}]})),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .clone()
        .oneshot(json_request(
            "GET",
            "/api/tags?assigned_only=1",
            Some(&token),
            None,
        ))
        .await
        .unwrap();
    let body = body_json(response).await;
    assert_eq!(label_names(&body["data"]), vec!["Banana"]);

    // Unassigned rows still show up without the filter
    let response = app
        .oneshot(json_request("GET", "/api/tags", Some(&token), None))
        .await
        .unwrap();
    let body = body_json(response).await;
    assert_eq!(label_names(&body["data"]), vec!["Banana", "Apple"]);
}

#[tokio::test]
async fn test_label_names_are_scoped_per_user() {
    let app = spawn_app().await;
    let token_a = register_and_token(&app, "alice@example.com").await;
    let token_b = register_and_token(&app, "bob@example.com").await;

    let recipe_a = create_recipe(
        &app,
        &token_a,
        json!({
            "title": "Alice's bowl",
            "time_minutes": 10,
            "price": 3.0,
            "tags": [{"name": "Vegan"}],
            "ingredients": [{"name": "Tofu"}]
        }),
    )
    .await;
    let recipe_b = create_recipe(
        &app,
        &token_b,
        json!({
            "title": "Bob's bowl",
            "time_minutes": 10,
            "price": 3.0,
            "tags": [{"name": "Vegan"}]
        }),
    )
    .await;

    // Same name under different users resolves to distinct rows
    let tag_a = recipe_a["tags"][0]["id"].as_i64().unwrap();
    let tag_b = recipe_b["tags"][0]["id"].as_i64().unwrap();
    assert_ne!(tag_a, tag_b);

    // Each list shows only the caller's row
    let response = app
        .clone()
        .oneshot(json_request("GET", "/api/tags", Some(&token_b), None))
        .await
        .unwrap();
    let body = body_json(response).await;
    let ids: Vec<i64> = body["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|t| t["id"].as_i64().unwrap())
        .collect();
    assert_eq!(ids, vec![tag_b]);

    // Alice's ingredient never leaks into Bob's list
    let response = app
        .oneshot(json_request("GET", "/api/ingredients", Some(&token_b), None))
        .await
        .unwrap();
    let body = body_json(response).await;
    assert!(body["data"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_assigned_only_deduplicates() {
    let app = spawn_app().await;
    let token = register_and_token(&app, "dedupe@example.com").await;

    // Same ingredient on two recipes must appear once
    for title in ["Eggs on toast", "Omelette"] {
        create_recipe(
            &app,
            &token,
            json!({
                "title": title,
                "time_minutes": 10,
                "price": 2.0,
                "ingredients": [{"name": "Eggs"}]
            }),
        )
        .await;
    }

    let response = app
        .oneshot(json_request(
            "GET",
            "/api/ingredients?assigned_only=1",
            Some(&token),
            None,
        ))
        .await
        .unwrap();

    let body = body_json(response).await;
    assert_eq!(label_names(&body["data"]), vec!["Eggs"]);
}

#[tokio::test]
async fn test_tag_rename_and_delete() {
    let app = spawn_app().await;
    let token = register_and_token(&app, "labels@example.com").await;
    let other = register_and_token(&app, "other@example.com").await;

    let recipe = create_recipe(
        &app,
        &token,
        json!({"title": "Soup", "time_minutes": 30, "price": 3.0, "tags": [{"name": "Winter"}]}),
    )
    .await;
    let tag_id = recipe["tags"][0]["id"].as_i64().unwrap();

    // Foreign rows are invisible
    let response = app
        .clone()
        .oneshot(json_request(
            "PATCH",
            &format!("/api/tags/{tag_id}"),
            Some(&other),
            Some(json!({"name": "Hijacked"})),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = app
        .clone()
        .oneshot(json_request(
            "PATCH",
            &format!("/api/tags/{tag_id}"),
            Some(&token),
            Some(json!({"name": "Comfort food"})),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["data"]["name"], "Comfort food");

    // Blank rename is rejected
    let response = app
        .clone()
        .oneshot(json_request(
            "PATCH",
            &format!("/api/tags/{tag_id}"),
            Some(&token),
            Some(json!({"name": "  "})),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app
        .clone()
        .oneshot(json_request(
            "DELETE",
            &format!("/api/tags/{tag_id}"),
            Some(&token),
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .oneshot(json_request(
            "GET",
            &format!("/api/tags/{tag_id}"),
            Some(&token),
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_ingredient_rename_and_delete() {
    let app = spawn_app().await;
    let token = register_and_token(&app, "pantry@example.com").await;

    let recipe = create_recipe(
        &app,
        &token,
        json!({
            "title": "Pasta",
            "time_minutes": 20,
            "price": 4.0,
            "ingredients": [{"name": "Tomato"}]
        }),
    )
    .await;
    let id = recipe["ingredients"][0]["id"].as_i64().unwrap();

    let response = app
        .clone()
        .oneshot(json_request(
            "PATCH",
            &format!("/api/ingredients/{id}"),
            Some(&token),
            Some(json!({"name": "Cherry tomato"})),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["data"]["name"], "Cherry tomato");

    let response = app
        .clone()
        .oneshot(json_request(
            "DELETE",
            &format!("/api/ingredients/{id}"),
            Some(&token),
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .oneshot(json_request(
            "DELETE",
            &format!("/api/ingredients/{id}"),
            Some(&token),
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_invalid_recipe_payloads() {
    let app = spawn_app().await;
    let token = register_and_token(&app, "invalid@example.com").await;

    let cases = [
        json!({"title": "  ", "time_minutes": 5, "price": 1.0}),
        json!({"title": "Negative", "time_minutes": 5, "price": -2.0}),
        json!({"title": "Blank tag", "time_minutes": 5, "price": 1.0, "tags": [{"name": " "}]}),
    ];

    for payload in cases {
        let response = app
            .clone()
            .oneshot(json_request("POST", "/api/recipes", Some(&token), Some(payload)))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}

fn multipart_request(uri: &str, token: &str, file_name: &str, bytes: &[u8]) -> Request<Body> {
    let boundary = "larder-test-boundary";
    let mut body = Vec::new();
    body.extend_from_slice(format!("--{boundary}\r\n").as_bytes());
    body.extend_from_slice(
        format!("Content-Disposition: form-data; name=\"image\"; filename=\"{file_name}\"\r\n")
            .as_bytes(),
    );
    body.extend_from_slice(b"Content-Type: application/octet-stream\r\n\r\n");
    body.extend_from_slice(bytes);
    body.extend_from_slice(format!("\r\n--{boundary}--\r\n").as_bytes());

    Request::builder()
        .method("POST")
        .uri(uri)
        .header("Authorization", format!("Bearer {token}"))
        .header(
            "Content-Type",
            format!("multipart/form-data; boundary={boundary}"),
        )
        .body(Body::from(body))
        .unwrap()
}

#[tokio::test]
async fn test_upload_image() {
    let app = spawn_app().await;
    let token = register_and_token(&app, "photos@example.com").await;

    let recipe = create_recipe(
        &app,
        &token,
        json!({"title": "Photogenic", "time_minutes": 5, "price": 1.0}),
    )
    .await;
    let id = recipe["id"].as_i64().unwrap();

    let response = app
        .clone()
        .oneshot(multipart_request(
            &format!("/api/recipes/{id}/upload-image"),
            &token,
            "photo.jpg",
            b"\xff\xd8\xff\xe0fake-jpeg-bytes",
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    let image = body["data"]["image"].as_str().unwrap();
    assert!(image.starts_with("/media/"));
    assert!(image.ends_with(".jpg"));

    // Detail view carries the image URL
    let response = app
        .clone()
        .oneshot(json_request(
            "GET",
            &format!("/api/recipes/{id}"),
            Some(&token),
            None,
        ))
        .await
        .unwrap();
    let body = body_json(response).await;
    assert_eq!(body["data"]["image"], image);

    // Disallowed extension is rejected
    let response = app
        .clone()
        .oneshot(multipart_request(
            &format!("/api/recipes/{id}/upload-image"),
            &token,
            "notes.txt",
            b"not an image",
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    // Unknown recipe is a 404
    let response = app
        .oneshot(multipart_request(
            "/api/recipes/999999/upload-image",
            &token,
            "photo.png",
            b"bytes",
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_metrics_endpoint_requires_auth() {
    let app = spawn_app().await;

    let response = app
        .clone()
        .oneshot(json_request("GET", "/api/metrics", None, None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let token = register_and_token(&app, "metrics@example.com").await;
    let response = app
        .oneshot(json_request("GET", "/api/metrics", Some(&token), None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}
