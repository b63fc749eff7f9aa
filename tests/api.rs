use std::net::SocketAddr;

use foodgram::config::Config;
use foodgram::http::build_router;
use foodgram::services::database_service::prepare_database;
use foodgram::services::ingredient_service;
use foodgram::state::AppState;
use sea_orm::DatabaseConnection;
use serde_json::{Value, json};
use tempfile::{TempDir, tempdir};
use tokio::io::{AsyncReadExt, AsyncWriteExt};

const PNG_DATA_URI: &str = "data:image/png;base64,iVBORw0KGgoAAAANSUhEUgAAAAEAAAABCAYAAAAfFcSJAAAADUlEQVR42mNkYPhfDwAChwGA60e6kgAAAABJRU5ErkJggg==";

struct TestServer {
    addr: SocketAddr,
    db: DatabaseConnection,
    media: TempDir,
}

async fn spawn_server() -> TestServer {
    let media = tempdir().expect("tempdir");
    let config = Config {
        media_root: media.path().to_path_buf(),
        ..Config::default()
    };

    let db = prepare_database(&config.database_url).await.expect("database");
    let app = build_router(AppState::new(db.clone(), config));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("serve");
    });

    TestServer { addr, db, media }
}

async fn send(
    addr: SocketAddr,
    method: &str,
    path: &str,
    token: Option<&str>,
    body: Option<&Value>,
) -> (u16, String, String) {
    let mut stream = tokio::net::TcpStream::connect(addr).await.expect("connect server");

    let payload = body.map(Value::to_string).unwrap_or_default();
    let mut req = format!("{method} {path} HTTP/1.1\r\nHost: {addr}\r\nConnection: close\r\n");
    if let Some(token) = token {
        req.push_str(&format!("Authorization: Token {token}\r\n"));
    }
    if body.is_some() {
        req.push_str("Content-Type: application/json\r\n");
    }
    req.push_str(&format!("Content-Length: {}\r\n\r\n", payload.len()));
    req.push_str(&payload);

    stream.write_all(req.as_bytes()).await.expect("write request");
    let mut raw = Vec::new();
    stream.read_to_end(&mut raw).await.expect("read response");
    let response = String::from_utf8_lossy(&raw);

    let (head, body) = response
        .split_once("\r\n\r\n")
        .expect("http response must have separator");
    let status = head
        .lines()
        .next()
        .and_then(|line| line.split_whitespace().nth(1))
        .and_then(|s| s.parse::<u16>().ok())
        .expect("http status");
    (status, head.to_string(), body.to_string())
}

async fn send_json(
    addr: SocketAddr,
    method: &str,
    path: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (u16, Value) {
    let (status, _, body) = send(addr, method, path, token, body.as_ref()).await;
    let value = if body.is_empty() {
        Value::Null
    } else {
        serde_json::from_str(&body).expect("json body")
    };
    (status, value)
}

/// Registers `<username>@example.com` and returns `(id, token)`
async fn sign_up(addr: SocketAddr, username: &str) -> (i64, String) {
    let email = format!("{username}@example.com");
    let (status, user) = send_json(
        addr,
        "POST",
        "/api/users/",
        None,
        Some(json!({
            "email": email,
            "username": username,
            "first_name": "Test",
            "last_name": "User",
            "password": "secret123"
        })),
    )
    .await;
    assert_eq!(status, 201, "register: {user}");
    assert!(user.get("password").is_none());

    let (status, token) = send_json(
        addr,
        "POST",
        "/api/auth/token/login/",
        None,
        Some(json!({ "email": email, "password": "secret123" })),
    )
    .await;
    assert_eq!(status, 200);

    (
        user["id"].as_i64().expect("user id"),
        token["auth_token"].as_str().expect("token").to_string(),
    )
}

async fn tag_id(addr: SocketAddr, slug: &str) -> i64 {
    let (_, tags) = send_json(addr, "GET", "/api/tags/", None, None).await;
    tags.as_array()
        .expect("tags")
        .iter()
        .find(|t| t["slug"] == slug)
        .and_then(|t| t["id"].as_i64())
        .expect("seeded tag")
}

async fn seed_ingredient(server: &TestServer, name: &str, unit: &str) -> i64 {
    let model = ingredient_service::create_ingredient(&server.db, name, unit)
        .await
        .expect("insert ingredient");
    i64::from(model.id)
}

#[tokio::test]
async fn anonymous_reads_and_protected_writes() {
    let server = spawn_server().await;

    let (status, tags) = send_json(server.addr, "GET", "/api/tags/", None, None).await;
    assert_eq!(status, 200);
    let names: Vec<&str> = tags
        .as_array()
        .expect("tags")
        .iter()
        .filter_map(|t| t["name"].as_str())
        .collect();
    assert_eq!(names, vec!["Breakfast", "Dessert", "Dinner", "Lunch"]);

    let (status, page) = send_json(server.addr, "GET", "/api/recipes/", None, None).await;
    assert_eq!(status, 200);
    assert_eq!(page["count"], 0);
    assert!(page["next"].is_null());

    let (status, _) = send_json(server.addr, "POST", "/api/recipes/", None, Some(json!({}))).await;
    assert_eq!(status, 401);

    let (status, _) = send_json(server.addr, "GET", "/api/users/me/", Some("bogus"), None).await;
    assert_eq!(status, 401);

    let (status, _) = send_json(server.addr, "GET", "/api/recipes/999/", None, None).await;
    assert_eq!(status, 404);
}

#[tokio::test]
async fn registration_rejects_duplicates_with_field_errors() {
    let server = spawn_server().await;
    sign_up(server.addr, "anna").await;

    let (status, body) = send_json(
        server.addr,
        "POST",
        "/api/users/",
        None,
        Some(json!({
            "email": "anna@example.com",
            "username": "someone",
            "first_name": "A",
            "last_name": "B",
            "password": "x"
        })),
    )
    .await;
    assert_eq!(status, 400);
    assert!(body["email"].is_array());

    let (status, body) = send_json(
        server.addr,
        "POST",
        "/api/auth/token/login/",
        None,
        Some(json!({ "email": "anna@example.com", "password": "wrong" })),
    )
    .await;
    assert_eq!(status, 400);
    assert!(body["errors"].is_string());
}

fn recipe_body(ingredients: Value, tags: Value, name: &str) -> Value {
    json!({
        "ingredients": ingredients,
        "tags": tags,
        "image": PNG_DATA_URI,
        "name": name,
        "text": "Mix everything",
        "cooking_time": 20
    })
}

#[tokio::test]
async fn recipe_write_rejects_degenerate_input() {
    let server = spawn_server().await;
    let addr = server.addr;
    let (_, anna) = sign_up(addr, "anna").await;
    let flour = seed_ingredient(&server, "flour", "g").await;
    let dinner = tag_id(addr, "dinner").await;

    let cases = [
        (recipe_body(json!([]), json!([dinner]), "Soup"), "ingredients"),
        (recipe_body(json!([{ "id": flour, "amount": 1 }]), json!([]), "Soup"), "tags"),
        (
            recipe_body(
                json!([{ "id": flour, "amount": 1 }, { "id": flour, "amount": 2 }]),
                json!([dinner]),
                "Soup",
            ),
            "ingredients",
        ),
        (recipe_body(json!([{ "id": flour + 100, "amount": 1 }]), json!([dinner]), "Soup"), "ingredients"),
        (recipe_body(json!([{ "id": flour, "amount": 0 }]), json!([dinner]), "Soup"), "ingredients"),
        (recipe_body(json!([{ "id": flour, "amount": 1 }]), json!([dinner]), "  "), "name"),
    ];

    for (body, field) in cases {
        let (status, errors) = send_json(addr, "POST", "/api/recipes/", Some(&anna), Some(body)).await;
        assert_eq!(status, 400, "{field}: {errors}");
        assert!(errors[field].is_array(), "{field}: {errors}");
    }

    let (status, errors) = send_json(
        addr,
        "POST",
        "/api/recipes/",
        Some(&anna),
        Some(json!({
            "ingredients": [{ "id": flour, "amount": 1 }],
            "tags": [dinner],
            "name": "Soup",
            "text": "Boil",
            "cooking_time": 10
        })),
    )
    .await;
    assert_eq!(status, 400);
    assert!(errors["image"].is_array());

    let (_, page) = send_json(addr, "GET", "/api/recipes/", None, None).await;
    assert_eq!(page["count"], 0);

    let stored = std::fs::read_dir(server.media.path().join("recipes"))
        .map(|entries| entries.count())
        .unwrap_or(0);
    assert_eq!(stored, 0, "rejected uploads are discarded");
}

#[tokio::test]
async fn recipe_lifecycle_and_shopping_list() {
    let server = spawn_server().await;
    let addr = server.addr;
    let (anna_id, anna) = sign_up(addr, "anna").await;
    let (_, bob) = sign_up(addr, "bob").await;

    let flour = seed_ingredient(&server, "flour", "g").await;
    let egg = seed_ingredient(&server, "egg", "pcs").await;
    let dinner = tag_id(addr, "dinner").await;
    let lunch = tag_id(addr, "lunch").await;

    let (status, pie) = send_json(
        addr,
        "POST",
        "/api/recipes/",
        Some(&anna),
        Some(recipe_body(json!([{ "id": flour, "amount": 200 }]), json!([dinner]), "Pie")),
    )
    .await;
    assert_eq!(status, 201, "{pie}");
    assert_eq!(pie["author"]["id"].as_i64(), Some(anna_id));
    assert_eq!(pie["ingredients"][0]["amount"], 200);
    assert!(pie["image"].as_str().is_some_and(|url| url.starts_with("/media/recipes/")));

    let (status, cake) = send_json(
        addr,
        "POST",
        "/api/recipes/",
        Some(&anna),
        Some(recipe_body(
            json!([{ "id": flour, "amount": 300 }, { "id": egg, "amount": 2 }]),
            json!([lunch, dinner]),
            "Cake",
        )),
    )
    .await;
    assert_eq!(status, 201, "{cake}");
    assert_eq!(cake["ingredients"][0]["name"], "egg");
    assert_eq!(cake["tags"][0]["slug"], "dinner");

    let pie_id = pie["id"].as_i64().expect("pie id");
    let cake_id = cake["id"].as_i64().expect("cake id");

    let (status, page) = send_json(addr, "GET", "/api/recipes/?limit=1", None, None).await;
    assert_eq!(status, 200);
    assert_eq!(page["count"], 2);
    assert_eq!(page["results"][0]["id"].as_i64(), Some(cake_id));
    assert!(page["next"].as_str().is_some_and(|next| next.ends_with("page=2&limit=1")));

    let (_, page) = send_json(addr, "GET", "/api/recipes/?tags=lunch", None, None).await;
    assert_eq!(page["count"], 1);

    let (status, _) = send_json(
        addr,
        "PATCH",
        &format!("/api/recipes/{pie_id}/"),
        Some(&bob),
        Some(json!({ "ingredients": [{ "id": egg, "amount": 1 }], "tags": [lunch] })),
    )
    .await;
    assert_eq!(status, 403);

    let (status, _) = send_json(
        addr,
        "PATCH",
        &format!("/api/recipes/{pie_id}/"),
        Some(&anna),
        Some(json!({ "name": "Apple pie" })),
    )
    .await;
    assert_eq!(status, 400, "tags and ingredients are always required on update");

    let (status, updated) = send_json(
        addr,
        "PATCH",
        &format!("/api/recipes/{pie_id}/"),
        Some(&anna),
        Some(json!({
            "name": "Apple pie",
            "ingredients": [{ "id": flour, "amount": 200 }],
            "tags": [dinner]
        })),
    )
    .await;
    assert_eq!(status, 200, "{updated}");
    assert_eq!(updated["name"], "Apple pie");
    assert_eq!(updated["image"], pie["image"]);

    for id in [pie_id, cake_id] {
        let (status, short) =
            send_json(addr, "POST", &format!("/api/recipes/{id}/shopping_cart/"), Some(&bob), None).await;
        assert_eq!(status, 201);
        assert_eq!(short["id"].as_i64(), Some(id));
        assert!(short.get("ingredients").is_none());
    }
    let (status, _) = send_json(addr, "POST", &format!("/api/recipes/{pie_id}/shopping_cart/"), Some(&bob), None).await;
    assert_eq!(status, 400, "repeat add");

    let (status, head, text) = send(addr, "GET", "/api/recipes/download_shopping_cart/", Some(&bob), None).await;
    assert_eq!(status, 200);
    assert!(head.to_ascii_lowercase().contains("shopping_cart.txt"));
    assert_eq!(text, "Shopping list:\n\n• egg (pcs) — 2\n• flour (g) — 500\n");

    let (status, _) = send_json(addr, "POST", &format!("/api/recipes/{cake_id}/favorite/"), Some(&bob), None).await;
    assert_eq!(status, 201);
    let (_, favorites) = send_json(addr, "GET", "/api/recipes/?is_favorited=1", Some(&bob), None).await;
    assert_eq!(favorites["count"], 1);
    assert_eq!(favorites["results"][0]["is_favorited"], true);
    assert_eq!(favorites["results"][0]["is_in_shopping_cart"], true);

    let (status, _) = send_json(addr, "DELETE", &format!("/api/recipes/{cake_id}/favorite/"), Some(&bob), None).await;
    assert_eq!(status, 204);
    let (status, _) = send_json(addr, "DELETE", &format!("/api/recipes/{cake_id}/favorite/"), Some(&bob), None).await;
    assert_eq!(status, 400, "repeat remove");

    let (status, link) = send_json(addr, "GET", &format!("/api/recipes/{pie_id}/get-link/"), None, None).await;
    assert_eq!(status, 200);
    let short_link = link["short-link"].as_str().expect("short link");
    assert!(short_link.ends_with(&format!("/s/{pie_id}/")));

    let (status, head, _) = send(addr, "GET", &format!("/s/{pie_id}/"), None, None).await;
    assert_eq!(status, 303);
    assert!(head.contains(&format!("/recipes/{pie_id}/")));

    let (status, _) = send_json(addr, "DELETE", &format!("/api/recipes/{pie_id}/"), Some(&bob), None).await;
    assert_eq!(status, 403);
    let (status, _) = send_json(addr, "DELETE", &format!("/api/recipes/{pie_id}/"), Some(&anna), None).await;
    assert_eq!(status, 204);
    let (status, _) = send_json(addr, "GET", &format!("/api/recipes/{pie_id}/"), None, None).await;
    assert_eq!(status, 404);

    let (_, _, text) = send(addr, "GET", "/api/recipes/download_shopping_cart/", Some(&bob), None).await;
    assert_eq!(text, "Shopping list:\n\n• egg (pcs) — 2\n• flour (g) — 300\n");

    let (status, _) = send_json(addr, "DELETE", &format!("/api/recipes/{cake_id}/shopping_cart/"), Some(&bob), None).await;
    assert_eq!(status, 204);
    let (status, body) = send_json(addr, "GET", "/api/recipes/download_shopping_cart/", Some(&bob), None).await;
    assert_eq!(status, 400);
    assert!(body["errors"].is_string());
}

#[tokio::test]
async fn follow_toggle_over_http() {
    let server = spawn_server().await;
    let addr = server.addr;
    let (anna_id, anna) = sign_up(addr, "anna").await;
    let (bob_id, bob) = sign_up(addr, "bob").await;

    let (status, _) = send_json(addr, "POST", &format!("/api/users/{anna_id}/subscribe/"), Some(&anna), None).await;
    assert_eq!(status, 400, "self-follow");

    let (status, card) = send_json(addr, "POST", &format!("/api/users/{bob_id}/subscribe/"), Some(&anna), None).await;
    assert_eq!(status, 201);
    assert_eq!(card["is_subscribed"], true);
    assert_eq!(card["recipes_count"], 0);

    let (status, _) = send_json(addr, "POST", &format!("/api/users/{bob_id}/subscribe/"), Some(&anna), None).await;
    assert_eq!(status, 400, "repeat follow");

    let (status, profile) = send_json(addr, "GET", &format!("/api/users/{bob_id}/"), Some(&anna), None).await;
    assert_eq!(status, 200);
    assert_eq!(profile["is_subscribed"], true);

    let (status, page) = send_json(addr, "GET", "/api/users/subscriptions/", Some(&anna), None).await;
    assert_eq!(status, 200);
    assert_eq!(page["count"], 1);

    let (status, _) = send_json(addr, "DELETE", &format!("/api/users/{bob_id}/subscribe/"), Some(&anna), None).await;
    assert_eq!(status, 204);
    let (status, _) = send_json(addr, "DELETE", &format!("/api/users/{bob_id}/subscribe/"), Some(&anna), None).await;
    assert_eq!(status, 400, "repeat unfollow");

    let (status, _) = send_json(addr, "POST", "/api/auth/token/logout/", Some(&bob), None).await;
    assert_eq!(status, 204);
    let (status, _) = send_json(addr, "GET", "/api/users/me/", Some(&bob), None).await;
    assert_eq!(status, 401);
}

#[tokio::test]
async fn avatar_is_stored_under_media_root() {
    let server = spawn_server().await;
    let (_, anna) = sign_up(server.addr, "anna").await;

    let (status, body) = send_json(
        server.addr,
        "PUT",
        "/api/users/me/avatar/",
        Some(&anna),
        Some(json!({ "avatar": PNG_DATA_URI })),
    )
    .await;
    assert_eq!(status, 200);

    let url = body["avatar"].as_str().expect("avatar url");
    let relative = url.strip_prefix("/media/").expect("media url");
    assert!(server.media.path().join(relative).exists());

    let (status, _, _) = send(server.addr, "GET", url, None, None).await;
    assert_eq!(status, 200);

    let (status, _) = send_json(server.addr, "DELETE", "/api/users/me/avatar/", Some(&anna), None).await;
    assert_eq!(status, 204);
    assert!(!server.media.path().join(relative).exists());
}

#[tokio::test]
async fn body_type_errors_are_field_errors() {
    let server = spawn_server().await;
    let addr = server.addr;
    let (_, anna) = sign_up(addr, "anna").await;
    let flour = seed_ingredient(&server, "flour", "g").await;
    let dinner = tag_id(addr, "dinner").await;

    let mut body = recipe_body(json!([{ "id": flour, "amount": 1 }]), json!([dinner]), "Soup");
    body["cooking_time"] = json!("twenty");
    let (status, errors) = send_json(addr, "POST", "/api/recipes/", Some(&anna), Some(body)).await;
    assert_eq!(status, 400, "{errors}");
    assert!(errors["cooking_time"].is_array(), "{errors}");

    let (status, errors) = send_json(
        addr,
        "POST",
        "/api/users/",
        None,
        Some(json!({
            "email": "bob@example.com",
            "username": "bob",
            "first_name": "Bob",
            "last_name": "Cook",
            "password": 5
        })),
    )
    .await;
    assert_eq!(status, 400, "{errors}");
    assert!(errors["password"].is_array(), "{errors}");

    let (status, errors) = send_json(
        addr,
        "POST",
        "/api/auth/token/login/",
        None,
        Some(json!({ "email": "anna@example.com" })),
    )
    .await;
    assert_eq!(status, 400, "{errors}");
    assert!(errors["password"].is_array(), "{errors}");

    let stored = std::fs::read_dir(server.media.path().join("recipes"))
        .map(|entries| entries.count())
        .unwrap_or(0);
    assert_eq!(stored, 0);
}

#[tokio::test]
async fn oversized_paging_values_never_fail_the_server() {
    let server = spawn_server().await;
    let addr = server.addr;
    let (anna_id, anna) = sign_up(addr, "anna").await;
    let (_, bob) = sign_up(addr, "bob").await;
    let flour = seed_ingredient(&server, "flour", "g").await;
    let dinner = tag_id(addr, "dinner").await;

    let (status, _) = send_json(
        addr,
        "POST",
        "/api/recipes/",
        Some(&anna),
        Some(recipe_body(json!([{ "id": flour, "amount": 1 }]), json!([dinner]), "Soup")),
    )
    .await;
    assert_eq!(status, 201);

    let (status, page) = send_json(addr, "GET", "/api/recipes/?limit=18446744073709551615", None, None).await;
    assert_eq!(status, 200, "{page}");
    assert_eq!(page["count"], 1);

    let (status, errors) = send_json(
        addr,
        "GET",
        "/api/recipes/?page=9223372036854775807&limit=4",
        None,
        None,
    )
    .await;
    assert_eq!(status, 400, "{errors}");
    assert!(errors["page"].is_array());

    let (status, errors) = send_json(addr, "GET", "/api/users/?page=18446744073709551615", None, None).await;
    assert_eq!(status, 400, "{errors}");

    let (status, _) = send_json(addr, "POST", &format!("/api/users/{anna_id}/subscribe/"), Some(&bob), None).await;
    assert_eq!(status, 201);

    let (status, page) = send_json(
        addr,
        "GET",
        "/api/users/subscriptions/?recipes_limit=18446744073709551615",
        Some(&bob),
        None,
    )
    .await;
    assert_eq!(status, 200, "{page}");
    assert_eq!(page["results"][0]["recipes"].as_array().map(Vec::len), Some(1));
}

#[tokio::test]
async fn ingredient_search_ignores_case() {
    let server = spawn_server().await;
    seed_ingredient(&server, "Молоко", "мл").await;
    seed_ingredient(&server, "мука", "г").await;

    let (status, found) = send_json(server.addr, "GET", "/api/ingredients/?name=%D0%BC%D0%BE%D0%BB", None, None).await;
    assert_eq!(status, 200);
    let names: Vec<&str> = found
        .as_array()
        .expect("ingredients")
        .iter()
        .filter_map(|i| i["name"].as_str())
        .collect();
    assert_eq!(names, vec!["Молоко"]);

    let (_, found) = send_json(server.addr, "GET", "/api/ingredients/?name=%25", None, None).await;
    assert_eq!(found.as_array().map(Vec::len), Some(0));
}
