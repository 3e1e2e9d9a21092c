mod common;

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode},
};
use common::{MultipartBody, test_config};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tower::ServiceExt;

async fn spawn_app() -> Router {
    let state = voltshop::api::create_app_state_from_config(test_config(), None)
        .await
        .expect("Failed to create app state");
    voltshop::api::router(state)
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let body = response.into_body().collect().await.unwrap().to_bytes();
    let json = serde_json::from_slice(&body).unwrap_or(Value::Null);
    (status, json)
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn authed(method: &str, uri: &str, token: &str) -> axum::http::request::Builder {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("Authorization", format!("Bearer {token}"))
}

fn form(method: &str, uri: &str, token: &str, body: MultipartBody) -> Request<Body> {
    let (content_type, bytes) = body.finish();
    authed(method, uri, token)
        .header("Content-Type", content_type)
        .body(Body::from(bytes))
        .unwrap()
}

async fn sign_up(app: &Router) -> String {
    let (status, body) = send(
        app,
        Request::builder()
            .method("POST")
            .uri("/api/auth/signup")
            .header("Content-Type", "application/json")
            .body(Body::from(
                json!({"email": "admin@shop.example", "password": "battery"}).to_string(),
            ))
            .unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["signed_in"], true);

    let (status, body) = send(
        app,
        Request::builder()
            .method("POST")
            .uri("/api/auth/login")
            .header("Content-Type", "application/json")
            .body(Body::from(
                json!({"email": "admin@shop.example", "password": "battery"}).to_string(),
            ))
            .unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    body["data"]["access_token"]
        .as_str()
        .expect("login returns a token")
        .to_string()
}

#[tokio::test]
async fn test_admin_routes_require_auth() {
    let app = spawn_app().await;

    let (status, body) = send(&app, get("/api/admin/categories")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["success"], false);

    let (status, _) = send(
        &app,
        authed("GET", "/api/admin/categories", "not-a-token")
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let token = sign_up(&app).await;
    let (status, body) = send(
        &app,
        authed("GET", "/api/admin/categories", &token)
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"], json!([]));

    let (status, body) = send(
        &app,
        authed("GET", "/api/auth/session", &token)
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["user"]["email"], "admin@shop.example");

    let (status, _) = send(
        &app,
        authed("POST", "/api/auth/logout", &token)
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = send(
        &app,
        authed("GET", "/api/admin/categories", &token)
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_login_with_wrong_password() {
    let app = spawn_app().await;
    sign_up(&app).await;

    let (status, body) = send(
        &app,
        Request::builder()
            .method("POST")
            .uri("/api/auth/login")
            .header("Content-Type", "application/json")
            .body(Body::from(
                json!({"email": "admin@shop.example", "password": "wrong!"}).to_string(),
            ))
            .unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Invalid credentials");
}

#[tokio::test]
async fn test_storefront_flow() {
    let app = spawn_app().await;
    let token = sign_up(&app).await;

    let (status, body) = send(
        &app,
        form(
            "POST",
            "/api/admin/categories",
            &token,
            MultipartBody::new().text("title", "Lead Acid"),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["slug"], "lead-acid");
    let category_id = body["data"]["id"].as_i64().unwrap();

    // Unlinked category: models page is empty, products page reports no products.
    let (status, body) = send(&app, get("/api/categories/lead-acid")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["models"], json!([]));

    let (status, body) = send(&app, get("/api/categories/lead-acid/products")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["groups"], json!([]));
    assert_eq!(body["data"]["empty_message"], "No products found");

    let (status, body) = send(
        &app,
        form(
            "POST",
            "/api/admin/models",
            &token,
            MultipartBody::new()
                .text("title", "Sealed Gel")
                .text("rating_value", "100")
                .text("rating_unit", "Ah")
                .text("category_ids", &category_id.to_string())
                .file("image", "gel.png", "image/png", b"\x89PNG"),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["data"]["slug"], "sealed-gel");
    assert_eq!(body["data"]["category_ids"], json!([category_id]));
    let model_id = body["data"]["id"].as_i64().unwrap();
    let image_url = body["data"]["image"].as_str().unwrap().to_string();
    assert!(image_url.starts_with("/storage/images/"));

    let (status, body) = send(
        &app,
        form(
            "POST",
            "/api/admin/products",
            &token,
            MultipartBody::new()
                .text("title", "Gel 100Ah")
                .text("price", "18500")
                .text("rating_value", "100")
                .text("rating_unit", "Ah")
                .text("category_id", &category_id.to_string())
                .text("model_id", &model_id.to_string()),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["data"]["slug"], "gel-100ah");

    let (status, body) = send(&app, get("/api/categories/lead-acid/products")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["groups"][0]["model"]["title"], "Sealed Gel");
    assert_eq!(body["data"]["groups"][0]["products"][0]["title"], "Gel 100Ah");
    assert!(body["data"]["empty_message"].is_null());

    let (status, body) = send(&app, get("/api/categories/lead-acid/sealed-gel")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["products"].as_array().unwrap().len(), 1);

    let (status, body) = send(&app, get("/api/products/gel-100ah")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["category"]["slug"], "lead-acid");
    assert_eq!(body["data"]["model"]["slug"], "sealed-gel");
    assert_eq!(
        body["data"]["contact_link"],
        "https://wa.me/254700000000?text=Hello%2C%20I%27m%20interested%20in%20Gel%20100Ah"
    );

    // Uploaded files are served from local storage.
    let response = app.clone().oneshot(get(&image_url)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let (status, _) = send(&app, get("/api/products/nope")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = send(&app, get("/api/categories/nope")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_search_threshold() {
    let app = spawn_app().await;
    let token = sign_up(&app).await;

    send(
        &app,
        form(
            "POST",
            "/api/admin/categories",
            &token,
            MultipartBody::new().text("title", "Gel Batteries"),
        ),
    )
    .await;

    let (status, body) = send(&app, get("/api/search?q=ge")).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["data"].is_null());

    let (status, body) = send(&app, get("/api/search?q=gel")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["categories"][0]["title"], "Gel Batteries");
    assert_eq!(body["data"]["products"], json!([]));
}

#[tokio::test]
async fn test_category_delete_updates_listing() {
    let app = spawn_app().await;
    let token = sign_up(&app).await;

    let mut ids = Vec::new();
    for title in ["Batteries", "Inverters"] {
        let (_, body) = send(
            &app,
            form(
                "POST",
                "/api/admin/categories",
                &token,
                MultipartBody::new().text("title", title),
            ),
        )
        .await;
        ids.push(body["data"]["id"].as_i64().unwrap());
    }

    let (_, body) = send(&app, get("/api/categories")).await;
    assert_eq!(body["data"].as_array().unwrap().len(), 2);

    let (status, _) = send(
        &app,
        authed("DELETE", &format!("/api/admin/categories/{}", ids[0]), &token)
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (_, body) = send(&app, get("/api/categories")).await;
    let titles: Vec<&str> = body["data"]
        .as_array()
        .unwrap()
        .iter()
        .filter_map(|c| c["title"].as_str())
        .collect();
    assert_eq!(titles, vec!["Inverters"]);
}

#[tokio::test]
async fn test_product_validation_errors() {
    let app = spawn_app().await;
    let token = sign_up(&app).await;

    let (status, body) = send(
        &app,
        form(
            "POST",
            "/api/admin/products",
            &token,
            MultipartBody::new().text("title", "Loose product"),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Category is required");

    let (status, _) = send(
        &app,
        form(
            "POST",
            "/api/admin/products",
            &token,
            MultipartBody::new()
                .text("title", "Loose product")
                .text("category_id", "abc"),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_health() {
    let app = spawn_app().await;
    let (status, body) = send(&app, get("/api/health")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], "ok");
    assert_eq!(body["data"]["backend"], "sqlite");
}

#[tokio::test]
async fn test_category_products_after_model_links_change() {
    let app = spawn_app().await;
    let token = sign_up(&app).await;

    let mut category_ids = Vec::new();
    for title in ["Batteries", "Solar"] {
        let (_, body) = send(
            &app,
            form(
                "POST",
                "/api/admin/categories",
                &token,
                MultipartBody::new().text("title", title),
            ),
        )
        .await;
        category_ids.push(body["data"]["id"].as_i64().unwrap().to_string());
    }

    let (_, body) = send(
        &app,
        form(
            "POST",
            "/api/admin/models",
            &token,
            MultipartBody::new()
                .text("title", "Gel")
                .text("category_ids", &category_ids[0]),
        ),
    )
    .await;
    let model_id = body["data"]["id"].as_i64().unwrap().to_string();

    // Linked model, no products yet.
    let (status, body) = send(&app, get("/api/categories/batteries/products")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["groups"], json!([]));
    assert_eq!(body["data"]["empty_message"], "No products found");

    let (status, _) = send(
        &app,
        form(
            "POST",
            "/api/admin/products",
            &token,
            MultipartBody::new()
                .text("title", "Gel 12V")
                .text("category_id", &category_ids[0])
                .text("model_id", &model_id),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = send(
        &app,
        form(
            "PUT",
            &format!("/api/admin/models/{model_id}"),
            &token,
            MultipartBody::new()
                .text("title", "Gel")
                .text("category_ids", &category_ids[1]),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(&app, get("/api/categories/batteries/products")).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["data"]["empty_message"].is_null());
    assert_eq!(body["data"]["groups"][0]["model"]["title"], "Gel");
    assert_eq!(body["data"]["groups"][0]["products"][0]["title"], "Gel 12V");
}
