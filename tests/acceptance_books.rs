use bookshelf::{application::book_service::BookServiceImpl, http::routing, http::routing::books, infrastructure::sqlite_repo::SqliteBookRepository};
use bookshelf::domain::repository::BookRepository;
use axum::body::to_bytes;
use axum::Router;
use serde_json::{json, Value};

async fn app() -> Router {
    // use in-memory sqlite for tests
    let repo = SqliteBookRepository::connect("sqlite::memory:").await.unwrap();
    repo.init().await.unwrap();
    let service = BookServiceImpl::new(repo);
    routing::app(books::router(books::AppState { service }), routing::cors_layer("http://localhost:3000").unwrap())
}

#[tokio::test]
async fn acceptance_create_update_delete_scenario() {
    let app = app().await;

    // create
    let res = request(&app, "POST", "/api/books", Some(json!({ "title": "Dune", "author": "Herbert", "status": "quero_ler" }))).await;
    assert_eq!(res.status(), 201);
    let created = body(res).await;
    let id = created["id"].as_str().unwrap().to_string();
    assert_eq!(created["status"], "quero_ler");
    assert!(created.get("rating").is_none());
    assert_eq!(created["createdAt"], created["updatedAt"]);

    // get
    let res = request(&app, "GET", &format!("/api/books/{}", id), None).await;
    assert_eq!(res.status(), 200);
    assert_eq!(body(res).await, created);

    // update
    let res = request(&app, "PUT", &format!("/api/books/{}", id), Some(json!({ "status": "lido", "rating": 5 }))).await;
    assert_eq!(res.status(), 200);
    let res = request(&app, "GET", &format!("/api/books/{}", id), None).await;
    let fetched = body(res).await;
    assert_eq!(fetched["status"], "lido");
    assert_eq!(fetched["rating"], 5);
    assert_eq!(fetched["title"], "Dune");

    // delete
    let res = request(&app, "DELETE", &format!("/api/books/{}", id), None).await;
    assert_eq!(res.status(), 204);

    // get 404
    let res = request(&app, "GET", &format!("/api/books/{}", id), None).await;
    assert_eq!(res.status(), 404);
    let res = request(&app, "DELETE", &format!("/api/books/{}", id), None).await;
    assert_eq!(res.status(), 404);
}

#[tokio::test]
async fn acceptance_rejects_out_of_range_rating_without_persisting() {
    let app = app().await;
    let res = request(&app, "POST", "/api/books", Some(json!({ "title": "Dune", "author": "Herbert", "status": "lido", "rating": 6 }))).await;
    assert_eq!(res.status(), 400);
    let err = body(res).await;
    assert_eq!(err["statusCode"], 400);
    assert_eq!(err["details"][0]["field"], "rating");

    let res = request(&app, "GET", "/api/books", None).await;
    assert_eq!(body(res).await, json!([]));
}

#[tokio::test]
async fn acceptance_rejects_bad_shapes() {
    let app = app().await;
    for payload in [
        json!({ "title": "Dune", "author": "Herbert", "status": "done" }),
        json!({ "title": "Dune", "author": "Herbert", "isbn": "978-0441013593" }),
        json!({ "author": "Herbert" }),
        json!(["Dune"]),
    ] {
        let res = request(&app, "POST", "/api/books", Some(payload.clone())).await;
        assert_eq!(res.status(), 400, "{payload}");
    }

    let res = raw_request(&app, "POST", "/api/books", "{ not json").await;
    assert_eq!(res.status(), 400);

    let res = request(&app, "POST", "/api/books", Some(json!({ "title": "Dune", "author": "Herbert" }))).await;
    let id = body(res).await["id"].as_str().unwrap().to_string();
    let res = request(&app, "PUT", &format!("/api/books/{}", id), Some(json!({ "status": "relido" }))).await;
    assert_eq!(res.status(), 400);
    let res = request(&app, "PUT", &format!("/api/books/{}", id), Some(json!({ "rating": 3 }))).await;
    assert_eq!(res.status(), 400, "rating needs status lido");
}

#[tokio::test]
async fn acceptance_unknown_and_malformed_ids_are_404() {
    let app = app().await;
    for id in ["00000000-0000-4000-8000-000000000000", "64b7f0c2e1a4b3a1c2d3e4f5"] {
        let res = request(&app, "GET", &format!("/api/books/{}", id), None).await;
        assert_eq!(res.status(), 404);
        let res = request(&app, "PUT", &format!("/api/books/{}", id), Some(json!({ "title": "X" }))).await;
        assert_eq!(res.status(), 404);
        let res = request(&app, "DELETE", &format!("/api/books/{}", id), None).await;
        assert_eq!(res.status(), 404);
    }
}

#[tokio::test]
async fn acceptance_other_spellings_of_an_id_are_404() {
    let app = app().await;
    let res = request(&app, "POST", "/api/books", Some(json!({ "title": "Dune", "author": "Herbert" }))).await;
    let id = body(res).await["id"].as_str().unwrap().to_string();

    for alias in [id.replace('-', ""), format!("urn:uuid:{}", id)] {
        let res = request(&app, "GET", &format!("/api/books/{}", alias), None).await;
        assert_eq!(res.status(), 404);
        let res = request(&app, "PUT", &format!("/api/books/{}", alias), Some(json!({ "title": "X" }))).await;
        assert_eq!(res.status(), 404);
        let res = request(&app, "DELETE", &format!("/api/books/{}", alias), None).await;
        assert_eq!(res.status(), 404);
    }

    let res = request(&app, "GET", &format!("/api/books/{}", id), None).await;
    assert_eq!(body(res).await["title"], "Dune");
}

#[tokio::test]
async fn acceptance_list_keeps_insertion_order_and_empty_update_touches() {
    let app = app().await;
    let mut ids = Vec::new();
    for title in ["Dune", "Emma", "Ulysses"] {
        let res = request(&app, "POST", "/api/books", Some(json!({ "title": title, "author": "Someone" }))).await;
        ids.push(body(res).await["id"].as_str().unwrap().to_string());
    }
    let res = request(&app, "GET", "/api/books", None).await;
    let listed: Vec<String> = body(res).await.as_array().unwrap().iter().map(|b| b["id"].as_str().unwrap().to_string()).collect();
    assert_eq!(listed, ids);

    let before = body(request(&app, "GET", &format!("/api/books/{}", ids[0]), None).await).await;
    let res = request(&app, "PUT", &format!("/api/books/{}", ids[0]), Some(json!({}))).await;
    assert_eq!(res.status(), 200);
    let after = body(res).await;
    assert!(after["updatedAt"].as_str().unwrap() > before["updatedAt"].as_str().unwrap());
    assert_eq!(after["createdAt"], before["createdAt"]);
    assert_eq!(after["title"], before["title"]);
}

#[tokio::test]
async fn acceptance_null_clears_optional_fields() {
    let app = app().await;
    let res = request(&app, "POST", "/api/books", Some(json!({
        "title": "Dune", "author": "Herbert", "status": "lido",
        "startDate": "2024-01-02", "endDate": "2024-02-03", "rating": 4
    }))).await;
    assert_eq!(res.status(), 201);
    let created = body(res).await;
    assert_eq!(created["startDate"], "2024-01-02");
    let id = created["id"].as_str().unwrap();

    let res = request(&app, "PUT", &format!("/api/books/{}", id), Some(json!({ "status": "lendo", "endDate": null, "rating": null }))).await;
    assert_eq!(res.status(), 200);
    let updated = body(res).await;
    assert_eq!(updated["status"], "lendo");
    assert!(updated.get("rating").is_none());
    assert!(updated.get("endDate").is_none());
    assert_eq!(updated["startDate"], "2024-01-02");
}

#[tokio::test]
async fn acceptance_health_and_cors() {
    let app = app().await;
    let res = request(&app, "GET", "/health", None).await;
    assert_eq!(res.status(), 200);

    use axum::body::Body;
    use axum::http::Request;
    use tower::ServiceExt;
    let req = Request::builder()
        .method("OPTIONS")
        .uri("/api/books")
        .header("origin", "http://localhost:3000")
        .header("access-control-request-method", "POST")
        .body(Body::empty())
        .unwrap();
    let res = app.clone().oneshot(req).await.unwrap();
    assert_eq!(res.headers()["access-control-allow-origin"], "http://localhost:3000");
}

async fn body(res: hyper::Response<axum::body::Body>) -> Value {
    serde_json::from_slice(&to_bytes(res.into_body(), 1024 * 1024).await.unwrap()).unwrap()
}

async fn request(app: &Router, method: &str, path: &str, body: Option<Value>) -> hyper::Response<axum::body::Body> {
    match body {
        Some(json) => raw_request(app, method, path, &json.to_string()).await,
        None => send(app, method, path, None).await,
    }
}

async fn raw_request(app: &Router, method: &str, path: &str, body: &str) -> hyper::Response<axum::body::Body> {
    send(app, method, path, Some(body.to_string())).await
}

async fn send(app: &Router, method: &str, path: &str, body: Option<String>) -> hyper::Response<axum::body::Body> {
    use axum::body::Body;
    use axum::http::{Request, Method};
    use tower::ServiceExt;

    let req = Request::builder().method(Method::from_bytes(method.as_bytes()).unwrap()).uri(path);
    let req = match body {
        Some(text) => req.header("content-type", "application/json").body(Body::from(text)).unwrap(),
        None => req.body(Body::empty()).unwrap(),
    };
    app.clone().oneshot(req).await.unwrap()
}
