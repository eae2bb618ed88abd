use axum::{
    extract::DefaultBodyLimit,
    http::{header, HeaderName, HeaderValue, Method},
    middleware,
    routing::get,
    Router,
};
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    trace::TraceLayer,
};

use crate::config::AppConfig;
use crate::handlers::{self, users, villa, villa_number};
use crate::middleware::{jwt_auth_middleware, require_admin};
use crate::models::pagination::PAGINATION_HEADER;
use crate::state::AppState;

/// Build the complete application router
pub fn app(state: AppState, config: &AppConfig) -> Router {
    let mut router = Router::new()
        // Public
        .route("/", get(handlers::root))
        .route("/health", get(handlers::health))
        .merge(public_routes())
        // Bearer token required
        .merge(authenticated_routes(state.clone()))
        // Bearer token with the admin role required
        .merge(admin_routes(state.clone()))
        .layer(DefaultBodyLimit::max(config.api.max_request_size_bytes));

    if config.security.enable_cors {
        router = router.layer(cors_layer(&config.security.cors_origins));
    }
    if config.api.enable_request_logging {
        router = router.layer(TraceLayer::new_for_http());
    }

    router.with_state(state)
}

fn villa_number_reads(version: &str) -> Router<AppState> {
    Router::new()
        .route(
            &format!("/api/{}/VillaNumberAPI", version),
            get(villa_number::get_villa_numbers),
        )
        .route(
            &format!("/api/{}/VillaNumberAPI/:id", version),
            get(villa_number::get_villa_number),
        )
}

fn villa_number_writes(version: &str) -> Router<AppState> {
    use axum::routing::{delete, post};

    Router::new()
        .route(
            &format!("/api/{}/VillaNumberAPI", version),
            post(villa_number::create_villa_number),
        )
        .route(
            &format!("/api/{}/VillaNumberAPI/:id", version),
            delete(villa_number::delete_villa_number).put(villa_number::update_villa_number),
        )
}

fn public_routes() -> Router<AppState> {
    use axum::routing::post;

    Router::new()
        .route("/api/v1/UsersAuth/login", post(users::login))
        .route("/api/v1/UsersAuth/register", post(users::register))
        .route("/api/v1/VillaAPI", get(villa::get_villas))
        .route("/api/v1/VillaAPI/:id", get(villa::get_villa))
        .merge(villa_number_reads("v1"))
        .merge(villa_number_reads("v2"))
}

fn authenticated_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/api/v1/UsersAuth/whoami", get(users::whoami))
        .route_layer(middleware::from_fn_with_state(state, jwt_auth_middleware))
}

fn admin_routes(state: AppState) -> Router<AppState> {
    use axum::routing::{delete, post};

    Router::new()
        .route("/api/v1/VillaAPI", post(villa::create_villa))
        .route(
            "/api/v1/VillaAPI/:id",
            delete(villa::delete_villa).put(villa::update_villa).patch(villa::patch_villa),
        )
        .merge(villa_number_writes("v1"))
        .merge(villa_number_writes("v2"))
        .route_layer(middleware::from_fn(require_admin))
        .route_layer(middleware::from_fn_with_state(state, jwt_auth_middleware))
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin {:?}", origin);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(allowed))
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::PATCH, Method::DELETE])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
        .expose_headers([HeaderName::from_static(PAGINATION_HEADER), header::LOCATION])
}

#[cfg(test)]
mod tests {
    use axum::http::{header, Method, StatusCode};
    use serde_json::json;

    use crate::config::AppConfig;
    use crate::testing::{TestContext, TEST_PASSWORD};

    #[tokio::test]
    async fn root_and_health_are_public() {
        let ctx = TestContext::new().await.unwrap();

        let root = ctx.send(Method::GET, "/", None, None).await.unwrap();
        assert_eq!(root.status, StatusCode::OK);
        assert_eq!(root.body["result"]["name"], "Villa API");

        let health = ctx.send(Method::GET, "/health", None, None).await.unwrap();
        assert_eq!(health.status, StatusCode::OK);
        assert_eq!(health.body["isSuccess"], true);
        assert_eq!(health.body["result"]["database"], "ok");
    }

    #[tokio::test]
    async fn lists_villas_with_cache_and_pagination_headers() {
        let ctx = TestContext::new().await.unwrap();
        let res = ctx
            .send(Method::GET, "/api/v1/VillaAPI?pageSize=2&pageNumber=2", None, None)
            .await
            .unwrap();

        assert_eq!(res.status, StatusCode::OK);
        assert_eq!(res.body["statusCode"], 200);
        let names: Vec<&str> = res.body["result"]
            .as_array()
            .unwrap()
            .iter()
            .map(|v| v["name"].as_str().unwrap())
            .collect();
        assert_eq!(names, vec!["City Lights Villa", "Countryside Villa"]);
        assert_eq!(res.headers[header::CACHE_CONTROL], "public,max-age=30");
        assert_eq!(res.headers["x-pagination"], r#"{"PageNumber":2,"PageSize":2}"#);
    }

    #[tokio::test]
    async fn page_size_is_capped_and_zero_means_everything() {
        let ctx = TestContext::new().await.unwrap();

        let all = ctx.send(Method::GET, "/api/v1/VillaAPI?pageSize=0", None, None).await.unwrap();
        assert_eq!(all.body["result"].as_array().unwrap().len(), 4);

        let capped = ctx.send(Method::GET, "/api/v1/VillaAPI?pageSize=1000", None, None).await.unwrap();
        assert_eq!(capped.headers["x-pagination"], r#"{"PageNumber":1,"PageSize":100}"#);
    }

    #[tokio::test]
    async fn filters_by_occupancy_and_search() {
        let ctx = TestContext::new().await.unwrap();

        let res = ctx.send(Method::GET, "/api/v1/VillaAPI?filterOccupancy=27", None, None).await.unwrap();
        let result = res.body["result"].as_array().unwrap();
        assert_eq!(result.len(), 1);
        assert_eq!(result[0]["name"], "Mountain Retreat Villa");

        let res = ctx.send(Method::GET, "/api/v1/VillaAPI?search=VIEW", None, None).await.unwrap();
        let result = res.body["result"].as_array().unwrap();
        assert_eq!(result.len(), 1);
        assert_eq!(result[0]["name"], "Ocean View Villa");

        // occupancy of zero means no occupancy filter
        let res = ctx.send(Method::GET, "/api/v1/VillaAPI?filterOccupancy=0", None, None).await.unwrap();
        assert_eq!(res.body["result"].as_array().unwrap().len(), 4);
    }

    #[tokio::test]
    async fn get_villa_checks_id() {
        let ctx = TestContext::new().await.unwrap();

        let ok = ctx.send(Method::GET, "/api/v1/VillaAPI/1", None, None).await.unwrap();
        assert_eq!(ok.status, StatusCode::OK);
        assert_eq!(ok.body["result"]["id"], 1);

        let zero = ctx.send(Method::GET, "/api/v1/VillaAPI/0", None, None).await.unwrap();
        assert_eq!(zero.status, StatusCode::BAD_REQUEST);
        assert_eq!(zero.body["isSuccess"], false);

        let missing = ctx.send(Method::GET, "/api/v1/VillaAPI/999", None, None).await.unwrap();
        assert_eq!(missing.status, StatusCode::NOT_FOUND);

        let garbage = ctx.send(Method::GET, "/api/v1/VillaAPI/abc", None, None).await.unwrap();
        assert_eq!(garbage.status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn villa_mutations_require_admin() {
        let ctx = TestContext::new().await.unwrap();
        let body = json!({ "name": "Royal Villa", "rate": 200.0, "sqft": 550, "occupancy": 4 });

        let anonymous = ctx
            .send(Method::POST, "/api/v1/VillaAPI", None, Some(body.clone()))
            .await
            .unwrap();
        assert_eq!(anonymous.status, StatusCode::UNAUTHORIZED);

        let bad_token = ctx
            .send(Method::POST, "/api/v1/VillaAPI", Some("nope"), Some(body.clone()))
            .await
            .unwrap();
        assert_eq!(bad_token.status, StatusCode::UNAUTHORIZED);

        let customer = ctx
            .send(Method::DELETE, "/api/v1/VillaAPI/1", Some(&ctx.customer_token), None)
            .await
            .unwrap();
        assert_eq!(customer.status, StatusCode::FORBIDDEN);
        assert_eq!(customer.body["statusCode"], 403);
    }

    #[tokio::test]
    async fn create_villa_rejects_duplicates_and_invalid_bodies() {
        let ctx = TestContext::new().await.unwrap();
        let token = Some(ctx.admin_token.as_str());

        let created = ctx
            .send(
                Method::POST,
                "/api/v1/VillaAPI",
                token,
                Some(json!({ "name": "Royal Villa", "rate": 200.0, "sqft": 550, "occupancy": 4, "amenity": "Pool" })),
            )
            .await
            .unwrap();
        assert_eq!(created.status, StatusCode::CREATED);
        assert_eq!(created.body["result"]["id"], 5);
        assert_eq!(created.headers[header::LOCATION], "/api/v1/VillaAPI/5");

        let duplicate = ctx
            .send(Method::POST, "/api/v1/VillaAPI", token, Some(json!({ "name": "royal villa" })))
            .await
            .unwrap();
        assert_eq!(duplicate.status, StatusCode::BAD_REQUEST);
        assert_eq!(duplicate.body["errorMessages"][0], "Villa already Exists!");

        let too_long = ctx
            .send(Method::POST, "/api/v1/VillaAPI", token, Some(json!({ "name": "x".repeat(31) })))
            .await
            .unwrap();
        assert_eq!(too_long.status, StatusCode::BAD_REQUEST);
        assert!(too_long.body["fieldErrors"]["name"].is_string());

        let not_json = ctx
            .send(Method::POST, "/api/v1/VillaAPI", token, Some(json!(["not", "a", "villa"])))
            .await
            .unwrap();
        assert_eq!(not_json.status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn update_villa_replaces_fields() {
        let ctx = TestContext::new().await.unwrap();
        let token = Some(ctx.admin_token.as_str());
        let body = json!({ "id": 2, "name": "Mountain Lodge", "rate": 99.5, "sqft": 210, "occupancy": 6 });

        let mismatch = ctx
            .send(Method::PUT, "/api/v1/VillaAPI/3", token, Some(body.clone()))
            .await
            .unwrap();
        assert_eq!(mismatch.status, StatusCode::BAD_REQUEST);

        let missing = ctx
            .send(
                Method::PUT,
                "/api/v1/VillaAPI/77",
                token,
                Some(json!({ "id": 77, "name": "Ghost Villa" })),
            )
            .await
            .unwrap();
        assert_eq!(missing.status, StatusCode::NOT_FOUND);

        let updated = ctx.send(Method::PUT, "/api/v1/VillaAPI/2", token, Some(body)).await.unwrap();
        assert_eq!(updated.status, StatusCode::NO_CONTENT);

        let villa = ctx.send(Method::GET, "/api/v1/VillaAPI/2", None, None).await.unwrap();
        assert_eq!(villa.body["result"]["name"], "Mountain Lodge");
        assert_eq!(villa.body["result"]["occupancy"], 6);
    }

    #[tokio::test]
    async fn patch_villa_applies_json_patch() {
        let ctx = TestContext::new().await.unwrap();
        let token = Some(ctx.admin_token.as_str());

        let patched = ctx
            .send(
                Method::PATCH,
                "/api/v1/VillaAPI/1",
                token,
                Some(json!([
                    { "op": "replace", "path": "/occupancy", "value": 8 },
                    { "op": "replace", "path": "/amenity", "value": "Sauna" }
                ])),
            )
            .await
            .unwrap();
        assert_eq!(patched.status, StatusCode::NO_CONTENT);

        let villa = ctx.send(Method::GET, "/api/v1/VillaAPI/1", None, None).await.unwrap();
        assert_eq!(villa.body["result"]["occupancy"], 8);
        assert_eq!(villa.body["result"]["amenity"], "Sauna");
        assert_eq!(villa.body["result"]["name"], "Ocean View Villa");

        let invalid = ctx
            .send(
                Method::PATCH,
                "/api/v1/VillaAPI/1",
                token,
                Some(json!([{ "op": "replace", "path": "/name", "value": "" }])),
            )
            .await
            .unwrap();
        assert_eq!(invalid.status, StatusCode::BAD_REQUEST);

        let missing = ctx
            .send(
                Method::PATCH,
                "/api/v1/VillaAPI/404",
                token,
                Some(json!([{ "op": "replace", "path": "/occupancy", "value": 1 }])),
            )
            .await
            .unwrap();
        assert_eq!(missing.status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn deleting_a_villa_removes_its_numbers() {
        let ctx = TestContext::new().await.unwrap();
        let token = Some(ctx.admin_token.as_str());

        let created = ctx
            .send(
                Method::POST,
                "/api/v1/VillaNumberAPI",
                token,
                Some(json!({ "villaNo": 301, "villaId": 3, "specialDetails": "top floor" })),
            )
            .await
            .unwrap();
        assert_eq!(created.status, StatusCode::CREATED);
        let other = ctx
            .send(Method::POST, "/api/v1/VillaNumberAPI", token, Some(json!({ "villaNo": 401, "villaId": 4 })))
            .await
            .unwrap();
        assert_eq!(other.status, StatusCode::CREATED);

        let deleted = ctx.send(Method::DELETE, "/api/v1/VillaAPI/3", token, None).await.unwrap();
        assert_eq!(deleted.status, StatusCode::NO_CONTENT);

        let gone = ctx.send(Method::GET, "/api/v1/VillaNumberAPI/301", None, None).await.unwrap();
        assert_eq!(gone.status, StatusCode::NOT_FOUND);
        let kept = ctx.send(Method::GET, "/api/v1/VillaNumberAPI/401", None, None).await.unwrap();
        assert_eq!(kept.status, StatusCode::OK);
        let again = ctx.send(Method::DELETE, "/api/v1/VillaAPI/3", token, None).await.unwrap();
        assert_eq!(again.status, StatusCode::NOT_FOUND);
        let zero = ctx.send(Method::DELETE, "/api/v1/VillaAPI/0", token, None).await.unwrap();
        assert_eq!(zero.status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn villa_numbers_embed_their_villa_in_both_versions() {
        let ctx = TestContext::new().await.unwrap();
        let token = Some(ctx.admin_token.as_str());

        let created = ctx
            .send(
                Method::POST,
                "/api/v2/VillaNumberAPI",
                token,
                Some(json!({ "villaNo": 101, "villaId": 1 })),
            )
            .await
            .unwrap();
        assert_eq!(created.status, StatusCode::CREATED);
        assert_eq!(created.headers[header::LOCATION], "/api/v2/VillaNumberAPI/101");

        for version in ["v1", "v2"] {
            let list = ctx
                .send(Method::GET, &format!("/api/{}/VillaNumberAPI", version), None, None)
                .await
                .unwrap();
            assert_eq!(list.status, StatusCode::OK);
            assert_eq!(list.body["result"][0]["villaNo"], 101);
            assert_eq!(list.body["result"][0]["villa"]["name"], "Ocean View Villa");
        }
    }

    #[tokio::test]
    async fn villa_number_rules() {
        let ctx = TestContext::new().await.unwrap();
        let token = Some(ctx.admin_token.as_str());

        let bad_villa = ctx
            .send(
                Method::POST,
                "/api/v1/VillaNumberAPI",
                token,
                Some(json!({ "villaNo": 201, "villaId": 99 })),
            )
            .await
            .unwrap();
        assert_eq!(bad_villa.status, StatusCode::BAD_REQUEST);
        assert_eq!(bad_villa.body["errorMessages"][0], "Villa Id is Invalid!");

        let body = json!({ "villaNo": 201, "villaId": 2 });
        ctx.send(Method::POST, "/api/v1/VillaNumberAPI", token, Some(body.clone()))
            .await
            .unwrap();
        let duplicate = ctx
            .send(Method::POST, "/api/v1/VillaNumberAPI", token, Some(body))
            .await
            .unwrap();
        assert_eq!(duplicate.status, StatusCode::BAD_REQUEST);
        assert_eq!(duplicate.body["errorMessages"][0], "Villa Number already Exists!");

        let customer = ctx
            .send(
                Method::POST,
                "/api/v1/VillaNumberAPI",
                Some(&ctx.customer_token),
                Some(json!({ "villaNo": 202, "villaId": 2 })),
            )
            .await
            .unwrap();
        assert_eq!(customer.status, StatusCode::FORBIDDEN);

        let mismatch = ctx
            .send(
                Method::PUT,
                "/api/v1/VillaNumberAPI/201",
                token,
                Some(json!({ "villaNo": 202, "villaId": 2 })),
            )
            .await
            .unwrap();
        assert_eq!(mismatch.status, StatusCode::BAD_REQUEST);

        let moved = ctx
            .send(
                Method::PUT,
                "/api/v1/VillaNumberAPI/201",
                token,
                Some(json!({ "villaNo": 201, "villaId": 4, "specialDetails": "garden" })),
            )
            .await
            .unwrap();
        assert_eq!(moved.status, StatusCode::NO_CONTENT);

        let number = ctx.send(Method::GET, "/api/v1/VillaNumberAPI/201", None, None).await.unwrap();
        assert_eq!(number.body["result"]["villaId"], 4);
        assert_eq!(number.body["result"]["villa"]["name"], "Countryside Villa");

        let deleted = ctx.send(Method::DELETE, "/api/v1/VillaNumberAPI/201", token, None).await.unwrap();
        assert_eq!(deleted.status, StatusCode::NO_CONTENT);
        let missing = ctx.send(Method::DELETE, "/api/v1/VillaNumberAPI/201", token, None).await.unwrap();
        assert_eq!(missing.status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn register_login_and_whoami() {
        let ctx = TestContext::new().await.unwrap();

        let registered = ctx
            .send(
                Method::POST,
                "/api/v1/UsersAuth/register",
                None,
                Some(json!({ "userName": "Grace", "name": "Grace H", "password": TEST_PASSWORD })),
            )
            .await
            .unwrap();
        assert_eq!(registered.status, StatusCode::OK);
        assert_eq!(registered.body["result"]["role"], "admin");

        let again = ctx
            .send(
                Method::POST,
                "/api/v1/UsersAuth/register",
                None,
                Some(json!({ "userName": "Grace", "name": "Other", "password": "x" })),
            )
            .await
            .unwrap();
        assert_eq!(again.status, StatusCode::BAD_REQUEST);
        assert_eq!(again.body["errorMessages"][0], "Username already exists");

        let login = ctx
            .send(
                Method::POST,
                "/api/v1/UsersAuth/login",
                None,
                Some(json!({ "userName": "grace", "password": TEST_PASSWORD })),
            )
            .await
            .unwrap();
        assert_eq!(login.status, StatusCode::OK);
        let token = login.body["result"]["token"].as_str().unwrap().to_string();
        assert_eq!(login.body["result"]["user"]["userName"], "Grace");

        let who = ctx
            .send(Method::GET, "/api/v1/UsersAuth/whoami", Some(&token), None)
            .await
            .unwrap();
        assert_eq!(who.status, StatusCode::OK);
        assert_eq!(who.body["result"]["name"], "Grace");
        assert_eq!(who.body["result"]["role"], "admin");

        let anonymous = ctx.send(Method::GET, "/api/v1/UsersAuth/whoami", None, None).await.unwrap();
        assert_eq!(anonymous.status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn registration_cannot_choose_its_own_role() {
        let mut config = AppConfig::development();
        config.security.default_role = "customer".to_string();
        let ctx = TestContext::with_config(config).await.unwrap();

        let registered = ctx
            .send(
                Method::POST,
                "/api/v1/UsersAuth/register",
                None,
                Some(json!({ "userName": "mallory", "name": "Mallory", "password": TEST_PASSWORD, "role": "admin" })),
            )
            .await
            .unwrap();
        assert_eq!(registered.status, StatusCode::OK);
        assert_eq!(registered.body["result"]["role"], "customer");

        let login = ctx
            .send(
                Method::POST,
                "/api/v1/UsersAuth/login",
                None,
                Some(json!({ "userName": "mallory", "password": TEST_PASSWORD })),
            )
            .await
            .unwrap();
        let token = login.body["result"]["token"].as_str().unwrap().to_string();

        let create = ctx
            .send(Method::POST, "/api/v1/VillaAPI", Some(&token), Some(json!({ "name": "Mallory Manor" })))
            .await
            .unwrap();
        assert_eq!(create.status, StatusCode::FORBIDDEN);

        let who = ctx.send(Method::GET, "/api/v1/UsersAuth/whoami", Some(&token), None).await.unwrap();
        assert_eq!(who.body["result"]["role"], "customer");
    }

    #[tokio::test]
    async fn bad_credentials_share_one_message() {
        let ctx = TestContext::new().await.unwrap();

        for body in [
            json!({ "userName": "admin", "password": "wrong" }),
            json!({ "userName": "nobody", "password": TEST_PASSWORD }),
        ] {
            let res = ctx.send(Method::POST, "/api/v1/UsersAuth/login", None, Some(body)).await.unwrap();
            assert_eq!(res.status, StatusCode::BAD_REQUEST);
            assert_eq!(res.body["errorMessages"][0], "Username or password is incorrect");
        }
    }
}
