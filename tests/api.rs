//! End-to-end tests driving the full router over HTTP.

use axum::http::{HeaderName, HeaderValue, StatusCode};
use axum_test::TestServer;
use rusqlite::Connection;
use serde_json::{Value, json};
use time::OffsetDateTime;

use spendscope::{AppState, build_router};

fn new_test_server() -> TestServer {
    let state = AppState::new(Connection::open_in_memory().unwrap()).unwrap();
    TestServer::new(build_router(state))
}

fn user_header(user_id: i64) -> (HeaderName, HeaderValue) {
    (
        HeaderName::from_static("x-user-id"),
        HeaderValue::from_str(&user_id.to_string()).unwrap(),
    )
}

/// Create a user profile and return its ID.
async fn sign_up(server: &TestServer, name: &str, contact: &str) -> i64 {
    let response = server
        .post("/api/users")
        .json(&json!({ "name": name, "contact": contact, "role": "customer" }))
        .await;

    assert_eq!(response.status_code(), StatusCode::CREATED);
    response.json::<Value>()["id"].as_i64().unwrap()
}

/// Attach a pincode to a user, as the login flow does after reverse
/// geocoding.
async fn set_pincode(server: &TestServer, user_id: i64, pincode: &str) {
    let (name, value) = user_header(user_id);
    let response = server
        .put("/api/users/location")
        .add_header(name, value)
        .json(&json!({ "pincode": pincode, "latitude": 12.97, "longitude": 77.59 }))
        .await;

    assert_eq!(response.status_code(), StatusCode::OK);
}

fn today_string() -> String {
    let today = OffsetDateTime::now_utc().date();
    format!(
        "{:04}-{:02}-{:02}",
        today.year(),
        u8::from(today.month()),
        today.day()
    )
}

#[tokio::test]
async fn batch_ingestion_creates_rows_and_catalog_entities() {
    let server = new_test_server();
    let user_id = sign_up(&server, "Asha", "asha@example.com").await;

    let (name, value) = user_header(user_id);
    let response = server
        .post("/api/expenses/batch")
        .add_header(name, value)
        .json(&json!({
            "vendor": "FreshMart",
            "date": today_string(),
            "items": [
                {
                    "productName": "Milk",
                    "categoryName": "Dairy",
                    "quantity": 2.0,
                    "unitPrice": 25.0,
                    "totalPrice": 9999.0
                },
                {
                    "productName": "Bread",
                    "categoryName": "Bakery",
                    "quantity": 1.0,
                    "unitPrice": 40.0
                }
            ]
        }))
        .await;

    assert_eq!(response.status_code(), StatusCode::CREATED);

    let body = response.json::<Value>();
    let expenses = body["expenses"].as_array().unwrap();
    assert_eq!(expenses.len(), 2);
    assert_eq!(expenses[0]["total"], json!(50.0), "total must be recomputed");
    assert_eq!(expenses[1]["total"], json!(40.0));
    assert_eq!(expenses[0]["vendor_id"], expenses[1]["vendor_id"]);
}

#[tokio::test]
async fn invalid_batch_leaves_no_partial_state() {
    let server = new_test_server();
    let user_id = sign_up(&server, "Asha", "asha@example.com").await;

    let (name, value) = user_header(user_id);
    let response = server
        .post("/api/expenses/batch")
        .add_header(name, value)
        .json(&json!({
            "vendor": "FreshMart",
            "date": today_string(),
            "items": [
                {
                    "productName": "Milk",
                    "categoryName": "Dairy",
                    "quantity": 2.0,
                    "unitPrice": 25.0
                },
                {
                    "productName": "   ",
                    "categoryName": "Bakery",
                    "quantity": 1.0,
                    "unitPrice": 40.0
                }
            ]
        }))
        .await;

    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);

    let today = OffsetDateTime::now_utc().date();
    let (name, value) = user_header(user_id);
    let summary = server
        .get("/api/reports/summary")
        .add_query_param("year", today.year())
        .add_query_param("month", u8::from(today.month()))
        .add_header(name, value)
        .await;

    assert_eq!(summary.status_code(), StatusCode::OK);
    assert_eq!(summary.json::<Value>()["overallTotal"], json!(0.0));
}

#[tokio::test]
async fn calendar_rollup_matches_monthly_summary_grand_total() {
    let server = new_test_server();
    let user_id = sign_up(&server, "Asha", "asha@example.com").await;

    let (name, value) = user_header(user_id);
    server
        .post("/api/expenses/batch")
        .add_header(name, value)
        .json(&json!({
            "vendor": "FreshMart",
            "date": today_string(),
            "items": [
                { "productName": "Milk", "categoryName": "Dairy", "quantity": 2.0, "unitPrice": 25.0 },
                { "productName": "Bread", "categoryName": "Bakery", "quantity": 1.0, "unitPrice": 40.0 }
            ]
        }))
        .await;

    let (name, value) = user_header(user_id);
    let summary = server
        .get("/api/reports/summary")
        .add_header(name, value)
        .await
        .json::<Value>();

    let (name, value) = user_header(user_id);
    let rollup = server
        .get("/api/reports/calendar")
        .add_header(name, value)
        .await
        .json::<Value>();

    let rollup_sum: f64 = rollup["dailyTotals"]
        .as_object()
        .unwrap()
        .values()
        .map(|total| total.as_f64().unwrap())
        .sum();

    assert_eq!(rollup_sum, summary["overallTotal"].as_f64().unwrap());
    assert_eq!(rollup_sum, 90.0);
}

#[tokio::test]
async fn price_comparison_finds_cheaper_neighbourhood_vendor() {
    let server = new_test_server();
    let asha = sign_up(&server, "Asha", "asha@example.com").await;
    let ravi = sign_up(&server, "Ravi", "ravi@example.com").await;
    set_pincode(&server, asha, "560001").await;
    set_pincode(&server, ravi, "560001").await;

    let (name, value) = user_header(asha);
    server
        .post("/api/expenses")
        .add_header(name, value)
        .json(&json!({
            "vendor": "VendorX",
            "date": today_string(),
            "productName": "Milk",
            "categoryName": "Dairy",
            "quantity": 1.0,
            "unitPrice": 50.0
        }))
        .await;

    let (name, value) = user_header(ravi);
    server
        .post("/api/expenses")
        .add_header(name, value)
        .json(&json!({
            "vendor": "VendorY",
            "date": today_string(),
            "productName": "Milk",
            "categoryName": "Dairy",
            "quantity": 1.0,
            "unitPrice": 45.0
        }))
        .await;

    let (name, value) = user_header(asha);
    let response = server
        .get("/api/price-comparison")
        .add_query_param("days", 30)
        .add_header(name, value)
        .await;

    assert_eq!(response.status_code(), StatusCode::OK);

    let report = response.json::<Value>();
    assert_eq!(report["pincode"], json!("560001"));
    assert_eq!(report["total_products_analyzed"], json!(1));

    let comparison = &report["comparisons"][0];
    assert_eq!(comparison["cheapest_option"]["vendor"], json!("VendorY"));
    assert_eq!(comparison["cheapest_option"]["min_unit_price"], json!(45.0));
    assert_eq!(comparison["savings"]["amount"], json!(5.0));
    assert_eq!(comparison["savings"]["is_best_deal"], json!(false));
    assert_eq!(report["summary"]["items_with_cheaper_options"], json!(1));
}

#[tokio::test]
async fn price_comparison_without_pincode_is_rejected() {
    let server = new_test_server();
    let user_id = sign_up(&server, "Asha", "asha@example.com").await;

    let (name, value) = user_header(user_id);
    let response = server
        .get("/api/price-comparison")
        .add_header(name, value)
        .await;

    assert_eq!(response.status_code(), StatusCode::NOT_FOUND);
    let body = response.json::<Value>();
    assert!(
        body["error"].as_str().unwrap().contains("pincode"),
        "clients key off the pincode hint: {body}"
    );
}

#[tokio::test]
async fn concurrent_first_references_converge_to_one_category_row() {
    // Two different users name a brand-new category in back-to-back batches;
    // both must land on the same category row.
    let server = new_test_server();
    let asha = sign_up(&server, "Asha", "asha@example.com").await;
    let ravi = sign_up(&server, "Ravi", "ravi@example.com").await;

    for (user_id, casing) in [(asha, "Snacks"), (ravi, "SNACKS")] {
        let (name, value) = user_header(user_id);
        let response = server
            .post("/api/expenses")
            .add_header(name, value)
            .json(&json!({
                "vendor": "FreshMart",
                "date": today_string(),
                "productName": "Chips",
                "categoryName": casing,
                "quantity": 1.0,
                "unitPrice": 10.0
            }))
            .await;

        assert_eq!(response.status_code(), StatusCode::CREATED);
    }

    let today = OffsetDateTime::now_utc().date();
    let (name, value) = user_header(asha);
    let summary = server
        .get("/api/reports/summary")
        .add_query_param("year", today.year())
        .add_query_param("month", u8::from(today.month()))
        .add_header(name, value)
        .await
        .json::<Value>();

    // Asha's expense and Ravi's expense share the category row, so Asha's
    // summary names it exactly as first created.
    assert_eq!(
        summary["spendingByCategory"][0]["category_name"],
        json!("Snacks")
    );
}

#[tokio::test]
async fn requests_without_identity_are_unauthorized() {
    let server = new_test_server();

    let response = server.get("/api/reports/summary").await;

    assert_eq!(response.status_code(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn unknown_routes_return_json_404() {
    let server = new_test_server();

    let response = server.get("/api/does-not-exist").await;

    assert_eq!(response.status_code(), StatusCode::NOT_FOUND);
    assert!(response.json::<Value>()["error"].is_string());
}

#[tokio::test]
async fn duplicate_contact_is_a_conflict() {
    let server = new_test_server();
    sign_up(&server, "Asha", "asha@example.com").await;

    let response = server
        .post("/api/users")
        .json(&json!({ "name": "Imposter", "contact": "asha@example.com", "role": "vendor" }))
        .await;

    assert_eq!(response.status_code(), StatusCode::CONFLICT);
}
