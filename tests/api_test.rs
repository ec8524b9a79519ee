//! HTTP-level tests: the full actix-web app wired to the in-memory store.

use std::str::FromStr;
use std::sync::Arc;

use actix_web::http::{header, StatusCode};
use actix_web::{test, web, App};
use back_office::domain::customer::Customer;
use back_office::domain::order::{NewOrder, Order, OrderLine};
use back_office::domain::ports::Store;
use back_office::domain::product::Product;
use back_office::domain::unit_of_work::{Change, UnitOfWork};
use back_office::{configure, AppState, InMemoryStore};
use bigdecimal::BigDecimal;
use chrono::{NaiveDate, TimeZone, Utc};
use serde_json::{json, Value};
use uuid::Uuid;

macro_rules! app {
    ($store:expr) => {
        test::init_service(
            App::new()
                .app_data(web::Data::new(AppState::new($store.clone())))
                .configure(configure),
        )
        .await
    };
}

/// Send a request and return its status and JSON body (`Null` when empty).
macro_rules! call {
    ($app:expr, $req:expr) => {{
        let resp = test::call_service(&$app, $req.to_request()).await;
        let status = resp.status();
        let body = test::read_body(resp).await;
        let json: Value = if body.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&body).expect("json body")
        };
        (status, json)
    }};
}

macro_rules! create {
    ($app:expr, $uri:expr, $body:expr) => {{
        let (status, body) = call!($app, test::TestRequest::post().uri($uri).set_json($body));
        assert_eq!(status, StatusCode::CREATED, "POST {} failed: {}", $uri, body);
        body
    }};
}

fn dec(value: &Value) -> BigDecimal {
    let text = value.as_str().expect("decimal rendered as string");
    BigDecimal::from_str(text).expect("valid decimal")
}

fn money(s: &str) -> BigDecimal {
    BigDecimal::from_str(s).unwrap()
}

fn customer_body(name: &str, email: &str) -> Value {
    json!({
        "name": name,
        "email": email,
        "phone": "+1 555 0100",
        "birthDate": "1990-04-01"
    })
}

fn product_body(title: &str, slug: &str, price: &str) -> Value {
    json!({
        "title": title,
        "description": format!("{title} description"),
        "slug": slug,
        "price": price
    })
}

fn id_of(body: &Value) -> String {
    body["id"].as_str().expect("id").to_string()
}

// ── Customers ────────────────────────────────────────────────────────────────

#[actix_web::test]
async fn create_then_get_customer() {
    let store = Arc::new(InMemoryStore::new());
    let app = app!(store);

    let resp = test::call_service(
        &app,
        test::TestRequest::post()
            .uri("/v1/customers")
            .set_json(customer_body("Ada Lovelace", "ada@example.com"))
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let location = resp
        .headers()
        .get(header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .expect("location header")
        .to_string();
    let created: Value = test::read_body_json(resp).await;
    assert_eq!(location, format!("/v1/customers/{}", id_of(&created)));

    let (status, fetched) = call!(app, test::TestRequest::get().uri(&location));
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched, created);
    assert_eq!(fetched["name"], "Ada Lovelace");
    assert_eq!(fetched["birthDate"], "1990-04-01");
}

#[actix_web::test]
async fn customer_validation_reports_first_failure() {
    let store = Arc::new(InMemoryStore::new());
    let app = app!(store);

    let (status, body) = call!(
        app,
        test::TestRequest::post()
            .uri("/v1/customers")
            .set_json(json!({ "name": "  ", "email": "not-an-email" }))
    );
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Name is required");

    let (status, body) = call!(
        app,
        test::TestRequest::post()
            .uri("/v1/customers")
            .set_json(customer_body("Ada", "not-an-email"))
    );
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Email is invalid");
}

#[actix_web::test]
async fn update_of_unknown_customer_is_not_found_and_writes_nothing() {
    let store = Arc::new(InMemoryStore::new());
    let app = app!(store);

    let (status, body) = call!(
        app,
        test::TestRequest::put()
            .uri(&format!("/v1/customers/{}", Uuid::new_v4()))
            .set_json(customer_body("Ghost", "ghost@example.com"))
    );
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Customer not found");

    let (_, page) = call!(app, test::TestRequest::get().uri("/v1/customers"));
    assert_eq!(page["totalCount"], 0);
}

#[actix_web::test]
async fn email_uniqueness_on_create_and_update() {
    let store = Arc::new(InMemoryStore::new());
    let app = app!(store);

    let a = create!(app, "/v1/customers", customer_body("A", "a@example.com"));
    create!(app, "/v1/customers", customer_body("B", "b@example.com"));

    let (status, body) = call!(
        app,
        test::TestRequest::post()
            .uri("/v1/customers")
            .set_json(customer_body("A2", "a@example.com"))
    );
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "Email already in use");

    let a_uri = format!("/v1/customers/{}", id_of(&a));
    let (status, _) = call!(
        app,
        test::TestRequest::put()
            .uri(&a_uri)
            .set_json(customer_body("A", "b@example.com"))
    );
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, body) = call!(
        app,
        test::TestRequest::put()
            .uri(&a_uri)
            .set_json(customer_body("A renamed", "a@example.com"))
    );
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["name"], "A renamed");
}

#[actix_web::test]
async fn delete_customer_returns_no_content() {
    let store = Arc::new(InMemoryStore::new());
    let app = app!(store);

    let a = create!(app, "/v1/customers", customer_body("A", "a@example.com"));
    let uri = format!("/v1/customers/{}", id_of(&a));

    let (status, body) = call!(app, test::TestRequest::delete().uri(&uri));
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert_eq!(body, Value::Null);

    let (status, _) = call!(app, test::TestRequest::delete().uri(&uri));
    assert_eq!(status, StatusCode::NOT_FOUND);
}

// ── Pagination ───────────────────────────────────────────────────────────────

#[actix_web::test]
async fn pagination_bounds_and_defaults() {
    let store = Arc::new(InMemoryStore::new());
    let app = app!(store);
    for i in 0..12 {
        create!(
            app,
            "/v1/customers",
            customer_body(&format!("Customer {i:02}"), &format!("c{i}@example.com"))
        );
    }

    let (status, body) = call!(app, test::TestRequest::get().uri("/v1/customers?pageNumber=0"));
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["pageNumber"], 0);

    let (status, body) = call!(app, test::TestRequest::get().uri("/v1/customers?pageSize=101"));
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["pageSize"], 101);

    let (status, body) = call!(app, test::TestRequest::get().uri("/v1/customers"));
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["pageNumber"], 1);
    assert_eq!(body["pageSize"], 10);
    assert_eq!(body["totalCount"], 12);
    assert_eq!(body["totalPages"], 2);
    assert_eq!(body["customers"].as_array().unwrap().len(), 10);

    let (_, body) = call!(
        app,
        test::TestRequest::get().uri("/v1/customers?pageNumber=2&name=customer")
    );
    let names: Vec<_> = body["customers"]
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c["name"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(names, vec!["Customer 10", "Customer 11"]);
}

#[actix_web::test]
async fn malformed_query_is_a_json_bad_request() {
    let store = Arc::new(InMemoryStore::new());
    let app = app!(store);

    let (status, body) = call!(app, test::TestRequest::get().uri("/v1/products?minPrice=cheap"));
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());
}

// ── Products ─────────────────────────────────────────────────────────────────

#[actix_web::test]
async fn product_search_is_stable_and_checks_price_range() {
    let store = Arc::new(InMemoryStore::new());
    let app = app!(store);
    for (title, slug, price) in [
        ("Mug", "mug", "9.99"),
        ("Teapot", "teapot", "30.00"),
        ("Kettle", "kettle", "25.00"),
        ("Cup", "cup", "4.50"),
    ] {
        create!(app, "/v1/products", product_body(title, slug, price));
    }

    let (_, first) = call!(app, test::TestRequest::get().uri("/v1/products"));
    let (_, second) = call!(app, test::TestRequest::get().uri("/v1/products"));
    assert_eq!(first, second);
    let titles: Vec<_> = first["products"]
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["title"].as_str().unwrap())
        .collect();
    assert_eq!(titles, vec!["Cup", "Kettle", "Mug", "Teapot"]);

    let (status, body) = call!(
        app,
        test::TestRequest::get().uri("/v1/products?minPrice=20&maxPrice=10")
    );
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body["error"],
        "Invalid price range: MinPrice cannot be greater than MaxPrice."
    );

    let (status, body) = call!(
        app,
        test::TestRequest::get().uri("/v1/products?minPrice=5&maxPrice=26")
    );
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["totalCount"], 2);
}

#[actix_web::test]
async fn product_price_accepts_numbers_and_rejects_zero() {
    let store = Arc::new(InMemoryStore::new());
    let app = app!(store);

    let created = create!(
        app,
        "/v1/products",
        json!({ "title": "Mug", "description": "Mug", "slug": "mug", "price": 12.5 })
    );
    assert_eq!(dec(&created["price"]), money("12.5"));

    let (status, body) = call!(
        app,
        test::TestRequest::post()
            .uri("/v1/products")
            .set_json(product_body("Free", "free", "0"))
    );
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Price must be greater than zero");

    let (status, body) = call!(
        app,
        test::TestRequest::post()
            .uri("/v1/products")
            .set_json(product_body("Mug again", "mug", "3"))
    );
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "Slug already in use");
}

// ── Orders ───────────────────────────────────────────────────────────────────

#[actix_web::test]
async fn order_line_totals_are_frozen() {
    let store = Arc::new(InMemoryStore::new());
    let app = app!(store);

    let customer = create!(app, "/v1/customers", customer_body("Ada", "ada@example.com"));
    let product = create!(app, "/v1/products", product_body("Lamp", "lamp", "50.00"));

    let order = create!(
        app,
        "/v1/orders",
        json!({
            "customerId": id_of(&customer),
            "lines": [{ "productId": id_of(&product), "quantity": 2 }]
        })
    );
    assert_eq!(order["customerName"], "Ada");
    assert_eq!(order["lines"][0]["productTitle"], "Lamp");
    assert_eq!(dec(&order["lines"][0]["total"]), money("100.00"));
    assert_eq!(dec(&order["totalAmount"]), money("100.00"));

    let (status, _) = call!(
        app,
        test::TestRequest::put()
            .uri(&format!("/v1/products/{}", id_of(&product)))
            .set_json(product_body("Lamp", "lamp", "75.00"))
    );
    assert_eq!(status, StatusCode::OK);

    let (status, reread) = call!(
        app,
        test::TestRequest::get().uri(&format!("/v1/orders/{}", id_of(&order)))
    );
    assert_eq!(status, StatusCode::OK);
    assert_eq!(dec(&reread["lines"][0]["unitPrice"]), money("50.00"));
    assert_eq!(dec(&reread["lines"][0]["total"]), money("100.00"));
    assert_eq!(dec(&reread["totalAmount"]), money("100.00"));
}

#[actix_web::test]
async fn order_rejections_follow_check_order() {
    let store = Arc::new(InMemoryStore::new());
    let app = app!(store);
    let customer = create!(app, "/v1/customers", customer_body("Ada", "ada@example.com"));
    let product = create!(app, "/v1/products", product_body("Lamp", "lamp", "50.00"));
    let customer_id = id_of(&customer);
    let product_id = id_of(&product);

    let cases = [
        (
            json!({ "customerId": customer_id, "lines": [] }),
            StatusCode::BAD_REQUEST,
            "Order must have at least one line",
        ),
        (
            json!({ "customerId": customer_id, "lines": null }),
            StatusCode::BAD_REQUEST,
            "Order must have at least one line",
        ),
        (
            json!({ "lines": [{ "productId": product_id, "quantity": 1 }] }),
            StatusCode::BAD_REQUEST,
            "CustomerId is required",
        ),
        (
            json!({ "customerId": Uuid::new_v4(), "lines": [{ "productId": Uuid::new_v4(), "quantity": 0 }] }),
            StatusCode::NOT_FOUND,
            "Customer not found",
        ),
        (
            json!({ "customerId": customer_id, "lines": [{ "productId": Uuid::new_v4(), "quantity": 0 }] }),
            StatusCode::BAD_REQUEST,
            "Quantity must be greater than zero",
        ),
        (
            json!({ "customerId": customer_id, "lines": [
                { "productId": product_id, "quantity": 1 },
                { "productId": Uuid::new_v4(), "quantity": 1 }
            ] }),
            StatusCode::NOT_FOUND,
            "One or more products not found",
        ),
    ];

    for (body, expected_status, expected_error) in cases {
        let (status, resp) = call!(
            app,
            test::TestRequest::post().uri("/v1/orders").set_json(&body)
        );
        assert_eq!(status, expected_status, "body: {body}");
        assert_eq!(resp["error"], expected_error, "body: {body}");
    }

    let (_, page) = call!(app, test::TestRequest::get().uri("/v1/orders"));
    assert_eq!(page["totalCount"], 0);
}

#[actix_web::test]
async fn order_search_by_product_and_date_range() {
    let store = Arc::new(InMemoryStore::new());
    let app = app!(store);
    let customer = create!(app, "/v1/customers", customer_body("Ada", "ada@example.com"));
    let lamp = create!(app, "/v1/products", product_body("Lamp", "lamp", "50.00"));
    let rug = create!(app, "/v1/products", product_body("Rug", "rug", "120.00"));

    let lamp_order = create!(
        app,
        "/v1/orders",
        json!({ "customerId": id_of(&customer), "lines": [{ "productId": id_of(&lamp), "quantity": 1 }] })
    );
    create!(
        app,
        "/v1/orders",
        json!({ "customerId": id_of(&customer), "lines": [{ "productId": id_of(&rug), "quantity": 1 }] })
    );

    let (status, body) = call!(app, test::TestRequest::get().uri("/v1/orders?productTitle=LAMP"));
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["totalCount"], 1);
    assert_eq!(body["orders"][0]["id"], lamp_order["id"]);

    let (status, body) = call!(
        app,
        test::TestRequest::get()
            .uri("/v1/orders?createdAtStart=2030-01-01T00:00:00Z&createdAtEnd=2020-01-01T00:00:00Z")
    );
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["createdAt"].is_object());

    let (_, body) = call!(
        app,
        test::TestRequest::get().uri(&format!("/v1/orders?id={}", id_of(&lamp_order)))
    );
    assert_eq!(body["totalCount"], 1);
}

// ── Reports ──────────────────────────────────────────────────────────────────

#[actix_web::test]
async fn best_customers_ranks_and_filters() {
    let store = Arc::new(InMemoryStore::new());
    let app = app!(store);
    let c = create!(app, "/v1/customers", customer_body("Carol", "carol@example.com"));
    let d = create!(app, "/v1/customers", customer_body("Dave", "dave@example.com"));
    let item = create!(app, "/v1/products", product_body("Item", "item", "100.00"));

    for (customer, quantity) in [(&c, 2), (&c, 2), (&c, 3), (&d, 2), (&d, 3)] {
        create!(
            app,
            "/v1/orders",
            json!({
                "customerId": id_of(customer),
                "lines": [{ "productId": id_of(&item), "quantity": quantity }]
            })
        );
    }

    let (status, body) = call!(
        app,
        test::TestRequest::get()
            .uri("/v1/reports/best-customers?orderBy=spentAmount&orderDirection=desc")
    );
    assert_eq!(status, StatusCode::OK);
    let rows = body["customers"].as_array().unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0]["customerName"], "Carol");
    assert_eq!(rows[0]["totalOrders"], 3);
    assert_eq!(dec(&rows[0]["spentAmount"]), money("700"));
    assert_eq!(rows[1]["customerName"], "Dave");
    assert_eq!(dec(&rows[1]["spentAmount"]), money("500"));

    let (_, body) = call!(
        app,
        test::TestRequest::get().uri("/v1/reports/best-customers?minOrders=3")
    );
    assert_eq!(body["totalCount"], 1);
    assert_eq!(body["customers"][0]["customerEmail"], "carol@example.com");

    let (status, body) = call!(
        app,
        test::TestRequest::get().uri("/v1/reports/best-customers?minSpent=10&maxSpent=1")
    );
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["spent"].is_object());
}

fn seed_revenue(store: &InMemoryStore) {
    let customer = Customer {
        id: Uuid::new_v4(),
        name: "Ada".to_string(),
        email: "ada@example.com".to_string(),
        phone: "555-0100".to_string(),
        birth_date: NaiveDate::from_ymd_opt(1990, 1, 1).unwrap(),
    };
    let product = Product {
        id: Uuid::new_v4(),
        title: "Item".to_string(),
        description: "Item".to_string(),
        slug: "item".to_string(),
        price: money("100.00"),
    };

    let mut work = UnitOfWork::new();
    work.register(Change::InsertCustomer(customer.clone()))
        .register(Change::InsertProduct(product.clone()));

    // January: 2 orders, 400. February: 3 orders, 800.
    let orders = [
        (1, 10, 1),
        (1, 20, 3),
        (2, 1, 2),
        (2, 14, 3),
        (2, 29, 3),
    ];
    for (month, day, quantity) in orders {
        let at = Utc.with_ymd_and_hms(2024, month, day, 10, 0, 0).unwrap();
        let id = Uuid::new_v4();
        work.register(Change::InsertOrder(NewOrder {
            order: Order {
                id,
                customer_id: customer.id,
                created_at: at,
                updated_at: at,
            },
            lines: vec![OrderLine {
                id: Uuid::new_v4(),
                order_id: id,
                product_id: product.id,
                line_number: 1,
                quantity,
                unit_price: product.price.clone(),
                total: &product.price * &BigDecimal::from(quantity),
            }],
        }));
    }
    store.commit(work).unwrap();
}

#[actix_web::test]
async fn revenue_by_period_windows_and_sorts() {
    let store = Arc::new(InMemoryStore::new());
    seed_revenue(&store);
    let app = app!(store);

    let (status, body) = call!(
        app,
        test::TestRequest::get().uri("/v1/reports/revenue-by-period?startPeriod=2024-02")
    );
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["totalCount"], 1);
    assert_eq!(body["items"][0]["year"], 2024);
    assert_eq!(body["items"][0]["month"], "February");
    assert_eq!(body["items"][0]["totalOrders"], 3);
    assert_eq!(dec(&body["items"][0]["totalRevenue"]), money("800"));

    let (_, body) = call!(
        app,
        test::TestRequest::get()
            .uri("/v1/reports/revenue-by-period?orderBy=date&orderDirection=asc")
    );
    let months: Vec<_> = body["items"]
        .as_array()
        .unwrap()
        .iter()
        .map(|row| row["month"].as_str().unwrap())
        .collect();
    assert_eq!(months, vec!["January", "February"]);

    let (_, body) = call!(
        app,
        test::TestRequest::get()
            .uri("/v1/reports/revenue-by-period?orderBy=revenue&orderDirection=desc")
    );
    assert_eq!(body["items"][0]["month"], "February");
}

#[actix_web::test]
async fn revenue_by_period_rejects_bad_periods() {
    let store = Arc::new(InMemoryStore::new());
    let app = app!(store);

    let (status, body) = call!(
        app,
        test::TestRequest::get().uri("/v1/reports/revenue-by-period?startPeriod=2024-1x")
    );
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body["error"],
        "Invalid period format. Use YYYY-MM for startPeriod/endPeriod."
    );
    assert_eq!(body["startPeriod"], "2024-1x");

    let (status, body) = call!(
        app,
        test::TestRequest::get()
            .uri("/v1/reports/revenue-by-period?startPeriod=2024-05&endPeriod=2024-01")
    );
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["period"]["start"], "2024-05");
    assert_eq!(body["period"]["end"], "2024-01");

    let (status, _) = call!(
        app,
        test::TestRequest::get().uri("/v1/reports/revenue-by-period?pageSize=0")
    );
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn openapi_document_is_served() {
    let store = Arc::new(InMemoryStore::new());
    let app = app!(store);

    let (status, body) = call!(app, test::TestRequest::get().uri("/api-docs/openapi.json"));
    assert_eq!(status, StatusCode::OK);
    assert!(body["paths"]["/v1/orders"].is_object());
}

#[actix_web::test]
async fn order_search_accepts_bare_dates_and_timestamps() {
    let store = Arc::new(InMemoryStore::new());
    seed_revenue(&store);
    let app = app!(store);

    // An end date covers the whole day, so the 10:00 orders on Feb 14 count.
    let (status, body) = call!(
        app,
        test::TestRequest::get().uri("/v1/orders?createdAtStart=2024-02-01&createdAtEnd=2024-02-14")
    );
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["totalCount"], 2);

    let (_, body) = call!(app, test::TestRequest::get().uri("/v1/orders?createdAtEnd=2024-01-20"));
    assert_eq!(body["totalCount"], 2);

    let (status, body) = call!(
        app,
        test::TestRequest::get()
            .uri("/v1/orders?createdAtStart=2024-02-14T10:00:00Z&updatedAtEnd=2024-02-29T10:00:00%2B00:00")
    );
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["totalCount"], 2);

    let (status, body) = call!(
        app,
        test::TestRequest::get().uri("/v1/orders?createdAtStart=2024-13-01")
    );
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("YYYY-MM-DD"));
}

#[actix_web::test]
async fn string_prices_keep_full_precision() {
    let store = Arc::new(InMemoryStore::new());
    let app = app!(store);

    let created = create!(
        app,
        "/v1/products",
        product_body("Bond", "bond", "12345678901234567.89")
    );
    assert_eq!(dec(&created["price"]), money("12345678901234567.89"));
}
