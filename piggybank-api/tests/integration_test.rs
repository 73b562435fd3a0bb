/// Integration tests for the Piggy Bank API
///
/// These drive the complete router (auth middleware, handlers, error
/// mapping) over the in-memory store:
/// - Transaction CRUD and owner scoping
/// - Request validation
/// - Spending analysis with generated and fallback advice
/// - User registration and profile management
/// - Public endpoints

mod common;

use axum::http::StatusCode;
use common::TestContext;
use piggybank_api::middleware::auth::mint_access_token;
use piggybank_shared::advice::{AdviceError, MockAdviceClient};
use piggybank_shared::auth::jwt::{create_token, Claims};
use piggybank_shared::models::transaction::CreateTransaction;
use serde_json::json;

// ---------------------------------------------------------------------------
// Public endpoints
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_root_and_health() {
    let ctx = TestContext::new();

    let (status, body) = ctx.send("GET", "/", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Piggy Bank API");
    assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));

    let (status, body) = ctx.send("GET", "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["database"], "connected");
}

// ---------------------------------------------------------------------------
// Authentication
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_missing_token_is_rejected() {
    let ctx = TestContext::new();

    let (status, body) = ctx.send("GET", "/api/v1/transactions/", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "unauthorized");

    let (status, _) = ctx.send("GET", "/api/v1/analysis/", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_invalid_and_expired_tokens_are_rejected() {
    let ctx = TestContext::new();
    ctx.register("alice").await;

    let (status, _) = ctx
        .send("GET", "/api/v1/transactions/", Some("not-a-jwt"), None)
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let expired = create_token(
        &Claims::new("alice", chrono::Duration::seconds(-120)),
        common::JWT_SECRET,
    )
    .unwrap();
    let (status, body) = ctx
        .send("GET", "/api/v1/transactions/", Some(&expired), None)
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "Token expired");

    let forged = create_token(
        &Claims::new("alice", chrono::Duration::minutes(5)),
        "some-other-secret-that-is-32-bytes-long",
    )
    .unwrap();
    let (status, _) = ctx
        .send("GET", "/api/v1/transactions/", Some(&forged), None)
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_unregistered_subject_is_unauthorized() {
    let ctx = TestContext::new();
    let token = ctx.token_for("stranger");

    let (status, body) = ctx
        .send("GET", "/api/v1/transactions/", Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "User is not registered");
}

// ---------------------------------------------------------------------------
// Transactions
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_transaction_crud() {
    let ctx = TestContext::new();
    let token = ctx.register("alice").await;

    let created = ctx
        .create_transaction(&token, "Coffee", 450, Some("food"))
        .await;
    let id = created["id"].as_i64().unwrap();
    assert_eq!(created["item_name"], "Coffee");
    assert_eq!(created["amount"], 450);
    assert_eq!(created["category"], "food");
    assert!(created["note"].is_null());
    assert!(created["created_at"].is_string());

    let (status, fetched) = ctx
        .send("GET", &format!("/api/v1/transactions/{}", id), Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched, created);

    let (status, updated) = ctx
        .send(
            "PUT",
            &format!("/api/v1/transactions/{}", id),
            Some(&token),
            Some(json!({ "amount": 500, "note": "with oat milk" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["amount"], 500);
    assert_eq!(updated["note"], "with oat milk");
    assert_eq!(updated["item_name"], "Coffee");
    assert_eq!(updated["category"], "food");

    let (status, cleared) = ctx
        .send(
            "PUT",
            &format!("/api/v1/transactions/{}", id),
            Some(&token),
            Some(json!({ "category": null })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert!(cleared["category"].is_null());
    assert_eq!(cleared["note"], "with oat milk");

    let (status, body) = ctx
        .send("DELETE", &format!("/api/v1/transactions/{}", id), Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert!(body.is_null());

    let (status, body) = ctx
        .send("DELETE", &format!("/api/v1/transactions/{}", id), Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "not_found");
    assert_eq!(body["message"], "Transaction not found");
}

#[tokio::test]
async fn test_collection_routes_accept_both_slash_forms() {
    let ctx = TestContext::new();
    let token = ctx.register("alice").await;
    ctx.create_transaction(&token, "Bread", 300, None).await;

    for uri in ["/api/v1/transactions", "/api/v1/transactions/"] {
        let (status, body) = ctx.send("GET", uri, Some(&token), None).await;
        assert_eq!(status, StatusCode::OK, "{}", uri);
        assert_eq!(body.as_array().unwrap().len(), 1);
    }
}

#[tokio::test]
async fn test_list_is_newest_first_and_paginated() {
    let ctx = TestContext::new();
    let token = ctx.register("alice").await;

    for i in 1..=5 {
        ctx.create_transaction(&token, &format!("item {}", i), i * 100, None)
            .await;
    }

    let (status, body) = ctx
        .send("GET", "/api/v1/transactions/", Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    let names: Vec<_> = body
        .as_array()
        .unwrap()
        .iter()
        .map(|t| t["item_name"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(names, vec!["item 5", "item 4", "item 3", "item 2", "item 1"]);

    let (_, page) = ctx
        .send("GET", "/api/v1/transactions/?skip=1&limit=2", Some(&token), None)
        .await;
    let page = page.as_array().unwrap();
    assert_eq!(page.len(), 2);
    assert_eq!(page[0]["item_name"], "item 4");
    assert_eq!(page[1]["item_name"], "item 3");

    let (status, page) = ctx
        .send("GET", "/api/v1/transactions/?limit=1000", Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(page.as_array().unwrap().len(), 5);

    let (status, _) = ctx
        .send("GET", "/api/v1/transactions/?skip=-1", Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_other_users_transactions_are_invisible() {
    let ctx = TestContext::new();
    let alice = ctx.register("alice").await;
    let bob = ctx.register("bob").await;

    let created = ctx.create_transaction(&alice, "Rent", 80000, Some("housing")).await;
    let uri = format!("/api/v1/transactions/{}", created["id"]);

    let (status, _) = ctx.send("GET", &uri, Some(&bob), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = ctx
        .send("PUT", &uri, Some(&bob), Some(json!({ "amount": 1 })))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = ctx.send("DELETE", &uri, Some(&bob), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, listed) = ctx.send("GET", "/api/v1/transactions/", Some(&bob), None).await;
    assert!(listed.as_array().unwrap().is_empty());

    let (status, unchanged) = ctx.send("GET", &uri, Some(&alice), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(unchanged, created);
}

#[tokio::test]
async fn test_unknown_id_is_not_found() {
    let ctx = TestContext::new();
    let token = ctx.register("alice").await;

    let (status, body) = ctx
        .send("GET", "/api/v1/transactions/999", Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "Transaction not found");

    let (status, _) = ctx
        .send(
            "PUT",
            "/api/v1/transactions/999",
            Some(&token),
            Some(json!({ "item_name": "x" })),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_invalid_transactions_are_rejected() {
    let ctx = TestContext::new();
    let token = ctx.register("alice").await;

    let cases = [
        (json!({ "item_name": "", "amount": 100 }), "item_name"),
        (json!({ "item_name": "x".repeat(256), "amount": 100 }), "item_name"),
        (json!({ "item_name": "Tea", "amount": 0 }), "amount"),
        (json!({ "item_name": "Tea", "amount": -10 }), "amount"),
        (json!({ "item_name": "Tea", "amount": 2_147_483_648_i64 }), "amount"),
        (
            json!({ "item_name": "Tea", "amount": 10, "category": "c".repeat(101) }),
            "category",
        ),
        (
            json!({ "item_name": "Tea", "amount": 10, "note": "n".repeat(501) }),
            "note",
        ),
    ];

    for (payload, field) in cases {
        let (status, body) = ctx
            .send("POST", "/api/v1/transactions/", Some(&token), Some(payload))
            .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY, "{}", field);
        assert_eq!(body["error"], "validation_error");
        assert_eq!(body["details"][0]["field"], field);
    }

    let created = ctx.create_transaction(&token, "Tea", 10, None).await;
    let (status, body) = ctx
        .send(
            "PUT",
            &format!("/api/v1/transactions/{}", created["id"]),
            Some(&token),
            Some(json!({ "amount": 0 })),
        )
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["details"][0]["field"], "amount");

    let (status, _) = ctx
        .send(
            "PUT",
            &format!("/api/v1/transactions/{}", created["id"]),
            Some(&token),
            Some(json!({ "amount": 2_147_483_648_i64 })),
        )
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let (_, listed) = ctx.send("GET", "/api/v1/transactions/", Some(&token), None).await;
    assert_eq!(listed.as_array().unwrap().len(), 1);
    assert_eq!(listed[0]["amount"], 10);
}

// ---------------------------------------------------------------------------
// Analysis
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_analysis_without_transactions() {
    let ctx = TestContext::new();
    let token = ctx.register("alice").await;

    let (status, body) = ctx.send("GET", "/api/v1/analysis/", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total_amount"], 0);
    assert_eq!(body["transaction_count"], 0);
    assert_eq!(body["top_categories"], json!([]));
    assert!(body.get("error").is_none());
}

#[tokio::test]
async fn test_analysis_summarizes_and_passes_advice_through() {
    let advice = json!({
        "status": "warning",
        "message": "Watch the extras",
        "advice": "Uncategorized spending is your largest bucket.",
        "action_items": ["Tag purchases", "Cap dining out"]
    });
    let ctx = TestContext::with_advice(MockAdviceClient::replying(advice.to_string()));
    let token = ctx.register("alice").await;
    let other = ctx.register("bob").await;

    ctx.create_transaction(&token, "Lunch", 1000, Some("food")).await;
    ctx.create_transaction(&token, "Dinner", 500, Some("food")).await;
    ctx.create_transaction(&token, "Gift", 2000, None).await;
    ctx.create_transaction(&other, "Laptop", 150000, Some("tech")).await;

    let (status, body) = ctx.send("GET", "/api/v1/analysis/", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total_amount"], 3500);
    assert_eq!(body["transaction_count"], 3);
    assert_eq!(
        body["top_categories"],
        json!([
            { "category": "uncategorized", "amount": 2000 },
            { "category": "food", "amount": 1500 }
        ])
    );
    assert_eq!(body["ai_advice"], advice);
    assert!(body.get("error").is_none());

    let requests = ctx.advice.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].model, "test-model");
    assert_eq!(requests[0].max_tokens, 400);
    assert_eq!(requests[0].temperature, 0.7);
    assert!(requests[0].prompt.contains("Total spending: 3,500"));
    assert!(requests[0].prompt.contains("- uncategorized: 2,000"));
}

#[tokio::test]
async fn test_analysis_sums_largest_amounts_exactly() {
    let ctx = TestContext::new();
    let token = ctx.register("alice").await;

    ctx.create_transaction(&token, "House", 2_147_483_647, Some("housing"))
        .await;
    ctx.create_transaction(&token, "Boat", 2_147_483_647, Some("housing"))
        .await;

    let (status, body) = ctx.send("GET", "/api/v1/analysis/", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total_amount"], 4_294_967_294_i64);
    assert_eq!(body["top_categories"][0]["amount"], 4_294_967_294_i64);
}

#[tokio::test]
async fn test_analysis_reports_overflowing_totals_as_server_error() {
    let ctx = TestContext::new();
    let token = ctx.register("alice").await;
    let user = ctx
        .store
        .find_user_by_auth_id("alice")
        .await
        .unwrap()
        .unwrap();

    // Rows the API would reject, written straight into the store
    for item_name in ["a", "b"] {
        ctx.store
            .create(
                user.id,
                CreateTransaction {
                    item_name: item_name.to_string(),
                    amount: i64::MAX,
                    category: None,
                    note: None,
                },
            )
            .await
            .unwrap();
    }

    let (status, body) = ctx.send("GET", "/api/v1/analysis/", Some(&token), None).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "internal_error");
}

#[tokio::test]
async fn test_analysis_keeps_only_top_five_categories() {
    let ctx = TestContext::new();
    let token = ctx.register("alice").await;

    for (category, amount) in [
        ("a", 100),
        ("b", 600),
        ("c", 300),
        ("d", 300),
        ("e", 500),
        ("f", 400),
        ("g", 200),
    ] {
        ctx.create_transaction(&token, "item", amount, Some(category)).await;
    }

    let (_, body) = ctx.send("GET", "/api/v1/analysis/", Some(&token), None).await;
    let categories: Vec<_> = body["top_categories"]
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c["category"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(categories, vec!["b", "e", "f", "c", "d"]);
    assert_eq!(body["transaction_count"], 7);
    assert_eq!(body["total_amount"], 2400);
}

#[tokio::test]
async fn test_analysis_falls_back_when_advice_times_out() {
    let ctx = TestContext::with_advice(MockAdviceClient::failing(AdviceError::Timeout));
    let token = ctx.register("alice").await;
    ctx.create_transaction(&token, "Lunch", 1000, Some("food")).await;

    let (status, body) = ctx.send("GET", "/api/v1/analysis/", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total_amount"], 1000);
    assert_eq!(body["ai_advice"]["status"], "safe");
    assert_eq!(body["ai_advice"]["action_items"].as_array().unwrap().len(), 2);
    assert!(!body["error"].as_str().unwrap().is_empty());
    assert_eq!(ctx.advice.requests().len(), 1);
}

#[tokio::test]
async fn test_analysis_falls_back_on_malformed_advice() {
    for reply in [
        "Sure! Here is some advice: spend less.",
        r#"{"status":"safe","message":"m","advice":"a"}"#,
        r#"{"status":"great","message":"m","advice":"a","action_items":[]}"#,
    ] {
        let ctx = TestContext::with_advice(MockAdviceClient::replying(reply));
        let token = ctx.register("alice").await;

        let (status, body) = ctx.send("GET", "/api/v1/analysis/", Some(&token), None).await;
        assert_eq!(status, StatusCode::OK, "{}", reply);
        assert_eq!(body["ai_advice"]["status"], "safe");
        assert!(body["error"].is_string(), "{}", reply);
    }
}

// ---------------------------------------------------------------------------
// Users
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_register_uses_token_profile_and_rejects_duplicates() {
    let ctx = TestContext::new();
    let token = ctx.token_for("alice");

    let (status, user) = ctx
        .send("POST", "/api/v1/users/", Some(&token), Some(json!({})))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(user["auth_id"], "alice");
    assert_eq!(user["email"], "alice@example.com");
    assert_eq!(user["name"], "User alice");

    let (status, body) = ctx
        .send("POST", "/api/v1/users/", Some(&token), Some(json!({})))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "conflict");
}

#[tokio::test]
async fn test_register_requires_an_email() {
    let ctx = TestContext::new();
    let bare = mint_access_token(&ctx.config.jwt, "no-profile").unwrap();

    let (status, body) = ctx
        .send("POST", "/api/v1/users/", Some(&bare), Some(json!({ "name": "Nameless" })))
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["details"][0]["field"], "email");

    let (status, user) = ctx
        .send(
            "POST",
            "/api/v1/users/",
            Some(&bare),
            Some(json!({ "name": "Named", "email": "named@example.com" })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(user["email"], "named@example.com");
}

#[tokio::test]
async fn test_profile_read_update_and_delete_cascades() {
    let ctx = TestContext::new();
    let token = ctx.register("alice").await;
    ctx.create_transaction(&token, "Lunch", 1000, Some("food")).await;

    let (status, me) = ctx.send("GET", "/api/v1/users/me", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(me["auth_id"], "alice");

    let (status, updated) = ctx
        .send(
            "PUT",
            "/api/v1/users/me",
            Some(&token),
            Some(json!({ "name": "Alice", "avatar_url": "https://img.example/a.png" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["name"], "Alice");
    assert_eq!(updated["avatar_url"], "https://img.example/a.png");

    let (status, cleared) = ctx
        .send("PUT", "/api/v1/users/me", Some(&token), Some(json!({ "avatar_url": null })))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert!(cleared["avatar_url"].is_null());
    assert_eq!(cleared["name"], "Alice");

    let (status, _) = ctx.send("DELETE", "/api/v1/users/me", Some(&token), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, body) = ctx.send("GET", "/api/v1/users/me", Some(&token), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "User not found");

    let (status, _) = ctx.send("GET", "/api/v1/transactions/", Some(&token), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    // Re-registering starts from an empty ledger
    let token = ctx.register("alice").await;
    let (_, listed) = ctx.send("GET", "/api/v1/transactions/", Some(&token), None).await;
    assert!(listed.as_array().unwrap().is_empty());
}
