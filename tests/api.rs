mod common;

use common::test_server::{ADMIN_EMAIL, TestServer};
use reqwest::Client;
use serde_json::{Value, json};

/// Registers a user through the sign-in upsert and mints a token for them
/// with the admin credential.
async fn register_with_token(server: &TestServer, client: &Client, email: &str) -> String {
    let resp = client
        .put(format!("{}/users", server.base_url))
        .json(&json!({"email": email, "displayName": "Test User"}))
        .send()
        .await
        .expect("register user");
    assert!(resp.status().is_success());

    let resp: Value = client
        .post(format!("{}/auth/tokens", server.base_url))
        .bearer_auth(&server.admin_token)
        .json(&json!({"email": email}))
        .send()
        .await
        .expect("issue token")
        .json()
        .await
        .expect("parse token response");

    resp["token"].as_str().expect("token").to_string()
}

async fn admin_status(server: &TestServer, client: &Client, email: &str) -> bool {
    let resp: Value = client
        .get(format!("{}/users/{}", server.base_url, email))
        .send()
        .await
        .expect("query admin status")
        .json()
        .await
        .expect("parse admin status");
    resp["admin"].as_bool().expect("admin flag")
}

#[tokio::test]
async fn test_purchase_lifecycle() {
    let server = TestServer::start().await;
    let client = Client::new();

    let resp: Value = client
        .post(format!("{}/purchase", server.base_url))
        .json(&json!({"email": "a@x.com", "item": "W1", "price": 250}))
        .send()
        .await
        .expect("create purchase")
        .json()
        .await
        .expect("parse insert result");
    let purchase_id = resp["insertedId"].as_str().expect("purchase id").to_string();

    // Fresh order: visible to its owner, no status field yet
    let mine: Value = client
        .get(format!("{}/myPurchases/a@x.com", server.base_url))
        .send()
        .await
        .expect("list my purchases")
        .json()
        .await
        .expect("parse purchases");
    let mine = mine.as_array().expect("array");
    assert_eq!(mine.len(), 1);
    assert_eq!(mine[0]["id"], purchase_id.as_str());
    assert_eq!(mine[0]["item"], "W1");
    assert!(mine[0].get("status").is_none());

    // Other customers see nothing
    let others: Value = client
        .get(format!("{}/myPurchases/b@x.com", server.base_url))
        .send()
        .await
        .expect("list other purchases")
        .json()
        .await
        .expect("parse purchases");
    assert!(others.as_array().expect("array").is_empty());

    // Admin ships the order
    let resp: Value = client
        .put(format!(
            "{}/dashboard/purchaseStatus/{}",
            server.base_url, purchase_id
        ))
        .bearer_auth(&server.admin_token)
        .send()
        .await
        .expect("ship purchase")
        .json()
        .await
        .expect("parse update result");
    assert_eq!(resp["matchedCount"], 1);

    let mine: Value = client
        .get(format!("{}/myPurchases/a@x.com", server.base_url))
        .send()
        .await
        .expect("list my purchases")
        .json()
        .await
        .expect("parse purchases");
    assert_eq!(mine[0]["status"], "Shipped");

    // Customer cancels; the document is gone
    let resp: Value = client
        .delete(format!("{}/purchase/{}", server.base_url, purchase_id))
        .send()
        .await
        .expect("cancel purchase")
        .json()
        .await
        .expect("parse delete result");
    assert_eq!(resp["deletedCount"], 1);

    let mine: Value = client
        .get(format!("{}/myPurchases/a@x.com", server.base_url))
        .send()
        .await
        .expect("list my purchases")
        .json()
        .await
        .expect("parse purchases");
    assert!(mine.as_array().expect("array").is_empty());
}

#[tokio::test]
async fn test_ship_and_cancel_unknown_ids_are_noops() {
    let server = TestServer::start().await;
    let client = Client::new();

    let resp: Value = client
        .put(format!(
            "{}/dashboard/purchaseStatus/no-such-id",
            server.base_url
        ))
        .bearer_auth(&server.admin_token)
        .send()
        .await
        .expect("ship unknown purchase")
        .json()
        .await
        .expect("parse update result");
    assert_eq!(resp["matchedCount"], 0);
    assert_eq!(resp["modifiedCount"], 0);

    let resp: Value = client
        .delete(format!("{}/purchase/no-such-id", server.base_url))
        .send()
        .await
        .expect("cancel unknown purchase")
        .json()
        .await
        .expect("parse delete result");
    assert_eq!(resp["deletedCount"], 0);

    let resp: Value = client
        .delete(format!("{}/dashboard/purchase/no-such-id", server.base_url))
        .bearer_auth(&server.admin_token)
        .send()
        .await
        .expect("admin cancel unknown purchase")
        .json()
        .await
        .expect("parse delete result");
    assert_eq!(resp["deletedCount"], 0);
}

#[tokio::test]
async fn test_grant_admin_requires_verified_identity() {
    let server = TestServer::start().await;
    let client = Client::new();

    register_with_token(&server, &client, "target@x.com").await;

    // No Authorization header at all
    let resp = client
        .put(format!("{}/users/admin", server.base_url))
        .json(&json!({"email": "target@x.com"}))
        .send()
        .await
        .expect("grant without identity");
    assert_eq!(resp.status().as_u16(), 401);
    let body: Value = resp.json().await.expect("parse error body");
    assert!(body["error"].is_string());

    // A token the identity provider rejects is the same as none
    let resp = client
        .put(format!("{}/users/admin", server.base_url))
        .bearer_auth("timekeeper_00000000_12345678901234567890123456789012")
        .json(&json!({"email": "target@x.com"}))
        .send()
        .await
        .expect("grant with bogus token");
    assert_eq!(resp.status().as_u16(), 401);

    assert!(!admin_status(&server, &client, "target@x.com").await);
}

#[tokio::test]
async fn test_grant_admin_non_admin_requester_is_silent_noop() {
    let server = TestServer::start().await;
    let client = Client::new();

    let customer_token = register_with_token(&server, &client, "mallory@x.com").await;
    register_with_token(&server, &client, "target@x.com").await;

    let resp = client
        .put(format!("{}/users/admin", server.base_url))
        .bearer_auth(&customer_token)
        .json(&json!({"email": "target@x.com"}))
        .send()
        .await
        .expect("grant as customer");
    assert!(resp.status().is_success());
    let body: Value = resp.json().await.expect("parse update result");
    assert_eq!(body["matchedCount"], 0);

    assert!(!admin_status(&server, &client, "target@x.com").await);
    // The requester did not promote themselves either
    assert!(!admin_status(&server, &client, "mallory@x.com").await);
}

#[tokio::test]
async fn test_grant_admin_by_admin_promotes_target() {
    let server = TestServer::start().await;
    let client = Client::new();

    let target_token = register_with_token(&server, &client, "target@x.com").await;
    assert!(!admin_status(&server, &client, "target@x.com").await);

    let resp: Value = client
        .put(format!("{}/users/admin", server.base_url))
        .bearer_auth(&server.admin_token)
        .json(&json!({"email": "target@x.com"}))
        .send()
        .await
        .expect("grant as admin")
        .json()
        .await
        .expect("parse update result");
    assert_eq!(resp["matchedCount"], 1);

    assert!(admin_status(&server, &client, "target@x.com").await);

    // The promoted user's existing token now opens the dashboard
    let resp = client
        .get(format!("{}/dashboard/allPurchases", server.base_url))
        .bearer_auth(&target_token)
        .send()
        .await
        .expect("list all purchases as new admin");
    assert!(resp.status().is_success());

    // Granting to an email with no user document matches nothing
    let resp: Value = client
        .put(format!("{}/users/admin", server.base_url))
        .bearer_auth(&server.admin_token)
        .json(&json!({"email": "nobody@x.com"}))
        .send()
        .await
        .expect("grant to missing target")
        .json()
        .await
        .expect("parse update result");
    assert_eq!(resp["matchedCount"], 0);
}

#[tokio::test]
async fn test_admin_status_query() {
    let server = TestServer::start().await;
    let client = Client::new();

    assert!(!admin_status(&server, &client, "nobody@x.com").await);

    register_with_token(&server, &client, "customer@x.com").await;
    assert!(!admin_status(&server, &client, "customer@x.com").await);

    assert!(admin_status(&server, &client, ADMIN_EMAIL).await);
}

#[tokio::test]
async fn test_dashboard_requires_admin() {
    let server = TestServer::start().await;
    let client = Client::new();

    let resp = client
        .get(format!("{}/dashboard/allPurchases", server.base_url))
        .send()
        .await
        .expect("anonymous dashboard request");
    assert_eq!(resp.status().as_u16(), 401);

    let customer_token = register_with_token(&server, &client, "customer@x.com").await;
    let resp = client
        .get(format!("{}/dashboard/allPurchases", server.base_url))
        .bearer_auth(&customer_token)
        .send()
        .await
        .expect("customer dashboard request");
    assert_eq!(resp.status().as_u16(), 403);

    let resp = client
        .post(format!("{}/dashboard/addProduct", server.base_url))
        .bearer_auth(&customer_token)
        .json(&json!({"name": "Daytona"}))
        .send()
        .await
        .expect("customer add product");
    assert_eq!(resp.status().as_u16(), 403);

    let resp: Value = client
        .get(format!("{}/dashboard/allPurchases", server.base_url))
        .bearer_auth(&server.admin_token)
        .send()
        .await
        .expect("admin dashboard request")
        .json()
        .await
        .expect("parse purchases");
    assert!(resp.as_array().expect("array").is_empty());
}

#[tokio::test]
async fn test_catalog_crud() {
    let server = TestServer::start().await;
    let client = Client::new();

    let resp: Value = client
        .post(format!("{}/dashboard/addProduct", server.base_url))
        .bearer_auth(&server.admin_token)
        .json(&json!({"name": "Speedmaster", "price": 6400, "img": "speedy.png"}))
        .send()
        .await
        .expect("add product")
        .json()
        .await
        .expect("parse insert result");
    let watch_id = resp["insertedId"].as_str().expect("watch id").to_string();

    let watches: Value = client
        .get(format!("{}/watches", server.base_url))
        .send()
        .await
        .expect("list watches")
        .json()
        .await
        .expect("parse watches");
    let watches = watches.as_array().expect("array");
    assert_eq!(watches.len(), 1);
    assert_eq!(watches[0]["name"], "Speedmaster");

    let watch: Value = client
        .get(format!("{}/watch/{}", server.base_url, watch_id))
        .send()
        .await
        .expect("get watch")
        .json()
        .await
        .expect("parse watch");
    assert_eq!(watch["price"], 6400);

    // Unknown ids read as an empty document
    let missing: Value = client
        .get(format!("{}/watch/no-such-id", server.base_url))
        .send()
        .await
        .expect("get missing watch")
        .json()
        .await
        .expect("parse missing watch");
    assert!(missing.is_null());

    let resp: Value = client
        .delete(format!("{}/dashboard/watches/{}", server.base_url, watch_id))
        .bearer_auth(&server.admin_token)
        .send()
        .await
        .expect("delete watch")
        .json()
        .await
        .expect("parse delete result");
    assert_eq!(resp["deletedCount"], 1);

    let watches: Value = client
        .get(format!("{}/watches", server.base_url))
        .send()
        .await
        .expect("list watches")
        .json()
        .await
        .expect("parse watches");
    assert!(watches.as_array().expect("array").is_empty());
}

#[tokio::test]
async fn test_reviews_roundtrip() {
    let server = TestServer::start().await;
    let client = Client::new();

    let resp = client
        .post(format!("{}/review", server.base_url))
        .json(&json!({"name": "Ana", "rating": 5, "comment": "Lovely dial"}))
        .send()
        .await
        .expect("add review");
    assert_eq!(resp.status().as_u16(), 201);

    let reviews: Value = client
        .get(format!("{}/reviews", server.base_url))
        .send()
        .await
        .expect("list reviews")
        .json()
        .await
        .expect("parse reviews");
    let reviews = reviews.as_array().expect("array");
    assert_eq!(reviews.len(), 1);
    assert_eq!(reviews[0]["rating"], 5);
}

#[tokio::test]
async fn test_user_registry() {
    let server = TestServer::start().await;
    let client = Client::new();

    let resp = client
        .post(format!("{}/users", server.base_url))
        .json(&json!({"email": "a@x.com", "displayName": "Ana"}))
        .send()
        .await
        .expect("create user");
    assert_eq!(resp.status().as_u16(), 201);

    let resp = client
        .post(format!("{}/users", server.base_url))
        .json(&json!({"email": "a@x.com"}))
        .send()
        .await
        .expect("create duplicate user");
    assert_eq!(resp.status().as_u16(), 409);

    // Upsert path: first sign-in inserts...
    let resp: Value = client
        .put(format!("{}/users", server.base_url))
        .json(&json!({"email": "b@x.com", "displayName": "First"}))
        .send()
        .await
        .expect("upsert new user")
        .json()
        .await
        .expect("parse upsert result");
    assert_eq!(resp["upsertedId"], "b@x.com");

    // ...repeat sign-in updates the same document
    let resp: Value = client
        .put(format!("{}/users", server.base_url))
        .json(&json!({"email": "b@x.com", "displayName": "Second"}))
        .send()
        .await
        .expect("upsert existing user")
        .json()
        .await
        .expect("parse upsert result");
    assert_eq!(resp["matchedCount"], 1);
    assert!(resp.get("upsertedId").is_none());

    // A role smuggled into the sign-in payload never grants anything
    let resp = client
        .put(format!("{}/users", server.base_url))
        .json(&json!({"email": "c@x.com", "role": "admin"}))
        .send()
        .await
        .expect("upsert with role");
    assert!(resp.status().is_success());
    assert!(!admin_status(&server, &client, "c@x.com").await);

    let resp = client
        .post(format!("{}/users", server.base_url))
        .json(&json!({"email": "not-an-email"}))
        .send()
        .await
        .expect("create user with bad email");
    assert_eq!(resp.status().as_u16(), 400);
}

#[tokio::test]
async fn test_token_issue_and_revoke() {
    let server = TestServer::start().await;
    let client = Client::new();

    // Tokens only exist for known users
    let resp = client
        .post(format!("{}/auth/tokens", server.base_url))
        .bearer_auth(&server.admin_token)
        .json(&json!({"email": "nobody@x.com"}))
        .send()
        .await
        .expect("issue token for unknown user");
    assert_eq!(resp.status().as_u16(), 404);

    register_with_token(&server, &client, "a@x.com").await;

    let resp = client
        .post(format!("{}/auth/tokens", server.base_url))
        .bearer_auth(&server.admin_token)
        .json(&json!({"email": "a@x.com", "expires_in_seconds": -5}))
        .send()
        .await
        .expect("issue token with negative expiry");
    assert_eq!(resp.status().as_u16(), 400);

    // Issuance is admin-only
    let resp = client
        .post(format!("{}/auth/tokens", server.base_url))
        .json(&json!({"email": "a@x.com"}))
        .send()
        .await
        .expect("issue token anonymously");
    assert_eq!(resp.status().as_u16(), 401);

    let resp: Value = client
        .post(format!("{}/auth/tokens", server.base_url))
        .bearer_auth(&server.admin_token)
        .json(&json!({"email": "a@x.com"}))
        .send()
        .await
        .expect("issue token")
        .json()
        .await
        .expect("parse token response");
    let token_id = resp["metadata"]["id"].as_str().expect("token id").to_string();
    assert_eq!(resp["metadata"]["email"], "a@x.com");

    let resp = client
        .delete(format!("{}/auth/tokens/{}", server.base_url, token_id))
        .bearer_auth(&server.admin_token)
        .send()
        .await
        .expect("revoke token");
    assert_eq!(resp.status().as_u16(), 204);

    let resp = client
        .delete(format!("{}/auth/tokens/{}", server.base_url, token_id))
        .bearer_auth(&server.admin_token)
        .send()
        .await
        .expect("revoke token again");
    assert_eq!(resp.status().as_u16(), 404);
}
