mod common;

use anyhow::Result;
use reqwest::StatusCode;
use serde_json::{json, Value};

use cafe_api::store::KeyValueStore;
use common::{cart, TestServer, DEVICE_KEY};

#[tokio::test]
async fn anonymous_order_is_recorded_and_queued() -> Result<()> {
    let server = TestServer::start().await?;

    let (status, body) = server.post("/orders", None, cart("5")).await?;
    assert_eq!(status, StatusCode::CREATED);
    let order_id = body["data"]["orderId"].as_str().unwrap().to_string();
    let order_number = body["data"]["orderNumber"].as_str().unwrap().to_string();
    assert!(order_number.starts_with("ORD"));

    let order = server.store.get(&format!("orders/{}", order_id)).await?.unwrap();
    assert_eq!(order["tableNumber"], "5");
    assert_eq!(order["status"], "pending");
    assert_eq!(order["total"].as_f64(), Some(210.0));

    let queued = server.store.get(&format!("queue/{}", order_id)).await?.unwrap();
    assert_eq!(queued["orderNumber"], order_number.as_str());
    assert_eq!(queued["tableNumber"], "5");
    Ok(())
}

#[tokio::test]
async fn empty_cart_is_rejected() -> Result<()> {
    let server = TestServer::start().await?;
    let (status, body) = server
        .post("/orders", None, json!({ "tableNumber": "1", "items": [], "total": 0 }))
        .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "VALIDATION_ERROR");
    Ok(())
}

#[tokio::test]
async fn checkout_options_use_minor_units() -> Result<()> {
    let server = TestServer::start().await?;
    let (status, body) = server
        .post("/checkout/options", None, json!({ "total": 210.5 }))
        .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["amount"], 21050);
    assert_eq!(body["data"]["currency"], "INR");
    assert_eq!(body["data"]["theme"]["color"], "#F59E0B");
    assert!(body["data"]["description"]
        .as_str()
        .unwrap()
        .starts_with("Food Order Payment - Order #"));
    Ok(())
}

#[tokio::test]
async fn signed_in_orders_show_up_in_history() -> Result<()> {
    let server = TestServer::start().await?;
    let token = server.register("9000000020", "Asha").await?;

    let res = server
        .client
        .post(server.url("/api/orders"))
        .bearer_auth(&token)
        .json(&cart("7"))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::CREATED);
    let saved: Value = res.json().await?;

    let history: Value = server
        .client
        .get(server.url("/api/orders"))
        .bearer_auth(&token)
        .send()
        .await?
        .json()
        .await?;
    let orders = history["data"].as_array().unwrap();
    assert_eq!(orders.len(), 1);
    assert_eq!(orders[0]["orderId"], saved["data"]["orderId"]);
    assert_eq!(orders[0]["items"][0]["name"], "Masala Chai");
    Ok(())
}

#[tokio::test]
async fn kitchen_requires_device_key() -> Result<()> {
    let server = TestServer::start().await?;

    let res = server.client.get(server.url("/api/kitchen/orders")).send().await?;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    let res = server
        .client
        .get(server.url("/api/kitchen/orders"))
        .header("X-Device-Key", "guess")
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
    Ok(())
}

#[tokio::test]
async fn kitchen_works_the_queue() -> Result<()> {
    let server = TestServer::start().await?;
    let (_, first) = server.post("/orders", None, cart("1")).await?;
    let (_, second) = server.post("/orders", None, cart("2")).await?;
    let first_id = first["data"]["orderId"].as_str().unwrap().to_string();
    let second_id = second["data"]["orderId"].as_str().unwrap().to_string();

    let kitchen = |req: reqwest::RequestBuilder| req.header("X-Device-Key", DEVICE_KEY);

    let next: Value = kitchen(server.client.get(server.url("/api/kitchen/queue/next")))
        .send()
        .await?
        .json()
        .await?;
    assert_eq!(next["data"]["orderId"], first_id.as_str());

    let res = kitchen(
        server
            .client
            .put(server.url(&format!("/api/kitchen/orders/{}/status", first_id))),
    )
    .json(&json!({ "status": "preparing" }))
    .send()
    .await?;
    assert_eq!(res.status(), StatusCode::OK);

    let preparing: Value = kitchen(server.client.get(server.url("/api/kitchen/orders?status=preparing")))
        .send()
        .await?
        .json()
        .await?;
    assert_eq!(preparing["data"].as_array().unwrap().len(), 1);

    let res = kitchen(
        server
            .client
            .post(server.url(&format!("/api/kitchen/orders/{}/complete", first_id))),
    )
    .send()
    .await?;
    assert_eq!(res.status(), StatusCode::OK);
    let done: Value = res.json().await?;
    assert_eq!(done["data"]["status"], "completed");

    let next: Value = kitchen(server.client.get(server.url("/api/kitchen/queue/next")))
        .send()
        .await?
        .json()
        .await?;
    assert_eq!(next["data"]["orderId"], second_id.as_str());

    let res = kitchen(
        server
            .client
            .delete(server.url(&format!("/api/kitchen/queue/{}", second_id))),
    )
    .send()
    .await?;
    assert_eq!(res.status(), StatusCode::OK);

    let next: Value = kitchen(server.client.get(server.url("/api/kitchen/queue/next")))
        .send()
        .await?
        .json()
        .await?;
    assert!(next["data"].is_null());

    // Removing from the queue leaves the order itself alone
    let order: Value = kitchen(
        server
            .client
            .get(server.url(&format!("/api/kitchen/orders/{}", second_id))),
    )
    .send()
    .await?
    .json()
    .await?;
    assert_eq!(order["data"]["status"], "pending");
    Ok(())
}

#[tokio::test]
async fn unknown_status_and_order_are_reported() -> Result<()> {
    let server = TestServer::start().await?;
    let (_, saved) = server.post("/orders", None, cart("3")).await?;
    let id = saved["data"]["orderId"].as_str().unwrap();

    let res = server
        .client
        .put(server.url(&format!("/api/kitchen/orders/{}/status", id)))
        .header("X-Device-Key", DEVICE_KEY)
        .json(&json!({ "status": "lost" }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let res = server
        .client
        .get(server.url("/api/kitchen/orders/404"))
        .header("X-Device-Key", DEVICE_KEY)
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    Ok(())
}
