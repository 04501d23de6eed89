mod common;

use anyhow::Result;
use reqwest::StatusCode;
use serde_json::json;

async fn create_named(
    server: &common::TestServer,
    client: &reqwest::Client,
    token: &str,
    kind: &str,
    name: &str,
) -> Result<String> {
    let res = client
        .post(format!("{}/api/{}", server.base_url, kind))
        .bearer_auth(token)
        .json(&json!({ "name": name }))
        .send()
        .await?;
    anyhow::ensure!(
        res.status() == StatusCode::CREATED,
        "{} creation failed: {}",
        kind,
        res.text().await.unwrap_or_default()
    );
    let body = res.json::<serde_json::Value>().await?;
    Ok(body["data"]["id"].as_str().unwrap_or_default().to_string())
}

async fn create_recipe(
    server: &common::TestServer,
    client: &reqwest::Client,
    token: &str,
    payload: serde_json::Value,
) -> Result<serde_json::Value> {
    let res = client
        .post(format!("{}/api/recipes", server.base_url))
        .bearer_auth(token)
        .json(&payload)
        .send()
        .await?;
    anyhow::ensure!(
        res.status() == StatusCode::CREATED,
        "recipe creation failed: {}",
        res.text().await.unwrap_or_default()
    );
    let body = res.json::<serde_json::Value>().await?;
    Ok(body["data"].clone())
}

#[tokio::test]
async fn list_returns_summaries_with_bare_ids() -> Result<()> {
    let server = common::ensure_server().await?;
    let client = reqwest::Client::new();
    let session = common::register_user(server, &client).await?;

    let tag = create_named(server, &client, &session.token, "tags", "Dessert").await?;
    let created = create_recipe(
        server,
        &client,
        &session.token,
        json!({
            "title": "Lemon tart",
            "time_minutes": 45,
            "price": "5.50",
            "link": "https://example.com/lemon-tart",
            "tags": [&tag],
        }),
    )
    .await?;
    assert_eq!(created["title"], "Lemon tart");

    let res = client
        .get(format!("{}/api/recipes", server.base_url))
        .bearer_auth(&session.token)
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);
    let body = res.json::<serde_json::Value>().await?;
    let recipes = body["data"].as_array().cloned().unwrap_or_default();
    assert_eq!(recipes.len(), 1);

    let summary = &recipes[0];
    assert_eq!(summary["title"], "Lemon tart");
    assert_eq!(summary["time_minutes"], 45);
    assert_eq!(summary["price"], "5.50");
    // Associations are bare id strings, not expanded objects
    let tags = summary["tags"].as_array().cloned().unwrap_or_default();
    assert_eq!(tags.len(), 1);
    assert_eq!(tags[0], json!(tag));

    Ok(())
}

#[tokio::test]
async fn retrieve_expands_tags_and_ingredients() -> Result<()> {
    let server = common::ensure_server().await?;
    let client = reqwest::Client::new();
    let session = common::register_user(server, &client).await?;

    let tag = create_named(server, &client, &session.token, "tags", "Vegan").await?;
    let ingredient = create_named(server, &client, &session.token, "ingredients", "Chickpeas").await?;
    let created = create_recipe(
        server,
        &client,
        &session.token,
        json!({
            "title": "Chickpea curry",
            "time_minutes": 30,
            "price": "4.25",
            "tags": [tag],
            "ingredients": [ingredient],
        }),
    )
    .await?;
    let id = created["id"].as_str().unwrap_or_default();

    let res = client
        .get(format!("{}/api/recipes/{}", server.base_url, id))
        .bearer_auth(&session.token)
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);
    let body = res.json::<serde_json::Value>().await?;
    let detail = &body["data"];

    // Same underlying data, expanded shape for the single-item fetch
    assert_eq!(detail["title"], "Chickpea curry");
    assert_eq!(detail["tags"][0]["name"], "Vegan");
    assert_eq!(detail["ingredients"][0]["name"], "Chickpeas");

    Ok(())
}

#[tokio::test]
async fn another_identity_reads_not_found() -> Result<()> {
    let server = common::ensure_server().await?;
    let client = reqwest::Client::new();

    let alice = common::register_user(server, &client).await?;
    let bob = common::register_user(server, &client).await?;

    let created = create_recipe(
        server,
        &client,
        &alice.token,
        json!({ "title": "Secret stew", "time_minutes": 60, "price": "7.00" }),
    )
    .await?;
    let id = created["id"].as_str().unwrap_or_default();

    // Retrieve, update and delete by a peer are indistinguishable from a missing row
    let res = client
        .get(format!("{}/api/recipes/{}", server.base_url, id))
        .bearer_auth(&bob.token)
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    let res = client
        .patch(format!("{}/api/recipes/{}", server.base_url, id))
        .bearer_auth(&bob.token)
        .json(&json!({ "title": "Hijacked" }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    let res = client
        .delete(format!("{}/api/recipes/{}", server.base_url, id))
        .bearer_auth(&bob.token)
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    // Still intact for the owner
    let res = client
        .get(format!("{}/api/recipes/{}", server.base_url, id))
        .bearer_auth(&alice.token)
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);

    Ok(())
}

#[tokio::test]
async fn create_rejects_invalid_fields_and_stores_nothing() -> Result<()> {
    let server = common::ensure_server().await?;
    let client = reqwest::Client::new();
    let session = common::register_user(server, &client).await?;

    let res = client
        .post(format!("{}/api/recipes", server.base_url))
        .bearer_auth(&session.token)
        .json(&json!({ "title": "  ", "time_minutes": -5, "price": "-1.00" }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body = res.json::<serde_json::Value>().await?;
    for field in ["title", "time_minutes", "price"] {
        assert!(
            body["field_errors"].get(field).is_some(),
            "expected field error for {}: {}",
            field,
            body
        );
    }

    let res = client
        .get(format!("{}/api/recipes", server.base_url))
        .bearer_auth(&session.token)
        .send()
        .await?;
    let body = res.json::<serde_json::Value>().await?;
    assert_eq!(body["data"].as_array().map(|a| a.len()), Some(0));

    Ok(())
}

#[tokio::test]
async fn patch_updates_fields_and_replaces_tag_set() -> Result<()> {
    let server = common::ensure_server().await?;
    let client = reqwest::Client::new();
    let session = common::register_user(server, &client).await?;

    let breakfast = create_named(server, &client, &session.token, "tags", "Breakfast").await?;
    let brunch = create_named(server, &client, &session.token, "tags", "Brunch").await?;

    let created = create_recipe(
        server,
        &client,
        &session.token,
        json!({ "title": "Pancakes", "time_minutes": 20, "price": "2.50", "tags": [breakfast] }),
    )
    .await?;
    let id = created["id"].as_str().unwrap_or_default();

    let res = client
        .patch(format!("{}/api/recipes/{}", server.base_url, id))
        .bearer_auth(&session.token)
        .json(&json!({ "title": "Fluffy pancakes", "tags": [&brunch] }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);
    let body = res.json::<serde_json::Value>().await?;
    let summary = &body["data"];

    assert_eq!(summary["title"], "Fluffy pancakes");
    // Untouched fields survive a partial update
    assert_eq!(summary["time_minutes"], 20);
    assert_eq!(summary["price"], "2.50");
    // The association set was replaced, not merged
    let tags = summary["tags"].as_array().cloned().unwrap_or_default();
    assert_eq!(tags, vec![json!(brunch)]);

    Ok(())
}

#[tokio::test]
async fn put_replaces_the_whole_recipe() -> Result<()> {
    let server = common::ensure_server().await?;
    let client = reqwest::Client::new();
    let session = common::register_user(server, &client).await?;

    let created = create_recipe(
        server,
        &client,
        &session.token,
        json!({
            "title": "Toast",
            "time_minutes": 5,
            "price": "1.00",
            "link": "https://example.com/toast",
        }),
    )
    .await?;
    let id = created["id"].as_str().unwrap_or_default();

    let res = client
        .put(format!("{}/api/recipes/{}", server.base_url, id))
        .bearer_auth(&session.token)
        .json(&json!({ "title": "French toast", "time_minutes": 15, "price": "3.00" }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);
    let body = res.json::<serde_json::Value>().await?;
    let summary = &body["data"];

    assert_eq!(summary["title"], "French toast");
    assert_eq!(summary["time_minutes"], 15);
    assert_eq!(summary["price"], "3.00");
    // Full replace clears the link that the payload omitted
    assert_eq!(summary["link"], serde_json::Value::Null);

    Ok(())
}

#[tokio::test]
async fn delete_removes_recipe_but_keeps_attributes() -> Result<()> {
    let server = common::ensure_server().await?;
    let client = reqwest::Client::new();
    let session = common::register_user(server, &client).await?;

    let tag = create_named(server, &client, &session.token, "tags", "Keeper").await?;
    let created = create_recipe(
        server,
        &client,
        &session.token,
        json!({ "title": "Short-lived", "time_minutes": 10, "price": "2.00", "tags": [tag] }),
    )
    .await?;
    let id = created["id"].as_str().unwrap_or_default();

    let res = client
        .delete(format!("{}/api/recipes/{}", server.base_url, id))
        .bearer_auth(&session.token)
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::NO_CONTENT);

    let res = client
        .get(format!("{}/api/recipes/{}", server.base_url, id))
        .bearer_auth(&session.token)
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    // Deleting the recipe cascades to its association rows only
    let res = client
        .get(format!("{}/api/tags", server.base_url))
        .bearer_auth(&session.token)
        .send()
        .await?;
    let body = res.json::<serde_json::Value>().await?;
    let names: Vec<&str> = body["data"]
        .as_array()
        .map(|a| a.iter().filter_map(|t| t["name"].as_str()).collect())
        .unwrap_or_default();
    assert_eq!(names, vec!["Keeper"]);

    Ok(())
}
