mod common;

use anyhow::Result;
use reqwest::StatusCode;
use serde_json::{json, Value};

#[tokio::test]
async fn login_create_then_find() -> Result<()> {
    let server = common::spawn_server().await?;
    let token = server.admin_token().await?;

    let res = server
        .client
        .post(server.url("/characters"))
        .bearer_auth(&token)
        .json(&json!({ "name": "Arya", "role": "Assassin", "strength_id": 1 }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::CREATED);

    let body = res.json::<Value>().await?;
    let character = &body["character"];
    assert_eq!(character["id"], 13);
    assert_eq!(character["house"], json!({}));
    assert_eq!(character["strength"], json!({ "id": 1, "description": "Sword fighting" }));

    let (status, body) = server.list("name=Arya").await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], 1);
    assert_eq!(body["total"], 1);
    assert_eq!(common::ids(&body), vec![13]);
    Ok(())
}

#[tokio::test]
async fn singular_create_route_is_an_alias() -> Result<()> {
    let server = common::spawn_server().await?;
    let token = server.admin_token().await?;

    let res = server
        .client
        .post(server.url("/character"))
        .bearer_auth(&token)
        .json(&json!({ "name": "Gendry", "role": "Smith", "strength": "Smithing", "house": "Baratheon" }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::CREATED);

    let body = res.json::<Value>().await?;
    assert_eq!(body["character"]["house"], json!({ "id": 7, "name": "Baratheon" }));
    assert_eq!(body["character"]["strength"], json!({ "id": 8, "description": "Smithing" }));
    Ok(())
}

#[tokio::test]
async fn get_returns_nested_relations() -> Result<()> {
    let server = common::spawn_server().await?;

    let res = server.client.get(server.url("/characters/1")).send().await?;
    assert_eq!(res.status(), StatusCode::OK);
    let jon = res.json::<Value>().await?;
    assert_eq!(jon["name"], "Jon Snow");
    assert_eq!(jon["house"], json!({ "id": 1, "name": "Stark" }));
    assert_eq!(jon["strength"], json!({ "id": 1, "description": "Sword fighting" }));

    let res = server.client.get(server.url("/characters/8")).send().await?;
    assert_eq!(res.json::<Value>().await?["house"], json!({}));

    let res = server.client.get(server.url("/characters/999")).send().await?;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    let res = server.client.get(server.url("/characters/abc")).send().await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    Ok(())
}

#[tokio::test]
async fn duplicate_name_is_rejected_without_writing() -> Result<()> {
    let server = common::spawn_server().await?;
    let token = server.admin_token().await?;

    let res = server
        .client
        .post(server.url("/characters"))
        .bearer_auth(&token)
        .json(&json!({ "name": "Jon Snow", "role": "Impostor", "strength_id": 2 }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    assert!(res.json::<Value>().await?["field_errors"]["name"].is_string());

    let (_, body) = server.list("name=Jon%20Snow&limit=10").await?;
    assert_eq!(body["total"], 1);
    assert_eq!(body["characters"][0]["role"], "King in the North");
    Ok(())
}

#[tokio::test]
async fn create_validates_references() -> Result<()> {
    let server = common::spawn_server().await?;
    let token = server.admin_token().await?;

    for (payload, field) in [
        (json!({ "name": "Arya", "role": "Assassin" }), "strength_id"),
        (json!({ "name": "Arya", "role": "Assassin", "strength_id": 999 }), "strength_id"),
        (json!({ "name": "Arya", "role": "Assassin", "strength_id": 1, "house_id": 999 }), "house_id"),
        (json!({ "name": "Arya", "role": "Assassin", "strength_id": 1, "house": "Stark", "house_id": 1 }), "house_id"),
        (json!({ "name": "Arya", "role": "Assassin", "strength_id": 1, "age": -3 }), "age"),
    ] {
        let res = server.client.post(server.url("/characters")).bearer_auth(&token).json(&payload).send().await?;
        assert_eq!(res.status(), StatusCode::BAD_REQUEST, "payload {}", payload);
        let body = res.json::<Value>().await?;
        assert!(body["field_errors"][field].is_string(), "expected error on {}: {}", field, body);
    }

    let (_, body) = server.list("name=Arya").await?;
    assert_eq!(body["total"], 0);
    Ok(())
}

#[tokio::test]
async fn malformed_bodies_are_validation_errors() -> Result<()> {
    let server = common::spawn_server().await?;
    let token = server.admin_token().await?;

    let res = server
        .client
        .post(server.url("/characters"))
        .bearer_auth(&token)
        .header("content-type", "application/json")
        .body("{ not json")
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    assert_eq!(res.json::<Value>().await?["code"], "VALIDATION_ERROR");

    let res = server
        .client
        .post(server.url("/characters"))
        .bearer_auth(&token)
        .json(&json!({ "name": "Arya", "role": "Assassin", "strength_id": 1, "weapon": "Needle" }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    Ok(())
}

#[tokio::test]
async fn partial_update_changes_only_given_fields() -> Result<()> {
    let server = common::spawn_server().await?;
    let token = server.admin_token().await?;

    let before = server.client.get(server.url("/characters/3")).send().await?.json::<Value>().await?;

    let res = server
        .client
        .patch(server.url("/characters/3"))
        .bearer_auth(&token)
        .json(&json!({ "age": 42 }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);

    let after = server.client.get(server.url("/characters/3")).send().await?.json::<Value>().await?;
    let mut expected = before.clone();
    expected["age"] = json!(42);
    assert_eq!(after, expected);
    Ok(())
}

#[tokio::test]
async fn update_rejects_unknown_fields_and_keeps_record() -> Result<()> {
    let server = common::spawn_server().await?;
    let token = server.admin_token().await?;
    let before = server.client.get(server.url("/characters/3")).send().await?.json::<Value>().await?;

    let res = server
        .client
        .patch(server.url("/characters/3"))
        .bearer_auth(&token)
        .json(&json!({ "age": 50, "not_a_field": 1 }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let after = server.client.get(server.url("/characters/3")).send().await?.json::<Value>().await?;
    assert_eq!(after, before);
    Ok(())
}

#[tokio::test]
async fn update_can_clear_house_but_not_strength() -> Result<()> {
    let server = common::spawn_server().await?;
    let token = server.admin_token().await?;

    let res = server
        .client
        .patch(server.url("/characters/1"))
        .bearer_auth(&token)
        .json(&json!({ "house_id": null, "nickname": null }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);
    let body = res.json::<Value>().await?;
    assert_eq!(body["character"]["house"], json!({}));
    assert_eq!(body["character"]["nickname"], Value::Null);

    let res = server
        .client
        .patch(server.url("/characters/1"))
        .bearer_auth(&token)
        .json(&json!({ "strength_id": null }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let res = server.client.patch(server.url("/characters/1")).bearer_auth(&token).json(&json!({})).send().await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let res =
        server.client.patch(server.url("/characters/999")).bearer_auth(&token).json(&json!({ "age": 1 })).send().await?;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    Ok(())
}

#[tokio::test]
async fn delete_removes_then_reports_not_found() -> Result<()> {
    let server = common::spawn_server().await?;
    let token = server.admin_token().await?;

    let res = server.client.delete(server.url("/characters/12")).bearer_auth(&token).send().await?;
    assert_eq!(res.status(), StatusCode::OK);
    assert!(res.json::<Value>().await?["message"].is_string());

    let res = server.client.get(server.url("/characters/12")).send().await?;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    let res = server.client.delete(server.url("/characters/12")).bearer_auth(&token).send().await?;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    Ok(())
}
