//! Component façades against a mock server: paths, bodies and the space
//! export/import round trip.

mod common;

use anyhow::Result;
use kinetic_sdk::Query;
use kinetic_sdk::api::AttributeScope;
use serde_json::{Value, json};
use wiremock::matchers::{body_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn space_document() -> Value {
    json!({
        "space": {
            "name": "Acme",
            "kapps": [
                {
                    "slug": "services",
                    "name": "Services",
                    "forms": [{"slug": "intake", "name": "Intake"}]
                }
            ],
            "teams": [{"name": "Admins", "description": "Space admins"}]
        }
    })
}

#[tokio::test]
async fn test_export_space_writes_shape() -> Result<()> {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/acme/app/api/v1/space"))
        .and(query_param("export", "true"))
        .respond_with(ResponseTemplate::new(200).set_body_json(space_document()))
        .expect(1)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir()?;
    let client = common::builder(&server)
        .space("acme")
        .export_directory(dir.path())
        .build()?;
    let written = client.core().export_space().await?;
    assert_eq!(written.len(), 4);

    let read = |p: &str| -> Result<Value> {
        Ok(serde_json::from_slice(&std::fs::read(dir.path().join(p))?)?)
    };
    assert_eq!(read("space.json")?, json!({"name": "Acme"}));
    assert_eq!(read("space/kapps/services.json")?, json!({"name": "Services"}));
    assert_eq!(
        read("space/kapps/services/forms/intake.json")?,
        json!({"name": "Intake"})
    );
    assert_eq!(
        read("space/teams/Admins.json")?,
        json!({"description": "Space admins"})
    );
    Ok(())
}

#[tokio::test]
async fn test_import_space_reassembles_export() -> Result<()> {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/acme/app/api/v1/space"))
        .and(query_param("export", "true"))
        .respond_with(ResponseTemplate::new(200).set_body_json(space_document()))
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/acme/app/api/v1/space"))
        .and(query_param("import", "true"))
        .and(body_json(space_document()["space"].clone()))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir()?;
    let client = common::builder(&server)
        .space("acme")
        .export_directory(dir.path())
        .build()?;
    client.core().export_space().await?;
    let response = client.core().import_space().await?;

    assert_eq!(response.status(), 200);
    Ok(())
}

#[tokio::test]
async fn test_list_all_follows_page_tokens() -> Result<()> {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/app/api/v1/kapps/services/forms/intake/submissions"))
        .and(query_param("pageToken", "p2"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"submissions": [{"id": "3"}]})),
        )
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/app/api/v1/kapps/services/forms/intake/submissions"))
        .and(query_param("limit", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "submissions": [{"id": "1"}, {"id": "2"}],
            "nextPageToken": "p2"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = common::client(&server);
    let all = client
        .core()
        .submissions()
        .search_form_all("services", "intake", &Query::new().limit(2))
        .await?;

    let ids: Vec<&str> = all.iter().filter_map(|s| s["id"].as_str()).collect();
    assert_eq!(ids, vec!["1", "2", "3"]);
    Ok(())
}

#[tokio::test]
async fn test_attribute_definition_update() -> Result<()> {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/app/api/v1/kapps/services/formAttributeDefinitions/Owning%20Team"))
        .and(body_json(json!({"allowsMultiple": true})))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let client = common::client(&server);
    let response = client
        .core()
        .attribute_definitions(AttributeScope::Form("services"))
        .update("Owning Team", json!({"allowsMultiple": true}))
        .await?;
    assert_eq!(response.status(), 200);
    Ok(())
}

#[tokio::test]
async fn test_task_engine_start() -> Result<()> {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/app/api/v2/engine"))
        .and(body_json(json!({"action": "start"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"message": "started"})))
        .expect(1)
        .mount(&server)
        .await;

    let client = common::client(&server);
    let response = client.task().engine().start().await?;
    assert_eq!(response.content().unwrap()["message"], "started");
    Ok(())
}

#[tokio::test]
async fn test_tree_export_to_directory() -> Result<()> {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/app/api/v2/trees/Kinetic%20Request%20CE%20::%20Services%20::%20Submitted/export"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<tree/>"))
        .mount(&server)
        .await;

    let dir = tempfile::tempdir()?;
    let client = common::builder(&server).export_directory(dir.path()).build()?;
    let (file, response) = client
        .task()
        .trees()
        .export_to_directory("Kinetic Request CE :: Services :: Submitted")
        .await?;

    assert_eq!(response.status(), 200);
    assert_eq!(
        file,
        dir.path()
            .join("sources/Kinetic-Request-CE/trees/Services.Submitted.xml")
    );
    assert_eq!(std::fs::read_to_string(file)?, "<tree/>");
    Ok(())
}

#[tokio::test]
async fn test_message_content_normalized() -> Result<()> {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/app/discussions/api/v1/discussions/d-1/messages"))
        .and(body_json(json!({"content": [{"type": "text", "value": "hello"}]})))
        .respond_with(ResponseTemplate::new(201))
        .expect(1)
        .mount(&server)
        .await;

    let client = common::client(&server);
    let response = client.discussions().messages("d-1").add("hello").await?;
    assert_eq!(response.status(), 201);
    Ok(())
}

#[tokio::test]
async fn test_invitation_by_email() -> Result<()> {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/app/discussions/api/v1/discussions/d-1/invitations"))
        .and(body_json(json!({"email": "pat@example.com", "message": "Join us"})))
        .respond_with(ResponseTemplate::new(201))
        .expect(1)
        .mount(&server)
        .await;

    let client = common::client(&server);
    let response = client
        .discussions()
        .invitations("d-1")
        .invite_email("pat@example.com", Some("Join us"))
        .await?;
    assert_eq!(response.status(), 201);
    Ok(())
}

#[tokio::test]
async fn test_integrator_execute() -> Result<()> {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/app/integrator/api/connections/c-1/operations/o-1/execute"))
        .and(body_json(json!({"parameters": {"id": "42"}})))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let client = common::client(&server);
    let response = client
        .integrator()
        .execute("c-1", "o-1", json!({"parameters": {"id": "42"}}))
        .await?;
    assert_eq!(response.status(), 200);
    Ok(())
}

#[tokio::test]
async fn test_agent_through_space_proxy() -> Result<()> {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/acme/app/components/agent/app/api/v1/bridges"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"bridges": []})))
        .expect(1)
        .mount(&server)
        .await;

    let client = common::space_client(&server, "acme");
    let response = client.agent().bridges().list(&Query::new()).await?;
    assert_eq!(response.status(), 200);
    Ok(())
}

#[tokio::test]
#[allow(deprecated)]
async fn test_deprecated_alias_forwards() -> Result<()> {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/app/api/v1/kapps"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"kapps": []})))
        .expect(1)
        .mount(&server)
        .await;

    let client = common::client(&server);
    let response = client.core().find_kapps(&Query::new()).await?;
    assert_eq!(response.status(), 200);
    Ok(())
}

#[tokio::test]
async fn test_parallel_map_over_requests() -> Result<()> {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .respond_with(ResponseTemplate::new(204))
        .expect(3)
        .mount(&server)
        .await;

    let client = common::client(&server);
    let submissions = client.core().submissions();
    let results = kinetic_sdk::parallel::map(vec!["a", "b", "c"], 2, |id| {
        let submissions = submissions.clone();
        async move { submissions.delete(id).await }
    })
    .await;

    for result in results {
        assert_eq!(result?.status(), 204);
    }
    Ok(())
}
