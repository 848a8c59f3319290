use anyhow::Result;
use serde_json::json;
use std::fs;
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use taleweaver::agent::LoopSettings;
use taleweaver::content::{ContentStore, RULES_FILE};
use taleweaver::conversation::Conversation;
use taleweaver::errors::TurnError;
use taleweaver::models::message::{Message, Role};
use taleweaver::narrator::{Narrator, TurnRequest};
use taleweaver::providers::configs::{AnthropicProviderConfig, ProviderConfig};

fn content_dir() -> Result<TempDir> {
    let dir = tempfile::tempdir()?;
    fs::write(dir.path().join(RULES_FILE), "You run a text adventure.")?;
    fs::create_dir_all(dir.path().join("tones"))?;
    fs::write(dir.path().join("tones/sarcastic.md"), "Be dry.")?;
    fs::write(
        dir.path().join("scenario.md"),
        "# The Vault\n\n## Opening\n\nA steel door blocks your way.\n",
    )?;
    Ok(dir)
}

fn narrator(dir: &TempDir, server: &MockServer) -> Result<Narrator> {
    let config = ProviderConfig::Anthropic(AnthropicProviderConfig {
        host: server.uri(),
        api_key: "test_api_key".to_string(),
        temperature: None,
        max_tokens: None,
    });
    Ok(Narrator::from_configs(
        ContentStore::new(dir.path()),
        LoopSettings::default(),
        vec![config],
    )?)
}

#[tokio::test]
async fn test_turn_with_random_outcome_over_http() -> Result<()> {
    let dir = content_dir()?;
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/messages"))
        .and(body_partial_json(json!({
            "system": "You run a text adventure.\n\nBe dry.\n\n\
                # The Vault\n\n## Opening\n\nA steel door blocks your way.\n",
            "tools": [{"name": "random_outcome"}]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "content": [{
                "type": "tool_use",
                "id": "toolu_1",
                "name": "random_outcome",
                "input": {"outcomes": ["opens", "opens"], "description": "forcing the door"}
            }],
            "stop_reason": "tool_use",
            "usage": {"input_tokens": 40, "output_tokens": 20}
        })))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/v1/messages"))
        .and(body_partial_json(json!({
            "messages": [
                {"role": "user", "content": "I force the door"},
                {"role": "assistant", "content": [{"type": "tool_use", "id": "toolu_1"}]},
                {"role": "user", "content": [{"type": "tool_result", "tool_use_id": "toolu_1"}]}
            ]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "content": [{"type": "text", "text": "The door swings open."}],
            "stop_reason": "end_turn",
            "usage": {"input_tokens": 60, "output_tokens": 8}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let narrator = narrator(&dir, &server)?;
    let mut conversation = Conversation::new();
    let text = narrator
        .play_turn(
            &mut conversation,
            TurnRequest::new("I force the door"),
            &CancellationToken::new(),
        )
        .await?;

    assert_eq!(text, "The door swings open.");
    assert_eq!(
        conversation.messages(),
        &[
            Message::user("I force the door"),
            Message::assistant("The door swings open.")
        ]
    );
    assert_eq!(conversation.last_role(), Some(Role::Assistant));
    Ok(())
}

#[tokio::test]
async fn test_server_error_keeps_conversation() -> Result<()> {
    let dir = content_dir()?;
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/messages"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let narrator = narrator(&dir, &server)?;
    let mut conversation =
        Conversation::from_messages(vec![Message::user("look"), Message::assistant("A door.")]);

    let result = narrator
        .play_turn(
            &mut conversation,
            TurnRequest::new("knock"),
            &CancellationToken::new(),
        )
        .await;

    assert!(matches!(result, Err(TurnError::Provider(_))));
    assert_eq!(conversation.len(), 2);
    Ok(())
}

#[test]
fn test_opening_from_default_scenario() -> Result<()> {
    let dir = content_dir()?;
    let store = ContentStore::new(dir.path());
    assert_eq!(store.opening(None)?, "A steel door blocks your way.");
    Ok(())
}
