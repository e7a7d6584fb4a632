use chat::{extract_content, with_context, ChatError};
use context::{ConversationStore, FilterOptions};
use serde_json::json;

#[tokio::test]
async fn records_user_and_assistant_turns_around_the_call() {
    let mut store = ConversationStore::new();
    let response = with_context(&mut store, "claude", &json!("What is Rust?"), |_prompt| async {
        Ok(json!({"content": [{"text": "A systems language."}]}))
    })
    .await
    .unwrap();

    assert_eq!(extract_content(&response).unwrap(), "A systems language.");
    let turns = store.messages();
    assert_eq!(turns.len(), 2);
    assert_eq!(turns[0].role, "user");
    assert_eq!(turns[0].content, "What is Rust?");
    assert_eq!(turns[1].role, "assistant");
    assert_eq!(turns[1].content, "A systems language.");
    assert_eq!(store.latest(Some("claude")), Some("A systems language."));
}

#[tokio::test]
async fn understands_the_choices_shape() {
    let mut store = ConversationStore::new();
    with_context(&mut store, "gpt", &json!("hi"), |_prompt| async {
        Ok(json!({"choices": [{"message": {"content": "hello"}}]}))
    })
    .await
    .unwrap();
    assert_eq!(store.latest(Some("gpt")), Some("hello"));
}

#[tokio::test]
async fn unknown_response_shape_leaves_only_the_user_turn() {
    let mut store = ConversationStore::new();
    let err = with_context(&mut store, "claude", &json!("hi"), |_prompt| async {
        Ok(json!({"unexpected": true}))
    })
    .await
    .unwrap_err();

    assert!(matches!(err, ChatError::UnsupportedFormat));
    let turns = store.filter(&FilterOptions::new().assistant_name("claude"));
    assert_eq!(turns.len(), 1);
    assert_eq!(turns[0].role, "user");
}

#[tokio::test]
async fn non_string_prompt_records_nothing() {
    let mut store = ConversationStore::new();
    let err = with_context(&mut store, "claude", &json!(42), |_prompt| async {
        Ok(json!({"content": [{"text": "unreachable"}]}))
    })
    .await
    .unwrap_err();

    assert!(matches!(err, ChatError::InvalidPrompt));
    assert!(store.is_empty());
}

#[tokio::test]
async fn call_failure_propagates_after_the_user_turn() {
    let mut store = ConversationStore::new();
    let err = with_context(&mut store, "claude", &json!("hi"), |_prompt| async {
        Err(ChatError::Call("connection refused".to_string()))
    })
    .await
    .unwrap_err();

    assert!(matches!(err, ChatError::Call(_)));
    assert_eq!(store.len(), 1);
}

#[test]
fn extract_content_probes_both_shapes() {
    let anthropic = json!({"content": [{"text": "a"}]});
    let openai = json!({"choices": [{"message": {"content": "b"}}]});
    assert_eq!(extract_content(&anthropic).unwrap(), "a");
    assert_eq!(extract_content(&openai).unwrap(), "b");
    assert!(matches!(
        extract_content(&json!({})),
        Err(ChatError::UnsupportedFormat)
    ));
}
