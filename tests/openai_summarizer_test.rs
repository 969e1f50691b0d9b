use httpmock::prelude::*;
use serde_json::json;
use ynamazon::adapters::openai::OpenAiSummarizer;
use ynamazon::domain::model::SummaryRequest;
use ynamazon::domain::ports::MemoSummarizer;
use ynamazon::YnaError;

fn request() -> SummaryRequest {
    SummaryRequest {
        items: vec![
            "Organic Grade A Maple Syrup, Amber Color, Rich Taste, 32 fl oz".to_string(),
            "Stainless Steel Whisk Set (2)".to_string(),
        ],
        markdown: false,
    }
}

fn completion(content: &str) -> serde_json::Value {
    json!({
        "id": "chatcmpl-1",
        "choices": [{"index": 0, "message": {"role": "assistant", "content": content}}]
    })
}

#[tokio::test]
async fn test_summary_is_returned() {
    let server = MockServer::start();
    let chat = server.mock(|when, then| {
        when.method(POST)
            .path("/chat/completions")
            .header("Authorization", "Bearer sk-test")
            .body_contains("gpt-4o-mini")
            .body_contains("Stainless Steel Whisk Set (2)");
        then.status(200).json_body(completion("Maple syrup and a whisk set"));
    });

    let summarizer = OpenAiSummarizer::new(&server.base_url(), "sk-test", "gpt-4o-mini").unwrap();
    let summary = summarizer.summarize(&request()).await.unwrap();

    chat.assert();
    assert_eq!(summary.as_deref(), Some("Maple syrup and a whisk set"));
}

#[tokio::test]
async fn test_long_summary_is_cut_to_memo_limit() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(POST).path("/chat/completions");
        then.status(200).json_body(completion(&"é".repeat(600)));
    });

    let summarizer = OpenAiSummarizer::new(&server.base_url(), "sk-test", "gpt-4o-mini").unwrap();
    let summary = summarizer.summarize(&request()).await.unwrap().unwrap();

    assert_eq!(summary.chars().count(), 500);
}

#[tokio::test]
async fn test_unauthorized_is_fatal() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(POST).path("/chat/completions");
        then.status(401)
            .json_body(json!({"error": {"message": "Incorrect API key provided"}}));
    });

    let summarizer = OpenAiSummarizer::new(&server.base_url(), "sk-bad", "gpt-4o-mini").unwrap();
    let result = summarizer.summarize(&request()).await;

    assert!(matches!(result, Err(YnaError::InvalidOpenAiKey)));
}

#[tokio::test]
async fn test_rate_limit_and_server_errors_yield_no_summary() {
    let server = MockServer::start();
    let mut limited = server.mock(|when, then| {
        when.method(POST).path("/chat/completions");
        then.status(429).body("slow down");
    });

    let summarizer = OpenAiSummarizer::new(&server.base_url(), "sk-test", "gpt-4o-mini").unwrap();
    assert_eq!(summarizer.summarize(&request()).await.unwrap(), None);
    limited.delete();

    server.mock(|when, then| {
        when.method(POST).path("/chat/completions");
        then.status(500).body("internal error");
    });
    assert_eq!(summarizer.summarize(&request()).await.unwrap(), None);
}

#[tokio::test]
async fn test_empty_choices_is_an_empty_response() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(POST).path("/chat/completions");
        then.status(200).json_body(json!({"choices": []}));
    });

    let summarizer = OpenAiSummarizer::new(&server.base_url(), "sk-test", "gpt-4o-mini").unwrap();
    let result = summarizer.summarize(&request()).await;

    assert!(matches!(result, Err(YnaError::EmptyAiResponse)));
}

#[test]
fn test_blank_key_is_rejected() {
    assert!(matches!(
        OpenAiSummarizer::new("https://api.openai.com/v1", "  ", "gpt-4o-mini"),
        Err(YnaError::MissingOpenAiKey)
    ));
}
