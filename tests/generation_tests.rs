use lazada_rs::generation::{API_KEY_HEADER, FAST_MODEL, THINKING_MODEL};
use lazada_rs::{ErrorKind, TitleGenerator, TitleRequest};
use mockito::Matcher;
use pretty_assertions::assert_eq;
use serde_json::json;


use test_helpers::StubTransport;

fn gemini_body(text: &str) -> String {
    json!({
        "candidates": [{
            "content": {"role": "model", "parts": [{"text": text}]},
            "finishReason": "STOP"
        }]
    })
    .to_string()
}

#[tokio::test]
async fn test_generate_titles_over_http() {
    let mut server = mockito::Server::new_async().await;
    let path = format!(r"^/models/{}:generateContent(\?.*)?$", FAST_MODEL);
    let mock = server
        .mock("POST", Matcher::Regex(path))
        .match_header(API_KEY_HEADER, "gemini-test-key")
        .match_body(Matcher::PartialJson(json!({
            "generationConfig": {"responseMimeType": "application/json"}
        })))
        .with_status(200)
        .with_body(gemini_body(r#"["Red Runner Shoes", "Lightweight Red Sneakers"]"#))
        .create_async()
        .await;

    let generator = TitleGenerator::new("gemini-test-key")
        .unwrap()
        .with_base_url(server.url());
    let titles = generator
        .generate_titles(&TitleRequest::new("Red running shoes", 2))
        .await
        .unwrap();

    assert_eq!(titles, vec!["Red Runner Shoes", "Lightweight Red Sneakers"]);
    mock.assert_async().await;
}

#[tokio::test]
async fn test_thinking_mode_uses_reasoning_model() {
    let transport = StubTransport::ok(200, r#"{"candidates":[{"content":{"parts":[{"text":"[\"A\"]"}]}}]}"#);
    let generator = TitleGenerator::new("k").unwrap().with_transport(transport.clone());

    generator
        .generate_titles(&TitleRequest::new("Shoes", 1).thinking(true))
        .await
        .unwrap();

    let request = transport.last_request();
    assert!(request.url.contains(&format!("/models/{}:generateContent", THINKING_MODEL)));
    assert!(!request.url.contains('?'));
    assert_eq!(request.header(API_KEY_HEADER), Some("k"));

    let body: serde_json::Value = serde_json::from_slice(&request.body.unwrap()).unwrap();
    assert_eq!(body["generationConfig"]["thinkingConfig"]["thinkingBudget"], 32768);
}

#[tokio::test]
async fn test_malformed_generation_is_protocol_error() {
    let transport = StubTransport::ok(200, r#"{"candidates":[{"content":{"parts":[{"text":"Sorry, I can't."}]}}]}"#);
    let generator = TitleGenerator::new("k").unwrap().with_transport(transport);

    let err = generator
        .generate_titles(&TitleRequest::new("Shoes", 3))
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::ProtocolError);
}

#[tokio::test]
async fn test_generation_http_error_is_protocol_error() {
    let transport = StubTransport::ok(403, r#"{"error":{"code":403,"status":"PERMISSION_DENIED"}}"#);
    let generator = TitleGenerator::new("k").unwrap().with_transport(transport);

    let err = generator
        .generate_titles(&TitleRequest::new("Shoes", 3))
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::ProtocolError);
    assert_eq!(err.status(), Some(403));
}

#[tokio::test]
async fn test_invalid_request_never_dispatches() {
    let transport = StubTransport::ok(200, "{}");
    let generator = TitleGenerator::new("k").unwrap().with_transport(transport.clone());

    let err = generator
        .generate_titles(&TitleRequest::new("Shoes", 0))
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::ConfigurationError);
    assert_eq!(transport.request_count(), 0);
}

#[tokio::test]
async fn test_transport_failure_does_not_expose_api_key() {
    // Grab a free port, then close it so nothing is listening
    let port = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    };

    let generator = TitleGenerator::new("SUPERSECRETGEMINIKEY")
        .unwrap()
        .with_base_url(format!("http://127.0.0.1:{}", port));
    let err = generator
        .generate_titles(&TitleRequest::new("Shoes", 3))
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::TransportError);
    assert!(!err.to_string().contains("SUPERSECRETGEMINIKEY"));
    assert!(!format!("{:?}", err).contains("SUPERSECRETGEMINIKEY"));
    assert!(!format!("{:?}", generator).contains("SUPERSECRETGEMINIKEY"));
}

#[test]
fn test_empty_api_key_is_rejected() {
    let err = TitleGenerator::new("  ").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ConfigurationError);
}
