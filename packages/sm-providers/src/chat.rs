use std::time::Duration;

use reqwest::Client;
use serde_json::Value;

use crate::{Error, Result, structured};

const MAX_ATTEMPTS: usize = 2;

/// Sends an OpenAI-compatible chat completion and returns the reply parsed as JSON.
///
/// A reply that fails tolerant parsing is retried once against the same model before giving up.
pub async fn complete_json(cfg: &sm_config::LlmProviderConfig, messages: &[Value]) -> Result<Value> {
	let client = Client::builder().timeout(Duration::from_millis(cfg.timeout_ms)).build()?;
	let url = format!("{}{}", cfg.api_base, cfg.path);
	let mut last_err = None;

	for _ in 0..MAX_ATTEMPTS {
		let body = serde_json::json!({
			"model": cfg.model,
			"temperature": cfg.temperature,
			"messages": messages,
		});
		let res = client
			.post(&url)
			.headers(crate::auth_headers(&cfg.api_key, &cfg.default_headers)?)
			.json(&body)
			.send()
			.await?;
		let json: Value = res.error_for_status()?.json().await?;

		match parse_chat_json(json) {
			Ok(parsed) => return Ok(parsed),
			Err(err) => last_err = Some(err),
		}
	}

	Err(last_err.unwrap_or_else(|| Error::invalid_response("Chat response is not valid JSON.")))
}

fn parse_chat_json(json: Value) -> Result<Value> {
	if let Some(content) = json
		.get("choices")
		.and_then(|v| v.as_array())
		.and_then(|arr| arr.first())
		.and_then(|choice| choice.get("message"))
		.and_then(|msg| msg.get("content"))
		.and_then(|c| c.as_str())
	{
		return structured::parse_structured(content);
	}

	Err(Error::invalid_response("Chat response is missing message content."))
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn parses_choice_content_json() {
		let json = serde_json::json!({
			"choices": [
				{ "message": { "content": "{\"skills\": []}" } }
			]
		});
		let parsed = parse_chat_json(json).expect("parse failed");

		assert!(parsed.get("skills").is_some());
	}

	#[test]
	fn parses_fenced_choice_content() {
		let json = serde_json::json!({
			"choices": [
				{ "message": { "content": "```json\n{\"ranked_ids\": [\"U2\", \"U1\"]}\n```" } }
			]
		});
		let parsed = parse_chat_json(json).expect("parse failed");

		assert_eq!(parsed["ranked_ids"], serde_json::json!(["U2", "U1"]));
	}

	#[test]
	fn rejects_missing_content() {
		let json = serde_json::json!({ "choices": [] });

		assert!(parse_chat_json(json).is_err());
	}
}
