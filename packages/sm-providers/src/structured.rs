//! Tolerant extraction of structured model output.
//!
//! Chat models sometimes wrap JSON in Markdown fences (optionally tagged with a language). The
//! fence is removed and the remainder must parse as a whole; partial parses are never returned.

use serde_json::Value;

use crate::{Error, Result};

pub fn strip_fences(raw: &str) -> &str {
	let trimmed = raw.trim();
	let Some(rest) = trimmed.strip_prefix("```") else {
		return trimmed;
	};
	// Drop the optional language tag on the opening fence line.
	let body = match rest.find('\n') {
		Some(newline) if !rest[..newline].trim().contains(['{', '[']) => &rest[newline + 1..],
		_ => rest,
	};
	let body = body.trim_end();

	body.strip_suffix("```").unwrap_or(body).trim()
}

pub fn parse_structured(raw: &str) -> Result<Value> {
	let body = strip_fences(raw);

	if body.is_empty() {
		return Err(Error::invalid_response("Structured output is empty."));
	}

	serde_json::from_str(body).map_err(|err| {
		Error::invalid_response(format!("Structured output is not valid JSON: {err}."))
	})
}
