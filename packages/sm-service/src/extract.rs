use std::sync::Arc;

use serde_json::Value;

use sm_config::LlmProviderConfig;
use sm_domain::skills;

use crate::{
	BoxFuture, Error, LlmProvider, Result, SkillExtractor, SkillMatchService, cache, chain,
};

const SYSTEM_PROMPT: &str = "\
You identify the skills needed to help with a request. Reply with JSON only, shaped as \
{\"skills\": [\"...\"]}. List between 3 and 15 short skill phrases (one to four words each), \
most important first. Use the common name of a technology or discipline. Do not explain.";

pub struct LlmSkillExtractor {
	llm: Arc<dyn LlmProvider>,
	chain: Vec<LlmProviderConfig>,
}
impl LlmSkillExtractor {
	pub fn new(llm: Arc<dyn LlmProvider>, chain: Vec<LlmProviderConfig>) -> Self {
		Self { llm, chain }
	}
}
impl SkillExtractor for LlmSkillExtractor {
	fn extract<'a>(&'a self, need: &'a str) -> BoxFuture<'a, Result<Vec<String>>> {
		Box::pin(async move {
			let messages = vec![
				serde_json::json!({ "role": "system", "content": SYSTEM_PROMPT }),
				serde_json::json!({ "role": "user", "content": need }),
			];

			chain::first_success(
				self.llm.as_ref(),
				&self.chain,
				&messages,
				"skill_extractor",
				parse_skills,
			)
			.await
		})
	}

	fn models(&self) -> Vec<String> {
		self.chain.iter().map(|cfg| format!("{}:{}", cfg.provider_id, cfg.model)).collect()
	}
}

/// Accepts `{"skills": [...]}` or a bare array. Non-string entries are skipped; a reply with no
/// string entries is rejected so the next adapter gets a chance.
pub fn parse_skills(value: Value) -> Result<Vec<String>> {
	let items = match value {
		Value::Array(items) => items,
		Value::Object(mut map) => match map.remove("skills") {
			Some(Value::Array(items)) => items,
			_ => {
				return Err(Error::ExtractionFailed {
					message: "Extractor reply is missing a skills array.".to_string(),
				});
			},
		},
		_ => {
			return Err(Error::ExtractionFailed {
				message: "Extractor reply must be an object or an array.".to_string(),
			});
		},
	};
	let skills: Vec<String> = items
		.into_iter()
		.filter_map(|item| match item {
			Value::String(text) => Some(text),
			_ => None,
		})
		.collect();

	if skills.is_empty() {
		return Err(Error::ExtractionFailed {
			message: "Extractor reply contains no skills.".to_string(),
		});
	}

	Ok(skills)
}

impl SkillMatchService {
	/// Extracted, normalized, deduplicated skills in priority order. Never returns an empty list.
	pub(crate) async fn extract_skills(&self, need: &str) -> Result<Vec<String>> {
		let cache_key = if self.extraction_cache.is_enabled() {
			match cache::build_extraction_cache_key(need, &self.collaborators.extractor.models()) {
				Ok(key) => Some(key),
				Err(err) => {
					tracing::warn!(error = %err, "Failed to build extraction cache key.");

					None
				},
			}
		} else {
			None
		};

		if let Some(key) = cache_key.as_ref()
			&& let Some(skills) = self.extraction_cache.get(key)
		{
			tracing::debug!(
				cache_key_prefix = cache::cache_key_prefix(key),
				skills = skills.len(),
				"Extraction cache hit."
			);

			return Ok(skills);
		}

		let raw = self.collaborators.extractor.extract(need).await.map_err(Error::extraction)?;
		let matching = &self.cfg.matching;
		let list = skills::normalize_skill_list(&raw, matching.max_skills as usize);

		for (skill, reason) in &list.rejected {
			tracing::debug!(skill = %skill, reason = reason.as_str(), "Dropped extracted skill.");
		}

		if list.skills.is_empty() {
			return Err(Error::ExtractionFailed {
				message: "Extractor returned no usable skills.".to_string(),
			});
		}
		if list.skills.len() < matching.min_skills as usize {
			tracing::warn!(
				skills = list.skills.len(),
				min_skills = matching.min_skills,
				"Extractor returned fewer skills than expected."
			);
		}

		if let Some(key) = cache_key {
			self.extraction_cache.insert(key, list.skills.clone());
		}

		Ok(list.skills)
	}
}
