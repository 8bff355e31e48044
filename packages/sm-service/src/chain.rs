use serde_json::Value;

use sm_config::LlmProviderConfig;

use crate::{Error, LlmProvider, Result};

/// Tries each adapter in order and returns the first reply that `parse` accepts.
pub(crate) async fn first_success<T, F>(
	llm: &dyn LlmProvider,
	chain: &[LlmProviderConfig],
	messages: &[Value],
	label: &str,
	parse: F,
) -> Result<T>
where
	F: Fn(Value) -> Result<T>,
{
	let mut last_err = None;

	for cfg in chain {
		let outcome = match llm.complete_json(cfg, messages).await {
			Ok(value) => parse(value),
			Err(err) => Err(err),
		};

		match outcome {
			Ok(parsed) => return Ok(parsed),
			Err(err) => {
				tracing::warn!(
					adapter = label,
					provider_id = %cfg.provider_id,
					model = %cfg.model,
					error = %err,
					"Adapter failed. Trying next adapter."
				);

				last_err = Some(err);
			},
		}
	}

	Err(last_err.unwrap_or_else(|| Error::Provider {
		message: format!("No {label} adapters are configured."),
	}))
}
