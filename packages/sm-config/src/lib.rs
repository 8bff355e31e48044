mod error;
mod types;

pub use error::{Error, Result};
pub use types::{
	Cache, Config, EmbeddingProviderConfig, LlmProviderConfig, Matching, Postgres, Providers,
	Service, Storage,
};

use std::{fs, path::Path};

pub const RETRIEVAL_FAILURE_SKIP: &str = "skip";
pub const RETRIEVAL_FAILURE_ABORT: &str = "abort";
/// Thirty days.
pub const MAX_CACHE_TTL_SECS: u64 = 30 * 24 * 60 * 60;

pub fn load(path: &Path) -> Result<Config> {
	let raw = fs::read_to_string(path)
		.map_err(|err| Error::ReadConfig { path: path.to_path_buf(), source: err })?;

	parse(&raw).map_err(|err| match err {
		Error::ParseConfig { source, .. } => Error::ParseConfig { path: path.to_path_buf(), source },
		other => other,
	})
}

pub fn parse(raw: &str) -> Result<Config> {
	let mut cfg: Config = toml::from_str(raw)
		.map_err(|err| Error::ParseConfig { path: Default::default(), source: err })?;

	normalize(&mut cfg);

	validate(&cfg)?;

	Ok(cfg)
}

pub fn validate(cfg: &Config) -> Result<()> {
	if cfg.service.http_bind.trim().is_empty() {
		return Err(Error::validation("service.http_bind must be non-empty."));
	}
	if cfg.storage.postgres.pool_max_conns == 0 {
		return Err(Error::validation(
			"storage.postgres.pool_max_conns must be greater than zero.",
		));
	}
	if cfg.providers.embedding.dimensions == 0 {
		return Err(Error::validation(
			"providers.embedding.dimensions must be greater than zero.",
		));
	}
	if cfg.providers.embedding.dimensions != cfg.storage.vector_dim {
		return Err(Error::validation(
			"providers.embedding.dimensions must match storage.vector_dim.",
		));
	}
	if cfg.providers.embedding.api_key.trim().is_empty() {
		return Err(Error::validation("Provider embedding api_key must be non-empty."));
	}

	for (label, chain) in [
		("skill_extractor", &cfg.providers.skill_extractor),
		("reranker", &cfg.providers.reranker),
	] {
		if chain.is_empty() {
			return Err(Error::validation(format!(
				"providers.{label} must list at least one provider."
			)));
		}

		for (index, provider) in chain.iter().enumerate() {
			if provider.api_key.trim().is_empty() {
				return Err(Error::validation(format!(
					"Provider {label}[{index}] api_key must be non-empty."
				)));
			}
			if provider.model.trim().is_empty() {
				return Err(Error::validation(format!(
					"Provider {label}[{index}] model must be non-empty."
				)));
			}
			if !provider.temperature.is_finite() || provider.temperature < 0.0 {
				return Err(Error::validation(format!(
					"Provider {label}[{index}] temperature must be a finite number, zero or greater."
				)));
			}
		}
	}

	let matching = &cfg.matching;

	if matching.per_skill_limit == 0 {
		return Err(Error::validation("matching.per_skill_limit must be greater than zero."));
	}
	if matching.max_matched_skills == 0 {
		return Err(Error::validation("matching.max_matched_skills must be greater than zero."));
	}
	if matching.min_skills == 0 {
		return Err(Error::validation("matching.min_skills must be greater than zero."));
	}
	if matching.min_skills > matching.max_skills {
		return Err(Error::validation(
			"matching.min_skills must be less than or equal to matching.max_skills.",
		));
	}
	if matching.rerank_pool_size == 0 {
		return Err(Error::validation("matching.rerank_pool_size must be greater than zero."));
	}
	if matching.default_desired_count == 0 {
		return Err(Error::validation("matching.default_desired_count must be greater than zero."));
	}
	if !matches!(
		matching.retrieval_failure.as_str(),
		RETRIEVAL_FAILURE_SKIP | RETRIEVAL_FAILURE_ABORT
	) {
		return Err(Error::validation("matching.retrieval_failure must be one of skip or abort."));
	}
	if matching.max_need_chars == 0 {
		return Err(Error::validation("matching.max_need_chars must be greater than zero."));
	}
	if cfg.cache.max_entries == 0 {
		return Err(Error::validation("cache.max_entries must be greater than zero."));
	}

	for (key, secs) in [
		("cache.extraction_ttl_secs", cfg.cache.extraction_ttl_secs),
		("cache.requester_cooldown_secs", cfg.cache.requester_cooldown_secs),
	] {
		if secs > MAX_CACHE_TTL_SECS {
			return Err(Error::validation(format!(
				"{key} must be at most {MAX_CACHE_TTL_SECS} seconds."
			)));
		}
	}

	Ok(())
}

fn normalize(cfg: &mut Config) {
	if cfg.service.log_level.trim().is_empty() {
		cfg.service.log_level = "info".to_string();
	}

	cfg.matching.retrieval_failure = cfg.matching.retrieval_failure.trim().to_ascii_lowercase();

	for provider in
		cfg.providers.skill_extractor.iter_mut().chain(cfg.providers.reranker.iter_mut())
	{
		provider.api_base = provider.api_base.trim_end_matches('/').to_string();
	}

	cfg.providers.embedding.api_base =
		cfg.providers.embedding.api_base.trim_end_matches('/').to_string();
}
