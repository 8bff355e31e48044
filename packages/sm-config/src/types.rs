use serde::Deserialize;
use serde_json::{Map, Value};

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
	pub service: Service,
	pub storage: Storage,
	pub providers: Providers,
	#[serde(default)]
	pub matching: Matching,
	#[serde(default)]
	pub cache: Cache,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Service {
	pub http_bind: String,
	pub log_level: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Storage {
	pub postgres: Postgres,
	/// Dimension of every stored skill and need vector.
	pub vector_dim: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Postgres {
	pub dsn: String,
	pub pool_max_conns: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Providers {
	pub embedding: EmbeddingProviderConfig,
	/// Tried in order; the first adapter that returns usable skills wins.
	pub skill_extractor: Vec<LlmProviderConfig>,
	/// Tried in order; the first adapter that returns a usable ranking wins.
	pub reranker: Vec<LlmProviderConfig>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EmbeddingProviderConfig {
	pub provider_id: String,
	pub api_base: String,
	pub api_key: String,
	pub path: String,
	pub model: String,
	pub dimensions: u32,
	pub timeout_ms: u64,
	#[serde(default)]
	pub default_headers: Map<String, Value>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LlmProviderConfig {
	pub provider_id: String,
	pub api_base: String,
	pub api_key: String,
	pub path: String,
	pub model: String,
	pub temperature: f32,
	pub timeout_ms: u64,
	#[serde(default)]
	pub default_headers: Map<String, Value>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Matching {
	pub per_skill_limit: u32,
	pub max_matched_skills: u32,
	pub rerank_pool_size: u32,
	pub default_desired_count: u32,
	pub min_skills: u32,
	pub max_skills: u32,
	/// Either "skip" (drop the failing skill and keep going) or "abort".
	pub retrieval_failure: String,
	pub max_need_chars: u32,
}
impl Default for Matching {
	fn default() -> Self {
		Self {
			per_skill_limit: 10,
			max_matched_skills: 3,
			rerank_pool_size: 10,
			default_desired_count: 5,
			min_skills: 3,
			max_skills: 15,
			retrieval_failure: "skip".to_string(),
			max_need_chars: 4_000,
		}
	}
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Cache {
	/// Zero disables the extraction cache.
	pub extraction_ttl_secs: u64,
	/// Zero disables the per-requester cooldown.
	pub requester_cooldown_secs: u64,
	pub max_entries: usize,
}
impl Default for Cache {
	fn default() -> Self {
		Self { extraction_ttl_secs: 3_600, requester_cooldown_secs: 0, max_entries: 1_024 }
	}
}
