pub mod aggregate;
pub mod assign_skills;
pub mod cache;
pub mod extract;
pub mod find_helpers;
pub mod need_log;
pub mod rerank;
pub mod stats;
pub mod store;

mod chain;
mod error;

pub use aggregate::{CandidateMatch, MatchedSkill};
pub use assign_skills::{AssignSkillsRequest, AssignSkillsResponse, FailedSkill};
pub use cache::{Clock, FakeClock, SystemClock, TtlCache};
pub use error::{Error, Result, Stage};
pub use extract::LlmSkillExtractor;
pub use find_helpers::{FindHelpersRequest, FindHelpersResponse, RankedCandidate};
pub use need_log::NeedEntry;
pub use rerank::{ChannelContext, LlmReranker, RerankCandidate, RerankOutcome};
pub use stats::{SkillCount, WeeklyStats};
pub use store::PgStore;

use std::{future::Future, pin::Pin, sync::Arc, time::Duration};

use serde_json::Value;
use time::Date;

use sm_config::{Config, EmbeddingProviderConfig, LlmProviderConfig};
use sm_providers::{chat, embedding};
use sm_storage::db::Db;

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

pub trait EmbeddingProvider
where
	Self: Send + Sync,
{
	/// Returns one vector per input, positionally aligned.
	fn embed<'a>(
		&'a self,
		cfg: &'a EmbeddingProviderConfig,
		texts: &'a [String],
	) -> BoxFuture<'a, Result<Vec<Vec<f32>>>>;
}

pub trait LlmProvider
where
	Self: Send + Sync,
{
	fn complete_json<'a>(
		&'a self,
		cfg: &'a LlmProviderConfig,
		messages: &'a [Value],
	) -> BoxFuture<'a, Result<Value>>;
}

pub trait SkillExtractor
where
	Self: Send + Sync,
{
	/// Raw skill phrases in priority order. Normalization happens in the service.
	fn extract<'a>(&'a self, need: &'a str) -> BoxFuture<'a, Result<Vec<String>>>;

	/// Identifies the models behind this extractor so cached skills are not reused across them.
	fn models(&self) -> Vec<String> {
		Vec::new()
	}
}

pub trait VectorStore
where
	Self: Send + Sync,
{
	/// At most `limit` hits, best first, restricted to enabled people.
	fn query_by_skill_vector<'a>(
		&'a self,
		vector: &'a [f32],
		limit: u32,
	) -> BoxFuture<'a, Result<Vec<SkillHit>>>;
}

pub trait Directory
where
	Self: Send + Sync,
{
	fn person_exists<'a>(&'a self, person_id: &'a str) -> BoxFuture<'a, Result<bool>>;

	fn full_skill_list<'a>(&'a self, person_id: &'a str) -> BoxFuture<'a, Result<Vec<String>>>;

	/// Channels any of `person_ids` participates in.
	fn channel_context<'a>(
		&'a self,
		person_ids: &'a [String],
	) -> BoxFuture<'a, Result<Vec<ChannelContext>>>;

	/// Creates the skill when absent and links it to the person. Returns `false` when the person
	/// already had it.
	fn assign_skill<'a>(
		&'a self,
		person_id: &'a str,
		skill: &'a str,
		embedding: &'a [f32],
	) -> BoxFuture<'a, Result<bool>>;

	fn count_enabled_with_skills<'a>(&'a self) -> BoxFuture<'a, Result<i64>>;

	fn top_skills<'a>(&'a self, limit: u32) -> BoxFuture<'a, Result<Vec<SkillCount>>>;
}

pub trait NeedLog
where
	Self: Send + Sync,
{
	fn record_need<'a>(&'a self, need: &'a NeedEntry) -> BoxFuture<'a, Result<()>>;

	fn count_needs_since<'a>(&'a self, week_start: Date) -> BoxFuture<'a, Result<i64>>;
}

pub trait Reranker
where
	Self: Send + Sync,
{
	/// Candidate ids, best first.
	fn rerank<'a>(
		&'a self,
		need: &'a str,
		candidates: &'a [RerankCandidate],
		desired_count: usize,
		channels: &'a [ChannelContext],
	) -> BoxFuture<'a, Result<Vec<String>>>;
}

/// One (person, skill, score) tuple from a skill-vector query, with the person's profile.
#[derive(Debug, Clone, PartialEq)]
pub struct SkillHit {
	pub person_id: String,
	pub external_handle: Option<String>,
	pub name: String,
	pub skill: String,
	pub score: f32,
	pub expertise: Option<String>,
	pub projects: Option<String>,
	pub offers: Option<String>,
}

#[derive(Clone)]
pub struct Collaborators {
	pub embedding: Arc<dyn EmbeddingProvider>,
	pub extractor: Arc<dyn SkillExtractor>,
	pub store: Arc<dyn VectorStore>,
	pub directory: Arc<dyn Directory>,
	pub need_log: Arc<dyn NeedLog>,
	pub reranker: Arc<dyn Reranker>,
}

pub struct SkillMatchService {
	pub cfg: Config,
	pub collaborators: Collaborators,
	clock: Arc<dyn Clock>,
	extraction_cache: TtlCache<String, Vec<String>>,
	cooldowns: TtlCache<String, ()>,
}

struct DefaultProviders;

impl EmbeddingProvider for DefaultProviders {
	fn embed<'a>(
		&'a self,
		cfg: &'a EmbeddingProviderConfig,
		texts: &'a [String],
	) -> BoxFuture<'a, Result<Vec<Vec<f32>>>> {
		Box::pin(async move { Ok(embedding::embed(cfg, texts).await?) })
	}
}

impl LlmProvider for DefaultProviders {
	fn complete_json<'a>(
		&'a self,
		cfg: &'a LlmProviderConfig,
		messages: &'a [Value],
	) -> BoxFuture<'a, Result<Value>> {
		Box::pin(async move { Ok(chat::complete_json(cfg, messages).await?) })
	}
}

impl Collaborators {
	pub fn new(
		embedding: Arc<dyn EmbeddingProvider>,
		extractor: Arc<dyn SkillExtractor>,
		store: Arc<dyn VectorStore>,
		directory: Arc<dyn Directory>,
		need_log: Arc<dyn NeedLog>,
		reranker: Arc<dyn Reranker>,
	) -> Self {
		Self { embedding, extractor, store, directory, need_log, reranker }
	}

	/// HTTP-backed model adapters over a Postgres store.
	pub fn postgres(cfg: &Config, db: Arc<Db>) -> Self {
		let providers = Arc::new(DefaultProviders);
		let store = Arc::new(PgStore::new(db));

		Self {
			embedding: providers.clone(),
			extractor: Arc::new(LlmSkillExtractor::new(
				providers.clone(),
				cfg.providers.skill_extractor.clone(),
			)),
			store: store.clone(),
			directory: store.clone(),
			need_log: store,
			reranker: Arc::new(LlmReranker::new(providers, cfg.providers.reranker.clone())),
		}
	}
}

impl SkillMatchService {
	pub fn new(cfg: Config, db: Db) -> Self {
		let collaborators = Collaborators::postgres(&cfg, Arc::new(db));

		Self::with_collaborators(cfg, collaborators)
	}

	pub fn with_collaborators(cfg: Config, collaborators: Collaborators) -> Self {
		Self::with_clock(cfg, collaborators, Arc::new(SystemClock))
	}

	pub fn with_clock(cfg: Config, collaborators: Collaborators, clock: Arc<dyn Clock>) -> Self {
		let extraction_cache = TtlCache::new(
			Duration::from_secs(cfg.cache.extraction_ttl_secs),
			cfg.cache.max_entries,
			clock.clone(),
		);
		let cooldowns = TtlCache::new(
			Duration::from_secs(cfg.cache.requester_cooldown_secs),
			cfg.cache.max_entries,
			clock.clone(),
		);

		Self { cfg, collaborators, clock, extraction_cache, cooldowns }
	}
}
