use std::{collections::HashSet, sync::Arc};

use serde_json::Value;

use sm_config::LlmProviderConfig;

use crate::{
	BoxFuture, CandidateMatch, Error, LlmProvider, MatchedSkill, Reranker, Result,
	SkillMatchService, chain,
};

const SYSTEM_PROMPT: &str = "\
You rank colleagues by how well they can help with a request. Weigh, in priority order: \
(1) direct relevance of their skills to the request, (2) demonstrated expertise, projects, or \
offers of help, (3) breadth of adjacent skills, (4) evidence from the topical channels they \
participate in. Break ties by the specificity of the evidence. Only use ids from the candidate \
list. Reply with JSON only, shaped as {\"ranked_ids\": [\"...\"]}, best first, containing \
exactly the requested number of ids.";

/// Everything the reranker sees about one candidate.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct RerankCandidate {
	pub id: String,
	pub name: String,
	pub matched_skills: Vec<MatchedSkill>,
	/// Every skill on the person's profile, fetched fresh.
	pub all_skills: Vec<String>,
	pub expertise: Option<String>,
	pub projects: Option<String>,
	pub offers: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct ChannelContext {
	pub channel_id: String,
	pub name: String,
	pub summary: Option<String>,
	pub members: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RerankOutcome {
	/// The pool fit within the desired count, so no reranking was attempted.
	Skipped,
	Applied,
	/// Reranking failed or produced nothing usable; aggregate order was used.
	Fallback,
}

pub struct LlmReranker {
	llm: Arc<dyn LlmProvider>,
	chain: Vec<LlmProviderConfig>,
}
impl LlmReranker {
	pub fn new(llm: Arc<dyn LlmProvider>, chain: Vec<LlmProviderConfig>) -> Self {
		Self { llm, chain }
	}
}
impl Reranker for LlmReranker {
	fn rerank<'a>(
		&'a self,
		need: &'a str,
		candidates: &'a [RerankCandidate],
		desired_count: usize,
		channels: &'a [ChannelContext],
	) -> BoxFuture<'a, Result<Vec<String>>> {
		Box::pin(async move {
			let messages = build_rerank_messages(need, candidates, desired_count, channels);

			chain::first_success(
				self.llm.as_ref(),
				&self.chain,
				&messages,
				"reranker",
				parse_ranked_ids,
			)
			.await
		})
	}
}

pub fn build_rerank_messages(
	need: &str,
	candidates: &[RerankCandidate],
	desired_count: usize,
	channels: &[ChannelContext],
) -> Vec<Value> {
	let payload = serde_json::json!({
		"request": need,
		"desired_count": desired_count,
		"candidates": candidates,
		"channels": channels,
	});

	vec![
		serde_json::json!({ "role": "system", "content": SYSTEM_PROMPT }),
		serde_json::json!({ "role": "user", "content": payload.to_string() }),
	]
}

/// Accepts `{"ranked_ids": [...]}` or a bare array of ids.
pub fn parse_ranked_ids(value: Value) -> Result<Vec<String>> {
	let items = match value {
		Value::Array(items) => items,
		Value::Object(mut map) => match map.remove("ranked_ids") {
			Some(Value::Array(items)) => items,
			_ => {
				return Err(Error::RerankFailed {
					message: "Reranker reply is missing a ranked_ids array.".to_string(),
				});
			},
		},
		_ => {
			return Err(Error::RerankFailed {
				message: "Reranker reply must be an object or an array.".to_string(),
			});
		},
	};

	Ok(items
		.into_iter()
		.filter_map(|item| match item {
			Value::String(id) => Some(id),
			_ => None,
		})
		.collect())
}

/// Applies a reranker ordering to `pool`: unknown and repeated ids are dropped, then remaining
/// slots are filled from aggregate order. Returns the selection and how many ids were usable.
pub fn merge_ranking(
	pool: &[CandidateMatch],
	ranked_ids: &[String],
	desired_count: usize,
) -> (Vec<CandidateMatch>, usize) {
	let mut selected: Vec<CandidateMatch> = Vec::with_capacity(desired_count);
	let mut seen: HashSet<&str> = HashSet::new();

	for id in ranked_ids {
		if selected.len() >= desired_count {
			break;
		}

		let Some(candidate) = pool.iter().find(|candidate| candidate.person_id == *id) else {
			continue;
		};

		if seen.insert(candidate.person_id.as_str()) {
			selected.push(candidate.clone());
		}
	}

	let valid = selected.len();

	for candidate in pool {
		if selected.len() >= desired_count {
			break;
		}
		if seen.insert(candidate.person_id.as_str()) {
			selected.push(candidate.clone());
		}
	}

	(selected, valid)
}

impl SkillMatchService {
	/// Final selection of at most `desired_count` candidates from the aggregate ranking.
	pub(crate) async fn select_helpers(
		&self,
		need: &str,
		mut candidates: Vec<CandidateMatch>,
		desired_count: usize,
	) -> (Vec<CandidateMatch>, RerankOutcome) {
		if candidates.len() <= desired_count {
			return (candidates, RerankOutcome::Skipped);
		}

		candidates.truncate(self.cfg.matching.rerank_pool_size as usize);

		let pool = candidates;
		let desired_count = desired_count.min(pool.len());
		let ranked = match self.build_rerank_input(&pool).await {
			Ok((inputs, channels)) => self
				.collaborators
				.reranker
				.rerank(need, &inputs, desired_count, &channels)
				.await
				.map_err(Error::rerank),
			Err(err) => Err(Error::rerank(err)),
		};

		match ranked {
			Ok(ids) => {
				let (selected, valid) = merge_ranking(&pool, &ids, desired_count);

				if valid < ids.len() {
					tracing::warn!(
						returned = ids.len(),
						valid,
						"Reranker returned ids outside the candidate pool. Dropped them."
					);
				}
				if valid == 0 {
					tracing::warn!("Reranker returned no usable ids. Using aggregate order.");

					return (selected, RerankOutcome::Fallback);
				}

				(selected, RerankOutcome::Applied)
			},
			Err(err) => {
				tracing::warn!(
					stage = err.stage().as_str(),
					error = %err,
					"Rerank failed. Using aggregate order."
				);

				let mut fallback = pool;

				fallback.truncate(desired_count);

				(fallback, RerankOutcome::Fallback)
			},
		}
	}

	async fn build_rerank_input(
		&self,
		pool: &[CandidateMatch],
	) -> Result<(Vec<RerankCandidate>, Vec<ChannelContext>)> {
		let directory = self.collaborators.directory.as_ref();
		let person_ids: Vec<String> =
			pool.iter().map(|candidate| candidate.person_id.clone()).collect();
		let skill_lists = futures::future::try_join_all(
			pool.iter().map(|candidate| directory.full_skill_list(&candidate.person_id)),
		);
		let (skill_lists, channels) =
			tokio::join!(skill_lists, directory.channel_context(&person_ids));
		let skill_lists = skill_lists?;
		let channels = channels?;
		let inputs = pool
			.iter()
			.zip(skill_lists)
			.map(|(candidate, all_skills)| RerankCandidate {
				id: candidate.person_id.clone(),
				name: candidate.name.clone(),
				matched_skills: candidate.skills.clone(),
				all_skills,
				expertise: candidate.expertise.clone(),
				projects: candidate.projects.clone(),
				offers: candidate.offers.clone(),
			})
			.collect();

		Ok((inputs, channels))
	}
}
