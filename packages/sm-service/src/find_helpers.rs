use sm_config::RETRIEVAL_FAILURE_ABORT;

use crate::{
	CandidateMatch, Error, MatchedSkill, RerankOutcome, Result, SkillHit, SkillMatchService, Stage,
	aggregate,
};

#[derive(Debug, Clone, serde::Deserialize)]
pub struct FindHelpersRequest {
	pub need: String,
	#[serde(default)]
	pub requester_id: Option<String>,
	#[serde(default)]
	pub desired_count: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct RankedCandidate {
	pub id: String,
	pub name: String,
	pub external_handle: Option<String>,
	pub skills: Vec<MatchedSkill>,
	pub aggregate_score: f32,
}
impl From<CandidateMatch> for RankedCandidate {
	fn from(candidate: CandidateMatch) -> Self {
		Self {
			id: candidate.person_id,
			name: candidate.name,
			external_handle: candidate.external_handle,
			skills: candidate.skills,
			aggregate_score: candidate.aggregate_score,
		}
	}
}

#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct FindHelpersResponse {
	/// Skills the need was matched on, in priority order.
	pub skills: Vec<String>,
	/// Skills whose retrieval failed and were left out of the ranking.
	pub skipped_skills: Vec<String>,
	pub rerank: RerankOutcome,
	pub candidates: Vec<RankedCandidate>,
}

impl SkillMatchService {
	pub async fn find_helpers(&self, req: FindHelpersRequest) -> Result<FindHelpersResponse> {
		let need = req.need.trim();
		let matching = &self.cfg.matching;

		if need.is_empty() {
			return Err(Error::InvalidRequest { message: "need must be non-empty.".to_string() });
		}
		if need.chars().count() > matching.max_need_chars as usize {
			return Err(Error::InvalidRequest {
				message: format!("need must be at most {} characters.", matching.max_need_chars),
			});
		}

		let requester = req.requester_id.as_deref().map(str::trim).filter(|id| !id.is_empty());
		let desired_count =
			req.desired_count.unwrap_or(matching.default_desired_count).max(1) as usize;

		if let Some(requester) = requester {
			self.check_cooldown(requester)?;
		}

		let skills = self.extract_skills(need).await?;

		tracing::info!(skills = skills.len(), desired_count, "Extracted skills for need.");

		let (need_vector, skill_vectors) =
			tokio::join!(self.embed_need(need, requester.is_some()), self.embed_skills(&skills));
		let skill_vectors = skill_vectors?;
		let (per_skill, skipped_skills) = self.retrieve(&skills, &skill_vectors).await?;
		let candidates = aggregate::aggregate(
			&per_skill,
			requester,
			matching.max_matched_skills as usize,
		);

		tracing::info!(candidates = candidates.len(), "Aggregated skill matches.");

		let log_need = async {
			if let (Some(requester), Some(vector)) = (requester, need_vector) {
				self.log_need(requester, need, vector).await;
			}
		};
		let (_, (selected, rerank)) =
			tokio::join!(log_need, self.select_helpers(need, candidates, desired_count));

		tracing::info!(
			returned = selected.len(),
			rerank = ?rerank,
			skipped_skills = skipped_skills.len(),
			"Helpers selected."
		);

		Ok(FindHelpersResponse {
			skills,
			skipped_skills,
			rerank,
			candidates: selected.into_iter().map(RankedCandidate::from).collect(),
		})
	}

	fn check_cooldown(&self, requester: &str) -> Result<()> {
		if !self.cooldowns.is_enabled() {
			return Ok(());
		}

		let key = requester.to_string();

		if let Some(remaining) = self.cooldowns.remaining(&key) {
			let retry_after_secs = remaining.as_secs() + u64::from(remaining.subsec_nanos() > 0);

			return Err(Error::RateLimited { retry_after_secs: retry_after_secs.max(1) });
		}

		self.cooldowns.insert(key, ());

		Ok(())
	}

	/// Need embedding feeds only the need log, so a failure here is logged and swallowed.
	async fn embed_need(&self, need: &str, wanted: bool) -> Option<Vec<f32>> {
		if !wanted {
			return None;
		}

		let texts = [need.to_string()];
		let outcome = self
			.collaborators
			.embedding
			.embed(&self.cfg.providers.embedding, &texts)
			.await
			.map_err(|err| Error::embedding(Stage::EmbedNeed, err))
			.and_then(|vectors| {
				vectors.into_iter().next().ok_or_else(|| Error::EmbeddingFailed {
					stage: Stage::EmbedNeed,
					message: "Embedding provider returned no vectors.".to_string(),
				})
			});

		match outcome {
			Ok(vector) => Some(vector),
			Err(err) => {
				tracing::warn!(
					stage = err.stage().as_str(),
					error = %err,
					"Need embedding failed. Need will not be logged."
				);

				None
			},
		}
	}

	async fn embed_skills(&self, skills: &[String]) -> Result<Vec<Vec<f32>>> {
		let vectors = self
			.collaborators
			.embedding
			.embed(&self.cfg.providers.embedding, skills)
			.await
			.map_err(|err| Error::embedding(Stage::EmbedSkills, err))?;

		if vectors.len() != skills.len() {
			return Err(Error::EmbeddingFailed {
				stage: Stage::EmbedSkills,
				message: format!(
					"Embedding provider returned {} vectors for {} skills.",
					vectors.len(),
					skills.len()
				),
			});
		}

		Ok(vectors)
	}

	/// Runs the per-skill queries concurrently and returns their hits in extraction order, plus
	/// the skills dropped under the "skip" retrieval mode.
	async fn retrieve(
		&self,
		skills: &[String],
		vectors: &[Vec<f32>],
	) -> Result<(Vec<Vec<SkillHit>>, Vec<String>)> {
		let limit = self.cfg.matching.per_skill_limit;
		let store = self.collaborators.store.as_ref();
		let results = futures::future::join_all(
			vectors.iter().map(|vector| store.query_by_skill_vector(vector, limit)),
		)
		.await;
		let abort = self.cfg.matching.retrieval_failure == RETRIEVAL_FAILURE_ABORT;
		let mut per_skill = Vec::with_capacity(skills.len());
		let mut skipped = Vec::new();
		let mut first_err = None;

		for (skill, result) in skills.iter().zip(results) {
			match result {
				Ok(hits) => per_skill.push(hits),
				Err(err) => {
					let err = Error::retrieval(skill, err);

					if abort {
						return Err(err);
					}

					tracing::warn!(
						stage = err.stage().as_str(),
						skill = %skill,
						error = %err,
						"Skill retrieval failed. Skipping its contribution."
					);

					skipped.push(skill.clone());
					first_err.get_or_insert(err);
				},
			}
		}

		if per_skill.is_empty()
			&& let Some(err) = first_err
		{
			return Err(err);
		}

		Ok((per_skill, skipped))
	}
}
