use sm_domain::skills;

use crate::{Error, Result, SkillMatchService, Stage};

#[derive(Debug, Clone, serde::Deserialize)]
pub struct AssignSkillsRequest {
	pub person_id: String,
	pub skills: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct FailedSkill {
	pub skill: String,
	pub message: String,
}

/// Per-phrase outcome of a manual skill entry. Nothing is dropped silently: every submitted
/// phrase lands in exactly one list.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize)]
pub struct AssignSkillsResponse {
	pub assigned: Vec<String>,
	pub already_present: Vec<String>,
	pub failed: Vec<FailedSkill>,
}

impl SkillMatchService {
	pub async fn assign_skills(&self, req: AssignSkillsRequest) -> Result<AssignSkillsResponse> {
		let person_id = req.person_id.trim();

		if person_id.is_empty() {
			return Err(Error::InvalidRequest { message: "person_id must be non-empty.".to_string() });
		}
		if req.skills.is_empty() {
			return Err(Error::InvalidRequest {
				message: "skills must contain at least one phrase.".to_string(),
			});
		}

		let directory = self.collaborators.directory.as_ref();

		if !directory.person_exists(person_id).await.map_err(Error::assign)? {
			return Err(Error::NotFound { message: format!("Unknown person {person_id:?}.") });
		}

		let list = skills::normalize_skill_list(&req.skills, self.cfg.matching.max_skills as usize);
		let mut out = AssignSkillsResponse {
			failed: list
				.rejected
				.iter()
				.map(|(skill, reason)| FailedSkill {
					skill: skill.clone(),
					message: format!("Rejected: {}.", reason.as_str()),
				})
				.collect(),
			..Default::default()
		};

		if list.skills.is_empty() {
			return Ok(out);
		}

		let vectors = self
			.collaborators
			.embedding
			.embed(&self.cfg.providers.embedding, &list.skills)
			.await
			.map_err(|err| Error::embedding(Stage::AssignSkills, err))?;

		if vectors.len() != list.skills.len() {
			return Err(Error::EmbeddingFailed {
				stage: Stage::AssignSkills,
				message: format!(
					"Embedding provider returned {} vectors for {} skills.",
					vectors.len(),
					list.skills.len()
				),
			});
		}

		for (skill, vector) in list.skills.into_iter().zip(vectors) {
			match directory.assign_skill(person_id, &skill, &vector).await {
				Ok(true) => out.assigned.push(skill),
				Ok(false) => out.already_present.push(skill),
				Err(err) => {
					tracing::warn!(
						stage = Stage::AssignSkills.as_str(),
						person_id,
						skill = %skill,
						error = %err,
						"Skill assignment failed."
					);

					out.failed.push(FailedSkill { skill, message: err.detail() });
				},
			}
		}

		tracing::info!(
			person_id,
			assigned = out.assigned.len(),
			already_present = out.already_present.len(),
			failed = out.failed.len(),
			"Skills assigned."
		);

		Ok(out)
	}
}
