use std::{cmp::Ordering, collections::HashMap};

use crate::SkillHit;

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct MatchedSkill {
	pub skill: String,
	pub score: f32,
}

/// Per-person fusion of skill-vector hits for one need.
#[derive(Debug, Clone, PartialEq)]
pub struct CandidateMatch {
	pub person_id: String,
	pub name: String,
	pub external_handle: Option<String>,
	/// Best first, never longer than the configured cap.
	pub skills: Vec<MatchedSkill>,
	/// Maximum score over every hit seen for this person.
	pub aggregate_score: f32,
	pub expertise: Option<String>,
	pub projects: Option<String>,
	pub offers: Option<String>,
}
impl CandidateMatch {
	fn from_hit(hit: &SkillHit) -> Self {
		Self {
			person_id: hit.person_id.clone(),
			name: hit.name.clone(),
			external_handle: hit.external_handle.clone(),
			skills: Vec::new(),
			aggregate_score: hit.score,
			expertise: hit.expertise.clone(),
			projects: hit.projects.clone(),
			offers: hit.offers.clone(),
		}
	}

	/// True when the candidate is the requester, by id or by external handle.
	pub fn is_requester(&self, requester: &str) -> bool {
		self.person_id == requester || self.external_handle.as_deref() == Some(requester)
	}
}

/// Union-rank fold of per-skill results, applied in extraction order.
///
/// Ties in aggregate score keep first-seen order.
pub fn aggregate(
	per_skill: &[Vec<SkillHit>],
	requester: Option<&str>,
	max_matched_skills: usize,
) -> Vec<CandidateMatch> {
	let mut order: Vec<CandidateMatch> = Vec::new();
	let mut index: HashMap<String, usize> = HashMap::new();

	for hits in per_skill {
		for hit in hits {
			let slot = *index.entry(hit.person_id.clone()).or_insert_with(|| {
				order.push(CandidateMatch::from_hit(hit));

				order.len() - 1
			});
			let candidate = &mut order[slot];

			if candidate.skills.len() < max_matched_skills
				&& !candidate.skills.iter().any(|matched| matched.skill == hit.skill)
			{
				candidate.skills.push(MatchedSkill { skill: hit.skill.clone(), score: hit.score });
			}
			if hit.score > candidate.aggregate_score {
				candidate.aggregate_score = hit.score;
			}
		}
	}

	for candidate in &mut order {
		candidate.skills.sort_by(|a, b| cmp_f32_desc(a.score, b.score));
	}

	order.retain(|candidate| {
		!candidate.skills.is_empty()
			&& !requester.is_some_and(|requester| candidate.is_requester(requester))
	});
	order.sort_by(|a, b| cmp_f32_desc(a.aggregate_score, b.aggregate_score));

	order
}

pub fn cmp_f32_desc(a: f32, b: f32) -> Ordering {
	match (a.is_nan(), b.is_nan()) {
		(true, true) => Ordering::Equal,
		(true, false) => Ordering::Greater,
		(false, true) => Ordering::Less,
		(false, false) => b.partial_cmp(&a).unwrap_or(Ordering::Equal),
	}
}
