use sm_domain::week;

use crate::{Error, Result, SkillMatchService};

const TOP_SKILLS_LIMIT: u32 = 10;

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct SkillCount {
	pub skill: String,
	/// Enabled people holding the skill.
	pub people: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct WeeklyStats {
	/// ISO date of the Monday the counts start from.
	pub week_start: String,
	pub total_needs: i64,
	pub total_enabled_with_skills: i64,
	pub top_skills: Vec<SkillCount>,
}

impl SkillMatchService {
	pub async fn weekly_stats(&self) -> Result<WeeklyStats> {
		let week_start = week::week_start(self.clock.now());
		let directory = self.collaborators.directory.as_ref();
		let (total_needs, total_enabled_with_skills, top_skills) = tokio::join!(
			self.collaborators.need_log.count_needs_since(week_start),
			directory.count_enabled_with_skills(),
			directory.top_skills(TOP_SKILLS_LIMIT),
		);
		let mut top_skills = top_skills.map_err(Error::stats)?;

		top_skills.truncate(TOP_SKILLS_LIMIT as usize);

		Ok(WeeklyStats {
			week_start: week_start.to_string(),
			total_needs: total_needs.map_err(Error::stats)?,
			total_enabled_with_skills: total_enabled_with_skills.map_err(Error::stats)?,
			top_skills,
		})
	}
}
