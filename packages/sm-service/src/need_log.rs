use time::{Date, OffsetDateTime};
use uuid::Uuid;

use sm_domain::week;

use crate::{Error, SkillMatchService};

#[derive(Debug, Clone, PartialEq)]
pub struct NeedEntry {
	pub need_id: Uuid,
	pub requester_id: String,
	pub text: String,
	pub embedding: Vec<f32>,
	/// Monday of the UTC week containing `created_at`.
	pub week_start: Date,
	pub created_at: OffsetDateTime,
}

impl SkillMatchService {
	/// Best-effort write; failures are logged and never reach the caller.
	pub(crate) async fn log_need(&self, requester_id: &str, need: &str, embedding: Vec<f32>) {
		let created_at = self.clock.now();
		let entry = NeedEntry {
			need_id: Uuid::new_v4(),
			requester_id: requester_id.to_string(),
			text: need.to_string(),
			embedding,
			week_start: week::week_start(created_at),
			created_at,
		};

		match self.collaborators.need_log.record_need(&entry).await.map_err(Error::need_log) {
			Ok(()) => {
				tracing::debug!(
					need_id = %entry.need_id,
					week_start = %entry.week_start,
					"Need logged."
				);
			},
			Err(err) => {
				tracing::warn!(
					stage = err.stage().as_str(),
					need_id = %entry.need_id,
					error = %err,
					"Need log write failed."
				);
			},
		}
	}
}
