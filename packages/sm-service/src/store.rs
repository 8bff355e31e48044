use std::sync::Arc;

use time::Date;

use sm_storage::{
	db::Db,
	models::{ChannelRow, NeedRecord, SkillMatchRow},
	queries,
};

use crate::{
	BoxFuture, ChannelContext, Directory, NeedEntry, NeedLog, Result, SkillCount, SkillHit,
	VectorStore,
};

const CHANNELS_PER_CANDIDATE: u32 = 5;

/// Postgres + pgvector implementation of every storage-facing collaborator.
pub struct PgStore {
	db: Arc<Db>,
}
impl PgStore {
	pub fn new(db: Arc<Db>) -> Self {
		Self { db }
	}

	async fn assign(&self, person_id: &str, skill: &str, embedding: &[f32]) -> Result<bool> {
		let mut tx = self.db.pool.begin().await.map_err(sm_storage::Error::from)?;
		let skill_id = queries::upsert_skill(&mut *tx, skill, embedding).await?;
		let inserted = queries::assign_person_skill(&mut *tx, person_id, skill_id).await?;

		tx.commit().await.map_err(sm_storage::Error::from)?;

		Ok(inserted)
	}
}

impl VectorStore for PgStore {
	fn query_by_skill_vector<'a>(
		&'a self,
		vector: &'a [f32],
		limit: u32,
	) -> BoxFuture<'a, Result<Vec<SkillHit>>> {
		Box::pin(async move {
			let rows = queries::query_by_skill_vector(&self.db, vector, limit).await?;

			Ok(rows.into_iter().map(skill_hit).collect())
		})
	}
}

impl Directory for PgStore {
	fn person_exists<'a>(&'a self, person_id: &'a str) -> BoxFuture<'a, Result<bool>> {
		Box::pin(async move { Ok(queries::fetch_person(&self.db, person_id).await?.is_some()) })
	}

	fn full_skill_list<'a>(&'a self, person_id: &'a str) -> BoxFuture<'a, Result<Vec<String>>> {
		Box::pin(async move { Ok(queries::full_skill_list(&self.db, person_id).await?) })
	}

	fn channel_context<'a>(
		&'a self,
		person_ids: &'a [String],
	) -> BoxFuture<'a, Result<Vec<ChannelContext>>> {
		Box::pin(async move {
			let rows =
				queries::channel_context(&self.db, person_ids, CHANNELS_PER_CANDIDATE).await?;

			Ok(rows.into_iter().map(channel).collect())
		})
	}

	fn assign_skill<'a>(
		&'a self,
		person_id: &'a str,
		skill: &'a str,
		embedding: &'a [f32],
	) -> BoxFuture<'a, Result<bool>> {
		Box::pin(self.assign(person_id, skill, embedding))
	}

	fn count_enabled_with_skills<'a>(&'a self) -> BoxFuture<'a, Result<i64>> {
		Box::pin(async move { Ok(queries::count_enabled_with_skills(&self.db).await?) })
	}

	fn top_skills<'a>(&'a self, limit: u32) -> BoxFuture<'a, Result<Vec<SkillCount>>> {
		Box::pin(async move {
			let rows = queries::top_skills(&self.db, limit).await?;

			Ok(rows
				.into_iter()
				.map(|row| SkillCount { skill: row.skill, people: row.people })
				.collect())
		})
	}
}

impl NeedLog for PgStore {
	fn record_need<'a>(&'a self, need: &'a NeedEntry) -> BoxFuture<'a, Result<()>> {
		Box::pin(async move {
			let record = NeedRecord {
				need_id: need.need_id,
				requester_id: need.requester_id.clone(),
				text: need.text.clone(),
				embedding: need.embedding.clone(),
				week_start: need.week_start,
				created_at: need.created_at,
			};

			Ok(queries::insert_need(&self.db, &record).await?)
		})
	}

	fn count_needs_since<'a>(&'a self, week_start: Date) -> BoxFuture<'a, Result<i64>> {
		Box::pin(async move { Ok(queries::count_needs_since(&self.db, week_start).await?) })
	}
}

fn skill_hit(row: SkillMatchRow) -> SkillHit {
	SkillHit {
		person_id: row.person_id,
		external_handle: row.external_handle,
		name: row.display_name,
		skill: row.skill,
		score: row.score,
		expertise: row.expertise,
		projects: row.projects,
		offers: row.offers,
	}
}

fn channel(row: ChannelRow) -> ChannelContext {
	ChannelContext {
		channel_id: row.channel_id,
		name: row.name,
		summary: row.summary,
		members: row.members,
	}
}
