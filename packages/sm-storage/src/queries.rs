use sqlx::{Executor, Postgres};
use time::Date;
use uuid::Uuid;

use crate::{
	Error, Result,
	db::Db,
	models::{ChannelRow, NeedRecord, Person, SkillCountRow, SkillMatchRow},
};

/// Renders a vector as a pgvector text literal for `$n::text::vector` binds.
pub fn vector_to_pg(vec: &[f32]) -> String {
	let mut out = String::with_capacity(vec.len() * 8);

	out.push('[');

	for (i, value) in vec.iter().enumerate() {
		if i > 0 {
			out.push(',');
		}

		out.push_str(&value.to_string());
	}

	out.push(']');

	out
}

/// Nearest skills to `vec` by cosine similarity, restricted to enabled people.
pub async fn query_by_skill_vector(
	db: &Db,
	vec: &[f32],
	limit: u32,
) -> Result<Vec<SkillMatchRow>> {
	if vec.is_empty() {
		return Err(Error::InvalidArgument("Query vector must be non-empty.".to_string()));
	}

	let vec_text = vector_to_pg(vec);
	let rows = sqlx::query_as::<_, SkillMatchRow>(
		"\
SELECT
	p.person_id,
	p.external_handle,
	p.display_name,
	s.text AS skill,
	(1 - (s.embedding <=> $1::text::vector))::real AS score,
	p.expertise,
	p.projects,
	p.offers
FROM person_skills ps
JOIN skills s ON s.skill_id = ps.skill_id
JOIN people p ON p.person_id = ps.person_id
WHERE p.enabled = TRUE
ORDER BY s.embedding <=> $1::text::vector ASC, p.person_id ASC
LIMIT $2",
	)
	.bind(vec_text.as_str())
	.bind(i64::from(limit))
	.fetch_all(&db.pool)
	.await?;

	Ok(rows)
}

pub async fn fetch_person(db: &Db, person_id: &str) -> Result<Option<Person>> {
	let person = sqlx::query_as::<_, Person>(
		"\
SELECT person_id, display_name, external_handle, enabled, expertise, projects, offers
FROM people
WHERE person_id = $1",
	)
	.bind(person_id)
	.fetch_optional(&db.pool)
	.await?;

	Ok(person)
}

pub async fn full_skill_list(db: &Db, person_id: &str) -> Result<Vec<String>> {
	let skills = sqlx::query_scalar::<_, String>(
		"\
SELECT s.text
FROM person_skills ps
JOIN skills s ON s.skill_id = ps.skill_id
WHERE ps.person_id = $1
ORDER BY lower(s.text) ASC",
	)
	.bind(person_id)
	.fetch_all(&db.pool)
	.await?;

	Ok(skills)
}

/// Up to `per_person` channels for each of `person_ids`, alphabetical within a person. Channels
/// are ordered by the first person that brought them in and carry their full member roster.
pub async fn channel_context(
	db: &Db,
	person_ids: &[String],
	per_person: u32,
) -> Result<Vec<ChannelRow>> {
	if person_ids.is_empty() {
		return Ok(Vec::new());
	}

	let rows = sqlx::query_as::<_, ChannelRow>(
		"\
WITH picked AS (
	SELECT DISTINCT ON (c.channel_id) c.channel_id, c.name, c.summary, p.ord
	FROM unnest($1::text[]) WITH ORDINALITY AS p(person_id, ord)
	CROSS JOIN LATERAL (
		SELECT ch.channel_id, ch.name, ch.summary
		FROM channel_members cm
		JOIN channels ch ON ch.channel_id = cm.channel_id
		WHERE cm.person_id = p.person_id
		ORDER BY ch.name ASC, ch.channel_id ASC
		LIMIT $2
	) c
	ORDER BY c.channel_id, p.ord ASC
)
SELECT
	picked.channel_id,
	picked.name,
	picked.summary,
	ARRAY(
		SELECT cm.person_id
		FROM channel_members cm
		WHERE cm.channel_id = picked.channel_id
		ORDER BY cm.person_id
	) AS members
FROM picked
ORDER BY picked.ord ASC, picked.name ASC, picked.channel_id ASC",
	)
	.bind(person_ids)
	.bind(i64::from(per_person))
	.fetch_all(&db.pool)
	.await?;

	Ok(rows)
}

pub async fn insert_need(db: &Db, need: &NeedRecord) -> Result<()> {
	let vec_text = vector_to_pg(&need.embedding);

	sqlx::query(
		"\
INSERT INTO needs (need_id, requester_id, text, embedding, week_start, created_at)
VALUES ($1, $2, $3, $4::text::vector, $5, $6)",
	)
	.bind(need.need_id)
	.bind(need.requester_id.as_str())
	.bind(need.text.as_str())
	.bind(vec_text.as_str())
	.bind(need.week_start)
	.bind(need.created_at)
	.execute(&db.pool)
	.await?;

	Ok(())
}

/// Returns the id of the skill whose lowercased text matches, creating it when absent. An existing
/// row keeps its embedding because the embedding is a pure function of the text.
pub async fn upsert_skill<'e, E>(executor: E, text: &str, embedding: &[f32]) -> Result<Uuid>
where
	E: Executor<'e, Database = Postgres>,
{
	let vec_text = vector_to_pg(embedding);
	let skill_id = sqlx::query_scalar::<_, Uuid>(
		"\
INSERT INTO skills (skill_id, text, embedding)
VALUES ($1, $2, $3::text::vector)
ON CONFLICT ((lower(text))) DO UPDATE SET text = skills.text
RETURNING skill_id",
	)
	.bind(Uuid::new_v4())
	.bind(text)
	.bind(vec_text.as_str())
	.fetch_one(executor)
	.await?;

	Ok(skill_id)
}

/// Links a person to a skill. Returns `false` when the pair already existed.
pub async fn assign_person_skill<'e, E>(executor: E, person_id: &str, skill_id: Uuid) -> Result<bool>
where
	E: Executor<'e, Database = Postgres>,
{
	let result = sqlx::query(
		"\
INSERT INTO person_skills (person_id, skill_id)
VALUES ($1, $2)
ON CONFLICT (person_id, skill_id) DO NOTHING",
	)
	.bind(person_id)
	.bind(skill_id)
	.execute(executor)
	.await?;

	Ok(result.rows_affected() == 1)
}

pub async fn count_needs_since(db: &Db, week_start: Date) -> Result<i64> {
	let count = sqlx::query_scalar::<_, i64>("SELECT count(*) FROM needs WHERE week_start >= $1")
		.bind(week_start)
		.fetch_one(&db.pool)
		.await?;

	Ok(count)
}

pub async fn count_enabled_with_skills(db: &Db) -> Result<i64> {
	let count = sqlx::query_scalar::<_, i64>(
		"\
SELECT count(DISTINCT p.person_id)
FROM people p
JOIN person_skills ps ON ps.person_id = p.person_id
WHERE p.enabled = TRUE",
	)
	.fetch_one(&db.pool)
	.await?;

	Ok(count)
}

/// Skills held by the most enabled people; ties break alphabetically.
pub async fn top_skills(db: &Db, limit: u32) -> Result<Vec<SkillCountRow>> {
	let rows = sqlx::query_as::<_, SkillCountRow>(
		"\
SELECT s.text AS skill, count(*) AS people
FROM person_skills ps
JOIN skills s ON s.skill_id = ps.skill_id
JOIN people p ON p.person_id = ps.person_id
WHERE p.enabled = TRUE
GROUP BY s.skill_id, s.text
ORDER BY count(*) DESC, lower(s.text) ASC
LIMIT $1",
	)
	.bind(i64::from(limit))
	.fetch_all(&db.pool)
	.await?;

	Ok(rows)
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn renders_pgvector_literal() {
		assert_eq!(vector_to_pg(&[0.5, -1.0, 2.25]), "[0.5,-1,2.25]");
		assert_eq!(vector_to_pg(&[]), "[]");
	}
}
