use time::{Date, OffsetDateTime};
use uuid::Uuid;

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Person {
	pub person_id: String,
	pub display_name: String,
	pub external_handle: Option<String>,
	pub enabled: bool,
	pub expertise: Option<String>,
	pub projects: Option<String>,
	pub offers: Option<String>,
}

/// One row of a nearest-neighbour skill query, joined with the owning person's profile.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct SkillMatchRow {
	pub person_id: String,
	pub external_handle: Option<String>,
	pub display_name: String,
	pub skill: String,
	pub score: f32,
	pub expertise: Option<String>,
	pub projects: Option<String>,
	pub offers: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NeedRecord {
	pub need_id: Uuid,
	pub requester_id: String,
	pub text: String,
	pub embedding: Vec<f32>,
	pub week_start: Date,
	pub created_at: OffsetDateTime,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ChannelRow {
	pub channel_id: String,
	pub name: String,
	pub summary: Option<String>,
	pub members: Vec<String>,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct SkillCountRow {
	pub skill: String,
	pub people: i64,
}
