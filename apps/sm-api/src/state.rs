use std::sync::Arc;

use sm_service::SkillMatchService;
use sm_storage::db::Db;

#[derive(Clone)]
pub struct AppState {
	pub service: Arc<SkillMatchService>,
}
impl AppState {
	pub async fn new(config: sm_config::Config) -> color_eyre::Result<Self> {
		let db = Db::connect(&config.storage.postgres).await?;

		db.ensure_schema(config.storage.vector_dim).await?;

		Ok(Self::from_service(SkillMatchService::new(config, db)))
	}

	pub fn from_service(service: SkillMatchService) -> Self {
		Self { service: Arc::new(service) }
	}
}
