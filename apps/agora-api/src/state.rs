use std::sync::Arc;

use agora_service::SearchService;
use agora_storage::db::Db;

#[derive(Clone)]
pub struct AppState {
	pub service: Arc<SearchService>,
}
impl AppState {
	pub async fn new(config: agora_config::Config) -> color_eyre::Result<Self> {
		let db = Db::connect(&config.storage.postgres).await?;

		db.ensure_schema().await?;

		let service = SearchService::new(config, db);

		Ok(Self { service: Arc::new(service) })
	}

	pub fn with_service(service: SearchService) -> Self {
		Self { service: Arc::new(service) }
	}
}
