use std::sync::Arc;

use tracing::info;

use shared::config::{Config, StorageBackend};
use shared::random::SharedRng;
use shared::repositories::room_repository::{
    DynamoDbRoomRepository, InMemoryRoomRepository, RoomRepository,
};
use shared::repositories::stats_repository::{
    DynamoDbStatsRepository, InMemoryStatsRepository, StatsRepository,
};
use shared::repositories::user_repository::{
    DynamoDbUserRepository, InMemoryUserRepository, UserRepository,
};
use shared::services::auth_service::AuthService;
use shared::services::match_service::MatchService;
use shared::services::room_service::RoomService;
use shared::services::stats_service::StatsService;

#[derive(Clone)]
pub struct AppState {
    pub auth_service: Arc<AuthService>,
    pub room_service: Arc<RoomService>,
    pub match_service: Arc<MatchService>,
    pub stats_service: Arc<StatsService>,
}

type Repositories = (
    Arc<dyn RoomRepository + Send + Sync>,
    Arc<dyn StatsRepository + Send + Sync>,
    Arc<dyn UserRepository + Send + Sync>,
);

impl AppState {
    pub async fn from_config(config: &Config) -> Self {
        let (rooms, stats, users) = repositories(config).await;
        let rng = SharedRng::new(config.rng_seed);

        let stats_service = Arc::new(StatsService::new(stats));
        let room_service = Arc::new(RoomService::new(
            rooms,
            users,
            stats_service.clone(),
            rng.clone(),
        ));
        let match_service = Arc::new(MatchService::new(
            room_service.clone(),
            rng,
            config.match_settings(),
        ));
        let auth_service = Arc::new(AuthService::with_jwt_secret(config.jwt_secret.clone()));

        AppState {
            auth_service,
            room_service,
            match_service,
            stats_service,
        }
    }
}

async fn repositories(config: &Config) -> Repositories {
    match (config.storage, &config.tables) {
        (StorageBackend::DynamoDb, Some(tables)) => {
            let sdk_config = aws_config::load_from_env().await;
            let client = aws_sdk_dynamodb::Client::new(&sdk_config);
            info!("Using DynamoDB tables {:?}", tables);

            let rooms: Arc<dyn RoomRepository + Send + Sync> =
                Arc::new(DynamoDbRoomRepository::new(client.clone(), tables.rooms.clone()));
            let stats: Arc<dyn StatsRepository + Send + Sync> = Arc::new(
                DynamoDbStatsRepository::new(client.clone(), tables.game_stats.clone()),
            );
            let users: Arc<dyn UserRepository + Send + Sync> =
                Arc::new(DynamoDbUserRepository::new(client, tables.users.clone()));
            (rooms, stats, users)
        }
        _ => {
            info!("Using in-memory storage");
            let rooms: Arc<dyn RoomRepository + Send + Sync> = Arc::new(InMemoryRoomRepository::new());
            let stats: Arc<dyn StatsRepository + Send + Sync> =
                Arc::new(InMemoryStatsRepository::new());
            let users: Arc<dyn UserRepository + Send + Sync> = Arc::new(InMemoryUserRepository::new());
            (rooms, stats, users)
        }
    }
}
