//! Postgres 行程存储
//!
//! 聊天记录存为 JSONB 数组，追加用 `chat || $n::jsonb` 保证单条记录内
//! 原子；到达转移是带 `arrived = FALSE` 条件的 UPDATE，并发二次触发
//! 最多一个成功。

use async_trait::async_trait;
use sqlx::postgres::PgPoolOptions;
use sqlx::{Pool, Postgres};
use uuid::Uuid;

use application::repository::{RideStore, RideStoreError};
use domain::{ChatEntry, Coordinate, Ride, RideId, UserId};

pub type PgPool = Pool<Postgres>;

pub async fn create_pg_pool(database_url: &str, max_size: u32) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(max_size)
        .connect(database_url)
        .await
}

const RIDE_COLUMNS: &str = "id, driver_id, rider_id, pickup_lat, pickup_long, \
     destination_lat, destination_long, destination_text, requested_time, \
     chat, arrived, cost";

#[derive(Debug, Clone, sqlx::FromRow)]
struct RideRow {
    id: Uuid,
    driver_id: Uuid,
    rider_id: Uuid,
    pickup_lat: f64,
    pickup_long: f64,
    destination_lat: f64,
    destination_long: f64,
    destination_text: String,
    requested_time: String,
    chat: serde_json::Value,
    arrived: bool,
    cost: Option<i64>,
}

impl TryFrom<RideRow> for Ride {
    type Error = RideStoreError;

    fn try_from(row: RideRow) -> Result<Self, Self::Error> {
        let requested_time = row
            .requested_time
            .parse()
            .map_err(|err| RideStoreError::storage(format!("bad requested_time column: {err}")))?;
        let chat: Vec<ChatEntry> = serde_json::from_value(row.chat)
            .map_err(|err| RideStoreError::storage(format!("bad chat column: {err}")))?;
        Ok(Ride {
            id: RideId::new(row.id),
            driver_id: UserId::new(row.driver_id),
            rider_id: UserId::new(row.rider_id),
            pickup: Coordinate::new(row.pickup_lat, row.pickup_long),
            destination: Coordinate::new(row.destination_lat, row.destination_long),
            destination_text: row.destination_text,
            requested_time,
            chat,
            arrived: row.arrived,
            cost: row.cost,
        })
    }
}

pub struct PgRideStore {
    pool: PgPool,
}

impl PgRideStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn fetch_optional(&self, query: &str, key: Uuid) -> Result<Option<Ride>, RideStoreError> {
        let row = sqlx::query_as::<_, RideRow>(query)
            .bind(key)
            .fetch_optional(&self.pool)
            .await
            .map_err(|err| RideStoreError::storage(err.to_string()))?;
        row.map(Ride::try_from).transpose()
    }
}

#[async_trait]
impl RideStore for PgRideStore {
    async fn create(&self, ride: Ride) -> Result<RideId, RideStoreError> {
        let chat = serde_json::to_value(&ride.chat)
            .map_err(|err| RideStoreError::storage(err.to_string()))?;
        sqlx::query(
            r#"INSERT INTO rides
               (id, driver_id, rider_id, pickup_lat, pickup_long,
                destination_lat, destination_long, destination_text,
                requested_time, chat, arrived, cost)
               VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)"#,
        )
        .bind(Uuid::from(ride.id))
        .bind(Uuid::from(ride.driver_id))
        .bind(Uuid::from(ride.rider_id))
        .bind(ride.pickup.lat)
        .bind(ride.pickup.long)
        .bind(ride.destination.lat)
        .bind(ride.destination.long)
        .bind(&ride.destination_text)
        .bind(ride.requested_time.to_string())
        .bind(chat)
        .bind(ride.arrived)
        .bind(ride.cost)
        .execute(&self.pool)
        .await
        .map_err(|err| RideStoreError::storage(err.to_string()))?;
        Ok(ride.id)
    }

    async fn get(&self, id: RideId) -> Result<Option<Ride>, RideStoreError> {
        self.fetch_optional(
            &format!("SELECT {RIDE_COLUMNS} FROM rides WHERE id = $1"),
            id.into(),
        )
        .await
    }

    async fn append_chat(&self, id: RideId, entry: ChatEntry) -> Result<(), RideStoreError> {
        let entry = serde_json::to_value(&entry)
            .map_err(|err| RideStoreError::storage(err.to_string()))?;
        let result = sqlx::query(
            // jsonb 拼接在数据库侧原子完成，并发追加不会互相覆盖
            "UPDATE rides SET chat = chat || jsonb_build_array($2::jsonb) WHERE id = $1",
        )
        .bind(Uuid::from(id))
        .bind(entry)
        .execute(&self.pool)
        .await
        .map_err(|err| RideStoreError::storage(err.to_string()))?;
        if result.rows_affected() == 0 {
            return Err(RideStoreError::NotFound);
        }
        Ok(())
    }

    async fn set_arrived(&self, id: RideId, cost: i64) -> Result<(), RideStoreError> {
        let result = sqlx::query(
            "UPDATE rides SET arrived = TRUE, cost = $2 WHERE id = $1 AND arrived = FALSE",
        )
        .bind(Uuid::from(id))
        .bind(cost)
        .execute(&self.pool)
        .await
        .map_err(|err| RideStoreError::storage(err.to_string()))?;
        if result.rows_affected() == 0 {
            // 区分不存在和已到达
            return match self.get(id).await? {
                Some(_) => Err(RideStoreError::AlreadyArrived),
                None => Err(RideStoreError::NotFound),
            };
        }
        Ok(())
    }

    async fn find_active_by_driver(
        &self,
        driver_id: UserId,
    ) -> Result<Option<Ride>, RideStoreError> {
        self.fetch_optional(
            &format!(
                "SELECT {RIDE_COLUMNS} FROM rides WHERE driver_id = $1 AND arrived = FALSE LIMIT 1"
            ),
            driver_id.into(),
        )
        .await
    }

    async fn find_active_by_rider(
        &self,
        rider_id: UserId,
    ) -> Result<Option<Ride>, RideStoreError> {
        self.fetch_optional(
            &format!(
                "SELECT {RIDE_COLUMNS} FROM rides WHERE rider_id = $1 AND arrived = FALSE LIMIT 1"
            ),
            rider_id.into(),
        )
        .await
    }
}
