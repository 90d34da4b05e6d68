//! # Courier Location Repository
//!
//! Idempotent persistence for the flattened location catalog.
//!
//! ## Upsert Per Batch
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     upsert_batch(records)                               │
//! │                                                                         │
//! │  BEGIN                                                                 │
//! │   │                                                                     │
//! │   ├── records with area_id, at most 2978 rows per statement            │
//! │   │     INSERT INTO courier_locations (...) VALUES (...), (...), ...   │
//! │   │     ON CONFLICT (provider_name, city_id, zone_id, area_id)         │
//! │   │     DO UPDATE SET names, flags, updated_at                         │
//! │   │                                                                     │
//! │   └── records without area_id (NULLs never collide in UNIQUE)          │
//! │         UPDATE ... WHERE area_id IS NULL  → 0 rows? → INSERT           │
//! │   │                                                                     │
//! │  COMMIT ← whole batch or nothing                                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! `created_at` and `deleted_at` are never touched by an update.

use courier_core::{CourierLocation, LocationKey, LocationRecord, ProviderName};
use sqlx::{QueryBuilder, Sqlite, SqliteConnection, SqlitePool};
use tracing::debug;

use crate::error::DbResult;

/// Bound columns per inserted row.
const INSERT_COLUMNS: usize = 11;

/// SQLite caps a statement at 32766 bound variables.
const MAX_ROWS_PER_INSERT: usize = 32766 / INSERT_COLUMNS;

const SELECT_COLUMNS: &str = r#"
    SELECT
        id, provider_name, city_id, city_name, zone_id, zone_name,
        area_id, area_name, home_delivery_available, pickup_available,
        created_at, updated_at, deleted_at
    FROM courier_locations
"#;

/// Repository for the `courier_locations` table.
///
/// ## Usage
/// ```rust,ignore
/// let repo = db.locations();
/// repo.upsert_batch(&records).await?;
/// let stored = repo.count_by_provider(ProviderName::Pathao).await?;
/// ```
#[derive(Debug, Clone)]
pub struct LocationRepository {
    pool: SqlitePool,
}

impl LocationRepository {
    /// Creates a new LocationRepository.
    pub fn new(pool: SqlitePool) -> Self {
        LocationRepository { pool }
    }

    /// Inserts or updates every record in one transaction.
    ///
    /// ## Returns
    /// Rows inserted or updated. Either the whole batch is applied or an
    /// error is returned and nothing is.
    pub async fn upsert_batch(&self, records: &[LocationRecord]) -> DbResult<u64> {
        if records.is_empty() {
            return Ok(0);
        }

        let (keyed, unkeyed): (Vec<&LocationRecord>, Vec<&LocationRecord>) =
            records.iter().partition(|r| r.area_id.is_some());

        let mut tx = self.pool.begin().await?;
        let mut affected = 0;

        for chunk in keyed.chunks(MAX_ROWS_PER_INSERT) {
            let mut builder: QueryBuilder<Sqlite> = QueryBuilder::new(
                r#"INSERT INTO courier_locations (
                    provider_name, city_id, city_name, zone_id, zone_name,
                    area_id, area_name, home_delivery_available, pickup_available,
                    created_at, updated_at
                ) "#,
            );

            builder.push_values(chunk, |mut row, r| {
                row.push_bind(r.provider_name)
                    .push_bind(r.city_id)
                    .push_bind(r.city_name.clone())
                    .push_bind(r.zone_id)
                    .push_bind(r.zone_name.clone())
                    .push_bind(r.area_id)
                    .push_bind(r.area_name.clone())
                    .push_bind(r.home_delivery_available)
                    .push_bind(r.pickup_available)
                    .push_bind(r.created_at)
                    .push_bind(r.updated_at);
            });

            builder.push(
                r#"
                ON CONFLICT (provider_name, city_id, zone_id, area_id) DO UPDATE SET
                    city_name = excluded.city_name,
                    zone_name = excluded.zone_name,
                    area_name = excluded.area_name,
                    home_delivery_available = excluded.home_delivery_available,
                    pickup_available = excluded.pickup_available,
                    updated_at = excluded.updated_at
                "#,
            );

            affected += builder.build().execute(&mut *tx).await?.rows_affected();
        }

        for record in unkeyed {
            affected += upsert_without_area(&mut tx, record).await?;
        }

        tx.commit().await?;

        debug!(
            batch_size = records.len(),
            rows_affected = affected,
            "Upserted location batch"
        );
        Ok(affected)
    }

    /// Inserts or updates a single record.
    pub async fn upsert(&self, record: &LocationRecord) -> DbResult<u64> {
        self.upsert_batch(std::slice::from_ref(record)).await
    }

    /// Looks up a row by its natural key.
    pub async fn find_by_key(&self, key: &LocationKey) -> DbResult<Option<CourierLocation>> {
        let sql = format!(
            "{SELECT_COLUMNS} WHERE provider_name = ?1 AND city_id = ?2 AND zone_id = ?3 AND area_id IS ?4"
        );

        let row = sqlx::query_as::<_, CourierLocation>(&sql)
            .bind(key.provider_name)
            .bind(key.city_id)
            .bind(key.zone_id)
            .bind(key.area_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row)
    }

    /// Lists every stored row of a provider, tombstoned rows included.
    pub async fn list_by_provider(&self, provider: ProviderName) -> DbResult<Vec<CourierLocation>> {
        let sql = format!(
            "{SELECT_COLUMNS} WHERE provider_name = ?1 ORDER BY city_id, zone_id, area_id"
        );

        let rows = sqlx::query_as::<_, CourierLocation>(&sql)
            .bind(provider)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows)
    }

    /// Counts stored rows of a provider, tombstoned rows included.
    pub async fn count_by_provider(&self, provider: ProviderName) -> DbResult<i64> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM courier_locations WHERE provider_name = ?1")
                .bind(provider)
                .fetch_one(&self.pool)
                .await?;

        Ok(count)
    }

    /// Marks a row as deleted without removing it.
    ///
    /// ## Returns
    /// `true` if a live row was tombstoned.
    pub async fn soft_delete(&self, key: &LocationKey) -> DbResult<bool> {
        let result = sqlx::query(
            r#"
            UPDATE courier_locations SET deleted_at = ?5
            WHERE provider_name = ?1 AND city_id = ?2 AND zone_id = ?3 AND area_id IS ?4
            AND deleted_at IS NULL
            "#,
        )
        .bind(key.provider_name)
        .bind(key.city_id)
        .bind(key.zone_id)
        .bind(key.area_id)
        .bind(chrono::Utc::now())
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }
}

/// Update-then-insert for a record whose `area_id` is NULL.
async fn upsert_without_area(conn: &mut SqliteConnection, r: &LocationRecord) -> DbResult<u64> {
    let updated = sqlx::query(
        r#"
        UPDATE courier_locations SET
            city_name = ?1,
            zone_name = ?2,
            area_name = ?3,
            home_delivery_available = ?4,
            pickup_available = ?5,
            updated_at = ?6
        WHERE provider_name = ?7 AND city_id = ?8 AND zone_id = ?9 AND area_id IS NULL
        "#,
    )
    .bind(&r.city_name)
    .bind(&r.zone_name)
    .bind(&r.area_name)
    .bind(r.home_delivery_available)
    .bind(r.pickup_available)
    .bind(r.updated_at)
    .bind(r.provider_name)
    .bind(r.city_id)
    .bind(r.zone_id)
    .execute(&mut *conn)
    .await?;

    if updated.rows_affected() > 0 {
        return Ok(updated.rows_affected());
    }

    let inserted = sqlx::query(
        r#"
        INSERT INTO courier_locations (
            provider_name, city_id, city_name, zone_id, zone_name,
            area_id, area_name, home_delivery_available, pickup_available,
            created_at, updated_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, NULL, ?6, ?7, ?8, ?9, ?10)
        "#,
    )
    .bind(r.provider_name)
    .bind(r.city_id)
    .bind(&r.city_name)
    .bind(r.zone_id)
    .bind(&r.zone_name)
    .bind(&r.area_name)
    .bind(r.home_delivery_available)
    .bind(r.pickup_available)
    .bind(r.created_at)
    .bind(r.updated_at)
    .execute(&mut *conn)
    .await?;

    Ok(inserted.rows_affected())
}
