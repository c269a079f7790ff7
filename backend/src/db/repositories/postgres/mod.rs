//! Postgres repository implementation using Diesel.
//!
//! ## Features
//!
//! - Connection pooling with r2d2
//! - Automatic retry for transient failures
//! - Automatic migration execution
//! - A partial unique index that backs the per-section uniqueness rule, so a
//!   race between two writers that both passed the in-process conflict check is
//!   rejected as a constraint violation
//!
//! ## Configuration
//!
//! Environment variables:
//! - `DATABASE_URL` or `PG_DATABASE_URL`: Connection string (required)
//! - `PG_POOL_MAX`: Maximum pool size (default: 10)
//! - `PG_POOL_MIN`: Minimum pool size (default: 1)
//! - `PG_CONN_TIMEOUT_SEC`: Connection timeout in seconds (default: 30)
//! - `PG_IDLE_TIMEOUT_SEC`: Idle connection timeout in seconds (default: 600)
//! - `PG_MAX_RETRIES`: Maximum retry attempts for transient failures (default: 3)
//! - `PG_RETRY_DELAY_MS`: Initial retry delay in milliseconds (default: 100)

use async_trait::async_trait;
use diesel::pg::PgConnection;
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, Pool};
use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::task;

use crate::db::repository::{
    ErrorContext, OccupancyRepository, RepositoryError, RepositoryResult, SlotRepository,
};
use crate::models::{
    AcademicYearId, DayIndex, ElectiveGroupId, NewScheduledSlot, ProgramId, ScheduledSlot,
    Section, SectionSlotKey, Semester, SlotId, SlotIndex, SpanId, TeacherId,
};

mod models;
mod schema;

use models::*;
use schema::scheduled_slots;

type PgPool = Pool<ConnectionManager<PgConnection>>;

const MIGRATIONS: EmbeddedMigrations = embed_migrations!("src/db/repositories/postgres/migrations");

/// Configuration for connecting to Postgres.
#[derive(Debug, Clone)]
pub struct PostgresConfig {
    /// Database connection URL
    pub database_url: String,
    /// Maximum number of connections in the pool
    pub max_pool_size: u32,
    /// Minimum number of connections in the pool
    pub min_pool_size: u32,
    /// Connection timeout in seconds
    pub connection_timeout_sec: u64,
    /// Idle connection timeout in seconds
    pub idle_timeout_sec: u64,
    /// Maximum number of retry attempts for transient failures
    pub max_retries: u32,
    /// Initial retry delay in milliseconds (doubles with each retry)
    pub retry_delay_ms: u64,
}

impl Default for PostgresConfig {
    fn default() -> Self {
        Self {
            database_url: String::new(),
            max_pool_size: 10,
            min_pool_size: 1,
            connection_timeout_sec: 30,
            idle_timeout_sec: 600,
            max_retries: 3,
            retry_delay_ms: 100,
        }
    }
}

fn env_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse::<T>().ok())
        .unwrap_or(default)
}

impl PostgresConfig {
    /// Create configuration from environment variables.
    pub fn from_env() -> Result<Self, String> {
        let database_url = std::env::var("DATABASE_URL")
            .or_else(|_| std::env::var("PG_DATABASE_URL"))
            .map_err(|_| "DATABASE_URL or PG_DATABASE_URL must be set".to_string())?;

        let defaults = Self::default();
        Ok(Self {
            database_url,
            max_pool_size: env_or("PG_POOL_MAX", defaults.max_pool_size),
            min_pool_size: env_or("PG_POOL_MIN", defaults.min_pool_size),
            connection_timeout_sec: env_or("PG_CONN_TIMEOUT_SEC", defaults.connection_timeout_sec),
            idle_timeout_sec: env_or("PG_IDLE_TIMEOUT_SEC", defaults.idle_timeout_sec),
            max_retries: env_or("PG_MAX_RETRIES", defaults.max_retries),
            retry_delay_ms: env_or("PG_RETRY_DELAY_MS", defaults.retry_delay_ms),
        })
    }

    /// Create a new configuration with a database URL.
    pub fn with_url(database_url: impl Into<String>) -> Self {
        Self {
            database_url: database_url.into(),
            ..Default::default()
        }
    }
}

/// Pool health statistics.
#[derive(Debug, Clone, Default)]
pub struct PoolStats {
    /// Number of connections currently in use
    pub connections_in_use: u32,
    /// Number of idle connections
    pub idle_connections: u32,
    /// Maximum pool size
    pub max_size: u32,
    /// Total successful queries executed
    pub total_queries: u64,
    /// Total failed queries
    pub failed_queries: u64,
    /// Total retried operations
    pub retried_operations: u64,
}

/// Diesel-backed repository for Postgres.
#[derive(Clone, Debug)]
pub struct PostgresRepository {
    pool: PgPool,
    config: PostgresConfig,
    // Metrics counters
    total_queries: Arc<AtomicU64>,
    failed_queries: Arc<AtomicU64>,
    retried_operations: Arc<AtomicU64>,
}

impl PostgresRepository {
    /// Create a new repository and run pending migrations.
    pub fn new(config: PostgresConfig) -> RepositoryResult<Self> {
        let manager = ConnectionManager::<PgConnection>::new(&config.database_url);

        let pool = Pool::builder()
            .max_size(config.max_pool_size)
            .min_idle(Some(config.min_pool_size))
            .connection_timeout(Duration::from_secs(config.connection_timeout_sec))
            .idle_timeout(Some(Duration::from_secs(config.idle_timeout_sec)))
            .test_on_check_out(true)
            .build(manager)
            .map_err(|e| {
                RepositoryError::connection_with_context(
                    e.to_string(),
                    ErrorContext::new("create_pool")
                        .with_details(format!("max_size={}", config.max_pool_size)),
                )
            })?;

        {
            let mut conn = pool.get()?;
            conn.run_pending_migrations(MIGRATIONS).map_err(|e| {
                RepositoryError::internal_with_context(
                    format!("Migration failed: {}", e),
                    ErrorContext::new("run_migrations"),
                )
            })?;
        }

        Ok(Self {
            pool,
            config,
            total_queries: Arc::new(AtomicU64::new(0)),
            failed_queries: Arc::new(AtomicU64::new(0)),
            retried_operations: Arc::new(AtomicU64::new(0)),
        })
    }

    /// Execute a database operation with automatic retry for transient failures.
    async fn with_conn<T, F>(&self, f: F) -> RepositoryResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&mut PgConnection) -> RepositoryResult<T> + Send + 'static + Clone,
    {
        let pool = self.pool.clone();
        let max_retries = self.config.max_retries;
        let retry_delay_ms = self.config.retry_delay_ms;
        let total_queries = self.total_queries.clone();
        let failed_queries = self.failed_queries.clone();
        let retried_operations = self.retried_operations.clone();

        task::spawn_blocking(move || {
            let mut last_error = None;
            let mut retry_delay = Duration::from_millis(retry_delay_ms);

            for attempt in 0..=max_retries {
                if attempt > 0 {
                    retried_operations.fetch_add(1, Ordering::Relaxed);
                    std::thread::sleep(retry_delay);
                    retry_delay *= 2; // Exponential backoff
                }

                let mut conn = match pool.get() {
                    Ok(c) => c,
                    Err(e) => {
                        let err = RepositoryError::connection_with_context(
                            e.to_string(),
                            ErrorContext::new("get_connection")
                                .with_details(format!("attempt={}", attempt + 1)),
                        );
                        if attempt < max_retries {
                            last_error = Some(err);
                            continue;
                        }
                        failed_queries.fetch_add(1, Ordering::Relaxed);
                        return Err(err);
                    }
                };

                total_queries.fetch_add(1, Ordering::Relaxed);
                match f.clone()(&mut conn) {
                    Ok(result) => return Ok(result),
                    Err(e) if e.is_retryable() && attempt < max_retries => {
                        last_error = Some(e);
                        continue;
                    }
                    Err(e) => {
                        failed_queries.fetch_add(1, Ordering::Relaxed);
                        return Err(e);
                    }
                }
            }

            failed_queries.fetch_add(1, Ordering::Relaxed);
            Err(last_error.unwrap_or_else(|| {
                RepositoryError::internal("Max retries exceeded with no error captured")
            }))
        })
        .await
        .map_err(|e| {
            RepositoryError::internal_with_context(
                format!("Task join error: {}", e),
                ErrorContext::new("spawn_blocking"),
            )
        })?
    }

    /// Get pool health statistics.
    pub fn pool_stats(&self) -> PoolStats {
        let state = self.pool.state();
        PoolStats {
            connections_in_use: state.connections - state.idle_connections,
            idle_connections: state.idle_connections,
            max_size: self.config.max_pool_size,
            total_queries: self.total_queries.load(Ordering::Relaxed),
            failed_queries: self.failed_queries.load(Ordering::Relaxed),
            retried_operations: self.retried_operations.load(Ordering::Relaxed),
        }
    }

    fn to_rows(slots: &[NewScheduledSlot]) -> RepositoryResult<Vec<NewSlotRow>> {
        slots.iter().map(NewSlotRow::from_domain).collect()
    }

    fn into_domain(rows: Vec<SlotRow>) -> RepositoryResult<Vec<ScheduledSlot>> {
        rows.into_iter().map(ScheduledSlot::try_from).collect()
    }

    /// Run an ordered select over active rows.
    async fn select_active<F>(&self, filter: F) -> RepositoryResult<Vec<ScheduledSlot>>
    where
        F: FnOnce(
                scheduled_slots::BoxedQuery<'static, diesel::pg::Pg>,
            ) -> scheduled_slots::BoxedQuery<'static, diesel::pg::Pg>
            + Send
            + Clone
            + 'static,
    {
        let rows = self
            .with_conn(move |conn| {
                let query = scheduled_slots::table
                    .filter(scheduled_slots::is_active.eq(true))
                    .into_boxed();
                filter(query)
                    .order((
                        scheduled_slots::day_index,
                        scheduled_slots::slot_index,
                        scheduled_slots::section,
                        scheduled_slots::slot_id,
                    ))
                    .select(SlotRow::as_select())
                    .load::<SlotRow>(conn)
                    .map_err(RepositoryError::from)
            })
            .await?;
        Self::into_domain(rows)
    }
}

#[async_trait]
impl SlotRepository for PostgresRepository {
    async fn health_check(&self) -> RepositoryResult<bool> {
        self.with_conn(|conn| {
            diesel::sql_query("SELECT 1")
                .execute(conn)
                .map(|_| true)
                .map_err(RepositoryError::from)
        })
        .await
    }

    async fn get_slot(&self, id: SlotId) -> RepositoryResult<ScheduledSlot> {
        let row = self
            .with_conn(move |conn| {
                scheduled_slots::table
                    .find(id.value())
                    .select(SlotRow::as_select())
                    .first::<SlotRow>(conn)
                    .map_err(|e| RepositoryError::from(e).with_operation("get_slot"))
            })
            .await?;
        ScheduledSlot::try_from(row)
    }

    async fn insert_slot(&self, slot: &NewScheduledSlot) -> RepositoryResult<ScheduledSlot> {
        let row = NewSlotRow::from_domain(slot)?;
        let inserted = self
            .with_conn(move |conn| {
                diesel::insert_into(scheduled_slots::table)
                    .values(&row)
                    .returning(SlotRow::as_returning())
                    .get_result::<SlotRow>(conn)
                    .map_err(|e| RepositoryError::from(e).with_operation("insert_slot"))
            })
            .await?;
        ScheduledSlot::try_from(inserted)
    }

    async fn update_slot(
        &self,
        id: SlotId,
        slot: &NewScheduledSlot,
    ) -> RepositoryResult<ScheduledSlot> {
        let row = NewSlotRow::from_domain(slot)?;
        let updated = self
            .with_conn(move |conn| {
                diesel::update(scheduled_slots::table.find(id.value()))
                    .set((&row, scheduled_slots::updated_at.eq(chrono::Utc::now())))
                    .returning(SlotRow::as_returning())
                    .get_result::<SlotRow>(conn)
                    .map_err(|e| RepositoryError::from(e).with_operation("update_slot"))
            })
            .await?;
        ScheduledSlot::try_from(updated)
    }

    async fn delete_slots(&self, ids: &[SlotId]) -> RepositoryResult<usize> {
        let raw: Vec<i64> = ids.iter().map(|id| id.value()).collect();
        self.with_conn(move |conn| {
            diesel::delete(scheduled_slots::table.filter(scheduled_slots::slot_id.eq_any(&raw)))
                .execute(conn)
                .map_err(|e| RepositoryError::from(e).with_operation("delete_slots"))
        })
        .await
    }

    fn supports_transactions(&self) -> bool {
        true
    }

    async fn insert_batch(
        &self,
        slots: &[NewScheduledSlot],
    ) -> RepositoryResult<Vec<ScheduledSlot>> {
        self.replace_batch(&[], slots).await
    }

    async fn replace_batch(
        &self,
        remove: &[SlotId],
        slots: &[NewScheduledSlot],
    ) -> RepositoryResult<Vec<ScheduledSlot>> {
        let rows = Self::to_rows(slots)?;
        let remove: Vec<i64> = remove.iter().map(|id| id.value()).collect();
        let inserted = self
            .with_conn(move |conn| {
                conn.transaction::<_, RepositoryError, _>(|tx| {
                    if !remove.is_empty() {
                        diesel::delete(
                            scheduled_slots::table
                                .filter(scheduled_slots::slot_id.eq_any(&remove)),
                        )
                        .execute(tx)?;
                    }
                    if rows.is_empty() {
                        return Ok(Vec::new());
                    }
                    let inserted = diesel::insert_into(scheduled_slots::table)
                        .values(&rows)
                        .returning(SlotRow::as_returning())
                        .get_results::<SlotRow>(tx)?;
                    Ok(inserted)
                })
                .map_err(|e| e.with_operation("replace_batch"))
            })
            .await?;
        Self::into_domain(inserted)
    }
}

#[async_trait]
impl OccupancyRepository for PostgresRepository {
    async fn find_at_key(&self, key: &SectionSlotKey) -> RepositoryResult<Vec<ScheduledSlot>> {
        let key = *key;
        self.select_active(move |q| {
            q.filter(scheduled_slots::program_id.eq(key.program.value()))
                .filter(scheduled_slots::semester.eq(i16::from(key.semester.value())))
                .filter(scheduled_slots::section.eq(key.section.as_str()))
                .filter(scheduled_slots::day_index.eq(i16::from(key.day.value())))
                .filter(scheduled_slots::slot_index.eq(i16::from(key.slot.value())))
        })
        .await
    }

    async fn find_at_time(
        &self,
        day: DayIndex,
        slot: SlotIndex,
    ) -> RepositoryResult<Vec<ScheduledSlot>> {
        self.select_active(move |q| {
            q.filter(scheduled_slots::day_index.eq(i16::from(day.value())))
                .filter(scheduled_slots::slot_index.eq(i16::from(slot.value())))
        })
        .await
    }

    async fn find_span(&self, span_id: SpanId) -> RepositoryResult<Vec<ScheduledSlot>> {
        self.select_active(move |q| q.filter(scheduled_slots::span_id.eq(span_id.value())))
            .await
    }

    async fn find_spans_on_day(&self, day: DayIndex) -> RepositoryResult<Vec<ScheduledSlot>> {
        self.select_active(move |q| {
            q.filter(scheduled_slots::day_index.eq(i16::from(day.value())))
                .filter(scheduled_slots::span_id.is_not_null())
        })
        .await
    }

    async fn find_elective_group(
        &self,
        group_id: ElectiveGroupId,
    ) -> RepositoryResult<Vec<ScheduledSlot>> {
        self.select_active(move |q| {
            q.filter(scheduled_slots::elective_group_id.eq(group_id.value()))
        })
        .await
    }

    async fn list_section(
        &self,
        program: ProgramId,
        semester: Semester,
        section: Section,
        academic_year: Option<AcademicYearId>,
    ) -> RepositoryResult<Vec<ScheduledSlot>> {
        self.select_active(move |q| {
            let q = q
                .filter(scheduled_slots::program_id.eq(program.value()))
                .filter(scheduled_slots::semester.eq(i16::from(semester.value())))
                .filter(scheduled_slots::section.eq(section.as_str()));
            match academic_year {
                Some(year) => q.filter(scheduled_slots::academic_year_id.eq(year.value())),
                None => q,
            }
        })
        .await
    }

    async fn list_for_teacher(&self, teacher: TeacherId) -> RepositoryResult<Vec<ScheduledSlot>> {
        self.select_active(move |q| {
            q.filter(scheduled_slots::teacher_ids.contains(vec![teacher.value()]))
        })
        .await
    }
}
