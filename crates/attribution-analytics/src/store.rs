//! `AnalyticsStore`: the external-collaborator seam [`crate::facade::AnalyticsFacade`]
//! queries on a cache miss (§4.5). The real analytical column store's
//! storage format and query dialect are out of scope; this crate only
//! fixes the Rust-side contract and an in-memory fixture for tests.

use async_trait::async_trait;
use attribution_core::CoreError;

use crate::types::{AttributionSummary, Customer, CustomerAnalytics, DashboardStats};

/// Read-only queries the analytics façade falls through to on a cache miss.
#[async_trait]
pub trait AnalyticsStore: Send + Sync {
    async fn get_customers(&self, limit: usize) -> Result<Vec<Customer>, CoreError>;
    async fn get_customer_analytics(
        &self,
        customer_id: &str,
        limit: usize,
    ) -> Result<CustomerAnalytics, CoreError>;
    async fn get_attribution(
        &self,
        customer_id: &str,
        limit: usize,
    ) -> Result<AttributionSummary, CoreError>;
    async fn get_dashboard_stats(&self) -> Result<DashboardStats, CoreError>;
}

/// Fixed-data `AnalyticsStore` for tests and for running without a
/// configured `DATABASE_URL`. Shapes its rows after the source's own
/// fallback-mode sample data rather than zeroes, so a fresh deployment
/// renders something plausible before real data lands.
pub struct InMemoryAnalyticsStore {
    customers: Vec<Customer>,
}

impl InMemoryAnalyticsStore {
    #[must_use]
    pub fn new() -> Self {
        Self {
            customers: vec![
                Customer {
                    app_id: "demo-app-1".to_string(),
                    total_events: 850,
                    total_users: 120,
                    total_revenue: 8999.99,
                    platforms: vec!["ios".into(), "android".into(), "web".into()],
                },
                Customer {
                    app_id: "demo-app-2".to_string(),
                    total_events: 400,
                    total_users: 67,
                    total_revenue: 3499.99,
                    platforms: vec!["web".into()],
                },
            ],
        }
    }

    #[must_use]
    pub fn with_customers(customers: Vec<Customer>) -> Self {
        Self { customers }
    }
}

impl Default for InMemoryAnalyticsStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AnalyticsStore for InMemoryAnalyticsStore {
    async fn get_customers(&self, limit: usize) -> Result<Vec<Customer>, CoreError> {
        Ok(self.customers.iter().take(limit).cloned().collect())
    }

    async fn get_customer_analytics(
        &self,
        customer_id: &str,
        _limit: usize,
    ) -> Result<CustomerAnalytics, CoreError> {
        Ok(CustomerAnalytics {
            customer_id: customer_id.to_string(),
            total_events: 1250,
            total_users: 234,
            total_revenue: 12_499.99,
            top_events: vec!["app_open".into(), "purchase".into(), "screen_view".into()],
            top_platforms: vec!["ios".into(), "android".into(), "web".into()],
            total_countries: 15,
        })
    }

    async fn get_attribution(
        &self,
        customer_id: &str,
        _limit: usize,
    ) -> Result<AttributionSummary, CoreError> {
        Ok(AttributionSummary {
            customer_id: customer_id.to_string(),
            attribution_model: "last_touch".to_string(),
            total_conversions: 45,
            total_revenue: 4999.99,
            top_channels: vec!["facebook".into(), "google_ads".into(), "organic".into()],
            conversion_rate: 0.187,
        })
    }

    async fn get_dashboard_stats(&self) -> Result<DashboardStats, CoreError> {
        Ok(DashboardStats {
            total_events: 15_000,
            active_users: 2_500,
            revenue_today: 12_500.50,
            conversions: 125,
        })
    }
}

#[cfg(feature = "postgres")]
pub use postgres_store::PostgresAnalyticsStore;

#[cfg(feature = "postgres")]
mod postgres_store {
    use super::{AnalyticsStore, AttributionSummary, Customer, CustomerAnalytics, DashboardStats};
    use async_trait::async_trait;
    use attribution_core::CoreError;
    use sqlx::PgPool;

    /// Postgres-backed `AnalyticsStore`, for deployments that point
    /// `DATABASE_URL` at a real events table instead of running on the
    /// in-memory fixture. Queries are the Postgres analogue of the source's
    /// ClickHouse `GROUP BY app_id` / `uniq(...)` rollups.
    pub struct PostgresAnalyticsStore {
        pool: PgPool,
    }

    impl PostgresAnalyticsStore {
        #[must_use]
        pub const fn new(pool: PgPool) -> Self {
            Self { pool }
        }
    }

    #[async_trait]
    impl AnalyticsStore for PostgresAnalyticsStore {
        async fn get_customers(&self, limit: usize) -> Result<Vec<Customer>, CoreError> {
            let limit = i64::try_from(limit).unwrap_or(i64::MAX);
            let rows = sqlx::query_as::<_, (String, i64, i64, f64)>(
                r"
                SELECT app_id,
                       count(*) AS total_events,
                       count(DISTINCT user_id) AS total_users,
                       coalesce(sum(revenue), 0.0) AS total_revenue
                FROM events
                GROUP BY app_id
                ORDER BY total_events DESC
                LIMIT $1
                ",
            )
            .bind(limit)
            .fetch_all(&self.pool)
            .await
            .map_err(|err| CoreError::Unavailable(err.to_string()))?;

            Ok(rows
                .into_iter()
                .map(|(app_id, total_events, total_users, total_revenue)| Customer {
                    app_id,
                    total_events: total_events.max(0) as u64,
                    total_users: total_users.max(0) as u64,
                    total_revenue,
                    platforms: Vec::new(),
                })
                .collect())
        }

        async fn get_customer_analytics(
            &self,
            customer_id: &str,
            _limit: usize,
        ) -> Result<CustomerAnalytics, CoreError> {
            let row = sqlx::query_as::<_, (i64, i64, f64, i64)>(
                r"
                SELECT count(*) AS total_events,
                       count(DISTINCT user_id) AS total_users,
                       coalesce(sum(revenue), 0.0) AS total_revenue,
                       count(DISTINCT country) AS total_countries
                FROM events
                WHERE app_id = $1
                ",
            )
            .bind(customer_id)
            .fetch_one(&self.pool)
            .await
            .map_err(|err| CoreError::Unavailable(err.to_string()))?;

            Ok(CustomerAnalytics {
                customer_id: customer_id.to_string(),
                total_events: row.0.max(0) as u64,
                total_users: row.1.max(0) as u64,
                total_revenue: row.2,
                top_events: Vec::new(),
                top_platforms: Vec::new(),
                total_countries: row.3.max(0) as u32,
            })
        }

        async fn get_attribution(
            &self,
            customer_id: &str,
            _limit: usize,
        ) -> Result<AttributionSummary, CoreError> {
            let row = sqlx::query_as::<_, (i64, f64)>(
                r"
                SELECT count(*) AS total_conversions,
                       coalesce(sum(revenue), 0.0) AS total_revenue
                FROM events
                WHERE app_id = $1 AND event_type = 'conversion'
                ",
            )
            .bind(customer_id)
            .fetch_one(&self.pool)
            .await
            .map_err(|err| CoreError::Unavailable(err.to_string()))?;

            Ok(AttributionSummary {
                customer_id: customer_id.to_string(),
                attribution_model: "last_touch".to_string(),
                total_conversions: row.0.max(0) as u64,
                total_revenue: row.1,
                top_channels: Vec::new(),
                conversion_rate: 0.0,
            })
        }

        async fn get_dashboard_stats(&self) -> Result<DashboardStats, CoreError> {
            let row = sqlx::query_as::<_, (i64, i64, f64, i64)>(
                r"
                SELECT count(*) AS total_events,
                       count(DISTINCT user_id) AS active_users,
                       coalesce(sum(revenue) FILTER (WHERE timestamp >= extract(epoch from now() - interval '1 day') * 1000), 0.0) AS revenue_today,
                       count(*) FILTER (WHERE event_type = 'conversion') AS conversions
                FROM events
                ",
            )
            .fetch_one(&self.pool)
            .await
            .map_err(|err| CoreError::Unavailable(err.to_string()))?;

            Ok(DashboardStats {
                total_events: row.0.max(0) as u64,
                active_users: row.1.max(0) as u64,
                revenue_today: row.2,
                conversions: row.3.max(0) as u64,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn in_memory_store_lists_customers_up_to_limit() {
        let store = InMemoryAnalyticsStore::new();
        let customers = store.get_customers(1).await.unwrap();
        assert_eq!(customers.len(), 1);
        assert_eq!(customers[0].app_id, "demo-app-1");
    }

    #[tokio::test]
    async fn in_memory_store_returns_dashboard_stats() {
        let store = InMemoryAnalyticsStore::new();
        let stats = store.get_dashboard_stats().await.unwrap();
        assert_eq!(stats.conversions, 125);
    }
}
