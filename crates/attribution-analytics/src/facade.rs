//! `AnalyticsFacade`: the read-side adapter (§4.5) — every read goes
//! through `CacheFacade::get_or_set`, falling through to the backing
//! `AnalyticsStore` on a miss or when the cache itself is unavailable.
//!
//! Grounded on the `Cache.GetOrSet -> Store.Query` contract in the
//! specification's read-side section; the TTL table below is the one
//! piece of policy this façade owns.

use std::sync::Arc;
use std::time::Duration;

use attribution_cache::{CacheFacade, CacheOutcome};
use attribution_core::CoreError;

use crate::store::AnalyticsStore;
use crate::types::{AttributionSummary, Customer, CustomerAnalytics, DashboardStats};

/// Dashboard rollups churn fastest; 30s keeps it close to live without
/// hammering the store on every page load.
const DASHBOARD_TTL: Duration = Duration::from_secs(30);
/// Mid-point of the specified 2-5 minute band.
const CUSTOMERS_LIST_TTL: Duration = Duration::from_secs(180);
const ANALYTICS_TTL: Duration = Duration::from_secs(300);
const ATTRIBUTION_TTL: Duration = Duration::from_secs(600);

/// The read-side façade (§4.5): `GetCustomers`/`GetCustomerAnalytics`/
/// `GetAttribution`/`GetDashboardStats`, each cached under its own TTL.
pub struct AnalyticsFacade {
    cache: Arc<CacheFacade>,
    store: Arc<dyn AnalyticsStore>,
}

impl AnalyticsFacade {
    #[must_use]
    pub const fn new(cache: Arc<CacheFacade>, store: Arc<dyn AnalyticsStore>) -> Self {
        Self { cache, store }
    }

    /// Paged customer list, cached for 2-5 minutes.
    pub async fn get_customers(
        &self,
        limit: usize,
    ) -> Result<(Vec<Customer>, CacheOutcome), CoreError> {
        let key = attribution_cache::keys::customers_list(limit);
        self.cache
            .get_or_set(&key, CUSTOMERS_LIST_TTL, || async {
                self.store.get_customers(limit).await
            })
            .await
    }

    /// Per-customer analytics rollup, cached for 5 minutes.
    pub async fn get_customer_analytics(
        &self,
        customer_id: &str,
        limit: usize,
    ) -> Result<(CustomerAnalytics, CacheOutcome), CoreError> {
        let key = attribution_cache::keys::customer_analytics(customer_id, limit);
        self.cache
            .get_or_set(&key, ANALYTICS_TTL, || async {
                self.store.get_customer_analytics(customer_id, limit).await
            })
            .await
    }

    /// Per-customer attribution summary, cached for 10 minutes.
    pub async fn get_attribution(
        &self,
        customer_id: &str,
        limit: usize,
    ) -> Result<(AttributionSummary, CacheOutcome), CoreError> {
        let key = attribution_cache::keys::attribution(customer_id, limit);
        self.cache
            .get_or_set(&key, ATTRIBUTION_TTL, || async {
                self.store.get_attribution(customer_id, limit).await
            })
            .await
    }

    /// Global dashboard rollup, cached for 30 seconds (the "live data"
    /// upper bound from §4.5).
    pub async fn get_dashboard_stats(&self) -> Result<(DashboardStats, CacheOutcome), CoreError> {
        let key = attribution_cache::keys::dashboard_stats();
        self.cache
            .get_or_set(&key, DASHBOARD_TTL, || async {
                self.store.get_dashboard_stats().await
            })
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::InMemoryAnalyticsStore;
    use attribution_cache::store::MokaStore;
    use attribution_metrics::MetricsCollector;

    fn facade() -> AnalyticsFacade {
        let cache = Arc::new(CacheFacade::new(
            Arc::new(MokaStore::new(1_000)),
            "test:",
            Duration::from_secs(60),
            MetricsCollector::new(),
        ));
        AnalyticsFacade::new(cache, Arc::new(InMemoryAnalyticsStore::new()))
    }

    #[tokio::test]
    async fn get_customers_fills_then_hits_cache() {
        let facade = facade();
        let (customers, outcome) = facade.get_customers(10).await.unwrap();
        assert_eq!(customers.len(), 2);
        assert_eq!(outcome, CacheOutcome::Filled);

        let (_, outcome) = facade.get_customers(10).await.unwrap();
        assert_eq!(outcome, CacheOutcome::Hit);
    }

    #[tokio::test]
    async fn get_dashboard_stats_round_trips() {
        let facade = facade();
        let (stats, _) = facade.get_dashboard_stats().await.unwrap();
        assert_eq!(stats.conversions, 125);
    }

    #[tokio::test]
    async fn get_attribution_is_keyed_per_customer() {
        let facade = facade();
        let (summary, _) = facade.get_attribution("cust_1", 10).await.unwrap();
        assert_eq!(summary.customer_id, "cust_1");
    }
}
