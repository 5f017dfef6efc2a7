//! Deterministic key builders (§4.2), so invalidation globs reliably target
//! what they mean to. Grounded on the `CacheKey generators` at the bottom of
//! `examples/original_source/attribution/internal/cache/redis.go`.

/// `analytics:customer:<cid>:limit:<n>`
#[must_use]
pub fn customer_analytics(customer_id: &str, limit: usize) -> String {
    format!("analytics:customer:{customer_id}:limit:{limit}")
}

/// `customers:list:limit:<n>`
#[must_use]
pub fn customers_list(limit: usize) -> String {
    format!("customers:list:limit:{limit}")
}

/// `attribution:customer:<cid>:limit:<n>`
#[must_use]
pub fn attribution(customer_id: &str, limit: usize) -> String {
    format!("attribution:customer:{customer_id}:limit:{limit}")
}

/// `dashboard:stats`
#[must_use]
pub fn dashboard_stats() -> String {
    "dashboard:stats".to_string()
}

/// `revenue:customer:<cid>:period:<p>`
#[must_use]
pub fn revenue_report(customer_id: &str, period: &str) -> String {
    format!("revenue:customer:{customer_id}:period:{period}")
}

/// `config:customer:<cid>:<suffix>`
#[must_use]
pub fn config_customer(customer_id: &str, suffix: &str) -> String {
    format!("config:customer:{customer_id}:{suffix}")
}

/// `campaigns:customer:<cid>:<suffix>`
#[must_use]
pub fn campaigns_customer(customer_id: &str, suffix: &str) -> String {
    format!("campaigns:customer:{customer_id}:{suffix}")
}

/// A glob matching every cache entry scoped to one customer, across all of
/// the key families above (`*customer:<cid>*`).
#[must_use]
pub fn customer_glob(customer_id: &str) -> String {
    format!("*customer:{customer_id}*")
}

/// A glob matching every `customers:*` entry (e.g. the customers list at any
/// limit).
#[must_use]
pub fn customers_glob() -> String {
    "customers:*".to_string()
}

/// A glob matching every `dashboard:*` entry.
#[must_use]
pub fn dashboard_glob() -> String {
    "dashboard:*".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builders_produce_expected_shapes() {
        assert_eq!(
            customer_analytics("cust_1", 50),
            "analytics:customer:cust_1:limit:50"
        );
        assert_eq!(customers_list(100), "customers:list:limit:100");
        assert_eq!(
            attribution("cust_1", 25),
            "attribution:customer:cust_1:limit:25"
        );
        assert_eq!(dashboard_stats(), "dashboard:stats");
        assert_eq!(
            revenue_report("cust_1", "30d"),
            "revenue:customer:cust_1:period:30d"
        );
    }

    #[test]
    fn customer_glob_matches_all_customer_key_families() {
        let pattern = glob::Pattern::new(&customer_glob("cust_1")).unwrap();
        assert!(pattern.matches(&customer_analytics("cust_1", 50)));
        assert!(pattern.matches(&attribution("cust_1", 50)));
        assert!(!pattern.matches(&customer_analytics("cust_2", 50)));
    }
}
