//! Merchant data service
//!
//! Cached reads of merchants, merchant counts and merchant menus. Every
//! operation first checks the cache under a key built from its parameters and
//! only calls the content API on a miss, writing the result back afterwards.
//!
//! The `try_*` methods report failures as [`FetchError`]. The plain methods
//! are the public boundary: they log the error and return an empty default,
//! since callers render whatever is available and have no way to recover.

use std::collections::HashMap;
use std::time::Duration;

use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info, warn};

use super::api::{decode, ContentApi, FetchError, HttpContentApi, Paginated};
use super::menu::{collect_products, index_categories, merge_categories};
use super::{CategoryDisplay, Merchant, MerchantFilters, MerchantMenuData};
use crate::cache::{CacheKey, CacheManager};
use crate::config::ServiceConfig;

/// Cache resource family shared by every key this service writes
const CACHE_RESOURCE: &str = "merchants";

const MERCHANTS_PATH: &str = "merchants";
const MERCHANT_PRODUCTS_PATH: &str = "merchant-products";
const PRODUCT_CATEGORIES_PATH: &str = "product-categories";

/// Relationship depth requested for merchant lists
const LIST_DEPTH: u32 = 2;
/// Relationship depth requested for a single merchant
const DETAIL_DEPTH: u32 = 3;
/// Relationship depth requested for merchant products
const MENU_DEPTH: u32 = 2;
/// Relationship depth requested for categories
const CATEGORY_DEPTH: u32 = 1;

/// Query parameters for one API request
#[derive(Debug, Default)]
struct Query(Vec<(String, String)>);

impl Query {
    fn new() -> Self {
        Self::default()
    }

    fn param(mut self, name: &str, value: impl ToString) -> Self {
        self.0.push((name.to_string(), value.to_string()));
        self
    }

    fn param_opt<V: ToString>(self, name: &str, value: Option<V>) -> Self {
        match value {
            Some(value) => self.param(name, value),
            None => self,
        }
    }

    fn pairs(&self) -> &[(String, String)] {
        &self.0
    }
}

/// Cached, fail-open access to merchant data
#[derive(Debug, Clone)]
pub struct MerchantService<A = HttpContentApi> {
    api: A,
    cache: CacheManager,
    config: ServiceConfig,
}

impl MerchantService<HttpContentApi> {
    /// Creates a service talking HTTP to the configured API, with its own cache
    pub fn from_config(config: ServiceConfig) -> Self {
        let api = HttpContentApi::from_config(&config);
        Self::new(api, CacheManager::new(), config)
    }
}

impl<A: ContentApi> MerchantService<A> {
    /// Creates a service over the given API client and cache
    pub fn new(api: A, cache: CacheManager, config: ServiceConfig) -> Self {
        Self { api, cache, config }
    }

    /// The cache this service reads and writes
    pub fn cache(&self) -> &CacheManager {
        &self.cache
    }

    /// Lists merchants matching `filters`, or an empty list on any failure
    pub async fn get_merchants(&self, filters: &MerchantFilters) -> Vec<Merchant> {
        match self.try_get_merchants(filters).await {
            Ok(merchants) => merchants,
            Err(e) => {
                warn!(error = %e, ?filters, "Failed to fetch merchants");
                Vec::new()
            }
        }
    }

    /// Fetches one merchant, or `None` if it doesn't exist or can't be loaded
    pub async fn get_merchant_by_id(&self, id: &str) -> Option<Merchant> {
        match self.try_get_merchant_by_id(id).await {
            Ok(merchant) => Some(merchant),
            Err(FetchError::NotFound) => {
                debug!(merchant_id = id, "Merchant not found");
                None
            }
            Err(e) => {
                warn!(error = %e, merchant_id = id, "Failed to fetch merchant");
                None
            }
        }
    }

    /// Counts merchants, optionally only active or inactive ones; 0 on failure
    pub async fn get_merchants_count(&self, is_active: Option<bool>) -> u64 {
        match self.try_get_merchants_count(is_active).await {
            Ok(count) => count,
            Err(e) => {
                warn!(error = %e, ?is_active, "Failed to count merchants");
                0
            }
        }
    }

    /// Builds a merchant's menu, or an empty menu on failure
    pub async fn get_merchant_menu(
        &self,
        merchant_id: &str,
        page: u32,
        limit: u32,
    ) -> MerchantMenuData {
        match self.try_get_merchant_menu(merchant_id, page, limit).await {
            Ok(menu) => menu,
            Err(e) => {
                warn!(
                    error = %e,
                    merchant_id,
                    page,
                    limit,
                    "Failed to fetch merchant menu"
                );
                MerchantMenuData::empty()
            }
        }
    }

    /// Drops every cached merchant entry so the next reads go to the API
    ///
    /// Returns the number of entries removed.
    pub fn clear_cache(&self) -> usize {
        let removed = self.cache.delete_prefix(&CacheKey::prefix(CACHE_RESOURCE));
        info!(removed, "Cleared merchant cache");
        removed
    }

    /// Lists merchants matching `filters`
    pub async fn try_get_merchants(
        &self,
        filters: &MerchantFilters,
    ) -> Result<Vec<Merchant>, FetchError> {
        let key = CacheKey::new(CACHE_RESOURCE)
            .param("view", "list")
            .param("limit", filters.limit)
            .param("page", filters.page)
            .param_opt("active", filters.is_active)
            .to_string();
        if let Some(merchants) = self.cached::<Vec<Merchant>>(&key) {
            return Ok(merchants);
        }

        let query = Query::new()
            .param("limit", filters.limit)
            .param("page", filters.page)
            .param_opt("where[isActive][equals]", filters.is_active)
            .param("depth", LIST_DEPTH);
        let body = self.api.get_json(&[MERCHANTS_PATH], query.pairs()).await?;
        let page: Paginated<Merchant> = decode(body)?;

        self.store(&key, &page.docs, self.config.list_ttl);
        Ok(page.docs)
    }

    /// Fetches one merchant by id
    ///
    /// A blank id is not found without asking the API. The id is sent as a
    /// single path segment, and a record whose own id differs from the
    /// requested one is rejected rather than cached.
    pub async fn try_get_merchant_by_id(&self, id: &str) -> Result<Merchant, FetchError> {
        if id.trim().is_empty() {
            return Err(FetchError::NotFound);
        }

        let key = CacheKey::new(CACHE_RESOURCE)
            .param("view", "detail")
            .param("id", id)
            .to_string();
        if let Some(merchant) = self.cached::<Merchant>(&key) {
            return Ok(merchant);
        }

        let query = Query::new().param("depth", DETAIL_DEPTH);
        let body = self
            .api
            .get_json(&[MERCHANTS_PATH, id], query.pairs())
            .await?;
        if !body.is_object() {
            return Err(FetchError::Shape("merchant is not an object".to_string()));
        }
        let merchant = Merchant::new(body);
        match merchant.id() {
            Some(returned) if returned == id => {}
            returned => {
                return Err(FetchError::Shape(format!(
                    "requested merchant {} but got {}",
                    id,
                    returned.as_deref().unwrap_or("a record without an id")
                )));
            }
        }

        self.store(&key, &merchant, self.config.detail_ttl);
        Ok(merchant)
    }

    /// Counts merchants by reading the total from a one-item page
    pub async fn try_get_merchants_count(
        &self,
        is_active: Option<bool>,
    ) -> Result<u64, FetchError> {
        let key = CacheKey::new(CACHE_RESOURCE)
            .param("view", "count")
            .param_opt("active", is_active)
            .to_string();
        if let Some(count) = self.cached::<u64>(&key) {
            return Ok(count);
        }

        let query = Query::new()
            .param("limit", 1)
            .param_opt("where[isActive][equals]", is_active)
            .param("depth", 0);
        let body = self.api.get_json(&[MERCHANTS_PATH], query.pairs()).await?;
        let count = body
            .get("totalDocs")
            .and_then(Value::as_u64)
            .ok_or_else(|| FetchError::Shape("missing totalDocs".to_string()))?;

        self.store(&key, &count, self.config.count_ttl);
        Ok(count)
    }

    /// Builds a merchant's menu from its products and their categories
    ///
    /// Products come from one page of the merchant's active, available
    /// listings, minus hidden ones. Categories are fetched in one batch for
    /// every id the products reference. If that fetch fails, or leaves ids
    /// out, the copies embedded in the product payloads fill in.
    pub async fn try_get_merchant_menu(
        &self,
        merchant_id: &str,
        page: u32,
        limit: u32,
    ) -> Result<MerchantMenuData, FetchError> {
        let key = CacheKey::new(CACHE_RESOURCE)
            .param("view", "menu")
            .param("id", merchant_id)
            .param("page", page)
            .param("limit", limit)
            .to_string();
        if let Some(menu) = self.cached::<MerchantMenuData>(&key) {
            return Ok(menu);
        }

        let query = Query::new()
            .param("where[merchant_id][equals]", merchant_id)
            .param("where[is_active][equals]", true)
            .param("where[is_available][equals]", true)
            .param("depth", MENU_DEPTH)
            .param("limit", limit)
            .param("page", page);
        let body = self
            .api
            .get_json(&[MERCHANT_PRODUCTS_PATH], query.pairs())
            .await?;
        let listings: Paginated<Value> = decode(body)?;
        let pagination = listings.pagination();

        let collected = collect_products(listings.docs);
        let categories = if collected.category_ids.is_empty() {
            Vec::new()
        } else {
            let authoritative = self.fetch_categories(&collected.category_ids).await;
            merge_categories(
                &authoritative,
                &collected.embedded,
                &collected.category_ids,
            )
        };

        let menu = MerchantMenuData {
            products: collected.products,
            categories,
            pagination: Some(pagination),
        };

        self.store(&key, &menu, self.config.menu_ttl);
        Ok(menu)
    }

    /// Fetches categories by id in one request
    ///
    /// A failed request yields an empty map, leaving the embedded copies as
    /// the only source.
    async fn fetch_categories(&self, ids: &[String]) -> HashMap<String, CategoryDisplay> {
        match self.try_fetch_categories(ids).await {
            Ok(categories) => {
                let missing = ids
                    .iter()
                    .filter(|id| !categories.contains_key(*id))
                    .count();
                if missing > 0 {
                    debug!(
                        missing,
                        requested = ids.len(),
                        "Category response left ids out"
                    );
                }
                categories
            }
            Err(e) => {
                warn!(
                    error = %e,
                    requested = ids.len(),
                    "Category fetch failed, using embedded categories"
                );
                HashMap::new()
            }
        }
    }

    async fn try_fetch_categories(
        &self,
        ids: &[String],
    ) -> Result<HashMap<String, CategoryDisplay>, FetchError> {
        let query = Query::new()
            .param("where[id][in]", ids.join(","))
            .param("limit", ids.len())
            .param("depth", CATEGORY_DEPTH);
        let body = self
            .api
            .get_json(&[PRODUCT_CATEGORIES_PATH], query.pairs())
            .await?;
        let page: Paginated<Value> = decode(body)?;
        Ok(index_categories(page.docs))
    }

    fn cached<T: serde::de::DeserializeOwned>(&self, key: &str) -> Option<T> {
        let hit = self.cache.get(key);
        debug!(key, hit = hit.is_some(), "Cache lookup");
        hit
    }

    fn store<T: Serialize>(&self, key: &str, value: &T, ttl: Duration) {
        if let Err(e) = self.cache.set(key, value, ttl) {
            warn!(error = %e, key, "Failed to cache response");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use serde_json::json;
    use std::collections::VecDeque;
    use std::sync::Arc;

    /// A canned API reply
    enum Reply {
        Json(Value),
        Fail(u16),
        NotFound,
    }

    /// Stub API that replays canned replies in order and records each request
    #[derive(Clone, Default)]
    struct StubApi {
        replies: Arc<Mutex<VecDeque<Reply>>>,
        requests: Arc<Mutex<Vec<(Vec<String>, Vec<(String, String)>)>>>,
    }

    impl StubApi {
        fn with(replies: Vec<Reply>) -> Self {
            Self {
                replies: Arc::new(Mutex::new(replies.into())),
                ..Default::default()
            }
        }

        fn calls(&self) -> usize {
            self.requests.lock().len()
        }

        fn request(&self, i: usize) -> (String, Vec<(String, String)>) {
            let (path, query) = self.requests.lock()[i].clone();
            (path.join("/"), query)
        }

        fn segments(&self, i: usize) -> Vec<String> {
            self.requests.lock()[i].0.clone()
        }
    }

    #[async_trait]
    impl ContentApi for StubApi {
        async fn get_json(
            &self,
            path: &[&str],
            query: &[(String, String)],
        ) -> Result<Value, FetchError> {
            let path = path.iter().map(|s| s.to_string()).collect();
            self.requests.lock().push((path, query.to_vec()));
            match self.replies.lock().pop_front() {
                Some(Reply::Json(body)) => Ok(body),
                Some(Reply::Fail(status)) => Err(FetchError::Status(status)),
                Some(Reply::NotFound) => Err(FetchError::NotFound),
                None => Err(FetchError::Status(599)),
            }
        }
    }

    fn stub_service(api: StubApi) -> MerchantService<StubApi> {
        MerchantService::new(api, CacheManager::new(), ServiceConfig::default())
    }

    fn param<'a>(query: &'a [(String, String)], name: &str) -> Option<&'a str> {
        query
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    fn envelope(docs: Value, total: u64) -> Value {
        json!({
            "docs": docs,
            "totalDocs": total,
            "limit": 48,
            "page": 1,
            "totalPages": 1,
            "hasNextPage": false,
            "hasPrevPage": false
        })
    }

    #[tokio::test]
    async fn test_get_merchants_unwraps_docs_and_sends_filters() {
        let api = StubApi::with(vec![Reply::Json(envelope(
            json!([{"id": 1}, {"id": 2}]),
            2,
        ))]);
        let service = stub_service(api.clone());

        let filters = MerchantFilters {
            is_active: Some(true),
            limit: 20,
            page: 3,
        };
        let merchants = service.get_merchants(&filters).await;

        assert_eq!(merchants.len(), 2);
        assert_eq!(merchants[1].id().as_deref(), Some("2"));

        let (path, query) = api.request(0);
        assert_eq!(path, "merchants");
        assert_eq!(param(&query, "limit"), Some("20"));
        assert_eq!(param(&query, "page"), Some("3"));
        assert_eq!(param(&query, "where[isActive][equals]"), Some("true"));
        assert_eq!(param(&query, "depth"), Some("2"));
    }

    #[tokio::test]
    async fn test_get_merchants_omits_active_filter_when_unset() {
        let api = StubApi::with(vec![Reply::Json(envelope(json!([]), 0))]);
        let service = stub_service(api.clone());

        service.get_merchants(&MerchantFilters::default()).await;

        let (_, query) = api.request(0);
        assert_eq!(param(&query, "where[isActive][equals]"), None);
    }

    #[tokio::test]
    async fn test_get_merchants_fails_open_on_server_error() {
        let service = stub_service(StubApi::with(vec![Reply::Fail(500)]));
        let result = service.try_get_merchants(&MerchantFilters::default()).await;
        assert!(matches!(result, Err(FetchError::Status(500))));

        let service = stub_service(StubApi::with(vec![Reply::Fail(500)]));
        let merchants = service.get_merchants(&MerchantFilters::default()).await;
        assert!(merchants.is_empty());
    }

    #[tokio::test]
    async fn test_get_merchants_fails_open_on_bad_shape() {
        let api = StubApi::with(vec![Reply::Json(json!({"unexpected": true}))]);
        let service = stub_service(api);

        let result = service.try_get_merchants(&MerchantFilters::default()).await;
        assert!(matches!(result, Err(FetchError::Parse(_))));
    }

    #[tokio::test]
    async fn test_failures_are_not_cached() {
        let api = StubApi::with(vec![
            Reply::Fail(500),
            Reply::Json(envelope(json!([{"id": 1}]), 1)),
        ]);
        let service = stub_service(api.clone());

        let filters = MerchantFilters::default();
        assert!(service.get_merchants(&filters).await.is_empty());
        assert_eq!(service.get_merchants(&filters).await.len(), 1);
        assert_eq!(api.calls(), 2);
    }

    #[tokio::test]
    async fn test_different_filters_use_different_entries() {
        let api = StubApi::with(vec![
            Reply::Json(envelope(json!([{"id": 1}]), 1)),
            Reply::Json(envelope(json!([{"id": 2}]), 1)),
        ]);
        let service = stub_service(api.clone());

        let page1 = service.get_merchants(&MerchantFilters::default()).await;
        let page2 = service
            .get_merchants(&MerchantFilters {
                page: 2,
                ..Default::default()
            })
            .await;

        assert_ne!(page1, page2);
        assert_eq!(api.calls(), 2);
    }

    #[tokio::test]
    async fn test_get_merchant_by_id_caches_record() {
        let api = StubApi::with(vec![Reply::Json(json!({
            "id": "m1",
            "name": "Pho House"
        }))]);
        let service = stub_service(api.clone());

        let first = service.get_merchant_by_id("m1").await.expect("merchant");
        let second = service.get_merchant_by_id("m1").await.expect("cached merchant");

        assert_eq!(first, second);
        assert_eq!(first.field("name"), Some(&json!("Pho House")));
        assert_eq!(api.calls(), 1);

        let (path, query) = api.request(0);
        assert_eq!(path, "merchants/m1");
        assert_eq!(param(&query, "depth"), Some("3"));
    }

    #[tokio::test]
    async fn test_get_merchant_by_id_not_found_is_none() {
        let api = StubApi::with(vec![Reply::NotFound]);
        let service = stub_service(api);

        let result = service.try_get_merchant_by_id("ghost").await;
        assert!(matches!(result, Err(FetchError::NotFound)));

        let service = stub_service(StubApi::with(vec![Reply::NotFound, Reply::Fail(502)]));
        assert!(service.get_merchant_by_id("ghost").await.is_none());
        assert!(service.get_merchant_by_id("ghost").await.is_none());
    }

    #[tokio::test]
    async fn test_get_merchant_by_id_sends_id_as_one_segment() {
        let api = StubApi::with(vec![Reply::Json(json!({"id": "a/b?c"}))]);
        let service = stub_service(api.clone());

        let merchant = service.get_merchant_by_id("a/b?c").await;

        assert_eq!(merchant.and_then(|m| m.id()).as_deref(), Some("a/b?c"));
        assert_eq!(api.segments(0), vec!["merchants", "a/b?c"]);
    }

    #[tokio::test]
    async fn test_blank_merchant_id_is_not_found_without_request() {
        let api = StubApi::with(vec![Reply::Json(envelope(json!([{"id": 1}]), 1))]);
        let service = stub_service(api.clone());

        assert!(matches!(
            service.try_get_merchant_by_id("").await,
            Err(FetchError::NotFound)
        ));
        assert!(service.get_merchant_by_id("  ").await.is_none());
        assert_eq!(api.calls(), 0);
    }

    #[tokio::test]
    async fn test_merchant_with_other_id_is_rejected_and_not_cached() {
        let api = StubApi::with(vec![
            Reply::Json(json!({"id": "other"})),
            Reply::Json(envelope(json!([{"id": "m1"}]), 1)),
        ]);
        let service = stub_service(api.clone());

        assert!(matches!(
            service.try_get_merchant_by_id("m1").await,
            Err(FetchError::Shape(_))
        ));
        assert!(service.get_merchant_by_id("m1").await.is_none());
        assert_eq!(api.calls(), 2);
        assert_eq!(service.cache().stats().size, 0);
    }

    #[tokio::test]
    async fn test_numeric_merchant_id_matches_request() {
        let api = StubApi::with(vec![Reply::Json(json!({"id": 7, "name": "Banh Mi"}))]);
        let service = stub_service(api);

        let merchant = service.get_merchant_by_id("7").await.expect("merchant");
        assert_eq!(merchant.field("name"), Some(&json!("Banh Mi")));
    }

    #[tokio::test]
    async fn test_get_merchants_count_reads_total() {
        let api = StubApi::with(vec![Reply::Json(envelope(json!([{"id": 1}]), 37))]);
        let service = stub_service(api.clone());

        assert_eq!(service.get_merchants_count(Some(true)).await, 37);
        assert_eq!(service.get_merchants_count(Some(true)).await, 37);
        assert_eq!(api.calls(), 1);

        let (_, query) = api.request(0);
        assert_eq!(param(&query, "limit"), Some("1"));
        assert_eq!(param(&query, "where[isActive][equals]"), Some("true"));
    }

    #[tokio::test]
    async fn test_get_merchants_count_fails_open() {
        let api = StubApi::with(vec![Reply::Json(json!({"docs": []}))]);
        let service = stub_service(api);

        assert!(matches!(
            service.try_get_merchants_count(None).await,
            Err(FetchError::Shape(_))
        ));

        let service = stub_service(StubApi::with(vec![Reply::Fail(503)]));
        assert_eq!(service.get_merchants_count(None).await, 0);
    }

    fn menu_products() -> Value {
        envelope(
            json!([
                {
                    "id": 1,
                    "product_id": {
                        "id": 11,
                        "name": "Spring Rolls",
                        "base_price": 6.0,
                        "media": {
                            "primary_image": {
                                "cdn_url": "https://cdn/rolls.jpg",
                                "url": "https://img/rolls.jpg"
                            }
                        },
                        "categories": [
                            {"id": "A", "name": "Starters (embedded)", "slug": "starters"},
                            "B"
                        ]
                    }
                },
                {
                    "id": 2,
                    "product_id": {
                        "id": 12,
                        "name": "Pho",
                        "base_price": 14.0,
                        "categories": [{"id": "B", "name": "Soups (embedded)", "slug": "soups"}]
                    }
                },
                {
                    "id": 3,
                    "product_id": {
                        "id": 13,
                        "name": "Staff Meal",
                        "catalog_visibility": "hidden",
                        "categories": [{"id": "C", "name": "Staff", "slug": "staff"}]
                    }
                }
            ]),
            3,
        )
    }

    #[tokio::test]
    async fn test_menu_merges_authoritative_and_embedded_categories() {
        let api = StubApi::with(vec![
            Reply::Json(menu_products()),
            Reply::Json(envelope(
                json!([{"id": "A", "name": "Starters", "slug": "starters"}]),
                1,
            )),
        ]);
        let service = stub_service(api.clone());

        let menu = service.get_merchant_menu("m1", 1, 48).await;

        let names: Vec<&str> = menu
            .products
            .iter()
            .map(|p| p.name.as_str())
            .collect();
        assert_eq!(names, vec!["Spring Rolls", "Pho"]);
        assert_eq!(
            menu.products[0].image_url.as_deref(),
            Some("https://cdn/rolls.jpg")
        );

        let categories: Vec<(&str, &str)> = menu
            .categories
            .iter()
            .map(|c| (c.id.as_str(), c.name.as_str()))
            .collect();
        assert_eq!(
            categories,
            vec![("A", "Starters"), ("B", "Soups (embedded)")]
        );
        assert_eq!(menu.pagination.map(|p| p.total_docs), Some(3));

        let (path, query) = api.request(0);
        assert_eq!(path, "merchant-products");
        assert_eq!(param(&query, "where[merchant_id][equals]"), Some("m1"));
        assert_eq!(param(&query, "where[is_active][equals]"), Some("true"));
        assert_eq!(
            param(&query, "where[is_available][equals]"),
            Some("true")
        );
        assert_eq!(param(&query, "limit"), Some("48"));
        assert_eq!(param(&query, "page"), Some("1"));

        let (path, query) = api.request(1);
        assert_eq!(path, "product-categories");
        assert_eq!(param(&query, "where[id][in]"), Some("A,B"));
        assert_eq!(param(&query, "limit"), Some("2"));
        assert_eq!(param(&query, "depth"), Some("1"));
    }

    #[tokio::test]
    async fn test_menu_category_failure_uses_embedded_only() {
        let products = envelope(
            json!([{
                "id": 1,
                "product_id": {
                    "id": 11,
                    "name": "Curry",
                    "categories": [{"id": "A", "name": "Mains", "slug": "mains"}, "Z"]
                }
            }]),
            1,
        );
        let api = StubApi::with(vec![Reply::Json(products), Reply::Fail(500)]);
        let service = stub_service(api.clone());

        let menu = service
            .try_get_merchant_menu("m1", 1, 48)
            .await
            .expect("category failure should not abort the menu");

        assert_eq!(menu.products.len(), 1);
        let ids: Vec<&str> = menu
            .categories
            .iter()
            .map(|c| c.id.as_str())
            .collect();
        assert_eq!(ids, vec!["A"], "Z has no embedded copy and is dropped");
        assert_eq!(api.calls(), 2);
    }

    #[tokio::test]
    async fn test_menu_without_categories_skips_category_fetch() {
        let products = envelope(
            json!([{"id": 1, "product_id": {"id": 11, "name": "Water"}}]),
            1,
        );
        let api = StubApi::with(vec![Reply::Json(products)]);
        let service = stub_service(api.clone());

        let menu = service.get_merchant_menu("m1", 1, 48).await;

        assert_eq!(menu.products.len(), 1);
        assert!(menu.categories.is_empty());
        assert_eq!(api.calls(), 1);
    }

    #[tokio::test]
    async fn test_menu_fails_open_when_products_fail() {
        let api = StubApi::with(vec![Reply::Fail(500)]);
        let service = stub_service(api.clone());

        let menu = service.get_merchant_menu("m1", 1, 48).await;

        assert_eq!(menu, MerchantMenuData::empty());
        assert_eq!(api.calls(), 1);
    }

    #[tokio::test]
    async fn test_clear_cache_only_removes_merchant_entries() {
        let api = StubApi::with(vec![Reply::Json(json!({"id": "m1"}))]);
        let service = stub_service(api);
        service
            .cache()
            .set("orders:id=1", &1u32, Duration::from_secs(60))
            .unwrap();

        service.get_merchant_by_id("m1").await;
        assert_eq!(service.cache().stats().size, 2);

        assert_eq!(service.clear_cache(), 1);
        assert_eq!(
            service.cache().stats().keys,
            vec!["orders:id=1".to_string()]
        );
    }

    #[tokio::test]
    async fn test_expired_entry_triggers_refetch() {
        let api = StubApi::with(vec![
            Reply::Json(envelope(json!([{"id": 1}]), 1)),
            Reply::Json(envelope(json!([{"id": 1}]), 1)),
        ]);
        let config = ServiceConfig {
            list_ttl: Duration::from_millis(5),
            ..Default::default()
        };
        let service = MerchantService::new(api.clone(), CacheManager::new(), config);

        service.get_merchants(&MerchantFilters::default()).await;
        tokio::time::sleep(Duration::from_millis(20)).await;
        service.get_merchants(&MerchantFilters::default()).await;

        assert_eq!(api.calls(), 2);
    }
}
