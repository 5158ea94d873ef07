use crate::client::RequestClient;
use crate::error::ApiResult;

use super::models::{Field, FieldRequest};
use super::segment;

/// Optional list filters. Unset, blank and zero values are left out of the query entirely.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FieldFilters {
    pub location: Option<String>,
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
}

impl FieldFilters {
    pub fn is_empty(&self) -> bool { self.query_string().is_empty() }

    /// Encoded `k=v&k=v` without the leading `?`; empty when no filter is set.
    pub fn query_string(&self) -> String {
        let mut pairs: Vec<String> = Vec::new();
        if let Some(loc) = self.location.as_deref().filter(|s| !s.trim().is_empty()) {
            pairs.push(format!("location={}", urlencoding::encode(loc)));
        }
        if let Some(p) = self.min_price.filter(is_set_price) {
            pairs.push(format!("min_price={}", p));
        }
        if let Some(p) = self.max_price.filter(is_set_price) {
            pairs.push(format!("max_price={}", p));
        }
        pairs.join("&")
    }

    pub fn list_path(&self) -> String {
        let q = self.query_string();
        if q.is_empty() { "/fields".to_string() } else { format!("/fields?{}", q) }
    }
}

// zero and NaN are falsy in the dashboard's filter form; infinities never come from it
fn is_set_price(p: &f64) -> bool { p.is_finite() && *p != 0.0 }

#[derive(Clone)]
pub struct FieldsApi {
    client: RequestClient,
}

impl FieldsApi {
    pub fn new(client: RequestClient) -> Self { Self { client } }

    pub async fn list(&self, filters: &FieldFilters) -> ApiResult<Vec<Field>> {
        self.client.get(&filters.list_path()).await
    }

    pub async fn get(&self, id: &str) -> ApiResult<Field> {
        self.client.get(&format!("/fields/{}", segment(id))).await
    }

    pub async fn create(&self, req: &FieldRequest) -> ApiResult<Field> {
        self.client.post("/fields/admin", req).await
    }

    pub async fn update(&self, id: &str, req: &FieldRequest) -> ApiResult<Field> {
        self.client.put(&format!("/fields/admin/{}", segment(id)), req).await
    }

    pub async fn delete(&self, id: &str) -> ApiResult<()> {
        self.client.delete(&format!("/fields/admin/{}", segment(id))).await
    }
}
