use serde_json::{json, Value};

use crate::client::{ApiClient, ApiRequest, ApiType, ClientError, Reply};
use crate::models::{VillaCreateDto, VillaDto, VillaUpdateDto};

const BASE: &str = "/api/v1/VillaAPI";

/// Query for [`VillaClient::get_all`]. Unset values are left out.
#[derive(Debug, Clone, Default)]
pub struct VillaQuery {
    pub occupancy: Option<i32>,
    pub search: Option<String>,
    pub page_size: Option<i64>,
    pub page_number: Option<i64>,
}

impl VillaQuery {
    fn pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = vec![];
        if let Some(o) = self.occupancy {
            pairs.push(("filterOccupancy", o.to_string()));
        }
        if let Some(s) = self.search.as_deref().filter(|s| !s.is_empty()) {
            pairs.push(("search", s.to_string()));
        }
        if let Some(size) = self.page_size {
            pairs.push(("pageSize", size.to_string()));
        }
        if let Some(number) = self.page_number {
            pairs.push(("pageNumber", number.to_string()));
        }
        pairs
    }
}

#[derive(Debug, Clone)]
pub struct VillaClient {
    api: ApiClient,
}

impl VillaClient {
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }

    pub async fn get_all(&self, query: &VillaQuery, token: Option<&str>) -> Result<Reply<Vec<VillaDto>>, ClientError> {
        let url = self.api.url(BASE, &query.pairs())?;
        self.api.send(ApiRequest::new(ApiType::Get, url).token(token)).await
    }

    pub async fn get(&self, id: i32, token: Option<&str>) -> Result<Reply<VillaDto>, ClientError> {
        let url = self.api.url(&format!("{}/{}", BASE, id), &[])?;
        self.api.send(ApiRequest::new(ApiType::Get, url).token(token)).await
    }

    pub async fn create(&self, dto: &VillaCreateDto, token: Option<&str>) -> Result<Reply<VillaDto>, ClientError> {
        let url = self.api.url(BASE, &[])?;
        self.api
            .send(ApiRequest::new(ApiType::Post, url).data(json!(dto)).token(token))
            .await
    }

    pub async fn update(&self, dto: &VillaUpdateDto, token: Option<&str>) -> Result<Reply<Value>, ClientError> {
        let url = self.api.url(&format!("{}/{}", BASE, dto.id), &[])?;
        self.api
            .send(ApiRequest::new(ApiType::Put, url).data(json!(dto)).token(token))
            .await
    }

    /// Apply an RFC 6902 patch document
    pub async fn patch(&self, id: i32, operations: Value, token: Option<&str>) -> Result<Reply<Value>, ClientError> {
        let url = self.api.url(&format!("{}/{}", BASE, id), &[])?;
        self.api
            .send(ApiRequest::new(ApiType::Patch, url).data(operations).token(token))
            .await
    }

    pub async fn delete(&self, id: i32, token: Option<&str>) -> Result<Reply<Value>, ClientError> {
        let url = self.api.url(&format!("{}/{}", BASE, id), &[])?;
        self.api.send(ApiRequest::new(ApiType::Delete, url).token(token)).await
    }
}
