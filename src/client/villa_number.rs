use serde_json::{json, Value};

use crate::client::{ApiClient, ApiRequest, ApiType, ClientError, Reply};
use crate::models::{VillaNumberCreateDto, VillaNumberDto, VillaNumberUpdateDto};

/// Villa number endpoints of one API version (`v1` or `v2`)
#[derive(Debug, Clone)]
pub struct VillaNumberClient {
    api: ApiClient,
    base: String,
}

impl VillaNumberClient {
    pub fn new(api: ApiClient, version: u8) -> Self {
        Self {
            api,
            base: format!("/api/v{}/VillaNumberAPI", version),
        }
    }

    pub async fn get_all(
        &self,
        page_size: Option<i64>,
        page_number: Option<i64>,
        token: Option<&str>,
    ) -> Result<Reply<Vec<VillaNumberDto>>, ClientError> {
        let mut query = vec![];
        if let Some(size) = page_size {
            query.push(("pageSize", size.to_string()));
        }
        if let Some(number) = page_number {
            query.push(("pageNumber", number.to_string()));
        }
        let url = self.api.url(&self.base, &query)?;
        self.api.send(ApiRequest::new(ApiType::Get, url).token(token)).await
    }

    pub async fn get(&self, villa_no: i32, token: Option<&str>) -> Result<Reply<VillaNumberDto>, ClientError> {
        let url = self.api.url(&format!("{}/{}", self.base, villa_no), &[])?;
        self.api.send(ApiRequest::new(ApiType::Get, url).token(token)).await
    }

    pub async fn create(
        &self,
        dto: &VillaNumberCreateDto,
        token: Option<&str>,
    ) -> Result<Reply<VillaNumberDto>, ClientError> {
        let url = self.api.url(&self.base, &[])?;
        self.api
            .send(ApiRequest::new(ApiType::Post, url).data(json!(dto)).token(token))
            .await
    }

    pub async fn update(&self, dto: &VillaNumberUpdateDto, token: Option<&str>) -> Result<Reply<Value>, ClientError> {
        let url = self.api.url(&format!("{}/{}", self.base, dto.villa_no), &[])?;
        self.api
            .send(ApiRequest::new(ApiType::Put, url).data(json!(dto)).token(token))
            .await
    }

    pub async fn delete(&self, villa_no: i32, token: Option<&str>) -> Result<Reply<Value>, ClientError> {
        let url = self.api.url(&format!("{}/{}", self.base, villa_no), &[])?;
        self.api.send(ApiRequest::new(ApiType::Delete, url).token(token)).await
    }
}
