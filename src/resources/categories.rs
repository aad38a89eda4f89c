use crate::client::ApiClient;
use crate::error::ApiResult;
use crate::request::ApiRequest;
use crate::types::{Category, CategoryInput};

use std::sync::Arc;

const CATEGORY_PATH: &str = "/Category";

/// `/Category` endpoints.
#[derive(Debug, Clone)]
pub struct CategoriesApi {
    client: Arc<ApiClient>,
}

impl CategoriesApi {
    pub fn new(client: Arc<ApiClient>) -> Self {
        Self { client }
    }

    pub async fn list(&self) -> ApiResult<Vec<Category>> {
        self.client.send_json(ApiRequest::get(CATEGORY_PATH)).await
    }

    pub async fn get(&self, id: i64) -> ApiResult<Category> {
        self.client
            .send_json(ApiRequest::get(format!("{CATEGORY_PATH}/{id}")))
            .await
    }

    /// `None` when the service acknowledges without echoing the entity.
    pub async fn create(&self, input: &CategoryInput) -> ApiResult<Option<Category>> {
        let request = ApiRequest::post(CATEGORY_PATH).json(input)?;
        self.client.send_json(request).await
    }

    pub async fn update(&self, id: i64, input: &CategoryInput) -> ApiResult<Option<Category>> {
        let request = ApiRequest::put(format!("{CATEGORY_PATH}/{id}")).json(input)?;
        self.client.send_json(request).await
    }

    pub async fn delete(&self, id: i64) -> ApiResult<()> {
        self.client
            .send_empty(ApiRequest::delete(format!("{CATEGORY_PATH}/{id}")))
            .await
    }
}
