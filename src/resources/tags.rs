use crate::client::ApiClient;
use crate::error::ApiResult;
use crate::request::ApiRequest;
use crate::types::Tag;

use std::sync::Arc;

/// `/tag` endpoint. Read-only.
#[derive(Debug, Clone)]
pub struct TagsApi {
    client: Arc<ApiClient>,
}

impl TagsApi {
    pub fn new(client: Arc<ApiClient>) -> Self {
        Self { client }
    }

    pub async fn list(&self) -> ApiResult<Vec<Tag>> {
        self.client.send_json(ApiRequest::get("/tag")).await
    }
}
