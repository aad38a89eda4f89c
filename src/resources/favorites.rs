use crate::client::ApiClient;
use crate::error::ApiResult;
use crate::request::ApiRequest;
use crate::types::{AddFavoriteRequest, Favorite};

use std::sync::Arc;

const FAVORITES_PATH: &str = "/userRecipe";

/// `/userRecipe` endpoints: the signed-in user's favorites.
#[derive(Debug, Clone)]
pub struct FavoritesApi {
    client: Arc<ApiClient>,
}

impl FavoritesApi {
    pub fn new(client: Arc<ApiClient>) -> Self {
        Self { client }
    }

    pub async fn list(&self) -> ApiResult<Vec<Favorite>> {
        self.client.send_json(ApiRequest::get(FAVORITES_PATH)).await
    }

    pub async fn add(&self, recipe_id: i64) -> ApiResult<()> {
        let request = ApiRequest::post(FAVORITES_PATH).json(&AddFavoriteRequest { recipe_id })?;
        self.client.send_empty(request).await
    }

    pub async fn remove(&self, recipe_id: i64) -> ApiResult<()> {
        self.client
            .send_empty(ApiRequest::delete(format!("{FAVORITES_PATH}/{recipe_id}")))
            .await
    }
}
