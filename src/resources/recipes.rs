use crate::client::ApiClient;
use crate::error::ApiResult;
use crate::request::{ApiRequest, MultipartBody};
use crate::types::{Recipe, RecipeInput, RecipeQuery};

use std::sync::Arc;

const RECIPE_PATH: &str = "/Recipe";

/// `/Recipe` endpoints.
#[derive(Debug, Clone)]
pub struct RecipesApi {
    client: Arc<ApiClient>,
}

impl RecipesApi {
    pub fn new(client: Arc<ApiClient>) -> Self {
        Self { client }
    }

    pub async fn list(&self, query: &RecipeQuery) -> ApiResult<Vec<Recipe>> {
        let request = ApiRequest::get(RECIPE_PATH)
            .optional_query("page", query.page)
            .optional_query("pageSize", query.page_size)
            .optional_query("search", query.search.as_deref())
            .optional_query("categoryId", query.category_id);
        self.client.send_json(request).await
    }

    pub async fn get(&self, id: i64) -> ApiResult<Recipe> {
        self.client
            .send_json(ApiRequest::get(format!("{RECIPE_PATH}/{id}")))
            .await
    }

    /// Sent as `multipart/form-data` so the image can ride along.
    ///
    /// Returns `None` when the service answers 2xx with no body.
    pub async fn create(&self, input: &RecipeInput) -> ApiResult<Option<Recipe>> {
        let request = ApiRequest::post(RECIPE_PATH).multipart(recipe_form(input));
        self.client.send_json(request).await
    }

    pub async fn update(&self, id: i64, input: &RecipeInput) -> ApiResult<Option<Recipe>> {
        let request = ApiRequest::put(format!("{RECIPE_PATH}/{id}")).multipart(recipe_form(input));
        self.client.send_json(request).await
    }

    pub async fn delete(&self, id: i64) -> ApiResult<()> {
        self.client
            .send_empty(ApiRequest::delete(format!("{RECIPE_PATH}/{id}")))
            .await
    }
}

/// Wire shape of the recipe form. Lists are repeated fields, the image is
/// an `image` file part.
pub(crate) fn recipe_form(input: &RecipeInput) -> MultipartBody {
    let mut form = MultipartBody::new()
        .text("name", &input.name)
        .optional_text("description", input.description.as_deref())
        .optional_text("instructions", input.instructions.as_deref())
        .optional_text("prepTimeMinutes", input.prep_time_minutes)
        .optional_text("categoryId", input.category_id);

    for ingredient in &input.ingredients {
        form = form.text("ingredients", ingredient);
    }
    for tag_id in &input.tag_ids {
        form = form.text("tagIds", tag_id);
    }
    if let Some(image) = &input.image {
        form = form.file("image", image.clone());
    }
    form
}
