//! One-stop assembly of the data-access layer.
//!
//! [`RecipeService`] wires a session, navigator, query cache and notifier
//! into one [`ApiClient`], the resource clients on top of it and the
//! optimistic [`Mutations`]. Hosts usually build exactly one.

use crate::cache::{QueryCache, QueryCacheExt, QueryKey};
use crate::client::ApiClient;
use crate::config::{ClientConfig, ConfigError};
use crate::error::ApiResult;
use crate::logging::{log_debug, log_info};
use crate::mutation::MutationCoordinator;
use crate::mutations::Mutations;
use crate::navigation::Navigator;
use crate::notify::Notifier;
use crate::resources::{CategoriesApi, FavoritesApi, RecipesApi, TagsApi, UsersApi};
use crate::session::Session;
use crate::types::{Category, Favorite, Recipe, RecipeQuery, Tag, User};

use std::sync::Arc;

#[derive(Clone)]
pub struct RecipeService {
    client: Arc<ApiClient>,
    cache: Arc<dyn QueryCache>,
    recipes: RecipesApi,
    categories: CategoriesApi,
    users: UsersApi,
    favorites: FavoritesApi,
    tags: TagsApi,
    mutations: Mutations,
}

impl RecipeService {
    /// # Errors
    ///
    /// Returns [`ConfigError`] when `config` does not validate or the HTTP
    /// client cannot be built.
    pub fn new(
        config: ClientConfig,
        session: Arc<Session>,
        navigator: Arc<dyn Navigator>,
        cache: Arc<dyn QueryCache>,
        notifier: Arc<dyn Notifier>,
    ) -> Result<Self, ConfigError> {
        let client = Arc::new(ApiClient::new(config, session, navigator)?);
        Ok(Self::from_client(client, cache, notifier))
    }

    /// Build on an already configured client.
    pub fn from_client(
        client: Arc<ApiClient>,
        cache: Arc<dyn QueryCache>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        let recipes = RecipesApi::new(client.clone());
        let categories = CategoriesApi::new(client.clone());
        let users = UsersApi::new(client.clone());
        let favorites = FavoritesApi::new(client.clone());
        let tags = TagsApi::new(client.clone());

        let mutations = Mutations::new(
            MutationCoordinator::new(cache.clone(), notifier),
            recipes.clone(),
            categories.clone(),
            users.clone(),
            favorites.clone(),
        );

        log_info!(base_url = %client.base_url(), "Recipe service ready");

        Self {
            client,
            cache,
            recipes,
            categories,
            users,
            favorites,
            tags,
            mutations,
        }
    }

    pub fn client(&self) -> &Arc<ApiClient> {
        &self.client
    }

    pub fn session(&self) -> &Arc<Session> {
        self.client.session()
    }

    pub fn cache(&self) -> &Arc<dyn QueryCache> {
        &self.cache
    }

    pub fn recipes(&self) -> &RecipesApi {
        &self.recipes
    }

    pub fn categories(&self) -> &CategoriesApi {
        &self.categories
    }

    pub fn users(&self) -> &UsersApi {
        &self.users
    }

    pub fn favorites(&self) -> &FavoritesApi {
        &self.favorites
    }

    pub fn tags(&self) -> &TagsApi {
        &self.tags
    }

    pub fn mutations(&self) -> &Mutations {
        &self.mutations
    }

    // ------------------------------------------------------------------
    // Cache loaders: fetch a collection and store it under its key
    // ------------------------------------------------------------------

    pub async fn load_favorites(&self) -> ApiResult<Vec<Favorite>> {
        let favorites = self.favorites.list().await?;
        self.store(&QueryKey::favorites(), &favorites)?;
        Ok(favorites)
    }

    pub async fn load_recipes(&self, query: &RecipeQuery) -> ApiResult<Vec<Recipe>> {
        let recipes = self.recipes.list(query).await?;
        self.store(&QueryKey::recipes(), &recipes)?;
        Ok(recipes)
    }

    pub async fn load_categories(&self) -> ApiResult<Vec<Category>> {
        let categories = self.categories.list().await?;
        self.store(&QueryKey::categories(), &categories)?;
        Ok(categories)
    }

    pub async fn load_users(&self) -> ApiResult<Vec<User>> {
        let users = self.users.list().await?;
        self.store(&QueryKey::users(), &users)?;
        Ok(users)
    }

    pub async fn load_tags(&self) -> ApiResult<Vec<Tag>> {
        let tags = self.tags.list().await?;
        self.store(&QueryKey::tags(), &tags)?;
        Ok(tags)
    }

    fn store<T: serde::Serialize>(&self, key: &QueryKey, value: &[T]) -> ApiResult<()> {
        self.cache.write_as(key, value)?;
        log_debug!(key = %key, entries = value.len(), "Cache loaded");
        Ok(())
    }
}
