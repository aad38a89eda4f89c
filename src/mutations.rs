//! The optimistic mutations the screens trigger.
//!
//! Each operation pairs a [`ListEdit`] on a cached collection with one
//! resource call, packaged as a [`CollectionMutation`] and run through the
//! [`MutationCoordinator`].

use crate::cache::QueryKey;
use crate::error::ApiResult;
use crate::mutation::{MutationCoordinator, OptimisticMutation};
use crate::resources::{CategoriesApi, FavoritesApi, RecipesApi, UsersApi};
use crate::types::{Category, CategoryInput, Recipe, RecipeInput, User, UserInput};

use async_trait::async_trait;
use chrono::Utc;
use futures_util::future::{BoxFuture, FutureExt};
use serde_json::{json, Map, Value};
use std::sync::atomic::{AtomicI64, Ordering};

static NEXT_PLACEHOLDER_ID: AtomicI64 = AtomicI64::new(-1);

/// A process-unique negative id for entries the service has not assigned yet.
pub fn placeholder_id() -> i64 {
    NEXT_PLACEHOLDER_ID.fetch_sub(1, Ordering::Relaxed)
}

/// A speculative change to a cached list.
///
/// Applies to a bare JSON array or to an object holding one under `items`.
/// Anything else, including an empty cache, is left alone.
#[derive(Debug, Clone, PartialEq)]
pub enum ListEdit {
    Append(Value),
    /// Drop entries whose `field` equals `id`.
    Remove { field: &'static str, id: Value },
    /// Merge `patch` into entries whose `field` equals `id`.
    Patch {
        field: &'static str,
        id: Value,
        patch: Map<String, Value>,
    },
}

impl ListEdit {
    pub fn apply(&self, current: Option<&Value>) -> Option<Value> {
        let mut next = current?.clone();
        let items = match &mut next {
            Value::Array(items) => items,
            Value::Object(map) => map.get_mut("items")?.as_array_mut()?,
            _ => return None,
        };

        match self {
            Self::Append(entry) => items.push(entry.clone()),
            Self::Remove { field, id } => items.retain(|item| item.get(*field) != Some(id)),
            Self::Patch { field, id, patch } => {
                for item in items.iter_mut().filter(|item| item.get(*field) == Some(id)) {
                    if let Value::Object(entry) = item {
                        for (key, value) in patch {
                            entry.insert(key.clone(), value.clone());
                        }
                    }
                }
            }
        }

        Some(next)
    }
}

/// A [`ListEdit`] on one cache key plus the deferred remote call.
///
/// `request` is not polled until dispatch, so the speculative write always
/// lands before the network call starts.
pub struct CollectionMutation<'a, T> {
    label: &'static str,
    target: QueryKey,
    invalidates: Vec<QueryKey>,
    edit: ListEdit,
    success_message: Option<String>,
    request: BoxFuture<'a, ApiResult<T>>,
}

impl<'a, T> CollectionMutation<'a, T> {
    pub fn new(
        label: &'static str,
        target: QueryKey,
        edit: ListEdit,
        request: BoxFuture<'a, ApiResult<T>>,
    ) -> Self {
        Self {
            label,
            invalidates: vec![target.clone()],
            target,
            edit,
            success_message: None,
            request,
        }
    }

    /// Also invalidate `pattern` on settlement.
    pub fn also_invalidate(mut self, pattern: QueryKey) -> Self {
        self.invalidates.push(pattern);
        self
    }

    pub fn on_success(mut self, message: impl Into<String>) -> Self {
        self.success_message = Some(message.into());
        self
    }
}

#[async_trait]
impl<'a, T: Send + 'a> OptimisticMutation for CollectionMutation<'a, T> {
    type Output = T;

    fn label(&self) -> &str {
        self.label
    }

    fn target(&self) -> QueryKey {
        self.target.clone()
    }

    fn invalidates(&self) -> Vec<QueryKey> {
        self.invalidates.clone()
    }

    fn speculate(&self, current: Option<&Value>) -> Option<Value> {
        self.edit.apply(current)
    }

    fn success_message(&self) -> Option<String> {
        self.success_message.clone()
    }

    async fn dispatch(self) -> ApiResult<T> {
        self.request.await
    }
}

fn patch_of(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        _ => Map::new(),
    }
}

fn recipe_preview(input: &RecipeInput) -> Value {
    json!({
        "name": input.name,
        "description": input.description,
        "ingredients": input.ingredients,
        "instructions": input.instructions,
        "prepTimeMinutes": input.prep_time_minutes,
        "categoryId": input.category_id,
    })
}

fn user_preview(input: &UserInput) -> Value {
    json!({
        "email": input.email,
        "firstName": input.first_name,
        "lastName": input.last_name,
        "role": input.role,
    })
}

fn with_placeholder(mut preview: Value) -> Value {
    if let Value::Object(entry) = &mut preview {
        entry.insert("id".to_string(), json!(placeholder_id()));
        entry.insert("pending".to_string(), json!(true));
    }
    preview
}

/// Optimistic create/update/delete and favorite operations.
///
/// Creates and updates yield `None` when the service accepts the change
/// without echoing the entity; the invalidation re-fetch fills it in.
#[derive(Clone)]
pub struct Mutations {
    coordinator: MutationCoordinator,
    recipes: RecipesApi,
    categories: CategoriesApi,
    users: UsersApi,
    favorites: FavoritesApi,
}

impl Mutations {
    pub fn new(
        coordinator: MutationCoordinator,
        recipes: RecipesApi,
        categories: CategoriesApi,
        users: UsersApi,
        favorites: FavoritesApi,
    ) -> Self {
        Self {
            coordinator,
            recipes,
            categories,
            users,
            favorites,
        }
    }

    // ------------------------------------------------------------------
    // Favorites
    // ------------------------------------------------------------------

    pub async fn add_favorite(&self, recipe_id: i64) -> ApiResult<()> {
        let api = self.favorites.clone();
        let placeholder = json!({
            "recipeId": recipe_id,
            "addedAt": Utc::now(),
            "pending": true,
        });
        let mutation = CollectionMutation::new(
            "add_favorite",
            QueryKey::favorites(),
            ListEdit::Append(placeholder),
            async move { api.add(recipe_id).await }.boxed(),
        )
        .also_invalidate(QueryKey::recipes())
        .on_success("Recipe added to favorites");
        self.coordinator.run(mutation).await
    }

    pub async fn remove_favorite(&self, recipe_id: i64) -> ApiResult<()> {
        let api = self.favorites.clone();
        let mutation = CollectionMutation::new(
            "remove_favorite",
            QueryKey::favorites(),
            ListEdit::Remove {
                field: "recipeId",
                id: json!(recipe_id),
            },
            async move { api.remove(recipe_id).await }.boxed(),
        )
        .also_invalidate(QueryKey::recipes())
        .on_success("Recipe removed from favorites");
        self.coordinator.run(mutation).await
    }

    // ------------------------------------------------------------------
    // Recipes
    // ------------------------------------------------------------------

    pub async fn create_recipe(&self, input: RecipeInput) -> ApiResult<Option<Recipe>> {
        let api = self.recipes.clone();
        let placeholder = with_placeholder(recipe_preview(&input));
        let mutation = CollectionMutation::new(
            "create_recipe",
            QueryKey::recipes(),
            ListEdit::Append(placeholder),
            async move { api.create(&input).await }.boxed(),
        )
        .on_success("Recipe created successfully");
        self.coordinator.run(mutation).await
    }

    pub async fn update_recipe(&self, id: i64, input: RecipeInput) -> ApiResult<Option<Recipe>> {
        let api = self.recipes.clone();
        let patch = patch_of(recipe_preview(&input));
        let mutation = CollectionMutation::new(
            "update_recipe",
            QueryKey::recipes(),
            ListEdit::Patch {
                field: "id",
                id: json!(id),
                patch,
            },
            async move { api.update(id, &input).await }.boxed(),
        )
        .also_invalidate(QueryKey::favorites())
        .on_success("Recipe updated successfully");
        self.coordinator.run(mutation).await
    }

    pub async fn delete_recipe(&self, id: i64) -> ApiResult<()> {
        let api = self.recipes.clone();
        let mutation = CollectionMutation::new(
            "delete_recipe",
            QueryKey::recipes(),
            ListEdit::Remove {
                field: "id",
                id: json!(id),
            },
            async move { api.delete(id).await }.boxed(),
        )
        .also_invalidate(QueryKey::favorites())
        .on_success("Recipe deleted successfully");
        self.coordinator.run(mutation).await
    }

    // ------------------------------------------------------------------
    // Categories
    // ------------------------------------------------------------------

    pub async fn create_category(&self, input: CategoryInput) -> ApiResult<Option<Category>> {
        let api = self.categories.clone();
        let placeholder = with_placeholder(json!({
            "name": input.name,
            "description": input.description,
        }));
        let mutation = CollectionMutation::new(
            "create_category",
            QueryKey::categories(),
            ListEdit::Append(placeholder),
            async move { api.create(&input).await }.boxed(),
        )
        .on_success("Category created successfully");
        self.coordinator.run(mutation).await
    }

    pub async fn update_category(
        &self,
        id: i64,
        input: CategoryInput,
    ) -> ApiResult<Option<Category>> {
        let api = self.categories.clone();
        let patch = patch_of(json!({
            "name": input.name,
            "description": input.description,
        }));
        let mutation = CollectionMutation::new(
            "update_category",
            QueryKey::categories(),
            ListEdit::Patch {
                field: "id",
                id: json!(id),
                patch,
            },
            async move { api.update(id, &input).await }.boxed(),
        )
        .on_success("Category updated successfully");
        self.coordinator.run(mutation).await
    }

    /// Recipes embed their category, so their lists are invalidated too.
    pub async fn delete_category(&self, id: i64) -> ApiResult<()> {
        let api = self.categories.clone();
        let mutation = CollectionMutation::new(
            "delete_category",
            QueryKey::categories(),
            ListEdit::Remove {
                field: "id",
                id: json!(id),
            },
            async move { api.delete(id).await }.boxed(),
        )
        .also_invalidate(QueryKey::recipes())
        .on_success("Category deleted successfully");
        self.coordinator.run(mutation).await
    }

    // ------------------------------------------------------------------
    // Users
    // ------------------------------------------------------------------

    pub async fn create_user(&self, input: UserInput) -> ApiResult<Option<User>> {
        let api = self.users.clone();
        let placeholder = with_placeholder(user_preview(&input));
        let mutation = CollectionMutation::new(
            "create_user",
            QueryKey::users(),
            ListEdit::Append(placeholder),
            async move { api.create(&input).await }.boxed(),
        )
        .on_success("User created successfully");
        self.coordinator.run(mutation).await
    }

    pub async fn update_user(&self, id: i64, input: UserInput) -> ApiResult<Option<User>> {
        let api = self.users.clone();
        let patch = patch_of(user_preview(&input));
        let mutation = CollectionMutation::new(
            "update_user",
            QueryKey::users(),
            ListEdit::Patch {
                field: "id",
                id: json!(id),
                patch,
            },
            async move { api.update(id, &input).await }.boxed(),
        )
        .on_success("User updated successfully");
        self.coordinator.run(mutation).await
    }

    pub async fn delete_user(&self, id: i64) -> ApiResult<()> {
        let api = self.users.clone();
        let mutation = CollectionMutation::new(
            "delete_user",
            QueryKey::users(),
            ListEdit::Remove {
                field: "id",
                id: json!(id),
            },
            async move { api.delete(id).await }.boxed(),
        )
        .on_success("User deleted successfully");
        self.coordinator.run(mutation).await
    }
}
