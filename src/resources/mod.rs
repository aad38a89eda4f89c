//! Resource clients: one thin adapter per service resource.
//!
//! Each function maps a domain operation onto exactly one
//! [`ApiClient`](crate::ApiClient) call under a fixed path template. No
//! retry or classification happens here; failures pass through unchanged.
//!
//! | Module | Path template |
//! |--------|---------------|
//! | [`recipes`] | `/Recipe`, `/Recipe/{id}` |
//! | [`categories`] | `/Category`, `/Category/{id}` |
//! | [`users`] | `/Users`, `/Users/{id}`, `/Users/login`, ... |
//! | [`favorites`] | `/userRecipe`, `/userRecipe/{recipeId}` |
//! | [`tags`] | `/tag` |

pub mod categories;
pub mod favorites;
pub mod recipes;
pub mod tags;
pub mod users;

pub use categories::CategoriesApi;
pub use favorites::FavoritesApi;
pub use recipes::RecipesApi;
pub use tags::TagsApi;
pub use users::UsersApi;
