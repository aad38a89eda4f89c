use crate::client::ApiClient;
use crate::error::ApiResult;
use crate::logging::log_info;
use crate::request::ApiRequest;
use crate::types::{
    AuthResponse, ForgotPasswordRequest, LoginRequest, RegisterRequest, ResetPasswordRequest,
    User, UserInput, VerifyAccountRequest,
};

use std::sync::Arc;

const USERS_PATH: &str = "/Users";

/// `/Users` endpoints: account flows plus user administration.
#[derive(Debug, Clone)]
pub struct UsersApi {
    client: Arc<ApiClient>,
}

impl UsersApi {
    pub fn new(client: Arc<ApiClient>) -> Self {
        Self { client }
    }

    /// Authenticate and store the returned token in the session.
    ///
    /// A rejected login (401) leaves the session empty. No redirect happens
    /// because the caller is on `/login`.
    pub async fn login(&self, email: &str, password: &str) -> ApiResult<AuthResponse> {
        let request = ApiRequest::post(format!("{USERS_PATH}/login")).json(&LoginRequest {
            email: email.to_string(),
            password: password.to_string(),
        })?;
        let auth: AuthResponse = self.client.send_json(request).await?;

        self.client.session().sign_in(&auth.token, auth.user.clone());
        log_info!(
            user_id = auth.user.as_ref().map(|u| u.id),
            "User signed in"
        );
        Ok(auth)
    }

    /// Local only: the service keeps no server-side session.
    pub fn logout(&self) {
        self.client.session().sign_out();
        log_info!("User signed out");
    }

    pub async fn register(&self, input: &RegisterRequest) -> ApiResult<()> {
        let request = ApiRequest::post(format!("{USERS_PATH}/register")).json(input)?;
        self.client.send_empty(request).await
    }

    pub async fn forgot_password(&self, email: &str) -> ApiResult<()> {
        let request =
            ApiRequest::post(format!("{USERS_PATH}/forgot-password")).json(&ForgotPasswordRequest {
                email: email.to_string(),
            })?;
        self.client.send_empty(request).await
    }

    pub async fn reset_password(&self, input: &ResetPasswordRequest) -> ApiResult<()> {
        let request = ApiRequest::post(format!("{USERS_PATH}/reset-password")).json(input)?;
        self.client.send_empty(request).await
    }

    pub async fn verify_account(&self, input: &VerifyAccountRequest) -> ApiResult<()> {
        let request = ApiRequest::post(format!("{USERS_PATH}/verify-account")).json(input)?;
        self.client.send_empty(request).await
    }

    /// The signed-in user's profile; refreshes the in-memory auth state.
    pub async fn current_user(&self) -> ApiResult<User> {
        let user: User = self
            .client
            .send_json(ApiRequest::get(format!("{USERS_PATH}/me")))
            .await?;
        self.client.session().set_current_user(Some(user.clone()));
        Ok(user)
    }

    pub async fn list(&self) -> ApiResult<Vec<User>> {
        self.client.send_json(ApiRequest::get(USERS_PATH)).await
    }

    pub async fn get(&self, id: i64) -> ApiResult<User> {
        self.client
            .send_json(ApiRequest::get(format!("{USERS_PATH}/{id}")))
            .await
    }

    pub async fn create(&self, input: &UserInput) -> ApiResult<Option<User>> {
        let request = ApiRequest::post(USERS_PATH).json(input)?;
        self.client.send_json(request).await
    }

    pub async fn update(&self, id: i64, input: &UserInput) -> ApiResult<Option<User>> {
        let request = ApiRequest::put(format!("{USERS_PATH}/{id}")).json(input)?;
        self.client.send_json(request).await
    }

    pub async fn delete(&self, id: i64) -> ApiResult<()> {
        self.client
            .send_empty(ApiRequest::delete(format!("{USERS_PATH}/{id}")))
            .await
    }
}
