use crate::client::{RequestClient, RequestDescriptor};
use crate::error::ApiResult;

use super::models::{AuthRequest, LoginResponse, RefreshRequest};

#[derive(Clone)]
pub struct AuthApi {
    client: RequestClient,
}

impl AuthApi {
    pub fn new(client: RequestClient) -> Self { Self { client } }

    /// Single attempt over the regular client; no alternate transport.
    pub async fn login(&self, email: &str, password: &str) -> ApiResult<LoginResponse> {
        let req = AuthRequest { email: email.to_string(), password: password.to_string(), name: None };
        self.client.post("/auth/login", &req).await
    }

    pub async fn register(&self, name: &str, email: &str, password: &str) -> ApiResult<()> {
        let req = AuthRequest { email: email.to_string(), password: password.to_string(), name: Some(name.to_string()) };
        self.client.send_unit(RequestDescriptor::post("/auth/register").json(&req)?).await
    }

    pub async fn logout(&self, refresh_token: &str) -> ApiResult<()> {
        let req = RefreshRequest { refresh_token: refresh_token.to_string() };
        self.client.send_unit(RequestDescriptor::post("/auth/logout").json(&req)?).await
    }

    pub async fn refresh(&self, refresh_token: &str) -> ApiResult<LoginResponse> {
        let req = RefreshRequest { refresh_token: refresh_token.to_string() };
        self.client.post("/auth/refresh", &req).await
    }
}
