use crate::client::RequestClient;
use crate::error::ApiResult;

use super::models::{CheckoutRequest, CheckoutSession};

#[derive(Clone)]
pub struct PaymentsApi {
    client: RequestClient,
}

impl PaymentsApi {
    pub fn new(client: RequestClient) -> Self { Self { client } }

    /// The trailing slash is part of the backend route.
    pub async fn create_checkout_session(&self, booking_id: &str) -> ApiResult<CheckoutSession> {
        let req = CheckoutRequest { booking_id: booking_id.to_string() };
        self.client.post("/payments/create-checkout-session/", &req).await
    }
}
