use chrono::{DateTime, Utc};

use crate::client::RequestClient;
use crate::error::ApiResult;

use super::models::{Booking, CreateBookingRequest};
use super::segment;

#[derive(Clone)]
pub struct BookingsApi {
    client: RequestClient,
}

impl BookingsApi {
    pub fn new(client: RequestClient) -> Self { Self { client } }

    /// Every booking; admin scope on the backend.
    pub async fn list_all(&self) -> ApiResult<Vec<Booking>> {
        self.client.get("/bookings").await
    }

    pub async fn list_mine(&self) -> ApiResult<Vec<Booking>> {
        self.client.get("/bookings/me").await
    }

    pub async fn create(&self, field_id: &str, start_time: DateTime<Utc>, end_time: DateTime<Utc>) -> ApiResult<Booking> {
        let req = CreateBookingRequest { field_id: field_id.to_string(), start_time, end_time };
        self.client.post("/bookings", &req).await
    }

    pub async fn cancel(&self, id: &str) -> ApiResult<()> {
        self.client.delete(&format!("/bookings/{}", segment(id))).await
    }
}
