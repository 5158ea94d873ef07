//! Typed backend callers. Each one maps parameters to a fixed path and method and
//! otherwise defers to `RequestClient`; errors propagate unchanged.

pub mod models;
mod auth;
mod fields;
mod bookings;
mod payments;

pub use auth::AuthApi;
pub use fields::{FieldFilters, FieldsApi};
pub use bookings::BookingsApi;
pub use payments::PaymentsApi;

use crate::client::RequestClient;

/// All domain callers over one shared client.
#[derive(Clone)]
pub struct Api {
    pub auth: AuthApi,
    pub fields: FieldsApi,
    pub bookings: BookingsApi,
    pub payments: PaymentsApi,
}

impl Api {
    pub fn new(client: RequestClient) -> Self {
        Self {
            auth: AuthApi::new(client.clone()),
            fields: FieldsApi::new(client.clone()),
            bookings: BookingsApi::new(client.clone()),
            payments: PaymentsApi::new(client),
        }
    }
}

/// Percent-encode one path segment (an id interpolated into a route).
pub(crate) fn segment(id: &str) -> String {
    urlencoding::encode(id).into_owned()
}
