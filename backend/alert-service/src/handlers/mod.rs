/// HTTP handlers for the alert service API
pub mod alerts;
pub mod connection;
pub mod settings;

use serde::{Deserialize, Serialize};

pub use alerts::register_routes as register_alerts;
pub use connection::register_routes as register_connection;
pub use settings::register_routes as register_settings;

/// Envelope for every JSON response
///
/// Failures use the same shape through `AppError`'s `ResponseError` impl.
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<String>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }
}

/// Count returned by bulk operations
#[derive(Debug, Serialize, Deserialize)]
pub struct CountResponse {
    pub count: usize,
}
