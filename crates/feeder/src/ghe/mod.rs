//! GitHub Enterprise Server destination.
//!
//! - [`client`] - `GheClient`, the octocrab-backed `DestinationApi`
//! - [`error`] - mapping of octocrab errors to `ApiError`
//!
//! ```ignore
//! use feeder::ghe::GheClient;
//!
//! let api = GheClient::new("https://ghe.example.com/api/v3", &token)?;
//! ```

mod client;
mod error;

pub use client::GheClient;
pub use error::{is_rate_limit_error, to_api_error};

/// Remote URL for pushing to `full_name` on `host` with the token embedded.
pub fn authenticated_remote_url(host: &str, token: &str, full_name: &str) -> String {
    format!("https://{token}@{host}/{full_name}.git")
}
