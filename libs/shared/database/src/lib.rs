pub mod jendo_api;

pub use jendo_api::{is_not_found, ApiClientError, JendoApiClient};
