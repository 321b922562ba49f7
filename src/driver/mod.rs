pub mod http;
pub mod traits;

pub use http::ApiHelper;
pub use traits::{ApiResponse, HttpClient, HttpError};
