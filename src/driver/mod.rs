pub mod http;
pub mod traits;

pub use http::HttpDriver;
pub use traits::{ApiDriver, ApiRequest, ApiResponse, HttpMethod, RequestError};
