pub mod http_client;
pub mod retry;

pub use http_client::{HttpClient, HttpReply};
pub use retry::RetryingRequester;
