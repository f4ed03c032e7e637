pub mod query_service;

pub use query_service::{ProvidersStatus, QueryService, RecentQuestion, Statistics};
