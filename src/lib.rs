//! # Tiku Query
//!
//! 智能题库查询服务核心：优先查本地题库，未命中时调用可互换的 AI 后端，
//! 校验答案后写回题库供下次复用。
//!
//! ## 架构设计
//!
//! 调用链自上而下：
//!
//! ```text
//! services::QueryService   (解析流水线：查缓存 → 选提供商 → 校验 → 写回)
//!     ↓
//! providers::ProviderRegistry  (标识 → 实例，启用规则 + 进程级缓存)
//!     ↓
//! providers::{Alibaba, DeepSeek, OpenAi, Google}  (各后端的协议适配)
//!     ↓
//! clients::RetryingRequester   (有界重试，固定间隔)
//!     ↓
//! clients::HttpClient          (单次带超时的请求)
//! ```
//!
//! 响应沿原路返回，途经 `answer::extract`（宽容的 JSON 答案提取）和
//! `answer::validate`（关键词有效性判断）。
//!
//! ## 错误边界
//!
//! - 提供商的 `query` 永不对调用方返回错误，失败降级为描述性字符串
//! - `QueryService::query_answer` 永不 panic 穿透，异常转为 system 结果

pub mod answer;
pub mod clients;
pub mod config;
pub mod error;
pub mod logger;
pub mod models;
pub mod providers;
pub mod services;
pub mod store;
pub mod utils;

// 重新导出常用类型
pub use config::{Config, ProviderConfig};
pub use error::ApiError;
pub use models::{AnswerSource, BankRecord, QueryData, QueryRequest};
pub use providers::{AiProvider, ProviderRegistry};
pub use services::QueryService;
pub use store::{JsonFileStore, MemoryStore, QuestionStore};
