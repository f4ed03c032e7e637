//! 流水线集成测试
//!
//! 用 wiremock 模拟 AI 后端，覆盖缓存往返、重试、失败降级和系统边界。

use serde_json::json;
use std::sync::Arc;
use tiku_query::clients::RetryingRequester;
use tiku_query::error::ApiError;
use tiku_query::models::{AnswerSource, BankRecord};
use tiku_query::providers::ProviderRegistry;
use tiku_query::services::QueryService;
use tiku_query::store::{MemoryStore, QuestionStore, StoreError};
use tiku_query::{Config, QueryRequest};
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// 指向 mock 服务器的 deepseek 单提供商配置
fn test_config(base_url: &str) -> Config {
    let mut config = Config::default();
    config.default_provider = "deepseek".to_string();
    let provider = config.providers.get_mut("deepseek").unwrap();
    provider.api_key = "sk-test".to_string();
    provider.base_url = base_url.to_string();
    provider.max_retries = 3;
    provider.retry_delay_secs = 0;
    provider.timeout_secs = 5;
    config
}

fn chat_reply(content: &str) -> serde_json::Value {
    json!({
        "choices": [
            {"message": {"role": "assistant", "content": content}}
        ]
    })
}

fn service_for(config: Config, store: Arc<dyn QuestionStore>) -> QueryService {
    let registry = Arc::new(ProviderRegistry::new(Arc::new(config)));
    QueryService::new(store, registry)
}

#[tokio::test]
async fn cache_round_trip() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(header("Authorization", "Bearer sk-test"))
        .respond_with(ResponseTemplate::new(200).set_body_json(chat_reply(r#"{"answer":"北京"}"#)))
        .expect(1)
        .mount(&server)
        .await;

    let service = service_for(test_config(&server.uri()), Arc::new(MemoryStore::new()));
    let request = QueryRequest::new("中国的首都是哪里？", "A. 北京 B. 上海", "选择题").unwrap();

    // 第一次：题库未命中，走 AI
    let first = service.query_answer(&request).await;
    assert_eq!(first.code, 1);
    assert_eq!(first.source, AnswerSource::Ai);
    assert_eq!(first.data.as_deref(), Some("北京"));

    // 第二次：命中题库，不再请求后端（expect(1) 保证）
    let second = service.query_answer(&request).await;
    assert_eq!(second.code, 1);
    assert_eq!(second.source, AnswerSource::Public);
    assert_eq!(second.data.as_deref(), Some("北京"));
}

#[tokio::test]
async fn retry_recovers_after_server_errors() {
    let server = MockServer::start().await;
    // 前两次 500，第三次成功
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(500))
        .up_to_n_times(2)
        .expect(2)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(chat_reply(r#"{"answer":"对"}"#)))
        .expect(1)
        .mount(&server)
        .await;

    let service = service_for(test_config(&server.uri()), Arc::new(MemoryStore::new()));
    let request = QueryRequest::new("1+1=2", "", "judgement").unwrap();

    let result = service.query_answer(&request).await;
    assert_eq!(result.code, 1);
    assert_eq!(result.data.as_deref(), Some("对"));
}

#[tokio::test]
async fn retries_exhausted_yields_not_found() {
    let server = MockServer::start().await;
    // 一直 500，恰好尝试 max_retries 次
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(500))
        .expect(3)
        .mount(&server)
        .await;

    let store = Arc::new(MemoryStore::new());
    let service = service_for(test_config(&server.uri()), store.clone());
    let request = QueryRequest::new("必然失败的问题", "", "").unwrap();

    let result = service.query_answer(&request).await;
    assert_eq!(result.code, 0);
    assert_eq!(result.source, AnswerSource::Ai);
    assert_eq!(result.msg, "未找到答案");
    assert!(result.data.is_none());
    // 失败不落库
    assert_eq!(store.count(), 0);
}

#[tokio::test]
async fn requester_returns_payload_after_transient_failures() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(2)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_string("payload"))
        .mount(&server)
        .await;

    let requester =
        RetryingRequester::new(std::time::Duration::from_secs(5), 3, std::time::Duration::ZERO)
            .unwrap();
    let body = requester
        .send(&server.uri(), &[], &json!({}))
        .await
        .unwrap();
    assert_eq!(body, "payload");
}

#[tokio::test]
async fn requester_exhaustion_performs_exact_attempt_count() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500))
        .expect(3)
        .mount(&server)
        .await;

    let requester =
        RetryingRequester::new(std::time::Duration::from_secs(5), 3, std::time::Duration::ZERO)
            .unwrap();
    let result = requester.send(&server.uri(), &[], &json!({})).await;
    assert!(matches!(
        result,
        Err(ApiError::RetriesExhausted { attempts: 3 })
    ));
}

#[tokio::test]
async fn client_error_is_not_retried() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(401).set_body_string("unauthorized"))
        .expect(1)
        .mount(&server)
        .await;

    let requester =
        RetryingRequester::new(std::time::Duration::from_secs(5), 3, std::time::Duration::ZERO)
            .unwrap();
    let result = requester.send(&server.uri(), &[], &json!({})).await;
    match result {
        Err(ApiError::BadStatus { code, message }) => {
            assert_eq!(code, 401);
            assert_eq!(message, "unauthorized");
        }
        other => panic!("应返回 BadStatus，实际: {:?}", other),
    }
}

#[tokio::test]
async fn timeout_is_retried_then_reported() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(
            ResponseTemplate::new(200).set_delay(std::time::Duration::from_secs(10)),
        )
        .expect(2)
        .mount(&server)
        .await;

    let requester = RetryingRequester::new(
        std::time::Duration::from_millis(200),
        2,
        std::time::Duration::ZERO,
    )
    .unwrap();
    let result = requester.send(&server.uri(), &[], &json!({})).await;
    assert!(matches!(result, Err(ApiError::Timeout { attempts: 2 })));
}

#[tokio::test]
async fn invalid_answer_is_discarded() {
    let server = MockServer::start().await;
    // 模型回复本身是失败说明，校验层应拒绝
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(chat_reply(r#"{"answer":"抱歉，发生错误，无法回答"}"#)),
        )
        .mount(&server)
        .await;

    let store = Arc::new(MemoryStore::new());
    let service = service_for(test_config(&server.uri()), store.clone());
    let request = QueryRequest::new("问题", "", "").unwrap();

    let result = service.query_answer(&request).await;
    assert_eq!(result.code, 0);
    assert_eq!(result.source, AnswerSource::Ai);
    assert_eq!(store.count(), 0);
}

#[tokio::test]
async fn no_available_provider_yields_not_found() {
    // 默认配置所有提供商均无密钥
    let service = service_for(Config::default(), Arc::new(MemoryStore::new()));
    let request = QueryRequest::new("问题", "", "").unwrap();

    let result = service.query_answer(&request).await;
    assert_eq!(result.code, 0);
    assert_eq!(result.source, AnswerSource::Ai);
    assert_eq!(result.msg, "未找到答案");
}

/// 查找时 panic 的存储，用于验证系统边界
struct PanicStore;

impl QuestionStore for PanicStore {
    fn find(&self, _title: &str) -> Option<BankRecord> {
        panic!("存储后端崩溃")
    }

    fn upsert(
        &self,
        _title: &str,
        _answer: &str,
        _options: &str,
        _question_type: &str,
    ) -> Result<BankRecord, StoreError> {
        panic!("存储后端崩溃")
    }

    fn count(&self) -> usize {
        0
    }

    fn list_recent(&self, _limit: usize) -> Vec<BankRecord> {
        Vec::new()
    }
}

#[tokio::test]
async fn internal_panic_becomes_system_result() {
    let service = service_for(Config::default(), Arc::new(PanicStore));
    let request = QueryRequest::new("问题", "", "").unwrap();

    let result = service.query_answer(&request).await;
    assert_eq!(result.code, 0);
    assert_eq!(result.source, AnswerSource::System);
    assert!(result.msg.contains("查询失败"));
}

#[tokio::test]
async fn providers_status_reflects_config() {
    let server = MockServer::start().await;
    let service = service_for(test_config(&server.uri()), Arc::new(MemoryStore::new()));

    let status = service.providers_status();
    assert_eq!(status.default_provider, "deepseek");
    assert_eq!(status.total_count, 4);
    assert_eq!(status.available_count, 1);
    assert!(status.providers["deepseek"].is_available);
    assert!(!status.providers["openai"].has_api_key);
}

#[tokio::test]
async fn statistics_counts_records() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(chat_reply(r#"{"answer":"北京"}"#)))
        .mount(&server)
        .await;

    let store = Arc::new(MemoryStore::new());
    let service = service_for(test_config(&server.uri()), store);
    let request = QueryRequest::new("中国的首都是哪里？", "", "").unwrap();
    service.query_answer(&request).await;

    let stats = service.statistics();
    assert_eq!(stats.total_questions, 1);
    assert_eq!(stats.available_ai_providers, 1);
    assert_eq!(stats.recent_questions.len(), 1);
    assert_eq!(stats.recent_questions[0].answer, "北京");
}
