/// 带重试的请求器
///
/// 在 `HttpClient` 之上做有界重试：
/// - 触发重试：5xx 状态码、请求超时、传输层异常
/// - 不重试：其他错误状态码（4xx 等），立即返回 `BadStatus`
/// - 重试间隔为固定值（不做指数退避）
use crate::clients::http_client::HttpClient;
use crate::config::ProviderConfig;
use crate::error::ApiError;
use anyhow::Result;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, warn};

/// 带重试的请求器
pub struct RetryingRequester {
    http: HttpClient,
    max_retries: u32,
    retry_delay: Duration,
}

impl RetryingRequester {
    /// 创建请求器
    pub fn new(timeout: Duration, max_retries: u32, retry_delay: Duration) -> Result<Self> {
        Ok(Self {
            http: HttpClient::new(timeout)?,
            max_retries,
            retry_delay,
        })
    }

    /// 根据提供商配置创建请求器
    pub fn from_config(config: &ProviderConfig) -> Result<Self> {
        Self::new(config.timeout(), config.max_retries, config.retry_delay())
    }

    /// 发送 POST 请求，最多尝试 `max_retries` 次
    ///
    /// 成功返回响应体文本；耗尽重试后返回区分超时/传输异常/重试耗尽的终态错误。
    pub async fn send(
        &self,
        url: &str,
        headers: &[(String, String)],
        body: &Value,
    ) -> std::result::Result<String, ApiError> {
        for attempt in 1..=self.max_retries {
            debug!("尝试 {}/{}: {}", attempt, self.max_retries, url);

            match self.http.post_json(url, headers, body).await {
                Ok(reply) if reply.status >= 500 => {
                    warn!("服务器错误 (状态码: {})", reply.status);
                    if attempt < self.max_retries {
                        self.pause().await;
                    }
                }
                Ok(reply) if !(200..300).contains(&reply.status) => {
                    // 客户端错误不重试
                    return Err(ApiError::BadStatus {
                        code: reply.status,
                        message: reply.body,
                    });
                }
                Ok(reply) => {
                    debug!("请求成功 (状态码: {})", reply.status);
                    return Ok(reply.body);
                }
                Err(e) if e.is_timeout() => {
                    warn!("请求超时");
                    if attempt < self.max_retries {
                        self.pause().await;
                    } else {
                        return Err(ApiError::Timeout {
                            attempts: self.max_retries,
                        });
                    }
                }
                Err(e) => {
                    warn!("请求异常: {}", e);
                    if attempt < self.max_retries {
                        self.pause().await;
                    } else {
                        return Err(ApiError::request_failed(e));
                    }
                }
            }
        }

        Err(ApiError::RetriesExhausted {
            attempts: self.max_retries,
        })
    }

    async fn pause(&self) {
        debug!("将在 {:?} 后重试", self.retry_delay);
        tokio::time::sleep(self.retry_delay).await;
    }
}
