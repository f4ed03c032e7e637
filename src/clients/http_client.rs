/// HTTP 客户端
///
/// 只负责发出单次请求并返回状态码与响应体，不做任何重试。
use anyhow::{Context, Result};
use serde_json::Value;
use std::time::Duration;

/// 单次请求的响应
#[derive(Debug)]
pub struct HttpReply {
    /// HTTP 状态码
    pub status: u16,
    /// 响应体文本
    pub body: String,
}

/// HTTP 客户端
pub struct HttpClient {
    client: reqwest::Client,
}

impl HttpClient {
    /// 创建带超时的 HTTP 客户端
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("无法创建HTTP客户端")?;
        Ok(Self { client })
    }

    /// 发送 POST 请求（JSON 请求体）
    pub async fn post_json(
        &self,
        url: &str,
        headers: &[(String, String)],
        body: &Value,
    ) -> std::result::Result<HttpReply, reqwest::Error> {
        let mut request = self.client.post(url).json(body);
        for (key, value) in headers {
            request = request.header(key, value);
        }

        let response = request.send().await?;
        let status = response.status().as_u16();
        let body = response.text().await?;

        Ok(HttpReply { status, body })
    }

    /// 发送 GET 请求
    pub async fn get(
        &self,
        url: &str,
        headers: &[(String, String)],
    ) -> std::result::Result<HttpReply, reqwest::Error> {
        let mut request = self.client.get(url);
        for (key, value) in headers {
            request = request.header(key, value);
        }

        let response = request.send().await?;
        let status = response.status().as_u16();
        let body = response.text().await?;

        Ok(HttpReply { status, body })
    }
}
