//! AI 提供商抽象
//!
//! 每个提供商实现能力集 {endpoint, headers, build_prompt, build_request,
//! parse_response}，其余行为（重试、答案提取、失败降级）由 trait 的默认
//! `query` 实现统一承担。
//!
//! `query` 对调用方永不返回错误：任何内部失败都会降级为包含提供商名称和
//! 失败原因的描述性字符串，由上层的有效性校验识别并拒绝。

pub mod alibaba;
pub mod deepseek;
pub mod google;
pub mod openai;
pub mod registry;

pub use alibaba::AlibabaProvider;
pub use deepseek::DeepSeekProvider;
pub use google::GoogleProvider;
pub use openai::OpenAiProvider;
pub use registry::{ProviderInfo, ProviderRegistry};

use crate::answer::extract_answer;
use crate::clients::RetryingRequester;
use crate::config::ProviderConfig;
use crate::utils::truncate_text;
use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, warn};

/// 响应信封无法解析时的哨兵值（与抛错不同，由校验层识别为无效）
pub const UNPARSEABLE_RESPONSE: &str = "无法从API获取答案";

/// AI 提供商统一契约
#[async_trait]
pub trait AiProvider: Send + Sync {
    /// 提供商显示名称
    fn name(&self) -> &str;

    /// 提供商配置
    fn config(&self) -> &ProviderConfig;

    /// 带重试的请求器
    fn requester(&self) -> &RetryingRequester;

    /// 请求地址
    fn endpoint(&self) -> String;

    /// 请求头（含鉴权）
    fn headers(&self) -> Vec<(String, String)>;

    /// 构建提示词
    fn build_prompt(&self, question: &str, options: &str, question_type: &str) -> String;

    /// 构建提供商原生的请求体
    fn build_request(&self, prompt: &str) -> Value;

    /// 从提供商的响应信封中取出模型的自由文本回复
    ///
    /// 信封结构不符或 JSON 解析失败时返回哨兵字符串，不返回错误。
    fn parse_response(&self, raw: &str) -> String;

    /// 是否启用（启用且配置了 API 密钥）
    fn is_enabled(&self) -> bool {
        self.config().is_enabled()
    }

    /// 查询 AI 模型获取答案
    ///
    /// 完整链路：提示词 → 请求体 → 带重试的发送 → 信封解析 → 答案提取。
    /// 对调用方永不失败，内部错误降级为描述性字符串。
    async fn query(&self, question: &str, options: &str, question_type: &str) -> String {
        let prompt = self.build_prompt(question, options, question_type);
        let body = self.build_request(&prompt);
        let url = self.endpoint();
        let headers = self.headers();

        match self.requester().send(&url, &headers, &body).await {
            Ok(response_text) => {
                let reply = self.parse_response(&response_text);
                extract_answer(&reply)
            }
            Err(e) => {
                warn!("[{}] 查询失败: {}", self.name(), e);
                format!("{} API调用失败: {}", self.name(), e)
            }
        }
    }
}

/// 解析 OpenAI 风格的聊天响应信封（`choices[0].message.content`）
///
/// 三个聊天类提供商共用同一信封结构。
pub(crate) fn parse_chat_envelope(provider_name: &str, raw: &str) -> String {
    let value: Value = match serde_json::from_str(raw) {
        Ok(v) => v,
        Err(e) => {
            warn!("[{}] JSON解析错误: {}", provider_name, e);
            warn!("[{}] 响应内容: {}", provider_name, truncate_text(raw, 200));
            return format!("API响应解析失败: {}", e);
        }
    };

    match value
        .get("choices")
        .and_then(|c| c.get(0))
        .and_then(|c| c.get("message"))
        .and_then(|m| m.get("content"))
        .and_then(|c| c.as_str())
    {
        Some(content) => {
            debug!(
                "[{}] AI返回答案: {}",
                provider_name,
                truncate_text(content, 100)
            );
            content.to_string()
        }
        None => {
            warn!(
                "[{}] API响应格式异常: {}",
                provider_name,
                truncate_text(raw, 200)
            );
            UNPARSEABLE_RESPONSE.to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chat_envelope_extracts_content() {
        let raw = r#"{"choices":[{"message":{"role":"assistant","content":"{\"answer\":\"北京\"}"}}]}"#;
        assert_eq!(parse_chat_envelope("测试", raw), r#"{"answer":"北京"}"#);
    }

    #[test]
    fn chat_envelope_shape_mismatch_returns_sentinel() {
        let raw = r#"{"error":{"message":"quota exceeded"}}"#;
        assert_eq!(parse_chat_envelope("测试", raw), UNPARSEABLE_RESPONSE);
    }

    #[test]
    fn chat_envelope_invalid_json_returns_parse_failure() {
        let result = parse_chat_envelope("测试", "<html>502 Bad Gateway</html>");
        assert!(result.starts_with("API响应解析失败"));
    }

    #[test]
    fn chat_envelope_empty_choices_returns_sentinel() {
        assert_eq!(
            parse_chat_envelope("测试", r#"{"choices":[]}"#),
            UNPARSEABLE_RESPONSE
        );
    }
}
