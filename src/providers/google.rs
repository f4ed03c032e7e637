//! Google Studio (Gemini) 适配器
//!
//! 与聊天类后端不同：API 密钥作为 URL 查询参数传递，请求体为
//! `contents/parts` 结构，响应信封是 `candidates[0].content.parts[0].text`。

use crate::clients::RetryingRequester;
use crate::config::ProviderConfig;
use crate::providers::{AiProvider, UNPARSEABLE_RESPONSE};
use crate::utils::truncate_text;
use anyhow::Result;
use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::{debug, warn};

/// Google Studio 提供商
pub struct GoogleProvider {
    config: ProviderConfig,
    requester: RetryingRequester,
}

impl GoogleProvider {
    /// 创建提供商实例
    pub fn new(config: ProviderConfig) -> Result<Self> {
        let requester = RetryingRequester::from_config(&config)?;
        Ok(Self { config, requester })
    }
}

#[async_trait]
impl AiProvider for GoogleProvider {
    fn name(&self) -> &str {
        &self.config.name
    }

    fn config(&self) -> &ProviderConfig {
        &self.config
    }

    fn requester(&self) -> &RetryingRequester {
        &self.requester
    }

    fn endpoint(&self) -> String {
        // API 密钥作为查询参数
        format!(
            "{}/models/{}:generateContent?key={}",
            self.config.base_url, self.config.model, self.config.api_key
        )
    }

    fn headers(&self) -> Vec<(String, String)> {
        vec![("Content-Type".to_string(), "application/json".to_string())]
    }

    fn build_prompt(&self, question: &str, options: &str, question_type: &str) -> String {
        let content = r####"你是一个专业的题库回答助手。请根据提供的问题和选项给出准确答案。

答题规则：
1. 选择题：直接返回选项内容，不是字母
2. 多选题：多个答案用"###"连接
3. 判断题：直接返回"对"或"错"
4. 填空题：直接填写内容，多个空用"###"连接

回答格式必须是严格的JSON格式：{"answer":"你的答案"}

请回答以下问题："####;

        format!(
            "{}\n\n问题：{}\n选项：{}\n类型：{}",
            content, question, options, question_type
        )
    }

    fn build_request(&self, prompt: &str) -> Value {
        json!({
            "contents": [
                {
                    "parts": [
                        {
                            "text": prompt
                        }
                    ]
                }
            ],
            "generationConfig": {
                "temperature": self.config.temperature,
                "topP": self.config.top_p,
                "maxOutputTokens": self.config.max_tokens,
                "stopSequences": []
            },
            "safetySettings": [
                {
                    "category": "HARM_CATEGORY_HARASSMENT",
                    "threshold": "BLOCK_NONE"
                },
                {
                    "category": "HARM_CATEGORY_HATE_SPEECH",
                    "threshold": "BLOCK_NONE"
                },
                {
                    "category": "HARM_CATEGORY_SEXUALLY_EXPLICIT",
                    "threshold": "BLOCK_NONE"
                },
                {
                    "category": "HARM_CATEGORY_DANGEROUS_CONTENT",
                    "threshold": "BLOCK_NONE"
                }
            ]
        })
    }

    fn parse_response(&self, raw: &str) -> String {
        let value: Value = match serde_json::from_str(raw) {
            Ok(v) => v,
            Err(e) => {
                warn!("[{}] JSON解析错误: {}", self.name(), e);
                warn!("[{}] 响应内容: {}", self.name(), truncate_text(raw, 200));
                return format!("API响应解析失败: {}", e);
            }
        };

        match value
            .get("candidates")
            .and_then(|c| c.get(0))
            .and_then(|c| c.get("content"))
            .and_then(|c| c.get("parts"))
            .and_then(|p| p.get(0))
            .and_then(|p| p.get("text"))
            .and_then(|t| t.as_str())
        {
            Some(text) => {
                debug!("[{}] AI返回答案: {}", self.name(), truncate_text(text, 100));
                text.to_string()
            }
            None => {
                warn!(
                    "[{}] API响应格式异常: {}",
                    self.name(),
                    truncate_text(raw, 200)
                );
                UNPARSEABLE_RESPONSE.to_string()
            }
        }
    }
}
