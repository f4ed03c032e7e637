//! DeepSeek 适配器
//!
//! OpenAI 兼容的聊天接口，Bearer 鉴权，单条 user 消息，中文提示词。

use crate::clients::RetryingRequester;
use crate::config::ProviderConfig;
use crate::providers::{parse_chat_envelope, AiProvider};
use anyhow::Result;
use async_trait::async_trait;
use serde_json::{json, Value};

/// DeepSeek 提供商
pub struct DeepSeekProvider {
    config: ProviderConfig,
    requester: RetryingRequester,
}

impl DeepSeekProvider {
    /// 创建提供商实例
    pub fn new(config: ProviderConfig) -> Result<Self> {
        let requester = RetryingRequester::from_config(&config)?;
        Ok(Self { config, requester })
    }
}

#[async_trait]
impl AiProvider for DeepSeekProvider {
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
        format!("{}/chat/completions", self.config.base_url)
    }

    fn headers(&self) -> Vec<(String, String)> {
        vec![
            (
                "Authorization".to_string(),
                format!("Bearer {}", self.config.api_key),
            ),
            ("Content-Type".to_string(), "application/json".to_string()),
        ]
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
            "model": self.config.model,
            "messages": [
                {
                    "role": "user",
                    "content": prompt
                }
            ],
            "stream": false,
            "max_tokens": self.config.max_tokens,
            "temperature": self.config.temperature,
            "top_p": self.config.top_p,
            "stop": null
        })
    }

    fn parse_response(&self, raw: &str) -> String {
        parse_chat_envelope(self.name(), raw)
    }
}
