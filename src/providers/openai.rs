//! OpenAI 适配器
//!
//! Bearer 鉴权的聊天接口，与其他聊天类后端的差异：额外携带一条 system
//! 消息、英文提示词、frequency/presence 惩罚参数。

use crate::clients::RetryingRequester;
use crate::config::ProviderConfig;
use crate::providers::{parse_chat_envelope, AiProvider};
use anyhow::Result;
use async_trait::async_trait;
use serde_json::{json, Value};

/// OpenAI 提供商
pub struct OpenAiProvider {
    config: ProviderConfig,
    requester: RetryingRequester,
}

impl OpenAiProvider {
    /// 创建提供商实例
    pub fn new(config: ProviderConfig) -> Result<Self> {
        let requester = RetryingRequester::from_config(&config)?;
        Ok(Self { config, requester })
    }
}

#[async_trait]
impl AiProvider for OpenAiProvider {
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
        let content = r####"You are a professional question answering assistant. Please provide accurate answers based on the given questions and options.

Answering Rules:
1. Multiple choice: Return the option content directly, not the letter
2. Multiple select: Connect multiple answers with "###"
3. True/False: Return "对" or "错" directly
4. Fill in the blank: Fill in the content directly, use "###" to connect multiple blanks

Response format must be strict JSON: {"answer":"your_answer"}

Please answer the following question in Chinese:"####;

        format!(
            "{}\n\nQuestion: {}\nOptions: {}\nType: {}",
            content, question, options, question_type
        )
    }

    fn build_request(&self, prompt: &str) -> Value {
        json!({
            "model": self.config.model,
            "messages": [
                {
                    "role": "system",
                    "content": "你是一个专业的题库回答助手，总是以JSON格式{'answer': '答案'}返回答案。请用中文回答。"
                },
                {
                    "role": "user",
                    "content": prompt
                }
            ],
            "stream": false,
            "max_tokens": self.config.max_tokens,
            "temperature": self.config.temperature,
            "top_p": self.config.top_p,
            "frequency_penalty": 0.1,
            "presence_penalty": 0.1,
            "stop": null
        })
    }

    fn parse_response(&self, raw: &str) -> String {
        parse_chat_envelope(self.name(), raw)
    }
}
