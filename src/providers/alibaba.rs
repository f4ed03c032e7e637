//! 阿里百炼适配器
//!
//! OpenAI 兼容的聊天接口，Bearer 鉴权，单条 user 消息。
//! 提示词沿用 `{"anwser": ...}` 格式（历史遗留拼写，提取层已兼容）。

use crate::clients::RetryingRequester;
use crate::config::ProviderConfig;
use crate::providers::{parse_chat_envelope, AiProvider};
use anyhow::Result;
use async_trait::async_trait;
use serde_json::{json, Value};

/// 阿里百炼提供商
pub struct AlibabaProvider {
    config: ProviderConfig,
    requester: RetryingRequester,
}

impl AlibabaProvider {
    /// 创建提供商实例
    pub fn new(config: ProviderConfig) -> Result<Self> {
        let requester = RetryingRequester::from_config(&config)?;
        Ok(Self { config, requester })
    }
}

#[async_trait]
impl AiProvider for AlibabaProvider {
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
        let mut content = String::from(
            r####"你是一个题库接口函数，请根据问题和选项提供答案。如果是选择题，直接返回对应选项的内容，注意是内容，不是对应字母；如果题目是多选题，将内容用"###"连接；如果选项内容是"对","错"，且只有两项，或者question_type是judgement，你直接返回"对"或"错"的文字，不要返回字母；如果是填空题，直接返回填空内容，多个空使用###连接。回答格式为：{"anwser":"your_anwser_str"}，严格使用此格式回答。比如我问你一个问题，你回答的是"是"，你回答的格式为：{"anwser":"是"}。不要回答嗯，好的，我知道了之类的话，你的回答只能是json。下面是一个问题，请你用json格式回答我，绝对不要使用自然语言"####,
        );

        content.push_str(&format!(
            r#"{{
            "问题": "{}",
            "选项": "{}",
            "类型": "{}"
        }}"#,
            question, options, question_type
        ));

        content
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
            "stop": null,
            "temperature": self.config.temperature,
            "top_p": self.config.top_p,
            "frequency_penalty": 0.5,
            "n": 1,
            "response_format": {"type": "text"}
        })
    }

    fn parse_response(&self, raw: &str) -> String {
        parse_chat_envelope(self.name(), raw)
    }
}
