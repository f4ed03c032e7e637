/// 程序配置
///
/// 配置来源的优先级（从低到高）：
/// 1. 内置默认值（`Config::default`）
/// 2. TOML 配置文件（`config.toml`，路径可通过 `TIKU_CONFIG` 指定）
/// 3. 环境变量（`TIKU_DEFAULT_PROVIDER`、`TIKU_BANK_FILE`、`<提供商>_API_KEY`）
///
/// 加载完成后配置视为只读。
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

/// AI 提供商配置
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// 提供商显示名称
    pub name: String,
    /// 是否启用
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// API 密钥（为空视为未启用）
    #[serde(default)]
    pub api_key: String,
    /// API 基础 URL
    pub base_url: String,
    /// 模型名称
    pub model: String,
    /// 最大令牌数
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    /// 温度参数
    #[serde(default = "default_temperature")]
    pub temperature: f64,
    /// Top-p 参数
    #[serde(default = "default_top_p")]
    pub top_p: f64,
    /// 单次请求超时（秒）
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// 最大重试次数
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    /// 重试间隔（秒，固定间隔）
    #[serde(default = "default_retry_delay_secs")]
    pub retry_delay_secs: u64,
}

fn default_enabled() -> bool {
    true
}
fn default_max_tokens() -> u32 {
    512
}
fn default_temperature() -> f64 {
    0.1
}
fn default_top_p() -> f64 {
    0.9
}
fn default_timeout_secs() -> u64 {
    30
}
fn default_max_retries() -> u32 {
    3
}
fn default_retry_delay_secs() -> u64 {
    2
}

impl ProviderConfig {
    /// 单次请求超时
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// 重试间隔
    pub fn retry_delay(&self) -> Duration {
        Duration::from_secs(self.retry_delay_secs)
    }

    /// 提供商是否可用（启用且配置了 API 密钥）
    pub fn is_enabled(&self) -> bool {
        self.enabled && !self.api_key.is_empty()
    }
}

/// 全局配置
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Config {
    /// 默认 AI 提供商标识
    #[serde(default = "default_provider_id")]
    pub default_provider: String,
    /// 题库文件路径
    #[serde(default = "default_bank_file")]
    pub bank_file: String,
    /// 各提供商配置，键为提供商标识
    #[serde(default)]
    pub providers: HashMap<String, ProviderConfig>,
}

fn default_provider_id() -> String {
    "alibaba".to_string()
}

fn default_bank_file() -> String {
    "question_bank.json".to_string()
}

impl Default for Config {
    fn default() -> Self {
        let mut providers = HashMap::new();
        providers.insert(
            "alibaba".to_string(),
            ProviderConfig {
                name: "阿里百炼".to_string(),
                enabled: true,
                api_key: String::new(),
                base_url: "https://dashscope.aliyuncs.com/compatible-mode/v1".to_string(),
                model: "qwen-plus".to_string(),
                max_tokens: default_max_tokens(),
                temperature: default_temperature(),
                top_p: default_top_p(),
                timeout_secs: default_timeout_secs(),
                max_retries: default_max_retries(),
                retry_delay_secs: default_retry_delay_secs(),
            },
        );
        providers.insert(
            "deepseek".to_string(),
            ProviderConfig {
                name: "DeepSeek".to_string(),
                enabled: true,
                api_key: String::new(),
                base_url: "https://api.deepseek.com/v1".to_string(),
                model: "deepseek-chat".to_string(),
                max_tokens: default_max_tokens(),
                temperature: default_temperature(),
                top_p: default_top_p(),
                timeout_secs: default_timeout_secs(),
                max_retries: default_max_retries(),
                retry_delay_secs: default_retry_delay_secs(),
            },
        );
        providers.insert(
            "openai".to_string(),
            ProviderConfig {
                name: "OpenAI".to_string(),
                enabled: true,
                api_key: String::new(),
                base_url: "https://api.openai.com/v1".to_string(),
                model: "gpt-4o-mini".to_string(),
                max_tokens: default_max_tokens(),
                temperature: default_temperature(),
                top_p: default_top_p(),
                timeout_secs: default_timeout_secs(),
                max_retries: default_max_retries(),
                retry_delay_secs: default_retry_delay_secs(),
            },
        );
        providers.insert(
            "google".to_string(),
            ProviderConfig {
                name: "Google Studio".to_string(),
                enabled: true,
                api_key: String::new(),
                base_url: "https://generativelanguage.googleapis.com/v1beta".to_string(),
                model: "gemini-1.5-flash".to_string(),
                max_tokens: default_max_tokens(),
                temperature: default_temperature(),
                top_p: default_top_p(),
                timeout_secs: default_timeout_secs(),
                max_retries: default_max_retries(),
                retry_delay_secs: default_retry_delay_secs(),
            },
        );

        Self {
            default_provider: default_provider_id(),
            bank_file: default_bank_file(),
            providers,
        }
    }
}

impl Config {
    /// 加载配置
    ///
    /// 若配置文件存在则读取，否则使用内置默认值；最后应用环境变量覆盖。
    pub fn load(path: &Path) -> Result<Self> {
        let mut config = if path.exists() {
            Self::from_file(path)?
        } else {
            tracing::info!("配置文件不存在，使用默认配置: {}", path.display());
            Self::default()
        };
        config.apply_env();
        Ok(config)
    }

    /// 从 TOML 文件加载配置
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("无法读取配置文件: {}", path.display()))?;
        let config: Config = toml::from_str(&content)
            .with_context(|| format!("无法解析配置文件: {}", path.display()))?;
        Ok(config)
    }

    /// 应用环境变量覆盖
    pub fn apply_env(&mut self) {
        self.apply_env_from(|key| std::env::var(key).ok());
    }

    /// 从指定的查找函数应用覆盖（便于测试）
    pub fn apply_env_from(&mut self, get: impl Fn(&str) -> Option<String>) {
        if let Some(v) = get("TIKU_DEFAULT_PROVIDER") {
            self.default_provider = v;
        }
        if let Some(v) = get("TIKU_BANK_FILE") {
            self.bank_file = v;
        }
        for (id, provider) in self.providers.iter_mut() {
            let key_var = format!("{}_API_KEY", id.to_uppercase());
            if let Some(v) = get(&key_var) {
                provider.api_key = v;
            }
        }
    }

    /// 获取指定提供商的配置
    pub fn provider(&self, id: &str) -> Option<&ProviderConfig> {
        self.providers.get(id)
    }

    /// 列出所有启用且配置了密钥的提供商标识
    pub fn enabled_providers(&self) -> Vec<String> {
        let mut ids: Vec<String> = self
            .providers
            .iter()
            .filter(|(_, p)| p.is_enabled())
            .map(|(id, _)| id.clone())
            .collect();
        ids.sort();
        ids
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_has_four_providers() {
        let config = Config::default();
        assert_eq!(config.providers.len(), 4);
        assert!(config.provider("alibaba").is_some());
        assert!(config.provider("deepseek").is_some());
        assert!(config.provider("openai").is_some());
        assert!(config.provider("google").is_some());
        assert_eq!(config.default_provider, "alibaba");
    }

    #[test]
    fn default_providers_have_no_key() {
        let config = Config::default();
        assert!(config.enabled_providers().is_empty());
    }

    #[test]
    fn parse_toml_config() {
        let toml_str = r#"
default_provider = "deepseek"

[providers.deepseek]
name = "DeepSeek"
api_key = "sk-test"
base_url = "https://api.deepseek.com/v1"
model = "deepseek-chat"
max_retries = 5
"#;
        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.default_provider, "deepseek");
        let p = config.provider("deepseek").unwrap();
        assert!(p.enabled);
        assert_eq!(p.api_key, "sk-test");
        assert_eq!(p.max_retries, 5);
        // 未显式给出的字段使用默认值
        assert_eq!(p.max_tokens, 512);
        assert_eq!(p.timeout_secs, 30);
    }

    #[test]
    fn env_overrides_take_effect() {
        let mut config = Config::default();
        config.apply_env_from(|key| match key {
            "TIKU_DEFAULT_PROVIDER" => Some("google".to_string()),
            "GOOGLE_API_KEY" => Some("g-key".to_string()),
            _ => None,
        });
        assert_eq!(config.default_provider, "google");
        assert_eq!(config.provider("google").unwrap().api_key, "g-key");
        assert!(config.provider("openai").unwrap().api_key.is_empty());
        assert_eq!(config.enabled_providers(), vec!["google".to_string()]);
    }
}
