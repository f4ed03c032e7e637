//! 提供商注册表
//!
//! 维护 标识 → 构造函数 的映射和进程级的实例缓存。
//! 只有"启用且配置了密钥"的实例才会被缓存；未启用的提供商每次都返回
//! `None` 且不缓存，这样修改配置后无需清空缓存即可生效。

use crate::config::{Config, ProviderConfig};
use crate::providers::{
    AiProvider, AlibabaProvider, DeepSeekProvider, GoogleProvider, OpenAiProvider,
};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use tracing::{debug, info, warn};

/// 提供商构造函数
pub type ProviderBuilder = fn(ProviderConfig) -> anyhow::Result<Arc<dyn AiProvider>>;

/// 提供商状态信息
#[derive(Clone, Debug, Serialize)]
pub struct ProviderInfo {
    /// 显示名称
    pub name: String,
    /// 是否启用
    pub enabled: bool,
    /// 是否配置了 API 密钥
    pub has_api_key: bool,
    /// 模型名称
    pub model: String,
    /// 是否可用（启用且有密钥）
    pub is_available: bool,
}

/// 提供商注册表
pub struct ProviderRegistry {
    config: Arc<Config>,
    builders: RwLock<HashMap<String, ProviderBuilder>>,
    instances: RwLock<HashMap<String, Arc<dyn AiProvider>>>,
}

fn build_alibaba(config: ProviderConfig) -> anyhow::Result<Arc<dyn AiProvider>> {
    Ok(Arc::new(AlibabaProvider::new(config)?))
}

fn build_deepseek(config: ProviderConfig) -> anyhow::Result<Arc<dyn AiProvider>> {
    Ok(Arc::new(DeepSeekProvider::new(config)?))
}

fn build_openai(config: ProviderConfig) -> anyhow::Result<Arc<dyn AiProvider>> {
    Ok(Arc::new(OpenAiProvider::new(config)?))
}

fn build_google(config: ProviderConfig) -> anyhow::Result<Arc<dyn AiProvider>> {
    Ok(Arc::new(GoogleProvider::new(config)?))
}

impl ProviderRegistry {
    /// 创建注册表并注册内置的四个提供商
    pub fn new(config: Arc<Config>) -> Self {
        let mut builders: HashMap<String, ProviderBuilder> = HashMap::new();
        builders.insert("alibaba".to_string(), build_alibaba);
        builders.insert("deepseek".to_string(), build_deepseek);
        builders.insert("openai".to_string(), build_openai);
        builders.insert("google".to_string(), build_google);

        Self {
            config,
            builders: RwLock::new(builders),
            instances: RwLock::new(HashMap::new()),
        }
    }

    /// 注册新的提供商构造函数（运行时扩展点）
    pub fn register(&self, id: impl Into<String>, builder: ProviderBuilder) {
        let id = id.into();
        info!("注册新提供商: {}", id);
        self.write_builders().insert(id, builder);
    }

    /// 创建（或从缓存取出）提供商实例
    ///
    /// 配置缺失、标识不受支持、未启用/缺少密钥均返回 `None`，
    /// 三种情况通过日志区分。
    pub fn create(&self, id: &str) -> Option<Arc<dyn AiProvider>> {
        if let Some(instance) = self.read_instances().get(id) {
            return Some(instance.clone());
        }

        let Some(provider_config) = self.config.provider(id) else {
            warn!("未找到提供商配置: {}", id);
            return None;
        };

        let Some(builder) = self.read_builders().get(id).copied() else {
            warn!("不支持的提供商: {}", id);
            return None;
        };

        let instance = match builder(provider_config.clone()) {
            Ok(instance) => instance,
            Err(e) => {
                warn!("创建提供商实例失败: {}, 错误: {}", id, e);
                return None;
            }
        };

        if !instance.is_enabled() {
            debug!("提供商未启用或缺少API密钥: {}", id);
            return None;
        }

        // 并发下可能重复构造，后写入者覆盖，最终只保留一个实例
        self.write_instances()
            .insert(id.to_string(), instance.clone());
        info!("成功创建提供商实例: {}", id);

        Some(instance)
    }

    /// 获取配置的默认提供商实例
    pub fn default_provider(&self) -> Option<Arc<dyn AiProvider>> {
        self.create(&self.config.default_provider)
    }

    /// 配置的默认提供商标识
    pub fn default_id(&self) -> &str {
        &self.config.default_provider
    }

    /// 列出所有可用（启用且有密钥）的提供商标识
    pub fn available(&self) -> Vec<String> {
        let ids: Vec<String> = self.read_builders().keys().cloned().collect();
        let mut available: Vec<String> = ids
            .into_iter()
            .filter(|id| self.create(id).is_some())
            .collect();
        available.sort();
        available
    }

    /// 获取所有已配置提供商的状态信息
    pub fn provider_info(&self) -> HashMap<String, ProviderInfo> {
        let ids: Vec<String> = self.read_builders().keys().cloned().collect();
        let mut info = HashMap::new();

        for id in ids {
            if let Some(provider_config) = self.config.provider(&id) {
                info.insert(
                    id.clone(),
                    ProviderInfo {
                        name: provider_config.name.clone(),
                        enabled: provider_config.enabled,
                        has_api_key: !provider_config.api_key.is_empty(),
                        model: provider_config.model.clone(),
                        is_available: provider_config.is_enabled(),
                    },
                );
            }
        }

        info
    }

    /// 清空实例缓存
    pub fn clear_cache(&self) {
        self.write_instances().clear();
        info!("已清空提供商实例缓存");
    }

    // 锁中毒时恢复内部数据继续使用，注册表不持有需要回滚的状态
    fn read_builders(&self) -> std::sync::RwLockReadGuard<'_, HashMap<String, ProviderBuilder>> {
        self.builders.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write_builders(&self) -> std::sync::RwLockWriteGuard<'_, HashMap<String, ProviderBuilder>> {
        self.builders.write().unwrap_or_else(|e| e.into_inner())
    }

    fn read_instances(&self) -> std::sync::RwLockReadGuard<'_, HashMap<String, Arc<dyn AiProvider>>> {
        self.instances.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write_instances(&self) -> std::sync::RwLockWriteGuard<'_, HashMap<String, Arc<dyn AiProvider>>> {
        self.instances.write().unwrap_or_else(|e| e.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config_with_key(id: &str) -> Arc<Config> {
        let mut config = Config::default();
        if let Some(p) = config.providers.get_mut(id) {
            p.api_key = "test-key".to_string();
        }
        Arc::new(config)
    }

    #[test]
    fn unknown_provider_returns_none() {
        let registry = ProviderRegistry::new(Arc::new(Config::default()));
        assert!(registry.create("unknown").is_none());
    }

    #[test]
    fn keyless_provider_returns_none_even_if_enabled() {
        let registry = ProviderRegistry::new(Arc::new(Config::default()));
        // 默认配置 enabled=true 但 api_key 为空
        assert!(registry.create("openai").is_none());
    }

    #[test]
    fn disabled_provider_returns_none() {
        let mut config = Config::default();
        if let Some(p) = config.providers.get_mut("openai") {
            p.api_key = "sk-test".to_string();
            p.enabled = false;
        }
        let registry = ProviderRegistry::new(Arc::new(config));
        assert!(registry.create("openai").is_none());
    }

    #[test]
    fn enabled_provider_is_created_and_cached() {
        let registry = ProviderRegistry::new(config_with_key("deepseek"));
        let first = registry.create("deepseek").expect("应能创建实例");
        let second = registry.create("deepseek").expect("应能取出缓存实例");
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn default_provider_resolves_through_create() {
        let mut config = Config::default();
        config.default_provider = "google".to_string();
        if let Some(p) = config.providers.get_mut("google") {
            p.api_key = "g-key".to_string();
        }
        let registry = ProviderRegistry::new(Arc::new(config));
        let provider = registry.default_provider().expect("默认提供商应可用");
        assert_eq!(provider.name(), "Google Studio");
    }

    #[test]
    fn available_lists_only_keyed_providers() {
        let registry = ProviderRegistry::new(config_with_key("alibaba"));
        assert_eq!(registry.available(), vec!["alibaba".to_string()]);
    }

    #[test]
    fn provider_info_reports_key_status() {
        let registry = ProviderRegistry::new(config_with_key("alibaba"));
        let info = registry.provider_info();
        assert_eq!(info.len(), 4);
        assert!(info["alibaba"].has_api_key);
        assert!(info["alibaba"].is_available);
        assert!(!info["openai"].has_api_key);
        assert!(!info["openai"].is_available);
        assert!(info["openai"].enabled);
    }

    #[test]
    fn runtime_registration_extends_builders() {
        let mut config = Config::default();
        config.providers.insert(
            "custom".to_string(),
            crate::config::ProviderConfig {
                name: "自定义".to_string(),
                enabled: true,
                api_key: "k".to_string(),
                base_url: "http://localhost".to_string(),
                model: "m".to_string(),
                max_tokens: 512,
                temperature: 0.1,
                top_p: 0.9,
                timeout_secs: 30,
                max_retries: 3,
                retry_delay_secs: 0,
            },
        );
        let registry = ProviderRegistry::new(Arc::new(config));
        // 有配置但没有构造函数
        assert!(registry.create("custom").is_none());

        registry.register("custom", |c| {
            Ok(Arc::new(crate::providers::DeepSeekProvider::new(c)?))
        });
        assert!(registry.create("custom").is_some());
    }
}
