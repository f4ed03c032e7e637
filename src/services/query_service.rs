//! 查询服务 - 答案解析流水线
//!
//! 流程：本地题库查找 → 未命中则调用默认 AI 提供商 → 校验答案 →
//! 有效则写回题库 → 返回结果。
//!
//! `query_answer` 的边界保证：任何内部异常（包括 panic）都不会穿透到
//! 调用方，一律转换为 `source: system` 的失败结果。

use crate::answer::is_valid_answer;
use crate::models::{AnswerSource, QueryData, QueryRequest};
use crate::providers::{ProviderInfo, ProviderRegistry};
use crate::store::QuestionStore;
use crate::utils::truncate_text;
use futures::FutureExt;
use serde::Serialize;
use std::collections::HashMap;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// 查询统计信息
#[derive(Debug, Serialize)]
pub struct Statistics {
    /// 题库记录总数
    pub total_questions: usize,
    /// 可用的 AI 提供商数量
    pub available_ai_providers: usize,
    /// 最近的记录（内容截断后）
    pub recent_questions: Vec<RecentQuestion>,
    /// 可用提供商标识列表
    pub ai_providers: Vec<String>,
}

/// 最近记录的摘要
#[derive(Debug, Serialize)]
pub struct RecentQuestion {
    pub question: String,
    pub answer: String,
    pub created_at: String,
}

/// 提供商状态总览
#[derive(Debug, Serialize)]
pub struct ProvidersStatus {
    /// 配置的默认提供商标识
    pub default_provider: String,
    /// 各提供商的状态
    pub providers: HashMap<String, ProviderInfo>,
    /// 已知提供商总数
    pub total_count: usize,
    /// 可用提供商数量
    pub available_count: usize,
}

/// 查询服务
pub struct QueryService {
    store: Arc<dyn QuestionStore>,
    registry: Arc<ProviderRegistry>,
}

impl QueryService {
    /// 创建查询服务
    pub fn new(store: Arc<dyn QuestionStore>, registry: Arc<ProviderRegistry>) -> Self {
        Self { store, registry }
    }

    /// 查询问题答案
    ///
    /// 永不失败：内部的任何 panic 都会被捕获并转换为 `source: system` 的结果。
    pub async fn query_answer(&self, request: &QueryRequest) -> QueryData {
        match AssertUnwindSafe(self.resolve(request)).catch_unwind().await {
            Ok(data) => data,
            Err(panic) => {
                let message = panic_message(&panic);
                error!("查询过程发生异常: {}", message);
                QueryData::not_found(format!("查询失败: {}", message), AnswerSource::System)
            }
        }
    }

    /// 解析流程本体
    async fn resolve(&self, request: &QueryRequest) -> QueryData {
        info!("开始查询: {}", truncate_text(&request.title, 50));

        // 1. 本地题库查找（精确匹配标题）
        if let Some(record) = self.store.find(&request.title) {
            info!("从本地题库找到答案");
            return QueryData::found(record.answer, "来于本地数据库题库", AnswerSource::Public);
        }

        // 2. 题库未命中，使用默认 AI 提供商
        let Some(provider) = self.registry.default_provider() else {
            warn!("没有可用的AI提供商");
            return QueryData::not_found("未找到答案", AnswerSource::Ai);
        };
        info!("使用AI提供商: {}", provider.name());

        // 3. 调用并校验
        let answer = provider
            .query(&request.title, &request.options, &request.question_type)
            .await;

        if !is_valid_answer(&answer) {
            info!("AI未返回有效答案");
            return QueryData::not_found("未找到答案", AnswerSource::Ai);
        }

        // 4. 有效答案写回题库（写回失败不影响本次结果）
        match self.store.upsert(
            &request.title,
            &answer,
            &request.options,
            &request.question_type,
        ) {
            Ok(_) => debug!("答案已保存到题库"),
            Err(e) => warn!("保存到题库失败: {}", e),
        }

        QueryData::found(answer, "AI回答", AnswerSource::Ai)
    }

    /// 获取查询统计信息
    pub fn statistics(&self) -> Statistics {
        let available = self.registry.available();
        let recent_questions = self
            .store
            .list_recent(5)
            .into_iter()
            .map(|r| RecentQuestion {
                question: truncate_text(&r.question, 100),
                answer: truncate_text(&r.answer, 50),
                created_at: r.created_at,
            })
            .collect();

        Statistics {
            total_questions: self.store.count(),
            available_ai_providers: available.len(),
            recent_questions,
            ai_providers: available,
        }
    }

    /// 获取提供商状态总览
    pub fn providers_status(&self) -> ProvidersStatus {
        let providers = self.registry.provider_info();
        let available_count = providers.values().filter(|p| p.is_available).count();

        ProvidersStatus {
            default_provider: self.registry.default_id().to_string(),
            total_count: providers.len(),
            available_count,
            providers,
        }
    }
}

fn panic_message(panic: &Box<dyn std::any::Any + Send>) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "未知内部错误".to_string()
    }
}
