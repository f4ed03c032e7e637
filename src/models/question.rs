//! 查询请求与查询结果的数据模型

use anyhow::Result;
use serde::{Deserialize, Serialize};

/// 支持的问题类型
pub const ALLOWED_TYPES: &[&str] = &[
    "",
    "选择题",
    "多选题",
    "填空题",
    "判断题",
    "judgement",
    "single",
    "multiple",
    "fill",
    "truefalse",
    "choice",
];

/// 问题标题最大长度（按字符计）
const MAX_TITLE_LEN: usize = 1000;
/// 选项内容最大长度（按字符计）
const MAX_OPTIONS_LEN: usize = 2000;

/// 查询请求
///
/// 题目标题是缓存查找的唯一键，入口处做 trim，之后大小写和空白均敏感。
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct QueryRequest {
    /// 问题标题
    pub title: String,
    /// 选项内容（可为空）
    #[serde(default)]
    pub options: String,
    /// 问题类型（可为空）
    #[serde(default, rename = "type")]
    pub question_type: String,
}

impl QueryRequest {
    /// 创建并校验查询请求
    pub fn new(
        title: impl Into<String>,
        options: impl Into<String>,
        question_type: impl Into<String>,
    ) -> Result<Self> {
        let title = title.into().trim().to_string();
        let options = options.into();
        let question_type = question_type.into();

        if title.is_empty() {
            anyhow::bail!("问题标题不能为空");
        }
        if title.chars().count() > MAX_TITLE_LEN {
            anyhow::bail!("问题标题过长 (最大 {} 字符)", MAX_TITLE_LEN);
        }
        if options.chars().count() > MAX_OPTIONS_LEN {
            anyhow::bail!("选项内容过长 (最大 {} 字符)", MAX_OPTIONS_LEN);
        }
        if !ALLOWED_TYPES.contains(&question_type.as_str()) {
            anyhow::bail!("不支持的问题类型: {}", question_type);
        }

        Ok(Self {
            title,
            options,
            question_type,
        })
    }
}

/// 答案来源
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnswerSource {
    /// 本地题库
    Public,
    /// AI 回答
    Ai,
    /// 系统内部（查询过程发生异常）
    System,
}

/// 查询结果
///
/// `code` 为 1 时 `data` 必定存在且已通过有效性校验。
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct QueryData {
    /// 状态码 (0: 未找到答案, 1: 找到答案)
    pub code: u8,
    /// 答案内容
    pub data: Option<String>,
    /// 消息说明
    pub msg: String,
    /// 答案来源
    pub source: AnswerSource,
}

impl QueryData {
    /// 找到答案
    pub fn found(answer: impl Into<String>, msg: impl Into<String>, source: AnswerSource) -> Self {
        Self {
            code: 1,
            data: Some(answer.into()),
            msg: msg.into(),
            source,
        }
    }

    /// 未找到答案
    pub fn not_found(msg: impl Into<String>, source: AnswerSource) -> Self {
        Self {
            code: 0,
            data: None,
            msg: msg.into(),
            source,
        }
    }
}

/// 题库记录
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BankRecord {
    /// 问题内容（唯一键）
    pub question: String,
    /// 答案内容
    pub answer: String,
    /// 选项内容
    #[serde(default)]
    pub options: String,
    /// 问题类型
    #[serde(default, rename = "type")]
    pub question_type: String,
    /// 创建时间
    pub created_at: String,
}
