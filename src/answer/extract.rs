//! 从 AI 原始回复中提取答案
//!
//! 提取顺序：
//! 1. 截取首个 `{` 到最后一个 `}` 之间的片段（容忍 JSON 外包裹的文字）
//! 2. 修复常见格式问题：单引号、未加引号的键名、多余空白
//! 3. 解析 JSON 并读取 `answer` 字段（兼容拼写错误 `anwser`）
//! 4. 解析失败时用正则直接在原文中匹配 `"answer": "..."`
//! 5. 全部失败则原样返回输入（提取永不失败，只会退化为透传）

use regex::Regex;
use serde_json::Value;
use std::sync::OnceLock;
use tracing::debug;

fn brace_key_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\{(\s*)(\w+)(\s*):").expect("固定正则"))
}

fn comma_key_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r",(\s*)(\w+)(\s*):").expect("固定正则"))
}

fn whitespace_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\s+").expect("固定正则"))
}

fn answer_field_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r#""answer"\s*:\s*"([^"]+)""#).expect("固定正则"))
}

fn anwser_field_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r#""anwser"\s*:\s*"([^"]+)""#).expect("固定正则"))
}

fn loose_field_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    // 键和值都可能没有引号，值匹配到引号、逗号或右花括号为止
    RE.get_or_init(|| Regex::new(r#"(?:answer|anwser)['"]?\s*:\s*['"]?([^'"},]+)"#).expect("固定正则"))
}

/// 从 AI 回复中提取答案字符串
///
/// 对任意输入都不会 panic；对已经规范的 JSON 幂等。
pub fn extract_answer(raw: &str) -> String {
    if let Some(answer) = try_extract_json(raw) {
        return answer;
    }

    // JSON 解析失败，尝试直接在原文中正则匹配答案字段
    if let Some(answer) = try_extract_regex(raw) {
        return answer;
    }

    // 所有策略失败，原样返回
    raw.to_string()
}

/// 截取并修复 JSON 片段后解析答案字段
fn try_extract_json(raw: &str) -> Option<String> {
    let start = raw.find('{')?;
    let end = raw.rfind('}')?;
    if start >= end {
        return None;
    }

    // 修复常见格式问题
    // 1. 单引号替换为双引号
    let mut json_str = raw[start..=end].replace('\'', "\"");
    // 2. 给未加引号的键名补上双引号 {answer: -> {"answer":
    json_str = brace_key_re()
        .replace_all(&json_str, "{$1\"$2\"$3:")
        .into_owned();
    json_str = comma_key_re()
        .replace_all(&json_str, ",$1\"$2\"$3:")
        .into_owned();
    // 3. 折叠所有空白，使 JSON 更紧凑
    let json_str = whitespace_re()
        .replace_all(&json_str, " ")
        .trim()
        .to_string();

    debug!("处理后的JSON字符串: {}", json_str);

    let value: Value = serde_json::from_str(&json_str).ok()?;
    let answer = value.get("answer").or_else(|| value.get("anwser"))?;

    match answer {
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

/// 正则兜底：直接在原文中匹配 `"answer": "..."` 或 `"anwser": "..."`
fn try_extract_regex(raw: &str) -> Option<String> {
    if let Some(caps) = answer_field_re()
        .captures(raw)
        .or_else(|| anwser_field_re().captures(raw))
    {
        return Some(caps[1].to_string());
    }

    // 键或值缺少引号时的宽松匹配
    loose_field_re()
        .captures(raw)
        .map(|caps| caps[1].trim().to_string())
        .filter(|s| !s.is_empty())
}
