//! 答案有效性校验
//!
//! 基于固定关键词的启发式判断：凡是包含失败指示词的文本一律视为无效。
//!
//! 已知局限：合法答案本身包含"超时"、"错误"等词（例如作为词汇题的答案）时
//! 也会被整体判为无效。此行为是有意保留的，不要收窄关键词的匹配范围。

/// 失败指示关键词（匹配前统一转为小写）
const ERROR_KEYWORDS: &[&str] = &[
    "api调用失败",
    "无法从api获取答案",
    "api请求异常",
    "调用失败",
    "解析失败",
    "超时",
    "错误",
];

/// 判断答案是否可用
///
/// 空白文本或包含任一失败关键词（不区分大小写）的文本均无效。
pub fn is_valid_answer(answer: &str) -> bool {
    if answer.trim().is_empty() {
        return false;
    }

    let lower = answer.to_lowercase();
    !ERROR_KEYWORDS.iter().any(|keyword| lower.contains(keyword))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normal_answer_valid() {
        assert!(is_valid_answer("北京"));
        assert!(is_valid_answer("对"));
        assert!(is_valid_answer("内容一###内容二"));
    }

    #[test]
    fn empty_and_whitespace_invalid() {
        assert!(!is_valid_answer(""));
        assert!(!is_valid_answer("   "));
        assert!(!is_valid_answer("\n\t"));
    }

    #[test]
    fn timeout_keyword_anywhere_invalid() {
        assert!(!is_valid_answer("超时"));
        assert!(!is_valid_answer("请求超时，请稍后再试"));
        assert!(!is_valid_answer("前缀文字 超时 后缀文字"));
    }

    #[test]
    fn api_failure_messages_invalid() {
        assert!(!is_valid_answer("OpenAI API调用失败: connection refused"));
        assert!(!is_valid_answer("无法从API获取答案"));
        assert!(!is_valid_answer("API响应解析失败: expected value"));
        assert!(!is_valid_answer("API请求异常: dns error"));
    }

    #[test]
    fn keyword_match_is_case_insensitive() {
        assert!(!is_valid_answer("api调用失败"));
        assert!(!is_valid_answer("Api调用失败"));
    }

    #[test]
    fn legitimate_answer_containing_keyword_rejected() {
        // 已知局限：答案内容恰好包含关键词时整体被拒
        assert!(!is_valid_answer("这道题的答案是：错误"));
    }
}
