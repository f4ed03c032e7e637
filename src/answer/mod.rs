//! 答案提取与有效性校验
//!
//! 模型输出不保证是合法 JSON，即使提示词要求了严格格式。
//! `extract` 负责尽力恢复答案内容，`validate` 负责判断答案是否可用。

pub mod extract;
pub mod validate;

pub use extract::extract_answer;
pub use validate::is_valid_answer;
