//! 题库存储
//!
//! 流水线只依赖窄接口 `QuestionStore`：按标题精确查找、按标题 upsert、计数。
//! 提供内存实现（测试用）和 JSON 文件实现（进程内持久化）。

use crate::models::BankRecord;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::RwLock;
use thiserror::Error;
use tracing::{debug, info};

/// 存储错误
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("读取题库文件失败 ({path}): {source}")]
    ReadFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("写入题库文件失败 ({path}): {source}")]
    WriteFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("题库文件格式错误 ({path}): {source}")]
    ParseFailed {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

/// 题库存储接口
///
/// 查找只做精确匹配；upsert 以标题为键，已存在时覆盖答案/选项/类型而不是新增。
pub trait QuestionStore: Send + Sync {
    /// 按标题精确查找
    fn find(&self, title: &str) -> Option<BankRecord>;

    /// 插入或更新记录（以标题为键）
    fn upsert(
        &self,
        title: &str,
        answer: &str,
        options: &str,
        question_type: &str,
    ) -> Result<BankRecord, StoreError>;

    /// 记录总数
    fn count(&self) -> usize;

    /// 最近创建的记录（按创建时间倒序）
    fn list_recent(&self, limit: usize) -> Vec<BankRecord>;
}

fn now_string() -> String {
    chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string()
}

fn make_record(title: &str, answer: &str, options: &str, question_type: &str) -> BankRecord {
    BankRecord {
        question: title.to_string(),
        answer: answer.to_string(),
        options: options.to_string(),
        question_type: question_type.to_string(),
        created_at: now_string(),
    }
}

fn recent_of(records: &HashMap<String, BankRecord>, limit: usize) -> Vec<BankRecord> {
    let mut all: Vec<BankRecord> = records.values().cloned().collect();
    all.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    all.truncate(limit);
    all
}

/// 内存题库
#[derive(Default)]
pub struct MemoryStore {
    records: RwLock<HashMap<String, BankRecord>>,
}

impl MemoryStore {
    /// 创建空的内存题库
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, HashMap<String, BankRecord>> {
        self.records.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, HashMap<String, BankRecord>> {
        self.records.write().unwrap_or_else(|e| e.into_inner())
    }
}

impl QuestionStore for MemoryStore {
    fn find(&self, title: &str) -> Option<BankRecord> {
        self.read().get(title).cloned()
    }

    fn upsert(
        &self,
        title: &str,
        answer: &str,
        options: &str,
        question_type: &str,
    ) -> Result<BankRecord, StoreError> {
        let mut records = self.write();
        let record = match records.get_mut(title) {
            Some(existing) => {
                debug!("问题已存在，更新答案: {}", title);
                existing.answer = answer.to_string();
                existing.options = options.to_string();
                existing.question_type = question_type.to_string();
                existing.clone()
            }
            None => {
                let record = make_record(title, answer, options, question_type);
                records.insert(title.to_string(), record.clone());
                record
            }
        };
        Ok(record)
    }

    fn count(&self) -> usize {
        self.read().len()
    }

    fn list_recent(&self, limit: usize) -> Vec<BankRecord> {
        recent_of(&self.read(), limit)
    }
}

/// 题库文件的顶层结构
#[derive(Serialize, Deserialize, Default)]
struct BankFile {
    #[serde(default)]
    records: Vec<BankRecord>,
}

/// JSON 文件题库
///
/// 打开时整体载入内存，每次 upsert 写回文件。
pub struct JsonFileStore {
    path: PathBuf,
    records: RwLock<HashMap<String, BankRecord>>,
}

impl JsonFileStore {
    /// 打开（或新建）题库文件
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        let records = if path.exists() {
            Self::load(&path)?
        } else {
            HashMap::new()
        };
        info!("题库已加载: {} ({} 条记录)", path.display(), records.len());
        Ok(Self {
            path,
            records: RwLock::new(records),
        })
    }

    fn load(path: &Path) -> Result<HashMap<String, BankRecord>, StoreError> {
        let content = std::fs::read_to_string(path).map_err(|source| StoreError::ReadFailed {
            path: path.display().to_string(),
            source,
        })?;
        let file: BankFile =
            serde_json::from_str(&content).map_err(|source| StoreError::ParseFailed {
                path: path.display().to_string(),
                source,
            })?;
        Ok(file
            .records
            .into_iter()
            .map(|r| (r.question.clone(), r))
            .collect())
    }

    fn persist(&self, records: &HashMap<String, BankRecord>) -> Result<(), StoreError> {
        let mut all: Vec<&BankRecord> = records.values().collect();
        all.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        let file = BankFile {
            records: all.into_iter().cloned().collect(),
        };
        let content = serde_json::to_string_pretty(&file).map_err(|source| {
            StoreError::ParseFailed {
                path: self.path.display().to_string(),
                source,
            }
        })?;
        std::fs::write(&self.path, content).map_err(|source| StoreError::WriteFailed {
            path: self.path.display().to_string(),
            source,
        })
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, HashMap<String, BankRecord>> {
        self.records.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, HashMap<String, BankRecord>> {
        self.records.write().unwrap_or_else(|e| e.into_inner())
    }
}

impl QuestionStore for JsonFileStore {
    fn find(&self, title: &str) -> Option<BankRecord> {
        self.read().get(title).cloned()
    }

    fn upsert(
        &self,
        title: &str,
        answer: &str,
        options: &str,
        question_type: &str,
    ) -> Result<BankRecord, StoreError> {
        let mut records = self.write();
        let record = match records.get_mut(title) {
            Some(existing) => {
                debug!("问题已存在，更新答案: {}", title);
                existing.answer = answer.to_string();
                existing.options = options.to_string();
                existing.question_type = question_type.to_string();
                existing.clone()
            }
            None => {
                let record = make_record(title, answer, options, question_type);
                records.insert(title.to_string(), record.clone());
                record
            }
        };
        self.persist(&records)?;
        Ok(record)
    }

    fn count(&self) -> usize {
        self.read().len()
    }

    fn list_recent(&self, limit: usize) -> Vec<BankRecord> {
        recent_of(&self.read(), limit)
    }
}
