use std::fmt;

/// API 调用错误
///
/// 区分三类终态失败：超时、请求异常、重试耗尽。
/// 非 5xx 的错误状态码不重试，立即以 `BadStatus` 返回。
#[derive(Debug)]
pub enum ApiError {
    /// 请求超时（所有重试均超时）
    Timeout { attempts: u32 },
    /// 网络请求异常（连接失败、DNS 解析失败等）
    RequestFailed {
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    /// 服务端返回错误状态码（非 5xx，不重试）
    BadStatus { code: u16, message: String },
    /// 多次尝试后仍未获取响应
    RetriesExhausted { attempts: u32 },
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::Timeout { attempts } => {
                write!(f, "API调用超时 (已尝试 {} 次)，请稍后再试", attempts)
            }
            ApiError::RequestFailed { source } => {
                write!(f, "API请求异常: {}", source)
            }
            ApiError::BadStatus { code, message } => {
                write!(f, "API返回错误状态码 {}: {}", code, message)
            }
            ApiError::RetriesExhausted { attempts } => {
                write!(f, "尝试 {} 次后仍无法获取答案，请稍后再试", attempts)
            }
        }
    }
}

impl std::error::Error for ApiError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ApiError::RequestFailed { source } => {
                Some(source.as_ref() as &(dyn std::error::Error + 'static))
            }
            _ => None,
        }
    }
}

impl ApiError {
    /// 创建网络请求异常错误
    pub fn request_failed(source: impl std::error::Error + Send + Sync + 'static) -> Self {
        ApiError::RequestFailed {
            source: Box::new(source),
        }
    }
}
