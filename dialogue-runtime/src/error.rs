//! # Error 模块
//!
//! 定义 dialogue-runtime 中使用的错误类型。
//!
//! 注意：会话引擎本身的操作（begin / select_slot / 延时任务）从不向
//! 调用方抛错——配置不一致按可恢复诊断记录日志并回退到安全状态。
//! 这里的错误类型只覆盖存档和变量子系统。

use thiserror::Error;

/// 存档错误
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SaveError {
    /// 序列化失败
    #[error("序列化失败: {0}")]
    SerializationFailed(String),

    /// 反序列化失败
    #[error("反序列化失败: {0}")]
    DeserializationFailed(String),

    /// 版本不兼容
    #[error("存档版本不兼容: 存档版本 {save_version} vs 当前版本 {current_version}")]
    IncompatibleVersion {
        save_version: String,
        current_version: String,
    },

    /// 快照长度与选项数量不一致
    #[error("快照长度不匹配: 会话有 {expected} 个选项，快照提供了 {actual} 个标志")]
    SnapshotLengthMismatch { expected: usize, actual: usize },
}

/// 变量错误
#[derive(Error, Debug, Clone, PartialEq)]
pub enum VariableError {
    /// 变量不存在
    #[error("变量 {id}（{scope}）不存在")]
    NotFound { id: i32, scope: String },

    /// 类型不兼容，无显式转换规则
    #[error("无法把 {from} 类型的值复制到 {to} 类型的变量")]
    Incompatible { from: String, to: String },
}

/// dialogue-runtime 统一错误类型
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DialogueError {
    /// 存档错误
    #[error("存档错误: {0}")]
    Save(#[from] SaveError),

    /// 变量错误
    #[error("变量错误: {0}")]
    Variable(#[from] VariableError),
}

/// Result 类型别名
pub type DialogueResult<T> = Result<T, DialogueError>;
