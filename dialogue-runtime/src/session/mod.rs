//! # Session 模块
//!
//! 会话执行核心，负责选项展示状态、限时自动选择与全局状态协调。
//!
//! ## 模块结构
//!
//! - [`engine`]：核心会话引擎

pub mod engine;

pub use engine::{ConversationEngine, OPTION_RESOLVE_DELAY};
