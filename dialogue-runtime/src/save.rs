//! # Save 模块
//!
//! 存档/读档系统的数据模型。
//!
//! ## 设计原则
//!
//! - 所有存档数据必须可序列化（JSON）
//! - 必须有版本号，支持向后兼容检测
//! - 引擎侧只产出/消费数据，文件 IO 由 Host 负责
//!
//! 会话的可变状态就是两列按绝对索引对齐的布尔标志
//! （enabled / locked），见 [`OptionSnapshot`]。

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::coordinator::SessionId;
use crate::error::SaveError;
use crate::session::ConversationEngine;

/// 存档格式版本
///
/// 版本号含义：
/// - MAJOR: 不兼容的格式变更
/// - MINOR: 向后兼容的新字段
pub const SAVE_VERSION_MAJOR: u32 = 1;
pub const SAVE_VERSION_MINOR: u32 = 0;

/// 存档版本信息
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaveVersion {
    pub major: u32,
    pub minor: u32,
}

impl SaveVersion {
    /// 当前版本
    pub fn current() -> Self {
        Self {
            major: SAVE_VERSION_MAJOR,
            minor: SAVE_VERSION_MINOR,
        }
    }

    /// 检查是否兼容
    ///
    /// 兼容规则：
    /// - major 必须相同
    /// - minor 可以不同（向后兼容）
    pub fn is_compatible(&self) -> bool {
        self.major == SAVE_VERSION_MAJOR
    }
}

impl std::fmt::Display for SaveVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

impl Default for SaveVersion {
    fn default() -> Self {
        Self::current()
    }
}

/// 会话选项状态快照
///
/// 两列与选项列表按绝对索引对齐的平行布尔序列。
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OptionSnapshot {
    /// 各选项的 enabled 标志
    pub states: Vec<bool>,
    /// 各选项的 locked 标志
    pub locks: Vec<bool>,
}

impl OptionSnapshot {
    /// 从会话引擎采集快照
    pub fn capture(engine: &ConversationEngine) -> Self {
        Self {
            states: engine.option_states(),
            locks: engine.option_locks(),
        }
    }

    /// 把快照写回会话引擎
    ///
    /// 长度必须与引擎当前的选项数量一致，否则判定存档与配置不匹配。
    pub fn apply(&self, engine: &mut ConversationEngine) -> Result<(), SaveError> {
        let expected = engine.options().len();
        if self.states.len() != expected || self.locks.len() != expected {
            return Err(SaveError::SnapshotLengthMismatch {
                expected,
                actual: self.states.len().max(self.locks.len()),
            });
        }
        engine.set_option_states(&self.states);
        engine.set_option_locks(&self.locks);
        Ok(())
    }
}

/// 玩家档案数据
///
/// 选项菜单里出现的全部设置，以及与档案绑定的存档簿记信息。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfileData {
    /// 当前语言索引（0 = 原文）
    pub language: usize,
    /// 是否显示字幕
    pub show_subtitles: bool,
    /// 音效音量（0.0 - 1.0）
    pub sfx_volume: f32,
    /// 音乐音量（0.0 - 1.0）
    pub music_volume: f32,
    /// 语音音量（0.0 - 1.0）
    pub speech_volume: f32,
    /// 与档案联动的全局变量压缩串（格式由变量子系统约定）
    pub linked_variables: String,
    /// 最近一次写入的存档 ID（-1 = 从未存档）
    pub last_save_id: i32,
    /// 档案标识
    pub id: u32,
    /// 档案显示名
    pub label: String,
}

impl ProfileData {
    /// 创建默认档案
    pub fn new(id: u32) -> Self {
        Self {
            language: 0,
            show_subtitles: false,
            sfx_volume: 0.9,
            music_volume: 0.6,
            speech_volume: 1.0,
            linked_variables: String::new(),
            last_save_id: -1,
            id,
            label: format!("Profile {}", id + 1),
        }
    }

    /// 从既有档案复制基础设置到新档案
    ///
    /// 联动变量照搬，存档簿记重置。
    pub fn copy_from(other: &ProfileData, id: u32) -> Self {
        Self {
            language: other.language,
            show_subtitles: other.show_subtitles,
            sfx_volume: other.sfx_volume,
            music_volume: other.music_volume,
            speech_volume: other.speech_volume,
            linked_variables: other.linked_variables.clone(),
            last_save_id: -1,
            id,
            label: format!("Profile {}", id + 1),
        }
    }

    /// 设置显示名
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }
}

impl Default for ProfileData {
    fn default() -> Self {
        Self::new(0)
    }
}

/// 存档数据
///
/// 包含恢复全部会话选项状态所需的信息。
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SaveData {
    /// 存档格式版本
    pub version: SaveVersion,
    /// 玩家档案
    pub profile: ProfileData,
    /// 各会话的选项状态快照
    pub conversations: HashMap<SessionId, OptionSnapshot>,
}

impl SaveData {
    /// 创建新的存档数据
    pub fn new(profile: ProfileData) -> Self {
        Self {
            version: SaveVersion::current(),
            profile,
            conversations: HashMap::new(),
        }
    }

    /// 记录一个会话的快照
    pub fn with_conversation(mut self, engine: &ConversationEngine) -> Self {
        self.conversations
            .insert(engine.id(), OptionSnapshot::capture(engine));
        self
    }

    /// 把对应会话的快照写回引擎
    ///
    /// 存档里没有该会话时保持现状（新加入的会话用默认配置）。
    pub fn restore_conversation(&self, engine: &mut ConversationEngine) -> Result<(), SaveError> {
        match self.conversations.get(&engine.id()) {
            Some(snapshot) => snapshot.apply(engine),
            None => Ok(()),
        }
    }

    /// 序列化为 JSON 字符串
    pub fn to_json(&self) -> Result<String, SaveError> {
        serde_json::to_string_pretty(self)
            .map_err(|e| SaveError::SerializationFailed(e.to_string()))
    }

    /// 从 JSON 字符串反序列化
    pub fn from_json(json: &str) -> Result<Self, SaveError> {
        let data: SaveData = serde_json::from_str(json)
            .map_err(|e| SaveError::DeserializationFailed(e.to_string()))?;

        // 检查版本兼容性
        if !data.version.is_compatible() {
            return Err(SaveError::IncompatibleVersion {
                save_version: data.version.to_string(),
                current_version: SaveVersion::current().to_string(),
            });
        }

        Ok(data)
    }
}
