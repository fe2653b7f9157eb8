//! # Dialogue Runtime
//!
//! 冒险游戏对话会话的核心运行时库。
//!
//! ## 架构概述
//!
//! `dialogue-runtime` 是纯逻辑核心，不依赖任何 IO 或渲染引擎，
//! 也不读取真实时钟。Host 持有三样东西并负责驱动：
//!
//! ```text
//! Host                                   Runtime
//!   │                                       │
//!   │── begin / select_slot(now) ─────────►│ 状态转换 + 挂延时任务
//!   │                                       │
//!   │── queue.drain_due(now) ──────────────►│
//!   │◄─ Vec<DeferredTask> ─────────────────│
//!   │── engine.handle_task(task) ──────────►│ 超时 / 选项结算
//! ```
//!
//! - [`SessionCoordinator`]：全局唯一的"活跃会话"槽位（显式对象，
//!   不是进程级单例）
//! - [`TaskQueue`]：协作式延时任务队列，虚拟时间由 Host 传入
//! - [`ConversationEngine`]：单个会话的选项、限时与结算逻辑
//!
//! ## 核心类型
//!
//! - [`ConversationEngine`]：会话引擎
//! - [`DialogueOption`] / [`OptionHandler`]：选项与交互处理器接缝
//! - [`SessionCoordinator`] / [`GameState`]：全局状态协调
//! - [`TaskQueue`] / [`DeferredTask`]：延时任务
//!
//! ## 模块结构
//!
//! - [`coordinator`]：活跃会话槽位
//! - [`scheduler`]：延时任务队列
//! - [`option`]：选项数据与处理器接缝
//! - [`session`]：会话引擎
//! - [`locale`]：翻译提供方接缝
//! - [`save`]：存档数据模型
//! - [`variable`]：变量值与复制规则
//! - [`error`]：错误类型定义

pub mod coordinator;
pub mod error;
pub mod locale;
pub mod option;
pub mod save;
pub mod scheduler;
pub mod session;
pub mod variable;

// 重导出核心类型
pub use coordinator::{GameState, SessionCoordinator, SessionId};
pub use error::{DialogueError, DialogueResult, SaveError, VariableError};
pub use locale::{TranslationSource, TranslationTable};
pub use option::{DialogueOption, FnHandler, OptionData, OptionHandler};
pub use save::{OptionSnapshot, ProfileData, SaveData, SaveVersion};
pub use scheduler::{DeferredTask, TaskId, TaskQueue};
pub use session::{ConversationEngine, OPTION_RESOLVE_DELAY};
pub use variable::{VarValue, Variable, VariableScope, VariableStore};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_public_api_accessible() {
        // 验证所有公共类型都可以正常组合使用
        let mut engine = ConversationEngine::new(SessionId(1))
            .with_options(vec![DialogueOption::new("你好")]);
        let mut coordinator = SessionCoordinator::new();
        let mut queue = TaskQueue::new();

        engine.begin(0.0, &mut coordinator, &mut queue);
        assert_eq!(coordinator.state(), GameState::AwaitingChoice);

        let _table = TranslationTable::new();
        let _store = VariableStore::new();
        let _save = SaveData::new(ProfileData::default());
    }
}
