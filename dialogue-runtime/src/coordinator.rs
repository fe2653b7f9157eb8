//! # Coordinator 模块
//!
//! 管理全局唯一的"活跃会话"槽位。
//!
//! ## 设计原则
//!
//! - 不使用进程级单例，槽位是显式对象，由 Host 持有并按引用传入
//! - 后写者胜（last-writer-wins）：`acquire` 直接顶替前一个会话，
//!   `release` 无条件清空
//! - 全局状态由槽位占用情况**推导**，不单独存储，两者永远一致

use serde::{Deserialize, Serialize};

/// 会话标识符
///
/// 每个 [`ConversationEngine`](crate::ConversationEngine) 持有一个唯一 ID，
/// 协调器和任务队列都以此为键。由 Host 分配，保证唯一即可。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(pub u64);

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "session#{}", self.0)
    }
}

impl From<u64> for SessionId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

/// 全局对话状态
///
/// Host 据此决定输入模式：`AwaitingChoice` 时展示选项列表并采集选择，
/// `Normal` 时恢复常规输入。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameState {
    /// 常规状态，没有会话在等待选择
    Normal,
    /// 某个会话正在等待玩家选择
    AwaitingChoice,
}

/// 会话协调器
///
/// 系统范围内同一时刻最多一个会话可以持有"等待选择"状态。
/// 协调器就是这个唯一槽位的显式化。
///
/// # 状态转换
///
/// ```text
/// Normal         -> acquire(id)  -> AwaitingChoice (顶替任何前任)
/// AwaitingChoice -> release(id)  -> Normal (无条件清空)
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionCoordinator {
    /// 当前持有槽位的会话
    active: Option<SessionId>,
}

impl SessionCoordinator {
    /// 创建空闲的协调器
    pub fn new() -> Self {
        Self { active: None }
    }

    /// 让指定会话占据槽位
    ///
    /// 后写者胜：前一个持有者（如果有且不同）被直接顶替，
    /// 其未决的延时任务**不会**被取消，由任务自身的守卫判定失效。
    ///
    /// # 返回
    ///
    /// 被顶替的会话 ID（如果有）。
    pub fn acquire(&mut self, id: SessionId) -> Option<SessionId> {
        let evicted = match self.active {
            Some(prev) if prev != id => Some(prev),
            _ => None,
        };
        if let Some(prev) = evicted {
            tracing::debug!(superseded = %prev, by = %id, "活跃会话被顶替");
        }
        self.active = Some(id);
        evicted
    }

    /// 释放槽位
    ///
    /// 无条件清空：即使当前持有者不是 `id` 也会清空（与原始行为一致），
    /// 此时记录一条 debug 诊断。
    pub fn release(&mut self, id: SessionId) {
        if let Some(prev) = self.active {
            if prev != id {
                tracing::debug!(holder = %prev, released_by = %id, "释放了他人持有的槽位");
            }
        }
        self.active = None;
    }

    /// 当前持有槽位的会话
    pub fn current(&self) -> Option<SessionId> {
        self.active
    }

    /// 指定会话是否为当前活跃会话
    pub fn is_active(&self, id: SessionId) -> bool {
        self.active == Some(id)
    }

    /// 当前全局状态（由槽位占用推导）
    pub fn state(&self) -> GameState {
        if self.active.is_some() {
            GameState::AwaitingChoice
        } else {
            GameState::Normal
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_acquire_release() {
        let mut coord = SessionCoordinator::new();
        assert_eq!(coord.state(), GameState::Normal);
        assert_eq!(coord.current(), None);

        let evicted = coord.acquire(SessionId(1));
        assert_eq!(evicted, None);
        assert!(coord.is_active(SessionId(1)));
        assert_eq!(coord.state(), GameState::AwaitingChoice);

        coord.release(SessionId(1));
        assert_eq!(coord.current(), None);
        assert_eq!(coord.state(), GameState::Normal);
    }

    #[test]
    fn test_acquire_supersedes() {
        let mut coord = SessionCoordinator::new();
        coord.acquire(SessionId(1));

        // 后写者胜
        let evicted = coord.acquire(SessionId(2));
        assert_eq!(evicted, Some(SessionId(1)));
        assert!(!coord.is_active(SessionId(1)));
        assert!(coord.is_active(SessionId(2)));
    }

    #[test]
    fn test_release_is_unconditional() {
        let mut coord = SessionCoordinator::new();
        coord.acquire(SessionId(2));

        // 非持有者释放同样清空槽位
        coord.release(SessionId(1));
        assert_eq!(coord.current(), None);
        assert_eq!(coord.state(), GameState::Normal);
    }

    #[test]
    fn test_reacquire_same_session() {
        let mut coord = SessionCoordinator::new();
        coord.acquire(SessionId(1));
        // 同一会话重复 acquire 不算顶替
        assert_eq!(coord.acquire(SessionId(1)), None);
    }

    #[test]
    fn test_coordinator_serialization() {
        let mut coord = SessionCoordinator::new();
        coord.acquire(SessionId(7));

        let json = serde_json::to_string(&coord).unwrap();
        let loaded: SessionCoordinator = serde_json::from_str(&json).unwrap();
        assert_eq!(coord, loaded);
    }
}
