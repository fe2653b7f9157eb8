//! # Scheduler 模块
//!
//! 协作式延时任务队列，替代原始实现中的协程延时。
//!
//! ## 设计原则
//!
//! - 单线程协作调度：任务只在 Host 调用 [`TaskQueue::drain_due`] 时触发
//! - 虚拟时间：队列从不读取真实时钟，`now` 全部由 Host 传入
//! - 任务以会话为键，支持按会话取消（可选的硬化路径）
//!
//! 已调度的任务默认**不会**因会话被顶替而取消，是否触发由任务
//! 执行方的守卫决定（见 [`ConversationEngine`](crate::ConversationEngine)）。

use serde::{Deserialize, Serialize};

use crate::coordinator::SessionId;

/// 任务标识符
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TaskId(pub u64);

/// 延时任务
///
/// 会话调度的两类延时工作，对应原始实现的两个协程。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum DeferredTask {
    /// 限时会话超时：到期后走默认选项路径
    Timeout { session: SessionId },

    /// 选项结算：短延时后调用选项绑定的交互处理器
    ///
    /// `index` 是选项在完整列表中的**绝对索引**（非槽位号）。
    ResolveOption { session: SessionId, index: usize },
}

impl DeferredTask {
    /// 任务所属的会话
    pub fn session(&self) -> SessionId {
        match self {
            DeferredTask::Timeout { session } => *session,
            DeferredTask::ResolveOption { session, .. } => *session,
        }
    }
}

/// 已入队的任务
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct ScheduledTask {
    id: TaskId,
    /// 到期时刻（虚拟时间，秒）
    due: f64,
    task: DeferredTask,
}

/// 延时任务队列
///
/// Host 的驱动方式：
///
/// ```ignore
/// let mut queue = TaskQueue::new();
/// engine.begin(now, &mut coord, &mut queue);
///
/// // 每帧：
/// for task in queue.drain_due(now) {
///     engine.handle_task(task, &mut coord);
/// }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TaskQueue {
    tasks: Vec<ScheduledTask>,
    next_id: u64,
}

impl TaskQueue {
    /// 创建空队列
    pub fn new() -> Self {
        Self {
            tasks: Vec::new(),
            next_id: 0,
        }
    }

    /// 调度一个任务，在 `now + delay` 时刻到期
    pub fn schedule(&mut self, now: f64, delay: f64, task: DeferredTask) -> TaskId {
        let id = TaskId(self.next_id);
        self.next_id += 1;
        self.tasks.push(ScheduledTask {
            id,
            due: now + delay,
            task,
        });
        id
    }

    /// 取出所有已到期的任务（`due <= now`）
    ///
    /// 按到期时刻排序；同一时刻到期的任务按入队顺序触发。
    pub fn drain_due(&mut self, now: f64) -> Vec<DeferredTask> {
        let mut due: Vec<ScheduledTask> = Vec::new();
        let mut i = 0;
        while i < self.tasks.len() {
            if self.tasks[i].due <= now {
                due.push(self.tasks.remove(i));
            } else {
                i += 1;
            }
        }
        // 入队顺序即 TaskId 顺序，作为稳定的次级排序键
        due.sort_by(|a, b| {
            a.due
                .partial_cmp(&b.due)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(a.id.0.cmp(&b.id.0))
        });
        due.into_iter().map(|t| t.task).collect()
    }

    /// 取消指定任务
    ///
    /// # 返回
    ///
    /// 任务是否仍在队列中（尚未到期触发）。
    pub fn cancel(&mut self, id: TaskId) -> bool {
        let before = self.tasks.len();
        self.tasks.retain(|t| t.id != id);
        self.tasks.len() < before
    }

    /// 取消指定会话的所有未决任务
    ///
    /// 供 `cancel_pending_on_begin` 硬化开关使用。
    ///
    /// # 返回
    ///
    /// 被取消的任务数量。
    pub fn cancel_session(&mut self, session: SessionId) -> usize {
        let before = self.tasks.len();
        self.tasks.retain(|t| t.task.session() != session);
        before - self.tasks.len()
    }

    /// 最近一个到期时刻（队列为空时返回 None）
    ///
    /// Host 可据此决定下次唤醒时间。
    pub fn next_due(&self) -> Option<f64> {
        self.tasks
            .iter()
            .map(|t| t.due)
            .min_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal))
    }

    /// 未决任务数量
    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    /// 队列是否为空
    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schedule_and_drain() {
        let mut queue = TaskQueue::new();
        queue.schedule(0.0, 5.0, DeferredTask::Timeout {
            session: SessionId(1),
        });

        // 未到期
        assert!(queue.drain_due(4.9).is_empty());
        assert_eq!(queue.len(), 1);

        // 到期
        let fired = queue.drain_due(5.0);
        assert_eq!(fired.len(), 1);
        assert_eq!(fired[0].session(), SessionId(1));
        assert!(queue.is_empty());
    }

    #[test]
    fn test_drain_order() {
        let mut queue = TaskQueue::new();
        queue.schedule(0.0, 5.0, DeferredTask::Timeout {
            session: SessionId(1),
        });
        queue.schedule(0.0, 0.3, DeferredTask::ResolveOption {
            session: SessionId(1),
            index: 2,
        });

        // 先到期的先触发
        let fired = queue.drain_due(10.0);
        assert_eq!(fired.len(), 2);
        assert!(matches!(fired[0], DeferredTask::ResolveOption { index: 2, .. }));
        assert!(matches!(fired[1], DeferredTask::Timeout { .. }));
    }

    #[test]
    fn test_same_due_keeps_insertion_order() {
        let mut queue = TaskQueue::new();
        for i in 0..3 {
            queue.schedule(0.0, 1.0, DeferredTask::ResolveOption {
                session: SessionId(9),
                index: i,
            });
        }

        let fired = queue.drain_due(1.0);
        let indices: Vec<usize> = fired
            .iter()
            .map(|t| match t {
                DeferredTask::ResolveOption { index, .. } => *index,
                _ => unreachable!(),
            })
            .collect();
        assert_eq!(indices, vec![0, 1, 2]);
    }

    #[test]
    fn test_cancel_by_id() {
        let mut queue = TaskQueue::new();
        let id = queue.schedule(0.0, 5.0, DeferredTask::Timeout {
            session: SessionId(1),
        });

        assert!(queue.cancel(id));
        assert!(!queue.cancel(id)); // 已不在队列中
        assert!(queue.drain_due(10.0).is_empty());
    }

    #[test]
    fn test_cancel_session() {
        let mut queue = TaskQueue::new();
        queue.schedule(0.0, 5.0, DeferredTask::Timeout {
            session: SessionId(1),
        });
        queue.schedule(0.0, 5.0, DeferredTask::Timeout {
            session: SessionId(2),
        });
        queue.schedule(0.0, 0.3, DeferredTask::ResolveOption {
            session: SessionId(1),
            index: 0,
        });

        assert_eq!(queue.cancel_session(SessionId(1)), 2);
        assert_eq!(queue.len(), 1);

        let fired = queue.drain_due(10.0);
        assert_eq!(fired[0].session(), SessionId(2));
    }

    #[test]
    fn test_next_due() {
        let mut queue = TaskQueue::new();
        assert_eq!(queue.next_due(), None);

        queue.schedule(0.0, 5.0, DeferredTask::Timeout {
            session: SessionId(1),
        });
        queue.schedule(0.0, 0.3, DeferredTask::ResolveOption {
            session: SessionId(1),
            index: 0,
        });
        assert_eq!(queue.next_due(), Some(0.3));
    }

    #[test]
    fn test_queue_serialization() {
        let mut queue = TaskQueue::new();
        queue.schedule(1.0, 4.0, DeferredTask::Timeout {
            session: SessionId(3),
        });

        let json = serde_json::to_string(&queue).unwrap();
        let mut loaded: TaskQueue = serde_json::from_str(&json).unwrap();

        // 恢复后的队列保留到期时刻
        assert_eq!(loaded.next_due(), Some(5.0));
        assert_eq!(loaded.drain_due(5.0).len(), 1);
    }
}
