//! # Engine 模块
//!
//! 会话引擎：一个 [`ConversationEngine`] 对应一段配置好的对话，
//! 管理选项可见性、限时自动选择，并与协调器/任务队列配合完成
//! 全局状态转换。
//!
//! ## 执行模型
//!
//! ```text
//! Idle ──begin(≥1 个可用选项)──► AwaitingChoice
//! AwaitingChoice ──select_slot / 超时 / 他处 begin 顶替──► Idle
//! ```
//!
//! 引擎不读取真实时钟，也不自己执行延时：`begin` / `select_slot`
//! 只向 [`TaskQueue`] 挂任务，Host 在合适的时刻 `drain_due` 并把
//! 任务交还给 [`handle_task`](ConversationEngine::handle_task)。
//!
//! ## 错误策略
//!
//! 所有操作都立即返回且从不抛错：配置不一致（默认选项越界、选项
//! 未绑定处理器）记录可恢复诊断并回退到安全的空闲状态。

use crate::coordinator::{SessionCoordinator, SessionId};
use crate::locale::TranslationSource;
use crate::option::DialogueOption;
use crate::scheduler::{DeferredTask, TaskQueue};

/// 选项结算延时（秒）
///
/// 槽位被选中后，处理器不立即运行，而是在这个固定短延时后结算，
/// 给 Host 留出收起选项 UI 的时间。
pub const OPTION_RESOLVE_DELAY: f64 = 0.3;

/// 会话引擎
///
/// # 使用示例
///
/// ```ignore
/// let mut engine = ConversationEngine::new(SessionId(1))
///     .with_options(options)
///     .timed(5.0, 0);
///
/// engine.begin(now, &mut coordinator, &mut queue);
///
/// // 玩家选择了第 0 个可见槽位：
/// engine.select_slot(0, now, &mut coordinator, &mut queue);
///
/// // 每帧：
/// for task in queue.drain_due(now) {
///     engine.handle_task(task, &mut coordinator);
/// }
/// ```
pub struct ConversationEngine {
    /// 会话标识
    id: SessionId,
    /// 选项列表（插入顺序即绝对索引）
    options: Vec<DialogueOption>,
    /// 是否限时
    is_timed: bool,
    /// 超时时长（秒）
    timeout_seconds: f64,
    /// 超时后自动选择的**绝对索引**
    default_option: usize,
    /// 限时会话的启动时刻（begin 时记录）
    start_time: f64,
    /// 重入 begin 时是否先取消本会话的未决任务（硬化开关，默认关闭）
    cancel_pending_on_begin: bool,
}

impl ConversationEngine {
    /// 创建空会话（无选项、不限时）
    pub fn new(id: SessionId) -> Self {
        Self {
            id,
            options: Vec::new(),
            is_timed: false,
            timeout_seconds: 5.0,
            default_option: 0,
            start_time: 0.0,
            cancel_pending_on_begin: false,
        }
    }

    /// 设置全部选项（覆盖旧值）
    pub fn with_options(mut self, options: Vec<DialogueOption>) -> Self {
        self.options = options;
        self
    }

    /// 追加一个选项
    pub fn add_option(&mut self, option: DialogueOption) {
        self.options.push(option);
    }

    /// 设为限时会话
    ///
    /// `default_option` 是超时后自动选择的绝对索引。
    pub fn timed(mut self, timeout_seconds: f64, default_option: usize) -> Self {
        self.is_timed = true;
        self.timeout_seconds = timeout_seconds;
        self.default_option = default_option;
        self
    }

    /// 开启"重入 begin 取消旧任务"硬化
    ///
    /// 默认关闭：与原始行为一致，重入的 `begin` 会叠加新的超时任务，
    /// 旧任务依赖触发时的活跃性守卫自行失效。开启后，`begin` 会先
    /// 取消本会话所有未决任务，观察到的超时时序因此改变。
    pub fn cancel_pending_on_begin(mut self, cancel: bool) -> Self {
        self.cancel_pending_on_begin = cancel;
        self
    }

    /// 会话标识
    pub fn id(&self) -> SessionId {
        self.id
    }

    /// 选项列表
    pub fn options(&self) -> &[DialogueOption] {
        &self.options
    }

    /// 是否限时
    pub fn is_timed(&self) -> bool {
        self.is_timed
    }

    // ── 生命周期 ──

    /// 进入（或重入）会话
    ///
    /// - 存在至少一个可用选项：占据全局槽位，状态变为 AwaitingChoice
    /// - 没有可用选项：不是错误，视为"没话可说"的会话，直接清空槽位
    /// - 限时会话：记录启动时刻并挂超时任务——**无论是否有可用选项**
    ///   （保留的原始行为）
    pub fn begin(
        &mut self,
        now: f64,
        coordinator: &mut SessionCoordinator,
        queue: &mut TaskQueue,
    ) {
        if self.cancel_pending_on_begin {
            let cancelled = queue.cancel_session(self.id);
            if cancelled > 0 {
                tracing::debug!(session = %self.id, cancelled, "重入 begin，取消未决任务");
            }
        }

        if self.options.iter().any(|o| o.is_enabled()) {
            coordinator.acquire(self.id);
        } else {
            coordinator.release(self.id);
        }

        if self.is_timed {
            self.start_time = now;
            queue.schedule(now, self.timeout_seconds, DeferredTask::Timeout {
                session: self.id,
            });
        }
    }

    /// 显式退出会话，释放全局槽位
    pub fn end(&mut self, coordinator: &mut SessionCoordinator) {
        coordinator.release(self.id);
    }

    /// 玩家选择了第 `slot` 个**可见**槽位
    ///
    /// 槽位号只对可用选项计数；越界槽位回退到绝对索引 0（记录在案
    /// 的兼容行为，不视为错误）。槽位被选中的瞬间会话即视为已消费
    /// （立即释放槽位），处理器在 [`OPTION_RESOLVE_DELAY`] 后结算。
    pub fn select_slot(
        &mut self,
        slot: usize,
        now: f64,
        coordinator: &mut SessionCoordinator,
        queue: &mut TaskQueue,
    ) {
        let index = self.slot_to_index(slot);
        coordinator.release(self.id);
        queue.schedule(now, OPTION_RESOLVE_DELAY, DeferredTask::ResolveOption {
            session: self.id,
            index,
        });
    }

    /// 执行一个到期的延时任务
    ///
    /// Host 从队列 `drain_due` 后，按 `task.session()` 分发到对应引擎。
    pub fn handle_task(&mut self, task: DeferredTask, coordinator: &mut SessionCoordinator) {
        if task.session() != self.id {
            tracing::warn!(session = %self.id, task = ?task, "任务分发到了错误的会话");
            return;
        }
        match task {
            DeferredTask::Timeout { .. } => self.fire_timeout(coordinator),
            DeferredTask::ResolveOption { index, .. } => self.resolve_option(index, coordinator),
        }
    }

    /// 限时会话的剩余时间占比
    ///
    /// `begin` 后从 1.0 线性递减，超时时刻为 0.0。**不截断**：超时
    /// 已触发但尚未清理时查询会得到负值。
    pub fn remaining_fraction(&self, now: f64) -> f64 {
        (self.start_time + self.timeout_seconds - now) / self.timeout_seconds
    }

    // ── 超时与结算 ──

    /// 超时任务到期
    ///
    /// 守卫链：会话必须仍是活跃会话，且默认选项索引在范围内、对应
    /// 选项可用——任一不满足即整体 no-op（槽位也不释放）。
    fn fire_timeout(&mut self, coordinator: &mut SessionCoordinator) {
        if !coordinator.is_active(self.id) {
            tracing::debug!(session = %self.id, "超时到期但会话已不再活跃，忽略");
            return;
        }
        let default_enabled = self.options.get(self.default_option).map(|o| o.is_enabled());
        match default_enabled {
            Some(true) => {
                coordinator.release(self.id);
                self.resolve_option(self.default_option, coordinator);
            }
            Some(false) => {
                tracing::debug!(
                    session = %self.id,
                    index = self.default_option,
                    "默认选项当前不可用，超时不生效"
                );
            }
            None => {
                tracing::warn!(
                    session = %self.id,
                    index = self.default_option,
                    count = self.options.len(),
                    "默认选项索引越界，超时不生效"
                );
            }
        }
    }

    /// 结算指定绝对索引的选项
    ///
    /// 按 `returns_to_parent` 设置或清除处理器的归属回引后调用处理器。
    /// 该路径没有活跃性守卫：已挂出的结算任务总会运行到这里。
    fn resolve_option(&mut self, index: usize, coordinator: &mut SessionCoordinator) {
        let id = self.id;
        let Some(option) = self.options.get_mut(index) else {
            tracing::warn!(session = %id, index, "结算目标越界，忽略");
            return;
        };

        let owner = if option.is_returning() { Some(id) } else { None };

        match option.handler_mut() {
            Some(handler) => {
                handler.set_owner(owner);
                handler.invoke();
            }
            None => {
                // 配置不一致：选项没有绑定处理器。回退到 Normal，
                // 避免系统卡在等待输入的状态。
                tracing::warn!(session = %id, index, "选项未绑定交互处理器，强制回到 Normal");
                coordinator.release(id);
            }
        }
    }

    // ── 选项查询与修改 ──

    /// 槽位号 -> 绝对索引
    ///
    /// 正向扫描，对可用选项计数，数到第 `slot + 1` 个即命中；
    /// 槽位越界时回退到绝对索引 0。
    fn slot_to_index(&self, slot: usize) -> usize {
        let mut found = 0;
        for (i, option) in self.options.iter().enumerate() {
            if option.is_enabled() {
                found += 1;
                if found == slot + 1 {
                    return i;
                }
            }
        }
        0
    }

    /// 当前可用选项数量（即可见槽位数）
    pub fn enabled_count(&self) -> usize {
        self.options.iter().filter(|o| o.is_enabled()).count()
    }

    /// 第 `slot` 个可见槽位的展示文本
    ///
    /// 当前语言非原文且该行有翻译行号时查表，查不到回退原文。
    /// 会话没有任何选项时返回 None。
    pub fn slot_label(&self, slot: usize, locale: &dyn TranslationSource) -> Option<String> {
        let option = self.options.get(self.slot_to_index(slot))?;
        let language = locale.current_language();
        if language > 0 {
            if let Some(line_id) = option.line_id() {
                if let Some(text) = locale.translation(line_id, language) {
                    return Some(text);
                }
            }
        }
        Some(option.label().to_string())
    }

    /// 第 `slot` 个可见槽位的图标句柄
    pub fn slot_icon(&self, slot: usize) -> Option<&str> {
        self.options.get(self.slot_to_index(slot))?.icon()
    }

    /// 修改单个选项的可见性，遵守锁不变式
    ///
    /// 索引越界记录诊断后忽略。
    pub fn set_option(&mut self, index: usize, enabled: bool, locked: bool) {
        match self.options.get_mut(index) {
            Some(option) => option.set_visibility(enabled, locked),
            None => {
                tracing::warn!(
                    session = %self.id,
                    index,
                    count = self.options.len(),
                    "选项索引越界，忽略修改"
                );
            }
        }
    }

    // ── 批量状态（供存档系统使用）──

    /// 全部选项的 enabled 标志，按绝对索引排列
    pub fn option_states(&self) -> Vec<bool> {
        self.options.iter().map(|o| o.is_enabled()).collect()
    }

    /// 全部选项的 locked 标志，按绝对索引排列
    pub fn option_locks(&self) -> Vec<bool> {
        self.options.iter().map(|o| o.is_locked()).collect()
    }

    /// 批量恢复 enabled 标志（读档路径，绕过锁）
    ///
    /// 按位置配对，长度不一致时忽略多余部分。
    pub fn set_option_states(&mut self, states: &[bool]) {
        for (option, &enabled) in self.options.iter_mut().zip(states) {
            option.restore_enabled(enabled);
        }
    }

    /// 批量恢复 locked 标志（读档路径）
    pub fn set_option_locks(&mut self, locks: &[bool]) {
        for (option, &locked) in self.options.iter_mut().zip(locks) {
            option.restore_locked(locked);
        }
    }
}
