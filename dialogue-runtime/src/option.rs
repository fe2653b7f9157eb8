//! # Option 模块
//!
//! 定义会话中的单条可选台词（[`DialogueOption`]）和选项交互处理器
//! 接缝（[`OptionHandler`]）。
//!
//! ## 设计说明
//!
//! - 选项的可见性受锁保护：一旦 `locked`，`enabled` 不再可变
//!   （[`DialogueOption::set_visibility`] 静默忽略后续修改）
//! - `icon` 是不透明句柄（通常为资源路径），运行时原样传出，由 Host 解释
//! - 处理器通过 trait 对象挂接，运行时只负责设置"归属会话"回引并调用

use serde::{Deserialize, Serialize};

use crate::coordinator::SessionId;

/// 选项交互处理器
///
/// 选项被选中（或超时走默认选项）后，运行时在延时结算阶段调用
/// [`invoke`](OptionHandler::invoke)。调用前运行时会按选项的
/// `returns_to_parent` 设置或清除"归属会话"回引：处理器执行完自身
/// 的交互后，Host 可读取 [`owner`](OptionHandler::owner) 决定是否
/// 重新进入原会话（嵌套菜单场景）。
pub trait OptionHandler {
    /// 执行选项绑定的交互
    fn invoke(&mut self);

    /// 设置归属会话回引
    fn set_owner(&mut self, owner: Option<SessionId>);

    /// 读取归属会话回引
    fn owner(&self) -> Option<SessionId>;
}

/// 闭包适配器
///
/// 把任意 `FnMut(Option<SessionId>)` 包装成 [`OptionHandler`]，
/// 调用时传入当前的归属回引。主要供 Host 和测试使用。
pub struct FnHandler<F: FnMut(Option<SessionId>)> {
    owner: Option<SessionId>,
    f: F,
}

impl<F: FnMut(Option<SessionId>)> FnHandler<F> {
    /// 包装闭包
    pub fn new(f: F) -> Self {
        Self { owner: None, f }
    }

    /// 包装并装箱，便于直接挂到选项上
    pub fn boxed(f: F) -> Box<Self> {
        Box::new(Self::new(f))
    }
}

impl<F: FnMut(Option<SessionId>)> OptionHandler for FnHandler<F> {
    fn invoke(&mut self) {
        (self.f)(self.owner);
    }

    fn set_owner(&mut self, owner: Option<SessionId>) {
        self.owner = owner;
    }

    fn owner(&self) -> Option<SessionId> {
        self.owner
    }
}

/// 选项的可持久化配置/状态
///
/// 与处理器分离：这一部分全部可序列化，处理器在运行时由 Host 挂接。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptionData {
    /// 台词原文
    pub label: String,
    /// 翻译行号（None 表示该行不参与翻译）
    pub line_id: Option<i32>,
    /// 不透明图标句柄，原样传出
    pub icon: Option<String>,
    /// 是否可选
    pub enabled: bool,
    /// 是否已锁定（锁定后 enabled 不可变）
    pub locked: bool,
    /// 结算后是否把本会话设为处理器的归属会话
    pub returns_to_parent: bool,
}

/// 会话中的单条可选台词
pub struct DialogueOption {
    data: OptionData,
    handler: Option<Box<dyn OptionHandler>>,
}

impl DialogueOption {
    /// 创建默认可选、未锁定的选项
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            data: OptionData {
                label: label.into(),
                line_id: None,
                icon: None,
                enabled: true,
                locked: false,
                returns_to_parent: false,
            },
            handler: None,
        }
    }

    /// 设置翻译行号
    pub fn with_line_id(mut self, line_id: i32) -> Self {
        self.data.line_id = Some(line_id);
        self
    }

    /// 设置图标句柄
    pub fn with_icon(mut self, icon: impl Into<String>) -> Self {
        self.data.icon = Some(icon.into());
        self
    }

    /// 设置初始可见性
    pub fn enabled(mut self, enabled: bool) -> Self {
        self.data.enabled = enabled;
        self
    }

    /// 设置初始锁定状态
    pub fn locked(mut self, locked: bool) -> Self {
        self.data.locked = locked;
        self
    }

    /// 结算后回到本会话（嵌套菜单）
    pub fn returns_to_parent(mut self, returns: bool) -> Self {
        self.data.returns_to_parent = returns;
        self
    }

    /// 挂接交互处理器
    pub fn with_handler(mut self, handler: Box<dyn OptionHandler>) -> Self {
        self.handler = Some(handler);
        self
    }

    /// 台词原文
    pub fn label(&self) -> &str {
        &self.data.label
    }

    /// 翻译行号
    pub fn line_id(&self) -> Option<i32> {
        self.data.line_id
    }

    /// 图标句柄
    pub fn icon(&self) -> Option<&str> {
        self.data.icon.as_deref()
    }

    /// 是否可选
    pub fn is_enabled(&self) -> bool {
        self.data.enabled
    }

    /// 是否已锁定
    pub fn is_locked(&self) -> bool {
        self.data.locked
    }

    /// 是否回到父会话
    pub fn is_returning(&self) -> bool {
        self.data.returns_to_parent
    }

    /// 修改可见性，遵守锁不变式
    ///
    /// 已锁定的选项静默忽略修改；未锁定时先应用 `enabled` 再应用
    /// `locked`，因此一次调用可以同时启用并锁定。
    pub fn set_visibility(&mut self, enabled: bool, locked: bool) {
        if self.data.locked {
            return;
        }
        self.data.enabled = enabled;
        self.data.locked = locked;
    }

    /// 直接覆写 enabled 标志，绕过锁（仅限读档恢复路径）
    pub(crate) fn restore_enabled(&mut self, enabled: bool) {
        self.data.enabled = enabled;
    }

    /// 直接覆写 locked 标志（仅限读档恢复路径）
    pub(crate) fn restore_locked(&mut self, locked: bool) {
        self.data.locked = locked;
    }

    /// 可持久化部分的引用
    pub fn data(&self) -> &OptionData {
        &self.data
    }

    /// 处理器的可变引用（结算路径使用）
    pub(crate) fn handler_mut(&mut self) -> Option<&mut (dyn OptionHandler + 'static)> {
        self.handler.as_deref_mut()
    }
}

impl From<OptionData> for DialogueOption {
    fn from(data: OptionData) -> Self {
        Self {
            data,
            handler: None,
        }
    }
}

impl std::fmt::Debug for DialogueOption {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DialogueOption")
            .field("data", &self.data)
            .field("handler", &self.handler.is_some())
            .finish()
    }
}
