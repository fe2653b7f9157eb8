//! # Variable 模块
//!
//! 游戏变量的值模型与复制规则。
//!
//! ## 设计原则
//!
//! - 值是带标签的联合类型（[`VarValue`]），复制时按"标签对"查显式
//!   转换规则，不做运行时鸭子类型探测
//! - 转换规则刻意保守：Int 与 Bool 互通（0/非 0），Int 可无损放宽到
//!   Float，其余只允许同类复制，不兼容即报错
//! - 变量分 Global / Local 两个作用域，复制可以跨作用域

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::error::VariableError;

/// 变量值
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum VarValue {
    /// 整数
    Int(i64),
    /// 浮点数
    Float(f64),
    /// 字符串
    String(String),
    /// 布尔值
    Bool(bool),
}

impl VarValue {
    /// 值的类型名（用于诊断信息）
    pub fn kind(&self) -> &'static str {
        match self {
            VarValue::Int(_) => "Int",
            VarValue::Float(_) => "Float",
            VarValue::String(_) => "String",
            VarValue::Bool(_) => "Bool",
        }
    }

    /// 按目标值的标签转换本值
    ///
    /// 显式规则表（源标签 → 目标标签）：
    ///
    /// ```text
    /// Int    -> Int / Float / Bool
    /// Bool   -> Bool / Int
    /// Float  -> Float
    /// String -> String
    /// ```
    ///
    /// 表外的组合返回 [`VariableError::Incompatible`]。
    pub fn convert_like(&self, target: &VarValue) -> Result<VarValue, VariableError> {
        let converted = match (self, target) {
            (VarValue::Int(v), VarValue::Int(_)) => Some(VarValue::Int(*v)),
            (VarValue::Int(v), VarValue::Float(_)) => Some(VarValue::Float(*v as f64)),
            (VarValue::Int(v), VarValue::Bool(_)) => Some(VarValue::Bool(*v != 0)),
            (VarValue::Bool(v), VarValue::Bool(_)) => Some(VarValue::Bool(*v)),
            (VarValue::Bool(v), VarValue::Int(_)) => Some(VarValue::Int(i64::from(*v))),
            (VarValue::Float(v), VarValue::Float(_)) => Some(VarValue::Float(*v)),
            (VarValue::String(v), VarValue::String(_)) => Some(VarValue::String(v.clone())),
            _ => None,
        };
        converted.ok_or_else(|| VariableError::Incompatible {
            from: self.kind().to_string(),
            to: target.kind().to_string(),
        })
    }
}

/// 变量作用域
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VariableScope {
    /// 全局变量，跨场景存在
    Global,
    /// 局部变量，只属于当前场景
    Local,
}

impl std::fmt::Display for VariableScope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            VariableScope::Global => write!(f, "Global"),
            VariableScope::Local => write!(f, "Local"),
        }
    }
}

/// 单个变量
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Variable {
    /// 变量标识
    pub id: i32,
    /// 编辑器里的显示名
    pub label: String,
    /// 当前值
    pub value: VarValue,
}

impl Variable {
    /// 创建变量
    pub fn new(id: i32, label: impl Into<String>, value: VarValue) -> Self {
        Self {
            id,
            label: label.into(),
            value,
        }
    }
}

/// 变量存储
///
/// Global / Local 两张表，复制操作在任意两个 (作用域, 变量) 间进行。
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VariableStore {
    globals: HashMap<i32, Variable>,
    locals: HashMap<i32, Variable>,
}

impl VariableStore {
    /// 创建空存储
    pub fn new() -> Self {
        Self::default()
    }

    fn table(&self, scope: VariableScope) -> &HashMap<i32, Variable> {
        match scope {
            VariableScope::Global => &self.globals,
            VariableScope::Local => &self.locals,
        }
    }

    fn table_mut(&mut self, scope: VariableScope) -> &mut HashMap<i32, Variable> {
        match scope {
            VariableScope::Global => &mut self.globals,
            VariableScope::Local => &mut self.locals,
        }
    }

    /// 登记变量（同 ID 覆盖）
    pub fn insert(&mut self, scope: VariableScope, var: Variable) {
        self.table_mut(scope).insert(var.id, var);
    }

    /// 查询变量
    pub fn get(&self, scope: VariableScope, id: i32) -> Option<&Variable> {
        self.table(scope).get(&id)
    }

    /// 把一个变量的值复制到另一个变量
    ///
    /// 目标变量的标签决定转换方式（见 [`VarValue::convert_like`]）。
    /// 源或目标不存在、标签组合无转换规则时返回错误；调用方按可恢复
    /// 诊断处理即可，存储不会被部分修改。
    pub fn copy(
        &mut self,
        from: (VariableScope, i32),
        to: (VariableScope, i32),
    ) -> Result<(), VariableError> {
        let source = self
            .get(from.0, from.1)
            .ok_or_else(|| VariableError::NotFound {
                id: from.1,
                scope: from.0.to_string(),
            })?;
        let target = self.get(to.0, to.1).ok_or_else(|| VariableError::NotFound {
            id: to.1,
            scope: to.0.to_string(),
        })?;

        let converted = source.value.convert_like(&target.value)?;

        // 两次查找都成功后才落笔
        if let Some(target) = self.table_mut(to.0).get_mut(&to.1) {
            target.value = converted;
        }
        Ok(())
    }
}
