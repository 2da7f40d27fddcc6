// crates/mf_config/src/boundary.rs

//! 边界条件记录与边界表
//!
//! 输入 JSON 中的边界条件是一个记录列表，每条记录形如
//! `{"face": "x_min", "type": "inflow", "values": {"u": 1.0, "v": 0.0, "w": 0.0}}`。
//! [`BoundaryTable::from_records`] 将列表解析为按规范面索引的类型化表：
//! - 六个规范面必须且只能出现一次
//! - `inflow` 必须给出 `u, v, w`
//! - `pressure_dirichlet` 必须给出 `p`
//! - 数值必须有限

use glam::DVec3;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::ConfigError;

// ============================================================
// 规范面
// ============================================================

/// 计算域的六个规范面
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum Face {
    /// x 下边界
    XMin = 0,
    /// x 上边界
    XMax = 1,
    /// y 下边界
    YMin = 2,
    /// y 上边界
    YMax = 3,
    /// z 下边界
    ZMin = 4,
    /// z 上边界
    ZMax = 5,
}

impl Face {
    /// 全部规范面，按表索引顺序
    pub const ALL: [Face; 6] = [
        Face::XMin,
        Face::XMax,
        Face::YMin,
        Face::YMax,
        Face::ZMin,
        Face::ZMax,
    ];

    /// 表索引
    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }

    /// 法向轴（0=x, 1=y, 2=z）
    #[inline]
    pub fn axis(self) -> usize {
        self.index() / 2
    }

    /// 是否为上边界
    #[inline]
    pub fn is_max(self) -> bool {
        self.index() % 2 == 1
    }

    /// 由轴与上下侧构造
    #[inline]
    pub fn from_axis(axis: usize, is_max: bool) -> Self {
        Self::ALL[axis * 2 + usize::from(is_max)]
    }

    /// JSON 中使用的名称
    pub fn name(self) -> &'static str {
        match self {
            Self::XMin => "x_min",
            Self::XMax => "x_max",
            Self::YMin => "y_min",
            Self::YMax => "y_max",
            Self::ZMin => "z_min",
            Self::ZMax => "z_max",
        }
    }
}

impl fmt::Display for Face {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ============================================================
// 边界类型
// ============================================================

/// 边界类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BoundaryKind {
    /// 无滑移壁面：法向与切向速度均为零
    NoSlip,
    /// 自由滑移（对称）：法向速度为零，切向零梯度
    FreeSlip,
    /// 速度入口
    Inflow,
    /// 零梯度出口
    Outflow,
    /// 压力给定
    PressureDirichlet,
}

impl BoundaryKind {
    /// 从 JSON 名称解析
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "no_slip" => Some(Self::NoSlip),
            "free_slip" => Some(Self::FreeSlip),
            "inflow" => Some(Self::Inflow),
            "outflow" => Some(Self::Outflow),
            "pressure_dirichlet" => Some(Self::PressureDirichlet),
            _ => None,
        }
    }

    /// JSON 名称
    pub fn name(self) -> &'static str {
        match self {
            Self::NoSlip => "no_slip",
            Self::FreeSlip => "free_slip",
            Self::Inflow => "inflow",
            Self::Outflow => "outflow",
            Self::PressureDirichlet => "pressure_dirichlet",
        }
    }
}

impl fmt::Display for BoundaryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ============================================================
// 原始记录
// ============================================================

/// 边界记录的数值部分
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct BoundaryValues {
    /// x 速度分量
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub u: Option<f64>,
    /// y 速度分量
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub v: Option<f64>,
    /// z 速度分量
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub w: Option<f64>,
    /// 压力
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub p: Option<f64>,
}

/// 输入中的一条边界记录
///
/// `face` 与 `type` 以字符串保存，以便校验时给出具体的错误键。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoundaryRecord {
    /// 规范面名称
    pub face: String,
    /// 边界类型名称
    #[serde(rename = "type")]
    pub kind: String,
    /// 数值
    #[serde(default)]
    pub values: BoundaryValues,
}

impl BoundaryRecord {
    fn new(face: Face, kind: BoundaryKind, values: BoundaryValues) -> Self {
        Self {
            face: face.name().to_string(),
            kind: kind.name().to_string(),
            values,
        }
    }

    /// 无滑移壁面
    pub fn no_slip(face: Face) -> Self {
        Self::new(face, BoundaryKind::NoSlip, BoundaryValues::default())
    }

    /// 自由滑移
    pub fn free_slip(face: Face) -> Self {
        Self::new(face, BoundaryKind::FreeSlip, BoundaryValues::default())
    }

    /// 速度入口
    pub fn inflow(face: Face, velocity: [f64; 3]) -> Self {
        Self::new(
            face,
            BoundaryKind::Inflow,
            BoundaryValues {
                u: Some(velocity[0]),
                v: Some(velocity[1]),
                w: Some(velocity[2]),
                p: None,
            },
        )
    }

    /// 零梯度出口
    pub fn outflow(face: Face) -> Self {
        Self::new(face, BoundaryKind::Outflow, BoundaryValues::default())
    }

    /// 压力给定
    pub fn pressure(face: Face, p: f64) -> Self {
        Self::new(
            face,
            BoundaryKind::PressureDirichlet,
            BoundaryValues {
                p: Some(p),
                ..BoundaryValues::default()
            },
        )
    }
}

// ============================================================
// 类型化边界条件
// ============================================================

/// 单个面上的类型化边界条件
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BoundaryCondition {
    /// 无滑移
    NoSlip,
    /// 自由滑移
    FreeSlip,
    /// 速度入口
    Inflow {
        /// 入口速度 (u, v, w)
        velocity: DVec3,
    },
    /// 零梯度出口
    Outflow,
    /// 压力给定
    PressureDirichlet {
        /// 边界压力
        p: f64,
    },
}

impl BoundaryCondition {
    /// 边界类型
    pub fn kind(&self) -> BoundaryKind {
        match self {
            Self::NoSlip => BoundaryKind::NoSlip,
            Self::FreeSlip => BoundaryKind::FreeSlip,
            Self::Inflow { .. } => BoundaryKind::Inflow,
            Self::Outflow => BoundaryKind::Outflow,
            Self::PressureDirichlet { .. } => BoundaryKind::PressureDirichlet,
        }
    }

    /// 法向速度是否由边界直接给定
    #[inline]
    pub fn is_velocity_dirichlet(&self) -> bool {
        matches!(self, Self::NoSlip | Self::FreeSlip | Self::Inflow { .. })
    }

    /// 压力是否给定
    #[inline]
    pub fn is_pressure_dirichlet(&self) -> bool {
        matches!(self, Self::PressureDirichlet { .. })
    }
}

/// 按规范面索引的边界表
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundaryTable {
    conditions: [BoundaryCondition; 6],
}

impl BoundaryTable {
    /// 所有面使用同一边界条件
    pub fn uniform(bc: BoundaryCondition) -> Self {
        Self { conditions: [bc; 6] }
    }

    /// 替换某个面
    pub fn with(mut self, face: Face, bc: BoundaryCondition) -> Self {
        self.conditions[face.index()] = bc;
        self
    }

    /// 从输入记录列表解析
    ///
    /// 遇到第一个违规即返回。
    pub fn from_records(records: &[BoundaryRecord]) -> Result<Self, ConfigError> {
        let mut slots: [Option<BoundaryCondition>; 6] = [None; 6];

        for (n, record) in records.iter().enumerate() {
            let key = format!("boundary_conditions[{}]", n);
            let face = parse_face(&record.face).ok_or_else(|| {
                ConfigError::invalid(format!("{}.face", key), &record.face, "未知的面")
            })?;
            let kind = BoundaryKind::parse(&record.kind).ok_or_else(|| {
                ConfigError::invalid(format!("{}.type", key), &record.kind, "未知的边界类型")
            })?;

            if slots[face.index()].is_some() {
                return Err(ConfigError::invalid(
                    format!("{}.face", key),
                    face,
                    "重复的面",
                ));
            }

            slots[face.index()] = Some(typed_condition(&key, kind, &record.values)?);
        }

        let mut conditions = [BoundaryCondition::NoSlip; 6];
        for face in Face::ALL {
            conditions[face.index()] = slots[face.index()]
                .ok_or_else(|| ConfigError::Missing(format!("boundary_conditions.{}", face)))?;
        }
        Ok(Self { conditions })
    }

    /// 导出为输入记录列表（按规范面顺序）
    pub fn to_records(&self) -> Vec<BoundaryRecord> {
        Face::ALL
            .iter()
            .map(|&face| match self.get(face) {
                BoundaryCondition::NoSlip => BoundaryRecord::no_slip(face),
                BoundaryCondition::FreeSlip => BoundaryRecord::free_slip(face),
                BoundaryCondition::Inflow { velocity } => {
                    BoundaryRecord::inflow(face, velocity.to_array())
                }
                BoundaryCondition::Outflow => BoundaryRecord::outflow(face),
                BoundaryCondition::PressureDirichlet { p } => BoundaryRecord::pressure(face, p),
            })
            .collect()
    }

    /// 获取某个面的边界条件
    #[inline]
    pub fn get(&self, face: Face) -> BoundaryCondition {
        self.conditions[face.index()]
    }

    /// 遍历 (面, 边界条件)
    pub fn iter(&self) -> impl Iterator<Item = (Face, BoundaryCondition)> + '_ {
        Face::ALL.iter().map(move |&f| (f, self.conditions[f.index()]))
    }

    /// 是否存在压力给定面
    pub fn has_pressure_dirichlet(&self) -> bool {
        self.conditions.iter().any(BoundaryCondition::is_pressure_dirichlet)
    }

    /// 是否存在出口面
    pub fn has_outflow(&self) -> bool {
        self.conditions
            .iter()
            .any(|bc| matches!(bc, BoundaryCondition::Outflow))
    }
}

fn parse_face(name: &str) -> Option<Face> {
    Face::ALL.iter().copied().find(|f| f.name() == name)
}

fn typed_condition(
    key: &str,
    kind: BoundaryKind,
    values: &BoundaryValues,
) -> Result<BoundaryCondition, ConfigError> {
    let finite = |name: &str, value: Option<f64>| -> Result<f64, ConfigError> {
        let v = value.ok_or_else(|| ConfigError::Missing(format!("{}.values.{}", key, name)))?;
        if !v.is_finite() {
            return Err(ConfigError::invalid(
                format!("{}.values.{}", key, name),
                v,
                "必须为有限值",
            ));
        }
        Ok(v)
    };

    Ok(match kind {
        BoundaryKind::NoSlip => BoundaryCondition::NoSlip,
        BoundaryKind::FreeSlip => BoundaryCondition::FreeSlip,
        BoundaryKind::Outflow => BoundaryCondition::Outflow,
        BoundaryKind::Inflow => BoundaryCondition::Inflow {
            velocity: DVec3::new(
                finite("u", values.u)?,
                finite("v", values.v)?,
                finite("w", values.w)?,
            ),
        },
        BoundaryKind::PressureDirichlet => BoundaryCondition::PressureDirichlet {
            p: finite("p", values.p)?,
        },
    })
}
