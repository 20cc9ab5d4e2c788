// ==========================================
// 施工材料预测系统 - 领域类型定义
// ==========================================
// 红线: 状态是"等级制"，排序只看固定的严重度序号
// 序列化格式: SCREAMING_SNAKE_CASE (与上游看板一致)
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;

// ==========================================
// 订货状态 (Order Status)
// ==========================================
// 严重度: LATE < DUE < DUE_SOON < UPCOMING < UNKNOWN < OK
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    Late,     // 已错过下单日
    Due,      // 今日必须下单
    DueSoon,  // 临近下单日
    Upcoming, // 尚有余量
    Unknown,  // 缺少开工日期
    Ok,       // 库存充足
}

impl OrderStatus {
    /// 严重度序号（越小越紧急）
    pub fn severity_rank(self) -> u8 {
        match self {
            OrderStatus::Late => 0,
            OrderStatus::Due => 1,
            OrderStatus::DueSoon => 2,
            OrderStatus::Upcoming => 3,
            OrderStatus::Unknown => 4,
            OrderStatus::Ok => 5,
        }
    }

    /// 是否属于"本周需行动"的状态
    pub fn is_actionable(self) -> bool {
        matches!(self, OrderStatus::Late | OrderStatus::Due | OrderStatus::DueSoon)
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OrderStatus::Late => write!(f, "LATE"),
            OrderStatus::Due => write!(f, "DUE"),
            OrderStatus::DueSoon => write!(f, "DUE_SOON"),
            OrderStatus::Upcoming => write!(f, "UPCOMING"),
            OrderStatus::Unknown => write!(f, "UNKNOWN"),
            OrderStatus::Ok => write!(f, "OK"),
        }
    }
}

// ==========================================
// 到货状态 (Delivery Status)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DeliveryStatus {
    Available, // 已到货
    Pending,   // 在途，开工前可到
    Late,      // 晚于开工日
    Unknown,   // 缺少下单日/开工日
}

impl fmt::Display for DeliveryStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeliveryStatus::Available => write!(f, "AVAILABLE"),
            DeliveryStatus::Pending => write!(f, "PENDING"),
            DeliveryStatus::Late => write!(f, "LATE"),
            DeliveryStatus::Unknown => write!(f, "UNKNOWN"),
        }
    }
}

// ==========================================
// 提前期来源 (Lead Time Source)
// ==========================================
// 顺序即优先级: 覆写 > 供应商 > 材料新字段 > 材料旧字段 > 兜底 0
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LeadTimeSource {
    Override,
    Vendor,
    MaterialDefault,
    MaterialLegacy,
    Fallback,
}

impl fmt::Display for LeadTimeSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LeadTimeSource::Override => write!(f, "OVERRIDE"),
            LeadTimeSource::Vendor => write!(f, "VENDOR"),
            LeadTimeSource::MaterialDefault => write!(f, "MATERIAL_DEFAULT"),
            LeadTimeSource::MaterialLegacy => write!(f, "MATERIAL_LEGACY"),
            LeadTimeSource::Fallback => write!(f, "FALLBACK"),
        }
    }
}

// ==========================================
// 路段状态 (Stretch Status)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StretchStatus {
    NotStarted,
    InProgress,
    Delayed,
    Completed,
}

impl StretchStatus {
    /// 看板标签
    pub fn label(self) -> &'static str {
        match self {
            StretchStatus::NotStarted => "Not Started",
            StretchStatus::InProgress => "In Progress",
            StretchStatus::Delayed => "Delayed",
            StretchStatus::Completed => "Completed",
        }
    }
}

impl fmt::Display for StretchStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StretchStatus::NotStarted => write!(f, "NOT_STARTED"),
            StretchStatus::InProgress => write!(f, "IN_PROGRESS"),
            StretchStatus::Delayed => write!(f, "DELAYED"),
            StretchStatus::Completed => write!(f, "COMPLETED"),
        }
    }
}

// ==========================================
// 路段材料风险 (Material Risk)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MaterialRisk {
    Ok,
    DueSoon,
    Shortage,
}

impl MaterialRisk {
    pub fn label(self) -> &'static str {
        match self {
            MaterialRisk::Ok => "OK",
            MaterialRisk::DueSoon => "Due Soon",
            MaterialRisk::Shortage => "Shortage",
        }
    }
}

impl fmt::Display for MaterialRisk {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MaterialRisk::Ok => write!(f, "OK"),
            MaterialRisk::DueSoon => write!(f, "DUE_SOON"),
            MaterialRisk::Shortage => write!(f, "SHORTAGE"),
        }
    }
}

// ==========================================
// 告警类型与级别
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AlertKind {
    DeliveryLate,
    Shortage,
    Delay,
    MaterialRisk,
    Completed,
}

// 顺序: Critical < Warning < Info (排序时越小越靠前)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertSeverity {
    Critical,
    Warning,
    Info,
}

// ==========================================
// 诊断类型 (输入数据问题，不中断计算)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DiagnosticKind {
    MissingReferenceData, // 关联的材料/供应商不存在
    InvalidNumericInput,  // 数值无法解析，已按默认值处理
    IncompleteSchedule,   // 缺少计划开工日期
}

impl fmt::Display for DiagnosticKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DiagnosticKind::MissingReferenceData => write!(f, "MISSING_REFERENCE_DATA"),
            DiagnosticKind::InvalidNumericInput => write!(f, "INVALID_NUMERIC_INPUT"),
            DiagnosticKind::IncompleteSchedule => write!(f, "INCOMPLETE_SCHEDULE"),
        }
    }
}
