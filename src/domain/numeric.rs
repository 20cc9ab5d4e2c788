// ==========================================
// 施工材料预测系统 - 宽松数值输入
// ==========================================
// 职责: 外部快照中的数量/日期字段统一宽松解析
// 红线: 无法解析的数值按零值/None 处理，永不报错
// ==========================================

use chrono::{Days, NaiveDate};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// 天数上限（约 100 年）；提前期与各类窗口都不超过此值
pub const MAX_DAYS: i64 = 36_500;

// ==========================================
// RawNumber - 未经校验的数值
// ==========================================
// 用途: 提前期等需要"解析失败则顺延"语义的字段
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawNumber {
    Int(i64),
    Float(f64),
    Text(String),
}

impl RawNumber {
    /// 转为有限浮点数；文本先 trim 再解析
    pub fn as_f64(&self) -> Option<f64> {
        let v = match self {
            RawNumber::Int(i) => *i as f64,
            RawNumber::Float(f) => *f,
            RawNumber::Text(s) => s.trim().parse::<f64>().ok()?,
        };
        v.is_finite().then_some(v)
    }

    /// 转为整数天数（向零截断，限制在 [0, MAX_DAYS]）
    pub fn as_days(&self) -> Option<i64> {
        self.as_f64()
            .map(|v| v.trunc().clamp(0.0, MAX_DAYS as f64) as i64)
    }
}

impl From<i64> for RawNumber {
    fn from(v: i64) -> Self {
        RawNumber::Int(v)
    }
}

impl From<&str> for RawNumber {
    fn from(v: &str) -> Self {
        RawNumber::Text(v.to_string())
    }
}

/// 任意 JSON 值 -> 有限浮点数
pub fn value_to_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64().filter(|v| v.is_finite()),
        Value::String(s) => s.trim().parse::<f64>().ok().filter(|v| v.is_finite()),
        Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
        _ => None,
    }
}

/// 解析 ISO 日期（允许带时间后缀，如 `2026-03-10T08:00:00`）
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let trimmed = raw.trim();
    let date_part = trimmed.get(..10).unwrap_or(trimmed);
    NaiveDate::parse_from_str(date_part, "%Y-%m-%d").ok()
}

/// 日期平移（越界返回 None）
pub fn shift_days(date: NaiveDate, days: i64) -> Option<NaiveDate> {
    if days >= 0 {
        date.checked_add_days(Days::new(days.unsigned_abs()))
    } else {
        date.checked_sub_days(Days::new(days.unsigned_abs()))
    }
}

/// 四舍五入到指定小数位
pub fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round() / factor
}

// ==========================================
// serde 宽松反序列化辅助
// ==========================================

/// 数量字段: 无法解析 -> 0.0
pub fn lenient_f64<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(value_to_f64(&value).unwrap_or(0.0))
}

/// 可空数量字段: 无法解析 -> None
pub fn lenient_opt_f64<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(value_to_f64(&value))
}

/// 提前期候选: null/对象/数组 -> None，其余保留原值交给解析链判定
pub fn lenient_raw_number<'de, D>(deserializer: D) -> Result<Option<RawNumber>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::Number(n) => match n.as_i64() {
            Some(i) => Some(RawNumber::Int(i)),
            None => n.as_f64().map(RawNumber::Float),
        },
        Value::String(s) => Some(RawNumber::Text(s)),
        _ => None,
    })
}

/// 日期字段: 无法解析 -> None
pub fn lenient_date<'de, D>(deserializer: D) -> Result<Option<NaiveDate>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::String(s) => parse_date(&s),
        _ => None,
    })
}

/// serde 默认值: is_active = true
pub(crate) fn default_true() -> bool {
    true
}
