// ==========================================
// 施工材料预测系统 - 提前期解析引擎
// ==========================================
// 职责: 从四个来源中选出 (材料, 供应商, 作业单元) 的有效提前期
// 规则: 覆写 > 供应商 > 材料新字段 > 材料旧字段 > 0，首个可解析者胜出
// 红线: 结果恒为非负整数；不可解析的候选顺延到下一个，不报错
// ==========================================

use crate::domain::material::{Material, Vendor};
use crate::domain::numeric::RawNumber;
use crate::domain::types::LeadTimeSource;
use crate::domain::work_unit::ConsumptionLink;

// ==========================================
// LeadTimeCandidates - 按优先级排列的候选
// ==========================================
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LeadTimeCandidates {
    pub override_days: Option<RawNumber>,
    pub vendor_days: Option<RawNumber>,
    pub material_default_days: Option<RawNumber>,
    pub material_legacy_days: Option<RawNumber>,
}

impl LeadTimeCandidates {
    /// 从消耗关联、指定供应商、材料主数据收集候选
    pub fn collect(link: &ConsumptionLink, vendor: Option<&Vendor>, material: &Material) -> Self {
        Self {
            override_days: link.lead_time_days_override.clone(),
            vendor_days: vendor.and_then(|v| v.effective_lead_time().cloned()),
            material_default_days: material.default_lead_time_days.clone(),
            material_legacy_days: material.lead_time_days.clone(),
        }
    }

    /// 优先级链（顺序即优先级）
    fn chain(&self) -> [(LeadTimeSource, Option<&RawNumber>); 4] {
        [
            (LeadTimeSource::Override, self.override_days.as_ref()),
            (LeadTimeSource::Vendor, self.vendor_days.as_ref()),
            (LeadTimeSource::MaterialDefault, self.material_default_days.as_ref()),
            (LeadTimeSource::MaterialLegacy, self.material_legacy_days.as_ref()),
        ]
    }

    /// 存在但无法解析的候选（用于诊断）
    pub fn unparseable_sources(&self) -> Vec<LeadTimeSource> {
        self.chain()
            .into_iter()
            .filter_map(|(source, raw)| match raw {
                Some(v) if v.as_days().is_none() => Some(source),
                _ => None,
            })
            .collect()
    }
}

// ==========================================
// LeadTimeResolver - 提前期解析器
// ==========================================
pub struct LeadTimeResolver {
    // 无状态
}

impl LeadTimeResolver {
    pub fn new() -> Self {
        Self {}
    }

    /// 解析有效提前期（天）
    pub fn resolve(&self, candidates: &LeadTimeCandidates) -> i64 {
        self.resolve_with_source(candidates).0
    }

    /// 解析有效提前期并返回胜出来源
    ///
    /// 显式 fold: 已命中则保持，否则尝试当前候选
    pub fn resolve_with_source(&self, candidates: &LeadTimeCandidates) -> (i64, LeadTimeSource) {
        candidates
            .chain()
            .into_iter()
            .fold(None::<(i64, LeadTimeSource)>, |found, (source, raw)| {
                found.or_else(|| raw.and_then(RawNumber::as_days).map(|days| (days, source)))
            })
            .unwrap_or((0, LeadTimeSource::Fallback))
    }
}

impl Default for LeadTimeResolver {
    fn default() -> Self {
        Self::new()
    }
}

/// 便捷函数: 四个可选候选 -> 有效提前期
pub fn resolve_effective_lead_time(
    override_days: Option<RawNumber>,
    vendor_days: Option<RawNumber>,
    material_default_days: Option<RawNumber>,
    material_legacy_days: Option<RawNumber>,
) -> i64 {
    LeadTimeResolver::new().resolve(&LeadTimeCandidates {
        override_days,
        vendor_days,
        material_default_days,
        material_legacy_days,
    })
}
