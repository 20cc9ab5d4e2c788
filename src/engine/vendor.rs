// ==========================================
// 施工材料预测系统 - 供应商推荐引擎
// ==========================================
// 规则:
// 1) 消耗关联指定了供应商 → 直接使用
// 2) 否则对该材料的活动供应商按字典序排序取第一:
//    (提前期 升序, 单价 升序[空值最后], 优先级档位 升序[空值最后], id 升序)
// 红线: 排序为字典序，不做加权评分
// ==========================================

use crate::domain::forecast::VendorOption;
use crate::domain::material::Vendor;
use std::cmp::Ordering;
use std::collections::BTreeMap;

// ==========================================
// VendorRecommender - 供应商推荐器
// ==========================================
pub struct VendorRecommender<'a> {
    by_id: BTreeMap<i64, &'a Vendor>,
    options_by_material: BTreeMap<i64, Vec<VendorOption>>,
}

impl<'a> VendorRecommender<'a> {
    /// 由供应商快照构建（预先按材料排好序）
    pub fn new(vendors: &'a [Vendor]) -> Self {
        let mut by_id = BTreeMap::new();
        let mut options_by_material: BTreeMap<i64, Vec<VendorOption>> = BTreeMap::new();

        for vendor in vendors {
            by_id.insert(vendor.id, vendor);
            if vendor.is_active {
                options_by_material
                    .entry(vendor.material_id)
                    .or_default()
                    .push(Self::option_of(vendor));
            }
        }

        for options in options_by_material.values_mut() {
            options.sort_by(Self::compare);
        }

        Self {
            by_id,
            options_by_material,
        }
    }

    /// 按 id 查找供应商（不区分是否活动）
    pub fn vendor(&self, vendor_id: i64) -> Option<&'a Vendor> {
        self.by_id.get(&vendor_id).copied()
    }

    /// 某材料的全部候选（已排序）
    pub fn options(&self, material_id: i64) -> &[VendorOption] {
        self.options_by_material
            .get(&material_id)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// 推荐供应商
    pub fn recommend(&self, explicit: Option<&Vendor>, material_id: i64) -> Option<VendorOption> {
        match explicit {
            Some(vendor) => Some(Self::option_of(vendor)),
            None => self.options(material_id).first().cloned(),
        }
    }

    /// 供应商 -> 候选项（提前期取项目级覆写优先）
    pub fn option_of(vendor: &Vendor) -> VendorOption {
        VendorOption {
            vendor_id: vendor.id,
            vendor_name: vendor.name.clone(),
            lead_time_days: vendor
                .effective_lead_time()
                .and_then(|v| v.as_days())
                .unwrap_or(0),
            unit_price: vendor.unit_price,
            priority: vendor
                .priority
                .as_ref()
                .map(|p| p.trim().to_string())
                .filter(|p| !p.is_empty()),
        }
    }

    /// 字典序比较
    fn compare(a: &VendorOption, b: &VendorOption) -> Ordering {
        a.lead_time_days
            .cmp(&b.lead_time_days)
            .then_with(|| nulls_last(a.unit_price, b.unit_price, |x, y| x.total_cmp(y)))
            .then_with(|| nulls_last(a.priority.as_ref(), b.priority.as_ref(), |x, y| x.cmp(y)))
            .then_with(|| a.vendor_id.cmp(&b.vendor_id))
    }
}

/// 空值排在最后的比较
fn nulls_last<T>(a: Option<T>, b: Option<T>, cmp: impl Fn(&T, &T) -> Ordering) -> Ordering {
    match (a, b) {
        (Some(x), Some(y)) => cmp(&x, &y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}
