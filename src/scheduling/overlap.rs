//! 冲突检测（纯函数）
//!
//! 候选排期与某条已有排期冲突，当且仅当：已有排期状态为 active / future、
//! id 不同、日期闭区间相交、且至少共享一个 (location_id, location_type)。

use std::collections::BTreeSet;

use crate::model::MenuSchedule;

/// 返回全部冲突地点名称（去重、排序）；空表示无冲突
pub fn find_conflicts<'a>(
    candidate: &MenuSchedule,
    existing: impl IntoIterator<Item = &'a MenuSchedule>,
) -> Vec<String> {
    let range = candidate.range();
    let mut names = BTreeSet::new();
    for other in existing {
        if other.id == candidate.id || !other.status.is_live() || !range.overlaps(&other.range()) {
            continue;
        }
        for cov in &candidate.coverage {
            if other.coverage.iter().any(|o| o.same_location(cov)) {
                names.insert(cov.location_name.clone());
            }
        }
    }
    names.into_iter().collect()
}
