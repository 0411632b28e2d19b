// ==========================================
// GestiFiltres - 维保排程引擎
// ==========================================
// 职责: 根据当前服务小时数与维保历史, 计算下次维保
// 输入: 当前服务小时数 + 维保记录 (无序)
// 输出: MaintenanceProjection / NextRangeForRecord
// 红线: 纯函数, 无 I/O, 无隐藏状态
// ==========================================

use crate::domain::maintenance::{MaintenanceProjection, MaintenanceRecord, NextRangeForRecord};
use crate::domain::types::MaintenanceRange;

/// 相邻两次维保之间的固定间隔 (小时)
pub const INTERVAL_HOURS: u32 = 250;

/// 标准维保周期, 无限循环, 所有机器共用
pub const MAINTENANCE_CYCLE: [MaintenanceRange; 8] = [
    MaintenanceRange::C,
    MaintenanceRange::D,
    MaintenanceRange::C,
    MaintenanceRange::E,
    MaintenanceRange::C,
    MaintenanceRange::D,
    MaintenanceRange::C,
    MaintenanceRange::F,
];

const CYCLE_LEN: usize = MAINTENANCE_CYCLE.len();

// 回放时向前搜索的窗口: 两个首尾相接的周期
const SEARCH_WINDOW: usize = CYCLE_LEN * 2;

// ==========================================
// 序列指针回放
// ==========================================

/// 按一条记录的范围推进序列指针
///
/// # 规则
/// - 在 `pointer..SEARCH_WINDOW` 内找到第一个匹配位置 i → 指针 = i + 1
/// - 窗口内未找到 → 重新同步到该范围在周期中的首个标准位置 + 1
///
/// 模周期意义下, 重新同步的结果与"纯向前搜索"一致, 指针不会倒退
fn advance_pointer(pointer: usize, range: MaintenanceRange) -> usize {
    let forward = (pointer..SEARCH_WINDOW).find(|&i| MAINTENANCE_CYCLE[i % CYCLE_LEN] == range);

    match forward {
        Some(i) => i + 1,
        None => {
            let resync = MAINTENANCE_CYCLE
                .iter()
                .position(|r| *r == range)
                .map_or(0, |first| first + 1);
            tracing::debug!(
                pointer,
                range = %range,
                resync,
                "窗口内未找到维保范围, 重新同步到首个标准位置"
            );
            resync
        }
    }
}

/// 回放一组按时间排序的维保范围, 返回原始序列指针 (未取模)
///
/// # 参数
/// - `ranges`: 按服务小时数升序排列的维保范围
///
/// # 返回
/// 指向"下一个应执行范围"的指针, 使用时对周期长度取模
pub fn replay_pointer<I>(ranges: I) -> usize
where
    I: IntoIterator<Item = MaintenanceRange>,
{
    ranges.into_iter().fold(0, advance_pointer)
}

/// 周期中指定位置的维保范围 (自动取模)
pub fn range_at(pointer: usize) -> MaintenanceRange {
    MAINTENANCE_CYCLE[pointer % CYCLE_LEN]
}

// 稳定排序: 同一小时数的记录保持调用方顺序
fn sorted_by_hours(history: &[MaintenanceRecord]) -> Vec<&MaintenanceRecord> {
    let mut sorted: Vec<&MaintenanceRecord> = history.iter().collect();
    sorted.sort_by_key(|record| record.service_hours);
    sorted
}

// ==========================================
// 核心计算
// ==========================================

/// 计算机器的下次维保
///
/// # 参数
/// - `current_service_hours`: 机器当前服务小时数
/// - `history`: 该机器的维保记录 (顺序任意)
///
/// # 返回
/// 下次维保投影; 对于合法输入总是返回结果
///
/// # 规则
/// - 无历史: 第一个严格大于当前小时数的 250 倍数 (最小 250), 范围 C
/// - 有历史: 回放序列指针, 以最后一条记录为时间锚点,
///   每跳过一个已过去的 250h 边界指针前进一位, 最后再加一个间隔
pub fn compute_next_maintenance(
    current_service_hours: u32,
    history: &[MaintenanceRecord],
) -> MaintenanceProjection {
    let sorted = sorted_by_hours(history);

    let Some(last) = sorted.last() else {
        return first_cycle_projection(current_service_hours);
    };

    let pointer = replay_pointer(sorted.iter().map(|record| record.range));

    let interval = u64::from(INTERVAL_HOURS);
    let current = u64::from(current_service_hours);
    let anchor = u64::from(last.service_hours);

    // 快进: 跳过所有 anchor + k*250 <= current 的边界
    let skipped = if anchor + interval <= current {
        (current - anchor) / interval
    } else {
        0
    };
    let due_at_hours = anchor + skipped * interval + interval;
    let cycle_position = (pointer + (skipped % CYCLE_LEN as u64) as usize) % CYCLE_LEN;

    let projection = MaintenanceProjection {
        next_range: MAINTENANCE_CYCLE[cycle_position],
        due_at_hours,
        hours_remaining: due_at_hours as i64 - current as i64,
        cycle_position,
        skipped_intervals: skipped,
    };

    tracing::trace!(
        current_service_hours,
        records = history.len(),
        anchor,
        skipped,
        next_range = %projection.next_range,
        due_at_hours,
        "维保投影计算完成"
    );

    projection
}

/// 首个周期 (无历史) 的投影
fn first_cycle_projection(current_service_hours: u32) -> MaintenanceProjection {
    let interval = u64::from(INTERVAL_HOURS);
    let current = u64::from(current_service_hours);

    let mut candidate = current.div_ceil(interval) * interval;
    if candidate <= current {
        candidate += interval;
    }
    let due_at_hours = candidate.max(interval);

    MaintenanceProjection {
        next_range: MAINTENANCE_CYCLE[0],
        due_at_hours,
        hours_remaining: due_at_hours as i64 - current as i64,
        cycle_position: 0,
        skipped_intervals: 0,
    }
}

/// 计算某条历史记录之后 (按序列) 应执行的维保范围
///
/// # 参数
/// - `record`: 目标历史记录
/// - `full_history`: 该机器的全部维保记录
///
/// # 返回
/// `{range, hours}`, hours = record.service_hours + 250
///
/// # 说明
/// - 只回放到目标记录为止 (含), 不做快进, 不比较当前小时数
/// - 目标记录不在历史中时, 回放所有小时数不大于它的记录, 再追加目标记录
pub fn compute_next_range_for_record(
    record: &MaintenanceRecord,
    full_history: &[MaintenanceRecord],
) -> NextRangeForRecord {
    let sorted = sorted_by_hours(full_history);

    let position = sorted
        .iter()
        .position(|candidate| candidate.record_id == record.record_id);

    let prefix: Vec<&MaintenanceRecord> = match position {
        Some(index) => sorted[..=index].to_vec(),
        None => sorted
            .into_iter()
            .filter(|candidate| candidate.service_hours <= record.service_hours)
            .chain(std::iter::once(record))
            .collect(),
    };

    let pointer = replay_pointer(prefix.iter().map(|r| r.range));

    NextRangeForRecord {
        range: range_at(pointer),
        hours: u64::from(record.service_hours) + u64::from(INTERVAL_HOURS),
    }
}
