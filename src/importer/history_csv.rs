// ==========================================
// GestiFiltres - 维保历史 CSV 导入/导出
// ==========================================
// 表头: machine_id,service_hours,range,performed_on,filters_used
// 日期: YYYY-MM-DD; filters_used 以 ';' 分隔
// ==========================================

use crate::domain::maintenance::MaintenanceRecord;
use crate::domain::types::{validate_service_hours, MaintenanceRange};
use crate::importer::error::ImportError;
use crate::repository::maintenance_repo::{join_filters, split_filters};
use chrono::NaiveDate;
use csv::{ReaderBuilder, StringRecord, Trim, WriterBuilder};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;

const DATE_FORMAT: &str = "%Y-%m-%d";

/// 导入/导出共用表头
pub const HISTORY_CSV_HEADER: [&str; 5] = [
    "machine_id",
    "service_hours",
    "range",
    "performed_on",
    "filters_used",
];

// CSV 行 (原始字符串, 未校验)
#[derive(Debug, Serialize, Deserialize)]
struct HistoryCsvRow {
    machine_id: String,
    service_hours: String,
    range: String,
    performed_on: String,
    #[serde(default)]
    filters_used: String,
}

/// 解析后的行 (保留源文件行号, 便于报错)
#[derive(Debug, Clone, PartialEq)]
pub struct ImportedRecord {
    pub line: usize,
    pub record: MaintenanceRecord,
}

// ==========================================
// 导入
// ==========================================

/// 从文件路径导入 (仅支持 .csv)
pub fn parse_history_file(path: &Path) -> Result<Vec<ImportedRecord>, ImportError> {
    if !path.exists() {
        return Err(ImportError::FileNotFound(path.display().to_string()));
    }

    let ext = path
        .extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .unwrap_or_default();
    if ext != "csv" {
        return Err(ImportError::UnsupportedFormat(ext));
    }

    let file = File::open(path)?;
    parse_history_csv(file)
}

/// 解析维保历史 CSV
///
/// # 返回
/// - Ok(Vec<ImportedRecord>): 每行生成新的 record_id
/// - Err(ImportError): 首个非法行 (带行号)
///
/// # 说明
/// 全空行被跳过
pub fn parse_history_csv<R: Read>(reader: R) -> Result<Vec<ImportedRecord>, ImportError> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(Trim::All)
        .from_reader(reader);

    let headers = rdr.headers()?.clone();
    let mut imported = Vec::new();

    for (index, result) in rdr.records().enumerate() {
        // 表头占第 1 行
        let line = index + 2;
        let raw = result?;

        if raw.iter().all(str::is_empty) {
            continue;
        }

        let record = convert_row(line, &raw, &headers)?;
        imported.push(ImportedRecord { line, record });
    }

    tracing::debug!(rows = imported.len(), "维保历史 CSV 解析完成");
    Ok(imported)
}

fn convert_row(
    line: usize,
    raw: &StringRecord,
    headers: &StringRecord,
) -> Result<MaintenanceRecord, ImportError> {
    let row: HistoryCsvRow = raw
        .deserialize(Some(headers))
        .map_err(|e| ImportError::InvalidRow {
            row: line,
            message: e.to_string(),
        })?;

    if row.machine_id.is_empty() {
        return Err(ImportError::InvalidRow {
            row: line,
            message: "machine_id 为空".to_string(),
        });
    }

    let hours = row
        .service_hours
        .parse::<i64>()
        .map_err(|e| ImportError::TypeConversionError {
            row: line,
            field: "service_hours".to_string(),
            message: format!("'{}': {}", row.service_hours, e),
        })?;
    let service_hours = validate_service_hours(hours).map_err(|e| ImportError::InvalidRow {
        row: line,
        message: e.to_string(),
    })?;

    let range = row
        .range
        .parse::<MaintenanceRange>()
        .map_err(|e| ImportError::InvalidRow {
            row: line,
            message: e.to_string(),
        })?;

    let performed_on = NaiveDate::parse_from_str(&row.performed_on, DATE_FORMAT).map_err(|_| {
        ImportError::DateFormatError {
            row: line,
            field: "performed_on".to_string(),
            value: row.performed_on.clone(),
        }
    })?;

    Ok(MaintenanceRecord::new(
        row.machine_id,
        service_hours,
        range,
        performed_on,
        split_filters(&row.filters_used),
    ))
}

// ==========================================
// 导出
// ==========================================

/// 将维保记录写出为 CSV (格式与导入一致)
///
/// 无记录时仍写出表头
pub fn write_history_csv<W: Write>(
    writer: W,
    records: &[MaintenanceRecord],
) -> Result<(), ImportError> {
    let mut wtr = WriterBuilder::new().has_headers(false).from_writer(writer);
    wtr.write_record(HISTORY_CSV_HEADER)
        .map_err(|e| ImportError::CsvWriteError(e.to_string()))?;

    for record in records {
        wtr.serialize(HistoryCsvRow {
            machine_id: record.machine_id.clone(),
            service_hours: record.service_hours.to_string(),
            range: record.range.to_string(),
            performed_on: record.performed_on.format(DATE_FORMAT).to_string(),
            filters_used: join_filters(&record.filters_used),
        })
        .map_err(|e| ImportError::CsvWriteError(e.to_string()))?;
    }

    wtr.flush()
        .map_err(|e| ImportError::CsvWriteError(e.to_string()))?;
    Ok(())
}
