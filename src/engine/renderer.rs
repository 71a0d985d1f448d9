// ==========================================
// 库存同步系统 - 平台文件渲染器实现
// ==========================================
// 职责: 基线文件 + 账本 → 仅改写数量单元格的新文件
// 红线: 除被改写的数量单元格外,输出与基线逐字节一致
//       （行序、列序、引号、行终止符一概原样保留）,
//       平台可能依赖位置与格式稳定性
// 红线: 零命中是合法可报告结果,不是错误
// 实现: 不做整表重序列化;扫描字段字节区间,
//       仅对变更单元格做原地字节拼接
// ==========================================

use crate::config::SourceMapping;
use crate::domain::JobCounts;
use crate::engine::ledger::StockLedger;
use crate::ingest::error::MappingError;
use crate::ingest::file_parser::DelimitedParser;
use thiserror::Error;
use tracing::{debug, info};

/// zip 容器魔数（基线绝不应是 Excel 工作簿）
const ZIP_MAGIC: &[u8] = b"PK\x03\x04";

// ==========================================
// RenderError - 渲染错误（平台任务级）
// ==========================================
#[derive(Error, Debug)]
pub enum RenderError {
    #[error("基线列映射失败: {0}")]
    Mapping(#[from] MappingError),

    #[error("基线格式错误: {0}")]
    Format(String),
}

/// 单条记录的字段字节区间（基线内 start..end,不含分隔符与引号外空白处理）
type FieldSpan = (usize, usize);

// ==========================================
// PlatformRenderer - 平台文件渲染器
// ==========================================
pub struct PlatformRenderer;

impl PlatformRenderer {
    /// 渲染平台基线文件
    ///
    /// # 参数
    /// - platform_id: 平台 ID（仅用于日志）
    /// - baseline: 基线文件字节
    /// - ledger: 只读库存账本
    /// - mapping: 平台自身的列映射配置
    ///
    /// # 返回
    /// - Ok((bytes, counts)): 更新后文件与 read/matched/updated 计数
    /// - Err(RenderError): 基线不可解析或不可映射
    pub fn render(
        &self,
        platform_id: &str,
        baseline: &[u8],
        ledger: &StockLedger,
        mapping: &SourceMapping,
    ) -> Result<(Vec<u8>, JobCounts), RenderError> {
        // 电子表格容器不做回写,基线必须是分隔文本
        if baseline.starts_with(ZIP_MAGIC) {
            return Err(RenderError::Format(
                "基线为 Excel 工作簿,仅支持分隔文本基线回写".to_string(),
            ));
        }
        if baseline.is_empty() {
            return Err(RenderError::Format("基线文件为空".to_string()));
        }

        let delimiter = DelimitedParser::sniff_delimiter(baseline);
        let records = Self::scan_records(baseline, delimiter);

        let Some((header_record, data_records)) = records.split_first() else {
            return Err(RenderError::Format("基线文件为空".to_string()));
        };

        let headers: Vec<String> = header_record
            .iter()
            .map(|&span| Self::field_text(baseline, span))
            .collect();
        let columns = crate::ingest::SchemaMapper.resolve(&headers, mapping)?;

        let mut counts = JobCounts::default();
        // 变更集: 只记数量单元格的字节区间与替换文本
        let mut patches: Vec<(FieldSpan, String)> = Vec::new();

        for fields in data_records {
            // 全空白行不计数,字节原样保留
            if fields
                .iter()
                .all(|&span| Self::field_text(baseline, span).is_empty())
            {
                continue;
            }
            counts.read += 1;

            let Some(&id_span) = fields.get(columns.item_id) else {
                continue;
            };
            let item_id = Self::field_text(baseline, id_span);
            if item_id.is_empty() {
                continue;
            }

            let Some(target) = ledger.quantity(&item_id) else {
                // 账本缺席的商品保持原样（不强制清零）
                continue;
            };
            counts.matched += 1;

            let Some(&qty_span) = fields.get(columns.quantity) else {
                continue;
            };
            let current = Self::field_text(baseline, qty_span);
            if Self::cell_equals(&current, target) {
                // 数值未变: 单元格保持逐字节原样
                continue;
            }

            debug!(
                platform = %platform_id,
                item = %item_id,
                from = %current,
                to = target,
                "改写数量单元格"
            );
            patches.push((qty_span, target.to_string()));
            counts.updated += 1;
        }

        let bytes = Self::splice(baseline, &patches);

        info!(
            platform = %platform_id,
            read = counts.read,
            matched = counts.matched,
            updated = counts.updated,
            "平台文件渲染完成"
        );

        Ok((bytes, counts))
    }

    /// 扫描记录与字段的字节区间,引号内的分隔符/换行不拆分
    ///
    /// 区间覆盖字段原文（含引号）,替换时其余字节原样复制
    fn scan_records(bytes: &[u8], delimiter: u8) -> Vec<Vec<FieldSpan>> {
        let mut records = Vec::new();
        let mut fields: Vec<FieldSpan> = Vec::new();
        let mut field_start = 0usize;
        let mut in_quotes = false;
        let mut i = 0usize;

        while i < bytes.len() {
            let b = bytes[i];
            if in_quotes {
                if b == b'"' {
                    // "" 为引号转义,仍在引号内
                    if bytes.get(i + 1) == Some(&b'"') {
                        i += 2;
                        continue;
                    }
                    in_quotes = false;
                }
                i += 1;
                continue;
            }
            match b {
                b'"' => {
                    in_quotes = true;
                    i += 1;
                }
                _ if b == delimiter => {
                    fields.push((field_start, i));
                    i += 1;
                    field_start = i;
                }
                b'\r' if bytes.get(i + 1) == Some(&b'\n') => {
                    fields.push((field_start, i));
                    records.push(std::mem::take(&mut fields));
                    i += 2;
                    field_start = i;
                }
                b'\n' => {
                    fields.push((field_start, i));
                    records.push(std::mem::take(&mut fields));
                    i += 1;
                    field_start = i;
                }
                _ => i += 1,
            }
        }

        // 末行无终止符也是一条记录
        if field_start < bytes.len() || !fields.is_empty() {
            fields.push((field_start, bytes.len()));
            records.push(fields);
        }

        records
    }

    /// 字段逻辑文本: 去首尾空白,去外层引号并还原 "" 转义
    fn field_text(bytes: &[u8], (start, end): FieldSpan) -> String {
        let raw = String::from_utf8_lossy(&bytes[start..end]);
        let trimmed = raw.trim();
        if trimmed.len() >= 2 && trimmed.starts_with('"') && trimmed.ends_with('"') {
            trimmed[1..trimmed.len() - 1].replace("\"\"", "\"")
        } else {
            trimmed.to_string()
        }
    }

    /// 按字节区间拼接变更集,区间外字节原样复制
    fn splice(baseline: &[u8], patches: &[(FieldSpan, String)]) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(baseline.len());
        let mut cursor = 0usize;
        for &((start, end), ref replacement) in patches {
            bytes.extend_from_slice(&baseline[cursor..start]);
            bytes.extend_from_slice(replacement.as_bytes());
            cursor = end;
        }
        bytes.extend_from_slice(&baseline[cursor..]);
        bytes
    }

    /// 现有单元格与目标数量是否数值相等（"5" 与 "5.0" 视为相等）
    fn cell_equals(cell: &str, target: u32) -> bool {
        let trimmed = cell.trim();
        if let Ok(v) = trimmed.parse::<i64>() {
            return v >= 0 && v as u64 == target as u64;
        }
        if let Ok(v) = trimmed.parse::<f64>() {
            return v >= 0.0 && v.fract() == 0.0 && v == target as f64;
        }
        false
    }
}
