// ==========================================
// 库存同步系统 - 文件解析器实现
// ==========================================
// 支持: CSV / TXT（分隔符嗅探: 逗号/分号/制表符）
// 支持: Excel (.xlsx/.xls)
// 嗅探: 扩展名 + 内容魔数（zip 容器 "PK\x03\x04"）
// ==========================================

use crate::domain::RawTable;
use crate::ingest::error::IngestError;
use calamine::{Reader, Xls, Xlsx};
use csv::ReaderBuilder;
use std::io::Cursor;

/// zip 容器魔数（.xlsx 为 zip 打包的 OOXML）
const ZIP_MAGIC: &[u8] = b"PK\x03\x04";

/// 候选分隔符,按嗅探优先级排列
const DELIMITER_CANDIDATES: [u8; 3] = [b',', b';', b'\t'];

// ==========================================
// DelimitedParser - 分隔文本解析
// ==========================================
pub struct DelimitedParser;

impl DelimitedParser {
    /// 根据首行内容嗅探分隔符（出现次数最多者胜,计数相同取优先级靠前者,默认逗号）
    pub fn sniff_delimiter(bytes: &[u8]) -> u8 {
        let first_line_end = bytes
            .iter()
            .position(|&b| b == b'\n')
            .unwrap_or(bytes.len());
        let first_line = &bytes[..first_line_end];

        let mut best = DELIMITER_CANDIDATES[0];
        let mut best_count = first_line.iter().filter(|&&b| b == best).count();
        for candidate in DELIMITER_CANDIDATES.into_iter().skip(1) {
            let count = first_line.iter().filter(|&&b| b == candidate).count();
            // 严格大于才换,平局保持优先级靠前的候选
            if count > best_count {
                best = candidate;
                best_count = count;
            }
        }
        best
    }

    pub fn parse(&self, bytes: &[u8]) -> Result<RawTable, IngestError> {
        let delimiter = Self::sniff_delimiter(bytes);

        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true) // 允许行长度不一致
            .delimiter(delimiter)
            .from_reader(bytes);

        let headers: Vec<String> = reader
            .headers()?
            .iter()
            .map(|h| h.trim().to_string())
            .collect();

        let mut rows = Vec::new();
        for result in reader.records() {
            let record = result?;
            let row: Vec<String> = record.iter().map(|v| v.to_string()).collect();

            // 跳过完全空白的行
            if row.iter().all(|v| v.trim().is_empty()) {
                continue;
            }

            rows.push(row);
        }

        Ok(RawTable {
            headers,
            rows,
            delimiter,
        })
    }
}

// ==========================================
// ExcelParser - 电子表格解析
// ==========================================
// 读取第一个 sheet,首行作为表头
pub struct ExcelParser;

impl ExcelParser {
    pub fn parse(&self, file_name: &str, bytes: &[u8]) -> Result<RawTable, IngestError> {
        let cursor = Cursor::new(bytes.to_vec());

        // .xlsx 为 zip 容器,.xls 为旧版二进制格式
        let range = if bytes.starts_with(ZIP_MAGIC) {
            let mut workbook: Xlsx<_> = Xlsx::new(cursor)
                .map_err(|e| IngestError::Format(format!("Excel 打开失败: {}", e)))?;
            Self::first_sheet_range(&mut workbook, file_name)?
        } else {
            let mut workbook: Xls<_> = Xls::new(cursor)
                .map_err(|e| IngestError::Format(format!("Excel 打开失败: {}", e)))?;
            Self::first_sheet_range(&mut workbook, file_name)?
        };

        let mut iter = range.rows();
        let header_row = iter
            .next()
            .ok_or_else(|| IngestError::Format(format!("{}: Excel 文件无数据行", file_name)))?;

        let headers: Vec<String> = header_row
            .iter()
            .map(|cell| cell.to_string().trim().to_string())
            .collect();

        let mut rows = Vec::new();
        for data_row in iter {
            let row: Vec<String> = data_row
                .iter()
                .map(|cell| cell.to_string().trim().to_string())
                .collect();

            // 跳过完全空白的行
            if row.iter().all(|v| v.is_empty()) {
                continue;
            }

            rows.push(row);
        }

        Ok(RawTable {
            headers,
            rows,
            delimiter: b',',
        })
    }

    fn first_sheet_range<R>(
        workbook: &mut R,
        file_name: &str,
    ) -> Result<calamine::Range<calamine::Data>, IngestError>
    where
        R: Reader<Cursor<Vec<u8>>>,
        R::Error: std::fmt::Display,
    {
        let sheet_names = workbook.sheet_names();
        let first = sheet_names
            .first()
            .cloned()
            .ok_or_else(|| IngestError::Format(format!("{}: Excel 文件无工作表", file_name)))?;

        workbook
            .worksheet_range(&first)
            .map_err(|e| IngestError::Format(format!("{}: sheet 读取失败: {}", file_name, e)))
    }
}

// ==========================================
// UniversalFileParser - 通用入口
// ==========================================
// 选择规则: zip 魔数或 .xlsx/.xls 扩展名 → Excel,
//           其余（.csv/.txt/无扩展名）→ 分隔文本
pub struct UniversalFileParser;

impl UniversalFileParser {
    pub fn parse(&self, file_name: &str, bytes: &[u8]) -> Result<RawTable, IngestError> {
        if bytes.is_empty() {
            return Err(IngestError::Format(format!("{}: 文件为空", file_name)));
        }

        let ext = std::path::Path::new(file_name)
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_lowercase();

        if bytes.starts_with(ZIP_MAGIC) || ext == "xlsx" || ext == "xls" {
            ExcelParser.parse(file_name, bytes)
        } else {
            DelimitedParser.parse(bytes)
        }
    }
}
