// ==========================================
// 库存同步系统 - 导入层
// ==========================================
// 职责: 供应商文件取件、解析、映射、归一化
// 流程: 取件 → 格式嗅探 → 解析 → 列解析 → 数量收敛
// 支持: CSV / TXT（分隔符嗅探）、Excel (.xlsx/.xls)
// ==========================================

pub mod error;
pub mod file_parser;
pub mod schema_mapper;
pub mod supplier_ingestor;

pub use error::{IngestError, MappingError};
pub use file_parser::{DelimitedParser, ExcelParser, UniversalFileParser};
pub use schema_mapper::{ResolvedColumns, SchemaMapper};
pub use supplier_ingestor::{coerce_quantity, SupplierIngestor};
