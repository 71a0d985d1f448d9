// ==========================================
// 库存同步系统 - 原始表格模型
// ==========================================
// 职责: 文件解析产物的统一中间形态
// 用途: 导入层按列索引取值,渲染层按位置回写
// ==========================================

/// 解析后的原始表格（保留行列顺序）
///
/// 平台文件回写依赖位置稳定性，因此行与列的顺序
/// 必须与源文件完全一致，不做任何重排。
#[derive(Debug, Clone)]
pub struct RawTable {
    pub headers: Vec<String>,   // 表头（仅做 trim，不做大小写归一）
    pub rows: Vec<Vec<String>>, // 数据行（按源文件顺序）
    pub delimiter: u8,          // 分隔符（Excel 来源固定为 b','）
}

impl RawTable {
    /// 取指定行列的单元格（越界返回空串视角）
    pub fn cell(&self, row: usize, col: usize) -> Option<&str> {
        self.rows.get(row).and_then(|r| r.get(col)).map(|s| s.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}
