// ==========================================
// 库存同步系统 - 库存账本实现
// ==========================================
// 职责: 合并多供应商的规范化记录为单一账本
// 合并策略: 按配置优先级折叠,同一 item_id 后出现者
//           整体覆盖先出现者（覆盖语义,非累加）
// 红线: 账本为运行期派生态,构建后只读,从不落盘
// ==========================================

use crate::domain::SupplierBatch;
use std::collections::HashMap;
use tracing::{debug, info};

// ==========================================
// LedgerEntry - 账本条目
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerEntry {
    pub quantity: u32,             // 胜出数量
    pub source: String,            // 胜出供应商
    pub contributors: Vec<String>, // 报数过该商品的全部供应商（按折叠顺序）
}

// ==========================================
// StockLedger - 库存账本
// ==========================================
#[derive(Debug, Default)]
pub struct StockLedger {
    entries: HashMap<String, LedgerEntry>,
}

impl StockLedger {
    /// 按优先级顺序合并供应商批次
    ///
    /// # 参数
    /// - batches: 成功导入的批次,按配置声明顺序排列
    ///   （越靠后优先级越高,对同一 item_id 整体覆盖）
    ///
    /// # 确定性
    /// 相同输入顺序与相同批次内容必然产出相同账本（幂等）
    pub fn merge(batches: &[SupplierBatch]) -> Self {
        let mut entries: HashMap<String, LedgerEntry> = HashMap::new();

        for batch in batches {
            debug!(
                supplier = %batch.source_id,
                records = batch.records.len(),
                "折叠供应商批次"
            );

            for record in &batch.records {
                entries
                    .entry(record.item_id.clone())
                    .and_modify(|entry| {
                        // 覆盖而非累加: 高优先级供应商的报数取代低优先级
                        entry.quantity = record.quantity;
                        entry.source = record.source.clone();
                        if !entry.contributors.contains(&record.source) {
                            entry.contributors.push(record.source.clone());
                        }
                    })
                    .or_insert_with(|| LedgerEntry {
                        quantity: record.quantity,
                        source: record.source.clone(),
                        contributors: vec![record.source.clone()],
                    });
            }
        }

        info!(items = entries.len(), "库存账本合并完成");
        Self { entries }
    }

    pub fn get(&self, item_id: &str) -> Option<&LedgerEntry> {
        self.entries.get(item_id)
    }

    /// 账本内该商品的最终数量（缺席 = 下游不改动）
    pub fn quantity(&self, item_id: &str) -> Option<u32> {
        self.entries.get(item_id).map(|e| e.quantity)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
