// ==========================================
// 库存同步系统 - 列解析器实现
// ==========================================
// 职责: (表头, 映射配置) → 规范字段列索引
// 解析顺序: 归一化精确匹配 → 按声明顺序尝试别名 → 失败
// 红线: 同一候选命中多列为硬失败,不按列序静默选取
// 副作用: 无,纯函数
// ==========================================

use crate::config::source_mapping::{normalize_header, FieldSpec, SourceMapping};
use crate::ingest::error::MappingError;

// ==========================================
// ResolvedColumns - 解析结果
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedColumns {
    pub item_id: usize,  // 商品标识列索引
    pub quantity: usize, // 库存数量列索引
}

// ==========================================
// SchemaMapper - 列解析器
// ==========================================
pub struct SchemaMapper;

impl SchemaMapper {
    /// 解析两个规范字段的列索引
    ///
    /// # 参数
    /// - headers: 源文件表头（原文）
    /// - mapping: 该数据源的映射配置
    ///
    /// # 返回
    /// - Ok(ResolvedColumns): 每个字段恰好命中一列
    /// - Err(MappingError): 无候选命中或命中歧义
    pub fn resolve(
        &self,
        headers: &[String],
        mapping: &SourceMapping,
    ) -> Result<ResolvedColumns, MappingError> {
        let normalized: Vec<String> = headers.iter().map(|h| normalize_header(h)).collect();

        let item_id = Self::resolve_field("item_id", &mapping.item_id, headers, &normalized)?;
        let quantity = Self::resolve_field("quantity", &mapping.quantity, headers, &normalized)?;

        Ok(ResolvedColumns { item_id, quantity })
    }

    fn resolve_field(
        field: &str,
        spec: &FieldSpec,
        headers: &[String],
        normalized: &[String],
    ) -> Result<usize, MappingError> {
        for candidate in spec.candidates() {
            let target = normalize_header(candidate);
            if target.is_empty() {
                continue;
            }

            let hits: Vec<usize> = normalized
                .iter()
                .enumerate()
                .filter(|(_, h)| **h == target)
                .map(|(i, _)| i)
                .collect();

            match hits.len() {
                0 => continue,
                1 => return Ok(hits[0]),
                _ => {
                    return Err(MappingError::Ambiguous {
                        field: field.to_string(),
                        candidate: candidate.to_string(),
                        available_headers: headers.to_vec(),
                    })
                }
            }
        }

        Err(MappingError::Unresolved {
            field: field.to_string(),
            available_headers: headers.to_vec(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    fn mapping(item: &str, item_aliases: &[&str], qty: &str, qty_aliases: &[&str]) -> SourceMapping {
        SourceMapping {
            item_id: FieldSpec {
                header: item.to_string(),
                aliases: item_aliases.iter().map(|s| s.to_string()).collect(),
            },
            quantity: FieldSpec {
                header: qty.to_string(),
                aliases: qty_aliases.iter().map(|s| s.to_string()).collect(),
            },
        }
    }

    #[test]
    fn test_exact_match_case_insensitive() {
        let cols = SchemaMapper
            .resolve(
                &headers(&["sku", "QTY", "Name"]),
                &mapping("SKU", &[], "Qty", &[]),
            )
            .unwrap();
        assert_eq!(cols, ResolvedColumns { item_id: 0, quantity: 1 });
    }

    #[test]
    fn test_alias_fallback_in_declaration_order() {
        let cols = SchemaMapper
            .resolve(
                &headers(&["EAN", "Stock"]),
                &mapping("SKU", &["Référence", "EAN"], "Qty", &["Stock"]),
            )
            .unwrap();
        assert_eq!(cols.item_id, 0);
        assert_eq!(cols.quantity, 1);
    }

    #[test]
    fn test_primary_header_wins_over_alias() {
        // 首选与别名同时存在时,先整体尝试首选
        let cols = SchemaMapper
            .resolve(
                &headers(&["EAN", "SKU", "Qty"]),
                &mapping("SKU", &["EAN"], "Qty", &[]),
            )
            .unwrap();
        assert_eq!(cols.item_id, 1);
    }

    #[test]
    fn test_whitespace_normalization() {
        let cols = SchemaMapper
            .resolve(
                &headers(&["  Item   ID ", "Qty"]),
                &mapping("item id", &[], "qty", &[]),
            )
            .unwrap();
        assert_eq!(cols.item_id, 0);
    }

    #[test]
    fn test_ambiguous_is_hard_failure() {
        // "SKU" 与 "sku " 归一化后相同 → 歧义
        let err = SchemaMapper
            .resolve(
                &headers(&["SKU", "sku ", "Qty"]),
                &mapping("SKU", &[], "Qty", &[]),
            )
            .unwrap_err();
        assert!(matches!(err, MappingError::Ambiguous { ref field, .. } if field == "item_id"));
    }

    #[test]
    fn test_unresolved_carries_available_headers() {
        let err = SchemaMapper
            .resolve(&headers(&["Foo", "Bar"]), &mapping("SKU", &["EAN"], "Qty", &[]))
            .unwrap_err();
        match err {
            MappingError::Unresolved {
                field,
                available_headers,
            } => {
                assert_eq!(field, "item_id");
                assert_eq!(available_headers, headers(&["Foo", "Bar"]));
            }
            other => panic!("期望 Unresolved,实际 {:?}", other),
        }
    }

    #[test]
    fn test_resolution_is_deterministic() {
        let h = headers(&["SKU", "Qty", "Stock"]);
        let m = mapping("SKU", &[], "Qty", &["Stock"]);
        let first = SchemaMapper.resolve(&h, &m).unwrap();
        let second = SchemaMapper.resolve(&h, &m).unwrap();
        assert_eq!(first, second);
    }
}
