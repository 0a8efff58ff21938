use serde::Serialize;

use crate::schema_catalog::SemanticType;

/// Separator between table and column in generated column aliases
pub const ALIAS_SEPARATOR: &str = "____";

/// Maps one selected column back to the table it came from.
///
/// Produced once per compiled query. After inheritance joins several tables
/// can contribute a column with the same name (`id` typically); `table_group`
/// tells the row hydrator which hierarchy a column belongs to.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColumnDescriptor {
    pub alias: String,
    pub table: String,
    pub column: String,
    #[serde(rename = "type")]
    pub semantic_type: SemanticType,
    pub table_group: String,
}

impl ColumnDescriptor {
    pub fn alias_for(table: &str, column: &str) -> String {
        format!("{}{}{}", table, ALIAS_SEPARATOR, column)
    }
}
