use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Coarse type of a column, as seen by the code that hydrates rows.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SemanticType {
    Integer,
    Float,
    Decimal,
    String,
    Text,
    Boolean,
    Date,
    DateTime,
    Time,
    Json,
    Binary,
    Guid,
    /// Anything we do not recognise, keeping the declared type name
    Other(String),
}

impl FromStr for SemanticType {
    type Err = std::convert::Infallible;

    /// Map a declared SQL type (`varchar(255)`, `BIGINT UNSIGNED`, ...) to a
    /// semantic type. Never fails; unknown names become `Other`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lowered = s.trim().to_ascii_lowercase();
        // strip length/precision and modifiers: "decimal(10,2) unsigned" -> "decimal"
        let base = lowered
            .split(|c: char| c == '(' || c.is_whitespace())
            .next()
            .unwrap_or("");

        let semantic = match base {
            "int" | "integer" | "tinyint" | "smallint" | "mediumint" | "bigint" | "serial"
            | "bigserial" | "int8" | "int16" | "int32" | "int64" | "uint8" | "uint16"
            | "uint32" | "uint64" => SemanticType::Integer,
            "float" | "double" | "real" | "float32" | "float64" => SemanticType::Float,
            "decimal" | "numeric" => SemanticType::Decimal,
            "char" | "varchar" | "string" | "enum" | "fixedstring" => SemanticType::String,
            "text" | "tinytext" | "mediumtext" | "longtext" | "clob" => SemanticType::Text,
            "bool" | "boolean" => SemanticType::Boolean,
            "date" | "date32" => SemanticType::Date,
            "datetime" | "datetime64" | "timestamp" | "timestamptz" => SemanticType::DateTime,
            "time" => SemanticType::Time,
            "json" | "jsonb" => SemanticType::Json,
            "blob" | "binary" | "varbinary" | "bytea" | "longblob" => SemanticType::Binary,
            "uuid" | "guid" => SemanticType::Guid,
            _ => SemanticType::Other(s.trim().to_string()),
        };
        Ok(semantic)
    }
}

impl fmt::Display for SemanticType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SemanticType::Integer => f.write_str("integer"),
            SemanticType::Float => f.write_str("float"),
            SemanticType::Decimal => f.write_str("decimal"),
            SemanticType::String => f.write_str("string"),
            SemanticType::Text => f.write_str("text"),
            SemanticType::Boolean => f.write_str("boolean"),
            SemanticType::Date => f.write_str("date"),
            SemanticType::DateTime => f.write_str("datetime"),
            SemanticType::Time => f.write_str("time"),
            SemanticType::Json => f.write_str("json"),
            SemanticType::Binary => f.write_str("binary"),
            SemanticType::Guid => f.write_str("guid"),
            SemanticType::Other(name) => f.write_str(name),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnSchema {
    pub name: String,
    pub semantic_type: SemanticType,
}

impl ColumnSchema {
    pub fn new(name: impl Into<String>, semantic_type: SemanticType) -> Self {
        ColumnSchema {
            name: name.into(),
            semantic_type,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ForeignKey {
    pub name: String,
    pub local_table: String,
    pub local_columns: Vec<String>,
    pub foreign_table: String,
    pub foreign_columns: Vec<String>,
}

impl ForeignKey {
    /// `local = foreign` pairs, in declaration order
    pub fn column_pairs(&self) -> impl Iterator<Item = (&str, &str)> {
        self.local_columns
            .iter()
            .map(String::as_str)
            .zip(self.foreign_columns.iter().map(String::as_str))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableSchema {
    pub name: String,
    pub columns: Vec<ColumnSchema>,
    pub primary_key: Vec<String>,
    pub foreign_keys: Vec<ForeignKey>,
}

impl TableSchema {
    pub fn column(&self, name: &str) -> Option<&ColumnSchema> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column(name).is_some()
    }

    /// The foreign key that makes this table a subtype of another table.
    ///
    /// A key qualifies when its local columns are exactly the primary key and
    /// it points at a different table.
    pub fn parent_foreign_key(&self) -> Option<&ForeignKey> {
        if self.primary_key.is_empty() {
            return None;
        }
        self.foreign_keys
            .iter()
            .find(|fk| fk.local_columns == self.primary_key && fk.foreign_table != self.name)
    }
}
