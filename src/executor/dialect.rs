//! SQL dialects and identifier quoting.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Dialect {
    #[default]
    MySql,
    Postgres,
    Sqlite,
    ClickHouse,
}

impl Dialect {
    fn quote_char(&self) -> char {
        match self {
            Dialect::MySql | Dialect::ClickHouse => '`',
            Dialect::Postgres | Dialect::Sqlite => '"',
        }
    }

    /// Quote an identifier (table or column name) for this dialect.
    ///
    /// Embedded quote characters are doubled.
    ///
    /// # Examples
    /// ```
    /// use eagerql::executor::Dialect;
    /// assert_eq!(Dialect::MySql.quote_identifier("user_id"), "`user_id`");
    /// assert_eq!(Dialect::Postgres.quote_identifier("we\"ird"), "\"we\"\"ird\"");
    /// ```
    pub fn quote_identifier(&self, name: &str) -> String {
        let q = self.quote_char();
        let mut quoted = String::with_capacity(name.len() + 2);
        quoted.push(q);
        for c in name.chars() {
            if c == q {
                quoted.push(q);
            }
            quoted.push(c);
        }
        quoted.push(q);
        quoted
    }

    /// Format a qualified column reference: `table`.`column`
    pub fn qualified_column(&self, table: &str, column: &str) -> String {
        format!(
            "{}.{}",
            self.quote_identifier(table),
            self.quote_identifier(column)
        )
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Dialect::MySql => "mysql",
            Dialect::Postgres => "postgres",
            Dialect::Sqlite => "sqlite",
            Dialect::ClickHouse => "clickhouse",
        };
        f.write_str(name)
    }
}

impl FromStr for Dialect {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "mysql" | "mariadb" => Ok(Dialect::MySql),
            "postgres" | "postgresql" | "pgsql" => Ok(Dialect::Postgres),
            "sqlite" => Ok(Dialect::Sqlite),
            "clickhouse" => Ok(Dialect::ClickHouse),
            other => Err(format!("unknown SQL dialect '{}'", other)),
        }
    }
}
