//! ORDER BY handling for wrapped queries.
//!
//! When the row query is wrapped in an outer select, the ordering expression
//! may reference tables only visible in the inner query. Each item is
//! therefore projected in the inner query under a reserved alias and the
//! outer query orders by that alias.

use super::sql_text::split_top_level;
use crate::executor::Dialect;

pub const RESERVED_ORDER_COLUMN_PREFIX: &str = "__order_col_";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Asc,
    Desc,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Nulls {
    First,
    Last,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderItem {
    pub expression: String,
    pub direction: Option<Direction>,
    pub nulls: Option<Nulls>,
}

impl OrderItem {
    fn parse(item: &str) -> Self {
        let mut rest = item.trim();

        let mut nulls = None;
        for (words, placement) in [(["NULLS", "FIRST"], Nulls::First), (["NULLS", "LAST"], Nulls::Last)] {
            if let Some(stripped) = strip_trailing_words(rest, &words) {
                rest = stripped;
                nulls = Some(placement);
                break;
            }
        }

        let mut direction = None;
        for (word, dir) in [("ASC", Direction::Asc), ("DESC", Direction::Desc)] {
            if let Some(stripped) = strip_trailing_words(rest, &[word]) {
                rest = stripped;
                direction = Some(dir);
                break;
            }
        }

        OrderItem {
            expression: rest.to_string(),
            direction,
            nulls,
        }
    }
}

/// `text` without the trailing keywords `words` (case-insensitive, any
/// whitespace between them), or `None` when it does not end with them.
fn strip_trailing_words<'a>(text: &'a str, words: &[&str]) -> Option<&'a str> {
    let mut rest = text;
    for word in words.iter().rev() {
        let trimmed = rest.trim_end();
        let split = trimmed.len().checked_sub(word.len())?;
        let tail = trimmed.get(split..)?;
        let head = trimmed.get(..split)?;
        if !tail.eq_ignore_ascii_case(word) || !head.ends_with(char::is_whitespace) {
            return None;
        }
        rest = head;
    }
    let rest = rest.trim_end();
    (!rest.is_empty()).then_some(rest)
}

/// Split an ORDER BY expression (without the keywords) into items.
pub fn parse_order_by(order_by: &str) -> Vec<OrderItem> {
    split_top_level(order_by, ',')
        .iter()
        .map(|item| OrderItem::parse(item))
        .collect()
}

pub fn reserved_alias(index: usize) -> String {
    format!("{}{}", RESERVED_ORDER_COLUMN_PREFIX, index)
}

/// `expr AS reserved` projections for the inner query
pub fn inner_projections(items: &[OrderItem], dialect: Dialect) -> Vec<String> {
    items
        .iter()
        .enumerate()
        .map(|(i, item)| {
            format!(
                "{} AS {}",
                item.expression,
                dialect.quote_identifier(&reserved_alias(i))
            )
        })
        .collect()
}

/// ORDER BY list for the outer query, referencing `source_alias`
pub fn outer_order_by(items: &[OrderItem], source_alias: &str, dialect: Dialect) -> String {
    items
        .iter()
        .enumerate()
        .map(|(i, item)| {
            let mut column = dialect.qualified_column(source_alias, &reserved_alias(i));
            match item.direction {
                Some(Direction::Asc) => column.push_str(" ASC"),
                Some(Direction::Desc) => column.push_str(" DESC"),
                None => {}
            }
            match item.nulls {
                Some(Nulls::First) => column.push_str(" NULLS FIRST"),
                Some(Nulls::Last) => column.push_str(" NULLS LAST"),
                None => {}
            }
            column
        })
        .collect::<Vec<_>>()
        .join(", ")
}
