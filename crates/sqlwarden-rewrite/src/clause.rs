//! The clause-ripping grammar.
//!
//! A single pass over the SQL text locates the top-level clause keywords of
//! a SELECT statement: an optional WITH prefix, the mandatory SELECT
//! projection, then optional FROM, WHERE, GROUP BY, HAVING, and ORDER BY.
//! Everything between two keywords is kept as raw text.
//!
//! The scanner treats three token classes as atomic at the top level:
//!
//! - string literals (`'...'`, with `''` escapes);
//! - quoted identifiers (`"..."`, `[...]`, `` `...` ``);
//! - parenthesized groups, consumed by **raw bracket counting** without
//!   re-entering the scanner. An unbalanced parenthesis inside a string
//!   literal inside such a group therefore mis-extracts clause boundaries.
//!   Known limitation, left as-is.

use sqlwarden_core::ConversionError;

/// The clauses ripped out of one SELECT statement.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RippedClauses {
    /// Text of the WITH prefix, up to (not including) SELECT.
    pub with: Option<String>,
    /// The projection between SELECT and the next clause keyword.
    pub projection: String,
    /// The FROM clause, keyword included.
    pub from: Option<String>,
    /// The WHERE clause, keyword included.
    pub where_clause: Option<String>,
    /// The GROUP BY clause, keyword included.
    pub group_by: Option<String>,
    /// The HAVING clause, keyword included.
    pub having: Option<String>,
    /// The ORDER BY clause, keyword included.
    pub order_by: Option<String>,
}

impl RippedClauses {
    /// Whether the statement is grouped or aggregated.
    pub fn is_grouped(&self) -> bool {
        self.group_by.is_some() || self.having.is_some()
    }

    /// Whether the statement carries a WITH prefix.
    pub fn has_with(&self) -> bool {
        self.with.is_some()
    }
}

/// A top-level word token: byte span plus uppercased text.
struct Word {
    start: usize,
    end: usize,
    upper: String,
}

/// Scan the text and return every word token visible at the top level.
/// Atomic token classes (strings, quoted identifiers, paren groups) are
/// skipped whole.
fn top_level_words(sql: &str) -> Vec<Word> {
    let chars: Vec<(usize, char)> = sql.char_indices().collect();
    let len = chars.len();
    let mut words = Vec::new();
    let mut i = 0;

    while i < len {
        let (_, c) = chars[i];
        match c {
            '\'' => {
                // String literal; '' is an escaped quote, not a close.
                i += 1;
                while i < len {
                    if chars[i].1 == '\'' {
                        if i + 1 < len && chars[i + 1].1 == '\'' {
                            i += 2;
                            continue;
                        }
                        i += 1;
                        break;
                    }
                    i += 1;
                }
            }
            '"' | '`' => {
                let close = c;
                i += 1;
                while i < len && chars[i].1 != close {
                    i += 1;
                }
                i += 1;
            }
            '[' => {
                i += 1;
                while i < len && chars[i].1 != ']' {
                    i += 1;
                }
                i += 1;
            }
            '(' => {
                // Raw bracket counting; the group's content is opaque.
                let mut depth = 1;
                i += 1;
                while i < len && depth > 0 {
                    match chars[i].1 {
                        '(' => depth += 1,
                        ')' => depth -= 1,
                        _ => {}
                    }
                    i += 1;
                }
            }
            c if c.is_ascii_alphabetic() || c == '_' => {
                let start = chars[i].0;
                let word_start = i;
                while i < len {
                    let ch = chars[i].1;
                    if ch.is_ascii_alphanumeric() || ch == '_' {
                        i += 1;
                    } else {
                        break;
                    }
                }
                let end = if i < len { chars[i].0 } else { sql.len() };
                let upper: String = chars[word_start..i]
                    .iter()
                    .map(|(_, ch)| ch.to_ascii_uppercase())
                    .collect();
                words.push(Word { start, end, upper });
            }
            _ => i += 1,
        }
    }

    words
}

/// Rip a SELECT statement into clauses.
///
/// Returns `NotSelect` when the text does not open with SELECT (optionally
/// preceded by a WITH prefix).
pub fn rip(sql: &str) -> Result<RippedClauses, ConversionError> {
    let words = top_level_words(sql);

    let mut with = None;
    let mut select_idx = None;

    match words.first() {
        Some(w) if w.upper == "SELECT" => select_idx = Some(0),
        Some(w) if w.upper == "WITH" => {
            // The WITH prefix runs up to the first top-level SELECT; CTE
            // bodies are parenthesized groups and already skipped.
            if let Some(pos) = words.iter().position(|w| w.upper == "SELECT") {
                with = Some(sql[words[0].start..words[pos].start].trim().to_string());
                select_idx = Some(pos);
            }
        }
        _ => {}
    }
    let Some(select_idx) = select_idx else {
        return Err(ConversionError::NotSelect);
    };

    // Clause keyword starts after the projection, in statement order. Only
    // the first occurrence of each is a boundary.
    let mut boundaries: Vec<(usize, &'static str)> = Vec::new();
    let mut w = select_idx + 1;
    while w < words.len() {
        let keyword = match words[w].upper.as_str() {
            "FROM" => Some("FROM"),
            "WHERE" => Some("WHERE"),
            "GROUP" if words.get(w + 1).is_some_and(|n| n.upper == "BY") => Some("GROUP BY"),
            "HAVING" => Some("HAVING"),
            "ORDER" if words.get(w + 1).is_some_and(|n| n.upper == "BY") => Some("ORDER BY"),
            _ => None,
        };
        if let Some(keyword) = keyword {
            if !boundaries.iter().any(|(_, k)| *k == keyword) {
                boundaries.push((words[w].start, keyword));
            }
        }
        w += 1;
    }

    let projection_start = words[select_idx].end;
    let projection_end = boundaries.first().map_or(sql.len(), |(start, _)| *start);
    let mut clauses = RippedClauses {
        with,
        projection: sql[projection_start..projection_end].trim().to_string(),
        ..RippedClauses::default()
    };

    for (i, (start, keyword)) in boundaries.iter().enumerate() {
        let end = boundaries.get(i + 1).map_or(sql.len(), |(s, _)| *s);
        let text = sql[*start..end].trim().to_string();
        match *keyword {
            "FROM" => clauses.from = Some(text),
            "WHERE" => clauses.where_clause = Some(text),
            "GROUP BY" => clauses.group_by = Some(text),
            "HAVING" => clauses.having = Some(text),
            "ORDER BY" => clauses.order_by = Some(text),
            _ => {}
        }
    }

    Ok(clauses)
}
