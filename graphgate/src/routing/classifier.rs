// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Static statement classification
//!
//! Statements are scanned into keyword candidates without parsing. String
//! literals, comments, backtick-quoted names, property keys (`n.set`), labels
//! and relationship types (`:Create`), parameters (`$delete`) and map keys
//! (`{create: 1}`) never count as keywords.

use serde::Serialize;

/// Kind of statement as far as routing is concerned
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum StatementKind {
    /// Only reads graph data
    Read,
    /// Cypher clauses that modify graph data
    Write,
    /// Index and constraint management
    Schema,
    /// Database, user, role and privilege management
    Administration,
    /// `SHOW ...` commands
    Show,
    /// `BEGIN`, `COMMIT`, `ROLLBACK`, `START TRANSACTION`
    TransactionControl,
    /// Writes that commit in inner transactions (`CALL {} IN TRANSACTIONS`, periodic commit)
    BatchedWrite,
    /// Leading clause not recognized
    Unknown,
}

/// Information about a statement, computed without executing it
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatementInfo {
    pub kind: StatementKind,
    /// Whether the statement may be served by a read replica
    pub is_read_only: bool,
}

/// Clauses a read-only query may start with
const READ_LEADING: &[&str] = &["MATCH", "OPTIONAL", "RETURN", "UNWIND", "WITH"];

/// Clauses a data-modifying query may start with
const WRITE_LEADING: &[&str] = &[
    "CREATE", "MERGE", "CALL", "LOAD", "FOREACH", "DELETE", "DETACH", "SET", "REMOVE", "INSERT",
];

/// Keywords that make any statement a write
const WRITE_KEYWORDS: &[&str] = &[
    "CREATE", "MERGE", "SET", "DELETE", "DETACH", "REMOVE", "FOREACH", "LOAD", "CALL", "DROP",
    "ALTER", "GRANT", "DENY", "REVOKE", "RENAME", "INSERT",
];

const SCHEMA_OBJECTS: &[&str] = &[
    "INDEX", "CONSTRAINT", "FULLTEXT", "TEXT", "RANGE", "POINT", "LOOKUP", "VECTOR", "BTREE",
];

const ADMIN_OBJECTS: &[&str] = &[
    "DATABASE", "DATABASES", "COMPOSITE", "ALIAS", "USER", "ROLE", "SERVER", "OR",
];

/// A word outside literals and comments, with its nearest non-blank neighbours
#[derive(Debug, Clone, PartialEq, Eq)]
struct Word {
    text: String,
    prev: Option<char>,
    next: Option<char>,
}

impl Word {
    /// Words that can be clause keywords; property keys, labels, parameters and map keys cannot
    fn is_keyword_candidate(&self) -> bool {
        !matches!(self.prev, Some('.') | Some(':') | Some('$')) && self.next != Some(':')
    }
}

/// Split statement text into upper-cased keyword candidates
fn scan(text: &str) -> Vec<Word> {
    let chars: Vec<char> = text.chars().collect();
    let mut words = Vec::new();
    let mut prev_significant: Option<char> = None;
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];

        if c.is_whitespace() {
            i += 1;
            continue;
        }

        // Line comment
        if c == '/' && chars.get(i + 1) == Some(&'/') {
            while i < chars.len() && chars[i] != '\n' {
                i += 1;
            }
            continue;
        }

        // Block comment
        if c == '/' && chars.get(i + 1) == Some(&'*') {
            i += 2;
            while i < chars.len() && !(chars[i] == '*' && chars.get(i + 1) == Some(&'/')) {
                i += 1;
            }
            i += 2;
            continue;
        }

        // String literals and quoted names
        if c == '\'' || c == '"' || c == '`' {
            let quote = c;
            i += 1;
            while i < chars.len() {
                if chars[i] == '\\' && quote != '`' {
                    i += 2;
                    continue;
                }
                if chars[i] == quote {
                    // Doubled quote is an escaped quote
                    if chars.get(i + 1) == Some(&quote) {
                        i += 2;
                        continue;
                    }
                    break;
                }
                i += 1;
            }
            i += 1;
            prev_significant = Some(quote);
            continue;
        }

        if c.is_alphanumeric() || c == '_' {
            let start = i;
            while i < chars.len() && (chars[i].is_alphanumeric() || chars[i] == '_') {
                i += 1;
            }
            let text: String = chars[start..i].iter().collect::<String>().to_ascii_uppercase();
            let next = chars[i..].iter().copied().find(|c| !c.is_whitespace());
            words.push(Word {
                text,
                prev: prev_significant,
                next,
            });
            prev_significant = Some('a');
            continue;
        }

        prev_significant = Some(c);
        i += 1;
    }

    words
}

/// Skip `EXPLAIN`, `PROFILE`, `CYPHER <options>` and `USE <graph>` prefixes
///
/// Returns the index of the leading clause and whether `EXPLAIN` was seen.
fn skip_prefixes(words: &[Word]) -> (usize, bool) {
    let mut index = 0;
    let mut explain = false;

    while let Some(word) = words.get(index) {
        match word.text.as_str() {
            "EXPLAIN" => {
                explain = true;
                index += 1;
            }
            "PROFILE" => index += 1,
            "CYPHER" => {
                index += 1;
                // Version number and key=value options
                while let Some(option) = words.get(index) {
                    let is_version = option.text.chars().all(|c| c.is_ascii_digit());
                    let is_option_key = option.next == Some('=');
                    let is_option_value = option.prev == Some('=');
                    if is_version || is_option_key || is_option_value {
                        index += 1;
                    } else {
                        break;
                    }
                }
            }
            "USE" => {
                index += 1;
                // Graph name, possibly dotted; dotted parts are not keyword candidates
                if words.get(index).is_some() {
                    index += 1;
                }
                while words.get(index).map(|w| w.prev == Some('.')).unwrap_or(false) {
                    index += 1;
                }
            }
            _ => break,
        }
    }

    (index, explain)
}

fn contains_sequence(words: &[&str], sequence: &[&str]) -> bool {
    words.windows(sequence.len()).any(|window| window == sequence)
}

/// Statements that manage their own inner transactions
///
/// `IN TRANSACTIONS` only counts directly after the `}` closing a `CALL`
/// subquery; elsewhere `IN` is the list predicate.
fn is_batched_write(words: &[&Word]) -> bool {
    let texts: Vec<&str> = words.iter().map(|word| word.text.as_str()).collect();
    contains_sequence(&texts, &["USING", "PERIODIC", "COMMIT"])
        || words.iter().enumerate().any(|(i, word)| {
            word.text == "IN"
                && word.prev == Some('}')
                && texts.iter().skip(i + 1).take(3).any(|following| *following == "TRANSACTIONS")
        })
}

/// Classify statement text
///
/// `text` is expected to be normalized; blank text classifies as `Unknown`.
pub fn classify(text: &str, is_enterprise_capable: bool) -> StatementInfo {
    let scanned = scan(text);
    let (leading, explain) = skip_prefixes(&scanned);
    let candidates: Vec<&Word> = scanned[leading..]
        .iter()
        .filter(|word| word.is_keyword_candidate())
        .collect();
    let keywords: Vec<&str> = candidates.iter().map(|word| word.text.as_str()).collect();

    let kind = classify_keywords(&keywords, is_batched_write(&candidates));

    let is_read_only = match kind {
        StatementKind::Read => true,
        StatementKind::Show => is_enterprise_capable,
        // EXPLAIN only plans; nothing is executed
        _ => explain && kind != StatementKind::TransactionControl && kind != StatementKind::Unknown,
    };

    StatementInfo { kind, is_read_only }
}

fn classify_keywords(keywords: &[&str], batched_write: bool) -> StatementKind {
    let Some(first) = keywords.first().copied() else {
        return StatementKind::Unknown;
    };
    let second = keywords.get(1).copied();

    match (first, second) {
        ("BEGIN", _) | ("COMMIT", _) | ("ROLLBACK", _) | ("START", Some("TRANSACTION")) => {
            return StatementKind::TransactionControl
        }
        ("SHOW", _) => return StatementKind::Show,
        ("GRANT", _) | ("DENY", _) | ("REVOKE", _) => return StatementKind::Administration,
        ("START", Some("DATABASE")) | ("STOP", Some("DATABASE")) => {
            return StatementKind::Administration
        }
        ("CREATE", Some(object)) | ("DROP", Some(object)) | ("ALTER", Some(object))
            if SCHEMA_OBJECTS.contains(&object) =>
        {
            return StatementKind::Schema
        }
        ("CREATE", Some(object)) | ("DROP", Some(object)) | ("ALTER", Some(object))
            if ADMIN_OBJECTS.contains(&object) =>
        {
            return StatementKind::Administration
        }
        _ => {}
    }

    if batched_write {
        return StatementKind::BatchedWrite;
    }

    let writes = keywords.iter().any(|word| WRITE_KEYWORDS.contains(word));

    if READ_LEADING.contains(&first) {
        if writes {
            StatementKind::Write
        } else {
            StatementKind::Read
        }
    } else if WRITE_LEADING.contains(&first) {
        StatementKind::Write
    } else {
        StatementKind::Unknown
    }
}
