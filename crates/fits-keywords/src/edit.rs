//! In-place record edits: COMMENT/HISTORY appenders and field removal.

use alloc::format;
use alloc::string::String;

use crate::record::Record;

#[derive(Clone, Copy)]
enum Commentary {
    Comment,
    History,
}

fn append(record: &mut Record, kind: Commentary, text: &str) {
    let prefix = match kind {
        Commentary::Comment => "comment",
        Commentary::History => "history",
    };
    let mut counter = match kind {
        Commentary::Comment => record.comment_counter,
        Commentary::History => record.history_counter,
    };
    for line in text.split('\n') {
        let name = loop {
            counter += 1;
            let name = format!("{prefix}{counter}");
            if !record.contains(&name) {
                break name;
            }
        };
        record.define(&name, String::from(line));
    }
    match kind {
        Commentary::Comment => record.comment_counter = counter,
        Commentary::History => record.history_counter = counter,
    }
}

/// Append `text` as `comment<k>` fields, one per line.
///
/// The encoder writes these fields as COMMENT cards.
pub fn add_comment(record: &mut Record, text: &str) {
    append(record, Commentary::Comment, text);
}

/// Append `text` as `history<k>` fields, one per line.
pub fn add_history(record: &mut Record, text: &str) {
    append(record, Commentary::History, text);
}

/// Does `name` match `pattern`? A trailing `*` (or `.*`) matches any suffix.
fn matches_pattern(pattern: &str, name: &str) -> bool {
    let prefix = pattern
        .strip_suffix(".*")
        .or_else(|| pattern.strip_suffix('*'));
    match prefix {
        Some(prefix) => name
            .get(..prefix.len())
            .is_some_and(|head| head.eq_ignore_ascii_case(prefix)),
        None => name.eq_ignore_ascii_case(pattern),
    }
}

/// Remove every field whose name matches one of `patterns`, ignoring case.
///
/// `"tarray*"` and `"tarray.*"` both remove all fields starting with
/// `tarray`; any other pattern must match the whole name.
pub fn remove_keywords(record: &mut Record, patterns: &[&str]) {
    record.retain(|field| !patterns.iter().any(|p| matches_pattern(p, &field.name)));
}
