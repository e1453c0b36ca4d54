//! Parser for comma-separated dataset files.
//!
//! Two layouts are understood, both with a header line:
//! - item files: `id,title,tags` (movies: `movieId,title,genres`, books: `id,title,author`)
//! - rating files: `user,item,rating[,...]`, extra columns such as a timestamp are ignored
//!
//! Titles frequently contain commas ("American President, The (1995)") so
//! fields may be double-quoted, with `""` standing for a literal quote.

use crate::error::{DataLoadError, Result};
use crate::types::*;
use std::fs;
use std::path::Path;

/// Read a file and split it into lines
///
/// Invalid UTF-8 sequences are replaced instead of failing the whole file.
fn read_lines(path: &Path) -> Result<Vec<String>> {
    let bytes = fs::read(path).map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => DataLoadError::FileNotFound {
            path: path.display().to_string(),
        },
        _ => DataLoadError::from(e),
    })?;
    let content = String::from_utf8_lossy(&bytes);

    Ok(content.lines().map(|s| s.to_string()).collect())
}

fn file_label(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Split one CSV line into fields, honouring double quotes
pub fn split_csv_line(line: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '"' if in_quotes => {
                if chars.peek() == Some(&'"') {
                    current.push('"');
                    chars.next();
                } else {
                    in_quotes = false;
                }
            }
            '"' if current.is_empty() => in_quotes = true,
            ',' if !in_quotes => fields.push(std::mem::take(&mut current)),
            _ => current.push(c),
        }
    }
    fields.push(current);
    fields
}

/// Parse an item file into catalog entries, in file order
pub fn parse_items(path: &Path) -> Result<Vec<Item>> {
    let lines = read_lines(path)?;
    let file = file_label(path);
    let mut items = Vec::new();

    // Line 1 is the header
    for (idx, line) in lines.iter().enumerate().skip(1) {
        let line_no = idx + 1;
        if line.trim().is_empty() {
            continue;
        }

        let fields = split_csv_line(line);
        if fields.len() < 3 {
            return Err(DataLoadError::FieldCountMismatch {
                expected: 3,
                found: fields.len(),
                line: line_no,
            });
        }

        let id = fields[0].trim();
        if id.is_empty() {
            return Err(DataLoadError::ParseError {
                file: file.clone(),
                line: line_no,
                reason: "Missing item id".to_string(),
            });
        }

        items.push(Item::new(id, fields[1].trim(), fields[2].trim()));
    }

    Ok(items)
}

/// Parse a rating file into observations, in file order
pub fn parse_ratings(path: &Path) -> Result<Vec<RatingEntry>> {
    let lines = read_lines(path)?;
    let file = file_label(path);
    let mut ratings = Vec::new();

    for (idx, line) in lines.iter().enumerate().skip(1) {
        let line_no = idx + 1;
        if line.trim().is_empty() {
            continue;
        }

        let fields = split_csv_line(line);
        let mut parts = fields.iter().map(|f| f.trim());

        let user_id = parts
                    .next()
                    .filter(|s| !s.is_empty())
                    .ok_or_else(
                        || DataLoadError::ParseError {
                            file: file.clone(),
                            line: line_no,
                            reason: "Missing user id".to_string(),
                        }
                    )?;
        let item_id = parts
                    .next()
                    .filter(|s| !s.is_empty())
                    .ok_or_else(
                        || DataLoadError::ParseError {
                            file: file.clone(),
                            line: line_no,
                            reason: "Missing item id".to_string(),
                        }
                    )?;
        let rating_value = parts
                    .next()
                    .ok_or_else(
                        || DataLoadError::ParseError {
                            file: file.clone(),
                            line: line_no,
                            reason: "Missing rating".to_string(),
                        }
                    )?;

        let value = parse_rating_value(rating_value).map_err(|reason| DataLoadError::ParseError {
            file: file.clone(),
            line: line_no,
            reason,
        })?;

        ratings.push(RatingEntry::new(user_id, item_id, value));
    }

    Ok(ratings)
}

/// Parse a rating value, rejecting NaN and infinities
fn parse_rating_value(s: &str) -> std::result::Result<f32, String> {
    let value: f32 = s
        .parse()
        .map_err(|e| format!("Invalid rating '{}': {}", s, e))?;
    if !value.is_finite() {
        return Err(format!("Invalid rating '{}': not a finite number", s));
    }
    Ok(value)
}
