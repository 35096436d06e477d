//! Contact list parsing.
//!
//! Two input shapes are accepted:
//! - a delimited file whose first line is a header (any column mentioning
//!   `name`, `phone` or `number`); extra columns become custom fields
//! - legacy headerless lines of `name, phone` or a bare phone, separated by
//!   commas, tabs, or runs of two or more spaces

use crate::phone::{normalize_phone, PhoneRejection};
use herald_core::error::HeraldError;
use herald_core::model::{CustomFields, ImportContact};
use regex::Regex;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::OnceLock;
use tracing::debug;

/// Name + phone + up to ten custom fields.
pub const MAX_COLUMNS: usize = 12;

const HEADER_KEYWORDS: &[&str] = &["name", "phone", "number"];
const DELIMITERS: &[u8] = b",;\t";

#[derive(Debug, Clone, Default)]
pub struct ParseOptions {
    /// Country code applied to numbers written without `+`.
    pub default_country_code: Option<String>,
}

/// Parsed contacts plus a summary of the rows that were dropped.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportOutcome {
    pub contacts: Vec<ImportContact>,
    pub skipped_count: usize,
    pub skipped_message: Option<String>,
    /// Rows folded into an earlier row with the same phone number.
    pub duplicates_merged: usize,
}

/// Parse a pasted or uploaded contact list.
///
/// Fails only when the header itself is unusable (too many columns or no
/// phone column); bad rows are skipped and counted.
pub fn parse_contacts(text: &str, options: &ParseOptions) -> Result<ImportOutcome, HeraldError> {
    let Some(first_line) = text.lines().map(str::trim).find(|l| !l.is_empty()) else {
        return Ok(ImportOutcome::default());
    };

    let delimiter = detect_delimiter(first_line);
    let rows = if is_header(first_line, delimiter) {
        parse_with_header(text, delimiter)?
    } else {
        parse_legacy(text)
    };

    Ok(collect(rows, options.default_country_code.as_deref()))
}

/// The candidate delimiter occurring most often in the header line.
fn detect_delimiter(line: &str) -> u8 {
    // Ties go to the earlier entry in DELIMITERS.
    DELIMITERS
        .iter()
        .copied()
        .enumerate()
        .map(|(rank, d)| (rank, d, line.bytes().filter(|b| *b == d).count()))
        .filter(|(_, _, n)| *n > 0)
        .max_by(|a, b| a.2.cmp(&b.2).then(b.0.cmp(&a.0)))
        .map(|(_, d, _)| d)
        .unwrap_or(b',')
}

/// A line is a header when any field mentions a header keyword.
fn is_header(line: &str, delimiter: u8) -> bool {
    line.split(delimiter as char).any(|field| {
        let field = field.trim().trim_matches('"').to_lowercase();
        HEADER_KEYWORDS.iter().any(|k| field.contains(k))
    })
}

/// One input row before phone validation.
struct RawRow {
    name: String,
    phone: String,
    custom_fields: CustomFields,
}

struct Columns {
    phone: usize,
    name: Option<usize>,
    custom: Vec<(usize, String)>,
}

fn locate_columns(headers: &[String]) -> Result<Columns, HeraldError> {
    let lower: Vec<String> = headers.iter().map(|h| h.to_lowercase()).collect();
    let phone = lower
        .iter()
        .position(|h| h.contains("phone"))
        .or_else(|| lower.iter().position(|h| h.contains("number")))
        .ok_or_else(|| {
            HeraldError::Import("No phone column found in header row".to_string())
        })?;
    let name = lower
        .iter()
        .enumerate()
        .position(|(i, h)| i != phone && h.contains("name"));
    let custom = headers
        .iter()
        .enumerate()
        .filter(|(i, h)| *i != phone && Some(*i) != name && !h.is_empty())
        .map(|(i, h)| (i, h.clone()))
        .collect();
    Ok(Columns {
        phone,
        name,
        custom,
    })
}

fn parse_with_header(text: &str, delimiter: u8) -> Result<Vec<RawRow>, HeraldError> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(text.trim().as_bytes());

    let headers: Vec<String> = reader
        .headers()
        .map_err(|e| HeraldError::Import(format!("unreadable header row: {e}")))?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();

    if headers.len() > MAX_COLUMNS {
        return Err(HeraldError::Import(format!(
            "Too many columns: found {}, maximum is {MAX_COLUMNS} \
             (name, phone and up to {} custom fields)",
            headers.len(),
            MAX_COLUMNS - 2
        )));
    }
    let columns = locate_columns(&headers)?;

    let mut rows = Vec::new();
    for (line, record) in reader.records().enumerate() {
        let record = match record {
            Ok(r) => r,
            Err(e) => {
                debug!("import: unreadable row {}: {e}", line + 2);
                rows.push(RawRow {
                    name: String::new(),
                    phone: String::new(),
                    custom_fields: CustomFields::new(),
                });
                continue;
            }
        };
        if record.iter().all(|f| f.is_empty()) {
            continue;
        }
        let cell = |i: usize| record.get(i).unwrap_or("").to_string();
        let custom_fields = columns
            .custom
            .iter()
            .map(|(i, key)| (key.clone(), cell(*i)))
            .filter(|(_, v)| !v.is_empty())
            .collect();
        rows.push(RawRow {
            name: columns.name.map(cell).unwrap_or_default(),
            phone: cell(columns.phone),
            custom_fields,
        });
    }
    Ok(rows)
}

fn legacy_split_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[,\t]+|\s{2,}").expect("static split regex"))
}

fn parse_legacy(text: &str) -> Vec<RawRow> {
    text.lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(|line| {
            let parts: Vec<&str> = legacy_split_regex()
                .split(line)
                .map(str::trim)
                .filter(|p| !p.is_empty())
                .collect();
            let (name, phone) = match parts.as_slice() {
                [phone] => ("", *phone),
                [name, phone, ..] => (*name, *phone),
                [] => ("", ""),
            };
            RawRow {
                name: name.to_string(),
                phone: phone.to_string(),
                custom_fields: CustomFields::new(),
            }
        })
        .collect()
}

/// Validate phones, fold duplicates, and summarise what was skipped.
fn collect(rows: Vec<RawRow>, default_country: Option<&str>) -> ImportOutcome {
    let mut outcome = ImportOutcome::default();
    let mut by_phone: HashMap<String, usize> = HashMap::new();
    let mut rejected: Vec<(PhoneRejection, usize)> = Vec::new();

    for row in rows {
        let phone = match normalize_phone(&row.phone, default_country) {
            Ok(p) => p,
            Err(reason) => {
                match rejected.iter_mut().find(|(r, _)| *r == reason) {
                    Some((_, n)) => *n += 1,
                    None => rejected.push((reason, 1)),
                }
                outcome.skipped_count += 1;
                continue;
            }
        };

        match by_phone.get(&phone) {
            Some(&idx) => {
                let existing = &mut outcome.contacts[idx];
                if !row.name.is_empty() {
                    existing.name = row.name;
                }
                existing.custom_fields.extend(row.custom_fields);
                outcome.duplicates_merged += 1;
            }
            None => {
                by_phone.insert(phone.clone(), outcome.contacts.len());
                outcome.contacts.push(ImportContact {
                    name: row.name,
                    phone_number: phone,
                    custom_fields: row.custom_fields,
                });
            }
        }
    }

    if outcome.skipped_count > 0 {
        let reasons: Vec<String> = rejected
            .iter()
            .map(|(reason, n)| format!("{n} {reason}"))
            .collect();
        let mut message = format!(
            "Skipped {} row{}: {}",
            outcome.skipped_count,
            if outcome.skipped_count == 1 { "" } else { "s" },
            reasons.join(", ")
        );
        if rejected
            .iter()
            .any(|(r, _)| *r == PhoneRejection::NoCountryCode)
        {
            message.push_str(". Select a default country code or write numbers as +<code><number>");
        }
        outcome.skipped_message = Some(message);
    }
    outcome
}
