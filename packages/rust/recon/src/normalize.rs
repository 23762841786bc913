//! Field value normalization passes.
//!
//! Each pass is a function `&str -> String` applied in sequence; the
//! pipeline cleans extraction artifacts out of a single raw field value.
//! Normalization never fails and is idempotent: running the pipeline on
//! its own output returns it unchanged.

use std::sync::LazyLock;

use regex::Regex;

use docstitch_schema::FieldKey;

/// Label prefixes the provider glues onto values.
const LABEL_PREFIXES: &[&str] = &["UID:"];

/// Token the provider emits for summary rows carrying no data.
const NO_DATA_SENTINEL: &str = "Summe";

/// Run the full normalization pipeline on one raw field value.
///
/// The field key drives the name-conditional rules: the no-data sentinel
/// is not blanked for the company name, since a company can legitimately
/// carry that word as its name.
pub fn normalize(key: FieldKey, raw: &str) -> String {
    // Pass 1: absent/empty input short-circuits everything.
    if raw.is_empty() {
        return String::new();
    }

    let mut value = collapse_numeric_echo(raw);
    value = truncate_at_line_break(&value);
    value = strip_label_prefixes(&value);

    // Pass 5 (name-conditional): blank the provider's summary-row token.
    if key != FieldKey::CompanyName && value.trim() == NO_DATA_SENTINEL {
        return String::new();
    }

    // Pass 6: trim surrounding whitespace.
    value.trim().to_string()
}

// ---------------------------------------------------------------------------
// Pass 2: Collapse numeric self-echo
// ---------------------------------------------------------------------------

/// Collapse a decimal number immediately repeated on the following line.
///
/// The provider sometimes echoes a currency amount twice across lines.
/// This runs ahead of line truncation because it needs to see the echoed
/// line; for a pure echo both orderings yield the same single occurrence.
fn collapse_numeric_echo(value: &str) -> String {
    static ECHO_RE: LazyLock<Regex> = LazyLock::new(|| {
        Regex::new(r"^\s*(\d+(?:[.,]\d+)*)\s*\n\s*(\d+(?:[.,]\d+)*)\s*$").expect("valid regex")
    });

    if let Some(caps) = ECHO_RE.captures(value) {
        if caps[1] == caps[2] {
            return caps[1].to_string();
        }
    }
    value.to_string()
}

// ---------------------------------------------------------------------------
// Pass 3: Truncate at the first line break
// ---------------------------------------------------------------------------

/// Keep only the content before the first line break.
///
/// Extraction artifacts frequently duplicate a value across lines; the
/// first line carries the value.
fn truncate_at_line_break(value: &str) -> String {
    match value.split_once('\n') {
        Some((first, _)) => first.trim_end_matches('\r').to_string(),
        None => value.to_string(),
    }
}

// ---------------------------------------------------------------------------
// Pass 4: Strip label prefixes
// ---------------------------------------------------------------------------

/// Remove leading label prefixes such as `"UID:"`.
///
/// Strips repeatedly so a doubled label cannot survive one pipeline run;
/// this is what keeps the pipeline idempotent.
fn strip_label_prefixes(value: &str) -> String {
    let mut v = value.trim_start();
    loop {
        let mut stripped = false;
        for prefix in LABEL_PREFIXES {
            if let Some(rest) = v.strip_prefix(prefix) {
                v = rest.trim_start();
                stripped = true;
            }
        }
        if !stripped {
            break;
        }
    }
    v.to_string()
}
