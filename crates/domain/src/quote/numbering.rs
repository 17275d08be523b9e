//! Quote document numbers: `ORC-{company_id}-{sequence:05}`.

use common::CompanyId;

pub const NUMBER_PREFIX: &str = "ORC";

/// Formats a quote number. Sequences above 99999 simply grow wider.
pub fn format_number(company_id: CompanyId, sequence: u32) -> String {
    format!("{NUMBER_PREFIX}-{company_id}-{sequence:05}")
}

/// Extracts the numeric suffix after the last `-`.
pub fn parse_sequence(number: &str) -> Option<u32> {
    let suffix = number.rsplit('-').next()?;
    if suffix.is_empty() || !suffix.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    suffix.parse().ok()
}

/// Returns one past the highest parseable suffix, or 1 when there is none.
pub fn next_sequence<'a, I>(numbers: I) -> u32
where
    I: IntoIterator<Item = &'a str>,
{
    numbers
        .into_iter()
        .filter_map(parse_sequence)
        .max()
        .map_or(1, |max| max.saturating_add(1))
}
