//! Index token layout
//!
//! Every indexed field value is stored as a member of the field's sorted set
//! with score 0, so the set orders members by byte comparison alone. A
//! member is the token `{index_value}:{id}`; the ID is the text after the
//! last `:`.
//!
//! The index value depends on `IndexEncoding`:
//!
//! - `Lexical` uses the normalized string as-is. Decimal strings do not
//!   sort numerically (`"10" < "5"`).
//! - `Ordered` maps NUMBER and DATE to 16 lowercase hex digits whose byte
//!   order matches numeric order. STRING is unchanged.

use crate::config::IndexEncoding;
use recordkv_core::{FieldType, RecordId};

/// Upper sentinel appended to a prefix to cover every ID after it
pub const LEX_MAX: char = '\u{ff}';

/// Separator between the index value and the ID in a token
pub const TOKEN_SEPARATOR: char = ':';

const SIGN_BIT: u64 = 1 << 63;

/// Index value of a normalized field string
///
/// Fails only in `Ordered` mode, when a NUMBER or DATE string does not parse.
pub fn index_value(
    encoding: IndexEncoding,
    field_type: FieldType,
    normalized: &str,
) -> Result<String, String> {
    match (encoding, field_type) {
        (IndexEncoding::Lexical, _) | (_, FieldType::String) => Ok(normalized.to_string()),
        (IndexEncoding::Ordered, FieldType::Number) => normalized
            .parse::<f64>()
            .ok()
            .filter(|n| n.is_finite())
            .map(ordered_number)
            .ok_or_else(|| format!("`{}` is not a finite number", normalized)),
        (IndexEncoding::Ordered, FieldType::Date) => normalized
            .parse::<i64>()
            .map(ordered_seconds)
            .map_err(|_| format!("`{}` is not a unix timestamp", normalized)),
    }
}

/// Order-preserving image of a finite `f64`
pub fn ordered_number(n: f64) -> String {
    // -0 and 0 share one image
    let n = if n == 0.0 { 0.0 } else { n };
    let bits = n.to_bits();
    let image = if bits & SIGN_BIT == 0 {
        bits | SIGN_BIT
    } else {
        !bits
    };
    format!("{:016x}", image)
}

/// Order-preserving image of epoch seconds
pub fn ordered_seconds(secs: i64) -> String {
    format!("{:016x}", (secs as u64) ^ SIGN_BIT)
}

/// Index member for one value of one record
pub fn token(index_value: &str, id: RecordId) -> String {
    format!("{}{}{}", index_value, TOKEN_SEPARATOR, id)
}

/// ID carried by an index member, if it parses
pub fn parse_token_id(token: &str) -> Option<RecordId> {
    let (_, id) = token.rsplit_once(TOKEN_SEPARATOR)?;
    id.parse().ok()
}
