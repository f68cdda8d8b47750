//! Safe name derivation and resolution
//!
//! A safe name is the identifier that appears in URLs and on disk. It is
//! derived from a free-form display string and only ever contains
//! `[a-z0-9_-]`, never starts or ends with `-`, and never repeats `-`.

use std::sync::Arc;

use tracing::debug;
use unicode_normalization::{UnicodeNormalization, char::is_combining_mark};

use crate::errors::{AppError, AppResult};
use crate::models::Sheet;
use crate::repositories::SheetRepository;

/// Longest safe name in bytes
pub const MAX_SAFE_NAME_LEN: usize = 120;

const SEPARATOR: char = '-';

/// Prefix of the hash-based name used when nothing survives derivation
pub const HASHED_NAME_PREFIX: &str = "n-";

/// Letters without an ASCII decomposition
fn transliterate(c: char) -> Option<&'static str> {
    Some(match c {
        'ß' => "ss",
        'æ' => "ae",
        'œ' => "oe",
        'ø' => "o",
        'đ' | 'ð' => "d",
        'ł' | 'ŀ' => "l",
        'þ' => "th",
        'ı' => "i",
        'ħ' => "h",
        'ŧ' => "t",
        _ => return None,
    })
}

fn is_apostrophe(c: char) -> bool {
    matches!(c, '\'' | '\u{2019}' | '\u{2018}' | '`')
}

/// Derives the safe name for a display string.
///
/// Deterministic and idempotent: `derive_safe_name(&derive_safe_name(x)) ==
/// derive_safe_name(x)`. Distinct inputs may collapse to the same output.
pub fn derive_safe_name(display: &str) -> String {
    let mut out = String::with_capacity(display.len().min(MAX_SAFE_NAME_LEN));
    let mut pending_separator = false;

    for c in display.nfkd() {
        if is_combining_mark(c) || is_apostrophe(c) {
            continue;
        }

        for lower in c.to_lowercase() {
            if lower.is_ascii_lowercase() || lower.is_ascii_digit() || lower == '_' {
                let mut buf = [0u8; 4];
                push_part(&mut out, &mut pending_separator, lower.encode_utf8(&mut buf));
            } else if let Some(ascii) = transliterate(lower) {
                push_part(&mut out, &mut pending_separator, ascii);
            } else {
                pending_separator = true;
            }
        }

        if out.len() > MAX_SAFE_NAME_LEN {
            break;
        }
    }

    // Output is ASCII, so any byte index is a char boundary
    out.truncate(MAX_SAFE_NAME_LEN);
    let trimmed_len = out.trim_end_matches(SEPARATOR).len();
    out.truncate(trimmed_len);

    if out.is_empty() {
        let canonical: String = display.nfc().collect();
        let hashed = format!("{HASHED_NAME_PREFIX}{:016x}", fnv1a_64(canonical.as_bytes()));
        let input = display;
        debug!(
            display = %input,
            safe_name = %hashed,
            "Display name has no safe characters, using hash"
        );
        return hashed;
    }

    out
}

/// Appends `part`, emitting a single separator first if one is pending and
/// something precedes it.
fn push_part(out: &mut String, pending_separator: &mut bool, part: &str) {
    if *pending_separator && !out.is_empty() {
        out.push(SEPARATOR);
    }
    *pending_separator = false;
    out.push_str(part);
}

/// Picks `base`, `base-2`, `base-3`, ... whichever is first not taken.
///
/// Suffixed candidates shorten `base` so the result still fits
/// [`MAX_SAFE_NAME_LEN`].
pub fn next_available<F>(base: &str, mut is_taken: F) -> String
where
    F: FnMut(&str) -> bool,
{
    if !is_taken(base) {
        return base.to_string();
    }

    let mut counter: u64 = 2;
    loop {
        let suffix = format!("{SEPARATOR}{counter}");
        let mut keep = base.len().min(MAX_SAFE_NAME_LEN.saturating_sub(suffix.len()));
        while !base.is_char_boundary(keep) {
            keep -= 1;
        }
        let stem = base[..keep].trim_end_matches(SEPARATOR);
        let candidate = format!("{stem}{suffix}");
        if !is_taken(&candidate) {
            return candidate;
        }
        counter += 1;
    }
}

fn fnv1a_64(bytes: &[u8]) -> u64 {
    const FNV_OFFSET_BASIS: u64 = 0xcbf29ce484222325;
    const FNV_PRIME: u64 = 0x100000001b3;
    let mut hash = FNV_OFFSET_BASIS;
    for byte in bytes {
        hash ^= u64::from(*byte);
        hash = hash.wrapping_mul(FNV_PRIME);
    }
    hash
}

/// Looks sheets up by their stored safe name
#[derive(Clone)]
pub struct SafeNameResolver {
    repository: Arc<dyn SheetRepository>,
}

impl SafeNameResolver {
    pub fn new(repository: Arc<dyn SheetRepository>) -> Self {
        Self { repository }
    }

    /// Exact lookup of `safe_name`. Absence is `Ok(None)`.
    ///
    /// # Errors
    /// Blank input is a validation error and never reaches the repository.
    pub async fn resolve(&self, safe_name: &str) -> AppResult<Option<Sheet>> {
        if safe_name.trim().is_empty() {
            return Err(AppError::validation("Safe name cannot be empty"));
        }

        let sheet = self.repository.find_by_safe_name(safe_name).await?;
        debug!(safe_name = %safe_name, found = sheet.is_some(), "Resolved safe name");
        Ok(sheet)
    }
}
