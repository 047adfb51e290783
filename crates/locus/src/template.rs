//! Positional placeholder substitution for templated locators.
//!
//! `%s` and `%d` each consume the next argument in order; `%%` is a literal
//! percent sign. Any other `%` sequence is copied unchanged, so xpath such as
//! `contains(@style,'50%')` needs no escaping.

use std::fmt::{self, Write as _};

use crate::result::{LocusError, LocusResult};

/// Number of positional placeholders in `template`
#[must_use]
pub fn placeholder_count(template: &str) -> usize {
    let mut count = 0;
    let mut chars = template.chars().peekable();
    while let Some(ch) = chars.next() {
        if ch != '%' {
            continue;
        }
        match chars.peek() {
            Some('s' | 'd') => {
                count += 1;
                let _ = chars.next();
            }
            Some('%') => {
                let _ = chars.next();
            }
            _ => {}
        }
    }
    count
}

/// Substitute `args` into `template` in order.
///
/// Fails with [`LocusError::LocatorBindingArityError`] when the argument count
/// differs from the placeholder count.
pub fn substitute(template: &str, args: &[&dyn fmt::Display]) -> LocusResult<String> {
    let expected = placeholder_count(template);
    if expected != args.len() {
        return Err(LocusError::LocatorBindingArityError {
            template: template.to_string(),
            expected,
            actual: args.len(),
        });
    }

    let mut out = String::with_capacity(template.len());
    let mut args = args.iter();
    let mut chars = template.chars().peekable();
    while let Some(ch) = chars.next() {
        if ch != '%' {
            out.push(ch);
            continue;
        }
        match chars.peek() {
            Some('s' | 'd') => {
                let _ = chars.next();
                if let Some(arg) = args.next() {
                    let _ = write!(out, "{arg}");
                }
            }
            Some('%') => {
                let _ = chars.next();
                out.push('%');
            }
            _ => out.push('%'),
        }
    }
    Ok(out)
}
