//! Locale-aware price formatting.

use crate::fx::currency::{is_valid_currency_code, normalize_currency_code};
use crate::fx::fx_errors::FxError;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::constants::DISPLAY_DECIMAL_PRECISION;

/// Display locales supported by the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum DisplayLocale {
    /// `₺1.234,56`
    #[default]
    #[serde(rename = "tr-TR")]
    TrTr,
    /// `$1,234.56`
    #[serde(rename = "en-US")]
    EnUs,
}

impl DisplayLocale {
    pub fn as_str(&self) -> &'static str {
        match self {
            DisplayLocale::TrTr => "tr-TR",
            DisplayLocale::EnUs => "en-US",
        }
    }

    fn group_separator(&self) -> char {
        match self {
            DisplayLocale::TrTr => '.',
            DisplayLocale::EnUs => ',',
        }
    }

    fn decimal_separator(&self) -> char {
        match self {
            DisplayLocale::TrTr => ',',
            DisplayLocale::EnUs => '.',
        }
    }

    /// Symbol used as a prefix, when the locale has one for `code`.
    fn symbol(&self, code: &str) -> Option<&'static str> {
        match (self, code) {
            (DisplayLocale::TrTr, "TRY") => Some("₺"),
            (_, "USD") => Some("$"),
            (_, "EUR") => Some("€"),
            (_, "GBP") => Some("£"),
            _ => None,
        }
    }
}

impl fmt::Display for DisplayLocale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DisplayLocale {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('_', "-").as_str() {
            "tr" | "tr-tr" => Ok(DisplayLocale::TrTr),
            "en" | "en-us" => Ok(DisplayLocale::EnUs),
            other => Err(format!("Unsupported display locale: {}", other)),
        }
    }
}

/// Formats `amount` in `currency` with two fraction digits for `locale`.
///
/// Falls back to `"<amount> <currency>"` when the code cannot be formatted.
pub fn format_amount(amount: Decimal, currency: &str, locale: DisplayLocale) -> String {
    match try_format(amount, currency, locale) {
        Ok(text) => text,
        Err(e) => {
            log::debug!("Falling back to plain price text: {}", e);
            format!("{} {}", amount, currency)
        }
    }
}

fn try_format(amount: Decimal, currency: &str, locale: DisplayLocale) -> Result<String, FxError> {
    let code = normalize_currency_code(currency);
    if !is_valid_currency_code(&code) {
        return Err(FxError::InvalidCurrencyCode(currency.to_string()));
    }

    let mut rounded = amount.round_dp_with_strategy(
        DISPLAY_DECIMAL_PRECISION,
        RoundingStrategy::MidpointAwayFromZero,
    );
    rounded.rescale(DISPLAY_DECIMAL_PRECISION);

    let negative = rounded.is_sign_negative() && !rounded.is_zero();
    let digits = rounded.abs().to_string();
    let (int_part, frac_part) = digits.split_once('.').unwrap_or((digits.as_str(), "00"));

    let number = format!(
        "{}{}{}",
        group_digits(int_part, locale.group_separator()),
        locale.decimal_separator(),
        frac_part
    );
    let sign = if negative { "-" } else { "" };

    Ok(match locale.symbol(&code) {
        Some(symbol) => format!("{}{}{}", sign, symbol, number),
        None => format!("{}{} {}", sign, code, number),
    })
}

fn group_digits(int_part: &str, separator: char) -> String {
    let len = int_part.len();
    let mut out = String::with_capacity(len + len / 3);
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (len - i) % 3 == 0 {
            out.push(separator);
        }
        out.push(ch);
    }
    out
}
