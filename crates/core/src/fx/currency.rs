//! Currency codes and the catalogue of currencies offered for display.

use serde::{Deserialize, Serialize};

/// A currency the store can display prices in.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrencyInfo {
    pub code: String,
    pub name: String,
    pub symbol: String,
}

impl CurrencyInfo {
    fn new(code: &str, name: &str, symbol: &str) -> Self {
        Self {
            code: code.to_string(),
            name: name.to_string(),
            symbol: symbol.to_string(),
        }
    }
}

/// (code, name, symbol)
const KNOWN_CURRENCIES: &[(&str, &str, &str)] = &[
    ("TRY", "Turkish Lira", "₺"),
    ("USD", "US Dollar", "$"),
    ("EUR", "Euro", "€"),
    ("GBP", "British Pound", "£"),
];

/// Trims and upper-cases a currency code.
pub fn normalize_currency_code(code: &str) -> String {
    code.trim().to_ascii_uppercase()
}

/// True for a three-letter ASCII alphabetic code (ISO 4217 shape).
pub fn is_valid_currency_code(code: &str) -> bool {
    code.len() == 3 && code.chars().all(|c| c.is_ascii_alphabetic())
}

/// Looks up display metadata for a known currency.
pub fn find_currency(code: &str) -> Option<CurrencyInfo> {
    let code = normalize_currency_code(code);
    KNOWN_CURRENCIES
        .iter()
        .find(|(known, _, _)| *known == code)
        .map(|(code, name, symbol)| CurrencyInfo::new(code, name, symbol))
}

/// Builds the catalogue for a base currency and the tracked currencies.
///
/// The base comes first, followed by tracked currencies in configuration
/// order. Codes without metadata use the code as name and symbol.
pub fn currency_catalogue(base: &str, tracked: &[String]) -> Vec<CurrencyInfo> {
    let mut catalogue: Vec<CurrencyInfo> = Vec::with_capacity(tracked.len() + 1);
    for code in std::iter::once(base).chain(tracked.iter().map(String::as_str)) {
        let code = normalize_currency_code(code);
        if catalogue.iter().any(|c| c.code == code) {
            continue;
        }
        let info = find_currency(&code).unwrap_or_else(|| CurrencyInfo::new(&code, &code, &code));
        catalogue.push(info);
    }
    catalogue
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_currency_code() {
        assert_eq!(normalize_currency_code(" usd "), "USD");
        assert_eq!(normalize_currency_code("Try"), "TRY");
    }

    #[test]
    fn test_is_valid_currency_code() {
        assert!(is_valid_currency_code("USD"));
        assert!(is_valid_currency_code("xyz"));
        assert!(!is_valid_currency_code("US"));
        assert!(!is_valid_currency_code("USDT"));
        assert!(!is_valid_currency_code("U$D"));
        assert!(!is_valid_currency_code(""));
    }

    #[test]
    fn test_find_currency() {
        let lira = find_currency("try").unwrap();
        assert_eq!(lira.symbol, "₺");
        assert!(find_currency("JPY").is_none());
    }

    #[test]
    fn test_catalogue_base_first_without_duplicates() {
        let tracked = vec!["USD".to_string(), "EUR".to_string(), "TRY".to_string()];
        let catalogue = currency_catalogue("TRY", &tracked);
        let codes: Vec<&str> = catalogue.iter().map(|c| c.code.as_str()).collect();
        assert_eq!(codes, vec!["TRY", "USD", "EUR"]);
    }

    #[test]
    fn test_catalogue_unknown_code_uses_code_as_symbol() {
        let catalogue = currency_catalogue("TRY", &["chf".to_string()]);
        assert_eq!(catalogue[1], CurrencyInfo::new("CHF", "CHF", "CHF"));
    }
}
