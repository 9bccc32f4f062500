use crate::fx::currency::normalize_currency_code;
use crate::fx::fx_errors::FxError;
use crate::fx::fx_model::ExchangeRateSet;
use rust_decimal::Decimal;

/// Converts amounts between currencies through the base of a rate set.
///
/// Every conversion goes `from -> base -> to`:
/// `in_base = amount / rates[from]`, `result = in_base * rates[to]`, with
/// the base's rate fixed at one. No rounding is applied here; rounding is a
/// display concern.
pub struct CurrencyConverter<'a> {
    rates: &'a ExchangeRateSet,
}

impl<'a> CurrencyConverter<'a> {
    pub fn new(rates: &'a ExchangeRateSet) -> Self {
        Self { rates }
    }

    /// Rate of `code` against the base, or `MissingRate`.
    pub fn get_rate(&self, code: &str) -> Result<Decimal, FxError> {
        self.rates
            .rate(code)
            .ok_or_else(|| FxError::MissingRate(normalize_currency_code(code)))
    }

    pub fn convert_amount(
        &self,
        amount: Decimal,
        from: &str,
        to: &str,
    ) -> Result<Decimal, FxError> {
        let from = normalize_currency_code(from);
        let to = normalize_currency_code(to);

        if from == to {
            return Ok(amount);
        }

        let base = &self.rates.base;

        let in_base = if &from == base {
            amount
        } else {
            let from_rate = self.get_rate(&from)?;
            amount.checked_div(from_rate).ok_or_else(|| {
                FxError::InvalidRate(format!("{} / {} ({}) overflowed", amount, from_rate, from))
            })?
        };

        if &to == base {
            return Ok(in_base);
        }

        let to_rate = self.get_rate(&to)?;
        in_base.checked_mul(to_rate).ok_or_else(|| {
            FxError::InvalidRate(format!("{} * {} ({}) overflowed", in_base, to_rate, to))
        })
    }
}

/// Converts `amount` from `from` to `to` using `rates`.
///
/// Identity conversions always succeed, even for currencies the set does not
/// quote. A missing rate on either side fails with `FxError::MissingRate`.
pub fn convert(
    amount: Decimal,
    from: &str,
    to: &str,
    rates: &ExchangeRateSet,
) -> Result<Decimal, FxError> {
    CurrencyConverter::new(rates).convert_amount(amount, from, to)
}
