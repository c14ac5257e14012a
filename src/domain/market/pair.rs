use crate::domain::errors::PairConfigError;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Quote currency assumed when the user only types a base symbol.
pub const DEFAULT_QUOTE: &str = "USDT";

/// Normalizes user input into the canonical `BASE/QUOTE` pair symbol.
///
/// Accepts `DOT`, `dot`, `DOT-USDT`, `dot / usdt` and `DOT/USDT`, all of
/// which become `DOT/USDT`.
pub fn normalize_pair_symbol(input: &str) -> Result<String, PairConfigError> {
    let compact: String = input
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect::<String>()
        .to_ascii_uppercase()
        .replace('-', "/");

    let invalid = |reason: &str| PairConfigError::InvalidSymbol {
        symbol: input.to_string(),
        reason: reason.to_string(),
    };

    if compact.is_empty() {
        return Err(invalid("empty symbol"));
    }

    let parts: Vec<&str> = compact.split('/').collect();
    let (base, quote) = match parts.as_slice() {
        [base] => (*base, DEFAULT_QUOTE),
        [base, quote] => (*base, *quote),
        _ => return Err(invalid("expected BASE/QUOTE")),
    };

    for part in [base, quote] {
        if part.is_empty() {
            return Err(invalid("missing base or quote currency"));
        }
        if !part.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(invalid("currency codes must be alphanumeric"));
        }
    }

    Ok(format!("{}/{}", base, quote))
}

/// A monitored instrument with its optional alert thresholds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradingPair {
    pub symbol: String,
    pub upper: Option<Decimal>,
    pub lower: Option<Decimal>,
}

impl TradingPair {
    /// Builds a validated pair. The symbol is normalized; thresholds must be
    /// positive and, when both are present, `upper > lower`.
    pub fn new(
        symbol: &str,
        upper: Option<Decimal>,
        lower: Option<Decimal>,
    ) -> Result<Self, PairConfigError> {
        let symbol = normalize_pair_symbol(symbol)?;
        validate_thresholds(&symbol, upper, lower)?;
        Ok(Self {
            symbol,
            upper,
            lower,
        })
    }

    pub fn base(&self) -> &str {
        self.symbol.split('/').next().unwrap_or(&self.symbol)
    }

    pub fn quote(&self) -> &str {
        self.symbol.split('/').nth(1).unwrap_or(DEFAULT_QUOTE)
    }

    pub fn has_thresholds(&self) -> bool {
        self.upper.is_some() || self.lower.is_some()
    }
}

fn validate_thresholds(
    symbol: &str,
    upper: Option<Decimal>,
    lower: Option<Decimal>,
) -> Result<(), PairConfigError> {
    let invalid = |reason: &str| PairConfigError::InvalidThresholds {
        symbol: symbol.to_string(),
        reason: reason.to_string(),
    };

    if upper.is_some_and(|u| u <= Decimal::ZERO) || lower.is_some_and(|l| l <= Decimal::ZERO) {
        return Err(invalid("thresholds must be positive"));
    }
    if let (Some(u), Some(l)) = (upper, lower)
        && u <= l
    {
        return Err(invalid("upper must be greater than lower"));
    }
    Ok(())
}
