use rust_decimal::Decimal;
use serde::Serialize;

/// The independent alert kinds tracked per pair, each with its own cooldown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum AlertKind {
    UpperBreach,
    LowerBreach,
    PercentMove,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum MoveDirection {
    Up,
    Down,
}

/// An alert that passed the cooldown gate and must be dispatched.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum FiredAlert {
    UpperBreach {
        symbol: String,
        price: Decimal,
        threshold: Decimal,
    },
    LowerBreach {
        symbol: String,
        price: Decimal,
        threshold: Decimal,
    },
    PercentMove {
        symbol: String,
        from: Decimal,
        to: Decimal,
        /// Signed fractional change, `(to - from) / from`.
        change: Decimal,
        direction: MoveDirection,
    },
}

impl FiredAlert {
    pub fn kind(&self) -> AlertKind {
        match self {
            FiredAlert::UpperBreach { .. } => AlertKind::UpperBreach,
            FiredAlert::LowerBreach { .. } => AlertKind::LowerBreach,
            FiredAlert::PercentMove { .. } => AlertKind::PercentMove,
        }
    }

    pub fn symbol(&self) -> &str {
        match self {
            FiredAlert::UpperBreach { symbol, .. }
            | FiredAlert::LowerBreach { symbol, .. }
            | FiredAlert::PercentMove { symbol, .. } => symbol,
        }
    }
}
