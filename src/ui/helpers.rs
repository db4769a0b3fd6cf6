//! Shared formatting utilities.
//!
//! Weights are stored in grams and only converted here, at display time. Each
//! unit has a fixed precision:
//!
//! | Unit | Precision | Example    |
//! |------|-----------|------------|
//! | g    | 0         | `800 g`    |
//! | kg   | 3         | `0.800 kg` |
//! | lb   | 2         | `1.76 lb`  |
//!
//! # Example
//!
//! ```rust
//! use material_tracker::domain::UnitType;
//! use material_tracker::ui::helpers::format_weight;
//!
//! assert_eq!(format_weight(800.0, UnitType::Kilograms), "0.800 kg");
//! ```

use crate::domain::UnitType;

/// Formats a gram weight in `unit` with the unit symbol.
#[must_use]
pub fn format_weight(grams: f64, unit: UnitType) -> String {
    let value = unit.convert(grams);
    match unit {
        UnitType::Grams => format!("{value:.0} {}", unit.symbol()),
        UnitType::Kilograms => format!("{value:.3} {}", unit.symbol()),
        UnitType::Pounds => format!("{value:.2} {}", unit.symbol()),
    }
}

/// Formats a gram² variance in `unit`² with the squared symbol.
///
/// Variance scales by the square of the unit factor, so small units need more
/// decimals to stay readable.
#[must_use]
pub fn format_variance(grams_squared: f64, unit: UnitType) -> String {
    let factor = unit.factor();
    let value = grams_squared * factor * factor;
    match unit {
        UnitType::Grams => format!("{value:.2} {}²", unit.symbol()),
        UnitType::Kilograms | UnitType::Pounds => format!("{value:.6} {}²", unit.symbol()),
    }
}

/// Left-aligns `text` in a cell of `width` characters, truncating with `…`.
///
/// Operates on characters, not bytes, so multi-byte color names stay intact.
#[must_use]
pub fn fit(text: &str, width: usize) -> String {
    let len = text.chars().count();
    if len <= width {
        return format!("{text}{}", " ".repeat(width - len));
    }
    if width == 0 {
        return String::new();
    }
    let mut truncated: String = text.chars().take(width - 1).collect();
    truncated.push('…');
    truncated
}

/// Centers `text` within `cols` characters, padding the left side only.
#[must_use]
pub fn center(text: &str, cols: usize) -> String {
    let padding = cols.saturating_sub(text.chars().count()) / 2;
    format!("{}{text}", " ".repeat(padding))
}
