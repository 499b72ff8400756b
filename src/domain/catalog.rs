use std::cmp::Ordering;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::reservation::validate_amount;
use crate::error::{HotelError, Result};

/// An extra a guest can book alongside a stay (breakfast, parking, ...).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Service {
    pub id: String,
    pub property_id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub price: Decimal,
    #[serde(default)]
    pub tax_rate: Option<Decimal>,
    #[serde(default = "default_true")]
    pub is_refundable: bool,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

impl Service {
    /// Charge for `quantity` units, before tax.
    pub fn line_total(&self, quantity: u32) -> Decimal {
        self.price.saturating_mul(Decimal::from(quantity))
    }

    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(HotelError::validation("service name is required"));
        }
        validate_amount(&format!("price of service '{}'", self.name), self.price)?;
        if let Some(rate) = self.tax_rate
            && rate < Decimal::ZERO
        {
            return Err(HotelError::validation(format!(
                "service '{}' has a negative tax rate",
                self.name
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RuleType {
    Seasonal,
    Weekend,
    Weekday,
    Special,
}

impl std::fmt::Display for RuleType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Seasonal => write!(f, "SEASONAL"),
            Self::Weekend => write!(f, "WEEKEND"),
            Self::Weekday => write!(f, "WEEKDAY"),
            Self::Special => write!(f, "SPECIAL"),
        }
    }
}

/// A stored price adjustment. Records are exposed read-only; how rules
/// combine into a nightly price is not decided here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PricingRule {
    pub id: String,
    pub property_id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub rule_type: RuleType,
    #[serde(default)]
    pub start_date: Option<NaiveDate>,
    #[serde(default)]
    pub end_date: Option<NaiveDate>,
    pub adjustment: Decimal,
    #[serde(default = "default_true")]
    pub is_percentage: bool,
    #[serde(default = "default_true")]
    pub is_active: bool,
    #[serde(default)]
    pub priority: u32,
}

impl PricingRule {
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(HotelError::validation("pricing rule name is required"));
        }
        if let (Some(start), Some(end)) = (self.start_date, self.end_date)
            && end < start
        {
            return Err(HotelError::validation(format!(
                "pricing rule '{}' ends before it starts",
                self.name
            )));
        }
        Ok(())
    }

    /// Ordering used when listing rules: higher priority first, then name.
    pub fn listing_order(a: &Self, b: &Self) -> Ordering {
        b.priority
            .cmp(&a.priority)
            .then_with(|| a.name.cmp(&b.name))
            .then_with(|| a.id.cmp(&b.id))
    }
}

impl std::fmt::Display for PricingRule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let amount = if self.is_percentage {
            format!("{}%", self.adjustment.normalize())
        } else {
            format!("{:+.2}", self.adjustment)
        };
        write!(
            f,
            "[{}] {} ({}) {amount}",
            self.priority, self.name, self.rule_type
        )?;
        match (self.start_date, self.end_date) {
            (Some(start), Some(end)) => write!(f, " from {start} to {end}")?,
            (Some(start), None) => write!(f, " from {start}")?,
            (None, Some(end)) => write!(f, " until {end}")?,
            (None, None) => {}
        }
        if !self.is_active {
            write!(f, " (inactive)")?;
        }
        Ok(())
    }
}

fn default_true() -> bool {
    true
}
