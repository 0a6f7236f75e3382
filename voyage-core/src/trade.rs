//! Commodity price movement driven by supply, demand and volatility.
//!
//! All prices are integer cents.
use log::debug;
use serde::{Deserialize, Serialize};

use crate::constants::{
    BASIS_POINTS, TRADE_EMPTY_SUPPLY_MODIFIER, TRADE_FALLING_THRESHOLD, TRADE_NEUTRAL_PROSPERITY,
    TRADE_RISING_THRESHOLD, TRADE_SHOCK_DIVISOR, TRADE_SPREAD_DIVISOR,
};
use crate::dice::Dice;
use crate::numbers::{clamp_i64_to_u32, floor_f64_to_u32, round_f64_to_u64, u64_to_f64};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PriceTrend {
    Rising,
    Falling,
    #[default]
    Stable,
}

/// Market price of one commodity at one port.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceQuote {
    pub base_price: u64,
    pub current_price: u64,
    /// What the port pays when a captain sells.
    pub buy_price: u64,
    /// What the port charges when a captain buys.
    pub sell_price: u64,
    pub supply: u32,
    pub demand: u32,
    pub volatility: f64,
    pub trend: PriceTrend,
}

impl PriceQuote {
    /// Fresh quote at base price with the standard spread.
    #[must_use]
    pub fn new(base_price: u64, supply: u32, demand: u32, volatility: f64) -> Self {
        let (buy_price, sell_price) = spread(base_price);
        Self {
            base_price,
            current_price: base_price,
            buy_price,
            sell_price,
            supply,
            demand,
            volatility,
            trend: PriceTrend::Stable,
        }
    }
}

/// Result of moving a quote.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceUpdate {
    pub previous_price: u64,
    /// Demand/supply ratio times volatility, absent when demand is zero.
    pub modifier: Option<f64>,
    pub quote: PriceQuote,
}

fn spread(price: u64) -> (u64, u64) {
    let margin = price / TRADE_SPREAD_DIVISOR;
    ((price - margin).max(1), price.saturating_add(margin))
}

fn shift(value: u32, change: i64) -> u32 {
    clamp_i64_to_u32(i64::from(value).saturating_add(change))
}

/// Apply supply and demand changes and reprice.
///
/// Supply and demand floor at zero. With no demand the price stays where it
/// was.
#[must_use]
pub fn update_price(quote: &PriceQuote, supply_change: i64, demand_change: i64) -> PriceUpdate {
    let mut next = quote.clone();
    next.supply = shift(quote.supply, supply_change);
    next.demand = shift(quote.demand, demand_change);

    let modifier = (next.demand > 0).then(|| {
        let pressure = if next.supply == 0 {
            TRADE_EMPTY_SUPPLY_MODIFIER
        } else {
            f64::from(next.demand) / f64::from(next.supply)
        };
        pressure * next.volatility
    });

    if let Some(modifier) = modifier {
        next.current_price = round_f64_to_u64(u64_to_f64(next.base_price) * modifier);
        (next.buy_price, next.sell_price) = spread(next.current_price);
        next.trend = if modifier > TRADE_RISING_THRESHOLD {
            PriceTrend::Rising
        } else if modifier < TRADE_FALLING_THRESHOLD {
            PriceTrend::Falling
        } else {
            PriceTrend::Stable
        };
    }

    PriceUpdate {
        previous_price: quote.current_price,
        modifier,
        quote: next,
    }
}

/// Economic backdrop of a port.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarketConditions {
    /// 1-10, with 5 neutral.
    pub prosperity_level: u32,
    pub trade_volume: u32,
    /// Sales tax in basis points.
    pub tax_rate_bp: u32,
}

impl Default for MarketConditions {
    fn default() -> Self {
        Self {
            prosperity_level: 5,
            trade_volume: 100,
            tax_rate_bp: 500,
        }
    }
}

/// Roll one market tick: random supply and demand shocks sized by
/// volatility and volume, demand nudged by prosperity, then reprice.
pub fn roll_market_tick<D: Dice + ?Sized>(
    quote: &PriceQuote,
    market: &MarketConditions,
    dice: &mut D,
) -> PriceUpdate {
    let span = i64::from(floor_f64_to_u32(
        quote.volatility * f64::from(market.trade_volume) / TRADE_SHOCK_DIVISOR,
    ));
    let supply_change = dice.between(-span, span);
    let bias = i64::from(market.prosperity_level) - TRADE_NEUTRAL_PROSPERITY;
    let demand_change = dice.between(-span, span) + bias;
    let update = update_price(quote, supply_change, demand_change);
    debug!(
        "market tick: supply {supply_change:+} demand {demand_change:+} price {} -> {}",
        update.previous_price, update.quote.current_price
    );
    update
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaleProceeds {
    pub gross: u64,
    pub tax: u64,
    pub net: u64,
}

/// Proceeds of selling `quantity` units at `price` after market tax.
#[must_use]
pub fn sale_proceeds(price: u64, quantity: u32, tax_rate_bp: u32) -> SaleProceeds {
    let gross = price.saturating_mul(u64::from(quantity));
    let tax = gross.saturating_mul(u64::from(tax_rate_bp)) / BASIS_POINTS;
    SaleProceeds {
        gross,
        tax: tax.min(gross),
        net: gross - tax.min(gross),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dice::ScriptedDice;

    #[test]
    fn fresh_quote_has_spread() {
        let quote = PriceQuote::new(1_000, 50, 50, 1.0);
        assert_eq!(quote.buy_price, 900);
        assert_eq!(quote.sell_price, 1_100);
    }

    #[test]
    fn scarcity_raises_price() {
        let quote = PriceQuote::new(1_000, 100, 100, 1.0);
        let update = update_price(&quote, -50, 0);
        assert_eq!(update.quote.current_price, 2_000);
        assert_eq!(update.quote.trend, PriceTrend::Rising);
        assert_eq!(update.previous_price, 1_000);
        assert_eq!(update.quote.buy_price, 1_800);
        assert_eq!(update.quote.sell_price, 2_200);
    }

    #[test]
    fn glut_lowers_price() {
        let quote = PriceQuote::new(1_000, 100, 100, 1.0);
        let update = update_price(&quote, 100, -50);
        assert_eq!(update.quote.current_price, 250);
        assert_eq!(update.quote.trend, PriceTrend::Falling);
    }

    #[test]
    fn empty_supply_uses_fixed_pressure() {
        let quote = PriceQuote::new(500, 10, 10, 1.2);
        let update = update_price(&quote, -30, 0);
        assert_eq!(update.quote.supply, 0);
        assert_eq!(update.modifier, Some(2.4));
        assert_eq!(update.quote.current_price, 1_200);
    }

    #[test]
    fn zero_demand_leaves_price_alone() {
        let quote = PriceQuote::new(800, 10, 10, 1.0);
        let update = update_price(&quote, 5, -20);
        assert_eq!(update.quote.demand, 0);
        assert_eq!(update.modifier, None);
        assert_eq!(update.quote.current_price, 800);
        assert_eq!(update.quote.supply, 15);
    }

    #[test]
    fn cheap_goods_keep_a_positive_buy_price() {
        let quote = PriceQuote::new(1, 1, 1, 1.0);
        assert_eq!(quote.buy_price, 1);
        let update = update_price(&quote, 1_000, 0);
        assert_eq!(update.quote.current_price, 0);
        assert_eq!(update.quote.buy_price, 1);
    }

    #[test]
    fn prosperity_biases_demand() {
        let quote = PriceQuote::new(1_000, 100, 100, 1.0);
        let market = MarketConditions {
            prosperity_level: 9,
            ..MarketConditions::default()
        };
        let mut dice = ScriptedDice::new().values([0, 0]);
        let update = roll_market_tick(&quote, &market, &mut dice);
        assert_eq!(update.quote.demand, 104);
        assert_eq!(update.quote.supply, 100);
        assert_eq!(update.quote.current_price, 1_040);
    }

    #[test]
    fn tax_comes_off_the_top() {
        let proceeds = sale_proceeds(1_250, 8, 500);
        assert_eq!(proceeds.gross, 10_000);
        assert_eq!(proceeds.tax, 500);
        assert_eq!(proceeds.net, 9_500);
    }
}
