//! Order totals and the weight-tiered shipping table.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

/// Weight covered by one shipping unit.
pub const SHIPPING_BLOCK_WEIGHT: Decimal = dec!(30);
/// Charge per started block.
pub const SHIPPING_BLOCK_COST: Decimal = dec!(30);

/// Shipping charge for a total weight: one unit per started 30-weight block,
/// nothing for a weightless order.
pub fn shipping_cost(total_weight: Decimal) -> Decimal {
    if total_weight <= Decimal::ZERO {
        return Decimal::ZERO;
    }
    (total_weight / SHIPPING_BLOCK_WEIGHT).ceil() * SHIPPING_BLOCK_COST
}

/// One priced line taken from a cart snapshot.
#[derive(Debug, Clone, Copy)]
pub struct PricedLine {
    pub unit_price: Decimal,
    pub unit_weight: Decimal,
    pub quantity: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrderTotals {
    pub subtotal: Decimal,
    pub total_weight: Decimal,
    pub shipping_cost: Decimal,
    pub total_amount: Decimal,
}

impl OrderTotals {
    pub fn from_lines<I>(lines: I) -> Self
    where
        I: IntoIterator<Item = PricedLine>,
    {
        let (subtotal, total_weight) = lines.into_iter().fold(
            (Decimal::ZERO, Decimal::ZERO),
            |(price, weight), line| {
                let quantity = Decimal::from(line.quantity);
                (
                    price + line.unit_price * quantity,
                    weight + line.unit_weight * quantity,
                )
            },
        );
        let shipping_cost = shipping_cost(total_weight);
        Self {
            subtotal,
            total_weight,
            shipping_cost,
            total_amount: subtotal + shipping_cost,
        }
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    #[test]
    fn weightless_orders_ship_free() {
        assert_eq!(shipping_cost(Decimal::ZERO), Decimal::ZERO);
    }

    #[test]
    fn each_started_block_costs_one_unit() {
        assert_eq!(shipping_cost(dec!(0.5)), dec!(30));
        assert_eq!(shipping_cost(dec!(20)), dec!(30));
        assert_eq!(shipping_cost(dec!(30)), dec!(30));
        assert_eq!(shipping_cost(dec!(30.001)), dec!(60));
        assert_eq!(shipping_cost(dec!(90)), dec!(90));
        assert_eq!(shipping_cost(dec!(91)), dec!(120));
    }

    #[test]
    fn totals_add_shipping_to_the_line_sum() {
        let totals = OrderTotals::from_lines([
            PricedLine {
                unit_price: dec!(10),
                unit_weight: dec!(5),
                quantity: 2,
            },
            PricedLine {
                unit_price: dec!(5),
                unit_weight: dec!(1),
                quantity: 1,
            },
        ]);
        assert_eq!(totals.subtotal, dec!(25));
        assert_eq!(totals.total_weight, dec!(11));
        assert_eq!(totals.shipping_cost, dec!(30));
        assert_eq!(totals.total_amount, dec!(55));
    }

    #[test]
    fn single_line_checkout_matches_expected_total() {
        let totals = OrderTotals::from_lines([PricedLine {
            unit_price: dec!(20.0),
            unit_weight: dec!(10),
            quantity: 2,
        }]);
        assert_eq!(totals.total_weight, dec!(20));
        assert_eq!(totals.total_amount, dec!(70.0));
    }

    proptest! {
        #[test]
        fn shipping_never_decreases_with_weight(a in 0u32..100_000, b in 0u32..100_000) {
            let (low, high) = if a <= b { (a, b) } else { (b, a) };
            let low = Decimal::new(i64::from(low), 2);
            let high = Decimal::new(i64::from(high), 2);
            prop_assert!(shipping_cost(low) <= shipping_cost(high));
        }
    }
}
