//! Fixed-length display windows and spread derivation.

use rust_decimal::Decimal;

use super::AggregatedLevel;

/// Distance between the best ask and the best bid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Spread {
    pub value: Decimal,
    /// Spread as a percentage of the best ask; `None` when the best ask is zero
    /// or the ratio is not representable.
    pub percentage: Option<Decimal>,
}

/// Lays the first `rows` levels into exactly `rows` slots, padding with `None`.
pub fn project(levels: &[AggregatedLevel], rows: usize) -> Vec<Option<AggregatedLevel>> {
    let mut window: Vec<_> = levels.iter().take(rows).cloned().map(Some).collect();
    window.resize(rows, None);
    window
}

/// Projects the ask side upside down so the best ask sits last, next to the
/// spread row.
///
/// The whole `rows`-slot window is reversed, padding included: when there are
/// fewer asks than rows, the `None` slots come first and the occupied slots
/// end at the bottom, so the best ask always lands in the last slot.
pub fn project_asks(levels: &[AggregatedLevel], rows: usize) -> Vec<Option<AggregatedLevel>> {
    let mut window = project(levels, rows);
    window.reverse();
    window
}

/// Derives the spread from best-first bid and ask lists.
///
/// Returns `None` if either side is empty.
pub fn spread(bids: &[AggregatedLevel], asks: &[AggregatedLevel]) -> Option<Spread> {
    let best_bid = bids.first()?.price;
    let best_ask = asks.first()?.price;
    let value = best_ask - best_bid;

    let percentage = value
        .checked_div(best_ask)
        .and_then(|ratio| ratio.checked_mul(Decimal::ONE_HUNDRED));

    Some(Spread { value, percentage })
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;

    use super::*;

    fn level(price: Decimal) -> AggregatedLevel {
        AggregatedLevel {
            price,
            size: dec!(1),
            notional: price,
            total: dec!(1),
            total_notional: price,
            display_price: price.to_string(),
            is_new: false,
        }
    }

    #[test]
    fn project_always_returns_requested_rows() {
        let levels: Vec<_> = (1..=5).map(|p| level(Decimal::from(p))).collect();

        for rows in [0, 1, 3, 5, 8] {
            let window = project(&levels, rows);
            assert_eq!(window.len(), rows);
            for (i, slot) in window.iter().enumerate() {
                match levels.get(i) {
                    Some(expected) => assert_eq!(slot.as_ref(), Some(expected)),
                    None => assert!(slot.is_none()),
                }
            }
        }
    }

    #[test]
    fn project_asks_puts_best_ask_next_to_spread() {
        let asks = vec![level(dec!(101)), level(dec!(102))];
        let window = project_asks(&asks, 4);

        let prices: Vec<_> = window.iter().map(|s| s.as_ref().map(|l| l.price)).collect();
        assert_eq!(prices, vec![None, None, Some(dec!(102)), Some(dec!(101))]);
    }

    #[test]
    fn project_asks_drops_worst_asks_beyond_window() {
        let asks: Vec<_> = (101..=110).map(|p| level(Decimal::from(p))).collect();
        let window = project_asks(&asks, 3);

        let prices: Vec<_> = window.iter().map(|s| s.as_ref().unwrap().price).collect();
        assert_eq!(prices, vec![dec!(103), dec!(102), dec!(101)]);
    }

    #[test]
    fn spread_from_best_levels() {
        let bids = vec![level(dec!(99)), level(dec!(98))];
        let asks = vec![level(dec!(100)), level(dec!(101))];

        let spread = spread(&bids, &asks).unwrap();
        assert_eq!(spread.value, dec!(1));
        assert_eq!(spread.percentage, Some(dec!(1)));
    }

    #[test]
    fn no_spread_when_a_side_is_empty() {
        let bids = vec![level(dec!(99))];
        assert!(spread(&bids, &[]).is_none());
        assert!(spread(&[], &bids).is_none());
    }

    #[test]
    fn zero_best_ask_has_no_percentage() {
        let bids = vec![level(dec!(0))];
        let asks = vec![level(dec!(0))];

        let spread = spread(&bids, &asks).unwrap();
        assert_eq!(spread.value, dec!(0));
        assert_eq!(spread.percentage, None);
    }

    #[test]
    fn crossed_book_against_tiny_ask_has_no_percentage() {
        let bids = vec![level(dec!(79228162514264337593543950335))];
        let asks = vec![level(dec!(0.0000000000000000000000000001))];

        let spread = spread(&bids, &asks).unwrap();
        assert!(spread.value.is_sign_negative());
        assert_eq!(spread.percentage, None);
    }
}
