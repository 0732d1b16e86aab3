//! Price quantization into bucket boundaries.

use rust_decimal::Decimal;

use super::Side;
use crate::market::BucketSize;

/// Tolerance applied at bucket edges when working in ticks.
///
/// A price sitting a hair below a tick boundary still snaps to that boundary.
const BOUNDARY_EPSILON: Decimal = Decimal::from_parts(1, 0, 0, false, 9);

/// Maps a raw price onto its bucket.
///
/// Bid buckets round down and ask buckets round up, so a bucket never shows a
/// level as more aggressive than it was posted. Steps below one are handled in
/// integer ticks of `round(1 / step)`.
///
/// Returns `None` when the bucket boundary is not representable, which only
/// happens for prices near the top of the decimal range.
pub fn quantize(price: Decimal, step: BucketSize, side: Side) -> Option<Decimal> {
    let step = step.get();

    if step >= Decimal::ONE {
        let units = price.checked_div(step)?;
        let units = match side {
            Side::Bid => units.floor(),
            Side::Ask => units.ceil(),
        };
        return units.checked_mul(step);
    }

    let factor = Decimal::ONE.checked_div(step)?.round();
    let ticks = price.checked_mul(factor)?;
    let ticks = match side {
        Side::Bid => ticks.checked_add(BOUNDARY_EPSILON)?.floor(),
        Side::Ask => ticks.checked_sub(BOUNDARY_EPSILON)?.ceil(),
    };

    ticks.checked_div(factor)
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;

    use super::*;

    fn step(value: Decimal) -> BucketSize {
        BucketSize::new(value).unwrap()
    }

    fn quantize(price: Decimal, step: BucketSize, side: Side) -> Decimal {
        super::quantize(price, step, side).unwrap()
    }

    #[test]
    fn whole_steps_round_bids_down_and_asks_up() {
        assert_eq!(quantize(dec!(100.2), step(dec!(1)), Side::Bid), dec!(100));
        assert_eq!(quantize(dec!(100.2), step(dec!(1)), Side::Ask), dec!(101));
        assert_eq!(quantize(dec!(104.9), step(dec!(5)), Side::Bid), dec!(100));
        assert_eq!(quantize(dec!(100.1), step(dec!(5)), Side::Ask), dec!(105));
        assert_eq!(
            quantize(dec!(67234.5), step(dec!(100)), Side::Bid),
            dec!(67200)
        );
    }

    #[test]
    fn whole_step_bounds_hold_across_prices() {
        for s in [dec!(1), dec!(2), dec!(5), dec!(10), dec!(50), dec!(1000)] {
            let bucket = step(s);
            let mut price = dec!(0.37);
            while price < dec!(3000) {
                let bid = quantize(price, bucket, Side::Bid);
                assert!(bid <= price && price < bid + s, "bid {price} step {s}");

                let ask = quantize(price, bucket, Side::Ask);
                assert!(ask - s < price && price <= ask, "ask {price} step {s}");

                price += dec!(13.71);
            }
        }
    }

    #[test]
    fn exact_boundaries_are_their_own_bucket() {
        assert_eq!(quantize(dec!(100), step(dec!(1)), Side::Bid), dec!(100));
        assert_eq!(quantize(dec!(100), step(dec!(1)), Side::Ask), dec!(100));
        assert_eq!(quantize(dec!(100.1), step(dec!(0.1)), Side::Bid), dec!(100.1));
        assert_eq!(quantize(dec!(100.1), step(dec!(0.1)), Side::Ask), dec!(100.1));
        assert_eq!(
            quantize(dec!(0.03), step(dec!(0.01)), Side::Bid),
            dec!(0.03)
        );
        assert_eq!(
            quantize(dec!(0.03), step(dec!(0.01)), Side::Ask),
            dec!(0.03)
        );
    }

    #[test]
    fn fractional_steps_use_ticks() {
        assert_eq!(quantize(dec!(3456.78), step(dec!(0.1)), Side::Bid), dec!(3456.7));
        assert_eq!(quantize(dec!(3456.78), step(dec!(0.1)), Side::Ask), dec!(3456.8));
        assert_eq!(quantize(dec!(3456.78), step(dec!(0.5)), Side::Bid), dec!(3456.5));
        assert_eq!(quantize(dec!(3456.78), step(dec!(0.5)), Side::Ask), dec!(3457));
        assert_eq!(quantize(dec!(1.2345), step(dec!(0.01)), Side::Bid), dec!(1.23));
        assert_eq!(quantize(dec!(1.2345), step(dec!(0.01)), Side::Ask), dec!(1.24));
    }

    #[test]
    fn prices_within_epsilon_below_a_boundary_snap_to_it() {
        let just_below = dec!(100.0999999999999);
        assert_eq!(quantize(just_below, step(dec!(0.1)), Side::Bid), dec!(100.1));

        let just_above = dec!(100.1000000000001);
        assert_eq!(quantize(just_above, step(dec!(0.1)), Side::Ask), dec!(100.1));
    }

    #[test]
    fn prices_outside_epsilon_are_not_snapped() {
        let below = dec!(100.0999);
        assert_eq!(quantize(below, step(dec!(0.1)), Side::Bid), dec!(100.0));
        assert_eq!(quantize(below, step(dec!(0.1)), Side::Ask), dec!(100.1));
    }

    #[test]
    fn unrepresentable_boundaries_are_none() {
        assert_eq!(super::quantize(Decimal::MAX, step(dec!(2)), Side::Ask), None);
        assert_eq!(super::quantize(Decimal::MAX, step(dec!(0.01)), Side::Bid), None);
        assert_eq!(
            super::quantize(Decimal::MAX, step(dec!(1)), Side::Bid),
            Some(Decimal::MAX)
        );
    }
}
