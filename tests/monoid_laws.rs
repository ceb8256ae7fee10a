//! Property tests for the monoid laws every aggregator is supposed to obey:
//! `zero` as identity, commutativity and associativity of `merge`, fill/merge
//! equivalence, present/past tense equivalence under JSON, and entry
//! conservation. These exercise the public crate API the way a downstream
//! user would, rather than poking at module internals.

use histogrammar::primitives::adaptively_bin::AdaptivelyBinning;
use histogrammar::primitives::average::{Averaged, Averaging};
use histogrammar::primitives::bin::Binning;
use histogrammar::primitives::count::{Counted, Counting};
use histogrammar::primitives::minmax::{Extreme, Extremized};
use histogrammar::primitives::sum::{Summed, Summing};
use histogrammar::{Factory, Past, Present, Quantity};
use proptest::prelude::*;

fn approx_eq(a: f64, b: f64) -> bool {
    if a.is_nan() && b.is_nan() {
        return true;
    }
    (a - b).abs() <= 1e-6 * (1.0 + a.abs().max(b.abs()))
}

// bounded away from the extremes that make running-mean cancellation noisy.
fn finite_f64() -> impl Strategy<Value = f64> {
    -1.0e6..1.0e6
}

proptest! {
    #[test]
    fn count_zero_is_identity(entries in 0.0..1.0e9) {
        let c = Counted::ed(entries).unwrap();
        prop_assert_eq!(c.merge(&c.zero()).unwrap().entries(), c.entries());
        prop_assert_eq!(c.zero().merge(&c).unwrap().entries(), c.entries());
    }

    #[test]
    fn count_merge_is_commutative_and_associative(a in 0.0..1.0e6, b in 0.0..1.0e6, c in 0.0..1.0e6) {
        let ca = Counted::ed(a).unwrap();
        let cb = Counted::ed(b).unwrap();
        let cc = Counted::ed(c).unwrap();
        prop_assert_eq!(ca.merge(&cb).unwrap().entries(), cb.merge(&ca).unwrap().entries());
        let left = ca.merge(&cb).unwrap().merge(&cc).unwrap();
        let right = ca.merge(&cb.merge(&cc).unwrap()).unwrap();
        prop_assert!(approx_eq(left.entries(), right.entries()));
    }

    #[test]
    fn sum_merge_conserves_entries_and_is_associative(
        (e1, s1) in (0.0..1.0e6, finite_f64()),
        (e2, s2) in (0.0..1.0e6, finite_f64()),
        (e3, s3) in (0.0..1.0e6, finite_f64()),
    ) {
        let a = Summed::ed(None, e1, s1).unwrap();
        let b = Summed::ed(None, e2, s2).unwrap();
        let c = Summed::ed(None, e3, s3).unwrap();
        let merged = a.merge(&b).unwrap();
        prop_assert!(approx_eq(merged.entries(), e1 + e2));

        let left = a.merge(&b).unwrap().merge(&c).unwrap();
        let right = a.merge(&b.merge(&c).unwrap()).unwrap();
        prop_assert!(approx_eq(left.entries(), right.entries()));
    }

    #[test]
    fn average_merge_is_commutative(
        (e1, m1) in (0.01..1.0e6, finite_f64()),
        (e2, m2) in (0.01..1.0e6, finite_f64()),
    ) {
        let a = Averaged::ed(None, e1, m1).unwrap();
        let b = Averaged::ed(None, e2, m2).unwrap();
        let ab = a.merge(&b).unwrap();
        let ba = b.merge(&a).unwrap();
        prop_assert!(approx_eq(ab.mean(), ba.mean()));
        prop_assert_eq!(ab.entries(), ba.entries());
    }

    #[test]
    fn average_merge_weights_toward_larger_entries(
        small_mean in finite_f64(),
        big_mean in finite_f64(),
    ) {
        prop_assume!((small_mean - big_mean).abs() > 1.0);
        let small = Averaged::ed(None, 1.0, small_mean).unwrap();
        let big = Averaged::ed(None, 1.0e6, big_mean).unwrap();
        let merged = small.merge(&big).unwrap();
        prop_assert!((merged.mean() - big_mean).abs() < (merged.mean() - small_mean).abs());
    }

    #[test]
    fn minmax_merge_is_commutative_and_associative(a in finite_f64(), b in finite_f64(), c in finite_f64()) {
        for extreme in [Extreme::Min, Extreme::Max] {
            let ea = Extremized::ed(extreme, None, 1.0, a).unwrap();
            let eb = Extremized::ed(extreme, None, 1.0, b).unwrap();
            let ec = Extremized::ed(extreme, None, 1.0, c).unwrap();
            prop_assert_eq!(ea.merge(&eb).unwrap().value(), eb.merge(&ea).unwrap().value());
            let left = ea.merge(&eb).unwrap().merge(&ec).unwrap();
            let right = ea.merge(&eb.merge(&ec).unwrap()).unwrap();
            prop_assert_eq!(left.value(), right.value());
        }
    }

    #[test]
    fn fill_then_merge_matches_single_pass_fill(data in prop::collection::vec(finite_f64(), 0..64)) {
        let quantity = || Quantity::new(|x: &f64| *x);
        let mut whole = Present::Sum(Summing::create(quantity()));
        for v in &data {
            whole.fill(v, 1.0).unwrap();
        }

        let mid = data.len() / 2;
        let mut left = Present::Sum(Summing::create(quantity()));
        let mut right = Present::Sum(Summing::create(quantity()));
        for v in &data[..mid] {
            left.fill(v, 1.0).unwrap();
        }
        for v in &data[mid..] {
            right.fill(v, 1.0).unwrap();
        }
        let merged = left.merge(&right).unwrap();

        let (Past::Sum(merged_sum), Past::Sum(whole_sum)) = (merged.to_past(), whole.to_past()) else {
            unreachable!("both sides are Present::Sum");
        };
        prop_assert_eq!(merged_sum.entries(), whole_sum.entries());
        prop_assert!(approx_eq(merged_sum.sum(), whole_sum.sum()));
    }

    #[test]
    fn present_and_past_agree_on_json(data in prop::collection::vec(finite_f64(), 0..32)) {
        let mut present = Present::Average(Averaging::create(Quantity::new(|x: &f64| *x)));
        for v in &data {
            present.fill(v, 1.0).unwrap();
        }
        prop_assert_eq!(present.to_json(), present.to_past().to_json());
    }

    #[test]
    fn json_round_trips_through_the_factory(entries in 0.0..1.0e6, sum in finite_f64()) {
        let past = Past::Sum(Summed::ed(None, entries, sum).unwrap());
        let text = serde_json::to_string(&past.to_json()).unwrap();
        let back = Factory::from_json(&text).unwrap();
        prop_assert_eq!(past, back);
    }

    #[test]
    fn bin_fills_land_in_exactly_one_bucket(data in prop::collection::vec(-2.0..12.0, 0..128)) {
        let mut b: Binning<f64> = Binning::create(
            10,
            0.0,
            10.0,
            Quantity::new(|x: &f64| *x),
            Present::Count(Counting::create()),
        )
        .unwrap();
        for v in &data {
            b.fill(v, 1.0).unwrap();
        }
        let past = b.to_past();
        prop_assert_eq!(past.entries(), data.len() as f64);
        let bucketed: f64 = past.values().iter().map(|p| p.entries()).sum::<f64>()
            + past.underflow().entries()
            + past.overflow().entries()
            + past.nanflow().entries();
        prop_assert_eq!(bucketed, data.len() as f64);
    }

    #[test]
    fn adaptively_bin_never_exceeds_its_cap(data in prop::collection::vec(finite_f64(), 0..64)) {
        let mut b: AdaptivelyBinning<f64> = AdaptivelyBinning::create(
            5,
            0.2,
            Quantity::new(|x: &f64| *x),
            Present::Count(Counting::create()),
        )
        .unwrap();
        for v in &data {
            b.fill(v, 1.0).unwrap();
        }
        let past = b.to_past();
        prop_assert!(past.clusters().len() <= 5);
        prop_assert!(approx_eq(past.entries(), data.len() as f64));
    }
}
