//! The one-pass adaptive-clustering structure shared by `AdaptivelyBin` and
//! `Quantile`: a sorted list of `(center, value)` clusters that greedily
//! merges its two closest neighbors whenever it exceeds a cap `num`.

use crate::error::Error;

/// A value that can sit in a cluster: mergeable, and able to report the
/// weight used to recenter two merged clusters.
pub trait ClusterValue: Sized {
    fn cluster_weight(&self) -> f64;
    fn cluster_merge(&self, other: &Self) -> Result<Self, Error>;
}

impl ClusterValue for f64 {
    fn cluster_weight(&self) -> f64 {
        *self
    }
    fn cluster_merge(&self, other: &Self) -> Result<Self, Error> {
        Ok(self + other)
    }
}

/// Sorted-by-center clusters, capped to at most `num` entries by repeatedly
/// merging the pair with the smallest `tail_detail`-blended gap.
///
/// `distanceFromCenter` in the blend formula is the distance from a
/// candidate pair's own midpoint to the tree's overall `(min+max)/2` —
/// this is the one definition this crate locks in (the blend formula has
/// more than one plausible reading in the literature this was distilled
/// from).
#[derive(Clone, Debug, Default)]
pub struct KCenters<V> {
    pub centers: Vec<(f64, V)>,
}

impl<V: ClusterValue + Clone> KCenters<V> {
    pub fn new() -> Self {
        KCenters { centers: Vec::new() }
    }

    pub fn len(&self) -> usize {
        self.centers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.centers.is_empty()
    }

    /// Insert a new singleton cluster at `center`, keeping `centers` sorted.
    pub fn insert(&mut self, center: f64, value: V) {
        let idx = self
            .centers
            .partition_point(|(c, _)| *c < center);
        self.centers.insert(idx, (center, value));
    }

    fn blended_gap(c0: f64, c1: f64, tail_detail: f64, mid: f64) -> f64 {
        let gap = c1 - c0;
        let pair_mid = (c0 + c1) / 2.0;
        let dist = (pair_mid - mid).abs();
        (1.0 - tail_detail) * gap + tail_detail * gap / (1.0 + dist)
    }

    /// Merge down to at most `num` clusters, given the tree's observed
    /// `min`/`max` (used to compute `distanceFromCenter`).
    pub fn shrink_to(
        &mut self,
        num: usize,
        tail_detail: f64,
        min: f64,
        max: f64,
    ) -> Result<(), Error> {
        let mid = (min + max) / 2.0;
        while self.centers.len() > num {
            let mut best_i = 0;
            let mut best_score = f64::INFINITY;
            for i in 0..self.centers.len() - 1 {
                let score = Self::blended_gap(
                    self.centers[i].0,
                    self.centers[i + 1].0,
                    tail_detail,
                    mid,
                );
                if score < best_score {
                    best_score = score;
                    best_i = i;
                }
            }
            let (c0, v0) = self.centers.remove(best_i);
            let (c1, v1) = self.centers.remove(best_i);
            let w0 = v0.cluster_weight();
            let w1 = v1.cluster_weight();
            let merged_center = if w0 + w1 > 0.0 {
                (c0 * w0 + c1 * w1) / (w0 + w1)
            } else {
                (c0 + c1) / 2.0
            };
            let merged_value = v0.cluster_merge(&v1)?;
            self.centers.insert(best_i, (merged_center, merged_value));
        }
        Ok(())
    }

    /// Concatenate two cluster sets (summing values at equal centers), then
    /// shrink the result back down to `num`.
    pub fn merge(
        &self,
        other: &Self,
        num: usize,
        tail_detail: f64,
        min: f64,
        max: f64,
    ) -> Result<Self, Error> {
        let mut combined = self.centers.clone();
        for (c, v) in &other.centers {
            if let Some(existing) = combined.iter_mut().find(|(ec, _)| ec == c) {
                existing.1 = existing.1.cluster_merge(v)?;
            } else {
                combined.push((*c, v.clone()));
            }
        }
        combined.sort_by(|a, b| a.0.partial_cmp(&b.0).expect("cluster centers are never NaN"));
        let mut merged = KCenters { centers: combined };
        merged.shrink_to(num, tail_detail, min, max)?;
        Ok(merged)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shrinks_to_cap_by_merging_closest_pair() {
        let mut k = KCenters::new();
        for c in [0.0, 10.0, 10.1, 10.2, 20.0] {
            k.insert(c, 1.0);
        }
        k.shrink_to(3, 0.2, 0.0, 20.0).unwrap();
        assert_eq!(k.len(), 3);
        let centers: Vec<f64> = k.centers.iter().map(|(c, _)| *c).collect();
        assert!((centers[0] - 0.0).abs() < 1e-9);
        assert!((centers[2] - 20.0).abs() < 1e-9);
        assert!((centers[1] - 10.1).abs() < 0.2);
    }

    #[test]
    fn merge_never_exceeds_cap() {
        let mut a = KCenters::new();
        a.insert(1.0, 1.0);
        a.insert(2.0, 1.0);
        let mut b = KCenters::new();
        b.insert(1.5, 1.0);
        b.insert(3.0, 1.0);
        let merged = a.merge(&b, 3, 0.0, 1.0, 3.0).unwrap();
        assert!(merged.len() <= 3);
    }
}
