/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Weighted, history-suppressing poster selection.
//!
//! [`PosterSelector::next`] picks one item per display interval so that
//!
//! 1. items are chosen proportionally to their [`rating_weight`], and
//! 2. an item just shown is not eligible again until a number of *other*
//!    items proportional to the catalog size have been shown.
//!
//! # Weight buckets
//! The popularity score is clamped to `[1, 100]` (a missing score counts as
//! `1`) and split into ten equal buckets:
//!
//! | score | weight |
//! |---|---|
//! | none, ≤ 10 | 1 |
//! | 11–20 | 2 |
//! | … | … |
//! | 91–100 | 10 |
//!
//! Every item therefore has a non-zero chance, and the best-rated items come
//! up at most ten times as often as unrated ones.
//!
//! # History
//! Before each draw the history is trimmed from its oldest end to
//! `floor(catalog_len × history_fraction)` entries.  Because the limit is
//! recomputed from the catalog passed to *this* call, growing or shrinking
//! the catalog between calls adjusts retention immediately.
//!
//! Items are compared by identity (`Arc::ptr_eq`), not by content: two equal
//! entries in one catalog are two distinct candidates.

mod random;

pub use random::{RandomSource, StdRandom};

use std::collections::VecDeque;
use std::sync::Arc;

use tracing::debug;

use crate::catalog::CatalogItem;
use crate::error::SelectorError;

// ── Constants ─────────────────────────────────────────────────────────────────

/// Fraction of the catalog kept in the recently-shown history by default.
pub const DEFAULT_HISTORY_FRACTION: f64 = 0.25;

/// Number of equal-width rating buckets (and therefore the maximum weight).
const RATING_BUCKETS: i32 = 10;

// ── Weight function ───────────────────────────────────────────────────────────

/// Selection weight for a popularity score, in `[1, 10]`.
pub fn rating_weight(rating: Option<i32>) -> u32 {
    let bounded = rating.map_or(1, |r| r.clamp(1, 100));
    ((bounded - 1) / RATING_BUCKETS + 1) as u32
}

// ── PosterSelector ────────────────────────────────────────────────────────────

/// Weighted random poster picker with recent-history suppression.
///
/// All mutable state is the instance's own history queue; there is no global
/// state, so two selectors never influence each other.
#[derive(Debug)]
pub struct PosterSelector<R = StdRandom> {
    random: R,
    history_fraction: f64,
    recently_seen: VecDeque<Arc<CatalogItem>>,
}

impl<R: RandomSource> PosterSelector<R> {
    /// Create a selector.
    ///
    /// # Errors
    /// [`SelectorError::HistoryFractionOutOfRange`] unless
    /// `0.0 <= history_fraction < 1.0`.
    pub fn new(random: R, history_fraction: f64) -> Result<Self, SelectorError> {
        if !(0.0..1.0).contains(&history_fraction) {
            return Err(SelectorError::HistoryFractionOutOfRange(history_fraction));
        }
        Ok(Self {
            random,
            history_fraction,
            recently_seen: VecDeque::new(),
        })
    }

    /// Create a selector using [`DEFAULT_HISTORY_FRACTION`].
    pub fn with_default_history(random: R) -> Self {
        Self {
            random,
            history_fraction: DEFAULT_HISTORY_FRACTION,
            recently_seen: VecDeque::new(),
        }
    }

    pub fn history_fraction(&self) -> f64 {
        self.history_fraction
    }

    /// Items currently suppressed, oldest first.
    pub fn recently_seen(&self) -> impl Iterator<Item = &Arc<CatalogItem>> {
        self.recently_seen.iter()
    }

    /// Select the next poster from `posters`.
    ///
    /// # Errors
    /// [`SelectorError::EmptyCatalog`] if `posters` is empty.  Callers must
    /// never pass an empty catalog; this is not retried.
    pub fn next(
        &mut self,
        posters: &[Arc<CatalogItem>],
    ) -> Result<Arc<CatalogItem>, SelectorError> {
        if posters.is_empty() {
            return Err(SelectorError::EmptyCatalog);
        }

        let history_limit = (posters.len() as f64 * self.history_fraction).floor() as usize;
        while self.recently_seen.len() > history_limit {
            self.recently_seen.pop_front();
        }

        let mut eligible: Vec<&Arc<CatalogItem>> = posters
            .iter()
            .filter(|p| !self.recently_seen.iter().any(|seen| Arc::ptr_eq(seen, p)))
            .collect();
        // Only reachable when the same Arc appears several times in `posters`.
        if eligible.is_empty() {
            eligible = posters.iter().collect();
        }

        let weight_sum: u32 = eligible.iter().map(|p| rating_weight(p.rating)).sum();
        let draw = self.random.next_below(weight_sum);

        // Walk in catalog order until the remainder goes negative.
        let mut remainder = i64::from(draw);
        let mut index = 0;
        loop {
            remainder -= i64::from(rating_weight(eligible[index].rating));
            if remainder < 0 || index + 1 == eligible.len() {
                break;
            }
            index += 1;
        }
        let selected = Arc::clone(eligible[index]);

        debug!(
            title = %selected.title,
            weight = rating_weight(selected.rating),
            draw = draw,
            weight_sum = weight_sum,
            eligible = eligible.len(),
            history = self.recently_seen.len(),
            "selected poster"
        );

        self.recently_seen.push_back(Arc::clone(&selected));
        Ok(selected)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::collections::VecDeque;

    // ── Test helpers ──────────────────────────────────────────────────────────

    fn poster(index: usize, rating: Option<i32>) -> Arc<CatalogItem> {
        Arc::new(CatalogItem {
            title: format!("Poster{index}"),
            studio: None,
            runtime: 0,
            year: 0,
            content_rating: None,
            rating,
            artwork: String::new(),
        })
    }

    /// Always draws 0: selects the first eligible item.
    struct Lowest;

    impl RandomSource for Lowest {
        fn next_below(&mut self, _bound: u32) -> u32 {
            0
        }
    }

    /// Always draws `bound - 1`: selects the last eligible item.
    struct Highest;

    impl RandomSource for Highest {
        fn next_below(&mut self, bound: u32) -> u32 {
            bound - 1
        }
    }

    /// Replays a fixed list of draws.
    struct Scripted(VecDeque<u32>);

    impl RandomSource for Scripted {
        fn next_below(&mut self, bound: u32) -> u32 {
            let draw = self.0.pop_front().expect("script exhausted");
            assert!(draw < bound, "scripted draw {draw} not below {bound}");
            draw
        }
    }

    fn index_of(posters: &[Arc<CatalogItem>], selected: &Arc<CatalogItem>) -> usize {
        posters
            .iter()
            .position(|p| Arc::ptr_eq(p, selected))
            .expect("selection is a member of the catalog")
    }

    fn draw_indices<R: RandomSource>(
        selector: &mut PosterSelector<R>,
        posters: &[Arc<CatalogItem>],
        n: usize,
    ) -> Vec<usize> {
        (0..n)
            .map(|_| index_of(posters, &selector.next(posters).unwrap()))
            .collect()
    }

    // ── Weights ───────────────────────────────────────────────────────────────

    #[test]
    fn rating_weights() {
        assert_eq!(rating_weight(None), 1);
        assert_eq!(rating_weight(Some(0)), 1);
        assert_eq!(rating_weight(Some(10)), 1);
        assert_eq!(rating_weight(Some(11)), 2);
        assert_eq!(rating_weight(Some(20)), 2);
        assert_eq!(rating_weight(Some(50)), 5);
        assert_eq!(rating_weight(Some(90)), 9);
        assert_eq!(rating_weight(Some(91)), 10);
        assert_eq!(rating_weight(Some(100)), 10);

        assert_eq!(rating_weight(Some(-1000)), 1);
        assert_eq!(rating_weight(Some(1000)), 10);
    }

    proptest! {
        #[test]
        fn weight_is_monotonic_and_bucketed(a in -50i32..150, b in -50i32..150) {
            let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
            let (wl, wh) = (rating_weight(Some(lo)), rating_weight(Some(hi)));
            prop_assert!((1..=10).contains(&wl));
            prop_assert!(wl <= wh);
            let bucket = |s: i32| (s.clamp(1, 100) - 1) / 10;
            if bucket(lo) == bucket(hi) {
                prop_assert_eq!(wl, wh);
            }
        }

        #[test]
        fn selection_is_always_a_member_of_the_catalog(
            ratings in prop::collection::vec(prop::option::of(-20i32..120), 1..24),
            fraction in 0.0f64..0.99,
            seed in any::<u64>(),
            draws in 1usize..40,
        ) {
            let posters: Vec<_> = ratings
                .into_iter()
                .enumerate()
                .map(|(i, r)| poster(i, r))
                .collect();
            let mut selector = PosterSelector::new(StdRandom::seeded(seed), fraction).unwrap();
            for _ in 0..draws {
                let selected = selector.next(&posters).unwrap();
                prop_assert!(posters.iter().any(|p| Arc::ptr_eq(p, &selected)));
            }
        }
    }

    // ── Arguments ─────────────────────────────────────────────────────────────

    #[test]
    fn empty_poster_list_fails() {
        let mut selector = PosterSelector::with_default_history(StdRandom::seeded(0));
        let err = selector.next(&[]).unwrap_err();
        assert_eq!(err, SelectorError::EmptyCatalog);
        assert_eq!(err.to_string(), "poster list was empty");
    }

    #[test]
    fn history_fraction_bounds() {
        for bad in [-0.01, 1.0, 1.01, f64::NAN] {
            assert!(
                PosterSelector::new(Lowest, bad).is_err(),
                "{bad} should be rejected"
            );
        }
        assert!(PosterSelector::new(Lowest, 0.0).is_ok());
        assert!(PosterSelector::new(Lowest, 0.99).is_ok());
        assert_eq!(
            PosterSelector::with_default_history(Lowest).history_fraction(),
            DEFAULT_HISTORY_FRACTION
        );
    }

    // ── Distribution ──────────────────────────────────────────────────────────

    #[test]
    fn statistical_accuracy() {
        let mut selector = PosterSelector::new(StdRandom::seeded(0), 0.0).unwrap();
        let posters = vec![poster(1, Some(10)), poster(2, Some(30)), poster(3, Some(60))];

        let trials = 10_000;
        let mut counts = [0usize; 3];
        for _ in 0..trials {
            let selected = selector.next(&posters).unwrap();
            counts[index_of(&posters, &selected)] += 1;
        }

        for (count, expected) in counts.iter().zip([0.1, 0.3, 0.6]) {
            let observed = *count as f64 / trials as f64;
            assert!(
                (observed - expected).abs() <= 0.05,
                "observed {observed}, expected {expected} ± 0.05 (counts {counts:?})"
            );
        }
    }

    #[test]
    fn walk_follows_catalog_order() {
        // weights [1, 5]: draw 0 lands on A, draws 1..=5 land on B
        let posters = vec![poster(0, None), poster(1, Some(50))];
        let mut selector =
            PosterSelector::new(Scripted(VecDeque::from([0, 1, 5, 0])), 0.0).unwrap();
        assert_eq!(draw_indices(&mut selector, &posters, 4), vec![0, 1, 1, 0]);
    }

    #[test]
    fn zero_draw_selects_first_unrated_poster() {
        let posters = vec![poster(0, None), poster(1, Some(50))];
        let weights: Vec<u32> = posters.iter().map(|p| rating_weight(p.rating)).collect();
        assert_eq!(weights, vec![1, 5]);

        let mut selector = PosterSelector::new(Lowest, 0.25).unwrap();
        // floor(2 × 0.25) = 0: nothing is ever suppressed
        assert_eq!(draw_indices(&mut selector, &posters, 3), vec![0, 0, 0]);
    }

    #[test]
    fn first_and_last_can_be_selected() {
        let posters = vec![poster(1, Some(1)), poster(2, Some(1)), poster(3, Some(1))];

        let mut lowest = PosterSelector::new(Lowest, 0.0).unwrap();
        assert_eq!(index_of(&posters, &lowest.next(&posters).unwrap()), 0);

        let mut highest = PosterSelector::new(Highest, 0.0).unwrap();
        assert_eq!(index_of(&posters, &highest.next(&posters).unwrap()), 2);
    }

    #[test]
    fn missing_and_zero_rating_still_selected() {
        let posters = vec![poster(1, Some(1)), poster(2, Some(0)), poster(3, None)];
        let mut selector =
            PosterSelector::new(Scripted(VecDeque::from([0, 1, 2])), 0.0).unwrap();
        assert_eq!(draw_indices(&mut selector, &posters, 3), vec![0, 1, 2]);
    }

    // ── History suppression ───────────────────────────────────────────────────

    #[test]
    fn no_repeat_within_history_window_lowest_draws() {
        let posters: Vec<_> = (0..8).map(|i| poster(i, Some(1))).collect();
        let mut selector = PosterSelector::new(Lowest, 0.5).unwrap();
        // floor(8 × 0.5) = 4 items are suppressed after each pick
        assert_eq!(
            draw_indices(&mut selector, &posters, 10),
            vec![0, 1, 2, 3, 4, 0, 1, 2, 3, 4]
        );
    }

    #[test]
    fn no_repeat_within_history_window_highest_draws() {
        let posters: Vec<_> = (0..8).map(|i| poster(i, Some(1))).collect();
        let mut selector = PosterSelector::new(Highest, 0.5).unwrap();
        assert_eq!(
            draw_indices(&mut selector, &posters, 10),
            vec![7, 6, 5, 4, 3, 7, 6, 5, 4, 3]
        );
    }

    #[test]
    fn seeded_selection_never_repeats_within_window() {
        let posters: Vec<_> = (0..8).map(|i| poster(i, Some(1))).collect();
        let mut selector = PosterSelector::new(StdRandom::seeded(4), 0.5).unwrap();
        let picks = draw_indices(&mut selector, &posters, 200);
        for window in picks.windows(5) {
            let first = window[0];
            assert!(
                !window[1..].contains(&first),
                "poster {first} repeated within 4 draws: {window:?}"
            );
        }
    }

    #[test]
    fn heavy_poster_is_suppressed_then_returns() {
        let mut posters = vec![poster(1, Some(100))];
        posters.extend((2..=8).map(|i| poster(i, Some(1))));
        let mut selector = PosterSelector::new(Lowest, 0.25).unwrap();
        // floor(8 × 0.25) = 2
        assert_eq!(draw_indices(&mut selector, &posters, 4), vec![0, 1, 2, 0]);
    }

    #[test]
    fn list_grow_adjusts_history() {
        let eight: Vec<_> = std::iter::once(poster(1, Some(100)))
            .chain((2..=8).map(|i| poster(i, Some(1))))
            .collect();
        let two = vec![Arc::clone(&eight[0]), Arc::clone(&eight[1])];
        let mut selector = PosterSelector::new(Lowest, 0.5).unwrap();

        assert_eq!(index_of(&two, &selector.next(&two).unwrap()), 0);
        // History now holds up to 4; poster 1 stays out for four draws.
        assert_eq!(draw_indices(&mut selector, &eight, 5), vec![1, 2, 3, 4, 0]);
    }

    #[test]
    fn list_shrink_adjusts_history() {
        let eight: Vec<_> = std::iter::once(poster(1, Some(100)))
            .chain((2..=8).map(|i| poster(i, Some(1))))
            .collect();
        let two = vec![Arc::clone(&eight[0]), Arc::clone(&eight[2])];
        let mut selector = PosterSelector::new(Lowest, 0.5).unwrap();

        assert_eq!(draw_indices(&mut selector, &eight, 4), vec![0, 1, 2, 3]);
        // floor(2 × 0.5) = 1: only the most recent pick (poster 4) stays
        assert_eq!(index_of(&two, &selector.next(&two).unwrap()), 0);
        let seen: Vec<&str> = selector.recently_seen().map(|p| p.title.as_str()).collect();
        assert_eq!(seen, vec!["Poster4", "Poster1"]);
    }

    #[test]
    fn equal_content_entries_are_distinct_candidates() {
        let a = poster(1, Some(1));
        let twin = Arc::new((*a).clone());
        let posters = vec![a, twin];
        let mut selector = PosterSelector::new(Lowest, 0.5).unwrap();
        assert_eq!(draw_indices(&mut selector, &posters, 2), vec![0, 1]);
    }

    #[test]
    fn repeated_handle_does_not_exhaust_candidates() {
        let a = poster(1, Some(1));
        let posters = vec![Arc::clone(&a), Arc::clone(&a)];
        let mut selector = PosterSelector::new(Lowest, 0.5).unwrap();
        for _ in 0..3 {
            assert!(Arc::ptr_eq(&selector.next(&posters).unwrap(), &a));
        }
    }
}
