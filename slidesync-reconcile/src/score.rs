//! Pairwise page similarity.
//!
//! Layout is a gate: the content weights only count when both pages share a
//! non-empty layout. Every weight is a multiple of [`TIER_GAP`], so distinct
//! content scores differ by at least that much and the position bonus (always
//! below the gap) can only break ties.

use slidesync_core::Page;

pub type Score = i64;

/// Score of two pages that are equal on every persisted field.
pub const MAX_SCORE: Score = 1000;

pub const LAYOUT_BASE: Score = 50;
pub const TITLE_WEIGHT: Score = 80;
pub const BODY_WEIGHT: Score = 80;
pub const IMAGE_WEIGHT: Score = 30;
pub const QUOTE_WEIGHT: Score = 20;
pub const SUBTITLE_WEIGHT: Score = 10;

/// Smallest difference between two content scores.
pub const TIER_GAP: Score = 10;

/// Content similarity of `before` and `after`, `0..=MAX_SCORE`.
pub fn score(before: &Page, after: &Page) -> Score {
    if before == after {
        return MAX_SCORE;
    }
    if !same_layout(before, after) {
        return 0;
    }

    let mut score = LAYOUT_BASE;
    if before.titles == after.titles {
        score += TITLE_WEIGHT;
    }
    if before.bodies == after.bodies {
        score += BODY_WEIGHT;
    }
    if before.same_images(after) {
        score += IMAGE_WEIGHT;
    }
    if before.block_quotes == after.block_quotes {
        score += QUOTE_WEIGHT;
    }
    if !before.subtitles.is_empty()
        && !after.subtitles.is_empty()
        && before.subtitles == after.subtitles
    {
        score += SUBTITLE_WEIGHT;
    }
    score
}

/// [`score`] plus a deterministic tie-breaker on positions. Used only to
/// build the assignment matrix.
pub fn score_at(before: &Page, before_index: usize, after: &Page, after_index: usize) -> Score {
    score(before, after) + position_bonus(same_layout(before, after), before_index, after_index)
}

/// Preference order: same index, then pulling a page forward, then pushing it back.
pub fn position_bonus(same_layout: bool, before_index: usize, after_index: usize) -> Score {
    let rank = if before_index == after_index {
        3
    } else if after_index < before_index {
        2
    } else {
        1
    };
    if same_layout {
        rank * 2
    } else {
        rank
    }
}

fn same_layout(before: &Page, after: &Page) -> bool {
    !before.layout.is_empty() && before.layout == after.layout
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page(layout: &str, title: &str, body: &str) -> Page {
        Page::new(layout).with_title(title).with_body(body)
    }

    #[test]
    fn equal_pages_score_max() {
        let a = page("body", "A", "x");
        assert_eq!(score(&a, &a.clone()), MAX_SCORE);
    }

    #[test]
    fn equal_pages_without_layout_still_score_max() {
        let a = Page::default().with_title("A");
        assert_eq!(score(&a, &a.clone()), MAX_SCORE);
    }

    #[test]
    fn different_layouts_get_no_content_weight() {
        let a = page("body", "A", "x");
        let b = page("two-column", "A", "x");
        assert_eq!(score(&a, &b), 0);
    }

    #[test]
    fn empty_layouts_get_no_content_weight() {
        let a = page("", "A", "x");
        let b = page("", "A", "y");
        assert_eq!(score(&a, &b), 0);
    }

    #[test]
    fn weights_add_per_matching_dimension() {
        let a = page("body", "A", "x");
        let b = page("body", "A", "y");
        // layout + title + (no images on either side) + (no quotes on either side)
        assert_eq!(score(&a, &b), LAYOUT_BASE + TITLE_WEIGHT + IMAGE_WEIGHT + QUOTE_WEIGHT);

        let c = page("body", "B", "x");
        assert_eq!(score(&a, &c), LAYOUT_BASE + BODY_WEIGHT + IMAGE_WEIGHT + QUOTE_WEIGHT);
    }

    #[test]
    fn missing_subtitles_on_both_sides_do_not_count() {
        let a = page("body", "A", "x");
        let b = page("body", "A", "y");
        let with_sub_a = a.clone().with_subtitle("s");
        let with_sub_b = b.clone().with_subtitle("s");
        assert_eq!(score(&with_sub_a, &with_sub_b), score(&a, &b) + SUBTITLE_WEIGHT);
    }

    #[test]
    fn bonus_never_reaches_the_tier_gap() {
        for &same in &[true, false] {
            for b in 0..4 {
                for a in 0..4 {
                    let bonus = position_bonus(same, b, a);
                    assert!(bonus > 0 && bonus < TIER_GAP, "bonus {bonus} too large");
                }
            }
        }
        for weight in [MAX_SCORE, LAYOUT_BASE, TITLE_WEIGHT, BODY_WEIGHT, IMAGE_WEIGHT, QUOTE_WEIGHT, SUBTITLE_WEIGHT] {
            assert_eq!(weight % TIER_GAP, 0);
        }
    }

    #[test]
    fn bonus_prefers_same_index_then_forward_pull() {
        assert!(position_bonus(true, 2, 2) > position_bonus(true, 2, 1));
        assert!(position_bonus(true, 2, 1) > position_bonus(true, 2, 3));
        assert!(position_bonus(false, 2, 2) > position_bonus(false, 2, 1));
        assert!(position_bonus(false, 2, 1) > position_bonus(false, 2, 3));
        assert!(position_bonus(false, 2, 2) < position_bonus(true, 2, 2));
    }

    #[test]
    fn score_at_only_breaks_ties() {
        let a = page("body", "A", "x");
        let better = page("body", "A", "y");
        let worse = page("body", "B", "y");
        assert!(score_at(&a, 0, &better, 5) > score_at(&a, 0, &worse, 0));
    }
}
