//! Weighted random clip selection
//!
//! Weights are relative: a rule with clips weighted `[1, 1, 2]` picks the third
//! clip half of the time. The random source is passed in so callers (and tests)
//! control determinism.

use rand::Rng;
use tracing::{debug, warn};

use crate::rules::SoundClip;

/// Sum of all selectable weights
pub fn total_weight(clips: &[SoundClip]) -> f64 {
    clips.iter().map(|c| c.weight).filter(|w| *w > 0.0).sum()
}

/// Pick a clip with probability proportional to its weight.
///
/// Returns `None` for an empty list or when no clip has positive weight.
pub fn select_clip<'a, R: Rng + ?Sized>(clips: &'a [SoundClip], rng: &mut R) -> Option<&'a SoundClip> {
    let total = total_weight(clips);
    if !total.is_finite() {
        warn!(total, "Clip weights do not sum to a finite value");
        return None;
    }
    if total <= 0.0 {
        return None;
    }
    let draw = rng.random::<f64>() * total;
    debug!(total, draw, "Sound selection");
    pick_clip(clips, draw)
}

/// Deterministic half of `select_clip`: walk the clips in order and return the
/// first whose cumulative weight reaches `draw`.
pub fn pick_clip(clips: &[SoundClip], draw: f64) -> Option<&SoundClip> {
    let mut cumulative = 0.0;
    for clip in clips.iter().filter(|c| c.weight > 0.0) {
        cumulative += clip.weight;
        if draw <= cumulative {
            debug!(file = %clip.file_name, cumulative, "Selected sound file");
            return Some(clip);
        }
    }
    warn!(draw, cumulative, "No sound file selected");
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn clips(weights: &[f64]) -> Vec<SoundClip> {
        weights
            .iter()
            .enumerate()
            .map(|(i, w)| SoundClip {
                file_name: format!("clip{i}.mp3"),
                weight: *w,
            })
            .collect()
    }

    #[test]
    fn draw_lands_in_cumulative_bucket() {
        let clips = clips(&[1.0, 1.0, 2.0]);
        assert_eq!(pick_clip(&clips, 2.5).unwrap().file_name, "clip2.mp3");
        assert_eq!(pick_clip(&clips, 0.0).unwrap().file_name, "clip0.mp3");
        assert_eq!(pick_clip(&clips, 1.0).unwrap().file_name, "clip0.mp3");
        assert_eq!(pick_clip(&clips, 1.5).unwrap().file_name, "clip1.mp3");
    }

    #[test]
    fn empty_or_weightless_selects_nothing() {
        let mut rng = StdRng::seed_from_u64(7);
        assert!(select_clip(&[], &mut rng).is_none());
        assert!(select_clip(&clips(&[0.0, 0.0]), &mut rng).is_none());
    }

    #[test]
    fn zero_weight_clip_is_never_picked() {
        let clips = clips(&[0.0, 1.0]);
        assert_eq!(pick_clip(&clips, 0.0).unwrap().file_name, "clip1.mp3");

        let mut rng = StdRng::seed_from_u64(1);
        for _ in 0..200 {
            assert_eq!(select_clip(&clips, &mut rng).unwrap().file_name, "clip1.mp3");
        }
    }

    #[test]
    fn overflowing_total_selects_nothing() {
        let mut rng = StdRng::seed_from_u64(7);
        assert!(select_clip(&clips(&[1e308, 1e308]), &mut rng).is_none());
    }

    #[test]
    fn same_seed_same_sequence() {
        let clips = clips(&[1.0, 3.0, 0.5, 2.0]);
        let run = |seed| {
            let mut rng = StdRng::seed_from_u64(seed);
            (0..50)
                .map(|_| select_clip(&clips, &mut rng).unwrap().file_name.clone())
                .collect::<Vec<_>>()
        };
        assert_eq!(run(42), run(42));
    }

    #[test]
    fn heavier_clip_wins_more_often() {
        let clips = clips(&[1.0, 9.0]);
        let mut rng = StdRng::seed_from_u64(3);
        let heavy = (0..2000)
            .filter(|_| select_clip(&clips, &mut rng).unwrap().file_name == "clip1.mp3")
            .count();
        assert!(heavy > 1500, "heavy clip picked {heavy} times");
    }
}
