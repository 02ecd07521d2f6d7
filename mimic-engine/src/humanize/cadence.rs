//! Keystroke sequences with human typing rhythm and corrected typos.

use super::layout::typo_for;
use super::rng::RandomSource;
use super::types::{KeyAction, BACKSPACE};
use mimic_common::{clamp_probability, Span};
use std::time::Duration;
use tracing::trace;

/// Characters per "word" in the WPM convention (five letters plus a space).
const CHARS_PER_WORD: f64 = 6.0;
/// How long it takes to notice a typo, in seconds.
const NOTICE_PAUSE_SECS: Span<f64> = Span::new(0.1, 0.3);
/// Upper bound of the per-keystroke jitter, in seconds.
const KEYSTROKE_JITTER_SECS: f64 = 0.01;

/// Generates typing sequences.
#[derive(Debug)]
pub struct CadenceGenerator {
    rng: RandomSource,
}

impl CadenceGenerator {
    pub fn new(rng: RandomSource) -> Self {
        Self { rng }
    }

    /// Key actions that type `text`.
    ///
    /// One WPM value is drawn for the whole call. Any character except the
    /// last may be mistyped with `typo_probability`, which expands into
    /// wrong key, pause, backspace, right key.
    pub fn generate(&self, text: &str, wpm: Span<u32>, typo_probability: f64) -> Vec<KeyAction> {
        let chars: Vec<char> = text.chars().collect();
        if chars.is_empty() {
            return Vec::new();
        }

        let wpm = wpm.floored(1);
        let typo_probability = clamp_probability(typo_probability);

        let words_per_minute = self.rng.int_inclusive(wpm.min, wpm.max);
        let base_secs = 60.0 / f64::from(words_per_minute) / CHARS_PER_WORD;

        let last = chars.len() - 1;
        let mut actions = Vec::with_capacity(chars.len() + chars.len() / 8);
        let mut typos = 0usize;

        for (i, &intended) in chars.iter().enumerate() {
            if i < last && self.rng.chance(typo_probability) {
                typos += 1;
                let slip = typo_for(intended, &self.rng);
                actions.push(KeyAction::Key {
                    character: slip,
                    delay: self.keystroke_delay(base_secs, intended),
                });
                actions.push(KeyAction::Pause {
                    delay: self.notice_pause(),
                });
                actions.push(KeyAction::Key {
                    character: BACKSPACE,
                    delay: self.keystroke_delay(base_secs, BACKSPACE),
                });
            }
            actions.push(KeyAction::Key {
                character: intended,
                delay: self.keystroke_delay(base_secs, intended),
            });
        }

        trace!(
            target: "mimic.cadence",
            chars = chars.len(),
            words_per_minute,
            typos,
            actions = actions.len(),
            "generated typing sequence"
        );
        actions
    }

    fn keystroke_delay(&self, base_secs: f64, key: char) -> Duration {
        let mut secs = base_secs * self.rng.uniform(0.8, 1.2);
        secs *= match key {
            ' ' | '\n' | '\t' => self.rng.uniform(1.5, 2.0),
            '.' | ',' | '!' | '?' => self.rng.uniform(1.2, 1.5),
            BACKSPACE => self.rng.uniform(0.7, 0.9),
            _ => 1.0,
        };
        secs += self.rng.uniform(0.0, KEYSTROKE_JITTER_SECS);
        secs += self.rng.fractional_offset();
        Duration::from_secs_f64(secs)
    }

    fn notice_pause(&self) -> Duration {
        Duration::from_secs_f64(self.rng.span(NOTICE_PAUSE_SECS) + self.rng.fractional_offset())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn typed(actions: &[KeyAction]) -> String {
        actions.iter().filter_map(KeyAction::character).collect()
    }

    #[test]
    fn empty_text_is_empty_sequence() {
        let cadence = CadenceGenerator::new(RandomSource::seeded(1));
        assert!(cadence.generate("", Span::new(40, 80), 1.0).is_empty());
    }

    #[test]
    fn no_typos_types_text_verbatim() {
        let cadence = CadenceGenerator::new(RandomSource::seeded(2));
        let text = "Hello, world! 123";
        let actions = cadence.generate(text, Span::new(40, 80), 0.0);
        assert_eq!(actions.len(), text.chars().count());
        assert_eq!(typed(&actions), text);
        assert!(actions.iter().all(|a| !a.is_backspace()));
    }

    #[test]
    fn single_character_never_mistyped() {
        let cadence = CadenceGenerator::new(RandomSource::seeded(3));
        let actions = cadence.generate("x", Span::new(40, 80), 1.0);
        assert_eq!(actions.len(), 1);
        assert_eq!(actions[0].character(), Some('x'));
    }

    #[test]
    fn delay_tracks_wpm() {
        let cadence = CadenceGenerator::new(RandomSource::seeded(4));
        // 60 wpm -> 1/6 s per char; letters stay within ±20% plus jitter.
        let actions = cadence.generate("abcdefghij", Span::fixed(60), 0.0);
        let base = 1.0 / 6.0;
        for action in &actions {
            let secs = action.delay().as_secs_f64();
            assert!(secs >= base * 0.8, "{secs}");
            assert!(secs <= base * 1.2 + KEYSTROKE_JITTER_SECS + 0.0001, "{secs}");
        }
    }

    #[test]
    fn spaces_are_slower_than_letters_on_average() {
        let cadence = CadenceGenerator::new(RandomSource::seeded(5));
        let text = "a ".repeat(200);
        let actions = cadence.generate(&text, Span::fixed(60), 0.0);
        let mean = |c: char| {
            let ds: Vec<f64> = actions
                .iter()
                .filter(|a| a.character() == Some(c))
                .map(|a| a.delay().as_secs_f64())
                .collect();
            ds.iter().sum::<f64>() / ds.len() as f64
        };
        assert!(mean(' ') > mean('a') * 1.3);
    }

    #[test]
    fn inverted_wpm_and_bad_probability_are_repaired() {
        let cadence = CadenceGenerator::new(RandomSource::seeded(6));
        let actions = cadence.generate("abc", Span::new(80, 0), -3.0);
        assert_eq!(typed(&actions), "abc");
    }

    #[test]
    fn delays_are_never_whole_milliseconds() {
        let cadence = CadenceGenerator::new(RandomSource::seeded(7));
        let actions = cadence.generate("the quick brown fox", Span::new(40, 80), 0.5);
        for action in actions {
            assert_ne!(action.delay().subsec_nanos() % 1_000_000, 0);
        }
    }
}
