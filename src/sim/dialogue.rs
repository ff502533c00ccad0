//! Typewriter dialogue box
//!
//! Words wait in a backlog until the current line has room for them, then
//! their characters are revealed one at a time. Pauses and forced line
//! breaks are tokens of their own, so a literal `#` or newline in the text
//! is just text.

use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

use crate::consts::*;

/// Queued dialogue element
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Token {
    Word(String),
    /// Hold the reveal for a beat
    Pause,
    /// End the current line
    Newline,
}

/// Authored dialogue, borrowed from static script tables
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Beat<'a> {
    /// Whitespace-separated words
    Say(&'a str),
    Pause,
    Newline,
}

/// Next thing the typewriter will reveal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
enum Glyph {
    Char(char),
    Pause,
}

/// Text width provider (the renderer's font metrics)
pub trait TextMeasure {
    fn width(&self, text: &str) -> f32;
}

/// Fixed advance per character
#[derive(Debug, Clone, Copy)]
pub struct MonospaceMeasure {
    pub advance: f32,
}

impl Default for MonospaceMeasure {
    fn default() -> Self {
        Self {
            advance: DIALOGUE_FONT_SIZE,
        }
    }
}

impl TextMeasure for MonospaceMeasure {
    fn width(&self, text: &str) -> f32 {
        text.chars().count() as f32 * self.advance
    }
}

/// Dialogue queue and reveal state
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Dialogue {
    /// Lines shown so far; the last one is being typed into
    pub lines: Vec<String>,
    pending: VecDeque<Glyph>,
    backlog: VecDeque<Token>,
    last_reveal: f32,
    /// Reveal clock restarts on the next update
    restart_clock: bool,
    empty_since: Option<f32>,
    /// Fast-forward requested
    pub skip: bool,
    /// Fast-forward is honoured
    pub can_skip: bool,
    /// Stage must wait for the proceed action once text is out
    pub need_proceed: bool,
    /// Seconds per character
    pub rate: f32,
    /// Usable line width in text units
    pub max_width: f32,
}

impl Default for Dialogue {
    fn default() -> Self {
        Self {
            lines: Vec::new(),
            pending: VecDeque::new(),
            backlog: VecDeque::new(),
            last_reveal: 0.0,
            restart_clock: false,
            empty_since: None,
            skip: false,
            can_skip: true,
            need_proceed: false,
            rate: DIALOGUE_RATE,
            max_width: DIALOGUE_BOX_WIDTH - DIALOGUE_TEXT_PADDING,
        }
    }
}

impl Dialogue {
    fn enqueue(&mut self, token: Token) {
        if self.lines.is_empty() {
            self.lines.push(String::new());
        }
        if self.is_idle() {
            self.restart_clock = true;
        }
        self.backlog.push_back(token);
    }

    /// Queue words for typing
    pub fn say(&mut self, text: &str) {
        for word in text.split_whitespace() {
            self.enqueue(Token::Word(word.to_string()));
        }
    }

    pub fn pause(&mut self) {
        self.enqueue(Token::Pause);
    }

    pub fn newline(&mut self) {
        self.enqueue(Token::Newline);
    }

    pub fn push_script(&mut self, script: &[Beat<'_>]) {
        for beat in script {
            match *beat {
                Beat::Say(text) => self.say(text),
                Beat::Pause => self.pause(),
                Beat::Newline => self.newline(),
            }
        }
    }

    /// Wipe the box and anything still queued
    pub fn clear(&mut self) {
        self.lines.clear();
        self.pending.clear();
        self.backlog.clear();
        self.skip = false;
    }

    /// Nothing left to reveal
    pub fn is_idle(&self) -> bool {
        self.pending.is_empty() && self.backlog.is_empty()
    }

    /// Text was shown and has fully come out
    pub fn is_done(&self) -> bool {
        !self.lines.is_empty() && self.is_idle()
    }

    /// Whether the box has sat idle (and unblocked) for more than `secs`
    pub fn idle_longer_than(&self, now: f32, secs: f32) -> bool {
        self.empty_since.is_some_and(|since| now - since > secs)
    }

    /// Primary action while a dialogue screen is up
    pub fn on_primary(&mut self) {
        if self.is_done() {
            self.need_proceed = false;
        } else if self.can_skip {
            self.skip = true;
        }
    }

    /// Move backlog tokens onto the current line until something is pending
    fn wrap(&mut self, measure: &dyn TextMeasure) {
        while self.pending.is_empty() {
            let Some(token) = self.backlog.front() else {
                return;
            };
            if self.lines.is_empty() {
                self.lines.push(String::new());
            }
            let line = self.lines.last().map(String::as_str).unwrap_or_default();
            match token {
                Token::Newline => {
                    self.backlog.pop_front();
                    self.lines.push(String::new());
                }
                Token::Pause => {
                    self.backlog.pop_front();
                    self.pending.push_back(Glyph::Pause);
                }
                Token::Word(word) => {
                    // A word wider than the box still has to go somewhere
                    let fits = line.is_empty()
                        || measure.width(&format!("{} {}", line.trim_end(), word)) < self.max_width;
                    if fits {
                        self.pending.extend(word.chars().map(Glyph::Char));
                        self.pending.push_back(Glyph::Char(' '));
                        self.backlog.pop_front();
                    } else {
                        self.lines.push(String::new());
                    }
                }
            }
        }
    }

    fn reveal(&mut self, c: char) {
        match self.lines.last_mut() {
            Some(line) => line.push(c),
            None => self.lines.push(c.to_string()),
        }
    }

    /// Advance the typewriter; returns true if a character beeped
    pub fn update(&mut self, now: f32, measure: &dyn TextMeasure) -> bool {
        if self.restart_clock {
            self.last_reveal = now;
            self.restart_clock = false;
        }

        let mut beeped = false;
        loop {
            self.wrap(measure);
            let Some(&glyph) = self.pending.front() else {
                break;
            };
            match glyph {
                Glyph::Pause => {
                    if self.skip {
                        self.pending.pop_front();
                        continue;
                    }
                    if now - self.last_reveal > DIALOGUE_PAUSE {
                        self.pending.pop_front();
                        self.last_reveal += DIALOGUE_PAUSE;
                    }
                }
                Glyph::Char(c) => {
                    if self.skip {
                        self.pending.pop_front();
                        self.reveal(c);
                        continue;
                    }
                    if now - self.last_reveal > self.rate {
                        // Catch up at most a few characters after a stall
                        self.last_reveal = self.last_reveal.max(now - 3.0 * self.rate) + self.rate;
                        self.pending.pop_front();
                        self.reveal(c);
                        beeped = true;
                    }
                }
            }
            break;
        }

        if self.is_idle() {
            self.skip = false;
        }
        if self.is_idle() && !self.need_proceed {
            self.empty_since.get_or_insert(now);
        } else {
            self.empty_since = None;
        }

        beeped
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn run_until_idle(d: &mut Dialogue, start: f32, step: f32) -> f32 {
        let measure = MonospaceMeasure::default();
        let mut now = start;
        for _ in 0..100_000 {
            if d.is_idle() {
                break;
            }
            now += step;
            d.update(now, &measure);
        }
        now
    }

    #[test]
    fn test_reveals_one_char_per_rate() {
        let measure = MonospaceMeasure::default();
        let mut d = Dialogue::default();
        d.say("Hi");
        assert!(!d.is_done());
        d.update(0.0, &measure);
        assert_eq!(d.lines, vec![String::new()]);
        assert!(d.update(0.07, &measure));
        assert_eq!(d.lines[0], "H");
        d.update(0.14, &measure);
        d.update(0.21, &measure);
        assert_eq!(d.lines[0], "Hi ");
        assert!(d.is_done());
    }

    #[test]
    fn test_pause_holds_reveal() {
        let measure = MonospaceMeasure::default();
        let mut d = Dialogue::default();
        d.pause();
        d.say("A");
        d.update(0.0, &measure);
        d.update(0.3, &measure);
        assert_eq!(d.lines[0], "");
        d.update(0.6, &measure);
        d.update(0.7, &measure);
        assert_eq!(d.lines[0], "A");
    }

    #[test]
    fn test_newline_starts_new_line() {
        let mut d = Dialogue::default();
        d.say("one");
        d.newline();
        d.say("two");
        run_until_idle(&mut d, 0.0, 0.02);
        assert_eq!(d.lines, vec!["one ".to_string(), "two ".to_string()]);
    }

    #[test]
    fn test_wraps_at_box_width() {
        let mut d = Dialogue::default();
        // 660 usable / 30 per glyph: 21 glyphs fit
        d.say("aaaaaaaaaa bbbbbbbbbb cccc");
        run_until_idle(&mut d, 0.0, 0.02);
        assert_eq!(d.lines, vec!["aaaaaaaaaa bbbbbbbbbb ".to_string(), "cccc ".to_string()]);
    }

    #[test]
    fn test_overlong_word_moves_to_fresh_line() {
        let measure = MonospaceMeasure::default();
        let mut d = Dialogue::default();
        let long_word = "x".repeat(25);
        assert!(measure.width(&long_word) > DIALOGUE_BOX_WIDTH - DIALOGUE_TEXT_PADDING);
        d.say("Hi");
        d.say(&long_word);
        run_until_idle(&mut d, 0.0, 0.02);
        assert_eq!(d.lines, vec!["Hi ".to_string(), format!("{long_word} ")]);
    }

    #[test]
    fn test_literal_hash_is_text() {
        let mut d = Dialogue::default();
        d.say("# 1");
        d.skip = true;
        d.update(0.0, &MonospaceMeasure::default());
        assert_eq!(d.lines[0], "# 1 ");
    }

    #[test]
    fn test_skip_flushes_and_resets() {
        let measure = MonospaceMeasure::default();
        let mut d = Dialogue::default();
        d.push_script(&[Beat::Say("Hello there,"), Beat::Pause, Beat::Say("pilot.")]);
        d.update(0.0, &measure);
        d.on_primary();
        assert!(d.skip);
        assert!(!d.update(0.01, &measure));
        assert!(d.is_done());
        assert!(!d.skip);
        assert_eq!(d.lines[0], "Hello there, pilot. ");
    }

    #[test]
    fn test_skip_disabled() {
        let mut d = Dialogue::default();
        d.say("Locked");
        d.can_skip = false;
        d.on_primary();
        assert!(!d.skip);
    }

    #[test]
    fn test_proceed_gate_blocks_idle_clock() {
        let measure = MonospaceMeasure::default();
        let mut d = Dialogue::default();
        d.say("Go");
        d.need_proceed = true;
        let now = run_until_idle(&mut d, 0.0, 0.02);
        d.update(now + 5.0, &measure);
        assert!(!d.idle_longer_than(now + 5.0, 0.1));

        d.on_primary();
        assert!(!d.need_proceed);
        d.update(now + 6.0, &measure);
        assert!(!d.idle_longer_than(now + 6.0, 0.5));
        assert!(d.idle_longer_than(now + 7.0, 0.5));
    }

    #[test]
    fn test_done_needs_a_line() {
        let d = Dialogue::default();
        assert!(d.is_idle());
        assert!(!d.is_done());
    }

    fn beat_strategy() -> impl Strategy<Value = Vec<(u8, String)>> {
        prop::collection::vec((0u8..10, "[a-z]{1,30}"), 1..40)
    }

    fn push_beats(d: &mut Dialogue, beats: &[(u8, String)]) {
        for (kind, word) in beats {
            match kind {
                0 => d.pause(),
                1 => d.newline(),
                _ => d.say(word),
            }
        }
    }

    proptest! {
        #[test]
        fn prop_skip_matches_unskipped(beats in beat_strategy(), skip_after in 0usize..300) {
            let measure = MonospaceMeasure::default();

            let mut slow = Dialogue::default();
            push_beats(&mut slow, &beats);
            run_until_idle(&mut slow, 0.0, 0.02);

            let mut fast = Dialogue::default();
            push_beats(&mut fast, &beats);
            let mut now = 0.0;
            for _ in 0..skip_after {
                now += 0.02;
                fast.update(now, &measure);
            }
            fast.on_primary();
            fast.update(now + 0.02, &measure);
            run_until_idle(&mut fast, now + 0.02, 0.02);

            prop_assert_eq!(slow.lines, fast.lines);
        }
    }
}
