//! crates/valentine_core/src/reveal.rs
//!
//! The typewriter reveal: a restartable sequence of growing prefixes of a
//! target string, advanced one character per tick. Timing lives with the
//! caller; this type only owns the prefix state, so it can be driven by a
//! tokio interval in the service and by plain loops in tests.

use std::time::Duration;

/// One character is revealed per tick at this interval.
pub const REVEAL_TICK: Duration = Duration::from_millis(45);

/// Progressively reveals a target string, one character at a time.
///
/// `visible()` is always a valid UTF-8 prefix of the target. Completion is
/// level-triggered: `is_complete()` can be queried at any time.
#[derive(Debug, Clone)]
pub struct RevealAnimator {
    target: String,
    shown_bytes: usize,
}

impl RevealAnimator {
    pub fn new(target: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            shown_bytes: 0,
        }
    }

    /// Replaces the target and restarts from the empty prefix. Old and new
    /// text are never blended.
    pub fn set_target(&mut self, target: impl Into<String>) {
        self.target = target.into();
        self.shown_bytes = 0;
    }

    /// Reveals the next character. Returns false once the full target is
    /// already shown.
    pub fn tick(&mut self) -> bool {
        match self.target[self.shown_bytes..].chars().next() {
            Some(c) => {
                self.shown_bytes += c.len_utf8();
                true
            }
            None => false,
        }
    }

    /// The currently revealed prefix.
    pub fn visible(&self) -> &str {
        &self.target[..self.shown_bytes]
    }

    pub fn target(&self) -> &str {
        &self.target
    }

    pub fn is_complete(&self) -> bool {
        self.shown_bytes == self.target.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn produces_one_state_per_character_plus_the_empty_prefix() {
        let target = "love";
        let mut animator = RevealAnimator::new(target);
        let mut states = vec![animator.visible().to_string()];
        while animator.tick() {
            states.push(animator.visible().to_string());
        }

        assert_eq!(states.len(), target.chars().count() + 1);
        for (i, state) in states.iter().enumerate() {
            assert!(target.starts_with(state.as_str()));
            assert_eq!(state.chars().count(), i);
        }
        assert_eq!(states.last().unwrap(), target);
        assert!(animator.is_complete());
    }

    #[test]
    fn each_state_extends_the_previous_by_one_character() {
        let mut animator = RevealAnimator::new("hey ❤️ you");
        let mut previous = animator.visible().to_string();
        while animator.tick() {
            let current = animator.visible().to_string();
            assert!(current.starts_with(&previous));
            assert_eq!(current.chars().count(), previous.chars().count() + 1);
            previous = current;
        }
    }

    #[test]
    fn multibyte_prefixes_stay_valid_utf8() {
        let mut animator = RevealAnimator::new("💌🌹");
        assert_eq!(animator.visible(), "");
        assert!(animator.tick());
        assert_eq!(animator.visible(), "💌");
        assert!(animator.tick());
        assert_eq!(animator.visible(), "💌🌹");
        assert!(!animator.tick());
    }

    #[test]
    fn retargeting_restarts_without_blending() {
        let mut animator = RevealAnimator::new("first letter");
        animator.tick();
        animator.tick();
        animator.set_target("second");
        assert_eq!(animator.visible(), "");
        assert!(!animator.is_complete());
        animator.tick();
        assert_eq!(animator.visible(), "s");
    }

    #[test]
    fn empty_target_is_complete_immediately() {
        let mut animator = RevealAnimator::new("");
        assert!(animator.is_complete());
        assert!(!animator.tick());
    }
}
