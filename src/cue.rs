//! Audible feedback for finished lookups
//!
//! The terminal only has one tone, so it is reserved for failures. Other
//! cues are logged.

use std::io::Write;

use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cue {
    /// Exactly one match, applied automatically
    Found,
    /// Several matches, the user has to choose
    Choose,
    /// No match or the lookup failed
    Failure,
}

pub struct CuePlayer {
    enabled: bool,
    last: Option<Cue>,
}

impl CuePlayer {
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            last: None,
        }
    }

    pub fn play(&mut self, cue: Cue) {
        debug!(?cue, "Playing cue");
        self.last = Some(cue);

        if self.enabled && cue == Cue::Failure {
            ring_bell();
        }
    }

    #[cfg(test)]
    pub fn last(&self) -> Option<Cue> {
        self.last
    }
}

pub fn ring_bell() {
    let mut stdout = std::io::stdout();
    if let Err(e) = stdout.write_all(b"\x07").and_then(|_| stdout.flush()) {
        warn!("Failed to ring terminal bell: {}", e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_remembers_last_cue() {
        let mut cues = CuePlayer::new(false);
        assert_eq!(cues.last(), None);

        cues.play(Cue::Choose);
        cues.play(Cue::Failure);
        assert_eq!(cues.last(), Some(Cue::Failure));
    }
}
