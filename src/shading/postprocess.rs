//! Post-process ping-pong chain (spec §4.9 step 19, §9, §8).
//!
//! Each enabled pass reads the previous pass's output (or the upstream
//! scene-color source, for the first pass) and writes into the ping/pong
//! target the chain hasn't just written, so no pass ever reads and writes
//! the same texture.

use crate::name::Name;

/// Which of the two ping-pong targets the chain will write to next.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum PingPongSide {
    Ping,
    Pong,
}

/// One enabled post-process effect, in scene-registered order.
pub struct PostProcessPass {
    pub name: Name,
}

/// Drives the `(current_input, using_ping) -> (next_input, !using_ping)`
/// state machine across a scene's enabled post-process passes. The first
/// pass always writes `ping` (spec §8: "starting direction = ping").
pub struct PostProcessChain {
    ping: Name,
    pong: Name,
    next_write: PingPongSide,
}

impl PostProcessChain {
    #[must_use]
    pub fn new(ping: Name, pong: Name) -> Self {
        Self {
            ping,
            pong,
            next_write: PingPongSide::Ping,
        }
    }

    #[must_use]
    pub const fn next_write_side(&self) -> PingPongSide {
        self.next_write
    }

    fn target_for(&self, side: PingPongSide) -> Name {
        match side {
            PingPongSide::Ping => self.ping,
            PingPongSide::Pong => self.pong,
        }
    }

    /// Advances the chain by one enabled pass reading `input`: returns
    /// `(input, output)` for that pass and flips the write side for next
    /// time.
    pub fn step(&mut self, input: Name) -> (Name, Name) {
        let output = self.target_for(self.next_write);
        self.next_write = match self.next_write {
            PingPongSide::Ping => PingPongSide::Pong,
            PingPongSide::Pong => PingPongSide::Ping,
        };
        (input, output)
    }

    /// Runs the chain starting from `source` across all of `passes` and
    /// returns the name holding the final result (spec §8: "after `k`
    /// enabled passes, the returned image is `ping` iff `k` is odd, else
    /// `pong`").
    pub fn run(&mut self, source: Name, passes: &[PostProcessPass]) -> Name {
        let mut current = source;
        for _ in passes {
            let (_, output) = self.step(current);
            current = output;
        }
        current
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chain() -> PostProcessChain {
        PostProcessChain::new(Name::new("ping"), Name::new("pong"))
    }

    #[test]
    fn zero_enabled_passes_returns_the_source_unchanged() {
        let mut c = chain();
        let source = Name::new("scene_color");
        assert_eq!(c.run(source, &[]), source);
    }

    #[test]
    fn spec_parity_k_odd_is_ping_k_even_is_pong() {
        for k in 1..=6usize {
            let passes: Vec<PostProcessPass> = (0..k).map(|i| PostProcessPass { name: Name::new(&format!("p{i}")) }).collect();
            let mut c = chain();
            let result = c.run(Name::new("scene_color"), &passes);
            let expected = if k % 2 == 1 { Name::new("ping") } else { Name::new("pong") };
            assert_eq!(result, expected, "k={k}");
        }
    }

    #[test]
    fn step_never_reads_and_writes_the_same_target() {
        let mut c = chain();
        let mut current = Name::new("scene_color");
        for _ in 0..5 {
            let (input, output) = c.step(current);
            assert_ne!(input, output);
            current = output;
        }
    }
}
