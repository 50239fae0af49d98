// Target Selection - Uniform choice without replacement
//
// The draw sits behind a trait so the scheduler can be tested with a seeded
// generator. The contract is "uniform choice without replacement", not any
// particular generator's bit pattern.

use crate::membership::Peer;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

/// Upper bound on targets per cycle, independent of roster size
pub const MAX_FAN_OUT: usize = 2;

/// Chooses which peers receive this cycle's artifact
pub trait TargetSelector: Send {
    /// Select targets from the resolved peer list
    ///
    /// A single peer is always selected as-is; with two or more, the count is
    /// drawn uniformly from 1..=MAX_FAN_OUT and the targets are distinct.
    fn select<'a>(&mut self, peers: &'a [Peer]) -> Vec<&'a Peer>;
}

/// Default selector: uniform count in {1, 2}, then shuffle-and-truncate
pub struct FanOutSelector {
    rng: StdRng,
}

impl FanOutSelector {
    /// Create a selector seeded from the OS entropy source
    pub fn new() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    /// Create a deterministic selector from an explicit seed
    pub fn with_seed(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl Default for FanOutSelector {
    fn default() -> Self {
        Self::new()
    }
}

impl TargetSelector for FanOutSelector {
    fn select<'a>(&mut self, peers: &'a [Peer]) -> Vec<&'a Peer> {
        match peers.len() {
            0 => Vec::new(),
            1 => vec![&peers[0]],
            _ => {
                let count = self.rng.gen_range(1..=MAX_FAN_OUT);
                let mut targets: Vec<&Peer> = peers.iter().collect();
                targets.shuffle(&mut self.rng);
                targets.truncate(count);
                targets
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::membership::{NodeAddress, NodeName};

    fn peers(names: &[&str]) -> Vec<Peer> {
        names
            .iter()
            .map(|n| {
                Peer::new(
                    NodeName::new(n).unwrap(),
                    NodeAddress::on_default_port("127.0.0.1"),
                )
            })
            .collect()
    }

    #[test]
    fn test_single_peer_always_selected() {
        let peers = peers(&["only"]);
        let mut selector = FanOutSelector::with_seed(7);

        for _ in 0..20 {
            let targets = selector.select(&peers);
            assert_eq!(targets.len(), 1);
            assert_eq!(targets[0].name().as_str(), "only");
        }
    }

    #[test]
    fn test_count_bounded_and_targets_distinct() {
        let peers = peers(&["a", "b", "c", "d", "e"]);
        let mut selector = FanOutSelector::with_seed(42);

        for _ in 0..100 {
            let targets = selector.select(&peers);
            assert!(!targets.is_empty() && targets.len() <= MAX_FAN_OUT);

            if targets.len() == 2 {
                assert_ne!(targets[0].name(), targets[1].name());
            }
        }
    }

    #[test]
    fn test_same_seed_same_selection() {
        let peers = peers(&["a", "b", "c"]);
        let mut first = FanOutSelector::with_seed(1234);
        let mut second = FanOutSelector::with_seed(1234);

        for _ in 0..10 {
            let lhs: Vec<String> = first.select(&peers).iter().map(|p| p.name().to_string()).collect();
            let rhs: Vec<String> = second.select(&peers).iter().map(|p| p.name().to_string()).collect();
            assert_eq!(lhs, rhs);
        }
    }

    #[test]
    fn test_empty_peer_list_selects_nothing() {
        let mut selector = FanOutSelector::with_seed(1);
        assert!(selector.select(&[]).is_empty());
    }
}
