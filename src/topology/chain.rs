//! Chain reconstruction for one origin
//!
//! A reel only tells us, per receiver, how many hops it sits from the head
//! of the chain. Detection reports address receivers by chain position,
//! counted from the far end. [`ChainRecord`] keeps both views in step:
//!
//! - `by_hop_count[h]` is the receiver that announced hop count `h`
//! - `positions[p]` is the receiver at chain position `p`, so
//!   `positions[len - h - 1] == by_hop_count[h]`
//!
//! Gaps are explicit [`Slot::Unknown`] entries that a later announce can fill.

use tracing::debug;

use crate::types::{OriginTopology, ReceiverId};

/// One entry of a chain sequence
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Slot {
    Known(ReceiverId),
    Unknown,
}

impl Slot {
    pub fn receiver(self) -> Option<ReceiverId> {
        match self {
            Slot::Known(id) => Some(id),
            Slot::Unknown => None,
        }
    }

    pub fn is_unknown(self) -> bool {
        matches!(self, Slot::Unknown)
    }
}

/// Effect of an announce on the chain structure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChainChange {
    /// A new furthest receiver extended the chain
    Grew,
    /// A placeholder was resolved
    FilledGap,
    /// A different receiver claimed a resolved hop; the chain was rebuilt from this announce
    Reset,
    Unchanged,
}

impl ChainChange {
    pub fn is_structural(self) -> bool {
        !matches!(self, ChainChange::Unchanged)
    }
}

/// Conflicting identity found at an already resolved hop
struct Conflict;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChainRecord {
    positions: Vec<Slot>,
    by_hop_count: Vec<Slot>,
}

impl ChainRecord {
    pub fn new() -> Self {
        Self::default()
    }

    /// Receivers ordered by chain position
    pub fn positions(&self) -> &[Slot] {
        &self.positions
    }

    /// Receivers indexed by hop count
    pub fn by_hop_count(&self) -> &[Slot] {
        &self.by_hop_count
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// Receiver at a chain position, if resolved
    pub fn resolve(&self, chain_position: u8) -> Option<ReceiverId> {
        self.positions.get(chain_position as usize).and_then(|slot| slot.receiver())
    }

    /// Record that `receiver` announced itself `hop_count` hops from the head
    ///
    /// A conflict clears the chain and applies the announce once more, which
    /// cannot conflict again on an empty chain.
    pub fn apply_announce(&mut self, hop_count: u8, receiver: ReceiverId) -> ChainChange {
        match self.try_apply(hop_count, receiver) {
            Ok(change) => change,
            Err(Conflict) => {
                self.clear();
                // An empty chain always grows
                let _ = self.try_apply(hop_count, receiver);
                ChainChange::Reset
            }
        }
    }

    fn try_apply(&mut self, hop_count: u8, receiver: ReceiverId) -> Result<ChainChange, Conflict> {
        let hop = hop_count as usize;

        if hop >= self.by_hop_count.len() {
            while self.by_hop_count.len() < hop {
                self.by_hop_count.push(Slot::Unknown);
                self.positions.insert(0, Slot::Unknown);
            }
            self.by_hop_count.push(Slot::Known(receiver));
            self.positions.insert(0, Slot::Known(receiver));
            debug!(hop_count, receiver = %receiver, length = self.len(), "Chain grew");
            return Ok(ChainChange::Grew);
        }

        match self.by_hop_count[hop] {
            Slot::Unknown => {
                let position = self.positions.len() - hop - 1;
                self.by_hop_count[hop] = Slot::Known(receiver);
                self.positions[position] = Slot::Known(receiver);
                debug!(hop_count, position, receiver = %receiver, "Chain gap filled");
                Ok(ChainChange::FilledGap)
            }
            Slot::Known(existing) if existing == receiver => Ok(ChainChange::Unchanged),
            Slot::Known(_) => Err(Conflict),
        }
    }

    /// Remove an evicted receiver
    ///
    /// The anchor (position 0) is cleared and the chain trimmed of leading
    /// placeholders; any other occurrence becomes a placeholder. Returns
    /// whether the chain changed.
    pub fn remove(&mut self, receiver: ReceiverId) -> bool {
        let is_anchor = self.positions.first() == Some(&Slot::Known(receiver));

        let mut changed = false;
        for slot in self.positions.iter_mut().chain(self.by_hop_count.iter_mut()) {
            if *slot == Slot::Known(receiver) {
                *slot = Slot::Unknown;
                changed = true;
            }
        }

        if is_anchor {
            while self.positions.first().is_some_and(|slot| slot.is_unknown()) {
                self.positions.remove(0);
                self.by_hop_count.pop();
            }
        }
        changed
    }

    pub fn clear(&mut self) {
        self.positions.clear();
        self.by_hop_count.clear();
    }

    pub fn to_topology(&self) -> OriginTopology {
        OriginTopology {
            positions: self
                .positions
                .iter()
                .map(|slot| slot.receiver().map(|id| id.to_string()))
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn id(n: u32) -> ReceiverId {
        ReceiverId::from_reel_bytes(n.to_be_bytes())
    }

    #[test]
    fn grows_with_placeholders_then_fills_gap() {
        let mut chain = ChainRecord::new();
        assert_eq!(chain.apply_announce(0, id(0)), ChainChange::Grew);
        assert_eq!(chain.apply_announce(2, id(2)), ChainChange::Grew);
        assert_eq!(chain.positions(), &[Slot::Known(id(2)), Slot::Unknown, Slot::Known(id(0))]);
        assert_eq!(chain.by_hop_count(), &[Slot::Known(id(0)), Slot::Unknown, Slot::Known(id(2))]);

        assert_eq!(chain.apply_announce(1, id(1)), ChainChange::FilledGap);
        assert_eq!(
            chain.positions(),
            &[Slot::Known(id(2)), Slot::Known(id(1)), Slot::Known(id(0))]
        );
        assert_eq!(chain.resolve(0), Some(id(2)));
        assert_eq!(chain.resolve(2), Some(id(0)));
        assert_eq!(chain.resolve(3), None);
    }

    #[test]
    fn repeated_announce_is_unchanged() {
        let mut chain = ChainRecord::new();
        chain.apply_announce(1, id(1));
        let before = chain.clone();
        assert_eq!(chain.apply_announce(1, id(1)), ChainChange::Unchanged);
        assert_eq!(chain, before);
    }

    #[test]
    fn conflict_rebuilds_from_the_new_announce() {
        let mut chain = ChainRecord::new();
        for hop in 0..3u8 {
            chain.apply_announce(hop, id(hop as u32));
        }
        assert_eq!(chain.apply_announce(0, id(9)), ChainChange::Reset);
        assert_eq!(chain.positions(), &[Slot::Known(id(9))]);
        assert_eq!(chain.by_hop_count(), &[Slot::Known(id(9))]);

        // An announce past the end grows rather than conflicts
        assert_eq!(chain.apply_announce(1, id(5)), ChainChange::Grew);
        assert_eq!(chain.positions(), &[Slot::Known(id(5)), Slot::Known(id(9))]);
    }

    #[test]
    fn conflict_at_far_hop_leaves_placeholders() {
        let mut chain = ChainRecord::new();
        for hop in 0..3u8 {
            chain.apply_announce(hop, id(hop as u32));
        }
        assert_eq!(chain.apply_announce(1, id(5)), ChainChange::Reset);
        assert_eq!(chain.positions(), &[Slot::Known(id(5)), Slot::Unknown]);
        assert_eq!(chain.by_hop_count(), &[Slot::Unknown, Slot::Known(id(5))]);
        assert_eq!(chain.resolve(1), None);
    }

    #[test]
    fn anchor_removal_trims_leading_placeholders() {
        // positions = [A, B, C]
        let (a, b, c) = (id(0xA), id(0xB), id(0xC));
        let mut chain = ChainRecord::new();
        chain.apply_announce(0, c);
        chain.apply_announce(1, b);
        chain.apply_announce(2, a);

        let mut anchor = chain.clone();
        assert!(anchor.remove(a));
        assert_eq!(anchor.positions(), &[Slot::Known(b), Slot::Known(c)]);
        assert_eq!(anchor.by_hop_count(), &[Slot::Known(c), Slot::Known(b)]);

        let mut middle = chain.clone();
        assert!(middle.remove(b));
        assert_eq!(middle.positions(), &[Slot::Known(a), Slot::Unknown, Slot::Known(c)]);
        assert_eq!(middle.by_hop_count(), &[Slot::Known(c), Slot::Unknown, Slot::Known(a)]);
    }

    #[test]
    fn anchor_trim_continues_through_gaps() {
        // positions = [A, ?, C]
        let (a, c) = (id(0xA), id(0xC));
        let mut chain = ChainRecord::new();
        chain.apply_announce(0, c);
        chain.apply_announce(2, a);

        assert!(chain.remove(a));
        assert_eq!(chain.positions(), &[Slot::Known(c)]);
        assert_eq!(chain.by_hop_count(), &[Slot::Known(c)]);

        assert!(chain.remove(c));
        assert!(chain.is_empty());
        assert!(chain.by_hop_count().is_empty());
    }

    #[test]
    fn removing_absent_receiver_changes_nothing() {
        let mut chain = ChainRecord::new();
        chain.apply_announce(0, id(1));
        assert!(!chain.remove(id(2)));
        assert_eq!(chain.len(), 1);
    }

    #[test]
    fn topology_renders_placeholders_as_none() {
        let mut chain = ChainRecord::new();
        chain.apply_announce(1, id(0x0080_0000));
        let topology = chain.to_topology();
        assert_eq!(topology.positions, vec![Some("001bc50940800000".to_string()), None]);
    }

    proptest! {
        #[test]
        fn prop_sequences_stay_mirrored(
            announces in proptest::collection::vec((0u8..8, 0u32..6), 0..40),
            evictions in proptest::collection::vec(0u32..6, 0..6)
        ) {
            let mut chain = ChainRecord::new();
            for (hop, n) in announces {
                chain.apply_announce(hop, id(n));
            }
            for n in evictions {
                chain.remove(id(n));
            }

            let len = chain.len();
            prop_assert_eq!(chain.by_hop_count().len(), len);
            for (hop, slot) in chain.by_hop_count().iter().enumerate() {
                prop_assert_eq!(*slot, chain.positions()[len - hop - 1]);
            }
            prop_assert!(chain.positions().first().is_none_or(|slot| !slot.is_unknown()));
        }
    }
}
