//! Last-announce times of every receiver seen on any origin

use std::collections::BTreeMap;

use crate::types::{ReceiverId, Timestamp};

#[derive(Debug, Clone, Default)]
pub struct LivenessTable {
    last_announce: BTreeMap<ReceiverId, Timestamp>,
}

impl LivenessTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an announce, returning `true` if the receiver was not present
    pub fn touch(&mut self, receiver: ReceiverId, time: Timestamp) -> bool {
        self.last_announce.insert(receiver, time).is_none()
    }

    /// Remove and return every receiver whose last announce is strictly before `cutoff`
    pub fn expire(&mut self, cutoff: Timestamp) -> Vec<(ReceiverId, Timestamp)> {
        let expired: Vec<_> = self
            .last_announce
            .iter()
            .filter(|&(_, &last)| last < cutoff)
            .map(|(&id, &last)| (id, last))
            .collect();
        for (id, _) in &expired {
            self.last_announce.remove(id);
        }
        expired
    }

    pub fn last_announce(&self, receiver: ReceiverId) -> Option<Timestamp> {
        self.last_announce.get(&receiver).copied()
    }

    pub fn contains(&self, receiver: ReceiverId) -> bool {
        self.last_announce.contains_key(&receiver)
    }

    pub fn len(&self) -> usize {
        self.last_announce.len()
    }

    pub fn is_empty(&self) -> bool {
        self.last_announce.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(n: u32) -> ReceiverId {
        ReceiverId::from_reel_bytes(n.to_be_bytes())
    }

    #[test]
    fn touch_reports_first_sighting_only() {
        let mut table = LivenessTable::new();
        assert!(table.touch(id(1), Timestamp::from_millis(10)));
        assert!(!table.touch(id(1), Timestamp::from_millis(20)));
        assert_eq!(table.last_announce(id(1)), Some(Timestamp::from_millis(20)));
    }

    #[test]
    fn expiry_is_strictly_older_than_cutoff() {
        let mut table = LivenessTable::new();
        table.touch(id(1), Timestamp::from_millis(99));
        table.touch(id(2), Timestamp::from_millis(100));
        table.touch(id(3), Timestamp::from_millis(101));

        let expired = table.expire(Timestamp::from_millis(100));
        assert_eq!(expired, vec![(id(1), Timestamp::from_millis(99))]);
        assert!(!table.contains(id(1)));
        assert_eq!(table.len(), 2);

        // Expired receivers are new again on their next announce
        assert!(table.touch(id(1), Timestamp::from_millis(200)));
    }
}
