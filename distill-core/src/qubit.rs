//! Logical qubit labels
//!
//! Every qubit in the engine is named by the party holding it and the pair
//! (slot) it belongs to. Composite states carry an ordered list of these
//! labels, so operations address qubits by name instead of by tensor position.

use std::fmt;

/// Holder of a qubit
#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub enum Party {
    /// Left end of a link
    Alice,
    /// Right end of a link
    Bob,
    /// Single calibration qubit used for channel estimation
    Probe,
}

impl Party {
    fn prefix(self) -> char {
        match self {
            Party::Alice => 'A',
            Party::Bob => 'B',
            Party::Probe => 'P',
        }
    }
}

/// Type-safe logical name for a qubit
///
/// # Example
/// ```
/// use distill_core::QubitLabel;
///
/// let a1 = QubitLabel::alice(1);
/// assert_eq!(a1.to_string(), "A1");
/// assert_eq!(a1.partner(), Some(QubitLabel::bob(1)));
/// ```
#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct QubitLabel {
    party: Party,
    slot: u8,
}

impl QubitLabel {
    #[inline]
    pub const fn new(party: Party, slot: u8) -> Self {
        Self { party, slot }
    }

    /// Alice's half of pair `slot`
    #[inline]
    pub const fn alice(slot: u8) -> Self {
        Self::new(Party::Alice, slot)
    }

    /// Bob's half of pair `slot`
    #[inline]
    pub const fn bob(slot: u8) -> Self {
        Self::new(Party::Bob, slot)
    }

    /// Calibration probe `slot`
    #[inline]
    pub const fn probe(slot: u8) -> Self {
        Self::new(Party::Probe, slot)
    }

    #[inline]
    pub const fn party(&self) -> Party {
        self.party
    }

    #[inline]
    pub const fn slot(&self) -> u8 {
        self.slot
    }

    /// Same party, different pair slot
    #[inline]
    pub const fn with_slot(&self, slot: u8) -> Self {
        Self::new(self.party, slot)
    }
}

impl fmt::Display for QubitLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.party.prefix(), self.slot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_label_display() {
        assert_eq!(QubitLabel::alice(1).to_string(), "A1");
        assert_eq!(QubitLabel::bob(2).to_string(), "B2");
        assert_eq!(QubitLabel::probe(0).to_string(), "P0");
    }

    #[test]
    fn test_label_equality() {
        assert_eq!(QubitLabel::alice(1), QubitLabel::new(Party::Alice, 1));
        assert_ne!(QubitLabel::alice(1), QubitLabel::bob(1));
        assert_ne!(QubitLabel::alice(1), QubitLabel::alice(2));
    }

    #[test]
    fn test_with_slot() {
        let b2 = QubitLabel::bob(1).with_slot(2);
        assert_eq!(b2.party(), Party::Bob);
        assert_eq!(b2.slot(), 2);
    }
}
