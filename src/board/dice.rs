//! Dice rolls and the dice field of a position.

use rand::Rng;

/// A roll of two dice, kept in the order they were rolled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DiceRoll {
    first: u8,
    second: u8,
}

impl DiceRoll {
    /// Creates a roll. Returns None unless both values are in 1..=6.
    pub fn new(first: u8, second: u8) -> Option<DiceRoll> {
        if (1..=6).contains(&first) && (1..=6).contains(&second) {
            Some(DiceRoll { first, second })
        } else {
            None
        }
    }

    /// Rolls two random dice.
    pub fn random(rng: &mut impl Rng) -> DiceRoll {
        DiceRoll {
            first: rng.gen_range(1..=6),
            second: rng.gen_range(1..=6),
        }
    }

    pub fn first(self) -> u8 {
        self.first
    }

    pub fn second(self) -> u8 {
        self.second
    }

    pub fn is_double(self) -> bool {
        self.first == self.second
    }

    /// Returns the usable die values: four copies for doubles, otherwise the
    /// two values with the larger first.
    pub fn values(self) -> Vec<u8> {
        if self.is_double() {
            vec![self.first; 4]
        } else {
            vec![self.first.max(self.second), self.first.min(self.second)]
        }
    }

    /// Returns the larger of the two dice.
    pub fn high(self) -> u8 {
        self.first.max(self.second)
    }
}

/// All 36 ordered outcomes of two dice.
pub fn all_rolls() -> impl Iterator<Item = DiceRoll> {
    (1..=6u8).flat_map(|a| (1..=6u8).map(move |b| DiceRoll { first: a, second: b }))
}

/// The dice field of a position: either a roll or the state of the turn
/// before dice are thrown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DiceField {
    /// The side on roll has not rolled yet.
    Pending,
    Rolled(DiceRoll),
    /// The side on roll has been offered a double.
    Doubled,
    /// The double was beavered.
    Beavered,
    /// The beaver was raccooned.
    Raccooned,
}

impl DiceField {
    /// Returns the roll, if the dice have been thrown.
    pub fn roll(self) -> Option<DiceRoll> {
        match self {
            DiceField::Rolled(r) => Some(r),
            _ => None,
        }
    }
}
