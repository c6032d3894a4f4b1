use std::str::FromStr;

use crate::{Error, Result};

use super::{Card, Rank};

/// Computes `(sum, usable_ace)` of the given cards.
///
/// Every ace starts at 11 and is demoted to 1, one at a time, while the sum
/// exceeds 21. `usable_ace` is true only when the cards contain an ace and
/// the final sum is at most 11, so A+9 = 20 reports no usable ace.
pub fn total(cards: &[Card]) -> (u16, bool) {
    let mut sum: u16 = cards.iter().map(|card| card.blackjack_value() as u16).sum();
    let has_ace = cards.iter().any(|card| card.rank == Rank::Ace);
    let mut undemoted_aces = cards.iter().filter(|card| card.rank == Rank::Ace).count();
    while sum > 21 && undemoted_aces > 0 {
        sum -= 10;
        undemoted_aces -= 1;
    }
    (sum, has_ace && sum <= 11)
}

/// An ordered group of cards, append-only while a round is played.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Hand {
    cards: Vec<Card>,
}

impl Hand {
    pub fn new() -> Self {
        Self {
            cards: Vec::with_capacity(3),
        }
    }

    pub fn receive_card(&mut self, card: Card) {
        self.cards.push(card);
    }

    /// Returns a copy of this hand with one more card.
    pub fn with_card(&self, card: Card) -> Hand {
        let mut hand = self.clone();
        hand.receive_card(card);
        hand
    }

    pub fn cards(&self) -> &[Card] {
        &self.cards
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    pub fn total(&self) -> (u16, bool) {
        total(&self.cards)
    }

    pub fn sum(&self) -> u16 {
        self.total().0
    }

    pub fn bust(&self) -> bool {
        self.sum() > 21
    }

    pub fn clear(&mut self) {
        self.cards.clear();
    }
}

impl From<Vec<Card>> for Hand {
    fn from(cards: Vec<Card>) -> Self {
        Hand { cards }
    }
}

impl FromIterator<Card> for Hand {
    fn from_iter<I: IntoIterator<Item = Card>>(iter: I) -> Self {
        Hand {
            cards: iter.into_iter().collect(),
        }
    }
}

/// Parses rank symbols separated by whitespace or commas, e.g. `"A 9"` or `"8,8"`.
impl FromStr for Hand {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        s.split(|c: char| c.is_whitespace() || c == ',')
            .filter(|symbol| !symbol.is_empty())
            .map(Card::from_str)
            .collect()
    }
}

/// Prints rank symbols only, mirroring what `FromStr` accepts.
impl std::fmt::Display for Hand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for (i, card) in self.cards.iter().enumerate() {
            if i > 0 {
                write!(f, " ")?;
            }
            write!(f, "{}", card.rank)?;
        }
        Ok(())
    }
}
