use super::{Card, Rank, Suit};

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use strum::IntoEnumIterator;
use tracing::debug;

/// Anything the dealer or a player can draw cards from.
pub trait CardSource {
    fn draw(&mut self) -> Card;
}

/// Builds `number_of_decks` ordered decks, rank by rank.
fn ordered_cards(number_of_decks: u8) -> Vec<Card> {
    let mut cards = Vec::with_capacity(number_of_decks as usize * 52);
    for _ in 0..number_of_decks {
        for rank in Rank::iter() {
            for suit in Suit::iter() {
                cards.push(Card { rank, suit });
            }
        }
    }
    cards
}

/// Represents a shoe in the real world. Cards are dealt from the top until
/// the shoe runs dry, then the whole shoe is rebuilt and shuffled again.
#[derive(Debug, Clone)]
pub struct Shoe<R: Rng = StdRng> {
    number_of_decks: u8,
    cards: Vec<Card>,
    current_index: usize,
    rng: R,
}

impl Shoe<StdRng> {
    /// Creates a shuffled shoe seeded from the operating system.
    ///
    /// # Panics
    ///
    /// Panics if `number_of_decks` is 0. `AgentConfig::validate` rejects that
    /// value before an agent builds its shoe.
    pub fn new(number_of_decks: u8) -> Self {
        Self::with_rng(number_of_decks, StdRng::from_entropy())
    }

    /// Creates a shuffled shoe whose every permutation is reproducible.
    ///
    /// # Panics
    ///
    /// Panics if `number_of_decks` is 0.
    pub fn seeded(number_of_decks: u8, seed: u64) -> Self {
        Self::with_rng(number_of_decks, StdRng::seed_from_u64(seed))
    }
}

impl<R: Rng> Shoe<R> {
    /// Creates a shoe shuffled by the given generator.
    ///
    /// # Panics
    ///
    /// Panics if `number_of_decks` is 0.
    pub fn with_rng(number_of_decks: u8, rng: R) -> Self {
        if number_of_decks == 0 {
            panic!("Invalid number of decks! It must be positive");
        }
        let mut shoe = Shoe {
            number_of_decks,
            cards: Vec::new(),
            current_index: 0,
            rng,
        };
        shoe.reset();
        shoe
    }

    /// Returns every card into the shoe and shuffles uniformly (Fisher-Yates).
    pub fn reset(&mut self) {
        self.cards = ordered_cards(self.number_of_decks);
        self.cards.shuffle(&mut self.rng);
        self.current_index = 0;
        debug!(decks = self.number_of_decks, "shuffled a fresh shoe");
    }

    /// Deals the top card, reshuffling a full shoe first if it is empty.
    pub fn draw(&mut self) -> Card {
        if self.current_index == self.cards.len() {
            self.reset();
        }
        let card = self.cards[self.current_index];
        self.current_index += 1;
        card
    }

    /// Number of cards left before the next reshuffle.
    pub fn remaining(&self) -> usize {
        self.cards.len() - self.current_index
    }

    pub fn number_of_decks(&self) -> u8 {
        self.number_of_decks
    }

    /// Number of cards in a full shoe.
    pub fn capacity(&self) -> usize {
        self.number_of_decks as usize * 52
    }

    /// Lets the caller peek at the top cards without dealing them.
    pub fn preview_next_few_cards(&self, number: usize) -> &[Card] {
        let end = (self.current_index + number).min(self.cards.len());
        &self.cards[self.current_index..end]
    }
}

impl<R: Rng> CardSource for Shoe<R> {
    fn draw(&mut self) -> Card {
        Shoe::draw(self)
    }
}

/// A single unshuffled deck dealt face down from the top: four kings first,
/// then four queens, and so on down to the aces. Used wherever a dealer hand
/// must be completed deterministically. Restacks itself when empty.
#[derive(Debug, Clone)]
pub struct StackedDeck {
    cards: Vec<Card>,
    dealt: usize,
}

impl StackedDeck {
    pub fn new() -> Self {
        StackedDeck {
            cards: ordered_cards(1),
            dealt: 0,
        }
    }
}

impl Default for StackedDeck {
    fn default() -> Self {
        Self::new()
    }
}

impl CardSource for StackedDeck {
    fn draw(&mut self) -> Card {
        if self.dealt == self.cards.len() {
            self.dealt = 0;
        }
        self.dealt += 1;
        self.cards[self.cards.len() - self.dealt]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn number_of_cards_is_correct(cards: &[Card], number_of_decks: u8) -> bool {
        for rank in Rank::iter() {
            for suit in Suit::iter() {
                let count = cards
                    .iter()
                    .filter(|card| card.rank == rank && card.suit == suit)
                    .count();
                if count != number_of_decks as usize {
                    return false;
                }
            }
        }
        true
    }

    #[test]
    fn new_shoe_is_full_and_shuffled() {
        let number_of_decks = 3;
        let shoe = Shoe::seeded(number_of_decks, 1);
        assert_eq!(shoe.remaining(), number_of_decks as usize * 52);
        assert!(number_of_cards_is_correct(&shoe.cards, number_of_decks));
        assert_ne!(shoe.cards, ordered_cards(number_of_decks));
    }

    #[test]
    fn same_seed_deals_same_cards() {
        let mut a = Shoe::seeded(2, 42);
        let mut b = Shoe::seeded(2, 42);
        for _ in 0..300 {
            assert_eq!(a.draw(), b.draw());
        }
    }

    #[test]
    fn drained_shoe_reshuffles_a_full_multiset() {
        let number_of_decks = 2;
        let mut shoe = Shoe::seeded(number_of_decks, 9);
        let mut dealt = Vec::new();
        for _ in 0..shoe.capacity() {
            dealt.push(shoe.draw());
        }
        assert_eq!(shoe.remaining(), 0);
        assert!(number_of_cards_is_correct(&dealt, number_of_decks));

        let first_of_new_shoe = shoe.draw();
        assert_eq!(shoe.remaining(), shoe.capacity() - 1);
        assert!(number_of_cards_is_correct(&shoe.cards, number_of_decks));
        assert_eq!(shoe.cards[0], first_of_new_shoe);
    }

    #[test]
    fn preview_does_not_deal() {
        let mut shoe = Shoe::seeded(1, 3);
        let top: Vec<Card> = shoe.preview_next_few_cards(3).to_vec();
        assert_eq!(shoe.remaining(), 52);
        assert_eq!(shoe.draw(), top[0]);
        assert_eq!(shoe.preview_next_few_cards(100).len(), 51);
    }

    #[test]
    #[should_panic]
    fn empty_shoe_should_panic() {
        Shoe::seeded(0, 0);
    }

    #[test]
    #[should_panic(expected = "number of decks")]
    fn empty_entropy_shoe_should_panic() {
        Shoe::new(0);
    }

    #[test]
    fn stacked_deck_deals_kings_first_and_restacks() {
        let mut deck = StackedDeck::new();
        let first: Vec<Rank> = (0..5).map(|_| deck.draw().rank).collect();
        assert_eq!(
            first,
            vec![Rank::King, Rank::King, Rank::King, Rank::King, Rank::Queen]
        );
        for _ in 5..52 {
            deck.draw();
        }
        assert_eq!(deck.draw().rank, Rank::King);
    }
}
