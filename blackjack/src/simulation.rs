pub mod hand;
pub mod shoe;

use std::str::FromStr;

use crate::{learning::value_table::StateKey, strategy::Strategy, Action, Error, Result};
use blackjack_brain_macros::allowed_phase;
use strum_macros::EnumIter;
use tracing::debug;

use self::{hand::Hand, shoe::CardSource};

static RANK_TO_BLACKJACK_VALUE: [u8; 13] = [11, 2, 3, 4, 5, 6, 7, 8, 9, 10, 10, 10, 10];

/// Upper bound on the cards a dealer may draw in one hand. Even a shoe of
/// nothing but aces stands long before this.
pub const DEALER_DRAW_LIMIT: usize = 32;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter)]
pub enum Suit {
    Diamond = 0,
    Club,
    Heart,
    Spade,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, EnumIter)]
pub enum Rank {
    Ace = 0,
    Two,
    Three,
    Four,
    Five,
    Six,
    Seven,
    Eight,
    Nine,
    Ten,
    Jack,
    Queen,
    King,
}

impl Rank {
    /// Aces count 11 here; demotion to 1 is the hand evaluator's job.
    pub fn blackjack_value(self) -> u8 {
        RANK_TO_BLACKJACK_VALUE[self as usize]
    }

    pub fn symbol(self) -> char {
        match self {
            Rank::Ace => 'A',
            Rank::Two => '2',
            Rank::Three => '3',
            Rank::Four => '4',
            Rank::Five => '5',
            Rank::Six => '6',
            Rank::Seven => '7',
            Rank::Eight => '8',
            Rank::Nine => '9',
            Rank::Ten => 'T',
            Rank::Jack => 'J',
            Rank::Queen => 'Q',
            Rank::King => 'K',
        }
    }
}

impl std::fmt::Display for Rank {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.symbol())
    }
}

impl FromStr for Rank {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let rank = match s.trim().to_ascii_uppercase().as_str() {
            "A" => Rank::Ace,
            "2" => Rank::Two,
            "3" => Rank::Three,
            "4" => Rank::Four,
            "5" => Rank::Five,
            "6" => Rank::Six,
            "7" => Rank::Seven,
            "8" => Rank::Eight,
            "9" => Rank::Nine,
            "T" | "10" => Rank::Ten,
            "J" => Rank::Jack,
            "Q" => Rank::Queen,
            "K" => Rank::King,
            _ => return Err(Error::InvalidRank(s.to_string())),
        };
        Ok(rank)
    }
}

/// Represents a card in the real world with a suit and a rank. The suit never
/// matters to the game logic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Card {
    pub rank: Rank,
    pub suit: Suit,
}

impl Card {
    pub fn new(rank: Rank, suit: Suit) -> Self {
        Card { rank, suit }
    }

    pub fn blackjack_value(&self) -> u8 {
        self.rank.blackjack_value()
    }
}

impl From<Rank> for Card {
    fn from(rank: Rank) -> Self {
        Card {
            rank,
            suit: Suit::Diamond,
        }
    }
}

impl FromStr for Card {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Ok(Card::from(s.parse::<Rank>()?))
    }
}

impl std::fmt::Display for Card {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let suit = match self.suit {
            Suit::Diamond => 'D',
            Suit::Club => 'C',
            Suit::Heart => 'H',
            Suit::Spade => 'S',
        };
        write!(f, "{}{}", suit, self.rank)
    }
}

/// Unit result of a finished hand: +1 player wins, 0 push, -1 dealer wins.
/// A player over 21 always loses, whatever the dealer holds.
pub fn showdown(player_sum: u16, dealer_sum: u16) -> f64 {
    if player_sum > 21 {
        -1.0
    } else if dealer_sum > 21 || player_sum > dealer_sum {
        1.0
    } else if player_sum < dealer_sum {
        -1.0
    } else {
        0.0
    }
}

/// Makes the dealer draw until it must stand: below 17 it hits, and on 17
/// it hits only while holding a usable ace.
///
/// Returns `Error::DealerRunaway` once `DEALER_DRAW_LIMIT` cards have been
/// drawn without reaching a standing total.
pub fn dealer_plays<S: CardSource + ?Sized>(dealer_hand: &mut Hand, source: &mut S) -> Result<()> {
    dealer_plays_with_limit(dealer_hand, source, DEALER_DRAW_LIMIT)
}

fn dealer_plays_with_limit<S: CardSource + ?Sized>(
    dealer_hand: &mut Hand,
    source: &mut S,
    draw_limit: usize,
) -> Result<()> {
    let mut draws = 0;
    loop {
        let must_stand = {
            let (sum, usable_ace) = dealer_hand.total();
            if sum > 17 {
                true
            } else if sum < 17 {
                false
            } else {
                !usable_ace
            }
        };
        if must_stand {
            return Ok(());
        }
        if draws == draw_limit {
            return Err(Error::DealerRunaway { draws });
        }

        dealer_hand.receive_card(source.draw());
        draws += 1;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoundPhase {
    Play,
    Settled,
}

/// How a finished round paid out.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Settlement {
    /// +1, 0 or -1 per unit staked.
    pub result: f64,
    /// 1 normally, 2 after a double down.
    pub multiplier: u8,
}

impl Settlement {
    pub fn reward(&self) -> f64 {
        self.result * self.multiplier as f64
    }
}

/// One single-player round against the dealer. The dealer's first card is the
/// visible up card.
#[derive(Debug, Clone)]
pub struct Round {
    phase: RoundPhase,
    player_hand: Hand,
    dealer_hand: Hand,
    multiplier: u8,
    settlement: Option<Settlement>,
}

impl Round {
    /// Deals two cards to the player, then two to the dealer.
    pub fn deal<S: CardSource + ?Sized>(source: &mut S) -> Self {
        let mut player_hand = Hand::new();
        player_hand.receive_card(source.draw());
        player_hand.receive_card(source.draw());
        let mut dealer_hand = Hand::new();
        dealer_hand.receive_card(source.draw());
        dealer_hand.receive_card(source.draw());

        Round {
            phase: RoundPhase::Play,
            player_hand,
            dealer_hand,
            multiplier: 1,
            settlement: None,
        }
    }

    /// Can be called at Settled phase.
    /// Clears both hands and deals a fresh round from the given source.
    #[allowed_phase(Settled)]
    pub fn redeal<S: CardSource + ?Sized>(&mut self, source: &mut S) -> Result<()> {
        *self = Round::deal(source);
        Ok(())
    }

    /// Can be called at Play phase.
    /// Returns the settlement if the hit busts the player.
    #[allowed_phase(Play)]
    pub fn hit<S: CardSource + ?Sized>(&mut self, source: &mut S) -> Result<Option<Settlement>> {
        self.player_hand.receive_card(source.draw());
        if self.player_hand.bust() {
            return Ok(Some(self.settle(-1.0)));
        }
        Ok(None)
    }

    /// Can be called at Play phase.
    #[allowed_phase(Play)]
    pub fn stand<S: CardSource + ?Sized>(&mut self, source: &mut S) -> Result<Settlement> {
        self.dealer_plays_and_settle(source)
    }

    /// Can be called at Play phase.
    /// Doubles the stake, draws exactly one card and ends the player's turn.
    /// The dealer still plays out its hand when that card busts the player.
    #[allowed_phase(Play)]
    pub fn double<S: CardSource + ?Sized>(&mut self, source: &mut S) -> Result<Settlement> {
        self.multiplier *= 2;
        self.player_hand.receive_card(source.draw());
        self.dealer_plays_and_settle(source)
    }

    /// Performs the given action. Returns the settlement if the round ended.
    pub fn apply<S: CardSource + ?Sized>(
        &mut self,
        action: Action,
        source: &mut S,
    ) -> Result<Option<Settlement>> {
        match action {
            Action::Hit => self.hit(source),
            Action::Stand => self.stand(source).map(Some),
            Action::Double => self.double(source).map(Some),
        }
    }

    pub fn phase(&self) -> RoundPhase {
        self.phase
    }

    pub fn player_hand(&self) -> &Hand {
        &self.player_hand
    }

    pub fn dealer_hand(&self) -> &Hand {
        &self.dealer_hand
    }

    pub fn dealer_up(&self) -> Rank {
        self.dealer_hand.cards()[0].rank
    }

    pub fn multiplier(&self) -> u8 {
        self.multiplier
    }

    pub fn settlement(&self) -> Option<Settlement> {
        self.settlement
    }

    pub fn state_key(&self) -> StateKey {
        StateKey::from_hand(&self.player_hand, self.dealer_up())
    }

    fn dealer_plays_and_settle<S: CardSource + ?Sized>(
        &mut self,
        source: &mut S,
    ) -> Result<Settlement> {
        dealer_plays(&mut self.dealer_hand, source)?;
        let result = showdown(self.player_hand.sum(), self.dealer_hand.sum());
        Ok(self.settle(result))
    }

    fn settle(&mut self, result: f64) -> Settlement {
        let settlement = Settlement {
            result,
            multiplier: self.multiplier,
        };
        self.settlement = Some(settlement);
        self.phase = RoundPhase::Settled;
        settlement
    }
}

/// Aggregate result of playing a strategy for a number of rounds.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PolicyReport {
    pub rounds: u64,
    pub wins: u64,
    pub pushes: u64,
    pub losses: u64,
    pub total_reward: f64,
}

impl PolicyReport {
    /// Mean reward per round, counting doubled stakes.
    pub fn mean_reward(&self) -> f64 {
        if self.rounds == 0 {
            0.0
        } else {
            self.total_reward / self.rounds as f64
        }
    }

    fn record(&mut self, settlement: &Settlement) {
        self.rounds += 1;
        self.total_reward += settlement.reward();
        if settlement.result > 0.0 {
            self.wins += 1;
        } else if settlement.result < 0.0 {
            self.losses += 1;
        } else {
            self.pushes += 1;
        }
    }
}

/// Plays `rounds` rounds from the given source, asking the strategy for every
/// decision.
pub fn evaluate_strategy<T: Strategy + ?Sized, S: CardSource + ?Sized>(
    strategy: &mut T,
    source: &mut S,
    rounds: u64,
) -> Result<PolicyReport> {
    let mut report = PolicyReport::default();
    for _ in 0..rounds {
        let mut round = Round::deal(source);
        let settlement = loop {
            let decision = strategy.decide(round.player_hand(), round.dealer_up())?;
            if let Some(settlement) = round.apply(decision, source)? {
                break settlement;
            }
        };
        report.record(&settlement);
    }
    debug!(
        rounds = report.rounds,
        mean_reward = report.mean_reward(),
        "evaluated strategy"
    );
    Ok(report)
}
