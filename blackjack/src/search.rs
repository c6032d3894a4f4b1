//! Two-ply expectimax over the next card, used as a hint oracle.
//!
//! Every function here is pure: it reads nothing but its arguments, keeps no
//! state between calls and never touches a value table, so it can be called
//! at any time, including in the middle of a training run.
//!
//! Each of the 13 ranks is weighted 1/13, as if drawn from an infinite shoe.
//! Once the dealer's hole card is fixed, the rest of the dealer's hand is
//! drawn from a fresh [`StackedDeck`], which keeps the result deterministic.

use strum::IntoEnumIterator;

use crate::learning::value_table::ActionValues;
use crate::simulation::{dealer_plays, hand::Hand, shoe::StackedDeck, showdown, Card, Rank};
use crate::{Action, Result};

const RANK_COUNT: f64 = 13.0;

/// Expected unit result of standing on `player_hand` against `dealer_up`.
pub fn evaluate(player_hand: &Hand, dealer_up: Rank) -> Result<f64> {
    let player_sum = player_hand.sum();
    if player_sum > 21 {
        return Ok(-1.0);
    }

    let mut ex = 0.0;
    for hole_card in Rank::iter() {
        let mut dealer_hand = Hand::from(vec![Card::from(dealer_up), Card::from(hole_card)]);
        dealer_plays(&mut dealer_hand, &mut StackedDeck::new())?;
        ex += showdown(player_sum, dealer_hand.sum()) / RANK_COUNT;
    }
    Ok(ex)
}

/// Scores all three actions.
///
/// `stand` is `evaluate` of the hand itself, `hit` the mean of `evaluate`
/// over every possible next card, and `double` twice the `hit` value.
pub fn scores(player_hand: &Hand, dealer_up: Rank) -> Result<ActionValues> {
    let stand = evaluate(player_hand, dealer_up)?;
    let mut hit = 0.0;
    for next_card in Rank::iter() {
        let next_hand = player_hand.with_card(Card::from(next_card));
        hit += evaluate(&next_hand, dealer_up)? / RANK_COUNT;
    }

    Ok(ActionValues {
        hit,
        stand,
        double: 2.0 * hit,
    })
}

/// The action with the strictly greatest score, ties going to
/// `hit`, then `stand`, then `double`.
pub fn recommend(player_hand: &Hand, dealer_up: Rank) -> Result<Action> {
    Ok(scores(player_hand, dealer_up)?.best().1)
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOLERANCE: f64 = 1e-9;

    fn hand(symbols: &str) -> Hand {
        symbols.parse().unwrap()
    }

    fn assert_close(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() < TOLERANCE,
            "expected {}, got {}",
            expected,
            actual
        );
    }

    #[test]
    fn busted_hand_is_a_sure_loss() {
        assert_eq!(evaluate(&hand("T 9 5"), Rank::Six).unwrap(), -1.0);
    }

    #[test]
    fn pair_of_eights_against_six_stands() {
        let values = scores(&hand("8 8"), Rank::Six).unwrap();
        assert_close(values.stand, 3.0 / 13.0);
        assert_close(values.hit, -64.0 / 169.0);
        assert_close(values.double, -128.0 / 169.0);
        assert!(values.stand > values.hit);
        assert_eq!(recommend(&hand("8 8"), Rank::Six).unwrap(), Action::Stand);
    }

    #[test]
    fn eleven_against_five_doubles() {
        let values = scores(&hand("5 6"), Rank::Five).unwrap();
        assert_close(values.stand, 3.0 / 13.0);
        assert_close(values.hit, 7.0 / 13.0);
        assert_close(values.double, 14.0 / 13.0);
        assert_eq!(recommend(&hand("5 6"), Rank::Five).unwrap(), Action::Double);
    }

    #[test]
    fn twenty_against_ace_stands() {
        let values = scores(&hand("T T"), Rank::Ace).unwrap();
        assert_close(values.stand, 4.0 / 13.0);
        assert_close(values.hit, -147.0 / 169.0);
        assert_eq!(recommend(&hand("T T"), Rank::Ace).unwrap(), Action::Stand);
    }

    #[test]
    fn stiff_seventeen_against_ten() {
        let values = scores(&hand("T 7"), Rank::Ten).unwrap();
        assert_close(values.stand, -2.0 / 13.0);
        assert_close(values.hit, -96.0 / 169.0);
        assert_eq!(recommend(&hand("T 7"), Rank::Ten).unwrap(), Action::Stand);
    }

    #[test]
    fn positive_hit_value_makes_double_dominant() {
        let values = scores(&hand("A 6"), Rank::Nine).unwrap();
        assert_close(values.hit, 4.0 / 169.0);
        assert_eq!(recommend(&hand("A 6"), Rank::Nine).unwrap(), Action::Double);
    }

    #[test]
    fn recommend_is_deterministic() {
        let player = hand("9 3");
        let first = scores(&player, Rank::Four).unwrap();
        for up in Rank::iter() {
            // Interleave other queries; nothing may leak between calls.
            recommend(&hand("A 7"), up).unwrap();
        }
        for _ in 0..5 {
            assert_eq!(scores(&player, Rank::Four).unwrap(), first);
            assert_eq!(
                recommend(&player, Rank::Four).unwrap(),
                first.best().1
            );
        }
    }

    #[test]
    fn evaluations_stay_in_range() {
        for up in Rank::iter() {
            for first in Rank::iter() {
                let player = Hand::from(vec![Card::from(first), Card::from(Rank::Seven)]);
                let ev = evaluate(&player, up).unwrap();
                assert!((-1.0..=1.0).contains(&ev));
                let values = scores(&player, up).unwrap();
                assert!((-2.0..=2.0).contains(&values.double));
            }
        }
    }
}
