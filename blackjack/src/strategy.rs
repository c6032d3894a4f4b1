use crate::{
    learning::value_table::{StateKey, ValueTable},
    search,
    simulation::{hand::Hand, Rank},
    Action, Result,
};

/// A source of player decisions.
pub trait Strategy {
    fn decide(&mut self, player_hand: &Hand, dealer_up: Rank) -> Result<Action>;
}

/// Plays the greedy action of a learned value table, never exploring.
pub struct GreedyStrategy<'a> {
    table: &'a ValueTable,
}

impl<'a> GreedyStrategy<'a> {
    pub fn new(table: &'a ValueTable) -> Self {
        GreedyStrategy { table }
    }
}

impl Strategy for GreedyStrategy<'_> {
    fn decide(&mut self, player_hand: &Hand, dealer_up: Rank) -> Result<Action> {
        Ok(self
            .table
            .greedy(&StateKey::from_hand(player_hand, dealer_up)))
    }
}

/// Plays whatever the two-ply expectimax oracle recommends.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExpectimaxStrategy;

impl Strategy for ExpectimaxStrategy {
    fn decide(&mut self, player_hand: &Hand, dealer_up: Rank) -> Result<Action> {
        search::recommend(player_hand, dealer_up)
    }
}

/// Always stands. Useful as a baseline when judging a learned table.
#[derive(Debug, Clone, Copy, Default)]
pub struct AlwaysStand;

impl Strategy for AlwaysStand {
    fn decide(&mut self, _: &Hand, _: Rank) -> Result<Action> {
        Ok(Action::Stand)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::simulation::{evaluate_strategy, shoe::Shoe};

    #[test]
    fn greedy_strategy_reads_the_table() {
        let mut table = ValueTable::new();
        let player: Hand = "T 8".parse().unwrap();
        let state = StateKey::from_hand(&player, Rank::Nine);
        table[&state][Action::Stand] = 0.1;

        let mut strategy = GreedyStrategy::new(&table);
        assert_eq!(strategy.decide(&player, Rank::Nine).unwrap(), Action::Stand);
        // Unknown states fall back to the first action in priority order.
        assert_eq!(strategy.decide(&player, Rank::Two).unwrap(), Action::Hit);
    }

    #[test]
    fn expectimax_strategy_matches_the_oracle() {
        let player: Hand = "8 8".parse().unwrap();
        let mut strategy = ExpectimaxStrategy;
        assert_eq!(
            strategy.decide(&player, Rank::Six).unwrap(),
            search::recommend(&player, Rank::Six).unwrap()
        );
    }

    #[test]
    fn always_stand_never_busts_by_choice() {
        let mut shoe = Shoe::seeded(6, 4);
        let report = evaluate_strategy(&mut AlwaysStand, &mut shoe, 500).unwrap();
        assert_eq!(report.rounds, 500);
        assert!(report.total_reward.abs() <= 500.0);
    }
}
