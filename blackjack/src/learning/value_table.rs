use std::collections::{BTreeMap, HashMap};
use std::ops::{Index, IndexMut};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::simulation::{hand::Hand, Rank};
use crate::{Action, Error, Result};

use super::Trajectory;

/// What the player can observe before a decision: own total, the usable-ace
/// flag and the dealer's up card. Prints as `16_0_T`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StateKey {
    pub player_total: u16,
    pub usable_ace: bool,
    pub dealer_up: Rank,
}

impl StateKey {
    pub fn new(player_total: u16, usable_ace: bool, dealer_up: Rank) -> Self {
        StateKey {
            player_total,
            usable_ace,
            dealer_up,
        }
    }

    pub fn from_hand(player_hand: &Hand, dealer_up: Rank) -> Self {
        let (player_total, usable_ace) = player_hand.total();
        StateKey::new(player_total, usable_ace, dealer_up)
    }
}

impl std::fmt::Display for StateKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}_{}_{}",
            self.player_total, self.usable_ace as u8, self.dealer_up
        )
    }
}

impl FromStr for StateKey {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let invalid = || Error::InvalidStateKey(s.to_string());
        let mut parts = s.split('_');
        let (Some(total), Some(usable), Some(up), None) =
            (parts.next(), parts.next(), parts.next(), parts.next())
        else {
            return Err(invalid());
        };
        let player_total = total.parse::<u16>().map_err(|_| invalid())?;
        let usable_ace = match usable {
            "0" => false,
            "1" => true,
            _ => return Err(invalid()),
        };
        let dealer_up = up.parse::<Rank>().map_err(|_| invalid())?;
        Ok(StateKey::new(player_total, usable_ace, dealer_up))
    }
}

/// Estimated return of each action in one state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ActionValues {
    pub hit: f64,
    pub stand: f64,
    pub double: f64,
}

static UNVISITED: ActionValues = ActionValues {
    hit: 0.0,
    stand: 0.0,
    double: 0.0,
};

impl ActionValues {
    /// Returns the action with the strictly largest value. Ties keep the
    /// earlier action in `hit, stand, double` order.
    pub fn best(&self) -> (f64, Action) {
        let (mut max_ex, mut max_decision) = (self.hit, Action::Hit);
        if max_ex < self.stand {
            (max_ex, max_decision) = (self.stand, Action::Stand);
        }
        if max_ex < self.double {
            (max_ex, max_decision) = (self.double, Action::Double);
        }

        (max_ex, max_decision)
    }
}

impl Index<Action> for ActionValues {
    type Output = f64;
    fn index(&self, action: Action) -> &Self::Output {
        match action {
            Action::Hit => &self.hit,
            Action::Stand => &self.stand,
            Action::Double => &self.double,
        }
    }
}

impl IndexMut<Action> for ActionValues {
    fn index_mut(&mut self, action: Action) -> &mut Self::Output {
        match action {
            Action::Hit => &mut self.hit,
            Action::Stand => &mut self.stand,
            Action::Double => &mut self.double,
        }
    }
}

/// Tabular action-value store. Entries are created with all-zero values on
/// first write and never removed. Reading an unknown state yields zeros
/// without creating it.
///
/// Serializes as a map from state-key strings to `{hit, stand, double}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(
    into = "BTreeMap<String, ActionValues>",
    try_from = "BTreeMap<String, ActionValues>"
)]
pub struct ValueTable {
    data: HashMap<StateKey, ActionValues>,
}

impl ValueTable {
    pub fn new() -> Self {
        ValueTable {
            data: HashMap::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn contains_state(&self, key: &StateKey) -> bool {
        self.data.contains_key(key)
    }

    /// Greedy action in the given state.
    pub fn greedy(&self, key: &StateKey) -> Action {
        self[key].best().1
    }

    /// Moves the value of every recorded (state, action) pair towards the
    /// episode's reward: `q += learning_rate * (reward - q)`.
    pub fn backup(&mut self, trajectory: &Trajectory, reward: f64, learning_rate: f64) {
        for step in trajectory.steps() {
            let q = &mut self[&step.state][step.action];
            *q += learning_rate * (reward - *q);
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&StateKey, &ActionValues)> {
        self.data.iter()
    }

    /// Exports the table keyed by state-key strings, in key order.
    pub fn export(&self) -> BTreeMap<String, ActionValues> {
        self.data
            .iter()
            .map(|(key, values)| (key.to_string(), *values))
            .collect()
    }

    /// Rebuilds a table from an exported mapping.
    pub fn import(exported: BTreeMap<String, ActionValues>) -> Result<Self> {
        let mut data = HashMap::with_capacity(exported.len());
        for (key, values) in exported {
            data.insert(key.parse::<StateKey>()?, values);
        }
        Ok(ValueTable { data })
    }
}

impl Index<&StateKey> for ValueTable {
    type Output = ActionValues;
    fn index(&self, key: &StateKey) -> &Self::Output {
        self.data.get(key).unwrap_or(&UNVISITED)
    }
}

impl IndexMut<&StateKey> for ValueTable {
    fn index_mut(&mut self, key: &StateKey) -> &mut Self::Output {
        self.data.entry(*key).or_default()
    }
}

impl From<ValueTable> for BTreeMap<String, ActionValues> {
    fn from(table: ValueTable) -> Self {
        table.export()
    }
}

impl TryFrom<BTreeMap<String, ActionValues>> for ValueTable {
    type Error = Error;

    fn try_from(exported: BTreeMap<String, ActionValues>) -> Result<Self> {
        ValueTable::import(exported)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(s: &str) -> StateKey {
        s.parse().unwrap()
    }

    #[test]
    fn state_key_string_form() {
        let k = StateKey::new(16, false, Rank::Ten);
        assert_eq!(k.to_string(), "16_0_T");
        assert_eq!(key("16_0_T"), k);
        assert_eq!(key("11_1_A"), StateKey::new(11, true, Rank::Ace));
        for bad in ["", "16_0", "16_2_T", "x_0_T", "16_0_Z", "16_0_T_1"] {
            assert!(matches!(
                bad.parse::<StateKey>(),
                Err(Error::InvalidStateKey(_))
            ));
        }
    }

    #[test]
    fn state_key_from_hand() {
        let hand: Hand = "A 9".parse().unwrap();
        assert_eq!(
            StateKey::from_hand(&hand, Rank::Six),
            StateKey::new(20, false, Rank::Six)
        );
    }

    #[test]
    fn ties_break_by_priority() {
        assert_eq!(ActionValues::default().best().1, Action::Hit);
        let values = ActionValues {
            hit: -0.5,
            stand: 0.2,
            double: 0.2,
        };
        assert_eq!(values.best(), (0.2, Action::Stand));
        let values = ActionValues {
            hit: -0.5,
            stand: 0.2,
            double: 0.3,
        };
        assert_eq!(values.best().1, Action::Double);
    }

    #[test]
    fn unknown_state_reads_as_zero_without_insert() {
        let table = ValueTable::new();
        let k = key("12_0_5");
        assert_eq!(table[&k], ActionValues::default());
        assert_eq!(table.greedy(&k), Action::Hit);
        assert!(table.is_empty());
    }

    #[test]
    fn single_step_backup() {
        let mut table = ValueTable::new();
        let mut trajectory = Trajectory::new();
        let k = key("15_0_T");
        trajectory.record(k, Action::Stand, 1);
        table.backup(&trajectory, -1.0, 0.02);
        assert!((table[&k].stand + 0.02).abs() < 1e-12);
        assert_eq!(table[&k].hit, 0.0);
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn every_visit_backup_applies_per_step() {
        let mut table = ValueTable::new();
        let mut trajectory = Trajectory::new();
        let k = key("12_0_2");
        trajectory.record(k, Action::Hit, 1);
        trajectory.record(k, Action::Hit, 1);
        table.backup(&trajectory, 1.0, 0.5);
        // 0 -> 0.5 -> 0.75
        assert!((table[&k].hit - 0.75).abs() < 1e-12);
    }

    #[test]
    fn serializes_as_string_keyed_map() {
        let mut table = ValueTable::new();
        table[&key("16_0_T")][Action::Hit] = -0.25;
        table[&key("20_0_6")][Action::Stand] = 0.5;

        let json = serde_json::to_string(&table).unwrap();
        assert_eq!(
            json,
            concat!(
                r#"{"16_0_T":{"hit":-0.25,"stand":0.0,"double":0.0},"#,
                r#""20_0_6":{"hit":0.0,"stand":0.5,"double":0.0}}"#,
            )
        );
        let restored: ValueTable = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, table);

        let bogus = r#"{"bogus":{"hit":0,"stand":0,"double":0}}"#;
        assert!(serde_json::from_str::<ValueTable>(bogus).is_err());
    }
}
