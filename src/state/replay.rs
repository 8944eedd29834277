use zse_api::{MatchDetail, MatchTurn};

/// Cursor over the turns of one match. The cursor never leaves `[0, len - 1]`
/// and stepping past either end is a no-op.
#[derive(Debug, Clone, PartialEq)]
pub struct TurnNavigator {
    turns: Vec<MatchTurn>,
    cursor: usize,
}

impl TurnNavigator {
    /// `None` when there is nothing to navigate.
    pub fn new(turns: Vec<MatchTurn>) -> Option<Self> {
        if turns.is_empty() {
            return None;
        }
        Some(Self { turns, cursor: 0 })
    }

    /// Swap in another match's turns and rewind. An empty sequence leaves the
    /// navigator untouched and returns false.
    pub fn load(&mut self, turns: Vec<MatchTurn>) -> bool {
        if turns.is_empty() {
            return false;
        }
        self.turns = turns;
        self.cursor = 0;
        true
    }

    pub fn advance(&mut self) {
        self.cursor = (self.cursor + 1).min(self.turns.len() - 1);
    }

    pub fn retreat(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }

    pub fn current(&self) -> &MatchTurn {
        &self.turns[self.cursor]
    }

    /// Zero-based.
    pub fn position(&self) -> usize {
        self.cursor
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_first(&self) -> bool {
        self.cursor == 0
    }

    pub fn is_last(&self) -> bool {
        self.cursor + 1 == self.turns.len()
    }
}

/// A loaded match ready for turn-by-turn viewing.
#[derive(Debug, Clone, PartialEq)]
pub struct Replay {
    pub id: String,
    pub game: String,
    pub participants: Vec<String>,
    pub turns: TurnNavigator,
}

impl Replay {
    pub fn from_detail(detail: MatchDetail) -> Option<Self> {
        let turns = TurnNavigator::new(detail.turns)?;
        Some(Self { id: detail.id, game: detail.game, participants: detail.participants, turns })
    }

    /// Take freshly fetched turns for this same match; the cursor rewinds.
    pub fn refresh(&mut self, detail: MatchDetail) -> bool {
        self.game = detail.game;
        self.participants = detail.participants;
        self.turns.load(detail.turns)
    }

    pub fn is_chess(&self) -> bool {
        self.game.eq_ignore_ascii_case("chess")
    }

    /// "Turn i of n", one-based.
    pub fn turn_label(&self) -> String {
        format!("Turn {} of {}", self.turns.position() + 1, self.turns.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn turns(n: usize) -> Vec<MatchTurn> {
        (0..n)
            .map(|i| MatchTurn { move_label: format!("move {i}"), ..Default::default() })
            .collect()
    }

    #[test]
    fn empty_sequence_has_no_navigator() {
        assert!(TurnNavigator::new(Vec::new()).is_none());
    }

    #[test]
    fn retreat_clamps_at_zero() {
        let mut nav = TurnNavigator::new(turns(4)).unwrap();
        nav.advance();
        nav.advance();
        for _ in 0..5 {
            nav.retreat();
        }
        assert_eq!(nav.position(), 0);
        assert!(nav.is_first());
        assert_eq!(nav.current().move_label, "move 0");
    }

    #[test]
    fn advance_clamps_at_last() {
        let mut nav = TurnNavigator::new(turns(4)).unwrap();
        for _ in 0..9 {
            nav.advance();
        }
        assert_eq!(nav.position(), 3);
        assert!(nav.is_last());
        assert_eq!(nav.current().move_label, "move 3");
    }

    #[test]
    fn single_turn_is_first_and_last() {
        let mut nav = TurnNavigator::new(turns(1)).unwrap();
        nav.advance();
        nav.retreat();
        assert_eq!(nav.position(), 0);
        assert!(nav.is_first() && nav.is_last());
    }

    #[test]
    fn load_rewinds_and_rejects_empty() {
        let mut nav = TurnNavigator::new(turns(4)).unwrap();
        nav.advance();
        nav.advance();
        assert!(nav.load(turns(2)));
        assert_eq!(nav.position(), 0);
        assert_eq!(nav.len(), 2);

        nav.advance();
        assert!(!nav.load(Vec::new()));
        assert_eq!(nav.position(), 1);
        assert_eq!(nav.len(), 2);
    }

    #[test]
    fn replay_labels_turns_one_based() {
        let detail = MatchDetail {
            id: "m1".into(),
            game: "Chess".into(),
            participants: vec!["a".into(), "b".into()],
            turns: turns(3),
        };
        let mut replay = Replay::from_detail(detail).unwrap();
        assert!(replay.is_chess());
        assert_eq!(replay.turn_label(), "Turn 1 of 3");
        replay.turns.advance();
        assert_eq!(replay.turn_label(), "Turn 2 of 3");
    }
}
