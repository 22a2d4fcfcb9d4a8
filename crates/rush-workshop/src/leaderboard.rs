use std::collections::BTreeMap;

use rush_compose::CompositionEngine;
use rush_types::{AccountId, CarId};
use serde::{Deserialize, Serialize};

use crate::error::{WorkshopError, WorkshopResult};

/// A car's best recorded result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreEntry {
    pub car_id: CarId,
    pub score: u64,
    /// Sequence number of the result that set this score; lower ranks first on ties.
    pub achieved_seq: u64,
}

/// Best score per car, ranked by score descending then by `achieved_seq`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Leaderboard {
    authority: Option<AccountId>,
    best: BTreeMap<CarId, ScoreEntry>,
    next_seq: u64,
}

impl Leaderboard {
    pub fn authority(&self) -> Option<AccountId> {
        self.authority
    }

    pub fn set_authority(&mut self, authority: Option<AccountId>) {
        self.authority = authority;
    }

    pub fn is_authorized(&self, caller: &AccountId, operator: &AccountId) -> bool {
        caller == operator || self.authority.as_ref() == Some(caller)
    }

    /// Record a race result. Returns `true` if it became the car's best.
    ///
    /// A score only replaces the stored one when strictly greater, so an
    /// equal score never moves a car ahead of an earlier achiever.
    pub fn record(
        &mut self,
        engine: &CompositionEngine,
        caller: AccountId,
        operator: AccountId,
        car_id: CarId,
        score: u64,
    ) -> WorkshopResult<bool> {
        if !self.is_authorized(&caller, &operator) {
            return Err(WorkshopError::Unauthorized(caller));
        }
        engine.get(car_id)?;

        let seq = self.next_seq;
        self.next_seq += 1;

        let improved = self.best.get(&car_id).map_or(true, |entry| score > entry.score);
        if improved {
            self.best.insert(
                car_id,
                ScoreEntry {
                    car_id,
                    score,
                    achieved_seq: seq,
                },
            );
        }
        tracing::info!(car = %car_id, score, improved, "race result recorded");
        Ok(improved)
    }

    pub fn best_score(&self, car_id: CarId) -> Option<u64> {
        self.best.get(&car_id).map(|entry| entry.score)
    }

    /// Every entry in rank order.
    pub fn ranking(&self) -> Vec<ScoreEntry> {
        let mut entries: Vec<ScoreEntry> = self.best.values().copied().collect();
        entries.sort_by(|a, b| {
            b.score
                .cmp(&a.score)
                .then_with(|| a.achieved_seq.cmp(&b.achieved_seq))
        });
        entries
    }

    pub fn top(&self, n: usize) -> Vec<ScoreEntry> {
        let mut ranking = self.ranking();
        ranking.truncate(n);
        ranking
    }

    /// One-based rank of the car, if it has a recorded score.
    pub fn rank_of(&self, car_id: CarId) -> Option<usize> {
        self.ranking()
            .iter()
            .position(|entry| entry.car_id == car_id)
            .map(|index| index + 1)
    }

    pub fn len(&self) -> usize {
        self.best.len()
    }

    pub fn is_empty(&self) -> bool {
        self.best.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rush_compose::ComposeError;
    use rush_parts::PartRegistry;
    use rush_types::{PartSpec, PartType};

    fn operator() -> AccountId {
        AccountId::from_label("operator")
    }

    fn garage(cars: usize) -> (CompositionEngine, Vec<CarId>) {
        let mut engine = CompositionEngine::default();
        let mut parts = PartRegistry::default();
        let specs = [
            PartSpec::new(PartType::Engine, [1, 1, 1], "e"),
            PartSpec::new(PartType::Transmission, [1, 1, 1], "t"),
            PartSpec::new(PartType::Wheels, [1, 1, 1], "w"),
        ];
        let ids = (0..cars)
            .map(|_| engine.mint_car(&mut parts, operator(), "car", &specs).unwrap())
            .collect();
        (engine, ids)
    }

    #[test]
    fn keeps_best_score_per_car() {
        let (engine, cars) = garage(1);
        let mut board = Leaderboard::default();
        assert!(board.record(&engine, operator(), operator(), cars[0], 50).unwrap());
        assert!(!board.record(&engine, operator(), operator(), cars[0], 40).unwrap());
        assert!(!board.record(&engine, operator(), operator(), cars[0], 50).unwrap());
        assert!(board.record(&engine, operator(), operator(), cars[0], 70).unwrap());
        assert_eq!(board.best_score(cars[0]), Some(70));
        assert_eq!(board.len(), 1);
    }

    #[test]
    fn earlier_achiever_wins_ties() {
        let (engine, cars) = garage(3);
        let mut board = Leaderboard::default();
        let op = operator();
        board.record(&engine, op, op, cars[1], 80).unwrap();
        board.record(&engine, op, op, cars[0], 80).unwrap();
        board.record(&engine, op, op, cars[2], 95).unwrap();

        let order: Vec<CarId> = board.ranking().iter().map(|e| e.car_id).collect();
        assert_eq!(order, vec![cars[2], cars[1], cars[0]]);
        assert_eq!(board.rank_of(cars[0]), Some(3));
        assert_eq!(board.top(1)[0].score, 95);

        // Re-achieving the same score later does not change the tie order.
        board.record(&engine, op, op, cars[1], 80).unwrap();
        assert_eq!(board.rank_of(cars[1]), Some(2));
    }

    #[test]
    fn only_authorities_record_known_cars() {
        let (engine, cars) = garage(1);
        let mut board = Leaderboard::default();
        let reporter = AccountId::service("race-server");

        let err = board
            .record(&engine, reporter, operator(), cars[0], 1)
            .unwrap_err();
        assert_eq!(err, WorkshopError::Unauthorized(reporter));

        board.set_authority(Some(reporter));
        board.record(&engine, reporter, operator(), cars[0], 1).unwrap();

        let err = board
            .record(&engine, reporter, operator(), CarId(42), 1)
            .unwrap_err();
        assert_eq!(err, WorkshopError::Compose(ComposeError::CarNotFound(CarId(42))));
        assert_eq!(board.rank_of(CarId(42)), None);
    }
}
