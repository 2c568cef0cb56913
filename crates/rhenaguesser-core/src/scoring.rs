//! Cumulative scoreboard computation.
//!
//! A player's score is the sum of the distances between their guesses and
//! the true positions, so lower is better. Totals are keyed by display
//! name: players sharing a name share one row. Guesses from ids that are
//! not in the roster and rounds without a known true position contribute
//! nothing. Names without a single contributing guess do not appear.

use rhenaguesser_types::{Coordinate, Guess, Player, ScoreEntry};

use crate::geo::distance;

/// Rank display names by cumulative distance error.
///
/// `guesses` and `true_positions` are indexed by round. Ties keep the join
/// order of each name's first holder. Ranks are 1-based and contiguous.
pub fn scoreboard(
    players: &[Player],
    guesses: &[Vec<Guess>],
    true_positions: &[Coordinate],
) -> Vec<ScoreEntry> {
    let mut names: Vec<&str> = Vec::new();
    for player in players {
        if !names.contains(&player.username.as_str()) {
            names.push(&player.username);
        }
    }
    let mut totals: Vec<Option<f64>> = vec![None; names.len()];

    for (round, round_guesses) in guesses.iter().enumerate() {
        let Some(truth) = true_positions.get(round) else {
            continue;
        };
        for guess in round_guesses {
            let Some(slot) = players
                .iter()
                .find(|p| p.id == guess.player_id)
                .and_then(|p| names.iter().position(|name| *name == p.username))
                .and_then(|index| totals.get_mut(index))
            else {
                continue;
            };
            let error = distance(guess.position, *truth);
            *slot = Some(slot.unwrap_or(0.0) + error);
        }
    }

    let mut ranked: Vec<(&str, f64)> = names
        .into_iter()
        .zip(totals)
        .filter_map(|(name, total)| total.map(|score| (name, score)))
        .collect();
    // Stable sort: equal totals stay in join order.
    ranked.sort_by(|a, b| a.1.total_cmp(&b.1));

    ranked
        .into_iter()
        .zip(1..)
        .map(|((name, score), rank)| ScoreEntry {
            rank,
            player: name.to_owned(),
            score,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use rhenaguesser_types::PlayerId;

    use super::*;
    use crate::geo::EARTH_RADIUS_METERS;

    fn player(id: &str, name: &str) -> Player {
        Player {
            id: PlayerId::from(id),
            username: name.to_owned(),
        }
    }

    /// A point on the equator `meters` east of the origin.
    fn east_of_origin(meters: f64) -> Coordinate {
        Coordinate::new(0.0, (meters / EARTH_RADIUS_METERS).to_degrees())
    }

    fn guess(id: &str, position: Coordinate) -> Guess {
        Guess {
            player_id: PlayerId::from(id),
            position,
        }
    }

    #[test]
    fn lower_total_ranks_first() {
        let players = vec![player("a", "A"), player("b", "B")];
        let origin = Coordinate::new(0.0, 0.0);
        let guesses = vec![vec![
            guess("a", east_of_origin(100.0)),
            guess("b", east_of_origin(50.0)),
        ]];

        let board = scoreboard(&players, &guesses, &[origin]);

        assert_eq!(board.len(), 2);
        let names: Vec<&str> = board.iter().map(|e| e.player.as_str()).collect();
        assert_eq!(names, ["B", "A"]);
        let ranks: Vec<usize> = board.iter().map(|e| e.rank).collect();
        assert_eq!(ranks, [1, 2]);
        assert!(board.first().is_some_and(|e| (e.score - 50.0).abs() < 1e-6));
        assert!(board.last().is_some_and(|e| (e.score - 100.0).abs() < 1e-6));
    }

    #[test]
    fn totals_accumulate_across_rounds() {
        let players = vec![player("a", "A")];
        let origin = Coordinate::new(0.0, 0.0);
        let guesses = vec![
            vec![guess("a", east_of_origin(30.0))],
            vec![guess("a", east_of_origin(70.0))],
        ];

        let board = scoreboard(&players, &guesses, &[origin, origin]);
        assert!(board.first().is_some_and(|e| (e.score - 100.0).abs() < 1e-6));
    }

    #[test]
    fn players_without_guesses_are_omitted() {
        let players = vec![player("a", "A"), player("b", "B"), player("c", "C")];
        let guesses = vec![vec![guess("b", Coordinate::new(1.0, 1.0))]];

        let board = scoreboard(&players, &guesses, &[Coordinate::new(1.0, 1.0)]);
        assert_eq!(board.len(), 1);
        assert_eq!(board.first().map(|e| e.player.as_str()), Some("B"));
    }

    #[test]
    fn ties_keep_join_order() {
        let players = vec![player("z", "Zoe"), player("a", "Adam")];
        let spot = Coordinate::new(48.0, 7.0);
        let guesses = vec![vec![guess("a", spot), guess("z", spot)]];

        let board = scoreboard(&players, &guesses, &[spot]);
        let names: Vec<&str> = board.iter().map(|e| e.player.as_str()).collect();
        assert_eq!(names, ["Zoe", "Adam"]);
        let ranks: Vec<usize> = board.iter().map(|e| e.rank).collect();
        assert_eq!(ranks, [1, 2]);
    }

    #[test]
    fn unknown_players_and_rounds_without_truth_are_skipped() {
        let players = vec![player("a", "A")];
        let guesses = vec![
            vec![guess("ghost", Coordinate::new(10.0, 10.0))],
            vec![guess("a", Coordinate::new(10.0, 10.0))],
        ];

        // Only round 0 has a known true position.
        let board = scoreboard(&players, &guesses, &[Coordinate::new(0.0, 0.0)]);
        assert!(board.is_empty());
    }

    #[test]
    fn players_sharing_a_name_share_one_row() {
        let players = vec![player("s1", "Sam"), player("k", "Kim"), player("s2", "Sam")];
        let origin = Coordinate::new(0.0, 0.0);
        let guesses = vec![
            vec![
                guess("s1", east_of_origin(100.0)),
                guess("k", east_of_origin(250.0)),
                guess("s2", east_of_origin(200.0)),
            ],
            vec![guess("s2", east_of_origin(10.0))],
        ];

        let board = scoreboard(&players, &guesses, &[origin, origin]);

        let names: Vec<&str> = board.iter().map(|e| e.player.as_str()).collect();
        assert_eq!(names, ["Kim", "Sam"]);
        assert!(board.first().is_some_and(|e| (e.score - 250.0).abs() < 1e-6));
        assert!(board.last().is_some_and(|e| e.rank == 2 && (e.score - 310.0).abs() < 1e-6));
    }
}
