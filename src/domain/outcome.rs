//! Winner resolution for completed games.
//!
//! The score feed is untrusted: scores arrive as strings, team names may
//! not match, entries may be missing entirely. The resolver never guesses —
//! anything short of two parseable scores for the two known sides yields an
//! [`Outcome::Unresolved`], and the orchestrator leaves the matchup alone
//! until a later tick delivers usable data. Ties are deliberately
//! unresolved as well: the game stays pending rather than picking a side.

use serde::{Deserialize, Serialize};

/// One score line from the feed, as delivered (untrusted).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoreEntry {
    /// Team name as the feed spells it.
    pub name: String,
    /// Score as a raw string; parsed only by the resolver.
    pub score: String,
}

/// A game the feed reports as finished.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletedGame {
    /// Feed-side game identifier; equals the matchup id in the ledger.
    pub id: String,
    /// Home side team name.
    pub home_team: String,
    /// Away side team name.
    pub away_team: String,
    /// Completion flag as reported by the feed.
    pub completed: bool,
    /// Score lines, one per side when the feed behaves.
    pub scores: Vec<ScoreEntry>,
}

/// Which side of the matchup a team occupies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Side {
    Home,
    Away,
}

/// Why a completed game could not be resolved to a winner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UnresolvedReason {
    /// The feed has not flagged the game as completed.
    NotCompleted,
    /// Both sides scored the same; no policy exists for pushes.
    Tie,
    /// No score entry matched the named team.
    MissingScore(String),
    /// A score entry existed but its value did not parse as an integer.
    MalformedScore { team: String, raw: String },
}

impl std::fmt::Display for UnresolvedReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotCompleted => write!(f, "game not completed"),
            Self::Tie => write!(f, "tied score"),
            Self::MissingScore(team) => write!(f, "no score entry for {team}"),
            Self::MalformedScore { team, raw } => {
                write!(f, "unparseable score {raw:?} for {team}")
            }
        }
    }
}

/// A decided game: who won, who lost, and on which side.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decided {
    pub winner: String,
    pub loser: String,
    pub winner_side: Side,
    pub loser_side: Side,
    pub winner_score: i64,
    pub loser_score: i64,
}

/// Resolution result for a completed game.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Decided(Decided),
    Unresolved(UnresolvedReason),
}

/// Stateless resolver comparing the two sides of a completed game.
#[derive(Debug, Clone, Copy, Default)]
pub struct WinnerResolver;

impl WinnerResolver {
    /// Resolve a completed game to a winner and loser.
    ///
    /// Team names are matched case-insensitively after trimming. An
    /// unresolvable game is reported as such, never settled.
    pub fn resolve(game: &CompletedGame) -> Outcome {
        if !game.completed {
            return Outcome::Unresolved(UnresolvedReason::NotCompleted);
        }

        let home = match Self::side_score(game, &game.home_team) {
            Ok(score) => score,
            Err(reason) => return Outcome::Unresolved(reason),
        };
        let away = match Self::side_score(game, &game.away_team) {
            Ok(score) => score,
            Err(reason) => return Outcome::Unresolved(reason),
        };

        if home == away {
            return Outcome::Unresolved(UnresolvedReason::Tie);
        }

        let (winner_side, loser_side) = if home > away {
            (Side::Home, Side::Away)
        } else {
            (Side::Away, Side::Home)
        };
        let (winner, loser, winner_score, loser_score) = match winner_side {
            Side::Home => (game.home_team.clone(), game.away_team.clone(), home, away),
            Side::Away => (game.away_team.clone(), game.home_team.clone(), away, home),
        };

        Outcome::Decided(Decided {
            winner,
            loser,
            winner_side,
            loser_side,
            winner_score,
            loser_score,
        })
    }

    /// Find and parse the score entry for one named side.
    fn side_score(game: &CompletedGame, team: &str) -> Result<i64, UnresolvedReason> {
        let entry = game
            .scores
            .iter()
            .find(|s| names_match(&s.name, team))
            .ok_or_else(|| UnresolvedReason::MissingScore(team.to_string()))?;

        entry.score.trim().parse::<i64>().map_err(|_| {
            UnresolvedReason::MalformedScore {
                team: team.to_string(),
                raw: entry.score.clone(),
            }
        })
    }
}

/// Case-insensitive, whitespace-trimmed team name comparison.
pub fn names_match(a: &str, b: &str) -> bool {
    a.trim().eq_ignore_ascii_case(b.trim())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn game(home: &str, away: &str, scores: &[(&str, &str)]) -> CompletedGame {
        CompletedGame {
            id: "g1".to_string(),
            home_team: home.to_string(),
            away_team: away.to_string(),
            completed: true,
            scores: scores
                .iter()
                .map(|(name, score)| ScoreEntry {
                    name: (*name).to_string(),
                    score: (*score).to_string(),
                })
                .collect(),
        }
    }

    #[test]
    fn home_win_resolves() {
        let g = game("TeamA", "TeamB", &[("TeamA", "100"), ("TeamB", "90")]);
        match WinnerResolver::resolve(&g) {
            Outcome::Decided(d) => {
                assert_eq!(d.winner, "TeamA");
                assert_eq!(d.loser, "TeamB");
                assert_eq!(d.winner_side, Side::Home);
                assert_eq!(d.winner_score, 100);
                assert_eq!(d.loser_score, 90);
            }
            other => panic!("expected decided, got {other:?}"),
        }
    }

    #[test]
    fn away_win_resolves() {
        let g = game("TeamA", "TeamB", &[("TeamA", "87"), ("TeamB", "91")]);
        match WinnerResolver::resolve(&g) {
            Outcome::Decided(d) => {
                assert_eq!(d.winner, "TeamB");
                assert_eq!(d.winner_side, Side::Away);
            }
            other => panic!("expected decided, got {other:?}"),
        }
    }

    #[test]
    fn tie_is_unresolved() {
        let g = game("TeamA", "TeamB", &[("TeamA", "77"), ("TeamB", "77")]);
        assert_eq!(
            WinnerResolver::resolve(&g),
            Outcome::Unresolved(UnresolvedReason::Tie)
        );
    }

    #[test]
    fn missing_side_is_unresolved() {
        let g = game("TeamA", "TeamB", &[("TeamA", "77")]);
        assert_eq!(
            WinnerResolver::resolve(&g),
            Outcome::Unresolved(UnresolvedReason::MissingScore("TeamB".to_string()))
        );
    }

    #[test]
    fn malformed_score_is_unresolved() {
        let g = game("TeamA", "TeamB", &[("TeamA", "95"), ("TeamB", "n/a")]);
        match WinnerResolver::resolve(&g) {
            Outcome::Unresolved(UnresolvedReason::MalformedScore { team, raw }) => {
                assert_eq!(team, "TeamB");
                assert_eq!(raw, "n/a");
            }
            other => panic!("expected malformed, got {other:?}"),
        }
    }

    #[test]
    fn not_completed_is_unresolved() {
        let mut g = game("TeamA", "TeamB", &[("TeamA", "95"), ("TeamB", "90")]);
        g.completed = false;
        assert_eq!(
            WinnerResolver::resolve(&g),
            Outcome::Unresolved(UnresolvedReason::NotCompleted)
        );
    }

    #[test]
    fn name_matching_ignores_case_and_whitespace() {
        let g = game("TeamA", "TeamB", &[(" teama ", "95"), ("TEAMB", "90")]);
        assert!(matches!(WinnerResolver::resolve(&g), Outcome::Decided(_)));
    }

    #[test]
    fn whitespace_padded_score_parses() {
        let g = game("TeamA", "TeamB", &[("TeamA", " 95 "), ("TeamB", "90")]);
        assert!(matches!(WinnerResolver::resolve(&g), Outcome::Decided(_)));
    }
}
