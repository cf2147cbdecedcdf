pub mod leaderboard_flow;

pub use leaderboard_flow::{LeaderboardFlow, RunOutcome, RunReport};
