pub mod competitor;

pub use competitor::{
    CompetitorRecord, LeaderboardSnapshot, CORE_FIELDS, MAX_ROUND_SCORES, NOT_AVAILABLE,
};
