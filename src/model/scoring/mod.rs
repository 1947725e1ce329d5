pub use leaderboard::{standings, Standing};
pub use score_sheet::{Criterion, Points, ScoreSheet, MAX_POINTS};

mod leaderboard;
mod score_sheet;
