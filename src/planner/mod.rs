// Planner - catalog validation and per-table query splitting

mod bind;
mod split;

pub use bind::bind;
pub use split::split_query;
