pub mod poly;
pub mod stats;

pub use poly::PolyHelper;
pub use stats::StatsHelper;
