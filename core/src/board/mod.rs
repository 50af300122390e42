pub mod matching;
pub mod pcb;
pub mod sexpr;

pub use matching::{match_lengths, LengthReport, MatchedPair, NetPattern, NetSuffix};
pub use pcb::{Board, Track, TrackKind};
pub use sexpr::Sexpr;
