pub mod table;
pub mod wav;

pub use table::save_csv;
pub use wav::save_wav;
