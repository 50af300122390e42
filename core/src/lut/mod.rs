pub mod fade;

pub use fade::{FadeLut, LutFormat, LutNames};
