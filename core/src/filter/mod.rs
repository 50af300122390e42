pub mod cmsis;
pub mod sos;
pub mod transfer;

pub use cmsis::{BiquadNames, CmsisBiquads};
pub use sos::{tf_to_sos, zpk_to_sos, SosMatrix};
pub use transfer::{TransferFunction, Zpk};
