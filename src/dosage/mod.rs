pub mod codec;
pub mod selector;

pub use codec::{decode, encode, PartialDosage};
pub use selector::{DoseSheet, DoseStepper};
