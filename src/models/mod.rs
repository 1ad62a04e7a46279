pub mod course;
pub mod diary;
pub mod dosage;
pub mod enums;
pub mod reminder;

pub use course::*;
pub use diary::*;
pub use dosage::*;
pub use reminder::*;
