pub mod quote;
pub mod verify;
