pub mod use_parts_command;

pub use use_parts_command::{UsePartsCommand, UsePartsResult};
