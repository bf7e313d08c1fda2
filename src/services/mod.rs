pub mod catalog;
pub mod inventory;
pub mod notifications;
pub mod procurement;
