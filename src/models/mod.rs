//! Data models for the inventory

pub mod enums;
pub mod history;
pub mod item;
pub mod peripheral;
pub mod user;

// Re-export commonly used types
pub use enums::{EquipmentType, ItemStatus, Operation, PeripheralStatus, Poe};
pub use history::{History, HistoryQuery, NewHistory, Snapshot};
pub use item::{Item, ItemDetails, ItemField, ItemForm, NewItem};
pub use peripheral::{CreatePeripheral, Peripheral};
pub use user::{Operator, User, UserClaims};
