pub mod enums;
pub mod error;
pub mod settings;
pub mod structs;

// Re-export the core types to provide a clean public API.
pub use enums::{OrderStatus, PaymentStatus, Role};
pub use error::CoreError;
pub use settings::{SettingsError, StoreSettings};
pub use structs::{LineItem, Order, PaymentDetails, Product, Store};
