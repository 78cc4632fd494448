pub mod initialize_vault;
pub mod deposit;
pub mod exit;
pub mod set_burn_conversion;
pub mod views;

pub use initialize_vault::*;
pub use deposit::*;
pub use exit::*;
pub use set_burn_conversion::*;
pub use views::*;
