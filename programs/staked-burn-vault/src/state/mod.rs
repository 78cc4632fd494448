pub mod vault;
pub mod lockup;

pub use vault::*;
pub use lockup::*;
