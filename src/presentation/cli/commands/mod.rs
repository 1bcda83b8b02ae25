pub mod browse;
pub mod checkout;
pub mod mirrors;
pub mod resolve;

pub use browse::*;
pub use checkout::*;
pub use mirrors::*;
pub use resolve::*;
