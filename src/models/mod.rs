pub mod response;
pub mod payment;
pub mod merchant;
pub mod stats;

pub use response::*;
pub use payment::*;
pub use merchant::*;
pub use stats::*;
