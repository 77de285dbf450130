pub mod book;
pub mod analysis;
pub mod status;

pub use book::*;
pub use analysis::*;
pub use status::*;
