pub mod analysis;
pub mod auth;
pub mod export;
pub mod settings;
pub mod stats;
pub mod trades;

pub use analysis::*;
pub use auth::*;
pub use export::*;
pub use settings::*;
pub use stats::*;
pub use trades::*;
