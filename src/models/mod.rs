pub mod settings;
pub mod sync;

pub use settings::*;
pub use sync::*;
