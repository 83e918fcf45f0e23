pub mod attribute;
pub mod types;
pub mod resolver;
pub mod loader;
pub mod validator;

pub use attribute::*;
pub use types::*;
pub use resolver::*;
pub use loader::*;
pub use validator::*;
