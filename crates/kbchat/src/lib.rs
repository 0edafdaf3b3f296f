mod error;
pub mod utils;
pub use error::{Error, Result};

pub mod clients;
pub mod console;
pub mod history;
pub mod knowledge_base;
pub mod messages;
pub mod session;
