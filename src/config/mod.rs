pub mod prompt;
pub mod scenario;
