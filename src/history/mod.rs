mod file;
mod memory;

pub use file::FileSessionStore;
pub use memory::MemorySessionStore;

use crate::cli::Args;
use crate::models::chat::Session;
use log::info;
use std::error::Error;
use std::sync::Arc;

/// Durable home of the single game session.
///
/// Every operation is best-effort: failures are logged by the implementation
/// and never reach the caller, whose in-memory session stays authoritative.
pub trait SessionStore: Send + Sync {
    /// Returns the persisted session, or an empty one if nothing usable exists.
    fn load(&self) -> Session;

    fn save(&self, session: &Session);

    fn clear(&self);
}

pub fn create_session_store(
    args: &Args
) -> Result<Arc<dyn SessionStore>, Box<dyn Error + Send + Sync>> {
    match args.history_type.to_lowercase().as_str() {
        "file" => {
            info!("Session will be stored in file: {}", args.history_path);
            Ok(Arc::new(FileSessionStore::new(&args.history_path)))
        }
        "memory" => {
            info!("Session will be kept in memory only");
            Ok(Arc::new(MemorySessionStore::new()))
        }
        _ =>
            Err(
                Box::new(
                    std::io::Error::new(
                        std::io::ErrorKind::InvalidInput,
                        format!("Unsupported history store type: {}", args.history_type)
                    )
                )
            ),
    }
}
