pub mod render_session;
pub mod run_lock;

pub use render_session::{ChromeSession, RenderSession};
pub use run_lock::RunLock;
