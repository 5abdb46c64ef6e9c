pub mod error;
pub mod forms;
pub mod middleware;
pub mod routes;
pub mod session;
pub mod snippets;
pub mod state;
pub mod templates;
pub mod users;
pub mod validator;

pub use error::AppError;
pub use routes::router;
pub use session::{SessionConfig, SessionManager};
pub use state::{AppState, AppStateInner};
