// Wizard State Machine
// Implements: language → level → topics → dashboard flow, item detail,
// request tickets, in-memory sessions, JSON views and the HTTP handlers.

pub mod handlers;
pub mod machine;
pub mod session;
pub mod view;

pub use session::SessionStore;
