//! Client-side session handling: the token store holding credentials and the guard
//! enforcing the authenticated/anonymous transitions.
//! Keep the public surface thin and split implementation across sub-modules.

mod session;
mod token_store;
mod guard;

pub use session::{Role, Session};
pub use token_store::{
    JsonFileStorage, MemoryStorage, SessionStorage, TokenStore, ACCESS_TOKEN_KEY, REFRESH_TOKEN_KEY, ROLE_KEY,
};
pub use guard::{Navigator, Route, SessionGuard, SessionState};
