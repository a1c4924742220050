// Magic-link authentication: token issuance, verification, and the
// cookie-carried session checked on every authenticated request.

pub mod handlers;
pub mod magic_link;
pub mod session;
pub mod store;
pub mod validation;
