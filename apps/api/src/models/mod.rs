pub mod buyer;
pub mod history;
pub mod user;
pub mod verification;
