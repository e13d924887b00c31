#![expect(clippy::missing_docs_in_private_items)]

pub mod health;
pub mod me;
pub mod password;
pub mod refresh;
pub mod register;
pub mod token;
pub mod users;
pub mod whoami;
