pub(crate) mod jwt;
mod models;

pub use models::TokenSet;
