pub(crate) mod analytics;
pub(crate) mod chat;
pub(crate) mod compare;
pub(crate) mod error;
pub(crate) mod health;
pub(crate) mod products;
pub(crate) mod search;

pub(crate) use error::ApiError;
