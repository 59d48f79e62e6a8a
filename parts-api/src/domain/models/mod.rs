mod conversation;
mod part;

pub use conversation::*;
pub use part::*;
