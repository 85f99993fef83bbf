mod catalog;
pub mod dto;
mod orders;
pub mod response;
mod router;
mod tokens;
mod users;
pub mod validation;

pub use router::{AppState, create_router};
