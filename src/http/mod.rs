pub mod handlers;
pub mod jobs;
pub mod page;
pub mod server;

pub use server::{AppState, router, serve};
