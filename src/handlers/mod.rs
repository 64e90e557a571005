pub mod health;
pub mod poll;

pub use health::health;
pub use poll::handle_poll;
