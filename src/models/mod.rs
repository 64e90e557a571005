pub mod request;

pub use request::PollRequest;
