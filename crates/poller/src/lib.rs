pub mod api;
pub mod poller;
pub mod response;
