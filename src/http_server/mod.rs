pub mod app;
pub mod error;
pub mod flash;
pub mod form;
pub mod http_routes;
pub mod page;
pub mod state;
