pub mod encode;
pub mod model;
pub mod pipeline;
pub mod postprocess;
pub mod preprocess;
pub mod readiness;
pub mod routes;
pub mod server;
pub mod telemetry;

pub mod app;
pub mod config;

pub use app::start_app;
