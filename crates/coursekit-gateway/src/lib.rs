//! HTTP gateway exposing the tutor service with CORS, per-IP rate limiting,
//! a health endpoint and a serverless adapter.

mod config;
mod error;
mod handlers;
mod reply;
mod router;
mod server;

pub use config::GatewayConfig;
pub use error::GatewayError;
pub use reply::{
    METHOD_NOT_ALLOWED_MESSAGE, ServerlessEnvelope, TutorReply, handle_serverless, parse_request,
};
pub use router::TUTOR_PATHS;
pub use server::GatewayServer;
