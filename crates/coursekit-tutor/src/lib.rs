//! Tutor response service: routes a question to math, writing or general help,
//! asks the LLM when one is configured, and falls back to canned answers built
//! from the knowledge base.

pub mod canned;
pub mod config;
pub mod error;
pub mod prompt;
pub mod request;
pub mod service;
pub mod topics;

pub use config::TutorConfig;
pub use error::{Result, TutorError};
pub use request::{ErrorKind, Subject, TutorRequest, TutorResponse};
pub use service::{TutorService, load_knowledge};
