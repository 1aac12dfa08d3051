pub mod health;
pub mod host;
pub mod sse;
pub mod team;
