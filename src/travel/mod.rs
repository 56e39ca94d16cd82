//! 旅行搭子客户端 SDK
//!
//! 每个业务资源一个子模块，按 `api`（HTTP 封装）、`models`（DTO）、
//! `listener`（回调接口）、`service`（本地状态机）拆分。

pub mod auth;
pub mod buddy;
pub mod chat;
pub mod client;
pub mod config;
pub mod destination;
pub mod error;
pub mod http;
pub mod location;
pub mod notification;
pub mod optimistic;
pub mod preference;
pub mod session;
pub mod trip;
pub mod types;

pub use auth::{AuthApi, AuthResponse, RegisterRequest};
pub use client::TravelClient;
pub use config::ClientConfig;
pub use error::{ApiError, ApiResult};
pub use session::{Session, SessionEvent, Tokens, User};
