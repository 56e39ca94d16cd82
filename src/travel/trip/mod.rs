//! 行程模块
//!
//! 行程列表、创建、成员管理与邀请收件箱

pub mod api;
pub mod listener;
pub mod models;
pub mod service;
pub mod validate;

pub use api::{TripApi, TripBackend};
pub use listener::{EmptyTripListener, TripListener};
pub use models::{
    DashboardStats, Invitation, MemberRole, MembershipStatus, NewTrip, Trip, TripMember,
    TripStatus,
};
pub use service::{CancelConfirmation, InvitationInbox, TripCatalog, TripMembershipManager};
pub use validate::{TripDraft, TripValidationError};
