pub mod travel;

// 重新导出常用类型，方便外部使用
pub use travel::{
    buddy::{BuddyManager, BuddyMatch, RequestStatus},
    chat::{ChatConnection, ChatRoom, ConnectionState},
    client::TravelClient,
    config::ClientConfig,
    error::{ApiError, ApiResult},
    session::{Session, SessionEvent},
    trip::{InvitationInbox, TripCatalog, TripMembershipManager},
};
