//! 从请求记录推导关系状态（旧接口路径）
//!
//! 后端的 matches 接口直接带 `request_status`；旧路径只拿到请求列表，需要本地推导。

use crate::travel::buddy::models::{BuddyRequest, RequestRecordStatus, RequestStatus};
use crate::travel::types::{RequestId, UserId};

/// 推导 `self_id` 视角下与 `other_id` 的关系状态及有效请求 ID
///
/// 被拒绝的请求不构成阻塞，视为 `None`。同一对用户存在多条记录时，
/// 有效记录（pending/accepted）优先于已拒绝记录。
pub fn derive_status(
    requests: &[BuddyRequest],
    self_id: UserId,
    other_id: UserId,
) -> (RequestStatus, Option<RequestId>) {
    let mut pair = requests.iter().filter(|r| r.involves(self_id, other_id));
    let found = pair
        .clone()
        .find(|r| r.status != RequestRecordStatus::Rejected)
        .or_else(|| pair.next());

    match found {
        None => (RequestStatus::None, None),
        Some(r) => match r.status {
            RequestRecordStatus::Accepted => (RequestStatus::Accepted, Some(r.id)),
            RequestRecordStatus::Rejected => (RequestStatus::None, None),
            RequestRecordStatus::Pending if r.sender_id == self_id => {
                (RequestStatus::PendingOutgoing, Some(r.id))
            }
            RequestRecordStatus::Pending => (RequestStatus::PendingIncoming, Some(r.id)),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn req(id: RequestId, sender: UserId, receiver: UserId, status: RequestRecordStatus) -> BuddyRequest {
        BuddyRequest {
            id,
            sender_id: sender,
            sender_name: String::new(),
            receiver_id: receiver,
            receiver_name: String::new(),
            status,
            created_at: String::new(),
        }
    }

    #[test]
    fn no_request_is_none() {
        let requests = vec![req(1, 3, 4, RequestRecordStatus::Pending)];
        assert_eq!(derive_status(&requests, 1, 2), (RequestStatus::None, None));
        assert_eq!(derive_status(&[], 1, 2), (RequestStatus::None, None));
    }

    #[test]
    fn pending_direction_depends_on_sender() {
        let requests = vec![req(77, 1, 2, RequestRecordStatus::Pending)];
        assert_eq!(
            derive_status(&requests, 1, 2),
            (RequestStatus::PendingOutgoing, Some(77))
        );
        assert_eq!(
            derive_status(&requests, 2, 1),
            (RequestStatus::PendingIncoming, Some(77))
        );
    }

    #[test]
    fn accepted_is_symmetric() {
        let requests = vec![req(5, 2, 1, RequestRecordStatus::Accepted)];
        assert_eq!(derive_status(&requests, 1, 2), (RequestStatus::Accepted, Some(5)));
        assert_eq!(derive_status(&requests, 2, 1), (RequestStatus::Accepted, Some(5)));
    }

    #[test]
    fn rejected_collapses_to_none() {
        let requests = vec![req(9, 1, 2, RequestRecordStatus::Rejected)];
        assert_eq!(derive_status(&requests, 1, 2), (RequestStatus::None, None));
        assert_eq!(derive_status(&requests, 2, 1), (RequestStatus::None, None));
    }

    #[test]
    fn active_request_wins_over_old_rejection() {
        let requests = vec![
            req(9, 1, 2, RequestRecordStatus::Rejected),
            req(10, 2, 1, RequestRecordStatus::Pending),
        ];
        assert_eq!(
            derive_status(&requests, 1, 2),
            (RequestStatus::PendingIncoming, Some(10))
        );
    }
}
