use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::{fmt::Display, str::FromStr};
use uuid::Uuid;

use super::{PublicProfile, UserId};

/// Lifecycle of a friend request. Terminal states are never left.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum FriendRequestStatus {
    Pending,
    Accepted,
    Rejected,
}

impl FriendRequestStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            FriendRequestStatus::Pending => "pending",
            FriendRequestStatus::Accepted => "accepted",
            FriendRequestStatus::Rejected => "rejected",
        }
    }
}

impl Display for FriendRequestStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for FriendRequestStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(FriendRequestStatus::Pending),
            "accepted" => Ok(FriendRequestStatus::Accepted),
            "rejected" => Ok(FriendRequestStatus::Rejected),
            other => Err(format!("unknown friend request status '{}'", other)),
        }
    }
}

/// A directional friend request
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FriendRequest {
    pub id: Uuid,
    pub from: UserId,
    pub to: UserId,
    pub status: FriendRequestStatus,
    pub created_at: DateTime<Utc>,
    pub resolved_at: Option<DateTime<Utc>>,
}

impl FriendRequest {
    /// Creates a new pending request
    pub fn pending(from: UserId, to: UserId) -> Self {
        Self {
            id: Uuid::new_v4(),
            from,
            to,
            status: FriendRequestStatus::Pending,
            created_at: Utc::now(),
            resolved_at: None,
        }
    }

    pub fn is_pending(&self) -> bool {
        self.status == FriendRequestStatus::Pending
    }
}

/// A request together with the profile of the other party
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FriendRequestWithUser {
    #[serde(flatten)]
    pub request: FriendRequest,
    pub user: PublicProfile,
}

/// Undirected friendship stored once, with the lower id first
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FriendEdge {
    pub low: UserId,
    pub high: UserId,
}

impl FriendEdge {
    /// Canonical edge for the pair, or `None` for a self edge
    pub fn new(a: UserId, b: UserId) -> Option<Self> {
        match a.cmp(&b) {
            std::cmp::Ordering::Less => Some(Self { low: a, high: b }),
            std::cmp::Ordering::Greater => Some(Self { low: b, high: a }),
            std::cmp::Ordering::Equal => None,
        }
    }

    pub fn contains(&self, user: UserId) -> bool {
        self.low == user || self.high == user
    }

    /// The other end of the edge as seen from `user`
    pub fn other(&self, user: UserId) -> Option<UserId> {
        if self.low == user {
            Some(self.high)
        } else if self.high == user {
            Some(self.low)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_edge_is_order_independent() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        assert_eq!(FriendEdge::new(a, b), FriendEdge::new(b, a));
    }

    #[test]
    fn test_self_edge_rejected() {
        let a = Uuid::new_v4();
        assert_eq!(FriendEdge::new(a, a), None);
    }

    #[test]
    fn test_edge_other_end() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let edge = FriendEdge::new(a, b).unwrap();
        assert_eq!(edge.other(a), Some(b));
        assert_eq!(edge.other(b), Some(a));
        assert_eq!(edge.other(Uuid::new_v4()), None);
    }

    #[test]
    fn test_status_parses_from_storage_text() {
        assert_eq!(
            "accepted".parse::<FriendRequestStatus>(),
            Ok(FriendRequestStatus::Accepted)
        );
        assert!("cancelled".parse::<FriendRequestStatus>().is_err());
    }

    #[test]
    fn test_status_serialization() {
        let json = serde_json::to_string(&FriendRequestStatus::Pending).unwrap();
        assert_eq!(json, "\"pending\"");
    }
}
