//! Entity records and the write payloads accepted by [`DataStore`](crate::DataStore).
//!
//! Field names serialize in camelCase so that GraphQL input objects bind
//! directly onto the `New*` and `*Patch` payloads.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

// ── Member tiers ────────────────────────────────────────────────────────────

/// Primary key of a [`MemberTier`]. Only two tiers exist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MemberTierId {
    Basic,
    Business,
}

impl MemberTierId {
    pub const ALL: [Self; 2] = [Self::Basic, Self::Business];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Basic => "basic",
            Self::Business => "business",
        }
    }
}

impl fmt::Display for MemberTierId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MemberTierId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "basic" => Ok(Self::Basic),
            "business" => Ok(Self::Business),
            other => Err(format!("unknown member tier: {other}")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberTier {
    pub id: MemberTierId,
    pub discount: f64,
    pub posts_limit_per_month: i32,
}

impl MemberTier {
    /// The fixed tier rows every store starts with.
    #[must_use]
    pub fn defaults() -> Vec<Self> {
        vec![
            Self {
                id: MemberTierId::Basic,
                discount: 2.3,
                posts_limit_per_month: 20,
            },
            Self {
                id: MemberTierId::Business,
                discount: 7.7,
                posts_limit_per_month: 100,
            },
        ]
    }
}

// ── Users ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub name: String,
    pub balance: f64,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewUser {
    pub name: String,
    pub balance: f64,
}

/// Partial update for a user. Only the name may change.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserPatch {
    #[serde(default)]
    pub name: Option<String>,
}

/// Which users a `find_users` call returns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserFilter {
    All,
    /// Authors the given subscriber follows.
    FollowedBy(String),
    /// Subscribers of the given author.
    FollowersOf(String),
}

// ── Posts ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    pub id: String,
    pub title: String,
    pub content: String,
    pub author_id: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewPost {
    pub title: String,
    pub content: String,
    pub author_id: String,
}

/// Partial update for a post. Only the title may change.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostPatch {
    #[serde(default)]
    pub title: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PostFilter {
    All,
    ByAuthor(String),
}

// ── Profiles ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    pub id: String,
    pub is_male: bool,
    pub year_of_birth: i32,
    pub user_id: String,
    pub member_tier_id: MemberTierId,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewProfile {
    pub user_id: String,
    pub is_male: bool,
    pub year_of_birth: i32,
    pub member_tier_id: MemberTierId,
}

/// Partial update for a profile. Only `isMale` may change.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfilePatch {
    #[serde(default)]
    pub is_male: Option<bool>,
}

/// Unique keys a profile can be looked up by.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProfileKey {
    Id(String),
    UserId(String),
}

// ── Subscriptions ───────────────────────────────────────────────────────────

/// `subscriber_id` follows `author_id`. The pair is the whole identity.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionEdge {
    pub subscriber_id: String,
    pub author_id: String,
}

impl SubscriptionEdge {
    #[must_use]
    pub fn new(subscriber_id: impl Into<String>, author_id: impl Into<String>) -> Self {
        Self {
            subscriber_id: subscriber_id.into(),
            author_id: author_id.into(),
        }
    }
}
