use crate::error::Error;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
pub enum AssignmentStatus {
    /// Searching for candidates
    #[serde(rename = "sea")]
    #[sqlx(rename = "sea")]
    Searching,
    #[serde(rename = "vot")]
    #[sqlx(rename = "vot")]
    Voting,
    #[serde(rename = "fin")]
    #[sqlx(rename = "fin")]
    Finished,
}

impl FromStr for AssignmentStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "sea" => Ok(AssignmentStatus::Searching),
            "vot" => Ok(AssignmentStatus::Voting),
            "fin" => Ok(AssignmentStatus::Finished),
            _ => Err(Error::Validation(format!("Unknown assignment status: {}", s))),
        }
    }
}

impl AssignmentStatus {
    pub fn label(&self) -> &'static str {
        match self {
            AssignmentStatus::Searching => "Searching for candidates",
            AssignmentStatus::Voting => "Voting",
            AssignmentStatus::Finished => "Finished",
        }
    }
}

impl fmt::Display for AssignmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AssignmentStatus::Searching => write!(f, "sea"),
            AssignmentStatus::Voting => write!(f, "vot"),
            AssignmentStatus::Finished => write!(f, "fin"),
        }
    }
}

/// An election for one or more posts
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Assignment {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub posts: i64,
    pub polldescription: String,
    pub status: AssignmentStatus,
    pub updated_at: i64,
}

impl Assignment {
    pub fn new(name: impl Into<String>, posts: i64) -> Self {
        Self {
            id: 0,
            name: name.into(),
            description: String::new(),
            posts,
            polldescription: String::new(),
            status: AssignmentStatus::Searching,
            updated_at: Utc::now().timestamp_millis(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Candidate {
    pub user_id: i64,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub elected: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Poll {
    pub id: i64,
    pub assignment_id: i64,
    /// Yes/No/Abstain per option, otherwise one vote count per option
    pub yesnoabstain: bool,
    pub votesvalid: Option<i64>,
    pub votesinvalid: Option<i64>,
    pub votescast: Option<i64>,
    pub published: bool,
    pub created_at: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct PollOption {
    pub id: i64,
    pub poll_id: i64,
    pub candidate_id: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
pub enum VoteValue {
    Yes,
    No,
    Abstain,
    Votes,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Vote {
    pub option_id: i64,
    pub value: VoteValue,
    pub weight: i64,
}
