pub(crate) mod assignment;
pub(crate) mod group;
pub(crate) mod user;

pub use assignment::{
    Assignment, AssignmentStatus, Candidate, Poll, PollOption, Vote, VoteValue,
};
pub use group::{Group, Permission, PermissionSpec};
pub use user::User;
