//! Named routes. `url()` reverses a route into its path, `resolve()` matches a path.

use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    AssignmentOverview,
    AssignmentView { assignment_id: i64 },
    AssignmentNew,
    AssignmentEdit { assignment_id: i64 },
    AssignmentDelete { assignment_id: i64 },
    AssignmentSetStatus { assignment_id: i64, status: String },
    AssignmentRun { assignment_id: i64 },
    AssignmentDelrun { assignment_id: i64 },
    AssignmentDelother { assignment_id: i64, profile_id: i64 },
    AssignmentSetElected { assignment_id: i64, profile_id: i64 },
    AssignmentDelElected { assignment_id: i64, profile_id: i64 },
    PrintAssignmentPoll { poll_id: i64, ballotnumber: i64, posts: i64 },
    AssignmentGenPoll { assignment_id: i64, ballotnumber: i64 },
    AssignmentPollView { poll_id: i64, ballotnumber: i64 },
    AssignmentPollDelete { poll_id: i64 },
    ConfigGeneral,
    ConfigVersion,
    ConfigCollection { url: String },
}

/// Router patterns, `{name}` marks a path parameter.
pub const ASSIGNMENT_OVERVIEW: &str = "/assignment/";
pub const ASSIGNMENT_VIEW: &str = "/assignment/{assignment_id}";
pub const ASSIGNMENT_NEW: &str = "/assignment/new";
pub const ASSIGNMENT_EDIT: &str = "/assignment/{assignment_id}/edit";
pub const ASSIGNMENT_DELETE: &str = "/assignment/{assignment_id}/del";
pub const ASSIGNMENT_SET_STATUS: &str = "/assignment/{assignment_id}/setstatus/{status}";
pub const ASSIGNMENT_RUN: &str = "/assignment/{assignment_id}/run";
pub const ASSIGNMENT_DELRUN: &str = "/assignment/{assignment_id}/delrun";
pub const ASSIGNMENT_DELOTHER: &str = "/assignment/{assignment_id}/delother/{profile_id}";
pub const ASSIGNMENT_SET_ELECTED: &str = "/assignment/{assignment_id}/elected/{profile_id}";
pub const ASSIGNMENT_DEL_ELECTED: &str = "/assignment/{assignment_id}/notelected/{profile_id}";
pub const PRINT_ASSIGNMENT_POLL: &str = "/assignment/poll/{poll_id}/print/{ballotnumber}/{posts}";
pub const ASSIGNMENT_GEN_POLL: &str = "/assignment/{assignment_id}/gen_poll/{ballotnumber}";
pub const ASSIGNMENT_POLL_VIEW: &str = "/assignment/poll/{poll_id}/{ballotnumber}";
pub const ASSIGNMENT_POLL_DELETE: &str = "/assignment/poll/{poll_id}/del";
pub const CONFIG_GENERAL: &str = "/config/general";
pub const CONFIG_VERSION: &str = "/config/version";
pub const CONFIG_COLLECTION: &str = "/config/{url}";

fn is_digits(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit())
}

fn number(s: &str) -> Option<i64> {
    if is_digits(s) {
        s.parse().ok()
    } else {
        None
    }
}

/// Three lowercase ASCII letters
pub fn is_status_token(s: &str) -> bool {
    s.len() == 3 && s.bytes().all(|b| b.is_ascii_lowercase())
}

impl Route {
    pub fn name(&self) -> &'static str {
        match self {
            Route::AssignmentOverview => "assignment_overview",
            Route::AssignmentView { .. } => "assignment_view",
            Route::AssignmentNew => "assignment_new",
            Route::AssignmentEdit { .. } => "assignment_edit",
            Route::AssignmentDelete { .. } => "assignment_delete",
            Route::AssignmentSetStatus { .. } => "assignment_set_status",
            Route::AssignmentRun { .. } => "assignment_run",
            Route::AssignmentDelrun { .. } => "assignment_delrun",
            Route::AssignmentDelother { .. } => "assignment_delother",
            Route::AssignmentSetElected { .. } => "assignment_set_elected",
            Route::AssignmentDelElected { .. } => "assignment_del_elected",
            Route::PrintAssignmentPoll { .. } => "print_assignment_poll",
            Route::AssignmentGenPoll { .. } => "assignment_gen_poll",
            Route::AssignmentPollView { .. } => "assignment_poll_view",
            Route::AssignmentPollDelete { .. } => "assignment_poll_delete",
            Route::ConfigGeneral => "config_general",
            Route::ConfigVersion => "config_version",
            Route::ConfigCollection { .. } => "config_collection",
        }
    }

    pub fn url(&self) -> String {
        match self {
            Route::AssignmentOverview => "/assignment/".to_string(),
            Route::AssignmentView { assignment_id } => format!("/assignment/{}", assignment_id),
            Route::AssignmentNew => "/assignment/new".to_string(),
            Route::AssignmentEdit { assignment_id } => {
                format!("/assignment/{}/edit", assignment_id)
            }
            Route::AssignmentDelete { assignment_id } => {
                format!("/assignment/{}/del", assignment_id)
            }
            Route::AssignmentSetStatus {
                assignment_id,
                status,
            } => format!("/assignment/{}/setstatus/{}", assignment_id, status),
            Route::AssignmentRun { assignment_id } => format!("/assignment/{}/run", assignment_id),
            Route::AssignmentDelrun { assignment_id } => {
                format!("/assignment/{}/delrun", assignment_id)
            }
            Route::AssignmentDelother {
                assignment_id,
                profile_id,
            } => format!("/assignment/{}/delother/{}", assignment_id, profile_id),
            Route::AssignmentSetElected {
                assignment_id,
                profile_id,
            } => format!("/assignment/{}/elected/{}", assignment_id, profile_id),
            Route::AssignmentDelElected {
                assignment_id,
                profile_id,
            } => format!("/assignment/{}/notelected/{}", assignment_id, profile_id),
            Route::PrintAssignmentPoll {
                poll_id,
                ballotnumber,
                posts,
            } => format!(
                "/assignment/poll/{}/print/{}/{}",
                poll_id, ballotnumber, posts
            ),
            Route::AssignmentGenPoll {
                assignment_id,
                ballotnumber,
            } => format!("/assignment/{}/gen_poll/{}", assignment_id, ballotnumber),
            Route::AssignmentPollView {
                poll_id,
                ballotnumber,
            } => format!("/assignment/poll/{}/{}", poll_id, ballotnumber),
            Route::AssignmentPollDelete { poll_id } => format!("/assignment/poll/{}/del", poll_id),
            Route::ConfigGeneral => "/config/general".to_string(),
            Route::ConfigVersion => "/config/version".to_string(),
            Route::ConfigCollection { url } => format!("/config/{}", url),
        }
    }

    /// Match a request path. Numeric parameters must be digits only.
    pub fn resolve(path: &str) -> Option<Route> {
        let segments = path.strip_prefix('/')?.split('/').collect::<Vec<_>>();

        match segments.as_slice() {
            ["assignment", ""] => Some(Route::AssignmentOverview),
            ["assignment", "new"] => Some(Route::AssignmentNew),
            ["assignment", "poll", poll_id, "del"] => Some(Route::AssignmentPollDelete {
                poll_id: number(poll_id)?,
            }),
            ["assignment", "poll", poll_id, "print", ballotnumber, posts] => {
                Some(Route::PrintAssignmentPoll {
                    poll_id: number(poll_id)?,
                    ballotnumber: number(ballotnumber)?,
                    posts: number(posts)?,
                })
            }
            ["assignment", "poll", poll_id, ballotnumber] => Some(Route::AssignmentPollView {
                poll_id: number(poll_id)?,
                ballotnumber: number(ballotnumber)?,
            }),
            ["assignment", id] => Some(Route::AssignmentView {
                assignment_id: number(id)?,
            }),
            ["assignment", id, action] => {
                let assignment_id = number(id)?;
                match *action {
                    "edit" => Some(Route::AssignmentEdit { assignment_id }),
                    "del" => Some(Route::AssignmentDelete { assignment_id }),
                    "run" => Some(Route::AssignmentRun { assignment_id }),
                    "delrun" => Some(Route::AssignmentDelrun { assignment_id }),
                    _ => None,
                }
            }
            ["assignment", id, action, arg] => {
                let assignment_id = number(id)?;
                match *action {
                    "setstatus" if is_status_token(arg) => Some(Route::AssignmentSetStatus {
                        assignment_id,
                        status: arg.to_string(),
                    }),
                    "delother" => Some(Route::AssignmentDelother {
                        assignment_id,
                        profile_id: number(arg)?,
                    }),
                    "elected" => Some(Route::AssignmentSetElected {
                        assignment_id,
                        profile_id: number(arg)?,
                    }),
                    "notelected" => Some(Route::AssignmentDelElected {
                        assignment_id,
                        profile_id: number(arg)?,
                    }),
                    "gen_poll" => Some(Route::AssignmentGenPoll {
                        assignment_id,
                        ballotnumber: number(arg)?,
                    }),
                    _ => None,
                }
            }
            ["config", "general"] => Some(Route::ConfigGeneral),
            ["config", "version"] => Some(Route::ConfigVersion),
            ["config", url] if !url.is_empty() => Some(Route::ConfigCollection {
                url: url.to_string(),
            }),
            _ => None,
        }
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name(), self.url())
    }
}
