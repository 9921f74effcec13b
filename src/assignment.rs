//! Elections: candidates, status transitions and ballots.

use log::info;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::auth::Actor;
use crate::database::common::{
    PERM_MANAGE_ASSIGNMENT, PERM_NOMINATE_OTHER, PERM_NOMINATE_SELF, PERM_SEE_ASSIGNMENT,
};
use crate::database::models::{
    Assignment, AssignmentStatus, Candidate, Poll, PollOption, Vote, VoteValue,
};
use crate::database::service::DatabaseService;
use crate::error::Error;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssignmentForm {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub posts: i64,
    #[serde(default)]
    pub polldescription: String,
}

impl Default for AssignmentForm {
    fn default() -> Self {
        Self {
            name: String::new(),
            description: String::new(),
            posts: 1,
            polldescription: String::new(),
        }
    }
}

impl AssignmentForm {
    fn clean(&self) -> Result<(), Error> {
        if self.name.trim().is_empty() {
            return Err(Error::Validation("name: this field is required".into()));
        }
        if self.posts < 1 {
            return Err(Error::Validation(
                "posts: number of available posts must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PollDetail {
    pub poll: Poll,
    pub options: Vec<OptionDetail>,
}

#[derive(Debug, Clone, Serialize)]
pub struct OptionDetail {
    pub option: PollOption,
    pub candidate: String,
    pub votes: BTreeMap<String, i64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct AssignmentDetail {
    pub assignment: Assignment,
    pub candidates: Vec<Candidate>,
    pub elected: Vec<Candidate>,
    pub polls: Vec<PollDetail>,
}

/// Votes entered for a single option.
/// Yes/No/Abstain polls use `yes`, `no`, `abstain`; the others use `votes`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OptionVotes {
    pub option_id: i64,
    pub yes: Option<i64>,
    pub no: Option<i64>,
    pub abstain: Option<i64>,
    pub votes: Option<i64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PollVoteForm {
    #[serde(default)]
    pub options: Vec<OptionVotes>,
    pub votesvalid: Option<i64>,
    pub votesinvalid: Option<i64>,
    pub votescast: Option<i64>,
    #[serde(default)]
    pub published: bool,
}

/// Upper bound for the number of printed ballot copies
pub const MAX_BALLOT_COPIES: i64 = 1000;

fn non_negative(field: &str, v: Option<i64>) -> Result<Option<i64>, Error> {
    match v {
        Some(n) if n < 0 => Err(Error::Validation(format!("{}: must not be negative", field))),
        other => Ok(other),
    }
}

pub struct AssignmentService<'a> {
    db: &'a DatabaseService,
}

impl<'a> AssignmentService<'a> {
    pub fn new(db: &'a DatabaseService) -> Self {
        Self { db }
    }

    async fn load(&self, id: i64) -> Result<Assignment, Error> {
        self.db
            .repository()
            .get_assignment(id)
            .await?
            .ok_or_else(|| Error::NotFound(format!("Assignment {}", id)))
    }

    async fn load_poll(&self, id: i64) -> Result<Poll, Error> {
        self.db
            .repository()
            .get_poll(id)
            .await?
            .ok_or_else(|| Error::NotFound(format!("Poll {}", id)))
    }

    pub async fn overview(&self, actor: &Actor) -> Result<Vec<Assignment>, Error> {
        actor.require_perm(PERM_SEE_ASSIGNMENT)?;
        self.db.repository().list_assignments().await
    }

    pub async fn view(&self, actor: &Actor, id: i64) -> Result<AssignmentDetail, Error> {
        actor.require_perm(PERM_SEE_ASSIGNMENT)?;
        let assignment = self.load(id).await?;
        let candidates = self.db.repository().list_candidates(id).await?;
        let elected = candidates.iter().filter(|c| c.elected).cloned().collect();
        let mut polls = Vec::new();
        for poll in self.db.repository().list_polls(id).await? {
            polls.push(self.poll_detail(poll, &candidates).await?);
        }
        Ok(AssignmentDetail {
            assignment,
            candidates,
            elected,
            polls,
        })
    }

    async fn poll_detail(&self, poll: Poll, candidates: &[Candidate]) -> Result<PollDetail, Error> {
        let repo = self.db.repository();
        let votes = repo.list_poll_votes(poll.id).await?;
        let mut options = Vec::new();
        for option in repo.list_poll_options(poll.id).await? {
            let candidate = match candidates.iter().find(|c| c.user_id == option.candidate_id) {
                Some(c) => display_name(c),
                None => match repo.get_user_by_id(option.candidate_id).await? {
                    Some(u) => u.full_name(),
                    None => format!("#{}", option.candidate_id),
                },
            };
            let votes = votes
                .iter()
                .filter(|v| v.option_id == option.id)
                .map(|v| (format!("{:?}", v.value), v.weight))
                .collect();
            options.push(OptionDetail {
                option,
                candidate,
                votes,
            });
        }
        Ok(PollDetail { poll, options })
    }

    /// Form for a new election, or filled from an existing one
    pub async fn form(&self, actor: &Actor, id: Option<i64>) -> Result<AssignmentForm, Error> {
        actor.require_perm(PERM_MANAGE_ASSIGNMENT)?;
        let id = match id {
            Some(id) => id,
            None => return Ok(AssignmentForm::default()),
        };
        let a = self.load(id).await?;
        Ok(AssignmentForm {
            name: a.name,
            description: a.description,
            posts: a.posts,
            polldescription: a.polldescription,
        })
    }

    pub async fn create(&self, actor: &Actor, form: &AssignmentForm) -> Result<Assignment, Error> {
        actor.require_perm(PERM_MANAGE_ASSIGNMENT)?;
        form.clean()?;
        let mut a = Assignment::new(form.name.trim(), form.posts);
        a.description = form.description.clone();
        a.polldescription = form.polldescription.clone();
        let a = self.db.repository().create_assignment(&a).await?;
        info!("Election '{}' created", a.name);
        Ok(a)
    }

    pub async fn edit(
        &self,
        actor: &Actor,
        id: i64,
        form: &AssignmentForm,
    ) -> Result<Assignment, Error> {
        actor.require_perm(PERM_MANAGE_ASSIGNMENT)?;
        form.clean()?;
        let mut a = self.load(id).await?;
        a.name = form.name.trim().to_string();
        a.description = form.description.clone();
        a.posts = form.posts;
        a.polldescription = form.polldescription.clone();
        self.db.repository().update_assignment(&a).await
    }

    pub async fn delete(&self, actor: &Actor, id: i64) -> Result<(), Error> {
        actor.require_perm(PERM_MANAGE_ASSIGNMENT)?;
        let a = self.load(id).await?;
        self.db.repository().delete_assignment(id).await?;
        info!("Election '{}' deleted", a.name);
        Ok(())
    }

    pub async fn set_status(
        &self,
        actor: &Actor,
        id: i64,
        status: &str,
    ) -> Result<Assignment, Error> {
        actor.require_perm(PERM_MANAGE_ASSIGNMENT)?;
        let status = status.parse::<AssignmentStatus>()?;
        let mut a = self.load(id).await?;
        a.status = status;
        self.db.repository().update_assignment(&a).await
    }

    async fn nominate(&self, a: &Assignment, user_id: i64) -> Result<(), Error> {
        let repo = self.db.repository();
        if repo.get_user_by_id(user_id).await?.is_none() {
            return Err(Error::NotFound(format!("User {}", user_id)));
        }
        if repo
            .list_candidates(a.id)
            .await?
            .iter()
            .any(|c| c.user_id == user_id)
        {
            return Err(Error::Validation(format!(
                "User {} is already a candidate of '{}'",
                user_id, a.name
            )));
        }
        repo.add_candidate(a.id, user_id).await
    }

    /// The current user runs for the election
    pub async fn run(&self, actor: &Actor, id: i64) -> Result<(), Error> {
        actor.require_perm(PERM_NOMINATE_SELF)?;
        let user = actor.require_user()?;
        let a = self.load(id).await?;
        if a.status != AssignmentStatus::Searching && !actor.has_perm(PERM_MANAGE_ASSIGNMENT) {
            return Err(Error::Validation(format!(
                "'{}' is no longer searching for candidates",
                a.name
            )));
        }
        self.nominate(&a, user.id).await
    }

    /// Nominate another user
    pub async fn nominate_other(&self, actor: &Actor, id: i64, user_id: i64) -> Result<(), Error> {
        actor.require_perm(PERM_NOMINATE_OTHER)?;
        let a = self.load(id).await?;
        if a.status != AssignmentStatus::Searching && !actor.has_perm(PERM_MANAGE_ASSIGNMENT) {
            return Err(Error::Validation(format!(
                "'{}' is no longer searching for candidates",
                a.name
            )));
        }
        self.nominate(&a, user_id).await
    }

    /// The current user withdraws the candidacy
    pub async fn delrun(&self, actor: &Actor, id: i64) -> Result<(), Error> {
        let user = actor.require_user()?;
        let a = self.load(id).await?;
        if a.status == AssignmentStatus::Finished && !actor.has_perm(PERM_MANAGE_ASSIGNMENT) {
            return Err(Error::Validation(format!("'{}' is already finished", a.name)));
        }
        if !self.db.repository().remove_candidate(a.id, user.id).await? {
            return Err(Error::NotFound(format!("Candidacy of {}", user.username)));
        }
        Ok(())
    }

    pub async fn delother(&self, actor: &Actor, id: i64, user_id: i64) -> Result<(), Error> {
        actor.require_perm(PERM_MANAGE_ASSIGNMENT)?;
        let a = self.load(id).await?;
        if !self.db.repository().remove_candidate(a.id, user_id).await? {
            return Err(Error::NotFound(format!("Candidate {}", user_id)));
        }
        Ok(())
    }

    pub async fn set_elected(
        &self,
        actor: &Actor,
        id: i64,
        user_id: i64,
        elected: bool,
    ) -> Result<(), Error> {
        actor.require_perm(PERM_MANAGE_ASSIGNMENT)?;
        let a = self.load(id).await?;
        if !self
            .db
            .repository()
            .set_candidate_elected(a.id, user_id, elected)
            .await?
        {
            return Err(Error::NotFound(format!("Candidate {}", user_id)));
        }
        Ok(())
    }

    /// Create a poll with one option per current candidate
    pub async fn gen_poll(&self, actor: &Actor, id: i64) -> Result<Poll, Error> {
        actor.require_perm(PERM_MANAGE_ASSIGNMENT)?;
        let a = self.load(id).await?;
        let candidates = self
            .db
            .repository()
            .list_candidates(a.id)
            .await?
            .into_iter()
            .filter(|c| !c.elected)
            .map(|c| c.user_id)
            .collect::<Vec<_>>();
        if candidates.is_empty() {
            return Err(Error::Validation(format!(
                "'{}' has no candidates to vote for",
                a.name
            )));
        }
        let yesnoabstain = (candidates.len() as i64) <= a.posts;
        let poll = self
            .db
            .repository()
            .create_poll(a.id, yesnoabstain, &candidates)
            .await?;
        info!(
            "Poll {} created for '{}' with {} options",
            poll.id,
            a.name,
            candidates.len()
        );
        Ok(poll)
    }

    pub async fn poll_view(&self, actor: &Actor, poll_id: i64) -> Result<PollDetail, Error> {
        actor.require_perm(PERM_MANAGE_ASSIGNMENT)?;
        let poll = self.load_poll(poll_id).await?;
        let candidates = self.db.repository().list_candidates(poll.assignment_id).await?;
        self.poll_detail(poll, &candidates).await
    }

    /// Store entered results. Options not mentioned keep their votes.
    pub async fn save_poll(
        &self,
        actor: &Actor,
        poll_id: i64,
        form: &PollVoteForm,
    ) -> Result<PollDetail, Error> {
        actor.require_perm(PERM_MANAGE_ASSIGNMENT)?;
        let mut poll = self.load_poll(poll_id).await?;
        let repo = self.db.repository();
        let options = repo.list_poll_options(poll.id).await?;

        let mut entered = Vec::new();
        for ov in &form.options {
            if !options.iter().any(|o| o.id == ov.option_id) {
                return Err(Error::Validation(format!(
                    "Option {} doesn't belong to poll {}",
                    ov.option_id, poll.id
                )));
            }
            let fields: Vec<(VoteValue, Option<i64>)> = if poll.yesnoabstain {
                vec![
                    (VoteValue::Yes, ov.yes),
                    (VoteValue::No, ov.no),
                    (VoteValue::Abstain, ov.abstain),
                ]
            } else {
                vec![(VoteValue::Votes, ov.votes)]
            };
            let mut votes = Vec::new();
            for (value, weight) in fields {
                if let Some(weight) = non_negative(&format!("{:?}", value), weight)? {
                    votes.push(Vote {
                        option_id: ov.option_id,
                        value,
                        weight,
                    });
                }
            }
            entered.push((ov.option_id, votes));
        }

        poll.votesvalid = non_negative("votesvalid", form.votesvalid)?;
        poll.votesinvalid = non_negative("votesinvalid", form.votesinvalid)?;
        poll.votescast = non_negative("votescast", form.votescast)?;
        poll.published = form.published;

        for (option_id, votes) in entered {
            repo.set_option_votes(option_id, &votes).await?;
        }
        let poll = repo.update_poll(&poll).await?;
        let candidates = repo.list_candidates(poll.assignment_id).await?;
        self.poll_detail(poll, &candidates).await
    }

    pub async fn delete_poll(&self, actor: &Actor, poll_id: i64) -> Result<i64, Error> {
        actor.require_perm(PERM_MANAGE_ASSIGNMENT)?;
        let poll = self.load_poll(poll_id).await?;
        self.db.repository().delete_poll(poll.id).await?;
        Ok(poll.assignment_id)
    }

    /// Plain-text ballot papers, `posts` copies of the ballot for one poll
    pub async fn print_poll(
        &self,
        actor: &Actor,
        poll_id: i64,
        ballotnumber: i64,
        posts: i64,
    ) -> Result<String, Error> {
        actor.require_perm(PERM_MANAGE_ASSIGNMENT)?;
        if !(1..=MAX_BALLOT_COPIES).contains(&posts) {
            return Err(Error::Validation(format!(
                "posts: must be between 1 and {}",
                MAX_BALLOT_COPIES
            )));
        }
        let poll = self.load_poll(poll_id).await?;
        let a = self.load(poll.assignment_id).await?;
        let detail = self.poll_detail(poll, &[]).await?;

        let mut ballot = String::new();
        ballot.push_str(&format!("Election: {}\n", a.name));
        ballot.push_str(&format!("{}. ballot\n", ballotnumber));
        if !a.polldescription.is_empty() {
            ballot.push_str(&format!("{}\n", a.polldescription));
        }
        for o in &detail.options {
            if detail.poll.yesnoabstain {
                ballot.push_str(&format!("{}  [ ] Yes  [ ] No  [ ] Abstention\n", o.candidate));
            } else {
                ballot.push_str(&format!("[ ] {}\n", o.candidate));
            }
        }

        let separator = "\n--------8<--------\n\n";
        Ok(std::iter::repeat(ballot.as_str())
            .take(posts as usize)
            .collect::<Vec<_>>()
            .join(separator))
    }
}

fn display_name(c: &Candidate) -> String {
    let name = format!("{} {}", c.first_name, c.last_name);
    let name = name.trim();
    if name.is_empty() {
        c.username.clone()
    } else {
        name.to_string()
    }
}
