use axum::extract::{Path, State};
use axum::http::header;
use axum::response::IntoResponse;
use axum::Json;
use serde::{Deserialize, Serialize};

use super::{ActionReply, AppState, Confirm};
use crate::assignment::{
    AssignmentDetail, AssignmentForm, AssignmentService, PollDetail, PollVoteForm,
};
use crate::auth::Actor;
use crate::database::models::Assignment;
use crate::error::Error;
use crate::urls::{self, Route};

#[derive(Debug, Deserialize)]
pub struct Nomination {
    pub user_id: i64,
}

#[derive(Debug, Serialize)]
pub struct PollPage {
    pub ballotnumber: i64,
    #[serde(flatten)]
    pub detail: PollDetail,
}

fn view_url(assignment_id: i64) -> String {
    Route::AssignmentView { assignment_id }.url()
}

pub async fn overview(
    State(state): State<AppState>,
    actor: Actor,
) -> Result<Json<Vec<Assignment>>, Error> {
    let list = AssignmentService::new(&state.db).overview(&actor).await?;
    Ok(Json(list))
}

pub async fn view(
    State(state): State<AppState>,
    actor: Actor,
    Path(assignment_id): Path<i64>,
) -> Result<Json<AssignmentDetail>, Error> {
    let detail = AssignmentService::new(&state.db)
        .view(&actor, assignment_id)
        .await?;
    Ok(Json(detail))
}

pub async fn nominate_other(
    State(state): State<AppState>,
    actor: Actor,
    Path(assignment_id): Path<i64>,
    Json(nomination): Json<Nomination>,
) -> Result<Json<ActionReply>, Error> {
    AssignmentService::new(&state.db)
        .nominate_other(&actor, assignment_id, nomination.user_id)
        .await?;
    Ok(Json(ActionReply::new(
        "Candidate was nominated successfully.",
        view_url(assignment_id),
    )))
}

pub async fn new_form(
    State(state): State<AppState>,
    actor: Actor,
) -> Result<Json<AssignmentForm>, Error> {
    let form = AssignmentService::new(&state.db).form(&actor, None).await?;
    Ok(Json(form))
}

pub async fn create(
    State(state): State<AppState>,
    actor: Actor,
    Json(form): Json<AssignmentForm>,
) -> Result<Json<ActionReply>, Error> {
    let a = AssignmentService::new(&state.db)
        .create(&actor, &form)
        .await?;
    Ok(Json(ActionReply::new(
        format!("New election '{}' was successfully created.", a.name),
        view_url(a.id),
    )))
}

pub async fn edit_form(
    State(state): State<AppState>,
    actor: Actor,
    Path(assignment_id): Path<i64>,
) -> Result<Json<AssignmentForm>, Error> {
    let form = AssignmentService::new(&state.db)
        .form(&actor, Some(assignment_id))
        .await?;
    Ok(Json(form))
}

pub async fn edit(
    State(state): State<AppState>,
    actor: Actor,
    Path(assignment_id): Path<i64>,
    Json(form): Json<AssignmentForm>,
) -> Result<Json<ActionReply>, Error> {
    let a = AssignmentService::new(&state.db)
        .edit(&actor, assignment_id, &form)
        .await?;
    Ok(Json(ActionReply::new(
        format!("Election '{}' was successfully modified.", a.name),
        view_url(a.id),
    )))
}

pub async fn delete_confirm(
    State(state): State<AppState>,
    actor: Actor,
    Path(assignment_id): Path<i64>,
) -> Result<Json<Confirm>, Error> {
    let form = AssignmentService::new(&state.db)
        .form(&actor, Some(assignment_id))
        .await?;
    Ok(Json(Confirm {
        question: format!("Do you really want to delete '{}'?", form.name),
        action: Route::AssignmentDelete { assignment_id }.url(),
    }))
}

pub async fn delete(
    State(state): State<AppState>,
    actor: Actor,
    Path(assignment_id): Path<i64>,
) -> Result<Json<ActionReply>, Error> {
    AssignmentService::new(&state.db)
        .delete(&actor, assignment_id)
        .await?;
    Ok(Json(ActionReply::new(
        "Election was successfully deleted.",
        Route::AssignmentOverview.url(),
    )))
}

pub async fn set_status(
    State(state): State<AppState>,
    actor: Actor,
    Path((assignment_id, status)): Path<(i64, String)>,
) -> Result<Json<ActionReply>, Error> {
    if !urls::is_status_token(&status) {
        return Err(Error::NotFound(format!("Status '{}'", status)));
    }
    let a = AssignmentService::new(&state.db)
        .set_status(&actor, assignment_id, &status)
        .await?;
    Ok(Json(ActionReply::new(
        format!("Election status was set to: {}.", a.status.label()),
        view_url(a.id),
    )))
}

pub async fn run(
    State(state): State<AppState>,
    actor: Actor,
    Path(assignment_id): Path<i64>,
) -> Result<Json<ActionReply>, Error> {
    AssignmentService::new(&state.db)
        .run(&actor, assignment_id)
        .await?;
    Ok(Json(ActionReply::new(
        "You have set your candidature successfully.",
        view_url(assignment_id),
    )))
}

pub async fn delrun(
    State(state): State<AppState>,
    actor: Actor,
    Path(assignment_id): Path<i64>,
) -> Result<Json<ActionReply>, Error> {
    AssignmentService::new(&state.db)
        .delrun(&actor, assignment_id)
        .await?;
    Ok(Json(ActionReply::new(
        "You have withdrawn your candidature successfully.",
        view_url(assignment_id),
    )))
}

pub async fn delother_confirm(
    State(state): State<AppState>,
    actor: Actor,
    Path((assignment_id, profile_id)): Path<(i64, i64)>,
) -> Result<Json<Confirm>, Error> {
    let service = AssignmentService::new(&state.db);
    let form = service.form(&actor, Some(assignment_id)).await?;
    let detail = service.view(&actor, assignment_id).await?;
    let candidate = detail
        .candidates
        .iter()
        .find(|c| c.user_id == profile_id)
        .ok_or_else(|| Error::NotFound(format!("Candidate {}", profile_id)))?;
    Ok(Json(Confirm {
        question: format!(
            "Do you really want to withdraw {} from the election '{}'?",
            candidate.username, form.name
        ),
        action: Route::AssignmentDelother {
            assignment_id,
            profile_id,
        }
        .url(),
    }))
}

pub async fn delother(
    State(state): State<AppState>,
    actor: Actor,
    Path((assignment_id, profile_id)): Path<(i64, i64)>,
) -> Result<Json<ActionReply>, Error> {
    AssignmentService::new(&state.db)
        .delother(&actor, assignment_id, profile_id)
        .await?;
    Ok(Json(ActionReply::new(
        "Candidate was withdrawn successfully.",
        view_url(assignment_id),
    )))
}

pub async fn set_elected(
    State(state): State<AppState>,
    actor: Actor,
    Path((assignment_id, profile_id)): Path<(i64, i64)>,
) -> Result<Json<ActionReply>, Error> {
    AssignmentService::new(&state.db)
        .set_elected(&actor, assignment_id, profile_id, true)
        .await?;
    Ok(Json(ActionReply::new(
        "Candidate was marked as elected.",
        view_url(assignment_id),
    )))
}

pub async fn del_elected(
    State(state): State<AppState>,
    actor: Actor,
    Path((assignment_id, profile_id)): Path<(i64, i64)>,
) -> Result<Json<ActionReply>, Error> {
    AssignmentService::new(&state.db)
        .set_elected(&actor, assignment_id, profile_id, false)
        .await?;
    Ok(Json(ActionReply::new(
        "Candidate is no longer marked as elected.",
        view_url(assignment_id),
    )))
}

pub async fn gen_poll(
    State(state): State<AppState>,
    actor: Actor,
    Path((assignment_id, ballotnumber)): Path<(i64, i64)>,
) -> Result<Json<ActionReply>, Error> {
    let poll = AssignmentService::new(&state.db)
        .gen_poll(&actor, assignment_id)
        .await?;
    Ok(Json(ActionReply::new(
        "New ballot was successfully created.",
        Route::AssignmentPollView {
            poll_id: poll.id,
            ballotnumber,
        }
        .url(),
    )))
}

pub async fn poll_view(
    State(state): State<AppState>,
    actor: Actor,
    Path((poll_id, ballotnumber)): Path<(i64, i64)>,
) -> Result<Json<PollPage>, Error> {
    let detail = AssignmentService::new(&state.db)
        .poll_view(&actor, poll_id)
        .await?;
    Ok(Json(PollPage {
        ballotnumber,
        detail,
    }))
}

pub async fn save_poll(
    State(state): State<AppState>,
    actor: Actor,
    Path((poll_id, ballotnumber)): Path<(i64, i64)>,
    Json(form): Json<PollVoteForm>,
) -> Result<Json<ActionReply>, Error> {
    let detail = AssignmentService::new(&state.db)
        .save_poll(&actor, poll_id, &form)
        .await?;
    Ok(Json(ActionReply::new(
        "Votes are successfully saved.",
        Route::AssignmentPollView {
            poll_id: detail.poll.id,
            ballotnumber,
        }
        .url(),
    )))
}

pub async fn delete_poll_confirm(
    State(state): State<AppState>,
    actor: Actor,
    Path(poll_id): Path<i64>,
) -> Result<Json<Confirm>, Error> {
    let detail = AssignmentService::new(&state.db)
        .poll_view(&actor, poll_id)
        .await?;
    Ok(Json(Confirm {
        question: format!("Do you really want to delete ballot {}?", detail.poll.id),
        action: Route::AssignmentPollDelete { poll_id }.url(),
    }))
}

pub async fn delete_poll(
    State(state): State<AppState>,
    actor: Actor,
    Path(poll_id): Path<i64>,
) -> Result<Json<ActionReply>, Error> {
    let assignment_id = AssignmentService::new(&state.db)
        .delete_poll(&actor, poll_id)
        .await?;
    Ok(Json(ActionReply::new(
        "Ballot was successfully deleted.",
        view_url(assignment_id),
    )))
}

pub async fn print_poll(
    State(state): State<AppState>,
    actor: Actor,
    Path((poll_id, ballotnumber, posts)): Path<(i64, i64, i64)>,
) -> Result<impl IntoResponse, Error> {
    let text = AssignmentService::new(&state.db)
        .print_poll(&actor, poll_id, ballotnumber, posts)
        .await?;
    Ok(([(header::CONTENT_TYPE, "text/plain; charset=utf-8")], text))
}

#[cfg(test)]
mod tests {
    use crate::database::common::{GROUP_DELEGATES, GROUP_STAFF};
    use crate::server::tests::{basic, create_test_app, create_user, json, send};
    use crate::settings::general::SYSTEM_ENABLE_ANONYMOUS;
    use axum::http::StatusCode;
    use serde_json::json as body;

    #[tokio::test]
    async fn test_election_lifecycle() {
        let (app, state, _dir) = create_test_app().await;
        create_user(&state, "staff", Some(GROUP_STAFF)).await;
        create_user(&state, "delegate", Some(GROUP_DELEGATES)).await;
        let staff = || Some(basic("staff", "secret"));
        let delegate = || Some(basic("delegate", "secret"));

        let (status, resp) = send(
            &app,
            "POST",
            "/assignment/new",
            staff(),
            Some(body!({ "name": "Board", "posts": 1 })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let location = json(&resp)["location"].as_str().unwrap().to_string();
        assert_eq!(location, "/assignment/1");

        let (status, _) = send(&app, "POST", "/assignment/1/run", delegate(), None).await;
        assert_eq!(status, StatusCode::OK);
        let (status, _) = send(&app, "POST", "/assignment/1/run", delegate(), None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, resp) = send(&app, "GET", "/assignment/1", delegate(), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json(&resp)["candidates"].as_array().unwrap().len(), 1);

        let (status, resp) = send(&app, "GET", "/assignment/1/gen_poll/1", staff(), None).await;
        assert_eq!(status, StatusCode::OK);
        let poll_url = json(&resp)["location"].as_str().unwrap().to_string();
        assert_eq!(poll_url, "/assignment/poll/1/1");

        let (status, resp) = send(&app, "GET", &poll_url, staff(), None).await;
        assert_eq!(status, StatusCode::OK);
        let page = json(&resp);
        assert_eq!(page["ballotnumber"], 1);
        assert_eq!(page["poll"]["yesnoabstain"], true);
        let option_id = page["options"][0]["option"]["id"].as_i64().unwrap();

        let (status, _) = send(
            &app,
            "POST",
            &poll_url,
            staff(),
            Some(body!({
                "options": [{ "option_id": option_id, "yes": 10, "no": 2, "abstain": 1 }],
                "votesvalid": 13,
                "published": true
            })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let (status, resp) = send(
            &app,
            "GET",
            "/assignment/poll/1/print/1/2",
            staff(),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let text = String::from_utf8(resp).unwrap();
        assert_eq!(text.matches("Election: Board").count(), 2);

        let (status, _) = send(&app, "POST", "/assignment/1/setstatus/fin", staff(), None).await;
        assert_eq!(status, StatusCode::OK);
        let (status, _) = send(&app, "POST", "/assignment/1/delrun", delegate(), None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, resp) = send(&app, "POST", "/assignment/poll/1/del", staff(), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json(&resp)["location"], "/assignment/1");

        let (status, _) = send(&app, "POST", "/assignment/1/del", staff(), None).await;
        assert_eq!(status, StatusCode::OK);
        let (status, _) = send(&app, "GET", "/assignment/1", staff(), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_set_status_rejects_unknown() {
        let (app, state, _dir) = create_test_app().await;
        create_user(&state, "staff", Some(GROUP_STAFF)).await;
        let staff = || Some(basic("staff", "secret"));
        send(
            &app,
            "POST",
            "/assignment/new",
            staff(),
            Some(body!({ "name": "Board", "posts": 2 })),
        )
        .await;

        let (status, _) = send(&app, "GET", "/assignment/1/setstatus/xyz", staff(), None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        let (status, _) = send(&app, "GET", "/assignment/1/setstatus/VOT", staff(), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        let (status, resp) = send(&app, "GET", "/assignment/1/setstatus/vot", staff(), None).await;
        assert_eq!(status, StatusCode::OK);
        assert!(json(&resp)["messages"][0]
            .as_str()
            .unwrap()
            .contains("Voting"));
    }

    #[tokio::test]
    async fn test_permissions() {
        let (app, state, _dir) = create_test_app().await;
        create_user(&state, "delegate", Some(GROUP_DELEGATES)).await;
        let delegate = || Some(basic("delegate", "secret"));

        let (status, _) = send(
            &app,
            "POST",
            "/assignment/new",
            delegate(),
            Some(body!({ "name": "Board", "posts": 1 })),
        )
        .await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        // registered users may see elections
        let (status, resp) = send(&app, "GET", "/assignment/", delegate(), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json(&resp), body!([]));

        state.store.set(SYSTEM_ENABLE_ANONYMOUS, true).await.unwrap();
        let (status, _) = send(&app, "GET", "/assignment/", None, None).await;
        assert_eq!(status, StatusCode::OK);
        let (status, _) = send(&app, "POST", "/assignment/1/run", None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_nominate_other_and_delother() {
        let (app, state, _dir) = create_test_app().await;
        create_user(&state, "staff", Some(GROUP_STAFF)).await;
        create_user(&state, "delegate", Some(GROUP_DELEGATES)).await;
        let staff = || Some(basic("staff", "secret"));
        let delegate = || Some(basic("delegate", "secret"));
        send(
            &app,
            "POST",
            "/assignment/new",
            staff(),
            Some(body!({ "name": "Board", "posts": 1 })),
        )
        .await;
        let staff_id = state
            .db
            .repository()
            .get_user_by_username("staff")
            .await
            .unwrap()
            .unwrap()
            .id;

        let (status, _) = send(
            &app,
            "POST",
            "/assignment/1",
            delegate(),
            Some(body!({ "user_id": staff_id })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let uri = format!("/assignment/1/delother/{}", staff_id);
        let (status, resp) = send(&app, "GET", &uri, staff(), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json(&resp)["action"], uri.as_str());
        let (status, _) = send(&app, "POST", &uri, staff(), None).await;
        assert_eq!(status, StatusCode::OK);
        let (status, _) = send(&app, "POST", &uri, staff(), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
