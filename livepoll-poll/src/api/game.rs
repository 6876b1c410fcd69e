//! Multiplexed game endpoint
//!
//! `/api/game?action=<action>` maps each call onto exactly one session
//! store operation:
//!
//! | action   | body                  | response                         |
//! |----------|-----------------------|----------------------------------|
//! | status   | -                     | full `SessionSnapshot`           |
//! | vote     | `{color, voterId}`    | `{ok: true}` (even when ignored) |
//! | question | `{question}`          | `{ok: true}`                     |
//! | close    | -                     | `{ok: true, votes, total}`       |
//! | reset    | -                     | `{ok: true}`                     |
//! | end      | -                     | `{ok: true}`                     |

use axum::{
    body::Bytes,
    extract::{Query, State},
    http::{header::CONTENT_TYPE, HeaderMap},
    response::{IntoResponse, Response},
    Json,
};
use livepoll_common::{Tally, VoteOutcome};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::str::FromStr;
use tracing::{debug, info};

use crate::error::ApiError;
use crate::AppState;

/// Query parameters for the game endpoint
#[derive(Debug, Deserialize)]
pub struct ActionQuery {
    pub action: Option<String>,
}

/// Fields read from the request body
///
/// Fields of the wrong JSON type read as absent, which the session store
/// then ignores.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct GameBody {
    pub color: Option<String>,
    pub voter_id: Option<String>,
    pub question: Option<String>,
}

impl GameBody {
    /// Read the body of a request
    ///
    /// Only `application/json` bodies are parsed; any other content type and
    /// an empty body read as `{}`. Broken JSON is the one error.
    pub fn from_request(headers: &HeaderMap, bytes: &[u8]) -> Result<Self, ApiError> {
        if !is_json(headers) || bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(Self::default());
        }
        let value: Value = serde_json::from_slice(bytes).map_err(ApiError::MalformedPayload)?;
        Ok(Self::from_value(&value))
    }

    fn from_value(value: &Value) -> Self {
        Self {
            color: value.get("color").and_then(Value::as_str).map(str::to_string),
            voter_id: value.get("voterId").and_then(scalar_text),
            question: value.get("question").and_then(scalar_text),
        }
    }
}

fn is_json(headers: &HeaderMap) -> bool {
    headers
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(';').next())
        .map(|mime| {
            let mime = mime.trim().to_ascii_lowercase();
            mime == "application/json" || mime.ends_with("+json")
        })
        .unwrap_or(false)
}

/// Strings as-is, numbers in their JSON spelling
fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(text) => Some(text.clone()),
        Value::Number(number) => Some(number.to_string()),
        _ => None,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameAction {
    Status,
    Vote,
    Question,
    Close,
    Reset,
    End,
}

impl FromStr for GameAction {
    type Err = ApiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "status" => Ok(GameAction::Status),
            "vote" => Ok(GameAction::Vote),
            "question" => Ok(GameAction::Question),
            "close" => Ok(GameAction::Close),
            "reset" => Ok(GameAction::Reset),
            "end" => Ok(GameAction::End),
            _ => Err(ApiError::UnknownAction),
        }
    }
}

/// `{ok: true}`
#[derive(Debug, Serialize)]
pub struct Ack {
    pub ok: bool,
}

impl Ack {
    fn ok() -> Json<Self> {
        Json(Self { ok: true })
    }
}

/// Response to `close`: acknowledgement plus the final tally
#[derive(Debug, Serialize)]
pub struct CloseResponse {
    pub ok: bool,
    pub votes: Tally,
    pub total: u32,
}

/// ANY /api/game?action=...
pub async fn game_handler(
    State(state): State<AppState>,
    Query(query): Query<ActionQuery>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, ApiError> {
    let raw_action = query.action.unwrap_or_default();
    let action = match raw_action.parse::<GameAction>() {
        Ok(action) => action,
        Err(e) => {
            debug!("Rejecting unknown action {:?}", raw_action);
            return Err(e);
        }
    };

    let response = match action {
        GameAction::Status => Json(state.session.status().await).into_response(),

        GameAction::Vote => {
            let body = GameBody::from_request(&headers, &body)?;
            let color = body.color.unwrap_or_default();
            let voter_id = body.voter_id.unwrap_or_default();

            match state.session.cast_vote(&color, &voter_id).await {
                VoteOutcome::Accepted(tally) => {
                    info!("Vote {} accepted, tally {}-{}", color, tally.red, tally.green);
                }
                outcome => debug!("Vote ignored: {:?}", outcome),
            }
            Ack::ok().into_response()
        }

        GameAction::Question => {
            let body = GameBody::from_request(&headers, &body)?;
            state
                .session
                .pose_question(body.question.unwrap_or_default())
                .await;
            Ack::ok().into_response()
        }

        GameAction::Close => {
            let votes = state.session.close_voting().await;
            Json(CloseResponse {
                ok: true,
                votes,
                total: votes.total(),
            })
            .into_response()
        }

        GameAction::Reset => {
            state.session.reset_voting().await;
            Ack::ok().into_response()
        }

        GameAction::End => {
            state.session.end_session().await;
            Ack::ok().into_response()
        }
    };

    Ok(response)
}
