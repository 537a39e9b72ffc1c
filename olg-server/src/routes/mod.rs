use axum::http::HeaderMap;

use crate::HttpApiError;

pub(crate) mod player;
pub(crate) mod professor;
pub(crate) mod stream;

pub const PROFESSOR_HEADER: &str = "x-olg-professor";

fn require_professor(headers: &HeaderMap) -> Result<(), HttpApiError> {
    let is_professor = headers
        .get(PROFESSOR_HEADER)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.trim().eq_ignore_ascii_case("true"));
    if is_professor {
        Ok(())
    } else {
        Err(HttpApiError::forbidden())
    }
}
