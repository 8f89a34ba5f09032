use axum::{
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};
use serde::Serialize;

#[derive(Serialize)]
pub struct ApiResponse<T> {
    pub data: T,
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        let json = match serde_json::to_string(&self) {
            Ok(json) => json,
            Err(_) => return StatusCode::INTERNAL_SERVER_ERROR.into_response(),
        };

        let mut headers = HeaderMap::new();
        if let Ok(content_type) = "application/json".parse() {
            headers.insert(header::CONTENT_TYPE, content_type);
        }

        (StatusCode::OK, headers, json).into_response()
    }
}

/// JSON body plus an `X-Total-Count` header for paginated reads.
pub fn with_total_count<T: Serialize>(data: T, count: i64) -> Response {
    let json = match serde_json::to_string(&ApiResponse { data }) {
        Ok(json) => json,
        Err(_) => return StatusCode::INTERNAL_SERVER_ERROR.into_response(),
    };

    let mut headers = HeaderMap::new();
    if let Ok(content_type) = "application/json".parse() {
        headers.insert(header::CONTENT_TYPE, content_type);
    }
    if let Ok(count_value) = count.to_string().parse() {
        headers.insert("X-Total-Count", count_value);
    }

    (StatusCode::OK, headers, json).into_response()
}
