use axum::{
    extract::{
        multipart::{MultipartError, MultipartRejection},
        rejection::{JsonRejection, QueryRejection},
        Multipart, Path, Query, State,
    },
    http::StatusCode,
    Json,
};
use contracts::domain::a001_agent::{Agent, AgentDto, AgentListQuery, ImportResponse};
use serde::Deserialize;
use serde_json::json;

use crate::domain::a001_agent::{excel_import, service};
use crate::routes::AppState;
use crate::shared::error::ApiError;

/// GET /api/agents?status=&sort=
pub async fn list(
    State(state): State<AppState>,
    query: Result<Query<AgentListQuery>, QueryRejection>,
) -> Result<Json<Vec<Agent>>, ApiError> {
    let Query(query) = query.map_err(|_| ApiError::bad_request("Invalid query parameters"))?;
    match service::list(state.agents.as_ref(), &query).await {
        Ok(v) => Ok(Json(v)),
        Err(e) => {
            tracing::error!("Failed to fetch agents: {:#}", e);
            Err(ApiError::internal("Failed to fetch agents"))
        }
    }
}

/// GET /api/agents/:id
pub async fn get_by_id(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Agent>, ApiError> {
    let uuid = uuid::Uuid::parse_str(id.trim())
        .map_err(|_| ApiError::bad_request("Invalid agent ID"))?;
    service::get_by_id(state.agents.as_ref(), uuid)
        .await
        .map(Json)
        .map_err(|e| ApiError::from_service(e, "Agent not found", "Failed to fetch agent"))
}

/// POST /api/agents
pub async fn create(
    State(state): State<AppState>,
    payload: Result<Json<AgentDto>, JsonRejection>,
) -> Result<(StatusCode, Json<Agent>), ApiError> {
    let Json(dto) = payload.map_err(|_| ApiError::bad_request("Invalid request body"))?;
    let agent = service::create(state.agents.as_ref(), &dto)
        .await
        .map_err(|e| ApiError::from_service(e, "Agent not found", "Failed to create agent"))?;
    Ok((StatusCode::CREATED, Json(agent)))
}

/// PUT /api/agents (id в теле)
pub async fn update(
    State(state): State<AppState>,
    payload: Result<Json<AgentDto>, JsonRejection>,
) -> Result<Json<Agent>, ApiError> {
    let Json(dto) = payload.map_err(|_| ApiError::bad_request("Invalid request body"))?;
    service::update(state.agents.as_ref(), &dto)
        .await
        .map(Json)
        .map_err(|e| ApiError::from_service(e, "Agent not found", "Failed to update agent"))
}

#[derive(Debug, Deserialize)]
pub struct DeleteParams {
    pub id: Option<String>,
}

/// DELETE /api/agents?id=
pub async fn delete(
    State(state): State<AppState>,
    Query(params): Query<DeleteParams>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let id = service::parse_id(params.id.as_deref())
        .map_err(|e| ApiError::from_service(e, "Agent not found", "Failed to delete agent"))?;
    service::delete(state.agents.as_ref(), id)
        .await
        .map_err(|e| ApiError::from_service(e, "Agent not found", "Failed to delete agent"))?;
    Ok(Json(json!({ "message": "Agent deleted successfully" })))
}

/// Ошибка чтения multipart; детали только в лог
fn upload_read_error(e: MultipartError) -> ApiError {
    tracing::warn!("Failed to read upload: {}", e);
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        ApiError::new(StatusCode::PAYLOAD_TOO_LARGE, "File is too large")
    } else {
        ApiError::internal("Failed to process file")
    }
}

/// POST /api/agents/upload (multipart: file, confirm)
pub async fn upload(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<ImportResponse>, ApiError> {
    let mut multipart = multipart.map_err(|e| {
        tracing::warn!("Upload rejected: {}", e);
        ApiError::bad_request("No file uploaded")
    })?;

    let mut file: Option<(Option<String>, Vec<u8>)> = None;
    let mut confirm = false;

    loop {
        let Some(field) = multipart.next_field().await.map_err(upload_read_error)? else {
            break;
        };

        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("file") => {
                let file_name = field.file_name().map(str::to_string);
                let bytes = field.bytes().await.map_err(upload_read_error)?;
                // Пустая часть равносильна отсутствию файла
                if !bytes.is_empty() {
                    file = Some((file_name, bytes.to_vec()));
                }
            }
            Some("confirm") => {
                let value = field.text().await.map_err(upload_read_error)?;
                confirm = value.trim() == "true";
            }
            _ => {}
        }
    }

    let Some((file_name, bytes)) = file else {
        return Err(ApiError::bad_request("No file uploaded"));
    };

    excel_import::process_upload(state.agents.as_ref(), file_name.as_deref(), &bytes, confirm)
        .await
        .map(Json)
        .map_err(|e| {
            tracing::error!("Failed to process file: {}", e);
            ApiError::internal("Failed to process file")
        })
}

#[cfg(test)]
mod tests {
    use crate::routes::{configure_routes, AppState};
    use crate::shared::config::{ImportConfig, ServerConfig};
    use crate::shared::data::db;
    use axum::body::Body;
    use axum::http::{header, Method, Request, StatusCode};
    use axum::Router;
    use serde_json::{json, Value};
    use tower::ServiceExt;

    const BOUNDARY: &str = "agentdesk-test-boundary";

    async fn app() -> (Router, AppState) {
        let conn = db::connect("sqlite::memory:").await.unwrap();
        let state = AppState::new(conn);
        let app = configure_routes(
            state.clone(),
            &ServerConfig::default(),
            &ImportConfig::default(),
        );
        (app, state)
    }

    async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, body)
    }

    fn json_request(method: Method, uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn multipart_request(parts: &[(&str, Option<&str>, &str)]) -> Request<Body> {
        let mut body = String::new();
        for (name, file_name, content) in parts {
            body.push_str(&format!("--{}\r\n", BOUNDARY));
            match file_name {
                Some(f) => body.push_str(&format!(
                    "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\nContent-Type: text/csv\r\n\r\n",
                    name, f
                )),
                None => body.push_str(&format!(
                    "Content-Disposition: form-data; name=\"{}\"\r\n\r\n",
                    name
                )),
            }
            body.push_str(content);
            body.push_str("\r\n");
        }
        body.push_str(&format!("--{}--\r\n", BOUNDARY));

        Request::builder()
            .method(Method::POST)
            .uri("/api/agents/upload")
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={}", BOUNDARY),
            )
            .body(Body::from(body))
            .unwrap()
    }

    const AGENTS_CSV: &str = "name,phoneNumber,location\n\
                              Ali,901234567,Tashkent\n\
                              ,907654321,Fergana\n\
                              Vali,905551234,Namangan";

    fn raw_multipart(body: &str) -> Request<Body> {
        Request::builder()
            .method(Method::POST)
            .uri("/api/agents/upload")
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={}", BOUNDARY),
            )
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn test_upload_without_file_is_rejected() {
        let (app, _) = app().await;
        let (status, body) = send(&app, multipart_request(&[("confirm", None, "true")])).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, json!({ "error": "No file uploaded" }));

        let (status, body) = send(
            &app,
            multipart_request(&[("file", Some("agents.csv"), ""), ("confirm", None, "true")]),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, json!({ "error": "No file uploaded" }));
    }

    #[tokio::test]
    async fn test_upload_not_multipart_is_rejected() {
        let (app, _) = app().await;
        let (status, body) = send(
            &app,
            json_request(Method::POST, "/api/agents/upload", json!({})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "No file uploaded");
    }

    #[tokio::test]
    async fn test_upload_preview_then_commit() {
        let (app, state) = app().await;

        let preview = multipart_request(&[("file", Some("agents.csv"), AGENTS_CSV)]);
        let (status, body) = send(&app, preview).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["requireConfirmation"], true);
        assert_eq!(body["totalRecords"], 3);
        assert_eq!(body["preview"].as_array().unwrap().len(), 3);
        assert_eq!(state.agents.count().await.unwrap(), 0);

        let commit = multipart_request(&[
            ("file", Some("agents.csv"), AGENTS_CSV),
            ("confirm", None, "true"),
        ]);
        let (status, body) = send(&app, commit).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            body,
            json!({
                "message": "Successfully imported 2 agents",
                "errors": [{ "row": 3, "error": "Name, phone number, and location are required" }]
            })
        );
        assert_eq!(state.agents.count().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_upload_unreadable_workbook() {
        let (app, _) = app().await;
        let request = multipart_request(&[
            ("file", Some("agents.xlsx"), "not a workbook"),
            ("confirm", None, "true"),
        ]);
        let (status, body) = send(&app, request).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body, json!({ "error": "Failed to process file" }));
    }

    #[tokio::test]
    async fn test_upload_truncated_file_part() {
        let (app, state) = app().await;
        let body = format!(
            "--{}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"agents.csv\"\r\n\r\n\
             name,phoneNumber,location\nAli,901234567,Tashkent",
            BOUNDARY
        );
        let (status, body) = send(&app, raw_multipart(&body)).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body, json!({ "error": "Failed to process file" }));
        assert_eq!(state.agents.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_upload_truncated_confirm_part() {
        let (app, state) = app().await;
        let body = format!(
            "--{b}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"agents.csv\"\r\n\r\n\
             {csv}\r\n\
             --{b}\r\nContent-Disposition: form-data; name=\"confirm\"\r\n\r\ntr",
            b = BOUNDARY,
            csv = AGENTS_CSV
        );
        let (status, body) = send(&app, raw_multipart(&body)).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body, json!({ "error": "Failed to process file" }));
        assert_eq!(state.agents.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_agent_crud_roundtrip() {
        let (app, _) = app().await;

        let (status, created) = send(
            &app,
            json_request(
                Method::POST,
                "/api/agents",
                json!({
                    "name": "Ali",
                    "phoneNumber": "901234567",
                    "location": "Tashkent",
                    "telegram": "@ali"
                }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(created["status"], "active");
        assert_eq!(created["category"], "General");
        let id = created["id"].as_str().unwrap().to_string();

        let (status, fetched) = send(
            &app,
            Request::builder()
                .uri(format!("/api/agents/{}", id))
                .body(Body::empty())
                .unwrap(),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(fetched["telegram"], "@ali");

        let (status, updated) = send(
            &app,
            json_request(
                Method::PUT,
                "/api/agents",
                json!({
                    "id": id,
                    "name": "Ali",
                    "phoneNumber": "901234567",
                    "location": "Samarkand",
                    "status": "inactive"
                }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(updated["location"], "Samarkand");
        assert_eq!(updated["status"], "inactive");

        let (status, listed) = send(
            &app,
            Request::builder()
                .uri("/api/agents?status=active&sort=order")
                .body(Body::empty())
                .unwrap(),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(listed, json!([]));

        let (status, body) = send(
            &app,
            Request::builder()
                .method(Method::DELETE)
                .uri(format!("/api/agents?id={}", id))
                .body(Body::empty())
                .unwrap(),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({ "message": "Agent deleted successfully" }));

        let (status, body) = send(
            &app,
            Request::builder()
                .method(Method::DELETE)
                .uri(format!("/api/agents?id={}", id))
                .body(Body::empty())
                .unwrap(),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body, json!({ "error": "Agent not found" }));
    }

    #[tokio::test]
    async fn test_agent_request_validation() {
        let (app, _) = app().await;

        let (status, body) = send(
            &app,
            json_request(Method::POST, "/api/agents", json!({ "name": "Ali", "phoneNumber": "1" })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Name, phone number, and location are required");

        let (status, body) = send(
            &app,
            json_request(Method::PUT, "/api/agents", json!({ "name": "Ali" })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Agent ID is required");

        let (status, body) = send(
            &app,
            Request::builder()
                .method(Method::DELETE)
                .uri("/api/agents")
                .body(Body::empty())
                .unwrap(),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Agent ID is required");

        let (status, body) = send(
            &app,
            Request::builder()
                .uri("/api/agents/not-a-uuid")
                .body(Body::empty())
                .unwrap(),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Invalid agent ID");

        let (status, body) = send(
            &app,
            Request::builder()
                .method(Method::POST)
                .uri("/api/agents")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from("{not json"))
                .unwrap(),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Invalid request body");
    }
}
