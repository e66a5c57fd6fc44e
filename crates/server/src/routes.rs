use crate::state::{AppState, MONITOR_WINDOW};
use axum::{
    body::{Body, Bytes},
    extract::State,
    http::{Response as HttpResponse, StatusCode},
    response::Response,
    routing::{get, post},
    Router,
};
use chrono::Utc;
use deskpilot_protocol::{
    ErrorEnvelope, ExecuteRequest, ExecuteResponse, ExecutionRecord, MonitorResponse,
    RegisterRequest, RegisterResponse, ERROR_DUPLICATE_ACTION, ERROR_INTERNAL,
    ERROR_INVALID_ACTION, ERROR_INVALID_REQUEST, ERROR_NO_MATCH,
};
use deskpilot_registry::{ActionDescriptor, RegistryError};
use deskpilot_retrieval::{infer_params, RetrievalError};
use serde::Serialize;

/// Routes of the DeskPilot HTTP API.
pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/execute", post(execute_handler))
        .route("/monitor", get(monitor_handler))
        .route("/register_function", post(register_handler))
        .with_state(state)
}

enum ExecuteOutcome {
    Resolved {
        function: String,
        params: Vec<String>,
    },
    NoMatch,
}

async fn execute_handler(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Response, StatusCode> {
    let request: ExecuteRequest = match serde_json::from_slice(&body) {
        Ok(request) => request,
        Err(err) => {
            return error_response(
                StatusCode::BAD_REQUEST,
                ERROR_INVALID_REQUEST,
                format!("Invalid JSON request: {err}"),
            );
        }
    };

    let prompt = request.prompt;
    let service = state.service.clone();
    let history = state.history.clone();
    let blocking_prompt = prompt.clone();

    // Resolution embeds the prompt; keep that off the async workers.
    let outcome = tokio::task::spawn_blocking(move || -> Result<ExecuteOutcome, &'static str> {
        let snapshot = history
            .lock()
            .map_err(|_| "conversation history lock poisoned")?
            .clone();

        let resolved = {
            let service = service
                .read()
                .map_err(|_| "retrieval service lock poisoned")?;
            service.resolve(&blocking_prompt, &snapshot).map(|function| {
                let params = service
                    .descriptor(&function)
                    .and_then(|descriptor| infer_params(descriptor, &blocking_prompt, &snapshot))
                    .unwrap_or_default();
                (function, params)
            })
        };

        let Some((function, params)) = resolved else {
            return Ok(ExecuteOutcome::NoMatch);
        };

        // Only resolved prompts become context for the next one.
        history
            .lock()
            .map_err(|_| "conversation history lock poisoned")?
            .push(blocking_prompt);
        Ok(ExecuteOutcome::Resolved { function, params })
    })
    .await
    .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;

    let (function, params) = match outcome {
        Ok(ExecuteOutcome::Resolved { function, params }) => (function, params),
        Ok(ExecuteOutcome::NoMatch) => {
            return error_response(
                StatusCode::UNPROCESSABLE_ENTITY,
                ERROR_NO_MATCH,
                "No registered action matches the prompt".to_string(),
            );
        }
        Err(reason) => {
            log::error!("Execute failed: {reason}");
            return Err(StatusCode::INTERNAL_SERVER_ERROR);
        }
    };

    let code = match deskpilot_codegen::render_script(&function, &params) {
        Ok(code) => code,
        Err(err) => {
            log::error!("Script rendering failed for '{function}': {err}");
            return error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                ERROR_INTERNAL,
                "Could not render the execution script".to_string(),
            );
        }
    };

    {
        let mut execution_log = state
            .log
            .lock()
            .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;
        execution_log.push(ExecutionRecord {
            timestamp: Utc::now(),
            prompt,
            function: function.clone(),
            params: params.clone(),
        });
    }

    log::info!("Resolved prompt to '{function}'");
    json_response(StatusCode::OK, &ExecuteResponse { function, code })
}

async fn monitor_handler(State(state): State<AppState>) -> Result<Response, StatusCode> {
    let executions = state
        .log
        .lock()
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?
        .recent(MONITOR_WINDOW);
    json_response(StatusCode::OK, &MonitorResponse { executions })
}

async fn register_handler(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Response, StatusCode> {
    let request: RegisterRequest = match serde_json::from_slice(&body) {
        Ok(request) => request,
        Err(err) => {
            return error_response(
                StatusCode::BAD_REQUEST,
                ERROR_INVALID_REQUEST,
                format!("Invalid JSON request: {err}"),
            );
        }
    };

    let name = request.name.clone();
    let mut descriptor = ActionDescriptor::new(request.name, request.description);
    if let Some(params) = request.params {
        descriptor = descriptor.with_params(params);
    }

    let service = state.service.clone();
    // The write lock covers the whole rebuild, so resolves never observe a
    // half-updated catalog.
    let registered = tokio::task::spawn_blocking(move || {
        service
            .write()
            .map_err(|_| "retrieval service lock poisoned")
            .map(|mut service| service.register(descriptor))
    })
    .await
    .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;

    match registered {
        Ok(Ok(())) => {
            log::info!("Registered action '{name}'");
            json_response(
                StatusCode::OK,
                &RegisterResponse {
                    message: format!("Function '{name}' registered successfully"),
                },
            )
        }
        Ok(Err(RetrievalError::Registry(err @ RegistryError::DuplicateName(_)))) => {
            error_response(
                StatusCode::BAD_REQUEST,
                ERROR_DUPLICATE_ACTION,
                err.to_string(),
            )
        }
        Ok(Err(RetrievalError::Registry(err @ RegistryError::EmptyName))) => {
            error_response(StatusCode::BAD_REQUEST, ERROR_INVALID_ACTION, err.to_string())
        }
        Ok(Err(RetrievalError::Index(err))) => {
            log::error!("Re-indexing failed while registering '{name}': {err}");
            error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                ERROR_INTERNAL,
                "Could not rebuild the action index".to_string(),
            )
        }
        Err(reason) => {
            log::error!("Register failed: {reason}");
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

fn json_response<T: Serialize>(status: StatusCode, value: &T) -> Result<Response, StatusCode> {
    let bytes = serde_json::to_vec(value).map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;
    Ok(HttpResponse::builder()
        .status(status)
        .header("content-type", "application/json")
        .body(Body::from(bytes))
        .expect("valid HTTP response"))
}

fn error_response(
    status: StatusCode,
    code: &str,
    message: String,
) -> Result<Response, StatusCode> {
    json_response(status, &ErrorEnvelope::new(code, message))
}
