use actix_cors::Cors;
use actix_web::{get, post, web, App, HttpResponse, HttpServer, Responder, Result as ActixResult};
use actix_ws::Message;
use agentcore::{ExecutionMode, Flow, SavedAgent, WorkflowError};
use agentnodes::{standard_registry, OpenAiClient};
use agentruntime::{AgentRuntime, RuntimeConfig};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

/// Application state shared across handlers
struct AppState {
    runtime: Arc<AgentRuntime>,
}

/// Run options shared by both execute endpoints
#[derive(Debug, Deserialize)]
struct ExecuteRequest {
    #[serde(default)]
    input: String,
    #[serde(default)]
    mode: Option<String>,
    #[serde(default)]
    stream: bool,
}

impl ExecuteRequest {
    fn mode(&self) -> Result<ExecutionMode, String> {
        match &self.mode {
            Some(mode) => mode.parse(),
            None => Ok(ExecutionMode::default()),
        }
    }
}

/// Request body for running a flow that was not saved
#[derive(Debug, Deserialize)]
struct InlineExecuteRequest {
    canvas_data: Flow,
    #[serde(flatten)]
    run: ExecuteRequest,
}

/// Request body for saving an agent
#[derive(Debug, Deserialize)]
struct CreateAgentRequest {
    name: String,
    #[serde(default)]
    description: String,
    canvas_data: Flow,
}

#[derive(Debug, Serialize)]
struct AgentResponse {
    id: Uuid,
    message: String,
}

#[derive(Debug, Serialize)]
struct AgentSummary {
    id: Uuid,
    name: String,
    description: String,
    created_at: DateTime<Utc>,
    nodes: usize,
    connections: usize,
}

/// Error response
#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

fn bad_request(error: String) -> HttpResponse {
    HttpResponse::BadRequest().json(ErrorResponse { error })
}

fn not_found(id: Uuid) -> HttpResponse {
    HttpResponse::NotFound().json(ErrorResponse {
        error: WorkflowError::NotFound(id.to_string()).to_string(),
    })
}

/// Health check endpoint
#[get("/health")]
async fn health_check() -> impl Responder {
    HttpResponse::Ok().json(serde_json::json!({
        "status": "healthy",
        "version": env!("CARGO_PKG_VERSION"),
        "service": "agentflow"
    }))
}

/// List saved agents
#[get("/api/agents")]
async fn list_agents(data: web::Data<AppState>) -> ActixResult<impl Responder> {
    let agents: Vec<AgentSummary> = data
        .runtime
        .list_agents()
        .await
        .into_iter()
        .map(|agent| AgentSummary {
            id: agent.id,
            name: agent.name,
            description: agent.description,
            created_at: agent.created_at,
            nodes: agent.canvas_data.nodes.len(),
            connections: agent.canvas_data.connections.len(),
        })
        .collect();

    Ok(HttpResponse::Ok().json(agents))
}

/// Save an agent
#[post("/api/agents")]
async fn create_agent(
    data: web::Data<AppState>,
    body: web::Json<CreateAgentRequest>,
) -> ActixResult<impl Responder> {
    let request = body.into_inner();
    let mut agent = SavedAgent::new(request.name, request.canvas_data);
    agent.description = request.description;

    info!("Saving agent: {} ({})", agent.name, agent.id);
    let id = data.runtime.save_agent(agent).await;

    Ok(HttpResponse::Created().json(AgentResponse {
        id,
        message: "Agent saved successfully".to_string(),
    }))
}

/// Get a specific agent
#[get("/api/agents/{id}")]
async fn get_agent(
    data: web::Data<AppState>,
    path: web::Path<Uuid>,
) -> ActixResult<impl Responder> {
    let id = path.into_inner();
    match data.runtime.get_agent(id).await {
        Some(agent) => Ok(HttpResponse::Ok().json(agent)),
        None => Ok(not_found(id)),
    }
}

/// Delete an agent
#[actix_web::delete("/api/agents/{id}")]
async fn delete_agent(
    data: web::Data<AppState>,
    path: web::Path<Uuid>,
) -> ActixResult<impl Responder> {
    let id = path.into_inner();
    match data.runtime.delete_agent(id).await {
        Some(_) => {
            info!("Deleted agent: {}", id);
            Ok(HttpResponse::Ok().json(serde_json::json!({
                "message": "Agent deleted successfully"
            })))
        }
        None => Ok(not_found(id)),
    }
}

/// Execute a saved agent
#[post("/api/agents/{id}/execute")]
async fn execute_agent(
    data: web::Data<AppState>,
    path: web::Path<Uuid>,
    body: web::Json<ExecuteRequest>,
) -> ActixResult<impl Responder> {
    let id = path.into_inner();
    let request = body.into_inner();
    let mode = match request.mode() {
        Ok(mode) => mode,
        Err(e) => return Ok(bad_request(e)),
    };

    info!("Executing agent: {}", id);

    match data
        .runtime
        .execute_agent(id, &request.input, mode, request.stream)
        .await
    {
        Ok(result) => Ok(HttpResponse::Ok().json(result)),
        Err(e) => {
            error!("Agent {} execution failed: {}", id, e);
            Ok(HttpResponse::NotFound().json(ErrorResponse {
                error: e.to_string(),
            }))
        }
    }
}

/// Execute a flow sent in the request body
#[post("/api/execute")]
async fn execute_inline(
    data: web::Data<AppState>,
    body: web::Json<InlineExecuteRequest>,
) -> ActixResult<impl Responder> {
    let InlineExecuteRequest { canvas_data, run } = body.into_inner();
    let mode = match run.mode() {
        Ok(mode) => mode,
        Err(e) => return Ok(bad_request(e)),
    };

    let result = data
        .runtime
        .execute(&canvas_data, &run.input, mode, run.stream)
        .await;
    Ok(HttpResponse::Ok().json(result))
}

/// Aggregated run statistics
#[get("/api/stats")]
async fn get_stats(data: web::Data<AppState>) -> ActixResult<impl Responder> {
    let stats = data.runtime.stats().await;
    Ok(HttpResponse::Ok().json(serde_json::json!({
        "total_runs": stats.total_runs,
        "successful_runs": stats.successful_runs,
        "failed_runs": stats.failed_runs,
        "success_rate": stats.success_rate(),
        "avg_response_time": stats.avg_response_time,
        "execution_history": stats.execution_history,
    })))
}

/// WebSocket endpoint for real-time events
#[get("/api/events")]
async fn websocket_events(
    req: actix_web::HttpRequest,
    stream: web::Payload,
    data: web::Data<AppState>,
) -> ActixResult<HttpResponse> {
    let (res, mut session, mut msg_stream) = actix_ws::handle(&req, stream)?;

    info!("WebSocket client connected");

    let mut events = data.runtime.subscribe_events();

    actix_web::rt::spawn(async move {
        loop {
            tokio::select! {
                event = events.recv() => {
                    match event {
                        Ok(event) => {
                            if let Ok(json) = serde_json::to_string(&event) {
                                if session.text(json).await.is_err() {
                                    break;
                                }
                            }
                        }
                        Err(tokio::sync::broadcast::error::RecvError::Lagged(skipped)) => {
                            warn!("WebSocket client lagging, skipped {} events", skipped);
                        }
                        Err(_) => break,
                    }
                }

                Some(Ok(msg)) = msg_stream.recv() => {
                    match msg {
                        Message::Ping(bytes) => {
                            if session.pong(&bytes).await.is_err() {
                                break;
                            }
                        }
                        Message::Close(_) => break,
                        _ => {}
                    }
                }

                else => break,
            }
        }

        info!("WebSocket client disconnected");
        let _ = session.close(None).await;
    });

    Ok(res)
}

/// List available node types
#[get("/api/nodes")]
async fn list_node_types(data: web::Data<AppState>) -> ActixResult<impl Responder> {
    let registry = data.runtime.registry();

    let nodes: Vec<_> = registry
        .list_node_types()
        .iter()
        .map(|node_type| {
            let metadata = registry.get_metadata(node_type);
            serde_json::json!({
                "type": node_type,
                "description": metadata.as_ref().map(|m| m.description.clone()).unwrap_or_default(),
                "category": metadata.as_ref().map(|m| m.category.clone()).unwrap_or_default(),
            })
        })
        .collect();

    Ok(HttpResponse::Ok().json(nodes))
}

fn routes(cfg: &mut web::ServiceConfig) {
    cfg.service(health_check)
        .service(list_agents)
        .service(create_agent)
        .service(get_agent)
        .service(delete_agent)
        .service(execute_agent)
        .service(execute_inline)
        .service(get_stats)
        .service(websocket_events)
        .service(list_node_types);
}

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    info!("Starting agent flow server");

    let runtime = AgentRuntime::with_registry(
        Arc::new(standard_registry()),
        OpenAiClient::from_env_or_echo()?,
        RuntimeConfig::default(),
    );

    info!("Runtime initialized with standard nodes");

    let app_state = web::Data::new(AppState {
        runtime: Arc::new(runtime),
    });

    let bind_address =
        std::env::var("BIND_ADDRESS").unwrap_or_else(|_| "0.0.0.0:3000".to_string());

    info!("Server starting on http://{}", bind_address);

    HttpServer::new(move || {
        let cors = Cors::default()
            .allow_any_origin()
            .allow_any_method()
            .allow_any_header()
            .max_age(3600);

        App::new()
            .app_data(app_state.clone())
            .wrap(cors)
            .wrap(actix_web::middleware::Logger::default())
            .configure(routes)
    })
    .bind(&bind_address)?
    .run()
    .await?;

    Ok(())
}
