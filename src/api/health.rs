use actix_web::{HttpResponse, Responder, get, web};
use serde_json::json;

use super::models::AppState;

#[get("/health/")]
pub async fn health_check(state: web::Data<AppState>) -> impl Responder {
    let height = state.read_ledger().len();
    HttpResponse::Ok().json(json!({
        "status": true,
        "node_id": state.node.node_id(),
        "height": height,
    }))
}
