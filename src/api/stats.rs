use actix_web::{HttpResponse, Responder, get, web};

use super::models::{AppState, StatsResponse};

/// Chain aggregates. Amount statistics leave out the genesis coinbase.
#[get("/stats/")]
pub async fn get_stats(state: web::Data<AppState>) -> impl Responder {
    let bc = state.read_ledger();
    HttpResponse::Ok().json(StatsResponse {
        total_blocks: bc.last_index(),
        difficulty: bc.difficulty(),
        mempool_size: bc.mempool().len(),
        largest_transaction: bc.largest_transaction_amount(),
        average_transaction: bc.average_transaction_amount(),
        median_transaction: bc.median_transaction_amount(),
        total_tokens: bc.total_tokens(),
    })
}
