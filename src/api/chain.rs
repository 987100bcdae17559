use actix_web::{HttpResponse, Responder, get, post, web};
use log::{debug, info};

use super::error_body;
use super::models::{
    AppState, ChainResponse, DifficultyResponse, MineRequest, MineResponse, ValidateResponse,
};

/// Get the full blockchain.
#[get("/chain/")]
pub async fn get_chain(state: web::Data<AppState>) -> impl Responder {
    let bc = state.read_ledger();
    HttpResponse::Ok().json(ChainResponse {
        length: bc.len(),
        difficulty: bc.difficulty(),
        chain: bc.chain(),
    })
}

/// Validate the whole chain.
#[get("/chain/validate/")]
pub async fn validate_chain(state: web::Data<AppState>) -> impl Responder {
    let bc = state.read_ledger();
    let outcome = bc.validate_chain();
    HttpResponse::Ok().json(ValidateResponse {
        valid: outcome.is_ok(),
        length: bc.len(),
        difficulty: bc.difficulty(),
        error: outcome.err().map(|e| e.to_string()),
    })
}

#[get("/chain/block/{index}/")]
pub async fn get_block(state: web::Data<AppState>, path: web::Path<(usize,)>) -> impl Responder {
    let index = path.into_inner().0;
    let bc = state.read_ledger();
    match bc.block(index) {
        Some(block) => HttpResponse::Ok().json(block),
        None => error_body(
            actix_web::http::StatusCode::NOT_FOUND,
            format!("Block {index} doesn't exist"),
        ),
    }
}

/// Mine the mempool into a block. With a `miner_address` the reward and all
/// pending fees go to it. Proof-of-work runs on the blocking pool; the block
/// is gossiped once the ledger is released.
#[post("/mine/")]
pub async fn mine_block(
    state: web::Data<AppState>,
    body: Option<web::Json<MineRequest>>,
) -> actix_web::Result<HttpResponse> {
    let miner = body
        .and_then(|b| b.into_inner().miner_address)
        .map(|a| a.trim().to_string())
        .filter(|a| !a.is_empty());
    debug!("POST /mine/ - miner={miner:?}");

    let worker = state.clone();
    let (block, difficulty) = web::block(move || {
        let mut bc = worker.write_ledger();
        bc.mine(miner.as_deref()).map(|b| (b, bc.difficulty()))
    })
    .await??;

    let broadcast = state.node.broadcast_block(&block).await;
    info!(
        "POST /mine/ - block #{} sealed, gossiped to {} peer(s)",
        block.index, broadcast.delivered
    );
    Ok(HttpResponse::Created().json(MineResponse {
        status: true,
        block,
        difficulty,
        broadcast,
    }))
}

/// Get current PoW difficulty.
#[get("/difficulty/")]
pub async fn get_difficulty(state: web::Data<AppState>) -> impl Responder {
    let bc = state.read_ledger();
    HttpResponse::Ok().json(DifficultyResponse {
        difficulty: bc.difficulty(),
        max_difficulty: bc.params().max_difficulty,
        target_block_time_secs: bc.params().target_block_time_secs,
    })
}
