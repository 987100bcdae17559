use actix_web::http::StatusCode;
use actix_web::{HttpResponse, Responder, get, post, web};
use log::{debug, info};

use super::error_body;
use super::models::{AppState, MempoolResponse, NewTxRequest, TxLookupResponse, TxResponse};
use crate::transaction::Transaction;
use crate::wallet::{derive_address, public_key_hex, public_key_of, secret_key_from_hex};

/// Submit a signed transaction into the mempool.
#[post("/tx/")]
pub async fn post_transaction(
    state: web::Data<AppState>,
    body: web::Json<Transaction>,
) -> actix_web::Result<HttpResponse> {
    let tx = body.into_inner();
    debug!(
        "POST /tx/ - received {} ({} -> {}, amount={})",
        tx.transaction_hash, tx.sender, tx.recipient, tx.amount
    );
    admit(&state, tx).await
}

/// Build, sign and submit a transaction from a raw private key.
#[post("/tx/new/")]
pub async fn new_transaction(
    state: web::Data<AppState>,
    body: web::Json<NewTxRequest>,
) -> actix_web::Result<HttpResponse> {
    let req = body.into_inner();
    let sk = secret_key_from_hex(&req.private_key)?;
    let sender = derive_address(&public_key_hex(&public_key_of(&sk)));
    let tx = state
        .read_ledger()
        .create_transaction(&sender, &req.recipient, req.amount, req.fee, Some(&sk));
    admit(&state, tx).await
}

async fn admit(state: &web::Data<AppState>, tx: Transaction) -> actix_web::Result<HttpResponse> {
    let accepted = state.write_ledger().add_transaction(tx)?;
    let broadcast = state.node.broadcast_transaction(&accepted).await;
    info!(
        "tx {} admitted, gossiped to {} peer(s)",
        accepted.transaction_hash, broadcast.delivered
    );
    Ok(HttpResponse::Created().json(TxResponse {
        status: true,
        transaction: accepted,
        broadcast,
    }))
}

#[get("/tx/{hash}/")]
pub async fn get_transaction(state: web::Data<AppState>, path: web::Path<(String,)>) -> impl Responder {
    let hash = path.into_inner().0;
    let bc = state.read_ledger();
    match bc.find_transaction(&hash) {
        Some(tx) => HttpResponse::Ok().json(TxLookupResponse {
            confirmed: !bc.mempool().contains(&hash),
            transaction: tx,
        }),
        None => error_body(StatusCode::NOT_FOUND, format!("Transaction {hash} doesn't exist")),
    }
}

#[get("/mempool/")]
pub async fn get_mempool(state: web::Data<AppState>) -> impl Responder {
    let bc = state.read_ledger();
    HttpResponse::Ok().json(MempoolResponse {
        size: bc.mempool().len(),
        total_fees: bc.mempool().total_fees(),
        transactions: bc.pending_transactions(),
    })
}
