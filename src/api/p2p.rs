use actix_web::{HttpResponse, Responder, get, post, web};
use log::{debug, warn};
use serde_json::Value;

use super::models::{AddPeerRequest, AddPeerResponse, AppState, NodeResponse, PeerEntry, RelayResponse};
use crate::error::GossipError;

#[get("/node/")]
pub async fn get_node(state: web::Data<AppState>) -> impl Responder {
    HttpResponse::Ok().json(NodeResponse {
        node_id: state.node.node_id(),
        public_key: state.node.public_key(),
        peers: state.node.peers().len(),
    })
}

#[get("/peers/")]
pub async fn get_peers(state: web::Data<AppState>) -> impl Responder {
    let peers: Vec<PeerEntry> = state
        .node
        .peers()
        .into_iter()
        .map(|(peer_id, info)| PeerEntry {
            peer_id,
            url: info.url,
            public_key: info.public_key,
        })
        .collect();
    HttpResponse::Ok().json(peers)
}

#[post("/peers/")]
pub async fn add_peer(
    state: web::Data<AppState>,
    body: web::Json<AddPeerRequest>,
) -> Result<HttpResponse, GossipError> {
    let peer_id = state.node.add_peer(&body.url, &body.public_key)?;
    Ok(HttpResponse::Created().json(AddPeerResponse { peer_id }))
}

/// Inbound transaction envelope from a peer.
#[post("/p2p/transaction")]
pub async fn receive_transaction(
    state: web::Data<AppState>,
    body: web::Json<Value>,
) -> Result<HttpResponse, GossipError> {
    let tx = state
        .node
        .receive_transaction(body.into_inner(), &state.ledger)
        .await
        .inspect_err(|e| log_refusal("transaction", e))?;
    Ok(HttpResponse::Ok().json(RelayResponse {
        status: true,
        accepted: tx.transaction_hash,
    }))
}

/// Inbound block envelope from a peer.
#[post("/p2p/block")]
pub async fn receive_block(
    state: web::Data<AppState>,
    body: web::Json<Value>,
) -> Result<HttpResponse, GossipError> {
    let block = state
        .node
        .receive_block(body.into_inner(), &state.ledger)
        .await
        .inspect_err(|e| log_refusal("block", e))?;
    Ok(HttpResponse::Ok().json(RelayResponse {
        status: true,
        accepted: block.hash,
    }))
}

fn log_refusal(kind: &str, err: &GossipError) {
    match err {
        GossipError::AlreadySeen(_) => debug!("P2P - {kind} dropped: {err}"),
        _ => warn!("P2P - {kind} refused: {err}"),
    }
}
