mod balance;
mod chain;
mod health;
pub mod models;
mod p2p;
mod stats;
mod tx;
mod wallet;

use actix_web::http::StatusCode;
use actix_web::web::{self, ServiceConfig};
use actix_web::{HttpResponse, ResponseError};

use crate::error::{GossipError, KeyError, LedgerError};
use models::ErrorResponse;

pub use models::AppState;

pub fn init_routes(cfg: &mut ServiceConfig) {
    cfg.service(
        web::scope("/api/v1")
            .service(health::health_check)
            .service(chain::get_chain)
            .service(chain::validate_chain)
            .service(chain::get_block)
            .service(chain::mine_block)
            .service(chain::get_difficulty)
            .service(tx::post_transaction)
            .service(tx::new_transaction)
            .service(tx::get_mempool)
            .service(tx::get_transaction)
            .service(balance::get_balance)
            .service(balance::get_addresses)
            .service(stats::get_stats)
            .service(wallet::create_wallet)
            .service(p2p::get_node)
            .service(p2p::get_peers)
            .service(p2p::add_peer),
    )
    .service(p2p::receive_transaction)
    .service(p2p::receive_block);
}

fn error_body(status: StatusCode, error: impl ToString) -> HttpResponse {
    HttpResponse::build(status).json(ErrorResponse {
        status: false,
        error: error.to_string(),
    })
}

impl ResponseError for LedgerError {
    fn status_code(&self) -> StatusCode {
        match self {
            LedgerError::PersistenceFailure(_) => StatusCode::INTERNAL_SERVER_ERROR,
            LedgerError::DuplicateTransaction => StatusCode::CONFLICT,
            _ => StatusCode::BAD_REQUEST,
        }
    }

    fn error_response(&self) -> HttpResponse {
        error_body(self.status_code(), self)
    }
}

impl ResponseError for GossipError {
    fn status_code(&self) -> StatusCode {
        match self {
            GossipError::Rejected(e) => e.status_code(),
            GossipError::AlreadySeen(_) => StatusCode::CONFLICT,
            GossipError::IdentityMismatch | GossipError::InvalidEnvelopeSignature => {
                StatusCode::UNAUTHORIZED
            }
            _ => StatusCode::BAD_REQUEST,
        }
    }

    fn error_response(&self) -> HttpResponse {
        error_body(self.status_code(), self)
    }
}

impl ResponseError for KeyError {
    fn status_code(&self) -> StatusCode {
        StatusCode::BAD_REQUEST
    }

    fn error_response(&self) -> HttpResponse {
        error_body(self.status_code(), self)
    }
}
