use actix_web::{HttpResponse, Responder, post};

use crate::wallet::Wallet;

/// Hand out a fresh key pair. Nothing is stored server side.
#[post("/wallet/new/")]
pub async fn create_wallet() -> impl Responder {
    HttpResponse::Ok().json(Wallet::generate())
}
