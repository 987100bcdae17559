use actix_web::http::StatusCode;
use actix_web::{HttpResponse, Responder, get, web};

use super::error_body;
use super::models::{AddressesResponse, AppState, BalanceResponse};

#[get("/balance/{address}/")]
pub async fn get_balance(state: web::Data<AppState>, path: web::Path<(String,)>) -> impl Responder {
    let address = path.into_inner().0;
    let bc = state.read_ledger();
    if !bc.is_known_address(&address) {
        return error_body(
            StatusCode::NOT_FOUND,
            format!("Wallet Address: {address} doesn't exist"),
        );
    }
    let balance = bc.wallet_balance(&address);
    HttpResponse::Ok().json(BalanceResponse { address, balance })
}

#[get("/addresses/")]
pub async fn get_addresses(state: web::Data<AppState>) -> impl Responder {
    let addresses = state.read_ledger().all_addresses();
    HttpResponse::Ok().json(AddressesResponse {
        count: addresses.len(),
        addresses,
    })
}

#[cfg(test)]
mod tests {
    use actix_web::{App, test};
    use serde_json::Value;

    use super::*;
    use crate::api::test_support;
    use crate::blockchain::GENESIS_ADDRESS;

    #[actix_web::test]
    async fn balance_of_known_and_unknown_addresses() {
        let state = test_support::state();
        state.write_ledger().mine(Some("W1")).unwrap();
        let app = test::init_service(
            App::new()
                .app_data(state)
                .service(web::scope("/api/v1").service(get_balance).service(get_addresses)),
        )
        .await;

        let req = test::TestRequest::get().uri("/api/v1/balance/W1/").to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["address"], "W1");
        assert_eq!(body["balance"], 50);
        assert_eq!(body["amount_received"], 50);

        let req = test::TestRequest::get()
            .uri(&format!("/api/v1/balance/{GENESIS_ADDRESS}/"))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["balance"], 99_999_999_999_999u64);

        let req = test::TestRequest::get().uri("/api/v1/balance/nobody/").to_request();
        assert_eq!(test::call_service(&app, req).await.status(), 404);

        let req = test::TestRequest::get().uri("/api/v1/addresses/").to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        let addresses: Vec<&str> = body["addresses"]
            .as_array()
            .unwrap()
            .iter()
            .filter_map(Value::as_str)
            .collect();
        assert!(addresses.contains(&"W1"));
        assert!(addresses.contains(&GENESIS_ADDRESS));
    }
}
