use std::io;

use actix_web::{App, HttpServer, web};
use dotenvy::dotenv;
use log::info;

use discard_node::api::{self, AppState};
use discard_node::blockchain::{Blockchain, JsonFileStore, MemoryStore, StateStore};
use discard_node::config::NodeConfig;
use discard_node::p2p::{Identity, Node, PeerRegistry};

#[actix_web::main]
async fn main() -> io::Result<()> {
    let _ = dotenv();
    env_logger::init();

    let config = NodeConfig::from_env();

    let store: Box<dyn StateStore> = match &config.chain_file {
        Some(path) => Box::new(JsonFileStore::new(path)),
        None => Box::new(MemoryStore::new()),
    };
    let ledger = Blockchain::new(config.chain.clone(), store);

    let identity = Identity::load_or_create(config.node_key_file.as_deref()).map_err(io::Error::other)?;
    let peers = PeerRegistry::load(config.peers_file.clone());
    let node = Node::new(identity, peers, config.node_options());
    let (host, port) = (config.host.clone(), config.port);
    info!(
        "starting node {} (public_key={}) at http://{host}:{port}",
        node.node_id(),
        node.public_key()
    );

    let state = web::Data::new(AppState::new(ledger, node));

    HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .configure(api::init_routes)
    })
    .bind((host.as_str(), port))?
    .run()
    .await
}
