pub mod agent;
pub mod models;
pub mod server;
pub mod config;
pub mod llm;
pub mod cli;
pub mod history;

use agent::SessionController;
use cli::Args;
use config::scenario::ScenarioLoader;
use history::create_session_store;
use llm::LlmConfig;
use llm::chat::new_client as new_chat_client;
use log::info;
use server::Server;
use std::error::Error;
use std::sync::Arc;

pub async fn run(args: Args) -> Result<(), Box<dyn Error + Send + Sync>> {
    info!("--- Core Configuration ---");
    info!("Server Address: {}", args.server_addr);
    info!("Chat Model: {}", args.chat_model.as_deref().unwrap_or("adapter default"));
    info!("Chat Base URL: {}", args.chat_base_url.as_deref().unwrap_or("adapter default"));
    info!("History Store Type: {}", args.history_type);
    info!("History Path: {}", args.history_path);
    info!("Greeting: {}", args.greeting_path);
    info!("Main Rules: {}", args.main_rules_path);
    info!("Event Rules: {}", args.event_rules_path);
    info!("Reset Session: {}", args.reset);
    info!("-------------------------");

    let store = create_session_store(&args)?;
    if args.reset {
        store.clear();
    }

    let chat_config = LlmConfig {
        api_key: Some(args.chat_api_key.clone()).filter(|k| !k.is_empty()),
        completion_model: args.chat_model.clone(),
        base_url: args.chat_base_url.clone(),
        ..LlmConfig::default()
    };
    let chat_client = new_chat_client(&chat_config)?;
    info!("Chat client configured: Model={}", chat_client.get_model());

    let controller = Arc::new(SessionController::new(chat_client, store));
    controller.initialize(&ScenarioLoader::from_args(&args)).await;

    let server = Server::bind(&args.server_addr, controller).await?;
    server.run().await?;

    Ok(())
}
