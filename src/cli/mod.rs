use clap::Parser;

#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    // --- Server Args ---
    /// Host address and port for the WebSocket server to listen on.
    #[arg(long, env = "SERVER_ADDR", default_value = "127.0.0.1:4000")]
    pub server_addr: String,

    // --- Chat LLM Provider Args ---
    /// Google Gemini API key, sent as the `key` query parameter.
    #[arg(long, env = "CHAT_API_KEY", default_value = "")]
    pub chat_api_key: String,

    /// Model name for chat completion (e.g., gemini-2.5-flash-lite)
    #[arg(long, env = "CHAT_MODEL")] // No default, rely on adapter defaults if None
    pub chat_model: Option<String>,

    /// Base URL of the models collection (e.g., https://generativelanguage.googleapis.com/v1beta/models)
    #[arg(long, env = "CHAT_BASE_URL")]
    pub chat_base_url: Option<String>,

    // --- Session Store Args ---
    /// Session store type (file, memory)
    #[arg(long, env = "HISTORY_TYPE", default_value = "file")]
    pub history_type: String,

    /// JSON file holding the saved session when HISTORY_TYPE=file.
    #[arg(long, env = "HISTORY_PATH", default_value = "data/isekai_game_state.json")]
    pub history_path: String,

    /// Discard any saved session on startup.
    #[arg(long, env = "RESET_SESSION", default_value = "false")]
    pub reset: bool,

    // --- Scenario Args ---
    /// Greeting text, as a file path or http(s) URL.
    #[arg(long, env = "SCENARIO_GREETING", default_value = "scenario/greeting.txt")]
    pub greeting_path: String,

    /// Main role-play rules, as a file path or http(s) URL.
    #[arg(long, env = "SCENARIO_MAIN_RULES", default_value = "scenario/main_logic.txt")]
    pub main_rules_path: String,

    /// Special-event rules used from turn 50 on, as a file path or http(s) URL.
    #[arg(long, env = "SCENARIO_EVENT_RULES", default_value = "scenario/events.txt")]
    pub event_rules_path: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let args = Args::try_parse_from(["isekai-chat"]).unwrap();
        assert_eq!(args.history_type, "file");
        assert_eq!(args.history_path, "data/isekai_game_state.json");
        assert_eq!(args.main_rules_path, "scenario/main_logic.txt");
        assert!(!args.reset);
    }

    #[test]
    fn test_flags_override() {
        let args = Args::try_parse_from([
            "isekai-chat",
            "--history-type",
            "memory",
            "--chat-model",
            "gemini-2.5-pro",
            "--reset",
        ]).unwrap();
        assert_eq!(args.history_type, "memory");
        assert_eq!(args.chat_model.as_deref(), Some("gemini-2.5-pro"));
        assert!(args.reset);
    }
}
