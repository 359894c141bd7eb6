use crate::cli::Args;
use log::{ info, warn };
use std::error::Error;
use std::sync::Arc;

pub const DEFAULT_GREETING: &str = "Welcome to the isekai world!";
pub const DEFAULT_MAIN_RULES: &str = "Follow roleplay rules.";
pub const DEFAULT_EVENT_RULES: &str = "Generate special events when needed.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Scenario {
    pub greeting: String,
    pub main_rules: String,
    pub event_rules: String,
}

impl Default for Scenario {
    fn default() -> Self {
        Self {
            greeting: DEFAULT_GREETING.to_string(),
            main_rules: DEFAULT_MAIN_RULES.to_string(),
            event_rules: DEFAULT_EVENT_RULES.to_string(),
        }
    }
}

/// Where each scenario fragment lives: a filesystem path or an http(s) URL.
#[derive(Debug, Clone)]
pub struct ScenarioLoader {
    pub greeting: String,
    pub main_rules: String,
    pub event_rules: String,
    http: reqwest::Client,
}

impl ScenarioLoader {
    pub fn new(greeting: String, main_rules: String, event_rules: String) -> Self {
        Self {
            greeting,
            main_rules,
            event_rules,
            http: reqwest::Client::new(),
        }
    }

    pub fn from_args(args: &Args) -> Self {
        Self::new(
            args.greeting_path.clone(),
            args.main_rules_path.clone(),
            args.event_rules_path.clone()
        )
    }

    /// Fetches all three fragments concurrently. Each one falls back to its
    /// default on its own, so this never fails.
    pub async fn load(&self) -> Arc<Scenario> {
        let (greeting, main_rules, event_rules) = tokio::join!(
            self.load_text(&self.greeting, DEFAULT_GREETING),
            self.load_text(&self.main_rules, DEFAULT_MAIN_RULES),
            self.load_text(&self.event_rules, DEFAULT_EVENT_RULES)
        );
        info!(
            "Scenario loaded: greeting={} chars, main rules={} chars, event rules={} chars",
            greeting.len(),
            main_rules.len(),
            event_rules.len()
        );
        Arc::new(Scenario { greeting, main_rules, event_rules })
    }

    async fn load_text(&self, location: &str, fallback: &str) -> String {
        match self.fetch(location).await {
            Ok(text) => text.trim().to_string(),
            Err(e) => {
                warn!("Failed to load scenario text '{}', using fallback: {}", location, e);
                fallback.to_string()
            }
        }
    }

    async fn fetch(&self, location: &str) -> Result<String, Box<dyn Error + Send + Sync>> {
        if is_remote(location) {
            let text = self.http.get(location).send().await?.error_for_status()?.text().await?;
            Ok(text)
        } else {
            let text = tokio::fs
                ::read_to_string(location).await
                .map_err(|e| format!("Failed to read '{}': {}", location, e))?;
            Ok(text)
        }
    }
}

fn is_remote(location: &str) -> bool {
    location.starts_with("http://") || location.starts_with("https://")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;
    use tokio::io::{ AsyncReadExt, AsyncWriteExt };
    use tokio::net::TcpListener;

    /// Serves one HTTP response with the given status line and body, then
    /// returns the URL it was reachable at.
    async fn serve_once(status_line: &'static str, body: &'static str) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = Vec::new();
            let mut chunk = [0u8; 1024];
            while !buf.windows(4).any(|w| w == b"\r\n\r\n") {
                let n = socket.read(&mut chunk).await.unwrap();
                if n == 0 {
                    break;
                }
                buf.extend_from_slice(&chunk[..n]);
            }
            let response = format!(
                "HTTP/1.1 {}\r\nContent-Type: text/plain\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                status_line,
                body.len(),
                body
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            let _ = socket.shutdown().await;
        });
        format!("http://{}/scenario.txt", addr)
    }

    fn loader_in(dir: &TempDir) -> ScenarioLoader {
        let path = |name: &str| dir.path().join(name).to_string_lossy().into_owned();
        ScenarioLoader::new(path("greeting.txt"), path("main_logic.txt"), path("events.txt"))
    }

    #[tokio::test]
    async fn test_load_reads_and_trims_files() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("greeting.txt"), "  You wake in a meadow.\n").unwrap();
        fs::write(dir.path().join("main_logic.txt"), "Stay in character.\n").unwrap();
        fs::write(dir.path().join("events.txt"), "\nA dragon appears.").unwrap();

        let scenario = loader_in(&dir).load().await;
        assert_eq!(scenario.greeting, "You wake in a meadow.");
        assert_eq!(scenario.main_rules, "Stay in character.");
        assert_eq!(scenario.event_rules, "A dragon appears.");
    }

    #[tokio::test]
    async fn test_each_missing_file_falls_back_independently() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("main_logic.txt"), "Custom rules").unwrap();

        let scenario = loader_in(&dir).load().await;
        assert_eq!(scenario.greeting, DEFAULT_GREETING);
        assert_eq!(scenario.main_rules, "Custom rules");
        assert_eq!(scenario.event_rules, DEFAULT_EVENT_RULES);
    }

    #[tokio::test]
    async fn test_unreachable_url_falls_back() {
        let loader = ScenarioLoader::new(
            "http://127.0.0.1:9/greeting.txt".to_string(),
            "/definitely/not/here.txt".to_string(),
            "/definitely/not/here/either.txt".to_string()
        );
        assert_eq!(*loader.load().await, Scenario::default());
    }

    #[tokio::test]
    async fn test_remote_text_is_trimmed() {
        let dir = TempDir::new().unwrap();
        let mut loader = loader_in(&dir);
        loader.greeting = serve_once("200 OK", "\n  The portal hums.  \n").await;

        let scenario = loader.load().await;
        assert_eq!(scenario.greeting, "The portal hums.");
        assert_eq!(scenario.main_rules, DEFAULT_MAIN_RULES);
    }

    #[tokio::test]
    async fn test_remote_error_status_falls_back() {
        let dir = TempDir::new().unwrap();
        let mut loader = loader_in(&dir);
        loader.greeting = serve_once("404 Not Found", "no such scenario").await;
        loader.event_rules = serve_once("500 Internal Server Error", "boom").await;

        let scenario = loader.load().await;
        assert_eq!(scenario.greeting, DEFAULT_GREETING);
        assert_eq!(scenario.event_rules, DEFAULT_EVENT_RULES);
    }

    #[test]
    fn test_is_remote() {
        assert!(is_remote("https://example.com/greeting.txt"));
        assert!(is_remote("http://localhost/events.txt"));
        assert!(!is_remote("scenario/greeting.txt"));
    }
}
