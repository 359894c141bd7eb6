use serde::{ Serialize, Deserialize };

use super::chat::{ ChatMessage, Role };

#[derive(Serialize, Deserialize, Debug, PartialEq)]
#[serde(tag = "type")]
pub enum ClientMessage {
    #[serde(rename = "chat")] Chat {
        content: String,
    },
    #[serde(rename = "reset")]
    Reset,
    #[serde(rename = "state")]
    State,
}

#[derive(Serialize, Deserialize, Debug)]
#[serde(tag = "type")]
pub enum ServerMessage {
    #[serde(rename = "state")] State {
        history: Vec<ChatMessage>,
        turns: u32,
        phase: String,
        special_event_mode: bool,
        event_banner: bool,
    },
    #[serde(rename = "reply")] Reply {
        role: Role,
        content: String,
        timestamp: i64,
        turns: u32,
        special_event_mode: bool,
        event_banner: bool,
    },
    #[serde(rename = "error")] Error {
        message: String,
    },
    #[serde(rename = "processing")]
    Processing,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_client_frames() {
        let chat: ClientMessage = serde_json::from_str(r#"{"type":"chat","content":"Hello"}"#).unwrap();
        assert_eq!(chat, ClientMessage::Chat { content: "Hello".to_string() });

        let reset: ClientMessage = serde_json::from_str(r#"{"type":"reset"}"#).unwrap();
        assert_eq!(reset, ClientMessage::Reset);

        assert!(serde_json::from_str::<ClientMessage>(r#"{"type":"dance"}"#).is_err());
    }

    #[test]
    fn test_processing_frame_shape() {
        let json = serde_json::to_string(&ServerMessage::Processing).unwrap();
        assert_eq!(json, r#"{"type":"processing"}"#);
    }
}
