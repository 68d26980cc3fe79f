pub mod gemini_chat;
pub mod speech_synthesis;
pub mod speech_to_text;

pub use crate::gemini_chat::GeminiChatBackend;
pub use crate::speech_synthesis::TranslateTtsClient;
pub use crate::speech_to_text::GoogleSpeechClient;
