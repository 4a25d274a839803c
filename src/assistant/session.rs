use chrono::NaiveDate;

use crate::config::Config;
use crate::hotels::HotelSearch;
use crate::model::Message;

const MAX_HISTORY_MESSAGES: usize = 40;

/// Running chat transcript. System messages survive trimming and resets.
#[derive(Debug, Clone)]
pub struct ChatHistory {
    messages: Vec<Message>,
    system_messages: Vec<Message>,
}

impl ChatHistory {
    pub fn new(system_prompt: &str) -> Self {
        let mut system_messages = Vec::new();
        if !system_prompt.trim().is_empty() {
            system_messages.push(Message::system(system_prompt));
        }
        Self {
            messages: system_messages.clone(),
            system_messages,
        }
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn push(&mut self, message: Message) {
        self.messages.push(message);
        self.trim();
    }

    /// Drops the newest message; used when a turn could not be answered.
    pub fn pop(&mut self) -> Option<Message> {
        if self.messages.len() > self.system_messages.len() {
            self.messages.pop()
        } else {
            None
        }
    }

    pub fn reset(&mut self) {
        self.messages = self.system_messages.clone();
    }

    fn trim(&mut self) {
        if self.messages.len() <= MAX_HISTORY_MESSAGES {
            return;
        }

        let keep_tail = MAX_HISTORY_MESSAGES.saturating_sub(self.system_messages.len());
        let mut trimmed = self.system_messages.clone();
        let tail_start = self.messages.len().saturating_sub(keep_tail);
        trimmed.extend_from_slice(&self.messages[tail_start..]);
        self.messages = trimmed;
    }
}

/// Everything one interactive session remembers between turns.
#[derive(Debug, Clone)]
pub struct SessionState {
    pub nights: u32,
    /// `None` means "offset from today", resolved at search time.
    pub checkin: Option<NaiveDate>,
    pub last_search: Option<HotelSearch>,
    pub chat: ChatHistory,
}

impl SessionState {
    pub fn new(cfg: &Config) -> Self {
        Self {
            nights: cfg.default_nights,
            checkin: None,
            last_search: None,
            chat: ChatHistory::new(&cfg.system_prompt),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{ChatHistory, MAX_HISTORY_MESSAGES, SessionState};
    use crate::config::Config;
    use crate::model::{Message, MessageRole};

    #[test]
    fn trimming_keeps_system_prompt_and_newest_messages() {
        let mut history = ChatHistory::new("be brief");
        for idx in 0..(MAX_HISTORY_MESSAGES + 10) {
            history.push(Message::user(format!("turn {idx}")));
        }

        let messages = history.messages();
        assert_eq!(messages.len(), MAX_HISTORY_MESSAGES);
        assert_eq!(messages[0], Message::system("be brief"));
        assert_eq!(
            messages.last().map(|m| m.content.as_str()),
            Some("turn 49")
        );
        assert_eq!(messages[1].content, "turn 11");
    }

    #[test]
    fn reset_and_pop_never_remove_system_messages() {
        let mut history = ChatHistory::new("be brief");
        history.push(Message::user("hello"));
        assert_eq!(history.pop().map(|m| m.role), Some(MessageRole::User));
        assert_eq!(history.pop(), None);

        history.push(Message::user("again"));
        history.reset();
        assert_eq!(history.messages(), &[Message::system("be brief")]);
    }

    #[test]
    fn blank_system_prompt_starts_empty() {
        assert!(ChatHistory::new("   ").messages().is_empty());
    }

    #[test]
    fn new_session_uses_configured_nights() {
        let cfg = Config::from_env_with(|key| (key == "DEFAULT_NIGHTS").then(|| "4".to_string()));
        let state = SessionState::new(&cfg);
        assert_eq!(state.nights, 4);
        assert!(state.checkin.is_none());
        assert!(state.last_search.is_none());
    }
}
