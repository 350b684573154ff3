//! Adapter wiring the Telegram client into the pipeline's messenger seam.

use async_trait::async_trait;

use monitor::error::{SendError, SendResult};
use monitor::Messenger;
use telegram::{TelegramError, TelegramService};

#[derive(Debug, Clone)]
pub struct TelegramMessenger {
    service: TelegramService,
}

impl TelegramMessenger {
    pub fn new(service: TelegramService) -> Self {
        Self { service }
    }
}

#[async_trait]
impl Messenger for TelegramMessenger {
    async fn send(&self, text: &str) -> SendResult<()> {
        self.service.send_message(text).await.map_err(|e| match e {
            TelegramError::Api(description) => SendError::Rejected(description),
            transport => SendError::Transport(Box::new(transport)),
        })
    }
}
