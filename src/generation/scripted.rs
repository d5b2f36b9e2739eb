use std::{collections::VecDeque, time::Duration};

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use tokio::sync::Mutex;

use super::{GenerationRequest, GenerationService};

enum Scripted {
    Reply(String),
    Fail(String),
    Stall(Duration),
}

/// Replays canned responses in order and records every request it sees.
#[derive(Default)]
pub struct ScriptedGenerator {
    script: Mutex<VecDeque<Scripted>>,
    requests: Mutex<Vec<GenerationRequest>>,
}

impl ScriptedGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn push_reply(&self, text: impl Into<String>) {
        self.script.lock().await.push_back(Scripted::Reply(text.into()));
    }

    pub async fn push_failure(&self, message: impl Into<String>) {
        self.script
            .lock()
            .await
            .push_back(Scripted::Fail(message.into()));
    }

    /// Sleeps for `delay` before answering with an error; used to exercise
    /// caller-side timeouts.
    pub async fn push_stall(&self, delay: Duration) {
        self.script.lock().await.push_back(Scripted::Stall(delay));
    }

    pub async fn requests(&self) -> Vec<GenerationRequest> {
        self.requests.lock().await.clone()
    }
}

#[async_trait]
impl GenerationService for ScriptedGenerator {
    async fn generate(&self, request: GenerationRequest) -> Result<String> {
        self.requests.lock().await.push(request);
        let next = self.script.lock().await.pop_front();
        match next {
            Some(Scripted::Reply(text)) => Ok(text),
            Some(Scripted::Fail(message)) => Err(anyhow!(message)),
            Some(Scripted::Stall(delay)) => {
                tokio::time::sleep(delay).await;
                Err(anyhow!("stalled response finished after {delay:?}"))
            }
            None => Err(anyhow!("no scripted response left")),
        }
    }

    fn model_name(&self) -> &str {
        "scripted"
    }
}
