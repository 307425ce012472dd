//! LISTEN/NOTIFY subscription on [`crate::TASKS_CHANNEL`].

use sqlx::postgres::PgListener;
use sqlx::PgPool;
use tokio::sync::mpsc;

use crate::TASKS_CHANNEL;

/// Payload carried on `TASKS_CHANNEL`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Notification {
    New,
    Abort,
}

impl Notification {
    fn parse(payload: &str) -> Option<Self> {
        match payload {
            "new" => Some(Notification::New),
            "abort" => Some(Notification::Abort),
            _ => None,
        }
    }
}

pub struct NotifyListener {
    pool: PgPool,
}

impl NotifyListener {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Runs until `shutdown` resolves. Reconnects with a fixed backoff on
    /// connection failure; each successful notification is forwarded on
    /// `tx`. A send failure
    /// (receiver dropped) ends the loop.
    pub async fn run(
        self,
        tx: mpsc::Sender<Notification>,
        mut shutdown: tokio::sync::oneshot::Receiver<()>,
    ) {
        loop {
            let mut listener = match PgListener::connect_with(&self.pool).await {
                Ok(l) => l,
                Err(err) => {
                    tracing::warn!(error = %err, "notify listener connect failed, retrying in 5s");
                    tokio::select! {
                        _ = tokio::time::sleep(std::time::Duration::from_secs(5)) => continue,
                        _ = &mut shutdown => return,
                    }
                }
            };
            if let Err(err) = listener.listen(TASKS_CHANNEL).await {
                tracing::warn!(error = %err, "notify listener LISTEN failed, retrying in 5s");
                tokio::select! {
                    _ = tokio::time::sleep(std::time::Duration::from_secs(5)) => continue,
                    _ = &mut shutdown => return,
                }
            }

            loop {
                tokio::select! {
                    notice = listener.recv() => {
                        match notice {
                            Ok(n) => {
                                if let Some(parsed) = Notification::parse(n.payload()) {
                                    if tx.send(parsed).await.is_err() {
                                        return;
                                    }
                                }
                            }
                            Err(err) => {
                                tracing::warn!(error = %err, "notify listener error, reconnecting");
                                break;
                            }
                        }
                    }
                    _ = &mut shutdown => return,
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_known_payloads() {
        assert_eq!(Notification::parse("new"), Some(Notification::New));
        assert_eq!(Notification::parse("abort"), Some(Notification::Abort));
    }

    #[test]
    fn unknown_payload_is_ignored() {
        assert_eq!(Notification::parse("whatever"), None);
    }
}
