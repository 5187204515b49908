//! Best-effort delivery of one message to many actors.

use std::{fmt::Display, future::Future};

use crate::ActorId;

/// Totals of a fan-out run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FanOutReport {
    pub delivered: usize,
    pub failed: usize,
}

impl FanOutReport {
    pub fn attempted(&self) -> usize {
        self.delivered + self.failed
    }
}

/// Call `deliver` once per recipient, in order.
///
/// A failed delivery is counted and logged; the batch always runs to the end.
pub async fn fan_out<I, F, Fut, E>(recipients: I, mut deliver: F) -> FanOutReport
where
    I: IntoIterator<Item = ActorId>,
    F: FnMut(ActorId) -> Fut,
    Fut: Future<Output = Result<(), E>>,
    E: Display,
{
    let mut report = FanOutReport::default();
    for recipient in recipients {
        match deliver(recipient).await {
            Ok(()) => report.delivered += 1,
            Err(err) => {
                tracing::warn!("delivery to {recipient} failed: {err}");
                report.failed += 1;
            }
        }
    }
    tracing::info!(
        "fan-out finished: {} delivered, {} failed",
        report.delivered,
        report.failed
    );
    report
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn failures_do_not_abort_the_batch() {
        let mut seen = Vec::new();
        let report = fan_out([1, 2, 3, 4], |id| {
            seen.push(id);
            async move {
                if id % 2 == 0 {
                    Err(format!("chat {id} blocked the bot"))
                } else {
                    Ok(())
                }
            }
        })
        .await;
        assert_eq!(seen, vec![1, 2, 3, 4]);
        assert_eq!(
            report,
            FanOutReport {
                delivered: 2,
                failed: 2
            }
        );
        assert_eq!(report.attempted(), 4);
    }

    #[tokio::test]
    async fn no_recipients_reports_zero() {
        let report = fan_out(Vec::new(), |_| async { Ok::<(), String>(()) }).await;
        assert_eq!(report, FanOutReport::default());
    }
}
