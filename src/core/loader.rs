use crate::config::profile::LoaderConfig;
use crate::domain::model::{LoadOutcome, LoadReport};
use crate::domain::ports::CatalogPage;
use std::time::Duration;

/// Triggers more cards until a target count is visible or the retry budget runs out.
///
/// A round that does not grow the card count is "stalled"; failed triggers
/// and failed counts are stalled rounds too. The loop gives up after
/// `max_stalled_rounds` consecutive stalls or `max_rounds` rounds overall,
/// so it always terminates.
#[derive(Debug, Clone)]
pub struct LoaderLoop {
    max_stalled_rounds: usize,
    max_rounds: usize,
    settle_delay: Duration,
}

impl LoaderLoop {
    pub fn new(max_stalled_rounds: usize, max_rounds: usize, settle_delay: Duration) -> Self {
        Self {
            max_stalled_rounds,
            max_rounds,
            settle_delay,
        }
    }

    pub fn from_config(config: &LoaderConfig) -> Self {
        Self::new(
            config.max_stalled_rounds,
            config.max_rounds,
            config.settle_delay(),
        )
    }

    pub fn max_rounds(&self) -> usize {
        self.max_rounds
    }

    pub async fn run<P: CatalogPage + ?Sized>(&self, page: &P, target: usize) -> LoadReport {
        let initial_count = match page.card_count().await {
            Ok(count) => count,
            Err(e) => {
                tracing::warn!("Failed to count product cards: {}", e);
                0
            }
        };

        let mut count = initial_count;
        let mut rounds = 0;
        let mut stalled = 0;

        while count < target {
            if stalled >= self.max_stalled_rounds || rounds >= self.max_rounds {
                tracing::warn!(
                    "Load retries exhausted after {} rounds ({} stalled): {} of {} cards visible, continuing with partial results",
                    rounds,
                    stalled,
                    count,
                    target
                );
                return LoadReport {
                    outcome: LoadOutcome::RetryExhausted,
                    rounds,
                    initial_count,
                    final_count: count,
                };
            }

            rounds += 1;
            let triggered = match page.load_more().await {
                Ok(action) => {
                    tracing::debug!("Round {}: {:?} for more cards", rounds, action);
                    true
                }
                Err(e) => {
                    tracing::debug!("Round {}: load more failed: {}", rounds, e);
                    false
                }
            };

            if !self.settle_delay.is_zero() {
                tokio::time::sleep(self.settle_delay).await;
            }

            let next = match page.card_count().await {
                Ok(next) => next,
                Err(e) => {
                    tracing::debug!("Round {}: recount failed: {}", rounds, e);
                    count
                }
            };

            if triggered && next > count {
                stalled = 0;
            } else {
                stalled += 1;
            }
            count = next;

            tracing::debug!(
                "Round {}: {} cards visible (target {}, stalled {})",
                rounds,
                count,
                target,
                stalled
            );
        }

        tracing::info!(
            "Card target reached: {} of {} cards after {} rounds",
            count,
            target,
            rounds
        );
        LoadReport {
            outcome: LoadOutcome::TargetReached,
            rounds,
            initial_count,
            final_count: count,
        }
    }
}
