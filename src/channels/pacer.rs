//! Outbound send pacing.

use std::time::Duration;

use rand::Rng;

/// Jittered inter-send delay policy for a transport.
///
/// Messaging providers throttle rapid-fire sends; a small randomized gap
/// between deliveries keeps the channel under their limits.
#[derive(Debug, Clone)]
pub struct SendPacer {
    range: Option<(Duration, Duration)>,
}

impl SendPacer {
    /// Delay each send by a uniformly random duration in `[min, max]`.
    /// A zero maximum disables pacing entirely.
    pub fn new(min: Duration, max: Duration) -> Self {
        if max.is_zero() {
            return Self::disabled();
        }
        let min = min.min(max);
        Self {
            range: Some((min, max)),
        }
    }

    /// No delay between sends.
    pub fn disabled() -> Self {
        Self { range: None }
    }

    pub fn is_enabled(&self) -> bool {
        self.range.is_some()
    }

    /// Sleep for one jittered delay interval.
    pub async fn pace(&self) {
        let Some((min, max)) = self.range else {
            return;
        };
        let min_ms = min.as_millis() as u64;
        let max_ms = max.as_millis() as u64;
        let delay_ms = rand::thread_rng().gen_range(min_ms..=max_ms);
        tokio::time::sleep(Duration::from_millis(delay_ms)).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_max_disables_pacing() {
        let pacer = SendPacer::new(Duration::ZERO, Duration::ZERO);
        assert!(!pacer.is_enabled());
        assert!(SendPacer::disabled().range.is_none());
    }

    #[test]
    fn min_is_clamped_to_max() {
        let pacer = SendPacer::new(Duration::from_millis(500), Duration::from_millis(100));
        assert_eq!(
            pacer.range,
            Some((Duration::from_millis(100), Duration::from_millis(100)))
        );
    }

    #[tokio::test]
    async fn disabled_pacer_returns_immediately() {
        let started = std::time::Instant::now();
        SendPacer::disabled().pace().await;
        assert!(started.elapsed() < Duration::from_millis(50));
    }
}
