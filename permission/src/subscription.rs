use std::collections::VecDeque;

use async_channel::{Receiver, TryRecvError};
use futures::Stream;

use crate::{PermissionError, PermissionOutcome};

/// A cancellable handle over the outcomes of one permission request.
///
/// Outcomes are yielded in the order the permissions were requested, one per
/// permission, after which the subscription is completed. Delivery may take
/// arbitrarily long because it usually waits on a system dialog.
///
/// Dropping a subscription only stops listening. Other subscribers waiting on the
/// same pending permission still receive their outcome.
#[derive(Debug)]
pub struct Subscription {
    slots: VecDeque<Receiver<PermissionOutcome>>,
    cancelled: bool,
}

impl Subscription {
    pub(crate) fn new(slots: Vec<Receiver<PermissionOutcome>>) -> Self {
        Self {
            slots: slots.into(),
            cancelled: false,
        }
    }

    /// Wait for the next outcome.
    ///
    /// Returns `None` once every outcome has been yielded or the subscription was cancelled.
    pub async fn next(&mut self) -> Option<PermissionOutcome> {
        loop {
            if self.cancelled {
                return None;
            }
            let received = self.slots.front()?.recv().await;
            self.slots.pop_front();
            // An error means the request was dropped without an answer.
            if let Ok(outcome) = received {
                return Some(outcome);
            }
        }
    }

    /// Take the next outcome if it has already arrived.
    pub fn try_next(&mut self) -> Option<PermissionOutcome> {
        loop {
            if self.cancelled {
                return None;
            }
            match self.slots.front()?.try_recv() {
                Ok(outcome) => {
                    self.slots.pop_front();
                    return Some(outcome);
                }
                Err(TryRecvError::Empty) => return None,
                Err(TryRecvError::Closed) => {
                    self.slots.pop_front();
                }
            }
        }
    }

    /// Cancel the subscription.
    ///
    /// No outcome is yielded after this call, including outcomes that were already
    /// queued. Cancelling twice is a no-op.
    pub fn cancel(&mut self) {
        if self.cancelled {
            return;
        }
        self.cancelled = true;
        for slot in self.slots.drain(..) {
            slot.close();
        }
    }

    /// Whether [`cancel`](Self::cancel) was called.
    #[must_use]
    pub const fn is_cancelled(&self) -> bool {
        self.cancelled
    }

    /// Whether every outcome has been yielded.
    #[must_use]
    pub fn is_completed(&self) -> bool {
        !self.cancelled && self.slots.is_empty()
    }

    /// Whether the subscription will never yield again, either because it
    /// completed or because it was cancelled.
    #[must_use]
    pub fn is_disposed(&self) -> bool {
        self.cancelled || self.slots.is_empty()
    }

    /// Wait for every outcome.
    ///
    /// # Errors
    /// Returns [`PermissionError::Cancelled`] if the subscription was cancelled
    /// before it was collected.
    pub async fn collect(mut self) -> Result<Vec<PermissionOutcome>, PermissionError> {
        if self.cancelled {
            return Err(PermissionError::Cancelled);
        }
        let mut outcomes = Vec::with_capacity(self.slots.len());
        while let Some(outcome) = self.next().await {
            outcomes.push(outcome);
        }
        Ok(outcomes)
    }

    /// Turn the subscription into a [`Stream`] of outcomes.
    pub fn into_stream(self) -> impl Stream<Item = PermissionOutcome> {
        futures::stream::unfold(self, |mut subscription| async move {
            subscription
                .next()
                .await
                .map(|outcome| (outcome, subscription))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_channel::bounded;
    use futures::StreamExt;
    use futures::executor::block_on;

    fn ready(outcome: PermissionOutcome) -> Receiver<PermissionOutcome> {
        let (sender, receiver) = bounded(1);
        sender.try_send(outcome).unwrap();
        receiver
    }

    #[test]
    fn yields_in_request_order() {
        let (late_sender, late) = bounded(1);
        let mut subscription =
            Subscription::new(vec![late, ready(PermissionOutcome::granted("second"))]);

        // The first slot has not answered yet, so nothing is ready.
        assert_eq!(subscription.try_next(), None);

        late_sender
            .try_send(PermissionOutcome::denied("first", true))
            .unwrap();
        assert_eq!(subscription.try_next().unwrap().name(), "first");
        assert_eq!(subscription.try_next().unwrap().name(), "second");
        assert!(subscription.is_completed());
        assert!(subscription.is_disposed());
    }

    #[test]
    fn cancel_drops_queued_outcomes() {
        let mut subscription = Subscription::new(vec![ready(PermissionOutcome::granted("a"))]);
        subscription.cancel();
        subscription.cancel();

        assert_eq!(subscription.try_next(), None);
        assert_eq!(block_on(subscription.next()), None);
        assert!(subscription.is_cancelled());
        assert!(!subscription.is_completed());
        assert!(subscription.is_disposed());
    }

    #[test]
    fn cancel_closes_the_sender_side() {
        let (sender, receiver) = bounded(1);
        let mut subscription = Subscription::new(vec![receiver]);
        subscription.cancel();

        assert!(sender.try_send(PermissionOutcome::granted("a")).is_err());
    }

    #[test]
    fn skips_slots_dropped_without_answer() {
        let (sender, unanswered) = bounded(1);
        drop(sender);
        let mut subscription =
            Subscription::new(vec![unanswered, ready(PermissionOutcome::granted("b"))]);

        assert_eq!(subscription.try_next().unwrap().name(), "b");
    }

    #[tokio::test]
    async fn stream_ends_after_last_outcome() {
        let subscription = Subscription::new(vec![
            ready(PermissionOutcome::granted("a")),
            ready(PermissionOutcome::denied("b", false)),
        ]);

        let names: Vec<String> = subscription
            .into_stream()
            .map(|outcome| outcome.name().to_owned())
            .collect()
            .await;
        assert_eq!(names, ["a", "b"]);
    }

    #[tokio::test]
    async fn next_waits_for_a_late_answer() {
        let (sender, receiver) = bounded(1);
        let mut subscription = Subscription::new(vec![receiver]);

        let answer = tokio::spawn(async move {
            tokio::task::yield_now().await;
            sender
                .send(PermissionOutcome::granted("late"))
                .await
                .unwrap();
        });

        let outcome = subscription.next().await.unwrap();
        answer.await.unwrap();
        assert_eq!(outcome.name(), "late");
        assert!(subscription.is_completed());
    }
}
