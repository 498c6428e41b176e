// analysis/hook.rs
//! Debounced async event handlers.

use tokio::sync::mpsc;
use tokio::time::Instant;

/// A background task that receives events over a channel and may debounce
/// them.
///
/// `handle_event` sees every event as it arrives and returns the deadline to
/// wait for: a new one restarts the quiet period, the `timeout` passed in keeps
/// the current one, `None` cancels it. When a deadline passes without another
/// event, `finish_debounce` runs.
pub trait AsyncHook: Send + 'static + Sized {
    type Event: Send + 'static;

    fn handle_event(&mut self, event: Self::Event, timeout: Option<Instant>) -> Option<Instant>;

    fn finish_debounce(&mut self);

    /// Start the hook and return the sender that feeds it.
    ///
    /// Outside a tokio runtime nothing is spawned; the receiver is dropped and
    /// sends fail, which keeps plain unit tests free of a runtime.
    fn spawn(self, capacity: usize) -> mpsc::Sender<Self::Event> {
        let (tx, rx) = mpsc::channel(capacity);
        if tokio::runtime::Handle::try_current().is_ok() {
            tokio::spawn(run(self, rx));
        }
        tx
    }
}

async fn run<Hook: AsyncHook>(mut hook: Hook, mut rx: mpsc::Receiver<Hook::Event>) {
    let mut deadline: Option<Instant> = None;
    loop {
        let quiet = tokio::time::sleep_until(deadline.unwrap_or_else(Instant::now));
        tokio::select! {
            biased;
            event = rx.recv() => match event {
                Some(event) => deadline = hook.handle_event(event, deadline),
                None => break,
            },
            () = quiet, if deadline.is_some() => {
                deadline = None;
                hook.finish_debounce();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    use super::*;

    /// Collects events and records each burst once it goes quiet.
    struct Bursts {
        current: Vec<u32>,
        done: Arc<Mutex<Vec<Vec<u32>>>>,
    }

    impl AsyncHook for Bursts {
        type Event = u32;

        fn handle_event(&mut self, event: u32, _: Option<Instant>) -> Option<Instant> {
            self.current.push(event);
            Some(Instant::now() + Duration::from_millis(100))
        }

        fn finish_debounce(&mut self) {
            let burst = std::mem::take(&mut self.current);
            self.done.lock().unwrap().push(burst);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn quiet_period_restarts_on_each_event() {
        let done = Arc::new(Mutex::new(Vec::new()));
        let tx = Bursts {
            current: Vec::new(),
            done: done.clone(),
        }
        .spawn(8);

        for n in 1..=3 {
            tx.send(n).await.unwrap();
            tokio::time::sleep(Duration::from_millis(60)).await;
        }
        assert!(done.lock().unwrap().is_empty());

        tokio::time::sleep(Duration::from_millis(200)).await;
        tx.send(4).await.unwrap();
        tokio::time::sleep(Duration::from_millis(200)).await;

        assert_eq!(*done.lock().unwrap(), vec![vec![1, 2, 3], vec![4]]);
    }
}
