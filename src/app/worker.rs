use std::sync::mpsc;
use std::time::Duration;

pub const ACTION_RESULT_POLL_INTERVAL: Duration = Duration::from_millis(24);

#[derive(Debug)]
pub enum WorkerPoll<T> {
    Ready(T),
    Pending,
    /// The worker exited without reporting.
    Lost,
}

/// Receiving end of a job running on its own thread.
#[derive(Debug)]
pub struct WorkerHandle<T> {
    rx: mpsc::Receiver<T>,
}

impl<T> WorkerHandle<T> {
    pub fn try_result(&self) -> WorkerPoll<T> {
        match self.rx.try_recv() {
            Ok(result) => WorkerPoll::Ready(result),
            Err(mpsc::TryRecvError::Empty) => WorkerPoll::Pending,
            Err(mpsc::TryRecvError::Disconnected) => WorkerPoll::Lost,
        }
    }

    pub fn wait(self) -> Option<T> {
        self.rx.recv().ok()
    }
}

pub fn spawn_worker_action<T, W>(work: W) -> WorkerHandle<T>
where
    T: Send + 'static,
    W: FnOnce() -> T + Send + 'static,
{
    let (tx, rx) = mpsc::channel::<T>();
    std::thread::spawn(move || {
        let result = work();
        let _ = tx.send(result);
    });
    WorkerHandle { rx }
}
