/// Celebration side effects the presentation layer plays when tasks are
/// created or finished.
///
/// The store never renders anything itself; it pushes a payload describing
/// the burst onto an optional channel and moves on. No subscriber, or a
/// subscriber that has gone away, means the payload is dropped.
use serde::Serialize;
use tokio::sync::mpsc;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Celebration {
    pub particle_count: u32,
    pub spread: u32,
    pub origin_y: f64,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub colors: Vec<&'static str>,
}

impl Celebration {
    /// The full burst for a newly created task.
    pub fn task_added() -> Self {
        Self {
            particle_count: 100,
            spread: 70,
            origin_y: 0.6,
            colors: Vec::new(),
        }
    }

    /// The lighter green burst for a task flipped to completed.
    pub fn task_completed() -> Self {
        Self {
            particle_count: 50,
            spread: 60,
            origin_y: 0.7,
            colors: vec!["#10B981", "#34D399"],
        }
    }
}

pub struct CelebrationSender {
    tx: Option<mpsc::UnboundedSender<Celebration>>,
}

impl CelebrationSender {
    pub fn new(tx: Option<mpsc::UnboundedSender<Celebration>>) -> Self {
        Self { tx }
    }

    /// A sender with no subscriber; every send is a no-op.
    pub fn disabled() -> Self {
        Self { tx: None }
    }

    /// Convenience pair: a wired sender and the receiving end for the UI.
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<Celebration>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx: Some(tx) }, rx)
    }

    pub fn send(&self, celebration: Celebration) {
        if let Some(tx) = &self.tx {
            // A dropped receiver is fine; the session just celebrates less.
            let _ = tx.send(celebration);
        }
    }
}
