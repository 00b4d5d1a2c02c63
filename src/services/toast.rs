use std::collections::VecDeque;
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{info, warn};

pub const SUCCESS_TITLE: &str = "Success!";
pub const ERROR_TITLE: &str = "Something went wrong.";
/// Toasts beyond this many push out the oldest.
pub const MAX_TOASTS: usize = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastStatus {
    Success,
    Error,
}

/// Transient notification shown after a mutation settles.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toast {
    pub title: String,
    pub description: String,
    pub status: ToastStatus,
}

/// Shared queue of pending toasts. The front end drains it when it repaints.
#[derive(Clone, Default)]
pub struct Toaster {
    queue: Arc<Mutex<VecDeque<Toast>>>,
}

impl Toaster {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn show(&self, title: &str, description: &str, status: ToastStatus) {
        match status {
            ToastStatus::Success => info!("{} {}", title, description),
            ToastStatus::Error => warn!("{} {}", title, description),
        }
        let mut queue = self.queue.lock();
        if queue.len() == MAX_TOASTS {
            queue.pop_front();
        }
        queue.push_back(Toast {
            title: title.to_string(),
            description: description.to_string(),
            status,
        });
    }

    pub fn success(&self, description: &str) {
        self.show(SUCCESS_TITLE, description, ToastStatus::Success);
    }

    pub fn error(&self, description: &str) {
        self.show(ERROR_TITLE, description, ToastStatus::Error);
    }

    pub fn latest(&self) -> Option<Toast> {
        self.queue.lock().back().cloned()
    }

    pub fn drain(&self) -> Vec<Toast> {
        self.queue.lock().drain(..).collect()
    }

    pub fn len(&self) -> usize {
        self.queue.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.lock().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_toasts_queue_in_order() {
        let toaster = Toaster::new();
        toaster.success("Stock added successfully.");
        toaster.error("Symbol already exists");

        let latest = toaster.latest().unwrap();
        assert_eq!(latest.title, "Something went wrong.");
        assert_eq!(latest.status, ToastStatus::Error);

        let all = toaster.drain();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].title, "Success!");
        assert!(toaster.is_empty());
    }

    #[test]
    fn test_queue_is_capped() {
        let toaster = Toaster::new();
        for n in 0..MAX_TOASTS + 3 {
            toaster.error(&format!("failure {}", n));
        }

        let all = toaster.drain();
        assert_eq!(all.len(), MAX_TOASTS);
        assert_eq!(all[0].description, "failure 3");
        assert_eq!(all[MAX_TOASTS - 1].description, format!("failure {}", MAX_TOASTS + 2));
    }

    #[test]
    fn test_clones_share_queue() {
        let toaster = Toaster::new();
        let other = toaster.clone();
        other.success("Stock updated successfully.");

        assert_eq!(toaster.len(), 1);
    }
}
