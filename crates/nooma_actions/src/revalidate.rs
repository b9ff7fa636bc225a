//! Cache invalidation seam between actions and the presentation layer.

use log::debug;
use std::sync::Mutex;

/// Receives the routes whose rendered data became stale after a write.
pub trait Revalidator {
    fn invalidate(&self, route: &str);
}

/// Revalidator for hosts without a render cache; records each route in the log.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogRevalidator;

impl Revalidator for LogRevalidator {
    fn invalidate(&self, route: &str) {
        debug!("event=revalidate module=actions status=ok route={route}");
    }
}

/// Revalidator that remembers every invalidated route in call order.
#[derive(Debug, Default)]
pub struct RecordingRevalidator {
    routes: Mutex<Vec<String>>,
}

impl RecordingRevalidator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns and clears the routes recorded so far.
    pub fn take(&self) -> Vec<String> {
        match self.routes.lock() {
            Ok(mut routes) => std::mem::take(&mut *routes),
            Err(poisoned) => std::mem::take(&mut *poisoned.into_inner()),
        }
    }
}

impl Revalidator for RecordingRevalidator {
    fn invalidate(&self, route: &str) {
        match self.routes.lock() {
            Ok(mut routes) => routes.push(route.to_string()),
            Err(poisoned) => poisoned.into_inner().push(route.to_string()),
        }
    }
}

impl<R: Revalidator + ?Sized> Revalidator for &R {
    fn invalidate(&self, route: &str) {
        (**self).invalidate(route);
    }
}
