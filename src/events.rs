use parking_lot::Mutex;
use serde::{Serialize, Serializer};

/// Undrained events kept per outbox; older ones are dropped first.
pub const OUTBOX_LIMIT: usize = 256;

#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash)]
pub enum Route {
    Landing,
    Login,
    StudentDashboard,
    RecruiterDashboard,
}

impl Route {
    pub fn path(&self) -> &'static str {
        match self {
            Route::Landing => "/",
            Route::Login => "/login",
            Route::StudentDashboard => "/student-dashboard",
            Route::RecruiterDashboard => "/recruiter-dashboard",
        }
    }
}

impl Serialize for Route {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.path())
    }
}

#[derive(Debug, Clone, Copy, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Variant {
    Default,
    Destructive,
}

#[derive(Debug, Clone, Eq, PartialEq, Serialize)]
pub struct Notification {
    pub title: String,
    pub description: String,
    pub variant: Variant,
}

impl Notification {
    pub fn info<T: Into<String>, D: Into<String>>(title: T, description: D) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            variant: Variant::Default,
        }
    }

    pub fn destructive<T: Into<String>, D: Into<String>>(title: T, description: D) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            variant: Variant::Destructive,
        }
    }
}

pub trait NotificationSink: Send + Sync {
    fn notify(&self, notification: Notification);
}

pub trait Navigator: Send + Sync {
    fn navigate(&self, route: Route);
}

#[derive(Debug, Clone, Eq, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Event {
    Notify(Notification),
    Navigate { route: Route },
}

/// Records events in arrival order until [`Outbox::drain`] hands them out.
#[derive(Debug, Default)]
pub struct Outbox {
    events: Mutex<Vec<Event>>,
}

impl Outbox {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn drain(&self) -> Vec<Event> {
        std::mem::take(&mut *self.events.lock())
    }

    fn push(&self, event: Event) {
        let mut events = self.events.lock();
        if events.len() >= OUTBOX_LIMIT {
            let overflow = events.len() + 1 - OUTBOX_LIMIT;
            events.drain(..overflow);
            log::debug!("outbox full, dropped {} oldest event(s)", overflow);
        }
        events.push(event);
    }
}

#[cfg(test)]
impl Outbox {
    pub fn notifications(&self) -> Vec<Notification> {
        self.events
            .lock()
            .iter()
            .filter_map(|event| match event {
                Event::Notify(n) => Some(n.clone()),
                Event::Navigate { .. } => None,
            })
            .collect()
    }

    pub fn last_route(&self) -> Option<Route> {
        self.events.lock().iter().rev().find_map(|event| match event {
            Event::Navigate { route } => Some(*route),
            Event::Notify(_) => None,
        })
    }
}

impl NotificationSink for Outbox {
    fn notify(&self, notification: Notification) {
        match notification.variant {
            Variant::Default => log::info!(
                "notify: {} - {}",
                notification.title,
                notification.description
            ),
            Variant::Destructive => log::warn!(
                "notify: {} - {}",
                notification.title,
                notification.description
            ),
        }
        self.push(Event::Notify(notification));
    }
}

impl Navigator for Outbox {
    fn navigate(&self, route: Route) {
        log::info!("navigate: {}", route.path());
        self.push(Event::Navigate { route });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drain_empties_in_arrival_order() {
        let outbox = Outbox::new();
        outbox.notify(Notification::info("Logged Out", "bye"));
        outbox.navigate(Route::Landing);

        assert_eq!(outbox.last_route(), Some(Route::Landing));
        let events = outbox.drain();
        assert_eq!(events.len(), 2);
        assert!(matches!(events[0], Event::Notify(_)));
        assert_eq!(events[1], Event::Navigate { route: Route::Landing });
        assert!(outbox.drain().is_empty());
    }

    #[test]
    fn routes_serialize_as_paths() {
        let json = serde_json::to_value(Event::Navigate {
            route: Route::StudentDashboard,
        })
        .unwrap();
        assert_eq!(json["kind"], "navigate");
        assert_eq!(json["route"], "/student-dashboard");
    }

    #[test]
    fn full_outbox_drops_oldest_first() {
        let outbox = Outbox::new();
        for n in 0..OUTBOX_LIMIT + 10 {
            outbox.notify(Notification::info("Search Complete", n.to_string()));
        }

        let notifications = outbox.notifications();
        assert_eq!(notifications.len(), OUTBOX_LIMIT);
        assert_eq!(notifications[0].description, "10");
        assert_eq!(
            notifications[OUTBOX_LIMIT - 1].description,
            (OUTBOX_LIMIT + 9).to_string()
        );
    }
}
