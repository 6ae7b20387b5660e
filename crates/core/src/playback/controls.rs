use std::time::Duration;

use tokio::time::Instant;

/// Auto-hiding control overlay.
///
/// Any pointer movement shows the controls and restarts the inactivity timer.
/// Once the timer elapses the controls hide, unless the scrub bar is being
/// dragged or a settings menu is open.
#[derive(Debug, Clone)]
pub struct ControlsVisibility {
    visible: bool,
    last_activity: Instant,
    hide_delay: Duration,
    dragging: bool,
    settings_open: bool,
}

impl ControlsVisibility {
    pub fn new(hide_delay: Duration, now: Instant) -> Self {
        Self {
            visible: true,
            last_activity: now,
            hide_delay,
            dragging: false,
            settings_open: false,
        }
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn pointer_moved(&mut self, now: Instant) {
        self.visible = true;
        self.last_activity = now;
    }

    pub fn set_dragging(&mut self, dragging: bool, now: Instant) {
        self.dragging = dragging;
        self.pointer_moved(now);
    }

    pub fn set_settings_open(&mut self, open: bool, now: Instant) {
        self.settings_open = open;
        self.pointer_moved(now);
    }

    /// When the overlay would hide if nothing else happens.
    pub fn hide_deadline(&self) -> Instant {
        self.last_activity + self.hide_delay
    }

    /// Re-evaluates visibility; returns it.
    pub fn tick(&mut self, now: Instant) -> bool {
        if self.visible
            && !self.dragging
            && !self.settings_open
            && now >= self.hide_deadline()
        {
            self.visible = false;
        }
        self.visible
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DELAY: Duration = Duration::from_secs(2);

    #[test]
    fn hides_after_inactivity() {
        let t0 = Instant::now();
        let mut controls = ControlsVisibility::new(DELAY, t0);
        assert!(controls.tick(t0 + Duration::from_millis(1999)));
        assert!(!controls.tick(t0 + DELAY));
    }

    #[test]
    fn pointer_movement_restarts_the_timer() {
        let t0 = Instant::now();
        let mut controls = ControlsVisibility::new(DELAY, t0);
        controls.pointer_moved(t0 + Duration::from_millis(1500));
        assert!(controls.tick(t0 + Duration::from_millis(3000)));
        assert!(!controls.tick(t0 + Duration::from_millis(3500)));

        controls.pointer_moved(t0 + Duration::from_millis(4000));
        assert!(controls.is_visible());
    }

    #[test]
    fn stays_visible_while_dragging_or_menu_open() {
        let t0 = Instant::now();
        let mut controls = ControlsVisibility::new(DELAY, t0);

        controls.set_dragging(true, t0);
        assert!(controls.tick(t0 + Duration::from_secs(10)));

        controls.set_dragging(false, t0 + Duration::from_secs(10));
        controls.set_settings_open(true, t0 + Duration::from_secs(10));
        assert!(controls.tick(t0 + Duration::from_secs(20)));

        controls.set_settings_open(false, t0 + Duration::from_secs(20));
        assert!(!controls.tick(t0 + Duration::from_secs(22)));
    }
}
