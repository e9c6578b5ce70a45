use log::info;
use std::cell::Cell;
use std::rc::Rc;

use crate::{error::NotifyError, notify::NotificationSink};

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::Display)]
#[strum(serialize_all = "lowercase")]
pub enum Platform {
    Ios,
    Android,
}

impl Platform {
    /// The mobile platform this build targets, None everywhere else
    pub fn native() -> Option<Platform> {
        if cfg!(target_os = "ios") {
            Some(Platform::Ios)
        } else if cfg!(target_os = "android") {
            Some(Platform::Android)
        } else {
            None
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdKind {
    Banner,
    Interstitial,
}

/// Google's public test unit ids. Swap for real ids before shipping.
pub fn ad_unit_id(platform: Platform, kind: AdKind) -> &'static str {
    match (platform, kind) {
        (Platform::Ios, AdKind::Banner) => "ca-app-pub-3940256099942544/2934735716",
        (Platform::Ios, AdKind::Interstitial) => "ca-app-pub-3940256099942544/4411468910",
        (Platform::Android, AdKind::Banner) => "ca-app-pub-3940256099942544/6300978111",
        (Platform::Android, AdKind::Interstitial) => "ca-app-pub-3940256099942544/1033173712",
    }
}

/// The ad SDK seam
pub trait AdBackend {
    fn initialize(&mut self) -> Result<(), NotifyError>;
    fn show_banner(&mut self, unit_id: &str) -> Result<(), NotifyError>;
    fn hide_banner(&mut self) -> Result<(), NotifyError>;
    fn prepare_interstitial(&mut self, unit_id: &str) -> Result<(), NotifyError>;
    fn show_interstitial(&mut self) -> Result<(), NotifyError>;
}

/// Backend without an SDK behind it; requests only go to the log
#[derive(Debug, Default)]
pub struct LogAdBackend;

impl AdBackend for LogAdBackend {
    fn initialize(&mut self) -> Result<(), NotifyError> {
        info!("ads: initialize");
        Ok(())
    }

    fn show_banner(&mut self, unit_id: &str) -> Result<(), NotifyError> {
        info!("ads: show banner {unit_id}");
        Ok(())
    }

    fn hide_banner(&mut self) -> Result<(), NotifyError> {
        info!("ads: hide banner");
        Ok(())
    }

    fn prepare_interstitial(&mut self, unit_id: &str) -> Result<(), NotifyError> {
        info!("ads: prepare interstitial {unit_id}");
        Ok(())
    }

    fn show_interstitial(&mut self) -> Result<(), NotifyError> {
        info!("ads: show interstitial");
        Ok(())
    }
}

/// Drives ads from session lifecycle notifications.
///
/// Inert off native platforms and once ads are removed. The removed flag is
/// shared with the host so a purchase takes effect mid-run.
pub struct AdGate<B: AdBackend> {
    backend: B,
    platform: Option<Platform>,
    removed: Rc<Cell<bool>>,
    initialized: bool,
}

impl<B: AdBackend> AdGate<B> {
    pub fn new(backend: B, platform: Option<Platform>, removed: Rc<Cell<bool>>) -> Self {
        Self {
            backend,
            platform,
            removed,
            initialized: false,
        }
    }

    /// Gate for the platform this binary was built for
    pub fn for_host(backend: B, removed: Rc<Cell<bool>>) -> Self {
        Self::new(backend, Platform::native(), removed)
    }

    fn active_platform(&self) -> Option<Platform> {
        if self.removed.get() {
            None
        } else {
            self.platform
        }
    }

    fn ensure_initialized(&mut self) -> Result<(), NotifyError> {
        if !self.initialized {
            self.backend.initialize()?;
            self.initialized = true;
        }
        Ok(())
    }
}

impl<B: AdBackend> NotificationSink for AdGate<B> {
    fn on_session_start(&mut self) -> Result<(), NotifyError> {
        let Some(platform) = self.active_platform() else {
            return Ok(());
        };
        self.ensure_initialized()?;
        self.backend.hide_banner()?;
        self.backend
            .prepare_interstitial(ad_unit_id(platform, AdKind::Interstitial))
    }

    fn on_session_end(&mut self) -> Result<(), NotifyError> {
        let Some(platform) = self.active_platform() else {
            return Ok(());
        };
        self.ensure_initialized()?;
        self.backend.show_interstitial()?;
        self.backend
            .show_banner(ad_unit_id(platform, AdKind::Banner))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    #[derive(Default, Clone)]
    struct CallLog(Rc<RefCell<Vec<String>>>);

    impl CallLog {
        fn calls(&self) -> Vec<String> {
            self.0.borrow().clone()
        }

        fn push(&self, call: impl Into<String>) -> Result<(), NotifyError> {
            self.0.borrow_mut().push(call.into());
            Ok(())
        }
    }

    impl AdBackend for CallLog {
        fn initialize(&mut self) -> Result<(), NotifyError> {
            self.push("init")
        }
        fn show_banner(&mut self, unit_id: &str) -> Result<(), NotifyError> {
            self.push(format!("banner {unit_id}"))
        }
        fn hide_banner(&mut self) -> Result<(), NotifyError> {
            self.push("hide")
        }
        fn prepare_interstitial(&mut self, unit_id: &str) -> Result<(), NotifyError> {
            self.push(format!("prepare {unit_id}"))
        }
        fn show_interstitial(&mut self) -> Result<(), NotifyError> {
            self.push("interstitial")
        }
    }

    struct DeadSdk;

    impl AdBackend for DeadSdk {
        fn initialize(&mut self) -> Result<(), NotifyError> {
            Err(NotifyError::new("ads", "sdk missing"))
        }
        fn show_banner(&mut self, _: &str) -> Result<(), NotifyError> {
            Ok(())
        }
        fn hide_banner(&mut self) -> Result<(), NotifyError> {
            Ok(())
        }
        fn prepare_interstitial(&mut self, _: &str) -> Result<(), NotifyError> {
            Ok(())
        }
        fn show_interstitial(&mut self) -> Result<(), NotifyError> {
            Ok(())
        }
    }

    #[test]
    fn test_desktop_never_touches_backend() {
        let log = CallLog::default();
        let mut gate = AdGate::new(log.clone(), None, Rc::new(Cell::new(false)));

        gate.on_session_start().unwrap();
        gate.on_session_end().unwrap();

        assert!(log.calls().is_empty());
    }

    #[test]
    fn test_native_session_cycle() {
        let log = CallLog::default();
        let mut gate = AdGate::new(
            log.clone(),
            Some(Platform::Android),
            Rc::new(Cell::new(false)),
        );

        gate.on_session_start().unwrap();
        gate.on_session_end().unwrap();
        gate.on_session_start().unwrap();

        assert_eq!(
            log.calls(),
            vec![
                "init".to_string(),
                "hide".to_string(),
                "prepare ca-app-pub-3940256099942544/1033173712".to_string(),
                "interstitial".to_string(),
                "banner ca-app-pub-3940256099942544/6300978111".to_string(),
                "hide".to_string(),
                "prepare ca-app-pub-3940256099942544/1033173712".to_string(),
            ]
        );
    }

    #[test]
    fn test_removed_flag_is_live() {
        let log = CallLog::default();
        let removed = Rc::new(Cell::new(false));
        let mut gate = AdGate::new(log.clone(), Some(Platform::Ios), removed.clone());

        gate.on_session_start().unwrap();
        removed.set(true);
        gate.on_session_end().unwrap();

        assert_eq!(log.calls().len(), 3);
    }

    #[test]
    fn test_backend_failure_is_reported() {
        let mut gate = AdGate::new(DeadSdk, Some(Platform::Ios), Rc::new(Cell::new(false)));
        let err = gate.on_session_start().unwrap_err();
        assert_eq!(err.sink, "ads");
    }

    #[test]
    fn test_unit_ids_differ_per_platform() {
        assert_ne!(
            ad_unit_id(Platform::Ios, AdKind::Banner),
            ad_unit_id(Platform::Android, AdKind::Banner)
        );
        assert!(ad_unit_id(Platform::Ios, AdKind::Interstitial).starts_with("ca-app-pub-"));
    }

    #[test]
    fn test_host_platform_is_not_native_in_tests() {
        if cfg!(not(any(target_os = "ios", target_os = "android"))) {
            assert_eq!(Platform::native(), None);
        }
    }
}
