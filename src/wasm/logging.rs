use std::sync::Once;

static INIT: Once = Once::new();

/// Routes the `log` facade to the browser console.
///
/// Idempotent; only the first call picks the level.
pub fn init(level: log::Level) {
    INIT.call_once(|| {
        if console_log::init_with_level(level).is_err() {
            web_sys::console::warn_1(&"logger already installed".into());
            return;
        }
        log::debug!("logging initialized at {level}");
    });
}

/// Changes the level after `init`, once the page config has been read.
pub fn set_level(level: log::Level) {
    log::set_max_level(level.to_level_filter());
}
