#[cfg(not(target_arch = "wasm32"))]
use std::{collections::HashMap, time::Instant};

#[cfg(target_arch = "wasm32")]
use web_sys::console;

/// Leveled logging for the engine. Messages at or below `level` are passed
/// on, to the `log` facade natively and to the browser console on wasm.
#[derive(Clone, Debug)]
pub struct Logger {
    /// 10 is everything and 0 is nothing
    level: u8,

    #[cfg(not(target_arch = "wasm32"))]
    start_times: HashMap<String, Instant>,
}

impl Logger {
    pub fn new(level: u8) -> Self {
        Logger {
            level,
            #[cfg(not(target_arch = "wasm32"))]
            start_times: HashMap::new(),
        }
    }

    pub fn silent() -> Self { Logger::new(0) }

    pub fn enabled(&self, level: u8) -> bool { level <= self.level }

    /// The most verbose `log` level this logger emits at, for configuring the
    /// facade's backend
    #[cfg(not(target_arch = "wasm32"))]
    pub fn max_facade_level(&self) -> log::LevelFilter {
        if self.level == 0 {
            log::LevelFilter::Off
        } else {
            facade_level(self.level).to_level_filter()
        }
    }

    pub fn log(&self, level: u8, msg: &str) {
        if self.enabled(level) {
            #[cfg(not(target_arch = "wasm32"))]
            log::log!(facade_level(level), "{}", msg);

            #[cfg(target_arch = "wasm32")]
            console::log_1(&msg.into());
        }
    }

    pub fn log_lazy(&self, level: u8, msg: impl FnOnce() -> String) {
        if self.enabled(level) {
            self.log(level, &msg());
        }
    }

    /// Something went wrong but the engine recovered. Always reported when
    /// logging is on at all.
    pub fn warn(&self, msg: &str) {
        if self.level > 0 {
            #[cfg(not(target_arch = "wasm32"))]
            log::warn!("{}", msg);

            #[cfg(target_arch = "wasm32")]
            console::warn_1(&msg.into());
        }
    }

    pub fn time_start(&mut self, _level: u8, name: &str) {
        #[cfg(not(target_arch = "wasm32"))]
        self.start_times.insert(name.to_string(), Instant::now());

        #[cfg(target_arch = "wasm32")]
        if _level <= self.level {
            console::time_with_label(name);
        }
    }

    pub fn time_end(&mut self, level: u8, name: &str) {
        #[cfg(not(target_arch = "wasm32"))]
        match self.start_times.remove(name) {
            Some(start) => {
                let elapsed = start.elapsed();
                self.log(
                    level,
                    &format!("{}: {}.{:03}s", name, elapsed.as_secs(), elapsed.subsec_millis()),
                );
            }
            None => self.warn(&format!("timer `{}` was never started", name)),
        }

        #[cfg(target_arch = "wasm32")]
        if level <= self.level {
            console::time_end_with_label(name);
        }
    }
}

impl Default for Logger {
    fn default() -> Self { Logger::new(2) }
}

#[cfg(not(target_arch = "wasm32"))]
fn facade_level(level: u8) -> log::Level {
    match level {
        0..=2 => log::Level::Info,
        3..=5 => log::Level::Debug,
        _ => log::Level::Trace,
    }
}
