/// Configuration for the Caldera engine.
#[derive(Debug)]
pub struct Config {
    /// Number of background worker threads. `None` uses the detected
    /// hardware concurrency.
    pub worker_threads: Option<usize>,
    pub profiling: ProfilingMode,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            worker_threads: None,
            profiling: ProfilingMode::Off,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProfilingMode {
    /// Profiling scopes are disabled.
    Off,
    /// Profiling scopes are recorded in-process.
    On,
    /// Profiling scopes are recorded and served over HTTP for external
    /// tools such as 'puffin_viewer'.
    WithServer,
}
