//! Profiling utilities based on the `puffin` crate.

use std::sync::OnceLock;

pub use puffin::{profile_function, profile_scope};

use crate::config::ProfilingMode;

/// Global profiling server instance.
static PROFILING_SERVER: OnceLock<puffin_http::Server> = OnceLock::new();

/// Initialize profiling for the requested mode.
///
/// With [`ProfilingMode::WithServer`] a `puffin_http` server is started on
/// the default port (8585) so scopes can be inspected live.
pub fn init_profiling(mode: ProfilingMode) {
    match mode {
        ProfilingMode::Off => {
            puffin::set_scopes_on(false);
        }
        ProfilingMode::On => {
            puffin::set_scopes_on(true);
        }
        ProfilingMode::WithServer => {
            puffin::set_scopes_on(true);

            match puffin_http::Server::new("0.0.0.0:8585") {
                Ok(server) => {
                    tracing::info!("puffin profiler server started on http://0.0.0.0:8585");

                    // Keep the server alive for the rest of the process.
                    let _ = PROFILING_SERVER.set(server);
                }
                Err(e) => {
                    tracing::error!("failed to start puffin server: {}", e);
                }
            }
        }
    }
}

/// Mark the start of a new frame for profiling.
///
/// Call this once per tick on the main thread so scopes are grouped by
/// frame in the viewer.
#[inline]
pub fn new_frame() {
    puffin::GlobalProfiler::lock().new_frame();
}
