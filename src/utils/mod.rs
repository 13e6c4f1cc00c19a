pub mod interval;
pub mod shutdown;

use std::time::Duration;

/// Formats a duration the way it shows up in log fields, e.g. `1.25s`.
pub fn secs(d: Duration) -> String {
    format!("{:.2}s", d.as_secs_f64())
}
