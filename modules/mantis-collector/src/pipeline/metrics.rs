//! Success-rate and timing figures for the batch log lines.

use std::time::Duration;

/// `pass / total` as a percentage rounded to two decimals, e.g. `"33.33%"`.
/// Zero total reports `"0%"`.
pub fn success_rate(pass: usize, total: usize) -> String {
    if total == 0 {
        return "0%".to_string();
    }
    let percent = pass as f64 / total as f64 * 100.0;
    format!("{}%", (percent * 100.0).round() / 100.0)
}

/// Elapsed time rounded to the millisecond, and average latency per item.
pub fn compute_time(total: usize, elapsed: Duration) -> (String, String) {
    let millis = (elapsed.as_micros() + 500) / 1000;
    let duration = format_millis(millis);

    let average = if total == 0 {
        "0 ms".to_string()
    } else {
        format!("{} ms", elapsed.as_millis() / total as u128)
    };

    (duration, average)
}

/// Hours/minutes/seconds layout, e.g. `"1m1.5s"`, `"2h0m3s"`, `"250ms"`.
/// Leading zero units are dropped, trailing fraction zeros trimmed.
fn format_millis(millis: u128) -> String {
    if millis == 0 {
        return "0s".to_string();
    }
    if millis < 1000 {
        return format!("{millis}ms");
    }

    let hours = millis / 3_600_000;
    let minutes = millis / 60_000 % 60;
    let seconds = millis / 1000 % 60;
    let fraction = millis % 1000;

    let mut secs = seconds.to_string();
    if fraction > 0 {
        let digits = format!("{fraction:03}");
        secs.push('.');
        secs.push_str(digits.trim_end_matches('0'));
    }

    if hours > 0 {
        format!("{hours}h{minutes}m{secs}s")
    } else if minutes > 0 {
        format!("{minutes}m{secs}s")
    } else {
        format!("{secs}s")
    }
}
