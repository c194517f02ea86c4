use std::time::Duration;

const SIZE_UNITS: [&str; 4] = ["Bytes", "KB", "MB", "GB"];

/// Format a byte count with 1024-based units, truncated to two decimals.
///
/// Trailing zeros are dropped: `1536` -> `1.5 KB`, `1048576` -> `1 MB`.
pub fn format_file_size(bytes: u64) -> String {
    let mut unit = 0;
    let mut scale: u128 = 1;
    while unit + 1 < SIZE_UNITS.len() && u128::from(bytes) >= scale * 1024 {
        scale *= 1024;
        unit += 1;
    }

    let hundredths = u128::from(bytes) * 100 / scale;
    let whole = hundredths / 100;
    let frac = hundredths % 100;

    let number = if frac == 0 {
        whole.to_string()
    } else if frac % 10 == 0 {
        format!("{}.{}", whole, frac / 10)
    } else {
        format!("{}.{:02}", whole, frac)
    };

    format!("{} {}", number, SIZE_UNITS[unit])
}

/// Format an elapsed duration as `4.2s` or `3m 12s`
pub fn format_duration(d: Duration) -> String {
    let secs = d.as_secs_f64();
    if secs < 60.0 {
        format!("{:.1}s", secs)
    } else {
        format!("{}m {}s", d.as_secs() / 60, d.as_secs() % 60)
    }
}
