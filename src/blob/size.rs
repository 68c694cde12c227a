//! Human-readable byte counts.

/// Decimal units above plain bytes, with the number of decimals shown.
const UNITS: [(&str, u64, usize); 3] = [
    ("KB", 1_000, 0),
    ("MB", 1_000_000, 1),
    ("GB", 1_000_000_000, 1),
];

/// Render a byte count the way file managers do (1 KB = 1000 bytes).
///
/// ```
/// use snag::blob::format_size;
///
/// assert_eq!(format_size(0), "Zero bytes");
/// assert_eq!(format_size(1024), "1 KB");
/// assert_eq!(format_size(1_048_576), "1.0 MB");
/// ```
#[allow(clippy::cast_precision_loss)]
pub fn format_size(bytes: u64) -> String {
    match bytes {
        0 => return "Zero bytes".to_string(),
        1 => return "1 byte".to_string(),
        n if n < 1_000 => return format!("{n} bytes"),
        _ => {}
    }

    let mut rendered = String::new();
    for (unit, scale, decimals) in UNITS {
        let value = bytes as f64 / scale as f64;
        rendered = format!("{value:.decimals$} {unit}");
        // Rounding can push a value to 1000; roll over to the next unit.
        let shown: f64 = format!("{value:.decimals$}").parse().unwrap_or(value);
        if shown < 1_000.0 {
            break;
        }
    }
    rendered
}
