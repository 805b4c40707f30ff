use crate::ledger::WaveEntry;

use chrono::{DateTime, Utc};

const BLANK_MESSAGE: &str = "<blank message>";

/// Date portion of a wave timestamp, e.g. `Tue Mar 01 2022`.
pub fn format_wave_date(timestamp: &DateTime<Utc>) -> String {
    timestamp.format("%a %b %d %Y").to_string()
}

/// One log entry as shown to the user.
pub fn format_wave(entry: &WaveEntry) -> String {
    let message = if entry.message.is_empty() {
        BLANK_MESSAGE
    } else {
        entry.message.as_str()
    };
    format!(
        "{}  {}\n{}",
        entry.address,
        format_wave_date(&entry.timestamp),
        message
    )
}

/// The whole log, most recent first, under a header carrying the wave count.
pub fn render_log(entries: &[WaveEntry]) -> String {
    let mut out = format!("Wave Log ({} waves)\n", entries.len());
    for entry in entries {
        out.push_str(&format_wave(entry));
        out.push_str("\n----\n");
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_message_placeholder() {
        let at = DateTime::<Utc>::from_timestamp(1_646_092_800, 0).unwrap();
        let entry = WaveEntry::new("0xA", at, "");
        assert_eq!(format_wave(&entry), "0xA  Tue Mar 01 2022\n<blank message>");
    }

    #[test]
    fn header_counts_entries() {
        let at = DateTime::<Utc>::from_timestamp(0, 0).unwrap();
        let entries = vec![WaveEntry::new("0xA", at, "hi"), WaveEntry::new("0xB", at, "yo")];
        assert!(render_log(&entries).starts_with("Wave Log (2 waves)\n"));
    }
}
