use time::{macros::format_description, OffsetDateTime, UtcOffset};

/// Source of the local wall-clock time every time-gated rule reads.
pub trait Clock: Send + Sync {
    fn now(&self) -> OffsetDateTime;
}

/// Current UTC time shifted to a fixed offset.
///
/// The offset comes from configuration instead of the OS: reading the local
/// offset is unsound once the tokio runtime has started its worker threads.
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    offset: UtcOffset,
}

impl SystemClock {
    pub fn new(offset: UtcOffset) -> Self {
        Self { offset }
    }
}

impl Clock for SystemClock {
    fn now(&self) -> OffsetDateTime {
        OffsetDateTime::now_utc().to_offset(self.offset)
    }
}

/// Always returns the same instant. Used in tests.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub OffsetDateTime);

impl Clock for FixedClock {
    fn now(&self) -> OffsetDateTime {
        self.0
    }
}

/// Parses offsets like `+05:30`, `-03:00` or `Z`.
pub fn parse_offset(raw: &str) -> anyhow::Result<UtcOffset> {
    let raw = raw.trim();
    if raw.eq_ignore_ascii_case("z") || raw.eq_ignore_ascii_case("utc") {
        return Ok(UtcOffset::UTC);
    }
    let format = format_description!("[offset_hour sign:mandatory]:[offset_minute]");
    UtcOffset::parse(raw, &format)
        .map_err(|e| anyhow::anyhow!("invalid utc offset {raw:?}: {e}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::{datetime, offset};

    #[test]
    fn parses_signed_offsets() {
        assert_eq!(parse_offset("+05:30").unwrap(), offset!(+05:30));
        assert_eq!(parse_offset("-03:00").unwrap(), offset!(-03:00));
        assert_eq!(parse_offset("Z").unwrap(), UtcOffset::UTC);
    }

    #[test]
    fn rejects_garbage_offset() {
        assert!(parse_offset("half past five").is_err());
        assert!(parse_offset("05:30").is_err());
    }

    #[test]
    fn system_clock_uses_configured_offset() {
        let clock = SystemClock::new(offset!(+05:30));
        assert_eq!(clock.now().offset(), offset!(+05:30));
    }

    #[test]
    fn fixed_clock_is_fixed() {
        let at = datetime!(2026-10-16 12:00 +05:30);
        assert_eq!(FixedClock(at).now(), at);
    }
}
