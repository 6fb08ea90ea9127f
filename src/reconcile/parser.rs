//! Status dump line parsing.
//!
//! A proxy instance's status dump carries one line per backend. Fields are
//! whitespace-delimited; the first field is the backend's internal name token
//! (underscore-delimited, optionally suffixed with a parenthesized address),
//! and the second-from-last field is the status label.

use crate::fleet::BackendId;

/// Minimum number of underscore segments for a name token to qualify as a
/// fleet-managed backend. Shorter names belong to hand-written VCL and are
/// ignored.
const MIN_NAME_SEGMENTS: usize = 6;

/// One parsed status line. Transient; never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawStatusLine {
    /// Instance-local numeric backend id extracted from the name token.
    pub backend_id: BackendId,
    /// Status label (e.g. `Healthy`, `Sick`).
    pub status: String,
}

/// Parse one line of a status dump.
///
/// Returns `None` for lines that do not match the fleet naming pattern or
/// whose id segment is not numeric; such lines are skipped, never errors.
pub fn parse_status_line(line: &str) -> Option<RawStatusLine> {
    let fields: Vec<&str> = line.split_whitespace().collect();
    if fields.len() < 2 {
        return None;
    }

    // admin dumps may append "(addr,...,port)" to the name token
    let name = fields[0].split('(').next().unwrap_or_default();
    let segments: Vec<&str> = name.split('_').collect();
    if segments.len() < MIN_NAME_SEGMENTS {
        return None;
    }

    let status = fields[fields.len() - 2];

    // Two naming generations coexist in a fleet: names that embed the backend
    // address carry the id five segments from the end, compact names carry it
    // second from the end. The first numeric candidate wins.
    for idx in [segments.len() - 5, segments.len() - 2] {
        if let Ok(id) = segments[idx].parse::<u64>() {
            return Some(RawStatusLine {
                backend_id: BackendId(id),
                status: status.to_string(),
            });
        }
    }

    tracing::error!(
        name = %name,
        "mapping backend id failed, expected a numeric name segment"
    );
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parses_compact_name() {
        let line = "bk_svc_prod_abc_42_webserver .  . . Sick .";
        let parsed = parse_status_line(line).unwrap();
        assert_eq!(parsed.backend_id, BackendId(42));
        assert_eq!(parsed.status, "Sick");
    }

    #[test]
    fn test_parses_address_embedding_name() {
        let line = "first_service_4_127_0_1_1 10 probe Healthy 4/4";
        let parsed = parse_status_line(line).unwrap();
        assert_eq!(parsed.backend_id, BackendId(4));
        assert_eq!(parsed.status, "Healthy");
    }

    #[test]
    fn test_strips_parenthesized_address_suffix() {
        let line = "bk_svc_prod_abc_42_webserver(10.0.0.5,,8080) 10 probe Healthy 4/4";
        let parsed = parse_status_line(line).unwrap();
        assert_eq!(parsed.backend_id, BackendId(42));
        assert_eq!(parsed.status, "Healthy");
    }

    #[test]
    fn test_non_numeric_id_segment_is_skipped() {
        assert!(parse_status_line("bk_svc_prod_abc_x_webserver . . Sick .").is_none());
    }

    #[test]
    fn test_short_names_do_not_match() {
        assert!(parse_status_line("boot.default 10 probe Healthy 4/4").is_none());
        assert!(parse_status_line("a_b 10 probe Healthy 4/4").is_none());
    }

    #[test]
    fn test_blank_and_header_lines_are_ignored() {
        assert!(parse_status_line("").is_none());
        assert!(parse_status_line("   ").is_none());
        assert!(parse_status_line("Backend").is_none());
    }
}
