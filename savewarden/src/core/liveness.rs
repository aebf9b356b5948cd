//! Normalization of raw process-query output into a liveness flag.

/// Markers that process listers print when nothing matched.
const NOT_FOUND_MARKERS: &[&str] = &["INFO:", "No tasks are running"];

/// Interpret raw process-query output.
///
/// Empty output and "not found" style responses mean the process is not
/// running; any other non-empty output is treated as a match.
pub fn is_alive(raw: &str) -> bool {
    let mut lines = raw.lines().map(str::trim).filter(|line| !line.is_empty());
    let Some(first) = lines.next() else {
        return false;
    };
    !NOT_FOUND_MARKERS
        .iter()
        .any(|marker| first.starts_with(marker))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_output_is_not_running() {
        assert!(!is_alive(""));
        assert!(!is_alive("  \n\r\n"));
    }

    #[test]
    fn tasklist_not_found_message_is_not_running() {
        assert!(!is_alive(
            "INFO: No tasks are running which match the specified criteria.\r\n"
        ));
    }

    #[test]
    fn pgrep_pid_is_running() {
        assert!(is_alive("4242\n"));
    }

    #[test]
    fn tasklist_row_is_running() {
        assert!(is_alive(
            "\r\ngame.exe                     9120 Console                    1    812,344 K\r\n"
        ));
    }
}
