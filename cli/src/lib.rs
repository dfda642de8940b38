pub mod commands;
pub mod report;

/// The filter level of the logger for `-v` repeated `verbose` times.
pub fn log_level(verbose: usize) -> &'static str {
    match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    }
}

#[cfg(test)]
mod tests {
    #[test]
    fn levels() {
        assert_eq!(super::log_level(0), "warn");
        assert_eq!(super::log_level(1), "info");
        assert_eq!(super::log_level(2), "debug");
        assert_eq!(super::log_level(5), "trace");
    }
}
