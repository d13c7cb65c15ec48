//! Log output bootstrap.
//!
//! The SDK logs through `tracing`. Clients built with a `log_level` other
//! than `off` install a global fmt subscriber for the SDK's targets; when
//! the host application already installed one, that subscriber wins.

use kinetic_config::{LogLevel, LogOutput, SdkOptions};
use tracing_subscriber::EnvFilter;

/// Filter directives for a log level, scoped to the SDK crates.
pub fn filter_directives(level: LogLevel) -> String {
    let level = level.as_directive();
    format!("kinetic_sdk={level},kinetic_config={level}")
}

/// Install a global subscriber honoring `log_level` and `log_output`.
///
/// Returns `true` if this call installed the subscriber.
pub fn init(options: &SdkOptions) -> bool {
    if options.log_level == LogLevel::Off {
        return false;
    }

    let filter = EnvFilter::new(filter_directives(options.log_level));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true);

    let installed = match options.log_output {
        LogOutput::Stdout => builder.with_writer(std::io::stdout).try_init().is_ok(),
        LogOutput::Stderr => builder.with_writer(std::io::stderr).try_init().is_ok(),
    };

    if !installed {
        tracing::debug!("A global subscriber is already installed; keeping it");
    }
    installed
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_directives() {
        assert_eq!(
            filter_directives(LogLevel::Debug),
            "kinetic_sdk=debug,kinetic_config=debug"
        );
        assert_eq!(
            filter_directives(LogLevel::Off),
            "kinetic_sdk=off,kinetic_config=off"
        );
    }

    #[test]
    fn test_off_installs_nothing() {
        assert!(!init(&SdkOptions::default()));
    }
}
