use std::any::Any;
use std::panic::PanicHookInfo;
use tracing_subscriber::EnvFilter;

/// Store chatter stays quiet unless asked for; diagnostics are printed
/// separately by the command runner.
fn default_directives(verbose: bool) -> &'static str {
    if verbose {
        "info,cfgvault_core=debug,cfgvault_cli=debug"
    } else {
        "warn"
    }
}

/// `RUST_LOG` wins over `--verbose`.
pub fn init_tracing(verbose: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directives(verbose)));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(verbose)
        .without_time()
        .compact()
        .try_init();
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("<non-string panic payload>")
}

fn report_panic(info: &PanicHookInfo<'_>) {
    let message = panic_message(info.payload());
    match info.location() {
        Some(at) => tracing::error!(file = at.file(), line = at.line(), "cfgvault panicked: {}", message),
        None => tracing::error!("cfgvault panicked: {}", message),
    }
}

pub fn install_panic_hook() {
    std::panic::set_hook(Box::new(report_panic));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verbose_enables_store_debug() {
        assert!(default_directives(true).contains("cfgvault_core=debug"));
        assert_eq!(default_directives(false), "warn");
    }

    #[test]
    fn test_panic_message_reads_both_payload_kinds() {
        let literal: Box<dyn Any + Send> = Box::new("boom");
        let owned: Box<dyn Any + Send> = Box::new(String::from("owned boom"));
        let other: Box<dyn Any + Send> = Box::new(7u8);

        assert_eq!(panic_message(literal.as_ref()), "boom");
        assert_eq!(panic_message(owned.as_ref()), "owned boom");
        assert_eq!(panic_message(other.as_ref()), "<non-string panic payload>");
    }
}
