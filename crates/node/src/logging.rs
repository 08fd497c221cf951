use oru_common::logging::{self, LoggerConfig, LoggingError};
use oru_config::LoggingConfig;
use tracing::*;

const SERVICE_BASE_NAME: &str = "oru-node";

/// Sets up logging from config, falling back to the environment for unset
/// fields. Must run inside a tokio runtime if an OTLP endpoint is set.
pub fn init_logging(config: &LoggingConfig) -> Result<(), LoggingError> {
    let whoami = match &config.service_label {
        Some(label) => format!("{SERVICE_BASE_NAME}%{label}"),
        None => logging::get_whoami_string(SERVICE_BASE_NAME),
    };
    let mut lconfig = LoggerConfig::new(whoami);

    let otlp_url = config
        .otlp_url
        .clone()
        .or_else(logging::get_otlp_url_from_env);
    if let Some(url) = &otlp_url {
        lconfig.set_otlp_url(url.clone());
    }

    logging::init(lconfig)?;

    // Only visible once the subscriber is installed.
    if let Some(url) = &otlp_url {
        info!(%url, "using OpenTelemetry tracing output");
    }
    Ok(())
}
