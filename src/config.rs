use serde::Deserialize;

/// Main configuration for the detection service
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Service configuration
    #[serde(default)]
    pub service: ServiceConfig,
    /// AWS client configuration
    #[serde(default)]
    pub aws: AwsConfig,
    /// Label classification configuration
    #[serde(default)]
    pub detection: DetectionConfig,
    /// Metadata store configuration
    pub metadata: MetadataConfig,
    /// Alert notification configuration
    #[serde(default)]
    pub notification: NotificationConfig,
    /// Batch metrics configuration
    #[serde(default)]
    pub metrics: MetricsConfig,
    /// API configuration for the invocation endpoint
    #[serde(default)]
    pub api: ApiConfig,
}

/// Service-level configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ServiceConfig {
    /// Service name for logging/metrics
    #[serde(default = "default_service_name")]
    pub name: String,
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Prometheus metrics port
    #[serde(default = "default_metrics_port")]
    pub metrics_port: u16,
}

/// AWS client configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AwsConfig {
    /// AWS region
    #[serde(default = "default_region")]
    pub region: String,
    /// Custom endpoint URL (for LocalStack)
    pub endpoint_url: Option<String>,
}

/// Label classification configuration
#[derive(Debug, Clone, Deserialize)]
pub struct DetectionConfig {
    /// Maximum candidate labels requested from the oracle
    #[serde(default = "default_max_labels")]
    pub max_labels: i32,
    /// Minimum confidence threshold, 0-100
    #[serde(default = "default_min_confidence")]
    pub min_confidence: f32,
}

/// Metadata store configuration
#[derive(Debug, Clone, Deserialize)]
pub struct MetadataConfig {
    /// Destination table name. Required: absence is a fatal startup error.
    pub table_name: String,
}

/// Alert notification configuration
#[derive(Debug, Clone, Deserialize)]
pub struct NotificationConfig {
    /// Notification topic ARN. May be empty, in which case publishes fail and
    /// are logged; a lost notification is non-fatal.
    #[serde(default)]
    pub topic_arn: String,
}

/// Batch metrics configuration
#[derive(Debug, Clone, Deserialize)]
pub struct MetricsConfig {
    /// Metric namespace for batch counters
    #[serde(default = "default_namespace")]
    pub namespace: String,
}

/// API configuration for the invocation endpoint
#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    /// API listen address
    #[serde(default = "default_api_host")]
    pub host: String,
    /// API listen port
    #[serde(default = "default_api_port")]
    pub port: u16,
}

// Default value functions
fn default_service_name() -> String {
    "detection-service".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_metrics_port() -> u16 {
    9090
}

fn default_region() -> String {
    "us-east-1".to_string()
}

fn default_max_labels() -> i32 {
    50
}

fn default_min_confidence() -> f32 {
    70.0
}

fn default_namespace() -> String {
    "PlantDetection".to_string()
}

fn default_api_host() -> String {
    "0.0.0.0".to_string()
}

fn default_api_port() -> u16 {
    8080
}

impl Config {
    /// Load configuration from environment and config files
    pub fn load() -> anyhow::Result<Self> {
        let config = config::Config::builder()
            // Start with default values
            .set_default("service.name", "detection-service")?
            .set_default("service.log_level", "info")?
            .set_default("service.metrics_port", 9090)?
            // Add config file if present
            .add_source(config::File::with_name("config/detection").required(false))
            .add_source(
                config::File::with_name("/etc/detection-service/detection").required(false),
            )
            // Override with environment variables
            // DETECTION__METADATA__TABLE_NAME -> metadata.table_name
            .add_source(
                config::Environment::with_prefix("DETECTION")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize().map_err(Into::into)
    }
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            name: default_service_name(),
            log_level: default_log_level(),
            metrics_port: default_metrics_port(),
        }
    }
}

impl Default for AwsConfig {
    fn default() -> Self {
        Self {
            region: default_region(),
            endpoint_url: None,
        }
    }
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            max_labels: default_max_labels(),
            min_confidence: default_min_confidence(),
        }
    }
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            topic_arn: String::new(),
        }
    }
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            namespace: default_namespace(),
        }
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: default_api_host(),
            port: default_api_port(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_values() {
        assert_eq!(default_max_labels(), 50);
        assert_eq!(default_min_confidence(), 70.0);
        assert_eq!(default_region(), "us-east-1");
        assert_eq!(default_namespace(), "PlantDetection");
    }

    #[test]
    fn test_table_name_is_required() {
        // No metadata.table_name anywhere: deserialization must fail before
        // any processing could start.
        let source = config::Config::builder().build().unwrap();
        assert!(source.try_deserialize::<Config>().is_err());
    }

    #[test]
    fn test_minimal_config_deserializes() {
        let source = config::Config::builder()
            .set_override("metadata.table_name", "frames")
            .unwrap()
            .build()
            .unwrap();

        let config: Config = source.try_deserialize().unwrap();
        assert_eq!(config.metadata.table_name, "frames");
        assert_eq!(config.detection.max_labels, 50);
        assert_eq!(config.api.port, 8080);
        assert!(config.notification.topic_arn.is_empty());
    }
}
