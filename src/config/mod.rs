pub mod cli;
pub mod toml_config;

#[cfg(feature = "cli")]
pub use cli_args::CliConfig;

#[cfg(feature = "cli")]
mod cli_args {
    use crate::core::query::{
        FilterParameters, Variant, APPLICATIONS_INDEX, DEFAULT_SINCE_DATE, DEFAULT_UNTIL_DATE,
    };
    use crate::core::scroll::ScrollSettings;
    use crate::core::ConfigProvider;
    use crate::utils::error::Result;
    use crate::utils::validation::{self, Validate};
    use clap::Parser;
    use serde::{Deserialize, Serialize};

    const DEFAULT_ZIP_FILENAME: &str = "applications.zip";

    fn parse_header(raw: &str) -> std::result::Result<(String, String), String> {
        let (name, value) = raw
            .split_once(':')
            .ok_or_else(|| format!("expected 'Name: value', got '{}'", raw))?;
        let name = name.trim();
        if name.is_empty() {
            return Err(format!("header name is empty in '{}'", raw));
        }
        let value = value.trim();
        validation::validate_header("header", name, value).map_err(|e| e.to_string())?;
        Ok((name.to_string(), value.to_string()))
    }

    #[derive(Debug, Clone, Serialize, Deserialize, Parser)]
    #[command(name = "planning-extract")]
    #[command(about = "Export planning applications from a search index as a flat table")]
    pub struct CliConfig {
        /// Base URL of the Elasticsearch-compatible search API
        #[arg(long, default_value = "http://localhost:9200")]
        pub endpoint: String,

        #[arg(long, default_value = APPLICATIONS_INDEX)]
        pub index: String,

        /// Which unit count the threshold applies to
        #[arg(long, value_enum, default_value_t = Variant::AllResidentialUnits)]
        pub variant: Variant,

        /// Minimum number of proposed units
        #[arg(long)]
        pub threshold: u64,

        /// Lower bound (inclusive) on valid_date; date or date-math expression
        #[arg(long, default_value = DEFAULT_SINCE_DATE)]
        pub since: String,

        /// Upper bound (exclusive) on valid_date
        #[arg(long, default_value = DEFAULT_UNTIL_DATE)]
        pub until: String,

        #[arg(long, default_value = "./output")]
        pub output_path: String,

        #[arg(long, value_delimiter = ',', default_value = "csv")]
        pub formats: Vec<String>,

        /// Bundle the outputs into applications.zip
        #[arg(long)]
        pub zip: bool,

        /// Extra request header, e.g. "Authorization: ApiKey abc=="
        #[arg(long = "header", value_parser = parse_header)]
        pub headers: Vec<(String, String)>,

        #[arg(long)]
        pub timeout_seconds: Option<u64>,

        #[arg(long, help = "Enable verbose output")]
        pub verbose: bool,

        #[arg(long, help = "Log phase timings and memory usage")]
        pub monitor: bool,
    }

    impl ConfigProvider for CliConfig {
        fn endpoint(&self) -> &str {
            &self.endpoint
        }

        fn headers(&self) -> Vec<(String, String)> {
            self.headers.clone()
        }

        fn timeout_seconds(&self) -> Option<u64> {
            self.timeout_seconds
        }

        fn variant(&self) -> Variant {
            self.variant
        }

        fn filter_parameters(&self) -> FilterParameters {
            FilterParameters::new(self.threshold)
                .since(self.since.clone())
                .until(self.until.clone())
        }

        fn scroll_settings(&self) -> ScrollSettings {
            ScrollSettings {
                index: self.index.clone(),
                ..ScrollSettings::default()
            }
        }

        fn output_path(&self) -> &str {
            &self.output_path
        }

        fn output_formats(&self) -> &[String] {
            &self.formats
        }

        fn zip_filename(&self) -> Option<&str> {
            self.zip.then_some(DEFAULT_ZIP_FILENAME)
        }
    }

    impl Validate for CliConfig {
        fn validate(&self) -> Result<()> {
            validation::validate_url("endpoint", &self.endpoint)?;
            validation::validate_non_empty_string("index", &self.index)?;
            validation::validate_path("output_path", &self.output_path)?;
            validation::validate_output_formats("formats", &self.formats)?;
            validation::validate_timeout("timeout_seconds", self.timeout_seconds)?;
            for (name, value) in &self.headers {
                validation::validate_header("header", name, value)?;
            }
            Ok(())
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;
        use crate::utils::error::EtlError;

        #[test]
        fn test_parse_minimal_args() {
            let config = CliConfig::parse_from(["planning-extract", "--threshold", "100"]);

            assert_eq!(config.endpoint, "http://localhost:9200");
            assert_eq!(config.variant, Variant::AllResidentialUnits);
            assert_eq!(config.filter_parameters(), FilterParameters::new(100));
            assert_eq!(config.scroll_settings(), ScrollSettings::default());
            assert_eq!(config.output_formats(), &["csv".to_string()]);
            assert_eq!(config.zip_filename(), None);
            assert!(config.validate().is_ok());
        }

        #[test]
        fn test_parse_full_args() {
            let config = CliConfig::parse_from([
                "planning-extract",
                "--variant",
                "social-rent-units",
                "--threshold",
                "5",
                "--since",
                "2020-01-01",
                "--until",
                "now-1M",
                "--formats",
                "csv,json",
                "--zip",
                "--header",
                "Authorization: ApiKey abc==",
            ]);

            assert_eq!(config.variant(), Variant::SocialRentUnits);
            let params = config.filter_parameters();
            assert_eq!(params.since_date, "2020-01-01");
            assert_eq!(params.until_date, "now-1M");
            assert_eq!(config.output_formats().len(), 2);
            assert_eq!(config.zip_filename(), Some("applications.zip"));
            assert_eq!(
                config.headers(),
                vec![("Authorization".to_string(), "ApiKey abc==".to_string())]
            );
        }

        #[test]
        fn test_threshold_is_required() {
            assert!(CliConfig::try_parse_from(["planning-extract"]).is_err());
        }

        #[test]
        fn test_bad_header_is_rejected() {
            assert!(CliConfig::try_parse_from([
                "planning-extract",
                "--threshold",
                "1",
                "--header",
                "no-colon"
            ])
            .is_err());
            assert!(CliConfig::try_parse_from([
                "planning-extract",
                "--threshold",
                "1",
                "--header",
                "Bad Name: x"
            ])
            .is_err());
        }

        #[test]
        fn test_zero_timeout_fails_validation() {
            let config = CliConfig::parse_from([
                "planning-extract",
                "--threshold",
                "1",
                "--timeout-seconds",
                "0",
            ]);
            assert!(matches!(
                config.validate(),
                Err(EtlError::InvalidConfigValueError { .. })
            ));
        }

        #[test]
        fn test_unknown_format_fails_validation() {
            let config = CliConfig::parse_from([
                "planning-extract",
                "--threshold",
                "1",
                "--formats",
                "xlsx",
            ]);
            assert!(config.validate().is_err());
        }
    }
}
