use clap::Parser;

/// Read the UPS Plus power monitors and register block, then print and/or publish them
#[derive(Debug, Parser)]
#[command(name = "upsplus-exporter", version)]
pub struct Cli {
    /// Print data to stdout
    #[arg(short = 'r', long = "raw")]
    pub raw: bool,

    /// Publish to InfluxDB
    #[arg(long = "influxdb")]
    pub influxdb: bool,

    /// Hostname or IP of the InfluxDB HTTP API
    #[arg(long = "influxdb_host", default_value = "localhost")]
    pub influxdb_host: String,

    /// Port of the InfluxDB HTTP API
    #[arg(long = "influxdb_port", default_value_t = 8086)]
    pub influxdb_port: u16,

    /// InfluxDB username
    #[arg(long = "influxdb_user")]
    pub influxdb_user: Option<String>,

    /// InfluxDB password
    #[arg(long = "influxdb_pass")]
    pub influxdb_pass: Option<String>,

    /// InfluxDB database name
    #[arg(long = "influxdb_db", default_value = "upsplus")]
    pub influxdb_db: String,

    /// Log every publish action
    #[arg(short = 'v', long = "verbose")]
    pub verbose: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InfluxConfig {
    pub host: String,
    pub port: u16,
    pub user: Option<String>,
    pub password: Option<String>,
    pub database: String,
}

/// Settings for one exporter run, handed to each component explicitly
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExporterConfig {
    pub raw: bool,
    pub verbose: bool,
    /// Present only when publishing is enabled
    pub influx: Option<InfluxConfig>,
}

impl From<Cli> for ExporterConfig {
    fn from(cli: Cli) -> Self {
        let influx = cli.influxdb.then(|| InfluxConfig {
            host: cli.influxdb_host,
            port: cli.influxdb_port,
            user: cli.influxdb_user,
            password: cli.influxdb_pass,
            database: cli.influxdb_db,
        });

        ExporterConfig {
            raw: cli.raw,
            verbose: cli.verbose,
            influx,
        }
    }
}

impl ExporterConfig {
    pub fn from_args() -> Self {
        Cli::parse().into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> ExporterConfig {
        let argv = std::iter::once("upsplus-exporter").chain(args.iter().copied());
        Cli::try_parse_from(argv).unwrap().into()
    }

    #[test]
    fn test_defaults() {
        let config = parse(&[]);
        assert!(!config.raw);
        assert!(!config.verbose);
        assert_eq!(config.influx, None);
    }

    #[test]
    fn test_influxdb_defaults() {
        let config = parse(&["--influxdb"]);
        assert_eq!(
            config.influx,
            Some(InfluxConfig {
                host: "localhost".to_string(),
                port: 8086,
                user: None,
                password: None,
                database: "upsplus".to_string(),
            })
        );
    }

    #[test]
    fn test_all_flags() {
        let config = parse(&[
            "-r",
            "-v",
            "--influxdb",
            "--influxdb_host",
            "10.0.0.5",
            "--influxdb_port",
            "8087",
            "--influxdb_user",
            "ups",
            "--influxdb_pass",
            "secret",
            "--influxdb_db",
            "power",
        ]);
        assert!(config.raw);
        assert!(config.verbose);
        let influx = config.influx.unwrap();
        assert_eq!(influx.host, "10.0.0.5");
        assert_eq!(influx.port, 8087);
        assert_eq!(influx.user.as_deref(), Some("ups"));
        assert_eq!(influx.password.as_deref(), Some("secret"));
        assert_eq!(influx.database, "power");
    }

    #[test]
    fn test_influx_settings_ignored_without_flag() {
        let config = parse(&["--influxdb_host", "db.local"]);
        assert_eq!(config.influx, None);
    }

    #[test]
    fn test_rejects_non_numeric_port() {
        let argv = ["upsplus-exporter", "--influxdb_port", "eighty"];
        assert!(Cli::try_parse_from(argv).is_err());
    }

    #[test]
    fn test_rejects_positional_arguments() {
        assert!(Cli::try_parse_from(["upsplus-exporter", "extra"]).is_err());
    }
}
