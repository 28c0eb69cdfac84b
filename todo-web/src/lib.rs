pub mod config {
    use clap::Parser;
    use serde::Deserialize;
    use std::path::PathBuf;

    /// Command-line flags. Anything given here beats the environment.
    #[derive(Parser, Debug, Default)]
    #[command(name = "todo-web", about = "To-Do Web App")]
    pub struct Args {
        /// Path to JSON db file
        #[arg(long)]
        pub db: Option<PathBuf>,
        /// Host to bind
        #[arg(long)]
        pub host: Option<String>,
        /// Port to bind
        #[arg(long)]
        pub port: Option<u16>,
        /// Enable debug logging
        #[arg(long)]
        pub debug: bool,
    }

    #[derive(Deserialize, Debug, Clone, PartialEq)]
    pub struct Config {
        #[serde(default)]
        pub db_path: Option<PathBuf>,
        #[serde(default = "default_host")]
        pub host: String,
        #[serde(default = "default_port")]
        pub port: u16,
        #[serde(default)]
        pub debug: bool,
    }

    impl Config {
        /// Loads configuration from `TODO_*` environment variables, then
        /// applies the command-line flags on top.
        pub fn load(args: &Args) -> anyhow::Result<Self> {
            Self::from_sources(
                config::Environment::with_prefix("TODO").try_parsing(true),
                args,
            )
        }

        fn from_sources(environment: config::Environment, args: &Args) -> anyhow::Result<Self> {
            let settings = config::Config::builder()
                .add_source(environment)
                .set_override_option(
                    "db_path",
                    args.db.as_ref().map(|path| path.to_string_lossy().into_owned()),
                )?
                .set_override_option("host", args.host.clone())?
                .set_override_option("port", args.port.map(i64::from))?
                .set_override_option("debug", args.debug.then_some(true))?
                .build()?;

            let config: Config = settings.try_deserialize()?;
            Ok(config)
        }

        /// The `host:port` pair the server listens on.
        pub fn address(&self) -> String {
            format!("{}:{}", self.host, self.port)
        }
    }

    fn default_host() -> String {
        "127.0.0.1".to_string()
    }

    fn default_port() -> u16 {
        8000
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        fn environment(vars: &[(&str, &str)]) -> config::Environment {
            let source = vars
                .iter()
                .map(|(key, value)| (key.to_string(), value.to_string()))
                .collect::<config::Map<String, String>>();
            config::Environment::with_prefix("TODO")
                .try_parsing(true)
                .source(Some(source))
        }

        #[test]
        fn uses_defaults_without_environment_or_flags() {
            let config = Config::from_sources(environment(&[]), &Args::default()).unwrap();

            assert_eq!(
                config,
                Config {
                    db_path: None,
                    host: "127.0.0.1".to_string(),
                    port: 8000,
                    debug: false,
                }
            );
            assert_eq!(config.address(), "127.0.0.1:8000");
        }

        #[test]
        fn reads_environment_variables() {
            let env = environment(&[
                ("TODO_DB_PATH", "/tmp/env.json"),
                ("TODO_HOST", "0.0.0.0"),
                ("TODO_PORT", "9000"),
                ("TODO_DEBUG", "true"),
            ]);

            let config = Config::from_sources(env, &Args::default()).unwrap();

            assert_eq!(config.db_path, Some(PathBuf::from("/tmp/env.json")));
            assert_eq!(config.host, "0.0.0.0");
            assert_eq!(config.port, 9000);
            assert!(config.debug);
        }

        #[test]
        fn flags_override_environment() {
            let env = environment(&[("TODO_DB_PATH", "/tmp/env.json"), ("TODO_PORT", "9000")]);
            let args = Args::parse_from([
                "todo-web",
                "--db",
                "/tmp/flag.json",
                "--port",
                "8123",
                "--host",
                "localhost",
            ]);

            let config = Config::from_sources(env, &args).unwrap();

            assert_eq!(config.db_path, Some(PathBuf::from("/tmp/flag.json")));
            assert_eq!(config.port, 8123);
            assert_eq!(config.host, "localhost");
            assert!(!config.debug);
        }

        #[test]
        fn debug_flag_enables_debug() {
            let args = Args::parse_from(["todo-web", "--debug"]);

            let config = Config::from_sources(environment(&[]), &args).unwrap();

            assert!(config.debug);
        }
    }
}

pub mod web;
