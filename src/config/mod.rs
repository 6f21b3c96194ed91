pub mod cli;
pub mod session;
pub mod toml_config;

pub use cli::LocalStorage;
pub use session::{FileSessionStore, MemorySessionStore};
pub use toml_config::{ApiConfig, ClientConfig, SessionConfig, TrackingConfig, DEFAULT_API_URL};

#[cfg(feature = "cli")]
pub use command_line::*;

#[cfg(feature = "cli")]
mod command_line {
    use super::ClientConfig;
    use crate::utils::error::Result;
    use crate::utils::validation::{self, Validate};
    use clap::{Args, Parser, Subcommand};
    use uuid::Uuid;

    #[derive(Debug, Clone, Parser)]
    #[command(name = "marinex")]
    #[command(about = "Boat management client: fleet records, tasks, works and the navigation logbook")]
    pub struct CliConfig {
        #[arg(long, global = true, default_value = "marinex.toml")]
        pub config: String,

        #[arg(long, global = true, env = "MARINEX_API_URL", help = "Override api.base_url")]
        pub api_url: Option<String>,

        #[arg(long, global = true, help = "Override session.path")]
        pub session_file: Option<String>,

        #[arg(long, global = true, default_value = "./output")]
        pub output_path: String,

        #[arg(long, global = true, help = "Enable verbose output")]
        pub verbose: bool,

        #[arg(long, global = true, help = "Emit logs as JSON")]
        pub log_json: bool,

        #[command(subcommand)]
        pub command: Command,
    }

    impl CliConfig {
        /// 讀取 TOML 設定並套用命令列覆寫
        pub fn client_config(&self) -> Result<ClientConfig> {
            let mut config = ClientConfig::load_or_default(&self.config)?;
            if let Some(url) = &self.api_url {
                config.api.base_url = url.clone();
            }
            if let Some(path) = &self.session_file {
                config.session.path = path.clone();
            }
            config.validate()?;
            Ok(config)
        }
    }

    impl Validate for CliConfig {
        fn validate(&self) -> Result<()> {
            validation::validate_path("config", &self.config)?;
            validation::validate_path("output_path", &self.output_path)?;
            if let Some(url) = &self.api_url {
                validation::validate_url("api_url", url)?;
            }
            if let Some(path) = &self.session_file {
                validation::validate_path("session_file", path)?;
            }
            Ok(())
        }
    }

    #[derive(Debug, Clone, Subcommand)]
    pub enum Command {
        /// Log in and store the session
        Login {
            #[arg(long)]
            username: String,
            #[arg(long, env = "MARINEX_PASSWORD")]
            password: String,
        },
        /// Forget the stored session
        Logout,
        /// Show the logged in user
        Whoami,
        /// Create a new account
        Register(RegisterArgs),
        #[command(subcommand)]
        Boats(BoatCommand),
        #[command(subcommand)]
        Documents(DocumentCommand),
        /// List the tasks of a boat
        Tasks { boat: Uuid },
        /// List the works of a boat
        Works { boat: Uuid },
        /// Search service companies
        Companies {
            #[arg(long)]
            search: Option<String>,
        },
        /// KPI summary and calendar of a boat
        Dashboard { boat: Uuid },
        #[command(subcommand)]
        Routes(RouteCommand),
        /// Replay a JSON file of GPS fixes through the recorder and save the route
        Record(RecordArgs),
        /// Play a saved route and print its frames
        Replay {
            boat: Uuid,
            route: Uuid,
            #[arg(long, help = "Cursor advance per frame")]
            step: Option<f64>,
        },
    }

    #[derive(Debug, Clone, Args)]
    pub struct RegisterArgs {
        #[arg(long)]
        pub username: String,
        #[arg(long, env = "MARINEX_PASSWORD")]
        pub password: String,
        #[arg(long)]
        pub email: String,
        #[arg(long)]
        pub account_name: String,
        #[arg(long, default_value = "")]
        pub first_name: String,
        #[arg(long, default_value = "")]
        pub last_name: String,
    }

    #[derive(Debug, Clone, Subcommand)]
    pub enum BoatCommand {
        List,
        Show { boat: Uuid },
    }

    #[derive(Debug, Clone, Subcommand)]
    pub enum DocumentCommand {
        List { boat: Uuid },
        /// Send a file to the AI document analysis
        Analyze { file: String },
    }

    #[derive(Debug, Clone, Subcommand)]
    pub enum RouteCommand {
        List {
            boat: Uuid,
            #[arg(long, help = "Only routes started on this day (YYYY-MM-DD)")]
            date: Option<String>,
        },
        Export {
            boat: Uuid,
            route: Uuid,
            #[arg(long, default_value = "gpx", help = "gpx, kml, csv or zip")]
            format: String,
            #[arg(long, help = "Download the server side GPX/KML instead")]
            server: bool,
        },
    }

    #[derive(Debug, Clone, Args)]
    pub struct RecordArgs {
        pub boat: Uuid,
        /// JSON array of fixes (`lat`, `lng`, optional `speed`)
        pub fixes: String,
        #[arg(long, default_value = "")]
        pub name: String,
        #[arg(long, help = "Milliseconds between replayed fixes")]
        pub interval_ms: Option<u64>,
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn test_parse_routes_export() {
            let cli = CliConfig::try_parse_from([
                "marinex",
                "--api-url",
                "http://localhost:8000/api/",
                "routes",
                "export",
                "6f1c2b2e-4c8e-4b8a-9d57-0f6f1b6f0a01",
                "6f1c2b2e-4c8e-4b8a-9d57-0f6f1b6f0a02",
                "--format",
                "zip",
            ])
            .unwrap();
            assert!(cli.validate().is_ok());
            match cli.command {
                Command::Routes(RouteCommand::Export { format, server, .. }) => {
                    assert_eq!(format, "zip");
                    assert!(!server);
                }
                other => panic!("unexpected command {:?}", other),
            }
        }

        #[test]
        fn test_overrides_apply_to_client_config() {
            let cli = CliConfig::try_parse_from([
                "marinex",
                "--config",
                "/nonexistent/marinex.toml",
                "--api-url",
                "https://marinex.example/api/",
                "--session-file",
                "/tmp/marinex-session.json",
                "whoami",
            ])
            .unwrap();
            let config = cli.client_config().unwrap();
            assert_eq!(config.api.base_url, "https://marinex.example/api/");
            assert_eq!(config.session.path, "/tmp/marinex-session.json");
        }

        #[test]
        fn test_rejects_bad_api_url() {
            let cli = CliConfig::try_parse_from(["marinex", "--api-url", "ftp://x", "logout"]).unwrap();
            assert!(cli.validate().is_err());
        }
    }
}
