//! Instance settings and connection strategy selection.

use dbprobe_core::{CheckError, Tags};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::debug;

/// An instance as written in `mysql_sys.yaml`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct MySqlSysInstance {
    pub server: String,
    pub user: String,
    pub port: u16,
    pub pass: String,
    pub sock: String,
    pub defaults_file: String,
    pub tags: Tags,
    pub options: BTreeMap<String, serde_json::Value>,
}

/// How to reach the server. Exactly one applies per instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectStrategy {
    DefaultsFile(PathBuf),
    UnixSocket {
        path: PathBuf,
        user: String,
        password: String,
    },
    HostPort {
        host: String,
        port: u16,
        user: String,
        password: String,
    },
    HostOnly {
        host: String,
        user: String,
        password: String,
    },
}

impl ConnectStrategy {
    /// Precedence: defaults file, then socket, then host with port, then host alone.
    pub fn select(instance: &MySqlSysInstance) -> Self {
        if !instance.defaults_file.is_empty() {
            ConnectStrategy::DefaultsFile(PathBuf::from(&instance.defaults_file))
        } else if !instance.sock.is_empty() {
            ConnectStrategy::UnixSocket {
                path: PathBuf::from(&instance.sock),
                user: instance.user.clone(),
                password: instance.pass.clone(),
            }
        } else if instance.port != 0 {
            ConnectStrategy::HostPort {
                host: instance.server.clone(),
                port: instance.port,
                user: instance.user.clone(),
                password: instance.pass.clone(),
            }
        } else {
            ConnectStrategy::HostOnly {
                host: instance.server.clone(),
                user: instance.user.clone(),
                password: instance.pass.clone(),
            }
        }
    }
}

/// Validated settings for one check run.
#[derive(Debug, Clone)]
pub struct MySqlSysConfig {
    pub host: String,
    pub strategy: ConnectStrategy,
    pub tags: Tags,
    pub options: BTreeMap<String, serde_json::Value>,
}

impl MySqlSysConfig {
    pub fn from_instance(instance: &MySqlSysInstance) -> Result<Self, CheckError> {
        if (instance.server.is_empty() || instance.user.is_empty()) && instance.defaults_file.is_empty() {
            return Err(CheckError::Configuration(
                "Mysql host and user are needed.".to_string(),
            ));
        }

        Ok(Self {
            host: instance.server.clone(),
            strategy: ConnectStrategy::select(instance),
            tags: instance.tags.clone(),
            options: instance.options.clone(),
        })
    }
}

/// Client settings read from the `[client]` group of a MySQL option file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OptionFile {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub user: Option<String>,
    pub password: Option<String>,
    pub socket: Option<String>,
}

impl OptionFile {
    pub fn read(path: &Path) -> Result<Self, CheckError> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            CheckError::Configuration(format!("Cannot read defaults file {}: {}", path.display(), e))
        })?;
        Self::parse(&text, &path.display().to_string())
    }

    /// Parse option file text. `origin` names the source in error messages.
    pub fn parse(text: &str, origin: &str) -> Result<Self, CheckError> {
        let settings = config::Config::builder()
            .add_source(config::File::from_str(&normalize(text), config::FileFormat::Ini))
            .build()
            .map_err(|e| {
                CheckError::Configuration(format!("Cannot read defaults file {}: {}", origin, e))
            })?;

        let get = |key: &str| settings.get_string(&format!("client.{}", key)).ok();

        let port = match get("port") {
            Some(raw) => Some(raw.trim().parse::<u16>().map_err(|_| {
                CheckError::Configuration(format!("Invalid port '{}' in {}", raw, origin))
            })?),
            None => None,
        };

        let options = Self {
            host: get("host"),
            port,
            user: get("user"),
            password: get("password"),
            socket: get("socket"),
        };
        debug!(
            "Read defaults file {} (host: {:?}, socket: {:?})",
            origin, options.host, options.socket
        );
        Ok(options)
    }
}

/// Rewrite MySQL option file syntax the INI parser rejects.
///
/// `!include` and `!includedir` directives are dropped and bare flags such as
/// `skip-name-resolve` become `skip-name-resolve=`.
fn normalize(text: &str) -> String {
    text.lines()
        .filter_map(|line| {
            let trimmed = line.trim();
            if trimmed.starts_with('!') {
                None
            } else if trimmed.is_empty()
                || trimmed.starts_with('#')
                || trimmed.starts_with(';')
                || trimmed.starts_with('[')
                || trimmed.contains('=')
            {
                Some(line.to_string())
            } else {
                Some(format!("{}=", trimmed))
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn instance() -> MySqlSysInstance {
        MySqlSysInstance {
            server: "db.internal".into(),
            user: "datadog".into(),
            pass: "secret".into(),
            ..Default::default()
        }
    }

    #[test]
    fn test_defaults_file_wins() {
        let inst = MySqlSysInstance {
            defaults_file: "/etc/my.cnf".into(),
            sock: "/var/run/mysqld.sock".into(),
            port: 3306,
            ..instance()
        };
        assert_eq!(
            ConnectStrategy::select(&inst),
            ConnectStrategy::DefaultsFile(PathBuf::from("/etc/my.cnf"))
        );
    }

    #[test]
    fn test_socket_before_port() {
        let inst = MySqlSysInstance {
            sock: "/var/run/mysqld.sock".into(),
            port: 3306,
            ..instance()
        };
        assert_eq!(
            ConnectStrategy::select(&inst),
            ConnectStrategy::UnixSocket {
                path: PathBuf::from("/var/run/mysqld.sock"),
                user: "datadog".into(),
                password: "secret".into(),
            }
        );
    }

    #[test]
    fn test_host_port_and_host_only() {
        let inst = MySqlSysInstance { port: 3307, ..instance() };
        assert!(matches!(
            ConnectStrategy::select(&inst),
            ConnectStrategy::HostPort { port: 3307, .. }
        ));
        assert!(matches!(
            ConnectStrategy::select(&instance()),
            ConnectStrategy::HostOnly { ref host, .. } if host == "db.internal"
        ));
    }

    #[test]
    fn test_requires_host_and_user_without_defaults_file() {
        let missing_user = MySqlSysInstance { user: String::new(), ..instance() };
        assert!(matches!(
            MySqlSysConfig::from_instance(&missing_user),
            Err(CheckError::Configuration(_))
        ));

        let missing_host = MySqlSysInstance { server: String::new(), ..instance() };
        assert!(MySqlSysConfig::from_instance(&missing_host).is_err());

        let defaults_only = MySqlSysInstance {
            defaults_file: "/etc/my.cnf".into(),
            ..Default::default()
        };
        assert!(MySqlSysConfig::from_instance(&defaults_only).is_ok());
    }

    #[test]
    fn test_instance_defaults_from_yaml() {
        let inst: MySqlSysInstance =
            serde_json::from_value(serde_json::json!({"server": "localhost", "tags": ["a:b"]})).unwrap();
        assert_eq!(inst.port, 0);
        assert_eq!(inst.user, "");
        assert_eq!(inst.tags, vec!["a:b".to_string()]);
        assert!(inst.options.is_empty());
    }

    #[test]
    fn test_read_option_file() {
        let mut file = tempfile::Builder::new().suffix(".cnf").tempfile().unwrap();
        writeln!(
            file,
            "[client]\nuser = datadog\npassword = s3cret\nhost = 10.1.2.3\nport = 3307\n\n[mysqld]\nport = 3306"
        )
        .unwrap();

        let options = OptionFile::read(file.path()).unwrap();
        assert_eq!(options.user.as_deref(), Some("datadog"));
        assert_eq!(options.password.as_deref(), Some("s3cret"));
        assert_eq!(options.host.as_deref(), Some("10.1.2.3"));
        assert_eq!(options.port, Some(3307));
        assert_eq!(options.socket, None);
    }

    #[test]
    fn test_option_file_with_bare_flags() {
        let text = "[mysqld]\nskip-name-resolve\nskip-external-locking\n\n[client]\nuser = datadog\npassword = s3cret\n";
        let options = OptionFile::parse(text, "my.cnf").unwrap();
        assert_eq!(options.user.as_deref(), Some("datadog"));
        assert_eq!(options.password.as_deref(), Some("s3cret"));
    }

    #[test]
    fn test_option_file_with_include_directives() {
        let text = "[client]\nuser = datadog\nsocket = /var/run/mysqld/mysqld.sock\n\n!include /etc/mysql/extra.cnf\n!includedir /etc/mysql/conf.d/\n";
        let options = OptionFile::parse(text, "my.cnf").unwrap();
        assert_eq!(options.user.as_deref(), Some("datadog"));
        assert_eq!(options.socket.as_deref(), Some("/var/run/mysqld/mysqld.sock"));
    }

    #[test]
    fn test_normalize() {
        assert_eq!(
            normalize("[mysqld]\n  quick\n# note\n!includedir /x\nport=1"),
            "[mysqld]\nquick=\n# note\nport=1"
        );
    }

    #[test]
    fn test_missing_option_file_is_configuration_error() {
        let err = OptionFile::read(Path::new("/nonexistent/my.cnf")).unwrap_err();
        assert!(matches!(err, CheckError::Configuration(_)));
    }
}
