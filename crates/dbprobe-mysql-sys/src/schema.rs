//! Access to the `sys` schema.

use crate::config::{ConnectStrategy, OptionFile};
use dbprobe_core::CheckError;
use mysql::prelude::Queryable;
use mysql::{Conn, OptsBuilder, Row};
use tracing::debug;

/// Every session is opened with this default database.
pub const SYS_SCHEMA: &str = "sys";

pub const SERVER_VERSION_QUERY: &str = "SELECT VERSION()";
pub const SYS_VERSION_QUERY: &str = "select sys_version from version";
pub const DIGEST_95TH_PERCENTILE_QUERY: &str = "select * from x$ps_digest_95th_percentile_by_avg_us";

/// The queries the check needs from a connected server.
pub trait SysSchema {
    /// Raw `VERSION()` output.
    fn server_version(&mut self) -> Result<String, CheckError>;

    /// Number of rows in `sys.version`.
    fn sys_version_rows(&mut self) -> Result<usize, CheckError>;

    /// First column of every row of the 95th percentile view.
    fn percentile_values(&mut self) -> Result<Vec<f64>, CheckError>;
}

/// Opens a session for a connection strategy.
pub trait Connector {
    type Session: SysSchema;

    fn connect(&self, strategy: &ConnectStrategy) -> Result<Self::Session, CheckError>;
}

/// Connects with the `mysql` client crate.
#[derive(Debug, Clone, Copy, Default)]
pub struct MySqlConnector;

impl MySqlConnector {
    fn opts(strategy: &ConnectStrategy) -> Result<OptsBuilder, CheckError> {
        let builder = OptsBuilder::new().db_name(Some(SYS_SCHEMA));

        let builder = match strategy {
            ConnectStrategy::DefaultsFile(path) => {
                let file = OptionFile::read(path)?;
                let mut builder = builder
                    .user(file.user)
                    .pass(file.password)
                    .socket(file.socket);
                if let Some(host) = file.host {
                    builder = builder.ip_or_hostname(Some(host));
                }
                if let Some(port) = file.port {
                    builder = builder.tcp_port(port);
                }
                builder
            }
            ConnectStrategy::UnixSocket { path, user, password } => builder
                .socket(Some(path.to_string_lossy()))
                .user(Some(user))
                .pass(Some(password)),
            ConnectStrategy::HostPort { host, port, user, password } => builder
                .ip_or_hostname(Some(host))
                .tcp_port(*port)
                .user(Some(user))
                .pass(Some(password)),
            ConnectStrategy::HostOnly { host, user, password } => builder
                .ip_or_hostname(Some(host))
                .user(Some(user))
                .pass(Some(password)),
        };

        Ok(builder)
    }
}

impl Connector for MySqlConnector {
    type Session = Conn;

    fn connect(&self, strategy: &ConnectStrategy) -> Result<Conn, CheckError> {
        let conn = Conn::new(Self::opts(strategy)?).map_err(CheckError::database)?;
        debug!("Connected to MySQL");
        Ok(conn)
    }
}

impl SysSchema for Conn {
    fn server_version(&mut self) -> Result<String, CheckError> {
        self.query_first::<String, _>(SERVER_VERSION_QUERY)
            .map_err(CheckError::database)?
            .ok_or_else(|| CheckError::DataShape("SELECT VERSION() returned no rows".to_string()))
    }

    fn sys_version_rows(&mut self) -> Result<usize, CheckError> {
        let rows: Vec<Row> = self.query(SYS_VERSION_QUERY).map_err(CheckError::database)?;
        Ok(rows.len())
    }

    fn percentile_values(&mut self) -> Result<Vec<f64>, CheckError> {
        let rows: Vec<Row> = self
            .query(DIGEST_95TH_PERCENTILE_QUERY)
            .map_err(CheckError::database)?;

        rows.into_iter()
            .map(|row| match row.get_opt::<f64, usize>(0) {
                Some(Ok(value)) => Ok(value),
                Some(Err(e)) => Err(CheckError::DataShape(format!(
                    "x$ps_digest_95th_percentile_by_avg_us returned a non-numeric value: {}",
                    e
                ))),
                None => Err(CheckError::DataShape(
                    "x$ps_digest_95th_percentile_by_avg_us returned an empty row".to_string(),
                )),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mysql::Opts;
    use std::io::Write;
    use std::path::PathBuf;

    fn opts(strategy: &ConnectStrategy) -> Opts {
        Opts::from(MySqlConnector::opts(strategy).unwrap())
    }

    #[test]
    fn test_unix_socket_options() {
        let opts = opts(&ConnectStrategy::UnixSocket {
            path: PathBuf::from("/var/run/mysqld/mysqld.sock"),
            user: "datadog".into(),
            password: "secret".into(),
        });
        assert_eq!(opts.get_socket(), Some("/var/run/mysqld/mysqld.sock"));
        assert_eq!(&*opts.get_ip_or_hostname(), "127.0.0.1");
        assert_eq!(opts.get_user(), Some("datadog"));
        assert_eq!(opts.get_pass(), Some("secret"));
        assert_eq!(opts.get_db_name(), Some(SYS_SCHEMA));
    }

    #[test]
    fn test_host_port_options() {
        let opts = opts(&ConnectStrategy::HostPort {
            host: "db.internal".into(),
            port: 3307,
            user: "datadog".into(),
            password: "secret".into(),
        });
        assert_eq!(&*opts.get_ip_or_hostname(), "db.internal");
        assert_eq!(opts.get_tcp_port(), 3307);
        assert_eq!(opts.get_socket(), None);
        assert_eq!(opts.get_user(), Some("datadog"));
        assert_eq!(opts.get_db_name(), Some(SYS_SCHEMA));
    }

    #[test]
    fn test_host_only_keeps_default_port() {
        let opts = opts(&ConnectStrategy::HostOnly {
            host: "db.internal".into(),
            user: "datadog".into(),
            password: "secret".into(),
        });
        assert_eq!(&*opts.get_ip_or_hostname(), "db.internal");
        assert_eq!(opts.get_tcp_port(), 3306);
        assert_eq!(opts.get_socket(), None);
        assert_eq!(opts.get_db_name(), Some(SYS_SCHEMA));
    }

    #[test]
    fn test_defaults_file_options() {
        let mut file = tempfile::Builder::new().suffix(".cnf").tempfile().unwrap();
        writeln!(
            file,
            "[mysqld]\nskip-name-resolve\n\n[client]\nhost = 10.1.2.3\nport = 3308\nuser = monitor\npassword = pw\nsocket = /tmp/mysql.sock\n\n!includedir /etc/mysql/conf.d/"
        )
        .unwrap();

        let opts = opts(&ConnectStrategy::DefaultsFile(file.path().to_path_buf()));
        assert_eq!(&*opts.get_ip_or_hostname(), "10.1.2.3");
        assert_eq!(opts.get_tcp_port(), 3308);
        assert_eq!(opts.get_user(), Some("monitor"));
        assert_eq!(opts.get_pass(), Some("pw"));
        assert_eq!(opts.get_socket(), Some("/tmp/mysql.sock"));
        assert_eq!(opts.get_db_name(), Some(SYS_SCHEMA));
    }

    #[test]
    fn test_unreadable_defaults_file() {
        let strategy = ConnectStrategy::DefaultsFile(PathBuf::from("/nonexistent/my.cnf"));
        assert!(matches!(
            MySqlConnector::opts(&strategy),
            Err(CheckError::Configuration(_))
        ));
    }
}
