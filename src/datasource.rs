//! Datasource policy table
//!
//! Static per-datasource configuration: which connector module to import,
//! default connection values for the sample config, and how the generated
//! client reaches the database.

use std::{fmt, str::FromStr};

use crate::error::PersistGenError;

/// Connector module used for every datasource reached through JDBC
pub const JDBC_CONNECTOR_MODULE: &str = "java.jdbc";

/// Supported datasources
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Datasource {
    MySql,
    MsSql,
    PostgreSql,
    H2,
}

impl Datasource {
    pub const ALL: [Datasource; 4] = [
        Datasource::MySql,
        Datasource::MsSql,
        Datasource::PostgreSql,
        Datasource::H2,
    ];

    /// Policy entry for this datasource.
    ///
    /// Exhaustive: a new variant without a table entry does not compile.
    pub fn policy(self) -> &'static DatasourcePolicy {
        match self {
            Datasource::MySql => &MYSQL,
            Datasource::MsSql => &MSSQL,
            Datasource::PostgreSql => &POSTGRESQL,
            Datasource::H2 => &H2,
        }
    }

    pub fn identifier(self) -> &'static str {
        self.policy().identifier
    }
}

impl FromStr for Datasource {
    type Err = PersistGenError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Datasource::ALL
            .into_iter()
            .find(|ds| ds.identifier() == s)
            .ok_or_else(|| PersistGenError::UnsupportedDatasource(s.to_string()))
    }
}

impl fmt::Display for Datasource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.identifier())
    }
}

/// How the generated client reaches the database
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    /// Native network driver taking host/port/user/database
    Direct,
    /// Generic connector taking a connection URL
    Bridged,
}

/// Default connection values written to the sample config
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionDefaults {
    Network {
        host: &'static str,
        port: u16,
        user: &'static str,
    },
    Url {
        url: &'static str,
    },
}

/// One row of the policy table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatasourcePolicy {
    pub identifier: &'static str,
    /// Module imported from the `ballerinax` org for the client type
    pub connector_module: &'static str,
    /// Driver module imported for its side effects only
    pub driver_module: &'static str,
    pub access: Access,
    pub defaults: ConnectionDefaults,
    pub custom_schema: bool,
    /// Runtime processor class backing the external query functions
    pub processor: &'static str,
    /// Constant in `persist.sql` describing the SQL dialect
    pub sql_specifics: &'static str,
}

impl DatasourcePolicy {
    pub fn is_bridged(&self) -> bool {
        self.access == Access::Bridged
    }

    /// Prefix under which the connector module is referenced, e.g. `jdbc`
    pub fn connector_prefix(&self) -> &'static str {
        self.connector_module
            .rsplit('.')
            .next()
            .unwrap_or(self.connector_module)
    }

    /// Fully qualified runtime processor class
    pub fn processor_class(&self) -> String {
        format!("io.ballerina.stdlib.persist.sql.datastore.{}", self.processor)
    }
}

static MYSQL: DatasourcePolicy = DatasourcePolicy {
    identifier: "mysql",
    connector_module: "mysql",
    driver_module: "mysql.driver",
    access: Access::Direct,
    defaults: ConnectionDefaults::Network {
        host: "localhost",
        port: 3306,
        user: "root",
    },
    custom_schema: false,
    processor: "MySQLProcessor",
    sql_specifics: "MYSQL_SPECIFICS",
};

static MSSQL: DatasourcePolicy = DatasourcePolicy {
    identifier: "mssql",
    connector_module: "mssql",
    driver_module: "mssql.driver",
    access: Access::Direct,
    defaults: ConnectionDefaults::Network {
        host: "localhost",
        port: 1433,
        user: "sa",
    },
    custom_schema: true,
    processor: "MSSQLProcessor",
    sql_specifics: "MSSQL_SPECIFICS",
};

static POSTGRESQL: DatasourcePolicy = DatasourcePolicy {
    identifier: "postgresql",
    connector_module: "postgresql",
    driver_module: "postgresql.driver",
    access: Access::Direct,
    defaults: ConnectionDefaults::Network {
        host: "localhost",
        port: 5432,
        user: "postgres",
    },
    custom_schema: true,
    processor: "PostgreSQLProcessor",
    sql_specifics: "POSTGRESQL_SPECIFICS",
};

static H2: DatasourcePolicy = DatasourcePolicy {
    identifier: "h2",
    connector_module: JDBC_CONNECTOR_MODULE,
    driver_module: "h2.driver",
    access: Access::Bridged,
    defaults: ConnectionDefaults::Url { url: "" },
    custom_schema: false,
    processor: "H2Processor",
    sql_specifics: "H2_SPECIFICS",
};
