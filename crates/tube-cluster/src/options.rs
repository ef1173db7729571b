//! Cluster configuration string parsing.

/// Parsed form of the cluster content options:
/// `adminAddr,nodeAddr1,nodeAddr2,…`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClusterOptions {
    /// Address the admin control plane listens on.
    pub admin_addr: String,
    /// Initial storage node list.
    pub nodes: Vec<String>,
}

/// Errors from options parsing.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum OptionsError {
    /// The options string needs an admin address plus at least one node.
    #[error("cluster options need an admin address and at least one node, got {options:?}")]
    TooFewAddresses {
        /// The offending options string.
        options: String,
    },
}

impl ClusterOptions {
    /// Parse a comma-separated options string. The first element is the
    /// admin endpoint; the remainder is the initial node list, which must
    /// be non-empty.
    pub fn parse(options: &str) -> Result<Self, OptionsError> {
        let parts: Vec<&str> = options
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .collect();
        if parts.len() < 2 {
            return Err(OptionsError::TooFewAddresses {
                options: options.to_string(),
            });
        }
        Ok(Self {
            admin_addr: parts[0].to_string(),
            nodes: parts[1..].iter().map(|s| s.to_string()).collect(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_admin_and_nodes() {
        let opts = ClusterOptions::parse("127.0.0.1:8081,127.0.0.1:8090,127.0.0.1:8091").unwrap();
        assert_eq!(opts.admin_addr, "127.0.0.1:8081");
        assert_eq!(opts.nodes, vec!["127.0.0.1:8090", "127.0.0.1:8091"]);
    }

    #[test]
    fn test_parse_trims_whitespace() {
        let opts = ClusterOptions::parse("a:1, b:2 , c:3").unwrap();
        assert_eq!(opts.nodes, vec!["b:2", "c:3"]);
    }

    #[test]
    fn test_empty_node_list_is_an_error() {
        assert!(ClusterOptions::parse("admin:1").is_err());
        assert!(ClusterOptions::parse("").is_err());
        assert!(ClusterOptions::parse("admin:1,").is_err());
    }
}
