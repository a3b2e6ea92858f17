//! Well-known file locations inside a peer-pod VM
//!
//! The agent, its helpers and the provisioning user data all agree on these
//! paths. They are data only.

/// Attestation agent configuration
pub const AA_CONFIG_PATH: &str = "/run/peerpod/aa.toml";
/// Registry credentials
pub const AUTH_FILE_PATH: &str = "/run/peerpod/auth.json";
/// Confidential data hub configuration
pub const CDH_CONFIG_PATH: &str = "/run/peerpod/cdh.toml";
pub const INIT_DATA_PATH: &str = "/run/peerpod/initdata";
pub const AGENT_CONFIG_PATH: &str = "/run/peerpod/agent-config.toml";
/// Agent protocol forwarder configuration
pub const FORWARDER_CONFIG_PATH: &str = "/run/peerpod/daemon.json";
/// User data handed over by the docker provider
pub const DOCKER_USER_DATA_PATH: &str = "/run/peerpod/userdata";
/// cloud-init NoCloud user data
pub const USER_DATA_PATH: &str = "/run/media/cidata/user-data";
