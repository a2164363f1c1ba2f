use crate::chain::{parse_chain_id, SupportedChains};
use log::warn;

/// Build time settings, read from the environment trunk/cargo was run in
#[derive(Clone, Debug, PartialEq)]
pub struct AppConfig {
    pub name: String,
    pub description: String,
    pub url: String,
    pub wc_project_id: Option<String>,
    pub chains: SupportedChains,
    pub default_chain_id: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self::from_values(
            std::option_env!("PROJECT_ID"),
            std::option_env!("RPC_URL"),
            std::option_env!("DEFAULT_CHAIN_ID"),
            std::option_env!("APP_URL"),
        )
    }
}

impl AppConfig {
    pub fn from_values(
        project_id: Option<&str>,
        rpc_url: Option<&str>,
        default_chain_id: Option<&str>,
        app_url: Option<&str>,
    ) -> Self {
        let mut chains = SupportedChains::default();
        let fallback = chains.first().map(|c| c.id).unwrap_or(1);

        let default_chain_id = match default_chain_id.map(parse_chain_id) {
            Some(Ok(id)) if chains.contains(id) => id,
            Some(_) => {
                warn!("DEFAULT_CHAIN_ID is not a supported chain, using {fallback}");
                fallback
            }
            None => fallback,
        };

        if let Some(rpc_url) = rpc_url.filter(|u| !u.is_empty()) {
            match chains.clone().with_rpc_override(default_chain_id, rpc_url) {
                Ok(c) => chains = c,
                Err(err) => warn!("Ignoring RPC_URL: {err}"),
            }
        }

        Self {
            name: "DAPP Boilerplate".to_string(),
            description: "Connect a wallet and approve ERC-20 allowances".to_string(),
            url: app_url.unwrap_or("http://localhost").to_string(),
            wc_project_id: project_id.filter(|p| !p.is_empty()).map(str::to_string),
            chains,
            default_chain_id,
        }
    }
}
