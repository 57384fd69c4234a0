use anyhow::{Context, Result};

use crate::api::client::FabricClient;
use crate::config::{DeployConfig, Endpoints, VarSource};
use crate::deploy::{self, RestPublisher};
use crate::logging::RunLogger;

pub async fn deploy_command(vars: &dyn VarSource) -> Result<i32> {
    let logger = RunLogger::new("fabric_deploy::deploy");
    let config = DeployConfig::from_vars(vars).context("Invalid deployment configuration")?;
    let endpoints = Endpoints::from_vars(vars);

    let client = FabricClient::new(&endpoints.api_base, &logger)?;
    let publisher = RestPublisher::new(client, &logger);

    Ok(deploy::run(&config, vars, &endpoints, &publisher, &logger).await)
}
