use portainer_deploy_api::PortainerClient;
use portainer_deploy_core::DeployConfig;
use std::path::PathBuf;

use crate::args::InvocationArgs;
use crate::{output, prompt};

/// Execute the full deploy pipeline from the current directory.
pub async fn deploy(args: &InvocationArgs) -> anyhow::Result<()> {
    let project_dir = PathBuf::from(".");

    // Load configuration
    output::info(format!("Reading config file at {}", args.config.display()));
    let config = DeployConfig::load(&args.config)?;

    let client = PortainerClient::from_config(&config)?;
    let credentials = prompt::credentials(args.username.as_deref())?;

    let outcome = super::deploy_pipeline::run(&client, &config, &credentials, &project_dir).await?;

    tracing::debug!(
        endpoint_id = outcome.endpoint_id,
        removed_containers = ?outcome.removed_containers,
        removed_image = outcome.removed_image,
        replaced_container = ?outcome.replaced_container,
        teams = ?outcome.team_ids,
        steps = outcome.steps.len(),
        "deploy pipeline finished",
    );
    println!();
    output::success(format!(
        "Deployed {image} as container {id} on endpoint {endpoint}.",
        image = outcome.image_tag,
        id = outcome.container_id,
        endpoint = config.endpoint_name,
    ));

    Ok(())
}
