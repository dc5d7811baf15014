use portainer_deploy_api::{
    ApiError, CreateContainer, Credentials, HttpTransport, PortainerClient, ResourceControlUpdate,
};
use portainer_deploy_build::{BuildContext, FilterMode, collect_entries};
use portainer_deploy_core::{DeployConfig, ImageTag, PackageManifest, resolve_container_name};
use std::path::Path;

use crate::output::Progress;

/// Result of a successful deploy pipeline run.
#[derive(Debug)]
pub(crate) struct DeployOutcome {
    pub image_tag: String,
    pub endpoint_id: i64,
    /// Containers removed because they used the old image.
    pub removed_containers: Vec<String>,
    pub removed_image: bool,
    /// Container with the target name that was replaced.
    pub replaced_container: Option<String>,
    pub container_id: String,
    pub team_ids: Vec<i64>,
    pub steps: Vec<String>,
}

/// Run the full deploy pipeline:
/// login → endpoint → tag → old image cleanup → build context → build →
/// replace container → ownership → start.
///
/// Every step must succeed before the next one starts. Nothing that was
/// already deleted or created remotely is rolled back on failure.
pub(crate) async fn run<T: HttpTransport>(
    client: &PortainerClient<T>,
    config: &DeployConfig,
    credentials: &Credentials,
    project_dir: &Path,
) -> anyhow::Result<DeployOutcome> {
    let mut progress = Progress::default();

    // Login
    let session = client.login(credentials).await?;
    progress.success("Successfully logged into portainer.");

    // Resolve endpoint
    let endpoint = client.find_endpoint(&session, &config.endpoint_name).await?;
    progress.success(format!(
        "Found endpoint {name} with ID {id}.",
        name = endpoint.name,
        id = endpoint.id,
    ));

    // Image tag and container name
    let manifest = PackageManifest::load(project_dir)?;
    let image_tag = ImageTag::resolve(config, manifest.as_ref())?.to_string();
    let container_name = resolve_container_name(config, manifest.as_ref())?;

    // Old image cleanup: containers first, the engine refuses to delete an image in use
    let mut removed_containers = Vec::new();
    let mut removed_image = false;
    if config.override_old_image {
        progress.info(format!("Checking if an image tagged {image_tag} already exists."));
        match client
            .find_image_by_tag(&session, endpoint.id, &image_tag)
            .await?
        {
            Some(_) => {
                progress.warn(format!("Found image {image_tag}."));

                let users = client
                    .containers_using_image(&session, endpoint.id, &image_tag)
                    .await?;
                progress.warn(format!(
                    "Found {} container(s) using image {image_tag}.",
                    users.len()
                ));

                for container in users {
                    client
                        .delete_container(&session, endpoint.id, &container.id)
                        .await?;
                    progress.success(format!("Deleted container {}.", container.id));
                    removed_containers.push(container.id);
                }

                client
                    .delete_image(&session, endpoint.id, &image_tag)
                    .await?;
                removed_image = true;
                progress.success(format!("Deleted image {image_tag}."));
            }
            None => progress.success(format!("No image tagged {image_tag} found.")),
        }
    }

    // Build context
    let mode = FilterMode::from_config(config);
    let entries = collect_entries(project_dir, &mode)?;
    let context = BuildContext::create(project_dir, &entries)?;
    let archive_path = context.path().display().to_string();
    progress.success(format!(
        "Created build context with {} entries at {archive_path}.",
        entries.len()
    ));

    // Remote build
    progress.info(format!("Building image {image_tag} remotely."));
    let archive = context.bytes()?;
    client
        .build_image(
            &session,
            endpoint.id,
            &config.dockerfile,
            &image_tag,
            archive,
        )
        .await?;
    progress.success(format!("Built image {image_tag}."));

    context.remove()?;
    progress.success(format!("Deleted temporary build context {archive_path}."));

    // Replace container with the same name
    let mut replaced_container = None;
    if let Some(existing) = client
        .find_container_by_name(&session, endpoint.id, &container_name)
        .await?
    {
        progress.info(format!("Container {container_name} already exists."));
        client
            .delete_container(&session, endpoint.id, &existing.id)
            .await?;
        progress.success(format!("Deleted container {}.", existing.id));
        replaced_container = Some(existing.id);
    }

    let spec = CreateContainer {
        image: image_tag.clone(),
        exposed_ports: config.exposed_ports.clone(),
        host_config: config.host_config.clone(),
    };
    let created = client
        .create_container(&session, endpoint.id, &container_name, &spec)
        .await?;
    for warning in created.warnings.iter().flatten() {
        progress.warn(warning.clone());
    }
    progress.success(format!(
        "Created container {container_name} with ID {}.",
        created.id
    ));

    // Ownership: hand the container to every team
    let teams = client.list_teams(&session).await?;
    let team_ids: Vec<i64> = teams.iter().map(|t| t.id).collect();
    let team_names = teams
        .iter()
        .map(|t| t.name.as_str())
        .collect::<Vec<_>>()
        .join(", ");

    let resource_control_id =
        created
            .resource_control_id()
            .ok_or_else(|| ApiError::MissingResourceControl {
                container_id: created.id.clone(),
            })?;
    if teams.is_empty() {
        progress.warn("No teams found; only administrators will see the container.");
    }
    client
        .update_resource_control(
            &session,
            resource_control_id,
            &ResourceControlUpdate::team_shared(team_ids.clone()),
        )
        .await?;
    progress.success(format!(
        "Promoted team(s) [{team_names}] to owner of the container."
    ));

    // Start
    client
        .start_container(&session, endpoint.id, &created.id)
        .await?;
    progress.success(format!("Started container {}.", created.id));

    Ok(DeployOutcome {
        image_tag,
        endpoint_id: endpoint.id,
        removed_containers,
        removed_image,
        replaced_container,
        container_id: created.id,
        team_ids,
        steps: progress.into_steps(),
    })
}
