//! Test utilities for spinning up a real Neo4j instance via testcontainers.

use testcontainers::{
    core::{ContainerPort, WaitFor},
    runners::AsyncRunner,
    ContainerAsync, GenericImage, ImageExt,
};

use crate::GraphClient;

/// Directory the container's `LOAD CSV FROM 'file:///…'` resolves against.
pub const IMPORT_DIR: &str = "/import";

/// Spin up a Neo4j container and return the container handle + connected GraphClient.
///
/// The container is stopped when `ContainerAsync` is dropped, so callers must
/// hold it for the duration of the test.
pub async fn neo4j_container() -> (ContainerAsync<GenericImage>, GraphClient) {
    neo4j_container_with_imports(&[]).await
}

/// Like [`neo4j_container`], with `(file name, contents)` pairs copied into [`IMPORT_DIR`].
pub async fn neo4j_container_with_imports(
    files: &[(&str, &str)],
) -> (ContainerAsync<GenericImage>, GraphClient) {
    let mut request = GenericImage::new("neo4j", "5.25.1")
        .with_exposed_port(ContainerPort::Tcp(7687))
        .with_wait_for(WaitFor::message_on_stdout("Started."))
        .with_env_var("NEO4J_AUTH", "neo4j/testpassword")
        .with_env_var("NEO4J_server_directories_import", IMPORT_DIR);
    for (name, contents) in files {
        request = request.with_copy_to(format!("{IMPORT_DIR}/{name}"), contents.as_bytes().to_vec());
    }

    let container: ContainerAsync<GenericImage> = request
        .start()
        .await
        .expect("Failed to start Neo4j container");

    let host_port = container
        .get_host_port_ipv4(7687)
        .await
        .expect("Failed to get Neo4j host port");

    let uri = format!("bolt://127.0.0.1:{host_port}");
    let client = GraphClient::connect(&uri, "neo4j", "testpassword", None)
        .await
        .expect("Failed to connect to Neo4j");

    (container, client)
}
