//! Disposable Neo4j for integration tests, via testcontainers.

use testcontainers::{
    core::{ContainerPort, WaitFor},
    runners::AsyncRunner,
    ContainerAsync, GenericImage, ImageExt,
};

use crate::{GraphClient, NodeWriter, ParamReader};

const BOLT_PORT: u16 = 7687;
const PASSWORD: &str = "mantis-test";

/// A running Neo4j container and a client connected to it.
///
/// Stopping happens on drop, so keep the fixture alive for the whole test.
pub struct Neo4jFixture {
    _container: ContainerAsync<GenericImage>,
    pub client: GraphClient,
}

impl Neo4jFixture {
    pub async fn start() -> Self {
        let container = GenericImage::new("neo4j", "5.25.1")
            .with_exposed_port(ContainerPort::Tcp(BOLT_PORT))
            .with_wait_for(WaitFor::message_on_stdout("Started."))
            .with_env_var("NEO4J_AUTH", format!("neo4j/{PASSWORD}"))
            .start()
            .await
            .expect("Failed to start Neo4j container");

        let port = container
            .get_host_port_ipv4(BOLT_PORT)
            .await
            .expect("Failed to get Neo4j host port");

        let client = GraphClient::connect(&format!("bolt://127.0.0.1:{port}"), "neo4j", PASSWORD)
            .await
            .expect("Failed to connect to Neo4j");

        Self {
            _container: container,
            client,
        }
    }

    pub fn writer(&self) -> NodeWriter {
        self.client.writer()
    }

    pub fn reader(&self) -> ParamReader {
        self.client.reader()
    }
}
