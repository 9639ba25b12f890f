//! Handle on one archive node

use crate::edges::{node_edges, NodeEdges};
use crate::error::{GraphError, Result};
use crate::fetch::{full_node, node_exists};
use crate::traversal::{traverse, TraversalOutcome, TraversalRequest};
use serde_json::{Map, Value};
use std::fmt;
use swhdag_core::{ObjectKind, Swhid};
use swhdag_protocol::{args, Endpoint, Method, ProtocolClient, ProtocolError};
use tracing::debug;

/// A node identifier bound to the client that reaches it
#[derive(Debug, Clone)]
pub struct Node {
    client: ProtocolClient,
    id: Swhid,
}

impl Node {
    /// Bind `id` to `client`
    pub fn new(client: ProtocolClient, id: Swhid) -> Self {
        Node { client, id }
    }

    /// Parse `text`, qualifiers allowed, and bind it
    pub fn parse(client: ProtocolClient, text: &str) -> Result<Self> {
        Ok(Node::new(client, Swhid::parse_qualified(text)?))
    }

    /// The identifier
    pub fn id(&self) -> Swhid {
        self.id
    }

    /// Kind as written in the identifier
    pub fn kind(&self) -> ObjectKind {
        self.id.kind()
    }

    /// Kind as the archive reports it; `None` if the archive does not know
    /// the identifier
    pub fn which(&self) -> Result<Option<ObjectKind>> {
        let response = match self.client.get(Endpoint::Resolve, &args![self.id]) {
            Ok(response) => response,
            Err(e) if e.is_not_found() => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let object_type = response
            .body()
            .get("object_type")
            .and_then(Value::as_str)
            .ok_or(GraphError::MissingField {
                endpoint: "resolve",
                field: "object_type",
            })?;
        Ok(Some(ObjectKind::from_type_name(object_type)?))
    }

    /// HEAD the node
    pub fn exists(&self) -> Result<bool> {
        node_exists(&self.client, &self.id)
    }

    /// The whole node, following `Link` continuations
    ///
    /// Continuation pages are merged into the first: arrays are appended,
    /// objects merged key by key with the first value kept.
    pub fn hop(&self) -> Result<Value> {
        let first = full_node(&self.client, &self.id)?;
        let mut next = first.next_link();
        let mut body = first.into_body();

        let max = self.client.max_pages();
        let mut pages = 1usize;
        while let Some(link) = next {
            if pages >= max {
                return Err(ProtocolError::PageLimit { max }.into());
            }
            let page = self.client.invoke_url(Method::Get, &link)?;
            pages += 1;
            debug!(target: "swh::graph", node = %self.id, page = pages, "Followed continuation");
            next = page.next_link();
            merge(&mut body, page.into_body());
        }
        Ok(body)
    }

    /// Outgoing edges
    pub fn edges(&self) -> Result<NodeEdges> {
        node_edges(&self.client, &self.id)
    }

    /// Target of the edge called `name`, if there is one
    pub fn target_edge(&self, name: &str) -> Result<Option<Swhid>> {
        Ok(self.edges()?.target(name))
    }

    /// Resolve a branch and path starting here
    pub fn traverse(&self, request: TraversalRequest) -> Result<TraversalOutcome> {
        traverse(&self.client, &self.id, request)
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.id, f)
    }
}

fn merge(into: &mut Value, page: Value) {
    match (into, page) {
        (Value::Array(acc), Value::Array(items)) => acc.extend(items),
        (Value::Object(acc), Value::Object(fields)) => merge_maps(acc, fields),
        _ => {}
    }
}

fn merge_maps(acc: &mut Map<String, Value>, fields: Map<String, Value>) {
    for (key, value) in fields {
        match acc.get_mut(&key) {
            Some(existing) if existing.is_array() || existing.is_object() => merge(existing, value),
            Some(_) => {}
            None => {
                acc.insert(key, value);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::Arc;
    use std::time::Duration;
    use swhdag_protocol::testing::ArchiveFixture;
    use swhdag_protocol::{ClientConfig, HttpResponse};

    const DIR: &str = "cccccccccccccccccccccccccccccccccccccccc";
    const CNT: &str = "dddddddddddddddddddddddddddddddddddddddd";

    fn client(fixture: &Arc<ArchiveFixture>) -> ProtocolClient {
        let config = ClientConfig::new("https://archive.example").with_retry(1, Duration::ZERO);
        ProtocolClient::with_transport(config, fixture.clone()).unwrap()
    }

    fn dir_node(fixture: &Arc<ArchiveFixture>) -> Node {
        Node::parse(client(fixture), &format!("swh:1:dir:{};origin=https://x.example", DIR)).unwrap()
    }

    #[test]
    fn test_which_uses_resolve() {
        let fixture = Arc::new(ArchiveFixture::new());
        fixture.route(
            format!("resolve/swh:1:dir:{}/", DIR),
            json!({"object_type": "directory", "object_id": DIR}),
        );
        let node = dir_node(&fixture);
        assert_eq!(node.which().unwrap(), Some(ObjectKind::Directory));

        let unknown = Node::new(client(&fixture), Swhid::new(ObjectKind::Content, CNT).unwrap());
        assert_eq!(unknown.which().unwrap(), None);
    }

    #[test]
    fn test_hop_follows_links() {
        let fixture = Arc::new(ArchiveFixture::new());
        let next = format!("https://archive.example/api/1/directory/{}/?page=2", DIR);
        fixture.route_response(
            format!("directory/{}/", DIR),
            HttpResponse::new(200, json!([{"name": "a"}]).to_string())
                .with_header("Link", format!("<{}>; rel=\"next\"", next)),
        );
        fixture.route(format!("directory/{}/?page=2", DIR), json!([{"name": "b"}]));

        let body = dir_node(&fixture).hop().unwrap();
        assert_eq!(body, json!([{"name": "a"}, {"name": "b"}]));
    }

    #[test]
    fn test_merge_keeps_first_scalars() {
        let mut acc = json!({"id": "one", "branches": {"a": 1}, "list": [1]});
        merge(
            &mut acc,
            json!({"id": "two", "branches": {"a": 2, "b": 3}, "list": [2], "extra": true}),
        );
        assert_eq!(
            acc,
            json!({"id": "one", "branches": {"a": 1, "b": 3}, "list": [1, 2], "extra": true})
        );
    }

    #[test]
    fn test_target_edge() {
        let fixture = Arc::new(ArchiveFixture::new());
        fixture.route(
            format!("directory/{}/", DIR),
            json!([{"name": "README", "type": "file", "target": CNT}]),
        );
        let node = dir_node(&fixture);
        assert_eq!(
            node.target_edge("README").unwrap(),
            Some(Swhid::new(ObjectKind::Content, CNT).unwrap())
        );
        assert_eq!(node.target_edge("missing").unwrap(), None);
    }

    #[test]
    fn test_exists() {
        let fixture = Arc::new(ArchiveFixture::new());
        fixture.route(format!("directory/{}/", DIR), json!([]));
        assert!(dir_node(&fixture).exists().unwrap());

        let gone = Node::new(client(&fixture), Swhid::new(ObjectKind::Content, CNT).unwrap());
        assert!(!gone.exists().unwrap());
    }
}
