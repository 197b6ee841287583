use std::fmt;
use std::fmt::{Display, Formatter};

use serde::de::Error as DeError;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Number, Value};

/// Extra attributes of a node, keyed by attribute name.
pub type Attributes = Map<String, Value>;

/// Community id assigned by the detector. Only meaningful for grouping.
pub type CommunityId = usize;

/// Group value of a node without community.
pub const UNASSIGNED_GROUP: i64 = -1;

/// Keys computed by the analysis, never taken from raw node attributes.
pub(crate) const RESERVED_KEYS: [&str; 5] = ["id", "group", "color", "centrality", "degree"];

// A node as supplied by the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawNode {
    #[serde(deserialize_with = "deserialize_node_key")]
    pub id: String, // Unique key, numbers are resolved to their text.
    #[serde(flatten)]
    pub attributes: Attributes, // Everything else in the record.
}

impl RawNode {
    pub fn new(id: impl Into<String>) -> Self {
        RawNode {
            id: id.into(),
            attributes: Attributes::new(),
        }
    }

    pub fn with_attr(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }
}

// A relation between two nodes, direction is ignored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawLink {
    #[serde(deserialize_with = "deserialize_node_key")]
    pub source: String,
    #[serde(deserialize_with = "deserialize_node_key")]
    pub target: String,
    #[serde(flatten)]
    pub attributes: Attributes, // Weights, labels and the like, passed through untouched.
}

impl RawLink {
    pub fn new(source: impl Into<String>, target: impl Into<String>) -> Self {
        RawLink {
            source: source.into(),
            target: target.into(),
            attributes: Attributes::new(),
        }
    }

    pub fn with_attr(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }
}

/// The batch handed over by the host.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NetworkInput {
    #[serde(default)]
    pub nodes: Vec<RawNode>,
    #[serde(default)]
    pub links: Vec<RawLink>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalyzedNode {
    pub id: String,
    #[serde(flatten)]
    pub attributes: Attributes,
    pub group: i64, // Community id, or -1.
    pub color: String,
    pub centrality: f64,
    pub degree: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalyzedLink {
    pub source: String,
    pub target: String,
    #[serde(flatten)]
    pub attributes: Attributes,
}

/// Render-ready graph, `{ "nodes": [...], "links": [...] }` once serialized.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalyzedGraph {
    pub nodes: Vec<AnalyzedNode>,
    pub links: Vec<AnalyzedLink>,
}

impl AnalyzedGraph {
    pub fn node(&self, id: &str) -> Option<&AnalyzedNode> {
        self.nodes.iter().find(|node| node.id == id)
    }
}

impl Display for AnalyzedGraph {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        for node in &self.nodes {
            writeln!(f, "{} [group: {}, color: {}, centrality: {:.3}, degree: {}]",
                     node.id, node.group, node.color, node.centrality, node.degree)?;
        }
        for link in &self.links {
            writeln!(f, "{} -- {}", link.source, link.target)?;
        }
        Ok(())
    }
}

/// Resolve a JSON value naming a node into its key.
/// Accepts strings, numbers, booleans and objects carrying an `id` field.
pub(crate) fn node_key(value: &Value) -> Option<String> {
    match value {
        Value::String(text) => Some(text.clone()),
        Value::Number(number) => Some(number_key(number)),
        Value::Bool(flag) => Some(flag.to_string()),
        Value::Object(fields) => fields.get("id").and_then(node_key),
        Value::Null | Value::Array(_) => None,
    }
}

/// Text of a numeric id. Integral floats drop their fraction, so `1.0` and `1` name the same node;
/// very large and very small magnitudes use the `1e+21` exponent form.
fn number_key(number: &Number) -> String {
    let value = match number.as_f64() {
        Some(value) if !number.is_i64() && !number.is_u64() => value,
        _ => return number.to_string(),
    };
    if value == 0.0 {
        return "0".to_string();
    }
    let magnitude = value.abs();
    if magnitude >= 1e21 || magnitude < 1e-6 {
        let text = format!("{:e}", value);
        match text.split_once('e') {
            Some((mantissa, exponent)) if !exponent.starts_with('-') => format!("{}e+{}", mantissa, exponent),
            _ => text,
        }
    } else {
        format!("{}", value)
    }
}

fn deserialize_node_key<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    node_key(&value).ok_or_else(|| D::Error::custom(format!("cannot use {} as a node id", value)))
}

#[cfg(test)]
mod test_types {
    use serde_json::json;

    use crate::types::{node_key, AnalyzedGraph, AnalyzedLink, AnalyzedNode, Attributes, NetworkInput};

    #[test]
    fn test_node_key_shapes() {
        assert_eq!(node_key(&json!("Alice")), Some("Alice".to_string()));
        assert_eq!(node_key(&json!(42)), Some("42".to_string()));
        assert_eq!(node_key(&json!({"id": "Bob", "x": 3.5})), Some("Bob".to_string()));
        assert_eq!(node_key(&json!({"id": {"id": 7}})), Some("7".to_string()));
        assert_eq!(node_key(&json!(null)), None);
        assert_eq!(node_key(&json!({"name": "Bob"})), None);
    }

    #[test]
    fn test_float_node_keys() {
        assert_eq!(node_key(&json!(1.0)), node_key(&json!(1)));
        assert_eq!(node_key(&json!(1.0)), Some("1".to_string()));
        assert_eq!(node_key(&json!(-3.0)), Some("-3".to_string()));
        assert_eq!(node_key(&json!(-0.0)), Some("0".to_string()));
        assert_eq!(node_key(&json!(2.5)), Some("2.5".to_string()));
        assert_eq!(node_key(&json!(1e20)), Some("100000000000000000000".to_string()));
        assert_eq!(node_key(&json!(1e21)), Some("1e+21".to_string()));
        assert_eq!(node_key(&json!(1.5e22)), Some("1.5e+22".to_string()));
        assert_eq!(node_key(&json!(1e-7)), Some("1e-7".to_string()));

        let input: NetworkInput = serde_json::from_str(
            r#"{"nodes": [{"id": 1.0}, {"id": 2}], "links": [{"source": 1, "target": 2.0}]}"#,
        ).unwrap();
        assert_eq!(input.nodes[0].id, input.links[0].source);
        assert_eq!(input.nodes[1].id, input.links[0].target);
    }

    #[test]
    fn test_decode_input() {
        let input: NetworkInput = serde_json::from_value(json!({
            "nodes": [{"id": "A", "role": "admin"}, {"id": 2}],
            "links": [{"source": "A", "target": 2}, {"source": {"id": "A"}, "target": {"id": 2}, "index": 0}]
        })).unwrap();
        assert_eq!(input.nodes.len(), 2);
        assert_eq!(input.nodes[0].attributes.get("role"), Some(&json!("admin")));
        assert!(input.nodes[0].attributes.get("id").is_none());
        assert_eq!(input.nodes[1].id, "2");
        assert_eq!(input.links[1].source, "A");
        assert_eq!(input.links[1].target, "2");
        assert_eq!(input.links[1].attributes.get("index"), Some(&json!(0)));
        assert!(input.links[0].attributes.is_empty());
    }

    #[test]
    fn test_decode_rejects_null_id() {
        let res = serde_json::from_value::<NetworkInput>(json!({"nodes": [{"id": null}]}));
        assert!(res.is_err());
    }

    #[test]
    fn test_encode_output() {
        let mut attributes = Attributes::new();
        attributes.insert("role".to_string(), json!("admin"));
        let graph = AnalyzedGraph {
            nodes: vec![AnalyzedNode {
                id: "A".to_string(),
                attributes,
                group: -1,
                color: "#ffeedd".to_string(),
                centrality: 0.0,
                degree: 0,
            }],
            links: vec![AnalyzedLink {
                source: "A".to_string(),
                target: "B".to_string(),
                attributes: Attributes::new(),
            }],
        };
        let encoded = serde_json::to_value(&graph).unwrap();
        assert_eq!(encoded["nodes"][0]["role"], json!("admin"));
        assert_eq!(encoded["nodes"][0]["group"], json!(-1));
        assert_eq!(encoded["links"][0], json!({"source": "A", "target": "B"}));
        println!("{}", graph);
    }
}
