//! infragraph — cloud inventory as a resource graph
//!
//! Keep an inventory of cloud resources (instances, key pairs, networks) as a
//! graph of typed nodes and directed typed relations, and resolve operational
//! actions from it.
//!
//! # Features
//! - JSON-persisted, validated, read-only `ResourceGraph`
//! - SSH credential resolution with strict key-pair disambiguation
//! - Listing queries over the inventory
//! - Local usage statistics store with a per-install random identifier
//!
//! # Quickstart (Library)
//! ```no_run
//! use infragraph::credentials::CredentialResolver;
//! use infragraph::graph::ResourceGraph;
//!
//! let graph = ResourceGraph::load_json(std::path::Path::new("graph.json")).expect("load graph");
//! let creds = CredentialResolver::new("/home/me/.infragraph/keys")
//!     .resolve(&graph, "i-0abc", "")
//!     .expect("resolve credentials");
//! println!("{}", creds.ssh_command());
//! ```
//!
//! # Quickstart (CLI)
//! ```text
//! infragraph --graph graph.json ssh i-0abc
//! infragraph --graph graph.json ssh i-0abc --identity ~/.ssh/special.pem --user ec2-user
//! infragraph --graph graph.json list --type instance --format json
//! ```
pub mod app;
pub mod cli;
pub mod credentials;
pub mod errors;
pub mod graph;
pub mod query;
pub mod stats;
pub mod utils;
