//! SSH credential resolution.
//!
//! Given an instance id and an optional key path, find the instance in the
//! inventory, take its network address and work out which private key file
//! to use. Resolution is a pure query: it neither logs nor touches the graph
//! or the filesystem.
use serde::Serialize;
use std::path::{Path, PathBuf};

use crate::errors::CredentialsError;
use crate::graph::{props, GraphSource, RelationType, ResourceType};
use crate::utils::paths;

/// Connection parameters for one instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Credentials {
    address: String,
    user: String,
    key_path: PathBuf,
}

impl Credentials {
    #[must_use]
    pub fn address(&self) -> &str {
        &self.address
    }

    /// Login user. Empty when left to the connection layer's convention.
    #[must_use]
    pub fn user(&self) -> &str {
        &self.user
    }

    #[must_use]
    pub fn key_path(&self) -> &Path {
        &self.key_path
    }

    #[must_use]
    pub fn with_user(self, user: impl Into<String>) -> Self {
        Self { user: user.into(), ..self }
    }

    /// Equivalent OpenSSH command line, with arguments quoted for a POSIX shell.
    #[must_use]
    pub fn ssh_command(&self) -> String {
        let target = if self.user.is_empty() {
            self.address.clone()
        } else {
            format!("{}@{}", self.user, self.address)
        };
        let key = self.key_path.display().to_string();
        format!("ssh -i {} {}", shell_quote(&key), shell_quote(&target))
    }
}

pub struct CredentialResolver {
    keys_dir: PathBuf,
}

impl Default for CredentialResolver {
    fn default() -> Self {
        Self::new(paths::keys_dir())
    }
}

impl CredentialResolver {
    /// Resolver deriving default key files under `keys_dir`.
    pub fn new(keys_dir: impl Into<PathBuf>) -> Self {
        Self { keys_dir: keys_dir.into() }
    }

    #[must_use]
    pub fn keys_dir(&self) -> &Path {
        &self.keys_dir
    }

    /// Resolve credentials for `instance_id`.
    ///
    /// A non-empty `key_path_override` is used verbatim. Otherwise the instance must
    /// have exactly one key pair, whose name becomes the file name under the keys
    /// directory.
    ///
    /// # Errors
    /// - `NotFound` when no instance has exactly this id.
    /// - `MissingAttribute` when the instance has no address (checked before the key
    ///   path), or the key pair has no usable name.
    /// - `AmbiguousKey` when no override is given and the instance has zero or several
    ///   key pairs.
    pub fn resolve<G: GraphSource + ?Sized>(
        &self,
        graph: &G,
        instance_id: &str,
        key_path_override: &str,
    ) -> Result<Credentials, CredentialsError> {
        let instance = graph
            .find(instance_id, ResourceType::Instance)
            .ok_or_else(|| CredentialsError::NotFound { id: instance_id.to_string() })?;

        let address = instance
            .property(props::PUBLIC_IP)
            .or_else(|| instance.property(props::PRIVATE_IP))
            .ok_or_else(|| CredentialsError::MissingAttribute {
                id: instance.id.clone(),
                attribute: props::PUBLIC_IP.to_string(),
            })?;

        let key_path = if key_path_override.is_empty() {
            let key_pair = graph.single_relation(instance, RelationType::HasKeyPair).map_err(
                |e| CredentialsError::AmbiguousKey { id: instance.id.clone(), count: e.count() },
            )?;
            let name = key_pair.property(props::NAME).filter(|n| is_single_segment(n)).ok_or_else(
                || CredentialsError::MissingAttribute {
                    id: key_pair.id.clone(),
                    attribute: props::NAME.to_string(),
                },
            )?;
            self.keys_dir.join(name)
        } else {
            PathBuf::from(key_path_override)
        };

        Ok(Credentials { address: address.to_string(), user: String::new(), key_path })
    }
}

/// Resolve with the default keys directory.
///
/// # Errors
/// See [`CredentialResolver::resolve`].
pub fn resolve_credentials<G: GraphSource + ?Sized>(
    graph: &G,
    instance_id: &str,
    key_path_override: &str,
) -> Result<Credentials, CredentialsError> {
    CredentialResolver::default().resolve(graph, instance_id, key_path_override)
}

fn shell_quote(arg: &str) -> String {
    let plain = |c: char| c.is_ascii_alphanumeric() || "@%+=:,./_-".contains(c);
    if !arg.is_empty() && arg.chars().all(plain) {
        return arg.to_string();
    }
    format!("'{}'", arg.replace('\'', r"'\''"))
}

// A key name must stay the last path segment once joined.
fn is_single_segment(name: &str) -> bool {
    name != "." && name != ".." && !name.contains(['/', '\\'])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::CredentialsErrorKind;
    use crate::graph::{Node, Relation, ResourceGraph};

    fn graph_with(nodes: Vec<Node>, relations: Vec<Relation>) -> ResourceGraph {
        ResourceGraph::new(nodes, relations).unwrap()
    }

    #[test]
    fn falls_back_to_private_address() {
        let g = graph_with(
            vec![Node::new("i-1", ResourceType::Instance).with_property(props::PRIVATE_IP, "10.1.1.1")],
            vec![],
        );
        let cred = CredentialResolver::new("/keys").resolve(&g, "i-1", "/k").unwrap();
        assert_eq!(cred.address(), "10.1.1.1");
    }

    #[test]
    fn public_address_wins_over_private() {
        let g = graph_with(
            vec![Node::new("i-1", ResourceType::Instance)
                .with_property(props::PUBLIC_IP, "54.0.0.1")
                .with_property(props::PRIVATE_IP, "10.1.1.1")],
            vec![],
        );
        let cred = CredentialResolver::new("/keys").resolve(&g, "i-1", "/k").unwrap();
        assert_eq!(cred.address(), "54.0.0.1");
    }

    #[test]
    fn non_instance_node_is_not_found() {
        let g = graph_with(
            vec![Node::new("kp", ResourceType::KeyPair).with_property(props::PUBLIC_IP, "1.1.1.1")],
            vec![],
        );
        let err = CredentialResolver::new("/keys").resolve(&g, "kp", "/k").unwrap_err();
        assert_eq!(err.kind(), CredentialsErrorKind::NotFound);
    }

    #[test]
    fn key_pair_without_usable_name_is_missing_attribute() {
        for name in ["", "../escape", "a/b", ".."] {
            let g = graph_with(
                vec![
                    Node::new("i-1", ResourceType::Instance).with_property(props::PUBLIC_IP, "1.1.1.1"),
                    Node::new("kp", ResourceType::KeyPair).with_property(props::NAME, name),
                ],
                vec![Relation::new(RelationType::HasKeyPair, "i-1", "kp")],
            );
            let err = CredentialResolver::new("/keys").resolve(&g, "i-1", "").unwrap_err();
            assert_eq!(
                err,
                CredentialsError::MissingAttribute { id: "kp".into(), attribute: "name".into() },
                "name {name:?}"
            );
        }
    }

    #[test]
    fn default_key_path_lives_under_keys_dir() {
        let g = graph_with(
            vec![
                Node::new("i-1", ResourceType::Instance).with_property(props::PUBLIC_IP, "1.1.1.1"),
                Node::new("kp", ResourceType::KeyPair).with_property(props::NAME, "deploy"),
            ],
            vec![Relation::new(RelationType::HasKeyPair, "i-1", "kp")],
        );
        let cred = CredentialResolver::new("/home/u/.infragraph/keys").resolve(&g, "i-1", "").unwrap();
        assert_eq!(cred.key_path(), Path::new("/home/u/.infragraph/keys/deploy"));
        assert_eq!(cred.user(), "");
    }

    #[test]
    fn ssh_command_quotes_paths_with_spaces() {
        let g = graph_with(
            vec![Node::new("i-1", ResourceType::Instance).with_property(props::PUBLIC_IP, "1.1.1.1")],
            vec![],
        );
        let cred = CredentialResolver::new("/keys").resolve(&g, "i-1", "/my keys/a b.pem").unwrap();
        assert_eq!(cred.key_path(), Path::new("/my keys/a b.pem"));
        assert_eq!(cred.ssh_command(), "ssh -i '/my keys/a b.pem' 1.1.1.1");

        let cred = CredentialResolver::new("/keys").resolve(&g, "i-1", "/k/o'neil.pem").unwrap();
        assert_eq!(cred.ssh_command(), r"ssh -i '/k/o'\''neil.pem' 1.1.1.1");
    }

    #[test]
    fn ssh_command_includes_user_only_when_set() {
        let g = graph_with(
            vec![Node::new("i-1", ResourceType::Instance).with_property(props::PUBLIC_IP, "1.2.3.4")],
            vec![],
        );
        let cred = CredentialResolver::new("/keys").resolve(&g, "i-1", "/k.pem").unwrap();
        assert_eq!(cred.ssh_command(), "ssh -i /k.pem 1.2.3.4");
        let cred = cred.with_user("ec2-user");
        assert_eq!(cred.ssh_command(), "ssh -i /k.pem ec2-user@1.2.3.4");
    }
}
