//! Prints the CustomResourceDefinitions served by the provider as a
//! multi-document YAML stream.
//!
//! ```sh
//! cargo run --bin crdgen > config/crd/bases/crds.yaml
//! ```

use argocd_token_provider::crd::registry;

fn main() -> anyhow::Result<()> {
    for crd in registry::crds() {
        print!("---\n{}", serde_yaml::to_string(&crd)?);
    }
    Ok(())
}
