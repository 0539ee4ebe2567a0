//! Gateway definitions loaded from YAML.

use std::fs;
use std::path::Path;

use crate::error::Result;
use crate::gwm::GWM_ID;

/// Describes one gateway variant: a short id, a display name and the
/// arbitration id its gateway module listens on.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct GatewayDefinition {
    pub id: String,
    pub name: String,
    pub gwm_id: u32,
}

impl Default for GatewayDefinition {
    fn default() -> GatewayDefinition {
        GatewayDefinition {
            id: String::from("mgev"),
            name: String::from("MG ZS EV"),
            gwm_id: GWM_ID,
        }
    }
}

impl GatewayDefinition {
    /// Parses a definition from a YAML document.
    pub fn from_yaml(contents: &str) -> Result<GatewayDefinition> {
        Ok(serde_yaml::from_str(contents)?)
    }

    /// Loads a definition from a YAML file.
    pub fn load(path: &Path) -> Result<GatewayDefinition> {
        let contents = fs::read_to_string(path)?;
        GatewayDefinition::from_yaml(&contents)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_yaml_definition() {
        let definition = GatewayDefinition::from_yaml(
            "id: mgev\nname: MG ZS EV\ngwm_id: 1808\n",
        )
        .unwrap();
        assert_eq!(definition.id, "mgev");
        assert_eq!(definition.gwm_id, 0x710);
    }

    #[test]
    fn default_is_the_mg_gateway() {
        assert_eq!(GatewayDefinition::default().gwm_id, 0x710);
    }

    #[test]
    fn rejects_incomplete_definitions() {
        assert!(GatewayDefinition::from_yaml("name: MG ZS EV\n").is_err());
    }
}
