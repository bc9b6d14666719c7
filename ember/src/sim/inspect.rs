use crate::error::Error;
use crate::value::Value;

use serde::Serialize;

/// The name, width and current value of one port of a simulated module instance.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct PortSnapshot {
    pub name: String,
    pub width: u32,
    pub value: Value,
}

/// A point-in-time view of a simulated module instance and everything below it, in the shape hierarchy viewers consume.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ModuleSnapshot {
    /// The module definition's name.
    pub name: String,
    /// The instance name, or `None` for the top-level module.
    pub instance_name: Option<String>,
    pub inputs: Vec<PortSnapshot>,
    pub outputs: Vec<PortSnapshot>,
    /// Sub-module instances in instantiation order.
    pub sub_modules: Vec<ModuleSnapshot>,
}

impl ModuleSnapshot {
    /// Renders this snapshot as pretty-printed JSON.
    ///
    /// # Examples
    ///
    /// ```
    /// use ember::*;
    /// use ember::sim::*;
    ///
    /// let c = Context::new();
    ///
    /// let m = c.module("Buffer");
    /// let i = m.input("i", 1).unwrap();
    /// m.output("o", 1).unwrap().drive(i).unwrap();
    /// m.build().unwrap();
    ///
    /// let mut sim = Simulator::new(m, SimConfig::default()).unwrap();
    /// sim.put(i, true).unwrap();
    /// sim.settle().unwrap();
    ///
    /// let json = sim.inspect().to_json().unwrap();
    /// assert!(json.contains("\"subModules\": []"));
    /// ```
    pub fn to_json(&self) -> Result<String, Error> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Finds a direct sub-module snapshot by instance name.
    pub fn sub_module(&self, instance_name: &str) -> Option<&ModuleSnapshot> {
        self.sub_modules
            .iter()
            .find(|sub_module| sub_module.instance_name.as_deref() == Some(instance_name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_shape() {
        let snapshot = ModuleSnapshot {
            name: "Top".into(),
            instance_name: None,
            inputs: vec![PortSnapshot {
                name: "a".into(),
                width: 2,
                value: Value::from_u128(2, 2),
            }],
            outputs: vec![],
            sub_modules: vec![ModuleSnapshot {
                name: "Leaf".into(),
                instance_name: Some("u0".into()),
                inputs: vec![],
                outputs: vec![PortSnapshot {
                    name: "o".into(),
                    width: 1,
                    value: Value::x(1),
                }],
                sub_modules: vec![],
            }],
        };

        let json: serde_json::Value = serde_json::from_str(&snapshot.to_json().unwrap()).unwrap();
        assert_eq!(json["name"], "Top");
        assert_eq!(json["instanceName"], serde_json::Value::Null);
        assert_eq!(json["inputs"][0]["value"], "10");
        assert_eq!(json["subModules"][0]["instanceName"], "u0");
        assert_eq!(json["subModules"][0]["outputs"][0]["value"], "x");
        assert!(snapshot.sub_module("u0").is_some());
    }
}
