use serde::{Deserialize, Serialize};

/// A single hotel. Every room, reservation, service and pricing rule
/// belongs to exactly one property, and every property to one tenant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Property {
    pub id: String,
    pub owner_id: String,
    pub name: String,
    #[serde(default = "default_currency")]
    pub currency: String,
}

impl Property {
    pub fn is_owned_by(&self, tenant_id: &str) -> bool {
        self.owner_id == tenant_id
    }
}

fn default_currency() -> String {
    "USD".into()
}
