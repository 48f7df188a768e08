//! Catalog payloads: the subset of the external API we read, and the
//! enriched item returned to clients.

use serde::{Deserialize, Serialize};

/// `{"name": .., "url": ..}` reference used by listings.
#[derive(Debug, Clone, Deserialize)]
pub struct NamedResource {
    pub name: String,
    #[serde(default)]
    pub url: Option<String>,
}

/// `GET /pokemon?limit&offset`
#[derive(Debug, Clone, Deserialize)]
pub struct ResourcePage {
    #[serde(default)]
    pub count: Option<u64>,
    pub results: Vec<NamedResource>,
}

/// `GET /generation/{n}`
#[derive(Debug, Clone, Deserialize)]
pub struct Generation {
    pub pokemon_species: Vec<NamedResource>,
}

/// `GET /pokemon/{name}`
#[derive(Debug, Clone, Deserialize)]
pub struct ItemDetail {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub sprites: Sprites,
    #[serde(default)]
    pub types: Vec<TypeSlot>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Sprites {
    pub front_default: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TypeSlot {
    #[serde(rename = "type")]
    pub kind: NamedResource,
}

impl ItemDetail {
    /// Name of the first listed type.
    pub fn primary_type(&self) -> Option<&str> {
        self.types.first().map(|slot| slot.kind.name.as_str())
    }
}

/// Catalog entry as returned to a given caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogItem {
    pub id: i64,
    pub nome: String,
    pub imagem: Option<String>,
    pub favorito: bool,
    pub equipe: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detail_decodes_upstream_shape() {
        let raw = r#"{
            "id": 25,
            "name": "pikachu",
            "height": 4,
            "sprites": {"front_default": "https://img.test/25.png", "back_default": null},
            "types": [{"slot": 1, "type": {"name": "electric", "url": "https://x/type/13/"}}]
        }"#;
        let detail: ItemDetail = serde_json::from_str(raw).unwrap();
        assert_eq!(detail.id, 25);
        assert_eq!(detail.sprites.front_default.as_deref(), Some("https://img.test/25.png"));
        assert_eq!(detail.primary_type(), Some("electric"));
    }

    #[test]
    fn test_detail_without_types_or_sprite() {
        let detail: ItemDetail =
            serde_json::from_str(r#"{"id": 1, "name": "missingno", "sprites": {"front_default": null}}"#)
                .unwrap();
        assert_eq!(detail.primary_type(), None);
        assert_eq!(detail.sprites.front_default, None);
    }
}
