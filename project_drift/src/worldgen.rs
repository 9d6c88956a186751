use std::path::Path;

use async_trait::async_trait;
use drift::occupant::{NpcProfile, NpcProfileGenerator, ProfileError};
use rand::seq::SliceRandom;
use rand::Rng;
use serde::Deserialize;
use space::{ContentGenerator, ExitSeed, ExpandError, Room, RoomSeed, CANONICAL_DIRECTIONS};

/// One reusable room fragment for the built-in content generator.
#[derive(Debug, Clone, Deserialize)]
pub struct RoomTemplate {
    pub name: String,
    pub description: String,
    #[serde(default)]
    pub region: Option<String>,
    #[serde(default)]
    pub hub: bool,
}

/// Stand-in for the external content service: stitches rooms out of canned
/// templates, optionally loaded from `<content_dir>/rooms.json`. Honors the
/// generator contract from the world graph's point of view.
pub struct TemplateContentGenerator {
    templates: Vec<RoomTemplate>,
}

impl TemplateContentGenerator {
    pub fn built_in() -> Self {
        let templates = vec![
            RoomTemplate {
                name: "Flooded Arcade".into(),
                description: "Ankle-deep water mirrors a ceiling of dead signage. Somewhere a \
                              coin rattles in a machine that no longer takes coins."
                    .into(),
                region: Some("lowtown".into()),
                hub: false,
            },
            RoomTemplate {
                name: "Salt Garden".into(),
                description: "Rows of white crystalline shrubs crunch underfoot. The air tastes \
                              of old oceans."
                    .into(),
                region: Some("barrens".into()),
                hub: false,
            },
            RoomTemplate {
                name: "Tilted Chapel".into(),
                description: "Pews slide slowly toward the east wall. The altar is bolted down, \
                              which raises questions."
                    .into(),
                region: None,
                hub: false,
            },
            RoomTemplate {
                name: "Rust Stair".into(),
                description: "An iron stairwell spirals both up and down into fog. Each step \
                              rings a different note."
                    .into(),
                region: Some("lowtown".into()),
                hub: false,
            },
            RoomTemplate {
                name: "Ledger Hall".into(),
                description: "Stacked ledgers form load-bearing columns. Ink has pooled and \
                              dried into black glass along the floor seams."
                    .into(),
                region: None,
                hub: false,
            },
        ];
        Self { templates }
    }

    /// Load templates from `<dir>/rooms.json` (a JSON array), falling back
    /// to the built-in set when the file is absent or malformed.
    pub fn from_content_dir(dir: &str) -> Self {
        let path = Path::new(dir).join("rooms.json");
        match std::fs::read_to_string(&path) {
            Ok(raw) => match serde_json::from_str::<Vec<RoomTemplate>>(&raw) {
                Ok(templates) if !templates.is_empty() => {
                    tracing::info!(count = templates.len(), path = %path.display(), "room templates loaded");
                    Self { templates }
                }
                Ok(_) => {
                    tracing::warn!(path = %path.display(), "room template file is empty, using built-ins");
                    Self::built_in()
                }
                Err(e) => {
                    tracing::warn!(path = %path.display(), "failed to parse room templates ({e}), using built-ins");
                    Self::built_in()
                }
            },
            Err(_) => {
                tracing::info!("no room template file, using built-ins");
                Self::built_in()
            }
        }
    }
}

#[async_trait]
impl ContentGenerator for TemplateContentGenerator {
    async fn expand(&self, origin: &Room, direction: &str) -> Result<Vec<RoomSeed>, ExpandError> {
        let mut rng = rand::thread_rng();
        let template = self
            .templates
            .choose(&mut rng)
            .ok_or_else(|| ExpandError::Generator("no templates available".into()))?;

        let mut exits = Vec::new();
        let back = opposite(direction);
        if let Some(back) = &back {
            exits.push(ExitSeed {
                direction: back.clone(),
                target: Some(origin.id.to_string()),
            });
        }

        let mut onward: Vec<&str> = CANONICAL_DIRECTIONS
            .iter()
            .copied()
            .filter(|d| Some(*d) != back.as_deref())
            .collect();
        onward.shuffle(&mut rng);
        for d in onward.into_iter().take(rng.gen_range(1..=3)) {
            exits.push(ExitSeed {
                direction: d.to_string(),
                target: None,
            });
        }

        Ok(vec![RoomSeed {
            name: template.name.clone(),
            description: template.description.clone(),
            region: template.region.clone().or_else(|| origin.region.clone()),
            hub: template.hub,
            exits,
        }])
    }
}

fn opposite(direction: &str) -> Option<String> {
    let back = match direction.to_ascii_lowercase().as_str() {
        "north" => "south",
        "south" => "north",
        "east" => "west",
        "west" => "east",
        "up" => "down",
        "down" => "up",
        _ => return None,
    };
    Some(back.to_string())
}

const NORMIE_NAMES: &[&str] = &[
    "Brakk", "Mol", "Sif the Damp", "Old Tharn", "Quill", "Greasy Ven", "Hux", "Marrow Pete",
];

/// Stand-in for the external NPC profile service: a name pool plus a
/// health-tiered descriptor.
pub struct TemplateProfileGenerator;

impl TemplateProfileGenerator {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl NpcProfileGenerator for TemplateProfileGenerator {
    async fn profile(&self, health: i32) -> Result<NpcProfile, ProfileError> {
        let mut rng = rand::thread_rng();
        let name = NORMIE_NAMES
            .choose(&mut rng)
            .ok_or_else(|| ProfileError::Generator("empty name pool".into()))?;
        let build = if health < 40 {
            "gaunt and twitchy, all elbows and bad intentions"
        } else if health < 75 {
            "rangy and scarred, moving like a door on old hinges"
        } else {
            "a slab of a figure that blots out the lamplight"
        };
        Ok(NpcProfile {
            name: name.to_string(),
            description: format!("{name} is {build}."),
        })
    }
}
