use serde::Serialize;

/// The unremovable default weapon. A real catalog entry, not a magic string:
/// equip/unequip paths compare against this through the catalog.
pub const FIST: &str = "fist";

/// Attack rating with nothing but fists equipped.
pub const BASE_ATTACK: i32 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemCategory {
    Weapon,
    Armor,
    Item,
}

impl std::fmt::Display for ItemCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Weapon => write!(f, "weapon"),
            Self::Armor => write!(f, "armor"),
            Self::Item => write!(f, "item"),
        }
    }
}

/// One entry of the static item catalog. Identity is the case-insensitive
/// name; anything not in here cannot be equipped or consumed.
#[derive(Debug, Clone)]
pub struct CatalogEntry {
    pub name: &'static str,
    pub category: ItemCategory,
    pub attack: Option<i32>,
    pub heal: Option<i32>,
    pub cost: Option<i64>,
    pub blurb: &'static str,
}

pub const CATALOG: &[CatalogEntry] = &[
    CatalogEntry {
        name: FIST,
        category: ItemCategory::Weapon,
        attack: Some(BASE_ATTACK),
        heal: None,
        cost: None,
        blurb: "your own two hands",
    },
    CatalogEntry {
        name: "rusty sword",
        category: ItemCategory::Weapon,
        attack: Some(18),
        heal: None,
        cost: Some(25),
        blurb: "more tetanus than edge, but it cuts",
    },
    CatalogEntry {
        name: "drift saber",
        category: ItemCategory::Weapon,
        attack: Some(25),
        heal: None,
        cost: Some(60),
        blurb: "hums faintly when the mist is near",
    },
    CatalogEntry {
        name: "leather jerkin",
        category: ItemCategory::Armor,
        attack: None,
        heal: None,
        cost: Some(30),
        blurb: "stiff, creaking, better than skin",
    },
    CatalogEntry {
        name: "scaled cuirass",
        category: ItemCategory::Armor,
        attack: None,
        heal: None,
        cost: Some(75),
        blurb: "overlapping plates of something long dead",
    },
    CatalogEntry {
        name: "hard bread",
        category: ItemCategory::Item,
        attack: None,
        heal: Some(15),
        cost: Some(5),
        blurb: "edible, in the legal sense",
    },
    CatalogEntry {
        name: "red tonic",
        category: ItemCategory::Item,
        attack: None,
        heal: Some(40),
        cost: Some(20),
        blurb: "tastes of copper and regret",
    },
    CatalogEntry {
        name: "ember elixir",
        category: ItemCategory::Item,
        attack: None,
        heal: Some(100),
        cost: Some(75),
        blurb: "warms you from the marrow out",
    },
];

/// Case-insensitive catalog lookup.
pub fn lookup(name: &str) -> Option<&'static CatalogEntry> {
    CATALOG.iter().find(|e| e.name.eq_ignore_ascii_case(name))
}

pub fn is_fist(name: &str) -> bool {
    name.eq_ignore_ascii_case(FIST)
}

/// How much of a stock line a vendor holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StockQuantity {
    Unlimited,
    Count(u32),
}

/// One purchasable line in a vendor's stock. Optional fields override the
/// catalog; `effective_cost` falls back to it.
#[derive(Debug, Clone)]
pub struct StockItem {
    pub name: String,
    pub category: ItemCategory,
    pub quantity: StockQuantity,
    pub attack: Option<i32>,
    pub heal: Option<i32>,
    pub cost: Option<i64>,
    pub description: Option<String>,
}

impl StockItem {
    /// A stock line mirroring the catalog entry, unlimited quantity.
    pub fn unlimited(entry: &CatalogEntry) -> Self {
        Self {
            name: entry.name.to_string(),
            category: entry.category,
            quantity: StockQuantity::Unlimited,
            attack: entry.attack,
            heal: entry.heal,
            cost: entry.cost,
            description: Some(entry.blurb.to_string()),
        }
    }

    pub fn effective_cost(&self) -> Option<i64> {
        self.cost.or_else(|| lookup(&self.name).and_then(|e| e.cost))
    }
}
