use chrono::Utc;
use space::{Exit, Room, RoomId};

use crate::items::{self, StockItem};
use crate::occupant::{Npc, NpcClass, NpcId};
use crate::state::GameState;

/// Build the hand-authored starting world: the hub, the vendor's emporium
/// one room north, and unexplored exits everywhere else. Returns the state
/// and the spawn room id.
pub fn seed_world() -> (GameState, RoomId) {
    let mut state = GameState::new();
    let now = Utc::now();

    let hub_id = RoomId::from("hub");
    let emporium_id = RoomId::from("emporium");

    state.rooms.seed(Room {
        id: hub_id.clone(),
        name: "The Drifting Crossroads".into(),
        description: "Lantern posts lean at odd angles where five cobbled paths knot together. \
                      Beyond the lamplight the world frays into slow grey mist."
            .into(),
        region: None,
        hub: true,
        exits: vec![
            Exit::to("north", emporium_id.clone()),
            Exit::unexplored("south"),
            Exit::unexplored("east"),
            Exit::unexplored("west"),
        ],
        created_at: now,
    });

    state.rooms.seed(Room {
        id: emporium_id.clone(),
        name: "The Brasswick Emporium".into(),
        description: "Shelves of salvage climb to a ceiling lost in pipe smoke. A counter of \
                      scarred brass divides the shop from everything worth stealing."
            .into(),
        region: None,
        hub: false,
        exits: vec![Exit::to("south", hub_id.clone())],
        created_at: now,
    });

    state.occupants.insert_npc(Npc {
        id: NpcId(0),
        name: "Maro the Peddler".into(),
        description: Some("A wiry trader whose coat jingles with unseen pockets.".into()),
        health: 100,
        max_health: 100,
        attack: 0,
        creds: 250,
        room: emporium_id,
        class: NpcClass::Vendor,
        stock: default_stock(),
    });

    (state, hub_id)
}

/// The reference shop: every purchasable catalog entry, unlimited quantity.
pub fn default_stock() -> Vec<StockItem> {
    items::CATALOG
        .iter()
        .filter(|e| e.cost.is_some())
        .map(StockItem::unlimited)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn world_seeds_hub_and_emporium() {
        let (state, hub) = seed_world();
        assert_eq!(hub, RoomId::from("hub"));
        assert!(state.rooms.get(&hub).unwrap().hub);
        assert_eq!(state.rooms.len(), 2);

        let north = state.rooms.find_exit(&hub, "north").unwrap();
        assert_eq!(north.target, Some(RoomId::from("emporium")));
        assert!(state
            .rooms
            .find_exit(&hub, "south")
            .unwrap()
            .target
            .is_none());
    }

    #[test]
    fn vendor_is_seeded_with_stock() {
        let (state, _) = seed_world();
        let vendor = state
            .occupants
            .find_npc_in_room(&RoomId::from("emporium"), "maro the peddler")
            .unwrap();
        assert_eq!(vendor.class, NpcClass::Vendor);
        assert!(!vendor.stock.is_empty());
        // everything in stock resolves to a priced catalog entry
        for line in &vendor.stock {
            assert!(line.effective_cost().is_some(), "{} has no price", line.name);
            assert!(items::lookup(&line.name).is_some());
        }
    }

    #[test]
    fn fist_is_not_for_sale() {
        assert!(!default_stock()
            .iter()
            .any(|s| s.name.eq_ignore_ascii_case(items::FIST)));
    }
}
