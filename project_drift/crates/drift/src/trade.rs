use session::SessionId;

use crate::error::GameError;
use crate::events::{system, Outgoing};
use crate::items::StockQuantity;
use crate::occupant::NpcClass;
use crate::state::GameState;

/// Handle a `talk` command aimed at a vendor. `list` is the default action;
/// `buy` moves creds and an item, atomically or not at all.
pub fn talk(
    state: &mut GameState,
    buyer: SessionId,
    target_name: &str,
    action: Option<&str>,
    item: Option<&str>,
) -> Result<Vec<Outgoing>, GameError> {
    let room = state
        .occupants
        .player(buyer)
        .ok_or_else(GameError::no_player)?
        .room
        .clone();

    let vendor_id = match state.occupants.find_npc_in_room(&room, target_name) {
        Some(npc) if npc.class == NpcClass::Vendor => npc.id,
        Some(npc) => {
            return Err(GameError::refusal(format!(
                "{} grunts and turns away. Nothing to say, nothing to sell.",
                npc.name
            )))
        }
        None => {
            return Err(GameError::refusal(format!(
                "There is no {target_name} here to talk to."
            )))
        }
    };

    match action.map(str::trim).filter(|a| !a.is_empty()).unwrap_or("list") {
        a if a.eq_ignore_ascii_case("list") => {
            let vendor = state
                .occupants
                .npc(vendor_id)
                .ok_or_else(|| GameError::glitch("vendor vanished mid-talk"))?;
            Ok(vec![Outgoing::to(buyer, system(format_stock(vendor)))])
        }
        a if a.eq_ignore_ascii_case("leave") => {
            let vendor_name = state
                .occupants
                .npc(vendor_id)
                .map(|n| n.name.clone())
                .unwrap_or_default();
            Ok(vec![Outgoing::to(
                buyer,
                system(format!("{vendor_name} nods. \"Mist keep you, drifter.\"")),
            )])
        }
        a if a.eq_ignore_ascii_case("buy") => {
            let wanted = item
                .map(str::trim)
                .filter(|i| !i.is_empty())
                .ok_or_else(|| GameError::refusal("Buy what? Name the item."))?;
            buy(state, buyer, vendor_id, wanted)
        }
        other => Err(GameError::refusal(format!(
            "The vendor squints. \"I don't know what '{other}' means.\""
        ))),
    }
}

fn buy(
    state: &mut GameState,
    buyer: SessionId,
    vendor_id: crate::occupant::NpcId,
    wanted: &str,
) -> Result<Vec<Outgoing>, GameError> {
    let (vendor_name, stock_idx, item_name, cost) = {
        let vendor = state
            .occupants
            .npc(vendor_id)
            .ok_or_else(|| GameError::glitch("vendor vanished mid-buy"))?;
        let idx = vendor
            .stock
            .iter()
            .position(|s| s.name.eq_ignore_ascii_case(wanted))
            .ok_or_else(|| {
                GameError::refusal(format!("{} doesn't sell any {wanted}.", vendor.name))
            })?;
        let line = &vendor.stock[idx];
        if line.quantity == StockQuantity::Count(0) {
            return Err(GameError::refusal(format!(
                "{} is out of {}.",
                vendor.name, line.name
            )));
        }
        let cost = line.effective_cost().ok_or_else(|| {
            GameError::refusal(format!("{} won't part with the {}.", vendor.name, line.name))
        })?;
        (vendor.name.clone(), idx, line.name.clone(), cost)
    };

    {
        let p = state.occupants.player(buyer).ok_or_else(GameError::no_player)?;
        if p.creds < cost {
            return Err(GameError::refusal(format!(
                "The {item_name} costs {cost} creds and you have {}.",
                p.creds
            )));
        }
    }

    // Transfer first, stow second. A failed stow must leave both balances
    // exactly as they were, hence the explicit two-step rollback.
    let (player, vendor) = state.occupants.player_and_npc_mut(buyer, vendor_id);
    let player = player.ok_or_else(GameError::no_player)?;
    let vendor = vendor.ok_or_else(|| GameError::glitch("vendor vanished mid-buy"))?;

    player.creds -= cost;
    vendor.creds += cost;

    if player.inventory.stow(item_name.clone()).is_none() {
        player.creds += cost;
        vendor.creds -= cost;
        return Err(GameError::refusal(format!(
            "Your pack has no room for the {item_name}. {vendor_name} takes the creds back."
        )));
    }

    if let StockQuantity::Count(n) = vendor.stock[stock_idx].quantity {
        vendor.stock[stock_idx].quantity = StockQuantity::Count(n.saturating_sub(1));
    }

    Ok(vec![Outgoing::to(
        buyer,
        system(format!(
            "You hand {vendor_name} {cost} creds for the {item_name}."
        )),
    )])
}

fn format_stock(vendor: &crate::occupant::Npc) -> String {
    let mut out = format!("{} spreads a cloth across the counter:", vendor.name);
    for line in &vendor.stock {
        let price = match line.effective_cost() {
            Some(c) => format!("{c} creds"),
            None => "not for sale".to_string(),
        };
        let mut detail = format!("\n  {} ({}, {})", line.name, line.category, price);
        if let Some(attack) = line.attack {
            detail.push_str(&format!(" +{attack} attack"));
        }
        if let Some(heal) = line.heal {
            detail.push_str(&format!(" heals {heal}"));
        }
        out.push_str(&detail);
    }
    if vendor.stock.is_empty() {
        out.push_str("\n  (nothing at all)");
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::items::{lookup, StockItem};
    use crate::occupant::{Player, START_CREDS};
    use crate::seed;
    use chrono::Utc;
    use net::protocol::ServerEvent;
    use space::RoomId;

    fn setup_in_emporium(creds: i64) -> (GameState, SessionId) {
        let (mut state, _) = seed::seed_world();
        let sid = SessionId(1);
        let mut player = Player::new(sid, "Vex".into(), RoomId::from("emporium"), Utc::now());
        player.creds = creds;
        state.occupants.admit_player(player);
        (state, sid)
    }

    fn vendor_creds(state: &GameState) -> i64 {
        state
            .occupants
            .find_npc_in_room(&RoomId::from("emporium"), "maro the peddler")
            .unwrap()
            .creds
    }

    #[test]
    fn list_is_the_default_action() {
        let (mut state, sid) = setup_in_emporium(START_CREDS);
        let events = talk(&mut state, sid, "Maro the Peddler", None, None).unwrap();
        assert_eq!(events.len(), 1);
        match &events[0].event {
            ServerEvent::System { message } => {
                assert!(message.contains("red tonic"));
                assert!(message.contains("20 creds"));
            }
            other => panic!("expected system event, got {other:?}"),
        }
    }

    #[test]
    fn leave_changes_nothing() {
        let (mut state, sid) = setup_in_emporium(START_CREDS);
        let before = vendor_creds(&state);
        let events = talk(&mut state, sid, "maro the peddler", Some("leave"), None).unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(vendor_creds(&state), before);
        assert_eq!(state.occupants.player(sid).unwrap().creds, START_CREDS);
    }

    #[test]
    fn buy_moves_creds_and_item() {
        let (mut state, sid) = setup_in_emporium(50);
        let before_vendor = vendor_creds(&state);

        talk(&mut state, sid, "maro the peddler", Some("buy"), Some("red tonic")).unwrap();

        let p = state.occupants.player(sid).unwrap();
        assert_eq!(p.creds, 30);
        assert!(p.inventory.contains_item("red tonic"));
        assert_eq!(vendor_creds(&state), before_vendor + 20);
    }

    #[test]
    fn buy_with_insufficient_creds_changes_nothing() {
        // scenario: 20-cred item, 15-cred buyer
        let (mut state, sid) = setup_in_emporium(15);
        let before_vendor = vendor_creds(&state);

        let err = talk(&mut state, sid, "maro the peddler", Some("buy"), Some("red tonic"))
            .unwrap_err();
        assert!(matches!(err, GameError::Refusal(_)));
        assert!(err.to_string().contains("20"));

        let p = state.occupants.player(sid).unwrap();
        assert_eq!(p.creds, 15);
        assert!(!p.inventory.contains_item("red tonic"));
        assert_eq!(vendor_creds(&state), before_vendor);
    }

    #[test]
    fn buy_into_full_pack_rolls_back_both_balances() {
        let (mut state, sid) = setup_in_emporium(100);
        let before_vendor = vendor_creds(&state);
        {
            let p = state.occupants.player_mut(sid).unwrap();
            while p.inventory.stow("pebble").is_some() {}
        }

        let err = talk(&mut state, sid, "maro the peddler", Some("buy"), Some("red tonic"))
            .unwrap_err();
        assert!(err.to_string().contains("no room"));

        let p = state.occupants.player(sid).unwrap();
        assert_eq!(p.creds, 100);
        assert!(!p.inventory.contains_item("red tonic"));
        assert_eq!(vendor_creds(&state), before_vendor);
    }

    #[test]
    fn counted_stock_depletes() {
        let (mut state, sid) = setup_in_emporium(100);
        {
            let vendor = state
                .occupants
                .find_npc_in_room(&RoomId::from("emporium"), "maro the peddler")
                .unwrap();
            let vid = vendor.id;
            let vendor = state.occupants.npc_mut(vid).unwrap();
            let mut line = StockItem::unlimited(lookup("hard bread").unwrap());
            line.quantity = StockQuantity::Count(1);
            vendor.stock = vec![line];
        }

        talk(&mut state, sid, "maro the peddler", Some("buy"), Some("hard bread")).unwrap();
        let err = talk(&mut state, sid, "maro the peddler", Some("buy"), Some("hard bread"))
            .unwrap_err();
        assert!(err.to_string().contains("out of"));
    }

    #[test]
    fn only_vendors_respond() {
        let (mut state, sid) = setup_in_emporium(50);
        // a normie in the same room is not a conversation partner
        state.occupants.insert_npc(crate::occupant::Npc {
            id: crate::occupant::NpcId(0),
            name: "Gruk".into(),
            description: None,
            health: 30,
            max_health: 30,
            attack: 10,
            creds: 0,
            room: RoomId::from("emporium"),
            class: NpcClass::Normie,
            stock: vec![],
        });

        assert!(talk(&mut state, sid, "gruk", None, None).is_err());
        assert!(talk(&mut state, sid, "nobody", None, None).is_err());
    }

    #[test]
    fn buy_requires_an_item_name() {
        let (mut state, sid) = setup_in_emporium(50);
        let err = talk(&mut state, sid, "maro the peddler", Some("buy"), None).unwrap_err();
        assert!(matches!(err, GameError::Refusal(_)));
    }

    #[test]
    fn unknown_action_is_refused() {
        let (mut state, sid) = setup_in_emporium(50);
        let err = talk(&mut state, sid, "maro the peddler", Some("haggle"), None).unwrap_err();
        assert!(err.to_string().contains("haggle"));
    }
}
