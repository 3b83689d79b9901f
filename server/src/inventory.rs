//! Validation and application of player inventory actions.
//!
//! Every function checks all of its preconditions before touching the
//! player, so a rejected action leaves the inventory exactly as it was.

use crate::entity::{GroundItem, Petal, Player};
use crate::error::InventoryError;
use shared::{PetalId, HOTBAR_SLOTS, INVENTORY_CAP, MAX_TIER, PICKUP_RANGE};
use std::collections::{HashMap, HashSet};

/// Appends a fresh petal to the spare inventory.
pub fn add(player: &mut Player, petal: Petal) -> Result<PetalId, InventoryError> {
    if player.inventory.len() >= INVENTORY_CAP {
        return Err(InventoryError::Full);
    }
    let id = petal.id;
    player.inventory.push(petal);
    player.inventory_dirty = true;
    Ok(id)
}

/// Removes and returns the inventory entry at `index`.
pub fn drop(player: &mut Player, index: usize) -> Result<Petal, InventoryError> {
    if index >= player.inventory.len() {
        return Err(InventoryError::NoSuchIndex(index));
    }
    player.inventory_dirty = true;
    Ok(player.inventory.remove(index))
}

/// Merges three identical petals into one of the next tier.
///
/// The sources must be exactly three distinct indices holding petals of the
/// same kind and tier, below the maximum tier. Tier-3 petals are rejected and
/// kept rather than consumed.
pub fn combine(
    player: &mut Player,
    indices: &[usize],
    new_id: PetalId,
) -> Result<PetalId, InventoryError> {
    if indices.len() != 3 {
        return Err(InventoryError::CombineCount(indices.len()));
    }

    let mut sorted = indices.to_vec();
    sorted.sort_unstable();
    sorted.dedup();
    if sorted.len() != indices.len() {
        return Err(InventoryError::DuplicateIndex);
    }
    if let Some(&bad) = sorted.iter().find(|&&i| i >= player.inventory.len()) {
        return Err(InventoryError::NoSuchIndex(bad));
    }

    let first = &player.inventory[sorted[0]];
    let (kind, tier) = (first.kind, first.tier);
    if sorted
        .iter()
        .any(|&i| player.inventory[i].kind != kind || player.inventory[i].tier != tier)
    {
        return Err(InventoryError::Mismatch);
    }
    if tier >= MAX_TIER {
        return Err(InventoryError::MaxTier);
    }

    // Highest index first so the remaining indices stay valid.
    for &i in sorted.iter().rev() {
        player.inventory.remove(i);
    }
    player.inventory.push(Petal::new(new_id, kind, tier + 1));
    player.inventory_dirty = true;
    Ok(new_id)
}

/// Puts an owned petal into a hotbar slot.
///
/// A petal taken from the inventory swaps places with whatever the slot held.
/// A petal already on the hotbar swaps slots.
pub fn equip(player: &mut Player, slot: usize, petal_id: PetalId) -> Result<(), InventoryError> {
    if slot >= HOTBAR_SLOTS {
        return Err(InventoryError::NoSuchSlot(slot));
    }

    if let Some(index) = player.inventory.iter().position(|p| p.id == petal_id) {
        let petal = player.inventory.remove(index);
        if let Some(previous) = player.hotbar[slot].replace(petal) {
            player.inventory.insert(index, previous);
        }
    } else if let Some(from) = player
        .hotbar
        .iter()
        .position(|s| s.as_ref().is_some_and(|p| p.id == petal_id))
    {
        player.hotbar.swap(from, slot);
    } else {
        return Err(InventoryError::NotOwned(petal_id));
    }

    player.inventory_dirty = true;
    Ok(())
}

/// Moves the petal in `slot` back to the spare inventory.
pub fn unequip(player: &mut Player, slot: usize) -> Result<(), InventoryError> {
    if slot >= HOTBAR_SLOTS {
        return Err(InventoryError::NoSuchSlot(slot));
    }
    if player.hotbar[slot].is_none() {
        return Err(InventoryError::EmptySlot(slot));
    }
    if player.inventory.len() >= INVENTORY_CAP {
        return Err(InventoryError::Full);
    }
    if let Some(petal) = player.hotbar[slot].take() {
        player.inventory.push(petal);
    }
    player.inventory_dirty = true;
    Ok(())
}

/// Applies a client-proposed layout of the petals the player already owns.
///
/// The layout must reference every owned petal exactly once and nothing else.
/// Petal stats always come from server state; the client only chooses where
/// each petal sits.
pub fn rearrange(
    player: &mut Player,
    hotbar: &[Option<PetalId>],
    inventory: &[PetalId],
) -> Result<(), InventoryError> {
    if hotbar.len() > HOTBAR_SLOTS || inventory.len() > INVENTORY_CAP {
        return Err(InventoryError::LayoutMismatch);
    }

    let owned: HashSet<PetalId> = player
        .hotbar
        .iter()
        .flatten()
        .chain(player.inventory.iter())
        .map(|p| p.id)
        .collect();

    let mut seen = HashSet::with_capacity(owned.len());
    for id in hotbar.iter().flatten().chain(inventory.iter()) {
        if !owned.contains(id) {
            return Err(InventoryError::NotOwned(*id));
        }
        if !seen.insert(*id) {
            return Err(InventoryError::LayoutMismatch);
        }
    }
    if seen.len() != owned.len() {
        return Err(InventoryError::LayoutMismatch);
    }

    let mut pool: HashMap<PetalId, Petal> = player
        .hotbar
        .iter_mut()
        .filter_map(Option::take)
        .chain(player.inventory.drain(..))
        .map(|p| (p.id, p))
        .collect();

    for (slot, id) in hotbar.iter().enumerate() {
        player.hotbar[slot] = id.and_then(|id| pool.remove(&id));
    }
    player.inventory = inventory.iter().filter_map(|id| pool.remove(id)).collect();
    player.inventory_dirty = true;
    Ok(())
}

/// Checks whether the player may pick up `item` right now.
pub fn check_pickup(player: &Player, item: &GroundItem) -> Result<(), InventoryError> {
    if player.dead {
        return Err(InventoryError::Dead);
    }
    if player.position.distance(&item.position) > PICKUP_RANGE {
        return Err(InventoryError::OutOfReach);
    }
    if player.inventory.len() >= INVENTORY_CAP {
        return Err(InventoryError::Full);
    }
    Ok(())
}
