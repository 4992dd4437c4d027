use super::constants::{PORTAL_CAP, PORTAL_LIFETIME_TICKS, PORTAL_SPAWN_INTERVAL};
use super::grid::Grid;
use super::types::{Cell, Portal};
use rand::seq::index::sample;
use rand::Rng;
use std::collections::HashSet;

#[derive(Debug, Clone)]
pub struct PortalSet {
    portals: Vec<Portal>,
    spawn_countdown: u32,
}

impl Default for PortalSet {
    fn default() -> Self {
        Self {
            portals: Vec::new(),
            spawn_countdown: PORTAL_SPAWN_INTERVAL,
        }
    }
}

impl PortalSet {
    pub fn portals(&self) -> &[Portal] {
        &self.portals
    }

    pub fn cells(&self) -> impl Iterator<Item = Cell> + '_ {
        self.portals
            .iter()
            .flat_map(|portal| [portal.entry, portal.exit])
    }

    pub fn destination(&self, cell: Cell) -> Option<Cell> {
        self.portals.iter().find_map(|portal| portal.partner(cell))
    }

    pub fn tick(&mut self) -> bool {
        self.portals.retain_mut(|portal| {
            portal.ttl = portal.ttl.saturating_sub(1);
            portal.ttl > 0
        });
        self.spawn_countdown = self.spawn_countdown.saturating_sub(1);
        if self.spawn_countdown > 0 {
            return false;
        }
        self.spawn_countdown = PORTAL_SPAWN_INTERVAL;
        self.portals.len() < PORTAL_CAP
    }

    pub fn create_portal<R: Rng>(
        &mut self,
        grid: &Grid,
        occupied: &HashSet<Cell>,
        rng: &mut R,
    ) -> Option<Portal> {
        if self.portals.len() >= PORTAL_CAP {
            return None;
        }
        let taken: HashSet<Cell> = self.cells().collect();
        let free: Vec<Cell> = grid
            .cells()
            .filter(|cell| !occupied.contains(cell) && !taken.contains(cell))
            .collect();
        if free.len() < 2 {
            return None;
        }
        let picked = sample(rng, free.len(), 2);
        let portal = Portal {
            entry: free[picked.index(0)],
            exit: free[picked.index(1)],
            ttl: PORTAL_LIFETIME_TICKS,
        };
        self.portals.push(portal);
        Some(portal)
    }

    #[cfg(test)]
    pub(crate) fn push(&mut self, portal: Portal) {
        self.portals.push(portal);
    }
}
