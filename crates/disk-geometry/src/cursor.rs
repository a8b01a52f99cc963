//! Editable block position.
//!
//! Each setter accepts raw user input, saturates it into range, recomputes
//! every other coordinate and only then notifies observers. Observers never
//! see a half-updated position.

use std::fmt;

use log::debug;

use crate::{Axis, BlockAddress, DiskGeometry, GeometryError};

/// Handle returned by [`BlockCursor::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObserverId(u32);

type Observer = Box<dyn FnMut(&BlockAddress)>;

pub struct BlockCursor {
    geometry: DiskGeometry,
    address: BlockAddress,
    observers: Vec<(ObserverId, Observer)>,
    next_id: u32,
}

impl BlockCursor {
    /// Create a cursor at block 0. Fails for geometries that cannot be
    /// addressed, so the setters never overflow.
    pub fn new(geometry: DiskGeometry) -> Result<Self, GeometryError> {
        let address = geometry.from_block(0)?;
        Ok(Self {
            geometry,
            address,
            observers: Vec::new(),
            next_id: 0,
        })
    }

    pub fn geometry(&self) -> DiskGeometry {
        self.geometry
    }

    pub fn address(&self) -> BlockAddress {
        self.address
    }

    pub fn block(&self) -> u32 {
        self.address.block
    }

    /// Register a callback invoked after every position change.
    pub fn subscribe(&mut self, observer: impl FnMut(&BlockAddress) + 'static) -> ObserverId {
        let id = ObserverId(self.next_id);
        self.next_id += 1;
        self.observers.push((id, Box::new(observer)));
        id
    }

    /// Remove a callback. Returns false if the id was unknown.
    pub fn unsubscribe(&mut self, id: ObserverId) -> bool {
        let before = self.observers.len();
        self.observers.retain(|(other, _)| *other != id);
        self.observers.len() != before
    }

    /// Set one axis. Returns true if the position changed.
    pub fn set(&mut self, axis: Axis, value: i64) -> bool {
        match axis {
            Axis::Cylinder => self.set_cylinder(value),
            Axis::Head => self.set_head(value),
            Axis::Track => self.set_track(value),
            Axis::Sector => self.set_sector(value),
            Axis::Block => self.set_block(value),
        }
    }

    pub fn set_cylinder(&mut self, value: i64) -> bool {
        let cylinder = self.saturate(value, Axis::Cylinder);
        let track = cylinder * self.geometry.heads + self.address.head;
        self.move_to(track * self.geometry.sectors_per_track + self.address.sector)
    }

    pub fn set_head(&mut self, value: i64) -> bool {
        let head = self.saturate(value, Axis::Head);
        let track = self.address.cylinder * self.geometry.heads + head;
        self.move_to(track * self.geometry.sectors_per_track + self.address.sector)
    }

    pub fn set_track(&mut self, value: i64) -> bool {
        let track = self.saturate(value, Axis::Track);
        self.move_to(track * self.geometry.sectors_per_track + self.address.sector)
    }

    pub fn set_sector(&mut self, value: i64) -> bool {
        let sector = self.saturate(value, Axis::Sector);
        self.move_to(self.address.track * self.geometry.sectors_per_track + sector)
    }

    pub fn set_block(&mut self, value: i64) -> bool {
        let block = self.saturate(value, Axis::Block);
        self.move_to(block)
    }

    fn saturate(&self, value: i64, axis: Axis) -> u32 {
        let clamped = self.geometry.clamp(value, axis);
        if i64::from(clamped) != value {
            debug!("{axis} {value} clamped to {clamped}");
        }
        clamped
    }

    fn move_to(&mut self, block: u32) -> bool {
        if block == self.address.block {
            return false;
        }
        self.address = self.geometry.locate(block);
        let address = self.address;
        for (_, observer) in &mut self.observers {
            observer(&address);
        }
        true
    }
}

impl fmt::Debug for BlockCursor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BlockCursor")
            .field("geometry", &self.geometry)
            .field("address", &self.address)
            .field("observers", &self.observers.len())
            .finish()
    }
}
