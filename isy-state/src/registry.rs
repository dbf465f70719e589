//! Node address → device handle registry for one hub
//!
//! Devices live in one of two sets: *active* devices receive status updates,
//! *bad* devices had a communication error and are skipped until the hub
//! reports them again. An address is never in both sets.
//!
//! The registry is shared between the subscription worker and the host's
//! inventory sync, so every mutation goes through a single lock.

use std::collections::HashMap;

use isy_parser::NodeAddress;
use parking_lot::Mutex;

use crate::model::DeviceHandle;

/// Where an address currently sits in the registry
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Membership {
    Active(DeviceHandle),
    Bad(DeviceHandle),
    Unknown,
}

#[derive(Debug, Default)]
struct Sets {
    active: HashMap<NodeAddress, DeviceHandle>,
    bad: HashMap<NodeAddress, DeviceHandle>,
}

/// Thread-safe device registry
#[derive(Debug, Default)]
pub struct DeviceRegistry {
    sets: Mutex<Sets>,
}

impl DeviceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a device as active, replacing any previous entry for its address
    pub fn insert(&self, device: DeviceHandle) -> Option<DeviceHandle> {
        let mut sets = self.sets.lock();
        let bad = sets.bad.remove(&device.address);
        sets.active.insert(device.address.clone(), device).or(bad)
    }

    /// Forget a device entirely
    pub fn remove(&self, address: &NodeAddress) -> Option<DeviceHandle> {
        let mut sets = self.sets.lock();
        let active = sets.active.remove(address);
        let bad = sets.bad.remove(address);
        active.or(bad)
    }

    /// Remove a device from the active set only, leaving the bad set alone
    pub fn remove_active(&self, address: &NodeAddress) -> Option<DeviceHandle> {
        self.sets.lock().active.remove(address)
    }

    /// Put a device in the bad set
    pub fn insert_bad(&self, device: DeviceHandle) {
        let mut sets = self.sets.lock();
        sets.active.remove(&device.address);
        sets.bad.insert(device.address.clone(), device);
    }

    /// Move an active device to the bad set, returning its handle
    pub fn mark_bad(&self, address: &NodeAddress) -> Option<DeviceHandle> {
        let mut sets = self.sets.lock();
        let device = sets.active.remove(address)?;
        sets.bad.insert(address.clone(), device.clone());
        Some(device)
    }

    /// Move a bad device back to the active set, returning its handle
    pub fn mark_resumed(&self, address: &NodeAddress) -> Option<DeviceHandle> {
        let mut sets = self.sets.lock();
        let device = sets.bad.remove(address)?;
        sets.active.insert(address.clone(), device.clone());
        Some(device)
    }

    /// Active device for an address
    pub fn get_active(&self, address: &NodeAddress) -> Option<DeviceHandle> {
        self.sets.lock().active.get(address).cloned()
    }

    pub fn membership(&self, address: &NodeAddress) -> Membership {
        let sets = self.sets.lock();
        if let Some(device) = sets.active.get(address) {
            Membership::Active(device.clone())
        } else if let Some(device) = sets.bad.get(address) {
            Membership::Bad(device.clone())
        } else {
            Membership::Unknown
        }
    }

    pub fn is_active(&self, address: &NodeAddress) -> bool {
        self.sets.lock().active.contains_key(address)
    }

    pub fn is_bad(&self, address: &NodeAddress) -> bool {
        self.sets.lock().bad.contains_key(address)
    }

    /// Rename a device in whichever set holds it, returning the updated handle
    pub fn rename(&self, address: &NodeAddress, name: &str) -> Option<DeviceHandle> {
        let mut sets = self.sets.lock();
        let Sets { active, bad } = &mut *sets;
        let device = active.get_mut(address).or_else(|| bad.get_mut(address))?;
        device.name = name.to_string();
        Some(device.clone())
    }

    /// Addresses currently in the bad set, sorted
    pub fn bad_addresses(&self) -> Vec<NodeAddress> {
        let mut addresses: Vec<_> = self.sets.lock().bad.keys().cloned().collect();
        addresses.sort();
        addresses
    }

    /// Addresses currently in the active set, sorted
    pub fn active_addresses(&self) -> Vec<NodeAddress> {
        let mut addresses: Vec<_> = self.sets.lock().active.keys().cloned().collect();
        addresses.sort();
        addresses
    }

    /// Replace the whole inventory after a sync with the hub.
    ///
    /// Devices that were bad stay bad (with the new handle); bad entries for
    /// nodes missing from `devices` are dropped.
    pub fn replace_all(&self, devices: impl IntoIterator<Item = DeviceHandle>) {
        let mut sets = self.sets.lock();
        let previous_bad = std::mem::take(&mut sets.bad);
        sets.active.clear();

        for device in devices {
            if previous_bad.contains_key(&device.address) {
                sets.bad.insert(device.address.clone(), device);
            } else {
                sets.active.insert(device.address.clone(), device);
            }
        }
    }

    /// Number of devices across both sets
    pub fn len(&self) -> usize {
        let sets = self.sets.lock();
        sets.active.len() + sets.bad.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::DeviceClass;
    use proptest::prelude::*;

    fn device(id: u64, address: &str) -> DeviceHandle {
        DeviceHandle::new(id, address, format!("Device {}", id), DeviceClass::Relay)
    }

    fn addr(address: &str) -> NodeAddress {
        NodeAddress::from(address)
    }

    #[test]
    fn test_insert_and_lookup() {
        let registry = DeviceRegistry::new();
        assert!(registry.insert(device(1, "A B C 1")).is_none());

        assert_eq!(registry.get_active(&addr("A B C 1")).unwrap().id, 1);
        assert!(registry.is_active(&addr("A B C 1")));
        assert_eq!(registry.membership(&addr("X Y Z 1")), Membership::Unknown);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_bad_round_trip() {
        let registry = DeviceRegistry::new();
        registry.insert(device(1, "A B C 1"));

        assert_eq!(registry.mark_bad(&addr("A B C 1")).unwrap().id, 1);
        assert!(!registry.is_active(&addr("A B C 1")));
        assert!(registry.is_bad(&addr("A B C 1")));
        assert_eq!(registry.bad_addresses(), vec![addr("A B C 1")]);

        assert_eq!(registry.mark_resumed(&addr("A B C 1")).unwrap().id, 1);
        assert!(registry.is_active(&addr("A B C 1")));
        assert!(registry.bad_addresses().is_empty());
    }

    #[test]
    fn test_mark_bad_unknown_is_noop() {
        let registry = DeviceRegistry::new();
        assert!(registry.mark_bad(&addr("A B C 1")).is_none());
        assert!(registry.mark_resumed(&addr("A B C 1")).is_none());
        assert!(registry.is_empty());
    }

    #[test]
    fn test_insert_clears_bad_entry() {
        let registry = DeviceRegistry::new();
        registry.insert_bad(device(1, "A B C 1"));
        let previous = registry.insert(device(2, "A B C 1"));

        assert_eq!(previous.unwrap().id, 1);
        assert!(!registry.is_bad(&addr("A B C 1")));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_rename_in_either_set() {
        let registry = DeviceRegistry::new();
        registry.insert(device(1, "A B C 1"));
        registry.insert_bad(device(2, "D E F 1"));

        assert_eq!(registry.rename(&addr("A B C 1"), "Porch").unwrap().name, "Porch");
        assert_eq!(registry.rename(&addr("D E F 1"), "Den").unwrap().name, "Den");
        assert!(registry.rename(&addr("X X X 1"), "Nope").is_none());
        assert_eq!(registry.get_active(&addr("A B C 1")).unwrap().name, "Porch");
    }

    #[test]
    fn test_replace_all_keeps_bad_nodes_bad() {
        let registry = DeviceRegistry::new();
        registry.insert(device(1, "A 1 1 1"));
        registry.insert_bad(device(2, "B 1 1 1"));
        registry.insert_bad(device(3, "C 1 1 1"));

        registry.replace_all(vec![device(10, "A 1 1 1"), device(20, "B 1 1 1"), device(40, "D 1 1 1")]);

        assert_eq!(registry.active_addresses(), vec![addr("A 1 1 1"), addr("D 1 1 1")]);
        assert_eq!(registry.bad_addresses(), vec![addr("B 1 1 1")]);
        assert_eq!(registry.membership(&addr("B 1 1 1")), Membership::Bad(device(20, "B 1 1 1")));
        assert_eq!(registry.get_active(&addr("A 1 1 1")).unwrap().id, 10);
    }

    #[derive(Debug, Clone)]
    enum Op {
        Insert(u8),
        Remove(u8),
        MarkBad(u8),
        Resume(u8),
        InsertBad(u8),
    }

    fn op() -> impl Strategy<Value = Op> {
        prop_oneof![
            (0u8..6).prop_map(Op::Insert),
            (0u8..6).prop_map(Op::Remove),
            (0u8..6).prop_map(Op::MarkBad),
            (0u8..6).prop_map(Op::Resume),
            (0u8..6).prop_map(Op::InsertBad),
        ]
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        #[test]
        fn test_sets_stay_disjoint(ops in proptest::collection::vec(op(), 0..40)) {
            let registry = DeviceRegistry::new();
            for op in ops {
                match op {
                    Op::Insert(n) => { registry.insert(device(n as u64, &format!("N {} 0 1", n))); }
                    Op::Remove(n) => { registry.remove(&addr(&format!("N {} 0 1", n))); }
                    Op::MarkBad(n) => { registry.mark_bad(&addr(&format!("N {} 0 1", n))); }
                    Op::Resume(n) => { registry.mark_resumed(&addr(&format!("N {} 0 1", n))); }
                    Op::InsertBad(n) => { registry.insert_bad(device(n as u64, &format!("N {} 0 1", n))); }
                }
            }

            let active = registry.active_addresses();
            for bad in registry.bad_addresses() {
                prop_assert!(!active.contains(&bad));
            }
        }
    }
}
