use ahash::AHashMap;

/// Handle into a [`MachineArena`]. Only valid for the arena (or a clone of
/// the arena) it was issued by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MachineId(pub usize);

/// Named logical container of items ("game"/"set").
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Machine {
    pub name: String,
    pub description: String,
    pub manufacturer: Option<String>,
    pub category: Option<String>,
    pub year: Option<String>,
}

impl Machine {
    pub fn named(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            description: name.clone(),
            name,
            ..Machine::default()
        }
    }
}

/// Append-only arena of machines interned by name. Items reference machines
/// through [`MachineId`] handles so cloning and merging indexes never deals
/// in shared mutable pointers.
#[derive(Debug, Clone, Default)]
pub struct MachineArena {
    machines: Vec<Machine>,
    by_name: AHashMap<String, MachineId>,
}

impl MachineArena {
    pub fn new() -> Self {
        Self::default()
    }

    /// Intern a machine by name. An existing machine with the same name wins;
    /// the candidate's other fields are ignored in that case.
    pub fn intern(&mut self, machine: Machine) -> MachineId {
        if let Some(&id) = self.by_name.get(&machine.name) {
            return id;
        }
        let id = MachineId(self.machines.len());
        self.by_name.insert(machine.name.clone(), id);
        self.machines.push(machine);
        id
    }

    pub fn get(&self, id: MachineId) -> &Machine {
        &self.machines[id.0]
    }

    pub fn lookup(&self, name: &str) -> Option<MachineId> {
        self.by_name.get(name).copied()
    }

    /// Intern a renamed copy of an existing machine and return its handle.
    pub fn rename(&mut self, id: MachineId, new_name: impl Into<String>) -> MachineId {
        let mut machine = self.get(id).clone();
        machine.name = new_name.into();
        self.intern(machine)
    }

    /// Overwrite the machine behind `id` in place. Every item holding this
    /// handle observes the update. The name lookup follows along.
    pub fn update(&mut self, id: MachineId, machine: Machine) {
        let old_name = self.machines[id.0].name.clone();
        if old_name != machine.name {
            if self.by_name.get(&old_name) == Some(&id) {
                self.by_name.remove(&old_name);
            }
            self.by_name.entry(machine.name.clone()).or_insert(id);
        }
        self.machines[id.0] = machine;
    }

    pub fn len(&self) -> usize {
        self.machines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.machines.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Machine> {
        self.machines.iter()
    }
}
