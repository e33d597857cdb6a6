use std::fmt;

/// The control state of a machine. Exactly one is active at any time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MachineState {
    /// Waiting for a customer to choose an item.
    IdleNoSelection,
    /// An item is chosen but nothing has been paid.
    ItemSelected,
    /// Coins have been accepted towards the chosen item.
    CoinInserted,
    /// A purchase completed; the customer has yet to collect it.
    ItemPurchased,
    /// Every product is sold out. Only an admin can leave this state.
    ProductEmpty,
    Admin,
}

impl MachineState {
    pub fn is_admin(self) -> bool {
        self == MachineState::Admin
    }

    /// The resting state for a machine with the given emptiness.
    pub fn base(empty: bool) -> Self {
        if empty {
            MachineState::ProductEmpty
        } else {
            MachineState::IdleNoSelection
        }
    }
}

impl fmt::Display for MachineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            MachineState::IdleNoSelection => "idle",
            MachineState::ItemSelected => "item selected",
            MachineState::CoinInserted => "coin inserted",
            MachineState::ItemPurchased => "item purchased",
            MachineState::ProductEmpty => "product empty",
            MachineState::Admin => "admin",
        };
        f.pad(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_state_follows_emptiness() {
        assert_eq!(MachineState::base(true), MachineState::ProductEmpty);
        assert_eq!(MachineState::base(false), MachineState::IdleNoSelection);
    }

    #[test]
    fn only_admin_is_admin() {
        assert!(MachineState::Admin.is_admin());
        assert!(!MachineState::ProductEmpty.is_admin());
    }
}
